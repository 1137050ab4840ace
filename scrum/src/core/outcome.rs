//! Structured results returned by every tool.
//!
//! A tool never fails with an `Err`: business-rule violations come back as
//! `ToolOutcome::Error` so the calling runtime can hand them to the model.

use serde::Serialize;
use serde_json::Value;

use crate::core::entities::{BacklogItem, Decision, Impediment, RetroAction};

/// `{"status": "ok", ...payload}` or `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome<T> {
    Ok(T),
    Error { message: String },
}

impl<T> ToolOutcome<T> {
    pub fn error(message: impl Into<String>) -> Self {
        ToolOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok(_))
    }

    /// Payload of a successful outcome.
    pub fn ok(self) -> Option<T> {
        match self {
            ToolOutcome::Ok(payload) => Some(payload),
            ToolOutcome::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            ToolOutcome::Ok(_) => None,
            ToolOutcome::Error { message } => Some(message),
        }
    }
}

impl<T: Serialize> ToolOutcome<T> {
    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Initialized {
    pub initialized: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionLogged {
    pub decision: Decision,
}

/// Result of an upsert: `updated` is false when the record was appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upserted<T> {
    pub updated: bool,
    pub item: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrioritySet {
    pub item: BacklogItem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImpedimentAdded {
    pub impediment: Impediment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetroActionAdded {
    pub retro_action: RetroAction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_outcome_flattens_payload_next_to_status() {
        let outcome = ToolOutcome::Ok(Initialized { initialized: true });
        assert_eq!(
            outcome.to_json().expect("serialize"),
            json!({"status": "ok", "initialized": true})
        );
    }

    #[test]
    fn error_outcome_carries_message() {
        let outcome: ToolOutcome<PrioritySet> = ToolOutcome::error("Item not found.");
        assert!(!outcome.is_ok());
        assert_eq!(outcome.message(), Some("Item not found."));
        assert_eq!(
            outcome.to_json().expect("serialize"),
            json!({"status": "error", "message": "Item not found."})
        );
    }
}
