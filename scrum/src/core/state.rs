//! The Scrum State: one record holding every artifact of a session.
//!
//! Keys are `Option`s so a state that was never initialized can be told apart
//! from one holding empty collections. Absent keys are omitted from JSON.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::entities::{BacklogItem, Decision, Impediment, RetroAction, SprintPlanEntry};

/// Definition of Done written by the first initialization of a session.
pub const DEFAULT_DEFINITION_OF_DONE: [&str; 5] = [
    "Code reviewed",
    "Automated tests passing",
    "Acceptance criteria met",
    "No critical security issues",
    "Docs updated if needed",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrumState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_vision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_goals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_backlog: Option<Vec<BacklogItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_of_done: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_backlog: Option<Vec<SprintPlanEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impediment_log: Option<Vec<Impediment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retro_actions: Option<Vec<RetroAction>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_log: Option<Vec<Decision>>,
}

impl ScrumState {
    pub fn product_vision(&self) -> &str {
        self.product_vision.as_deref().unwrap_or_default()
    }

    pub fn product_goals(&self) -> &[String] {
        self.product_goals.as_deref().unwrap_or_default()
    }

    pub fn product_backlog(&self) -> &[BacklogItem] {
        self.product_backlog.as_deref().unwrap_or_default()
    }

    pub fn definition_of_done(&self) -> &[String] {
        self.definition_of_done.as_deref().unwrap_or_default()
    }

    pub fn sprint_goal(&self) -> &str {
        self.sprint_goal.as_deref().unwrap_or_default()
    }

    pub fn sprint_backlog(&self) -> &[SprintPlanEntry] {
        self.sprint_backlog.as_deref().unwrap_or_default()
    }

    pub fn impediment_log(&self) -> &[Impediment] {
        self.impediment_log.as_deref().unwrap_or_default()
    }

    pub fn retro_actions(&self) -> &[RetroAction] {
        self.retro_actions.as_deref().unwrap_or_default()
    }

    pub fn decision_log(&self) -> &[Decision] {
        self.decision_log.as_deref().unwrap_or_default()
    }

    /// True if `key` holds a value (possibly empty).
    pub fn is_present(&self, key: StateKey) -> bool {
        match key {
            StateKey::ProductVision => self.product_vision.is_some(),
            StateKey::ProductGoals => self.product_goals.is_some(),
            StateKey::ProductBacklog => self.product_backlog.is_some(),
            StateKey::DefinitionOfDone => self.definition_of_done.is_some(),
            StateKey::SprintGoal => self.sprint_goal.is_some(),
            StateKey::SprintBacklog => self.sprint_backlog.is_some(),
            StateKey::ImpedimentLog => self.impediment_log.is_some(),
            StateKey::RetroActions => self.retro_actions.is_some(),
            StateKey::DecisionLog => self.decision_log.is_some(),
        }
    }

    /// Current value of `key` as JSON, or `None` when the key is absent.
    pub fn get(&self, key: StateKey) -> serde_json::Result<Option<Value>> {
        match key {
            StateKey::ProductVision => to_json(&self.product_vision),
            StateKey::ProductGoals => to_json(&self.product_goals),
            StateKey::ProductBacklog => to_json(&self.product_backlog),
            StateKey::DefinitionOfDone => to_json(&self.definition_of_done),
            StateKey::SprintGoal => to_json(&self.sprint_goal),
            StateKey::SprintBacklog => to_json(&self.sprint_backlog),
            StateKey::ImpedimentLog => to_json(&self.impediment_log),
            StateKey::RetroActions => to_json(&self.retro_actions),
            StateKey::DecisionLog => to_json(&self.decision_log),
        }
    }

    /// Replace the whole value of `key`. `null` removes the key.
    ///
    /// The value must have the key's shape; on error the state is unchanged.
    pub fn set(&mut self, key: StateKey, value: Value) -> serde_json::Result<()> {
        match key {
            StateKey::ProductVision => self.product_vision = from_json(value)?,
            StateKey::ProductGoals => self.product_goals = from_json(value)?,
            StateKey::ProductBacklog => self.product_backlog = from_json(value)?,
            StateKey::DefinitionOfDone => self.definition_of_done = from_json(value)?,
            StateKey::SprintGoal => self.sprint_goal = from_json(value)?,
            StateKey::SprintBacklog => self.sprint_backlog = from_json(value)?,
            StateKey::ImpedimentLog => self.impediment_log = from_json(value)?,
            StateKey::RetroActions => self.retro_actions = from_json(value)?,
            StateKey::DecisionLog => self.decision_log = from_json(value)?,
        }
        Ok(())
    }
}

fn to_json<T: Serialize>(slot: &Option<T>) -> serde_json::Result<Option<Value>> {
    slot.as_ref().map(serde_json::to_value).transpose()
}

fn from_json<T: serde::de::DeserializeOwned>(value: Value) -> serde_json::Result<Option<T>> {
    if value.is_null() {
        return Ok(None);
    }
    serde_json::from_value(value).map(Some)
}

/// Names of the nine artifact keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKey {
    ProductVision,
    ProductGoals,
    ProductBacklog,
    DefinitionOfDone,
    SprintGoal,
    SprintBacklog,
    ImpedimentLog,
    RetroActions,
    DecisionLog,
}

impl StateKey {
    pub const ALL: [StateKey; 9] = [
        StateKey::ProductVision,
        StateKey::ProductGoals,
        StateKey::ProductBacklog,
        StateKey::DefinitionOfDone,
        StateKey::SprintGoal,
        StateKey::SprintBacklog,
        StateKey::ImpedimentLog,
        StateKey::RetroActions,
        StateKey::DecisionLog,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StateKey::ProductVision => "product_vision",
            StateKey::ProductGoals => "product_goals",
            StateKey::ProductBacklog => "product_backlog",
            StateKey::DefinitionOfDone => "definition_of_done",
            StateKey::SprintGoal => "sprint_goal",
            StateKey::SprintBacklog => "sprint_backlog",
            StateKey::ImpedimentLog => "impediment_log",
            StateKey::RetroActions => "retro_actions",
            StateKey::DecisionLog => "decision_log",
        }
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StateKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown state key '{}'", s))
    }
}
