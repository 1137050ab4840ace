//! Test-only helpers for constructing Scrum artifacts.

use serde_json::Value;

use crate::core::entities::{BacklogItem, SprintPlan};
use crate::core::mutators::initialize;
use crate::core::state::ScrumState;

/// State after a single `initialize` call.
pub fn initialized_state() -> ScrumState {
    let mut state = ScrumState::default();
    initialize(&mut state);
    state
}

/// Backlog item with only a title.
pub fn backlog_item(title: &str) -> BacklogItem {
    BacklogItem {
        title: Some(title.to_string()),
        ..BacklogItem::default()
    }
}

/// Backlog item with an explicit id and title.
pub fn backlog_item_with_id(id: &str, title: &str) -> BacklogItem {
    BacklogItem {
        id: Some(id.to_string()),
        ..backlog_item(title)
    }
}

/// Sprint plan with only an approach.
pub fn sprint_plan(approach: &str) -> SprintPlan {
    SprintPlan {
        approach: Some(Value::from(approach)),
        ..SprintPlan::default()
    }
}
