//! Artifact mutators: the seven operations personas may call.
//!
//! Each function takes the session state by `&mut`, applies exactly one
//! change, and returns a `ToolOutcome`. Error outcomes leave the state as it
//! was.

use crate::core::entities::{
    BacklogItem, Decision, Impediment, RetroAction, SprintPlan, SprintPlanEntry,
};
use crate::core::outcome::{
    DecisionLogged, ImpedimentAdded, Initialized, PrioritySet, RetroActionAdded, ToolOutcome,
    Upserted,
};
use crate::core::state::{DEFAULT_DEFINITION_OF_DONE, ScrumState};

pub const MISSING_BACKLOG_KEY: &str = "Backlog item needs at least 'id' or 'title'.";
pub const ITEM_NOT_FOUND: &str = "Item not found.";

/// Fill every absent key with its empty default. Present keys are untouched.
pub fn initialize(state: &mut ScrumState) -> ToolOutcome<Initialized> {
    state.product_vision.get_or_insert_with(String::new);
    state.product_goals.get_or_insert_with(Vec::new);
    state.product_backlog.get_or_insert_with(Vec::new);
    state
        .definition_of_done
        .get_or_insert_with(|| DEFAULT_DEFINITION_OF_DONE.map(String::from).to_vec());
    state.sprint_goal.get_or_insert_with(String::new);
    state.sprint_backlog.get_or_insert_with(Vec::new);
    state.impediment_log.get_or_insert_with(Vec::new);
    state.retro_actions.get_or_insert_with(Vec::new);
    state.decision_log.get_or_insert_with(Vec::new);
    ToolOutcome::Ok(Initialized { initialized: true })
}

pub fn append_decision(
    state: &mut ScrumState,
    title: &str,
    decision: &str,
    rationale: &str,
    owner: &str,
) -> ToolOutcome<DecisionLogged> {
    let entry = Decision::trimmed(title, decision, rationale, owner);
    state
        .decision_log
        .get_or_insert_with(Vec::new)
        .push(entry.clone());
    ToolOutcome::Ok(DecisionLogged { decision: entry })
}

/// Merge `item` into the first backlog entry it matches, or append it.
pub fn upsert_backlog_item(
    state: &mut ScrumState,
    item: BacklogItem,
) -> ToolOutcome<Upserted<BacklogItem>> {
    if item.key_id().is_none() && item.key_title().is_none() {
        return ToolOutcome::error(MISSING_BACKLOG_KEY);
    }

    let backlog = state.product_backlog.get_or_insert_with(Vec::new);
    if let Some(existing) = backlog.iter_mut().find(|x| x.matches(&item)) {
        existing.merge_from(item);
        return ToolOutcome::Ok(Upserted {
            updated: true,
            item: existing.clone(),
        });
    }

    backlog.push(item.clone());
    ToolOutcome::Ok(Upserted {
        updated: false,
        item,
    })
}

/// Change only the `priority` of the first item whose id or title is `title_or_id`.
pub fn set_priority(
    state: &mut ScrumState,
    title_or_id: &str,
    priority: &str,
) -> ToolOutcome<PrioritySet> {
    let found = state
        .product_backlog
        .as_mut()
        .and_then(|backlog| backlog.iter_mut().find(|x| x.matches_key(title_or_id)));
    let Some(item) = found else {
        return ToolOutcome::error(ITEM_NOT_FOUND);
    };
    item.priority = Some(priority.to_string());
    ToolOutcome::Ok(PrioritySet { item: item.clone() })
}

pub fn append_impediment(
    state: &mut ScrumState,
    description: &str,
    owner: &str,
) -> ToolOutcome<ImpedimentAdded> {
    let impediment = Impediment::open(description, owner);
    state
        .impediment_log
        .get_or_insert_with(Vec::new)
        .push(impediment.clone());
    ToolOutcome::Ok(ImpedimentAdded { impediment })
}

pub fn append_retro_action(
    state: &mut ScrumState,
    action: &str,
    owner: &str,
    success_metric: &str,
) -> ToolOutcome<RetroActionAdded> {
    let retro_action = RetroAction::open(action, owner, success_metric);
    state
        .retro_actions
        .get_or_insert_with(Vec::new)
        .push(retro_action.clone());
    ToolOutcome::Ok(RetroActionAdded { retro_action })
}

/// Merge `plan` into the sprint entry keyed by `title_or_id`, or create it.
pub fn upsert_sprint_plan_entry(
    state: &mut ScrumState,
    title_or_id: &str,
    plan: SprintPlan,
) -> ToolOutcome<Upserted<SprintPlanEntry>> {
    let sprint = state.sprint_backlog.get_or_insert_with(Vec::new);
    if let Some(existing) = sprint.iter_mut().find(|x| x.matches_key(title_or_id)) {
        existing.merge_from(plan);
        return ToolOutcome::Ok(Upserted {
            updated: true,
            item: existing.clone(),
        });
    }

    let entry = SprintPlanEntry::new(title_or_id, plan);
    sprint.push(entry.clone());
    ToolOutcome::Ok(Upserted {
        updated: false,
        item: entry,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::StateKey;
    use crate::test_support::{backlog_item, backlog_item_with_id, initialized_state, sprint_plan};
    use serde_json::json;

    #[test]
    fn initialize_on_empty_state_writes_defaults() {
        let mut state = ScrumState::default();
        let outcome = initialize(&mut state);

        assert_eq!(outcome, ToolOutcome::Ok(Initialized { initialized: true }));
        assert!(StateKey::ALL.iter().all(|key| state.is_present(*key)));
        assert!(state.product_backlog().is_empty());
        assert_eq!(state.sprint_goal(), "");
        assert_eq!(
            state.definition_of_done(),
            [
                "Code reviewed",
                "Automated tests passing",
                "Acceptance criteria met",
                "No critical security issues",
                "Docs updated if needed",
            ]
        );
    }

    /// Existing keys (even a customised DoD) survive re-initialization.
    #[test]
    fn initialize_is_idempotent_and_keeps_existing_keys() {
        let mut state = ScrumState {
            product_vision: Some("Fast checkout".to_string()),
            definition_of_done: Some(vec!["Demoed".to_string()]),
            ..ScrumState::default()
        };

        initialize(&mut state);
        let once = state.clone();
        initialize(&mut state);

        assert_eq!(state, once);
        assert_eq!(state.product_vision(), "Fast checkout");
        assert_eq!(state.definition_of_done(), ["Demoed".to_string()]);
    }

    #[test]
    fn append_decision_trims_and_preserves_order() {
        let mut state = initialized_state();
        append_decision(&mut state, " Use REST ", "REST over gRPC", " simpler ", " dev ");
        let outcome = append_decision(&mut state, "Cache", "Redis", "latency", "arch");

        let log = state.decision_log();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].title, "Use REST");
        assert_eq!(log[0].rationale, "simpler");
        assert_eq!(log[0].owner, "dev");
        assert_eq!(log[1].title, "Cache");
        assert_eq!(outcome.ok().map(|p| p.decision), Some(log[1].clone()));
    }

    #[test]
    fn append_decision_accepts_empty_strings() {
        let mut state = ScrumState::default();
        let outcome = append_decision(&mut state, "  ", "", "", "");
        assert!(outcome.is_ok());
        assert_eq!(state.decision_log()[0].title, "");
    }

    #[test]
    fn upsert_appends_new_title() {
        let mut state = initialized_state();
        upsert_backlog_item(&mut state, backlog_item("Search"));
        let outcome = upsert_backlog_item(&mut state, backlog_item("Login"));

        let payload = outcome.ok().expect("ok outcome");
        assert!(!payload.updated);
        assert_eq!(payload.item, backlog_item("Login"));
        assert_eq!(state.product_backlog().len(), 2);
        assert_eq!(state.product_backlog()[1].label(), "Login");
    }

    #[test]
    fn upsert_same_title_merges_priority() {
        let mut state = initialized_state();
        upsert_backlog_item(&mut state, backlog_item("Login"));
        let mut update = backlog_item("Login");
        update.priority = Some("P0".to_string());
        let outcome = upsert_backlog_item(&mut state, update);

        assert!(outcome.ok().expect("ok outcome").updated);
        assert_eq!(state.product_backlog().len(), 1);
        assert_eq!(
            serde_json::to_value(&state.product_backlog()[0]).expect("serialize"),
            json!({"title": "Login", "priority": "P0"})
        );
    }

    /// Matching by id wins even when the title changed; untouched fields survive.
    #[test]
    fn upsert_by_id_is_shallow_merge() {
        let mut state = initialized_state();
        let mut original = backlog_item_with_id("B-7", "Login");
        original.user_story = Some(json!("As a user I want to log in"));
        original.priority = Some("P2".to_string());
        upsert_backlog_item(&mut state, original);

        let mut update = backlog_item_with_id("B-7", "Login with SSO");
        update.priority = Some("P1".to_string());
        let payload = upsert_backlog_item(&mut state, update)
            .ok()
            .expect("ok outcome");

        assert!(payload.updated);
        let stored = &state.product_backlog()[0];
        assert_eq!(stored, &payload.item);
        assert_eq!(stored.title.as_deref(), Some("Login with SSO"));
        assert_eq!(stored.priority.as_deref(), Some("P1"));
        assert_eq!(
            stored.user_story,
            Some(json!("As a user I want to log in"))
        );
        assert_eq!(state.product_backlog().len(), 1);
    }

    #[test]
    fn upsert_first_match_wins() {
        let mut state = initialized_state();
        state.product_backlog = Some(vec![backlog_item("Dup"), backlog_item("Dup")]);

        let mut update = backlog_item("Dup");
        update.priority = Some("P0".to_string());
        upsert_backlog_item(&mut state, update);

        assert_eq!(state.product_backlog()[0].priority.as_deref(), Some("P0"));
        assert!(state.product_backlog()[1].priority.is_none());
    }

    #[test]
    fn upsert_without_id_or_title_is_rejected() {
        let mut state = initialized_state();
        upsert_backlog_item(&mut state, backlog_item("Login"));
        let before = state.clone();

        let item = BacklogItem {
            id: Some(String::new()),
            priority: Some("P0".to_string()),
            ..BacklogItem::default()
        };
        let outcome = upsert_backlog_item(&mut state, item);

        assert_eq!(outcome.message(), Some(MISSING_BACKLOG_KEY));
        assert_eq!(state, before);
    }

    #[test]
    fn set_priority_updates_only_priority() {
        let mut state = initialized_state();
        let mut item = backlog_item_with_id("B-1", "Login");
        item.user_story = Some(json!("story"));
        upsert_backlog_item(&mut state, item);

        let payload = set_priority(&mut state, "B-1", "P0")
            .ok()
            .expect("ok outcome");

        assert_eq!(payload.item.priority.as_deref(), Some("P0"));
        assert_eq!(payload.item.user_story, Some(json!("story")));
        assert_eq!(state.product_backlog()[0], payload.item);
    }

    #[test]
    fn set_priority_matches_title() {
        let mut state = initialized_state();
        upsert_backlog_item(&mut state, backlog_item("Login"));
        assert!(set_priority(&mut state, "Login", "P2").is_ok());
        assert_eq!(state.product_backlog()[0].priority.as_deref(), Some("P2"));
    }

    #[test]
    fn set_priority_missing_item_leaves_backlog_unchanged() {
        let mut state = initialized_state();
        let outcome = set_priority(&mut state, "Login", "P0");

        assert_eq!(
            outcome.to_json().expect("serialize"),
            json!({"status": "error", "message": "Item not found."})
        );
        assert!(state.product_backlog().is_empty());

        upsert_backlog_item(&mut state, backlog_item("Search"));
        let before = state.clone();
        assert!(!set_priority(&mut state, "Login", "P0").is_ok());
        assert_eq!(state, before);
    }

    /// An uninitialized state stays uninitialized when nothing matches.
    #[test]
    fn set_priority_on_absent_backlog_does_not_create_key() {
        let mut state = ScrumState::default();
        assert!(!set_priority(&mut state, "Login", "P0").is_ok());
        assert!(!state.is_present(StateKey::ProductBacklog));
    }

    #[test]
    fn append_impediment_opens_in_call_order() {
        let mut state = initialized_state();
        for n in 0..3 {
            append_impediment(&mut state, &format!(" blocker {} ", n), " sm ");
        }

        let log = state.impediment_log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[2].description, "blocker 2");
        assert!(log.iter().all(|imp| imp.status == "open" && imp.owner == "sm"));
    }

    #[test]
    fn append_retro_action_opens_trimmed_entry() {
        let mut state = ScrumState::default();
        let payload = append_retro_action(&mut state, " Shorter standups ", "sm", " <15 min ")
            .ok()
            .expect("ok outcome");

        assert_eq!(payload.retro_action.action, "Shorter standups");
        assert_eq!(payload.retro_action.success_metric, "<15 min");
        assert_eq!(payload.retro_action.status, "open");
        assert_eq!(state.retro_actions().len(), 1);
    }

    #[test]
    fn append_retro_action_keeps_call_order() {
        let mut state = initialized_state();
        for n in 0..3 {
            append_retro_action(
                &mut state,
                &format!(" action {} ", n),
                " sm ",
                &format!(" metric {} ", n),
            );
        }

        let actions = state.retro_actions();
        assert_eq!(actions.len(), 3);
        for (n, action) in actions.iter().enumerate() {
            assert_eq!(action.action, format!("action {}", n));
            assert_eq!(action.success_metric, format!("metric {}", n));
            assert_eq!(action.owner, "sm");
            assert!(action.is_open());
        }
    }

    #[test]
    fn upsert_sprint_plan_creates_entry() {
        let mut state = initialized_state();
        let outcome = upsert_sprint_plan_entry(&mut state, "Login", sprint_plan("REST"));

        let json = outcome.to_json().expect("serialize");
        assert_eq!(
            json,
            json!({
                "status": "ok",
                "updated": false,
                "item": {"title": "Login", "approach": "REST"},
            })
        );
        assert_eq!(state.sprint_backlog().len(), 1);
    }

    #[test]
    fn upsert_sprint_plan_merges_existing_entry() {
        let mut state = initialized_state();
        upsert_sprint_plan_entry(&mut state, "Login", sprint_plan("REST"));
        let plan = SprintPlan {
            tasks: Some(vec![json!("endpoint"), json!("tests")]),
            ..SprintPlan::default()
        };
        let payload = upsert_sprint_plan_entry(&mut state, "Login", plan)
            .ok()
            .expect("ok outcome");

        assert!(payload.updated);
        assert_eq!(payload.item.approach, Some(json!("REST")));
        assert_eq!(payload.item.tasks.as_ref().map(Vec::len), Some(2));
        assert_eq!(state.sprint_backlog().len(), 1);
    }

    #[test]
    fn upsert_sprint_plan_matches_entry_id() {
        let mut state = initialized_state();
        let plan = SprintPlan {
            id: Some("B-1".to_string()),
            ..sprint_plan("REST")
        };
        upsert_sprint_plan_entry(&mut state, "Login", plan);

        let payload = upsert_sprint_plan_entry(&mut state, "B-1", sprint_plan("GraphQL"))
            .ok()
            .expect("ok outcome");

        assert!(payload.updated);
        assert_eq!(payload.item.title, "Login");
        assert_eq!(payload.item.approach, Some(json!("GraphQL")));
    }
}
