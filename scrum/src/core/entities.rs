//! Scrum artifact records stored in the session state.
//!
//! Every optional field uses `None` for "not specified". Upserts merge field by
//! field: a `Some` in the incoming record replaces the stored value, a `None`
//! leaves it alone. Keys the model sends that have no named field are kept in
//! `extra` and merged the same way, so unknown data survives a round trip.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status assigned to newly logged impediments and retro actions.
pub const STATUS_OPEN: &str = "open";

/// A unit of product work owned by the Product Owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklogItem {
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_story: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub acceptance_criteria: Option<Vec<Value>>,
    /// `P0`/`P1`/`P2`, a number, or free text.
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_hypothesis: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub dependencies: Option<Vec<Value>>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub risks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discovery_notes: Option<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl BacklogItem {
    /// Non-empty `id`, if any.
    pub fn key_id(&self) -> Option<&str> {
        non_empty(self.id.as_deref())
    }

    /// Non-empty `title`, if any.
    pub fn key_title(&self) -> Option<&str> {
        non_empty(self.title.as_deref())
    }

    /// True if this item is the update target for `incoming`.
    ///
    /// Matches on `id` when the incoming record carries one, or on exact
    /// `title` when it carries one. Either is enough.
    pub fn matches(&self, incoming: &BacklogItem) -> bool {
        let by_id = incoming
            .key_id()
            .is_some_and(|id| self.id.as_deref() == Some(id));
        let by_title = incoming
            .key_title()
            .is_some_and(|title| self.title.as_deref() == Some(title));
        by_id || by_title
    }

    /// True if `key` equals this item's `id` or `title`.
    pub fn matches_key(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key) || self.title.as_deref() == Some(key)
    }

    /// Overlay every specified field of `patch` onto `self`.
    pub fn merge_from(&mut self, patch: BacklogItem) {
        let BacklogItem {
            id,
            title,
            user_story,
            acceptance_criteria,
            priority,
            value_hypothesis,
            dependencies,
            risks,
            discovery_notes,
            extra,
        } = patch;
        overlay(&mut self.id, id);
        overlay(&mut self.title, title);
        overlay(&mut self.user_story, user_story);
        overlay(&mut self.acceptance_criteria, acceptance_criteria);
        overlay(&mut self.priority, priority);
        overlay(&mut self.value_hypothesis, value_hypothesis);
        overlay(&mut self.dependencies, dependencies);
        overlay(&mut self.risks, risks);
        overlay(&mut self.discovery_notes, discovery_notes);
        merge_extra(&mut self.extra, extra);
    }

    /// Label used when listing the backlog (`title`, falling back to `id`).
    pub fn label(&self) -> &str {
        self.key_title().or(self.key_id()).unwrap_or("(untitled)")
    }
}

/// Implementation plan fields supplied by the Development Team.
///
/// `estimate` is story points or a free-text size such as `"M"`.
///
/// A `title` here renames the entry it is merged into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintPlan {
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub risks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_approach: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub dod_checks: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One item of the sprint backlog, keyed by `title`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprintPlanEntry {
    #[serde(default)]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "optional_text_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approach: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub tasks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub risks: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_approach: Option<Value>,
    #[serde(
        default,
        deserialize_with = "one_or_many",
        skip_serializing_if = "Option::is_none"
    )]
    pub dod_checks: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl SprintPlanEntry {
    /// Fresh entry for `title` with `plan` applied on top.
    pub fn new(title: &str, plan: SprintPlan) -> Self {
        let mut entry = Self {
            title: title.to_string(),
            ..Self::default()
        };
        entry.merge_from(plan);
        entry
    }

    /// True if `key` equals this entry's `id` or `title`.
    pub fn matches_key(&self, key: &str) -> bool {
        self.id.as_deref() == Some(key) || self.title == key
    }

    /// Overlay every specified field of `plan` onto `self`.
    pub fn merge_from(&mut self, plan: SprintPlan) {
        let SprintPlan {
            id,
            title,
            approach,
            tasks,
            estimate,
            risks,
            test_approach,
            dod_checks,
            extra,
        } = plan;
        if let Some(title) = title {
            self.title = title;
        }
        overlay(&mut self.id, id);
        overlay(&mut self.approach, approach);
        overlay(&mut self.tasks, tasks);
        overlay(&mut self.estimate, estimate);
        overlay(&mut self.risks, risks);
        overlay(&mut self.test_approach, test_approach);
        overlay(&mut self.dod_checks, dod_checks);
        merge_extra(&mut self.extra, extra);
    }
}

/// Something blocking the team, tracked by the Scrum Master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impediment {
    pub description: String,
    pub owner: String,
    pub status: String,
}

impl Impediment {
    pub fn open(description: &str, owner: &str) -> Self {
        Self {
            description: description.trim().to_string(),
            owner: owner.trim().to_string(),
            status: STATUS_OPEN.to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == STATUS_OPEN
    }
}

/// Improvement action agreed in a retrospective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetroAction {
    pub action: String,
    pub owner: String,
    pub success_metric: String,
    pub status: String,
}

impl RetroAction {
    pub fn open(action: &str, owner: &str, success_metric: &str) -> Self {
        Self {
            action: action.trim().to_string(),
            owner: owner.trim().to_string(),
            success_metric: success_metric.trim().to_string(),
            status: STATUS_OPEN.to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == STATUS_OPEN
    }
}

/// Entry of the append-only decision log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub title: String,
    pub decision: String,
    pub rationale: String,
    pub owner: String,
}

impl Decision {
    /// Build a decision with every field trimmed.
    pub fn trimmed(title: &str, decision: &str, rationale: &str, owner: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            decision: decision.trim().to_string(),
            rationale: rationale.trim().to_string(),
            owner: owner.trim().to_string(),
        }
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Unknown keys follow the named-field rule: `null` keeps the stored value.
fn merge_extra(slot: &mut BTreeMap<String, Value>, patch: BTreeMap<String, Value>) {
    slot.extend(patch.into_iter().filter(|(_, value)| !value.is_null()));
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Accept a list as is, or wrap a single value into a one-element list.
fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        Value::Array(items) => items,
        other => vec![other],
    }))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Number(serde_json::Number),
}

impl From<TextOrNumber> for String {
    fn from(value: TextOrNumber) -> Self {
        match value {
            TextOrNumber::Text(text) => text,
            TextOrNumber::Number(number) => number.to_string(),
        }
    }
}

/// Accept a string or a number, stored as text.
pub(crate) fn text_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    TextOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<TextOrNumber> = Option::deserialize(deserializer)?;
    Ok(value.map(String::from))
}
