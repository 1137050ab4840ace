//! Persona instruction rendering.
//!
//! Templates are minijinja files under `io/prompts/`, one per persona, with a
//! shared `artifacts` partial summarising the session state. Sections are
//! delimited by `<!-- section:KEY required|droppable -->` markers so the
//! rendered prompt can be cut down to the configured byte budget.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::core::persona::Persona;
use crate::core::state::{ScrumState, StateKey};

const ARTIFACTS_TEMPLATE: &str = include_str!("prompts/artifacts.md");
const ORCHESTRATOR_TEMPLATE: &str = include_str!("prompts/orchestrator.md");
const PRODUCT_OWNER_TEMPLATE: &str = include_str!("prompts/product_owner.md");
const SCRUM_MASTER_TEMPLATE: &str = include_str!("prompts/scrum_master.md");
const DEV_TEAM_TEMPLATE: &str = include_str!("prompts/dev_team.md");
const QA_TEMPLATE: &str = include_str!("prompts/qa.md");
const ARCHITECT_TEMPLATE: &str = include_str!("prompts/architect.md");

const TRUNCATED_MARKER: &str = "\n[truncated]";

/// Summary of a sub-agent listed in the orchestrator prompt.
#[derive(Debug, Clone, Serialize)]
struct SubAgentContext {
    name: &'static str,
    description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct BacklogLine {
    label: String,
    priority: Option<String>,
}

/// State snapshot rendered into the `artifacts` section.
#[derive(Debug, Clone, Serialize)]
struct ArtifactsContext {
    vision: String,
    goals: Vec<String>,
    backlog: Vec<BacklogLine>,
    sprint_goal: String,
    sprint_items: Vec<String>,
    definition_of_done: Vec<String>,
    open_impediments: usize,
    open_retro_actions: usize,
    decisions: usize,
}

impl ArtifactsContext {
    /// `None` for a state that holds nothing yet.
    fn from_state(state: &ScrumState) -> Option<Self> {
        if !StateKey::ALL.iter().any(|key| state.is_present(*key)) {
            return None;
        }
        Some(Self {
            vision: state.product_vision().trim().to_string(),
            goals: state.product_goals().to_vec(),
            backlog: state
                .product_backlog()
                .iter()
                .map(|item| BacklogLine {
                    label: item.label().to_string(),
                    priority: item.priority.clone(),
                })
                .collect(),
            sprint_goal: state.sprint_goal().trim().to_string(),
            sprint_items: state
                .sprint_backlog()
                .iter()
                .map(|entry| entry.title.clone())
                .collect(),
            definition_of_done: state.definition_of_done().to_vec(),
            open_impediments: state
                .impediment_log()
                .iter()
                .filter(|imp| imp.is_open())
                .count(),
            open_retro_actions: state
                .retro_actions()
                .iter()
                .filter(|action| action.is_open())
                .count(),
            decisions: state.decision_log().len(),
        })
    }
}

/// Renders persona instructions within a byte budget.
pub struct PromptRenderer {
    env: Environment<'static>,
    budget_bytes: usize,
}

impl PromptRenderer {
    pub fn new(budget_bytes: usize) -> Result<Self> {
        let mut env = Environment::new();
        env.add_template("artifacts", ARTIFACTS_TEMPLATE)
            .context("load artifacts template")?;
        for persona in Persona::ALL {
            env.add_template(persona.key(), template_for(persona))
                .with_context(|| format!("load {} template", persona.key()))?;
        }
        Ok(Self { env, budget_bytes })
    }

    /// Instructions for `persona`, with the session state summarised when given.
    pub fn render(&self, persona: Persona, state: Option<&ScrumState>) -> Result<String> {
        let sub_agents: Vec<SubAgentContext> = persona
            .sub_agents()
            .iter()
            .map(|sub| SubAgentContext {
                name: sub.agent_name(),
                description: sub.description(),
            })
            .collect();
        let tools: Vec<&str> = persona.tools().iter().map(|tool| tool.name()).collect();
        let state_keys: Vec<&str> = StateKey::ALL.iter().map(StateKey::as_str).collect();
        let artifacts = state.and_then(ArtifactsContext::from_state);

        let template = self.env.get_template(persona.key())?;
        let rendered = template.render(context! {
            display_name => persona.display_name(),
            tools => tools,
            sub_agents => sub_agents,
            state_keys => state_keys,
            artifacts => artifacts,
        })?;

        let mut sections = parse_sections(&rendered);
        apply_budget_to_sections(&mut sections, self.budget_bytes);
        let prompt = render_sections(&sections);
        debug!(
            persona = persona.key(),
            bytes = prompt.len(),
            budget = self.budget_bytes,
            "rendered persona prompt"
        );
        Ok(prompt)
    }
}

fn template_for(persona: Persona) -> &'static str {
    match persona {
        Persona::Orchestrator => ORCHESTRATOR_TEMPLATE,
        Persona::ProductOwner => PRODUCT_OWNER_TEMPLATE,
        Persona::ScrumMaster => SCRUM_MASTER_TEMPLATE,
        Persona::DevTeam => DEV_TEAM_TEMPLATE,
        Persona::Qa => QA_TEMPLATE,
        Persona::Architect => ARCHITECT_TEMPLATE,
    }
}

/// A parsed section from rendered template output.
#[derive(Debug, Clone)]
struct ParsedSection {
    key: String,
    required: bool,
    /// Section body without its marker.
    content: String,
}

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s*section:(\w+)\s+(required|droppable)\s*-->")
        .expect("section marker pattern should be valid")
});

/// Split rendered output on section markers. Empty droppable sections vanish.
fn parse_sections(rendered: &str) -> Vec<ParsedSection> {
    let markers: Vec<_> = SECTION_RE.captures_iter(rendered).collect();
    let mut sections = Vec::new();

    for (i, caps) in markers.iter().enumerate() {
        let (Some(marker), Some(key), Some(kind)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        let end = markers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(rendered.len());
        let required = kind.as_str() == "required";
        let content = rendered[marker.end()..end].trim().to_string();
        if !content.is_empty() || required {
            sections.push(ParsedSection {
                key: key.as_str().to_string(),
                required,
                content,
            });
        }
    }

    sections
}

/// Drop droppable sections, then truncate the last one, until within budget.
fn apply_budget_to_sections(sections: &mut Vec<ParsedSection>, budget: usize) {
    let total_len =
        |secs: &[ParsedSection]| -> usize { secs.iter().map(|s| s.content.len()).sum() };

    if total_len(sections) <= budget {
        return;
    }

    if let Some(idx) = sections
        .iter()
        .position(|s| s.key == "artifacts" && !s.required)
    {
        debug!(
            section = "artifacts",
            bytes_dropped = sections[idx].content.len(),
            "dropped section for budget"
        );
        sections.remove(idx);
    }

    let other_len: usize = sections
        .iter()
        .rev()
        .skip(1)
        .map(|s| s.content.len())
        .sum();
    let Some(last) = sections.last_mut() else {
        return;
    };
    let allowed = budget.saturating_sub(other_len);
    if last.content.len() <= allowed {
        return;
    }
    let before_len = last.content.len();
    if allowed > TRUNCATED_MARKER.len() {
        truncate_at_char_boundary(&mut last.content, allowed - TRUNCATED_MARKER.len());
        last.content.push_str(TRUNCATED_MARKER);
    } else {
        truncate_at_char_boundary(&mut last.content, allowed);
    }
    debug!(
        section = last.key,
        before_len,
        after_len = last.content.len(),
        "truncated section for budget"
    );
}

fn truncate_at_char_boundary(text: &mut String, max_len: usize) {
    let mut cut = max_len.min(text.len());
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    text.truncate(cut);
}

fn render_sections(sections: &[ParsedSection]) -> String {
    sections
        .iter()
        .map(|s| s.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
