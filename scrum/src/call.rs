//! Tool-call dispatch: the function-call surface used by the agent runtime.
//!
//! A call names a tool and carries JSON arguments. Dispatch resolves the tool,
//! checks the calling persona's allow-list, validates the arguments against
//! the tool's schema and runs the mutator. Every rejection is returned as an
//! error outcome and leaves the state untouched.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::core::entities::{BacklogItem, SprintPlan, text_or_number};
use crate::core::mutators;
use crate::core::outcome::ToolOutcome;
use crate::core::persona::{Persona, Tool};
use crate::core::state::ScrumState;
use crate::io::tool_schema::ToolSchemas;

/// A tool invocation as emitted by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    #[serde(default)]
    pub args: Value,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, args: Value) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Serialized outcome plus whether it was a success.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    pub ok: bool,
    pub body: Value,
}

impl ToolResponse {
    fn from_outcome<T: Serialize>(outcome: ToolOutcome<T>) -> Result<Self> {
        Ok(Self {
            ok: outcome.is_ok(),
            body: outcome.to_json().context("serialize tool outcome")?,
        })
    }

    fn rejected(message: String) -> Result<Self> {
        Self::from_outcome(ToolOutcome::<()>::error(message))
    }
}

#[derive(Deserialize)]
struct LogDecisionArgs {
    title: String,
    decision: String,
    rationale: String,
    owner: String,
}

#[derive(Deserialize)]
struct UpsertBacklogItemArgs {
    item: BacklogItem,
}

#[derive(Deserialize)]
struct SetPriorityArgs {
    title_or_id: String,
    #[serde(deserialize_with = "text_or_number")]
    priority: String,
}

#[derive(Deserialize)]
struct AddImpedimentArgs {
    description: String,
    owner: String,
}

#[derive(Deserialize)]
struct AddRetroActionArgs {
    action: String,
    owner: String,
    success_metric: String,
}

#[derive(Deserialize)]
struct PlanSprintBacklogItemArgs {
    title_or_id: String,
    plan: SprintPlan,
}

/// Routes tool calls to mutators.
pub struct Dispatcher {
    schemas: ToolSchemas,
}

impl Dispatcher {
    pub fn new() -> Result<Self> {
        Ok(Self {
            schemas: ToolSchemas::load()?,
        })
    }

    pub fn schemas(&self) -> &ToolSchemas {
        &self.schemas
    }

    /// Run `call` on behalf of `persona` against `state`.
    ///
    /// `Err` is reserved for serialization failures; tool-level problems are
    /// reported in the response body.
    #[instrument(skip_all, fields(persona = persona.key(), tool = %call.name))]
    pub fn dispatch(
        &self,
        state: &mut ScrumState,
        persona: Persona,
        call: &ToolCall,
    ) -> Result<ToolResponse> {
        let tool = match call.name.parse::<Tool>() {
            Ok(tool) => tool,
            Err(message) => {
                warn!("unknown tool");
                return ToolResponse::rejected(message);
            }
        };
        if !persona.allows(tool) {
            warn!("tool not permitted for persona");
            return ToolResponse::rejected(format!(
                "{} is not permitted to call {}.",
                persona, tool
            ));
        }

        let args = match &call.args {
            Value::Null => Value::Object(Map::new()),
            other => other.clone(),
        };
        let violations = self.schemas.validate(tool, &args);
        if !violations.is_empty() {
            warn!(violations = violations.len(), "invalid tool arguments");
            return ToolResponse::rejected(format!(
                "invalid arguments for {}: {}",
                tool,
                violations.join("; ")
            ));
        }

        let response = match run_tool(state, tool, args) {
            Ok(response) => response?,
            Err(message) => ToolResponse::rejected(message)?,
        };
        if response.ok {
            info!("tool applied");
        } else {
            debug!(body = %response.body, "tool returned error outcome");
        }
        Ok(response)
    }
}

/// Outer `Err` carries an argument-decoding message.
fn run_tool(
    state: &mut ScrumState,
    tool: Tool,
    args: Value,
) -> std::result::Result<Result<ToolResponse>, String> {
    let response = match tool {
        Tool::InitScrumState => ToolResponse::from_outcome(mutators::initialize(state)),
        Tool::LogDecision => {
            let a: LogDecisionArgs = decode(tool, args)?;
            ToolResponse::from_outcome(mutators::append_decision(
                state,
                &a.title,
                &a.decision,
                &a.rationale,
                &a.owner,
            ))
        }
        Tool::UpsertBacklogItem => {
            let a: UpsertBacklogItemArgs = decode(tool, args)?;
            ToolResponse::from_outcome(mutators::upsert_backlog_item(state, a.item))
        }
        Tool::SetPriority => {
            let a: SetPriorityArgs = decode(tool, args)?;
            ToolResponse::from_outcome(mutators::set_priority(state, &a.title_or_id, &a.priority))
        }
        Tool::AddImpediment => {
            let a: AddImpedimentArgs = decode(tool, args)?;
            ToolResponse::from_outcome(mutators::append_impediment(
                state,
                &a.description,
                &a.owner,
            ))
        }
        Tool::AddRetroAction => {
            let a: AddRetroActionArgs = decode(tool, args)?;
            ToolResponse::from_outcome(mutators::append_retro_action(
                state,
                &a.action,
                &a.owner,
                &a.success_metric,
            ))
        }
        Tool::PlanSprintBacklogItem => {
            let a: PlanSprintBacklogItemArgs = decode(tool, args)?;
            ToolResponse::from_outcome(mutators::upsert_sprint_plan_entry(
                state,
                &a.title_or_id,
                a.plan,
            ))
        }
    };
    Ok(response)
}

fn decode<T: DeserializeOwned>(tool: Tool, args: Value) -> std::result::Result<T, String> {
    serde_json::from_value(args).map_err(|err| format!("invalid arguments for {}: {}", tool, err))
}
