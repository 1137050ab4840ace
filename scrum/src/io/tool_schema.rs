//! JSON Schemas for tool arguments and the declarations built from them.

use std::collections::BTreeMap;

use anyhow::{Context, Result, anyhow};
use jsonschema::{Validator, validator_for};
use serde::Serialize;
use serde_json::Value;

use crate::core::persona::{Persona, Tool};

macro_rules! tool_schema {
    ($name:literal) => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/schemas/tools/",
            $name,
            ".schema.json"
        ))
    };
}

/// Raw schema text embedded for `tool`.
pub fn schema_source(tool: Tool) -> &'static str {
    match tool {
        Tool::InitScrumState => tool_schema!("init_scrum_state"),
        Tool::LogDecision => tool_schema!("log_decision"),
        Tool::UpsertBacklogItem => tool_schema!("upsert_backlog_item"),
        Tool::SetPriority => tool_schema!("set_priority"),
        Tool::AddImpediment => tool_schema!("add_impediment"),
        Tool::AddRetroAction => tool_schema!("add_retro_action"),
        Tool::PlanSprintBacklogItem => tool_schema!("plan_sprint_backlog_item"),
    }
}

/// Function declaration consumed by the model runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDeclaration {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

struct CompiledSchema {
    parameters: Value,
    validator: Validator,
}

/// Compiled argument validators for every tool.
pub struct ToolSchemas {
    compiled: BTreeMap<Tool, CompiledSchema>,
}

impl ToolSchemas {
    pub fn load() -> Result<Self> {
        let mut compiled = BTreeMap::new();
        for tool in Tool::ALL {
            let schema: Value = serde_json::from_str(schema_source(tool))
                .with_context(|| format!("parse {} schema", tool))?;
            let validator = validator_for(&schema)
                .map_err(|err| anyhow!("invalid {} schema: {}", tool, err))?;
            let mut parameters = schema;
            if let Some(obj) = parameters.as_object_mut() {
                obj.remove("$schema");
                obj.remove("title");
            }
            compiled.insert(
                tool,
                CompiledSchema {
                    parameters,
                    validator,
                },
            );
        }
        Ok(Self { compiled })
    }

    /// Schema violations for `args`; empty when the arguments are valid.
    pub fn validate(&self, tool: Tool, args: &Value) -> Vec<String> {
        match self.compiled.get(&tool) {
            Some(schema) => schema
                .validator
                .iter_errors(args)
                .map(|err| err.to_string())
                .collect(),
            None => vec![format!("no schema registered for {}", tool)],
        }
    }

    pub fn declaration(&self, tool: Tool) -> ToolDeclaration {
        let parameters = self
            .compiled
            .get(&tool)
            .map(|schema| schema.parameters.clone())
            .unwrap_or(Value::Null);
        ToolDeclaration {
            name: tool.name(),
            description: tool.description(),
            parameters,
        }
    }

    /// Declarations for the tools `persona` may call.
    pub fn declarations(&self, persona: Persona) -> Vec<ToolDeclaration> {
        persona
            .tools()
            .iter()
            .map(|tool| self.declaration(*tool))
            .collect()
    }
}
