//! Persona and tool declarations.
//!
//! Routing between personas is left to the model runtime. What this module
//! fixes is who exists, what each one is for, and which tools each may call.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// The six agents of the Scrum team: the root orchestrator and five specialists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Orchestrator,
    ProductOwner,
    ScrumMaster,
    DevTeam,
    Qa,
    Architect,
}

impl Persona {
    pub const ALL: [Persona; 6] = [
        Persona::Orchestrator,
        Persona::ProductOwner,
        Persona::ScrumMaster,
        Persona::DevTeam,
        Persona::Qa,
        Persona::Architect,
    ];

    /// Agent name presented to the runtime.
    pub fn agent_name(&self) -> &'static str {
        match self {
            Persona::Orchestrator => "ScrumOrchestrator",
            Persona::ProductOwner => "ProductOwner",
            Persona::ScrumMaster => "ScrumMaster",
            Persona::DevTeam => "DevTeam",
            Persona::Qa => "QA",
            Persona::Architect => "Architect",
        }
    }

    /// Snake-case key used in config tables and template names.
    pub fn key(&self) -> &'static str {
        match self {
            Persona::Orchestrator => "orchestrator",
            Persona::ProductOwner => "product_owner",
            Persona::ScrumMaster => "scrum_master",
            Persona::DevTeam => "dev_team",
            Persona::Qa => "qa",
            Persona::Architect => "architect",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Persona::Orchestrator => "Scrum Team Orchestrator",
            Persona::ProductOwner => "Product Owner",
            Persona::ScrumMaster => "Scrum Master",
            Persona::DevTeam => "Development Team",
            Persona::Qa => "QA",
            Persona::Architect => "Architect",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Persona::Orchestrator => {
                "Routes requests within Scrum team and maintains shared artifacts in session state."
            }
            Persona::ProductOwner => {
                "Owns product vision/goals, backlog ordering, acceptance criteria, scope tradeoffs."
            }
            Persona::ScrumMaster => {
                "Facilitates Scrum events, removes impediments, improves process, tracks actions."
            }
            Persona::DevTeam => {
                "Plans/estimates/implements stories, owns technical decisions, ensures DoD, creates sprint plan."
            }
            Persona::Qa => {
                "Improves test strategy and quality signals; proposes test cases and automation."
            }
            Persona::Architect => {
                "Identifies architectural risks, proposes tradeoffs, writes ADR-like notes."
            }
        }
    }

    /// Model alias used when the config does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            Persona::Orchestrator => "scrum-orchestrator",
            Persona::ProductOwner => "scrum-po",
            Persona::ScrumMaster => "scrum-sm",
            Persona::DevTeam => "scrum-dev",
            Persona::Qa => "scrum-qa",
            Persona::Architect => "scrum-arch",
        }
    }

    /// Tool allow-list, in declaration order.
    pub fn tools(&self) -> &'static [Tool] {
        match self {
            Persona::Orchestrator => &[Tool::InitScrumState, Tool::LogDecision],
            Persona::ProductOwner => &[
                Tool::InitScrumState,
                Tool::UpsertBacklogItem,
                Tool::SetPriority,
                Tool::LogDecision,
            ],
            Persona::ScrumMaster => &[
                Tool::InitScrumState,
                Tool::AddImpediment,
                Tool::AddRetroAction,
                Tool::LogDecision,
            ],
            Persona::DevTeam => &[
                Tool::InitScrumState,
                Tool::PlanSprintBacklogItem,
                Tool::AddImpediment,
                Tool::LogDecision,
            ],
            Persona::Qa => &[Tool::InitScrumState, Tool::AddImpediment, Tool::LogDecision],
            Persona::Architect => &[Tool::InitScrumState, Tool::LogDecision],
        }
    }

    /// Personas this one delegates to. Only the orchestrator has any.
    pub fn sub_agents(&self) -> &'static [Persona] {
        match self {
            Persona::Orchestrator => &[
                Persona::ProductOwner,
                Persona::ScrumMaster,
                Persona::DevTeam,
                Persona::Qa,
                Persona::Architect,
            ],
            _ => &[],
        }
    }

    pub fn allows(&self, tool: Tool) -> bool {
        self.tools().contains(&tool)
    }

    /// Declaration handed to the agent runtime.
    pub fn declare(&self, model: &str) -> PersonaDeclaration {
        PersonaDeclaration {
            name: self.agent_name(),
            model: model.to_string(),
            description: self.description(),
            tools: self.tools().iter().map(Tool::name).collect(),
            sub_agents: self.sub_agents().iter().map(Persona::agent_name).collect(),
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.agent_name())
    }
}

impl FromStr for Persona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "orchestrator" | "scrumorchestrator" | "root" => Ok(Persona::Orchestrator),
            "po" | "product_owner" | "productowner" => Ok(Persona::ProductOwner),
            "sm" | "scrum_master" | "scrummaster" => Ok(Persona::ScrumMaster),
            "dev" | "dev_team" | "devteam" => Ok(Persona::DevTeam),
            "qa" => Ok(Persona::Qa),
            "arch" | "architect" => Ok(Persona::Architect),
            _ => Err(format!("unknown persona '{}'", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonaDeclaration {
    pub name: &'static str,
    pub model: String,
    pub description: &'static str,
    pub tools: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_agents: Vec<&'static str>,
}

/// Tools exposed to personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    InitScrumState,
    LogDecision,
    UpsertBacklogItem,
    SetPriority,
    AddImpediment,
    AddRetroAction,
    PlanSprintBacklogItem,
}

impl Tool {
    pub const ALL: [Tool; 7] = [
        Tool::InitScrumState,
        Tool::LogDecision,
        Tool::UpsertBacklogItem,
        Tool::SetPriority,
        Tool::AddImpediment,
        Tool::AddRetroAction,
        Tool::PlanSprintBacklogItem,
    ];

    /// Function name the model calls.
    pub fn name(&self) -> &'static str {
        match self {
            Tool::InitScrumState => "init_scrum_state",
            Tool::LogDecision => "log_decision",
            Tool::UpsertBacklogItem => "upsert_backlog_item",
            Tool::SetPriority => "set_priority",
            Tool::AddImpediment => "add_impediment",
            Tool::AddRetroAction => "add_retro_action",
            Tool::PlanSprintBacklogItem => "plan_sprint_backlog_item",
        }
    }

    /// Name of the state operation behind the tool.
    pub fn operation(&self) -> &'static str {
        match self {
            Tool::InitScrumState => "initialize",
            Tool::LogDecision => "append_decision",
            Tool::UpsertBacklogItem => "upsert_backlog_item",
            Tool::SetPriority => "set_priority",
            Tool::AddImpediment => "append_impediment",
            Tool::AddRetroAction => "append_retro_action",
            Tool::PlanSprintBacklogItem => "upsert_sprint_plan_entry",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::InitScrumState => "Initialize all Scrum artifacts in session state if missing.",
            Tool::LogDecision => "Append a decision to decision_log.",
            Tool::UpsertBacklogItem => {
                "Add or update a product backlog item by id (preferred) or by title."
            }
            Tool::SetPriority => "Update priority for a backlog item.",
            Tool::AddImpediment => "Add an impediment to impediment_log.",
            Tool::AddRetroAction => "Add an action item from retrospectives.",
            Tool::PlanSprintBacklogItem => {
                "Add/update an item in sprint_backlog with implementation plan fields: approach, tasks, estimate, risks, test_approach, dod_checks."
            }
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tool {
    type Err = String;

    /// Accepts both the tool name and the operation name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Tool::ALL
            .into_iter()
            .find(|tool| tool.name() == s || tool.operation() == s)
            .ok_or_else(|| format!("unknown tool '{}'", s))
    }
}
