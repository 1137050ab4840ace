//! Scrum team state CLI.
//!
//! Hosts a Scrum team session on disk (`.scrum/sessions/<id>.json`) and
//! exposes the persona tools as commands, so an agent runtime or a human can
//! apply tool calls and inspect the shared artifacts.

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use scrum::call::{Dispatcher, ToolCall};
use scrum::core::persona::{Persona, Tool};
use scrum::core::state::StateKey;
use scrum::exit_codes;
use scrum::io::config::{ScrumConfig, load_config};
use scrum::io::init::{InitOptions, ScrumPaths, init_scrum};
use scrum::io::prompt::PromptRenderer;
use scrum::io::session_store::{FileSessionStore, SessionStore};
use scrum::io::tool_schema::ToolSchemas;
use scrum::logging;
use scrum::session::Session;

#[derive(Parser)]
#[command(
    name = "scrum",
    version,
    about = "Shared Scrum artifacts for a team of LLM personas"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.scrum/` with a default config.
    Init {
        /// Overwrite the existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Apply one tool call as a persona and print the outcome JSON.
    Call {
        /// Calling persona (e.g. `po`, `ScrumMaster`, `dev`).
        #[arg(short, long)]
        persona: Persona,
        /// Tool or operation name (e.g. `upsert_backlog_item`).
        #[arg(short, long)]
        tool: String,
        /// Tool arguments as a JSON object.
        #[arg(short, long)]
        args: Option<String>,
        /// Session id (defaults to `default_session` from config).
        #[arg(short, long)]
        session: Option<String>,
    },
    /// Print the session state, or one key of it.
    Show {
        #[arg(short, long)]
        session: Option<String>,
        #[arg(short, long)]
        key: Option<StateKey>,
    },
    /// Print persona declarations for the agent runtime.
    Personas,
    /// Print tool declarations, optionally for one persona.
    Tools {
        #[arg(short, long)]
        persona: Option<Persona>,
    },
    /// Print the rendered instructions for a persona.
    Prompt {
        #[arg(short, long)]
        persona: Persona,
        /// Summarise this session's artifacts in the prompt.
        #[arg(short, long)]
        session: Option<String>,
    },
    /// List stored sessions.
    Sessions,
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve current directory")?;
    match cli.command {
        Command::Init { force } => cmd_init(&root, force),
        Command::Call {
            persona,
            tool,
            args,
            session,
        } => cmd_call(&root, persona, tool, args.as_deref(), session),
        Command::Show { session, key } => cmd_show(&root, session, key),
        Command::Personas => cmd_personas(&root),
        Command::Tools { persona } => cmd_tools(persona),
        Command::Prompt { persona, session } => cmd_prompt(&root, persona, session),
        Command::Sessions => cmd_sessions(&root),
    }
}

/// Config plus the store it points at.
struct Workspace {
    cfg: ScrumConfig,
    store: FileSessionStore,
}

impl Workspace {
    fn load(root: &Path) -> Result<Self> {
        let paths = ScrumPaths::new(root);
        let cfg = load_config(&paths.config_path)?;
        let store = FileSessionStore::new(paths.sessions_dir(&cfg));
        Ok(Self { cfg, store })
    }

    fn session_id(&self, requested: Option<String>) -> String {
        requested.unwrap_or_else(|| self.cfg.default_session.clone())
    }
}

fn cmd_init(root: &Path, force: bool) -> Result<i32> {
    let paths = init_scrum(root, &InitOptions { force })?;
    println!("initialized {}", paths.scrum_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_call(
    root: &Path,
    persona: Persona,
    tool: String,
    args: Option<&str>,
    session: Option<String>,
) -> Result<i32> {
    let ws = Workspace::load(root)?;
    let args: Value = match args {
        Some(raw) => serde_json::from_str(raw).context("parse --args as JSON")?,
        None => Value::Null,
    };
    let id = ws.session_id(session);
    let mut session = Session::open(&ws.store, &id)?;
    let dispatcher = Dispatcher::new()?;

    let response = session.invoke(&dispatcher, persona, &ToolCall::new(tool, args))?;
    session.commit(&ws.store)?;

    print_json(&response.body)?;
    Ok(if response.ok {
        exit_codes::OK
    } else {
        exit_codes::TOOL_ERROR
    })
}

fn cmd_show(root: &Path, session: Option<String>, key: Option<StateKey>) -> Result<i32> {
    let ws = Workspace::load(root)?;
    let id = ws.session_id(session);
    let session = Session::open(&ws.store, &id)?;
    match key {
        Some(key) => {
            let value = session
                .state()
                .get(key)
                .with_context(|| format!("serialize {}", key))?;
            print_json(&value.unwrap_or(Value::Null))?;
        }
        None => print_json(session.state())?,
    }
    Ok(exit_codes::OK)
}

fn cmd_personas(root: &Path) -> Result<i32> {
    let ws = Workspace::load(root)?;
    let declarations: Vec<_> = Persona::ALL
        .iter()
        .map(|persona| persona.declare(ws.cfg.models.alias_for(*persona)))
        .collect();
    print_json(&declarations)?;
    if let Some(base) = ws.cfg.proxy_api_base() {
        eprintln!("model proxy: {} (key from ${})", base, ws.cfg.proxy.api_key_env);
    }
    Ok(exit_codes::OK)
}

fn cmd_tools(persona: Option<Persona>) -> Result<i32> {
    let schemas = ToolSchemas::load()?;
    let declarations = match persona {
        Some(persona) => schemas.declarations(persona),
        None => Tool::ALL
            .iter()
            .map(|tool| schemas.declaration(*tool))
            .collect(),
    };
    print_json(&declarations)?;
    Ok(exit_codes::OK)
}

fn cmd_prompt(root: &Path, persona: Persona, session: Option<String>) -> Result<i32> {
    let ws = Workspace::load(root)?;
    let session = match session {
        Some(id) => Some(Session::open(&ws.store, &id)?),
        None => None,
    };
    let renderer = PromptRenderer::new(ws.cfg.prompt_budget_bytes)?;
    let prompt = renderer.render(persona, session.as_ref().map(Session::state))?;
    println!("{}", prompt);
    Ok(exit_codes::OK)
}

fn cmd_sessions(root: &Path) -> Result<i32> {
    let ws = Workspace::load(root)?;
    for id in ws.store.list()? {
        println!("{}", id);
    }
    Ok(exit_codes::OK)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let payload = serde_json::to_string_pretty(value).context("serialize json")?;
    println!("{}", payload);
    Ok(())
}
