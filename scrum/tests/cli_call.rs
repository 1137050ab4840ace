//! CLI tests for `scrum call`, `show`, `tools` and `personas`.
//!
//! Spawns the scrum binary against a temp project and checks exit codes and
//! the JSON it prints.

use std::path::Path;
use std::process::{Command, Output};

use scrum::exit_codes;
use scrum::io::init::{InitOptions, init_scrum};
use serde_json::{Value, json};

fn scrum(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_scrum"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("run scrum")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn init_then_upsert_then_show() {
    let temp = tempfile::tempdir().expect("tempdir");
    let init = scrum(temp.path(), &["init"]);
    assert_eq!(init.status.code(), Some(exit_codes::OK));

    let call = scrum(
        temp.path(),
        &[
            "call",
            "--persona",
            "po",
            "--tool",
            "upsert_backlog_item",
            "--args",
            r#"{"item": {"title": "Login", "acceptance_criteria": "valid creds"}}"#,
        ],
    );
    assert_eq!(call.status.code(), Some(exit_codes::OK));
    assert_eq!(
        stdout_json(&call),
        json!({
            "status": "ok",
            "updated": false,
            "item": {"title": "Login", "acceptance_criteria": ["valid creds"]},
        })
    );

    let show = scrum(temp.path(), &["show", "--key", "product_backlog"]);
    assert_eq!(show.status.code(), Some(exit_codes::OK));
    assert_eq!(
        stdout_json(&show),
        json!([{"title": "Login", "acceptance_criteria": ["valid creds"]}])
    );
    assert!(temp.path().join(".scrum/sessions/default.json").is_file());
}

#[test]
fn set_priority_on_missing_item_exits_with_tool_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_scrum(temp.path(), &InitOptions { force: false }).expect("init");

    let output = scrum(
        temp.path(),
        &[
            "call",
            "--persona",
            "ProductOwner",
            "--tool",
            "set_priority",
            "--args",
            r#"{"title_or_id": "Nope", "priority": "P1"}"#,
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::TOOL_ERROR));
    assert_eq!(
        stdout_json(&output),
        json!({"status": "error", "message": "Item not found."})
    );
    assert!(!temp.path().join(".scrum/sessions/default.json").exists());
}

#[test]
fn tool_outside_allow_list_exits_with_tool_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_scrum(temp.path(), &InitOptions { force: false }).expect("init");

    let output = scrum(
        temp.path(),
        &[
            "call",
            "--persona",
            "qa",
            "--tool",
            "set_priority",
            "--args",
            r#"{"title_or_id": "Login", "priority": "P0"}"#,
            "--session",
            "sprint-1",
        ],
    );

    assert_eq!(output.status.code(), Some(exit_codes::TOOL_ERROR));
    assert_eq!(
        stdout_json(&output)["message"],
        json!("QA is not permitted to call set_priority.")
    );
}

#[test]
fn malformed_args_json_exits_invalid() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_scrum(temp.path(), &InitOptions { force: false }).expect("init");

    let output = scrum(
        temp.path(),
        &["call", "--persona", "sm", "--tool", "init_scrum_state", "--args", "{"],
    );

    assert_eq!(output.status.code(), Some(exit_codes::INVALID));
    assert!(String::from_utf8_lossy(&output.stderr).contains("parse --args as JSON"));
}

#[test]
fn sessions_lists_committed_sessions() {
    let temp = tempfile::tempdir().expect("tempdir");
    init_scrum(temp.path(), &InitOptions { force: false }).expect("init");
    for session in ["sprint-2", "sprint-1"] {
        let output = scrum(
            temp.path(),
            &[
                "call",
                "--persona",
                "orchestrator",
                "--tool",
                "init_scrum_state",
                "--session",
                session,
            ],
        );
        assert_eq!(output.status.code(), Some(exit_codes::OK));
    }

    let output = scrum(temp.path(), &["sessions"]);
    assert_eq!(String::from_utf8_lossy(&output.stdout), "sprint-1\nsprint-2\n");
}

#[test]
fn tools_for_persona_follow_allow_list() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = scrum(temp.path(), &["tools", "--persona", "dev"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let names: Vec<String> = stdout_json(&output)
        .as_array()
        .expect("array")
        .iter()
        .map(|decl| decl["name"].as_str().expect("name").to_string())
        .collect();
    assert_eq!(
        names,
        [
            "init_scrum_state",
            "plan_sprint_backlog_item",
            "add_impediment",
            "log_decision",
        ]
    );
}

#[test]
fn personas_prints_configured_models() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = scrum(temp.path(), &["personas"]);
    assert_eq!(output.status.code(), Some(exit_codes::OK));

    let personas = stdout_json(&output);
    let personas = personas.as_array().expect("array");
    assert_eq!(personas.len(), 6);
    assert_eq!(personas[0]["name"], json!("ScrumOrchestrator"));
    assert_eq!(personas[0]["model"], json!("scrum-orchestrator"));
}
