//! Session state persistence.
//!
//! The [`SessionStore`] trait decouples sessions from where their state lives.
//! The CLI uses [`FileSessionStore`] (`.scrum/sessions/<id>.json`); tests and
//! embedding runtimes can use [`MemorySessionStore`].

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::debug;

use crate::core::state::ScrumState;

static SESSION_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("session id pattern should be valid"));

/// Reject ids that could escape the session directory or are empty.
pub fn validate_session_id(id: &str) -> Result<()> {
    if !SESSION_ID_RE.is_match(id) {
        bail!(
            "invalid session id '{}': use letters, digits, '_' or '-'",
            id
        );
    }
    Ok(())
}

/// Abstraction over session state backends.
pub trait SessionStore {
    /// Stored state for `id`, or `None` if the session has never been saved.
    fn load(&self, id: &str) -> Result<Option<ScrumState>>;

    /// Replace the stored state for `id`.
    fn save(&self, id: &str, state: &ScrumState) -> Result<()>;

    /// Ids of all stored sessions, sorted.
    fn list(&self) -> Result<Vec<String>>;
}

/// One pretty-printed JSON file per session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    dir: PathBuf,
}

impl FileSessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, id: &str) -> Result<Option<ScrumState>> {
        validate_session_id(id)?;
        let path = self.path_for(id);
        if !path.exists() {
            debug!(session = id, path = %path.display(), "no stored session");
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("read session {}", path.display()))?;
        let state: ScrumState = serde_json::from_str(&contents)
            .with_context(|| format!("parse session {}", path.display()))?;
        debug!(
            session = id,
            backlog = state.product_backlog().len(),
            decisions = state.decision_log().len(),
            "session loaded"
        );
        Ok(Some(state))
    }

    fn save(&self, id: &str, state: &ScrumState) -> Result<()> {
        validate_session_id(id)?;
        let path = self.path_for(id);
        debug!(session = id, path = %path.display(), "writing session");
        let mut buf = serde_json::to_string_pretty(state).context("serialize session state")?;
        buf.push('\n');
        write_atomic(&path, &buf)
    }

    fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("read session dir {}", self.dir.display()))?;
        let mut ids = Vec::new();
        for entry in entries {
            let path = entry
                .with_context(|| format!("read session dir {}", self.dir.display()))?
                .path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if SESSION_ID_RE.is_match(stem) => ids.push(stem.to_string()),
                _ => {}
            }
        }
        ids.sort();
        Ok(ids)
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("session path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp session {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace session {}", path.display()))?;
    Ok(())
}

/// In-process store; state is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RefCell<BTreeMap<String, ScrumState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<ScrumState>> {
        validate_session_id(id)?;
        Ok(self.sessions.borrow().get(id).cloned())
    }

    fn save(&self, id: &str, state: &ScrumState) -> Result<()> {
        validate_session_id(id)?;
        self.sessions
            .borrow_mut()
            .insert(id.to_string(), state.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        Ok(self.sessions.borrow().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mutators::{initialize, upsert_backlog_item};
    use crate::test_support::backlog_item;

    /// Verifies save → load preserves artifacts.
    #[test]
    fn file_store_round_trips_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(temp.path().join("sessions"));

        let mut state = ScrumState::default();
        initialize(&mut state);
        upsert_backlog_item(&mut state, backlog_item("Login"));

        store.save("sprint-1", &state).expect("save");
        let loaded = store.load("sprint-1").expect("load");
        assert_eq!(loaded, Some(state));
        assert!(!store.path_for("sprint-1").with_extension("json.tmp").exists());
    }

    #[test]
    fn file_store_missing_session_is_none() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(temp.path());
        assert_eq!(store.load("nope").expect("load"), None);
    }

    /// Keys that were never initialized stay absent on disk.
    #[test]
    fn file_store_writes_only_present_keys() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(temp.path());
        let state = ScrumState {
            sprint_goal: Some("Checkout".to_string()),
            ..ScrumState::default()
        };

        store.save("s", &state).expect("save");
        let contents = fs::read_to_string(store.path_for("s")).expect("read");
        assert_eq!(contents, "{\n  \"sprint_goal\": \"Checkout\"\n}\n");
    }

    #[test]
    fn file_store_lists_sessions_sorted() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(temp.path());
        assert!(store.list().expect("list empty").is_empty());

        store.save("b", &ScrumState::default()).expect("save b");
        store.save("a", &ScrumState::default()).expect("save a");
        fs::write(temp.path().join("notes.txt"), "x").expect("write stray file");

        assert_eq!(store.list().expect("list"), vec!["a", "b"]);
    }

    #[test]
    fn rejects_path_like_session_ids() {
        let temp = tempfile::tempdir().expect("tempdir");
        let store = FileSessionStore::new(temp.path());
        let err = store
            .save("../escape", &ScrumState::default())
            .expect_err("expected error");
        assert!(err.to_string().contains("invalid session id"));
        assert!(validate_session_id("").is_err());
        assert!(validate_session_id("team_a-2").is_ok());
    }

    #[test]
    fn memory_store_round_trips_state() {
        let store = MemorySessionStore::new();
        let mut state = ScrumState::default();
        initialize(&mut state);

        assert_eq!(store.load("s").expect("load"), None);
        store.save("s", &state).expect("save");
        assert_eq!(store.load("s").expect("load"), Some(state));
        assert_eq!(store.list().expect("list"), vec!["s"]);
    }
}
