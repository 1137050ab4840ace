//! Session: the state context handed to every tool call.
//!
//! A session owns its `ScrumState` from `open` until it is dropped. Tool calls
//! borrow the state mutably through [`Session::invoke`], so one call runs to
//! completion before the next can start. [`Session::commit`] writes the state
//! back to a store when something changed.

use anyhow::Result;
use tracing::{debug, info};

use crate::call::{Dispatcher, ToolCall, ToolResponse};
use crate::core::persona::Persona;
use crate::core::state::ScrumState;
use crate::io::session_store::{SessionStore, validate_session_id};

#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    state: ScrumState,
    dirty: bool,
}

impl Session {
    /// A fresh session with an empty (uninitialized) state.
    pub fn new(id: &str) -> Result<Self> {
        validate_session_id(id)?;
        Ok(Self {
            id: id.to_string(),
            state: ScrumState::default(),
            dirty: false,
        })
    }

    /// Resume `id` from `store`, or start it empty.
    pub fn open<S: SessionStore>(store: &S, id: &str) -> Result<Self> {
        validate_session_id(id)?;
        let state = store.load(id)?;
        let resumed = state.is_some();
        let session = Self {
            id: id.to_string(),
            state: state.unwrap_or_default(),
            dirty: false,
        };
        debug!(session = id, resumed, "session opened");
        Ok(session)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> &ScrumState {
        &self.state
    }

    /// True when the state changed since it was opened or last committed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Dispatch `call` for `persona` against this session's state.
    pub fn invoke(
        &mut self,
        dispatcher: &Dispatcher,
        persona: Persona,
        call: &ToolCall,
    ) -> Result<ToolResponse> {
        let before = self.state.clone();
        let response = dispatcher.dispatch(&mut self.state, persona, call)?;
        if self.state != before {
            self.dirty = true;
        }
        Ok(response)
    }

    /// Save the state if it changed. Returns whether a write happened.
    pub fn commit<S: SessionStore>(&mut self, store: &S) -> Result<bool> {
        if !self.dirty {
            debug!(session = %self.id, "nothing to commit");
            return Ok(false);
        }
        store.save(&self.id, &self.state)?;
        self.dirty = false;
        info!(session = %self.id, "session committed");
        Ok(true)
    }
}
