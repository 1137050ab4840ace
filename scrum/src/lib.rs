//! Shared state core for a Scrum team of LLM personas.
//!
//! A root orchestrator delegates to five specialist personas (Product Owner,
//! Scrum Master, Development Team, QA, Architect). Routing is the model
//! runtime's job; this crate owns the shared Scrum State and the tools that
//! mutate it. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (state, entities, mutators,
//!   personas). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config, session files, prompt
//!   rendering, tool schemas).
//!
//! [`call`] and [`session`] coordinate core logic with I/O to serve tool calls
//! and the CLI.

pub mod call;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
