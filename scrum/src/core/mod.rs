//! Deterministic, pure logic for the Scrum state.
//!
//! Core modules must be free of I/O side effects. They operate on the
//! in-memory session state and return structured outcomes suitable for tests.

pub mod entities;
pub mod mutators;
pub mod outcome;
pub mod persona;
pub mod state;
