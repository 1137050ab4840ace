//! Stable exit codes for scrum CLI commands.

/// Command succeeded (for `call`: the tool returned `status: ok`).
pub const OK: i32 = 0;
/// Command failed due to invalid input, config, session or other errors.
pub const INVALID: i32 = 1;
/// `scrum call` ran but the tool returned `status: error`.
pub const TOOL_ERROR: i32 = 2;
