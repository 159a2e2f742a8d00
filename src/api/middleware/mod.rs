//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Session resolver: token → `UserContext` when one is presented
//! 2. Access gate: `require_auth` / `require_admin` on protected routes
//! 3. Audit logger: method, path, status and user id

pub mod audit;
pub mod auth;
