//! API route handlers.
//!
//! Auth endpoints live under [`auth`]; `health` and `root` are operational
//! routes with no session semantics.

pub mod auth;
pub mod health;
pub mod root;
