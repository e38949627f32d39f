//! Session and credential endpoints.
//!
//! All state-changing endpoints except login/register/reset require the
//! double-submit CSRF pair issued alongside the session cookies.

pub mod error;
pub mod login;
pub mod refresh;
pub mod register;
pub mod reset;
pub mod session;
pub mod types;

mod csrf;
mod lockout;
mod state;
mod storage;
mod utils;


pub use state::{AuthConfig, AuthState};
pub use storage::{PgSessionStore, SessionStore};
