//! drawsync Application
//!
//! Headless shell around a drawing session: loads configuration, replays a
//! script of user actions, relays operations and exports the result.

mod action;
mod app;

pub use action::{Action, ScriptError, load_script};
pub use app::{App, AppError, AppOptions, RunSummary};
