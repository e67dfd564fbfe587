#![doc = "The `taskpilot` library crate."]
#![doc = ""]
#![doc = "Task-management REST backend with dual-token JWT sessions: short-lived access tokens"]
#![doc = "checked statelessly by `auth::AuthMiddleware`, and a single rotating refresh token per"]
#![doc = "user kept in the user store. The binary (`main.rs`) wires configuration, stores and"]
#![doc = "routes into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;

pub use crate::error::AppError;
pub use crate::state::AppState;
