//! User accounts: registration, token issuance and the caller's own profile.

pub mod api;
pub mod config;
pub mod contract;
pub mod domain;
pub mod gateways;
pub mod infra;
mod module;

pub use module::Users;

pub const MODULE_NAME: &str = "users";
