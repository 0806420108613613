//! Recipes, tags and ingredients owned by the authenticated user, plus recipe images.

pub mod api;
pub mod config;
pub mod contract;
pub mod domain;
pub mod gateways;
pub mod infra;
mod module;

pub use module::Recipes;

pub const MODULE_NAME: &str = "recipes";
