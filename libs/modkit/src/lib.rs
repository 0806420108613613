//! # ModKit - Module System
//!
//! Small composition kit for the server: modules declare capabilities by
//! implementing traits and the runner drives them through ordered phases.
//!
//! ## Phases
//!
//! init → DB migrate → REST (sync router composition) → start → wait → stop
//!
//! ## Example
//!
//! ```rust,ignore
//! use modkit::{RegistryBuilder, Module, DbModule, RestfulModule};
//!
//! let mut b = RegistryBuilder::default();
//! let users = Arc::new(Users::default());
//! b.register_core_with_meta("users", &[], users.clone());
//! b.register_db_with_meta("users", users.clone());
//! b.register_rest_with_meta("users", users);
//! let registry = b.build_topo_sorted()?;
//! ```

pub use anyhow::Result;
pub use async_trait::async_trait;

pub mod contracts;
pub use crate::contracts::*;

pub mod context;
pub use context::{ConfigProvider, ModuleCtx, ModuleCtxBuilder};

pub mod client_hub;
pub mod registry;

pub use client_hub::ClientHub;
pub use registry::{ModuleRegistry, RegistryBuilder, RegistryError};

pub mod api;
pub use api::problem::{
    bad_request, conflict, internal_error, not_found, unauthorized, Problem, ProblemResponse,
    ValidationError,
};

pub mod runtime;
pub use runtime::{run, DbOptions, RunOptions, ShutdownOptions};
