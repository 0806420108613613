//! HTTP API helpers shared by module REST layers.

pub mod problem;

pub use problem::{Problem, ProblemResponse, ValidationError, APPLICATION_PROBLEM_JSON};
