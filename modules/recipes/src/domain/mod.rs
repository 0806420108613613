pub mod error;
pub mod image;
pub mod ports;
pub mod service;
pub mod validation;
