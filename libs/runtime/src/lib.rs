//! Process-level runtime support shared by the server binary and modules:
//! layered configuration, logging bootstrap and home directory resolution.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{
    default_logging_config, AppConfig, AppConfigProvider, AuthConfig, CliArgs, ConfigProvider,
    DatabaseConfig, LoggingConfig, Section, ServerConfig,
};
