//! Shared configuration library for Gatehouse.
//!
//! This crate centralizes config loading and validation for the two
//! Gatehouse binaries. Values are resolved from three layers, strongest
//! first: environment variables, an optional `gatehouse.toml`, then
//! built-in defaults. Both `gatehouse-server` and `gatehouse-sso` load
//! through here so defaults and guard rails have a single source of truth.

#![allow(missing_docs)]

pub mod constants;
pub mod loader;
pub mod models;
pub mod sources;
pub mod validation;

pub use loader::{ConfigLoad, ConfigLoadError, ConfigLoader, ConfigLoaderOptions};
pub use models::{
    AuthConfig, Config, ConfigMetadata, DatabaseConfig, ServerConfig, SsoConfig, SweeperConfig,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
