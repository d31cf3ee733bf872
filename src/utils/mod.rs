//! Configuration utilities.

/// TOML configuration loading, validation and the live config manager.
pub mod toml_config;
