//! Flow2API Configuration Library
//!
//! Layered configuration for the Flow2API server: a TOML file, environment
//! variable overrides, and runtime overrides set after startup.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;
