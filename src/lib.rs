//! Typed service settings loaded from environment variables.
pub mod domain;
pub mod models;
pub mod services;

/// Bare variable injected by hosting platforms; replaces the external port.
pub const PORT_OVERRIDE_VAR: &str = "PORT";
