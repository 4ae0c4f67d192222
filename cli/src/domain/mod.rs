//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod layout;
pub mod macros;
pub mod node;
pub mod template;

pub use config::{AgentConfig, validate_config_key, validate_config_value};
pub use error::{ConfigError, InstallError, TemplateError};
pub use layout::{DeployLayout, generate_service_id};
pub use node::Platform;
pub use template::{DescriptorRequest, MacroProvider, render};
