//! Command implementations

pub mod config;
pub mod install;
pub mod render;
pub mod service_id;
pub mod update;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;

use crate::domain::AgentConfig;
use crate::domain::layout::{DeployLayout, quote_args};
use crate::domain::template::DescriptorRequest;

/// Descriptor inputs shared by `install` and `render`.
#[derive(Args, Debug, Default)]
pub struct DescriptorArgs {
    /// Java executable the service runs (default: JAVA_HOME\bin\java.exe)
    #[arg(long, value_name = "PATH")]
    pub java: Option<String>,

    /// JVM options (default: `service.vm_args` from config)
    #[arg(long, value_name = "OPTS", allow_hyphen_values = true)]
    pub vm_args: Option<String>,

    /// URL the service downloads the payload jar from on start
    #[arg(long, value_name = "URL")]
    pub payload_url: Option<String>,

    /// Arguments passed to the payload jar
    #[arg(last = true, value_name = "ARGS")]
    pub args: Vec<String>,
}

impl DescriptorArgs {
    /// Builds the render inputs for an agent living under `layout`.
    #[must_use]
    pub fn request(&self, config: &AgentConfig, layout: &DeployLayout) -> DescriptorRequest {
        let vm_args = self
            .vm_args
            .clone()
            .or_else(|| Some(config.service.vm_args.clone()).filter(|v| !v.is_empty()));
        DescriptorRequest {
            service_id: layout.service_id(&config.service.id_prefix),
            java: self.java.clone().unwrap_or_else(default_java),
            vm_args,
            args: quote_args(&self.args),
            explicit: std::collections::BTreeMap::new(),
        }
    }

    /// Result of the payload URL lookup.
    ///
    /// A blank `--payload-url` is a failed lookup rather than "no URL".
    #[must_use]
    pub fn payload_url(&self) -> Result<Option<String>, String> {
        match self.payload_url.as_deref().map(str::trim) {
            Some("") => Err("--payload-url is blank".to_string()),
            Some(url) => Ok(Some(url.to_string())),
            None => Ok(None),
        }
    }
}

/// `JAVA_HOME\bin\java.exe`, or plain `java` resolved through `PATH`.
fn default_java() -> String {
    std::env::var("JAVA_HOME")
        .ok()
        .filter(|home| !home.is_empty())
        .map_or_else(
            || "java".to_string(),
            |home| format!("{}\\bin\\java.exe", home.trim_end_matches(['\\', '/'])),
        )
}

/// Absolute form of a user-supplied agent root.
pub(crate) fn absolute_root(root: &Path) -> Result<PathBuf> {
    std::path::absolute(root)
        .with_context(|| format!("cannot resolve agent root {}", root.display()))
}
