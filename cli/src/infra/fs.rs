//! Filesystem infrastructure — implements `NodeFs` and `AgentNode` for the
//! machine this process runs on.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::{AgentNode, NodeFs};
use crate::domain::Platform;

/// Production filesystem implementation of `NodeFs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl NodeFs for LocalFs {
    fn exists(&self, path: &Path) -> Result<bool> {
        path.try_exists()
            .with_context(|| format!("checking {}", path.display()))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).with_context(|| format!("reading file {}", path.display()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        std::fs::write(path, bytes).with_context(|| format!("writing file {}", path.display()))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("removing file {}", path.display()))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        std::fs::rename(from, to)
            .with_context(|| format!("renaming {} to {}", from.display(), to.display()))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)
            .with_context(|| format!("creating directory {}", path.display()))
    }
}

/// The local machine, seen as a node whose agent lives under `root`.
#[derive(Debug, Clone)]
pub struct LocalNode {
    name: String,
    root: PathBuf,
    platform: Platform,
    fs: LocalFs,
}

impl LocalNode {
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            platform: Platform::current(),
            fs: LocalFs,
        }
    }

    /// Treat the node as a different OS family. Used to exercise the swap on
    /// hosts that are not Windows.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }
}

impl AgentNode for LocalNode {
    fn name(&self) -> &str {
        &self.name
    }

    fn platform(&self) -> Option<Platform> {
        Some(self.platform)
    }

    fn root(&self) -> &Path {
        &self.root
    }

    fn fs(&self) -> &dyn NodeFs {
        &self.fs
    }
}

/// Host name used when no node name is given.
#[must_use]
pub fn local_node_name() -> String {
    std::env::var("COMPUTERNAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "local".to_string())
}
