//! Bundled resources — the descriptor template, the wrapper's .NET config
//! and, when the build supplied one, the wrapper executable itself.
//!
//! `build.rs` assembles `$OUT_DIR/bundle/` and `include_dir!` embeds it. A
//! `bundle.dir` override directory is consulted first, file by file.

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::{Context, Result};
use include_dir::{Dir, include_dir};

use crate::application::ports::ResourceBundle;
use crate::domain::TemplateError;

static EMBEDDED_BUNDLE: Dir<'_> = include_dir!("$OUT_DIR/bundle");

/// Return the raw bytes of a single embedded resource.
#[must_use]
pub fn embedded(name: &str) -> Option<&'static [u8]> {
    EMBEDDED_BUNDLE.get_file(name).map(|f| f.contents())
}

/// Names of all embedded resources.
pub fn embedded_names() -> impl Iterator<Item = &'static str> {
    EMBEDDED_BUNDLE
        .files()
        .filter_map(|f| f.path().to_str())
}

/// Production `ResourceBundle`: override directory first, then the
/// embedded bundle.
#[derive(Debug, Clone, Default)]
pub struct AssetBundle {
    override_dir: Option<PathBuf>,
}

impl AssetBundle {
    #[must_use]
    pub fn new(override_dir: Option<PathBuf>) -> Self {
        Self { override_dir }
    }
}

impl ResourceBundle for AssetBundle {
    fn resource(&self, name: &str) -> Result<Cow<'static, [u8]>> {
        if let Some(dir) = &self.override_dir {
            let path = dir.join(name);
            if path.is_file() {
                tracing::debug!(path = %path.display(), "using override resource");
                let bytes = std::fs::read(&path)
                    .with_context(|| format!("reading {}", path.display()))?;
                return Ok(Cow::Owned(bytes));
            }
        }
        embedded(name)
            .map(Cow::Borrowed)
            .ok_or_else(|| TemplateError::MissingResource { name: name.to_string() }.into())
    }
}
