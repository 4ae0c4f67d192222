//! Shared port doubles for unit tests.
//!
//! Each double records what it was asked to do so tests can assert on the
//! sequence of calls without touching a real service manager.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use winsvc_agent::application::ports::{
    OutcomeSink, ProgressReporter, ResourceBundle, RuntimePrerequisites, ServiceController,
    UpdateReport, WrapperRun,
};
use winsvc_agent::domain::TemplateError;
use winsvc_agent::domain::layout::{DESCRIPTOR, WRAPPER_CONFIG, WRAPPER_EXE};

// ── Executable images ────────────────────────────────────────────────────────

/// Byte image carrying a `VS_VERSIONINFO` resource with the given version.
pub fn exe_with_version(major: u16, minor: u16, patch: u16) -> Vec<u8> {
    let mut bytes = b"MZ\x90\x00 stub image".to_vec();
    // VS_VERSIONINFO header, then the UTF-16LE key and its padding
    bytes.extend_from_slice(&92u16.to_le_bytes());
    bytes.extend_from_slice(&52u16.to_le_bytes());
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend(
        "VS_VERSION_INFO\0"
            .encode_utf16()
            .flat_map(u16::to_le_bytes),
    );
    bytes.extend_from_slice(&[0, 0]);
    // VS_FIXEDFILEINFO
    bytes.extend_from_slice(&[0xBD, 0x04, 0xEF, 0xFE]);
    bytes.extend_from_slice(&0x0001_0000u32.to_le_bytes());
    bytes.extend_from_slice(&((u32::from(major) << 16) | u32::from(minor)).to_le_bytes());
    bytes.extend_from_slice(&(u32::from(patch) << 16).to_le_bytes());
    bytes.extend_from_slice(&[0u8; 36]);
    bytes
}

// ── Bundle ───────────────────────────────────────────────────────────────────

pub const TEMPLATE: &str = "<service>\n  <id>@ID@</id>\n  <executable>@JAVA@</executable>\n  \
                            <arguments>@VMARGS@ -jar \"%BASE%\\agent.jar\" @ARGS@</arguments>\n  \
                            @PAYLOAD_DOWNLOAD@\n</service>\n";

/// In-memory bundle holding a wrapper image, its config and a template.
pub struct MemBundle {
    files: HashMap<String, Vec<u8>>,
}

impl MemBundle {
    pub fn with_exe(exe: Vec<u8>) -> Self {
        let mut files = HashMap::new();
        files.insert(WRAPPER_EXE.to_string(), exe);
        files.insert(WRAPPER_CONFIG.to_string(), b"<configuration/>".to_vec());
        files.insert(DESCRIPTOR.to_string(), TEMPLATE.as_bytes().to_vec());
        Self { files }
    }

    pub fn without(mut self, name: &str) -> Self {
        self.files.remove(name);
        self
    }
}

impl ResourceBundle for MemBundle {
    fn resource(&self, name: &str) -> Result<Cow<'static, [u8]>> {
        self.files
            .get(name)
            .map(|b| Cow::Owned(b.clone()))
            .ok_or_else(|| {
                TemplateError::MissingResource {
                    name: name.to_string(),
                }
                .into()
            })
    }
}

// ── Prerequisites ────────────────────────────────────────────────────────────

pub struct FixedPrerequisites(pub Option<&'static str>);

impl RuntimePrerequisites for FixedPrerequisites {
    async fn missing(&self) -> Result<Option<String>> {
        Ok(self.0.map(str::to_string))
    }
}

// ── Service controller ───────────────────────────────────────────────────────

/// Records `(root, subcommand)` pairs and answers with a canned exit code.
#[derive(Clone, Default)]
pub struct RecordingController {
    pub calls: Arc<Mutex<Vec<(PathBuf, String)>>>,
    codes: Arc<HashMap<String, i32>>,
}

impl RecordingController {
    pub fn exiting(subcommand: &str, code: i32) -> Self {
        Self {
            calls: Arc::default(),
            codes: Arc::new(HashMap::from([(subcommand.to_string(), code)])),
        }
    }

    pub fn subcommands(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, s)| s.clone())
            .collect()
    }
}

impl ServiceController for RecordingController {
    async fn run(&self, root: &Path, subcommand: &str) -> Result<WrapperRun> {
        self.calls
            .lock()
            .unwrap()
            .push((root.to_path_buf(), subcommand.to_string()));
        let code = self.codes.get(subcommand).copied().unwrap_or(0);
        Ok(WrapperRun {
            code: Some(code),
            output: format!("{subcommand} exited {code}"),
        })
    }
}

// ── Reporting ────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter_map(|m| m.strip_prefix("warn: ").map(str::to_string))
            .collect()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("ok: {message}"));
    }

    fn warn(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("warn: {message}"));
    }
}

#[derive(Default)]
pub struct CollectingSink {
    pub reports: Mutex<Vec<UpdateReport>>,
}

impl CollectingSink {
    pub fn take(&self) -> Vec<UpdateReport> {
        std::mem::take(&mut *self.reports.lock().unwrap())
    }
}

impl OutcomeSink for CollectingSink {
    fn report(&self, report: &UpdateReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}
