//! Infrastructure implementation of the `RuntimePrerequisites` port.

use anyhow::Result;

use crate::application::ports::{CommandRunner, RuntimePrerequisites};

/// Registry keys of .NET Framework releases the wrapper can run on.
const DOTNET_KEYS: &[&str] = &[
    r"HKLM\SOFTWARE\Microsoft\NET Framework Setup\NDP\v4\Full",
    r"HKLM\SOFTWARE\Microsoft\NET Framework Setup\NDP\v2.0.50727",
];

pub const DOTNET_REQUIREMENT: &str = ".NET Framework 2.0 or later";

/// Probes the Windows registry for an installed .NET Framework.
#[derive(Debug, Clone)]
pub struct DotNetProbe<R> {
    runner: R,
}

impl<R: CommandRunner> DotNetProbe<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }
}

impl<R: CommandRunner> RuntimePrerequisites for DotNetProbe<R> {
    async fn missing(&self) -> Result<Option<String>> {
        if !cfg!(windows) {
            return Ok(Some(format!("{DOTNET_REQUIREMENT} (Windows only)")));
        }
        for key in DOTNET_KEYS {
            match self.runner.run("reg", &["query", key, "/v", "Install"]).await {
                Ok(out) if out.status.success() && install_flag_set(&out.stdout) => {
                    tracing::debug!(key, ".NET Framework found");
                    return Ok(None);
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(key, error = ?e, "registry probe failed"),
            }
        }
        Ok(Some(DOTNET_REQUIREMENT.to_string()))
    }
}

/// `reg query ... /v Install` prints `Install    REG_DWORD    0x1` when set.
fn install_flag_set(stdout: &[u8]) -> bool {
    String::from_utf8_lossy(stdout).lines().any(|line| {
        let mut fields = line.split_whitespace();
        fields.next() == Some("Install")
            && fields.next() == Some("REG_DWORD")
            && fields.next() == Some("0x1")
    })
}
