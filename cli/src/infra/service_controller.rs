//! Infrastructure implementation of the `ServiceController` port.
//!
//! Runs the deployed wrapper through a `CommandRunner`. When Windows refuses
//! to start it with `ERROR_ELEVATION_REQUIRED`, the command is re-run once
//! through an elevated `Start-Process -Verb RunAs`, with the wrapper's output
//! redirected to a log file that is appended to the captured output.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{CommandRunner, ServiceController, WrapperRun};
use crate::domain::layout::WRAPPER_EXE;

/// `ERROR_ELEVATION_REQUIRED`.
pub const ERROR_ELEVATION_REQUIRED: i32 = 740;

/// File the elevated wrapper writes its output to, relative to the root.
pub const REDIRECT_LOG: &str = "redirect.log";

/// Production `ServiceController`.
#[derive(Debug, Clone)]
pub struct WrapperController<R> {
    runner: R,
}

impl<R: CommandRunner> WrapperController<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn run_elevated(&self, root: &Path, exe: &str, subcommand: &str) -> Result<WrapperRun> {
        tracing::info!(exe, subcommand, "elevation required; retrying through RunAs");
        let log = root.join(REDIRECT_LOG);
        match std::fs::remove_file(&log) {
            Ok(()) => tracing::debug!(path = %log.display(), "removed previous redirected output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("removing stale {}", log.display()));
            }
        }

        let script = elevated_script(exe, subcommand, root);
        let out = self
            .runner
            .run_in(
                "powershell.exe",
                &["-NoProfile", "-NonInteractive", "-Command", &script],
                root,
            )
            .await
            .context("failed to launch elevated wrapper")?;

        let mut run = to_wrapper_run(&out);
        match std::fs::read(&log) {
            Ok(bytes) => run.output.push_str(&String::from_utf8_lossy(&bytes)),
            Err(e) => tracing::warn!(path = %log.display(), error = %e, "no redirected output"),
        }
        Ok(run)
    }
}

impl<R: CommandRunner> ServiceController for WrapperController<R> {
    async fn run(&self, root: &Path, subcommand: &str) -> Result<WrapperRun> {
        let exe = root.join(WRAPPER_EXE);
        let exe = exe.to_string_lossy();
        match self.runner.run_in(&exe, &[subcommand], root).await {
            Ok(out) => Ok(to_wrapper_run(&out)),
            Err(e) if requires_elevation(&e) => self.run_elevated(root, &exe, subcommand).await,
            Err(e) => Err(e),
        }
    }
}

/// Whether `err` was caused by `ERROR_ELEVATION_REQUIRED`.
#[must_use]
pub fn requires_elevation(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<std::io::Error>())
        .any(|io| io.raw_os_error() == Some(ERROR_ELEVATION_REQUIRED))
}

/// PowerShell that runs the wrapper elevated, waits, and exits with its code.
#[must_use]
pub fn elevated_script(exe: &str, subcommand: &str, root: &Path) -> String {
    format!(
        "$p = Start-Process -FilePath {} -ArgumentList '/redirect','{REDIRECT_LOG}',{} \
         -WorkingDirectory {} -Verb RunAs -WindowStyle Hidden -Wait -PassThru; exit $p.ExitCode",
        ps_quote(exe),
        ps_quote(subcommand),
        ps_quote(&root.to_string_lossy()),
    )
}

fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn to_wrapper_run(out: &std::process::Output) -> WrapperRun {
    let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
    output.push_str(&String::from_utf8_lossy(&out.stderr));
    WrapperRun {
        code: out.status.code(),
        output,
    }
}
