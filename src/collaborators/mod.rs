/*!
# Collaborators module
Wrappers around the external tools the pipeline hands work to: phasing, imputation, and liftover.
Each tool runs synchronously with a timeout; when a tool fails, anything it partially wrote is removed.
*/
/// Imputation with minimac4
pub mod imputation;
/// Coordinate liftover with CrossMap
pub mod liftover;
/// Phasing with eagle
pub mod phasing;

use anyhow::Context;
use derive_builder::Builder;
use log::{debug, error, info, warn};
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::errors::CoreError;

/// Controls how external tools are launched
#[derive(Builder, Clone, Debug, PartialEq)]
#[builder(default)]
pub struct CollaboratorConfig {
    /// Thread count handed to each tool
    threads: usize,
    /// Wall-clock limit for a single tool run
    timeout: Duration,
    /// How often we check on a running tool
    poll_interval: Duration,
    /// Phasing executable
    eagle_exe: PathBuf,
    /// Imputation executable
    minimac_exe: PathBuf,
    /// Liftover executable
    crossmap_exe: PathBuf
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            timeout: Duration::from_secs(60 * 60),
            poll_interval: Duration::from_millis(250),
            eagle_exe: PathBuf::from("eagle"),
            minimac_exe: PathBuf::from("minimac4"),
            crossmap_exe: PathBuf::from("CrossMap")
        }
    }
}

impl CollaboratorConfig {
    // getters
    pub fn threads(&self) -> usize {
        self.threads
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn eagle_exe(&self) -> &Path {
        &self.eagle_exe
    }

    pub fn minimac_exe(&self) -> &Path {
        &self.minimac_exe
    }

    pub fn crossmap_exe(&self) -> &Path {
        &self.crossmap_exe
    }
}

/// One fully specified run of an external tool
#[derive(Clone, Debug)]
pub struct ToolInvocation {
    /// Short name for messages
    pub tool: String,
    /// Executable to launch
    pub program: PathBuf,
    /// Command line arguments
    pub args: Vec<OsString>,
    /// Files the tool creates; removed if the run fails
    pub outputs: Vec<PathBuf>,
    /// Captures both stdout and stderr of the tool
    pub log_fn: PathBuf
}

impl ToolInvocation {
    /// Renders the command for logging
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs a tool to completion, killing it if it runs past the configured timeout.
/// # Arguments
/// * `invocation` - what to run and what it writes
/// * `config` - timeout and polling settings
/// # Errors
/// * `CoreError::Collaborator` if the tool cannot start, exits non-zero, or times out
pub fn run_tool(invocation: &ToolInvocation, config: &CollaboratorConfig) -> anyhow::Result<()> {
    info!("Running {}...", invocation.tool);
    debug!("Command: {}", invocation.command_line());
    let start_time = Instant::now();

    let result = launch_and_wait(invocation, config);
    if let Err(e) = result.as_ref() {
        error!("{} failed after {:.1} seconds: {e:#}", invocation.tool, start_time.elapsed().as_secs_f64());
        remove_partial_outputs(&invocation.outputs);
        return result;
    }

    info!("{} finished in {:.1} seconds.", invocation.tool, start_time.elapsed().as_secs_f64());
    Ok(())
}

fn launch_and_wait(invocation: &ToolInvocation, config: &CollaboratorConfig) -> anyhow::Result<()> {
    let tool_error = |reason: String| CoreError::Collaborator { tool: invocation.tool.clone(), reason };

    let log_file = File::create(&invocation.log_fn)
        .with_context(|| format!("Error while creating {:?}:", invocation.log_fn))?;
    let log_clone = log_file.try_clone()
        .with_context(|| format!("Error while opening {:?}:", invocation.log_fn))?;

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log_file))
        .stderr(Stdio::from(log_clone))
        .spawn()
        .map_err(|e| tool_error(format!("could not launch {:?}: {e}", invocation.program)))?;

    let deadline = Instant::now() + config.timeout;
    let status: ExitStatus = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            warn!("{} exceeded the {:?} timeout, terminating...", invocation.tool, config.timeout);
            // the process may have exited between the check and the kill
            let _ = child.kill();
            let _ = child.wait();
            return Err(tool_error(format!("timed out after {:?}", config.timeout)).into());
        }
        std::thread::sleep(config.poll_interval.min(deadline.saturating_duration_since(Instant::now())));
    };

    if !status.success() {
        let log_tail = read_log_tail(&invocation.log_fn);
        return Err(tool_error(format!("exited with {status}; log tail: {log_tail:?}")).into());
    }
    Ok(())
}

/// Pulls the last few lines of a tool log, best effort
fn read_log_tail(log_fn: &Path) -> String {
    const TAIL_LINES: usize = 5;
    match std::fs::read_to_string(log_fn) {
        Ok(text) => {
            let lines: Vec<&str> = text.lines().collect();
            lines[lines.len().saturating_sub(TAIL_LINES)..].join(" | ")
        },
        Err(_) => String::new()
    }
}

/// Deletes any outputs that a failed tool left behind
fn remove_partial_outputs(outputs: &[PathBuf]) {
    for output in outputs.iter().filter(|o| o.exists()) {
        debug!("Removing partial output {output:?}");
        if let Err(e) = std::fs::remove_file(output) {
            warn!("Error while removing partial output {output:?}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shell(script: &str, folder: &Path, outputs: Vec<PathBuf>) -> ToolInvocation {
        ToolInvocation {
            tool: "mock".to_string(),
            program: PathBuf::from("sh"),
            args: vec!["-c".into(), script.into()],
            outputs,
            log_fn: folder.join("mock.log")
        }
    }

    #[test]
    fn test_successful_run() {
        let folder = tempfile::tempdir().unwrap();
        let out_fn = folder.path().join("out.txt");
        let script = format!("echo done > {}", out_fn.display());
        run_tool(&shell(&script, folder.path(), vec![out_fn.clone()]), &CollaboratorConfig::default()).unwrap();
        assert_eq!(std::fs::read_to_string(&out_fn).unwrap(), "done\n");
    }

    #[test]
    fn test_failed_run_cleans_up() {
        let folder = tempfile::tempdir().unwrap();
        let out_fn = folder.path().join("out.txt");
        let script = format!("echo partial > {}; echo bad input >&2; exit 3", out_fn.display());
        let error = run_tool(&shell(&script, folder.path(), vec![out_fn.clone()]), &CollaboratorConfig::default()).unwrap_err();
        match error.downcast_ref::<CoreError>() {
            Some(CoreError::Collaborator { tool, reason }) => {
                assert_eq!(tool, "mock");
                assert!(reason.contains("bad input"));
            },
            other => panic!("unexpected error: {other:?}")
        }
        assert!(!out_fn.exists());
    }

    #[test]
    fn test_timeout() {
        let folder = tempfile::tempdir().unwrap();
        let out_fn = folder.path().join("out.txt");
        let script = format!("echo partial > {}; sleep 10", out_fn.display());
        let config = CollaboratorConfigBuilder::default()
            .timeout(Duration::from_millis(300))
            .poll_interval(Duration::from_millis(20))
            .build().unwrap();

        let start = Instant::now();
        let error = run_tool(&shell(&script, folder.path(), vec![out_fn.clone()]), &config).unwrap_err();
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(matches!(error.downcast_ref::<CoreError>(), Some(CoreError::Collaborator { .. })));
        assert!(!out_fn.exists());
    }

    #[test]
    fn test_missing_program() {
        let folder = tempfile::tempdir().unwrap();
        let invocation = ToolInvocation {
            tool: "missing".to_string(),
            program: PathBuf::from("definitely-not-a-real-tool-name"),
            args: vec![],
            outputs: vec![],
            log_fn: folder.path().join("missing.log")
        };
        let error = run_tool(&invocation, &CollaboratorConfig::default()).unwrap_err();
        assert!(matches!(error.downcast_ref::<CoreError>(), Some(CoreError::Collaborator { .. })));
    }
}
