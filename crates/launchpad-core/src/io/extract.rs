//! Archive extraction through an external tool.
//!
//! `unzip` on Linux, `7z e` on Windows. The tool runs inside the working
//! directory with the archive file name as its last argument; its output is
//! relayed to the log, not parsed.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use launchpad_schema::Platform;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("no extraction command configured")]
    EmptyCommand,

    #[error("failed to start extraction tool '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extraction tool '{program}' failed: {status}")]
    Failed { program: String, status: ExitStatus },

    #[error("extraction tool '{program}' timed out after {} seconds", .timeout.as_secs())]
    TimedOut { program: String, timeout: Duration },
}

/// Program and leading arguments of an extraction tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ExtractCommand {
    /// The stock tool for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Linux => Self {
                program: "unzip".to_string(),
                args: Vec::new(),
            },
            Platform::Windows => Self {
                program: "7z".to_string(),
                args: vec!["e".to_string()],
            },
        }
    }

    /// Build from a full argv, e.g. `["tar", "-xf"]`.
    pub fn from_argv(argv: &[String]) -> Result<Self, ExtractError> {
        let (program, args) = argv.split_first().ok_or(ExtractError::EmptyCommand)?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

/// Run `command` against `archive_name` inside `work_dir`.
pub async fn extract(
    command: &ExtractCommand,
    archive_name: &str,
    work_dir: &Path,
    limit: Duration,
) -> Result<(), ExtractError> {
    tracing::info!("decompress zip {archive_name}");

    let child = Command::new(&command.program)
        .args(&command.args)
        .arg(archive_name)
        .current_dir(work_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ExtractError::Spawn {
            program: command.program.clone(),
            source,
        })?;

    // Dropping the future on timeout drops the child, which kills it.
    let output = match tokio::time::timeout(limit, child.wait_with_output()).await {
        Ok(result) => result.map_err(|source| ExtractError::Spawn {
            program: command.program.clone(),
            source,
        })?,
        Err(_) => {
            return Err(ExtractError::TimedOut {
                program: command.program.clone(),
                timeout: limit,
            });
        }
    };

    for line in String::from_utf8_lossy(&output.stdout).lines() {
        tracing::info!("{}: {line}", command.program);
    }
    for line in String::from_utf8_lossy(&output.stderr).lines() {
        tracing::warn!("{}: {line}", command.program);
    }

    if !output.status.success() {
        return Err(ExtractError::Failed {
            program: command.program.clone(),
            status: output.status,
        });
    }

    tracing::info!("unpack done");
    Ok(())
}
