//! Running the verified executable.
//!
//! The child gets no arguments and the host's environment. Its stdout and
//! stderr are relayed line by line from two tasks, so ordering between the
//! two streams is best-effort.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// How long output may keep flowing after the child has exited.
const RELAY_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} exited with code {code}", .path.display())]
    NonZeroExit { path: PathBuf, code: i32 },

    #[error("{} was terminated by a signal", .path.display())]
    Signalled { path: PathBuf },

    #[error("{} did not finish within {} seconds", .path.display(), .timeout.as_secs())]
    TimedOut { path: PathBuf, timeout: Duration },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Exit code of a finished child plus the writers its output went to.
#[derive(Debug)]
pub struct Relayed<O, E> {
    pub code: i32,
    pub stdout: O,
    pub stderr: E,
}

/// Run `path`, relaying its output to the host's stdout/stderr.
///
/// A non-zero exit is an error; its code is only part of the diagnostic.
pub async fn launch(path: &Path, limit: Option<Duration>) -> Result<(), LaunchError> {
    tracing::info!("start {}", path.display());
    let relayed = run_relayed(path, limit, tokio::io::stdout(), tokio::io::stderr()).await?;
    if relayed.code != 0 {
        return Err(LaunchError::NonZeroExit {
            path: path.to_path_buf(),
            code: relayed.code,
        });
    }
    Ok(())
}

/// Run `path` and copy its output into `out` and `err` as it arrives.
///
/// Returns whatever exit code the child produced, zero or not.
pub async fn run_relayed<O, E>(
    path: &Path,
    limit: Option<Duration>,
    out: O,
    err: E,
) -> Result<Relayed<O, E>, LaunchError>
where
    O: AsyncWrite + Unpin + Send + 'static,
    E: AsyncWrite + Unpin + Send + 'static,
{
    let spawn_error = |source| LaunchError::Spawn {
        path: path.to_path_buf(),
        source,
    };

    ensure_executable(path).await.map_err(spawn_error)?;

    let mut child = Command::new(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(spawn_error)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("child stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("child stderr not captured"))?;

    let started = Instant::now();
    let (stop, stopped) = watch::channel(false);
    let mut out_task = relay_lines(stdout, out, stopped.clone());
    let mut err_task = relay_lines(stderr, err, stopped);

    let status = match limit {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                child.kill().await?;
                out_task.abort();
                err_task.abort();
                return Err(LaunchError::TimedOut {
                    path: path.to_path_buf(),
                    timeout: limit,
                });
            }
        },
        None => child.wait().await?,
    };

    // Anything the child left running may still hold the pipes open.
    let grace = match limit {
        Some(limit) => limit
            .saturating_sub(started.elapsed())
            .min(RELAY_DRAIN_TIMEOUT),
        None => RELAY_DRAIN_TIMEOUT,
    };
    let deadline = Instant::now() + grace;
    let stdout = finish_relay(&mut out_task, deadline, &stop).await?;
    let stderr = finish_relay(&mut err_task, deadline, &stop).await?;

    let code = status.code().ok_or_else(|| LaunchError::Signalled {
        path: path.to_path_buf(),
    })?;
    tracing::debug!("{} exited with code {code}", path.display());

    Ok(Relayed {
        code,
        stdout,
        stderr,
    })
}

fn relay_lines<R, W>(
    reader: R,
    mut writer: W,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<std::io::Result<W>>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            tokio::select! {
                read = reader.read_until(b'\n', &mut line) => {
                    if read? == 0 {
                        break;
                    }
                }
                _ = stop.changed() => break,
            }
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        // Keep a partial line that was read before being told to stop.
        if !line.is_empty() {
            writer.write_all(&line).await?;
            writer.flush().await?;
        }
        Ok(writer)
    })
}

/// Join a relay task, telling every relay to stop once `deadline` passes.
async fn finish_relay<W>(
    task: &mut JoinHandle<std::io::Result<W>>,
    deadline: Instant,
    stop: &watch::Sender<bool>,
) -> Result<W, LaunchError> {
    let joined = match tokio::time::timeout_at(deadline, &mut *task).await {
        Ok(joined) => joined,
        Err(_) => {
            tracing::warn!("output pipes still open after exit, detaching");
            stop.send_replace(true);
            task.await
        }
    };
    Ok(joined.map_err(std::io::Error::other)??)
}

/// Archives built elsewhere may not carry the execute bit.
#[cfg(unix)]
async fn ensure_executable(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    if perms.mode() & 0o111 != 0o111 {
        perms.set_mode(0o755);
        tokio::fs::set_permissions(path, perms).await?;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn ensure_executable(path: &Path) -> std::io::Result<()> {
    tokio::fs::metadata(path).await.map(|_| ())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        path
    }

    #[tokio::test]
    async fn relays_both_streams_and_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(
            dir.path(),
            "app",
            "echo one; echo two; echo oops >&2; exit 3",
        );

        let relayed = run_relayed(&path, None, Vec::new(), Vec::new())
            .await
            .unwrap();

        assert_eq!(relayed.code, 3);
        assert_eq!(relayed.stdout, b"one\ntwo\n");
        assert_eq!(relayed.stderr, b"oops\n");
    }

    #[tokio::test]
    async fn marks_file_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "app", "exit 0");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        launch(&path, None).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn non_zero_exit_is_a_launch_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "app", "exit 7");

        let err = launch(&path, None).await.unwrap_err();

        assert!(matches!(err, LaunchError::NonZeroExit { code: 7, .. }));
    }

    #[tokio::test]
    async fn missing_executable_cannot_start() {
        let dir = tempfile::tempdir().unwrap();

        let err = launch(&dir.path().join("absent"), None).await.unwrap_err();

        assert!(matches!(err, LaunchError::Spawn { .. }));
    }

    #[tokio::test]
    async fn hung_child_is_killed_after_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "app", "exec sleep 30");

        let err = launch(&path, Some(Duration::from_millis(200)))
            .await
            .unwrap_err();

        assert!(matches!(err, LaunchError::TimedOut { .. }));
    }

    #[tokio::test]
    async fn background_child_does_not_hold_launch_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = script(dir.path(), "app", "echo started\nsleep 20 &\nexit 0");

        let relayed = tokio::time::timeout(
            Duration::from_secs(10),
            run_relayed(&path, Some(Duration::from_secs(2)), Vec::new(), Vec::new()),
        )
        .await
        .expect("launch should return once the child exits")
        .unwrap();

        assert_eq!(relayed.code, 0);
        assert_eq!(relayed.stdout, b"started\n");
    }
}
