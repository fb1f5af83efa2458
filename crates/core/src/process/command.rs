//! Tokio-based process runner.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ProcessError;
use super::traits::ProcessRunner;

/// Upper bound on the stderr kept for diagnostics.
const MAX_DIAGNOSTIC_BYTES: usize = 4096;

/// Default time a process gets to exit after SIGTERM.
const DEFAULT_KILL_GRACE: Duration = Duration::from_secs(2);

/// Runs command lines as child processes, each in its own process group.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    kill_grace: Duration,
    display: Option<String>,
}

impl CommandRunner {
    /// Creates a runner that waits `kill_grace` between SIGTERM and SIGKILL.
    pub fn new(kill_grace: Duration) -> Self {
        Self {
            kill_grace,
            display: None,
        }
    }

    /// Creates a runner with default settings.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_KILL_GRACE)
    }

    /// Sets the X display handed to child processes.
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    /// Asks the process group to exit, escalating to SIGKILL after the grace period.
    async fn terminate(&self, child: &mut Child, group: Option<&ProcessGroup>) {
        if let Some(group) = group {
            group.terminate();
        }
        #[cfg(not(unix))]
        let _ = child.start_kill();

        if timeout(self.kill_grace, child.wait()).await.is_err() {
            warn!(
                "Process {:?} still running {} ms after SIGTERM, killing",
                child.id(),
                self.kill_grace.as_millis()
            );
            if let Some(group) = group {
                group.kill();
            }
            let _ = child.kill().await;
        }
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn execute(
        &self,
        args: &[String],
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>, ProcessError> {
        let (program, rest) = args.split_first().ok_or(ProcessError::EmptyCommand)?;
        if cancel.is_cancelled() {
            return Err(ProcessError::Cancelled);
        }

        let started = Instant::now();
        let mut command = Command::new(program);
        command
            .args(rest)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(display) = &self.display {
            command.env("DISPLAY", display);
        }
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::LaunchFailed {
                program: program.clone(),
                source,
            })?;
        let group = child.id().map(ProcessGroup::new);
        debug!("Launched {} (pid {:?})", program, child.id());

        let stdout = child.stdout.take().map(spawn_reader);
        let stderr = child.stderr.take().map(spawn_reader);

        let status = tokio::select! {
            biased;
            status = child.wait() => status?,
            _ = cancel.cancelled() => {
                self.terminate(&mut child, group.as_ref()).await;
                drop(group);
                abort_reader(stdout);
                abort_reader(stderr);
                warn!(
                    "{} cancelled after {} ms",
                    program,
                    started.elapsed().as_millis()
                );
                return Err(ProcessError::Cancelled);
            }
        };

        // Helpers left in the group could hold the pipes open.
        drop(group);

        let stdout = collect_reader(stdout).await?;
        let stderr = collect_reader(stderr).await?;

        if !status.success() {
            debug!(
                "{} exited with {:?} after {} ms",
                program,
                status.code(),
                started.elapsed().as_millis()
            );
            return Err(ProcessError::process_failed(
                status.code(),
                diagnostics_tail(&stderr),
            ));
        }

        debug!(
            "{} finished in {} ms ({} bytes)",
            program,
            started.elapsed().as_millis(),
            stdout.len()
        );
        Ok(stdout)
    }
}

/// Process group of a launched child. Every member is killed on drop.
struct ProcessGroup {
    #[cfg_attr(not(unix), allow(dead_code))]
    pgid: u32,
}

impl ProcessGroup {
    fn new(pgid: u32) -> Self {
        Self { pgid }
    }

    fn terminate(&self) {
        #[cfg(unix)]
        self.signal(nix::sys::signal::Signal::SIGTERM);
    }

    fn kill(&self) {
        #[cfg(unix)]
        self.signal(nix::sys::signal::Signal::SIGKILL);
    }

    #[cfg(unix)]
    fn signal(&self, signal: nix::sys::signal::Signal) {
        use nix::errno::Errno;
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        match killpg(Pid::from_raw(self.pgid as i32), signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => debug!("Failed to send {:?} to group {}: {}", signal, self.pgid, e),
        }
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

fn spawn_reader<R>(mut pipe: R) -> JoinHandle<std::io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf).await?;
        Ok(buf)
    })
}

async fn collect_reader(
    reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
) -> std::io::Result<Vec<u8>> {
    match reader {
        Some(handle) => handle.await.map_err(std::io::Error::other)?,
        None => Ok(Vec::new()),
    }
}

fn abort_reader(reader: Option<JoinHandle<std::io::Result<Vec<u8>>>>) {
    if let Some(handle) = reader {
        handle.abort();
    }
}

/// Last `MAX_DIAGNOSTIC_BYTES` of stderr, as text.
fn diagnostics_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim_end();
    if text.len() <= MAX_DIAGNOSTIC_BYTES {
        return text.to_string();
    }
    let mut start = text.len() - MAX_DIAGNOSTIC_BYTES;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}
