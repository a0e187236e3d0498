//! Child process spawn, secret injection and exit supervision

use super::hub::OutputHub;
use super::stream::forward_output;
use crate::error::{Error, LaunchError, Result};
use crate::store::SecretSource;
use crate::types::{LaunchId, LaunchOutcome, OutputEvent, OutputStream};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// How long output readers may keep running after a cancelled child exits.
/// Grandchildren can hold the pipes open past the shell's death.
const CANCEL_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Spawns the automation process, one child per launch.
///
/// Concurrent launches are not serialized; their events share one hub
/// and are told apart by `LaunchId`.
pub struct ProcessLauncher {
    working_dir: PathBuf,
    secrets: Arc<dyn SecretSource>,
    events: OutputHub,
}

/// Requests termination of a running launch. Clonable and cheap.
#[derive(Debug, Clone, Default)]
pub struct LaunchCanceller {
    notify: Arc<Notify>,
}

impl LaunchCanceller {
    /// Ask the child to terminate. Calling after exit has no effect.
    pub fn cancel(&self) {
        self.notify.notify_one();
    }
}

/// A running launch
pub struct LaunchHandle {
    id: LaunchId,
    canceller: LaunchCanceller,
    completion: JoinHandle<Result<LaunchOutcome>>,
}

impl LaunchHandle {
    pub fn id(&self) -> LaunchId {
        self.id
    }

    pub fn canceller(&self) -> LaunchCanceller {
        self.canceller.clone()
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    /// Wait for the child to exit and its output to drain.
    ///
    /// Exit code 0 is success; any other code, or death by signal, is
    /// `LaunchError::ProcessFailed`.
    pub async fn wait(self) -> Result<LaunchOutcome> {
        self.completion
            .await
            .map_err(|e| Error::Internal(format!("Launch supervisor failed: {}", e)))?
    }
}

enum Exit {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
}

impl ProcessLauncher {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        secrets: Arc<dyn SecretSource>,
        events: OutputHub,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            secrets,
            events,
        }
    }

    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<OutputEvent> {
        self.events.subscribe()
    }

    /// Spawn `command` through the platform shell and start forwarding output
    pub async fn launch(&self, command: &str) -> Result<LaunchHandle> {
        let id = LaunchId::new();
        let secrets = self.secrets.load().await;

        let mut cmd = shell_command(command);
        cmd.current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut injected = Vec::new();
        for (name, value) in secrets.env_pairs() {
            cmd.env(name, value);
            injected.push(name.to_string());
        }

        info!(
            "Launch {}: {} (cwd: {:?}, secrets: {:?})",
            id, command, self.working_dir, injected
        );

        let mut child = cmd.spawn().map_err(|e| {
            Error::Launch(LaunchError::SpawnFailed(format!(
                "Failed to spawn '{}': {}",
                command, e
            )))
        })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            Error::Launch(LaunchError::SpawnFailed("Failed to capture stdout".to_string()))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            Error::Launch(LaunchError::SpawnFailed("Failed to capture stderr".to_string()))
        })?;

        let stdout_task = tokio::spawn(forward_output(
            stdout,
            id,
            OutputStream::Stdout,
            self.events.clone(),
        ));
        let stderr_task = tokio::spawn(forward_output(
            stderr,
            id,
            OutputStream::Stderr,
            self.events.clone(),
        ));

        let canceller = LaunchCanceller::default();
        let completion = tokio::spawn(supervise(
            id,
            child,
            canceller.clone(),
            [stdout_task, stderr_task],
        ));

        Ok(LaunchHandle {
            id,
            canceller,
            completion,
        })
    }

    /// Launch and wait for completion
    pub async fn run(&self, command: &str) -> Result<LaunchOutcome> {
        self.launch(command).await?.wait().await
    }
}

async fn supervise(
    id: LaunchId,
    mut child: Child,
    canceller: LaunchCanceller,
    readers: [JoinHandle<()>; 2],
) -> Result<LaunchOutcome> {
    let started_at = chrono::Utc::now();

    let exit = tokio::select! {
        status = child.wait() => Exit::Exited(status),
        _ = canceller.notify.notified() => Exit::Cancelled,
    };

    let cancelled = matches!(exit, Exit::Cancelled);
    let status = match exit {
        Exit::Exited(status) => status,
        Exit::Cancelled => {
            info!("Launch {}: termination requested", id);
            if let Err(e) = child.start_kill() {
                warn!("Launch {}: failed to signal child: {}", id, e);
            }
            child.wait().await
        }
    }
    .map_err(|e| Error::Launch(LaunchError::SpawnFailed(format!("Failed to wait: {}", e))))?;

    for reader in readers {
        if cancelled {
            let abort = reader.abort_handle();
            if tokio::time::timeout(CANCEL_DRAIN_GRACE, reader).await.is_err() {
                debug!("Launch {}: output still open after cancel, detaching", id);
                abort.abort();
            }
        } else if let Err(e) = reader.await {
            warn!("Launch {}: output reader failed: {}", id, e);
        }
    }

    let finished_at = chrono::Utc::now();
    match status.code() {
        Some(0) => {
            info!("Launch {} completed successfully", id);
            Ok(LaunchOutcome {
                launch_id: id,
                exit_code: 0,
                started_at,
                finished_at,
            })
        }
        code => {
            warn!("Launch {} failed (exit code: {:?})", id, code);
            Err(Error::Launch(LaunchError::ProcessFailed { code }))
        }
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
