// src/core/process.rs
//! Lifecycle of the external bot process.
//!
//! The service owns at most one bot at a time. Every operation goes through
//! one async mutex, so check-then-spawn cannot race with another start.

use anyhow::Context;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::fs::OpenOptions;
use tokio::process::{Child, Command};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, warn};

use crate::core::FsOps;
use crate::error::AppError;

pub const DEFAULT_STOP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running { pid: u32 },
}

impl PipelineState {
    pub fn is_running(&self) -> bool {
        matches!(self, PipelineState::Running { .. })
    }

    pub fn pid(&self) -> Option<u32> {
        match self {
            PipelineState::Running { pid } => Some(*pid),
            PipelineState::Idle => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing was running
    NotRunning,
    /// A tracked process was terminated (or had already exited)
    Stopped,
}

impl StopOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            StopOutcome::NotRunning => "No pipeline was running",
            StopOutcome::Stopped => "Pipeline stopped",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LaunchConfig {
    pub interpreter: String,
    pub working_dir: PathBuf,
    pub entrypoint: String,
    pub log_path: Option<PathBuf>,
    pub restricted: bool,
    pub stop_timeout: Duration,
}

#[derive(Debug)]
struct BotProcess {
    child: Child,
    pid: u32,
}

#[derive(Debug)]
pub struct ProcessController {
    launch: LaunchConfig,
    slot: Mutex<Option<BotProcess>>,
}

/// Exclusive access to the process slot. Hold it across any preparation
/// that must happen between "nothing is running" and the spawn.
pub struct ProcessGuard<'a> {
    launch: &'a LaunchConfig,
    slot: MutexGuard<'a, Option<BotProcess>>,
}

impl ProcessController {
    pub fn new(launch: LaunchConfig) -> Self {
        Self {
            launch,
            slot: Mutex::new(None),
        }
    }

    pub fn is_restricted(&self) -> bool {
        self.launch.restricted
    }

    pub async fn lock(&self) -> ProcessGuard<'_> {
        ProcessGuard {
            launch: &self.launch,
            slot: self.slot.lock().await,
        }
    }

    pub async fn start(&self) -> Result<u32, AppError> {
        let mut guard = self.lock().await;
        guard.ensure_can_start()?;
        guard.spawn().await
    }

    pub async fn status(&self) -> PipelineState {
        self.lock().await.status()
    }

    pub async fn stop(&self) -> StopOutcome {
        self.lock().await.stop().await
    }
}

impl ProcessGuard<'_> {
    /// Fails if spawning is disallowed or a live process is already tracked
    pub fn ensure_can_start(&mut self) -> Result<(), AppError> {
        if self.launch.restricted {
            return Err(AppError::EnvironmentUnsupported(
                "Pipeline cannot run in this deployment. Run the app locally to start/stop the bot."
                    .to_string(),
            ));
        }
        if let PipelineState::Running { pid } = self.status() {
            return Err(AppError::AlreadyRunning { pid });
        }
        Ok(())
    }

    /// Current state; clears the slot if the tracked process has exited
    pub fn status(&mut self) -> PipelineState {
        let Some(process) = self.slot.as_mut() else {
            return PipelineState::Idle;
        };

        match process.child.try_wait() {
            Ok(None) => PipelineState::Running { pid: process.pid },
            Ok(Some(exit)) => {
                info!("Bot process {} exited with {}", process.pid, exit);
                *self.slot = None;
                PipelineState::Idle
            }
            Err(e) => {
                warn!("Lost track of bot process {}: {}", process.pid, e);
                *self.slot = None;
                PipelineState::Idle
            }
        }
    }

    /// Spawn the bot. Call `ensure_can_start` first while holding this guard.
    pub async fn spawn(&mut self) -> Result<u32, AppError> {
        self.ensure_can_start()?;

        let script = self.launch.working_dir.join(&self.launch.entrypoint);
        if !script.is_file() {
            return Err(AppError::ExecutableNotFound(script));
        }

        let (stdout, stderr) = self.output_streams().await?;

        let child = Command::new(&self.launch.interpreter)
            .arg(&self.launch.entrypoint)
            .current_dir(&self.launch.working_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .with_context(|| format!("Failed to spawn {}", self.launch.interpreter))?;

        let pid = child
            .id()
            .ok_or_else(|| anyhow::anyhow!("Bot process exited before reporting a pid"))?;

        info!(
            "Started bot process {} ({} {})",
            pid, self.launch.interpreter, self.launch.entrypoint
        );
        *self.slot = Some(BotProcess { child, pid });
        Ok(pid)
    }

    /// Terminate the tracked process. Always ends with an empty slot.
    pub async fn stop(&mut self) -> StopOutcome {
        let Some(mut process) = self.slot.take() else {
            return StopOutcome::NotRunning;
        };

        if let Err(e) = request_termination(&mut process) {
            warn!(
                "Graceful stop of bot process {} failed: {:#}; killing",
                process.pid, e
            );
            force_kill(&mut process).await;
            return StopOutcome::Stopped;
        }

        match tokio::time::timeout(self.launch.stop_timeout, process.child.wait()).await {
            Ok(Ok(exit)) => info!("Bot process {} stopped with {}", process.pid, exit),
            Ok(Err(e)) => {
                warn!("Waiting on bot process {} failed: {}; killing", process.pid, e);
                force_kill(&mut process).await;
            }
            Err(_) => {
                warn!(
                    "Bot process {} did not exit within {}s; killing",
                    process.pid,
                    self.launch.stop_timeout.as_secs()
                );
                force_kill(&mut process).await;
            }
        }

        StopOutcome::Stopped
    }

    async fn output_streams(&self) -> Result<(Stdio, Stdio), AppError> {
        let Some(path) = &self.launch.log_path else {
            return Ok((Stdio::null(), Stdio::null()));
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                FsOps::ensure_dir_exists(parent).await?;
            }
        }
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open pipeline log {}", path.display()))?
            .into_std()
            .await;
        let log_err = log.try_clone().context("Failed to clone pipeline log handle")?;

        Ok((Stdio::from(log), Stdio::from(log_err)))
    }
}

#[cfg(unix)]
fn request_termination(process: &mut BotProcess) -> anyhow::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if process.child.try_wait()?.is_some() {
        return Ok(());
    }

    let pid = i32::try_from(process.pid).context("Bot pid out of range")?;
    kill(Pid::from_raw(pid), Signal::SIGTERM)
        .with_context(|| format!("Failed to send SIGTERM to {}", process.pid))
}

#[cfg(not(unix))]
fn request_termination(process: &mut BotProcess) -> anyhow::Result<()> {
    process
        .child
        .start_kill()
        .context("Failed to terminate bot process")
}

async fn force_kill(process: &mut BotProcess) {
    if let Err(e) = process.child.kill().await {
        warn!("Force kill of bot process {} failed: {}", process.pid, e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::path::Path;

    fn controller(dir: &Path, script: &str, restricted: bool) -> ProcessController {
        std::fs::write(dir.join("runAiBot.py"), script).unwrap();
        ProcessController::new(LaunchConfig {
            interpreter: "sh".to_string(),
            working_dir: dir.to_path_buf(),
            entrypoint: "runAiBot.py".to_string(),
            log_path: Some(dir.join("logs").join("pipeline.log")),
            restricted,
            stop_timeout: Duration::from_secs(5),
        })
    }

    #[tokio::test]
    async fn test_start_status_stop_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), "exec sleep 30\n", false);

        assert_eq!(controller.status().await, PipelineState::Idle);

        let pid = controller.start().await.unwrap();
        assert_eq!(controller.status().await, PipelineState::Running { pid });

        match controller.start().await {
            Err(AppError::AlreadyRunning { pid: running }) => assert_eq!(running, pid),
            other => panic!("expected AlreadyRunning, got {:?}", other),
        }

        assert_eq!(controller.stop().await, StopOutcome::Stopped);
        assert_eq!(controller.status().await, PipelineState::Idle);
        assert_eq!(controller.stop().await, StopOutcome::NotRunning);
    }

    #[tokio::test]
    async fn test_natural_exit_clears_handle() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), "echo done\n", false);

        controller.start().await.unwrap();
        for _ in 0..50 {
            if controller.status().await == PipelineState::Idle {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        assert_eq!(controller.status().await, PipelineState::Idle);
        let log = std::fs::read_to_string(dir.path().join("logs").join("pipeline.log")).unwrap();
        assert!(log.contains("done"));
    }

    #[tokio::test]
    async fn test_stop_delivers_sigterm_to_the_bot() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(
            dir.path(),
            "trap 'echo terminated; exit 0' TERM\nsleep 30 &\nwait $!\n",
            false,
        );

        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        let started = std::time::Instant::now();
        assert_eq!(controller.stop().await, StopOutcome::Stopped);
        assert!(started.elapsed() < Duration::from_secs(4));

        let log = std::fs::read_to_string(dir.path().join("logs").join("pipeline.log")).unwrap();
        assert!(log.contains("terminated"));
    }

    #[tokio::test]
    async fn test_start_creates_nested_log_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("runAiBot.py"), "echo first\n").unwrap();
        let log_path = dir.path().join("var").join("logs").join("pipeline.log");
        let controller = ProcessController::new(LaunchConfig {
            interpreter: "sh".to_string(),
            working_dir: dir.path().to_path_buf(),
            entrypoint: "runAiBot.py".to_string(),
            log_path: Some(log_path.clone()),
            restricted: false,
            stop_timeout: Duration::from_secs(1),
        });

        for _ in 0..2 {
            controller.start().await.unwrap();
            for _ in 0..50 {
                if controller.status().await == PipelineState::Idle {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }

        let log = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(log.matches("first").count(), 2);
    }

    #[tokio::test]
    async fn test_stop_after_process_exited_reports_success() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), "exit 0\n", false);

        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(controller.stop().await, StopOutcome::Stopped);
        assert_eq!(controller.status().await, PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_stop_escalates_when_term_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("runAiBot.py"), "trap '' TERM\nexec sleep 30\n").unwrap();
        let controller = ProcessController::new(LaunchConfig {
            interpreter: "sh".to_string(),
            working_dir: dir.path().to_path_buf(),
            entrypoint: "runAiBot.py".to_string(),
            log_path: None,
            restricted: false,
            stop_timeout: Duration::from_millis(300),
        });

        controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(controller.stop().await, StopOutcome::Stopped);
        assert_eq!(controller.status().await, PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_missing_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        let controller = ProcessController::new(LaunchConfig {
            interpreter: "sh".to_string(),
            working_dir: dir.path().to_path_buf(),
            entrypoint: "runAiBot.py".to_string(),
            log_path: None,
            restricted: false,
            stop_timeout: Duration::from_secs(1),
        });

        assert!(matches!(
            controller.start().await,
            Err(AppError::ExecutableNotFound(_))
        ));
        assert_eq!(controller.status().await, PipelineState::Idle);
    }

    #[tokio::test]
    async fn test_restricted_mode_never_spawns() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), "exec sleep 30\n", true);

        assert!(matches!(
            controller.start().await,
            Err(AppError::EnvironmentUnsupported(_))
        ));
        assert_eq!(controller.status().await, PipelineState::Idle);
    }
}
