//! Scan process runner
//!
//! Supervises one external scan process per session: builds the command
//! line, spawns the tool with stdout and stderr merged into a single line
//! stream, relays each line to the session's observers as it arrives, and
//! finalizes the session record with the outcome.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::events::ScanEvent;
use crate::registry::ObserverRegistry;
use crate::session::{ScanSession, ScanStatus};
use crate::store::{SessionPatch, SessionStore};

/// How long a line read may block before the runner re-checks whether the
/// process has already exited. A polling bound, not a scan deadline.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Runs scan processes and drives their sessions to a terminal status
pub struct ScanRunner {
    store: Arc<SessionStore>,
    registry: Arc<ObserverRegistry>,
}

impl ScanRunner {
    /// Create a runner sharing the given store and registry
    #[must_use]
    pub fn new(store: Arc<SessionStore>, registry: Arc<ObserverRegistry>) -> Self {
        Self { store, registry }
    }

    /// Build the command line for a session's tool.
    ///
    /// Only `garak` is supported; it runs inside the session's conda
    /// environment against an Ollama-served model.
    pub fn build_command(session: &ScanSession) -> Result<Vec<String>> {
        if session.tool != "garak" {
            return Err(Error::UnsupportedTool(session.tool.clone()));
        }

        Ok(vec![
            "conda".to_string(),
            "run".to_string(),
            "-n".to_string(),
            session.environment.clone(),
            "python".to_string(),
            "-m".to_string(),
            "garak".to_string(),
            "--model_type".to_string(),
            "ollama".to_string(),
            "--model_name".to_string(),
            session.model_name.clone(),
            "--probes".to_string(),
            session.probe.clone(),
        ])
    }

    /// Drive the session to a terminal status.
    ///
    /// Never returns an error: every failure is recorded on the session and
    /// broadcast to its observers, and is invisible to other scans.
    pub async fn run(&self, session: ScanSession) {
        let session_id = session.id;
        info!(%session_id, tool = %session.tool, "scan runner started");

        self.mark_running(session_id).await;

        let result = match Self::build_command(&session) {
            Ok(command) => self.execute(session_id, &command).await,
            Err(e) => Err(e),
        };

        match result {
            Ok((exit_code, lines)) => {
                let status = terminal_status(exit_code);
                let output = lines.join("\n");
                self.finalize(session_id, status, output.clone()).await;
                self.registry
                    .broadcast(session_id, &ScanEvent::status_final(status, output))
                    .await;
                info!(%session_id, status = %status, exit_code, "scan finished");
            }
            Err(e) => {
                let message = e.to_string();
                warn!(%session_id, error = %message, "scan failed");
                self.finalize(session_id, ScanStatus::Failed, message.clone())
                    .await;
                self.registry
                    .broadcast(session_id, &ScanEvent::error(message))
                    .await;
            }
        }
    }

    /// Announce the command, spawn the process, and stream its output.
    ///
    /// Returns the exit code and the captured lines in emission order.
    pub(crate) async fn execute(
        &self,
        session_id: Uuid,
        command: &[String],
    ) -> Result<(i32, Vec<String>)> {
        self.registry
            .broadcast(session_id, &ScanEvent::command(command.join(" ")))
            .await;
        // First line observers see, before the process produces anything.
        self.registry
            .broadcast(session_id, &ScanEvent::output(banner_line()))
            .await;

        let mut child = spawn_merged(command)?;
        let mut line_rx = merged_lines(&mut child);
        let mut lines = Vec::new();

        loop {
            match timeout(READ_TIMEOUT, line_rx.recv()).await {
                Ok(Some(raw)) => {
                    let line = raw.trim_end_matches(['\r', '\n']).to_string();
                    if line.is_empty() {
                        continue;
                    }
                    lines.push(line.clone());
                    self.registry
                        .broadcast(session_id, &ScanEvent::output(line.clone()))
                        .await;
                    if is_progress_line(&line) {
                        self.registry
                            .broadcast(session_id, &ScanEvent::progress(line))
                            .await;
                    }
                }
                // Both streams closed
                Ok(None) => break,
                // No output within the window; stop once the process is gone
                Err(_) => match child.try_wait() {
                    Ok(Some(_)) => break,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!(%session_id, error = %e, "failed to poll scan process");
                        break;
                    }
                },
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::ProcessIo(e.to_string()))?;

        Ok((status.code().unwrap_or(-1), lines))
    }

    async fn mark_running(&self, session_id: Uuid) {
        if let Err(e) = self
            .store
            .update(session_id, SessionPatch::new().status(ScanStatus::Running))
            .await
        {
            // Live observers still get accurate events even if the durable
            // record lags.
            warn!(%session_id, error = %e, "failed to persist running status");
        }
        self.registry
            .broadcast(session_id, &ScanEvent::status(ScanStatus::Running))
            .await;
    }

    async fn finalize(&self, session_id: Uuid, status: ScanStatus, output: String) {
        let patch = SessionPatch::new()
            .status(status)
            .output(output)
            .completed_at(Utc::now());
        if let Err(e) = self.store.update(session_id, patch).await {
            warn!(%session_id, error = %e, "failed to persist terminal status");
        }
    }
}

/// Map a process exit code onto a terminal session status
fn terminal_status(exit_code: i32) -> ScanStatus {
    if exit_code == 0 {
        ScanStatus::Completed
    } else {
        ScanStatus::Failed
    }
}

/// Spawn the command with both output streams piped and buffering disabled
/// in the child, so lines arrive as soon as the tool flushes them.
fn spawn_merged(command: &[String]) -> Result<Child> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::spawn("empty command"))?;

    Command::new(program)
        .args(args)
        .env("PYTHONUNBUFFERED", "1")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| Error::spawn(format!("{program}: {e}")))
}

/// Merge the child's stdout and stderr into one ordered line channel.
///
/// Two reader tasks feed the queue; when both streams reach end-of-file the
/// senders drop and the channel closes, which ends the read loop.
fn merged_lines(child: &mut Child) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(256);

    if let Some(stdout) = child.stdout.take() {
        let tx = tx.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
    }

    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });
    }

    rx
}

/// Synthetic first output line identifying the tool and a timestamp
fn banner_line() -> String {
    format!(
        "garak LLM vulnerability scanner v0.12.0 ( https://github.com/NVIDIA/garak ) at {}",
        Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f")
    )
}

/// Progress-bar heuristic: a percentage plus a bar glyph.
///
/// Applied to each line independently; progress lines are also emitted as
/// plain output, never instead of it.
#[must_use]
pub fn is_progress_line(line: &str) -> bool {
    line.contains('%') && (line.contains('|') || line.contains('█'))
}
