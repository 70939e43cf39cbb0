//! Scan event types
//!
//! Ephemeral messages pushed to a session's observers while a scan runs.
//! Events are not persisted; the tag and field names are the wire contract
//! consumed by the web terminal.

use serde::{Deserialize, Serialize};

use crate::session::ScanStatus;

/// An event emitted by the process runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    /// Session status change; the terminal event carries the full output
    Status {
        /// New session status
        status: ScanStatus,
        /// Full combined output, present only on the terminal event
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<String>,
    },
    /// The fully assembled command line, for audit and visibility
    Command {
        /// Space-joined command line
        command: String,
    },
    /// One line of combined process output
    Output {
        /// Line text, trailing terminators stripped
        line: String,
    },
    /// An output line that looks like a progress bar
    Progress {
        /// Same text as the matching output event
        line: String,
    },
    /// The scan faulted before reaching a normal exit
    Error {
        /// Error text, also recorded as the session output
        error: String,
    },
}

impl ScanEvent {
    /// Non-terminal status change
    #[must_use]
    pub fn status(status: ScanStatus) -> Self {
        Self::Status {
            status,
            output: None,
        }
    }

    /// Terminal status change carrying the full output
    #[must_use]
    pub fn status_final(status: ScanStatus, output: impl Into<String>) -> Self {
        Self::Status {
            status,
            output: Some(output.into()),
        }
    }

    /// Command-line announcement
    #[must_use]
    pub fn command(command: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
        }
    }

    /// Plain output line
    #[must_use]
    pub fn output(line: impl Into<String>) -> Self {
        Self::Output { line: line.into() }
    }

    /// Progress line (always paired with an output event for the same text)
    #[must_use]
    pub fn progress(line: impl Into<String>) -> Self {
        Self::Progress { line: line.into() }
    }

    /// Scan failure
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            error: message.into(),
        }
    }
}
