//! Types used by the resume/job database.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Job identifier. Assigned by the database on insert and never reused.
pub type JobId = i64;

/// Lifecycle state of a job, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Waiting,
    Running,
    /// Between a pause request and the transfer confirming it stopped. Never queued.
    Pausing,
    Paused,
    Error,
    FatalError,
    Finished,
    Canceled,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Waiting => "waiting",
            JobState::Running => "running",
            JobState::Pausing => "pausing",
            JobState::Paused => "paused",
            JobState::Error => "error",
            JobState::FatalError => "fatal_error",
            JobState::Finished => "finished",
            JobState::Canceled => "canceled",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "waiting" => JobState::Waiting,
            "running" => JobState::Running,
            "pausing" => JobState::Pausing,
            "paused" => JobState::Paused,
            "error" => JobState::Error,
            "fatal_error" => JobState::FatalError,
            "finished" => JobState::Finished,
            "canceled" => JobState::Canceled,
            _ => JobState::Error,
        }
    }

    /// `Finished` and `Canceled` never re-enter the active queues on their own.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Finished | JobState::Canceled)
    }

    pub fn is_error(self) -> bool {
        matches!(self, JobState::Error | JobState::FatalError)
    }
}

/// Extra request header sent with every request of a job, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHeader {
    pub name: String,
    pub value: String,
}

/// Resume cursor of one connection of a multi-connection transfer.
///
/// Owned by the transfer engine; the scheduler only hands it back when it
/// rebuilds a transfer handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkCursor {
    pub index: u32,
    pub start: u64,
    pub end: u64,
    pub downloaded: u64,
}

/// Full persisted job record.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub id: JobId,
    pub url: String,
    /// Destination directory.
    pub path: String,
    /// Destination file name; `None` until the transfer engine has resolved one.
    pub filename: Option<String>,
    pub resumable: bool,
    pub state: JobState,
    pub downloaded_size: u64,
    /// 0 while unknown.
    pub total_size: u64,
    pub last_modified: Option<String>,
    /// Unix seconds.
    pub created_at: i64,
    /// Unix seconds.
    pub finished_at: Option<i64>,
    pub error_msg: Option<String>,
    pub custom_headers: Vec<CustomHeader>,
    pub chunks: Vec<ChunkCursor>,
}

impl JobRecord {
    /// A fresh `Waiting` record that has not been inserted yet (`id == 0`).
    pub fn new_waiting(url: &str, path: &str, filename: Option<&str>, created_at: i64) -> Self {
        Self {
            id: 0,
            url: url.to_string(),
            path: path.to_string(),
            filename: filename.map(str::to_string),
            resumable: true,
            state: JobState::Waiting,
            downloaded_size: 0,
            total_size: 0,
            last_modified: None,
            created_at,
            finished_at: None,
            error_msg: None,
            custom_headers: Vec::new(),
            chunks: Vec::new(),
        }
    }

    /// Record a progress report. `downloaded_size` never exceeds a known total.
    pub fn apply_progress(&mut self, total: u64, downloaded: u64) {
        self.total_size = total;
        self.downloaded_size = if total > 0 {
            downloaded.min(total)
        } else {
            downloaded
        };
    }

    /// Forget everything learned about the remote file so the next start
    /// downloads from scratch.
    pub fn reset_progress(&mut self) {
        self.downloaded_size = 0;
        self.total_size = 0;
        self.last_modified = None;
        self.chunks.clear();
    }

    /// Destination file path, if a file name is known.
    pub fn destination(&self) -> Option<PathBuf> {
        self.filename
            .as_deref()
            .map(|name| PathBuf::from(&self.path).join(name))
    }
}

/// Summary view used by the CLI `status` command.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub id: JobId,
    pub url: String,
    pub state: JobState,
    pub filename: Option<String>,
    pub downloaded_size: u64,
    pub total_size: u64,
}
