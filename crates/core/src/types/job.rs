//! Job identifiers, states and records as observed by the client

use crate::errors::{Error, Result};
use crate::types::{TaskDocument, TaskView};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::ops::Deref;
use std::str::FromStr;

/// Opaque job identifier returned by the server on submission
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Create a new JobId, rejecting empty identifiers
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::validation("job id cannot be empty"));
        }
        Ok(JobId(id))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to String
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for JobId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for JobId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

/// Lifecycle state of a job
///
/// ```text
/// Queued -> Initializing -> Running -> {Complete, ExecutorError, SystemError, Canceled}
/// Queued -> Canceled
/// Running -> Canceled
/// ```
///
/// Terminal states are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Unknown,
    Queued,
    Initializing,
    Running,
    Paused,
    Complete,
    ExecutorError,
    SystemError,
    Canceled,
    Preempted,
}

impl JobState {
    /// Every state, in lifecycle order
    pub const ALL: [JobState; 10] = [
        JobState::Unknown,
        JobState::Queued,
        JobState::Initializing,
        JobState::Running,
        JobState::Paused,
        JobState::Complete,
        JobState::ExecutorError,
        JobState::SystemError,
        JobState::Canceled,
        JobState::Preempted,
    ];

    /// No transition leaves a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Complete
                | JobState::ExecutorError
                | JobState::SystemError
                | JobState::Canceled
                | JobState::Preempted
        )
    }

    /// Terminal but not complete
    pub fn is_failure(self) -> bool {
        self.is_terminal() && self != JobState::Complete
    }

    /// Whether a server may legitimately report `next` after `self`
    pub fn can_transition_to(self, next: JobState) -> bool {
        if self == next {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        match (self, next) {
            (JobState::Unknown, _) => true,
            (_, JobState::Unknown) => false,
            (_, JobState::Queued) => self == JobState::Paused,
            (JobState::Queued, _) => true,
            (JobState::Initializing, JobState::Running | JobState::Paused) => true,
            (JobState::Running, JobState::Paused) => true,
            (JobState::Paused, JobState::Initializing | JobState::Running) => true,
            (_, next) => next.is_terminal(),
        }
    }

    /// Parse a state label from any API generation
    ///
    /// Matching ignores case and underscores, so `Running`, `RUNNING` and
    /// `running` are equivalent, as are `SystemError` and `SYSTEM_ERROR`.
    /// The early generations' bare `Error` maps to [`JobState::ExecutorError`].
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        let state = match normalized.as_str() {
            "unknown" => JobState::Unknown,
            "queued" => JobState::Queued,
            "initializing" => JobState::Initializing,
            "running" => JobState::Running,
            "paused" => JobState::Paused,
            "complete" => JobState::Complete,
            "error" | "executorerror" => JobState::ExecutorError,
            "systemerror" => JobState::SystemError,
            "canceled" | "cancelled" => JobState::Canceled,
            "preempted" => JobState::Preempted,
            _ => return None,
        };
        Some(state)
    }

    /// Upper case label used by the `tasks` generation
    pub fn as_upper_label(self) -> &'static str {
        match self {
            JobState::Unknown => "UNKNOWN",
            JobState::Queued => "QUEUED",
            JobState::Initializing => "INITIALIZING",
            JobState::Running => "RUNNING",
            JobState::Paused => "PAUSED",
            JobState::Complete => "COMPLETE",
            JobState::ExecutorError => "EXECUTOR_ERROR",
            JobState::SystemError => "SYSTEM_ERROR",
            JobState::Canceled => "CANCELED",
            JobState::Preempted => "PREEMPTED",
        }
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper_label())
    }
}

impl FromStr for JobState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_label(s).ok_or_else(|| Error::validation(format!("unknown job state '{s}'")))
    }
}

/// Log of one executor that has started
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorLog {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub exit_code: Option<i32>,
    pub host_ip: Option<String>,
    pub ports: Vec<crate::types::PortMapping>,
}

impl ExecutorLog {
    /// Whether the executor has finished
    pub fn is_finished(&self) -> bool {
        self.end_time.is_some() || self.exit_code.is_some()
    }
}

/// A job as reported by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub state: JobState,
    /// One entry per started executor, in executor order
    #[serde(default)]
    pub logs: Vec<ExecutorLog>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub system_logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<String>,
}

impl JobRecord {
    /// Create a record with no logs
    pub fn new(id: JobId, state: JobState) -> Self {
        Self {
            id,
            state,
            logs: Vec::new(),
            task: None,
            system_logs: Vec::new(),
            creation_time: None,
        }
    }

    /// Shorthand for `self.state.is_terminal()`
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Stdout of the executor at `index`, if it has started and captured any
    pub fn stdout(&self, index: usize) -> Option<&str> {
        self.logs.get(index).and_then(|log| log.stdout.as_deref())
    }
}

/// Paging and filters for a job listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListRequest {
    /// Servers pick their own page size when unset
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub view: TaskView,
    /// Only jobs in this state; servers that cannot filter return everything
    pub state: Option<JobState>,
}

impl Default for JobListRequest {
    fn default() -> Self {
        Self {
            page_size: None,
            page_token: None,
            view: TaskView::Minimal,
            state: None,
        }
    }
}

/// One page of a job listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobRecord>,
    /// Absent on the last page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_rejects_empty() {
        assert!(JobId::new("").is_err());
        assert!(JobId::new("   ").is_err());
        assert_eq!(JobId::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_terminal_partition() {
        let terminal: Vec<_> = JobState::ALL.iter().filter(|s| s.is_terminal()).collect();
        assert_eq!(
            terminal,
            vec![
                &JobState::Complete,
                &JobState::ExecutorError,
                &JobState::SystemError,
                &JobState::Canceled,
                &JobState::Preempted
            ]
        );
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Initializing.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Canceled.is_failure());
        assert!(!JobState::Complete.is_failure());
        assert!(!JobState::Running.is_failure());
    }

    #[test]
    fn test_terminal_states_are_absorbing() {
        for from in JobState::ALL.iter().filter(|s| s.is_terminal()) {
            for to in JobState::ALL {
                assert_eq!(from.can_transition_to(to), *from == to, "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_lifecycle_transitions() {
        assert!(JobState::Queued.can_transition_to(JobState::Initializing));
        assert!(JobState::Initializing.can_transition_to(JobState::Running));
        assert!(JobState::Running.can_transition_to(JobState::Complete));
        assert!(JobState::Queued.can_transition_to(JobState::Canceled));
        assert!(JobState::Running.can_transition_to(JobState::Canceled));
        assert!(!JobState::Running.can_transition_to(JobState::Queued));
        assert!(!JobState::Running.can_transition_to(JobState::Initializing));
    }

    #[test]
    fn test_labels_from_every_generation() {
        assert_eq!(JobState::from_label("Queued"), Some(JobState::Queued));
        assert_eq!(JobState::from_label("QUEUED"), Some(JobState::Queued));
        assert_eq!(JobState::from_label("Error"), Some(JobState::ExecutorError));
        assert_eq!(JobState::from_label("EXECUTOR_ERROR"), Some(JobState::ExecutorError));
        assert_eq!(JobState::from_label("SystemError"), Some(JobState::SystemError));
        assert_eq!(JobState::from_label("SYSTEM_ERROR"), Some(JobState::SystemError));
        assert_eq!(JobState::from_label("Canceled"), Some(JobState::Canceled));
        assert_eq!(JobState::from_label("bogus"), None);

        assert_eq!(JobState::from_label("Initializing"), Some(JobState::Initializing));
        assert_eq!(JobState::from_label("Preempted"), Some(JobState::Preempted));

        for state in JobState::ALL {
            assert_eq!(JobState::from_label(state.as_upper_label()), Some(state));
        }
    }

    #[test]
    fn test_record_stdout() {
        let mut record = JobRecord::new(JobId::new("j1").unwrap(), JobState::Complete);
        assert_eq!(record.stdout(0), None);
        record.logs.push(ExecutorLog {
            stdout: Some("hello world\n".to_string()),
            exit_code: Some(0),
            ..Default::default()
        });
        assert_eq!(record.stdout(0), Some("hello world\n"));
        assert!(record.logs[0].is_finished());
    }
}
