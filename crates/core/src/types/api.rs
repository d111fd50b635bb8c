//! Identifiers for the wire schemas a server may speak

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The API generation spoken by a TES server
///
/// Generations differ in endpoint paths, field names and state label casing.
/// The client picks one translator per generation; everything above the wire
/// layer works on the canonical types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiGeneration {
    /// `/v1/tasks:run` and `/v1/taskop/{id}`
    TaskOp,
    /// `/v1/jobs` and `/v1/jobs/{id}`
    #[default]
    Jobs,
    /// `/v1/tasks` and `/v1/tasks/{id}`
    Tasks,
}

impl ApiGeneration {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiGeneration::TaskOp => "taskop",
            ApiGeneration::Jobs => "jobs",
            ApiGeneration::Tasks => "tasks",
        }
    }
}

impl fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiGeneration {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taskop" | "task-op" => Ok(ApiGeneration::TaskOp),
            "jobs" | "job" => Ok(ApiGeneration::Jobs),
            "tasks" | "task" => Ok(ApiGeneration::Tasks),
            other => Err(Error::configuration(format!(
                "unknown API generation '{other}' (expected taskop, jobs or tasks)"
            ))),
        }
    }
}

/// How much of a task the server should return
///
/// Only the `tasks` generation honours views; older servers always return
/// the full record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskView {
    /// Id and state only
    Minimal,
    /// Everything except executor stdout/stderr and inline input content
    Basic,
    #[default]
    Full,
}

impl TaskView {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskView::Minimal => "MINIMAL",
            TaskView::Basic => "BASIC",
            TaskView::Full => "FULL",
        }
    }
}
