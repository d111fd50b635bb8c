//! Process outcome and stdout rendering

use eyre::WrapErr;
use serde_json::Value;
use std::process::ExitCode;
use tes_core::{JobRecord, JobState};

/// How a command ended, mapped onto the exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// The job reached a terminal state other than `Complete`
    JobFailed,
    /// The wait deadline passed before the job finished
    TimedOut,
}

impl Outcome {
    /// Outcome of waiting for `record`
    pub fn of_wait(record: &JobRecord) -> Self {
        match record.state {
            JobState::Complete => Outcome::Success,
            state if state.is_failure() => Outcome::JobFailed,
            _ => Outcome::TimedOut,
        }
    }
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::JobFailed => ExitCode::from(2),
            Outcome::TimedOut => ExitCode::from(3),
        }
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

/// `{"id": ...}` for commands that only produce an id
pub fn id_object(id: &str) -> Value {
    serde_json::json!({ "id": id })
}
