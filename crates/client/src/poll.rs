//! Waiting for a job to finish

use crate::client::TesClient;
use std::time::Duration;
use tes_config::PollingConfig;
use tes_core::{Error, JobId, JobRecord, JobState, Result};
use tokio::time::{sleep, Instant};
use tracing::{info, instrument, warn};

/// How long `wait` keeps polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollTimeout {
    /// Give up after this much wall-clock time
    Bounded(Duration),
    /// Poll until the job is terminal
    Unbounded,
}

impl PollTimeout {
    /// Zero seconds means unbounded
    pub fn from_secs(secs: u64) -> Self {
        if secs == 0 {
            Self::Unbounded
        } else {
            Self::Bounded(Duration::from_secs(secs))
        }
    }

    /// A limit too large to represent as an instant never expires
    fn deadline(self, start: Instant) -> Option<Instant> {
        match self {
            Self::Bounded(limit) => start.checked_add(limit),
            Self::Unbounded => None,
        }
    }
}

impl From<Option<Duration>> for PollTimeout {
    fn from(limit: Option<Duration>) -> Self {
        limit.map_or(Self::Unbounded, Self::Bounded)
    }
}

impl From<&PollingConfig> for PollTimeout {
    fn from(config: &PollingConfig) -> Self {
        config.timeout().into()
    }
}

impl TesClient {
    /// Poll until the job is terminal or `timeout` passes
    ///
    /// Timing out is not an error: the last record read is returned and the
    /// caller checks [`JobRecord::is_terminal`]. A failed read ends the wait
    /// with that error.
    pub async fn wait(
        &self,
        id: &JobId,
        timeout: PollTimeout,
        interval: Duration,
    ) -> Result<JobRecord> {
        self.wait_with(id, timeout, interval, |_| {}).await
    }

    /// [`TesClient::wait`] with the configured timeout and interval
    pub async fn wait_default(&self, id: &JobId) -> Result<JobRecord> {
        let polling = self.polling();
        self.wait(id, PollTimeout::from(polling), polling.interval())
            .await
    }

    /// Like [`TesClient::wait`], calling `on_change` each time the state changes
    #[instrument(skip(self, id, on_change), fields(job_id = %id))]
    pub async fn wait_with<F>(
        &self,
        id: &JobId,
        timeout: PollTimeout,
        interval: Duration,
        mut on_change: F,
    ) -> Result<JobRecord>
    where
        F: FnMut(&JobRecord),
    {
        if interval.is_zero() {
            return Err(Error::configuration("poll interval must be greater than zero"));
        }
        let deadline = timeout.deadline(Instant::now());
        let mut last_state: Option<JobState> = None;

        loop {
            let record = self.get_job(id).await?;

            if last_state != Some(record.state) {
                if let Some(previous) = last_state {
                    if !previous.can_transition_to(record.state) {
                        warn!(from = %previous, to = %record.state, "unexpected state transition");
                    }
                }
                info!(state = %record.state, "job state changed");
                on_change(&record);
                last_state = Some(record.state);
            }

            if record.is_terminal() {
                return Ok(record);
            }

            let pause = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        warn!(state = %record.state, "wait timed out");
                        return Ok(record);
                    }
                    interval.min(remaining)
                }
                None => interval,
            };
            sleep(pause).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_conversions() {
        assert_eq!(PollTimeout::from_secs(0), PollTimeout::Unbounded);
        assert_eq!(
            PollTimeout::from_secs(10),
            PollTimeout::Bounded(Duration::from_secs(10))
        );
        assert_eq!(PollTimeout::from(None), PollTimeout::Unbounded);

        let polling = PollingConfig {
            interval_ms: 100,
            timeout_secs: 3,
        };
        assert_eq!(
            PollTimeout::from(&polling),
            PollTimeout::Bounded(Duration::from_secs(3))
        );
    }

    #[test]
    fn test_deadline() {
        let start = Instant::now();
        assert_eq!(PollTimeout::Unbounded.deadline(start), None);
        assert_eq!(
            PollTimeout::Bounded(Duration::from_secs(1)).deadline(start),
            Some(start + Duration::from_secs(1))
        );
        assert_eq!(PollTimeout::from_secs(u64::MAX).deadline(start), None);
        assert_eq!(PollTimeout::Bounded(Duration::MAX).deadline(start), None);
    }
}
