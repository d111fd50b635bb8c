//! Job commands: run, get, wait, cancel, jobs, info

use eyre::WrapErr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tes_client::{PollTimeout, TesClient};
use tes_config::ClientConfig;
use tes_core::{JobId, JobRecord, JobState, TaskDocument, TaskView};
use tes_security::Token;
use tracing::debug;

use crate::output::{id_object, print_json, Outcome};

pub struct RunOptions {
    pub task_file: PathBuf,
    pub token: Option<String>,
    pub timeout: Option<u64>,
    pub poll_interval: Option<u64>,
    pub no_wait: bool,
}

pub struct ListOptions {
    pub view: TaskView,
    pub state: Option<JobState>,
    /// Keep jobs whose name contains this text
    pub name: Option<String>,
}

pub async fn run(config: ClientConfig, options: RunOptions) -> eyre::Result<Outcome> {
    let mut client = client_for(config).await?;
    let task = read_task(&client, &options.task_file).await?;

    if let Some(token) = options.token {
        client = client.with_token(Token::from_signed(token)?);
    }

    let id = client.submit(&task).await?;
    debug!(job_id = %id, "submitted");
    if options.no_wait {
        print_json(&id_object(id.as_str()))?;
        return Ok(Outcome::Success);
    }

    let (timeout, interval) = wait_settings(&client, options.timeout, options.poll_interval);
    let record = client
        .wait_with(&id, timeout, interval, report_state)
        .await?;
    finish(&record)
}

pub async fn get(config: ClientConfig, id: &str, view: TaskView) -> eyre::Result<Outcome> {
    let client = client_for(config).await?;
    let record = client.get_job_view(&JobId::new(id)?, view).await?;
    print_json(&record)?;
    Ok(Outcome::Success)
}

pub async fn wait(
    config: ClientConfig,
    id: &str,
    timeout: Option<u64>,
    poll_interval: Option<u64>,
) -> eyre::Result<Outcome> {
    let client = client_for(config).await?;
    let (timeout, interval) = wait_settings(&client, timeout, poll_interval);
    let record = client
        .wait_with(&JobId::new(id)?, timeout, interval, report_state)
        .await?;
    finish(&record)
}

pub async fn cancel(config: ClientConfig, id: &str) -> eyre::Result<Outcome> {
    let client = client_for(config).await?;
    let record = client.cancel(&JobId::new(id)?).await?;
    print_json(&record)?;
    Ok(Outcome::Success)
}

/// Every job on the server, optionally narrowed by state and name
pub async fn list(config: ClientConfig, options: ListOptions) -> eyre::Result<Outcome> {
    let client = client_for(config).await?;
    // Minimal views carry no task name to filter on
    let view = match (&options.name, options.view) {
        (Some(_), TaskView::Minimal) => TaskView::Basic,
        (_, view) => view,
    };

    let jobs: Vec<JobRecord> = client
        .list_all_jobs(view, options.state)
        .await?
        .into_iter()
        .filter(|job| name_matches(job, options.name.as_deref()))
        .collect();
    debug!(jobs = jobs.len(), "listed jobs");
    print_json(&jobs)?;
    Ok(Outcome::Success)
}

pub async fn info(config: ClientConfig) -> eyre::Result<Outcome> {
    let client = client_for(config).await?;
    let info = match client.service_info() {
        Some(info) => info.clone(),
        None => client.get_service_info().await?,
    };
    print_json(&info)?;
    Ok(Outcome::Success)
}

/// Read service info up front when the configuration asks for it
async fn client_for(config: ClientConfig) -> eyre::Result<TesClient> {
    let client = if config.server.probe_on_connect {
        TesClient::connect(config).await?
    } else {
        TesClient::new(config)?
    };
    Ok(client)
}

/// Task files are written in the schema of the server's API generation
async fn read_task(client: &TesClient, path: &Path) -> eyre::Result<TaskDocument> {
    let contents = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read task file '{}'", path.display()))?;
    let document: serde_json::Value = serde_json::from_str(&contents)
        .wrap_err_with(|| format!("'{}' is not a valid task document", path.display()))?;
    client
        .decode_task(document)
        .wrap_err_with(|| format!("'{}' is not a valid task document", path.display()))
}

fn name_matches(job: &JobRecord, name: Option<&str>) -> bool {
    let Some(wanted) = name else {
        return true;
    };
    job.task
        .as_ref()
        .and_then(|task| task.name.as_deref())
        .is_some_and(|actual| actual.contains(wanted))
}

/// Flags win over the configured polling defaults
fn wait_settings(
    client: &TesClient,
    timeout: Option<u64>,
    poll_interval: Option<u64>,
) -> (PollTimeout, Duration) {
    let polling = client.polling();
    let timeout = timeout.map_or_else(|| PollTimeout::from(polling), PollTimeout::from_secs);
    let interval = poll_interval.map_or_else(|| polling.interval(), Duration::from_millis);
    (timeout, interval)
}

fn report_state(record: &JobRecord) {
    eprintln!("{}: {}", record.id.as_str(), record.state.as_upper_label());
}

fn finish(record: &JobRecord) -> eyre::Result<Outcome> {
    print_json(record)?;
    let outcome = Outcome::of_wait(record);
    if outcome == Outcome::TimedOut {
        eprintln!(
            "gave up waiting for '{}' in state {}",
            record.id.as_str(),
            record.state.as_upper_label()
        );
    }
    Ok(outcome)
}
