use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;
use tes_config::ClientConfig;
use tes_core::{JobState, TaskView};

use crate::output::Outcome;

pub mod job;
pub mod storage;

/// Amount of detail in a job read
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ViewArg {
    Minimal,
    Basic,
    Full,
}

impl From<ViewArg> for TaskView {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Minimal => TaskView::Minimal,
            ViewArg::Basic => TaskView::Basic,
            ViewArg::Full => TaskView::Full,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a task file and wait for it to finish
    Run {
        /// JSON task document
        task_file: PathBuf,

        /// Pre-signed delegated credential sent on submit
        #[arg(short, long, value_name = "JWT")]
        token: Option<String>,

        /// Seconds to wait for a terminal state (0 waits forever)
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Milliseconds between state reads
        #[arg(long, value_name = "MS")]
        poll_interval: Option<u64>,

        /// Print the job id and return without waiting
        #[arg(long)]
        no_wait: bool,
    },

    /// Show a job
    Get {
        id: String,

        #[arg(long, value_enum, default_value = "full")]
        view: ViewArg,
    },

    /// Wait for an already submitted job
    Wait {
        id: String,

        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        #[arg(long, value_name = "MS")]
        poll_interval: Option<u64>,
    },

    /// Cancel a job and show what the server holds afterwards
    #[command(visible_alias = "delete")]
    Cancel { id: String },

    /// List jobs on the server
    #[command(visible_alias = "list-jobs")]
    Jobs {
        #[arg(long, value_enum, default_value = "minimal")]
        view: ViewArg,

        /// Only jobs in this state (e.g. running, complete)
        #[arg(long)]
        state: Option<JobState>,

        /// Only jobs whose name contains this text
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the server's service information
    Info,

    /// Copy a local file or directory to a storage URI
    Upload { path: PathBuf, uri: String },

    /// Copy a storage URI to a local file or directory
    Download { uri: String, path: PathBuf },

    /// List every object under a storage location
    List { location: String },

    /// Create an object store bucket
    MakeBucket { name: String },

    /// Check whether an object store bucket exists
    BucketExists { name: String },
}

impl Commands {
    pub async fn execute(self, config: ClientConfig) -> eyre::Result<Outcome> {
        match self {
            Commands::Run {
                task_file,
                token,
                timeout,
                poll_interval,
                no_wait,
            } => {
                let options = job::RunOptions {
                    task_file,
                    token,
                    timeout,
                    poll_interval,
                    no_wait,
                };
                job::run(config, options).await
            }
            Commands::Get { id, view } => job::get(config, &id, view.into()).await,
            Commands::Wait {
                id,
                timeout,
                poll_interval,
            } => job::wait(config, &id, timeout, poll_interval).await,
            Commands::Cancel { id } => job::cancel(config, &id).await,
            Commands::Jobs { view, state, name } => {
                let options = job::ListOptions {
                    view: view.into(),
                    state,
                    name,
                };
                job::list(config, options).await
            }
            Commands::Info => job::info(config).await,
            Commands::Upload { path, uri } => storage::upload(config, &path, &uri).await,
            Commands::Download { uri, path } => storage::download(config, &uri, &path).await,
            Commands::List { location } => storage::list(config, &location).await,
            Commands::MakeBucket { name } => storage::make_bucket(config, &name).await,
            Commands::BucketExists { name } => storage::bucket_exists(config, &name).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(subcommand)]
        command: Commands,
    }

    #[test]
    fn test_run_flags() {
        let harness = Harness::try_parse_from([
            "tes", "run", "-t", "aaa.bbb.ccc", "--timeout", "0", "--poll-interval", "250", "task.json",
        ])
        .unwrap();
        match harness.command {
            Commands::Run {
                task_file,
                token,
                timeout,
                poll_interval,
                no_wait,
            } => {
                assert_eq!(task_file, PathBuf::from("task.json"));
                assert_eq!(token.as_deref(), Some("aaa.bbb.ccc"));
                assert_eq!(timeout, Some(0));
                assert_eq!(poll_interval, Some(250));
                assert!(!no_wait);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_delete_alias_and_view() {
        let harness = Harness::try_parse_from(["tes", "delete", "job-1"]).unwrap();
        assert!(matches!(harness.command, Commands::Cancel { id } if id == "job-1"));

        let harness = Harness::try_parse_from(["tes", "get", "job-1", "--view", "minimal"]).unwrap();
        assert!(matches!(
            harness.command,
            Commands::Get { view: ViewArg::Minimal, .. }
        ));
    }

    #[test]
    fn test_jobs_filters() {
        let harness =
            Harness::try_parse_from(["tes", "jobs", "--state", "running", "--name", "align"])
                .unwrap();
        match harness.command {
            Commands::Jobs { view, state, name } => {
                assert!(matches!(view, ViewArg::Minimal));
                assert_eq!(state, Some(JobState::Running));
                assert_eq!(name.as_deref(), Some("align"));
            }
            _ => panic!("expected jobs"),
        }

        let harness = Harness::try_parse_from(["tes", "list-jobs", "--state", "EXECUTOR_ERROR"]);
        assert!(matches!(
            harness.unwrap().command,
            Commands::Jobs { state: Some(JobState::ExecutorError), .. }
        ));
        assert!(Harness::try_parse_from(["tes", "jobs", "--state", "sleeping"]).is_err());
    }

    #[test]
    fn test_storage_commands() {
        let harness =
            Harness::try_parse_from(["tes", "download", "s3://bucket/key", "out.txt"]).unwrap();
        assert!(matches!(harness.command, Commands::Download { uri, .. } if uri == "s3://bucket/key"));

        let harness = Harness::try_parse_from(["tes", "make-bucket", "tes-test"]).unwrap();
        assert!(matches!(harness.command, Commands::MakeBucket { name } if name == "tes-test"));
    }
}
