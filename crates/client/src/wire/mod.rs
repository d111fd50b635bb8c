//! Wire schemas
//!
//! Servers in the field speak one of three JSON dialects. Each dialect gets one
//! [`WireAdapter`] that knows its routes and field names; everything above this
//! module works on the canonical types from `tes_core`.

mod jobs;
mod tasks;

pub use jobs::JobsAdapter;
pub use tasks::TasksAdapter;

use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tes_core::{
    ApiGeneration, JobId, JobListRequest, JobPage, JobRecord, JobState, ServiceInfo,
    TaskDocument, TaskView,
};

/// Why a response body could not be turned into a canonical value
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("unexpected response shape: {0}")]
    Shape(#[from] serde_json::Error),

    #[error("unknown job state '{0}'")]
    UnknownState(String),

    #[error("response carries no job id")]
    MissingId,
}

/// A route on the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    /// Absolute path, optionally with a query
    pub path: String,
}

impl Route {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
        }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            method: Method::DELETE,
            path: path.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Translates between canonical types and one API generation's JSON
pub trait WireAdapter: Send + Sync + fmt::Debug {
    fn generation(&self) -> ApiGeneration;

    fn service_info_route(&self) -> Route;
    fn submit_route(&self) -> Route;
    fn job_route(&self, id: &JobId, view: TaskView) -> Route;
    fn cancel_route(&self, id: &JobId) -> Route;
    fn list_route(&self, request: &JobListRequest) -> Route;

    fn encode_task(&self, task: &TaskDocument) -> Result<Value, serde_json::Error>;

    /// Read a task document written in this generation's schema
    fn decode_task(&self, document: Value) -> Result<TaskDocument, serde_json::Error>;

    /// Decode a job read; `id` fills in when the body omits it
    fn decode_record(&self, id: &JobId, body: Value) -> Result<JobRecord, DecodeError>;

    /// Decode one page of a listing; every entry must carry its own id
    fn decode_list(&self, body: Value) -> Result<JobPage, DecodeError>;

    /// The id from a create response, found under `value` or `id`
    fn decode_job_id(&self, body: Value) -> Result<JobId, DecodeError> {
        #[derive(Deserialize)]
        struct CreateResponse {
            value: Option<String>,
            id: Option<String>,
        }

        let response: CreateResponse = serde_json::from_value(body)?;
        response
            .value
            .or(response.id)
            .and_then(|id| JobId::new(id).ok())
            .ok_or(DecodeError::MissingId)
    }

    fn decode_service_info(&self, body: Value) -> Result<ServiceInfo, DecodeError> {
        #[derive(Deserialize, Default)]
        #[serde(default)]
        struct WireServiceInfo {
            name: Option<String>,
            #[serde(alias = "description")]
            doc: Option<String>,
            version: Option<String>,
            storage: Vec<String>,
            #[serde(alias = "storageConfig")]
            storage_config: BTreeMap<String, String>,
        }

        let wire: WireServiceInfo = serde_json::from_value(body)?;
        Ok(ServiceInfo {
            name: wire.name,
            doc: wire.doc,
            version: wire.version,
            storage: wire.storage,
            storage_config: wire.storage_config,
        })
    }
}

/// Adapter for `generation`
pub fn adapter_for(generation: ApiGeneration) -> Box<dyn WireAdapter> {
    match generation {
        ApiGeneration::TaskOp => Box::new(JobsAdapter::taskop()),
        ApiGeneration::Jobs => Box::new(JobsAdapter::jobs()),
        ApiGeneration::Tasks => Box::new(TasksAdapter),
    }
}

fn parse_state(label: &str) -> Result<JobState, DecodeError> {
    JobState::from_label(label).ok_or_else(|| DecodeError::UnknownState(label.to_string()))
}

fn record_id(reported: Option<String>, requested: Option<&JobId>) -> Result<JobId, DecodeError> {
    reported
        .and_then(|id| JobId::new(id).ok())
        .or_else(|| requested.cloned())
        .ok_or(DecodeError::MissingId)
}

/// Servers mark the last page with a missing or empty token
fn page_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.trim().is_empty())
}
