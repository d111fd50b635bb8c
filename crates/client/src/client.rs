//! HTTP client for a TES server
//!
//! Every operation is one request (cancel is two) issued in sequence. The
//! client never retries a failed request; the only loop lives in `wait`.

use crate::validate::validate_task;
use crate::wire::{adapter_for, Route, WireAdapter};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tes_config::{ClientConfig, PollingConfig};
use tes_core::{
    ApiGeneration, Error, JobId, JobListRequest, JobPage, JobRecord, JobState, Result,
    SecretString, ServiceInfo, TaskDocument, TaskView,
};
use tes_security::{CredentialDelegator, Token};
use tracing::{debug, info, instrument, warn};
use url::Url;

const USER_AGENT: &str = concat!("tes-client/", env!("CARGO_PKG_VERSION"));

/// What a non-success status means for the operation that received it
#[derive(Debug, Clone, Copy)]
enum Operation<'a> {
    Probe,
    List,
    Submit,
    Read(&'a JobId),
}

/// Client bound to one server and one API generation
#[derive(Debug)]
pub struct TesClient {
    http: reqwest::Client,
    base_url: Url,
    adapter: Box<dyn WireAdapter>,
    config: ClientConfig,
    basic_auth: Option<(String, Option<SecretString>)>,
    token: Option<Token>,
    /// What the server reported when the client was built with `connect`
    service_info: Option<ServiceInfo>,
    /// Cleared when a probed server has no object store to hand credentials to
    delegate: bool,
}

impl TesClient {
    /// Build a client without contacting the server
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base_url = config.server.base_url()?;
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.server.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;

        let basic_auth = config
            .server
            .user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .map(|user| (user, config.server.password.clone()));

        debug!(
            server = %base_url,
            generation = %config.server.api_generation,
            "created TES client"
        );

        Ok(Self {
            http,
            base_url,
            adapter: adapter_for(config.server.api_generation),
            config,
            basic_auth,
            token: None,
            service_info: None,
            delegate: true,
        })
    }

    /// Build a client and probe the server once; a failed probe fails construction
    ///
    /// A server that advertises no object store gets no delegated credentials
    /// unless delegation is required.
    pub async fn connect(config: ClientConfig) -> Result<Self> {
        let mut client = Self::new(config)?;
        let info = client.get_service_info().await?;
        info!(
            server = %client.base_url,
            name = info.name.as_deref().unwrap_or("unknown"),
            "connected to TES server"
        );
        if !info.supports_s3() {
            debug!("server advertises no object store, credential delegation disabled");
            client.delegate = false;
        }
        client.service_info = Some(info);
        Ok(client)
    }

    /// Attach a pre-signed credential to every submission instead of signing one
    #[must_use]
    pub fn with_token(mut self, token: Token) -> Self {
        self.token = Some(token);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn generation(&self) -> ApiGeneration {
        self.adapter.generation()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Polling defaults from configuration
    pub fn polling(&self) -> &PollingConfig {
        &self.config.polling
    }

    /// Service info read by [`TesClient::connect`]
    pub fn service_info(&self) -> Option<&ServiceInfo> {
        self.service_info.as_ref()
    }

    /// Read a task document written in this client's wire schema
    ///
    /// The `jobs` and `taskop` schemas also accept the canonical field names.
    pub fn decode_task(&self, document: Value) -> Result<TaskDocument> {
        self.adapter.decode_task(document).map_err(|e| {
            Error::validation(format!(
                "task does not match the {} schema: {e}",
                self.generation()
            ))
        })
    }

    /// Fetch the server's capability metadata
    #[instrument(skip(self))]
    pub async fn get_service_info(&self) -> Result<ServiceInfo> {
        let route = self.adapter.service_info_route();
        let body = self.call(&route, None, None, Operation::Probe).await?;
        self.adapter
            .decode_service_info(body)
            .map_err(|e| Error::protocol(route.to_string(), e.to_string()))
    }

    /// Validate and submit a task, returning the id the server assigned
    #[instrument(skip(self, task), fields(name = task.name.as_deref().unwrap_or("")))]
    pub async fn submit(&self, task: &TaskDocument) -> Result<JobId> {
        validate_task(task, self.generation())?;
        let token = self.submission_token()?;

        let route = self.adapter.submit_route();
        let payload = self
            .adapter
            .encode_task(task)
            .map_err(|e| Error::validation(format!("task cannot be encoded: {e}")))?;

        let body = self
            .call(&route, Some(&payload), token.as_ref(), Operation::Submit)
            .await?;
        let id = self
            .adapter
            .decode_job_id(body)
            .map_err(|e| Error::protocol(route.to_string(), e.to_string()))?;

        info!(job_id = %id, "submitted task");
        Ok(id)
    }

    /// Read the job's current state and logs
    pub async fn get_job(&self, id: &JobId) -> Result<JobRecord> {
        self.get_job_view(id, TaskView::Full).await
    }

    /// Read the job with a reduced view where the generation supports one
    #[instrument(skip(self, id), fields(job_id = %id))]
    pub async fn get_job_view(&self, id: &JobId, view: TaskView) -> Result<JobRecord> {
        let route = self.adapter.job_route(id, view);
        let body = self.call(&route, None, None, Operation::Read(id)).await?;
        let record = self
            .adapter
            .decode_record(id, body)
            .map_err(|e| Error::protocol(route.to_string(), e.to_string()))?;
        debug!(state = %record.state, logs = record.logs.len(), "read job");
        Ok(record)
    }

    /// Ask the server to cancel the job, then read it back
    ///
    /// A job that already reached a terminal state keeps it; the returned
    /// record shows whatever the server holds after the request.
    #[instrument(skip(self, id), fields(job_id = %id))]
    pub async fn cancel(&self, id: &JobId) -> Result<JobRecord> {
        let route = self.adapter.cancel_route(id);
        self.call(&route, None, None, Operation::Read(id)).await?;
        info!("cancel requested");
        self.get_job(id).await
    }

    /// Alias of [`TesClient::cancel`]
    pub async fn delete_job(&self, id: &JobId) -> Result<JobRecord> {
        self.cancel(id).await
    }

    /// Read one page of jobs
    #[instrument(
        skip(self, request),
        fields(page_token = request.page_token.as_deref().unwrap_or(""))
    )]
    pub async fn list_jobs(&self, request: &JobListRequest) -> Result<JobPage> {
        let route = self.adapter.list_route(request);
        let body = self.call(&route, None, None, Operation::List).await?;
        let page = self
            .adapter
            .decode_list(body)
            .map_err(|e| Error::protocol(route.to_string(), e.to_string()))?;
        debug!(
            jobs = page.jobs.len(),
            more = page.next_page_token.is_some(),
            "listed jobs"
        );
        Ok(page)
    }

    /// Every job the server knows, following page tokens to the end
    ///
    /// `state` is sent to servers that filter and applied again here for those
    /// that ignore it.
    pub async fn list_all_jobs(
        &self,
        view: TaskView,
        state: Option<JobState>,
    ) -> Result<Vec<JobRecord>> {
        let mut request = JobListRequest {
            view,
            state,
            ..Default::default()
        };
        let mut jobs = Vec::new();

        loop {
            let page = self.list_jobs(&request).await?;
            let empty = page.jobs.is_empty();
            jobs.extend(
                page.jobs
                    .into_iter()
                    .filter(|job| state.map_or(true, |s| job.state == s)),
            );

            match page.next_page_token {
                Some(token) if request.page_token.as_deref() == Some(token.as_str()) => {
                    warn!(%token, "server repeated a page token, stopping");
                    return Ok(jobs);
                }
                Some(token) if !empty => request.page_token = Some(token),
                _ => return Ok(jobs),
            }
        }
    }

    /// The credential to attach to the next submission, if any
    fn submission_token(&self) -> Result<Option<Token>> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }
        if !self.delegate && !self.config.delegation.required {
            return Ok(None);
        }
        CredentialDelegator::from_config(&self.config)?
            .map(|delegator| delegator.issue())
            .transpose()
    }

    fn request(&self, route: &Route) -> Result<RequestBuilder> {
        let url = self.base_url.join(&route.path).map_err(|e| {
            Error::configuration(format!("invalid request path '{}': {e}", route.path))
        })?;
        Ok(self.http.request(route.method.clone(), url))
    }

    async fn call(
        &self,
        route: &Route,
        payload: Option<&Value>,
        token: Option<&Token>,
        operation: Operation<'_>,
    ) -> Result<Value> {
        let endpoint = route.to_string();
        let mut request = self.request(route)?;
        if let Some(payload) = payload {
            request = request.json(payload);
        }
        // Both credentials travel in `authorization`; a delegated token wins
        match (token, &self.basic_auth) {
            (Some(token), _) => {
                request = request.header(reqwest::header::AUTHORIZATION, token.header_value());
            }
            (None, Some((user, password))) => {
                request = request.basic_auth(user, password.as_ref().map(SecretString::expose));
            }
            (None, None) => {}
        }

        debug!(%endpoint, "sending request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::connection(&endpoint, describe(&e)))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::connection(&endpoint, describe(&e)))?;

        check_status(&endpoint, status, &text, operation)?;

        // Cancel responses are often empty
        if text.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&text)
            .map_err(|e| Error::protocol(&endpoint, format!("body is not JSON: {e}")))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {error}")
    } else {
        error.to_string()
    }
}

fn check_status(
    endpoint: &str,
    status: StatusCode,
    body: &str,
    operation: Operation<'_>,
) -> Result<()> {
    if status.is_success() {
        return Ok(());
    }
    let body = body.trim();
    match operation {
        Operation::Read(id) if status == StatusCode::NOT_FOUND => {
            Err(Error::not_found(id.as_str()))
        }
        Operation::Submit if status.is_client_error() => Err(Error::validation(format!(
            "server rejected the task ({status}): {body}"
        ))),
        _ => Err(Error::unexpected_status(endpoint, status.as_u16(), body)),
    }
}
