//! The `tasks` dialect
//!
//! Snake-cased fields, upper-case states, and executor logs nested under one
//! entry per attempt. Camel-cased field names are accepted on read since some
//! servers emit them.

use super::{page_token, parse_state, record_id, DecodeError, Route, WireAdapter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tes_core::{
    ApiGeneration, Executor, ExecutorLog, FileType, JobId, JobListRequest, JobPage, JobRecord,
    JobState, PortMapping, Resources, TaskDocument, TaskParameter, TaskView, Volume, API_PREFIX,
};
use url::form_urlencoded;

#[derive(Debug, Clone, Copy, Default)]
pub struct TasksAdapter;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    inputs: Vec<WireParameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    outputs: Vec<WireParameter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resources: Option<WireResources>,
    executors: Vec<WireExecutor>,
    /// Mount points shared by every executor
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    path: String,
    #[serde(rename = "type")]
    kind: FileType,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireResources {
    #[serde(alias = "cpuCores", skip_serializing_if = "Option::is_none")]
    cpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preemptible: Option<bool>,
    #[serde(alias = "ramGb", skip_serializing_if = "Option::is_none")]
    ram_gb: Option<f64>,
    #[serde(alias = "diskGb", skip_serializing_if = "Option::is_none")]
    disk_gb: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    zones: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct WireExecutor {
    image: String,
    command: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    workdir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    env: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ports: Vec<PortMapping>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTaskRecord {
    id: Option<String>,
    state: Option<String>,
    /// One entry per attempt, oldest first
    logs: Vec<WireAttempt>,
    #[serde(alias = "creationTime")]
    creation_time: Option<String>,
    #[serde(flatten)]
    task: WireTask,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireTaskList {
    tasks: Vec<WireTaskRecord>,
    #[serde(alias = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireAttempt {
    logs: Vec<WireExecutorLog>,
    #[serde(alias = "systemLogs")]
    system_logs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WireExecutorLog {
    #[serde(alias = "startTime")]
    start_time: Option<String>,
    #[serde(alias = "endTime")]
    end_time: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
    #[serde(alias = "exitCode")]
    exit_code: Option<i32>,
    #[serde(alias = "hostIp")]
    host_ip: Option<String>,
    ports: Vec<PortMapping>,
}

impl From<&TaskParameter> for WireParameter {
    fn from(param: &TaskParameter) -> Self {
        Self {
            name: param.name.clone(),
            description: param.description.clone(),
            url: param.url.clone(),
            path: param.path.clone(),
            kind: param.kind,
            content: param.content.clone(),
        }
    }
}

impl From<WireParameter> for TaskParameter {
    fn from(wire: WireParameter) -> Self {
        Self {
            name: wire.name,
            description: wire.description,
            url: wire.url,
            path: wire.path,
            kind: wire.kind,
            content: wire.content,
        }
    }
}

impl From<&Executor> for WireExecutor {
    fn from(executor: &Executor) -> Self {
        Self {
            image: executor.image.clone(),
            command: executor.command.clone(),
            workdir: executor.workdir.clone(),
            stdin: executor.stdin.clone(),
            stdout: executor.stdout.clone(),
            stderr: executor.stderr.clone(),
            env: executor.env.clone(),
            ports: executor.ports.clone(),
        }
    }
}

impl From<WireExecutor> for Executor {
    fn from(wire: WireExecutor) -> Self {
        Self {
            image: wire.image,
            command: wire.command,
            workdir: wire.workdir,
            stdin: wire.stdin,
            stdout: wire.stdout,
            stderr: wire.stderr,
            env: wire.env,
            ports: wire.ports,
        }
    }
}

impl From<&TaskDocument> for WireTask {
    fn from(task: &TaskDocument) -> Self {
        let r = &task.resources;
        let resources = (r.cpu_cores.is_some()
            || r.ram_gb.is_some()
            || r.disk_gb.is_some()
            || r.preemptible.is_some()
            || !r.zones.is_empty())
        .then(|| WireResources {
            cpu_cores: r.cpu_cores,
            preemptible: r.preemptible,
            ram_gb: r.ram_gb,
            disk_gb: r.disk_gb,
            zones: r.zones.clone(),
        });

        Self {
            name: task.name.clone(),
            project: task.project.clone(),
            description: task.description.clone(),
            inputs: task.inputs.iter().map(WireParameter::from).collect(),
            outputs: task.outputs.iter().map(WireParameter::from).collect(),
            resources,
            executors: task.executors.iter().map(WireExecutor::from).collect(),
            volumes: r.volumes.iter().map(|v| v.mount_point.clone()).collect(),
            tags: task.tags.clone(),
        }
    }
}

impl From<WireTask> for TaskDocument {
    fn from(wire: WireTask) -> Self {
        let resources = wire.resources.unwrap_or_default();
        Self {
            name: wire.name,
            project: wire.project,
            description: wire.description,
            resources: Resources {
                cpu_cores: resources.cpu_cores,
                ram_gb: resources.ram_gb,
                disk_gb: resources.disk_gb,
                preemptible: resources.preemptible,
                zones: resources.zones,
                volumes: wire
                    .volumes
                    .into_iter()
                    .map(|mount_point| Volume {
                        mount_point,
                        ..Default::default()
                    })
                    .collect(),
            },
            executors: wire.executors.into_iter().map(Executor::from).collect(),
            inputs: wire.inputs.into_iter().map(TaskParameter::from).collect(),
            outputs: wire.outputs.into_iter().map(TaskParameter::from).collect(),
            tags: wire.tags,
        }
    }
}

impl From<WireExecutorLog> for ExecutorLog {
    fn from(wire: WireExecutorLog) -> Self {
        Self {
            start_time: wire.start_time,
            end_time: wire.end_time,
            stdout: wire.stdout,
            stderr: wire.stderr,
            exit_code: wire.exit_code,
            host_ip: wire.host_ip,
            ports: wire.ports,
        }
    }
}

impl WireAdapter for TasksAdapter {
    fn generation(&self) -> ApiGeneration {
        ApiGeneration::Tasks
    }

    fn service_info_route(&self) -> Route {
        Route::get(format!("{API_PREFIX}/tasks/service-info"))
    }

    fn submit_route(&self) -> Route {
        Route::post(format!("{API_PREFIX}/tasks"))
    }

    fn job_route(&self, id: &JobId, view: TaskView) -> Route {
        Route::get(format!("{API_PREFIX}/tasks/{id}?view={}", view.as_str()))
    }

    fn cancel_route(&self, id: &JobId) -> Route {
        Route::post(format!("{API_PREFIX}/tasks/{id}:cancel"))
    }

    fn list_route(&self, request: &JobListRequest) -> Route {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("view", request.view.as_str());
        if let Some(size) = request.page_size {
            query.append_pair("page_size", &size.to_string());
        }
        if let Some(token) = &request.page_token {
            query.append_pair("page_token", token);
        }
        if let Some(state) = request.state {
            query.append_pair("state", state.as_upper_label());
        }
        Route::get(format!("{API_PREFIX}/tasks?{}", query.finish()))
    }

    fn encode_task(&self, task: &TaskDocument) -> Result<Value, serde_json::Error> {
        serde_json::to_value(WireTask::from(task))
    }

    fn decode_task(&self, document: Value) -> Result<TaskDocument, serde_json::Error> {
        serde_json::from_value::<WireTask>(document).map(TaskDocument::from)
    }

    fn decode_record(&self, id: &JobId, body: Value) -> Result<JobRecord, DecodeError> {
        into_record(serde_json::from_value(body)?, Some(id))
    }

    fn decode_list(&self, body: Value) -> Result<JobPage, DecodeError> {
        let wire: WireTaskList = serde_json::from_value(body)?;
        let jobs = wire
            .tasks
            .into_iter()
            .map(|task| into_record(task, None))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JobPage {
            jobs,
            next_page_token: page_token(wire.next_page_token),
        })
    }
}

fn into_record(wire: WireTaskRecord, requested: Option<&JobId>) -> Result<JobRecord, DecodeError> {
    // A MINIMAL view of a freshly created task may omit the state
    let state = match wire.state.as_deref() {
        Some(label) => parse_state(label)?,
        None => JobState::Unknown,
    };

    let mut record = JobRecord::new(record_id(wire.id, requested)?, state);
    record.creation_time = wire.creation_time;
    record.system_logs = wire
        .logs
        .iter()
        .flat_map(|attempt| attempt.system_logs.iter().cloned())
        .collect();
    record.logs = wire
        .logs
        .into_iter()
        .last()
        .map(|attempt| attempt.logs.into_iter().map(ExecutorLog::from).collect())
        .unwrap_or_default();
    if !wire.task.executors.is_empty() || wire.task.name.is_some() {
        record.task = Some(TaskDocument::from(wire.task));
    }
    Ok(record)
}
