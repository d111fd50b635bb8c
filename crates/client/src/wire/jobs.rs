//! The `jobs` and `taskop` dialects
//!
//! Both share one camel-cased schema with `docker` steps and title-case
//! states; they differ only in routes.

use super::{page_token, parse_state, record_id, DecodeError, Route, WireAdapter};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tes_core::{
    ApiGeneration, ExecutorLog, Executor, FileType, JobId, JobListRequest, JobPage, JobRecord,
    PortMapping, Resources, TaskDocument, TaskParameter, TaskView, Volume, API_PREFIX,
};

#[derive(Debug, Clone, Copy)]
pub struct JobsAdapter {
    generation: ApiGeneration,
}

impl JobsAdapter {
    pub fn jobs() -> Self {
        Self {
            generation: ApiGeneration::Jobs,
        }
    }

    pub fn taskop() -> Self {
        Self {
            generation: ApiGeneration::TaskOp,
        }
    }

    fn is_taskop(&self) -> bool {
        self.generation == ApiGeneration::TaskOp
    }

    fn collection_path(&self) -> String {
        if self.is_taskop() {
            format!("{API_PREFIX}/taskop")
        } else {
            format!("{API_PREFIX}/jobs")
        }
    }

    fn job_path(&self, id: &JobId) -> String {
        format!("{}/{id}", self.collection_path())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireTask {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(alias = "projectID", alias = "project", skip_serializing_if = "Option::is_none")]
    project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    inputs: Vec<WireParameter>,
    outputs: Vec<WireParameter>,
    resources: WireResources,
    #[serde(alias = "executors")]
    docker: Vec<WireDocker>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireParameter {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(alias = "url", skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    path: String,
    #[serde(alias = "type")]
    class: String,
    #[serde(alias = "content", skip_serializing_if = "Option::is_none")]
    contents: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireResources {
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_cpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    preemptible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_ram_gb: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    volumes: Vec<WireVolume>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    zones: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireVolume {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size_gb: Option<f64>,
    mount_point: String,
    read_only: bool,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireDocker {
    #[serde(alias = "image")]
    image_name: String,
    #[serde(alias = "command")]
    cmd: Vec<String>,
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
#[serde(rename_all = "camelCase", default)]
struct WireJob {
    #[serde(rename = "jobID", alias = "jobId", alias = "id")]
    job_id: Option<String>,
    task: Option<WireTask>,
    state: String,
    logs: Vec<WireJobLog>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireJobList {
    #[serde(alias = "taskOps", alias = "tasksOps")]
    jobs: Vec<WireJob>,
    next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireJobLog {
    start_time: Option<String>,
    end_time: Option<String>,
    stdout: Option<String>,
    stderr: Option<String>,
    exit_code: Option<i32>,
    #[serde(rename = "hostIP", alias = "hostIp")]
    host_ip: Option<String>,
    ports: Vec<PortMapping>,
}

fn class_of(kind: FileType) -> String {
    match kind {
        FileType::File => "File".to_string(),
        FileType::Directory => "Directory".to_string(),
    }
}

fn kind_of(class: &str) -> FileType {
    if class.eq_ignore_ascii_case("directory") {
        FileType::Directory
    } else {
        FileType::File
    }
}

impl From<&TaskParameter> for WireParameter {
    fn from(param: &TaskParameter) -> Self {
        Self {
            name: param.name.clone(),
            description: param.description.clone(),
            location: param.url.clone(),
            path: param.path.clone(),
            class: class_of(param.kind),
            contents: param.content.clone(),
        }
    }
}

impl From<WireParameter> for TaskParameter {
    fn from(wire: WireParameter) -> Self {
        Self {
            name: wire.name,
            description: wire.description,
            url: wire.location,
            path: wire.path,
            kind: kind_of(&wire.class),
            content: wire.contents,
        }
    }
}

impl From<&Executor> for WireDocker {
    fn from(executor: &Executor) -> Self {
        Self {
            image_name: executor.image.clone(),
            cmd: executor.command.clone(),
            workdir: executor.workdir.clone(),
            stdin: executor.stdin.clone(),
            stdout: executor.stdout.clone(),
            stderr: executor.stderr.clone(),
            env: executor.env.clone(),
            ports: executor.ports.clone(),
        }
    }
}

impl From<WireDocker> for Executor {
    fn from(wire: WireDocker) -> Self {
        Self {
            image: wire.image_name,
            command: wire.cmd,
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
        let resources = &task.resources;
        Self {
            name: task.name.clone(),
            project_id: task.project.clone(),
            description: task.description.clone(),
            inputs: task.inputs.iter().map(WireParameter::from).collect(),
            outputs: task.outputs.iter().map(WireParameter::from).collect(),
            resources: WireResources {
                minimum_cpu_cores: resources.cpu_cores,
                preemptible: resources.preemptible,
                minimum_ram_gb: resources.ram_gb,
                volumes: resources
                    .volumes
                    .iter()
                    .map(|v| WireVolume {
                        name: v.name.clone(),
                        size_gb: v.size_gb,
                        mount_point: v.mount_point.clone(),
                        read_only: v.read_only,
                    })
                    .collect(),
                zones: resources.zones.clone(),
            },
            docker: task.executors.iter().map(WireDocker::from).collect(),
            tags: task.tags.clone(),
        }
    }
}

impl From<WireTask> for TaskDocument {
    fn from(wire: WireTask) -> Self {
        Self {
            name: wire.name,
            project: wire.project_id,
            description: wire.description,
            resources: Resources {
                cpu_cores: wire.resources.minimum_cpu_cores,
                ram_gb: wire.resources.minimum_ram_gb,
                disk_gb: None,
                preemptible: wire.resources.preemptible,
                zones: wire.resources.zones,
                volumes: wire
                    .resources
                    .volumes
                    .into_iter()
                    .map(|v| Volume {
                        name: v.name,
                        size_gb: v.size_gb,
                        mount_point: v.mount_point,
                        read_only: v.read_only,
                    })
                    .collect(),
            },
            executors: wire.docker.into_iter().map(Executor::from).collect(),
            inputs: wire.inputs.into_iter().map(TaskParameter::from).collect(),
            outputs: wire.outputs.into_iter().map(TaskParameter::from).collect(),
            tags: wire.tags,
        }
    }
}

impl From<WireJobLog> for ExecutorLog {
    fn from(wire: WireJobLog) -> Self {
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

fn into_record(wire: WireJob, requested: Option<&JobId>) -> Result<JobRecord, DecodeError> {
    let id = record_id(wire.job_id, requested)?;
    let mut record = JobRecord::new(id, parse_state(&wire.state)?);
    record.logs = wire.logs.into_iter().map(ExecutorLog::from).collect();
    record.task = wire.task.map(TaskDocument::from);
    Ok(record)
}

impl WireAdapter for JobsAdapter {
    fn generation(&self) -> ApiGeneration {
        self.generation
    }

    fn service_info_route(&self) -> Route {
        if self.is_taskop() {
            Route::get(format!("{API_PREFIX}/tasks-service"))
        } else {
            Route::get(format!("{API_PREFIX}/jobs-service"))
        }
    }

    fn submit_route(&self) -> Route {
        if self.is_taskop() {
            Route::post(format!("{API_PREFIX}/tasks:run"))
        } else {
            Route::post(format!("{API_PREFIX}/jobs"))
        }
    }

    // No views in these dialects; every read is full
    fn job_route(&self, id: &JobId, _view: TaskView) -> Route {
        Route::get(self.job_path(id))
    }

    fn cancel_route(&self, id: &JobId) -> Route {
        Route::delete(self.job_path(id))
    }

    // These servers return everything in one page and take no filters
    fn list_route(&self, _request: &JobListRequest) -> Route {
        Route::get(self.collection_path())
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
        let wire: WireJobList = serde_json::from_value(body)?;
        let jobs = wire
            .jobs
            .into_iter()
            .map(|job| into_record(job, None))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(JobPage {
            jobs,
            next_page_token: page_token(wire.next_page_token),
        })
    }
}
