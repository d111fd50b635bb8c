//! Canonical task document
//!
//! These types are the client's own representation of a task. They are
//! independent of any wire schema: the client crate translates them to and
//! from each API generation's JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A task submitted to a TES server
///
/// Immutable once submitted; the server is the sole mutator of everything
/// that happens afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskDocument {
    pub name: Option<String>,
    pub project: Option<String>,
    pub description: Option<String>,
    pub resources: Resources,
    /// Executors run in order, one container each
    pub executors: Vec<Executor>,
    pub inputs: Vec<TaskParameter>,
    pub outputs: Vec<TaskParameter>,
    pub tags: BTreeMap<String, String>,
}

impl TaskDocument {
    /// Create an empty task with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// Append an executor
    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executors.push(executor);
        self
    }

    /// Append an input
    pub fn with_input(mut self, input: TaskParameter) -> Self {
        self.inputs.push(input);
        self
    }

    /// Append an output
    pub fn with_output(mut self, output: TaskParameter) -> Self {
        self.outputs.push(output);
        self
    }

    /// Set the project identifier
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Resource requests
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Resources {
    pub cpu_cores: Option<u32>,
    pub ram_gb: Option<f64>,
    pub disk_gb: Option<f64>,
    pub preemptible: Option<bool>,
    pub zones: Vec<String>,
    pub volumes: Vec<Volume>,
}

/// A volume mounted into every executor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Volume {
    pub name: Option<String>,
    pub size_gb: Option<f64>,
    pub mount_point: String,
    pub read_only: bool,
}

/// One container invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Executor {
    pub image: String,
    pub command: Vec<String>,
    pub workdir: Option<String>,
    pub stdin: Option<String>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub env: BTreeMap<String, String>,
    pub ports: Vec<PortMapping>,
}

impl Executor {
    /// Create an executor running `command` in `image`
    pub fn new<I, S>(image: impl Into<String>, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            image: image.into(),
            command: command.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Create an executor from a whitespace separated command line
    pub fn from_command_line(image: impl Into<String>, line: &str) -> Self {
        Self::new(image, line.split_whitespace())
    }

    /// Capture stdout to the given path
    pub fn with_stdout(mut self, path: impl Into<String>) -> Self {
        self.stdout = Some(path.into());
        self
    }

    /// Capture stderr to the given path
    pub fn with_stderr(mut self, path: impl Into<String>) -> Self {
        self.stderr = Some(path.into());
        self
    }

    /// Publish a container port on the host
    pub fn with_port(mut self, host: u16, container: u16) -> Self {
        self.ports.push(PortMapping { host, container });
        self
    }
}

/// Host to container port mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub host: u16,
    pub container: u16,
}

/// An input or output of a task
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskParameter {
    pub name: Option<String>,
    pub description: Option<String>,
    /// Storage URI the worker reads from or writes to
    pub url: Option<String>,
    /// Path inside the container
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileType,
    /// Inline content, inputs only
    pub content: Option<String>,
}

impl TaskParameter {
    /// A file parameter moving between `url` and container `path`
    pub fn file(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            path: path.into(),
            ..Default::default()
        }
    }

    /// A directory parameter moving between `url` and container `path`
    pub fn directory(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            path: path.into(),
            kind: FileType::Directory,
            ..Default::default()
        }
    }
}

/// Whether a parameter is a single file or a directory tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileType {
    #[default]
    File,
    Directory,
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileType::File => write!(f, "FILE"),
            FileType::Directory => write!(f, "DIRECTORY"),
        }
    }
}
