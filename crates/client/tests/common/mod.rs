//! Scripted TES server for client tests

#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tes_client::TesClient;
use tes_config::ClientConfig;
use tes_core::{ApiGeneration, Executor, TaskDocument};
use wiremock::{Request, Respond, ResponseTemplate};

/// Returns each body in turn, repeating the last one forever
pub struct Sequence {
    bodies: Vec<Value>,
    served: AtomicUsize,
}

impl Sequence {
    pub fn new(bodies: Vec<Value>) -> Self {
        Self {
            bodies,
            served: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.served.fetch_add(1, Ordering::SeqCst);
        let body = self
            .bodies
            .get(index)
            .or_else(|| self.bodies.last())
            .cloned()
            .unwrap_or(Value::Null);
        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// A job whose state is switched by other mocks, e.g. a cancel route
pub struct SharedJob {
    pub body: Mutex<Value>,
}

impl SharedJob {
    pub fn new(body: Value) -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self {
            body: Mutex::new(body),
        })
    }

    pub fn set(&self, body: Value) {
        *self.body.lock().unwrap() = body;
    }
}

pub struct ReadShared(pub std::sync::Arc<SharedJob>);

impl Respond for ReadShared {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(self.0.body.lock().unwrap().clone())
    }
}

/// Job body in the `jobs` dialect
pub fn job(id: &str, state: &str, stdout: &[&str]) -> Value {
    let logs: Vec<Value> = stdout.iter().map(|s| json!({ "stdout": s })).collect();
    json!({ "jobID": id, "state": state, "logs": logs })
}

pub fn client_for(uri: &str, generation: ApiGeneration) -> TesClient {
    let mut config = ClientConfig::for_server(uri);
    config.server.api_generation = generation;
    TesClient::new(config).unwrap()
}

/// The hello-world task: one step that echoes and captures stdout
pub fn hello_task(steps: &[&str]) -> TaskDocument {
    steps.iter().fold(
        TaskDocument::new("TestCase")
            .with_project("Project ID")
            .with_description("Test case."),
        |task, step| {
            task.with_executor(
                Executor::from_command_line("tes-wait", step)
                    .with_stdout("stdout")
                    .with_port(5000, 5000),
            )
        },
    )
}
