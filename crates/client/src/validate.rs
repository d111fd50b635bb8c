//! Local task checks run before anything is sent

use tes_core::{ApiGeneration, Error, Result, TaskDocument};

/// Collects every violation instead of stopping at the first
#[derive(Debug, Default)]
struct Violations(Vec<String>);

impl Violations {
    fn add(&mut self, message: impl Into<String>) {
        self.0.push(message.into());
    }

    fn require_absolute(&mut self, field: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            if !value.starts_with('/') {
                self.add(format!("{field}: must be an absolute path"));
            }
        }
    }

    fn into_result(self) -> Result<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(self.0.join("; ")))
        }
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Check `task` against the rules of `generation`
///
/// Absolute-path rules only hold for the `tasks` generation; the older
/// generations take capture paths relative to the job's working directory.
pub fn validate_task(task: &TaskDocument, generation: ApiGeneration) -> Result<()> {
    let strict_paths = generation == ApiGeneration::Tasks;
    let mut violations = Violations::default();

    if task.executors.is_empty() {
        violations.add("executors: at least one executor is required");
    }

    for (i, executor) in task.executors.iter().enumerate() {
        if executor.image.trim().is_empty() {
            violations.add(format!("executors[{i}].image: required, but empty"));
        }
        if executor.command.is_empty() {
            violations.add(format!("executors[{i}].command: required, but empty"));
        }
        for (j, port) in executor.ports.iter().enumerate() {
            if port.container == 0 {
                violations.add(format!(
                    "executors[{i}].ports[{j}].container: required, but empty"
                ));
            }
        }
        if strict_paths {
            let captures = [
                ("workdir", &executor.workdir),
                ("stdin", &executor.stdin),
                ("stdout", &executor.stdout),
                ("stderr", &executor.stderr),
            ];
            for (field, value) in captures {
                violations.require_absolute(&format!("executors[{i}].{field}"), value.as_deref());
            }
        }
    }

    for (i, input) in task.inputs.iter().enumerate() {
        if input.path.trim().is_empty() {
            violations.add(format!("inputs[{i}].path: required, but empty"));
        } else if strict_paths {
            violations.require_absolute(&format!("inputs[{i}].path"), Some(&input.path));
        }

        match (is_blank(input.url.as_deref()), is_blank(input.content.as_deref())) {
            (false, false) => {
                violations.add(format!("inputs[{i}]: url and content are mutually exclusive"))
            }
            (true, true) => violations.add(format!("inputs[{i}].url: required, but empty")),
            _ => {}
        }
    }

    for (i, output) in task.outputs.iter().enumerate() {
        if is_blank(output.url.as_deref()) {
            violations.add(format!("outputs[{i}].url: required, but empty"));
        }
        if output.path.trim().is_empty() {
            violations.add(format!("outputs[{i}].path: required, but empty"));
        } else if strict_paths {
            violations.require_absolute(&format!("outputs[{i}].path"), Some(&output.path));
        }
        if output.content.is_some() {
            violations.add(format!("outputs[{i}].content: not allowed"));
        }
    }

    if strict_paths {
        for (i, volume) in task.resources.volumes.iter().enumerate() {
            violations.require_absolute(&format!("volumes[{i}]"), Some(&volume.mount_point));
        }
    }

    if task.tags.keys().any(|k| k.trim().is_empty()) {
        violations.add("tags: keys must be non-empty");
    }

    violations.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tes_core::{Executor, TaskParameter};

    fn hello() -> TaskDocument {
        TaskDocument::new("hello").with_executor(
            Executor::from_command_line("alpine", "echo hello world").with_stdout("stdout"),
        )
    }

    #[test]
    fn test_valid_task_passes() {
        assert!(validate_task(&hello(), ApiGeneration::Jobs).is_ok());
    }

    #[test]
    fn test_no_executors() {
        let err = validate_task(&TaskDocument::new("empty"), ApiGeneration::Jobs).unwrap_err();
        assert!(err.to_string().contains("at least one executor"));
    }

    #[test]
    fn test_relative_paths_only_rejected_for_tasks() {
        assert!(validate_task(&hello(), ApiGeneration::TaskOp).is_ok());
        let err = validate_task(&hello(), ApiGeneration::Tasks).unwrap_err();
        assert!(err.to_string().contains("executors[0].stdout: must be an absolute path"));
    }

    #[test]
    fn test_all_violations_reported() {
        let mut task = TaskDocument::new("bad")
            .with_executor(Executor::new("", Vec::<String>::new()))
            .with_output(TaskParameter {
                path: "/out".to_string(),
                ..Default::default()
            });
        let mut input = TaskParameter::file("s3://b/k", "/in");
        input.content = Some("inline".to_string());
        task = task.with_input(input);
        task.tags.insert(String::new(), "x".to_string());

        let err = validate_task(&task, ApiGeneration::Tasks).unwrap_err();
        let message = err.to_string();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(message.contains("executors[0].image"));
        assert!(message.contains("executors[0].command"));
        assert!(message.contains("inputs[0]: url and content are mutually exclusive"));
        assert!(message.contains("outputs[0].url"));
        assert!(message.contains("tags"));
    }

    #[test]
    fn test_inline_content_input() {
        let mut input = TaskParameter {
            path: "/data/config".to_string(),
            ..Default::default()
        };
        input.content = Some("key=value".to_string());
        let task = hello().with_input(input);
        assert!(validate_task(&task, ApiGeneration::Jobs).is_ok());
    }
}
