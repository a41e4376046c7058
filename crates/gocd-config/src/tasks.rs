//! Job tasks and their execution guards.

use std::fmt;
use std::str::FromStr;

use gocd_xml::Node;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

pub const SCRIPT_EXECUTOR_PLUGIN_ID: &str = "script-executor";

/// A task's execution guard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunIf {
    #[default]
    Passed,
    Failed,
    Any,
}

impl RunIf {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunIf::Passed => "passed",
            RunIf::Failed => "failed",
            RunIf::Any => "any",
        }
    }

    /// Decode from the guard markers on a task element. Zero markers mean
    /// `passed`; one means its value; the pair `{passed, failed}` means
    /// `any`. Any other combination is ambiguous and fatal.
    fn decode(element: &Node) -> Result<RunIf> {
        let statuses: Vec<String> = element
            .children_with_tag("runif")
            .iter()
            .filter_map(|runif| runif.attribute("status"))
            .collect();
        match statuses.as_slice() {
            [] => Ok(RunIf::Passed),
            [single] => single.parse(),
            [a, b]
                if (a == "passed" && b == "failed") || (a == "failed" && b == "passed") =>
            {
                Ok(RunIf::Any)
            }
            _ => Err(ConfigError::AmbiguousRunIf(statuses.join(", "))),
        }
    }

    /// Write the guard markers. `any` is represented in the document as the
    /// simultaneous presence of both `passed` and `failed` markers.
    fn append_to(&self, element: &Node) {
        match self {
            RunIf::Any => {
                element
                    .append_new_child("runif")
                    .set_attribute("status", "passed");
                element
                    .append_new_child("runif")
                    .set_attribute("status", "failed");
            }
            other => {
                element
                    .append_new_child("runif")
                    .set_attribute("status", other.as_str());
            }
        }
    }
}

impl fmt::Display for RunIf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunIf {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<RunIf> {
        match s {
            "passed" => Ok(RunIf::Passed),
            "failed" => Ok(RunIf::Failed),
            "any" => Ok(RunIf::Any),
            other => Err(ConfigError::InvalidRunIf(other.to_string())),
        }
    }
}

/// A shell command with arguments and an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecTask {
    pub command_and_args: Vec<String>,
    pub working_dir: Option<String>,
    pub runif: RunIf,
}

impl ExecTask {
    pub fn new<I, S>(command_and_args: I) -> ExecTask
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ExecTask {
            command_and_args: command_and_args.into_iter().map(Into::into).collect(),
            working_dir: None,
            runif: RunIf::default(),
        }
    }

    #[must_use]
    pub fn with_working_dir(mut self, working_dir: &str) -> ExecTask {
        self.working_dir = Some(working_dir.to_string());
        self
    }

    #[must_use]
    pub fn with_runif(mut self, runif: RunIf) -> ExecTask {
        self.runif = runif;
        self
    }
}

/// The mutually exclusive source of a fetched artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchArtifactSource {
    File(String),
    Dir(String),
}

impl FetchArtifactSource {
    fn as_attribute(&self) -> (&'static str, &str) {
        match self {
            FetchArtifactSource::File(value) => ("srcfile", value),
            FetchArtifactSource::Dir(value) => ("srcdir", value),
        }
    }

    fn decode(element: &Node) -> Result<FetchArtifactSource> {
        if let Some(value) = element.attribute("srcfile") {
            return Ok(FetchArtifactSource::File(value));
        }
        if let Some(value) = element.attribute("srcdir") {
            return Ok(FetchArtifactSource::Dir(value));
        }
        Err(ConfigError::MissingFetchSource)
    }
}

/// Fetch an artifact produced by another pipeline/stage/job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchArtifactTask {
    pub pipeline: String,
    pub stage: String,
    pub job: String,
    pub src: FetchArtifactSource,
    pub dest: Option<String>,
    pub origin: Option<String>,
    pub runif: RunIf,
}

impl FetchArtifactTask {
    pub fn new(pipeline: &str, stage: &str, job: &str, src: FetchArtifactSource) -> FetchArtifactTask {
        FetchArtifactTask {
            pipeline: pipeline.to_string(),
            stage: stage.to_string(),
            job: job.to_string(),
            src,
            dest: None,
            origin: None,
            runif: RunIf::default(),
        }
    }

    #[must_use]
    pub fn with_dest(mut self, dest: &str) -> FetchArtifactTask {
        self.dest = Some(dest.to_string());
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: &str) -> FetchArtifactTask {
        self.origin = Some(origin.to_string());
        self
    }

    #[must_use]
    pub fn with_runif(mut self, runif: RunIf) -> FetchArtifactTask {
        self.runif = runif;
        self
    }
}

/// A build-tool invocation by target name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RakeTask {
    pub target: String,
    pub runif: RunIf,
}

impl RakeTask {
    pub fn new(target: &str) -> RakeTask {
        RakeTask {
            target: target.to_string(),
            runif: RunIf::default(),
        }
    }

    #[must_use]
    pub fn with_runif(mut self, runif: RunIf) -> RakeTask {
        self.runif = runif;
        self
    }
}

/// A script body executed through the script-executor plugin wrapper.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTask {
    pub script: String,
    pub runif: RunIf,
}

impl ScriptTask {
    pub fn new(script: &str) -> ScriptTask {
        ScriptTask {
            script: script.to_string(),
            runif: RunIf::default(),
        }
    }

    #[must_use]
    pub fn with_runif(mut self, runif: RunIf) -> ScriptTask {
        self.runif = runif;
        self
    }
}

/// A named plugin task carrying ordered configuration properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginTask {
    pub plugin_id: String,
    pub version: Option<String>,
    pub properties: Vec<(String, String)>,
    pub runif: RunIf,
}

impl PluginTask {
    pub fn new<I, K, V>(plugin_id: &str, properties: I) -> PluginTask
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        PluginTask {
            plugin_id: plugin_id.to_string(),
            version: None,
            properties: properties
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
            runif: RunIf::default(),
        }
    }

    #[must_use]
    pub fn with_version(mut self, version: &str) -> PluginTask {
        self.version = Some(version.to_string());
        self
    }

    #[must_use]
    pub fn with_runif(mut self, runif: RunIf) -> PluginTask {
        self.runif = runif;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    Exec(ExecTask),
    FetchArtifact(FetchArtifactTask),
    Rake(RakeTask),
    Script(ScriptTask),
    Plugin(PluginTask),
}

impl Task {
    pub fn runif(&self) -> RunIf {
        match self {
            Task::Exec(task) => task.runif,
            Task::FetchArtifact(task) => task.runif,
            Task::Rake(task) => task.runif,
            Task::Script(task) => task.runif,
            Task::Plugin(task) => task.runif,
        }
    }

    /// Decode dispatches on the element tag, and for a `<task>` plugin
    /// wrapper on the embedded plugin id. Unknown tags are fatal; no
    /// partially populated task is ever returned.
    pub fn decode(element: &Node) -> Result<Task> {
        let runif = RunIf::decode(element)?;
        match element.tag().as_str() {
            "exec" => {
                let command = element
                    .attribute("command")
                    .ok_or_else(|| ConfigError::MissingAttribute {
                        tag: "exec".to_string(),
                        attribute: "command".to_string(),
                    })?;
                let mut command_and_args = vec![command];
                for arg in element.children_with_tag("arg") {
                    command_and_args.push(arg.text().unwrap_or_default());
                }
                Ok(Task::Exec(ExecTask {
                    command_and_args,
                    working_dir: element.attribute("workingdir"),
                    runif,
                }))
            }
            "fetchartifact" => Ok(Task::FetchArtifact(FetchArtifactTask {
                pipeline: required(element, "pipeline")?,
                stage: required(element, "stage")?,
                job: required(element, "job")?,
                src: FetchArtifactSource::decode(element)?,
                dest: element.attribute("dest"),
                origin: element.attribute("origin"),
                runif,
            })),
            "rake" => Ok(Task::Rake(RakeTask {
                target: required(element, "target")?,
                runif,
            })),
            "task" => decode_plugin_wrapper(element, runif),
            other => Err(ConfigError::UnknownTask(other.to_string())),
        }
    }

    /// Append this task to the job's `tasks` list and return the created
    /// element. The structural inverse of [`Task::decode`].
    pub fn append_to(&self, job: &Node) -> Node {
        let tasks = job.ensure_child("tasks");
        let element = match self {
            Task::Exec(task) => {
                let element = tasks.append_new_child("exec");
                if let Some(command) = task.command_and_args.first() {
                    element.set_attribute("command", command);
                }
                if let Some(working_dir) = &task.working_dir {
                    element.set_attribute("workingdir", working_dir);
                }
                for arg in task.command_and_args.iter().skip(1) {
                    element.append_new_child("arg").set_text(arg);
                }
                element
            }
            Task::FetchArtifact(task) => {
                let element = tasks.append_new_child("fetchartifact");
                element.set_attribute("pipeline", &task.pipeline);
                element.set_attribute("stage", &task.stage);
                element.set_attribute("job", &task.job);
                let (attribute, value) = task.src.as_attribute();
                element.set_attribute(attribute, value);
                if let Some(dest) = &task.dest {
                    element.set_attribute("dest", dest);
                }
                if let Some(origin) = &task.origin {
                    element.set_attribute("origin", origin);
                }
                element
            }
            Task::Rake(task) => {
                let element = tasks.append_new_child("rake");
                element.set_attribute("target", &task.target);
                element
            }
            Task::Script(task) => {
                let element = tasks.append_new_child("task");
                let plugin = element.append_new_child("pluginConfiguration");
                plugin.set_attribute("id", SCRIPT_EXECUTOR_PLUGIN_ID);
                plugin.set_attribute("version", "1");
                let configuration = element.append_new_child("configuration");
                append_property(&configuration, "script", &task.script);
                element
            }
            Task::Plugin(task) => {
                let element = tasks.append_new_child("task");
                let plugin = element.append_new_child("pluginConfiguration");
                plugin.set_attribute("id", &task.plugin_id);
                if let Some(version) = &task.version {
                    plugin.set_attribute("version", version);
                }
                let configuration = element.append_new_child("configuration");
                for (key, value) in &task.properties {
                    append_property(&configuration, key, value);
                }
                element
            }
        };
        self.runif().append_to(&element);
        element
    }
}

fn required(element: &Node, attribute: &str) -> Result<String> {
    element
        .attribute(attribute)
        .ok_or_else(|| ConfigError::MissingAttribute {
            tag: element.tag(),
            attribute: attribute.to_string(),
        })
}

fn append_property(configuration: &Node, key: &str, value: &str) {
    let property = configuration.ensure_child_with_descendant("property", "key", key);
    property.ensure_child("value").set_text(value);
}

fn decode_plugin_wrapper(element: &Node, runif: RunIf) -> Result<Task> {
    let plugin = element
        .find("pluginConfiguration")
        .ok_or(ConfigError::MissingPluginId)?;
    let plugin_id = plugin.attribute("id").ok_or(ConfigError::MissingPluginId)?;
    if plugin_id.is_empty() {
        return Err(ConfigError::MissingPluginId);
    }

    let mut properties = Vec::new();
    for property in element.maybe().child("configuration").children("property") {
        let Some(key) = property.maybe().child("key").text() else {
            continue;
        };
        let value = property.maybe().child("value").text().unwrap_or_default();
        properties.push((key, value));
    }

    if plugin_id == SCRIPT_EXECUTOR_PLUGIN_ID {
        let script = properties
            .iter()
            .find(|(key, _)| key == "script")
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ConfigError::MissingProperty("script".to_string()))?;
        return Ok(Task::Script(ScriptTask { script, runif }));
    }

    Ok(Task::Plugin(PluginTask {
        plugin_id,
        version: plugin.attribute("version"),
        properties,
        runif,
    }))
}
