//! Structural export of a pipeline as a replayable call sequence.
//!
//! The export is a list of [`ExportCall`] values which, applied to a fresh
//! empty configuration, reconstruct a structurally equivalent graph:
//! replaying the calls and renormalizing yields a byte-identical canonical
//! serialization. A call is emitted only when a feature deviates from its
//! default, and unordered collections are emitted sorted so the output is
//! independent of insertion order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifacts::Artifact;
use crate::configurator::GoCdConfigurator;
use crate::error::{ConfigError, Result};
use crate::generic::{EnvironmentVariables, Resources};
use crate::group::PipelineGroup;
use crate::job::{Job, Tab};
use crate::materials::{GitMaterial, Material};
use crate::pipeline::{DEFAULT_LABEL_TEMPLATE, Pipeline, PipelineParent};
use crate::stage::Stage;
use crate::tasks::Task;

/// One reconstruction step. Receiver context is positional: group and
/// pipeline calls set the cursor the later stage/job calls build under,
/// and environment-variable calls address the innermost open scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ExportCall {
    EnsurePipelineGroup { name: String },
    EnsureReplacementOfPipeline { name: String },
    EnsureReplacementOfTemplate { name: String },
    SetTemplateName { name: String },
    SetTimer { spec: String, only_on_changes: bool },
    SetDefaultLabelTemplate,
    SetLabelTemplate { template: String },
    SetAutomaticPipelineLocking,
    SetLockBehavior { behavior: String },
    SetGitUrl { url: String },
    SetGitMaterial { material: GitMaterial },
    EnsureMaterial { material: Material },
    EnsureEnvironmentVariables { variables: BTreeMap<String, String> },
    EnsureEncryptedEnvironmentVariables { variables: BTreeMap<String, String> },
    EnsureUnencryptedSecureEnvironmentVariables { variables: BTreeMap<String, String> },
    EnsureParameters { parameters: BTreeMap<String, String> },
    EnsureStage { name: String },
    SetCleanWorkingDir,
    SetHasManualApproval { users: Vec<String>, roles: Vec<String> },
    SetFetchMaterials { value: bool },
    EnsureJob { name: String },
    EnsureArtifacts { artifacts: Vec<Artifact> },
    EnsureResource { resource: String },
    EnsureTab { tab: Tab },
    SetTimeout { timeout: String },
    SetRunsOnAllAgents,
    SetElasticProfileId { id: String },
    SetRunInstanceCount { count: String },
    AddTask { task: Task },
}

impl fmt::Display for ExportCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = serde_json::to_value(self).map_err(|_| fmt::Error)?;
        let Some(object) = value.as_object() else {
            return Err(fmt::Error);
        };
        let name = object
            .get("call")
            .and_then(|call| call.as_str())
            .ok_or(fmt::Error)?;
        let mut arguments = object.clone();
        arguments.remove("call");
        if arguments.is_empty() {
            write!(f, "{name}()")
        } else {
            let rendered =
                serde_json::to_string(&arguments).map_err(|_| fmt::Error)?;
            write!(f, "{name}({rendered})")
        }
    }
}

/// Render a call sequence one call per line.
pub fn render(calls: &[ExportCall]) -> String {
    calls
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl GoCdConfigurator {
    /// Export the named pipeline (wherever its group) as a call sequence.
    pub fn export_pipeline(&self, name: &str) -> Result<Vec<ExportCall>> {
        let pipeline = self.find_pipeline(name)?;
        export_pipeline(self, &pipeline)
    }
}

/// Export one pipeline, including the template it references.
pub fn export_pipeline(
    configurator: &GoCdConfigurator,
    pipeline: &Pipeline,
) -> Result<Vec<ExportCall>> {
    let mut calls = Vec::new();
    match pipeline.parent() {
        PipelineParent::Group(group) => {
            calls.push(ExportCall::EnsurePipelineGroup {
                name: group.clone(),
            });
            calls.push(ExportCall::EnsureReplacementOfPipeline {
                name: pipeline.name(),
            });
        }
        PipelineParent::Templates => calls.push(ExportCall::EnsureReplacementOfTemplate {
            name: pipeline.name(),
        }),
    }
    export_pipeline_body(configurator, pipeline, &mut calls)?;
    Ok(calls)
}

fn export_pipeline_body(
    configurator: &GoCdConfigurator,
    pipeline: &Pipeline,
    calls: &mut Vec<ExportCall>,
) -> Result<()> {
    if let Some(name) = pipeline.template_name() {
        calls.push(ExportCall::SetTemplateName { name });
    }
    if pipeline.has_timer() {
        calls.push(ExportCall::SetTimer {
            spec: pipeline.timer()?,
            only_on_changes: pipeline.timer_triggers_only_on_changes(),
        });
    }
    if pipeline.has_label_template() {
        let label = pipeline.label_template()?;
        if label == DEFAULT_LABEL_TEMPLATE {
            calls.push(ExportCall::SetDefaultLabelTemplate);
        } else {
            calls.push(ExportCall::SetLabelTemplate { template: label });
        }
    }
    if pipeline.has_automatic_pipeline_locking() {
        calls.push(ExportCall::SetAutomaticPipelineLocking);
    }
    if let Some(behavior) = pipeline.lock_behavior() {
        calls.push(ExportCall::SetLockBehavior { behavior });
    }

    let single_git = pipeline.has_single_git_material()?;
    if single_git {
        let git = pipeline.git_material()?;
        if git.has_options() {
            calls.push(ExportCall::SetGitMaterial { material: git });
        } else {
            calls.push(ExportCall::SetGitUrl { url: git.url });
        }
    }
    for material in pipeline.materials()? {
        if single_git && material.is_git() {
            continue;
        }
        calls.push(ExportCall::EnsureMaterial { material });
    }

    export_environment(pipeline, calls);

    let parameters = pipeline.parameters();
    if !parameters.is_empty() {
        calls.push(ExportCall::EnsureParameters { parameters });
    }

    if let Some(name) = pipeline.template_name() {
        let template = configurator.find_template(&name)?;
        calls.push(ExportCall::EnsureReplacementOfTemplate {
            name: template.name(),
        });
        export_pipeline_body(configurator, &template, calls)?;
    }

    for stage in pipeline.stages() {
        export_stage(&stage, calls)?;
    }
    Ok(())
}

fn export_stage(stage: &Stage, calls: &mut Vec<ExportCall>) -> Result<()> {
    calls.push(ExportCall::EnsureStage { name: stage.name() });
    export_environment(stage, calls);
    if stage.clean_working_dir() {
        calls.push(ExportCall::SetCleanWorkingDir);
    }
    if stage.has_manual_approval() {
        calls.push(ExportCall::SetHasManualApproval {
            users: stage.authorized_users(),
            roles: stage.authorized_roles(),
        });
    }
    if !stage.fetch_materials() {
        calls.push(ExportCall::SetFetchMaterials { value: false });
    }
    for job in stage.jobs() {
        export_job(&job, calls)?;
    }
    Ok(())
}

fn export_job(job: &Job, calls: &mut Vec<ExportCall>) -> Result<()> {
    calls.push(ExportCall::EnsureJob { name: job.name() });
    let artifacts = job.artifacts()?;
    if !artifacts.is_empty() {
        calls.push(ExportCall::EnsureArtifacts {
            artifacts: artifacts.into_iter().collect(),
        });
    }
    export_environment(job, calls);
    for resource in job.resources() {
        calls.push(ExportCall::EnsureResource { resource });
    }
    for tab in job.tabs() {
        calls.push(ExportCall::EnsureTab { tab });
    }
    if job.has_timeout() {
        calls.push(ExportCall::SetTimeout {
            timeout: job.timeout()?,
        });
    }
    if job.runs_on_all_agents() {
        calls.push(ExportCall::SetRunsOnAllAgents);
    }
    if job.has_elastic_profile_id() {
        calls.push(ExportCall::SetElasticProfileId {
            id: job.elastic_profile_id()?,
        });
    }
    if job.has_run_instance_count() {
        calls.push(ExportCall::SetRunInstanceCount {
            count: job.run_instance_count()?,
        });
    }
    // tasks are added, not ensured: a job legitimately repeats equal tasks
    for task in job.tasks()? {
        calls.push(ExportCall::AddTask { task });
    }
    Ok(())
}

fn export_environment<T: EnvironmentVariables>(scope: &T, calls: &mut Vec<ExportCall>) {
    let plain = scope.environment_variables();
    if !plain.is_empty() {
        calls.push(ExportCall::EnsureEnvironmentVariables { variables: plain });
    }
    let encrypted = scope.encrypted_environment_variables();
    if !encrypted.is_empty() {
        calls.push(ExportCall::EnsureEncryptedEnvironmentVariables {
            variables: encrypted,
        });
    }
    let secure = scope.unencrypted_secure_environment_variables();
    if !secure.is_empty() {
        calls.push(ExportCall::EnsureUnencryptedSecureEnvironmentVariables {
            variables: secure,
        });
    }
}

#[derive(Default)]
struct Cursor {
    group: Option<PipelineGroup>,
    pipeline: Option<Pipeline>,
    stage: Option<Stage>,
    job: Option<Job>,
}

impl Cursor {
    fn pipeline(&self, call: &ExportCall) -> Result<&Pipeline> {
        self.pipeline
            .as_ref()
            .ok_or_else(|| ConfigError::BadExportCall(call.to_string()))
    }

    fn stage(&self, call: &ExportCall) -> Result<&Stage> {
        self.stage
            .as_ref()
            .ok_or_else(|| ConfigError::BadExportCall(call.to_string()))
    }

    fn job(&self, call: &ExportCall) -> Result<&Job> {
        self.job
            .as_ref()
            .ok_or_else(|| ConfigError::BadExportCall(call.to_string()))
    }
}

enum Partition {
    Plain,
    Encrypted,
    UnencryptedSecure,
}

fn ensure_environment(
    cursor: &Cursor,
    call: &ExportCall,
    partition: &Partition,
    variables: &BTreeMap<String, String>,
) -> Result<()> {
    fn dispatch<T: EnvironmentVariables>(
        scope: &T,
        partition: &Partition,
        variables: &BTreeMap<String, String>,
    ) {
        match partition {
            Partition::Plain => scope.ensure_environment_variables(variables),
            Partition::Encrypted => scope.ensure_encrypted_environment_variables(variables),
            Partition::UnencryptedSecure => {
                scope.ensure_unencrypted_secure_environment_variables(variables)
            }
        };
    }

    if let Some(job) = &cursor.job {
        dispatch(job, partition, variables);
    } else if let Some(stage) = &cursor.stage {
        dispatch(stage, partition, variables);
    } else if let Some(pipeline) = &cursor.pipeline {
        dispatch(pipeline, partition, variables);
    } else {
        return Err(ConfigError::BadExportCall(call.to_string()));
    }
    Ok(())
}

/// Replay a call sequence against a configurator.
pub fn apply(calls: &[ExportCall], configurator: &GoCdConfigurator) -> Result<()> {
    let mut cursor = Cursor::default();
    for call in calls {
        match call {
            ExportCall::EnsurePipelineGroup { name } => {
                cursor.group = Some(configurator.ensure_pipeline_group(name));
            }
            ExportCall::EnsureReplacementOfPipeline { name } => {
                let group = cursor
                    .group
                    .as_ref()
                    .ok_or_else(|| ConfigError::BadExportCall(call.to_string()))?;
                cursor.pipeline = Some(group.ensure_replacement_of_pipeline(name));
                cursor.stage = None;
                cursor.job = None;
            }
            ExportCall::EnsureReplacementOfTemplate { name } => {
                cursor.pipeline = Some(configurator.ensure_replacement_of_template(name));
                cursor.stage = None;
                cursor.job = None;
            }
            ExportCall::SetTemplateName { name } => {
                cursor.pipeline(call)?.set_template_name(name)?;
            }
            ExportCall::SetTimer {
                spec,
                only_on_changes,
            } => {
                cursor.pipeline(call)?.set_timer(spec, *only_on_changes);
            }
            ExportCall::SetDefaultLabelTemplate => {
                cursor.pipeline(call)?.set_default_label_template();
            }
            ExportCall::SetLabelTemplate { template } => {
                cursor.pipeline(call)?.set_label_template(template);
            }
            ExportCall::SetAutomaticPipelineLocking => {
                cursor.pipeline(call)?.set_automatic_pipeline_locking();
            }
            ExportCall::SetLockBehavior { behavior } => {
                cursor.pipeline(call)?.set_lock_behavior(behavior);
            }
            ExportCall::SetGitUrl { url } => {
                cursor.pipeline(call)?.set_git_url(url)?;
            }
            ExportCall::SetGitMaterial { material } => {
                cursor.pipeline(call)?.set_git_material(material)?;
            }
            ExportCall::EnsureMaterial { material } => {
                cursor.pipeline(call)?.ensure_material(material)?;
            }
            ExportCall::EnsureEnvironmentVariables { variables } => {
                ensure_environment(&cursor, call, &Partition::Plain, variables)?;
            }
            ExportCall::EnsureEncryptedEnvironmentVariables { variables } => {
                ensure_environment(&cursor, call, &Partition::Encrypted, variables)?;
            }
            ExportCall::EnsureUnencryptedSecureEnvironmentVariables { variables } => {
                ensure_environment(&cursor, call, &Partition::UnencryptedSecure, variables)?;
            }
            ExportCall::EnsureParameters { parameters } => {
                cursor.pipeline(call)?.ensure_parameters(parameters);
            }
            ExportCall::EnsureStage { name } => {
                cursor.stage = Some(cursor.pipeline(call)?.ensure_stage(name)?);
                cursor.job = None;
            }
            ExportCall::SetCleanWorkingDir => {
                cursor.stage(call)?.set_clean_working_dir();
            }
            ExportCall::SetHasManualApproval { users, roles } => {
                let users: Vec<&str> = users.iter().map(String::as_str).collect();
                let roles: Vec<&str> = roles.iter().map(String::as_str).collect();
                cursor.stage(call)?.set_has_manual_approval(&users, &roles);
            }
            ExportCall::SetFetchMaterials { value } => {
                cursor.stage(call)?.set_fetch_materials(*value);
            }
            ExportCall::EnsureJob { name } => {
                cursor.job = Some(cursor.stage(call)?.ensure_job(name));
            }
            ExportCall::EnsureArtifacts { artifacts } => {
                cursor
                    .job(call)?
                    .ensure_artifacts(&artifacts.iter().cloned().collect())?;
            }
            ExportCall::EnsureResource { resource } => {
                cursor.job(call)?.ensure_resource(resource);
            }
            ExportCall::EnsureTab { tab } => {
                cursor.job(call)?.ensure_tab(tab);
            }
            ExportCall::SetTimeout { timeout } => {
                cursor.job(call)?.set_timeout(timeout);
            }
            ExportCall::SetRunsOnAllAgents => {
                cursor.job(call)?.set_runs_on_all_agents(true);
            }
            ExportCall::SetElasticProfileId { id } => {
                cursor.job(call)?.set_elastic_profile_id(id);
            }
            ExportCall::SetRunInstanceCount { count } => {
                cursor.job(call)?.set_run_instance_count(count);
            }
            ExportCall::AddTask { task } => {
                cursor.job(call)?.add_task(task);
            }
        }
    }
    Ok(())
}
