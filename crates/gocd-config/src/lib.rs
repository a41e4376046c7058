//! Configuration model and tree-synchronization engine for GoCD.
//!
//! Entities are views onto one shared document tree: aggregates
//! (configurator, pipeline group, pipeline, stage, job) are node-bound,
//! while materials, tasks, artifacts and tabs are values with symmetric
//! decode/encode. Construction is idempotent throughout: every `ensure_*`
//! operation finds its child by natural key or creates it.

pub mod artifacts;
pub mod authorization;
pub mod configurator;
pub mod error;
pub mod export;
pub mod fake;
pub mod generic;
pub mod group;
pub mod job;
pub mod materials;
pub mod pipeline;
pub mod stage;
pub mod tasks;

pub use artifacts::Artifact;
pub use authorization::{Authorization, AuthorizedActors};
pub use configurator::{
    CONFIG_GET_PATH, CONFIG_POST_PATH, FINGERPRINT_HEADER, FetchedConfig, GoCdConfigurator,
    HostClient,
};
pub use error::{ConfigError, Result};
pub use export::ExportCall;
pub use generic::{ElementBound, EnvironmentVariables, Resources};
pub use group::PipelineGroup;
pub use job::{Job, Tab};
pub use materials::{GitMaterial, Material, PackageMaterial, PipelineMaterial};
pub use pipeline::{DEFAULT_LABEL_TEMPLATE, Pipeline, PipelineParent};
pub use stage::Stage;
pub use tasks::{
    ExecTask, FetchArtifactSource, FetchArtifactTask, PluginTask, RakeTask, RunIf, ScriptTask, Task,
};
