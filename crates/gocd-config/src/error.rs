use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Xml(#[from] gocd_xml::XmlError),
    #[error("don't know of material matching <{0}>")]
    UnknownMaterial(String),
    #[error("don't know task type <{0}>")]
    UnknownTask(String),
    #[error("plugin task is missing a plugin id")]
    MissingPluginId,
    #[error("plugin task is missing the \"{0}\" property")]
    MissingProperty(String),
    #[error("don't know of artifact matching <{0}>")]
    UnknownArtifact(String),
    #[error("unknown artifact type \"{0}\"")]
    UnknownArtifactType(String),
    #[error("cannot create task with runif \"{0}\" - it must be one of passed, failed, any")]
    InvalidRunIf(String),
    #[error("don't know what multiple runif values ({0}) mean")]
    AmbiguousRunIf(String),
    #[error("expected srcfile or srcdir on <fetchartifact>")]
    MissingFetchSource,
    #[error("missing required attribute \"{attribute}\" on <{tag}>")]
    MissingAttribute { tag: String, attribute: String },
    #[error("pipeline \"{0}\" has no git material")]
    NoGitMaterial(String),
    #[error("pipeline \"{0}\" has more than one git material")]
    MultipleGitMaterials(String),
    #[error("pipeline \"{0}\" has no package material")]
    NoPackageMaterial(String),
    #[error("pipeline \"{0}\" has more than one package material")]
    MultiplePackageMaterials(String),
    #[error(
        "cannot replace the git material of pipeline \"{0}\" while it has multiple git materials; use ensure_material instead"
    )]
    CannotReplaceGitMaterial(String),
    #[error(
        "cannot replace the package material of pipeline \"{0}\" while it has multiple package materials; use ensure_material instead"
    )]
    CannotReplacePackageMaterial(String),
    #[error("pipeline \"{0}\" has no label template")]
    NoLabelTemplate(String),
    #[error("pipeline \"{0}\" has no timer")]
    NoTimer(String),
    #[error("job \"{0}\" has no timeout")]
    NoTimeout(String),
    #[error("job \"{0}\" has no elastic profile id")]
    NoElasticProfileId(String),
    #[error("job \"{0}\" has no run instance count")]
    NoRunInstanceCount(String),
    #[error("cannot find pipeline \"{0}\"")]
    PipelineNotFound(String),
    #[error("cannot find template \"{0}\"")]
    TemplateNotFound(String),
    #[error("pipeline \"{0}\" already has inline stages; it cannot reference a template")]
    TemplateAfterStages(String),
    #[error("pipeline \"{0}\" references a template; ensure stages on the template instead")]
    StagesAfterTemplate(String),
    #[error("export call {0} has no valid receiver at this point in the sequence")]
    BadExportCall(String),
    #[error("transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
