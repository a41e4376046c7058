//! Build outputs published by a job.

use gocd_xml::Node;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// A published artifact. `Build` and `Test` carry a source path and an
/// optional destination; `External` is identified by id and store
/// reference.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    Build { src: String, dest: Option<String> },
    Test { src: String, dest: Option<String> },
    External { id: String, store_id: String },
}

impl Artifact {
    pub fn build(src: &str) -> Artifact {
        Artifact::Build {
            src: src.to_string(),
            dest: None,
        }
    }

    pub fn build_with_dest(src: &str, dest: &str) -> Artifact {
        Artifact::Build {
            src: src.to_string(),
            dest: Some(dest.to_string()),
        }
    }

    pub fn test(src: &str) -> Artifact {
        Artifact::Test {
            src: src.to_string(),
            dest: None,
        }
    }

    pub fn test_with_dest(src: &str, dest: &str) -> Artifact {
        Artifact::Test {
            src: src.to_string(),
            dest: Some(dest.to_string()),
        }
    }

    pub fn external(id: &str, store_id: &str) -> Artifact {
        Artifact::External {
            id: id.to_string(),
            store_id: store_id.to_string(),
        }
    }

    /// Decode from an artifact element. The `type` attribute dispatches;
    /// when absent, the legacy tag forms (`<artifact>` for build, `<test>`
    /// for test) are accepted.
    pub fn decode(element: &Node) -> Result<Artifact> {
        let kind = match element.attribute("type") {
            Some(kind) => kind,
            None => match element.tag().as_str() {
                "artifact" => "build".to_string(),
                "test" => "test".to_string(),
                other => return Err(ConfigError::UnknownArtifact(other.to_string())),
            },
        };
        match kind.as_str() {
            "build" => Ok(Artifact::Build {
                src: required(element, "src")?,
                dest: element.attribute("dest"),
            }),
            "test" => Ok(Artifact::Test {
                src: required(element, "src")?,
                dest: element.attribute("dest"),
            }),
            "external" => Ok(Artifact::External {
                id: required(element, "id")?,
                store_id: required(element, "storeId")?,
            }),
            other => Err(ConfigError::UnknownArtifactType(other.to_string())),
        }
    }

    /// Append this artifact under the job's `artifacts` element. The
    /// structural inverse of [`Artifact::decode`]; an unset destination is
    /// omitted entirely.
    pub fn append_to(&self, artifacts: &Node) {
        let element = artifacts.append_new_child("artifact");
        match self {
            Artifact::Build { src, dest } => {
                element.set_attribute("src", src);
                if let Some(dest) = dest {
                    element.set_attribute("dest", dest);
                }
                element.set_attribute("type", "build");
            }
            Artifact::Test { src, dest } => {
                element.set_attribute("src", src);
                if let Some(dest) = dest {
                    element.set_attribute("dest", dest);
                }
                element.set_attribute("type", "test");
            }
            Artifact::External { id, store_id } => {
                element.set_attribute("id", id);
                element.set_attribute("storeId", store_id);
                element.set_attribute("type", "external");
            }
        }
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
