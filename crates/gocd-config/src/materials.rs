//! Pipeline materials: git, upstream pipeline and package references.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use gocd_xml::{Doc, Node};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// A source-control reference. Optional fields are omitted from the
/// document entirely when unset so repeated saves do not thrash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitMaterial {
    pub url: String,
    pub branch: Option<String>,
    pub material_name: Option<String>,
    pub polling: bool,
    pub ignore_patterns: BTreeSet<String>,
    pub destination_directory: Option<String>,
    pub shallow_clone: bool,
}

impl GitMaterial {
    pub fn new(url: &str) -> GitMaterial {
        GitMaterial {
            url: url.to_string(),
            branch: None,
            material_name: None,
            polling: true,
            ignore_patterns: BTreeSet::new(),
            destination_directory: None,
            shallow_clone: false,
        }
    }

    #[must_use]
    pub fn with_branch(mut self, branch: &str) -> GitMaterial {
        self.branch = Some(branch.to_string());
        self
    }

    #[must_use]
    pub fn with_material_name(mut self, material_name: &str) -> GitMaterial {
        self.material_name = Some(material_name.to_string());
        self
    }

    #[must_use]
    pub fn with_polling(mut self, polling: bool) -> GitMaterial {
        self.polling = polling;
        self
    }

    #[must_use]
    pub fn with_ignore_patterns<I, S>(mut self, patterns: I) -> GitMaterial
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_destination_directory(mut self, directory: &str) -> GitMaterial {
        self.destination_directory = Some(directory.to_string());
        self
    }

    #[must_use]
    pub fn with_shallow_clone(mut self, shallow: bool) -> GitMaterial {
        self.shallow_clone = shallow;
        self
    }

    /// An absent branch means the default branch.
    pub fn is_on_master(&self) -> bool {
        match self.branch.as_deref() {
            None | Some("master") => true,
            Some(_) => false,
        }
    }

    pub fn branch(&self) -> &str {
        self.branch.as_deref().unwrap_or("master")
    }

    /// True when any optional field deviates from its default.
    pub fn has_options(&self) -> bool {
        self.branch.is_some()
            || self.material_name.is_some()
            || !self.polling
            || !self.ignore_patterns.is_empty()
            || self.destination_directory.is_some()
            || self.shallow_clone
    }
}

/// An upstream-pipeline reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineMaterial {
    pub pipeline_name: String,
    pub stage_name: String,
    pub material_name: Option<String>,
}

impl PipelineMaterial {
    pub fn new(pipeline_name: &str, stage_name: &str) -> PipelineMaterial {
        PipelineMaterial {
            pipeline_name: pipeline_name.to_string(),
            stage_name: stage_name.to_string(),
            material_name: None,
        }
    }

    #[must_use]
    pub fn with_material_name(mut self, material_name: &str) -> PipelineMaterial {
        self.material_name = Some(material_name.to_string());
        self
    }
}

/// An opaque package reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMaterial {
    pub package_ref: String,
}

impl PackageMaterial {
    pub fn new(package_ref: &str) -> PackageMaterial {
        PackageMaterial {
            package_ref: package_ref.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Material {
    Git(GitMaterial),
    Pipeline(PipelineMaterial),
    Package(PackageMaterial),
}

impl Material {
    pub fn is_git(&self) -> bool {
        matches!(self, Material::Git(_))
    }

    pub fn is_package(&self) -> bool {
        matches!(self, Material::Package(_))
    }

    /// Decode dispatches on the element tag; an unknown tag is fatal.
    pub fn decode(element: &Node) -> Result<Material> {
        match element.tag().as_str() {
            "git" => Ok(Material::Git(decode_git(element)?)),
            "pipeline" => Ok(Material::Pipeline(decode_pipeline(element)?)),
            "package" => Ok(Material::Package(decode_package(element)?)),
            other => Err(ConfigError::UnknownMaterial(other.to_string())),
        }
    }

    /// Append this material under the given `materials` element. The
    /// structural inverse of [`Material::decode`].
    pub fn append_to(&self, materials: &Node) {
        match self {
            Material::Git(git) => {
                let element = materials.append_new_child("git");
                element.set_attribute("url", &git.url);
                if let Some(branch) = &git.branch {
                    element.set_attribute("branch", branch);
                }
                if let Some(material_name) = &git.material_name {
                    element.set_attribute("materialName", material_name);
                }
                if !git.polling {
                    element.set_attribute("autoUpdate", "false");
                }
                if let Some(directory) = &git.destination_directory {
                    element.set_attribute("dest", directory);
                }
                if git.shallow_clone {
                    element.set_attribute("shallowClone", "true");
                }
                if !git.ignore_patterns.is_empty() {
                    let filter = element.append_new_child("filter");
                    for pattern in &git.ignore_patterns {
                        filter
                            .append_new_child("ignore")
                            .set_attribute("pattern", pattern);
                    }
                }
            }
            Material::Pipeline(upstream) => {
                let element = materials.append_new_child("pipeline");
                element.set_attribute("pipelineName", &upstream.pipeline_name);
                element.set_attribute("stageName", &upstream.stage_name);
                if let Some(material_name) = &upstream.material_name {
                    element.set_attribute("materialName", material_name);
                }
            }
            Material::Package(package) => {
                let element = materials.append_new_child("package");
                element.set_attribute("ref", &package.package_ref);
            }
        }
    }

    /// Canonical text of this material encoded on a scratch tree. Used for
    /// the thrash-reducing material order, not for correctness.
    pub(crate) fn canonical_text(&self) -> String {
        let scratch = Doc::with_root("materials");
        self.append_to(&scratch.root());
        scratch
            .root()
            .children()
            .first()
            .map(Node::to_xml)
            .unwrap_or_default()
    }
}

/// Order all git materials first (by url), then everything else by its
/// canonical text form. Minimizes byte-level diffs across repeated saves.
pub(crate) fn sort_to_reduce_thrash(materials: &mut [Material]) {
    materials.sort_by(|left, right| match (left, right) {
        (Material::Git(a), Material::Git(b)) => a.url.cmp(&b.url),
        (Material::Git(_), _) => Ordering::Less,
        (_, Material::Git(_)) => Ordering::Greater,
        (a, b) => a.canonical_text().cmp(&b.canonical_text()),
    });
}

fn required_attribute(element: &Node, attribute: &str) -> Result<String> {
    element
        .attribute(attribute)
        .ok_or_else(|| ConfigError::MissingAttribute {
            tag: element.tag(),
            attribute: attribute.to_string(),
        })
}

fn decode_git(element: &Node) -> Result<GitMaterial> {
    let ignore_patterns: BTreeSet<String> = element
        .maybe()
        .child("filter")
        .children("ignore")
        .iter()
        .filter_map(|ignore| ignore.attribute("pattern"))
        .collect();
    Ok(GitMaterial {
        url: required_attribute(element, "url")?,
        branch: element.attribute("branch"),
        material_name: element.attribute("materialName"),
        polling: element.attribute("autoUpdate").as_deref() != Some("false"),
        ignore_patterns,
        destination_directory: element.attribute("dest"),
        shallow_clone: element.attribute("shallowClone").as_deref() == Some("true"),
    })
}

fn decode_pipeline(element: &Node) -> Result<PipelineMaterial> {
    Ok(PipelineMaterial {
        pipeline_name: required_attribute(element, "pipelineName")?,
        stage_name: required_attribute(element, "stageName")?,
        material_name: element.attribute("materialName"),
    })
}

fn decode_package(element: &Node) -> Result<PackageMaterial> {
    Ok(PackageMaterial {
        package_ref: required_attribute(element, "ref")?,
    })
}
