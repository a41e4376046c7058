//! Pipelines and templates.

use std::collections::BTreeMap;

use gocd_xml::Node;

use crate::error::{ConfigError, Result};
use crate::generic::{ElementBound, EnvironmentVariables};
use crate::materials::{self, GitMaterial, Material, PackageMaterial};
use crate::stage::Stage;

/// The one label template the server treats as its default.
pub const DEFAULT_LABEL_TEMPLATE: &str = "0.${COUNT}";

/// Where a pipeline element lives: inside a named group, or under
/// `<templates>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineParent {
    Group(String),
    Templates,
}

/// View onto one `<pipeline>` element (a pipeline proper or a template).
#[derive(Debug, Clone)]
pub struct Pipeline {
    element: Node,
    parent: PipelineParent,
}

impl ElementBound for Pipeline {
    fn element(&self) -> &Node {
        &self.element
    }
}

impl EnvironmentVariables for Pipeline {}

impl Pipeline {
    pub(crate) fn new(element: Node, parent: PipelineParent) -> Pipeline {
        Pipeline { element, parent }
    }

    pub fn name(&self) -> String {
        self.element.attribute("name").unwrap_or_default()
    }

    pub fn parent(&self) -> &PipelineParent {
        &self.parent
    }

    pub fn is_template(&self) -> bool {
        self.parent == PipelineParent::Templates
    }

    // ---- label template --------------------------------------------------

    pub fn has_label_template(&self) -> bool {
        self.element.has_attribute("labeltemplate")
    }

    /// Fatal when unset; use [`Pipeline::has_label_template`] to probe.
    pub fn label_template(&self) -> Result<String> {
        self.element
            .attribute("labeltemplate")
            .ok_or_else(|| ConfigError::NoLabelTemplate(self.name()))
    }

    pub fn set_label_template(&self, label_template: &str) -> &Pipeline {
        self.element.set_attribute("labeltemplate", label_template);
        self
    }

    pub fn set_default_label_template(&self) -> &Pipeline {
        self.set_label_template(DEFAULT_LABEL_TEMPLATE)
    }

    // ---- locking ---------------------------------------------------------

    pub fn has_automatic_pipeline_locking(&self) -> bool {
        self.element.attribute("isLocked").as_deref() == Some("true")
    }

    pub fn set_automatic_pipeline_locking(&self) -> &Pipeline {
        self.element.set_attribute("isLocked", "true");
        self
    }

    /// Newer schema versions replace the boolean flag with a named
    /// behavior; this layer stores whichever the caller sets.
    pub fn lock_behavior(&self) -> Option<String> {
        self.element.attribute("lockBehavior")
    }

    pub fn set_lock_behavior(&self, behavior: &str) -> &Pipeline {
        self.element.set_attribute("lockBehavior", behavior);
        self
    }

    // ---- template reference ----------------------------------------------

    pub fn template_name(&self) -> Option<String> {
        self.element.attribute("template")
    }

    pub fn is_based_on_template(&self) -> bool {
        self.template_name().is_some()
    }

    /// A template reference and inline stages are a rejected combination.
    pub fn set_template_name(&self, template_name: &str) -> Result<&Pipeline> {
        if !self.element.children_with_tag("stage").is_empty() {
            return Err(ConfigError::TemplateAfterStages(self.name()));
        }
        self.element.set_attribute("template", template_name);
        Ok(self)
    }

    // ---- timer -----------------------------------------------------------

    pub fn has_timer(&self) -> bool {
        self.element.find("timer").is_some()
    }

    pub fn timer(&self) -> Result<String> {
        self.element
            .maybe()
            .child("timer")
            .text()
            .ok_or_else(|| ConfigError::NoTimer(self.name()))
    }

    pub fn timer_triggers_only_on_changes(&self) -> bool {
        self.element
            .maybe()
            .child("timer")
            .has_attribute_value("onlyOnChanges", "true")
    }

    pub fn set_timer(&self, timer: &str, only_on_changes: bool) -> &Pipeline {
        let element = self.element.ensure_child("timer");
        if only_on_changes {
            element.set_attribute("onlyOnChanges", "true");
        }
        element.set_text(timer);
        self
    }

    pub fn remove_timer(&self) -> &Pipeline {
        self.element.maybe().remove_all_children(Some("timer"));
        self
    }

    // ---- materials -------------------------------------------------------

    pub fn materials(&self) -> Result<Vec<Material>> {
        self.element
            .maybe()
            .child("materials")
            .all_children()
            .iter()
            .map(Material::decode)
            .collect()
    }

    fn add_material(&self, material: &Material) {
        material.append_to(&self.element.ensure_child("materials"));
    }

    /// No-op when an equal material already exists.
    pub fn ensure_material(&self, material: &Material) -> Result<&Pipeline> {
        if !self.materials()?.contains(material) {
            self.add_material(material);
        }
        Ok(self)
    }

    pub fn git_materials(&self) -> Result<Vec<GitMaterial>> {
        Ok(self
            .materials()?
            .into_iter()
            .filter_map(|material| match material {
                Material::Git(git) => Some(git),
                _ => None,
            })
            .collect())
    }

    pub fn has_single_git_material(&self) -> Result<bool> {
        Ok(self.git_materials()?.len() == 1)
    }

    /// The one git material. Fatal when there are none or several; the
    /// general materials accessor handles those arrangements.
    pub fn git_material(&self) -> Result<GitMaterial> {
        let mut gits = self.git_materials()?;
        match gits.len() {
            0 => Err(ConfigError::NoGitMaterial(self.name())),
            1 => Ok(gits.remove(0)),
            _ => Err(ConfigError::MultipleGitMaterials(self.name())),
        }
    }

    pub fn git_url(&self) -> Result<String> {
        Ok(self.git_material()?.url)
    }

    pub fn git_branch(&self) -> Result<String> {
        Ok(self.git_material()?.branch().to_string())
    }

    pub fn set_git_url(&self, git_url: &str) -> Result<&Pipeline> {
        self.set_git_material(&GitMaterial::new(git_url))
    }

    /// Replace the single git material. Rejected while several exist.
    pub fn set_git_material(&self, material: &GitMaterial) -> Result<&Pipeline> {
        if self.git_materials()?.len() > 1 {
            return Err(ConfigError::CannotReplaceGitMaterial(self.name()));
        }
        self.element
            .maybe()
            .child("materials")
            .remove_all_children(Some("git"));
        self.add_material(&Material::Git(material.clone()));
        Ok(self)
    }

    pub fn package_materials(&self) -> Result<Vec<PackageMaterial>> {
        Ok(self
            .materials()?
            .into_iter()
            .filter_map(|material| match material {
                Material::Package(package) => Some(package),
                _ => None,
            })
            .collect())
    }

    pub fn has_single_package_material(&self) -> Result<bool> {
        Ok(self.package_materials()?.len() == 1)
    }

    pub fn package_material(&self) -> Result<PackageMaterial> {
        let mut packages = self.package_materials()?;
        match packages.len() {
            0 => Err(ConfigError::NoPackageMaterial(self.name())),
            1 => Ok(packages.remove(0)),
            _ => Err(ConfigError::MultiplePackageMaterials(self.name())),
        }
    }

    pub fn set_package_ref(&self, package_ref: &str) -> Result<&Pipeline> {
        self.set_package_material(&PackageMaterial::new(package_ref))
    }

    pub fn set_package_material(&self, material: &PackageMaterial) -> Result<&Pipeline> {
        if self.package_materials()?.len() > 1 {
            return Err(ConfigError::CannotReplacePackageMaterial(self.name()));
        }
        self.element
            .maybe()
            .child("materials")
            .remove_all_children(Some("package"));
        self.add_material(&Material::Package(material.clone()));
        Ok(self)
    }

    fn remove_materials(&self) {
        self.element.maybe().remove_all_children(Some("materials"));
    }

    // ---- parameters ------------------------------------------------------

    pub fn parameters(&self) -> BTreeMap<String, String> {
        let mut result = BTreeMap::new();
        for param in self.element.maybe().child("params").children("param") {
            if let Some(name) = param.attribute("name") {
                result.insert(name, param.text().unwrap_or_default());
            }
        }
        result
    }

    pub fn ensure_parameters(&self, parameters: &BTreeMap<String, String>) -> &Pipeline {
        let params = self.element.ensure_child("params");
        for (name, value) in parameters {
            params
                .ensure_child_with_attribute("param", "name", name)
                .set_text(value);
        }
        self
    }

    pub fn without_any_parameters(&self) -> &Pipeline {
        self.element.maybe().child("params").remove_all_children(None);
        self
    }

    // ---- stages ----------------------------------------------------------

    pub fn stages(&self) -> Vec<Stage> {
        self.element
            .children_with_tag("stage")
            .into_iter()
            .map(Stage::new)
            .collect()
    }

    /// Inline stages on a template-based pipeline are a rejected
    /// combination; ensure stages on the template instead.
    pub fn ensure_stage(&self, name: &str) -> Result<Stage> {
        if self.is_based_on_template() {
            return Err(ConfigError::StagesAfterTemplate(self.name()));
        }
        let element = self
            .element
            .ensure_child_with_attribute("stage", "name", name);
        Ok(Stage::new(element))
    }

    pub fn ensure_removal_of_stage(&self, name: &str) -> &Pipeline {
        for stage in self.stages() {
            if stage.name() == name {
                self.element.remove_child(stage.element());
            }
        }
        self
    }

    /// Ensure the named stage and move every other stage after it.
    pub fn ensure_initial_stage(&self, name: &str) -> Result<Stage> {
        let stage = self.ensure_stage(name)?;
        for element in self.element.children_with_tag("stage") {
            if element.attribute("name").as_deref() != Some(name) {
                self.element.remove_child(&element);
                self.element.append_child_node(&element);
            }
        }
        Ok(stage)
    }

    /// Strip the pipeline back to a bare named element, for replacement
    /// semantics.
    pub fn make_empty(&self) -> &Pipeline {
        self.element.maybe().remove_all_children(None);
        self.element.remove_attribute("labeltemplate");
        self.element.remove_attribute("template");
        self
    }

    /// Rewrite children into the order the schema demands, materials
    /// first reordered to minimize save-to-save churn.
    pub(crate) fn reorder_for_schema(&self) -> Result<()> {
        let mut materials = self.materials()?;
        if !materials.is_empty() {
            materials::sort_to_reduce_thrash(&mut materials);
            self.remove_materials();
            for material in &materials {
                self.add_material(material);
            }
        }
        for tag in ["params", "timer", "environmentvariables", "materials", "stage"] {
            self.element.move_children_to_end(tag);
        }
        for stage in self.stages() {
            stage.reorder_for_schema()?;
        }
        Ok(())
    }
}
