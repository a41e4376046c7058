//! Pipeline groups.

use gocd_xml::Node;

use crate::authorization::Authorization;
use crate::error::{ConfigError, Result};
use crate::generic::ElementBound;
use crate::pipeline::{Pipeline, PipelineParent};

/// View onto one `<pipelines group="…">` element.
#[derive(Debug, Clone)]
pub struct PipelineGroup {
    element: Node,
}

impl PipelineGroup {
    pub(crate) fn new(element: Node) -> PipelineGroup {
        PipelineGroup { element }
    }

    pub(crate) fn element(&self) -> &Node {
        &self.element
    }

    pub fn name(&self) -> String {
        self.element.attribute("group").unwrap_or_default()
    }

    pub fn pipelines(&self) -> Vec<Pipeline> {
        let parent = PipelineParent::Group(self.name());
        self.element
            .children_with_tag("pipeline")
            .into_iter()
            .map(|element| Pipeline::new(element, parent.clone()))
            .collect()
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipelines().iter().any(|pipeline| pipeline.name() == name)
    }

    /// Fatal when absent; [`PipelineGroup::ensure_pipeline`] is the
    /// tolerant counterpart.
    pub fn find_pipeline(&self, name: &str) -> Result<Pipeline> {
        self.pipelines()
            .into_iter()
            .find(|pipeline| pipeline.name() == name)
            .ok_or_else(|| ConfigError::PipelineNotFound(name.to_string()))
    }

    pub fn ensure_pipeline(&self, name: &str) -> Pipeline {
        let element = self
            .element
            .ensure_child_with_attribute("pipeline", "name", name);
        Pipeline::new(element, PipelineParent::Group(self.name()))
    }

    pub fn ensure_replacement_of_pipeline(&self, name: &str) -> Pipeline {
        let pipeline = self.ensure_pipeline(name);
        pipeline.make_empty();
        pipeline
    }

    pub fn ensure_removal_of_pipeline(&self, name: &str) -> &PipelineGroup {
        for pipeline in self.pipelines() {
            if pipeline.name() == name {
                self.element.remove_child(ElementBound::element(&pipeline));
            }
        }
        self
    }

    pub fn authorization(&self) -> Option<Authorization> {
        self.element.find("authorization").map(Authorization::new)
    }

    pub fn ensure_authorization(&self) -> Authorization {
        Authorization::new(self.element.ensure_child("authorization"))
    }

    pub fn ensure_replacement_of_authorization(&self) -> Authorization {
        let authorization = self.ensure_authorization();
        authorization.make_empty();
        authorization
    }
}
