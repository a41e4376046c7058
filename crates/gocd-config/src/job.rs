//! Jobs and their tabs.

use std::collections::BTreeSet;

use gocd_xml::Node;
use serde::{Deserialize, Serialize};

use crate::artifacts::Artifact;
use crate::error::{ConfigError, Result};
use crate::generic::{ElementBound, EnvironmentVariables, Resources};
use crate::tasks::Task;

/// A named tab shown on the job detail page.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tab {
    pub name: String,
    pub path: String,
}

impl Tab {
    pub fn new(name: &str, path: &str) -> Tab {
        Tab {
            name: name.to_string(),
            path: path.to_string(),
        }
    }

    fn decode(element: &Node) -> Option<Tab> {
        Some(Tab {
            name: element.attribute("name")?,
            path: element.attribute("path")?,
        })
    }

    fn append_to(&self, tabs: &Node) {
        let element = tabs.append_new_child("tab");
        element.set_attribute("name", &self.name);
        element.set_attribute("path", &self.path);
    }
}

/// View onto one `<job>` element.
#[derive(Debug, Clone)]
pub struct Job {
    element: Node,
}

impl ElementBound for Job {
    fn element(&self) -> &Node {
        &self.element
    }
}

impl EnvironmentVariables for Job {}
impl Resources for Job {}

impl Job {
    pub(crate) fn new(element: Node) -> Job {
        Job { element }
    }

    pub fn name(&self) -> String {
        self.element.attribute("name").unwrap_or_default()
    }

    // ---- tasks -----------------------------------------------------------

    /// Decode every task, in document order. Any undecodable task is fatal.
    pub fn tasks(&self) -> Result<Vec<Task>> {
        self.element
            .maybe()
            .child("tasks")
            .all_children()
            .iter()
            .map(Task::decode)
            .collect()
    }

    /// Always append, even when an equal task already exists. Used when
    /// duplicate tasks are intentional.
    pub fn add_task(&self, task: &Task) -> &Job {
        task.append_to(&self.element);
        self
    }

    /// Append only when no equal task is already present.
    pub fn ensure_task(&self, task: &Task) -> Result<&Job> {
        if !self.tasks()?.contains(task) {
            task.append_to(&self.element);
        }
        Ok(self)
    }

    pub fn without_any_tasks(&self) -> &Job {
        self.element
            .maybe()
            .child("tasks")
            .remove_all_children(None);
        self
    }

    // ---- artifacts -------------------------------------------------------

    pub fn artifacts(&self) -> Result<BTreeSet<Artifact>> {
        self.element
            .maybe()
            .child("artifacts")
            .all_children()
            .iter()
            .map(Artifact::decode)
            .collect()
    }

    /// Append only the set difference against what is already present.
    pub fn ensure_artifacts(&self, artifacts: &BTreeSet<Artifact>) -> Result<&Job> {
        if artifacts.is_empty() {
            return Ok(self);
        }
        let existing = self.artifacts()?;
        let target = self.element.ensure_child("artifacts");
        for artifact in artifacts.difference(&existing) {
            artifact.append_to(&target);
        }
        Ok(self)
    }

    // ---- tabs ------------------------------------------------------------

    pub fn tabs(&self) -> Vec<Tab> {
        self.element
            .maybe()
            .child("tabs")
            .children("tab")
            .iter()
            .filter_map(Tab::decode)
            .collect()
    }

    pub fn ensure_tab(&self, tab: &Tab) -> &Job {
        let tabs = self.element.ensure_child("tabs");
        if !self.tabs().contains(tab) {
            tab.append_to(&tabs);
        }
        self
    }

    // ---- attributes ------------------------------------------------------

    pub fn has_timeout(&self) -> bool {
        self.element.has_attribute("timeout")
    }

    pub fn timeout(&self) -> Result<String> {
        self.element
            .attribute("timeout")
            .ok_or_else(|| ConfigError::NoTimeout(self.name()))
    }

    pub fn set_timeout(&self, timeout: &str) -> &Job {
        self.element.set_attribute("timeout", timeout);
        self
    }

    pub fn runs_on_all_agents(&self) -> bool {
        self.element.attribute("runOnAllAgents").as_deref() == Some("true")
    }

    pub fn set_runs_on_all_agents(&self, runs_on_all_agents: bool) -> &Job {
        self.element.set_attribute(
            "runOnAllAgents",
            if runs_on_all_agents { "true" } else { "false" },
        );
        self
    }

    pub fn has_elastic_profile_id(&self) -> bool {
        self.element.has_attribute("elasticProfileId")
    }

    pub fn elastic_profile_id(&self) -> Result<String> {
        self.element
            .attribute("elasticProfileId")
            .ok_or_else(|| ConfigError::NoElasticProfileId(self.name()))
    }

    pub fn set_elastic_profile_id(&self, elastic_profile_id: &str) -> &Job {
        self.element
            .set_attribute("elasticProfileId", elastic_profile_id);
        self
    }

    pub fn has_run_instance_count(&self) -> bool {
        self.element.has_attribute("runInstanceCount")
    }

    pub fn run_instance_count(&self) -> Result<String> {
        self.element
            .attribute("runInstanceCount")
            .ok_or_else(|| ConfigError::NoRunInstanceCount(self.name()))
    }

    pub fn set_run_instance_count(&self, count: &str) -> &Job {
        self.element.set_attribute("runInstanceCount", count);
        self
    }

    /// Move children into the order the schema demands, rewriting the
    /// unordered collections (artifacts, resources) in their canonical
    /// sorted order so serialization is independent of insertion order.
    pub(crate) fn reorder_for_schema(&self) -> Result<()> {
        if let Some(element) = self.element.find("artifacts") {
            let artifacts = self.artifacts()?;
            element.maybe().remove_all_children(None);
            for artifact in &artifacts {
                artifact.append_to(&element);
            }
        }
        if let Some(element) = self.element.find("resources") {
            let mut resources = element.children_with_tag("resource");
            resources.sort_by_key(|resource| resource.text().unwrap_or_default());
            for resource in &resources {
                element.remove_child(resource);
            }
            for resource in &resources {
                element.append_child_node(resource);
            }
        }
        for tag in ["environmentvariables", "tasks", "tabs", "resources", "artifacts"] {
            self.element.move_children_to_end(tag);
        }
        Ok(())
    }
}
