//! Stages: ordered job lists with approval and material-fetch policy.

use gocd_xml::Node;

use crate::error::Result;
use crate::generic::{ElementBound, EnvironmentVariables};
use crate::job::Job;

/// View onto one `<stage>` element.
#[derive(Debug, Clone)]
pub struct Stage {
    element: Node,
}

impl ElementBound for Stage {
    fn element(&self) -> &Node {
        &self.element
    }
}

impl EnvironmentVariables for Stage {}

impl Stage {
    pub(crate) fn new(element: Node) -> Stage {
        Stage { element }
    }

    pub fn name(&self) -> String {
        self.element.attribute("name").unwrap_or_default()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.element
            .maybe()
            .child("jobs")
            .children("job")
            .into_iter()
            .map(Job::new)
            .collect()
    }

    pub fn ensure_job(&self, name: &str) -> Job {
        let element = self
            .element
            .ensure_child("jobs")
            .ensure_child_with_attribute("job", "name", name);
        Job::new(element)
    }

    pub fn clean_working_dir(&self) -> bool {
        self.element.attribute("cleanWorkingDir").as_deref() == Some("true")
    }

    pub fn set_clean_working_dir(&self) -> &Stage {
        self.element.set_attribute("cleanWorkingDir", "true");
        self
    }

    pub fn has_manual_approval(&self) -> bool {
        self.element
            .maybe()
            .child("approval")
            .has_attribute_value("type", "manual")
    }

    /// Mark the stage as manually approved, optionally rewriting the
    /// authorized users and roles nested under the approval.
    pub fn set_has_manual_approval(&self, users: &[&str], roles: &[&str]) -> &Stage {
        let approval = self
            .element
            .ensure_child_with_attribute("approval", "type", "manual");
        if !users.is_empty() || !roles.is_empty() {
            let authorization = approval.ensure_child("authorization");
            authorization.maybe().remove_all_children(None);
            for user in users {
                authorization.append_new_child("user").set_text(user);
            }
            for role in roles {
                authorization.append_new_child("role").set_text(role);
            }
        }
        self
    }

    pub fn authorized_users(&self) -> Vec<String> {
        self.approval_authorization()
            .children("user")
            .iter()
            .filter_map(Node::text)
            .collect()
    }

    pub fn authorized_roles(&self) -> Vec<String> {
        self.approval_authorization()
            .children("role")
            .iter()
            .filter_map(Node::text)
            .collect()
    }

    /// Defaults to true; encoded only when explicitly set false.
    pub fn fetch_materials(&self) -> bool {
        self.element.attribute("fetchMaterials").as_deref() != Some("false")
    }

    pub fn set_fetch_materials(&self, fetch_materials: bool) -> &Stage {
        if fetch_materials {
            self.element.remove_attribute("fetchMaterials");
        } else {
            self.element.set_attribute("fetchMaterials", "false");
        }
        self
    }

    fn approval_authorization(&self) -> gocd_xml::MaybeNode {
        self.element
            .maybe()
            .child("approval")
            .child("authorization")
    }

    pub(crate) fn reorder_for_schema(&self) -> Result<()> {
        for tag in ["environmentvariables", "jobs"] {
            self.element.move_children_to_end(tag);
        }
        for job in self.jobs() {
            job.reorder_for_schema()?;
        }
        Ok(())
    }
}
