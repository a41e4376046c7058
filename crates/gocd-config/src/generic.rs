//! Cross-cutting accessors shared by pipelines, stages and jobs.

use std::collections::{BTreeMap, BTreeSet};

use gocd_xml::Node;

/// A view bound to one element of the configuration tree.
pub trait ElementBound {
    fn element(&self) -> &Node;
}

fn value_tag(encrypted: bool) -> &'static str {
    if encrypted { "encryptedValue" } else { "value" }
}

fn is_secure(variable: &Node) -> bool {
    variable.attribute("secure").as_deref() == Some("true")
}

fn is_encrypted(variable: &Node) -> bool {
    variable.find("encryptedValue").is_some()
}

/// Environment variables, partitioned into three disjoint sets per scope:
/// plain, secure-encrypted, and secure-but-unencrypted. The partition is
/// determined by the `secure` marker and by whether the value child is an
/// `encryptedValue` or a plain `value`.
pub trait EnvironmentVariables: ElementBound {
    fn environment_variables(&self) -> BTreeMap<String, String> {
        read_partition(self.element(), false, false)
    }

    fn encrypted_environment_variables(&self) -> BTreeMap<String, String> {
        read_partition(self.element(), true, true)
    }

    fn unencrypted_secure_environment_variables(&self) -> BTreeMap<String, String> {
        read_partition(self.element(), true, false)
    }

    fn ensure_environment_variables(&self, variables: &BTreeMap<String, String>) -> &Self {
        ensure_partition(self.element(), variables, false, false);
        self
    }

    fn ensure_encrypted_environment_variables(&self, variables: &BTreeMap<String, String>) -> &Self {
        ensure_partition(self.element(), variables, true, true);
        self
    }

    fn ensure_unencrypted_secure_environment_variables(
        &self,
        variables: &BTreeMap<String, String>,
    ) -> &Self {
        ensure_partition(self.element(), variables, true, false);
        self
    }

    fn without_any_environment_variables(&self) -> &Self {
        self.element()
            .maybe()
            .child("environmentvariables")
            .remove_all_children(None);
        self
    }

    /// Remove one plain or encrypted variable by name, rewriting the scope.
    fn remove_environment_variable(&self, name: &str) -> &Self {
        let mut plain = self.environment_variables();
        let encrypted = self.encrypted_environment_variables();
        let secure = self.unencrypted_secure_environment_variables();
        self.without_any_environment_variables();
        plain.remove(name);
        self.ensure_environment_variables(&plain);
        self.ensure_encrypted_environment_variables(&encrypted);
        self.ensure_unencrypted_secure_environment_variables(&secure);
        self
    }
}

fn read_partition(element: &Node, secure: bool, encrypted: bool) -> BTreeMap<String, String> {
    let mut result = BTreeMap::new();
    for variable in element.maybe().child("environmentvariables").children("variable") {
        if is_secure(&variable) != secure || is_encrypted(&variable) != encrypted {
            continue;
        }
        let Some(name) = variable.attribute("name") else {
            continue;
        };
        if let Some(value) = variable.find(value_tag(encrypted)) {
            result.insert(name, value.text().unwrap_or_default());
        }
    }
    result
}

fn ensure_partition(
    element: &Node,
    variables: &BTreeMap<String, String>,
    secure: bool,
    encrypted: bool,
) {
    let scope = element.ensure_child("environmentvariables");
    for (name, value) in variables {
        let variable = scope.ensure_child_with_attribute("variable", "name", name);
        if secure {
            variable.set_attribute("secure", "true");
        } else {
            variable.remove_attribute("secure");
        }
        // A variable re-ensured into another partition must not keep both
        // value forms; names are unique per scope.
        variable.maybe().remove_all_children(Some(value_tag(!encrypted)));
        variable.ensure_child(value_tag(encrypted)).set_text(value);
    }
    sort_variables_by_name(&scope);
}

/// Rewrite the `variable` children sorted by name so serialization order is
/// independent of insertion order.
fn sort_variables_by_name(scope: &Node) {
    let mut variables = scope.children_with_tag("variable");
    variables.sort_by_key(|variable| variable.attribute("name").unwrap_or_default());
    for variable in &variables {
        scope.remove_child(variable);
    }
    for variable in &variables {
        scope.append_child_node(variable);
    }
}

/// An unordered set of resource labels.
pub trait Resources: ElementBound {
    fn resources(&self) -> BTreeSet<String> {
        self.element()
            .maybe()
            .child("resources")
            .children("resource")
            .iter()
            .filter_map(Node::text)
            .collect()
    }

    fn ensure_resource(&self, resource: &str) -> &Self {
        self.element()
            .ensure_child("resources")
            .ensure_child_with_text("resource", resource);
        self
    }
}
