//! Group-level authorization: who may view, operate and administer.

use gocd_xml::Node;

/// View onto an `<authorization>` element.
#[derive(Debug, Clone)]
pub struct Authorization {
    element: Node,
}

impl Authorization {
    pub(crate) fn new(element: Node) -> Authorization {
        Authorization { element }
    }

    pub fn view(&self) -> Option<AuthorizedActors> {
        self.element.find("view").map(AuthorizedActors::new)
    }

    pub fn operate(&self) -> Option<AuthorizedActors> {
        self.element.find("operate").map(AuthorizedActors::new)
    }

    pub fn admins(&self) -> Option<AuthorizedActors> {
        self.element.find("admins").map(AuthorizedActors::new)
    }

    pub fn ensure_view(&self) -> AuthorizedActors {
        AuthorizedActors::new(self.element.ensure_child("view"))
    }

    pub fn ensure_operate(&self) -> AuthorizedActors {
        AuthorizedActors::new(self.element.ensure_child("operate"))
    }

    pub fn ensure_admins(&self) -> AuthorizedActors {
        AuthorizedActors::new(self.element.ensure_child("admins"))
    }

    pub fn make_empty(&self) -> &Authorization {
        self.element.maybe().remove_all_children(None);
        self
    }
}

/// The users and roles granted one kind of access.
#[derive(Debug, Clone)]
pub struct AuthorizedActors {
    element: Node,
}

impl AuthorizedActors {
    fn new(element: Node) -> AuthorizedActors {
        AuthorizedActors { element }
    }

    pub fn users(&self) -> Vec<String> {
        self.element
            .children_with_tag("user")
            .iter()
            .filter_map(Node::text)
            .collect()
    }

    pub fn roles(&self) -> Vec<String> {
        self.element
            .children_with_tag("role")
            .iter()
            .filter_map(Node::text)
            .collect()
    }

    pub fn add_user(&self, username: &str) -> &AuthorizedActors {
        self.element.ensure_child_with_text("user", username);
        self
    }

    pub fn add_role(&self, role: &str) -> &AuthorizedActors {
        self.element.ensure_child_with_text("role", role);
        self
    }
}
