//! In-memory transport fake for tests and dry runs.

use std::cell::RefCell;
use std::rc::Rc;

use crate::configurator::{CONFIG_GET_PATH, FetchedConfig, HostClient};
use crate::error::{ConfigError, Result};

/// The document an empty server hands out.
pub const EMPTY_CONFIG_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<cruise xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:noNamespaceSchemaLocation="cruise-config.xsd" schemaVersion="72">
  <server artifactsdir="artifacts" commandRepositoryLocation="default" serverId="96eca4bf-210e-499f-9dc9-0cefdae38d0c" />
</cruise>"#;

/// One recorded post, field by field.
#[derive(Debug, Clone)]
pub struct RecordedPost {
    pub path: String,
    pub body: String,
    pub fingerprint: String,
    pub headers: Vec<(String, String)>,
}

/// A canned transport: serves one configuration document with fingerprint
/// `"42"` and records every post. Clones share the recording, so a test
/// can keep one handle and hand the other to the configurator.
#[derive(Debug, Clone)]
pub struct FakeHostClient {
    config: String,
    posts: Rc<RefCell<Vec<RecordedPost>>>,
}

impl FakeHostClient {
    pub fn new(config: &str) -> FakeHostClient {
        FakeHostClient {
            config: config.to_string(),
            posts: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.borrow().clone()
    }
}

impl HostClient for FakeHostClient {
    fn get(&self, path: &str) -> Result<FetchedConfig> {
        if path == CONFIG_GET_PATH {
            Ok(FetchedConfig {
                body: self.config.clone(),
                fingerprint: "42".to_string(),
            })
        } else {
            Err(ConfigError::Transport(format!(
                "not expecting to be asked for {path}"
            )))
        }
    }

    fn post(&self, path: &str, form: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<()> {
        let field = |name: &str| {
            form.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_string())
                .unwrap_or_default()
        };
        self.posts.borrow_mut().push(RecordedPost {
            path: path.to_string(),
            body: field("xmlFile"),
            fingerprint: field("md5"),
            headers: headers
                .iter()
                .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
                .collect(),
        });
        Ok(())
    }
}

/// A fake serving the empty server document.
pub fn empty_config() -> FakeHostClient {
    FakeHostClient::new(EMPTY_CONFIG_XML)
}
