//! The configurator: one server session over one configuration document.

use gocd_xml::Doc;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};
use crate::group::PipelineGroup;
use crate::pipeline::{Pipeline, PipelineParent};

/// Path the configuration document is fetched from.
pub const CONFIG_GET_PATH: &str = "/go/admin/restful/configuration/file/GET/xml";
/// Path the updated document is posted to.
pub const CONFIG_POST_PATH: &str = "/go/admin/restful/configuration/file/POST/xml";
/// Response header carrying the document fingerprint.
pub const FINGERPRINT_HEADER: &str = "x-cruise-config-md5";

/// A fetched configuration document and the fingerprint guarding it.
#[derive(Debug, Clone)]
pub struct FetchedConfig {
    pub body: String,
    pub fingerprint: String,
}

/// Transport seam. The configurator calls it exactly twice per save cycle:
/// once to fetch the document and fingerprint, once to submit the new
/// document guarded by that fingerprint. Retry policy lives behind this
/// trait, not in the core.
pub trait HostClient {
    fn get(&self, path: &str) -> Result<FetchedConfig>;
    fn post(&self, path: &str, form: &[(&str, &str)], headers: &[(&str, &str)]) -> Result<()>;
}

/// A session over one GoCD server's configuration.
pub struct GoCdConfigurator {
    client: Box<dyn HostClient>,
    doc: Doc,
    initial_canonical: String,
    fingerprint: String,
}

impl GoCdConfigurator {
    /// Fetch the current configuration and capture it together with its
    /// fingerprint as the session baseline.
    pub fn new(client: Box<dyn HostClient>) -> Result<GoCdConfigurator> {
        let fetched = client.get(CONFIG_GET_PATH)?;
        let doc = Doc::parse(&fetched.body)?;
        let initial_canonical = doc.to_xml();
        debug!(fingerprint = %fetched.fingerprint, "loaded configuration");
        Ok(GoCdConfigurator {
            client,
            doc,
            initial_canonical,
            fingerprint: fetched.fingerprint,
        })
    }

    // ---- pipeline groups -------------------------------------------------

    pub fn pipeline_groups(&self) -> Vec<PipelineGroup> {
        self.doc
            .root()
            .children_with_tag("pipelines")
            .into_iter()
            .map(PipelineGroup::new)
            .collect()
    }

    pub fn ensure_pipeline_group(&self, group_name: &str) -> PipelineGroup {
        let element = self
            .doc
            .root()
            .ensure_child_with_attribute("pipelines", "group", group_name);
        PipelineGroup::new(element)
    }

    pub fn ensure_removal_of_pipeline_group(&self, group_name: &str) -> &GoCdConfigurator {
        for group in self.pipeline_groups() {
            if group.name() == group_name {
                self.doc.root().remove_child(group.element());
            }
        }
        self
    }

    pub fn remove_all_pipeline_groups(&self) -> &GoCdConfigurator {
        self.doc.root().maybe().remove_all_children(Some("pipelines"));
        self
    }

    /// Every pipeline across every group, in document order.
    pub fn pipelines(&self) -> Vec<Pipeline> {
        self.pipeline_groups()
            .iter()
            .flat_map(PipelineGroup::pipelines)
            .collect()
    }

    /// Fatal when no group holds a pipeline with this name.
    pub fn find_pipeline(&self, name: &str) -> Result<Pipeline> {
        self.pipelines()
            .into_iter()
            .find(|pipeline| pipeline.name() == name)
            .ok_or_else(|| ConfigError::PipelineNotFound(name.to_string()))
    }

    // ---- templates -------------------------------------------------------

    pub fn templates(&self) -> Vec<Pipeline> {
        self.doc
            .root()
            .maybe()
            .child("templates")
            .children("pipeline")
            .into_iter()
            .map(|element| Pipeline::new(element, PipelineParent::Templates))
            .collect()
    }

    pub fn ensure_template(&self, template_name: &str) -> Pipeline {
        let element = self
            .doc
            .root()
            .ensure_child("templates")
            .ensure_child_with_attribute("pipeline", "name", template_name);
        Pipeline::new(element, PipelineParent::Templates)
    }

    pub fn ensure_replacement_of_template(&self, template_name: &str) -> Pipeline {
        let template = self.ensure_template(template_name);
        template.make_empty();
        template
    }

    pub fn ensure_removal_of_template(&self, template_name: &str) -> &GoCdConfigurator {
        if let Some(templates) = self.doc.root().find("templates") {
            for template in self.templates() {
                if template.name() == template_name {
                    templates.remove_child(crate::generic::ElementBound::element(&template));
                }
            }
            if templates.children().is_empty() {
                self.doc.root().remove_child(&templates);
            }
        }
        self
    }

    pub fn find_template(&self, template_name: &str) -> Result<Pipeline> {
        self.templates()
            .into_iter()
            .find(|template| template.name() == template_name)
            .ok_or_else(|| ConfigError::TemplateNotFound(template_name.to_string()))
    }

    // ---- server scope ----------------------------------------------------

    pub fn artifacts_dir(&self) -> Option<String> {
        self.server_attribute("artifactsdir")
    }

    pub fn set_artifacts_dir(&self, artifacts_dir: &str) -> &GoCdConfigurator {
        self.set_server_attribute("artifactsdir", artifacts_dir)
    }

    pub fn site_url(&self) -> Option<String> {
        self.server_attribute("siteUrl")
    }

    pub fn set_site_url(&self, site_url: &str) -> &GoCdConfigurator {
        self.set_server_attribute("siteUrl", site_url)
    }

    pub fn agent_auto_register_key(&self) -> Option<String> {
        self.server_attribute("agentAutoRegisterKey")
    }

    pub fn set_agent_auto_register_key(&self, key: &str) -> &GoCdConfigurator {
        self.set_server_attribute("agentAutoRegisterKey", key)
    }

    fn server_attribute(&self, name: &str) -> Option<String> {
        self.doc.root().maybe().child("server").attribute(name)
    }

    fn set_server_attribute(&self, name: &str, value: &str) -> &GoCdConfigurator {
        self.doc.root().ensure_child("server").set_attribute(name, value);
        self
    }

    // ---- whole-document views --------------------------------------------

    /// Git urls of every pipeline addressed by a single git material.
    pub fn git_urls(&self) -> Result<Vec<String>> {
        let mut urls = Vec::new();
        for pipeline in self.pipelines() {
            if pipeline.has_single_git_material()? {
                urls.push(pipeline.git_url()?);
            }
        }
        Ok(urls)
    }

    /// Rewrite every scope into the child order the schema validator
    /// demands. Runs immediately before serialization and never as a side
    /// effect of a read accessor.
    fn reorder_for_schema(&self) -> Result<()> {
        for tag in ["pipelines", "templates", "environments", "agents"] {
            self.doc.root().move_children_to_end(tag);
        }
        for pipeline in self.pipelines() {
            pipeline.reorder_for_schema()?;
        }
        for template in self.templates() {
            template.reorder_for_schema()?;
        }
        Ok(())
    }

    /// The canonical serialized document, normalized for the schema.
    pub fn config(&self) -> Result<String> {
        self.reorder_for_schema()?;
        Ok(self.doc.to_xml())
    }

    /// Canonical-text comparison against the originally loaded document.
    pub fn has_changes(&self) -> Result<bool> {
        Ok(self.initial_canonical != self.config()?)
    }

    /// Post the updated document guarded by the session fingerprint.
    /// A no-op when nothing changed or when dry-running. Returns whether a
    /// post happened; after a successful post the baseline is refreshed.
    pub fn save_updated_config(&mut self, dry_run: bool) -> Result<bool> {
        let after = self.config()?;
        if dry_run || self.initial_canonical == after {
            info!(dry_run, "configuration unchanged or dry run; not posting");
            return Ok(false);
        }
        self.client.post(
            CONFIG_POST_PATH,
            &[("xmlFile", &after), ("md5", &self.fingerprint)],
            &[("Confirm", "true")],
        )?;
        info!("posted updated configuration");
        let fetched = self.client.get(CONFIG_GET_PATH)?;
        self.doc = Doc::parse(&fetched.body)?;
        self.initial_canonical = self.doc.to_xml();
        self.fingerprint = fetched.fingerprint;
        Ok(true)
    }
}
