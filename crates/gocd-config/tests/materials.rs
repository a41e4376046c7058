//! Material decode/encode and the single-git conveniences.

use gocd_config::fake::empty_config;
use gocd_config::{
    ConfigError, GitMaterial, GoCdConfigurator, Material, PackageMaterial, Pipeline,
    PipelineMaterial,
};
use gocd_xml::Doc;

fn configurator() -> GoCdConfigurator {
    GoCdConfigurator::new(Box::new(empty_config())).expect("load empty config")
}

fn pipeline(configurator: &GoCdConfigurator) -> Pipeline {
    configurator
        .ensure_pipeline_group("group")
        .ensure_pipeline("line")
}

fn round_trip(material: &Material) -> Material {
    let doc = Doc::with_root("materials");
    material.append_to(&doc.root());
    let encoded = doc.root().children();
    assert_eq!(encoded.len(), 1);
    Material::decode(&encoded[0]).expect("decode what we encoded")
}

#[test]
fn git_url_on_empty_pipeline_defaults_to_master() {
    let configurator = configurator();
    configurator
        .ensure_pipeline_group("g")
        .ensure_pipeline("p")
        .set_git_url("giturl")
        .unwrap();
    let pipeline = configurator.find_pipeline("p").unwrap();
    assert_eq!(pipeline.git_url().unwrap(), "giturl");
    assert_eq!(pipeline.git_material().unwrap().branch(), "master");
}

#[test]
fn plain_git_material_round_trips() {
    let material = Material::Git(GitMaterial::new("git@bitbucket.org:acme/service.git"));
    assert_eq!(round_trip(&material), material);
}

#[test]
fn fully_optioned_git_material_round_trips() {
    let material = Material::Git(
        GitMaterial::new("git@bitbucket.org:acme/service.git")
            .with_branch("a-branch")
            .with_material_name("some-material-name")
            .with_polling(false)
            .with_ignore_patterns(["excluded", "*.txt"])
            .with_destination_directory("foo/bar")
            .with_shallow_clone(true),
    );
    assert_eq!(round_trip(&material), material);
}

#[test]
fn unset_optional_git_fields_are_omitted_from_the_document() {
    let doc = Doc::with_root("materials");
    Material::Git(GitMaterial::new("giturl")).append_to(&doc.root());
    let git = &doc.root().children()[0];
    assert_eq!(git.attribute("url").as_deref(), Some("giturl"));
    for absent in ["branch", "materialName", "autoUpdate", "dest", "shallowClone"] {
        assert!(git.attribute(absent).is_none(), "{absent} should be absent");
    }
    assert!(git.children().is_empty());
}

#[test]
fn pipeline_material_round_trips() {
    let bare = Material::Pipeline(PipelineMaterial::new("upstream", "ut"));
    assert_eq!(round_trip(&bare), bare);
    let named = Material::Pipeline(PipelineMaterial::new("upstream", "ut").with_material_name("m"));
    assert_eq!(round_trip(&named), named);
}

#[test]
fn package_material_round_trips() {
    let material = Material::Package(PackageMaterial::new("eca7f187-73c2-4f62-971a-d15233937256"));
    assert_eq!(round_trip(&material), material);
}

#[test]
fn unknown_material_tag_is_a_fatal_decode_error() {
    let doc = Doc::parse("<materials><svn url=\"svnurl\" /></materials>").unwrap();
    let error = Material::decode(&doc.root().children()[0]).unwrap_err();
    assert!(matches!(error, ConfigError::UnknownMaterial(tag) if tag == "svn"));
}

#[test]
fn git_material_without_url_is_a_fatal_decode_error() {
    let doc = Doc::parse("<materials><git branch=\"b\" /></materials>").unwrap();
    assert!(Material::decode(&doc.root().children()[0]).is_err());
}

#[test]
fn ensure_material_is_idempotent() {
    let configurator = configurator();
    let pipeline = pipeline(&configurator);
    let material = Material::Pipeline(PipelineMaterial::new("upstream", "ut"));
    pipeline.ensure_material(&material).unwrap();
    pipeline.ensure_material(&material).unwrap();
    assert_eq!(pipeline.materials().unwrap(), vec![material]);
}

#[test]
fn ensure_material_keeps_unequal_materials() {
    let configurator = configurator();
    let pipeline = pipeline(&configurator);
    pipeline
        .ensure_material(&Material::Git(GitMaterial::new("one.git")))
        .unwrap();
    pipeline
        .ensure_material(&Material::Git(GitMaterial::new("two.git")))
        .unwrap();
    assert_eq!(pipeline.materials().unwrap().len(), 2);
}

#[test]
fn single_git_conveniences_reject_multiple_gits() {
    let configurator = configurator();
    let pipeline = pipeline(&configurator);
    pipeline
        .ensure_material(&Material::Git(GitMaterial::new("one.git")))
        .unwrap();
    pipeline
        .ensure_material(&Material::Git(GitMaterial::new("two.git")))
        .unwrap();
    assert!(!pipeline.has_single_git_material().unwrap());
    assert!(matches!(
        pipeline.git_material(),
        Err(ConfigError::MultipleGitMaterials(_))
    ));
    assert!(matches!(
        pipeline.set_git_url("three.git"),
        Err(ConfigError::CannotReplaceGitMaterial(_))
    ));
}

#[test]
fn set_git_material_replaces_the_existing_git() {
    let configurator = configurator();
    let pipeline = pipeline(&configurator);
    pipeline.set_git_url("original.git").unwrap();
    pipeline.set_git_url("changed.git").unwrap();
    assert_eq!(pipeline.git_url().unwrap(), "changed.git");
    assert_eq!(pipeline.materials().unwrap().len(), 1);
}

#[test]
fn git_material_is_fatal_when_there_is_none() {
    let configurator = configurator();
    let pipeline = pipeline(&configurator);
    assert!(matches!(
        pipeline.git_material(),
        Err(ConfigError::NoGitMaterial(_))
    ));
}

#[test]
fn set_package_ref_replaces_the_existing_package() {
    let configurator = configurator();
    let pipeline = pipeline(&configurator);
    pipeline.set_package_ref("ref-1").unwrap();
    pipeline.set_package_ref("ref-2").unwrap();
    assert_eq!(pipeline.package_material().unwrap().package_ref, "ref-2");
    assert_eq!(pipeline.materials().unwrap().len(), 1);
}

#[test]
fn materials_serialize_git_first_sorted_regardless_of_insertion_order() {
    let build = |first_git: &str, second_git: &str| {
        let configurator = configurator();
        let pipeline = pipeline(&configurator);
        pipeline
            .ensure_material(&Material::Pipeline(PipelineMaterial::new("up", "s")))
            .unwrap();
        pipeline
            .ensure_material(&Material::Git(GitMaterial::new(first_git)))
            .unwrap();
        pipeline
            .ensure_material(&Material::Git(GitMaterial::new(second_git)))
            .unwrap();
        configurator.config().unwrap()
    };
    assert_eq!(build("zebra.git", "art.git"), build("art.git", "zebra.git"));
}
