//! Job-level collections and attributes.

use std::collections::BTreeSet;

use gocd_config::fake::empty_config;
use gocd_config::{
    Artifact, ConfigError, EnvironmentVariables, GoCdConfigurator, Job, Resources, Tab,
};

fn configurator() -> GoCdConfigurator {
    GoCdConfigurator::new(Box::new(empty_config())).expect("load empty config")
}

fn job(configurator: &GoCdConfigurator) -> Job {
    configurator
        .ensure_pipeline_group("group")
        .ensure_pipeline("line")
        .ensure_stage("build")
        .unwrap()
        .ensure_job("compile")
}

#[test]
fn ensure_job_is_idempotent() {
    let configurator = configurator();
    let stage = configurator
        .ensure_pipeline_group("g")
        .ensure_pipeline("p")
        .ensure_stage("s")
        .unwrap();
    stage.ensure_job("j");
    stage.ensure_job("j");
    stage.ensure_job("other");
    let names: Vec<String> = stage.jobs().iter().map(Job::name).collect();
    assert_eq!(names, ["j", "other"]);
}

#[test]
fn ensure_artifacts_appends_only_the_set_difference() {
    let configurator = configurator();
    let job = job(&configurator);
    let first: BTreeSet<Artifact> = [
        Artifact::build("target/universal/myapp*.zip"),
        Artifact::test("reports"),
    ]
    .into_iter()
    .collect();
    job.ensure_artifacts(&first).unwrap();
    let second: BTreeSet<Artifact> = [
        Artifact::build("target/universal/myapp*.zip"),
        Artifact::build_with_dest("scripts/*", "script-dir"),
    ]
    .into_iter()
    .collect();
    job.ensure_artifacts(&second).unwrap();
    let expected: BTreeSet<Artifact> = first.union(&second).cloned().collect();
    assert_eq!(job.artifacts().unwrap(), expected);
}

#[test]
fn external_artifacts_round_trip() {
    let configurator = configurator();
    let job = job(&configurator);
    let artifacts: BTreeSet<Artifact> = [Artifact::external("docker-image", "dockerhub")]
        .into_iter()
        .collect();
    job.ensure_artifacts(&artifacts).unwrap();
    assert_eq!(job.artifacts().unwrap(), artifacts);
}

#[test]
fn ensure_tab_appends_only_when_absent() {
    let configurator = configurator();
    let job = job(&configurator);
    job.ensure_tab(&Tab::new("Time_Taken", "artifacts/test-run-times.html"));
    job.ensure_tab(&Tab::new("Time_Taken", "artifacts/test-run-times.html"));
    job.ensure_tab(&Tab::new("Coverage", "coverage/index.html"));
    assert_eq!(
        job.tabs(),
        vec![
            Tab::new("Time_Taken", "artifacts/test-run-times.html"),
            Tab::new("Coverage", "coverage/index.html"),
        ]
    );
}

#[test]
fn ensure_resource_is_idempotent() {
    let configurator = configurator();
    let job = job(&configurator);
    job.ensure_resource("a-resource");
    job.ensure_resource("a-resource");
    job.ensure_resource("b-resource");
    let expected: BTreeSet<String> = ["a-resource".to_string(), "b-resource".to_string()]
        .into_iter()
        .collect();
    assert_eq!(job.resources(), expected);
}

#[test]
fn timeout_is_fatal_when_unset() {
    let configurator = configurator();
    let job = job(&configurator);
    assert!(!job.has_timeout());
    assert!(matches!(job.timeout(), Err(ConfigError::NoTimeout(_))));
    job.set_timeout("42");
    assert_eq!(job.timeout().unwrap(), "42");
}

#[test]
fn elastic_profile_and_run_instance_count() {
    let configurator = configurator();
    let job = job(&configurator);
    assert!(matches!(
        job.elastic_profile_id(),
        Err(ConfigError::NoElasticProfileId(_))
    ));
    job.set_elastic_profile_id("docker.unit-test");
    assert_eq!(job.elastic_profile_id().unwrap(), "docker.unit-test");

    assert!(matches!(
        job.run_instance_count(),
        Err(ConfigError::NoRunInstanceCount(_))
    ));
    job.set_run_instance_count("2");
    assert_eq!(job.run_instance_count().unwrap(), "2");
}

#[test]
fn runs_on_all_agents_defaults_to_false() {
    let configurator = configurator();
    let job = job(&configurator);
    assert!(!job.runs_on_all_agents());
    job.set_runs_on_all_agents(true);
    assert!(job.runs_on_all_agents());
}

#[test]
fn job_environment_variables_partition_by_security() {
    let configurator = configurator();
    let job = job(&configurator);
    job.ensure_environment_variables(&[("JAVA_HOME".to_string(), "/opt/java".to_string())].into());
    job.ensure_encrypted_environment_variables(
        &[("SECRET".to_string(), "lkj3lkdfj".to_string())].into(),
    );
    job.ensure_unencrypted_secure_environment_variables(
        &[("TOKEN".to_string(), "plain-but-secure".to_string())].into(),
    );

    assert_eq!(
        job.environment_variables().get("JAVA_HOME").map(String::as_str),
        Some("/opt/java")
    );
    assert_eq!(
        job.encrypted_environment_variables().get("SECRET").map(String::as_str),
        Some("lkj3lkdfj")
    );
    assert_eq!(
        job.unencrypted_secure_environment_variables()
            .get("TOKEN")
            .map(String::as_str),
        Some("plain-but-secure")
    );
    assert!(job.environment_variables().get("SECRET").is_none());
}
