//! The export round-trip law: replaying an exported call sequence against
//! a fresh empty configuration reproduces the canonical bytes.

use std::collections::BTreeSet;

use gocd_config::export::{apply, render};
use gocd_config::fake::empty_config;
use gocd_config::{
    Artifact, EnvironmentVariables, ExecTask, ExportCall, FetchArtifactSource, FetchArtifactTask,
    GitMaterial, GoCdConfigurator, Material, PipelineMaterial, PluginTask, RakeTask, Resources,
    RunIf, ScriptTask, Tab, Task,
};

fn configurator() -> GoCdConfigurator {
    GoCdConfigurator::new(Box::new(empty_config())).expect("load empty config")
}

fn assert_replay_reproduces(original: &GoCdConfigurator, pipeline_name: &str) {
    let canonical = original.config().unwrap();
    let calls = original.export_pipeline(pipeline_name).unwrap();
    let replayed = configurator();
    apply(&calls, &replayed).unwrap();
    assert_eq!(replayed.config().unwrap(), canonical);
}

#[test]
fn simplest_pipeline_round_trips() {
    let original = configurator();
    original.ensure_pipeline_group("group").ensure_pipeline("line");
    assert_replay_reproduces(&original, "line");
}

#[test]
fn fully_featured_pipeline_round_trips() {
    let original = configurator();
    let pipeline = original.ensure_pipeline_group("group").ensure_pipeline("line");
    pipeline.set_default_label_template();
    pipeline.set_automatic_pipeline_locking();
    pipeline.set_timer("0 15 22 * * ?", true);
    pipeline
        .set_git_material(
            &GitMaterial::new("git@example.com:app.git")
                .with_branch("release")
                .with_ignore_patterns(["docs/**", "*.md"])
                .with_shallow_clone(true),
        )
        .unwrap();
    pipeline
        .ensure_material(&Material::Pipeline(PipelineMaterial::new("upstream", "s")))
        .unwrap();
    pipeline.ensure_environment_variables(
        &[
            ("zebra".to_string(), "1".to_string()),
            ("ant".to_string(), "2".to_string()),
        ]
        .into(),
    );
    pipeline.ensure_encrypted_environment_variables(
        &[("SECRET".to_string(), "0123456789".to_string())].into(),
    );
    pipeline.ensure_parameters(&[("Env".to_string(), "prod".to_string())].into());

    let stage = pipeline.ensure_stage("build").unwrap();
    stage.set_clean_working_dir();
    stage.set_has_manual_approval(&["admin"], &["operators"]);
    stage.set_fetch_materials(false);
    stage.ensure_environment_variables(&[("STAGE_VAR".to_string(), "sv".to_string())].into());

    let job = stage.ensure_job("compile");
    job.ensure_artifacts(
        &[
            Artifact::build_with_dest("target/*.zip", "dist"),
            Artifact::test("reports"),
            Artifact::external("image", "dockerhub"),
        ]
        .into_iter()
        .collect::<BTreeSet<Artifact>>(),
    )
    .unwrap();
    job.ensure_resource("linux");
    job.ensure_resource("docker");
    job.ensure_tab(&Tab::new("Coverage", "coverage/index.html"));
    job.set_timeout("30");
    job.set_runs_on_all_agents(true);
    job.set_elastic_profile_id("docker.unit-test");
    job.set_run_instance_count("2");
    job.add_task(&Task::Exec(
        ExecTask::new(["make", "all"]).with_working_dir("server"),
    ));
    job.add_task(&Task::FetchArtifact(
        FetchArtifactTask::new("upstream", "s", "j", FetchArtifactSource::Dir("out".to_string()))
            .with_dest("in")
            .with_runif(RunIf::Any),
    ));
    job.add_task(&Task::Rake(RakeTask::new("test").with_runif(RunIf::Failed)));
    job.add_task(&Task::Script(ScriptTask::new("echo done")));
    job.add_task(&Task::Plugin(PluginTask::new(
        "maven",
        [("Goal", "install")],
    )));

    let second = stage.ensure_job("report");
    second
        .ensure_task(&Task::Exec(ExecTask::new(["./report.sh"])))
        .unwrap();

    assert_replay_reproduces(&original, "line");
}

#[test]
fn template_based_pipeline_round_trips() {
    let original = configurator();
    let template = original.ensure_template("deploy-template");
    let stage = template.ensure_stage("deploy").unwrap();
    stage
        .ensure_job("push")
        .ensure_task(&Task::Exec(ExecTask::new(["./deploy.sh"])))
        .unwrap();
    let pipeline = original.ensure_pipeline_group("group").ensure_pipeline("line");
    pipeline.set_template_name("deploy-template").unwrap();
    pipeline.set_git_url("gurl").unwrap();
    assert_replay_reproduces(&original, "line");
}

#[test]
fn export_is_insertion_order_independent_for_unordered_collections() {
    let build = |resources: [&str; 2]| {
        let original = configurator();
        let job = original
            .ensure_pipeline_group("g")
            .ensure_pipeline("p")
            .ensure_stage("s")
            .unwrap()
            .ensure_job("j");
        for resource in resources {
            job.ensure_resource(resource);
        }
        original.export_pipeline("p").unwrap()
    };
    assert_eq!(build(["z", "a"]), build(["a", "z"]));
}

#[test]
fn calls_are_emitted_only_for_non_default_features() {
    let original = configurator();
    original.ensure_pipeline_group("group").ensure_pipeline("line");
    let calls = original.export_pipeline("line").unwrap();
    assert_eq!(
        calls,
        vec![
            ExportCall::EnsurePipelineGroup {
                name: "group".to_string()
            },
            ExportCall::EnsureReplacementOfPipeline {
                name: "line".to_string()
            },
        ]
    );
}

#[test]
fn single_optionless_git_exports_as_set_git_url() {
    let original = configurator();
    let pipeline = original.ensure_pipeline_group("g").ensure_pipeline("p");
    pipeline.set_git_url("giturl").unwrap();
    let calls = original.export_pipeline("p").unwrap();
    assert!(calls.contains(&ExportCall::SetGitUrl {
        url: "giturl".to_string()
    }));
}

#[test]
fn call_sequences_round_trip_through_json() {
    let original = configurator();
    let pipeline = original.ensure_pipeline_group("g").ensure_pipeline("p");
    pipeline.set_git_url("giturl").unwrap();
    pipeline
        .ensure_stage("s")
        .unwrap()
        .ensure_job("j")
        .ensure_task(&Task::Exec(ExecTask::new(["ls"])))
        .unwrap();
    let calls = original.export_pipeline("p").unwrap();
    let json = serde_json::to_string(&calls).unwrap();
    let decoded: Vec<ExportCall> = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded, calls);
}

#[test]
fn rendered_calls_are_one_per_line() {
    let original = configurator();
    original.ensure_pipeline_group("group").ensure_pipeline("line");
    let calls = original.export_pipeline("line").unwrap();
    let rendered = render(&calls);
    assert_eq!(
        rendered,
        "ensure_pipeline_group({\"name\":\"group\"})\nensure_replacement_of_pipeline({\"name\":\"line\"})"
    );
}

#[test]
fn replay_out_of_context_is_rejected() {
    let replayed = configurator();
    let calls = vec![ExportCall::EnsureStage {
        name: "s".to_string(),
    }];
    assert!(apply(&calls, &replayed).is_err());
}
