//! Task decode/encode, runif guard semantics and task idempotence.

use gocd_config::fake::empty_config;
use gocd_config::{
    ConfigError, ExecTask, FetchArtifactSource, FetchArtifactTask, GoCdConfigurator, Job,
    PluginTask, RakeTask, RunIf, ScriptTask, Task,
};
use gocd_xml::Doc;

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

fn round_trip(task: &Task) -> Task {
    let doc = Doc::with_root("job");
    let element = task.append_to(&doc.root());
    Task::decode(&element).expect("decode what we encoded")
}

#[test]
fn exec_task_round_trips() {
    let plain = Task::Exec(ExecTask::new(["ls", "-l"]));
    assert_eq!(round_trip(&plain), plain);
    let optioned = Task::Exec(
        ExecTask::new(["rake", "db:migrate"])
            .with_working_dir("server")
            .with_runif(RunIf::Failed),
    );
    assert_eq!(round_trip(&optioned), optioned);
}

#[test]
fn fetch_artifact_task_round_trips() {
    let file = Task::FetchArtifact(FetchArtifactTask::new(
        "p",
        "s",
        "j",
        FetchArtifactSource::File("f.txt".to_string()),
    ));
    assert_eq!(round_trip(&file), file);
    let dir = Task::FetchArtifact(
        FetchArtifactTask::new("p", "s", "j", FetchArtifactSource::Dir("out".to_string()))
            .with_dest("somewhere-else")
            .with_origin("ancestor")
            .with_runif(RunIf::Any),
    );
    assert_eq!(round_trip(&dir), dir);
}

#[test]
fn rake_task_round_trips() {
    let task = Task::Rake(RakeTask::new("boo").with_runif(RunIf::Any));
    assert_eq!(round_trip(&task), task);
}

#[test]
fn script_task_round_trips_through_the_plugin_wrapper() {
    let task = Task::Script(ScriptTask::new("echo hello\nmake world"));
    assert_eq!(round_trip(&task), task);

    let doc = Doc::with_root("job");
    let element = task.append_to(&doc.root());
    assert_eq!(element.tag(), "task");
    assert_eq!(
        element
            .find("pluginConfiguration")
            .unwrap()
            .attribute("id")
            .as_deref(),
        Some("script-executor")
    );
}

#[test]
fn plugin_task_round_trips() {
    let task = Task::Plugin(
        PluginTask::new(
            "maven",
            [("Goal", "clean install"), ("WorkingDirectory", "server")],
        )
        .with_version("2")
        .with_runif(RunIf::Failed),
    );
    assert_eq!(round_trip(&task), task);
}

#[test]
fn unknown_task_tag_is_a_fatal_decode_error() {
    let doc = Doc::parse("<tasks><ant target=\"build\" /></tasks>").unwrap();
    let error = Task::decode(&doc.root().children()[0]).unwrap_err();
    assert!(matches!(error, ConfigError::UnknownTask(tag) if tag == "ant"));
}

#[test]
fn plugin_wrapper_without_a_plugin_id_is_fatal() {
    let doc = Doc::parse("<tasks><task><configuration /></task></tasks>").unwrap();
    assert!(matches!(
        Task::decode(&doc.root().children()[0]),
        Err(ConfigError::MissingPluginId)
    ));
}

#[test]
fn fetch_artifact_without_a_source_is_fatal() {
    let doc =
        Doc::parse("<tasks><fetchartifact pipeline=\"p\" stage=\"s\" job=\"j\" /></tasks>").unwrap();
    assert!(matches!(
        Task::decode(&doc.root().children()[0]),
        Err(ConfigError::MissingFetchSource)
    ));
}

#[test]
fn runif_defaults_to_passed() {
    let doc = Doc::parse("<tasks><exec command=\"ls\" /></tasks>").unwrap();
    let task = Task::decode(&doc.root().children()[0]).unwrap();
    assert_eq!(task.runif(), RunIf::Passed);
}

#[test]
fn runif_pair_of_passed_and_failed_means_any() {
    let doc = Doc::parse(
        "<tasks><exec command=\"ls\"><runif status=\"passed\" /><runif status=\"failed\" /></exec></tasks>",
    )
    .unwrap();
    let task = Task::decode(&doc.root().children()[0]).unwrap();
    assert_eq!(task.runif(), RunIf::Any);
}

#[test]
fn runif_any_survives_encode_and_decode() {
    let task = Task::Exec(ExecTask::new(["ls"]).with_runif(RunIf::Any));
    let doc = Doc::with_root("job");
    let element = task.append_to(&doc.root());
    // encoded as the pair of markers, not a fourth literal
    let statuses: Vec<Option<String>> = element
        .children_with_tag("runif")
        .iter()
        .map(|runif| runif.attribute("status"))
        .collect();
    assert_eq!(
        statuses,
        [Some("passed".to_string()), Some("failed".to_string())]
    );
    assert_eq!(Task::decode(&element).unwrap().runif(), RunIf::Any);
}

#[test]
fn other_runif_combinations_are_fatal() {
    let doc = Doc::parse(
        "<tasks><exec command=\"ls\"><runif status=\"passed\" /><runif status=\"any\" /></exec></tasks>",
    )
    .unwrap();
    assert!(matches!(
        Task::decode(&doc.root().children()[0]),
        Err(ConfigError::AmbiguousRunIf(_))
    ));
}

#[test]
fn runif_rejects_arbitrary_literals_at_construction() {
    assert!(matches!(
        "whatever".parse::<RunIf>(),
        Err(ConfigError::InvalidRunIf(value)) if value == "whatever"
    ));
    assert_eq!("any".parse::<RunIf>().unwrap(), RunIf::Any);
    assert_eq!("passed".parse::<RunIf>().unwrap(), RunIf::Passed);
    assert_eq!("failed".parse::<RunIf>().unwrap(), RunIf::Failed);
}

#[test]
fn ensure_task_twice_leaves_exactly_one_task() {
    let configurator = configurator();
    let job = job(&configurator);
    let task = Task::Exec(ExecTask::new(["ls", "-l"]));
    job.ensure_task(&task).unwrap();
    job.ensure_task(&task).unwrap();
    assert_eq!(job.tasks().unwrap(), vec![task]);
}

#[test]
fn add_task_appends_duplicates_on_purpose() {
    let configurator = configurator();
    let job = job(&configurator);
    let task = Task::Exec(ExecTask::new(["ls"]));
    job.add_task(&task);
    job.add_task(&task);
    assert_eq!(job.tasks().unwrap().len(), 2);
}

#[test]
fn without_any_tasks_empties_the_job() {
    let configurator = configurator();
    let job = job(&configurator);
    job.add_task(&Task::Rake(RakeTask::new("boo")));
    job.without_any_tasks();
    assert!(job.tasks().unwrap().is_empty());
}
