//! GoCD configuration CLI.

use anyhow::{Context, Result};
use clap::Parser;

use gocd_client::HostRestClient;
use gocd_config::GoCdConfigurator;
use gocd_config::export::render;

mod cli;
mod logging;

use crate::cli::{Cli, FormatArg};
use crate::logging::init_logging;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity.tracing_level_filter());
    if let Err(error) = run(&cli) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut client = HostRestClient::new(&cli.server).with_ssl(cli.ssl);
    if let (Some(username), Some(password)) = (&cli.username, &cli.password) {
        client = client.with_credentials(username, password);
    }
    let configurator = GoCdConfigurator::new(Box::new(client))
        .with_context(|| format!("load configuration from {}", cli.server))?;

    let Some(pipeline) = &cli.pipeline else {
        for pipeline in configurator.pipelines() {
            println!("{}", pipeline.name());
        }
        return Ok(());
    };

    let calls = configurator
        .export_pipeline(pipeline)
        .with_context(|| format!("export pipeline {pipeline}"))?;
    match cli.format {
        FormatArg::Calls => println!("{}", render(&calls)),
        FormatArg::Json => println!("{}", serde_json::to_string_pretty(&calls)?),
    }
    Ok(())
}
