//! CLI argument definitions.

use clap::{Parser, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "gocd-cli",
    version,
    about = "Reverse engineer the configuration of a GoCD pipeline",
    long_about = "Fetch a Go server's configuration and print the call \
                  sequence that would rebuild the named pipeline from an \
                  empty configuration."
)]
pub struct Cli {
    /// The go server, e.g. "localhost:8153" or "my.gocd.com".
    #[arg(short, long)]
    pub server: String,

    /// The pipeline to reverse engineer; omit to list pipeline names.
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Username for the go server.
    #[arg(long)]
    pub username: Option<String>,

    /// Password for the go server.
    #[arg(long)]
    pub password: Option<String>,

    /// Use HTTPS for the connection to the go server.
    #[arg(long)]
    pub ssl: bool,

    /// Output format for the exported call sequence.
    #[arg(long, value_enum, default_value = "calls")]
    pub format: FormatArg,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    /// One call per line.
    Calls,
    /// The full call sequence as a json document.
    Json,
}
