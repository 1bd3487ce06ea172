//! CLI argument parsing for latcheck

use crate::config::{ColorChoice, Config, OutputFormat};
use crate::pattern::TaskId;
use crate::tracefs::DEFAULT_TRACING_ROOT;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "latcheck")]
#[command(version)]
#[command(
    about = "Explain scheduling latency of a command from its kernel trace",
    long_about = None
)]
pub struct Cli {
    /// Enable verbose debug output on stderr
    #[arg(long)]
    pub debug: bool,

    /// CPU to pin the command to and read the trace of
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub cpu: usize,

    /// tracefs mount point
    #[arg(long = "tracing-dir", value_name = "PATH", default_value = DEFAULT_TRACING_ROOT)]
    pub tracing_dir: PathBuf,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Highlight the off-CPU column with ANSI colours
    #[arg(long = "color", value_enum, default_value = "auto")]
    pub color: ColorChoice,

    /// Analyze a captured trace file instead of running a command
    #[arg(long, value_name = "FILE", requires = "focus", conflicts_with = "command")]
    pub replay: Option<PathBuf>,

    /// Task to explain when replaying a trace
    #[arg(long, value_name = "PID", requires = "replay")]
    pub focus: Option<TaskId>,

    /// Command to run and trace
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config {
            tracing_root: self.tracing_dir.clone(),
            cpu: self.cpu,
            format: self.format,
            color: self.color,
        }
    }
}
