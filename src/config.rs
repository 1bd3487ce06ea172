//! Runtime configuration shared by the tracing and replay flows

use crate::tracefs::DEFAULT_TRACING_ROOT;
use clap::ValueEnum;
use std::io::IsTerminal;
use std::path::PathBuf;

/// How the analysis is written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Nested diagram of significant intervals (default)
    #[default]
    Text,
    /// JSON report for machine parsing
    Json,
}

/// When to emit ANSI colour codes in the diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    pub fn enabled(self) -> bool {
        match self {
            ColorChoice::Auto => std::io::stdout().is_terminal(),
            ColorChoice::Always => true,
            ColorChoice::Never => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// tracefs mount point
    pub tracing_root: PathBuf,
    /// CPU the subject is pinned to and whose buffer is read back
    pub cpu: usize,
    pub format: OutputFormat,
    pub color: ColorChoice,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tracing_root: PathBuf::from(DEFAULT_TRACING_ROOT),
            cpu: 0,
            format: OutputFormat::Text,
            color: ColorChoice::Auto,
        }
    }
}
