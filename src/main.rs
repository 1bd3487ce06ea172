use anyhow::Result;
use clap::Parser;
use latcheck::{cli::Cli, config::Config, tracer};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for diagnostics on stderr
///
/// `--debug` turns on everything; otherwise `RUST_LOG` applies and
/// warnings such as unparsable trace lines are shown by default.
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Either replay a captured trace or run and trace a command
fn run(replay: Option<(PathBuf, i32)>, command: Vec<String>, config: Config) -> Result<()> {
    match (replay, command.is_empty()) {
        (Some((path, focus)), true) => {
            tracer::replay_trace(&path, focus, &config)?;
        }
        (None, false) => {
            let code = tracer::trace_command(&command, &config)?;
            tracing::debug!(code, "traced command finished");
        }
        (Some(_), false) => {
            anyhow::bail!("Cannot specify both --replay and a command. Choose one.");
        }
        (None, true) => {
            anyhow::bail!("Must specify a command or --replay FILE --focus PID. Usage: latcheck <command> <arg>...");
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let config = args.config();
    let replay = args.replay.zip(args.focus);
    run(replay, args.command, config)
}
