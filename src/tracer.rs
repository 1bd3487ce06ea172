//! End-to-end flows: trace a command, or replay a captured trace
//!
//! ```text
//! spawn suspended ─► tracefs instance ─► enable kinds ─► tracing on
//!   ─► release ─► wait ─► tracing off ─► read CPU buffer
//!   ─► consume ─► analyze ─► render
//! ```

use crate::analysis::Analysis;
use crate::config::{Config, OutputFormat};
use crate::engine::Engine;
use crate::json_output::JsonOutput;
use crate::launcher::spawn_suspended;
use crate::pattern::TaskId;
use crate::patterns::default_registry;
use crate::tracefs::{read_lines, TraceInstance};
use anyhow::{Context, Result};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Run `command` under tracing and explain its scheduling latency.
///
/// Returns the exit code of the command.
pub fn trace_command(command: &[String], config: &Config) -> Result<i32> {
    let mut child = spawn_suspended(command, config.cpu)?;
    let focus: TaskId = child.pid().as_raw();

    let instance = TraceInstance::create(&config.tracing_root, focus as u32)
        .context("Failed to set up tracing (is tracefs mounted and are you root?)")?;

    let mut engine = Engine::new(default_registry(), focus);
    engine
        .enable(instance.context())
        .context("Failed to enable trace events")?;
    instance.set_tracing_on(true)?;

    child.release()?;
    let exit_code = child.wait()?;
    instance.set_tracing_on(false)?;

    let lines = instance
        .read_cpu_trace(config.cpu)
        .with_context(|| format!("Failed to read trace buffer of CPU {}", config.cpu))?;
    tracing::debug!(lines = lines.len(), "read trace buffer");

    if config.format == OutputFormat::Text {
        println!("processing task: {focus}");
    }
    engine.consume(&lines);
    let analysis = engine.finish();

    emit(&analysis, config, Some(exit_code))?;
    Ok(exit_code)
}

/// Analyze a previously captured trace for task `focus`
pub fn replay_trace(path: &Path, focus: TaskId, config: &Config) -> Result<()> {
    let lines = read_lines(path)?;
    tracing::debug!(path = %path.display(), lines = lines.len(), "replaying trace");

    if config.format == OutputFormat::Text {
        println!("processing task: {focus}");
    }
    let mut engine = Engine::new(default_registry(), focus);
    engine.consume(&lines);
    let analysis = engine.finish();

    emit(&analysis, config, None)
}

fn emit(analysis: &Analysis, config: &Config, exit_code: Option<i32>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match config.format {
        OutputFormat::Text => {
            analysis.render_text(&mut out, config.color.enabled())?;
        }
        OutputFormat::Json => {
            let mut output = JsonOutput::from_analysis(analysis);
            if let Some(code) = exit_code {
                output.set_exit_code(code);
            }
            writeln!(out, "{}", output.to_json()?)?;
        }
    }

    out.flush()?;
    Ok(())
}
