//! latcheck - explain scheduling latency from kernel trace events
//!
//! Correlates ftrace lines into begin/end intervals using pluggable
//! pattern kinds, decides which intervals explain the latency of one focus
//! task, and renders them as a nested diagram.
//!
//! ```no_run
//! use latcheck::engine::Engine;
//! use latcheck::patterns::default_registry;
//!
//! let mut engine = Engine::new(default_registry(), 1234);
//! engine.consume(std::fs::read_to_string("trace.txt")?.lines());
//! let analysis = engine.finish();
//! analysis.render_text(&mut std::io::stdout(), false)?;
//! # Ok::<(), std::io::Error>(())
//! ```

pub mod analysis;
pub mod cli;
pub mod config;
pub mod engine;
pub mod json_output;
pub mod launcher;
pub mod levels;
pub mod parser;
pub mod pattern;
pub mod patterns;
pub mod registry;
pub mod render;
pub mod significance;
pub mod syscalls;
pub mod timeline;
pub mod timestamp;
pub mod tracefs;
pub mod tracer;
