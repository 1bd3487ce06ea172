//! JSON output format for latency analyses
//!
//! `--format json` implementation

use crate::analysis::{Analysis, AnalysisStats};
use crate::pattern::TaskId;
use crate::timeline::Instance;
use serde::{Deserialize, Serialize};

/// One end of a significant interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonBoundary {
    /// `secs.micros` as in the trace
    pub timestamp: String,
    pub task: TaskId,
    pub task_name: String,
    /// Ordinal of the trace line
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// A significant begin/end pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonInterval {
    pub pattern: String,
    /// Nesting level in the diagram, starting at 1
    pub level: usize,
    pub begin: JsonBoundary,
    pub end: JsonBoundary,
}

/// Complete JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Format version identifier
    pub version: String,
    /// Format name
    pub format: String,
    pub focus: TaskId,
    /// Exit code of the traced command, absent for replays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub summary: AnalysisStats,
    /// Significant intervals in order of their Begin
    pub intervals: Vec<JsonInterval>,
}

impl JsonOutput {
    pub fn from_analysis(analysis: &Analysis) -> Self {
        let timeline = analysis.timeline();
        let registry = analysis.registry();

        let intervals = analysis
            .significant_pairs()
            .filter_map(|(begin, end)| {
                let begin = &timeline[begin];
                let end = &timeline[end];
                let pattern = registry.get(begin.pattern)?;
                Some(JsonInterval {
                    pattern: pattern.name().to_string(),
                    level: begin.level(),
                    begin: boundary(begin, pattern.print(begin.payload())),
                    end: boundary(end, pattern.print(end.payload())),
                })
            })
            .collect();

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            format: "latcheck-json-v1".to_string(),
            focus: analysis.focus(),
            exit_code: None,
            summary: analysis.stats(),
            intervals,
        }
    }

    /// Set the exit code
    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = Some(code);
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn boundary(instance: &Instance, text: Option<String>) -> JsonBoundary {
    JsonBoundary {
        timestamp: instance.timestamp.to_string(),
        task: instance.task,
        task_name: instance.task_name.clone(),
        line: instance.line,
        text,
    }
}
