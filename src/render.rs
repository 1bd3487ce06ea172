//! Text diagram of significant instances
//!
//! One line per printable significant instance:
//!
//! ```text
//! 1234.000100 ,----- sched_latency:in sched_wakeup: task=7 (kworker-12)
//!             |
//! 1234.000150 |  ,-- prio_boost:in sched_pi_setprio: task=7 prio=1->5 (irq-3)
//!             |  |
//! 1234.000200 |  `-- prio_boost:out sched_pi_setprio: task=7 prio=5->1 (irq-3)
//!             |
//! 1234.000300 `----- sched_latency:out sched_switch: task=7 (swapper-0)
//! ```
//!
//! With colour enabled the column in which the focus task is off the CPU is
//! highlighted.

use crate::analysis::Analysis;
use crate::levels::LevelTable;
use crate::pattern::{Boundary, SchedTransition};
use crate::timeline::Instance;
use std::io::{self, Write};

const FGBG_NORMAL: &str = "\x1b[107m\x1b[30m";
const HIGHLIGHT: &str = "\x1b[48;5;228m\x1b[38;5;124m";
const FG_BLACK: &str = "\x1b[30m";
const CLEAR_EOL: &str = "\x1b[K";
const RESET: &str = "\x1b[0m";

/// Fixed gap between the seconds digits and the first column:
/// the dot, six microsecond digits and a space.
const TIMESTAMP_TAIL: usize = 8;

struct Painter {
    color: bool,
    depth: usize,
    /// Column to highlight, 0 for none
    highlight: usize,
}

impl Painter {
    fn code<'a>(&self, code: &'a str) -> &'a str {
        if self.color {
            code
        } else {
            ""
        }
    }

    fn column<W: Write>(&self, out: &mut W, level: usize, glyph: &str) -> io::Result<()> {
        if level == self.highlight {
            write!(out, "{}{}{}", self.code(HIGHLIGHT), glyph, self.code(FG_BLACK))
        } else {
            out.write_all(glyph.as_bytes())
        }
    }

    /// Vertical rails for levels `1..upto`
    fn rails<W: Write>(&self, out: &mut W, levels: &LevelTable, upto: usize) -> io::Result<()> {
        for level in 1..upto {
            let glyph = if levels.is_active(level) { "|  " } else { "   " };
            self.column(out, level, glyph)?;
        }
        Ok(())
    }

    fn separator<W: Write>(&self, out: &mut W, levels: &LevelTable, secs_width: usize) -> io::Result<()> {
        write!(
            out,
            "{}{:width$}",
            self.code(FGBG_NORMAL),
            "",
            width = secs_width + TIMESTAMP_TAIL
        )?;
        self.rails(out, levels, self.depth)?;
        writeln!(out, "{}", self.code(CLEAR_EOL))
    }

    fn instance<W: Write>(
        &self,
        out: &mut W,
        levels: &LevelTable,
        instance: &Instance,
        text: &str,
    ) -> io::Result<()> {
        let level = instance.level();
        write!(out, "{}{} ", self.code(FGBG_NORMAL), instance.timestamp)?;
        self.rails(out, levels, level)?;

        for column in level..self.depth {
            let glyph = if column == level {
                match instance.boundary {
                    Boundary::Begin => ",--",
                    Boundary::End => "`--",
                }
            } else if levels.is_active(column) {
                "+--"
            } else {
                "---"
            };
            self.column(out, column, glyph)?;
        }

        writeln!(
            out,
            " {} ({}-{}){}",
            text,
            instance.task_name,
            instance.task,
            self.code(CLEAR_EOL)
        )
    }
}

/// Render the significant instances of `analysis` as a nested diagram.
///
/// Instances whose kind has no text still open and close their level but
/// produce no line. A blank rail line separates instances that came from
/// different trace lines.
pub fn render_text<W: Write>(analysis: &Analysis, out: &mut W, color: bool) -> io::Result<()> {
    let timeline = analysis.timeline();
    let registry = analysis.registry();
    let focus = analysis.focus();

    let mut painter = Painter {
        color,
        depth: analysis.depth(),
        highlight: 0,
    };
    let mut levels = LevelTable::new();
    let mut last_line = None;

    for (_, instance) in timeline.iter() {
        if !instance.is_significant() {
            continue;
        }
        let Some(pattern) = registry.get(instance.pattern) else {
            continue;
        };
        let text = pattern.print(instance.payload());

        if text.is_some() && last_line.is_some_and(|line| line != instance.line) {
            let secs_width = instance.timestamp.secs.to_string().len();
            painter.separator(out, &levels, secs_width)?;
        }

        levels.set_active(instance.level(), instance.boundary == Boundary::Begin);

        let transition = pattern
            .sched_out(focus, instance.payload())
            .unwrap_or(SchedTransition::Unaffected);
        if transition == SchedTransition::NowOff {
            painter.highlight = instance.level();
        }

        if let Some(text) = text {
            painter.instance(out, &levels, instance, &text)?;
            last_line = Some(instance.line);
        }

        if transition == SchedTransition::NowOn {
            painter.highlight = 0;
        }
    }

    if color {
        writeln!(out, "{RESET}{CLEAR_EOL}")?;
    }
    Ok(())
}
