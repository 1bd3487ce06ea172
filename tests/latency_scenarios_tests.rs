//! End-to-end latency scenarios against the built-in pattern kinds

use latcheck::analysis::Analysis;
use latcheck::engine::Engine;
use latcheck::pattern::{Boundary, Pattern, TaskId};
use latcheck::patterns::default_registry;
use latcheck::registry::PatternRegistry;
use latcheck::timeline::InstanceId;

const FOCUS: TaskId = 7;

const WAKEUP: &str =
    "  kworker-12 [000] d..4  1.000200: sched_wakeup: comm=app pid=7 prio=120 target_cpu=000";
const SWITCH_IN: &str = "  kworker-12 [000] d..3  1.000300: sched_switch: prev_comm=kworker prev_pid=12 prev_prio=120 prev_state=S ==> next_comm=app next_pid=7 next_prio=120";

fn analyze(lines: &[&str]) -> Analysis {
    let mut engine = Engine::new(default_registry(), FOCUS);
    engine.consume(lines);
    engine.finish()
}

fn render(analysis: &Analysis) -> String {
    let mut out = Vec::new();
    analysis.render_text(&mut out, false).unwrap();
    String::from_utf8(out).unwrap()
}

fn pattern_name(analysis: &Analysis, id: InstanceId) -> &'static str {
    let instance = &analysis.timeline()[id];
    analysis.registry().get(instance.pattern).unwrap().name()
}

#[test]
fn test_wakeup_to_switch_is_one_significant_latency() {
    let analysis = analyze(&[WAKEUP, SWITCH_IN]);

    let pairs: Vec<_> = analysis.significant_pairs().collect();
    assert_eq!(pairs.len(), 1);
    let (begin, end) = pairs[0];
    assert_eq!(pattern_name(&analysis, begin), "sched_latency");
    assert_eq!(analysis.timeline()[begin].level(), 1);
    assert_eq!(analysis.timeline()[end].level(), 1);

    let text = render(&analysis);
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(
        lines[0],
        "1.000200 ,-- sched_latency:in sched_wakeup: task=7 (kworker-12)"
    );
    assert_eq!(lines[1], "         |  ");
    assert_eq!(
        lines[2],
        "1.000300 `-- sched_latency:out sched_switch: task=7 (kworker-12)"
    );
}

#[test]
fn test_wakeup_raised_by_focus_task_is_significant() {
    // The focus task wakes task 9; only the Begin involves the focus task.
    let analysis = analyze(&[
        "  app-7 [000] d..4  1.000200: sched_wakeup: comm=worker pid=9 prio=120 target_cpu=000",
        "  kworker-12 [000] d..3  1.000300: sched_switch: prev_comm=kworker prev_pid=12 prev_prio=120 prev_state=S ==> next_comm=worker next_pid=9 next_prio=120",
    ]);

    let pairs: Vec<_> = analysis.significant_pairs().collect();
    assert_eq!(pairs.len(), 1);
    assert_eq!(pattern_name(&analysis, pairs[0].0), "sched_latency");

    let text = render(&analysis);
    assert!(text.contains(",-- sched_latency:in sched_wakeup: task=9 (app-7)"));
    assert!(text.contains("`-- sched_latency:out sched_switch: task=9 (kworker-12)"));
}

#[test]
fn test_enclosing_priority_boost_is_significant_and_shallower() {
    let analysis = analyze(&[
        "  lock-9 [000] d..2  1.000100: sched_pi_setprio: comm=app pid=7 oldprio=120 newprio=89",
        WAKEUP,
        SWITCH_IN,
        "  app-7 [000] d..2  1.000400: sched_pi_setprio: comm=app pid=7 oldprio=89 newprio=120",
    ]);

    let pairs: Vec<_> = analysis.significant_pairs().collect();
    assert_eq!(pairs.len(), 2);
    let (boost, _) = pairs[0];
    let (latency, _) = pairs[1];
    assert_eq!(pattern_name(&analysis, boost), "prio_boost");
    assert_eq!(pattern_name(&analysis, latency), "sched_latency");

    let timeline = analysis.timeline();
    assert!(timeline[boost].level() < timeline[latency].level());
    assert_eq!(timeline[boost].level(), 1);
    assert_eq!(timeline[latency].level(), 2);

    let text = render(&analysis);
    assert!(text.contains(",----- prio_boost:in sched_pi_setprio: task=7 prio=0->10 (lock-9)"));
    assert!(text.contains("|  ,-- sched_latency:in sched_wakeup: task=7 (kworker-12)"));
    assert!(text.contains("`----- prio_boost:out sched_pi_setprio: task=7 prio=10->0 (app-7)"));
}

#[test]
fn test_boost_of_unrelated_task_stays_hidden() {
    let analysis = analyze(&[
        "  lock-9 [000] d..2  1.000100: sched_pi_setprio: comm=other pid=5 oldprio=120 newprio=89",
        WAKEUP,
        SWITCH_IN,
        "  other-5 [000] d..2  1.000400: sched_pi_setprio: comm=other pid=5 oldprio=89 newprio=120",
    ]);

    assert_eq!(analysis.significant_pairs().count(), 1);
    assert!(!render(&analysis).contains("prio_boost"));
}

#[test]
fn test_line_without_cpu_bracket_is_skipped() {
    let clean = analyze(&[WAKEUP, SWITCH_IN]);
    let analysis = analyze(&[
        WAKEUP,
        "  kworker-12 d..3  1.000250: sched_switch: prev_comm=kworker prev_pid=12 prev_prio=120 prev_state=S ==> next_comm=app next_pid=7 next_prio=120",
        SWITCH_IN,
    ]);

    let stats = analysis.stats();
    assert_eq!(stats.engine.parse_failures, 1);
    assert_eq!(stats.engine.lines, 3);
    assert_eq!(analysis.timeline().len(), clean.timeline().len());

    let pairs: Vec<_> = analysis.significant_pairs().collect();
    assert_eq!(pairs.len(), 1);
    let (_, end) = pairs[0];
    assert_eq!(analysis.timeline()[end].line, 3);
}

#[test]
fn test_sched_out_until_wakeup_keeps_focus_off_cpu() {
    let analysis = analyze(&[
        "  app-7 [000] d..3  1.000100: sched_switch: prev_comm=app prev_pid=7 prev_prio=120 prev_state=D ==> next_comm=kworker next_pid=12 next_prio=120",
        WAKEUP,
        SWITCH_IN,
    ]);

    let names: Vec<_> = analysis
        .significant_pairs()
        .map(|(begin, _)| pattern_name(&analysis, begin))
        .collect();
    assert_eq!(names, vec!["sched_out_nonint_sleeping", "sched_latency"]);

    let text = render(&analysis);
    assert!(text.contains("sched_out_nonint_sleeping:in sched_switch: task=7 (app-7)"));
    assert!(text.contains("sched_out_nonint_sleeping:out sched_wakeup: task=7 (kworker-12)"));
}

/// Opens on ` <key>=` in a `work:` line, closes on `done: <key>`
struct Keyed(&'static str);

impl Pattern for Keyed {
    type Payload = String;

    fn name(&self) -> &'static str {
        self.0
    }

    fn marks_scheduling(&self) -> bool {
        true
    }

    fn match_line(
        &self,
        line: &str,
        _task: TaskId,
        boundary: Boundary,
        _inbound: Option<&String>,
    ) -> Option<String> {
        match boundary {
            Boundary::Begin if line.contains(" work: ") => line
                .contains(&format!(" {}=", self.0))
                .then(|| self.0.to_string()),
            Boundary::End => line
                .contains(&format!(" done: {}", self.0))
                .then(|| self.0.to_string()),
            Boundary::Begin => None,
        }
    }

    fn print(&self, key: &String) -> Option<String> {
        Some(key.clone())
    }
}

#[test]
fn test_kinds_opened_on_one_line_close_independently() {
    let mut registry = PatternRegistry::new();
    let alpha = registry.register(Keyed("alpha"));
    let beta = registry.register(Keyed("beta"));

    let mut engine = Engine::new(registry, FOCUS);
    engine.consume([
        "  app-7 [000] ....  5.000100: work: alpha=1 beta=2",
        "  app-7 [000] ....  5.000200: done: beta",
        "  app-7 [000] ....  5.000300: done: alpha",
    ]);
    assert!(engine.open_set().is_empty());
    let analysis = engine.finish();

    let timeline = analysis.timeline();
    let ids: Vec<_> = timeline.ids().collect();
    assert_eq!(ids.len(), 4);
    assert_eq!(timeline[ids[0]].pattern, alpha);
    assert_eq!(timeline[ids[1]].pattern, beta);
    assert_eq!(timeline[ids[0]].line, timeline[ids[1]].line);

    // beta closes on line 2, alpha on line 3.
    assert_eq!(timeline.pair(ids[1]), Some((ids[1], ids[2])));
    assert_eq!(timeline.pair(ids[0]), Some((ids[0], ids[3])));
    assert_eq!(timeline[ids[2]].pattern, beta);
    assert_eq!(timeline[ids[3]].pattern, alpha);
}

#[test]
fn test_unmatched_begin_is_not_rendered() {
    let analysis = analyze(&[WAKEUP]);
    assert_eq!(analysis.stats().unmatched, 1);
    assert_eq!(analysis.stats().significant, 0);
    assert!(render(&analysis).is_empty());
}
