/// Correlation throughput benchmarks
///
/// Feeds synthetic scheduler traces through the default pattern set and
/// measures matching, significance propagation and rendering.
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use latcheck::engine::Engine;
use latcheck::patterns::default_registry;

const FOCUS: i32 = 7;

/// One wakeup/switch-in/switch-out round per iteration, with an unrelated
/// task preempted in between.
fn synthetic_trace(rounds: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(rounds * 4);
    for round in 0..rounds {
        let base = round as u64 * 1000;
        let ts = |offset: u64| {
            let micros = base + offset;
            format!("{}.{:06}", 100 + micros / 1_000_000, micros % 1_000_000)
        };
        lines.push(format!(
            "     kworker-12    [000] d..4  {}: sched_wakeup: comm=app pid={FOCUS} prio=120 target_cpu=000",
            ts(100)
        ));
        lines.push(format!(
            "     kworker-12    [000] d..3  {}: sched_switch: prev_comm=kworker prev_pid=12 prev_prio=120 prev_state=R+ ==> next_comm=app next_pid={FOCUS} next_prio=120",
            ts(200)
        ));
        lines.push(format!(
            "         app-{FOCUS}     [000] ....  {}: sys_enter: NR 0 (3, 7ffd, 10, 0, 0, 0)",
            ts(300)
        ));
        lines.push(format!(
            "         app-{FOCUS}     [000] d..3  {}: sched_switch: prev_comm=app prev_pid={FOCUS} prev_prio=120 prev_state=S ==> next_comm=kworker next_pid=12 next_prio=120",
            ts(400)
        ));
        lines.push(format!(
            "         app-{FOCUS}     [000] ....  {}: sys_exit: NR 0 = 10",
            ts(900)
        ));
    }
    lines
}

fn bench_consume(c: &mut Criterion) {
    let mut group = c.benchmark_group("consume");

    for rounds in [100usize, 1_000, 10_000] {
        let lines = synthetic_trace(rounds);
        group.throughput(Throughput::Elements(lines.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &lines, |b, lines| {
            b.iter(|| {
                let mut engine = Engine::new(default_registry(), FOCUS);
                engine.consume(lines);
                black_box(engine.stats());
            });
        });
    }

    group.finish();
}

fn bench_analyze_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_render");

    for rounds in [100usize, 1_000] {
        let lines = synthetic_trace(rounds);
        group.throughput(Throughput::Elements(lines.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rounds), &lines, |b, lines| {
            b.iter(|| {
                let mut engine = Engine::new(default_registry(), FOCUS);
                engine.consume(lines);
                let analysis = engine.finish();
                let mut out = Vec::with_capacity(64 * 1024);
                analysis
                    .render_text(&mut out, false)
                    .expect("render to memory");
                black_box(out);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_consume, bench_analyze_and_render);
criterion_main!(benches);
