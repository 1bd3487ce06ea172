#![no_main]

use latcheck::engine::Engine;
use latcheck::parser::parse_trace_line;
use latcheck::patterns::default_registry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        // Neither the header parser nor the event matchers may panic.
        let _ = parse_trace_line(input);

        let mut engine = Engine::new(default_registry(), 7);
        engine.consume(input.lines());
        let _ = engine.finish();
    }
});
