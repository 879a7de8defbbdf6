//! Execution Limit Tests.
//!
//! Every invocation runs under a budget: runaway programs end with an
//! execution-timeout error instead of hanging the host.

use mcusim_core::config::Config;
use mcusim_core::script::ScriptEngine;

use crate::common::harness::TestContext;

fn step_limited(max_steps: u64) -> TestContext {
    let mut config = Config::default();
    config.execution.timeout_ms = None;
    config.execution.max_steps = Some(max_steps);
    TestContext::with_config(config)
}

#[test]
fn step_budget_stops_infinite_loop() {
    let mut ctx = step_limited(10_000);
    let error = ctx.run_err("while (true) {}");
    assert_eq!(error, "execution timeout: script exceeded 10000 evaluation steps");
}

#[test]
fn wall_clock_budget_stops_infinite_loop() {
    let mut config = Config::default();
    config.execution.timeout_ms = Some(50);
    config.execution.max_steps = None;
    let mut ctx = TestContext::with_config(config);

    let error = ctx.run_err("let i = 0; while (true) { i++; }");
    assert_eq!(error, "execution timeout: script ran longer than 50 ms");
}

#[test]
fn timeout_cannot_be_caught() {
    let mut ctx = step_limited(5_000);
    let error = ctx.run_err("let caught = false; try { while (true) {} } catch (e) { caught = true; }");
    assert!(error.starts_with("execution timeout"), "{error}");
}

#[test]
fn budget_resets_per_invocation() {
    let mut ctx = step_limited(2_000);
    let source = "let n = 0; for (let i = 0; i < 100; i++) { n += i; }";
    ctx.run_ok(source);
    ctx.run_ok(source);
    ctx.run_ok(source);
}

#[test]
fn budget_applies_to_callbacks() {
    let mut ctx = step_limited(1_000);
    ctx.run_ok("setInterval(() => { while (true) {} }, 10);");
    ctx.sim.start();
    let error = ctx.sim.tick(10).unwrap_err();
    assert!(error.to_string().starts_with("execution timeout"), "{error}");
}

#[test]
fn mutations_before_timeout_persist() {
    let mut ctx = step_limited(1_000);
    ctx.run_err("pinMode(4, 'output'); digitalWrite(4, true); while (true) {}");
    assert!(ctx.state().gpio.read(4));
}

#[test]
fn deep_recursion_is_a_range_error() {
    let mut ctx = TestContext::new();
    let error = ctx.run_err("function f(n) { return f(n + 1); } f(0);");
    assert_eq!(error, "RangeError: Maximum call stack size exceeded (64 frames)");
}

#[test]
fn call_depth_cannot_be_caught() {
    let mut ctx = TestContext::new();
    let error = ctx.run_err("function f() { return f(); } try { f(); } catch (e) {}");
    assert!(error.contains("Maximum call stack size exceeded"), "{error}");
}

#[test]
fn configured_call_depth() {
    let mut config = Config::default();
    config.execution.max_call_depth = 8;
    let mut ctx = TestContext::with_config(config);

    ctx.run_ok("function down(n) { return n === 0 ? 0 : down(n - 1); } down(7);");
    let error = ctx.run_err("function down(n) { return n === 0 ? 0 : down(n - 1); } down(8);");
    assert!(error.contains("(8 frames)"), "{error}");
}

#[test]
fn string_growth_is_bounded() {
    let mut ctx = TestContext::new();
    let error = ctx.run_err("let s = 'x'; while (true) { s += s; }");
    assert_eq!(error, "RangeError: Invalid string length");
}

#[test]
fn deeply_nested_source_is_rejected() {
    let mut ctx = TestContext::new();
    let source = format!("let r = {}1{};", "(".repeat(500), ")".repeat(500));
    let error = ctx.run_err(&source);
    assert!(error.contains("nested too deeply"), "{error}");
}

fn n_of(ctx: &TestContext) -> String {
    ctx.sim
        .engine()
        .global("n")
        .map(|value| value.to_js_string())
        .unwrap_or_default()
}

#[test]
fn self_rescheduling_timeout_waits_for_next_tick() {
    let mut ctx = TestContext::new();
    ctx.run_ok("let n = 0; function loop() { n++; setTimeout(loop, 0); } setTimeout(loop, 0);");
    ctx.sim.start();

    assert_eq!(ctx.sim.tick(10).unwrap(), 1);
    assert_eq!(n_of(&ctx), "1");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 1);

    assert_eq!(ctx.sim.tick(0).unwrap(), 1);
    assert_eq!(n_of(&ctx), "2");
}

#[test]
fn callbacks_scheduled_during_a_tick_are_deferred() {
    let mut ctx = TestContext::new();
    ctx.run_ok(
        "let n = 0;
         setInterval(() => { n++; setTimeout(() => { n += 100; }, 0); }, 10);",
    );
    ctx.sim.start();

    assert_eq!(ctx.sim.tick(30).unwrap(), 3);
    assert_eq!(n_of(&ctx), "3");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 4);

    assert_eq!(ctx.sim.tick(0).unwrap(), 3);
    assert_eq!(n_of(&ctx), "303");
}
