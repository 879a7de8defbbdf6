//! Virtual-Clock Scheduling Tests.
//!
//! Callbacks registered with `setInterval`/`setTimeout` only run from
//! `Simulator::tick` while the controller is running.

use mcusim_core::ScriptError;
use mcusim_core::config::Config;
use mcusim_core::script::ScriptEngine;

use crate::common::harness::TestContext;

fn global(ctx: &TestContext, name: &str) -> String {
    ctx.sim
        .engine()
        .global(name)
        .map(|value| value.to_js_string())
        .unwrap_or_default()
}

#[test]
fn interval_fires_only_while_running() {
    let mut ctx = TestContext::new();
    ctx.run_ok("let n = 0; setInterval(() => n++, 100);");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 1);

    assert_eq!(ctx.sim.tick(1000).unwrap(), 0);
    assert_eq!(global(&ctx, "n"), "0");

    ctx.sim.start();
    assert_eq!(ctx.sim.tick(250).unwrap(), 2);
    assert_eq!(global(&ctx, "n"), "2");
    assert_eq!(ctx.sim.tick(50).unwrap(), 1);
    assert_eq!(global(&ctx, "n"), "3");
}

#[test]
fn timeout_fires_once() {
    let mut ctx = TestContext::new();
    ctx.run_ok("let fired = 0; setTimeout(() => fired++, 500);");
    ctx.sim.start();

    assert_eq!(ctx.sim.tick(499).unwrap(), 0);
    assert_eq!(ctx.sim.tick(1).unwrap(), 1);
    assert_eq!(ctx.sim.tick(1000).unwrap(), 0);
    assert_eq!(global(&ctx, "fired"), "1");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 0);
}

#[test]
fn zero_delay_timeout_fires_on_next_tick() {
    let mut ctx = TestContext::new();
    ctx.run_ok("let done = false; setTimeout(() => { done = true; });");
    ctx.sim.start();
    assert_eq!(ctx.sim.tick(0).unwrap(), 1);
    assert_eq!(global(&ctx, "done"), "true");
}

#[test]
fn interval_can_clear_itself() {
    let mut ctx = TestContext::new();
    ctx.run_ok(
        "let n = 0;
         const id = setInterval(() => { n++; if (n === 3) clearInterval(id); }, 10);",
    );
    ctx.sim.start();
    assert_eq!(ctx.sim.tick(1000).unwrap(), 3);
    assert_eq!(ctx.sim.engine().pending_callbacks(), 0);
}

#[test]
fn clear_timeout_before_due() {
    let mut ctx = TestContext::new();
    ctx.run_ok("let hit = false; const t = setTimeout(() => { hit = true; }, 100); clearTimeout(t);");
    ctx.sim.start();
    assert_eq!(ctx.sim.tick(500).unwrap(), 0);
    assert_eq!(global(&ctx, "hit"), "false");
}

#[test]
fn callbacks_fire_in_due_order() {
    let mut ctx = TestContext::new();
    ctx.run_ok(
        "let log = '';
         setTimeout(() => { log += 'a'; }, 10);
         setTimeout(() => { log += 'b'; }, 5);
         setTimeout(() => { log += 'c'; }, 10);",
    );
    ctx.sim.start();
    assert_eq!(ctx.sim.tick(10).unwrap(), 3);
    assert_eq!(global(&ctx, "log"), "bac");
}

#[test]
fn catch_up_is_capped_per_tick() {
    let mut config = Config::default();
    config.execution.max_catch_up = 5;
    let mut ctx = TestContext::with_config(config);
    ctx.run_ok("let n = 0; setInterval(() => n++, 1);");
    ctx.sim.start();

    assert_eq!(ctx.sim.tick(100).unwrap(), 5);
    assert_eq!(global(&ctx, "n"), "5");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 1);
}

#[test]
fn stop_cancels_callbacks() {
    let mut ctx = TestContext::new();
    ctx.run_ok("setInterval(() => {}, 10);");
    ctx.sim.start();
    ctx.sim.stop();
    assert_eq!(ctx.sim.engine().pending_callbacks(), 0);

    ctx.sim.start();
    assert_eq!(ctx.sim.tick(100).unwrap(), 0);
}

#[test]
fn reset_cancels_callbacks() {
    let mut ctx = TestContext::new();
    ctx.run_ok("setInterval(() => {}, 10);");
    ctx.sim.reset();
    assert_eq!(ctx.sim.engine().pending_callbacks(), 0);
}

#[test]
fn new_program_replaces_old_callbacks() {
    let mut ctx = TestContext::new();
    ctx.run_ok("setInterval(() => serialWrite('old'), 10);");
    ctx.run_ok("setInterval(() => serialWrite('new'), 10);");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 1);

    ctx.sim.start();
    ctx.sim.tick(10).unwrap();
    assert_eq!(ctx.serial_lines(), vec!["new".to_string()]);
}

#[test]
fn failed_program_still_cancels_old_callbacks() {
    let mut ctx = TestContext::new();
    ctx.run_ok("setInterval(() => {}, 10);");
    ctx.run_err("let = ;");
    assert_eq!(ctx.sim.engine().pending_callbacks(), 0);
}

#[test]
fn callback_errors_are_reported_from_tick() {
    let mut ctx = TestContext::new();
    ctx.run_ok("setInterval(() => { throw 'loop fault'; }, 10);");
    ctx.sim.start();

    let error = ctx.sim.tick(10).unwrap_err();
    assert_eq!(error, ScriptError::Thrown("loop fault".to_string()));
    assert!(ctx.sim.is_running());
    assert_eq!(ctx.sim.stats().loop_failures, 1);
}

#[test]
fn callbacks_drive_peripherals() {
    let mut ctx = TestContext::new();
    ctx.run_ok(
        "pinMode(0, 'output');
         let led = false;
         setInterval(() => { led = !led; digitalWrite(0, led); }, 500);",
    );
    ctx.sim.start();

    ctx.sim.tick(500).unwrap();
    assert!(ctx.state().gpio.read(0));
    ctx.sim.tick(500).unwrap();
    assert!(!ctx.state().gpio.read(0));
    assert_eq!(ctx.sim.stats().loop_callbacks, 2);
}

#[test]
fn non_function_callback_is_a_type_error() {
    let mut ctx = TestContext::new();
    let error = ctx.run_err("setInterval(42, 10);");
    assert!(error.starts_with("TypeError: "), "{error}");
}
