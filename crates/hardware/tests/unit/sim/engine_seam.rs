//! Controller Tests with a Scripted Engine.
//!
//! The controller only depends on the `ScriptEngine` trait; these tests swap
//! the interpreter for `FakeEngine`.

use mcusim_core::config::Config;
use mcusim_core::script::Value;
use mcusim_core::{ScriptError, Simulator};

use crate::common::fake_engine::FakeEngine;

#[test]
fn engine_receives_source_and_host() {
    let engine = FakeEngine::new()
        .call("pinMode", vec![Value::Number(2.0), Value::from("output")])
        .call("digitalWrite", vec![Value::Number(2.0), Value::Bool(true)]);
    let mut sim = Simulator::with_engine(Config::default(), engine);

    let result = sim.execute_code("anything");
    assert!(result.success);
    assert!(sim.state().gpio.read(2));
    assert_eq!(sim.engine().sources, vec!["anything".to_string()]);
    assert_eq!(sim.stats().capability_calls, 2);
}

#[test]
fn engine_error_becomes_failed_result() {
    let engine = FakeEngine::new().failing(ScriptError::Type("x is not a function".to_string()));
    let mut sim = Simulator::with_engine(Config::default(), engine);

    let result = sim.execute_code("x()");
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("TypeError: x is not a function"));
    assert!(result.state.is_none());
}

#[test]
fn unknown_capability_from_engine_is_reported() {
    let engine = FakeEngine::new().call("launchMissiles", vec![]);
    let mut sim = Simulator::with_engine(Config::default(), engine);

    let result = sim.execute_code("");
    assert_eq!(
        result.error.as_deref(),
        Some("ReferenceError: launchMissiles is not defined")
    );
}

#[test]
fn stop_and_reset_cancel_engine_callbacks() {
    let mut sim = Simulator::with_engine(Config::default(), FakeEngine::new());
    sim.engine_mut().pending = 2;

    sim.stop();
    assert_eq!(sim.engine().cancelled, 1);
    sim.reset();
    assert_eq!(sim.engine().cancelled, 2);
}

#[test]
fn tick_only_advances_while_running() {
    let mut sim = Simulator::with_engine(Config::default(), FakeEngine::new());
    sim.engine_mut().pending = 3;

    assert_eq!(sim.tick(16).unwrap(), 0);
    assert_eq!(sim.engine().advanced_ms, 0);

    sim.start();
    assert_eq!(sim.tick(16).unwrap(), 3);
    assert_eq!(sim.tick(4).unwrap(), 3);
    assert_eq!(sim.engine().advanced_ms, 20);
    assert_eq!(sim.stats().loop_callbacks, 6);
}

#[test]
fn rollback_cancels_through_the_trait() {
    let mut config = Config::default();
    config.execution.rollback_on_error = true;
    let engine = FakeEngine::new()
        .call("writeRegister", vec![Value::Number(0.0), Value::Number(9.0)])
        .failing(ScriptError::Thrown("late".to_string()));
    let mut sim = Simulator::with_engine(config, engine);

    let result = sim.execute_code("");
    assert!(!result.success);
    assert_eq!(sim.state().registers.read(0), 0);
    assert_eq!(sim.engine().cancelled, 1);
}
