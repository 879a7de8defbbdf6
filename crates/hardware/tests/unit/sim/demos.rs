//! Bundled Demo Tests.
//!
//! Each demo runs its top level, then the loop is driven for a while.

use mcusim_core::soc::devices::MotorDirection;
use serde_json::Value as Json;

use crate::common::harness::TestContext;

const LED_BLINK: &str = include_str!("../../../../../demos/led_blink.js");
const TEMPERATURE_MONITOR: &str = include_str!("../../../../../demos/temperature_monitor.js");
const MOTOR_CONTROL: &str = include_str!("../../../../../demos/motor_control.js");
const LCD_DISPLAY: &str = include_str!("../../../../../demos/lcd_display.js");
const SERIAL_TELEMETRY: &str = include_str!("../../../../../demos/serial_telemetry.js");

fn started(source: &str) -> TestContext {
    let mut ctx = TestContext::new();
    ctx.run_ok(source);
    ctx.sim.start();
    ctx
}

#[test]
fn led_blink_toggles_every_500ms() {
    let mut ctx = started(LED_BLINK);
    assert!(!ctx.state().gpio.read(0));

    ctx.sim.tick(500).unwrap();
    assert!(ctx.state().gpio.read(0));
    ctx.sim.tick(500).unwrap();
    assert!(!ctx.state().gpio.read(0));
    assert_eq!(ctx.serial_lines(), vec!["LED on", "LED off"]);
}

#[test]
fn temperature_monitor_shows_reading_and_alarms() {
    let mut ctx = started(TEMPERATURE_MONITOR);
    assert_eq!(ctx.state().lcd.row_text(0).as_deref(), Some("Temperature:    "));
    assert_eq!(ctx.state().lcd.row_text(1).as_deref(), Some("25.0 C          "));
    assert!(!ctx.state().gpio.read(0));

    ctx.sim.simulate_temperature_change(7.25);
    ctx.sim.tick(1000).unwrap();
    assert_eq!(ctx.state().lcd.row_text(1).as_deref(), Some("32.3 C          "));
    assert!(ctx.state().gpio.read(0));
    assert!(ctx.serial_lines().contains(&"Warning: temperature too high!".to_string()));
}

#[test]
fn motor_control_ramps_and_reverses() {
    let mut ctx = started(MOTOR_CONTROL);
    ctx.sim.tick(20).unwrap();
    assert_eq!(ctx.state().motor.speed, 5);
    assert_eq!(ctx.state().motor.direction, MotorDirection::Cw);

    // 51 steps up to 255, 51 down to 0, then the direction flips.
    ctx.sim.tick(20 * 101).unwrap();
    assert_eq!(ctx.state().motor.speed, 0);
    assert_eq!(ctx.state().motor.direction, MotorDirection::Ccw);
    assert!(!ctx.state().gpio.read(1));
    assert!(ctx.serial_lines().contains(&"Direction: ccw".to_string()));
}

#[test]
fn lcd_display_scrolls_and_counts() {
    let mut ctx = started(LCD_DISPLAY);
    ctx.sim.tick(200).unwrap();
    assert_eq!(ctx.state().lcd.row_text(0).as_deref(), Some("Hello MCU Simula"));
    assert_eq!(ctx.state().lcd.row_text(1).as_deref(), Some("Time: 00:00     "));

    ctx.sim.tick(200).unwrap();
    assert_eq!(ctx.state().lcd.row_text(0).as_deref(), Some("ello MCU Simulat"));

    ctx.sim.tick(200 * 298).unwrap();
    assert_eq!(ctx.state().lcd.row_text(1).as_deref(), Some("Time: 01:00     "));
}

#[test]
fn serial_telemetry_sends_json_packets() {
    let mut ctx = started(SERIAL_TELEMETRY);
    ctx.sim.simulate_gpio_input(1, true);
    ctx.sim.tick(2000).unwrap();

    let packets: Vec<Json> = ctx
        .serial_lines()
        .iter()
        .filter(|line| line.starts_with('{'))
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(packets.len(), 2);
    assert_eq!(packets[1]["packet"], serde_json::json!(2));
    assert_eq!(packets[1]["temperature"], serde_json::json!("25.00"));
    assert_eq!(packets[1]["gpio"], serde_json::json!([0, 1]));
    assert!(!ctx.state().gpio.read(2));
}
