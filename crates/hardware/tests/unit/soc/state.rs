//! Aggregate State Tests.

use mcusim_core::config::Config;
use mcusim_core::soc::McuState;
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn default_state_matches_power_on() {
    let state = McuState::default();
    assert!(!state.running);
    assert_eq!(state.frequency, 16_000_000);
    assert_eq!(state.registers.len(), 13);
    assert_eq!(state.gpio.len(), 24);
    assert_eq!(state.timers.len(), 2);
    assert!(state.serial.is_empty());
    assert!(state.lcd.is_blank());
    assert!((state.temperature.read() - 25.0).abs() < f64::EPSILON);
    assert_eq!(state.motor.speed, 0);
}

#[test]
fn state_follows_config() {
    let config = Config::from_json(
        r#"{ "general": { "frequency_hz": 8000000, "initial_temperature": 18.5 },
             "board": { "lcd_width": 20, "lcd_height": 4, "timer_count": 3 } }"#,
    )
    .unwrap();
    let state = McuState::new(&config);
    assert_eq!(state.frequency, 8_000_000);
    assert!((state.temperature.read() - 18.5).abs() < f64::EPSILON);
    assert_eq!(state.lcd.width, 20);
    assert_eq!(state.lcd.height, 4);
    assert_eq!(state.timers.len(), 3);
}

#[test]
fn json_snapshot_shape() {
    let state = McuState::default();
    let value: serde_json::Value = serde_json::from_str(&state.to_json().unwrap()).unwrap();
    let object = value.as_object().unwrap();

    let keys: Vec<&str> = object.keys().map(String::as_str).collect();
    assert_eq!(
        keys,
        vec![
            "running",
            "frequency",
            "registers",
            "gpio",
            "timers",
            "serial",
            "lcd",
            "temperature",
            "motorSpeed",
            "motorDirection",
        ]
    );
    assert_eq!(value["motorDirection"], json!("stop"));
    assert_eq!(value["temperature"], json!(25.0));
    assert_eq!(
        value["gpio"][0],
        json!({ "id": 0, "mode": "input", "state": false, "name": "PA0" })
    );
    assert_eq!(
        value["registers"][3],
        json!({ "name": "DDRA", "address": 3, "value": 0, "description": "Port A data direction register" })
    );
    assert_eq!(
        value["timers"][0],
        json!({ "id": 0, "enabled": false, "counter": 0, "period": 1000, "prescaler": 1 })
    );
    assert_eq!(value["lcd"]["width"], json!(16));
    assert_eq!(value["lcd"]["backlight"], json!(true));
    assert_eq!(value["lcd"]["buffer"][0][0], json!(" "));
}
