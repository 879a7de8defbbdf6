//! Property Tests for Peripheral Invariants.

use mcusim_core::common::clock::FixedClock;
use mcusim_core::sim::ChangeNotifier;
use mcusim_core::sim::context::ExecutionContext;
use mcusim_core::soc::McuState;
use mcusim_core::soc::devices::{MotorDirection, PinMode};
use mcusim_core::stats::SimStats;
use mcusim_core::Simulator;
use proptest::prelude::*;

/// Runs `f` against a fresh context over `state`.
fn with_context<R>(state: &mut McuState, f: impl FnOnce(&mut ExecutionContext<'_>) -> R) -> R {
    let mut notifier = ChangeNotifier::new();
    let mut stats = SimStats::default();
    let clock = FixedClock(0);
    let mut context = ExecutionContext::new(state, &mut notifier, &clock, &mut stats);
    f(&mut context)
}

proptest! {
    #[test]
    fn out_of_range_pins_never_touch_the_bank(pin in 24usize..10_000, value: bool) {
        let mut state = McuState::default();
        let before = state.gpio.clone();
        with_context(&mut state, |ctx| {
            ctx.pin_mode(pin, PinMode::Output);
            ctx.digital_write(pin, value);
            prop_assert!(!ctx.digital_read(pin));
            Ok(())
        })?;
        prop_assert_eq!(state.gpio, before);
    }

    #[test]
    fn register_writes_store_low_byte(address in 0u8..=0x0C, value: i64) {
        let mut state = McuState::default();
        with_context(&mut state, |ctx| ctx.write_register(address, value));
        prop_assert_eq!(i64::from(state.registers.read(address)), value & 0xFF);
    }

    #[test]
    fn unknown_register_writes_change_nothing(address in 0x0Du8..=0xFF, value: i64) {
        let mut state = McuState::default();
        let before = state.registers.clone();
        with_context(&mut state, |ctx| ctx.write_register(address, value));
        prop_assert_eq!(state.registers, before);
    }

    #[test]
    fn lcd_rows_keep_their_width(row in 0usize..4, col in -40i64..40, text in "[ -~]{0,40}") {
        let mut state = McuState::default();
        with_context(&mut state, |ctx| ctx.lcd_print(row, col, &text));
        for line in state.lcd.lines() {
            prop_assert_eq!(line.chars().count(), 16);
        }
        prop_assert_eq!(state.lcd.buffer.len(), 2);
    }

    #[test]
    fn motor_speed_stays_in_range(speed: i64) {
        let mut state = McuState::default();
        with_context(&mut state, |ctx| ctx.set_motor(speed, MotorDirection::Ccw));
        prop_assert_eq!(i64::from(state.motor.speed), speed.clamp(0, 255));
    }

    #[test]
    fn temperature_stays_in_sensor_range(deltas in prop::collection::vec(-500.0f64..500.0, 1..20)) {
        let mut sim = Simulator::default();
        for delta in deltas {
            sim.simulate_temperature_change(delta);
            let t = sim.state().temperature.read();
            prop_assert!((-40.0..=125.0).contains(&t), "temperature {} out of range", t);
        }
    }

    #[test]
    fn gpio_stimulus_respects_direction(pin in 0usize..24, output: bool, value: bool) {
        let mut sim = Simulator::default();
        if output {
            sim.execute_code(&format!("pinMode({pin}, 'output');"));
        }
        sim.simulate_gpio_input(pin, value);
        let expected = if output { false } else { value };
        prop_assert_eq!(sim.state().gpio.read(pin), expected);
    }
}
