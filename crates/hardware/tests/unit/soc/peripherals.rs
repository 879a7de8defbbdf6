//! Motor Driver, Temperature Sensor and Timer Tests.

use mcusim_core::soc::devices::{Motor, MotorDirection, TemperatureSensor, Timer};
use rstest::rstest;

#[rstest]
#[case(300, 255)]
#[case(255, 255)]
#[case(128, 128)]
#[case(0, 0)]
#[case(-5, 0)]
#[case(i64::MIN, 0)]
fn motor_speed_is_clamped(#[case] requested: i64, #[case] stored: u8) {
    let mut motor = Motor::default();
    motor.set(requested, MotorDirection::Cw);
    assert_eq!(motor.speed, stored);
    assert_eq!(motor.direction, MotorDirection::Cw);
}

#[test]
fn motor_defaults_to_stopped() {
    let motor = Motor::default();
    assert_eq!(motor.speed, 0);
    assert_eq!(motor.direction, MotorDirection::Stop);
}

#[rstest]
#[case("cw", Some(MotorDirection::Cw))]
#[case("ccw", Some(MotorDirection::Ccw))]
#[case("stop", Some(MotorDirection::Stop))]
#[case("left", None)]
fn motor_direction_parsing(#[case] text: &str, #[case] expected: Option<MotorDirection>) {
    assert_eq!(text.parse::<MotorDirection>().ok(), expected);
}

#[test]
fn sensor_drift_is_clamped() {
    let mut sensor = TemperatureSensor::new(25.0, -40.0, 125.0);
    sensor.drift(200.0);
    assert!((sensor.read() - 125.0).abs() < f64::EPSILON);
    sensor.drift(-1000.0);
    assert!((sensor.read() + 40.0).abs() < f64::EPSILON);
}

#[test]
fn sensor_ignores_non_finite_drift() {
    let mut sensor = TemperatureSensor::new(25.0, -40.0, 125.0);
    sensor.drift(f64::NAN);
    sensor.drift(f64::INFINITY);
    assert!((sensor.read() - 25.0).abs() < f64::EPSILON);
}

#[test]
fn sensor_with_inverted_range_does_not_panic() {
    let mut sensor = TemperatureSensor::new(25.0, 100.0, 0.0);
    sensor.drift(1.0);
    assert!((sensor.read() - 0.0).abs() < f64::EPSILON);
}

#[test]
fn timers_start_disabled() {
    let timer = Timer::new(1, 1000, 1);
    assert_eq!(timer.id, 1);
    assert!(!timer.enabled);
    assert_eq!(timer.counter, 0);
    assert_eq!(timer.period, 1000);
    assert_eq!(timer.prescaler, 1);
}
