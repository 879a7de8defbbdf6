//! GPIO Bank Tests.

use mcusim_core::common::constants::GPIO_PIN_COUNT;
use mcusim_core::soc::devices::{GpioBank, PinMode};
use rstest::rstest;

#[test]
fn bank_has_three_named_ports() {
    let bank = GpioBank::new();
    assert_eq!(bank.len(), GPIO_PIN_COUNT);
    assert_eq!(bank.len(), 24);

    let names: Vec<&str> = bank.iter().map(|pin| pin.name.as_str()).collect();
    assert_eq!(names[0], "PA0");
    assert_eq!(names[7], "PA7");
    assert_eq!(names[8], "PB0");
    assert_eq!(names[23], "PC7");
}

#[test]
fn pins_default_to_low_inputs() {
    let bank = GpioBank::new();
    for (index, pin) in bank.iter().enumerate() {
        assert_eq!(pin.id, index);
        assert_eq!(pin.mode, PinMode::Input);
        assert!(!pin.state);
    }
}

#[test]
fn write_only_lands_on_outputs() {
    let mut bank = GpioBank::new();
    assert!(!bank.write(3, true));
    assert!(!bank.read(3));

    assert!(bank.set_mode(3, PinMode::Output));
    assert!(bank.write(3, true));
    assert!(bank.read(3));
}

#[test]
fn drive_input_only_lands_on_inputs() {
    let mut bank = GpioBank::new();
    assert!(bank.drive_input(5, true));
    assert!(bank.read(5));

    bank.set_mode(6, PinMode::Output);
    assert!(!bank.drive_input(6, true));
    assert!(!bank.read(6));
}

#[rstest]
#[case(24)]
#[case(25)]
#[case(1000)]
#[case(usize::MAX)]
fn out_of_range_pins_are_ignored(#[case] pin: usize) {
    let mut bank = GpioBank::new();
    let before = bank.clone();

    assert!(!bank.set_mode(pin, PinMode::Output));
    assert!(!bank.write(pin, true));
    assert!(!bank.drive_input(pin, true));
    assert!(!bank.read(pin));
    assert!(bank.pin(pin).is_none());
    assert_eq!(bank, before);
}

#[rstest]
#[case("input", Some(PinMode::Input))]
#[case("output", Some(PinMode::Output))]
#[case("OUTPUT", None)]
#[case("in", None)]
#[case("", None)]
fn pin_mode_parsing(#[case] text: &str, #[case] expected: Option<PinMode>) {
    assert_eq!(text.parse::<PinMode>().ok(), expected);
}
