//! Character LCD Tests.

use mcusim_core::soc::devices::Lcd;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn new_display_is_blank() {
    let lcd = Lcd::new(16, 2, true);
    assert!(lcd.is_blank());
    assert_eq!(lcd.buffer.len(), 2);
    assert!(lcd.buffer.iter().all(|row| row.len() == 16));
    assert!(lcd.backlight);
}

#[rstest]
#[case(0, "HELLO", "HELLO           ", true)]
#[case(14, "HELLO", "              HE", true)]
#[case(-2, "HELLO", "LLO             ", true)]
#[case(16, "HELLO", "                ", false)]
#[case(-10, "HI", "                ", false)]
#[case(0, "", "                ", false)]
fn print_clips_per_character(
    #[case] col: i64,
    #[case] text: &str,
    #[case] expected: &str,
    #[case] changed: bool,
) {
    let mut lcd = Lcd::new(16, 2, true);
    assert_eq!(lcd.print(0, col, text), changed);
    assert_eq!(lcd.row_text(0).as_deref(), Some(expected));
    assert_eq!(lcd.row_text(1).as_deref(), Some("                "));
}

#[test]
fn print_to_missing_row_is_ignored() {
    let mut lcd = Lcd::new(16, 2, true);
    let before = lcd.clone();
    assert!(!lcd.print(2, 0, "X"));
    assert_eq!(lcd, before);
}

#[test]
fn reprinting_same_text_reports_no_change() {
    let mut lcd = Lcd::new(16, 2, true);
    assert!(lcd.print(1, 0, "Time: 00:01"));
    assert!(!lcd.print(1, 0, "Time: 00:01"));
    assert!(lcd.print(1, 0, "Time: 00:02"));
}

#[test]
fn clear_after_prints_is_all_spaces() {
    let mut lcd = Lcd::new(16, 2, true);
    lcd.clear();
    lcd.print(0, 0, "Temperature:");
    lcd.print(1, 3, "25.0 C");
    assert!(!lcd.is_blank());
    lcd.clear();
    assert!(lcd.is_blank());
    assert_eq!(lcd.lines(), vec![" ".repeat(16), " ".repeat(16)]);
}

#[test]
fn custom_geometry() {
    let mut lcd = Lcd::new(20, 4, false);
    lcd.print(3, 18, "abc");
    assert_eq!(lcd.row_text(3).as_deref(), Some("                  ab"));
    assert!(!lcd.backlight);
}
