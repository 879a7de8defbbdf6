//! Serial Log Tests.

use mcusim_core::soc::devices::{Direction, SerialLog};

fn log_with(n: usize) -> SerialLog {
    let mut log = SerialLog::new();
    for i in 0..n {
        log.push(i as u64, Direction::Tx, format!("line {i}"));
    }
    log
}

#[test]
fn entries_keep_insertion_order() {
    let mut log = SerialLog::new();
    log.push(10, Direction::Tx, "hello");
    log.push(20, Direction::Rx, "world");

    let entries = log.entries();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].data, "hello");
    assert_eq!(entries[0].direction, Direction::Tx);
    assert_eq!(entries[1].timestamp, 20);
    assert_eq!(entries[1].direction, Direction::Rx);
    assert_eq!(log.last().map(|e| e.data.as_str()), Some("world"));
}

#[test]
fn recent_returns_trailing_window() {
    let log = log_with(30);
    let recent = log.recent(20);
    assert_eq!(recent.len(), 20);
    assert_eq!(recent[0].data, "line 10");
    assert_eq!(recent[19].data, "line 29");
}

#[test]
fn recent_larger_than_log() {
    let log = log_with(3);
    assert_eq!(log.recent(20).len(), 3);
    assert!(log.recent(0).is_empty());
    assert!(SerialLog::new().recent(5).is_empty());
}

#[test]
fn log_is_unbounded() {
    let log = log_with(5_000);
    assert_eq!(log.len(), 5_000);
}
