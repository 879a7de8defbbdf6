//! Change Notification Tests.

use std::cell::Cell;
use std::rc::Rc;

use mcusim_core::sim::ChangeNotifier;
use mcusim_core::soc::McuState;
use mcusim_core::Simulator;

#[test]
fn notify_without_listener_is_dropped() {
    let mut notifier = ChangeNotifier::new();
    assert!(!notifier.has_listener());
    notifier.notify(&McuState::default());
}

#[test]
fn subscribe_replaces_previous_listener() {
    let first = Rc::new(Cell::new(0));
    let second = Rc::new(Cell::new(0));

    let mut notifier = ChangeNotifier::new();
    let counter = Rc::clone(&first);
    notifier.subscribe(move |_| counter.set(counter.get() + 1));
    notifier.notify(&McuState::default());

    let counter = Rc::clone(&second);
    notifier.subscribe(move |_| counter.set(counter.get() + 1));
    notifier.notify(&McuState::default());
    notifier.notify(&McuState::default());

    assert_eq!(first.get(), 1);
    assert_eq!(second.get(), 2);
}

#[test]
fn unsubscribe_reports_previous_listener() {
    let mut notifier = ChangeNotifier::new();
    notifier.subscribe(|_| {});
    assert!(notifier.unsubscribe());
    assert!(!notifier.unsubscribe());
}

#[test]
fn every_capability_mutation_notifies_synchronously() {
    let seen = Rc::new(Cell::new(0));
    let mut sim = Simulator::default();
    let counter = Rc::clone(&seen);
    sim.on_state_change(move |_| counter.set(counter.get() + 1));

    let result = sim.execute_code(
        "pinMode(0, 'output');
         digitalWrite(0, true);
         writeRegister(1, 2);
         serialWrite('x');
         lcdClear();
         lcdPrint(0, 0, 'y');
         setMotor(1, 'cw');
         console.log('z');",
    );
    assert!(result.success);
    assert_eq!(seen.get(), 8);
}

#[test]
fn lcd_print_without_visible_change_does_not_notify() {
    let seen = Rc::new(Cell::new(0));
    let mut sim = Simulator::default();
    let counter = Rc::clone(&seen);
    sim.on_state_change(move |_| counter.set(counter.get() + 1));

    let result = sim.execute_code("lcdPrint(0, 0, ''); lcdPrint(0, 16, 'off'); lcdPrint(1, 0, 'ab'); lcdPrint(1, 0, 'ab');");
    assert!(result.success);
    assert_eq!(seen.get(), 1);
}

#[test]
fn reads_do_not_notify() {
    let seen = Rc::new(Cell::new(0));
    let mut sim = Simulator::default();
    let counter = Rc::clone(&seen);
    sim.on_state_change(move |_| counter.set(counter.get() + 1));

    sim.execute_code("digitalRead(0); readRegister(0); readTemperature(); delay(10);");
    assert_eq!(seen.get(), 0);
}

#[test]
fn listener_sees_state_after_the_change() {
    let pins = Rc::new(Cell::new(false));
    let mut sim = Simulator::default();
    let sink = Rc::clone(&pins);
    sim.on_state_change(move |state| sink.set(state.gpio.read(5)));

    sim.simulate_gpio_input(5, true);
    assert!(pins.get());
}

#[test]
fn cleared_listener_stops_receiving() {
    let seen = Rc::new(Cell::new(0));
    let mut sim = Simulator::default();
    let counter = Rc::clone(&seen);
    sim.on_state_change(move |_| counter.set(counter.get() + 1));

    sim.start();
    assert!(sim.clear_listener());
    sim.stop();
    assert_eq!(seen.get(), 1);
    assert_eq!(sim.stats().notifications, 2);
}
