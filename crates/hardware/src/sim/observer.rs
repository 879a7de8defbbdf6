//! State-change notification.

use std::fmt;

use crate::soc::McuState;

/// Callback invoked synchronously after every state change.
pub type Listener = Box<dyn FnMut(&McuState)>;

/// Holds at most one state-change subscriber.
///
/// Subscribing replaces the previous listener. Notifications with no listener
/// are dropped.
#[derive(Default)]
pub struct ChangeNotifier {
    listener: Option<Listener>,
}

impl ChangeNotifier {
    /// Creates a notifier with no subscriber.
    pub const fn new() -> Self {
        Self { listener: None }
    }

    /// Installs `listener`, replacing any previous one.
    pub fn subscribe(&mut self, listener: impl FnMut(&McuState) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    /// Removes the listener. Returns `true` if one was installed.
    pub fn unsubscribe(&mut self) -> bool {
        self.listener.take().is_some()
    }

    /// Returns `true` if a listener is installed.
    pub const fn has_listener(&self) -> bool {
        self.listener.is_some()
    }

    /// Delivers `state` to the listener, if any.
    pub fn notify(&mut self, state: &McuState) {
        if let Some(listener) = self.listener.as_mut() {
            listener(state);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("has_listener", &self.has_listener())
            .finish()
    }
}
