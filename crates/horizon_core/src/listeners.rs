//! Listener Registry
//!
//! Subscriber lists used by the asset cache and the animation sequencer to
//! publish events. Every subscription returns a [`Subscription`] whose
//! [`unsubscribe`](Subscription::unsubscribe) detaches the listener again.
//!
//! Listeners run synchronously on the emitting task. A panicking listener is
//! caught and logged; it never poisons the emitter or skips the listeners
//! registered after it.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<E> = Arc<dyn Fn(&E) + Send + Sync>;

struct Registry<E> {
    next_id: u64,
    entries: Vec<(u64, Callback<E>)>,
}

/// An ordered list of event listeners for one channel.
pub struct Listeners<E> {
    channel: &'static str,
    registry: Arc<Mutex<Registry<E>>>,
}

impl<E: 'static> Listeners<E> {
    #[must_use]
    pub fn new(channel: &'static str) -> Self {
        Self {
            channel,
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Appends a listener; it is called after every listener added before it.
    pub fn subscribe(&self, listener: impl Fn(&E) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut registry = self.registry.lock();
            let id = registry.next_id;
            registry.next_id += 1;
            registry.entries.push((id, Arc::new(listener)));
            id
        };

        let registry: Weak<Mutex<Registry<E>>> = Arc::downgrade(&self.registry);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry.lock().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Calls every listener with `event` and returns how many of them panicked.
    ///
    /// The registry lock is released before any listener runs, so listeners
    /// may subscribe or unsubscribe from inside the callback.
    pub fn emit(&self, event: &E) -> usize {
        let snapshot: Vec<Callback<E>> = self
            .registry
            .lock()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        let mut panicked = 0;
        for callback in &snapshot {
            if !run_isolated(self.channel, || callback(event)) {
                panicked += 1;
            }
        }
        panicked
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Handle returned by every `on_*` registration.
///
/// Dropping the handle keeps the listener attached; call
/// [`unsubscribe`](Self::unsubscribe) to detach it.
pub struct Subscription {
    detach: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wraps a detach action.
    pub fn new(detach: impl FnOnce() + Send + 'static) -> Self {
        Self {
            detach: Some(Box::new(detach)),
        }
    }

    /// A handle with nothing to detach (the callback already ran).
    #[must_use]
    pub fn noop() -> Self {
        Self { detach: None }
    }

    /// Detaches the listener. Calling this after the emitter is gone is a no-op.
    pub fn unsubscribe(mut self) {
        if let Some(detach) = self.detach.take() {
            detach();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("attached", &self.detach.is_some())
            .finish()
    }
}

/// Runs a callback, catching and logging a panic. Returns `true` on success.
pub fn run_isolated(channel: &str, callback: impl FnOnce()) -> bool {
    match catch_unwind(AssertUnwindSafe(callback)) {
        Ok(()) => true,
        Err(payload) => {
            log::error!(
                "{channel} listener panicked: {}",
                panic_message(payload.as_ref())
            );
            false
        }
    }
}

/// Extracts the message of a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
