#![forbid(unsafe_code)]

//! Change notification for external renderers.
//!
//! # Design
//!
//! [`ChangeNotifier`] keeps a list of weak subscriber callbacks. After every
//! committed mutation the inventory calls [`ChangeNotifier::notify`], which
//! bumps the revision and invokes every live subscriber in registration
//! order. The signal carries only the revision number; consumers re-pull
//! state through the inventory's query surface.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: holding [`Subscription`] guards forever keeps
//!   callbacks alive. Dropped guards are pruned lazily during `notify()`.
//! - **Re-entrant mutation**: callbacks receive no handle to the inventory,
//!   so they cannot mutate it mid-notification.

use std::sync::{Arc, Weak};

use tracing::{debug, info_span};

type CallbackArc = Arc<dyn Fn(u64) + Send + Sync>;
type CallbackWeak = Weak<dyn Fn(u64) + Send + Sync>;

/// Revision counter plus subscriber list.
///
/// # Invariants
///
/// 1. `revision` increments by exactly 1 per `notify()`.
/// 2. Subscribers are notified in registration order.
/// 3. Dead subscribers (dropped [`Subscription`] guards) are pruned lazily.
#[derive(Default)]
pub struct ChangeNotifier {
    revision: u64,
    subscribers: Vec<CallbackWeak>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("revision", &self.revision)
            .field("subscriber_count", &self.subscribers.len())
            .finish()
    }
}

impl ChangeNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`; it runs with the new revision after each change.
    ///
    /// Dropping the returned guard unsubscribes. Dead entries are pruned
    /// here as well as on notify.
    pub fn subscribe(&mut self, callback: impl Fn(u64) + Send + Sync + 'static) -> Subscription {
        self.subscribers.retain(|weak| weak.strong_count() > 0);
        let strong: CallbackArc = Arc::new(callback);
        self.subscribers.push(Arc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Current revision. Starts at 0 and only ever grows.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Bump the revision and notify live subscribers, pruning dead ones.
    pub fn notify(&mut self) -> u64 {
        self.revision += 1;
        self.subscribers.retain(|w| w.strong_count() > 0);
        let callbacks: Vec<CallbackArc> =
            self.subscribers.iter().filter_map(Weak::upgrade).collect();
        if callbacks.is_empty() {
            return self.revision;
        }

        let _span = info_span!(
            "gridstash.change",
            revision = self.revision,
            subscribers = callbacks.len() as u64
        )
        .entered();
        for cb in &callbacks {
            cb(self.revision);
        }
        debug!(revision = self.revision, "change propagated");
        self.revision
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong `Arc`, so the weak entry in
/// the notifier fails to upgrade on the next notification.
pub struct Subscription {
    _guard: Box<dyn std::any::Any + Send + Sync>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
