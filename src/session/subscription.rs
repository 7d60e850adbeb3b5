// Process-wide single-flight slot for the runtime event subscription

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

struct Active {
    id: u64,
    cancel: watch::Sender<bool>,
}

/// Holds at most one live event subscription across all connections. Starting a new one
/// cancels the previous one, whichever connection owns it.
#[derive(Default)]
pub struct SubscriptionSlot {
    current: Mutex<Option<Active>>,
    next_id: AtomicU64,
}

/// Cancellation side held by a relay task.
pub struct Subscription {
    id: u64,
    cancelled: watch::Receiver<bool>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Resolves once the subscription is cancelled or superseded.
    pub async fn cancelled(&mut self) {
        // A dropped sender also means the slot let go of us.
        let _ = self.cancelled.wait_for(|c| *c).await;
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }
}

impl SubscriptionSlot {
    /// Cancels the current subscription, if any, and installs a new one.
    /// The lock is held only for the swap.
    pub fn start(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (cancel, cancelled) = watch::channel(false);
        let previous = {
            let mut current = self.lock();
            current.replace(Active { id, cancel })
        };
        if let Some(previous) = previous {
            tracing::debug!(subscription = previous.id, "Superseding event subscription");
            previous.cancel.send_replace(true);
        }
        Subscription { id, cancelled }
    }

    /// Empties the slot if it still holds `id`. Called by a relay when it stops on its own.
    pub fn release(&self, id: u64) {
        let mut current = self.lock();
        if current.as_ref().is_some_and(|a| a.id == id) {
            *current = None;
        }
    }

    /// Cancels whatever subscription is active. Idempotent and non-blocking.
    pub fn cancel_current(&self) {
        let previous = self.lock().take();
        if let Some(previous) = previous {
            previous.cancel.send_replace(true);
        }
    }

    pub fn active_id(&self) -> Option<u64> {
        self.lock().as_ref().map(|a| a.id)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Active>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
