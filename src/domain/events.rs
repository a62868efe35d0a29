use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Payload delivered to table subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub table: String,
    #[serde(rename = "eventType")]
    pub event_type: ChangeKind,
    pub record: Value,
}

pub type ChangeCallback = Arc<dyn Fn(ChangeEvent) + Send + Sync>;

/// Liveness flag shared between a [`Subscription`] and whatever delivers its events.
#[derive(Debug)]
pub struct SubscriptionState {
    active: AtomicBool,
}

impl SubscriptionState {
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Invokes `callback` unless the subscription has been released.
    pub fn deliver(&self, callback: &ChangeCallback, event: ChangeEvent) -> bool {
        if !self.is_active() {
            return false;
        }
        callback(event);
        true
    }
}

/// Handle returned by `subscribe_to_table`.
///
/// `unsubscribe` may be called any number of times; after the first call no new
/// callback invocation starts. Dropping the handle unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes immediately"]
#[derive(Debug)]
pub struct Subscription {
    table: String,
    state: Arc<SubscriptionState>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Subscription {
    /// A subscription with no change source behind it.
    pub fn inert(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            state: Arc::new(SubscriptionState {
                active: AtomicBool::new(true),
            }),
            task: Mutex::new(None),
        }
    }

    /// Spawns the listener built by `listener` and ties its lifetime to the handle.
    pub fn spawn<F, Fut>(table: impl Into<String>, listener: F) -> Self
    where
        F: FnOnce(Arc<SubscriptionState>) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let subscription = Self::inert(table);
        let handle = tokio::spawn(listener(subscription.state.clone()));
        if let Ok(mut task) = subscription.task.lock() {
            *task = Some(handle);
        }
        subscription
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn unsubscribe(&self) {
        if !self.state.active.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
        tracing::debug!(table = %self.table, "subscription released");
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
