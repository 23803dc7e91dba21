//! Event bus - subscription table for platform events

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::traits::EventHandler;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    once: bool,
    handler: Arc<dyn EventHandler>,
}

/// Event name -> ordered handler list.
///
/// A "once" subscription is taken out of the table before its handler runs,
/// so concurrent emits can't fire it twice.
#[derive(Default)]
pub struct EventBus {
    subscriptions: RwLock<HashMap<String, Vec<Subscription>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        event: impl Into<String>,
        handler: Arc<dyn EventHandler>,
        once: bool,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event.into())
            .or_default()
            .push(Subscription { id, once, handler });
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self
            .subscriptions
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut found = false;
        for list in subscriptions.values_mut() {
            let before = list.len();
            list.retain(|s| s.id != id);
            found |= list.len() != before;
        }
        subscriptions.retain(|_, list| !list.is_empty());
        found
    }

    /// Run every handler subscribed to `event`, in subscription order.
    ///
    /// Handler errors are logged and don't stop the remaining handlers.
    /// Returns how many handlers ran.
    pub async fn emit(&self, event: &str, payload: serde_json::Value) -> usize {
        let due: Vec<Subscription> = {
            let mut subscriptions = self
                .subscriptions
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let Some(list) = subscriptions.get_mut(event) else {
                return 0;
            };
            let due = list.clone();
            list.retain(|s| !s.once);
            if list.is_empty() {
                subscriptions.remove(event);
            }
            due
        };

        for subscription in &due {
            if let Err(e) = subscription.handler.run(event, payload.clone()).await {
                tracing::warn!("Event handler for '{}' failed: {}", event, e);
            }
        }
        due.len()
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.subscriptions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event)
            .map(|l| l.len())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::errors::HandlerError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct Counter(Arc<AtomicUsize>);

    #[async_trait]
    impl EventHandler for Counter {
        async fn run(&self, _event: &str, _payload: serde_json::Value) -> Result<(), HandlerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl EventHandler for Failing {
        async fn run(&self, _event: &str, _payload: serde_json::Value) -> Result<(), HandlerError> {
            Err(HandlerError::ExecutionFailed("boom".to_string()))
        }
    }

    #[tokio::test]
    async fn test_once_fires_a_single_time() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe("ready", Arc::new(Counter(hits.clone())), true);

        assert_eq!(bus.emit("ready", serde_json::Value::Null).await, 1);
        assert_eq!(bus.emit("ready", serde_json::Value::Null).await, 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.listener_count("ready"), 0);
    }

    #[tokio::test]
    async fn test_recurring_keeps_firing() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe("member_join", Arc::new(Counter(hits.clone())), false);

        bus.emit("member_join", serde_json::json!({"user": "1"})).await;
        bus.emit("member_join", serde_json::json!({"user": "2"})).await;
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failing_handler_does_not_stop_others() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        bus.subscribe("message", Arc::new(Failing), false);
        bus.subscribe("message", Arc::new(Counter(hits.clone())), false);

        assert_eq!(bus.emit("message", serde_json::Value::Null).await, 2);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let id = bus.subscribe("ready", Arc::new(Counter(hits.clone())), false);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.emit("ready", serde_json::Value::Null).await, 0);
    }
}
