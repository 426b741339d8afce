//! In-process, synchronous publish/subscribe event bus.
//!
//! `publish` invokes each synchronous subscriber on the caller's thread,
//! in registration order, before returning — ordering from a single
//! publisher to a single subscriber is therefore preserved, and a
//! blocking synchronous subscriber blocks the publisher (subscribers
//! must be fast, or register as async). There is no persistence and no
//! replay: a subscriber that cares about events missed while absent
//! must query storage on startup.

use crate::event::{Event, LogLevel};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A synchronous subscriber, invoked on the publisher's thread. Must not
/// perform I/O or block — that is the async subscriber's job.
pub trait EventSubscriber: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> EventSubscriber for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Bounded per-subscriber queue for async consumers. When full, the
/// oldest event is dropped to make room and a counter is bumped so the
/// bus can log a warning — a slow consumer degrades gracefully instead
/// of stalling the publisher.
pub struct AsyncSubscription {
    queue: Mutex<VecDeque<Event>>,
    capacity: usize,
    notify: Notify,
    dropped: AtomicU64,
    filter: Option<Box<dyn Fn(&Event) -> bool + Send + Sync>>,
}

impl AsyncSubscription {
    fn new(capacity: usize, filter: Option<Box<dyn Fn(&Event) -> bool + Send + Sync>>) -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(256))),
            capacity,
            notify: Notify::new(),
            dropped: AtomicU64::new(0),
            filter,
        })
    }

    fn push(&self, event: Event) {
        if let Some(filter) = &self.filter {
            if !filter(&event) {
                return;
            }
        }
        let mut queue = self.queue.lock();
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
    }

    /// Number of events dropped due to a full queue since creation.
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Await the next event. Never returns `None` — the subscription
    /// lives as long as the handle does.
    pub async fn recv(&self) -> Event {
        loop {
            if let Some(event) = self.queue.lock().pop_front() {
                return event;
            }
            self.notify.notified().await;
        }
    }
}

enum Subscription {
    Sync(Arc<dyn EventSubscriber>),
    Async(Arc<AsyncSubscription>),
}

/// The bus. Cloning shares the same subscriber registry (cheap `Arc`
/// clone), matching how the crawler, job manager, scheduler, and
/// WebSocket gateway all hold a handle to the same bus instance.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<Subscription>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a synchronous subscriber. Called back on every
    /// `publish`, on the publisher's thread.
    pub fn subscribe_sync(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.lock().push(Subscription::Sync(subscriber));
    }

    /// Register an async subscriber with a bounded queue. Returns a
    /// handle the subscriber's own task uses to `recv()` events.
    pub fn subscribe_async(&self, capacity: usize) -> Arc<AsyncSubscription> {
        self.subscribe_async_filtered(capacity, None)
    }

    /// Same as [`subscribe_async`], but only events for which `filter`
    /// returns `true` are queued — used by the WebSocket gateway so each
    /// client only receives the event kinds it asked for.
    pub fn subscribe_async_filtered(
        &self,
        capacity: usize,
        filter: Option<Box<dyn Fn(&Event) -> bool + Send + Sync>>,
    ) -> Arc<AsyncSubscription> {
        let sub = AsyncSubscription::new(capacity, filter);
        self.subscribers
            .lock()
            .push(Subscription::Async(Arc::clone(&sub)));
        sub
    }

    /// Publish an event to every subscriber, in registration order.
    pub fn publish(&self, event: Event) {
        let subscribers: Vec<_> = {
            let guard = self.subscribers.lock();
            guard
                .iter()
                .map(|s| match s {
                    Subscription::Sync(s) => Subscription::Sync(Arc::clone(s)),
                    Subscription::Async(s) => Subscription::Async(Arc::clone(s)),
                })
                .collect()
        };
        for subscriber in subscribers {
            match subscriber {
                Subscription::Sync(s) => s.on_event(&event),
                Subscription::Async(s) => s.push(event.clone()),
            }
        }
    }

    /// Convenience for publishing a structured log line.
    pub fn log(&self, level: LogLevel, target: impl Into<String>, message: impl Into<String>) {
        self.publish(Event::Log {
            level,
            target: target.into(),
            message: message.into(),
        });
    }

    /// Drop subscriptions whose only remaining owner is this bus (i.e.
    /// the subscriber's task has exited and dropped its handle).
    pub fn prune_dead_async_subscribers(&self) {
        self.subscribers.lock().retain(|s| match s {
            Subscription::Sync(_) => true,
            Subscription::Async(s) => Arc::strong_count(s) > 1,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
