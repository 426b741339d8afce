use super::*;
use crate::document::{DetailLevel, DocumentId, SourceType};
use std::sync::atomic::{AtomicUsize, Ordering};

fn doc_event(n: u64) -> Event {
    Event::DocumentSaved {
        id: DocumentId::new(format!("doc-{n}")),
        source_type: SourceType::Generic,
        source_id: n.to_string(),
        detail_level: DetailLevel::Basic,
    }
}

#[test]
fn sync_subscriber_is_called_in_registration_order() {
    let bus = EventBus::new();
    let order = Arc::new(Mutex::new(Vec::new()));

    let order_a = Arc::clone(&order);
    bus.subscribe_sync(Arc::new(move |_: &Event| order_a.lock().push("a")));
    let order_b = Arc::clone(&order);
    bus.subscribe_sync(Arc::new(move |_: &Event| order_b.lock().push("b")));

    bus.publish(doc_event(1));

    assert_eq!(*order.lock(), vec!["a", "b"]);
}

#[test]
fn sync_subscriber_sees_every_publish() {
    let bus = EventBus::new();
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = Arc::clone(&count);
    bus.subscribe_sync(Arc::new(move |_: &Event| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    }));

    for n in 0..5 {
        bus.publish(doc_event(n));
    }

    assert_eq!(count.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn async_subscriber_receives_published_events() {
    let bus = EventBus::new();
    let sub = bus.subscribe_async(8);

    bus.publish(doc_event(1));
    bus.publish(doc_event(2));

    let first = sub.recv().await;
    let second = sub.recv().await;
    assert_eq!(first.kind(), "document_saved");
    assert_eq!(second.kind(), "document_saved");
}

#[tokio::test]
async fn async_subscriber_drops_oldest_when_queue_full() {
    let bus = EventBus::new();
    let sub = bus.subscribe_async(2);

    bus.publish(doc_event(1));
    bus.publish(doc_event(2));
    bus.publish(doc_event(3));

    assert_eq!(sub.dropped_count(), 1);

    let first = sub.recv().await;
    match first {
        Event::DocumentSaved { source_id, .. } => assert_eq!(source_id, "2"),
        _ => panic!("unexpected event kind"),
    }
}

#[tokio::test]
async fn async_subscriber_filter_excludes_unmatched_kinds() {
    let bus = EventBus::new();
    let sub = bus.subscribe_async_filtered(8, Some(Box::new(|e: &Event| e.kind() == "log")));

    bus.publish(doc_event(1));
    bus.log(LogLevel::Info, "test", "hello");

    let event = sub.recv().await;
    assert_eq!(event.kind(), "log");
}

#[test]
fn prune_dead_async_subscribers_removes_dropped_handles() {
    let bus = EventBus::new();
    {
        let _sub = bus.subscribe_async(4);
        assert_eq!(bus.subscriber_count(), 1);
    }
    bus.prune_dead_async_subscribers();
    assert_eq!(bus.subscriber_count(), 0);
}
