use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use hive_core::{Context, Exports};
use hive_event::{DispatchExt, Dispatcher, Event, EventDispatcher, EventKey};

struct Counted;

impl Event for Counted {
    const KEY: EventKey = EventKey::new("test.counted");
}

#[tokio::test]
async fn test_dispatcher_through_exported_capability() {
    let mut exports = Exports::new();
    exports.export::<dyn EventDispatcher>(Arc::new(Dispatcher::new(false)));
    assert_eq!(exports.names(), vec!["hive.event.dispatcher"]);

    let events = exports.get::<dyn EventDispatcher>().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    for _ in 0..3 {
        let hits = hits.clone();
        events
            .listen(move |_ctx, _event: Arc<Counted>| {
                let hits = hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Ok::<(), anyhow::Error>(())
                }
            })
            .unwrap();
    }

    events.dispatch(&Context::background(), Counted).await.unwrap();
    events.dispatch(&Context::background(), Counted).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 6);
}
