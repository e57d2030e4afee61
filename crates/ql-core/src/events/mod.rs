use std::sync::Arc;
use parking_lot::Mutex;
use ahash::AHashMap;

/// Type-keyed event bus connecting the engine to the shell
///
/// Clones share the same handler table.
#[derive(Clone)]
pub struct EventBus {
    handlers: Arc<Mutex<AHashMap<std::any::TypeId, Vec<SharedHandler>>>>,
}

type SharedHandler = Arc<Mutex<Box<dyn EventHandler>>>;

/// Event trait that all events must implement
pub trait Event: Send + Sync + 'static {
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Handler trait for event handlers
pub trait EventHandler: Send + Sync {
    fn handle(&mut self, event: &dyn Event);
}

/// Result lifecycle events
pub mod events {
    use super::Event;

    /// A query answered and its visuals replaced the displayed result
    #[derive(Debug, Clone)]
    pub struct ResultLoaded {
        pub question: String,
        pub visual_count: usize,
        pub row_count: usize,
    }

    /// A query failed; the previous result stays on screen
    #[derive(Debug, Clone)]
    pub struct QueryFailed {
        pub question: String,
        pub error: String,
    }

    /// An export adapter ran
    #[derive(Debug, Clone)]
    pub struct ExportFinished {
        pub artifact: String,
        /// `None` when the export was skipped (nothing to write)
        pub path: Option<std::path::PathBuf>,
        pub error: Option<String>,
    }

    macro_rules! impl_event {
        ($($t:ty),*) => {
            $(
                impl Event for $t {
                    fn as_any(&self) -> &dyn std::any::Any {
                        self
                    }
                }
            )*
        }
    }

    impl_event!(ResultLoaded, QueryFailed, ExportFinished);
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(AHashMap::new())),
        }
    }

    /// Subscribe to events of a specific type
    pub fn subscribe<E: Event>(&self, handler: Box<dyn EventHandler>) {
        let type_id = std::any::TypeId::of::<E>();
        let mut handlers = self.handlers.lock();
        handlers.entry(type_id).or_default().push(Arc::new(Mutex::new(handler)));
    }

    /// Publish an event to every handler subscribed to its type.
    ///
    /// Handlers run after the handler table is unlocked, so they may publish
    /// or subscribe themselves. A handler must not publish the event type it
    /// is handling.
    pub fn publish<E: Event>(&self, event: E) {
        let type_id = std::any::TypeId::of::<E>();
        let event_handlers = match self.handlers.lock().get(&type_id) {
            Some(handlers) => handlers.clone(),
            None => return,
        };

        for handler in event_handlers {
            handler.lock().handle(&event);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper struct for creating event handlers from closures
pub struct ClosureEventHandler<F> {
    handler: F,
}

impl<F> EventHandler for ClosureEventHandler<F>
where
    F: FnMut(&dyn Event) + Send + Sync,
{
    fn handle(&mut self, event: &dyn Event) {
        (self.handler)(event);
    }
}

/// Create an event handler from a closure
pub fn handler_from_fn<F>(f: F) -> Box<dyn EventHandler>
where
    F: FnMut(&dyn Event) + Send + Sync + 'static,
{
    Box::new(ClosureEventHandler { handler: f })
}

#[cfg(test)]
mod tests {
    use super::events::{QueryFailed, ResultLoaded};
    use super::*;

    #[test]
    fn test_handlers_only_see_their_event_type() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        bus.subscribe::<ResultLoaded>(handler_from_fn(move |event| {
            if let Some(loaded) = event.as_any().downcast_ref::<ResultLoaded>() {
                sink.lock().push(loaded.question.clone());
            }
        }));

        bus.publish(ResultLoaded {
            question: "aylık satışlar".into(),
            visual_count: 2,
            row_count: 3,
        });
        bus.publish(QueryFailed {
            question: "x".into(),
            error: "boom".into(),
        });

        assert_eq!(*seen.lock(), vec!["aylık satışlar".to_string()]);
    }

    #[test]
    fn test_handlers_can_publish() {
        let bus = EventBus::new();
        let errors = Arc::new(Mutex::new(Vec::new()));

        let relay = bus.clone();
        bus.subscribe::<ResultLoaded>(handler_from_fn(move |event| {
            if let Some(loaded) = event.as_any().downcast_ref::<ResultLoaded>() {
                if loaded.row_count == 0 {
                    relay.publish(QueryFailed {
                        question: loaded.question.clone(),
                        error: "no rows".into(),
                    });
                }
            }
        }));

        let sink = errors.clone();
        bus.subscribe::<QueryFailed>(handler_from_fn(move |event| {
            if let Some(failed) = event.as_any().downcast_ref::<QueryFailed>() {
                sink.lock().push(failed.error.clone());
            }
        }));

        bus.publish(ResultLoaded {
            question: "boş sonuç".into(),
            visual_count: 1,
            row_count: 0,
        });

        assert_eq!(*errors.lock(), vec!["no rows".to_string()]);
    }
}
