//! Synchronous event delivery to registered sinks.

use std::sync::Arc;

use vasari_core::{EventSink, SessionEvent};

/// Fans session events out to registered sinks as they occur.
///
/// Delivery is synchronous and in registration order; sinks must be cheap.
#[derive(Clone, Default)]
pub struct EventBus {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink.
    pub fn subscribe(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// Deliver one event to every sink.
    pub fn emit(&self, event: SessionEvent) {
        tracing::trace!(event = event.name(), "Emitting session event");
        for sink in &self.sinks {
            sink.emit(&event);
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl EventSink for Recorder {
        fn emit(&self, event: &SessionEvent) {
            self.0.lock().unwrap().push(event.name().to_string());
        }
    }

    #[test]
    fn delivers_to_every_sink_in_order() {
        let first = Arc::new(Recorder::default());
        let second = Arc::new(Recorder::default());
        let mut bus = EventBus::new();
        bus.subscribe(first.clone());
        bus.subscribe(second.clone());
        bus.emit(SessionEvent::SessionSaved { id: "s1".into() });
        assert_eq!(first.0.lock().unwrap().as_slice(), ["session_saved"]);
        assert_eq!(second.0.lock().unwrap().as_slice(), ["session_saved"]);
    }
}
