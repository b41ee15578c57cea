//! Shared helpers for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::builder::CloserBuilder;
use super::closer::Closer;
use super::config::Config;
use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Sink that keeps every event it sees.
#[derive(Default)]
pub(crate) struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    pub(crate) fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    pub(crate) fn count(&self, kind: EventKind) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }

    pub(crate) fn find(&self, kind: EventKind) -> Option<Event> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.kind == kind)
            .cloned()
    }
}

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, event: &Event) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// Coordinator without signal watching, recording its events.
pub(crate) fn quiet_closer() -> (Closer, Arc<Recorder>) {
    let rec = Arc::new(Recorder::default());
    let closer = CloserBuilder::new(Config::default())
        .with_signals(&[])
        .with_logger(rec.clone())
        .build_lenient();
    (closer, rec)
}
