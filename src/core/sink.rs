//! # Swappable logging sink slot.
//!
//! The coordinator's sink may be replaced at any time while cleanups and tasks
//! keep a handle to the slot, so every emitter resolves the sink at emit time.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, PoisonError, RwLock};

use futures::FutureExt;

use crate::error::panic_message;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Shared, replaceable reference to the current sink.
pub(crate) struct SinkSlot {
    current: RwLock<Arc<dyn Subscribe>>,
    global: bool,
}

impl SinkSlot {
    pub(crate) fn new(sink: Arc<dyn Subscribe>, global: bool) -> Arc<Self> {
        Arc::new(Self {
            current: RwLock::new(sink),
            global,
        })
    }

    pub(crate) fn get(&self) -> Arc<dyn Subscribe> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub(crate) fn set(&self, sink: Arc<dyn Subscribe>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = sink;
    }

    /// Stamps the event with the coordinator flavour and hands it to the current sink.
    ///
    /// The lock is released before the sink runs. A panicking sink loses the
    /// event; the emitter carries on.
    pub(crate) async fn emit(&self, event: Event) {
        let sink = self.get();
        let event = event.with_global(self.global);
        if let Err(panic_err) = AssertUnwindSafe(sink.on_event(&event)).catch_unwind().await {
            tracing::error!(
                sink = sink.name(),
                kind = ?event.kind,
                panic = %panic_message(&*panic_err),
                "panic recovered in log subscriber"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::core::builder::CloserBuilder;
    use crate::core::config::Config;
    use crate::events::EventKind;

    struct Exploding;

    #[async_trait]
    impl Subscribe for Exploding {
        async fn on_event(&self, _event: &Event) {
            panic!("sink exploded");
        }
    }

    #[tokio::test]
    async fn test_panicking_sink_is_contained() {
        let slot = SinkSlot::new(Arc::new(Exploding), false);
        slot.emit(Event::new(EventKind::NothingToClose)).await;
        slot.emit(Event::new(EventKind::ShutdownCompleted)).await;
    }

    #[tokio::test]
    async fn test_single_panicking_sink_does_not_skip_cleanups() {
        let closer = CloserBuilder::new(Config::default())
            .with_signals(&[])
            .with_logger(Arc::new(Exploding))
            .build()
            .unwrap();
        let runs = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        for _ in 0..3 {
            let runs = runs.clone();
            closer.to_close(move |_| async move {
                runs.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(())
            });
        }

        assert_eq!(closer.close(Duration::from_secs(1)).await, Ok(()));
        assert_eq!(runs.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}
