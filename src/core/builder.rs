use std::io;
use std::sync::Arc;
use std::time::Duration;

use super::closer::Closer;
use super::config::Config;
use super::signals::{Signal, SignalWatcher};
use crate::subscribers::{LogWriter, Subscribe, SubscriberSet};

/// Builder for constructing a [`Closer`] with optional features.
pub struct CloserBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    global: bool,
}

impl CloserBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            global: false,
        }
    }

    /// Replaces the sinks with a single one.
    pub fn with_logger(mut self, logger: Arc<dyn Subscribe>) -> Self {
        self.subscribers = vec![logger];
        self
    }

    /// Sets the event sinks.
    ///
    /// Several sinks are combined into a [`SubscriberSet`]; none means [`LogWriter`].
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Overrides the watched signals (`&[]` = no signal watcher).
    pub fn with_signals(mut self, signals: &[Signal]) -> Self {
        self.cfg.signals = signals.to_vec();
        self
    }

    /// Overrides the deadline used by internally triggered shutdowns.
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.cfg.shutdown_timeout = timeout;
        self
    }

    pub(crate) fn global(mut self) -> Self {
        self.global = true;
        self
    }

    /// Builds the coordinator and starts watching the configured signals.
    ///
    /// Must be called inside a tokio runtime.
    ///
    /// # Errors
    /// Fails if a signal listener cannot be registered.
    pub fn build(self) -> io::Result<Closer> {
        let watcher = if self.cfg.watches_signals() {
            Some(SignalWatcher::install(&self.cfg.signals)?)
        } else {
            None
        };
        Ok(self.finish(watcher))
    }

    /// Like [`build`](Self::build), but falls back to a coordinator without a
    /// signal watcher (after logging a warning) when registration fails.
    pub(crate) fn build_lenient(self) -> Closer {
        let watcher = if self.cfg.watches_signals() {
            match SignalWatcher::install(&self.cfg.signals) {
                Ok(watcher) => Some(watcher),
                Err(error) => {
                    tracing::warn!(%error, "failed to register signal listeners, continuing without them");
                    None
                }
            }
        } else {
            None
        };
        self.finish(watcher)
    }

    fn finish(self, watcher: Option<SignalWatcher>) -> Closer {
        let sink: Arc<dyn Subscribe> = match self.subscribers.len() {
            0 => Arc::new(LogWriter::new()),
            1 => self
                .subscribers
                .into_iter()
                .next()
                .unwrap_or_else(|| Arc::new(LogWriter::new())),
            _ => Arc::new(SubscriberSet::new(self.subscribers)),
        };
        Closer::assemble(self.cfg, sink, self.global, watcher)
    }
}
