//! # Cross-platform OS signal watching.
//!
//! [`SignalWatcher::install`] subscribes to the configured signals **synchronously**,
//! so a signal delivered while the coordinator is still being built is buffered by
//! the runtime instead of being lost. [`SignalWatcher::recv`] then resolves with
//! the first signal observed. Dropping the watcher unsubscribes.
//!
//! ## Signals
//! **Unix platforms:** every [`Signal`] variant.
//!
//! **Windows platforms:** only [`Signal::Interrupt`] (Ctrl-C); other variants are ignored.

use std::fmt;
use std::io;

use serde::Deserialize;

/// Termination signals a coordinator can react to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// `SIGINT` (Ctrl-C in terminal).
    Interrupt,
    /// `SIGTERM` (default kill signal, used by systemd/Kubernetes).
    Terminate,
    /// `SIGQUIT`.
    Quit,
    /// `SIGHUP`.
    Hangup,
    /// `SIGUSR1`.
    User1,
    /// `SIGUSR2`.
    User2,
}

impl Signal {
    /// The default set: interrupt + terminate.
    pub const fn defaults() -> &'static [Signal] {
        &[Signal::Interrupt, Signal::Terminate]
    }

    /// Conventional signal name, e.g. `"SIGTERM"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "SIGINT",
            Signal::Terminate => "SIGTERM",
            Signal::Quit => "SIGQUIT",
            Signal::Hangup => "SIGHUP",
            Signal::User1 => "SIGUSR1",
            Signal::User2 => "SIGUSR2",
        }
    }

    #[cfg(unix)]
    fn kind(&self) -> tokio::signal::unix::SignalKind {
        use tokio::signal::unix::SignalKind;

        match self {
            Signal::Interrupt => SignalKind::interrupt(),
            Signal::Terminate => SignalKind::terminate(),
            Signal::Quit => SignalKind::quit(),
            Signal::Hangup => SignalKind::hangup(),
            Signal::User1 => SignalKind::user_defined1(),
            Signal::User2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Active subscription to a set of signals.
pub(crate) struct SignalWatcher {
    #[cfg(unix)]
    streams: Vec<(Signal, tokio::signal::unix::Signal)>,
    #[cfg(windows)]
    ctrl_c: Option<tokio::signal::windows::CtrlC>,
}

impl SignalWatcher {
    /// Registers listeners for every signal in `signals` (duplicates are ignored).
    ///
    /// Must be called inside a tokio runtime.
    #[cfg(unix)]
    pub(crate) fn install(signals: &[Signal]) -> io::Result<Self> {
        let mut streams: Vec<(Signal, tokio::signal::unix::Signal)> = Vec::new();
        for sig in signals {
            if streams.iter().any(|(s, _)| s == sig) {
                continue;
            }
            streams.push((*sig, tokio::signal::unix::signal(sig.kind())?));
        }
        Ok(Self { streams })
    }

    /// Registers a Ctrl-C listener when `signals` contains [`Signal::Interrupt`].
    #[cfg(windows)]
    pub(crate) fn install(signals: &[Signal]) -> io::Result<Self> {
        let ctrl_c = if signals.contains(&Signal::Interrupt) {
            Some(tokio::signal::windows::ctrl_c()?)
        } else {
            None
        };
        Ok(Self { ctrl_c })
    }

    /// Waits for the first delivered signal.
    ///
    /// Never completes if no signal is watched.
    #[cfg(unix)]
    pub(crate) async fn recv(&mut self) -> Signal {
        if self.streams.is_empty() {
            return std::future::pending().await;
        }

        let waits = self.streams.iter_mut().map(|(sig, stream)| {
            Box::pin(async move {
                match stream.recv().await {
                    Some(()) => *sig,
                    // Signal driver is gone; this stream can never fire again.
                    None => std::future::pending().await,
                }
            })
        });
        let (sig, _, _) = futures::future::select_all(waits).await;
        sig
    }

    #[cfg(windows)]
    pub(crate) async fn recv(&mut self) -> Signal {
        match self.ctrl_c.as_mut() {
            Some(ctrl_c) => match ctrl_c.recv().await {
                Some(()) => Signal::Interrupt,
                None => std::future::pending().await,
            },
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Signal::Interrupt.to_string(), "SIGINT");
        assert_eq!(Signal::User2.as_str(), "SIGUSR2");
        assert_eq!(Signal::defaults(), &[Signal::Interrupt, Signal::Terminate]);
    }

    #[test]
    fn test_deserialize_snake_case() {
        let sigs: Vec<Signal> = serde_json::from_str(r#"["terminate","user2"]"#).unwrap();
        assert_eq!(sigs, vec![Signal::Terminate, Signal::User2]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_install_deduplicates() {
        let watcher =
            SignalWatcher::install(&[Signal::Hangup, Signal::Hangup, Signal::Quit]).unwrap();
        assert_eq!(watcher.streams.len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test(start_paused = true)]
    async fn test_empty_watcher_never_fires() {
        let mut watcher = SignalWatcher::install(&[]).unwrap();
        let res =
            tokio::time::timeout(std::time::Duration::from_millis(100), watcher.recv()).await;
        assert!(res.is_err());
    }
}
