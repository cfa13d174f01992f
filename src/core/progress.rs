//! Progress reporting and cooperative cancellation for long-running operations.
//!
//! Workers never call into observers directly: a [`ChannelProgress`] pushes
//! [`ProgressEvent`]s onto an unbounded channel and whoever holds the receiver
//! renders them.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A cheaply clonable cancellation flag shared between a worker and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A single progress message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ProgressEvent {
    Report {
        status: String,
        percent: Option<f64>,
    },
    Clear,
}

/// Receives progress from a worker and exposes the worker's cancellation signal.
pub trait ProgressSink: Send + Sync {
    fn report(&self, status: &str, percent: Option<f64>);

    fn clear(&self);

    fn cancellation(&self) -> &CancellationToken;

    fn is_cancelled(&self) -> bool {
        self.cancellation().is_cancelled()
    }
}

/// The production sink: forwards every event over an mpsc channel.
pub struct ChannelProgress {
    sender: mpsc::UnboundedSender<ProgressEvent>,
    cancel: CancellationToken,
}

impl ChannelProgress {
    /// Creates a sink together with the receiving end of its channel.
    pub fn new(cancel: CancellationToken) -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, cancel }, receiver)
    }
}

impl ProgressSink for ChannelProgress {
    fn report(&self, status: &str, percent: Option<f64>) {
        if self.cancel.is_cancelled() {
            return;
        }
        // A dropped receiver just means nobody is watching anymore.
        if self
            .sender
            .send(ProgressEvent::Report {
                status: status.to_string(),
                percent,
            })
            .is_err()
        {
            tracing::debug!("Progress receiver dropped, discarding: {}", status);
        }
    }

    fn clear(&self) {
        if self.sender.send(ProgressEvent::Clear).is_err() {
            tracing::debug!("Progress receiver dropped, discarding clear");
        }
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_progress_forwards_events_in_order() {
        let (sink, mut rx) = ChannelProgress::new(CancellationToken::new());
        sink.report("one", Some(10.0));
        sink.report("two", None);
        sink.clear();

        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::Report {
                status: "one".into(),
                percent: Some(10.0)
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            ProgressEvent::Report {
                status: "two".into(),
                percent: None
            }
        );
        assert_eq!(rx.try_recv().unwrap(), ProgressEvent::Clear);
    }

    #[test]
    fn reports_are_suppressed_after_cancellation() {
        let cancel = CancellationToken::new();
        let (sink, mut rx) = ChannelProgress::new(cancel.clone());
        cancel.cancel();
        sink.report("late", None);
        assert!(sink.is_cancelled());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_tolerated_by_report_and_clear() {
        crate::utils::test_helpers::setup_test_logging();
        let (sink, rx) = ChannelProgress::new(CancellationToken::new());
        drop(rx);
        sink.report("nobody listens", Some(50.0));
        sink.clear();
        assert!(!sink.is_cancelled());
    }
}
