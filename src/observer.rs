//! Observability hook for connection events.
//!
//! A `Connection` reports lifecycle and call events to an injected
//! [`Observer`]. The default [`TracingObserver`] forwards them to `tracing`;
//! the crate itself owns no global logging state.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::Error;

/// A connection event.
#[derive(Debug)]
pub enum Event<'a> {
    Opening,
    Opened,
    OpenFailed { error: &'a Error },
    Closed,
    CloseFailed { error: &'a Error },
    /// The connection was dropped while its session was still open.
    DroppedWhileOpen,
    Ping { ok: bool },
    DescriptionFetched { function: &'a str },
    CallStarted { function: &'a str },
    CallFinished {
        function: &'a str,
        elapsed: Duration,
        ok: bool,
    },
}

/// Receiver of connection events.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: &Event<'_>);
}

impl<F> Observer for F
where
    F: Fn(&Event<'_>) + Send + Sync,
{
    fn on_event(&self, event: &Event<'_>) {
        self(event)
    }
}

/// Forwards events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: &Event<'_>) {
        match event {
            Event::Opening => debug!("Opening RFC connection"),
            Event::Opened => info!("RFC connection opened"),
            Event::OpenFailed { error } => warn!(error = %error, "RFC connection could not be opened"),
            Event::Closed => info!("RFC connection closed"),
            Event::CloseFailed { error } => warn!(error = %error, "RFC connection could not be closed"),
            Event::DroppedWhileOpen => warn!("RFC connection dropped while open, closing"),
            Event::Ping { ok } => debug!(ok, "Ping"),
            Event::DescriptionFetched { function } => {
                debug!(function, "Function description fetched")
            }
            Event::CallStarted { function } => debug!(function, "Calling function"),
            Event::CallFinished {
                function,
                elapsed,
                ok,
            } => debug!(
                function,
                elapsed_ms = elapsed.as_millis() as u64,
                ok,
                "Function call finished"
            ),
        }
    }
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {
    fn on_event(&self, _event: &Event<'_>) {}
}
