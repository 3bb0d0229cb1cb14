//! Interface to the underlying RFC runtime.
//!
//! The runtime performs the actual transport, session handling and
//! metadata retrieval. A `Connection` talks to it only through
//! [`RfcRuntime`] and [`RfcSession`].

pub mod loopback;

use std::fmt;
use std::sync::Arc;

use crate::error::{ErrorInfo, Result};
use crate::observer::{Event, Observer};
use crate::params::{ConnectionAttributes, ConnectionParameters};
use crate::protocol::container::FunctionContainer;
use crate::protocol::types::{Encoding, FunctionDescription};

/// Entry point of an RFC runtime.
pub trait RfcRuntime: Send + Sync {
    /// Open a session with the given parameters.
    fn open(
        &self,
        params: &ConnectionParameters,
    ) -> std::result::Result<Box<dyn RfcSession>, ErrorInfo>;
}

/// One open session handle.
///
/// Handles are not safe for concurrent use; every method takes `&mut self`.
pub trait RfcSession: Send {
    /// Character width of fixed-length text on this session.
    fn encoding(&self) -> Encoding;

    /// Release the handle. Called at most once.
    fn close(&mut self) -> std::result::Result<(), ErrorInfo>;

    fn ping(&mut self) -> std::result::Result<(), ErrorInfo>;

    fn attributes(&mut self) -> std::result::Result<ConnectionAttributes, ErrorInfo>;

    /// Metadata of a remote function, with all nested types resolved.
    fn function_description(
        &mut self,
        name: &str,
    ) -> std::result::Result<FunctionDescription, ErrorInfo>;

    /// Create an initialized call container for `description`.
    fn create_function(&mut self, description: Arc<FunctionDescription>) -> Result<FunctionContainer> {
        FunctionContainer::new(description, self.encoding())
    }

    /// Execute the call; output parameters are written into `container`.
    fn invoke(&mut self, container: &mut FunctionContainer) -> std::result::Result<(), ErrorInfo>;
}

/// Owns an open session and releases it exactly once.
///
/// `close` consumes the guard. A guard dropped while still holding its
/// session closes it and reports `Event::DroppedWhileOpen`.
pub struct SessionGuard {
    session: Option<Box<dyn RfcSession>>,
    observer: Arc<dyn Observer>,
}

impl SessionGuard {
    pub fn new(session: Box<dyn RfcSession>, observer: Arc<dyn Observer>) -> Self {
        Self {
            session: Some(session),
            observer,
        }
    }

    /// Borrow the session. `None` only after the session has been released.
    pub fn session(&mut self) -> Option<&mut (dyn RfcSession + 'static)> {
        self.session.as_deref_mut()
    }

    /// Close the session.
    pub fn close(mut self) -> std::result::Result<(), ErrorInfo> {
        match self.session.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionGuard")
            .field("open", &self.session.is_some())
            .finish()
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(mut session) = self.session.take() {
            self.observer.on_event(&Event::DroppedWhileOpen);
            // Nothing to report to; the session is gone either way.
            let _ = session.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NoopObserver;
    use crate::runtime::loopback::LoopbackRuntime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_guard_close_releases_once() {
        let runtime = LoopbackRuntime::new();
        let session = runtime.open(&ConnectionParameters::new()).unwrap();
        assert_eq!(runtime.open_sessions(), 1);

        let guard = SessionGuard::new(session, Arc::new(NoopObserver));
        guard.close().unwrap();
        assert_eq!(runtime.open_sessions(), 0);
    }

    #[test]
    fn test_guard_drop_closes_and_reports() {
        let runtime = LoopbackRuntime::new();
        let dropped = Arc::new(AtomicUsize::new(0));
        let counter = dropped.clone();
        let observer = move |event: &Event<'_>| {
            if matches!(event, Event::DroppedWhileOpen) {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        };

        {
            let session = runtime.open(&ConnectionParameters::new()).unwrap();
            let mut guard = SessionGuard::new(session, Arc::new(observer));
            assert!(guard.session().is_some());
        }
        assert_eq!(runtime.open_sessions(), 0);
        assert_eq!(dropped.load(Ordering::SeqCst), 1);
    }
}
