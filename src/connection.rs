//! High-level Connection API.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::marshal::{fill_function, wrap_result, CallResult, ParameterSource};
use crate::observer::{Event, Observer, TracingObserver};
use crate::params::{ConnectionAttributes, ConnectionOptions, ConnectionParameters};
use crate::protocol::types::FunctionDescription;
use crate::runtime::{RfcRuntime, RfcSession, SessionGuard};

/// A client connection to an RFC server.
///
/// A connection is either Closed or Open. It starts Closed unless built with
/// [`Connection::from_params`] or [`Connection::from_dest`]. `ping`,
/// `function_description` and `connection_attributes` open a Closed
/// connection implicitly; `call` does not.
///
/// Dropping an Open connection releases its session.
pub struct Connection {
    runtime: Arc<dyn RfcRuntime>,
    params: ConnectionParameters,
    options: ConnectionOptions,
    observer: Arc<dyn Observer>,
    session: Option<SessionGuard>,
}

impl Connection {
    /// Create a Closed connection.
    pub fn new<R: RfcRuntime + 'static>(runtime: R, params: ConnectionParameters) -> Self {
        Self {
            runtime: Arc::new(runtime),
            params,
            options: ConnectionOptions::default(),
            observer: Arc::new(TracingObserver),
            session: None,
        }
    }

    /// Create a connection and open it.
    ///
    /// # Example
    ///
    /// ```
    /// use sap_rfc_rs::{Connection, ConnectionParameters, LoopbackRuntime};
    ///
    /// let params = ConnectionParameters::new()
    ///     .with("ashost", "10.0.0.1")
    ///     .with("sysnr", "00")
    ///     .with("client", "100")
    ///     .with("user", "demo");
    /// let conn = Connection::from_params(LoopbackRuntime::with_test_functions(), params)?;
    /// assert!(conn.alive());
    /// # Ok::<(), sap_rfc_rs::Error>(())
    /// ```
    pub fn from_params<R: RfcRuntime + 'static>(
        runtime: R,
        params: ConnectionParameters,
    ) -> Result<Self> {
        let mut conn = Self::new(runtime, params);
        conn.open()?;
        Ok(conn)
    }

    /// Create a connection to a configured destination and open it.
    pub fn from_dest<R: RfcRuntime + 'static>(runtime: R, dest: &str) -> Result<Self> {
        Self::from_params(runtime, ConnectionParameters::from_dest(dest))
    }

    /// Remove trailing blanks from text results (default: true).
    pub fn with_rstrip(mut self, rstrip: bool) -> Self {
        self.options.rstrip = rstrip;
        self
    }

    /// Include import parameters in call results (default: false).
    pub fn with_return_import_params(mut self, return_import_params: bool) -> Self {
        self.options.return_import_params = return_import_params;
        self
    }

    /// Replace all call options at once.
    pub fn with_options(mut self, options: ConnectionOptions) -> Self {
        self.options = options;
        self
    }

    /// Receive lifecycle and call events. Replaces the default `TracingObserver`.
    pub fn with_observer<O: Observer + 'static>(mut self, observer: O) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Change the right-strip policy for subsequent calls.
    pub fn set_rstrip(&mut self, rstrip: bool) {
        self.options.rstrip = rstrip;
    }

    /// Change whether subsequent call results include import parameters.
    pub fn set_return_import_params(&mut self, return_import_params: bool) {
        self.options.return_import_params = return_import_params;
    }

    /// Current call options.
    pub fn options(&self) -> ConnectionOptions {
        self.options
    }

    /// Parameters used to open the connection.
    pub fn parameters(&self) -> &ConnectionParameters {
        &self.params
    }

    /// Whether the connection is Open. Performs no I/O.
    pub fn alive(&self) -> bool {
        self.session.is_some()
    }

    /// Open the connection. Does nothing if it is already Open.
    pub fn open(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Ok(());
        }
        self.observer.on_event(&Event::Opening);
        match self.runtime.open(&self.params) {
            Ok(session) => {
                self.session = Some(SessionGuard::new(session, self.observer.clone()));
                self.observer.on_event(&Event::Opened);
                Ok(())
            }
            Err(info) => {
                let error = Error::rfc("Connection could not be opened", info);
                self.observer.on_event(&Event::OpenFailed { error: &error });
                Err(error)
            }
        }
    }

    /// Close the connection. Does nothing if it is already Closed.
    ///
    /// The connection is Closed afterwards even if the runtime reports a
    /// failure.
    pub fn close(&mut self) -> Result<()> {
        let Some(guard) = self.session.take() else {
            return Ok(());
        };
        match guard.close() {
            Ok(()) => {
                self.observer.on_event(&Event::Closed);
                Ok(())
            }
            Err(info) => {
                let error = Error::rfc("Connection could not be closed", info);
                self.observer.on_event(&Event::CloseFailed { error: &error });
                Err(error)
            }
        }
    }

    /// Close and open again.
    ///
    /// Open is attempted even if close fails. When both fail the error
    /// carries both failures.
    pub fn reopen(&mut self) -> Result<()> {
        let closed = self.close();
        let opened = self.open();
        match (closed, opened) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(error), Ok(())) | (Ok(()), Err(error)) => Err(error),
            (Err(close), Err(open)) => Err(Error::Reopen {
                close: Box::new(close),
                open: Box::new(open),
            }),
        }
    }

    /// Check that the server answers. Opens the connection if needed.
    pub fn ping(&mut self) -> Result<()> {
        self.ensure_open()?;
        let result = self
            .session("Ping")?
            .ping()
            .map_err(|info| Error::rfc("Server could not be pinged", info));
        self.observer.on_event(&Event::Ping { ok: result.is_ok() });
        result
    }

    /// Attributes of the open session. Opens the connection if needed.
    pub fn connection_attributes(&mut self) -> Result<ConnectionAttributes> {
        self.ensure_open()?;
        let rstrip = self.options.rstrip;
        let mut attributes = self
            .session("GetConnectionAttributes")?
            .attributes()
            .map_err(|info| Error::rfc("Could not get connection attributes", info))?;
        if rstrip {
            for value in attributes.values_mut() {
                let len = value.trim_end_matches(' ').len();
                value.truncate(len);
            }
        }
        Ok(attributes)
    }

    /// Metadata of a remote function. Opens the connection if needed.
    pub fn function_description(&mut self, name: &str) -> Result<Arc<FunctionDescription>> {
        self.ensure_open()?;
        let description = self
            .session("GetFunctionDescription")?
            .function_description(name)
            .map_err(|info| {
                Error::rfc(
                    format!("Could not get function description for \"{}\"", name),
                    info,
                )
            })?;
        self.observer
            .on_event(&Event::DescriptionFetched { function: name });
        Ok(Arc::new(description))
    }

    /// Call a remote function.
    ///
    /// `params` is a name-keyed map or a [`Fields`](crate::Fields) aggregate.
    /// Fails with [`Error::ConnectionClosed`] on a Closed connection without
    /// touching the runtime.
    ///
    /// # Example
    ///
    /// ```
    /// use sap_rfc_rs::{Connection, ConnectionParameters, LoopbackRuntime, Value};
    /// use std::collections::BTreeMap;
    ///
    /// let mut conn = Connection::from_params(
    ///     LoopbackRuntime::with_test_functions(),
    ///     ConnectionParameters::from_dest("NPL"),
    /// )?;
    /// let mut params = BTreeMap::new();
    /// params.insert("REQUTEXT".to_string(), Value::from("Hello"));
    /// let result = conn.call("STFC_CONNECTION", &params)?;
    /// assert_eq!(result["ECHOTEXT"], Value::from("Hello"));
    /// # Ok::<(), sap_rfc_rs::Error>(())
    /// ```
    pub fn call<P: ParameterSource + ?Sized>(&mut self, name: &str, params: &P) -> Result<CallResult> {
        if !self.alive() {
            return Err(Error::ConnectionClosed { operation: "Call" });
        }
        let description = self.function_description(name)?;
        self.call_with_description(description, params)
    }

    /// Call a remote function with metadata the caller already holds.
    pub fn call_with_description<P: ParameterSource + ?Sized>(
        &mut self,
        description: Arc<FunctionDescription>,
        params: &P,
    ) -> Result<CallResult> {
        if !self.alive() {
            return Err(Error::ConnectionClosed { operation: "Call" });
        }
        let observer = self.observer.clone();
        let function = description.name.clone();
        observer.on_event(&Event::CallStarted { function: &function });
        let started = Instant::now();

        let result = self.invoke(description, params);

        observer.on_event(&Event::CallFinished {
            function: &function,
            elapsed: started.elapsed(),
            ok: result.is_ok(),
        });
        result
    }

    fn invoke<P: ParameterSource + ?Sized>(
        &mut self,
        description: Arc<FunctionDescription>,
        params: &P,
    ) -> Result<CallResult> {
        let options = self.options;
        let session = self.session("Call")?;
        let mut container = session.create_function(description.clone())?;
        fill_function(&mut container, params)?;
        session.invoke(&mut container).map_err(|info| {
            Error::rfc(
                format!("Could not invoke function \"{}\"", description.name),
                info,
            )
        })?;
        wrap_result(&container, options.return_import_params, options.rstrip)
    }

    fn ensure_open(&mut self) -> Result<()> {
        if !self.alive() {
            self.open()?;
        }
        Ok(())
    }

    fn session(&mut self, operation: &'static str) -> Result<&mut (dyn RfcSession + 'static)> {
        self.session
            .as_mut()
            .and_then(SessionGuard::session)
            .ok_or(Error::ConnectionClosed { operation })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("params", &self.params)
            .field("options", &self.options)
            .field("alive", &self.alive())
            .finish()
    }
}
