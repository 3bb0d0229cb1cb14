//! In-process RFC runtime.
//!
//! `LoopbackRuntime` serves registered functions from handler closures
//! instead of a remote system. It counts sessions, containers and
//! invocations, and can be told to fail its next operation, which makes it
//! the backend for tests and demos.

use chrono::Local;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{RfcRuntime, RfcSession};
use crate::error::{Error, ErrorInfo, Result};
use crate::marshal::{fill_parameter, wrap_parameter};
use crate::params::{ConnectionAttributes, ConnectionParameters};
use crate::protocol::container::FunctionContainer;
use crate::protocol::types::{
    Direction, Encoding, FunctionDescription, ParameterDescription, RfcType, TypeDescription,
    Value,
};

/// Server-side implementation of a registered function.
pub type Handler = Arc<dyn Fn(&mut ServerCall<'_>) -> Result<()> + Send + Sync>;

/// Handler's view of an incoming call.
pub struct ServerCall<'a> {
    container: &'a mut FunctionContainer,
    params: &'a ConnectionParameters,
}

impl ServerCall<'_> {
    /// Name of the called function.
    pub fn function(&self) -> &str {
        &self.container.description().name
    }

    /// Connection parameters of the calling session.
    pub fn parameters(&self) -> &ConnectionParameters {
        self.params
    }

    /// Read a parameter. Text is right-stripped.
    pub fn get(&self, name: &str) -> Result<Value> {
        wrap_parameter(&*self.container, name, true)
    }

    /// Write a parameter.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        fill_parameter(self.container, name, &value.into())
    }

    /// Whether the caller supplied `name`.
    pub fn is_supplied(&self, name: &str) -> bool {
        self.container.is_supplied(name)
    }
}

#[derive(Debug, Default)]
struct Failures {
    open: Option<ErrorInfo>,
    close: Option<ErrorInfo>,
    ping: Option<ErrorInfo>,
    invoke: Option<ErrorInfo>,
}

#[derive(Default)]
struct Shared {
    functions: Mutex<HashMap<String, (FunctionDescription, Handler)>>,
    failures: Mutex<Failures>,
    open_sessions: AtomicUsize,
    sessions_opened: AtomicUsize,
    containers_created: AtomicUsize,
    invocations: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runtime that serves calls in-process.
#[derive(Clone, Default)]
pub struct LoopbackRuntime {
    shared: Arc<Shared>,
    encoding: Encoding,
}

impl LoopbackRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime with `STFC_CONNECTION` and `STFC_STRUCTURE` registered.
    pub fn with_test_functions() -> Self {
        let runtime = Self::new();
        runtime.register(stfc_connection(), handle_stfc_connection);
        runtime.register(stfc_structure(), handle_stfc_structure);
        runtime
    }

    /// Set the text encoding of sessions opened from now on.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Register a function and its handler. Replaces an existing one.
    pub fn register<F>(&self, description: FunctionDescription, handler: F)
    where
        F: Fn(&mut ServerCall<'_>) -> Result<()> + Send + Sync + 'static,
    {
        lock(&self.shared.functions).insert(
            description.name.clone(),
            (description, Arc::new(handler) as Handler),
        );
    }

    /// Sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.shared.open_sessions.load(Ordering::SeqCst)
    }

    /// Sessions opened since creation.
    pub fn sessions_opened(&self) -> usize {
        self.shared.sessions_opened.load(Ordering::SeqCst)
    }

    /// Call containers created since creation.
    pub fn containers_created(&self) -> usize {
        self.shared.containers_created.load(Ordering::SeqCst)
    }

    /// Invocations since creation.
    pub fn invocations(&self) -> usize {
        self.shared.invocations.load(Ordering::SeqCst)
    }

    pub fn fail_next_open(&self, info: ErrorInfo) {
        lock(&self.shared.failures).open = Some(info);
    }

    /// The session is released even when the close reports a failure.
    pub fn fail_next_close(&self, info: ErrorInfo) {
        lock(&self.shared.failures).close = Some(info);
    }

    pub fn fail_next_ping(&self, info: ErrorInfo) {
        lock(&self.shared.failures).ping = Some(info);
    }

    pub fn fail_next_invoke(&self, info: ErrorInfo) {
        lock(&self.shared.failures).invoke = Some(info);
    }
}

impl RfcRuntime for LoopbackRuntime {
    fn open(
        &self,
        params: &ConnectionParameters,
    ) -> std::result::Result<Box<dyn RfcSession>, ErrorInfo> {
        if let Some(info) = lock(&self.shared.failures).open.take() {
            return Err(info);
        }
        self.shared.open_sessions.fetch_add(1, Ordering::SeqCst);
        self.shared.sessions_opened.fetch_add(1, Ordering::SeqCst);
        let conversation_id = format!("{:08}", rand::thread_rng().gen_range(0..100_000_000u32));
        Ok(Box::new(LoopbackSession {
            shared: self.shared.clone(),
            encoding: self.encoding,
            params: params.clone(),
            conversation_id,
            closed: false,
        }))
    }
}

struct LoopbackSession {
    shared: Arc<Shared>,
    encoding: Encoding,
    params: ConnectionParameters,
    conversation_id: String,
    closed: bool,
}

impl LoopbackSession {
    fn check_open(&self) -> std::result::Result<(), ErrorInfo> {
        if self.closed {
            return Err(ErrorInfo::new(
                "RFC_INVALID_HANDLE",
                "RFC_INVALID_HANDLE",
                "An invalid handle was passed to the API call",
            ));
        }
        Ok(())
    }

    fn param_or(&self, key: &str, default: &str) -> String {
        self.params.get(key).unwrap_or(default).to_string()
    }
}

impl RfcSession for LoopbackSession {
    fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn close(&mut self) -> std::result::Result<(), ErrorInfo> {
        self.check_open()?;
        self.closed = true;
        self.shared.open_sessions.fetch_sub(1, Ordering::SeqCst);
        match lock(&self.shared.failures).close.take() {
            Some(info) => Err(info),
            None => Ok(()),
        }
    }

    fn ping(&mut self) -> std::result::Result<(), ErrorInfo> {
        self.check_open()?;
        match lock(&self.shared.failures).ping.take() {
            Some(info) => Err(info),
            None => Ok(()),
        }
    }

    fn attributes(&mut self) -> std::result::Result<ConnectionAttributes, ErrorInfo> {
        self.check_open()?;
        let host = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());
        let user = self
            .params
            .get("user")
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| whoami::username().to_ascii_uppercase());
        let bytes_per_char = self.encoding.bytes_per_char().to_string();
        let codepage = match self.encoding {
            Encoding::Narrow => "1100",
            Encoding::Wide => "4103",
        };

        let mut attributes = ConnectionAttributes::new();
        // text attributes are space padded, as fixed-width fields are
        let mut put = |key: &str, value: String| {
            attributes.insert(key.to_string(), format!("{:<8}", value));
        };
        put("dest", self.param_or("dest", ""));
        put("host", host);
        put("partnerHost", self.param_or("ashost", "loopback"));
        put("sysNumber", self.param_or("sysnr", "00"));
        put("sysId", self.param_or("sysid", "LBK"));
        put("client", self.param_or("client", "000"));
        put("user", user);
        put("language", self.param_or("lang", "E").to_ascii_uppercase());
        put("isoLanguage", "EN".to_string());
        put("codepage", codepage.to_string());
        put("partnerCodepage", codepage.to_string());
        put("rfcRole", "C".to_string());
        put("type", "E".to_string());
        put("partnerType", "3".to_string());
        put("rel", env!("CARGO_PKG_VERSION").to_string());
        put("cpicConvId", self.conversation_id.clone());
        put("progName", env!("CARGO_PKG_NAME").to_string());
        put("partnerBytesPerChar", bytes_per_char);
        Ok(attributes)
    }

    fn function_description(
        &mut self,
        name: &str,
    ) -> std::result::Result<FunctionDescription, ErrorInfo> {
        self.check_open()?;
        lock(&self.shared.functions)
            .get(name)
            .map(|(description, _)| description.clone())
            .ok_or_else(|| {
                ErrorInfo::new(
                    "RFC_ABAP_RUNTIME_FAILURE",
                    "FU_NOT_FOUND",
                    format!("Function module \"{}\" not found", name),
                )
                .with_abap_message("FL", "E", "046")
                .with_abap_variables([name])
            })
    }

    fn create_function(&mut self, description: Arc<FunctionDescription>) -> Result<FunctionContainer> {
        self.check_open()
            .map_err(|info| Error::rfc("Could not create function", info))?;
        let container = FunctionContainer::new(description, self.encoding)?;
        self.shared.containers_created.fetch_add(1, Ordering::SeqCst);
        Ok(container)
    }

    fn invoke(&mut self, container: &mut FunctionContainer) -> std::result::Result<(), ErrorInfo> {
        self.check_open()?;
        self.shared.invocations.fetch_add(1, Ordering::SeqCst);
        if let Some(info) = lock(&self.shared.failures).invoke.take() {
            return Err(info);
        }
        let name = container.description().name.clone();
        let handler = lock(&self.shared.functions)
            .get(&name)
            .map(|(_, handler)| handler.clone())
            .ok_or_else(|| {
                ErrorInfo::new(
                    "RFC_ABAP_RUNTIME_FAILURE",
                    "CALL_FUNCTION_NOT_FOUND",
                    format!("Function module \"{}\" not found", name),
                )
            })?;

        let mut call = ServerCall {
            container,
            params: &self.params,
        };
        handler(&mut call).map_err(|err| match err {
            Error::Rfc { info, .. } => info,
            other => ErrorInfo::new(
                "RFC_ABAP_RUNTIME_FAILURE",
                "RFC_ERROR_SYSTEM_FAILURE",
                other.to_string(),
            ),
        })
    }
}

/// `RFCTEST` structure used by the classic test functions.
pub fn rfctest_type() -> TypeDescription {
    TypeDescription::new("RFCTEST")
        .with_field("RFCFLOAT", RfcType::Float, 0)
        .with_field("RFCCHAR1", RfcType::Char, 1)
        .with_field("RFCINT2", RfcType::Int2, 0)
        .with_field("RFCINT1", RfcType::Int1, 0)
        .with_field("RFCCHAR4", RfcType::Char, 4)
        .with_field("RFCINT4", RfcType::Int, 0)
        .with_field("RFCHEX3", RfcType::Byte, 3)
        .with_field("RFCCHAR2", RfcType::Char, 2)
        .with_field("RFCTIME", RfcType::Time, 0)
        .with_field("RFCDATE", RfcType::Date, 0)
        .with_field("RFCDATA1", RfcType::Char, 50)
        .with_field("RFCDATA2", RfcType::Char, 50)
}

/// `STFC_CONNECTION`: echoes `REQUTEXT` and describes the server.
pub fn stfc_connection() -> FunctionDescription {
    FunctionDescription::new("STFC_CONNECTION")
        .with_parameter(
            ParameterDescription::new("REQUTEXT", RfcType::Char, Direction::Import, 255)
                .with_text("Request text"),
        )
        .with_parameter(
            ParameterDescription::new("ECHOTEXT", RfcType::Char, Direction::Export, 255)
                .with_text("Echo of request text"),
        )
        .with_parameter(
            ParameterDescription::new("RESPTEXT", RfcType::Char, Direction::Export, 255)
                .with_text("Response text"),
        )
}

/// `STFC_STRUCTURE`: echoes `IMPORTSTRUCT` and appends it to `RFCTABLE`.
pub fn stfc_structure() -> FunctionDescription {
    let rfctest = Arc::new(rfctest_type());
    FunctionDescription::new("STFC_STRUCTURE")
        .with_parameter(ParameterDescription::structure(
            "IMPORTSTRUCT",
            Direction::Import,
            rfctest.clone(),
        ))
        .with_parameter(ParameterDescription::structure(
            "ECHOSTRUCT",
            Direction::Export,
            rfctest.clone(),
        ))
        .with_parameter(ParameterDescription::new(
            "RESPTEXT",
            RfcType::Char,
            Direction::Export,
            255,
        ))
        .with_parameter(ParameterDescription::table("RFCTABLE", rfctest))
}

fn response_text(call: &ServerCall<'_>) -> String {
    let params = call.parameters();
    let now = Local::now();
    format!(
        "SAP R/3 Rel. {} Sysid: {} Date: {} Time: {} Logon_Data: {}/{}/{}",
        env!("CARGO_PKG_VERSION"),
        params.get("sysid").unwrap_or("LBK"),
        now.format("%Y%m%d"),
        now.format("%H%M%S"),
        params.get("client").unwrap_or("000"),
        params.get("user").unwrap_or("").to_ascii_uppercase(),
        params.get("lang").unwrap_or("E").to_ascii_uppercase(),
    )
}

fn handle_stfc_connection(call: &mut ServerCall<'_>) -> Result<()> {
    let request = call.get("REQUTEXT")?;
    call.set("ECHOTEXT", request)?;
    let response = response_text(call);
    call.set("RESPTEXT", response)
}

fn handle_stfc_structure(call: &mut ServerCall<'_>) -> Result<()> {
    let import = call.get("IMPORTSTRUCT")?;
    let mut rows = match call.get("RFCTABLE")? {
        Value::Table(rows) => rows,
        _ => Vec::new(),
    };
    if let Value::Structure(row) = &import {
        rows.push(row.clone());
    }
    call.set("ECHOSTRUCT", import)?;
    call.set("RFCTABLE", Value::Table(rows))?;
    let response = response_text(call);
    call.set("RESPTEXT", response)
}
