//! RFC client binding for Rust
//!
//! Invoke remote function modules on an application server and exchange
//! structured parameters with them. Arguments are loosely typed [`Value`]s;
//! each call converts them into the strictly typed, fixed-layout container
//! described by the function's metadata, and converts the response back.
//!
//! Transport and session handling are provided by an [`RfcRuntime`]. The
//! in-process [`LoopbackRuntime`] serves registered functions locally.
//!
//! # Example
//!
//! ```
//! use sap_rfc_rs::{Connection, ConnectionParameters, LoopbackRuntime, Result, Value};
//! use std::collections::BTreeMap;
//!
//! fn main() -> Result<()> {
//!     let params = ConnectionParameters::new()
//!         .with("ashost", "10.0.0.1")
//!         .with("sysnr", "00")
//!         .with("client", "100")
//!         .with("user", "demo")
//!         .with("passwd", "secret");
//!     let mut conn = Connection::from_params(LoopbackRuntime::with_test_functions(), params)?;
//!
//!     let mut args = BTreeMap::new();
//!     args.insert("REQUTEXT".to_string(), Value::from("Hello SAP!"));
//!     let result = conn.call("STFC_CONNECTION", &args)?;
//!     println!("{}", result["RESPTEXT"]);
//!
//!     conn.close()?;
//!     Ok(())
//! }
//! ```

pub mod connection;
pub mod error;
pub mod marshal;
pub mod observer;
pub mod params;
pub mod protocol;
pub mod runtime;

// Re-export main types
pub use connection::Connection;
pub use error::{Error, ErrorInfo, ErrorKind, Result};
pub use marshal::{deserialize_result, to_value, CallResult, Fields, ParameterSource};
pub use observer::{Event, NoopObserver, Observer, TracingObserver};
pub use params::{ConnectionAttributes, ConnectionOptions, ConnectionParameters};
pub use protocol::types::{
    Direction, Encoding, FieldDescription, FunctionDescription, ParameterDescription, RfcType,
    Structure, TypeDescription, Value,
};
pub use runtime::loopback::{LoopbackRuntime, ServerCall};
pub use runtime::{RfcRuntime, RfcSession};
