//! Error types for the RFC client binding.
//!
//! Errors fall into two kinds: failures reported by the underlying RFC runtime
//! or remote peer, and failures local to the binding (bad parameters, type
//! conversion, calls on a closed connection).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;
use thiserror::Error;

use crate::protocol::types::RfcType;

/// Result type alias for RFC operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured diagnostic reported by the RFC runtime.
///
/// The ABAP message fields are only populated when the failure originated
/// from an ABAP-side exception; otherwise they are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    pub key: String,
    pub abap_msg_class: String,
    pub abap_msg_type: String,
    pub abap_msg_number: String,
    pub abap_msg_v1: String,
    pub abap_msg_v2: String,
    pub abap_msg_v3: String,
    pub abap_msg_v4: String,
}

impl ErrorInfo {
    /// Create a diagnostic with message, code and key.
    pub fn new(
        code: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            key: key.into(),
            ..Default::default()
        }
    }

    /// Attach the ABAP message identity (class, type, number).
    pub fn with_abap_message(
        mut self,
        class: impl Into<String>,
        msg_type: impl Into<String>,
        number: impl Into<String>,
    ) -> Self {
        self.abap_msg_class = class.into();
        self.abap_msg_type = msg_type.into();
        self.abap_msg_number = number.into();
        self
    }

    /// Attach up to four ABAP message variables.
    pub fn with_abap_variables<I, S>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let slots = [
            &mut self.abap_msg_v1,
            &mut self.abap_msg_v2,
            &mut self.abap_msg_v3,
            &mut self.abap_msg_v4,
        ];
        for (slot, value) in slots.into_iter().zip(variables) {
            *slot = value.into();
        }
        self
    }

    /// Whether the failure carries an ABAP message identity.
    pub fn is_abap_message(&self) -> bool {
        !self.abap_msg_class.is_empty() || !self.abap_msg_number.is_empty()
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ErrorInfo[{}, {}, {}, {}, {}, {}, {}, {}, {}, {}]",
            self.message,
            self.code,
            self.key,
            self.abap_msg_class,
            self.abap_msg_type,
            self.abap_msg_number,
            self.abap_msg_v1,
            self.abap_msg_v2,
            self.abap_msg_v3,
            self.abap_msg_v4
        )
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Reported by the RFC runtime or the remote peer.
    Runtime,
    /// Local to the binding.
    Binding,
}

/// Error type for RFC client operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Failure reported by the RFC runtime.
    #[error("RFC runtime error: {description} | {info}")]
    Rfc { description: String, info: ErrorInfo },

    /// Parameters were not a name-keyed mapping or a named-field aggregate.
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// Parameter name not found in the function description.
    #[error("Unknown parameter \"{name}\" for function \"{function}\"")]
    UnknownParameter { function: String, name: String },

    /// Field name not found in a structure or table row type.
    #[error("Unknown field \"{name}\" in type \"{type_name}\" of \"{parameter}\"")]
    UnknownField {
        parameter: String,
        type_name: String,
        name: String,
    },

    /// Required input parameter was not supplied.
    #[error("Missing required parameter \"{name}\" for function \"{function}\"")]
    MissingParameter { function: String, name: String },

    /// Value could not be converted to the parameter's RFC type.
    #[error("Cannot convert {value} to {expected} for \"{parameter}\": {message}")]
    Conversion {
        parameter: String,
        expected: RfcType,
        value: String,
        message: String,
    },

    /// Type conversion error without parameter context.
    #[error("Type conversion error: {message}")]
    TypeConversion { message: String },

    /// Unsupported RFC type code.
    #[error("Unsupported RFC type: {type_code}")]
    UnsupportedType { type_code: u8 },

    /// Metadata is inconsistent (e.g. a structure without a type description).
    #[error("Invalid metadata for \"{name}\": {message}")]
    InvalidMetadata { name: String, message: String },

    /// Operation requires an open connection.
    #[error("{operation}() method requires an open connection")]
    ConnectionClosed { operation: &'static str },

    /// Record layout does not fit the buffer.
    #[error("Buffer too small: need {needed} bytes, have {available} filed at {location}")]
    BufferTooSmall {
        needed: usize,
        available: usize,
        location: &'static Location<'static>,
    },

    /// JSON conversion error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Both halves of a reopen failed.
    #[error("Reopen failed: close: {close}; open: {open}")]
    Reopen { close: Box<Error>, open: Box<Error> },
}

impl Error {
    /// Create a runtime error.
    pub fn rfc(description: impl Into<String>, info: ErrorInfo) -> Self {
        Self::Rfc {
            description: description.into(),
            info,
        }
    }

    /// Create an invalid parameters error.
    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            message: message.into(),
        }
    }

    /// Create a type conversion error.
    pub fn type_conversion(message: impl Into<String>) -> Self {
        Self::TypeConversion {
            message: message.into(),
        }
    }

    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Rfc { .. } => ErrorKind::Runtime,
            Error::Reopen { open, .. } => open.kind(),
            _ => ErrorKind::Binding,
        }
    }

    /// Runtime diagnostic, if this error came from the RFC runtime.
    pub fn info(&self) -> Option<&ErrorInfo> {
        match self {
            Error::Rfc { info, .. } => Some(info),
            Error::Reopen { open, .. } => open.info(),
            _ => None,
        }
    }

    pub fn is_runtime(&self) -> bool {
        self.kind() == ErrorKind::Runtime
    }

    pub fn is_binding(&self) -> bool {
        self.kind() == ErrorKind::Binding
    }

    /// Attach parameter context to a context-free conversion error.
    ///
    /// Errors that already carry context pass through unchanged.
    pub(crate) fn in_parameter(
        self,
        parameter: &str,
        expected: RfcType,
        value: &dyn fmt::Display,
    ) -> Self {
        match self {
            Error::TypeConversion { message } => Error::Conversion {
                parameter: parameter.to_string(),
                expected,
                value: value.to_string(),
                message,
            },
            other => other,
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::invalid_parameters(msg.to_string())
    }
}
