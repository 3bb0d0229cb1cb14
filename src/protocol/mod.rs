//! Typed call storage and the codecs behind it.

pub mod buffer;
pub mod constants;
pub mod container;
pub mod decode;
pub mod types;

pub use buffer::RecordBuffer;
pub use container::{Cell, FunctionContainer, Record, Table};
pub use types::{
    Direction, Encoding, FieldDescription, FunctionDescription, ParameterDescription, RfcType,
    Structure, TypeDescription, Value,
};
