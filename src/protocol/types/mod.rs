//! RFC metadata model and application values.

mod description;
mod rfc_type;
pub(crate) mod value;

pub use description::{FieldDescription, FunctionDescription, ParameterDescription, TypeDescription};
pub use rfc_type::{Direction, Encoding, RfcType};
pub use value::{Structure, Value};
