//! Conversion between application values and call containers.
//!
//! `fill` writes caller arguments into a container according to the
//! function's metadata; `wrap` reads the container back into a name-keyed
//! result after invocation.

pub mod fill;
pub mod ser;
pub mod source;
pub mod wrap;

pub use fill::{fill_function, fill_parameter};
pub use ser::to_value;
pub use source::{Fields, ParameterSource};
pub use wrap::{deserialize_result, wrap_parameter, wrap_result, CallResult};
