//! Scalar codecs for the fixed-layout call container.
//!
//! | RFC type | Module |
//! |----------|--------|
//! | CHAR, and the text form of NUM/DATE/TIME | `text` |
//! | BCD, NUM | `number` |
//! | DATE, TIME | `date` |
//!
//! Integer and float fields are plain little-endian values and are read
//! and written directly through `RecordBuffer`.

mod date;
mod number;
mod text;

pub use date::{format_date, format_time, parse_date, parse_time, INITIAL_DATE, INITIAL_TIME};
pub use number::{decode_bcd, encode_bcd, pad_num};
pub use text::{decode_text, encode_text, fill_text, text_width};
