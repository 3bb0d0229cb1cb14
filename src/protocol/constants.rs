//! RFC runtime constants.
//!
//! Type codes and direction bits follow the numbering used by the RFC
//! runtime library's metadata API.

// Type codes
pub const RFCTYPE_CHAR: u8 = 0;
pub const RFCTYPE_DATE: u8 = 1;
pub const RFCTYPE_BCD: u8 = 2;
pub const RFCTYPE_TIME: u8 = 3;
pub const RFCTYPE_BYTE: u8 = 4;
pub const RFCTYPE_TABLE: u8 = 5;
pub const RFCTYPE_NUM: u8 = 6;
pub const RFCTYPE_FLOAT: u8 = 7;
pub const RFCTYPE_INT: u8 = 8;
pub const RFCTYPE_INT2: u8 = 9;
pub const RFCTYPE_INT1: u8 = 10;
pub const RFCTYPE_STRUCTURE: u8 = 17;
pub const RFCTYPE_STRING: u8 = 29;
pub const RFCTYPE_XSTRING: u8 = 30;
pub const RFCTYPE_INT8: u8 = 31;

// Parameter directions
pub const RFC_IMPORT: u8 = 0x01;
pub const RFC_EXPORT: u8 = 0x02;
pub const RFC_CHANGING: u8 = RFC_IMPORT | RFC_EXPORT;
pub const RFC_TABLES: u8 = 0x04 | RFC_CHANGING;

// Fixed field widths in characters
pub const DATE_LENGTH: usize = 8;
pub const TIME_LENGTH: usize = 6;

// Size of a reference slot for deep (variable length) fields
pub const DEEP_FIELD_LENGTH: usize = 8;

// Packed decimal sign nibbles
pub const BCD_SIGN_POSITIVE: u8 = 0x0C;
pub const BCD_SIGN_NEGATIVE: u8 = 0x0D;
pub const BCD_SIGN_UNSIGNED: u8 = 0x0F;

// Padding characters
pub const BLANK: u16 = 0x20;
pub const ZERO_DIGIT: u16 = 0x30;
