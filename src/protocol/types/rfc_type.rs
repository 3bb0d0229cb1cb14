//! RFC type tags, parameter directions and character encodings.
//!
//! Nullability does not exist on the RFC side: every field has an initial
//! value instead.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::protocol::constants::*;

/// RFC data type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RfcType {
    /// Fixed-length text.
    Char,
    /// Date as `YYYYMMDD` text.
    Date,
    /// Packed decimal.
    Bcd,
    /// Time as `HHMMSS` text.
    Time,
    /// Fixed-length raw bytes.
    Byte,
    /// Repeating rows of a structure type.
    Table,
    /// Fixed-length digit text.
    Num,
    /// IEEE-754 double.
    Float,
    /// 4-byte signed integer.
    Int,
    /// 2-byte signed integer.
    Int2,
    /// 1-byte unsigned integer.
    Int1,
    /// Nested structure.
    Structure,
    /// Variable-length text.
    String,
    /// Variable-length raw bytes.
    XString,
    /// 8-byte signed integer.
    Int8,
}

impl RfcType {
    /// Create from a raw runtime type code.
    ///
    /// Returns `Err(Error::UnsupportedType)` for codes the binding cannot marshal.
    pub fn from_raw(code: u8) -> Result<Self> {
        match code {
            RFCTYPE_CHAR => Ok(RfcType::Char),
            RFCTYPE_DATE => Ok(RfcType::Date),
            RFCTYPE_BCD => Ok(RfcType::Bcd),
            RFCTYPE_TIME => Ok(RfcType::Time),
            RFCTYPE_BYTE => Ok(RfcType::Byte),
            RFCTYPE_TABLE => Ok(RfcType::Table),
            RFCTYPE_NUM => Ok(RfcType::Num),
            RFCTYPE_FLOAT => Ok(RfcType::Float),
            RFCTYPE_INT => Ok(RfcType::Int),
            RFCTYPE_INT2 => Ok(RfcType::Int2),
            RFCTYPE_INT1 => Ok(RfcType::Int1),
            RFCTYPE_STRUCTURE => Ok(RfcType::Structure),
            RFCTYPE_STRING => Ok(RfcType::String),
            RFCTYPE_XSTRING => Ok(RfcType::XString),
            RFCTYPE_INT8 => Ok(RfcType::Int8),
            _ => Err(Error::UnsupportedType { type_code: code }),
        }
    }

    /// Get the runtime type code.
    pub fn code(&self) -> u8 {
        match self {
            RfcType::Char => RFCTYPE_CHAR,
            RfcType::Date => RFCTYPE_DATE,
            RfcType::Bcd => RFCTYPE_BCD,
            RfcType::Time => RFCTYPE_TIME,
            RfcType::Byte => RFCTYPE_BYTE,
            RfcType::Table => RFCTYPE_TABLE,
            RfcType::Num => RFCTYPE_NUM,
            RfcType::Float => RFCTYPE_FLOAT,
            RfcType::Int => RFCTYPE_INT,
            RfcType::Int2 => RFCTYPE_INT2,
            RfcType::Int1 => RFCTYPE_INT1,
            RfcType::Structure => RFCTYPE_STRUCTURE,
            RfcType::String => RFCTYPE_STRING,
            RfcType::XString => RFCTYPE_XSTRING,
            RfcType::Int8 => RFCTYPE_INT8,
        }
    }

    /// Types stored outside the fixed part of a record.
    pub fn is_deep(&self) -> bool {
        matches!(
            self,
            RfcType::Table | RfcType::Structure | RfcType::String | RfcType::XString
        )
    }

    /// Narrow and wide byte lengths for a field of this type.
    ///
    /// `size` is the declared width: characters for text types, bytes for
    /// `Bcd` and `Byte`. It is ignored by fixed-size types.
    pub fn byte_lengths(&self, size: usize) -> (usize, usize) {
        match self {
            RfcType::Char | RfcType::Num => (size, size * 2),
            RfcType::Date => (DATE_LENGTH, DATE_LENGTH * 2),
            RfcType::Time => (TIME_LENGTH, TIME_LENGTH * 2),
            RfcType::Bcd | RfcType::Byte => (size, size),
            RfcType::Int => (4, 4),
            RfcType::Int2 => (2, 2),
            RfcType::Int1 => (1, 1),
            RfcType::Int8 | RfcType::Float => (8, 8),
            RfcType::Table | RfcType::Structure | RfcType::String | RfcType::XString => {
                (DEEP_FIELD_LENGTH, DEEP_FIELD_LENGTH)
            }
        }
    }

    /// Runtime name of the type tag.
    pub fn name(&self) -> &'static str {
        match self {
            RfcType::Char => "RFCTYPE_CHAR",
            RfcType::Date => "RFCTYPE_DATE",
            RfcType::Bcd => "RFCTYPE_BCD",
            RfcType::Time => "RFCTYPE_TIME",
            RfcType::Byte => "RFCTYPE_BYTE",
            RfcType::Table => "RFCTYPE_TABLE",
            RfcType::Num => "RFCTYPE_NUM",
            RfcType::Float => "RFCTYPE_FLOAT",
            RfcType::Int => "RFCTYPE_INT",
            RfcType::Int2 => "RFCTYPE_INT2",
            RfcType::Int1 => "RFCTYPE_INT1",
            RfcType::Structure => "RFCTYPE_STRUCTURE",
            RfcType::String => "RFCTYPE_STRING",
            RfcType::XString => "RFCTYPE_XSTRING",
            RfcType::Int8 => "RFCTYPE_INT8",
        }
    }
}

impl fmt::Display for RfcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parameter direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Input only.
    Import,
    /// Output only.
    Export,
    /// Input and output.
    Changing,
    /// Repeating table, input and output.
    Tables,
}

impl Direction {
    pub fn from_raw(code: u8) -> Option<Self> {
        match code {
            RFC_IMPORT => Some(Direction::Import),
            RFC_EXPORT => Some(Direction::Export),
            RFC_CHANGING => Some(Direction::Changing),
            RFC_TABLES => Some(Direction::Tables),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Direction::Import => RFC_IMPORT,
            Direction::Export => RFC_EXPORT,
            Direction::Changing => RFC_CHANGING,
            Direction::Tables => RFC_TABLES,
        }
    }

    /// Whether the caller may supply a value.
    pub fn is_input(&self) -> bool {
        self.code() & RFC_IMPORT != 0
    }

    /// Whether the peer reports a value back.
    pub fn is_output(&self) -> bool {
        self.code() & RFC_EXPORT != 0
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Import => "RFC_IMPORT",
            Direction::Export => "RFC_EXPORT",
            Direction::Changing => "RFC_CHANGING",
            Direction::Tables => "RFC_TABLES",
        })
    }
}

/// Character width of the fixed-layout representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// One byte per character (ISO-8859-1 repertoire).
    Narrow,
    /// Two bytes per UTF-16 code unit, little endian.
    #[default]
    Wide,
}

impl Encoding {
    pub fn bytes_per_char(&self) -> usize {
        match self {
            Encoding::Narrow => 1,
            Encoding::Wide => 2,
        }
    }

    /// Pick the narrow or wide variant of a length or offset.
    pub fn select(&self, narrow: usize, wide: usize) -> usize {
        match self {
            Encoding::Narrow => narrow,
            Encoding::Wide => wide,
        }
    }
}
