//! The call container: typed, metadata-shaped storage for one function call.
//!
//! A `FunctionContainer` holds one `Cell` per parameter of its
//! `FunctionDescription`. Scalar parameters are fixed-size record buffers;
//! structures and table rows are `Record`s whose flat fields sit at their
//! metadata offsets and whose deep fields (strings, nested structures,
//! tables) are held alongside.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::protocol::buffer::RecordBuffer;
use crate::protocol::constants::{BCD_SIGN_POSITIVE, BLANK, ZERO_DIGIT};
use crate::protocol::decode::fill_text;
use crate::protocol::types::{Encoding, FunctionDescription, RfcType, TypeDescription};

/// Storage for one parameter or deep field.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Fixed-size scalar.
    Scalar(RecordBuffer),
    /// Variable-length text.
    String(String),
    /// Variable-length bytes.
    XString(Vec<u8>),
    /// Nested structure.
    Structure(Record),
    /// Ordered rows.
    Table(Table),
}

impl Cell {
    /// Create an initialized cell.
    ///
    /// `length` is the byte length of scalar cells in the active encoding.
    pub fn new(
        name: &str,
        rfc_type: RfcType,
        length: usize,
        type_desc: Option<&Arc<TypeDescription>>,
        encoding: Encoding,
    ) -> Result<Self> {
        match rfc_type {
            RfcType::String => Ok(Cell::String(String::new())),
            RfcType::XString => Ok(Cell::XString(Vec::new())),
            RfcType::Structure => {
                let type_desc = require_type(name, type_desc)?;
                Ok(Cell::Structure(Record::new(type_desc.clone(), encoding)?))
            }
            RfcType::Table => {
                let type_desc = require_type(name, type_desc)?;
                Ok(Cell::Table(Table::new(type_desc.clone(), encoding)))
            }
            _ => {
                let mut buf = RecordBuffer::zeroed(length);
                initialize_slot(&mut buf, 0, length, rfc_type, encoding)?;
                Ok(Cell::Scalar(buf))
            }
        }
    }
}

fn require_type<'a>(
    name: &str,
    type_desc: Option<&'a Arc<TypeDescription>>,
) -> Result<&'a Arc<TypeDescription>> {
    type_desc.ok_or_else(|| Error::InvalidMetadata {
        name: name.to_string(),
        message: "structured parameter has no type description".to_string(),
    })
}

/// Write the initial value of a flat field.
///
/// Text is blank, digit text is zeros, packed decimals are positive zero,
/// everything else is zero bytes.
pub(crate) fn initialize_slot(
    buf: &mut RecordBuffer,
    offset: usize,
    length: usize,
    rfc_type: RfcType,
    encoding: Encoding,
) -> Result<()> {
    match rfc_type {
        RfcType::Char => fill_text(BLANK, encoding, buf.slot_mut(offset, length)?),
        RfcType::Num | RfcType::Date | RfcType::Time => {
            fill_text(ZERO_DIGIT, encoding, buf.slot_mut(offset, length)?)
        }
        RfcType::Bcd => {
            buf.write_zeros(offset, length)?;
            if length > 0 {
                buf.write_u8(offset + length - 1, BCD_SIGN_POSITIVE)?;
            }
        }
        _ => buf.write_zeros(offset, length)?,
    }
    Ok(())
}

/// A structure value or table row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_desc: Arc<TypeDescription>,
    encoding: Encoding,
    flat: RecordBuffer,
    deep: Vec<Option<Cell>>,
}

impl Record {
    /// Create a record with every field at its initial value.
    pub fn new(type_desc: Arc<TypeDescription>, encoding: Encoding) -> Result<Self> {
        let mut flat = RecordBuffer::zeroed(type_desc.length(encoding));
        let mut deep = Vec::with_capacity(type_desc.fields.len());
        for field in &type_desc.fields {
            if field.field_type.is_deep() {
                deep.push(Some(Cell::new(
                    &field.name,
                    field.field_type,
                    0,
                    field.type_desc.as_ref(),
                    encoding,
                )?));
            } else {
                initialize_slot(
                    &mut flat,
                    field.offset(encoding),
                    field.length(encoding),
                    field.field_type,
                    encoding,
                )?;
                deep.push(None);
            }
        }
        Ok(Self {
            type_desc,
            encoding,
            flat,
            deep,
        })
    }

    /// Put every field back to its initial value.
    pub fn reset(&mut self) -> Result<()> {
        *self = Self::new(self.type_desc.clone(), self.encoding)?;
        Ok(())
    }

    pub fn type_desc(&self) -> &Arc<TypeDescription> {
        &self.type_desc
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// The fixed part of the record.
    pub fn flat(&self) -> &RecordBuffer {
        &self.flat
    }

    pub fn flat_mut(&mut self) -> &mut RecordBuffer {
        &mut self.flat
    }

    /// The deep cell of field `index`, if that field is deep.
    pub fn deep(&self, index: usize) -> Option<&Cell> {
        self.deep.get(index).and_then(Option::as_ref)
    }

    pub fn deep_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.deep.get_mut(index).and_then(Option::as_mut)
    }
}

/// Ordered rows of one row type.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    row_type: Arc<TypeDescription>,
    encoding: Encoding,
    rows: Vec<Record>,
}

impl Table {
    pub fn new(row_type: Arc<TypeDescription>, encoding: Encoding) -> Self {
        Self {
            row_type,
            encoding,
            rows: Vec::new(),
        }
    }

    pub fn row_type(&self) -> &Arc<TypeDescription> {
        &self.row_type
    }

    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append an initialized row and return it for filling.
    pub fn append_row(&mut self) -> Result<&mut Record> {
        let row = Record::new(self.row_type.clone(), self.encoding)?;
        self.rows.push(row);
        let last = self.rows.len() - 1;
        Ok(&mut self.rows[last])
    }

    /// Get row by index (0-based).
    pub fn row(&self, index: usize) -> Option<&Record> {
        self.rows.get(index)
    }

    /// Iterate over rows in order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter()
    }

    /// Remove all rows.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Typed storage for every parameter of one function call.
#[derive(Debug, Clone)]
pub struct FunctionContainer {
    description: Arc<FunctionDescription>,
    encoding: Encoding,
    cells: Vec<Cell>,
    supplied: Vec<bool>,
}

impl FunctionContainer {
    /// Create a container with every parameter at its initial value.
    pub fn new(description: Arc<FunctionDescription>, encoding: Encoding) -> Result<Self> {
        let cells = description
            .parameters
            .iter()
            .map(|p| {
                Cell::new(
                    &p.name,
                    p.parameter_type,
                    p.length(encoding),
                    p.type_desc.as_ref(),
                    encoding,
                )
            })
            .collect::<Result<Vec<_>>>()?;
        let supplied = vec![false; cells.len()];
        Ok(Self {
            description,
            encoding,
            cells,
            supplied,
        })
    }

    pub fn description(&self) -> &Arc<FunctionDescription> {
        &self.description
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Get a parameter's cell by name.
    pub fn cell(&self, name: &str) -> Option<&Cell> {
        self.description
            .parameter_index(name)
            .and_then(|i| self.cells.get(i))
    }

    pub(crate) fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub(crate) fn cell_at_mut(&mut self, index: usize) -> Option<&mut Cell> {
        self.cells.get_mut(index)
    }

    pub(crate) fn mark_supplied(&mut self, index: usize) {
        if let Some(flag) = self.supplied.get_mut(index) {
            *flag = true;
        }
    }

    pub(crate) fn is_supplied_at(&self, index: usize) -> bool {
        self.supplied.get(index).copied().unwrap_or(false)
    }

    /// Whether the caller supplied a value for the named parameter.
    ///
    /// Runtimes use this to send only active parameters; the others keep
    /// the remote default.
    pub fn is_supplied(&self, name: &str) -> bool {
        self.description
            .parameter_index(name)
            .is_some_and(|i| self.is_supplied_at(i))
    }

    /// Names of the parameters the caller supplied.
    pub fn supplied_parameters(&self) -> Vec<&str> {
        self.description
            .parameters
            .iter()
            .zip(&self.supplied)
            .filter(|(_, supplied)| **supplied)
            .map(|(p, _)| p.name.as_str())
            .collect()
    }
}
