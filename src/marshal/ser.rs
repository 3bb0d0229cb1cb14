//! Serde serializer that builds [`Value`]s directly.
//!
//! Byte strings and sequences of `u8` become `Value::Bytes`; sequences of
//! named-field rows become tables. Booleans follow the ABAP flag
//! convention. Integers beyond `i64` are kept exactly as decimals.

use serde::ser::{self, Serialize};
use std::cell::Cell;

use crate::error::{Error, Result};
use crate::protocol::types::value::sequence_value;
use crate::protocol::types::{Structure, Value};

/// Serialize any `Serialize` value into a [`Value`].
pub fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer::default())
}

#[derive(Clone, Copy, Default)]
struct ValueSerializer<'a> {
    /// Set when the value serialized was a single `u8`.
    byte: Option<&'a Cell<Option<u8>>>,
}

fn wide_integer<N>(n: N) -> Value
where
    N: Copy + ToString,
    i64: TryFrom<N>,
{
    i64::try_from(n).map_or_else(|_| Value::Decimal(n.to_string()), Value::Integer)
}

fn single(name: &str, value: Value) -> Value {
    let mut fields = Structure::new();
    fields.insert(name.to_string(), value);
    Value::Structure(fields)
}

impl<'a> ser::Serializer for ValueSerializer<'a> {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeFields;
    type SerializeStruct = SerializeFields;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::String(if v { "X" } else { "" }.to_string()))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        Ok(wide_integer(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        if let Some(byte) = self.byte {
            byte.set(Some(v));
        }
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Integer(i64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(wide_integer(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        Ok(wide_integer(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Float(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Float(v))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::Bytes(v.to_vec()))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value> {
        Ok(single(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::with_capacity(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            variant,
            items: SerializeVec::with_capacity(len),
        })
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeFields> {
        Ok(SerializeFields::default())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeFields> {
        Ok(SerializeFields::default())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant,
            fields: SerializeFields::default(),
        })
    }
}

struct SerializeVec {
    items: Vec<Value>,
    /// The elements so far, while every one of them is a `u8`.
    bytes: Option<Vec<u8>>,
}

impl SerializeVec {
    fn with_capacity(len: usize) -> Self {
        Self {
            items: Vec::with_capacity(len),
            bytes: Some(Vec::with_capacity(len)),
        }
    }

    fn push<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let byte = Cell::new(None);
        let item = value.serialize(ValueSerializer { byte: Some(&byte) })?;
        match byte.get() {
            Some(b) => {
                if let Some(bytes) = self.bytes.as_mut() {
                    bytes.push(b);
                }
            }
            None => self.bytes = None,
        }
        self.items.push(item);
        Ok(())
    }

    fn finish(self) -> Result<Value> {
        sequence_value(self.items, self.bytes)
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        self.finish()
    }
}

struct SerializeTupleVariant {
    variant: &'static str,
    items: SerializeVec,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.items.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(single(self.variant, self.items.finish()?))
    }
}

#[derive(Default)]
struct SerializeFields {
    fields: Structure,
    key: Option<String>,
}

impl ser::SerializeMap for SerializeFields {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<()> {
        match to_value(key)? {
            Value::String(name) => {
                self.key = Some(name);
                Ok(())
            }
            other => Err(Error::invalid_parameters(format!(
                "field names must be strings, got {}",
                other.kind_name()
            ))),
        }
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<()> {
        let name = self
            .key
            .take()
            .ok_or_else(|| Error::invalid_parameters("map value without a field name"))?;
        self.fields.insert(name, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Structure(self.fields))
    }
}

impl ser::SerializeStruct for SerializeFields {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        self.fields.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Structure(self.fields))
    }
}

struct SerializeStructVariant {
    variant: &'static str,
    fields: SerializeFields,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()> {
        ser::SerializeStruct::serialize_field(&mut self.fields, key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(single(self.variant, Value::Structure(self.fields.fields)))
    }
}
