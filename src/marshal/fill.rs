//! Parameter marshaller: application values -> call container.

use chrono::{NaiveDate, NaiveTime};

use super::source::ParameterSource;
use crate::error::{Error, Result};
use crate::protocol::buffer::RecordBuffer;
use crate::protocol::container::{Cell, FunctionContainer, Record};
use crate::protocol::decode::{
    encode_bcd, encode_text, format_date, format_time, pad_num, parse_date, parse_time,
    text_width, INITIAL_DATE, INITIAL_TIME,
};
use crate::protocol::types::{Encoding, ParameterDescription, RfcType, Value};

/// Fill a call container from application parameters.
///
/// Every supplied name must match a parameter of the function exactly.
/// `Value::Null` counts as not supplied. Fails if a required input
/// parameter is missing afterwards.
pub fn fill_function<P: ParameterSource + ?Sized>(
    container: &mut FunctionContainer,
    source: &P,
) -> Result<()> {
    let description = container.description().clone();
    for name in source.names() {
        let index = description
            .parameter_index(name)
            .ok_or_else(|| Error::UnknownParameter {
                function: description.name.clone(),
                name: name.to_string(),
            })?;
        match source.value_for(name) {
            Some(value) if !value.is_null() => {
                fill_parameter_at(container, index, &description.parameters[index], value)?;
            }
            _ => {}
        }
    }

    for (index, param) in description.parameters.iter().enumerate() {
        if param.is_required() && !container.is_supplied_at(index) {
            return Err(Error::MissingParameter {
                function: description.name.clone(),
                name: param.name.clone(),
            });
        }
    }
    Ok(())
}

/// Fill a single parameter by name.
pub fn fill_parameter(container: &mut FunctionContainer, name: &str, value: &Value) -> Result<()> {
    let description = container.description().clone();
    let index = description
        .parameter_index(name)
        .ok_or_else(|| Error::UnknownParameter {
            function: description.name.clone(),
            name: name.to_string(),
        })?;
    fill_parameter_at(container, index, &description.parameters[index], value)
}

fn fill_parameter_at(
    container: &mut FunctionContainer,
    index: usize,
    param: &ParameterDescription,
    value: &Value,
) -> Result<()> {
    let encoding = container.encoding();
    let cell = container
        .cell_at_mut(index)
        .ok_or_else(|| Error::InvalidMetadata {
            name: param.name.clone(),
            message: "container has no cell for parameter".to_string(),
        })?;
    fill_cell(
        cell,
        &param.name,
        param.parameter_type,
        param.decimals,
        encoding,
        value,
    )?;
    container.mark_supplied(index);
    Ok(())
}

fn fill_cell(
    cell: &mut Cell,
    path: &str,
    rfc_type: RfcType,
    decimals: u32,
    encoding: Encoding,
    value: &Value,
) -> Result<()> {
    match (cell, value) {
        (Cell::Scalar(buf), _) => {
            let len = buf.len();
            fill_scalar(buf, 0, len, rfc_type, decimals, encoding, value)
                .map_err(|e| e.in_parameter(path, rfc_type, value))
        }
        (Cell::String(s), Value::String(text)) => {
            s.clone_from(text);
            Ok(())
        }
        (Cell::XString(b), Value::Bytes(bytes)) => {
            b.clone_from(bytes);
            Ok(())
        }
        (Cell::Structure(record), Value::Structure(fields)) => {
            record.reset()?;
            fill_record(record, path, fields)
        }
        (Cell::Table(table), Value::Table(rows)) => {
            table.clear();
            for (i, row) in rows.iter().enumerate() {
                let record = table.append_row()?;
                fill_record(record, &format!("{}[{}]", path, i), row)?;
            }
            Ok(())
        }
        (_, other) => Err(mismatch(path, rfc_type, other)),
    }
}

/// Fill a structure or table row from a nested source.
fn fill_record<S: ParameterSource + ?Sized>(
    record: &mut Record,
    path: &str,
    source: &S,
) -> Result<()> {
    let type_desc = record.type_desc().clone();
    let encoding = record.encoding();
    for name in source.names() {
        let index = type_desc
            .field_index(name)
            .ok_or_else(|| Error::UnknownField {
                parameter: path.to_string(),
                type_name: type_desc.name.clone(),
                name: name.to_string(),
            })?;
        let value = match source.value_for(name) {
            Some(value) if !value.is_null() => value,
            _ => continue,
        };
        let field = &type_desc.fields[index];
        let field_path = format!("{}-{}", path, field.name);
        if field.field_type.is_deep() {
            let cell = record
                .deep_mut(index)
                .ok_or_else(|| Error::InvalidMetadata {
                    name: field_path.clone(),
                    message: "record has no cell for deep field".to_string(),
                })?;
            fill_cell(cell, &field_path, field.field_type, field.decimals, encoding, value)?;
        } else {
            fill_scalar(
                record.flat_mut(),
                field.offset(encoding),
                field.length(encoding),
                field.field_type,
                field.decimals,
                encoding,
                value,
            )
            .map_err(|e| e.in_parameter(&field_path, field.field_type, value))?;
        }
    }
    Ok(())
}

fn mismatch(path: &str, expected: RfcType, value: &Value) -> Error {
    Error::Conversion {
        parameter: path.to_string(),
        expected,
        value: value.to_string(),
        message: format!("{} value is not accepted", value.kind_name()),
    }
}

/// Encode one flat scalar at `offset`.
///
/// Errors carry no parameter context; callers attach it.
fn fill_scalar(
    buf: &mut RecordBuffer,
    offset: usize,
    length: usize,
    rfc_type: RfcType,
    decimals: u32,
    encoding: Encoding,
    value: &Value,
) -> Result<()> {
    match rfc_type {
        RfcType::Char => {
            let text = expect_text(value)?;
            encode_text(text, encoding, buf.slot_mut(offset, length)?)
        }
        RfcType::Num => {
            let digits = match value {
                Value::String(s) => s.clone(),
                Value::Integer(i) if *i >= 0 => i.to_string(),
                Value::Integer(i) => {
                    return Err(Error::type_conversion(format!(
                        "negative value {} for digit text",
                        i
                    )))
                }
                other => return Err(unexpected("digit text", other)),
            };
            let padded = pad_num(&digits, text_width(length, encoding))?;
            encode_text(&padded, encoding, buf.slot_mut(offset, length)?)
        }
        RfcType::Date => {
            let text = match value {
                Value::Date(d) => format_date(*d)?,
                Value::String(s) => date_text(parse_date(s)?)?,
                other => return Err(unexpected("date", other)),
            };
            encode_text(&text, encoding, buf.slot_mut(offset, length)?)
        }
        RfcType::Time => {
            let text = match value {
                Value::Time(t) => format_time(*t),
                Value::String(s) => time_text(parse_time(s)?),
                other => return Err(unexpected("time", other)),
            };
            encode_text(&text, encoding, buf.slot_mut(offset, length)?)
        }
        RfcType::Bcd => {
            let text = decimal_text(value)?;
            encode_bcd(&text, decimals, buf.slot_mut(offset, length)?)
        }
        RfcType::Float => {
            let x = match value {
                Value::Integer(i) => *i as f64,
                Value::Float(x) => *x,
                Value::Decimal(s) | Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
                    Error::type_conversion(format!("{:?} is not a number", s))
                })?,
                other => return Err(unexpected("number", other)),
            };
            buf.write_f64_le(offset, x)
        }
        RfcType::Int => {
            let i = i32::try_from(expect_integer(value)?)
                .map_err(|_| Error::type_conversion("value out of range for INT"))?;
            buf.write_i32_le(offset, i)
        }
        RfcType::Int2 => {
            let i = i16::try_from(expect_integer(value)?)
                .map_err(|_| Error::type_conversion("value out of range for INT2"))?;
            buf.write_i16_le(offset, i)
        }
        RfcType::Int1 => {
            let i = u8::try_from(expect_integer(value)?)
                .map_err(|_| Error::type_conversion("value out of range for INT1 (0..=255)"))?;
            buf.write_u8(offset, i)
        }
        RfcType::Int8 => buf.write_i64_le(offset, expect_integer(value)?),
        RfcType::Byte => {
            let bytes = match value {
                Value::Bytes(b) => b,
                other => return Err(unexpected("bytes", other)),
            };
            if bytes.len() > length {
                return Err(Error::type_conversion(format!(
                    "{} bytes exceed field length {}",
                    bytes.len(),
                    length
                )));
            }
            buf.write_bytes(offset, bytes)?;
            buf.write_zeros(offset + bytes.len(), length - bytes.len())
        }
        RfcType::Table | RfcType::Structure | RfcType::String | RfcType::XString => {
            Err(Error::type_conversion(format!(
                "{} cannot be stored in a flat field",
                rfc_type
            )))
        }
    }
}

fn unexpected(expected: &str, value: &Value) -> Error {
    Error::type_conversion(format!("expected {}, got {}", expected, value.kind_name()))
}

fn expect_text(value: &Value) -> Result<&str> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(unexpected("string", other)),
    }
}

fn expect_integer(value: &Value) -> Result<i64> {
    match value {
        Value::Integer(i) => Ok(*i),
        other => Err(unexpected("integer", other)),
    }
}

fn date_text(date: Option<NaiveDate>) -> Result<String> {
    match date {
        Some(d) => format_date(d),
        None => Ok(INITIAL_DATE.to_string()),
    }
}

fn time_text(time: Option<NaiveTime>) -> String {
    time.map(format_time)
        .unwrap_or_else(|| INITIAL_TIME.to_string())
}

/// Canonical decimal text of a numeric value.
fn decimal_text(value: &Value) -> Result<String> {
    match value {
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(x) if x.is_finite() => Ok(x.to_string()),
        Value::Float(x) => Err(Error::type_conversion(format!("{} is not finite", x))),
        Value::Decimal(s) | Value::String(s) => Ok(s.trim().to_string()),
        other => Err(unexpected("number", other)),
    }
}
