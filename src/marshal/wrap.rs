//! Result unmarshaller: call container -> application values.

use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::protocol::buffer::RecordBuffer;
use crate::protocol::container::{Cell, FunctionContainer, Record};
use crate::protocol::decode::{decode_bcd, decode_text, parse_date, parse_time};
use crate::protocol::types::{Encoding, RfcType, Structure, Value};

/// Name-keyed result of a call.
pub type CallResult = BTreeMap<String, Value>;

/// Extract the result mapping from an invoked container.
///
/// Unless `return_import_params` is set, only parameters that carry data
/// back to the caller (export, changing, tables) are included.
pub fn wrap_result(
    container: &FunctionContainer,
    return_import_params: bool,
    rstrip: bool,
) -> Result<CallResult> {
    let description = container.description();
    let mut result = CallResult::new();
    for (index, param) in description.parameters.iter().enumerate() {
        if !return_import_params && !param.direction.is_output() {
            continue;
        }
        let cell = container
            .cell_at(index)
            .ok_or_else(|| Error::InvalidMetadata {
                name: param.name.clone(),
                message: "container has no cell for parameter".to_string(),
            })?;
        let value = wrap_cell(
            cell,
            param.parameter_type,
            param.decimals,
            container.encoding(),
            rstrip,
        )?;
        result.insert(param.name.clone(), value);
    }
    Ok(result)
}

/// Extract a single parameter by name, regardless of direction.
pub fn wrap_parameter(container: &FunctionContainer, name: &str, rstrip: bool) -> Result<Value> {
    let description = container.description();
    let param = description
        .parameter(name)
        .ok_or_else(|| Error::UnknownParameter {
            function: description.name.clone(),
            name: name.to_string(),
        })?;
    let cell = container.cell(name).ok_or_else(|| Error::InvalidMetadata {
        name: name.to_string(),
        message: "container has no cell for parameter".to_string(),
    })?;
    wrap_cell(
        cell,
        param.parameter_type,
        param.decimals,
        container.encoding(),
        rstrip,
    )
}

/// Convert a call result into a typed value through serde.
pub fn deserialize_result<T: DeserializeOwned>(result: &CallResult) -> Result<T> {
    let json = serde_json::to_value(result)?;
    Ok(serde_json::from_value(json)?)
}

fn wrap_cell(
    cell: &Cell,
    rfc_type: RfcType,
    decimals: u32,
    encoding: Encoding,
    rstrip: bool,
) -> Result<Value> {
    match cell {
        Cell::Scalar(buf) => wrap_scalar(buf, 0, buf.len(), rfc_type, decimals, encoding, rstrip),
        Cell::String(s) => Ok(Value::String(s.clone())),
        Cell::XString(b) => Ok(Value::Bytes(b.clone())),
        Cell::Structure(record) => Ok(Value::Structure(wrap_record(record, rstrip)?)),
        Cell::Table(table) => {
            let rows = table
                .iter()
                .map(|row| wrap_record(row, rstrip))
                .collect::<Result<Vec<_>>>()?;
            Ok(Value::Table(rows))
        }
    }
}

fn wrap_record(record: &Record, rstrip: bool) -> Result<Structure> {
    let encoding = record.encoding();
    let mut fields = Structure::new();
    for (index, field) in record.type_desc().fields.iter().enumerate() {
        let value = match record.deep(index) {
            Some(cell) => wrap_cell(cell, field.field_type, field.decimals, encoding, rstrip)?,
            None => wrap_scalar(
                record.flat(),
                field.offset(encoding),
                field.length(encoding),
                field.field_type,
                field.decimals,
                encoding,
                rstrip,
            )?,
        };
        fields.insert(field.name.clone(), value);
    }
    Ok(fields)
}

fn wrap_scalar(
    buf: &RecordBuffer,
    offset: usize,
    length: usize,
    rfc_type: RfcType,
    decimals: u32,
    encoding: Encoding,
    rstrip: bool,
) -> Result<Value> {
    let value = match rfc_type {
        RfcType::Char => {
            let text = decode_text(buf.slot(offset, length)?, encoding)?;
            if rstrip {
                Value::String(text.trim_end_matches(' ').to_string())
            } else {
                Value::String(text)
            }
        }
        RfcType::Num => Value::String(decode_text(buf.slot(offset, length)?, encoding)?),
        RfcType::Date => {
            let text = decode_text(buf.slot(offset, length)?, encoding)?;
            parse_date(&text)?.map_or(Value::Null, Value::Date)
        }
        RfcType::Time => {
            let text = decode_text(buf.slot(offset, length)?, encoding)?;
            parse_time(&text)?.map_or(Value::Null, Value::Time)
        }
        RfcType::Bcd => Value::Decimal(decode_bcd(buf.slot(offset, length)?, decimals)?),
        RfcType::Float => Value::Float(buf.read_f64_le(offset)?),
        RfcType::Int => Value::Integer(buf.read_i32_le(offset)?.into()),
        RfcType::Int2 => Value::Integer(buf.read_i16_le(offset)?.into()),
        RfcType::Int1 => Value::Integer(buf.read_u8(offset)?.into()),
        RfcType::Int8 => Value::Integer(buf.read_i64_le(offset)?),
        RfcType::Byte => Value::Bytes(buf.slot(offset, length)?.to_vec()),
        RfcType::Table | RfcType::Structure | RfcType::String | RfcType::XString => {
            return Err(Error::type_conversion(format!(
                "{} cannot be read from a flat field",
                rfc_type
            )))
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marshal::fill::{fill_function, fill_parameter};
    use crate::protocol::types::{Direction, FunctionDescription, ParameterDescription, TypeDescription};
    use chrono::{NaiveDate, NaiveTime};
    use serde::Deserialize;
    use std::sync::Arc;

    fn make_test_function() -> Arc<FunctionDescription> {
        Arc::new(
            FunctionDescription::new("Z_COUNT")
                .with_parameter(ParameterDescription::new(
                    "NAME",
                    RfcType::Char,
                    Direction::Import,
                    10,
                ))
                .with_parameter(ParameterDescription::new(
                    "COUNT",
                    RfcType::Num,
                    Direction::Export,
                    3,
                )),
        )
    }

    fn make_scalar_function() -> Arc<FunctionDescription> {
        let row = Arc::new(
            TypeDescription::new("ZSCALARS")
                .with_field("CHAR", RfcType::Char, 6)
                .with_field("NUM", RfcType::Num, 4)
                .with_field("DATE", RfcType::Date, 0)
                .with_field("TIME", RfcType::Time, 0)
                .with_bcd_field("BCD", 5, 3)
                .with_field("FLOAT", RfcType::Float, 0)
                .with_field("INT", RfcType::Int, 0)
                .with_field("INT2", RfcType::Int2, 0)
                .with_field("INT1", RfcType::Int1, 0)
                .with_field("INT8", RfcType::Int8, 0)
                .with_field("BYTE", RfcType::Byte, 3)
                .with_field("STRING", RfcType::String, 0)
                .with_field("XSTRING", RfcType::XString, 0),
        );
        Arc::new(
            FunctionDescription::new("Z_SCALARS")
                .with_parameter(ParameterDescription::structure(
                    "IMPORTSTRUCT",
                    Direction::Import,
                    row.clone(),
                ))
                .with_parameter(ParameterDescription::table("RESULTTAB", row)),
        )
    }

    fn sample_row() -> Structure {
        let mut row = Structure::new();
        row.insert("CHAR".into(), Value::from("Ünï"));
        row.insert("NUM".into(), Value::from("0042"));
        row.insert(
            "DATE".into(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()),
        );
        row.insert(
            "TIME".into(),
            Value::Time(NaiveTime::from_hms_opt(23, 59, 1).unwrap()),
        );
        row.insert("BCD".into(), Value::Decimal("-1234.567".into()));
        row.insert("FLOAT".into(), Value::Float(-0.125));
        row.insert("INT".into(), Value::Integer(-2_000_000_000));
        row.insert("INT2".into(), Value::Integer(-300));
        row.insert("INT1".into(), Value::Integer(255));
        row.insert("INT8".into(), Value::Integer(i64::MIN));
        row.insert("BYTE".into(), Value::Bytes(vec![1, 2, 3]));
        row.insert("STRING".into(), Value::from("variable text"));
        row.insert("XSTRING".into(), Value::Bytes(vec![0xDE, 0xAD]));
        row
    }

    fn with_char(mut row: Structure, text: &str) -> Structure {
        row.insert("CHAR".into(), Value::from(text));
        row
    }

    #[test]
    fn test_direction_filter() {
        for encoding in [Encoding::Narrow, Encoding::Wide] {
            let mut container = FunctionContainer::new(make_test_function(), encoding).unwrap();
            let mut params = BTreeMap::new();
            params.insert("NAME".to_string(), Value::from("ABC"));
            fill_function(&mut container, &params).unwrap();
            fill_parameter(&mut container, "COUNT", &Value::Integer(7)).unwrap();

            let result = wrap_result(&container, false, true).unwrap();
            assert_eq!(result.keys().collect::<Vec<_>>(), vec!["COUNT"]);
            assert_eq!(result["COUNT"], Value::from("007"));

            let result = wrap_result(&container, true, true).unwrap();
            assert_eq!(result.len(), 2);
            assert_eq!(result["NAME"], Value::from("ABC"));

            let result = wrap_result(&container, true, false).unwrap();
            assert_eq!(result["NAME"], Value::from("ABC       "));
        }
    }

    #[test]
    fn test_scalar_round_trip_both_encodings() {
        for encoding in [Encoding::Narrow, Encoding::Wide] {
            let mut container = FunctionContainer::new(make_scalar_function(), encoding).unwrap();
            fill_parameter(&mut container, "IMPORTSTRUCT", &Value::Structure(sample_row())).unwrap();
            let wrapped = wrap_parameter(&container, "IMPORTSTRUCT", true).unwrap();
            assert_eq!(wrapped, Value::Structure(sample_row()), "{encoding:?}");
        }
    }

    #[test]
    fn test_table_order_preserved() {
        let rows: Vec<Structure> = ["A", "B", "C", "D"]
            .iter()
            .map(|t| with_char(sample_row(), t))
            .collect();
        let mut container = FunctionContainer::new(make_scalar_function(), Encoding::Wide).unwrap();
        fill_parameter(&mut container, "RESULTTAB", &Value::Table(rows.clone())).unwrap();

        let result = wrap_result(&container, false, true).unwrap();
        assert_eq!(result.keys().collect::<Vec<_>>(), vec!["RESULTTAB"]);
        assert_eq!(result["RESULTTAB"], Value::Table(rows));
    }

    #[test]
    fn test_initial_values() {
        let container = FunctionContainer::new(make_scalar_function(), Encoding::Narrow).unwrap();
        let wrapped = wrap_parameter(&container, "IMPORTSTRUCT", false).unwrap();
        let row = wrapped.as_structure().unwrap();
        assert_eq!(row["CHAR"], Value::from("      "));
        assert_eq!(row["NUM"], Value::from("0000"));
        assert_eq!(row["DATE"], Value::Null);
        assert_eq!(row["TIME"], Value::Time(NaiveTime::from_hms_opt(0, 0, 0).unwrap()));
        assert_eq!(row["BCD"], Value::Decimal("0.000".into()));
        assert_eq!(row["INT"], Value::Integer(0));
        assert_eq!(row["BYTE"], Value::Bytes(vec![0, 0, 0]));
        assert_eq!(row["STRING"], Value::from(""));
    }

    #[test]
    fn test_wrap_unknown_parameter() {
        let container = FunctionContainer::new(make_test_function(), Encoding::Wide).unwrap();
        assert!(matches!(
            wrap_parameter(&container, "NOPE", true),
            Err(Error::UnknownParameter { .. })
        ));
    }

    #[test]
    fn test_deserialize_result() {
        #[derive(Deserialize)]
        #[allow(non_snake_case)]
        struct Output {
            COUNT: String,
        }

        let mut container = FunctionContainer::new(make_test_function(), Encoding::Wide).unwrap();
        fill_parameter(&mut container, "COUNT", &Value::from("12")).unwrap();
        let result = wrap_result(&container, false, true).unwrap();
        let output: Output = deserialize_result(&result).unwrap();
        assert_eq!(output.COUNT, "012");
    }
}
