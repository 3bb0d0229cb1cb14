//! Integration tests for parameter fill and result wrap through full calls.
//!
//! Run with: cargo test --test test_marshalling

use chrono::{NaiveDate, NaiveTime};
use sap_rfc_rs::{
    deserialize_result, Connection, ConnectionParameters, Direction, Encoding, Error, Fields,
    FunctionDescription, LoopbackRuntime, ParameterDescription, RfcType, ServerCall, Structure,
    TypeDescription, Value,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// `NAME` in, `COUNT` (length of `NAME`) out.
fn z_count() -> FunctionDescription {
    FunctionDescription::new("Z_COUNT")
        .with_parameter(ParameterDescription::new(
            "NAME",
            RfcType::Char,
            Direction::Import,
            10,
        ))
        .with_parameter(ParameterDescription::new(
            "COUNT",
            RfcType::Int,
            Direction::Export,
            0,
        ))
}

fn z_count_handler(call: &mut ServerCall<'_>) -> sap_rfc_rs::Result<()> {
    let name = call.get("NAME")?;
    let count = name.as_str().map_or(0, |s| s.chars().count());
    call.set("COUNT", count as i64)
}

fn all_scalars() -> Arc<TypeDescription> {
    Arc::new(
        TypeDescription::new("ZALL")
            .with_field("CHAR", RfcType::Char, 8)
            .with_field("NUM", RfcType::Num, 6)
            .with_field("DATE", RfcType::Date, 0)
            .with_field("TIME", RfcType::Time, 0)
            .with_bcd_field("BCD", 6, 2)
            .with_field("FLOAT", RfcType::Float, 0)
            .with_field("INT", RfcType::Int, 0)
            .with_field("INT2", RfcType::Int2, 0)
            .with_field("INT1", RfcType::Int1, 0)
            .with_field("INT8", RfcType::Int8, 0)
            .with_field("BYTE", RfcType::Byte, 4)
            .with_field("STRING", RfcType::String, 0)
            .with_field("XSTRING", RfcType::XString, 0),
    )
}

/// Echoes `INPUT` to `OUTPUT`, copies `ROWS` to `ROWS_OUT`, and bumps `CHANGE`.
fn z_echo() -> FunctionDescription {
    let row = all_scalars();
    let outer = Arc::new(
        TypeDescription::new("ZOUTER")
            .with_field("ID", RfcType::Int, 0)
            .with_nested_field("INNER", RfcType::Structure, row.clone()),
    );
    FunctionDescription::new("Z_ECHO")
        .with_parameter(ParameterDescription::structure("INPUT", Direction::Import, row.clone()).optional())
        .with_parameter(ParameterDescription::structure("OUTPUT", Direction::Export, row.clone()))
        .with_parameter(ParameterDescription::structure("NESTED", Direction::Changing, outer).optional())
        .with_parameter(
            ParameterDescription::new("CHANGE", RfcType::Int8, Direction::Changing, 0).optional(),
        )
        .with_parameter(ParameterDescription::table("ROWS", row.clone()))
        .with_parameter(ParameterDescription::table("ROWS_OUT", row))
}

fn z_echo_handler(call: &mut ServerCall<'_>) -> sap_rfc_rs::Result<()> {
    let input = call.get("INPUT")?;
    call.set("OUTPUT", input)?;
    let rows = call.get("ROWS")?;
    call.set("ROWS_OUT", rows)?;
    let change = call.get("CHANGE")?.to_i64().unwrap_or(0);
    call.set("CHANGE", change + 1)
}

fn connect(encoding: Encoding) -> Connection {
    let runtime = LoopbackRuntime::with_test_functions().with_encoding(encoding);
    runtime.register(z_count(), z_count_handler);
    runtime.register(z_echo(), z_echo_handler);
    Connection::from_params(runtime, ConnectionParameters::new().with("user", "tester")).unwrap()
}

fn sample_row(seed: i64) -> Structure {
    let mut row = Structure::new();
    row.insert("CHAR".into(), Value::from(format!("ROW{seed}")));
    row.insert("NUM".into(), Value::from(format!("{:06}", seed)));
    row.insert(
        "DATE".into(),
        Value::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
    );
    row.insert(
        "TIME".into(),
        Value::Time(NaiveTime::from_hms_opt(12, 30, seed as u32 % 60).unwrap()),
    );
    row.insert("BCD".into(), Value::Decimal(format!("-{seed}.25")));
    row.insert("FLOAT".into(), Value::Float(seed as f64 / 4.0));
    row.insert("INT".into(), Value::Integer(seed * 1000));
    row.insert("INT2".into(), Value::Integer(-seed));
    row.insert("INT1".into(), Value::Integer(seed % 256));
    row.insert("INT8".into(), Value::Integer(seed << 40));
    row.insert("BYTE".into(), Value::Bytes(vec![seed as u8, 0xAB, 0xCD, 0xEF]));
    row.insert("STRING".into(), Value::from("äöü variable"));
    row.insert("XSTRING".into(), Value::Bytes(vec![0; seed as usize]));
    row
}

fn map(entries: &[(&str, Value)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_name_count_scenario() {
    for encoding in [Encoding::Narrow, Encoding::Wide] {
        let mut conn = connect(encoding);
        let params = map(&[("NAME", Value::from("ABC"))]);

        let result = conn.call("Z_COUNT", &params).unwrap();
        assert_eq!(result, map(&[("COUNT", Value::Integer(3))]));

        conn.set_return_import_params(true);
        let result = conn.call("Z_COUNT", &params).unwrap();
        assert_eq!(
            result,
            map(&[("NAME", Value::from("ABC")), ("COUNT", Value::Integer(3))])
        );

        let err = conn.call("Z_COUNT", &map(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingParameter { ref name, .. } if name == "NAME"));

        let err = conn
            .call("Z_COUNT", &map(&[("NAME", Value::from("ABCDEFGHIJK"))]))
            .unwrap_err();
        assert!(matches!(err, Error::Conversion { ref parameter, .. } if parameter == "NAME"));
    }
}

#[test]
fn test_rstrip_policy() {
    let mut conn = connect(Encoding::Wide)
        .with_rstrip(false)
        .with_return_import_params(true);
    let result = conn
        .call("Z_COUNT", &map(&[("NAME", Value::from("AB"))]))
        .unwrap();
    assert_eq!(result["NAME"], Value::from("AB        "));
}

#[test]
fn test_key_set_matches_direction_filter() {
    let mut conn = connect(Encoding::Wide);
    let description = conn.function_description("Z_ECHO").unwrap();
    let result = conn.call("Z_ECHO", &map(&[])).unwrap();

    let expected: Vec<&str> = description
        .parameters
        .iter()
        .filter(|p| p.direction.is_output())
        .map(|p| p.name.as_str())
        .collect();
    let mut keys: Vec<&str> = result.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected_sorted = expected.clone();
    expected_sorted.sort_unstable();
    assert_eq!(keys, expected_sorted);
    assert!(!result.contains_key("INPUT"));

    conn.set_return_import_params(true);
    let result = conn.call("Z_ECHO", &map(&[])).unwrap();
    assert_eq!(result.len(), description.parameters.len());
}

#[test]
fn test_scalar_round_trip_through_call() {
    for encoding in [Encoding::Narrow, Encoding::Wide] {
        let mut conn = connect(encoding);
        let row = sample_row(7);
        let result = conn
            .call("Z_ECHO", &map(&[("INPUT", Value::Structure(row.clone()))]))
            .unwrap();
        assert_eq!(result["OUTPUT"], Value::Structure(row), "{encoding:?}");
    }
}

#[test]
fn test_table_rows_keep_order() {
    let mut conn = connect(Encoding::Wide);
    let rows: Vec<Structure> = (1..=25).map(sample_row).collect();
    let result = conn
        .call("Z_ECHO", &map(&[("ROWS", Value::Table(rows.clone()))]))
        .unwrap();
    assert_eq!(result["ROWS_OUT"], Value::Table(rows.clone()));
    assert_eq!(result["ROWS"].as_table().map(<[_]>::len), Some(25));
}

#[test]
fn test_changing_and_nested_structures() {
    let mut conn = connect(Encoding::Narrow);
    let mut nested = Structure::new();
    nested.insert("ID".into(), Value::Integer(9));
    nested.insert("INNER".into(), Value::Structure(sample_row(3)));

    let result = conn
        .call(
            "Z_ECHO",
            &map(&[
                ("CHANGE", Value::Integer(41)),
                ("NESTED", Value::Structure(nested.clone())),
            ]),
        )
        .unwrap();
    assert_eq!(result["CHANGE"], Value::Integer(42));
    assert_eq!(result["NESTED"], Value::Structure(nested));
}

#[test]
fn test_nested_field_errors() {
    let mut conn = connect(Encoding::Wide);
    let mut inner = Structure::new();
    inner.insert("INT1".into(), Value::Integer(300));
    let mut nested = Structure::new();
    nested.insert("INNER".into(), Value::Structure(inner));

    let err = conn
        .call("Z_ECHO", &map(&[("NESTED", Value::Structure(nested))]))
        .unwrap_err();
    match err {
        Error::Conversion {
            parameter,
            expected,
            value,
            ..
        } => {
            assert_eq!(parameter, "NESTED-INNER-INT1");
            assert_eq!(expected, RfcType::Int1);
            assert_eq!(value, "300");
        }
        other => panic!("Expected Conversion, got {other:?}"),
    }

    let mut row = Structure::new();
    row.insert("NOPE".into(), Value::Integer(1));
    let err = conn
        .call("Z_ECHO", &map(&[("ROWS", Value::Table(vec![row]))]))
        .unwrap_err();
    match err {
        Error::UnknownField {
            parameter,
            type_name,
            name,
        } => {
            assert_eq!(parameter, "ROWS[0]");
            assert_eq!(type_name, "ZALL");
            assert_eq!(name, "NOPE");
        }
        other => panic!("Expected UnknownField, got {other:?}"),
    }

    let mut inner = Structure::new();
    inner.insert("NOPE".into(), Value::Integer(1));
    let mut outer = Structure::new();
    outer.insert("INNER".into(), Value::Structure(inner));
    let err = conn
        .call("Z_ECHO", &map(&[("NESTED", Value::Structure(outer))]))
        .unwrap_err();
    assert!(matches!(err, Error::UnknownField { ref parameter, .. } if parameter == "NESTED-INNER"));
}

#[test]
fn test_unknown_parameter_is_case_sensitive() {
    let mut conn = connect(Encoding::Wide);
    let err = conn
        .call("Z_COUNT", &map(&[("name", Value::from("ABC"))]))
        .unwrap_err();
    assert!(err.is_binding());
    assert!(matches!(err, Error::UnknownParameter { ref name, .. } if name == "name"));
}

#[test]
fn test_named_field_aggregate() {
    #[derive(Serialize)]
    #[allow(non_snake_case)]
    struct Input {
        NAME: String,
    }

    #[derive(Deserialize)]
    #[allow(non_snake_case)]
    struct Output {
        COUNT: i64,
    }

    let mut conn = connect(Encoding::Wide);
    let fields = Fields::from_serialize(&Input {
        NAME: "HELLO".to_string(),
    })
    .unwrap();
    let result = conn.call("Z_COUNT", &fields).unwrap();
    let output: Output = deserialize_result(&result).unwrap();
    assert_eq!(output.COUNT, 5);

    let err = Fields::from_serialize(&vec![1, 2, 3]).unwrap_err();
    assert!(matches!(err, Error::InvalidParameters { .. }));
}

#[test]
fn test_aggregate_byte_fields() {
    #[derive(Serialize)]
    #[allow(non_snake_case)]
    struct Payload {
        CHAR: String,
        BYTE: Vec<u8>,
        XSTRING: Value,
    }

    #[derive(Serialize)]
    #[allow(non_snake_case)]
    struct Input {
        INPUT: Payload,
        ROWS: Vec<Payload>,
    }

    let payload = || Payload {
        CHAR: "BIN".to_string(),
        BYTE: vec![1, 2, 3],
        XSTRING: Value::Bytes(vec![0xCA, 0xFE]),
    };
    let mut conn = connect(Encoding::Wide);
    let fields = Fields::from_serialize(&Input {
        INPUT: payload(),
        ROWS: vec![payload(), payload()],
    })
    .unwrap();
    let result = conn.call("Z_ECHO", &fields).unwrap();

    let output = result["OUTPUT"].as_structure().unwrap();
    assert_eq!(output["CHAR"], Value::from("BIN"));
    assert_eq!(output["BYTE"], Value::Bytes(vec![1, 2, 3, 0]));
    assert_eq!(output["XSTRING"], Value::Bytes(vec![0xCA, 0xFE]));

    let rows = result["ROWS_OUT"].as_table().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1]["BYTE"], Value::Bytes(vec![1, 2, 3, 0]));
}

#[test]
fn test_hash_map_parameters() {
    let mut conn = connect(Encoding::Narrow);
    let mut params: HashMap<String, Value> = HashMap::new();
    params.insert("NAME".to_string(), Value::from("ÄÖÜ"));
    let result = conn.call("Z_COUNT", &params).unwrap();
    assert_eq!(result["COUNT"], Value::Integer(3));

    // narrow text is ISO-8859-1 only
    params.insert("NAME".to_string(), Value::from("€"));
    assert!(matches!(
        conn.call("Z_COUNT", &params),
        Err(Error::Conversion { .. })
    ));
}

#[test]
fn test_call_with_cached_description() {
    let mut conn = connect(Encoding::Wide);
    let description = conn.function_description("Z_COUNT").unwrap();
    for name in ["A", "BB", "CCC"] {
        let result = conn
            .call_with_description(description.clone(), &map(&[("NAME", Value::from(name))]))
            .unwrap();
        assert_eq!(result["COUNT"], Value::Integer(name.len() as i64));
    }
}
