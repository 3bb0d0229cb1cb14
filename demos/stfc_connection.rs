//! Call STFC_CONNECTION and STFC_STRUCTURE against the loopback runtime.
//!
//! Connection parameters are read from `SAPRFC_*` environment variables
//! (optionally from `demos/.env`). Set `RUST_LOG=sap_rfc_rs=debug` to see
//! connection events.

use sap_rfc_rs::{Connection, ConnectionParameters, LoopbackRuntime, Structure, Value};
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

fn main() -> sap_rfc_rs::Result<()> {
    dotenvy::from_path("demos/.env").ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut params = ConnectionParameters::from_env("SAPRFC_");
    if params.is_empty() {
        params = ConnectionParameters::new()
            .with("ashost", "10.0.0.1")
            .with("sysnr", "00")
            .with("client", "100")
            .with("user", "demo")
            .with("passwd", "secret")
            .with("lang", "EN");
    }
    println!("Connecting with {:?}", params);

    let mut conn = Connection::from_params(LoopbackRuntime::with_test_functions(), params)?;
    for (key, value) in conn.connection_attributes()? {
        println!("  {key}: {value}");
    }

    let mut args = BTreeMap::new();
    args.insert("REQUTEXT".to_string(), Value::from("Hello SAP!"));
    let result = conn.call("STFC_CONNECTION", &args)?;
    println!("\n--- STFC_CONNECTION ---");
    for (name, value) in &result {
        println!("{name}: {value}");
    }

    let mut row = Structure::new();
    row.insert("RFCFLOAT".into(), Value::Float(1.23456789));
    row.insert("RFCCHAR1".into(), Value::from("A"));
    row.insert("RFCCHAR4".into(), Value::from("EFGH"));
    row.insert("RFCINT4".into(), Value::Integer(345));
    row.insert("RFCHEX3".into(), Value::Bytes(b"fgh".to_vec()));
    row.insert("RFCDATE".into(), Value::from("20161231"));
    row.insert("RFCTIME".into(), Value::from("235959"));
    row.insert("RFCDATA1".into(), Value::from("hello"));

    let mut args = BTreeMap::new();
    args.insert("IMPORTSTRUCT".to_string(), Value::Structure(row.clone()));
    args.insert("RFCTABLE".to_string(), Value::Table(vec![row]));
    let result = conn.call("STFC_STRUCTURE", &args)?;
    println!("\n--- STFC_STRUCTURE ---");
    println!("RESPTEXT: {}", result["RESPTEXT"]);
    if let Some(echo) = result["ECHOSTRUCT"].as_structure() {
        for (field, value) in echo {
            println!("  ECHOSTRUCT-{field}: {value}");
        }
    }
    println!(
        "RFCTABLE rows: {}",
        result["RFCTABLE"].as_table().map_or(0, <[_]>::len)
    );

    println!("\n--- Function description ---");
    println!("{}", conn.function_description("STFC_STRUCTURE")?);

    conn.close()?;
    Ok(())
}
