//! Registering a handler for an own cell type.
//!
//! Run with: cargo run --example custom_handler

use serde::{Deserialize, Serialize};
use structtable::{
    record, render, scan, CsvFormat, Error, FormatConfig, Result, Value, ValueHandler,
};

/// Percentage stored as a ratio, shown as `42.5 %`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename = "Percent")]
struct Percent(f64);

struct PercentHandler;

impl ValueHandler for PercentHandler {
    fn format(&self, value: &Value, config: &FormatConfig) -> String {
        let ratio = value.as_f64().unwrap_or_default();
        format!("{} %", config.float.format(ratio * 100.0))
    }

    fn scan(&self, cell: &str, config: &FormatConfig) -> Result<Value> {
        let number = cell.trim().trim_end_matches('%').trim_end();
        let percent = config
            .float
            .parse(number)
            .map_err(|_| Error::parse("percentage", cell))?;
        Ok(Value::Float(percent / 100.0))
    }

    fn zero(&self) -> Value {
        Value::Float(0.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Region {
    name: String,
    share: Percent,
}

record!(Region { name: "Region", share: "Share" });

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = FormatConfig::german()
        .with_float_precision(Some(1))
        .with_handler("Percent", PercentHandler);

    let regions = vec![
        Region { name: "Nord".into(), share: Percent(0.425) },
        Region { name: "Süd".into(), share: Percent(0.575) },
    ];

    let bytes = render(CsvFormat::new().with_bom(false), &regions, config.clone())?;
    println!("{}", String::from_utf8(bytes)?);

    let share: Percent = scan("12,5 %", &config)?;
    assert_eq!(share, Percent(0.125));
    println!("✓ Scanned {:?}", share);

    match scan::<Percent>("viel", &config) {
        Err(err) => println!("✓ Rejected bad cell: {}", err),
        Ok(value) => println!("unexpected {:?}", value),
    }

    Ok(())
}
