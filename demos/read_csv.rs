//! Cleaning up and reading a spreadsheet export.
//!
//! Run with: cargo run --example read_csv

use serde::{Deserialize, Serialize};
use structtable::csv::parse_rows_detect;
use structtable::types::Amount;
use structtable::{record, ColumnBinding, FormatConfig, ModifierList, TableReader};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct Booking {
    account: String,
    amount: Amount,
    booked: bool,
    memo: Option<String>,
}

record!(Booking {
    account: "Konto",
    amount: "Betrag",
    booked: "Gebucht",
    memo: "Notiz",
});

const EXPORT: &str = "\u{feff}B u c h u n g e n\r\n\
\r\n\
Konto;Betrag;Gebucht;Notiz\r\n\
AT-001;1.250,00;JA;Miete\r\n\
AT-002;-89,90;NEIN;\"Strom;\nNachzahlung\"\r\n\
AT-003;12,50;ja;\r\n\
Summe;1.172,60\r\n";

// Loaded from a config file in a real application
const MODIFIERS: &str = r#"["CompactSpacedStrings", "SetRowsWithNonUniformColumnsNil", "RemoveEmptyRows", "ReplaceNewlineWithSpace"]"#;

const COLUMNS: &str = r#"[
    {"index": 0, "field": "Konto"},
    {"index": 1, "field": "Betrag"},
    {"index": 2, "field": "Gebucht"},
    {"index": 3, "field": "Notiz"}
]"#;

fn main() -> Result<(), Box<dyn Error>> {
    let (rows, dialect) = parse_rows_detect(EXPORT)?;
    println!("Detected dialect: {:?}", dialect);
    println!("Raw rows: {}", rows.len());

    let modifiers: ModifierList = serde_json::from_str(MODIFIERS)?;
    println!("Modifiers: {:?}", modifiers.names());
    let rows = modifiers.modify(rows);

    let columns: Vec<ColumnBinding> = serde_json::from_str(COLUMNS)?;
    let reader = TableReader::new(columns).with_config(FormatConfig::german());
    let out = reader.read::<Booking, _>(&rows, 1)?;

    println!("Header: {:?}", out.header_rows);
    for booking in &out.records {
        println!("{:?}", booking);
    }

    let total: f64 = out.records.iter().map(|b| b.amount.0).sum();
    println!("Total: {:.2}", total);

    Ok(())
}
