//! Rendering records as CSV and HTML tables.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use structtable::types::Date;
use structtable::{
    from_csv_str, record, to_csv_string, to_html_string, FormatConfig, HtmlFormat,
    ReflectColumnTitles, TableRenderer,
};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    full_name: String,
    email: String,
    joined: Date,
    admin: bool,
    password_hash: String,
}

record!(User {
    id: "ID",
    full_name,
    email: "E-Mail",
    joined,
    admin,
    password_hash: private,
});

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            full_name: "Alice Johnson".to_string(),
            email: "alice@example.com".to_string(),
            joined: Date::from_ymd(2023, 4, 1).ok_or("bad date")?,
            admin: true,
            password_hash: "x".to_string(),
        },
        User {
            id: 43,
            full_name: "Bob \"Bobby\" Smith".to_string(),
            email: "bob@example.com".to_string(),
            joined: Date::from_ymd(2024, 11, 15).ok_or("bad date")?,
            admin: false,
            password_hash: "y".to_string(),
        },
    ];

    let csv = to_csv_string(&users)?;
    println!("CSV:\n{}", csv);

    println!("HTML:\n{}", to_html_string(&users)?);

    // German number and date formats, zebra rows
    let mut renderer = TableRenderer::new(
        HtmlFormat::new()
            .with_caption("Benutzer")
            .with_row_styles("background:#f4f4f4", "background:#fff"),
    )
    .with_config(FormatConfig::german());
    renderer.write_records(&users, true, &ReflectColumnTitles::default())?;
    println!("German HTML ({}):", renderer.mime_type());
    println!("{}", String::from_utf8(renderer.into_bytes()?)?);

    // Private fields are not written, so they read back empty
    let back: Vec<User> = from_csv_str(&csv)?;
    assert_eq!(back[1].full_name, users[1].full_name);
    assert!(back[1].password_hash.is_empty());
    println!("✓ Read back {} users", back.len());

    Ok(())
}
