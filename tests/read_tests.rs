use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use structtable::csv::{parse_rows, parse_rows_detect, CsvDialect};
use structtable::modifier::{RemoveEmptyRows, SetRowsWithNonUniformColumnsNil};
use structtable::types::{Amount, Date, Duration};
use structtable::{
    from_csv_str, record, to_csv_string, ColumnBinding, Error, FormatConfig, ModifierList,
    Result, RowSource, StringRows, TableReader, UnboundFields,
};

#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
struct Person {
    name: String,
    age: i32,
    city: String,
}

record!(Person { name: "Name", age: "Age", city: "City" });

fn bindings() -> Vec<ColumnBinding> {
    vec![
        ColumnBinding::new(0, "Name"),
        ColumnBinding::new(1, "Age"),
        ColumnBinding::new(2, "City"),
    ]
}

#[test]
fn test_read_with_header_rows() {
    let rows = StringRows::from(vec![
        vec!["Name", "Age", "City"],
        vec!["Ann", "30", "Linz"],
        vec!["Bo", "41", "Graz"],
    ]);
    let out = TableReader::new(bindings()).read::<Person, _>(&rows, 1).unwrap();

    assert_eq!(out.header_rows, vec![vec!["Name", "Age", "City"]]);
    assert_eq!(
        out.records,
        vec![
            Person { name: "Ann".into(), age: 30, city: "Linz".into() },
            Person { name: "Bo".into(), age: 41, city: "Graz".into() },
        ]
    );
}

#[test]
fn test_partial_bindings_leave_zero_values() {
    let rows = StringRows::from(vec![vec!["Linz", "ignored", "Ann"]]);
    let reader = TableReader::new(vec![ColumnBinding::new(2, "Name"), ColumnBinding::new(0, "City")]);
    let out = reader.read::<Person, _>(&rows, 0).unwrap();
    assert_eq!(
        out.records,
        vec![Person { name: "Ann".into(), age: 0, city: "Linz".into() }]
    );
}

#[test]
fn test_scan_failure_reports_position() {
    let rows = StringRows::from(vec![
        vec!["Name", "Age", "City"],
        vec!["Ann", "30", "Linz"],
        vec!["Bo", "forty-one", "Graz"],
    ]);
    let mut dest = Vec::new();
    let err = TableReader::new(bindings())
        .read_into::<Person, _>(&rows, &mut dest, 1)
        .unwrap_err();

    match &err {
        Error::Scan { row, column, value, source } => {
            assert_eq!(*row, 2);
            assert_eq!(*column, 1);
            assert_eq!(value, "forty-one");
            assert!(matches!(**source, Error::Parse { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(dest.is_empty());
}

#[test]
fn test_unknown_binding() {
    let rows = StringRows::from(vec![vec!["x"]]);
    let err = TableReader::new(vec![ColumnBinding::new(0, "Zip")])
        .read::<Person, _>(&rows, 0)
        .unwrap_err();
    assert!(matches!(err, Error::UnmappedField { ref field, .. } if field == "Zip"));
}

#[test]
fn test_binding_column_out_of_bounds() {
    let rows = StringRows::from(vec![vec!["Ann", "30"]]);
    let err = TableReader::new(bindings()).read::<Person, _>(&rows, 0).unwrap_err();
    assert!(matches!(err, Error::ColumnOutOfBounds { row: 0, column: 2, len: 2 }));
}

#[test]
fn test_row_out_of_bounds() {
    let rows = StringRows::from(vec![vec!["Ann", "30", "Linz"]]);
    let err = TableReader::new(bindings())
        .read_row::<Person, _>(&rows, 3)
        .unwrap_err();
    assert!(matches!(err, Error::RowOutOfBounds { index: 3, len: 1 }));
}

/// Source that serves a fixed-width text file.
struct FixedWidth {
    rows: Vec<Vec<String>>,
}

impl FixedWidth {
    fn parse(text: &str, widths: &[usize]) -> Self {
        let rows = text
            .lines()
            .map(|line| {
                let mut start = 0;
                widths
                    .iter()
                    .map(|width| {
                        let end = (start + width).min(line.len());
                        let cell = line[start.min(end)..end].trim().to_string();
                        start = end;
                        cell
                    })
                    .collect()
            })
            .collect();
        FixedWidth { rows }
    }
}

impl RowSource for FixedWidth {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn raw_row(&self, index: usize) -> Result<&[String]> {
        self.rows
            .get(index)
            .map(Vec::as_slice)
            .ok_or(Error::RowOutOfBounds { index, len: self.rows.len() })
    }
}

#[test]
fn test_custom_row_source() {
    let source = FixedWidth::parse("Ann   30 Linz\nBo    41 Graz\n", &[6, 3, 5]);
    let out = TableReader::by_position().read::<Person, _>(&source, 0).unwrap();
    assert_eq!(out.records[1], Person { name: "Bo".into(), age: 41, city: "Graz".into() });
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
enum Status {
    Active,
    Suspended,
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Member {
    id: u64,
    status: Status,
    joined: Date,
    fee: Amount,
    session: Duration,
    nickname: Option<String>,
    premium: bool,
    score: f64,
}

record!(Member { id, status, joined, fee, session, nickname, premium, score });

#[test]
fn test_typed_cells_german() {
    let rows = StringRows::from(vec![vec![
        "1.024", "Suspended", "31.01.2024", "1.250,75", "0:45:30.500", "", "nein", "0,5",
    ]]);
    let reader = TableReader::by_position().with_config(FormatConfig::german().with_thousands_separator(Some('.')));
    let member: Member = reader.read_row(&rows, 0).unwrap();

    assert_eq!(member.id, 1024);
    assert_eq!(member.status, Status::Suspended);
    assert_eq!(member.joined, Date::from_ymd(2024, 1, 31).unwrap());
    assert_eq!(member.fee, Amount(1250.75));
    assert_eq!(member.session.0.num_milliseconds(), 2_730_500);
    assert_eq!(member.nickname, None);
    assert!(!member.premium);
    assert_eq!(member.score, 0.5);
}

#[test]
fn test_unbound_custom_types_get_handler_zero() {
    let rows = StringRows::from(vec![vec!["7"]]);
    let reader = TableReader::new(vec![ColumnBinding::new(0, "id")]);
    let member: Member = reader.read_row(&rows, 0).unwrap();

    assert_eq!(member.id, 7);
    assert_eq!(member.status, Status::Active);
    assert_eq!(member.joined, Date::from_ymd(1970, 1, 1).unwrap());
    assert_eq!(member.fee, Amount(0.0));
    assert_eq!(member.session.0.num_milliseconds(), 0);
    assert_eq!(member.nickname, None);
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
struct Address {
    street: String,
    zip: String,
}

record!(Address { street: "Street", zip: "ZIP" });

#[derive(Serialize, Deserialize, Debug, PartialEq, Default)]
struct Customer {
    name: String,
    address: Address,
    token: String,
}

record!(Customer { name: "Name", address: embed Address, token: private });

#[test]
fn test_embedded_fields_are_bound_by_title() {
    let rows = StringRows::from(vec![vec!["4020", "Ann", "Main St 1"]]);
    let reader = TableReader::new(vec![
        ColumnBinding::new(0, "ZIP"),
        ColumnBinding::new(1, "Name"),
        ColumnBinding::new(2, "Street"),
    ]);
    let customer: Customer = reader.read_row(&rows, 0).unwrap();
    assert_eq!(
        customer,
        Customer {
            name: "Ann".into(),
            address: Address { street: "Main St 1".into(), zip: "4020".into() },
            token: String::new(),
        }
    );
}

#[test]
fn test_messy_export_with_modifiers() {
    let text = "\u{feff}Quarterly Report\r\n\r\nName;Age;City\r\nAnn;30;Linz\r\nBo;41;Graz\r\nTotal;71\r\n";
    let (rows, dialect) = parse_rows_detect(text).unwrap();
    assert_eq!(dialect, CsvDialect { delimiter: ';', newline: "\r\n".into() });

    let modifiers = ModifierList::new()
        .with(SetRowsWithNonUniformColumnsNil)
        .with(RemoveEmptyRows);
    let rows = modifiers.modify(rows);

    let out = TableReader::new(bindings()).read::<Person, _>(&rows, 1).unwrap();
    assert_eq!(out.header_rows, vec![vec!["Name", "Age", "City"]]);
    assert_eq!(out.records.len(), 2);
    assert_eq!(out.records[0].city, "Linz");
}

#[test]
fn test_parse_rows_rejects_bad_dialect() {
    let dialect = CsvDialect { delimiter: ',', newline: "\t".into() };
    assert!(parse_rows("a,b", &dialect).is_err());
}

#[test]
fn test_csv_round_trip_with_quotes() {
    let people = vec![
        Person { name: "Smith; John".into(), age: 52, city: "St. \"Pölten\"".into() },
        Person { name: String::new(), age: -1, city: "Wels".into() },
    ];
    let csv = to_csv_string(&people).unwrap();
    let back: Vec<Person> = from_csv_str(&csv).unwrap();
    assert_eq!(back, people);
}

#[test]
fn test_bindings_from_config() {
    let json = r#"[{"index":2,"field":"Name"},{"index":0,"field":"Age"}]"#;
    let bindings: Vec<ColumnBinding> = serde_json::from_str(json).unwrap();
    let rows = StringRows::from(vec![vec!["12", "x", "Ann"]]);
    let person: Person = TableReader::new(bindings).read_row(&rows, 0).unwrap();
    assert_eq!(person, Person { name: "Ann".into(), age: 12, city: String::new() });
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Birth {
    name: String,
    born: NaiveDate,
}

record!(Birth { name, born });

#[test]
fn test_unbound_field_without_zero_names_row_and_field() {
    let rows = StringRows::from(vec![vec!["Ann"]]);
    let err = TableReader::new(vec![ColumnBinding::new(0, "name")])
        .read::<Birth, _>(&rows, 0)
        .unwrap_err();
    match err {
        Error::Unfilled { row, field, .. } => {
            assert_eq!(row, 0);
            assert_eq!(field, "born");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Visit {
    name: String,
    #[serde(default = "epoch")]
    seen: NaiveDate,
    note: Option<String>,
}

record!(Visit { name, seen, note });

#[test]
fn test_skipped_unbound_fields_use_serde_defaults() {
    let rows = StringRows::from(vec![vec!["Bo"], vec!["Cy"]]);
    let out = TableReader::new(vec![ColumnBinding::new(0, "name")])
        .with_unbound_fields(UnboundFields::Skip)
        .read::<Visit, _>(&rows, 0)
        .unwrap();
    assert_eq!(
        out.records,
        vec![
            Visit { name: "Bo".into(), seen: epoch(), note: None },
            Visit { name: "Cy".into(), seen: epoch(), note: None },
        ]
    );
}

#[test]
fn test_bound_plain_date_reads_in_either_mode() {
    let rows = StringRows::from(vec![vec!["Ann", "1990-04-02"]]);
    for unbound in [UnboundFields::Zero, UnboundFields::Skip] {
        let birth: Birth = TableReader::by_position()
            .with_unbound_fields(unbound)
            .read_row(&rows, 0)
            .unwrap();
        assert_eq!(birth.born, NaiveDate::from_ymd_opt(1990, 4, 2).unwrap());
    }
}
