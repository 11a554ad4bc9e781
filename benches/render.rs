use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use structtable::types::Date;
use structtable::{
    format_value, from_csv_str, record, render, scan, to_csv_string, to_value, CsvFormat,
    FormatConfig, HtmlFormat, Value,
};

#[derive(Serialize, Deserialize, Clone)]
struct Product {
    sku: String,
    name: String,
    price: f64,
    quantity: u32,
    active: bool,
}

record!(Product {
    sku: "SKU",
    name: "Name",
    price: "Price",
    quantity: "Quantity",
    active: "Active",
});

#[derive(Serialize, Deserialize, Clone)]
struct Shipment {
    id: u64,
    product: Product,
    shipped: Date,
    note: Option<String>,
}

record!(Shipment { id: "ID", product: embed Product, shipped: "Shipped", note: "Note" });

fn products(size: u32) -> Vec<Product> {
    (0..size)
        .map(|i| Product {
            sku: format!("SKU{}", i),
            name: format!("Product; {}", i),
            price: 9.99 + f64::from(i),
            quantity: i,
            active: i % 2 == 0,
        })
        .collect()
}

fn benchmark_render_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_csv");

    for size in [10, 100, 1000].iter() {
        let records = products(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| to_csv_string(black_box(records)))
        });
    }
    group.finish();
}

fn benchmark_render_html(c: &mut Criterion) {
    let records = products(100);
    c.bench_function("render_html_100", |b| {
        b.iter(|| render(HtmlFormat::new(), black_box(&records), FormatConfig::new()))
    });
}

fn benchmark_render_embedded(c: &mut Criterion) {
    let shipments: Vec<Shipment> = products(100)
        .into_iter()
        .enumerate()
        .map(|(i, product)| Shipment {
            id: i as u64,
            product,
            shipped: Date::from_ymd(2024, 1 + (i % 12) as u32, 1).unwrap(),
            note: (i % 3 == 0).then(|| "fragile".to_string()),
        })
        .collect();
    let config = FormatConfig::german();

    c.bench_function("render_embedded_german_100", |b| {
        b.iter(|| render(CsvFormat::new(), black_box(&shipments), config.clone()))
    });
}

fn benchmark_read_csv(c: &mut Criterion) {
    let mut group = c.benchmark_group("read_csv");

    for size in [10, 100, 1000].iter() {
        let text = to_csv_string(&products(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| from_csv_str::<Product>(black_box(text)))
        });
    }
    group.finish();
}

fn benchmark_cells(c: &mut Criterion) {
    let mut group = c.benchmark_group("cells");
    let german = FormatConfig::german().with_thousands_separator(Some('.'));
    let float = Value::Float(1_234_567.891);
    let date = to_value(&Date::from_ymd(2024, 5, 17).unwrap()).unwrap();

    group.bench_function("format_float", |b| {
        b.iter(|| format_value(black_box(&float), &german))
    });
    group.bench_function("format_date", |b| {
        b.iter(|| format_value(black_box(&date), &german))
    });
    group.bench_function("scan_float", |b| {
        b.iter(|| scan::<f64>(black_box("1.234.567,891"), &german))
    });
    group.bench_function("scan_date", |b| {
        b.iter(|| scan::<Date>(black_box("17.05.2024"), &german))
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_render_csv,
    benchmark_render_html,
    benchmark_render_embedded,
    benchmark_read_csv,
    benchmark_cells
);
criterion_main!(benches);
