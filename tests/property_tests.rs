//! Property-based tests for the column mapper and the coercion engine.

use proptest::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use structtable::{
    format_value, scan, to_value, ColumnMapper, ColumnMapping, FieldDescriptor, FormatConfig,
    ReflectColumnTitles,
};

fn leak(name: String) -> &'static str {
    Box::leak(name.into_boxed_str())
}

/// Distinct field names, each optionally titled with the ignore sentinel.
fn field_list() -> impl Strategy<Value = Vec<FieldDescriptor>> {
    prop::collection::vec(("[A-Za-z_]{0,10}", any::<bool>()), 0..12).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(index, (name, ignored))| {
                let name = leak(format!("F{index}{name}"));
                let tags = if ignored {
                    vec![("col".to_string(), "-".to_string())]
                } else {
                    Vec::new()
                };
                FieldDescriptor {
                    name,
                    path: vec![name],
                    tags,
                }
            })
            .collect()
    })
}

fn mapper_for(remaps: &[(usize, usize)], ignores: &[usize]) -> ReflectColumnTitles {
    let mapper = remaps
        .iter()
        .fold(ReflectColumnTitles::new(), |m, &(field, column)| m.with_map_index(field, column));
    ignores.iter().fold(mapper, |m, &field| m.with_ignore_index(field))
}

fn assigned_columns(mapping: &ColumnMapping, fields: usize) -> Vec<usize> {
    (0..fields).filter_map(|i| mapping.column_of(i)).collect()
}

fn roundtrip<T>(value: &T, config: &FormatConfig) -> T
where
    T: Serialize + DeserializeOwned,
{
    let cell = format_value(&to_value(value).unwrap(), config);
    scan(&cell, config).unwrap()
}

proptest! {
    #[test]
    fn prop_mapping_is_deterministic(
        fields in field_list(),
        remaps in prop::collection::vec((0usize..12, 0usize..14), 0..6),
        ignores in prop::collection::vec(0usize..12, 0..3),
    ) {
        let mapper = mapper_for(&remaps, &ignores);
        prop_assert_eq!(mapper.map_columns(&fields), mapper.map_columns(&fields));
    }

    #[test]
    fn prop_columns_are_dense_and_distinct(
        fields in field_list(),
        remaps in prop::collection::vec((0usize..12, 0usize..14), 0..6),
        ignores in prop::collection::vec(0usize..12, 0..3),
    ) {
        let mapping = mapper_for(&remaps, &ignores).map_columns(&fields);
        let mut columns = assigned_columns(&mapping, fields.len());
        let n = columns.len();
        columns.sort_unstable();
        prop_assert_eq!(columns, (0..n).collect::<Vec<_>>());
        prop_assert_eq!(mapping.num_columns(), n);
        prop_assert_eq!(mapping.titles().len(), n);
    }

    #[test]
    fn prop_ignore_removes_exactly_one_column(fields in field_list(), pick in any::<prop::sample::Index>()) {
        let visible: Vec<usize> = (0..fields.len())
            .filter(|&i| fields[i].title("col") != Some("-"))
            .collect();
        prop_assume!(!visible.is_empty());
        let target = visible[pick.index(visible.len())];

        let base = ReflectColumnTitles::new().map_columns(&fields);
        let ignored = ReflectColumnTitles::new().with_ignore_index(target).map_columns(&fields);
        let title = base.titles()[base.column_of(target).unwrap()].clone();

        prop_assert_eq!(ignored.num_columns() + 1, base.num_columns());
        prop_assert!(!ignored.titles().contains(&title));
        prop_assert_eq!(ignored.column_of(target), None);
    }

    #[test]
    fn prop_i64_roundtrip(n in any::<i64>()) {
        prop_assert_eq!(roundtrip(&n, &FormatConfig::new()), n);
    }

    #[test]
    fn prop_u32_roundtrip(n in any::<u32>()) {
        prop_assert_eq!(roundtrip(&n, &FormatConfig::german()), n);
    }

    #[test]
    fn prop_bool_roundtrip(b in any::<bool>()) {
        prop_assert_eq!(roundtrip(&b, &FormatConfig::new()), b);
        prop_assert_eq!(roundtrip(&b, &FormatConfig::german()), b);
    }

    #[test]
    fn prop_string_roundtrip(s in ".*") {
        prop_assert_eq!(roundtrip(&s, &FormatConfig::new()), s);
    }

    #[test]
    fn prop_f64_natural_roundtrip(x in -1.0e12f64..1.0e12) {
        prop_assert_eq!(roundtrip(&x, &FormatConfig::new()), x);
        prop_assert_eq!(roundtrip(&x, &FormatConfig::german()), x);
    }

    #[test]
    fn prop_f64_precision_roundtrip(x in -1.0e9f64..1.0e9, precision in 0usize..6) {
        let config = FormatConfig::german()
            .with_thousands_separator(Some('.'))
            .with_float_precision(Some(precision));
        let back = roundtrip(&x, &config);
        let tolerance = 0.5 * 10f64.powi(-(precision as i32)) + x.abs() * 1e-12;
        prop_assert!((back - x).abs() <= tolerance, "{} came back as {}", x, back);
    }
}
