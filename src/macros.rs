/// Implements [`Record`](crate::Record) for a struct from a compact field list.
///
/// Fields are listed in serde order. Each entry is one of:
///
/// - `name`: a plain field
/// - `name: "Title"`: a field with a title in the `col` namespace
/// - `name: ignore`: a field titled with the ignore sentinel `-`
/// - `name: private`: a field hidden from tables
/// - `name: embed Type`: a field whose own record fields are spliced in
///
/// # Examples
///
/// ```rust
/// use serde::Serialize;
/// use structtable::{flatten, record, Record};
///
/// #[derive(Serialize)]
/// struct Address { city: String }
/// record!(Address { city });
///
/// #[derive(Serialize)]
/// struct Customer { id: u32, name: String, address: Address, note: String, token: String }
/// record!(Customer {
///     id: "ID",
///     name,
///     address: embed Address,
///     note: ignore,
///     token: private,
/// });
///
/// let names: Vec<_> = flatten(&Customer::schema()).iter().map(|f| f.name).collect();
/// assert_eq!(names, vec!["id", "name", "city", "note"]);
/// ```
#[macro_export]
macro_rules! record {
    ($ty:ident { $($body:tt)* }) => {
        impl $crate::Record for $ty {
            fn schema() -> $crate::Schema {
                $crate::record!(@fields $crate::Schema::new(stringify!($ty)); $($body)*)
            }
        }
    };

    (@fields $schema:expr;) => {
        $schema
    };

    (@fields $schema:expr; $field:ident : embed $sub:ty $(, $($rest:tt)*)?) => {
        $crate::record!(
            @fields $schema.field($crate::Field::embedded(
                stringify!($field),
                <$sub as $crate::Record>::schema,
            ));
            $($($rest)*)?
        )
    };

    (@fields $schema:expr; $field:ident : ignore $(, $($rest:tt)*)?) => {
        $crate::record!(
            @fields $schema.field($crate::Field::new(stringify!($field)).ignore());
            $($($rest)*)?
        )
    };

    (@fields $schema:expr; $field:ident : private $(, $($rest:tt)*)?) => {
        $crate::record!(
            @fields $schema.field($crate::Field::new(stringify!($field)).private());
            $($($rest)*)?
        )
    };

    (@fields $schema:expr; $field:ident : $title:literal $(, $($rest:tt)*)?) => {
        $crate::record!(
            @fields $schema.field($crate::Field::new(stringify!($field)).title($title));
            $($($rest)*)?
        )
    };

    (@fields $schema:expr; $field:ident $(, $($rest:tt)*)?) => {
        $crate::record!(
            @fields $schema.field($crate::Field::new(stringify!($field)));
            $($($rest)*)?
        )
    };
}
