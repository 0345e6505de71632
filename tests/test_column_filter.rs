use csv_sieve::column_filter::{ColumnFilter, ColumnTypeFilter};
use csv_sieve::selector::{FilterOptions, PivotValues, TypedValue};

fn filter(selector: &str) -> ColumnFilter {
    ColumnFilter::new(Some(selector), FilterOptions::default()).unwrap()
}

#[test]
fn test_empty_selector_projects_unchanged() {
    let unfiltered = ColumnFilter::new(None, FilterOptions::default()).unwrap();
    assert_eq!(unfiltered.process("a;b;c"), Some("a;b;c".to_string()));
}

#[test]
fn test_projection_order_follows_declaration_not_numeric_order() {
    assert_eq!(filter("3,1").process("a;b;c;d"), Some("d;b".to_string()));
}

#[test]
fn test_deduplicated_positions_project_once() {
    assert_eq!(filter("1,1,1-2").process("a;b;c"), Some("b;c".to_string()));
}

#[test]
fn test_concrete_extraction_scenario() {
    let projector = filter("0,2");
    assert_eq!(projector.process("a0;a1;a2"), Some("a0;a2".to_string()));
    assert_eq!(projector.process("b0;b1;b2"), Some("b0;b2".to_string()));
}

#[test]
fn test_number_pivots_emit_labels_on_match() {
    let pivots = filter("0,1:<10,1:10-50,1:>50");
    assert_eq!(pivots.process("Fink;9"), Some("Fink;<10".to_string()));
    assert_eq!(pivots.process("Haas;34"), Some("Haas;10-50".to_string()));
    assert_eq!(pivots.process("Rank;60"), Some("Rank;>50".to_string()));
}

#[test]
fn test_date_pivots_with_custom_format() {
    let options = FilterOptions {
        date_format: "%d.%m.%Y".to_string(),
        ..FilterOptions::default()
    };
    let pivots = ColumnFilter::new(
        Some("0,2:<1.1.2013,2:1.1.2013-31.12.2014,2:>31.12.2014"),
        options,
    )
    .unwrap();
    assert_eq!(
        pivots.process("Haas;x;15.06.2012"),
        Some("Haas;<1.1.2013".to_string())
    );
    assert_eq!(
        pivots.process("Gent;x;15.06.2014"),
        Some("Gent;1.1.2013-31.12.2014".to_string())
    );
    assert_eq!(
        pivots.process("Fink;x;15.06.2015"),
        Some("Fink;>31.12.2014".to_string())
    );
}

#[test]
fn test_indicator_mode_emits_one_value_per_pivot() {
    let options = FilterOptions {
        pivot_values: PivotValues::Indicator,
        ..FilterOptions::default()
    };
    let pivots = ColumnFilter::new(Some("1:<10,1:10-50,1:>50"), options).unwrap();
    assert_eq!(pivots.process("Haas;34"), Some("0;1;0".to_string()));
}

#[test]
fn test_column_regex_pivot_emits_matched_value() {
    let pivots = filter("0,4:/[a-z]{3}\\d{3}/");
    assert_eq!(
        pivots.process("Fink;a;b;c;con123"),
        Some("Fink;con123".to_string())
    );
    assert_eq!(pivots.process("Fink;a;b;c;XYZ"), Some("Fink".to_string()));
}

#[test]
fn test_trailing_separator_keeps_column_indexes_aligned() {
    // The line ends with the separator: field 2 exists and is empty.
    assert_eq!(filter("1,2").process("a;b;"), Some("b;".to_string()));
}

#[test]
fn test_malformed_number_field_skips_the_pivot_column() {
    let pivots = filter("0,1:>50");
    assert_eq!(pivots.process("Rank;dirty"), Some("Rank".to_string()));
}

#[test]
fn test_typed_projection_yields_sortable_numbers() {
    let typed = ColumnTypeFilter::new(Some("n:1"), FilterOptions::default()).unwrap();
    let mut keys: Vec<_> = ["a;10", "b;2", "c;30"]
        .iter()
        .map(|line| typed.process(line).unwrap())
        .collect();
    keys.sort();
    assert_eq!(
        keys,
        vec![
            vec![TypedValue::Int(2)],
            vec![TypedValue::Int(10)],
            vec![TypedValue::Int(30)],
        ]
    );
}

#[test]
fn test_typed_projection_mixes_declared_types() {
    let options = FilterOptions {
        date_format: "%d.%m.%Y".to_string(),
        ..FilterOptions::default()
    };
    let typed = ColumnTypeFilter::new(Some("s:0,n:1,d:2"), options).unwrap();
    let key = typed.process("Fink;34;15.06.2014").unwrap();
    assert_eq!(key[0], TypedValue::Str("Fink".to_string()));
    assert_eq!(key[1], TypedValue::Int(34));
    assert!(matches!(key[2], TypedValue::Date(_)));
}
