mod common;

use std::collections::HashSet;

use common::{food_sales, key, number, small_sales, COLS, ROWS, VALUE};
use subtotal_pivot::{
    pivot_with_row_subtotals, PivotError, SubtotalDefinition, SubtotalLocation, SubtotalMode, SubtotalOptions,
};
use tabular_engine::{pivot_table, AggregationType, BlankOrder, Reduce, Value};

#[test]
fn scenario_has_leaves_and_subtotals_but_no_totals() {
    let table = pivot_with_row_subtotals(
        &small_sales(),
        VALUE,
        &ROWS,
        &COLS,
        &AggregationType::Sum,
        &SubtotalOptions::default(),
    )
    .unwrap();

    let east_ny = key(&["East", "NY"]);
    assert_eq!(table.get(&key(&["Fruit", "Apple"]), &east_ny), Some(&Value::Number(10.0)));
    assert_eq!(table.get(&key(&["Fruit", ""]), &east_ny), Some(&Value::Number(15.0)));
    assert_eq!(table.get(&key(&["Veg", "Carrot"]), &key(&["West", "LA"])), Some(&Value::Number(7.0)));
    assert_eq!(table.row_position(&key(&["", ""])), None);
    assert_eq!(table.column_position(&key(&["", ""])), None);
}

#[test]
fn single_level_equals_plain_grouping() {
    let dataset = food_sales();
    let no_columns: [&str; 0] = [];

    let subtotals = pivot_with_row_subtotals(
        &dataset,
        VALUE,
        &["Category"],
        &no_columns,
        &AggregationType::Sum,
        &SubtotalOptions::default(),
    )
    .unwrap();
    let plain = pivot_table(
        &dataset,
        VALUE,
        &["Category"],
        &no_columns,
        &AggregationType::Sum,
        &Value::Missing,
        BlankOrder::First,
    )
    .unwrap();

    assert_eq!(subtotals, plain);
}

#[test]
fn one_row_per_observed_prefix() {
    let dataset = food_sales();
    let table = pivot_with_row_subtotals(
        &dataset,
        VALUE,
        &ROWS,
        &COLS,
        &AggregationType::Sum,
        &SubtotalOptions::default(),
    )
    .unwrap();

    let records: Vec<Vec<String>> = dataset
        .rows()
        .iter()
        .map(|row| row[..2].iter().map(Value::display_value).collect())
        .collect();
    let expected: usize = (1..=ROWS.len())
        .map(|depth| {
            records
                .iter()
                .map(|r| r[..depth].to_vec())
                .collect::<HashSet<_>>()
                .len()
        })
        .sum();

    assert_eq!(table.row_count(), expected);

    // Every leaf combination of the column hierarchy appears once.
    let leaves: HashSet<_> = dataset
        .rows()
        .iter()
        .map(|row| (row[2].display_value(), row[3].display_value()))
        .collect();
    assert_eq!(table.column_count(), leaves.len());
}

#[test]
fn subtotal_rows_sum_their_children() {
    let table = pivot_with_row_subtotals(
        &food_sales(),
        VALUE,
        &ROWS,
        &["Region"],
        &AggregationType::Sum,
        &SubtotalOptions::default(),
    )
    .unwrap();

    let east = key(&["East"]);
    let bars = number(table.get(&key(&["Bars", ""]), &east));
    let children: f64 = ["Bran", "Carrot", "Whole Wheat"]
        .iter()
        .map(|&p| table.get(&key(&["Bars", p]), &east).and_then(Value::as_number).unwrap_or(0.0))
        .sum();
    assert!((bars - children).abs() < 1e-9);
    assert!((bars - (33.16 + 87.33 + 51.64 + 19.88)).abs() < 1e-9);
}

#[test]
fn absent_combinations_read_as_fill_value() {
    let options = SubtotalOptions {
        fill_value: Value::Number(-1.0),
        ..Default::default()
    };
    let filled = pivot_with_row_subtotals(&food_sales(), VALUE, &ROWS, &COLS, &AggregationType::Sum, &options).unwrap();
    let plain = pivot_with_row_subtotals(
        &food_sales(),
        VALUE,
        &ROWS,
        &COLS,
        &AggregationType::Sum,
        &SubtotalOptions::default(),
    )
    .unwrap();

    let mut gaps = 0;
    for r in 0..filled.row_count() {
        for c in 0..filled.column_count() {
            if filled.data(r, c).is_none() {
                gaps += 1;
                assert_eq!(filled.cell(r, c), Some(&Value::Number(-1.0)));
                assert_eq!(plain.cell(r, c), Some(&Value::Missing));
            } else {
                assert_eq!(filled.data(r, c), plain.data(r, c));
            }
        }
    }
    assert!(gaps > 0);
}

#[test]
fn margins_and_location_work_together() {
    let options = SubtotalOptions {
        include_margins: true,
        subtotal_location: SubtotalLocation::AtBottom,
        ..Default::default()
    };
    let table = pivot_with_row_subtotals(&small_sales(), VALUE, &ROWS, &COLS, &AggregationType::Sum, &options).unwrap();

    let total = key(&["", ""]);
    assert_eq!(table.row_keys().last(), Some(&total));
    assert_eq!(table.column_keys().last(), Some(&total));
    assert_eq!(table.get(&total, &total), Some(&Value::Number(22.0)));
    assert_eq!(table.row_keys()[0], key(&["Fruit", "Apple"]));
}

#[test]
fn caller_supplied_reductions_are_used_at_every_depth() {
    let max = Reduce(|ns: &[f64]| ns.iter().cloned().fold(f64::MIN, f64::max));
    let table = pivot_with_row_subtotals(
        &food_sales(),
        VALUE,
        &ROWS,
        &["Region"],
        &max,
        &SubtotalOptions::default(),
    )
    .unwrap();

    assert_eq!(table.get(&key(&["Bars", ""]), &key(&["West"])), Some(&Value::Number(110.37)));
    assert_eq!(table.get(&key(&["Bars", "Carrot"]), &key(&["East"])), Some(&Value::Number(33.16)));
}

#[test]
fn definitions_dispatch_and_offer_the_standard_pivot() {
    let definition = SubtotalDefinition::new(VALUE, vec!["Category".into(), "Product".into()])
        .with_columns(vec!["Region".into(), "City".into()]);

    let standard = definition.standard(&small_sales()).unwrap();
    assert_eq!(standard.row_count(), 3);
    assert_eq!(standard.row_position(&key(&["Fruit", ""])), None);

    let rows = definition.calculate(&small_sales()).unwrap();
    assert_eq!(rows.row_count(), 5);

    let full = definition.with_mode(SubtotalMode::FullSubtotals).calculate(&small_sales()).unwrap();
    assert_eq!(full.get(&key(&["", ""]), &key(&["", ""])), Some(&Value::Number(22.0)));
}

#[test]
fn configuration_errors_name_the_axis() {
    let err = pivot_with_row_subtotals(
        &small_sales(),
        VALUE,
        &["Category", "Brand"],
        &COLS,
        &AggregationType::Sum,
        &SubtotalOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "invalid row configuration: column 'Brand' not found in dataset");
    assert!(matches!(err, PivotError::Configuration { .. }));
}
