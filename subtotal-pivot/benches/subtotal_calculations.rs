use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use subtotal_pivot::{pivot_with_full_subtotals, pivot_with_row_subtotals, SubtotalOptions};
use tabular_engine::{AggregationType, Dataset, Value};

const ROWS: [&str; 2] = ["Category", "Product"];
const COLS: [&str; 2] = ["Region", "City"];

fn build_sales(records: usize) -> Dataset {
    let categories = 8usize;
    let products = 40usize;
    let regions = 4usize;
    let cities = 12usize;

    let rows = (0..records)
        .map(|i| {
            let product = i % products;
            let city = (i / 7) % cities;
            vec![
                Value::from(format!("Category_{:02}", product % categories)),
                Value::from(format!("Product_{:03}", product)),
                Value::from(format!("Region_{}", city % regions)),
                Value::from(format!("City_{:02}", city)),
                Value::from((i % 997) as f64 * 0.25),
            ]
        })
        .collect();

    Dataset::from_rows(["Category", "Product", "Region", "City", "TotalPrice"], rows)
        .expect("benchmark dataset")
}

fn bench_row_subtotals(c: &mut Criterion) {
    let mut group = c.benchmark_group("row_subtotals");
    let options = SubtotalOptions {
        include_margins: true,
        ..Default::default()
    };
    for records in [1_000usize, 10_000, 100_000] {
        let dataset = build_sales(records);
        group.bench_with_input(BenchmarkId::from_parameter(records), &dataset, |b, dataset| {
            b.iter(|| {
                pivot_with_row_subtotals(
                    black_box(dataset),
                    "TotalPrice",
                    &ROWS,
                    &COLS,
                    &AggregationType::Sum,
                    &options,
                )
                .expect("row subtotals")
            })
        });
    }
    group.finish();
}

fn bench_full_subtotals(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_subtotals");
    let options = SubtotalOptions::default();
    for records in [1_000usize, 10_000, 100_000] {
        let dataset = build_sales(records);
        group.bench_with_input(BenchmarkId::from_parameter(records), &dataset, |b, dataset| {
            b.iter(|| {
                pivot_with_full_subtotals(
                    black_box(dataset),
                    "TotalPrice",
                    &ROWS,
                    &COLS,
                    &AggregationType::Sum,
                    &options,
                )
                .expect("full subtotals")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_row_subtotals, bench_full_subtotals);
criterion_main!(benches);
