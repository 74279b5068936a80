//! Shared fixtures for subtotal pivot integration tests.
#![allow(dead_code)]

use tabular_engine::{AxisKey, Dataset, Key, Value};

pub const VALUE: &str = "TotalPrice";
pub const ROWS: [&str; 2] = ["Category", "Product"];
pub const COLS: [&str; 2] = ["Region", "City"];

/// The three-record sales example.
pub fn small_sales() -> Dataset {
    Dataset::from_records(vec![
        record("Fruit", "Apple", "East", "NY", 10.0),
        record("Fruit", "Banana", "East", "NY", 5.0),
        record("Veg", "Carrot", "West", "LA", 7.0),
    ])
    .expect("valid fixture")
}

/// A larger food-sales sample with repeated combinations and gaps.
pub fn food_sales() -> Dataset {
    let rows = [
        ("Bars", "Carrot", "East", "Boston", 33.16),
        ("Bars", "Whole Wheat", "East", "Boston", 87.33),
        ("Crackers", "Whole Wheat", "East", "Boston", 58.0),
        ("Bars", "Carrot", "West", "Los Angeles", 110.37),
        ("Cookies", "Chocolate Chip", "West", "Los Angeles", 42.68),
        ("Cookies", "Arrowroot", "East", "New York", 45.72),
        ("Cookies", "Chocolate Chip", "East", "New York", 99.64),
        ("Bars", "Carrot", "West", "San Diego", 34.72),
        ("Crackers", "Whole Wheat", "West", "San Diego", 36.96),
        ("Cookies", "Oatmeal Raisin", "East", "Boston", 85.4),
        ("Bars", "Bran", "East", "New York", 51.64),
        ("Cookies", "Arrowroot", "West", "Los Angeles", 52.78),
        ("Bars", "Carrot", "East", "Boston", 19.88),
        ("Snacks", "Potato Chips", "West", "San Diego", 18.76),
        ("Cookies", "Chocolate Chip", "East", "Boston", 68.6),
        ("Bars", "Bran", "West", "Los Angeles", 27.12),
    ];
    Dataset::from_records(
        rows.iter()
            .map(|&(category, product, region, city, price)| record(category, product, region, city, price)),
    )
    .expect("valid fixture")
}

fn record(category: &str, product: &str, region: &str, city: &str, price: f64) -> Vec<(&'static str, Value)> {
    vec![
        ("Category", Value::from(category)),
        ("Product", Value::from(product)),
        ("Region", Value::from(region)),
        ("City", Value::from(city)),
        ("TotalPrice", Value::from(price)),
    ]
}

/// Builds an index label; an empty string is the blank marker.
pub fn key(parts: &[&str]) -> AxisKey {
    parts
        .iter()
        .map(|p| if p.is_empty() { Key::Blank } else { Key::from(*p) })
        .collect()
}

pub fn number(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_number).unwrap_or(f64::NAN)
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
