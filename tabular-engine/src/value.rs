//! FILENAME: tabular-engine/src/value.rs
//! PURPOSE: Scalar values stored in datasets and tables, and the hashable keys
//! derived from them for grouping.
//! CONTEXT: `Value` is what a record holds. `Key` is what an index holds.
//! Missing data and the subtotal marker are separate variants so a subtotal
//! row can never be confused with a group whose key was absent.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A scalar held by a dataset record or a table cell.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Value {
    /// No data ("not available"). Aggregations skip it.
    #[default]
    Missing,
    /// Reserved marker for a hierarchy level that is not grouped on.
    /// `Dataset::push_row` rejects it; only subtotal records and melted
    /// tables carry it.
    Blank,
    Number(f64),
    Text(String),
    Boolean(bool),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Value::Blank)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the value as display text.
    pub fn display_value(&self) -> String {
        match self {
            Value::Missing => "NA".to_string(),
            Value::Blank => String::new(),
            Value::Number(n) => format_number(*n),
            Value::Text(s) => s.clone(),
            Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_value())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Missing, Into::into)
    }
}

// Format without unnecessary decimal places
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

// ============================================================================
// KEYS
// ============================================================================

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other, and so are the two zeros.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

impl OrderedFloat {
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    fn compare(&self, other: &Self) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or_else(|| self.0.is_nan().cmp(&other.0.is_nan()))
    }
}

/// One level of an index label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    /// The level is not grouped on: the row or column is a subtotal.
    Blank,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
}

/// A full index label: one key per level.
pub type AxisKey = SmallVec<[Key; 4]>;

impl Key {
    /// Projects a value onto a key. Missing values have no key.
    pub fn from_value(value: &Value) -> Option<Key> {
        match value {
            Value::Missing => None,
            Value::Blank => Some(Key::Blank),
            Value::Number(n) => Some(Key::Number(OrderedFloat(*n))),
            Value::Text(s) => Some(Key::Text(s.clone())),
            Value::Boolean(b) => Some(Key::Boolean(*b)),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Key::Blank => Value::Blank,
            Key::Number(n) => Value::Number(n.0),
            Key::Text(s) => Value::Text(s.clone()),
            Key::Boolean(b) => Value::Boolean(*b),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Key::Blank)
    }

    /// Display label. The subtotal marker renders as an empty string.
    pub fn display_value(&self) -> String {
        match self {
            Key::Blank => String::new(),
            Key::Number(n) => format_number(n.0),
            Key::Text(s) => s.clone(),
            Key::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_value())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Text(s)
    }
}

impl From<f64> for Key {
    fn from(n: f64) -> Self {
        Key::Number(OrderedFloat(n))
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Boolean(b)
    }
}

/// Formats an index label as `(a, b, c)` for messages.
pub fn format_key(key: &[Key]) -> String {
    let parts: Vec<String> = key
        .iter()
        .map(|k| match k {
            Key::Blank => "''".to_string(),
            other => other.display_value(),
        })
        .collect();
    format!("({})", parts.join(", "))
}

// ============================================================================
// ORDERING
// ============================================================================

/// Where the subtotal marker sorts relative to real keys at the same level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlankOrder {
    /// Blank sorts before every real key: totals precede their children.
    #[default]
    First,
    /// Blank sorts after every real key: totals follow their last child.
    Last,
}

/// Compares two keys of one level. Real keys order as
/// Number < Text < Boolean, each by its natural order.
pub fn compare_key(a: &Key, b: &Key, order: BlankOrder) -> Ordering {
    let blank_first = match order {
        BlankOrder::First => Ordering::Less,
        BlankOrder::Last => Ordering::Greater,
    };

    match (a, b) {
        (Key::Blank, Key::Blank) => Ordering::Equal,
        (Key::Blank, _) => blank_first,
        (_, Key::Blank) => blank_first.reverse(),

        (Key::Number(na), Key::Number(nb)) => na.compare(nb),
        (Key::Number(_), _) => Ordering::Less,
        (_, Key::Number(_)) => Ordering::Greater,

        (Key::Text(ta), Key::Text(tb)) => ta.cmp(tb),
        (Key::Text(_), _) => Ordering::Less,
        (_, Key::Text(_)) => Ordering::Greater,

        (Key::Boolean(ba), Key::Boolean(bb)) => ba.cmp(bb),
    }
}

/// Lexicographic comparison of full index labels, level by level.
pub fn compare_keys(a: &[Key], b: &[Key], order: BlankOrder) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| compare_key(x, y, order))
        .find(|o| *o != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}
