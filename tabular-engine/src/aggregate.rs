//! FILENAME: tabular-engine/src/aggregate.rs
//! Aggregation functions applied to the value field of each group.
//!
//! The grouping primitive treats the reduction as opaque: anything that
//! implements [`Aggregator`] can be plugged in. The built-in
//! [`AggregationType`] covers the usual spreadsheet functions and computes
//! them through a single incremental accumulator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::value::Value;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    #[error("cannot aggregate non-numeric value '{0}'")]
    NonNumeric(String),

    #[error("aggregation failed: {0}")]
    Failed(String),
}

/// A reduction over the values of one (row group, column group) cell.
///
/// Returning `Value::Missing` means "no result": the table shows its fill
/// value there.
pub trait Aggregator {
    fn aggregate(&self, values: &[Value]) -> Result<Value, AggregateError>;
}

// ============================================================================
// BUILT-IN AGGREGATIONS
// ============================================================================

/// Supported aggregation functions for value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    Average,
    Min,
    Max,
    CountNumbers,
    StdDev,
    StdDevP,
    Var,
    VarP,
    Product,
}

impl AggregationType {
    pub fn name(&self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::Average => "average",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::CountNumbers => "count_numbers",
            AggregationType::StdDev => "std_dev",
            AggregationType::StdDevP => "std_dev_p",
            AggregationType::Var => "var",
            AggregationType::VarP => "var_p",
            AggregationType::Product => "product",
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregationType {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sum" => Ok(AggregationType::Sum),
            "count" => Ok(AggregationType::Count),
            "mean" | "avg" | "average" => Ok(AggregationType::Average),
            "min" | "minimum" => Ok(AggregationType::Min),
            "max" | "maximum" => Ok(AggregationType::Max),
            "count_numbers" | "countnumbers" => Ok(AggregationType::CountNumbers),
            "std" | "stddev" | "std_dev" => Ok(AggregationType::StdDev),
            "stdp" | "stddevp" | "std_dev_p" => Ok(AggregationType::StdDevP),
            "var" => Ok(AggregationType::Var),
            "varp" | "var_p" => Ok(AggregationType::VarP),
            "product" | "prod" => Ok(AggregationType::Product),
            other => Err(AggregateError::Failed(format!(
                "unknown aggregation function '{}'",
                other
            ))),
        }
    }
}

impl Aggregator for AggregationType {
    fn aggregate(&self, values: &[Value]) -> Result<Value, AggregateError> {
        let mut acc = AggregateAccumulator::new();
        for value in values {
            match value {
                Value::Missing | Value::Blank => {}
                Value::Number(n) => acc.add_number(*n),
                Value::Boolean(b) => acc.add_number(if *b { 1.0 } else { 0.0 }),
                Value::Text(s) => {
                    if *self == AggregationType::Count {
                        acc.add_non_number();
                    } else {
                        return Err(AggregateError::NonNumeric(s.clone()));
                    }
                }
            }
        }
        Ok(acc.compute(*self).map_or(Value::Missing, Value::Number))
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
/// Stores intermediate state needed for all aggregation types.
#[derive(Debug, Clone, Default)]
pub struct AggregateAccumulator {
    pub sum: f64,
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: f64,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator {
            product: 1.0,
            ..Default::default()
        }
    }

    /// Adds a numeric value to the accumulator.
    pub fn add_number(&mut self, value: f64) {
        self.count += 1;
        self.count_numbers += 1;
        self.sum += value;
        self.product *= value;

        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;
    }

    /// Adds a non-numeric value (only increments count).
    pub fn add_non_number(&mut self) {
        self.count += 1;
    }

    /// Computes the final aggregate value. `None` when the aggregation is
    /// undefined for the values seen (e.g. a sum over no numbers).
    pub fn compute(&self, aggregation: AggregationType) -> Option<f64> {
        let n = self.count_numbers as f64;
        match aggregation {
            AggregationType::Count => Some(self.count as f64),
            AggregationType::CountNumbers => Some(n),
            _ if self.count_numbers == 0 => None,
            AggregationType::Sum => Some(self.sum),
            AggregationType::Average => Some(self.sum / n),
            AggregationType::Min => self.min,
            AggregationType::Max => self.max,
            AggregationType::Product => Some(self.product),
            AggregationType::Var if self.count_numbers > 1 => Some(self.m2 / (n - 1.0)),
            AggregationType::StdDev if self.count_numbers > 1 => Some((self.m2 / (n - 1.0)).sqrt()),
            AggregationType::Var | AggregationType::StdDev => None,
            AggregationType::VarP => Some(self.m2 / n),
            AggregationType::StdDevP => Some((self.m2 / n).sqrt()),
        }
    }
}

// ============================================================================
// CALLER-SUPPLIED REDUCTIONS
// ============================================================================

/// Adapts a plain numeric reduction (`Fn(&[f64]) -> f64`).
///
/// Missing values are skipped, booleans count as 1/0, text fails with
/// [`AggregateError::NonNumeric`]. A group without numbers, or a NaN
/// result, yields `Value::Missing`.
pub struct Reduce<F>(pub F);

impl<F> Aggregator for Reduce<F>
where
    F: Fn(&[f64]) -> f64,
{
    fn aggregate(&self, values: &[Value]) -> Result<Value, AggregateError> {
        let mut numbers = Vec::with_capacity(values.len());
        for value in values {
            match value {
                Value::Missing | Value::Blank => {}
                Value::Number(n) => numbers.push(*n),
                Value::Boolean(b) => numbers.push(if *b { 1.0 } else { 0.0 }),
                Value::Text(s) => return Err(AggregateError::NonNumeric(s.clone())),
            }
        }
        if numbers.is_empty() {
            return Ok(Value::Missing);
        }
        let result = (self.0)(&numbers);
        Ok(if result.is_nan() { Value::Missing } else { Value::Number(result) })
    }
}

/// Adapts a fallible reduction over raw values.
pub struct TryReduce<F>(pub F);

impl<F> Aggregator for TryReduce<F>
where
    F: Fn(&[Value]) -> Result<Value, AggregateError>,
{
    fn aggregate(&self, values: &[Value]) -> Result<Value, AggregateError> {
        (self.0)(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(ns: &[f64]) -> Vec<Value> {
        ns.iter().map(|n| Value::Number(*n)).collect()
    }

    #[test]
    fn sum_skips_missing_values() {
        let values = vec![Value::Number(10.0), Value::Missing, Value::Number(5.0)];
        assert_eq!(AggregationType::Sum.aggregate(&values), Ok(Value::Number(15.0)));
    }

    #[test]
    fn sum_over_only_missing_is_missing_not_zero() {
        let values = vec![Value::Missing, Value::Missing];
        assert_eq!(AggregationType::Sum.aggregate(&values), Ok(Value::Missing));
        assert_eq!(AggregationType::Count.aggregate(&values), Ok(Value::Number(0.0)));
    }

    #[test]
    fn numeric_aggregation_rejects_text() {
        let values = vec![Value::Number(1.0), Value::from("oops")];
        assert_eq!(
            AggregationType::Sum.aggregate(&values),
            Err(AggregateError::NonNumeric("oops".to_string()))
        );
        assert_eq!(AggregationType::Count.aggregate(&values), Ok(Value::Number(2.0)));
    }

    #[test]
    fn statistics_match_hand_computed_values() {
        let values = numbers(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(AggregationType::Average.aggregate(&values), Ok(Value::Number(5.0)));
        assert_eq!(AggregationType::Min.aggregate(&values), Ok(Value::Number(2.0)));
        assert_eq!(AggregationType::Max.aggregate(&values), Ok(Value::Number(9.0)));

        let var_p = AggregationType::VarP.aggregate(&values).unwrap().as_number().unwrap();
        let std_p = AggregationType::StdDevP.aggregate(&values).unwrap().as_number().unwrap();
        assert!((var_p - 4.0).abs() < 1e-9);
        assert!((std_p - 2.0).abs() < 1e-9);
    }

    #[test]
    fn sample_variance_needs_two_numbers() {
        assert_eq!(AggregationType::Var.aggregate(&numbers(&[3.0])), Ok(Value::Missing));
        assert_eq!(AggregationType::VarP.aggregate(&numbers(&[3.0])), Ok(Value::Number(0.0)));
    }

    #[test]
    fn reduce_wraps_plain_closures() {
        let median = Reduce(|ns: &[f64]| {
            let mut sorted = ns.to_vec();
            sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            sorted[sorted.len() / 2]
        });
        assert_eq!(median.aggregate(&numbers(&[5.0, 1.0, 3.0])), Ok(Value::Number(3.0)));
        assert_eq!(median.aggregate(&[Value::Missing]), Ok(Value::Missing));
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("mean".parse::<AggregationType>(), Ok(AggregationType::Average));
        assert_eq!("SUM".parse::<AggregationType>(), Ok(AggregationType::Sum));
        assert!("median".parse::<AggregationType>().is_err());
    }
}
