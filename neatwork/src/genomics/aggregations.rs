//! The aggregation function catalog.
//!
//! An aggregation reduces a node's list of weighted inputs to a single
//! scalar before the activation function is applied. An empty input list
//! always aggregates to `0.0`, so unconnected nodes stay inert.

use serde::{Deserialize, Serialize};

/// The aggregation function applied to a node's weighted inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationKind {
    Mean,
    Median,
    Max,
    Min,
    Sum,
    Count,
    Product,
    Variance,
    StandardDeviation,
    Percentile25,
    Percentile75,
}

/// All aggregation kinds, in declaration order.
pub const AGGREGATION_KINDS: [AggregationKind; 11] = [
    AggregationKind::Mean,
    AggregationKind::Median,
    AggregationKind::Max,
    AggregationKind::Min,
    AggregationKind::Sum,
    AggregationKind::Count,
    AggregationKind::Product,
    AggregationKind::Variance,
    AggregationKind::StandardDeviation,
    AggregationKind::Percentile25,
    AggregationKind::Percentile75,
];

impl AggregationKind {
    /// Returns the kind's serialized name.
    pub fn name(self) -> &'static str {
        match self {
            AggregationKind::Mean => "mean",
            AggregationKind::Median => "median",
            AggregationKind::Max => "max",
            AggregationKind::Min => "min",
            AggregationKind::Sum => "sum",
            AggregationKind::Count => "count",
            AggregationKind::Product => "product",
            AggregationKind::Variance => "variance",
            AggregationKind::StandardDeviation => "std_dev",
            AggregationKind::Percentile25 => "percentile_25",
            AggregationKind::Percentile75 => "percentile_75",
        }
    }

    /// Parses a kind from its serialized name.
    pub fn from_name(name: &str) -> Option<AggregationKind> {
        AGGREGATION_KINDS.iter().copied().find(|k| k.name() == name)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted
}

fn variance(values: &[f64]) -> f64 {
    let mean = mean(values);
    values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / values.len() as f64
}

/// Reduces a list of weighted inputs to a scalar.
///
/// An empty list yields `0.0` for every kind. Percentiles need at
/// least four samples and yield `0.0` below that.
///
/// # Examples
/// ```
/// use neatwork::genomics::{aggregate, AggregationKind};
///
/// assert_eq!(aggregate(&[1.0, 2.0, 3.0], AggregationKind::Mean), 2.0);
/// assert_eq!(aggregate(&[1.0, 2.0, 3.0], AggregationKind::Max), 3.0);
/// assert_eq!(aggregate(&[], AggregationKind::Product), 0.0);
/// ```
pub fn aggregate(values: &[f64], kind: AggregationKind) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    match kind {
        AggregationKind::Mean => mean(values),
        AggregationKind::Median => {
            let sorted = sorted(values);
            let n = sorted.len();
            if n % 2 == 1 {
                sorted[n / 2]
            } else {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            }
        }
        AggregationKind::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        AggregationKind::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        AggregationKind::Sum => values.iter().sum(),
        AggregationKind::Count => values.len() as f64,
        AggregationKind::Product => values.iter().product(),
        AggregationKind::Variance => variance(values),
        AggregationKind::StandardDeviation => variance(values).sqrt(),
        AggregationKind::Percentile25 => {
            if values.len() < 4 {
                0.0
            } else {
                sorted(values)[values.len() / 4]
            }
        }
        AggregationKind::Percentile75 => {
            if values.len() < 4 {
                0.0
            } else {
                sorted(values)[3 * values.len() / 4]
            }
        }
    }
}
