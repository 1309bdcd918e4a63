use std::error::Error;
use std::fmt;

use crate::Innovation;

/// Errors raised while validating a configuration.
///
/// All of these are fatal at trainer construction: evolution over a
/// malformed configuration would silently misbehave instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `num_inputs` is zero.
    ZeroInputs,
    /// `num_outputs` is zero.
    ZeroOutputs,
    /// `population_size` is zero.
    ZeroPopulation,
    /// A probability field lies outside `[0, 1]`.
    RateOutOfRange(&'static str, f64),
    /// The allowed-activation set is empty while the activation
    /// mutation rate is non-zero.
    EmptyActivationSet,
    /// The allowed-aggregation set is empty while the aggregation
    /// mutation rate is non-zero.
    EmptyAggregationSet,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroInputs => write!(f, "configuration has zero inputs"),
            Self::ZeroOutputs => write!(f, "configuration has zero outputs"),
            Self::ZeroPopulation => write!(f, "configuration has a zero population size"),
            Self::RateOutOfRange(field, value) => {
                write!(f, "{} = {} is outside the [0, 1] range", field, value)
            }
            Self::EmptyActivationSet => write!(
                f,
                "activation mutation is enabled but the allowed activation set is empty"
            ),
            Self::EmptyAggregationSet => write!(
                f,
                "aggregation mutation is enabled but the allowed aggregation set is empty"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Errors raised by network evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The input vector's length does not match the network's
    /// input count (excluding the bias neuron).
    InvalidInputShape { expected: usize, actual: usize },
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInputShape { expected, actual } => write!(
                f,
                "input vector has {} values but the network expects {}",
                actual, expected
            ),
        }
    }
}

impl Error for NetworkError {}

/// Errors raised while parsing the keyed-text genome format.
#[derive(Debug, Clone, PartialEq)]
pub enum GenotypeParseError {
    /// A line did not fit the format at the given 1-based line number.
    UnexpectedLine(usize),
    /// A gene entry ended without one of its required fields.
    MissingField {
        gene: Innovation,
        field: &'static str,
    },
    /// A field's value could not be parsed at the given 1-based line number.
    InvalidValue { line: usize, field: String },
}

impl fmt::Display for GenotypeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedLine(line) => write!(f, "unexpected content on line {}", line),
            Self::MissingField { gene, field } => {
                write!(f, "gene {} is missing its '{}' field", gene, field)
            }
            Self::InvalidValue { line, field } => {
                write!(f, "invalid value for '{}' on line {}", field, line)
            }
        }
    }
}

impl Error for GenotypeParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            ConfigError::RateOutOfRange("crossover_rate", 1.5).to_string(),
            "crossover_rate = 1.5 is outside the [0, 1] range"
        );
        assert_eq!(
            NetworkError::InvalidInputShape {
                expected: 2,
                actual: 3
            }
            .to_string(),
            "input vector has 3 values but the network expects 2"
        );
        assert_eq!(
            GenotypeParseError::MissingField {
                gene: 4,
                field: "weight"
            }
            .to_string(),
            "gene 4 is missing its 'weight' field"
        );
    }
}
