//! The activation function catalog.
//!
//! Every function is scalar, `f64 -> f64`, and dispatched through a
//! single match so the evaluator's hot path stays monomorphic.

use serde::{Deserialize, Serialize};

use std::f64::consts::PI;

/// The activation function applied to a node's aggregated input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationKind {
    Sigmoid,
    Tanh,
    ReLU,
    LeakyReLU,
    Softplus,
    Swish,
    Gelu,
    Elu,
    Selu,
    Softsign,
    BentIdentity,
    BipolarSigmoid,
    BipolarTanh,
    Gaussian,
    Inverse,
    Absolute,
    Step,
    Linear,
    Arctangent,
}

/// All activation kinds, in declaration order.
pub const ACTIVATION_KINDS: [ActivationKind; 19] = [
    ActivationKind::Sigmoid,
    ActivationKind::Tanh,
    ActivationKind::ReLU,
    ActivationKind::LeakyReLU,
    ActivationKind::Softplus,
    ActivationKind::Swish,
    ActivationKind::Gelu,
    ActivationKind::Elu,
    ActivationKind::Selu,
    ActivationKind::Softsign,
    ActivationKind::BentIdentity,
    ActivationKind::BipolarSigmoid,
    ActivationKind::BipolarTanh,
    ActivationKind::Gaussian,
    ActivationKind::Inverse,
    ActivationKind::Absolute,
    ActivationKind::Step,
    ActivationKind::Linear,
    ActivationKind::Arctangent,
];

impl ActivationKind {
    /// Returns the kind's serialized name.
    pub fn name(self) -> &'static str {
        match self {
            ActivationKind::Sigmoid => "sigmoid",
            ActivationKind::Tanh => "tanh",
            ActivationKind::ReLU => "relu",
            ActivationKind::LeakyReLU => "leaky_relu",
            ActivationKind::Softplus => "softplus",
            ActivationKind::Swish => "swish",
            ActivationKind::Gelu => "gelu",
            ActivationKind::Elu => "elu",
            ActivationKind::Selu => "selu",
            ActivationKind::Softsign => "softsign",
            ActivationKind::BentIdentity => "bent_identity",
            ActivationKind::BipolarSigmoid => "bipolar_sigmoid",
            ActivationKind::BipolarTanh => "bipolar_tanh",
            ActivationKind::Gaussian => "gaussian",
            ActivationKind::Inverse => "inverse",
            ActivationKind::Absolute => "absolute",
            ActivationKind::Step => "step",
            ActivationKind::Linear => "linear",
            ActivationKind::Arctangent => "arctangent",
        }
    }

    /// Parses a kind from its serialized name.
    pub fn from_name(name: &str) -> Option<ActivationKind> {
        ACTIVATION_KINDS.iter().copied().find(|k| k.name() == name)
    }
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn tanh(x: f64) -> f64 {
    2.0 / (1.0 + (-2.0 * x).exp()) - 1.0
}

/// Applies the activation function to the input.
///
/// The result is not sanitized here; the evaluator coerces
/// NaN and non-finite activations to `0.0` after applying it.
///
/// # Examples
/// ```
/// use neatwork::genomics::{activate, ActivationKind};
///
/// assert_eq!(activate(0.0, ActivationKind::Sigmoid), 0.5);
/// assert_eq!(activate(-3.0, ActivationKind::ReLU), 0.0);
/// assert_eq!(activate(1.5, ActivationKind::Linear), 1.5);
/// ```
pub fn activate(x: f64, kind: ActivationKind) -> f64 {
    match kind {
        ActivationKind::Sigmoid => sigmoid(x),
        ActivationKind::Tanh => tanh(x),
        ActivationKind::ReLU => x.max(0.0),
        ActivationKind::LeakyReLU => {
            if x > 0.0 {
                x
            } else {
                0.01 * x
            }
        }
        ActivationKind::Softplus => (1.0 + x.exp()).ln(),
        ActivationKind::Swish => x * sigmoid(x),
        ActivationKind::Gelu => {
            0.5 * x * (1.0 + tanh((2.0 / PI).sqrt() * (x + 0.044715 * x.powi(3))))
        }
        ActivationKind::Elu => {
            if x > 0.0 {
                x
            } else {
                x.exp() - 1.0
            }
        }
        ActivationKind::Selu => {
            if x > 0.0 {
                x
            } else {
                1.0507 * (x.exp() - 1.0)
            }
        }
        ActivationKind::Softsign => {
            if x == 0.0 {
                0.0
            } else {
                x / (1.0 + x.abs())
            }
        }
        ActivationKind::BentIdentity => ((x * x + 1.0).sqrt() - 1.0) / 2.0 + x,
        ActivationKind::BipolarSigmoid => 2.0 / (1.0 + (-x).exp()) - 1.0,
        ActivationKind::BipolarTanh => tanh(x),
        ActivationKind::Gaussian => (-(x * x)).exp(),
        ActivationKind::Inverse => {
            if x == 0.0 {
                0.0
            } else {
                1.0 / x
            }
        }
        ActivationKind::Absolute => x.abs(),
        ActivationKind::Step => {
            if x > 0.0 {
                1.0
            } else {
                0.0
            }
        }
        ActivationKind::Linear => x,
        ActivationKind::Arctangent => x.atan(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in ACTIVATION_KINDS {
            assert_eq!(ActivationKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ActivationKind::from_name("softmax"), None);
    }

    #[test]
    fn zero_crossings() {
        assert_eq!(activate(0.0, ActivationKind::Sigmoid), 0.5);
        assert_eq!(activate(0.0, ActivationKind::Tanh), 0.0);
        assert_eq!(activate(0.0, ActivationKind::ReLU), 0.0);
        assert_eq!(activate(0.0, ActivationKind::Linear), 0.0);
        assert_eq!(activate(0.0, ActivationKind::Step), 0.0);
        assert_eq!(activate(0.0, ActivationKind::Gaussian), 1.0);
        // Inverse and Softsign special-case zero rather than dividing by it.
        assert_eq!(activate(0.0, ActivationKind::Inverse), 0.0);
        assert_eq!(activate(0.0, ActivationKind::Softsign), 0.0);
    }

    #[test]
    fn negative_branches() {
        assert_eq!(activate(-2.0, ActivationKind::ReLU), 0.0);
        assert_eq!(activate(-2.0, ActivationKind::LeakyReLU), -0.02);
        assert_eq!(activate(-2.0, ActivationKind::Absolute), 2.0);
        assert_eq!(activate(-2.0, ActivationKind::Step), 0.0);
        assert!(activate(-2.0, ActivationKind::Elu) < 0.0);
        assert!(activate(-2.0, ActivationKind::Selu) < 0.0);
    }

    #[test]
    fn bipolar_ranges() {
        for x in [-5.0, -1.0, 0.0, 1.0, 5.0] {
            assert!(activate(x, ActivationKind::BipolarSigmoid).abs() <= 1.0);
            assert!(activate(x, ActivationKind::BipolarTanh).abs() <= 1.0);
            assert!(activate(x, ActivationKind::Softsign).abs() <= 1.0);
        }
    }

    #[test]
    fn sigmoid_is_monotonic() {
        let mut prev = f64::MIN;
        for i in -50..=50 {
            let y = activate(i as f64 / 10.0, ActivationKind::Sigmoid);
            assert!(y > prev);
            prev = y;
        }
    }
}
