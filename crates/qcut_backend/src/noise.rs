//! Readout noise model
//!
//! Gantree: L6_Backend → NoiseModel
//!
//! Classical readout flips applied independently to every recorded bit.
//! Gate noise is not modelled: the simulator computes exact outcome
//! distributions and only the readout channel is stochastic.

use qcut_core::{Probability, QcutResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Readout error model
/// Gantree: NoiseModel // 측정 노이즈
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// P(read 1 | prepared 0)
    /// Gantree: readout_p01: f64 // 0→1 오류
    readout_p01: f64,

    /// P(read 0 | prepared 1)
    /// Gantree: readout_p10: f64 // 1→0 오류
    readout_p10: f64,
}

impl NoiseModel {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new readout model with validation
    /// Gantree: new(p01, p10) -> Result<Self> // 생성+검증
    pub fn new(readout_p01: f64, readout_p10: f64) -> QcutResult<Self> {
        let p01 = Probability::new(readout_p01)?;
        let p10 = Probability::new(readout_p10)?;
        Ok(Self {
            readout_p01: p01.value(),
            readout_p10: p10.value(),
        })
    }

    /// Create ideal (noiseless) model
    /// Gantree: ideal() -> Self // 이상적
    pub fn ideal() -> Self {
        Self {
            readout_p01: 0.0,
            readout_p10: 0.0,
        }
    }

    /// Same flip probability in both directions
    pub fn symmetric(readout_error: f64) -> QcutResult<Self> {
        Self::new(readout_error, readout_error)
    }

    /// Typical superconducting device: relaxation makes 1→0 more likely
    pub fn typical() -> Self {
        Self {
            readout_p01: 0.01,
            readout_p10: 0.03,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// P(read 1 | prepared 0)
    pub fn readout_p01(&self) -> f64 {
        self.readout_p01
    }

    /// P(read 0 | prepared 1)
    pub fn readout_p10(&self) -> f64 {
        self.readout_p10
    }

    /// Mean readout error
    pub fn readout_error(&self) -> f64 {
        0.5 * (self.readout_p01 + self.readout_p10)
    }

    /// Probability that a bit with the given true value is read flipped
    #[inline]
    pub fn flip_probability(&self, bit: bool) -> f64 {
        if bit {
            self.readout_p10
        } else {
            self.readout_p01
        }
    }

    /// True when readout is perfect
    pub fn is_ideal(&self) -> bool {
        self.readout_p01 == 0.0 && self.readout_p10 == 0.0
    }
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self::ideal()
    }
}

impl fmt::Display for NoiseModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "NoiseModel(p01={:.4}, p10={:.4})",
            self.readout_p01, self.readout_p10
        )
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_validation() {
        assert!(NoiseModel::new(0.02, 0.05).is_ok());
        assert!(NoiseModel::new(-0.1, 0.0).is_err());
        assert!(NoiseModel::symmetric(1.5).is_err());
    }

    #[test]
    fn test_flip_probability() {
        let model = NoiseModel::new(0.02, 0.04).unwrap();
        assert_relative_eq!(model.flip_probability(false), 0.02);
        assert_relative_eq!(model.flip_probability(true), 0.04);
        assert_relative_eq!(model.readout_error(), 0.03);
        assert!(!model.is_ideal());
        assert!(NoiseModel::ideal().is_ideal());
    }
}
