//! Shot budget and resource estimation
//!
//! Gantree: L3_Experiment → ShotBudget
//!
//! Reaching target error ε with `k` cuts needs `samples = round(16^k / ε²)`
//! samples in total, spread evenly over the `8^k` experiments:
//! `shots = floor(samples / 8^k)` per fragment circuit.

use qcut_core::{budget, qpd, QcutError, QcutResult};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ShotBudget
// ============================================================================

/// Sampling budget for a given cut count and target error
/// Gantree: ShotBudget // 샷 예산
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotBudget {
    cuts: usize,
    error: f64,
    experiments: u64,
    samples: u64,
    shots_per_experiment: u64,
}

impl ShotBudget {
    /// Compute the budget for `cuts` cuts at target error `error`
    /// Gantree: new(k, ε) -> Result<Self> // 예산 계산
    pub fn new(cuts: usize, error: f64) -> QcutResult<Self> {
        if !error.is_finite() || error <= 0.0 {
            return Err(QcutError::InvalidErrorTarget(error));
        }

        let overflow = |reason: &str| QcutError::BudgetOverflow {
            cuts,
            reason: reason.to_string(),
        };

        let experiments =
            qpd::experiment_count(cuts).ok_or_else(|| overflow("8^k does not fit in 64 bits"))?;
        let exponent = i32::try_from(2 * cuts).map_err(|_| overflow("exponent too large"))?;
        let raw = qpd::GAMMA.powi(exponent) / (error * error);
        if !raw.is_finite() || raw >= u64::MAX as f64 {
            return Err(overflow("sample count does not fit in 64 bits"));
        }

        let samples = raw.round() as u64;
        if samples == 0 {
            return Err(QcutError::InvalidErrorTarget(error));
        }

        Ok(Self {
            cuts,
            error,
            experiments,
            samples,
            shots_per_experiment: samples / experiments,
        })
    }

    /// Number of cuts
    pub fn cuts(&self) -> usize {
        self.cuts
    }

    /// Target error
    pub fn error(&self) -> f64 {
        self.error
    }

    /// Number of experiments (8^k)
    pub fn experiments(&self) -> u64 {
        self.experiments
    }

    /// Total sample count
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Shots per fragment circuit (may be zero)
    pub fn shots_per_experiment(&self) -> u64 {
        self.shots_per_experiment
    }

    /// Sampling overhead 4^k
    pub fn gamma_factor(&self) -> f64 {
        qpd::GAMMA.powi(self.cuts as i32)
    }

    /// Shots across all circuits of all experiments
    pub fn total_shots(&self, fragments: usize) -> Option<u64> {
        self.shots_per_experiment
            .checked_mul(self.experiments)?
            .checked_mul(fragments as u64)
    }
}

impl fmt::Display for ShotBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ShotBudget(k={}, ε={}, experiments={}, samples={}, shots={})",
            self.cuts, self.error, self.experiments, self.samples, self.shots_per_experiment
        )
    }
}

// ============================================================================
// Resource Limits
// ============================================================================

/// Caps on the work a knitting run may request
/// Gantree: ResourceLimits // 자원 한도
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Maximum number of cuts
    pub max_cuts: usize,
    /// Maximum shots summed over every execution
    pub max_total_shots: Option<u64>,
    /// Maximum shots in a single execution
    pub max_shots_per_execution: Option<u64>,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_cuts: budget::DEFAULT_MAX_CUTS,
            max_total_shots: None,
            max_shots_per_execution: None,
        }
    }
}

impl ResourceLimits {
    /// Reject cut counts above the limit before any budget arithmetic
    pub fn check_cuts(&self, cuts: usize) -> QcutResult<()> {
        if cuts > self.max_cuts {
            let experiments = qpd::experiment_count(cuts)
                .map_or_else(|| "more than 2^64".to_string(), |n| n.to_string());
            return Err(QcutError::TooManyCuts {
                cuts,
                max: self.max_cuts,
                experiments,
            });
        }
        Ok(())
    }
}

/// Work a knitting run will perform
/// Gantree: ResourceEstimate // 자원 추정
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourceEstimate {
    /// Number of cuts
    pub cuts: usize,
    /// Number of fragments
    pub fragments: usize,
    /// Number of experiments
    pub experiments: u64,
    /// Total sample count
    pub samples: u64,
    /// Shots per fragment circuit
    pub shots_per_experiment: u64,
    /// Fragment circuits to execute
    pub circuit_executions: u64,
    /// Shots over every execution
    pub total_shots: u64,
    /// Readout calibration circuits run before the experiments
    #[serde(default)]
    pub calibration_executions: u64,
    /// Shots per calibration circuit
    #[serde(default)]
    pub calibration_shots: u64,
}

impl ResourceEstimate {
    /// Estimate from a budget and a fragment count
    pub fn new(budget: &ShotBudget, fragments: usize) -> QcutResult<Self> {
        let overflow = || QcutError::BudgetOverflow {
            cuts: budget.cuts(),
            reason: "total shot count does not fit in 64 bits".into(),
        };
        Ok(Self {
            cuts: budget.cuts(),
            fragments,
            experiments: budget.experiments(),
            samples: budget.samples(),
            shots_per_experiment: budget.shots_per_experiment(),
            circuit_executions: budget
                .experiments()
                .checked_mul(fragments as u64)
                .ok_or_else(overflow)?,
            total_shots: budget.total_shots(fragments).ok_or_else(overflow)?,
            calibration_executions: 0,
            calibration_shots: 0,
        })
    }

    /// Add readout calibration: an all-|0⟩ and an all-|1⟩ run per register width
    pub fn with_calibration(mut self, widths: usize, shots: u64) -> QcutResult<Self> {
        let executions = (widths as u64).saturating_mul(2);
        if executions.checked_mul(shots).is_none() {
            return Err(QcutError::BudgetOverflow {
                cuts: self.cuts,
                reason: "calibration shot count does not fit in 64 bits".into(),
            });
        }
        self.calibration_executions = executions;
        self.calibration_shots = shots;
        Ok(self)
    }

    /// Shots over every execution, calibration included
    pub fn required_shots(&self) -> u64 {
        self.total_shots
            .saturating_add(self.calibration_executions.saturating_mul(self.calibration_shots))
    }

    /// Check the estimate against limits
    /// Gantree: check(limits) -> Result<()> // 실행 가능성
    pub fn check(&self, limits: &ResourceLimits) -> QcutResult<()> {
        limits.check_cuts(self.cuts)?;
        if let Some(max) = limits.max_total_shots {
            let required = self.required_shots();
            if required > max {
                return Err(QcutError::ShotBudgetExceeded { required, max });
            }
        }
        if let Some(max) = limits.max_shots_per_execution {
            if self.shots_per_experiment > max {
                return Err(QcutError::ShotsOutOfRange(self.shots_per_experiment, 0, max));
            }
            if self.calibration_executions > 0 && self.calibration_shots > max {
                return Err(QcutError::ShotsOutOfRange(self.calibration_shots, 0, max));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ResourceEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Resource Estimate")?;
        writeln!(f, "  Cuts:            {}", self.cuts)?;
        writeln!(f, "  Fragments:       {}", self.fragments)?;
        writeln!(f, "  Experiments:     {}", self.experiments)?;
        writeln!(f, "  Samples:         {}", self.samples)?;
        writeln!(f, "  Shots/circuit:   {}", self.shots_per_experiment)?;
        writeln!(f, "  Executions:      {}", self.circuit_executions)?;
        if self.calibration_executions > 0 {
            writeln!(
                f,
                "  Calibration:     {} x {} shots",
                self.calibration_executions, self.calibration_shots
            )?;
        }
        write!(f, "  Total shots:     {}", self.required_shots())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_cuts_five_percent() {
        let budget = ShotBudget::new(2, 0.05).unwrap();
        assert_eq!(budget.experiments(), 64);
        assert_eq!(budget.samples(), 102_400);
        assert_eq!(budget.shots_per_experiment(), 1600);
        assert!((budget.gamma_factor() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_cut() {
        let budget = ShotBudget::new(1, 0.05).unwrap();
        assert_eq!(budget.samples(), 6400);
        assert_eq!(budget.shots_per_experiment(), 800);
        assert_eq!(budget.total_shots(2), Some(12_800));
    }

    #[test]
    fn test_zero_cuts() {
        let budget = ShotBudget::new(0, 0.1).unwrap();
        assert_eq!(budget.experiments(), 1);
        assert_eq!(budget.samples(), 100);
        assert_eq!(budget.shots_per_experiment(), 100);
    }

    #[test]
    fn test_zero_shots_allowed() {
        // 16^3 / 1.0 = 4096 samples over 512 experiments: 8 shots
        assert_eq!(ShotBudget::new(3, 1.0).unwrap().shots_per_experiment(), 8);
        // 16 / 9 rounds to 2 samples over 8 experiments: 0 shots
        assert_eq!(ShotBudget::new(1, 3.0).unwrap().shots_per_experiment(), 0);
    }

    #[test]
    fn test_invalid_error_targets() {
        for bad in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                ShotBudget::new(1, bad),
                Err(QcutError::InvalidErrorTarget(_))
            ));
        }
        // 1 / 9 rounds to zero samples
        assert!(ShotBudget::new(0, 3.0).is_err());
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(matches!(
            ShotBudget::new(30, 0.01),
            Err(QcutError::BudgetOverflow { .. })
        ));
    }

    #[test]
    fn test_estimate_and_limits() {
        let budget = ShotBudget::new(2, 0.05).unwrap();
        let estimate = ResourceEstimate::new(&budget, 3).unwrap();
        assert_eq!(estimate.circuit_executions, 192);
        assert_eq!(estimate.total_shots, 307_200);

        assert!(estimate.check(&ResourceLimits::default()).is_ok());

        let tight = ResourceLimits {
            max_total_shots: Some(100_000),
            ..Default::default()
        };
        assert_eq!(
            estimate.check(&tight),
            Err(QcutError::ShotBudgetExceeded {
                required: 307_200,
                max: 100_000
            })
        );

        let per_execution = ResourceLimits {
            max_shots_per_execution: Some(1000),
            ..Default::default()
        };
        assert!(matches!(
            estimate.check(&per_execution),
            Err(QcutError::ShotsOutOfRange(1600, 0, 1000))
        ));
    }

    #[test]
    fn test_cut_limit() {
        let limits = ResourceLimits {
            max_cuts: 2,
            ..Default::default()
        };
        assert!(limits.check_cuts(2).is_ok());
        assert!(matches!(
            limits.check_cuts(3),
            Err(QcutError::TooManyCuts { cuts: 3, max: 2, .. })
        ));
    }

    #[test]
    fn test_calibration_counts_against_limits() {
        let budget = ShotBudget::new(1, 0.1).unwrap();
        let estimate = ResourceEstimate::new(&budget, 2)
            .unwrap()
            .with_calibration(2, 1000)
            .unwrap();
        assert_eq!(estimate.total_shots, 3200);
        assert_eq!(estimate.calibration_executions, 4);
        assert_eq!(estimate.required_shots(), 7200);

        let total = ResourceLimits {
            max_total_shots: Some(5000),
            ..Default::default()
        };
        assert_eq!(
            estimate.check(&total),
            Err(QcutError::ShotBudgetExceeded {
                required: 7200,
                max: 5000
            })
        );

        // Experiments fit in 500 shots per circuit, calibration does not
        let per_execution = ResourceLimits {
            max_shots_per_execution: Some(500),
            ..Default::default()
        };
        assert_eq!(
            estimate.check(&per_execution),
            Err(QcutError::ShotsOutOfRange(1000, 0, 500))
        );

        let no_calibration = estimate.with_calibration(0, 1000).unwrap();
        assert!(no_calibration.check(&per_execution).is_ok());
        assert_eq!(no_calibration.required_shots(), 3200);
    }
}
