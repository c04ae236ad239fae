//! Constants for QCut
//!
//! Gantree: L0_Foundation → Constants
//!
//! Quasi-probability decomposition parameters, register naming and
//! default resource limits.

// ============================================================================
// QPD Constants
// Gantree: qpd // 준확률 분해 상수
// ============================================================================

pub mod qpd {
    //! Parameters of the wire-cut identity decomposition

    /// Number of (measure, prepare) pairs in the identity decomposition
    /// Gantree: BASIS_SIZE: usize = 8
    pub const BASIS_SIZE: usize = 8;

    /// Sampling overhead per cut (sum of |coefficients| / 2)
    /// Gantree: GAMMA: f64 = 4.0
    pub const GAMMA: f64 = 4.0;

    /// Eigenvalue recorded for an identity-basis (unmeasured) site
    pub const IDENTITY_EIGENVALUE: i32 = -1;

    /// Number of experiments for `cuts` cuts (8^k), `None` on overflow
    pub fn experiment_count(cuts: usize) -> Option<u64> {
        let exp = u32::try_from(cuts).ok()?;
        (BASIS_SIZE as u64).checked_pow(exp)
    }

    /// Overall sign applied per experiment: (-1)^(k+1)
    pub fn cut_sign(cuts: usize) -> f64 {
        if cuts % 2 == 0 {
            -1.0
        } else {
            1.0
        }
    }
}

// ============================================================================
// Register Names
// Gantree: registers // 레지스터 이름
// ============================================================================

pub mod registers {
    //! Classical register names used by fragment circuits

    /// Mid-circuit QPD basis outcomes
    pub const QPD: &str = "c";

    /// End-of-circuit observable outcomes
    pub const MEAS: &str = "meas";
}

// ============================================================================
// Budget Defaults
// Gantree: budget // 자원 기본값
// ============================================================================

pub mod budget {
    //! Default resource parameters

    /// Default target estimation error
    /// Gantree: DEFAULT_ERROR: f64 = 0.05
    pub const DEFAULT_ERROR: f64 = 0.05;

    /// Default maximum number of cuts before refusing to run
    pub const DEFAULT_MAX_CUTS: usize = 6;

    /// Default shots per readout calibration circuit
    pub const DEFAULT_CALIBRATION_SHOTS: u64 = 4096;

    /// Default backend limit on shots per execution
    pub const DEFAULT_MAX_SHOTS: u64 = 100_000;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_experiment_count() {
        assert_eq!(qpd::experiment_count(0), Some(1));
        assert_eq!(qpd::experiment_count(2), Some(64));
        assert_eq!(qpd::experiment_count(21), Some(1u64 << 63));
        assert_eq!(qpd::experiment_count(22), None);
    }

    #[test]
    fn test_cut_sign() {
        assert_eq!(qpd::cut_sign(0), -1.0);
        assert_eq!(qpd::cut_sign(1), 1.0);
        assert_eq!(qpd::cut_sign(2), -1.0);
    }
}
