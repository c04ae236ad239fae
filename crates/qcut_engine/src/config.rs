//! Knitting configuration
//!
//! Gantree: L7_Integration → KnitConfig
//!
//! Unified configuration for a knitting run: accuracy target, readout
//! mitigation, resource limits and execution options.

use qcut_core::{budget, QcutResult};
use qcut_knit::ResourceLimits;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified knitting configuration
/// Gantree: KnitConfig // 통합 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnitConfig {
    // ========================================================================
    // Accuracy
    // ========================================================================
    /// Target estimation error ε
    pub error: f64,

    // ========================================================================
    // Mitigation
    // ========================================================================
    /// Apply local readout mitigation to every fragment result
    pub mitigate: bool,

    /// Shots per calibration circuit
    pub calibration_shots: u64,

    // ========================================================================
    // Resource Limits
    // ========================================================================
    /// Maximum number of cuts
    pub max_cuts: usize,

    /// Maximum shots over the whole run
    pub max_total_shots: Option<u64>,

    // ========================================================================
    // Execution
    // ========================================================================
    /// Execute experiments in parallel
    pub parallel: bool,

    /// Random seed for the default simulator
    pub seed: Option<u64>,
}

impl KnitConfig {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Default configuration: ε = 0.05, no mitigation
    pub fn new() -> Self {
        Self {
            error: budget::DEFAULT_ERROR,
            mitigate: false,
            calibration_shots: budget::DEFAULT_CALIBRATION_SHOTS,
            max_cuts: budget::DEFAULT_MAX_CUTS,
            max_total_shots: None,
            parallel: true,
            seed: None,
        }
    }

    /// Tight error target with readout mitigation
    pub fn precise() -> Self {
        Self {
            error: 0.01,
            mitigate: true,
            calibration_shots: 16_384,
            max_cuts: 4,
            ..Self::new()
        }
    }

    /// Loose error target for quick looks
    pub fn fast() -> Self {
        Self {
            error: 0.1,
            calibration_shots: 1024,
            ..Self::new()
        }
    }

    // ========================================================================
    // Builder Methods
    // ========================================================================

    /// Set target error
    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error;
        self
    }

    /// Enable or disable readout mitigation
    pub fn with_mitigation(mut self, enabled: bool) -> Self {
        self.mitigate = enabled;
        self
    }

    /// Set calibration shots
    pub fn with_calibration_shots(mut self, shots: u64) -> Self {
        self.calibration_shots = shots;
        self
    }

    /// Set cut limit
    pub fn with_max_cuts(mut self, max_cuts: usize) -> Self {
        self.max_cuts = max_cuts;
        self
    }

    /// Set total shot limit
    pub fn with_max_total_shots(mut self, max: u64) -> Self {
        self.max_total_shots = Some(max);
        self
    }

    /// Enable or disable parallel execution
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Set seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Resource limits, capped per execution by the backend's shot limit
    pub fn to_limits(&self, backend_max_shots: u64) -> ResourceLimits {
        ResourceLimits {
            max_cuts: self.max_cuts,
            max_total_shots: self.max_total_shots,
            max_shots_per_execution: Some(backend_max_shots),
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> QcutResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> QcutResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.error.is_finite() || self.error <= 0.0 {
            return Err(format!("error must be finite and > 0, got {}", self.error));
        }

        if self.mitigate && self.calibration_shots == 0 {
            return Err("calibration_shots must be > 0 when mitigation is enabled".to_string());
        }

        if self.max_total_shots == Some(0) {
            return Err("max_total_shots must be > 0".to_string());
        }

        Ok(())
    }
}

impl Default for KnitConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for KnitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "KnitConfig(ε={}, mitigate={}, max_cuts={}, parallel={})",
            self.error, self.mitigate, self.max_cuts, self.parallel
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
