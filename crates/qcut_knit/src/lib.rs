//! # QCut Knit
//!
//! Wire-cut decomposition and reconstruction: cut location, fragment
//! partitioning, QPD experiment generation, result decoding and
//! expectation value estimation.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qcut_knit // L2-L4: Knitting (완료)
//!     L2_Knit // 분해 (완료)
//!         CutLocator // 컷 위치 + 조각 경계 (완료)
//!         BoundaryInserter // Meas/Init 자리표시 삽입 (완료)
//!         Partitioner // 조각 분할 (완료)
//!         QpdTable // 8항 항등 분해 + 조합 (완료)
//!         KnitPlan // 검증된 계획 (완료)
//!     L3_Experiment // 실험 (완료)
//!         ExperimentBuilder // 자리표시 치환 (완료)
//!         ShotBudget // 샷 예산 + 자원 추정 (완료)
//!     L4_Reconstruct // 재구성 (완료)
//!         ResultProcessor // 고유값 변환 + 항등 보정 (완료)
//!         ExpectationEstimator // 기댓값 추정 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qcut_core::CircuitBuilder;
//! use qcut_knit::prelude::*;
//!
//! let circuit = CircuitBuilder::new(4)
//!     .h(0)
//!     .cnot(0, 1)
//!     .cut(1, 2)
//!     .cnot(2, 3)
//!     .build();
//!
//! let plan = KnitPlan::from_circuit(&circuit).unwrap();
//! assert_eq!(plan.num_fragments(), 2);
//!
//! let experiments = plan.build_experiments().unwrap();
//! assert_eq!(experiments.len(), 8);
//!
//! println!("{}", plan.resource_estimate(0.05).unwrap());
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Cut location (Gantree: L2_Knit → CutLocator)
pub mod cut;

/// Placeholder insertion (Gantree: L2_Knit → BoundaryInserter)
pub mod boundary;

/// Fragment partitioning (Gantree: L2_Knit → Partitioner)
pub mod partition;

/// Identity decomposition (Gantree: L2_Knit → QpdTable)
pub mod qpd;

/// Validated plan (Gantree: L2_Knit → KnitPlan)
pub mod plan;

/// Experiment generation (Gantree: L3_Experiment → ExperimentBuilder)
pub mod experiment;

/// Shot budget (Gantree: L3_Experiment → ShotBudget)
pub mod budget;

/// Result decoding (Gantree: L4_Reconstruct → ResultProcessor)
pub mod results;

/// Estimation (Gantree: L4_Reconstruct → ExpectationEstimator)
pub mod estimator;

// ============================================================================
// Re-exports
// ============================================================================

pub use boundary::{insert_boundaries, validate_boundaries};
pub use budget::{ResourceEstimate, ResourceLimits, ShotBudget};
pub use cut::{locate_cuts, CutLocation, FragmentBounds, LocatedCircuit};
pub use estimator::{estimate_expectation_values, sub_expectation_values, ZObservable};
pub use experiment::{
    build_experiment, build_experiments, Experiment, ExperimentSet, IdentityMeasurementSite,
    RegisterLayout,
};
pub use partition::{partition, Fragment};
pub use plan::KnitPlan;
pub use qpd::{
    qpd_combinations, InitState, MeasurementBasis, QpdCombination, QpdCombinations, QpdOperation,
    IDENTITY_QPD,
};
pub use results::{decode_counts, patch_identity_sites, process_results, SubResult, TotalResult};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qcut_knit::prelude::*;
    //! ```

    pub use crate::budget::{ResourceEstimate, ResourceLimits, ShotBudget};
    pub use crate::estimator::{estimate_expectation_values, ZObservable};
    pub use crate::experiment::{ExperimentSet, IdentityMeasurementSite};
    pub use crate::plan::KnitPlan;
    pub use crate::qpd::{qpd_combinations, QpdCombination};
    pub use crate::results::{process_results, TotalResult};
}

// ============================================================================
// Integration Tests
// ============================================================================
