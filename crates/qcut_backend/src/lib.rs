//! # QCut Backend
//!
//! Execution collaborator for circuit knitting: the backend trait, an
//! in-process statevector simulator and local readout-error mitigation.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qcut_backend // L6: Backend (완료)
//!     BackendTrait // 실행 인터페이스 (완료)
//!     NoiseModel // 측정 노이즈 (완료)
//!     SimulatorBackend // 분기 상태벡터 시뮬레이터 (완료)
//!     ReadoutMitigation // 국소 측정 완화 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qcut_backend::prelude::*;
//! use qcut_core::CircuitBuilder;
//!
//! let backend = SimulatorBackend::ideal(3).with_seed(42);
//!
//! let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).build();
//!
//! let result = backend.execute(&circuit, 1000).unwrap();
//! println!("<Z0> = {:.4}", result.z_expectation(0));
//! ```
//!
//! ## Readout Mitigation
//!
//! ```rust
//! use qcut_backend::prelude::*;
//! use qcut_core::CircuitBuilder;
//!
//! let backend = SimulatorBackend::with_readout_error(2, 0.05)
//!     .unwrap()
//!     .with_seed(42);
//!
//! let mitigator = backend.characterize_readout(2, 4096).unwrap();
//! let circuit = CircuitBuilder::new(2).x(1).build();
//! let raw = backend.execute(&circuit, 4096).unwrap();
//! let quasi = mitigator.quasi_probabilities(&raw.counts).unwrap();
//! assert!(quasi.values().sum::<f64>() > 0.99);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Execution types and backend trait (Gantree: L6_Backend → BackendTrait)
pub mod execution;

/// Readout noise model (Gantree: L6_Backend → NoiseModel)
pub mod noise;

/// Simulator backend (Gantree: L6_Backend → SimulatorBackend)
pub mod simulator;

/// Readout mitigation (Gantree: L6_Backend → ReadoutMitigation)
pub mod mitigation;

// ============================================================================
// Re-exports
// ============================================================================

pub use execution::{Backend, ExecutionMetadata, ExecutionResult};
pub use mitigation::{LocalReadoutMitigator, ReadoutAssignment};
pub use noise::NoiseModel;
pub use simulator::SimulatorBackend;

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qcut_backend::prelude::*;
    //! ```

    pub use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
    pub use crate::mitigation::{LocalReadoutMitigator, ReadoutAssignment};
    pub use crate::noise::NoiseModel;
    pub use crate::simulator::SimulatorBackend;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use qcut_core::CircuitBuilder;
    use std::f64::consts::PI;

    #[test]
    fn test_rotation_gates() {
        let backend = SimulatorBackend::ideal(1).with_seed(42);

        // Rx(PI) should flip |0> to |1>
        let circuit = CircuitBuilder::new(1).rx(0, PI).build();
        let result = backend.execute(&circuit, 1000).unwrap();
        assert!(result.probability("1") > 0.99);

        // Ry(PI) should flip |0> to |1>
        let circuit = CircuitBuilder::new(1).ry(0, PI).build();
        let result = backend.execute(&circuit, 1000).unwrap();
        assert!(result.probability("1") > 0.99);
    }

    #[test]
    fn test_backend_through_reference() {
        fn run_generic<B: Backend>(backend: B) -> f64 {
            let circuit = CircuitBuilder::new(1).x(0).build();
            backend.execute(&circuit, 100).unwrap().z_expectation(0)
        }

        let backend = SimulatorBackend::ideal(1).with_seed(1);
        assert!((run_generic(&backend) + 1.0).abs() < 1e-12);
        assert!((run_generic(&backend as &dyn Backend) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mitigation_improves_expectation() {
        let backend = SimulatorBackend::with_readout_error(1, 0.08)
            .unwrap()
            .with_seed(3);
        let circuit = CircuitBuilder::new(1).build();

        let raw = backend.execute(&circuit, 40_000).unwrap();
        let mitigator = backend.characterize_readout(1, 40_000).unwrap();
        let mitigated = mitigator.mitigate_counts(&raw.counts, raw.shots).unwrap();
        let corrected = ExecutionResult::new(mitigated, raw.shots, "mitigated");

        let raw_error = (raw.z_expectation(0) - 1.0).abs();
        let mitigated_error = (corrected.z_expectation(0) - 1.0).abs();
        assert!(
            mitigated_error < raw_error,
            "raw={}, mitigated={}",
            raw_error,
            mitigated_error
        );
    }
}
