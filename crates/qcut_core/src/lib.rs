//! # QCut Core
//!
//! Core types, gates, circuits and errors for wire-cut circuit knitting.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qcut_core // L0+L1: Foundation + Circuit (완료)
//!     L0_Foundation // 기반 타입/상수/에러 (완료)
//!         CoreTypes // 핵심 타입 (완료)
//!         Constants // QPD/레지스터/자원 상수 (완료)
//!         Errors // 에러 타입 (완료)
//!     L1_Circuit // 회로 구조 (완료)
//!         Gate // 게이트 + 컷 마커 + 자리표시 (완료)
//!         Circuit // 회로 + 고전 레지스터 (완료)
//!         CircuitBuilder // 빌더 패턴 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qcut_core::prelude::*;
//!
//! // Prepare a Bell pair and move one half through a cut wire
//! let circuit = CircuitBuilder::new(3)
//!     .h(0)
//!     .cnot(0, 1)
//!     .cut(1, 2)
//!     .h(2)
//!     .build();
//!
//! assert_eq!(circuit.count_cuts(), 1);
//! println!("{}", circuit);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Core types (Gantree: L0_Foundation → CoreTypes)
pub mod types;

/// Constants (Gantree: L0_Foundation → Constants)
pub mod constants;

/// Error types (Gantree: L0_Foundation → Errors)
pub mod error;

/// Quantum gates (Gantree: L1_Circuit → Gate)
pub mod gate;

/// Circuit structure (Gantree: L1_Circuit → Circuit)
pub mod circuit;

/// Circuit builder (Gantree: L1_Circuit → CircuitBuilder)
pub mod builder;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::CircuitBuilder;
pub use circuit::{ClassicalRegister, Circuit};
pub use constants::{budget, qpd, registers};
pub use error::{QcutError, QcutResult};
pub use gate::{Gate, Placeholder};
pub use types::{Angle, Basis, Bitstring, ClbitId, Counts, Probability, QubitId};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Convenient imports for common use cases
    //!
    //! ```rust
    //! use qcut_core::prelude::*;
    //! ```

    pub use crate::builder::CircuitBuilder;
    pub use crate::circuit::{ClassicalRegister, Circuit};
    pub use crate::constants::{budget, qpd, registers};
    pub use crate::error::{QcutError, QcutResult};
    pub use crate::gate::{Gate, Placeholder};
    pub use crate::types::{Angle, Basis, Bitstring, ClbitId, Counts, Probability, QubitId};
}

// ============================================================================
// Version Information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_cut_circuit_structure() {
        let circuit = CircuitBuilder::new(4)
            .h(0)
            .cnot(0, 1)
            .cut(1, 2)
            .cnot(2, 3)
            .build();

        assert_eq!(circuit.num_qubits(), 4);
        assert_eq!(circuit.count_cuts(), 1);
        assert_eq!(circuit.count_2q(), 2);

        let gates: Vec<String> = circuit.gates().iter().map(|g| g.to_string()).collect();
        assert_eq!(gates, vec!["h q0", "cx q0 q1", "cut q1 -> q2", "cx q2 q3"]);
    }

    #[test]
    fn test_eigenvalue_convention() {
        let bs = Bitstring::parse_registers("1 01").unwrap();
        assert_eq!(bs.eigenvalues(), vec![1, -1, 1]);
        assert_eq!(qpd::IDENTITY_EIGENVALUE, -1);
    }

    #[test]
    fn test_fragment_style_registers() {
        let circuit = CircuitBuilder::new(2)
            .creg(registers::QPD, 1)
            .creg(registers::MEAS, 1)
            .h(0)
            .measure(0, 0)
            .measure(1, 1)
            .try_build()
            .unwrap();

        let (offset, meas) = circuit.creg(registers::MEAS).unwrap();
        assert_eq!(offset, 1);
        assert_eq!(meas.size, 1);
    }

    #[test]
    fn test_qpd_constants() {
        assert_eq!(qpd::BASIS_SIZE, 8);
        assert!((qpd::GAMMA - 4.0).abs() < 1e-12);
        assert!((budget::DEFAULT_ERROR - 0.05).abs() < 1e-12);
    }
}
