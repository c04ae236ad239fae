//! Quantum gate definitions for QCut
//!
//! Gantree: L1_Circuit → Gate
//!
//! Standard gates plus the two knitting-specific instruction kinds: the
//! `Cut` marker placed by the user on a wire, and the `Placeholder`
//! values that stand at a cut boundary until an experiment substitutes
//! concrete operations for them.

use crate::types::{Angle, Basis, ClbitId, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Quantum gate enumeration
/// Gantree: Gate // 게이트 enum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Gate {
    // ========================================================================
    // Single-Qubit Gates (Non-Parameterized)
    // ========================================================================
    /// Hadamard gate
    /// Gantree: H(QubitId) // 하다마드
    H(QubitId),

    /// Pauli-X gate (NOT)
    X(QubitId),

    /// Pauli-Y gate
    Y(QubitId),

    /// Pauli-Z gate
    Z(QubitId),

    /// S gate (sqrt(Z))
    /// Gantree: S(QubitId) // S 게이트
    S(QubitId),

    /// S-dagger gate (inverse of S)
    /// Gantree: Sdg(QubitId) // S†
    Sdg(QubitId),

    /// T gate (fourth root of Z)
    T(QubitId),

    /// T-dagger gate (inverse of T)
    Tdg(QubitId),

    /// SX gate (sqrt(X))
    Sx(QubitId),

    /// SX-dagger gate
    Sxdg(QubitId),

    /// Identity gate
    Id(QubitId),

    // ========================================================================
    // Single-Qubit Parameterized Rotation Gates
    // ========================================================================
    /// Rotation around X-axis
    Rx(QubitId, Angle),

    /// Rotation around Y-axis
    /// Gantree: Ry(QubitId, Angle) // Y 회전
    Ry(QubitId, Angle),

    /// Rotation around Z-axis
    Rz(QubitId, Angle),

    /// Phase gate P(λ) = diag(1, e^{iλ})
    P(QubitId, Angle),

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================
    /// Controlled-NOT (CX)
    /// Gantree: CNOT(QubitId, QubitId) // ctrl, tgt
    Cnot(QubitId, QubitId),

    /// Controlled-Z
    Cz(QubitId, QubitId),

    /// SWAP gate
    Swap(QubitId, QubitId),

    /// Toffoli (CCX)
    Ccx(QubitId, QubitId, QubitId),

    // ========================================================================
    // Measurement and Control
    // ========================================================================
    /// Measure a qubit into a classical bit
    /// Gantree: Measure(QubitId, ClbitId) // 단일 측정
    Measure(QubitId, ClbitId),

    /// Barrier (scheduling hint only)
    Barrier(Vec<QubitId>),

    /// Reset qubit to |0⟩
    Reset(QubitId),

    // ========================================================================
    // Knitting Instructions
    // ========================================================================
    /// Wire cut marker: `upstream` is measured out, `downstream` continues
    /// the wire from a freshly prepared state
    /// Gantree: Cut(QubitId, QubitId) // 컷 마커
    Cut(QubitId, QubitId),

    /// Cut boundary placeholder awaiting substitution
    /// Gantree: Placeholder(Placeholder) // 경계 자리표시
    Placeholder(Placeholder),
}

impl Gate {
    // ========================================================================
    // Gate Properties
    // ========================================================================

    /// Get qubits involved in this gate
    /// Gantree: qubits(&self) -> Vec<QubitId> // 관련 큐비트
    pub fn qubits(&self) -> Vec<QubitId> {
        match self {
            Gate::H(q)
            | Gate::X(q)
            | Gate::Y(q)
            | Gate::Z(q)
            | Gate::S(q)
            | Gate::Sdg(q)
            | Gate::T(q)
            | Gate::Tdg(q)
            | Gate::Sx(q)
            | Gate::Sxdg(q)
            | Gate::Id(q)
            | Gate::Rx(q, _)
            | Gate::Ry(q, _)
            | Gate::Rz(q, _)
            | Gate::P(q, _)
            | Gate::Measure(q, _)
            | Gate::Reset(q) => vec![*q],

            Gate::Cnot(a, b) | Gate::Cz(a, b) | Gate::Swap(a, b) | Gate::Cut(a, b) => {
                vec![*a, *b]
            }

            Gate::Ccx(c1, c2, t) => vec![*c1, *c2, *t],

            Gate::Barrier(qs) => qs.clone(),
            Gate::Placeholder(p) => vec![p.qubit()],
        }
    }

    /// Classical bit written by this gate, if any
    pub fn clbit(&self) -> Option<ClbitId> {
        match self {
            Gate::Measure(_, c) => Some(*c),
            _ => None,
        }
    }

    /// Check if gate is a two-qubit unitary
    /// Gantree: is_two_qubit(&self) -> bool // 2Q 판별
    pub fn is_two_qubit(&self) -> bool {
        matches!(self, Gate::Cnot(_, _) | Gate::Cz(_, _) | Gate::Swap(_, _))
    }

    /// Check if gate is measurement
    pub fn is_measurement(&self) -> bool {
        matches!(self, Gate::Measure(_, _))
    }

    /// Check if gate is a barrier
    pub fn is_barrier(&self) -> bool {
        matches!(self, Gate::Barrier(_))
    }

    /// Check if gate is a cut marker
    pub fn is_cut(&self) -> bool {
        matches!(self, Gate::Cut(_, _))
    }

    /// Get the placeholder, if this is one
    pub fn placeholder(&self) -> Option<&Placeholder> {
        match self {
            Gate::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    /// Get gate name
    pub fn name(&self) -> &'static str {
        match self {
            Gate::H(_) => "h",
            Gate::X(_) => "x",
            Gate::Y(_) => "y",
            Gate::Z(_) => "z",
            Gate::S(_) => "s",
            Gate::Sdg(_) => "sdg",
            Gate::T(_) => "t",
            Gate::Tdg(_) => "tdg",
            Gate::Sx(_) => "sx",
            Gate::Sxdg(_) => "sxdg",
            Gate::Id(_) => "id",
            Gate::Rx(_, _) => "rx",
            Gate::Ry(_, _) => "ry",
            Gate::Rz(_, _) => "rz",
            Gate::P(_, _) => "p",
            Gate::Cnot(_, _) => "cx",
            Gate::Cz(_, _) => "cz",
            Gate::Swap(_, _) => "swap",
            Gate::Ccx(_, _, _) => "ccx",
            Gate::Measure(_, _) => "measure",
            Gate::Barrier(_) => "barrier",
            Gate::Reset(_) => "reset",
            Gate::Cut(_, _) => "cut",
            Gate::Placeholder(p) => p.name(),
        }
    }

    /// Rebuild the gate with every qubit index passed through `map`
    /// Gantree: remap_qubits(&self, f) -> Gate // 큐비트 재배치
    pub fn remap_qubits<F>(&self, map: F) -> Gate
    where
        F: Fn(QubitId) -> QubitId,
    {
        match self {
            Gate::H(q) => Gate::H(map(*q)),
            Gate::X(q) => Gate::X(map(*q)),
            Gate::Y(q) => Gate::Y(map(*q)),
            Gate::Z(q) => Gate::Z(map(*q)),
            Gate::S(q) => Gate::S(map(*q)),
            Gate::Sdg(q) => Gate::Sdg(map(*q)),
            Gate::T(q) => Gate::T(map(*q)),
            Gate::Tdg(q) => Gate::Tdg(map(*q)),
            Gate::Sx(q) => Gate::Sx(map(*q)),
            Gate::Sxdg(q) => Gate::Sxdg(map(*q)),
            Gate::Id(q) => Gate::Id(map(*q)),
            Gate::Rx(q, a) => Gate::Rx(map(*q), *a),
            Gate::Ry(q, a) => Gate::Ry(map(*q), *a),
            Gate::Rz(q, a) => Gate::Rz(map(*q), *a),
            Gate::P(q, a) => Gate::P(map(*q), *a),
            Gate::Cnot(c, t) => Gate::Cnot(map(*c), map(*t)),
            Gate::Cz(a, b) => Gate::Cz(map(*a), map(*b)),
            Gate::Swap(a, b) => Gate::Swap(map(*a), map(*b)),
            Gate::Ccx(c1, c2, t) => Gate::Ccx(map(*c1), map(*c2), map(*t)),
            Gate::Measure(q, c) => Gate::Measure(map(*q), *c),
            Gate::Barrier(qs) => Gate::Barrier(qs.iter().map(|&q| map(q)).collect()),
            Gate::Reset(q) => Gate::Reset(map(*q)),
            Gate::Cut(a, b) => Gate::Cut(map(*a), map(*b)),
            Gate::Placeholder(p) => Gate::Placeholder(p.with_qubit(map(p.qubit()))),
        }
    }

    // ========================================================================
    // Basis Transformation Helpers
    // ========================================================================

    /// Get basis transformation gates for measuring in given basis
    /// X basis: H
    /// Y basis: Sdg, H
    /// Z basis: (none)
    pub fn basis_transform(qubit: QubitId, basis: Basis) -> Vec<Gate> {
        match basis {
            Basis::X => vec![Gate::H(qubit)],
            Basis::Y => vec![Gate::Sdg(qubit), Gate::H(qubit)],
            Basis::Z => vec![],
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::Rx(q, theta) | Gate::Ry(q, theta) | Gate::Rz(q, theta) | Gate::P(q, theta) => {
                write!(f, "{}({}) q{}", self.name(), theta, q)
            }
            Gate::Measure(q, c) => write!(f, "measure q{} -> c{}", q, c),
            Gate::Cut(a, b) => write!(f, "cut q{} -> q{}", a, b),
            Gate::Placeholder(p) => write!(f, "{} q{} (cut {})", p.name(), p.qubit(), p.cut()),
            other => {
                let qubits: Vec<String> = other.qubits().iter().map(|q| format!("q{}", q)).collect();
                write!(f, "{} {}", other.name(), qubits.join(" "))
            }
        }
    }
}

// ============================================================================
// Placeholder
// ============================================================================

/// Cut boundary marker, tagged with the index of the cut it belongs to
/// Gantree: Placeholder // Meas/Init 값 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placeholder {
    /// Upstream side: replaced by a QPD basis measurement
    Measure {
        /// Qubit being measured out
        qubit: QubitId,
        /// Cut index
        cut: usize,
    },
    /// Downstream side: replaced by a QPD state preparation
    Initialize {
        /// Qubit being prepared
        qubit: QubitId,
        /// Cut index
        cut: usize,
    },
}

impl Placeholder {
    /// Qubit the placeholder acts on
    pub fn qubit(&self) -> QubitId {
        match self {
            Placeholder::Measure { qubit, .. } | Placeholder::Initialize { qubit, .. } => *qubit,
        }
    }

    /// Cut the placeholder belongs to
    pub fn cut(&self) -> usize {
        match self {
            Placeholder::Measure { cut, .. } | Placeholder::Initialize { cut, .. } => *cut,
        }
    }

    /// True for the measurement side
    pub fn is_measure(&self) -> bool {
        matches!(self, Placeholder::Measure { .. })
    }

    /// Same placeholder on another qubit
    pub fn with_qubit(&self, qubit: QubitId) -> Self {
        match *self {
            Placeholder::Measure { cut, .. } => Placeholder::Measure { qubit, cut },
            Placeholder::Initialize { cut, .. } => Placeholder::Initialize { qubit, cut },
        }
    }

    /// Instruction name
    pub fn name(&self) -> &'static str {
        match self {
            Placeholder::Measure { .. } => "Meas",
            Placeholder::Initialize { .. } => "Init",
        }
    }
}

impl From<Placeholder> for Gate {
    fn from(p: Placeholder) -> Self {
        Gate::Placeholder(p)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_qubits() {
        assert_eq!(Gate::H(0).qubits(), vec![0]);
        assert_eq!(Gate::Cnot(0, 1).qubits(), vec![0, 1]);
        assert_eq!(Gate::Ccx(0, 1, 2).qubits(), vec![0, 1, 2]);
        assert_eq!(Gate::Cut(2, 3).qubits(), vec![2, 3]);
        assert_eq!(Gate::Measure(4, 0).qubits(), vec![4]);
    }

    #[test]
    fn test_gate_classification() {
        assert!(Gate::Measure(0, 0).is_measurement());
        assert!(Gate::Cnot(0, 1).is_two_qubit());
        assert!(!Gate::Cut(0, 1).is_two_qubit());
        assert!(Gate::Cut(0, 1).is_cut());
        assert!(Gate::Measure(0, 0).is_measurement());
        assert_eq!(Gate::Measure(0, 3).clbit(), Some(3));
    }

    #[test]
    fn test_gate_display() {
        assert_eq!(Gate::H(0).to_string(), "h q0");
        assert_eq!(Gate::Cnot(0, 1).to_string(), "cx q0 q1");
        assert_eq!(Gate::Ry(1, 0.5).to_string(), "ry(0.5) q1");
        assert_eq!(Gate::Measure(1, 2).to_string(), "measure q1 -> c2");
        assert_eq!(Gate::Cut(0, 1).to_string(), "cut q0 -> q1");
    }

    #[test]
    fn test_remap_qubits() {
        let shifted = Gate::Cnot(3, 4).remap_qubits(|q| q - 3);
        assert_eq!(shifted, Gate::Cnot(0, 1));

        let p: Gate = Placeholder::Initialize { qubit: 5, cut: 2 }.into();
        let shifted = p.remap_qubits(|q| q - 4);
        assert_eq!(
            shifted.placeholder(),
            Some(&Placeholder::Initialize { qubit: 1, cut: 2 })
        );
    }

    #[test]
    fn test_placeholder_accessors() {
        let m = Placeholder::Measure { qubit: 1, cut: 0 };
        assert!(m.is_measure());
        assert_eq!(m.qubit(), 1);
        assert_eq!(m.cut(), 0);
        assert_eq!(m.name(), "Meas");
        assert_eq!(Placeholder::Initialize { qubit: 0, cut: 0 }.name(), "Init");
    }

    #[test]
    fn test_basis_transform() {
        let x_gates = Gate::basis_transform(0, Basis::X);
        assert_eq!(x_gates, vec![Gate::H(0)]);

        let y_gates = Gate::basis_transform(0, Basis::Y);
        assert_eq!(y_gates, vec![Gate::Sdg(0), Gate::H(0)]);

        assert!(Gate::basis_transform(0, Basis::Z).is_empty());
    }
}
