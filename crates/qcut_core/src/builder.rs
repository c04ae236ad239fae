//! Circuit builder for QCut
//!
//! Gantree: L1_Circuit → CircuitBuilder
//!
//! Fluent builder for constructing circuits to be knitted, including
//! the `cut` marker that designates where a wire is severed.

use crate::circuit::{ClassicalRegister, Circuit};
use crate::error::{QcutError, QcutResult};
use crate::gate::Gate;
use crate::types::{Angle, ClbitId, QubitId};

/// Fluent circuit builder (consuming self pattern)
///
/// Invalid gates are recorded and reported by [`CircuitBuilder::try_build`];
/// [`CircuitBuilder::build`] silently skips them.
/// Gantree: CircuitBuilder // 빌더 패턴
pub struct CircuitBuilder {
    /// Internal circuit being built
    circuit: Circuit,

    /// First rejected gate, if any
    error: Option<QcutError>,
}

impl CircuitBuilder {
    // ========================================================================
    // Constructor
    // ========================================================================

    /// Create a new circuit builder
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self {
            circuit: Circuit::new(num_qubits),
            error: None,
        }
    }

    /// Create with circuit name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            circuit: Circuit::with_name(num_qubits, name),
            error: None,
        }
    }

    fn push(mut self, gate: Gate) -> Self {
        if let Err(e) = self.circuit.add_gate(gate) {
            self.error.get_or_insert(e);
        }
        self
    }

    // ========================================================================
    // Single-Qubit Gates
    // ========================================================================

    /// Add Hadamard gate
    /// Gantree: h(self, q) -> Self // H 추가
    pub fn h(self, qubit: QubitId) -> Self {
        self.push(Gate::H(qubit))
    }

    /// Add Pauli-X gate
    pub fn x(self, qubit: QubitId) -> Self {
        self.push(Gate::X(qubit))
    }

    /// Add Pauli-Y gate
    pub fn y(self, qubit: QubitId) -> Self {
        self.push(Gate::Y(qubit))
    }

    /// Add Pauli-Z gate
    pub fn z(self, qubit: QubitId) -> Self {
        self.push(Gate::Z(qubit))
    }

    /// Add S gate
    pub fn s(self, qubit: QubitId) -> Self {
        self.push(Gate::S(qubit))
    }

    /// Add S-dagger gate
    pub fn sdg(self, qubit: QubitId) -> Self {
        self.push(Gate::Sdg(qubit))
    }

    /// Add T gate
    pub fn t(self, qubit: QubitId) -> Self {
        self.push(Gate::T(qubit))
    }

    /// Add T-dagger gate
    pub fn tdg(self, qubit: QubitId) -> Self {
        self.push(Gate::Tdg(qubit))
    }

    /// Add SX gate
    pub fn sx(self, qubit: QubitId) -> Self {
        self.push(Gate::Sx(qubit))
    }

    /// Add identity gate
    pub fn id(self, qubit: QubitId) -> Self {
        self.push(Gate::Id(qubit))
    }

    /// Add Rx rotation
    pub fn rx(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Rx(qubit, angle))
    }

    /// Add Ry rotation
    /// Gantree: ry(self, q, a) -> Self // Ry 추가
    pub fn ry(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Ry(qubit, angle))
    }

    /// Add Rz rotation
    pub fn rz(self, qubit: QubitId, angle: Angle) -> Self {
        self.push(Gate::Rz(qubit, angle))
    }

    /// Add phase gate
    pub fn p(self, qubit: QubitId, lambda: Angle) -> Self {
        self.push(Gate::P(qubit, lambda))
    }

    // ========================================================================
    // Multi-Qubit Gates
    // ========================================================================

    /// Add CNOT gate
    /// Gantree: cnot(self, c, t) -> Self // CNOT 추가
    pub fn cnot(self, control: QubitId, target: QubitId) -> Self {
        self.push(Gate::Cnot(control, target))
    }

    /// Alias for cnot
    pub fn cx(self, control: QubitId, target: QubitId) -> Self {
        self.cnot(control, target)
    }

    /// Add CZ gate
    pub fn cz(self, control: QubitId, target: QubitId) -> Self {
        self.push(Gate::Cz(control, target))
    }

    /// Add SWAP gate
    pub fn swap(self, qubit1: QubitId, qubit2: QubitId) -> Self {
        self.push(Gate::Swap(qubit1, qubit2))
    }

    /// Add Toffoli (CCX) gate
    pub fn ccx(self, c1: QubitId, c2: QubitId, target: QubitId) -> Self {
        self.push(Gate::Ccx(c1, c2, target))
    }

    // ========================================================================
    // Measurement, Control and Cuts
    // ========================================================================

    /// Declare a classical register
    pub fn creg(mut self, name: impl Into<String>, size: usize) -> Self {
        if let Err(e) = self.circuit.add_creg(ClassicalRegister::new(name, size)) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Add measurement into a global classical bit
    pub fn measure(self, qubit: QubitId, clbit: ClbitId) -> Self {
        self.push(Gate::Measure(qubit, clbit))
    }

    /// Add barrier across all qubits
    pub fn barrier(self) -> Self {
        self.push(Gate::Barrier(vec![]))
    }

    /// Add barrier on specific qubits
    pub fn barrier_on(self, qubits: Vec<QubitId>) -> Self {
        self.push(Gate::Barrier(qubits))
    }

    /// Add reset
    pub fn reset(self, qubit: QubitId) -> Self {
        self.push(Gate::Reset(qubit))
    }

    /// Cut the wire: `upstream` is measured out here and the state
    /// continues on `downstream`
    /// Gantree: cut(self, a, b) -> Self // 와이어 컷
    pub fn cut(self, upstream: QubitId, downstream: QubitId) -> Self {
        self.push(Gate::Cut(upstream, downstream))
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Build and return the circuit
    /// Gantree: build(self) -> Circuit // 빌드
    pub fn build(self) -> Circuit {
        self.circuit
    }

    /// Build, reporting the first rejected gate or register
    pub fn try_build(self) -> QcutResult<Circuit> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.circuit),
        }
    }

    /// Get reference to current circuit state
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }
}

// ============================================================================
// Tests
// ============================================================================
