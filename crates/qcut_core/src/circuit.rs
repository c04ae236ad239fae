//! Quantum circuit structure for QCut
//!
//! Gantree: L1_Circuit → Circuit
//!
//! A circuit is a qubit count, an ordered list of classical registers and
//! a gate sequence. Classical bits are addressed globally: the first bit
//! of a register sits right after the last bit of the register declared
//! before it.

use crate::error::{QcutError, QcutResult};
use crate::gate::Gate;
use crate::types::ClbitId;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ClassicalRegister
// ============================================================================

/// Named classical register
/// Gantree: ClassicalRegister // 고전 레지스터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassicalRegister {
    /// Register name
    pub name: String,

    /// Number of bits
    pub size: usize,
}

impl ClassicalRegister {
    /// Create a new register
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

// ============================================================================
// Circuit
// ============================================================================

/// Quantum circuit
/// Gantree: Circuit // 회로 구조체
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Number of qubits
    /// Gantree: num_qubits: usize // 큐비트 수
    num_qubits: usize,

    /// Classical registers in declaration order
    cregs: Vec<ClassicalRegister>,

    /// Gate sequence
    /// Gantree: gates: Vec<Gate> // 게이트 목록
    gates: Vec<Gate>,

    /// Optional circuit name
    name: Option<String>,
}

impl Circuit {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create a new empty circuit with no classical registers
    /// Gantree: new(n) -> Self // 생성자
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            cregs: Vec::new(),
            gates: Vec::new(),
            name: None,
        }
    }

    /// Create a circuit with a name
    pub fn with_name(num_qubits: usize, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(num_qubits)
        }
    }

    /// Create from a vector of gates
    pub fn from_gates(num_qubits: usize, gates: Vec<Gate>) -> QcutResult<Self> {
        Self::from_parts(num_qubits, Vec::new(), gates)
    }

    /// Create from registers and gates, validating every index
    /// Gantree: from_parts(n, cregs, gates) -> Result<Self> // 부품 조립
    pub fn from_parts(
        num_qubits: usize,
        cregs: Vec<ClassicalRegister>,
        gates: Vec<Gate>,
    ) -> QcutResult<Self> {
        let mut circuit = Self::new(num_qubits);
        for creg in cregs {
            circuit.add_creg(creg)?;
        }
        circuit.gates = gates;
        circuit.validate_gates()?;
        Ok(circuit)
    }

    // ========================================================================
    // Basic Operations
    // ========================================================================

    /// Declare a classical register after the existing ones
    pub fn add_creg(&mut self, creg: ClassicalRegister) -> QcutResult<()> {
        if self.cregs.iter().any(|r| r.name == creg.name) {
            return Err(QcutError::DuplicateRegister(creg.name));
        }
        self.cregs.push(creg);
        Ok(())
    }

    /// Add a gate to the circuit
    /// Gantree: add_gate(&mut, Gate) -> Result // 게이트 추가
    pub fn add_gate(&mut self, gate: Gate) -> QcutResult<()> {
        self.validate_gate(&gate)?;
        self.gates.push(gate);
        Ok(())
    }

    /// Get number of qubits
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Total number of classical bits across all registers
    pub fn num_clbits(&self) -> usize {
        self.cregs.iter().map(|r| r.size).sum()
    }

    /// Get classical registers
    pub fn cregs(&self) -> &[ClassicalRegister] {
        &self.cregs
    }

    /// Find a register by name, returning its global offset
    pub fn creg(&self, name: &str) -> Option<(ClbitId, &ClassicalRegister)> {
        let mut offset = 0;
        for reg in &self.cregs {
            if reg.name == name {
                return Some((offset, reg));
            }
            offset += reg.size;
        }
        None
    }

    /// Register sizes in declaration order
    pub fn register_layout(&self) -> Vec<usize> {
        self.cregs.iter().map(|r| r.size).collect()
    }

    /// Get gates
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Get circuit name
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Set circuit name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    /// Check if circuit is empty
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    // ========================================================================
    // Circuit Analysis
    // ========================================================================

    /// Calculate circuit depth (longest path)
    /// Gantree: depth(&self) -> usize // 깊이 계산
    pub fn depth(&self) -> usize {
        let mut qubit_depths = vec![0usize; self.num_qubits];

        for gate in &self.gates {
            let qubits = if gate.is_barrier() && gate.qubits().is_empty() {
                (0..self.num_qubits).collect()
            } else {
                gate.qubits()
            };
            let max_depth = qubits
                .iter()
                .filter_map(|&q| qubit_depths.get(q))
                .max()
                .copied()
                .unwrap_or(0);
            for &q in &qubits {
                if let Some(d) = qubit_depths.get_mut(q) {
                    *d = max_depth + 1;
                }
            }
        }

        qubit_depths.into_iter().max().unwrap_or(0)
    }

    /// Get total gate count
    /// Gantree: gate_count(&self) -> usize // 게이트 수
    pub fn gate_count(&self) -> usize {
        self.gates.len()
    }

    /// Count two-qubit gates
    pub fn count_2q(&self) -> usize {
        self.gates.iter().filter(|g| g.is_two_qubit()).count()
    }

    /// Count measurement operations
    pub fn count_measurements(&self) -> usize {
        self.gates.iter().filter(|g| g.is_measurement()).count()
    }

    /// Count cut markers
    /// Gantree: count_cuts(&self) -> usize // 컷 수
    pub fn count_cuts(&self) -> usize {
        self.gates.iter().filter(|g| g.is_cut()).count()
    }

    // ========================================================================
    // Validation
    // ========================================================================

    fn validate_gate(&self, gate: &Gate) -> QcutResult<()> {
        for qubit in gate.qubits() {
            if qubit >= self.num_qubits {
                return Err(QcutError::GateQubitMismatch {
                    qubit,
                    num_qubits: self.num_qubits,
                });
            }
        }
        if let Some(clbit) = gate.clbit() {
            let num_clbits = self.num_clbits();
            if clbit >= num_clbits {
                return Err(QcutError::GateClbitMismatch { clbit, num_clbits });
            }
        }
        Ok(())
    }

    /// Validate all gates in the circuit
    fn validate_gates(&self) -> QcutResult<()> {
        self.gates.iter().try_for_each(|g| self.validate_gate(g))
    }
}

// ============================================================================
// Display
// ============================================================================

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Circuit({} qubits, {} clbits, {} gates)",
            self.num_qubits,
            self.num_clbits(),
            self.gates.len()
        )?;
        writeln!(f, "  Depth: {}", self.depth())?;
        writeln!(f, "  Cuts: {}", self.count_cuts())?;
        writeln!(f, "  Measurements: {}", self.count_measurements())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
