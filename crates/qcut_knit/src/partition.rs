//! Fragment partitioning
//!
//! Gantree: L2_Knit → Partitioner
//!
//! Buckets a placeholder-annotated stream into one sub-circuit per
//! fragment, renumbering qubits from zero inside each fragment. Every
//! fragment declares two registers: `c` with one bit per `Meas`
//! placeholder and `meas` with one bit per remaining qubit.

use crate::cut::FragmentBounds;
use qcut_core::{
    registers, Circuit, ClassicalRegister, Gate, Placeholder, QcutError, QcutResult, QubitId,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One independently executable piece of a cut circuit
/// Gantree: Fragment // 조각 회로
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    index: usize,
    offset: QubitId,
    circuit: Circuit,
    measured_cuts: Vec<usize>,
    initialized_cuts: Vec<usize>,
}

impl Fragment {
    /// Position of the fragment in bound order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Original index of local qubit 0
    pub fn offset(&self) -> QubitId {
        self.offset
    }

    /// Fragment circuit with placeholders still in place
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Number of local qubits
    pub fn num_qubits(&self) -> usize {
        self.circuit.num_qubits()
    }

    /// Width of the `c` register
    pub fn qpd_bits(&self) -> usize {
        self.measured_cuts.len()
    }

    /// Width of the `meas` register
    pub fn meas_bits(&self) -> usize {
        self.num_qubits() - self.qpd_bits()
    }

    /// Cuts measured out in this fragment, in stream order
    pub fn measured_cuts(&self) -> &[usize] {
        &self.measured_cuts
    }

    /// Cuts initialized in this fragment, in stream order
    pub fn initialized_cuts(&self) -> &[usize] {
        &self.initialized_cuts
    }

    /// Original qubit index of a local qubit
    pub fn original_qubit(&self, local: QubitId) -> QubitId {
        self.offset + local
    }

    /// Local qubits that end the circuit unmeasured, ascending
    ///
    /// These are the qubits read into the `meas` register.
    pub fn measured_qubits(&self) -> Vec<QubitId> {
        let consumed: Vec<QubitId> = self
            .circuit
            .gates()
            .iter()
            .filter_map(Gate::placeholder)
            .filter(|p| p.is_measure())
            .map(Placeholder::qubit)
            .collect();
        (0..self.num_qubits())
            .filter(|q| !consumed.contains(q))
            .collect()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Fragment {} (qubits {}..{}, c[{}], meas[{}], {} gates)",
            self.index,
            self.offset,
            self.offset + self.num_qubits(),
            self.qpd_bits(),
            self.meas_bits(),
            self.circuit.gate_count()
        )
    }
}

/// Split a placeholder-annotated stream into fragments
///
/// Barriers are dropped. Every cut in `0..num_cuts` must end up with
/// exactly one `Meas` and one `Init` placeholder.
/// Gantree: partition(stream, bounds, k) -> Result<Vec<Fragment>> // 분할
pub fn partition(
    stream: Vec<Gate>,
    bounds: &FragmentBounds,
    num_cuts: usize,
) -> QcutResult<Vec<Fragment>> {
    let num_qubits = bounds.bounds().last().map_or(0, |b| b + 1);
    let mut buckets: Vec<Vec<Gate>> = vec![Vec::new(); bounds.len()];
    let mut measured: Vec<Vec<usize>> = vec![Vec::new(); bounds.len()];
    let mut initialized: Vec<Vec<usize>> = vec![Vec::new(); bounds.len()];

    for gate in stream {
        if gate.is_barrier() {
            continue;
        }

        let qubits = gate.qubits();
        let owners = qubits
            .iter()
            .map(|&q| {
                bounds
                    .fragment_of(q)
                    .ok_or(QcutError::GateQubitMismatch { qubit: q, num_qubits })
            })
            .collect::<QcutResult<Vec<usize>>>()?;
        let fragment = match owners.split_first() {
            Some((&first, rest)) if rest.iter().all(|&f| f == first) => first,
            Some(_) => {
                return Err(QcutError::CrossFragmentInstruction {
                    gate: gate.name().to_string(),
                    qubits,
                })
            }
            None => continue,
        };

        match gate.placeholder() {
            Some(Placeholder::Measure { cut, .. }) => measured[fragment].push(*cut),
            Some(Placeholder::Initialize { cut, .. }) => initialized[fragment].push(*cut),
            None => {}
        }

        let offset = bounds.offset(fragment).unwrap_or(0);
        buckets[fragment].push(gate.remap_qubits(|q| q - offset));
    }

    for cut in 0..num_cuts {
        let measures = measured.iter().flatten().filter(|&&c| c == cut).count();
        let inits = initialized.iter().flatten().filter(|&&c| c == cut).count();
        if measures != 1 || inits != 1 {
            return Err(QcutError::UnpairedCut(cut));
        }
    }
    if let Some(&stray) = measured
        .iter()
        .chain(&initialized)
        .flatten()
        .find(|&&c| c >= num_cuts)
    {
        return Err(QcutError::UnpairedCut(stray));
    }

    buckets
        .into_iter()
        .zip(measured)
        .zip(initialized)
        .enumerate()
        .map(|(index, ((gates, measured_cuts), initialized_cuts))| {
            let size = bounds.size(index).unwrap_or(0);
            let offset = bounds.offset(index).unwrap_or(0);
            let meas_bits = size.checked_sub(measured_cuts.len()).ok_or_else(|| {
                QcutError::InvalidCut {
                    position: offset,
                    reason: format!(
                        "fragment {} measures out {} wires but has {} qubits",
                        index,
                        measured_cuts.len(),
                        size
                    ),
                }
            })?;

            let cregs = vec![
                ClassicalRegister::new(registers::QPD, measured_cuts.len()),
                ClassicalRegister::new(registers::MEAS, meas_bits),
            ];
            let mut circuit = Circuit::from_parts(size, cregs, gates)?;
            circuit.set_name(format!("fragment_{}", index));

            Ok(Fragment {
                index,
                offset,
                circuit,
                measured_cuts,
                initialized_cuts,
            })
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
