//! Cut boundary insertion and validation
//!
//! Gantree: L2_Knit → BoundaryInserter
//!
//! Every cut becomes a pair of placeholders: `Meas` on the upstream qubit
//! and `Init` on the downstream qubit, both tagged with the cut index.
//! The pair is ordered by qubit index, smaller first.

use crate::cut::CutLocation;
use qcut_core::{Gate, Placeholder, QcutError, QcutResult, QubitId};

/// Interleave placeholder pairs into a marker-free instruction stream
///
/// Cut `i` at position `p` lands before the instruction originally at
/// `p`; cuts at `gates.len()` are appended. Positions must not decrease.
/// Gantree: insert_boundaries(gates, cuts) -> Result<Vec<Gate>> // 경계 삽입
pub fn insert_boundaries(gates: Vec<Gate>, cuts: &[CutLocation]) -> QcutResult<Vec<Gate>> {
    let len = gates.len();
    for (index, pair) in cuts.windows(2).enumerate() {
        if pair[1].position < pair[0].position {
            return Err(QcutError::InvalidCut {
                position: pair[1].position,
                reason: format!(
                    "cut {} precedes cut {} in the instruction stream",
                    index + 1,
                    index
                ),
            });
        }
    }
    if let Some(cut) = cuts.iter().find(|c| c.position > len) {
        return Err(QcutError::InvalidCut {
            position: cut.position,
            reason: format!("stream has only {} instructions", len),
        });
    }

    let mut pending = cuts.iter().enumerate().peekable();
    let mut gates = gates.into_iter();
    let mut out = Vec::with_capacity(len + 2 * cuts.len());
    let mut offset = 0;

    for index in 0..=len {
        while let Some((cut_index, cut)) = pending.next_if(|(_, c)| c.position == index) {
            debug_assert_eq!(out.len(), cut.position + offset);
            out.extend(boundary_pair(cut_index, cut));
            offset += 2;
        }
        if let Some(gate) = gates.next() {
            out.push(gate);
        }
    }

    Ok(out)
}

fn boundary_pair(cut_index: usize, cut: &CutLocation) -> [Gate; 2] {
    let measure = Placeholder::Measure {
        qubit: cut.upstream,
        cut: cut_index,
    };
    let init = Placeholder::Initialize {
        qubit: cut.downstream,
        cut: cut_index,
    };
    if cut.upstream < cut.downstream {
        [measure.into(), init.into()]
    } else {
        [init.into(), measure.into()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WireState {
    Fresh,
    Active,
    Consumed(usize),
}

/// Check wire ordering around every placeholder
///
/// A qubit measured out by a cut may not be touched again, and a qubit
/// initialized by a cut must not have been touched before.
/// Gantree: validate_boundaries(stream, n) -> Result<()> // 경계 검증
pub fn validate_boundaries(stream: &[Gate], num_qubits: usize) -> QcutResult<()> {
    let mut wires = vec![WireState::Fresh; num_qubits];

    for gate in stream {
        match gate {
            Gate::Barrier(_) => {}
            Gate::Placeholder(Placeholder::Measure { qubit, cut }) => {
                let state = wire_mut(&mut wires, *qubit)?;
                if let WireState::Consumed(previous) = *state {
                    return Err(QcutError::OperationAfterCut {
                        qubit: *qubit,
                        cut: previous,
                    });
                }
                *state = WireState::Consumed(*cut);
            }
            Gate::Placeholder(Placeholder::Initialize { qubit, cut }) => {
                let state = wire_mut(&mut wires, *qubit)?;
                match *state {
                    WireState::Fresh => *state = WireState::Active,
                    WireState::Active => {
                        return Err(QcutError::OperationBeforeInit {
                            qubit: *qubit,
                            cut: *cut,
                        })
                    }
                    WireState::Consumed(previous) => {
                        return Err(QcutError::OperationAfterCut {
                            qubit: *qubit,
                            cut: previous,
                        })
                    }
                }
            }
            other => {
                for qubit in other.qubits() {
                    let state = wire_mut(&mut wires, qubit)?;
                    match *state {
                        WireState::Consumed(cut) => {
                            return Err(QcutError::OperationAfterCut { qubit, cut })
                        }
                        WireState::Fresh => *state = WireState::Active,
                        WireState::Active => {}
                    }
                }
            }
        }
    }

    Ok(())
}

fn wire_mut(wires: &mut [WireState], qubit: QubitId) -> QcutResult<&mut WireState> {
    let num_qubits = wires.len();
    wires.get_mut(qubit).ok_or(QcutError::GateQubitMismatch {
        qubit,
        num_qubits,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn meas(qubit: QubitId, cut: usize) -> Gate {
        Placeholder::Measure { qubit, cut }.into()
    }

    fn init(qubit: QubitId, cut: usize) -> Gate {
        Placeholder::Initialize { qubit, cut }.into()
    }

    #[test]
    fn test_single_insertion() {
        let gates = vec![Gate::H(0), Gate::Cnot(0, 1), Gate::H(2)];
        let stream = insert_boundaries(gates, &[CutLocation::new(1, 2, 2)]).unwrap();
        assert_eq!(
            stream,
            vec![Gate::H(0), Gate::Cnot(0, 1), meas(1, 0), init(2, 0), Gate::H(2)]
        );
    }

    #[test]
    fn test_offsets_accumulate() {
        let gates = vec![Gate::H(0), Gate::H(1), Gate::H(2)];
        let cuts = [
            CutLocation::new(0, 1, 1),
            CutLocation::new(2, 3, 1),
            CutLocation::new(1, 2, 2),
        ];
        let stream = insert_boundaries(gates, &cuts).unwrap();
        assert_eq!(
            stream,
            vec![
                Gate::H(0),
                meas(0, 0),
                init(1, 0),
                meas(2, 1),
                init(3, 1),
                Gate::H(1),
                meas(1, 2),
                init(2, 2),
                Gate::H(2),
            ]
        );
    }

    #[test]
    fn test_reversed_cut_orders_by_qubit() {
        let stream = insert_boundaries(vec![Gate::X(2)], &[CutLocation::new(2, 1, 1)]).unwrap();
        assert_eq!(stream, vec![Gate::X(2), init(1, 0), meas(2, 0)]);
    }

    #[test]
    fn test_trailing_and_leading_cuts() {
        let cuts = [CutLocation::new(0, 1, 0), CutLocation::new(1, 2, 1)];
        let stream = insert_boundaries(vec![Gate::H(1)], &cuts).unwrap();
        assert_eq!(
            stream,
            vec![meas(0, 0), init(1, 0), Gate::H(1), meas(1, 1), init(2, 1)]
        );
    }

    #[test]
    fn test_rejects_bad_positions() {
        let cuts = [CutLocation::new(0, 1, 2), CutLocation::new(1, 2, 1)];
        assert!(insert_boundaries(vec![Gate::H(0); 3], &cuts).is_err());
        let cuts = [CutLocation::new(0, 1, 5)];
        assert!(insert_boundaries(vec![Gate::H(0)], &cuts).is_err());
    }

    #[test]
    fn test_validate_accepts_chained_cuts() {
        let stream = vec![
            Gate::H(0),
            meas(0, 0),
            init(1, 0),
            Gate::Rz(1, 0.3),
            meas(1, 1),
            init(2, 1),
            Gate::H(2),
        ];
        assert!(validate_boundaries(&stream, 3).is_ok());
    }

    #[test]
    fn test_validate_rejects_use_after_measure() {
        let stream = vec![Gate::H(0), meas(0, 0), init(1, 0), Gate::Cnot(0, 1)];
        assert_eq!(
            validate_boundaries(&stream, 2),
            Err(QcutError::OperationAfterCut { qubit: 0, cut: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_use_before_init() {
        let stream = vec![Gate::H(1), meas(0, 0), init(1, 0)];
        assert_eq!(
            validate_boundaries(&stream, 2),
            Err(QcutError::OperationBeforeInit { qubit: 1, cut: 0 })
        );
    }

    #[test]
    fn test_validate_ignores_barriers() {
        let stream = vec![Gate::Barrier(vec![0, 1]), meas(0, 0), init(1, 0)];
        assert!(validate_boundaries(&stream, 2).is_ok());
    }
}
