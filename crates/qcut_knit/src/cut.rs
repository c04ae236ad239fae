//! Cut location and fragment bounds
//!
//! Gantree: L2_Knit → CutLocator
//!
//! Strips `Cut` markers from an instruction stream, remembering where
//! each one stood, and derives the qubit ranges of the fragments the
//! circuit falls apart into.

use itertools::Itertools;
use qcut_core::{Circuit, Gate, QcutError, QcutResult, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

// ============================================================================
// CutLocation
// ============================================================================

/// Position of one wire cut
/// Gantree: CutLocation // 컷 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CutLocation {
    /// Qubit measured out at the cut
    pub upstream: QubitId,

    /// Qubit the wire continues on
    pub downstream: QubitId,

    /// Index in the marker-free instruction stream before which the cut sits
    pub position: usize,
}

impl CutLocation {
    /// Create a cut location
    pub fn new(upstream: QubitId, downstream: QubitId, position: usize) -> Self {
        Self {
            upstream,
            downstream,
            position,
        }
    }

    /// Smaller endpoint index
    pub fn lower(&self) -> QubitId {
        self.upstream.min(self.downstream)
    }

    /// Larger endpoint index
    pub fn upper(&self) -> QubitId {
        self.upstream.max(self.downstream)
    }
}

impl fmt::Display for CutLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cut(q{} -> q{} @ {})",
            self.upstream, self.downstream, self.position
        )
    }
}

// ============================================================================
// Locating Cuts
// ============================================================================

/// Instruction stream with its cut markers removed
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedCircuit {
    /// Number of qubits of the source circuit
    pub num_qubits: usize,

    /// Marker-free instructions
    pub gates: Vec<Gate>,

    /// Cuts in stream order
    pub cuts: Vec<CutLocation>,
}

/// Remove cut markers, recording each as a [`CutLocation`]
///
/// A marker's position is the number of non-marker instructions that
/// precede it, i.e. its index minus the markers already removed.
/// Gantree: locate_cuts(circuit) -> Result<LocatedCircuit> // 컷 탐색
pub fn locate_cuts(circuit: &Circuit) -> QcutResult<LocatedCircuit> {
    let (gates, cuts) = circuit.gates().iter().try_fold(
        (Vec::with_capacity(circuit.gate_count()), Vec::new()),
        |(mut gates, mut cuts): (Vec<Gate>, Vec<CutLocation>), gate| {
            match gate {
                Gate::Cut(a, b) if a == b => {
                    return Err(QcutError::InvalidCut {
                        position: gates.len(),
                        reason: format!("both endpoints are qubit {}", a),
                    });
                }
                Gate::Cut(a, b) => cuts.push(CutLocation::new(*a, *b, gates.len())),
                Gate::Measure(_, _) | Gate::Placeholder(_) => {
                    return Err(QcutError::UnsupportedInstruction(gate.name().to_string()));
                }
                other => gates.push(other.clone()),
            }
            Ok((gates, cuts))
        },
    )?;

    Ok(LocatedCircuit {
        num_qubits: circuit.num_qubits(),
        gates,
        cuts,
    })
}

// ============================================================================
// FragmentBounds
// ============================================================================

/// Highest original qubit index of each fragment
///
/// Strictly increasing; the last bound is `num_qubits - 1`. Fragment `i`
/// owns qubits `bound[i-1]+1 ..= bound[i]`.
/// Gantree: FragmentBounds // 조각 경계
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentBounds {
    bounds: Vec<QubitId>,
}

impl FragmentBounds {
    /// Bounds of an uncut circuit: a single fragment
    pub fn single(num_qubits: usize) -> QcutResult<Self> {
        Self::from_cuts(&[], num_qubits)
    }

    /// Derive bounds from cut locations
    ///
    /// Cuts sharing a position are cut in parallel and form one boundary,
    /// placed at the largest of their smaller endpoints.
    /// Gantree: from_cuts(cuts, n) -> Result<Self> // 경계 계산
    pub fn from_cuts(cuts: &[CutLocation], num_qubits: usize) -> QcutResult<Self> {
        let last = num_qubits.checked_sub(1).ok_or(QcutError::EmptyCircuit)?;

        let mut grouped: Vec<(usize, QubitId)> = Vec::new();
        for (position, group) in &cuts.iter().chunk_by(|c| c.position) {
            if let Some(bound) = group.map(CutLocation::lower).max() {
                grouped.push((position, bound));
            }
        }

        if let Some(&(position, bound)) = grouped.iter().find(|(_, b)| *b >= last) {
            return Err(QcutError::InvalidCut {
                position,
                reason: format!(
                    "boundary after qubit {} leaves no qubits for the next fragment",
                    bound
                ),
            });
        }

        let mut bounds: Vec<QubitId> = grouped.into_iter().map(|(_, b)| b).collect();
        bounds.sort_unstable();
        bounds.dedup();
        bounds.push(last);

        Ok(Self { bounds })
    }

    /// Raw bounds
    pub fn bounds(&self) -> &[QubitId] {
        &self.bounds
    }

    /// Number of fragments
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// True if there are no fragments
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// First original qubit of fragment `i`
    pub fn offset(&self, i: usize) -> Option<QubitId> {
        match i {
            0 if !self.bounds.is_empty() => Some(0),
            _ => self.bounds.get(i.checked_sub(1)?).map(|b| b + 1),
        }
    }

    /// Qubit range of fragment `i`
    pub fn range(&self, i: usize) -> Option<RangeInclusive<QubitId>> {
        Some(self.offset(i)?..=*self.bounds.get(i)?)
    }

    /// Number of qubits of fragment `i`
    pub fn size(&self, i: usize) -> Option<usize> {
        self.range(i).map(|r| r.count())
    }

    /// Sizes of all fragments
    pub fn sizes(&self) -> Vec<usize> {
        (0..self.len()).filter_map(|i| self.size(i)).collect()
    }

    /// Fragment owning original qubit `q`
    pub fn fragment_of(&self, q: QubitId) -> Option<usize> {
        let index = self.bounds.partition_point(|&b| b < q);
        (index < self.bounds.len()).then_some(index)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcut_core::CircuitBuilder;

    #[test]
    fn test_locate_single_cut() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cnot(0, 1)
            .cut(1, 2)
            .h(2)
            .build();

        let located = locate_cuts(&circuit).unwrap();
        assert_eq!(located.gates.len(), 3);
        assert!(located.gates.iter().all(|g| !g.is_cut()));
        assert_eq!(located.cuts, vec![CutLocation::new(1, 2, 2)]);
    }

    #[test]
    fn test_positions_skip_removed_markers() {
        let circuit = CircuitBuilder::new(4)
            .h(0)
            .cut(0, 1)
            .cut(2, 3)
            .h(1)
            .cut(1, 2)
            .build();

        let located = locate_cuts(&circuit).unwrap();
        let positions: Vec<usize> = located.cuts.iter().map(|c| c.position).collect();
        assert_eq!(positions, vec![1, 1, 2]);
    }

    #[test]
    fn test_zero_cuts() {
        let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).build();
        let located = locate_cuts(&circuit).unwrap();
        assert!(located.cuts.is_empty());
        assert_eq!(located.gates, circuit.gates());
    }

    #[test]
    fn test_rejects_degenerate_and_measured_input() {
        let circuit = Circuit::from_gates(2, vec![Gate::H(0), Gate::Cut(1, 1)]).unwrap();
        assert!(matches!(
            locate_cuts(&circuit),
            Err(QcutError::InvalidCut { position: 1, .. })
        ));

        let circuit = CircuitBuilder::new(1).creg("c", 1).measure(0, 0).build();
        assert!(matches!(
            locate_cuts(&circuit),
            Err(QcutError::UnsupportedInstruction(_))
        ));
    }

    #[test]
    fn test_bounds_single_cut() {
        let bounds = FragmentBounds::from_cuts(&[CutLocation::new(1, 2, 2)], 4).unwrap();
        assert_eq!(bounds.bounds(), &[1, 3]);
        assert_eq!(bounds.sizes(), vec![2, 2]);
        assert_eq!(bounds.range(1), Some(2..=3));
        assert_eq!(bounds.fragment_of(1), Some(0));
        assert_eq!(bounds.fragment_of(2), Some(1));
        assert_eq!(bounds.fragment_of(4), None);
    }

    #[test]
    fn test_bounds_parallel_cuts_share_boundary() {
        let cuts = [CutLocation::new(0, 2, 3), CutLocation::new(1, 3, 3)];
        let bounds = FragmentBounds::from_cuts(&cuts, 4).unwrap();
        assert_eq!(bounds.bounds(), &[1, 3]);
    }

    #[test]
    fn test_bounds_sequential_cuts() {
        let cuts = [CutLocation::new(0, 1, 1), CutLocation::new(1, 2, 4)];
        let bounds = FragmentBounds::from_cuts(&cuts, 3).unwrap();
        assert_eq!(bounds.bounds(), &[0, 1, 2]);
        assert_eq!(bounds.sizes(), vec![1, 1, 1]);
    }

    #[test]
    fn test_bounds_reject_empty_trailing_fragment() {
        let cuts = [CutLocation::new(2, 1, 0)];
        assert!(FragmentBounds::from_cuts(&cuts, 3).is_ok());
        let cuts = [CutLocation::new(2, 3, 0)];
        assert!(matches!(
            FragmentBounds::from_cuts(&cuts, 3),
            Err(QcutError::InvalidCut { .. })
        ));
        assert!(matches!(
            FragmentBounds::single(0),
            Err(QcutError::EmptyCircuit)
        ));
    }

    #[test]
    fn test_single_fragment() {
        let bounds = FragmentBounds::single(3).unwrap();
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds.offset(0), Some(0));
        assert_eq!(bounds.size(0), Some(3));
    }
}
