//! Knitting plan
//!
//! Gantree: L2_Knit → KnitPlan
//!
//! Chains cut location, boundary insertion and partitioning into one
//! validated structure. Everything in a plan is checked before a single
//! circuit reaches a backend.

use crate::boundary::{insert_boundaries, validate_boundaries};
use crate::budget::{ResourceEstimate, ShotBudget};
use crate::cut::{locate_cuts, CutLocation, FragmentBounds};
use crate::estimator::ZObservable;
use crate::experiment::{build_experiments, ExperimentSet};
use crate::partition::{partition, Fragment};
use qcut_core::{qpd, Circuit, QcutError, QcutResult, QubitId};
use std::fmt;

/// Fragments of a cut circuit and the cuts that join them
/// Gantree: KnitPlan // 니팅 계획
#[derive(Debug, Clone, PartialEq)]
pub struct KnitPlan {
    num_qubits: usize,
    cuts: Vec<CutLocation>,
    bounds: FragmentBounds,
    fragments: Vec<Fragment>,
}

impl KnitPlan {
    /// Analyze a circuit containing cut markers
    /// Gantree: from_circuit(circuit) -> Result<Self> // 계획 수립
    pub fn from_circuit(circuit: &Circuit) -> QcutResult<Self> {
        let num_qubits = circuit.num_qubits();
        let located = locate_cuts(circuit)?;
        let bounds = FragmentBounds::from_cuts(&located.cuts, num_qubits)?;
        let stream = insert_boundaries(located.gates, &located.cuts)?;
        validate_boundaries(&stream, num_qubits)?;
        let fragments = partition(stream, &bounds, located.cuts.len())?;

        log::debug!(
            "Planned {} cuts into fragments of sizes {:?}",
            located.cuts.len(),
            bounds.sizes()
        );

        Ok(Self {
            num_qubits,
            cuts: located.cuts,
            bounds,
            fragments,
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Qubits of the source circuit
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of cuts
    pub fn num_cuts(&self) -> usize {
        self.cuts.len()
    }

    /// Number of fragments
    pub fn num_fragments(&self) -> usize {
        self.fragments.len()
    }

    /// Cut locations in stream order
    pub fn cuts(&self) -> &[CutLocation] {
        &self.cuts
    }

    /// Fragment bounds
    pub fn bounds(&self) -> &FragmentBounds {
        &self.bounds
    }

    /// Fragments in bound order
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    /// Number of experiments (8^k)
    pub fn experiment_count(&self) -> QcutResult<u64> {
        qpd::experiment_count(self.num_cuts()).ok_or_else(|| QcutError::BudgetOverflow {
            cuts: self.num_cuts(),
            reason: "8^k does not fit in 64 bits".into(),
        })
    }

    // ========================================================================
    // Observable Indexing
    // ========================================================================

    /// Original qubit behind each reconstructed observable index
    ///
    /// Unconsumed qubits of each fragment in ascending order, fragments
    /// concatenated in bound order.
    pub fn observable_qubits(&self) -> Vec<QubitId> {
        self.fragments
            .iter()
            .flat_map(|f| {
                f.measured_qubits()
                    .into_iter()
                    .map(move |q| f.original_qubit(q))
            })
            .collect()
    }

    /// Width of the reconstructed measurement vector
    pub fn observable_width(&self) -> usize {
        self.fragments.iter().map(Fragment::meas_bits).sum()
    }

    /// Observable index of an original qubit, if it is measured at the end
    pub fn observable_index(&self, qubit: QubitId) -> Option<usize> {
        self.observable_qubits().iter().position(|&q| q == qubit)
    }

    /// Z product on original qubits, translated to observable indices
    pub fn observable_on(&self, qubits: &[QubitId]) -> QcutResult<ZObservable> {
        let width = self.observable_width();
        let indices = qubits
            .iter()
            .map(|&q| {
                self.observable_index(q)
                    .ok_or(QcutError::ObservableOutOfRange { index: q, width })
            })
            .collect::<QcutResult<Vec<_>>>()?;
        ZObservable::new(indices)
    }

    /// Check observables against the reconstructed width
    pub fn validate_observables(&self, observables: &[ZObservable]) -> QcutResult<()> {
        let width = self.observable_width();
        observables.iter().try_for_each(|o| o.validate(width))
    }

    // ========================================================================
    // Budget and Experiments
    // ========================================================================

    /// Shot budget at target error `error`
    pub fn budget(&self, error: f64) -> QcutResult<ShotBudget> {
        ShotBudget::new(self.num_cuts(), error)
    }

    /// Resource estimate at target error `error`
    pub fn resource_estimate(&self, error: f64) -> QcutResult<ResourceEstimate> {
        ResourceEstimate::new(&self.budget(error)?, self.num_fragments())
    }

    /// Distinct nonzero outcome widths among the experiment circuits
    ///
    /// A fragment with `m` measured cuts yields circuits with every `c`
    /// width from 0 to `m`, since any subset of its cuts can take the
    /// identity term. Readout calibration runs once per width.
    pub fn calibration_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .fragments
            .iter()
            .flat_map(|f| (0..=f.qpd_bits()).map(move |qpd| qpd + f.meas_bits()))
            .filter(|&width| width > 0)
            .collect();
        widths.sort_unstable();
        widths.dedup();
        widths
    }

    /// Instantiate all experiments
    pub fn build_experiments(&self) -> QcutResult<ExperimentSet> {
        build_experiments(&self.fragments, self.num_cuts())
    }
}

impl fmt::Display for KnitPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "KnitPlan: {} qubits, {} cuts, {} fragments",
            self.num_qubits,
            self.num_cuts(),
            self.num_fragments()
        )?;
        for cut in &self.cuts {
            writeln!(f, "  {}", cut)?;
        }
        for fragment in &self.fragments {
            writeln!(f, "  {}", fragment)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
