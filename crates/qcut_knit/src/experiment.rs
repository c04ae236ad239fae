//! Experiment generation
//!
//! Gantree: L3_Experiment → ExperimentBuilder
//!
//! Resolves the placeholders of every fragment for each QPD combination.
//! `Meas` becomes a basis change plus a measurement into the next `c` bit,
//! or nothing for the identity branch, in which case the site is recorded
//! so the missing eigenvalue can be patched in after execution. `Init`
//! becomes the preparation gates of the chosen state. Remaining qubits are
//! measured into `meas` in ascending order.

use crate::partition::Fragment;
use crate::qpd::{qpd_combinations, MeasurementBasis, QpdCombination};
use qcut_core::{
    registers, Circuit, ClassicalRegister, Gate, Placeholder, QcutError, QcutResult,
};
use serde::{Deserialize, Serialize};

/// Where an identity-basis measurement produced no classical bit
/// Gantree: IdentityMeasurementSite // 항등 측정 위치
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentityMeasurementSite {
    /// Experiment index
    pub experiment: usize,
    /// Fragment index
    pub fragment: usize,
    /// Position among the fragment's `Meas` placeholders
    pub slot: usize,
}

/// Classical register widths of an instantiated fragment circuit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterLayout {
    /// Width of `c`
    pub qpd_bits: usize,
    /// Width of `meas`
    pub meas_bits: usize,
}

impl RegisterLayout {
    /// Total bits per outcome
    pub fn width(&self) -> usize {
        self.qpd_bits + self.meas_bits
    }
}

/// One QPD combination instantiated on every fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Experiment {
    index: usize,
    combination: QpdCombination,
    circuits: Vec<Circuit>,
    layouts: Vec<RegisterLayout>,
}

impl Experiment {
    /// Experiment index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Combination the experiment realizes
    pub fn combination(&self) -> &QpdCombination {
        &self.combination
    }

    /// Product of the QPD coefficients
    pub fn coefficient(&self) -> f64 {
        self.combination.coefficient()
    }

    /// Executable circuit per fragment
    pub fn circuits(&self) -> &[Circuit] {
        &self.circuits
    }

    /// Register widths per fragment
    pub fn layouts(&self) -> &[RegisterLayout] {
        &self.layouts
    }
}

/// All experiments of a cut circuit
/// Gantree: ExperimentSet // 실험 집합
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSet {
    num_cuts: usize,
    experiments: Vec<Experiment>,
    identity_sites: Vec<IdentityMeasurementSite>,
}

impl ExperimentSet {
    /// Number of cuts
    pub fn num_cuts(&self) -> usize {
        self.num_cuts
    }

    /// Number of experiments
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// True if there are no experiments
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Number of fragments per experiment
    pub fn num_fragments(&self) -> usize {
        self.experiments.first().map_or(0, |e| e.circuits.len())
    }

    /// Experiments in combination order
    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    /// Iterate over experiments
    pub fn iter(&self) -> std::slice::Iter<'_, Experiment> {
        self.experiments.iter()
    }

    /// Identity sites, ordered by experiment, fragment and slot
    pub fn identity_sites(&self) -> &[IdentityMeasurementSite] {
        &self.identity_sites
    }

    /// Coefficient per experiment
    pub fn coefficients(&self) -> Vec<f64> {
        self.experiments.iter().map(Experiment::coefficient).collect()
    }

    /// Total number of circuits to execute
    pub fn circuit_count(&self) -> usize {
        self.experiments.iter().map(|e| e.circuits.len()).sum()
    }
}

impl<'a> IntoIterator for &'a ExperimentSet {
    type Item = &'a Experiment;
    type IntoIter = std::slice::Iter<'a, Experiment>;

    fn into_iter(self) -> Self::IntoIter {
        self.experiments.iter()
    }
}

/// Instantiate every fragment for one combination
/// Gantree: build_experiment(i, combo, fragments) -> Result<(Experiment, sites)>
pub fn build_experiment(
    index: usize,
    combination: QpdCombination,
    fragments: &[Fragment],
) -> QcutResult<(Experiment, Vec<IdentityMeasurementSite>)> {
    let mut circuits = Vec::with_capacity(fragments.len());
    let mut layouts = Vec::with_capacity(fragments.len());
    let mut sites = Vec::new();

    for (fragment_index, fragment) in fragments.iter().enumerate() {
        let (circuit, layout) =
            instantiate(index, fragment_index, fragment, &combination, &mut sites)?;
        circuits.push(circuit);
        layouts.push(layout);
    }

    Ok((
        Experiment {
            index,
            combination,
            circuits,
            layouts,
        },
        sites,
    ))
}

fn instantiate(
    experiment: usize,
    fragment_index: usize,
    fragment: &Fragment,
    combination: &QpdCombination,
    sites: &mut Vec<IdentityMeasurementSite>,
) -> QcutResult<(Circuit, RegisterLayout)> {
    let lookup = |cut: usize| {
        combination
            .operation(cut)
            .ok_or(QcutError::PlaceholderMismatch {
                fragment: fragment_index,
                cut,
                choices: combination.num_cuts(),
            })
    };

    let mut gates = Vec::with_capacity(fragment.circuit().gate_count() + fragment.num_qubits());
    let mut qpd_bits = 0;
    let mut slot = 0;

    for gate in fragment.circuit().gates() {
        match gate {
            Gate::Placeholder(Placeholder::Measure { qubit, cut }) => {
                let op = lookup(*cut)?;
                if let MeasurementBasis::Identity = op.measurement {
                    sites.push(IdentityMeasurementSite {
                        experiment,
                        fragment: fragment_index,
                        slot,
                    });
                } else {
                    gates.extend(op.measurement.gates(*qubit, qpd_bits));
                    qpd_bits += 1;
                }
                slot += 1;
            }
            Gate::Placeholder(Placeholder::Initialize { qubit, cut }) => {
                gates.extend(lookup(*cut)?.init.gates(*qubit));
            }
            other => gates.push(other.clone()),
        }
    }

    let measured = fragment.measured_qubits();
    gates.extend(
        measured
            .iter()
            .enumerate()
            .map(|(j, &q)| Gate::Measure(q, qpd_bits + j)),
    );

    let layout = RegisterLayout {
        qpd_bits,
        meas_bits: measured.len(),
    };
    let cregs = vec![
        ClassicalRegister::new(registers::QPD, layout.qpd_bits),
        ClassicalRegister::new(registers::MEAS, layout.meas_bits),
    ];
    let mut circuit = Circuit::from_parts(fragment.num_qubits(), cregs, gates)?;
    circuit.set_name(format!("experiment_{}_fragment_{}", experiment, fragment_index));

    Ok((circuit, layout))
}

/// Build all `8^k` experiments
/// Gantree: build_experiments(fragments, k) -> Result<ExperimentSet> // 실험 생성
pub fn build_experiments(fragments: &[Fragment], num_cuts: usize) -> QcutResult<ExperimentSet> {
    let combinations = qpd_combinations(num_cuts)?;
    let mut experiments = Vec::with_capacity(combinations.len());
    let mut identity_sites = Vec::new();

    for (index, combination) in combinations.enumerate() {
        let (experiment, sites) = build_experiment(index, combination, fragments)?;
        experiments.push(experiment);
        identity_sites.extend(sites);
    }

    log::debug!(
        "Built {} experiments over {} fragments ({} identity sites)",
        experiments.len(),
        fragments.len(),
        identity_sites.len()
    );

    Ok(ExperimentSet {
        num_cuts,
        experiments,
        identity_sites,
    })
}

// ============================================================================
// Tests
// ============================================================================
