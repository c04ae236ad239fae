//! Expectation value estimation
//!
//! Gantree: L4_Reconstruct → ExpectationEstimator
//!
//! Each experiment contributes the weighted joint distribution of its
//! fragments: every combination of one outcome per fragment is weighted by
//! `shots · Π(count_f / shots)`, multiplied by the product of its QPD
//! eigenvalues and by the observable's eigenvalue on the concatenated
//! `meas` vector. The sum over experiments, signed by the combination
//! coefficient and by `(-1)^(k+1)`, is normalized by `4^k / samples`.

use crate::budget::ShotBudget;
use crate::results::{SubResult, TotalResult};
use itertools::Itertools;
use qcut_core::{qpd, QcutError, QcutResult, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ZObservable
// ============================================================================

/// Product of Z operators on reconstructed measurement indices
///
/// Indices address the reconstructed measurement vector: fragment `meas`
/// registers concatenated in fragment order, ascending. They are not the
/// original circuit's qubit ids; a cut moves a qubit onto a fresh wire and
/// drops the upstream one. Use [`crate::KnitPlan::observable_on`] to build an
/// observable from original qubits.
/// Gantree: ZObservable // Z 관측량
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZObservable {
    qubits: Vec<usize>,
}

impl ZObservable {
    /// Z product over the given indices (at least one)
    pub fn new(qubits: Vec<usize>) -> QcutResult<Self> {
        if qubits.is_empty() {
            return Err(QcutError::EmptyObservable);
        }
        Ok(Self { qubits })
    }

    /// Single-index Z
    pub fn single(index: usize) -> Self {
        Self {
            qubits: vec![index],
        }
    }

    /// Indices the observable acts on
    pub fn qubits(&self) -> &[usize] {
        &self.qubits
    }

    /// Number of Z factors
    pub fn weight(&self) -> usize {
        self.qubits.len()
    }

    /// Largest index referenced
    pub fn max_index(&self) -> usize {
        self.qubits.iter().copied().max().unwrap_or(0)
    }

    /// Sign convention `(-1)^(len+1)` applied on top of the eigenvalue product
    pub fn sign(&self) -> f64 {
        if self.qubits.len() % 2 == 1 {
            1.0
        } else {
            -1.0
        }
    }

    /// Signed eigenvalue on one reconstructed outcome
    pub fn eigenvalue(&self, full: &[i32]) -> QcutResult<f64> {
        let product = self.qubits.iter().try_fold(1i32, |acc, &q| {
            full.get(q)
                .map(|&e| acc * e)
                .ok_or(QcutError::ObservableOutOfRange {
                    index: q,
                    width: full.len(),
                })
        })?;
        Ok(self.sign() * f64::from(product))
    }

    /// Check every index against a reconstructed width
    pub fn validate(&self, width: usize) -> QcutResult<()> {
        match self.qubits.iter().find(|&&q| q >= width) {
            Some(&index) => Err(QcutError::ObservableOutOfRange { index, width }),
            None => Ok(()),
        }
    }
}

/// Single Z on a reconstructed measurement index, not an original qubit id
impl From<QubitId> for ZObservable {
    fn from(index: QubitId) -> Self {
        Self::single(index)
    }
}

impl fmt::Display for ZObservable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.qubits.iter().map(|q| format!("Z{}", q)).collect();
        write!(f, "{}", terms.join("*"))
    }
}

// ============================================================================
// Estimation
// ============================================================================

/// Weighted observable sums of one experiment
///
/// Returns zeros when `shots` is zero.
/// Gantree: sub_expectation_values(result, obs, shots) -> Result<Vec<f64>>
pub fn sub_expectation_values(
    result: &TotalResult,
    observables: &[ZObservable],
    shots: u64,
) -> QcutResult<Vec<f64>> {
    let mut sums = vec![0.0; observables.len()];
    if shots == 0 || result.fragments.is_empty() {
        return Ok(sums);
    }
    let shots = shots as f64;

    for joint in result
        .fragments
        .iter()
        .map(|outcomes| outcomes.iter())
        .multi_cartesian_product()
    {
        let full: Vec<i32> = joint.iter().flat_map(|r| r.meas.iter().copied()).collect();
        let weight = joint.iter().fold(shots, |w, r| w * r.count / shots);
        let qpd_factor: i32 = joint.iter().map(|r: &&SubResult| r.qpd_factor()).product();
        let scaled = f64::from(qpd_factor) * weight;

        for (sum, observable) in sums.iter_mut().zip(observables) {
            *sum += scaled * observable.eigenvalue(&full)?;
        }
    }

    Ok(sums)
}

/// Reconstruct the uncut expectation value of every observable
/// Gantree: estimate_expectation_values(results, coeffs, budget, obs) -> Result<Vec<f64>>
pub fn estimate_expectation_values(
    results: &[TotalResult],
    coefficients: &[f64],
    budget: &ShotBudget,
    observables: &[ZObservable],
) -> QcutResult<Vec<f64>> {
    if results.len() != coefficients.len() {
        return Err(QcutError::ResultShapeMismatch(format!(
            "{} results for {} coefficients",
            results.len(),
            coefficients.len()
        )));
    }

    let sign = qpd::cut_sign(budget.cuts());
    let mut accumulator = vec![1.0; observables.len()];

    for (result, &coefficient) in results.iter().zip(coefficients) {
        let sums = sub_expectation_values(result, observables, budget.shots_per_experiment())?;
        for (acc, sum) in accumulator.iter_mut().zip(sums) {
            *acc += sign * coefficient * sum;
        }
    }

    let scale = budget.gamma_factor() / budget.samples() as f64;
    Ok(accumulator.into_iter().map(|acc| acc * scale).collect())
}

// ============================================================================
// Tests
// ============================================================================
