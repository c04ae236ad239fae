//! Result decoding
//!
//! Gantree: L4_Reconstruct → ResultProcessor
//!
//! Turns raw counts into per-outcome eigenvalue vectors. Each count key
//! is split into its `c` and `meas` parts using the register widths of
//! the circuit that produced it, and every bit is mapped 0 → −1, 1 → +1.

use crate::experiment::{ExperimentSet, IdentityMeasurementSite, RegisterLayout};
use qcut_core::{qpd, Bitstring, Counts, QcutError, QcutResult};
use serde::{Deserialize, Serialize};

/// One decoded outcome of one fragment circuit
/// Gantree: SubResult // 부분 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubResult {
    /// Eigenvalues of the `meas` register
    pub meas: Vec<i32>,
    /// Eigenvalues of the `c` register, identity sites included after patching
    pub qpd: Vec<i32>,
    /// Count (quasi-count after mitigation)
    pub count: f64,
}

impl SubResult {
    /// Product of the QPD eigenvalues
    pub fn qpd_factor(&self) -> i32 {
        self.qpd.iter().product()
    }
}

/// Decoded outcomes of one experiment, one list per fragment
/// Gantree: TotalResult // 실험 결과
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalResult {
    /// Outcomes per fragment
    pub fragments: Vec<Vec<SubResult>>,
}

/// Decode the counts of one fragment circuit
pub fn decode_counts(counts: &Counts, layout: &RegisterLayout) -> QcutResult<Vec<SubResult>> {
    counts
        .iter()
        .map(|(key, &count)| {
            let bits = Bitstring::parse_registers(key)?;
            let (qpd, meas) = bits
                .split_at(layout.qpd_bits)
                .filter(|(_, meas)| meas.len() == layout.meas_bits)
                .ok_or_else(|| {
                    QcutError::ResultShapeMismatch(format!(
                        "outcome '{}' does not match c[{}] meas[{}]",
                        key, layout.qpd_bits, layout.meas_bits
                    ))
                })?;
            Ok(SubResult {
                meas: meas.eigenvalues(),
                qpd: qpd.eigenvalues(),
                count,
            })
        })
        .collect()
}

/// Decode raw counts indexed `[experiment][fragment]`
///
/// Identity sites are patched before returning.
/// Gantree: process_results(raw, experiments) -> Result<Vec<TotalResult>> // 결과 처리
pub fn process_results(raw: &[Vec<Counts>], experiments: &ExperimentSet) -> QcutResult<Vec<TotalResult>> {
    if raw.len() != experiments.len() {
        return Err(QcutError::ResultShapeMismatch(format!(
            "{} result sets for {} experiments",
            raw.len(),
            experiments.len()
        )));
    }

    let mut results = raw
        .iter()
        .zip(experiments)
        .map(|(counts, experiment)| {
            if counts.len() != experiment.layouts().len() {
                return Err(QcutError::ResultShapeMismatch(format!(
                    "experiment {} has {} fragments but {} results",
                    experiment.index(),
                    experiment.layouts().len(),
                    counts.len()
                )));
            }
            let fragments = counts
                .iter()
                .zip(experiment.layouts())
                .map(|(c, layout)| decode_counts(c, layout))
                .collect::<QcutResult<Vec<_>>>()?;
            Ok(TotalResult { fragments })
        })
        .collect::<QcutResult<Vec<_>>>()?;

    patch_identity_sites(&mut results, experiments.identity_sites())?;
    Ok(results)
}

/// Insert the fixed identity eigenvalue at every recorded site
///
/// Sites of one fragment must be applied in ascending slot order so each
/// insertion index refers to the already-patched vector.
/// Gantree: patch_identity_sites(results, sites) -> Result<()> // 항등 보정
pub fn patch_identity_sites(
    results: &mut [TotalResult],
    sites: &[IdentityMeasurementSite],
) -> QcutResult<()> {
    for site in sites {
        let outcomes = results
            .get_mut(site.experiment)
            .and_then(|r| r.fragments.get_mut(site.fragment))
            .ok_or_else(|| {
                QcutError::ResultShapeMismatch(format!(
                    "identity site refers to experiment {} fragment {}",
                    site.experiment, site.fragment
                ))
            })?;
        for outcome in outcomes.iter_mut() {
            if site.slot > outcome.qpd.len() {
                return Err(QcutError::ResultShapeMismatch(format!(
                    "identity slot {} beyond {} QPD bits",
                    site.slot,
                    outcome.qpd.len()
                )));
            }
            outcome.qpd.insert(site.slot, qpd::IDENTITY_EIGENVALUE);
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
