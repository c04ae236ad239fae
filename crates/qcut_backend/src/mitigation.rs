//! Local readout error mitigation
//!
//! Gantree: L6_Backend → ReadoutMitigation
//!
//! Tensor-product readout model: each classical bit has its own 2x2
//! assignment matrix and the inverse is applied one bit at a time, so
//! the cost is O(n 2^n) instead of a full 2^n x 2^n inversion.
//! Mitigated values are quasi-probabilities and may be negative.

use crate::execution::Backend;
use qcut_core::{Bitstring, Circuit, Counts, Gate, Probability, QcutError, QcutResult};
use serde::{Deserialize, Serialize};

/// Largest classical width the dense inverse is applied to
const MAX_MITIGATION_BITS: usize = 24;

/// Mitigated entries smaller than this are dropped
const QUASI_EPS: f64 = 1e-12;

/// Random streams reserved for calibration, apart from experiment streams
const ZEROS_CALIBRATION_STREAM: u64 = u64::MAX - 1;
const ONES_CALIBRATION_STREAM: u64 = u64::MAX;

/// Single-bit readout error rates
/// Gantree: ReadoutAssignment // 비트별 오류율
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadoutAssignment {
    /// P(1|0) - probability of reading 1 when prepared 0
    pub p01: f64,
    /// P(0|1) - probability of reading 0 when prepared 1
    pub p10: f64,
}

impl ReadoutAssignment {
    /// Perfect readout
    pub const IDEAL: Self = Self { p01: 0.0, p10: 0.0 };

    fn determinant(&self) -> f64 {
        1.0 - self.p01 - self.p10
    }
}

/// Readout mitigator built from per-bit assignment matrices
/// Gantree: LocalReadoutMitigator // 국소 측정 완화
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalReadoutMitigator {
    assignments: Vec<ReadoutAssignment>,
}

impl LocalReadoutMitigator {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create from known per-bit error rates
    pub fn from_assignments(assignments: Vec<ReadoutAssignment>) -> QcutResult<Self> {
        for (bit, a) in assignments.iter().enumerate() {
            Probability::new(a.p01)?;
            Probability::new(a.p10)?;
            if a.determinant().abs() < 1e-10 {
                return Err(QcutError::MitigationError(format!(
                    "assignment matrix of bit {} is singular (p01={}, p10={})",
                    bit, a.p01, a.p10
                )));
            }
        }
        Ok(Self { assignments })
    }

    /// Mitigator that leaves counts unchanged apart from normalization
    pub fn ideal(num_bits: usize) -> Self {
        Self {
            assignments: vec![ReadoutAssignment::IDEAL; num_bits],
        }
    }

    /// Characterize the first `num_bits` qubits of a backend
    ///
    /// Runs one all-|0⟩ and one all-|1⟩ preparation and reads each bit's
    /// flip rate off the marginals.
    /// Gantree: characterize(backend, n, shots) -> Result<Self> // 보정 실행
    pub fn characterize<B: Backend + ?Sized>(
        backend: &B,
        num_bits: usize,
        shots: u64,
    ) -> QcutResult<Self> {
        if shots == 0 {
            return Err(QcutError::MitigationError(
                "calibration needs at least one shot".into(),
            ));
        }
        if num_bits == 0 {
            return Ok(Self::ideal(0));
        }

        let zeros = Circuit::new(num_bits);
        let ones = Circuit::from_gates(num_bits, (0..num_bits).map(Gate::X).collect())?;

        let zero_counts = backend
            .execute_stream(&zeros, shots, ZEROS_CALIBRATION_STREAM)?
            .counts;
        let one_counts = backend
            .execute_stream(&ones, shots, ONES_CALIBRATION_STREAM)?
            .counts;

        let p01 = flip_rates(&zero_counts, num_bits, true)?;
        let p10 = flip_rates(&one_counts, num_bits, false)?;

        let assignments = p01
            .into_iter()
            .zip(p10)
            .map(|(p01, p10)| ReadoutAssignment { p01, p10 })
            .collect();

        log::debug!(
            "Characterized readout on {} bits with {} shots per preparation",
            num_bits,
            shots
        );

        Self::from_assignments(assignments)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Number of classical bits covered
    pub fn num_bits(&self) -> usize {
        self.assignments.len()
    }

    /// Per-bit error rates
    pub fn assignments(&self) -> &[ReadoutAssignment] {
        &self.assignments
    }

    // ========================================================================
    // Mitigation
    // ========================================================================

    /// Apply the inverse readout model, returning quasi-probabilities
    ///
    /// Keys keep the register layout of the input keys.
    /// Gantree: quasi_probabilities(counts) -> Result<Counts> // 준확률
    pub fn quasi_probabilities(&self, counts: &Counts) -> QcutResult<Counts> {
        let n = self.num_bits();
        if n > MAX_MITIGATION_BITS {
            return Err(QcutError::MitigationError(format!(
                "{} bits exceed the mitigation limit of {}",
                n, MAX_MITIGATION_BITS
            )));
        }

        let total: f64 = counts.values().sum();
        let layout = match counts.keys().next() {
            Some(key) => key.split(' ').map(str::len).collect::<Vec<_>>(),
            None => return Ok(Counts::new()),
        };
        if total == 0.0 {
            return Ok(Counts::new());
        }

        let mut probs = vec![0.0; 1 << n];
        for (key, &count) in counts {
            let bits = Bitstring::parse_registers(key)?;
            if bits.len() != n {
                return Err(QcutError::MitigationError(format!(
                    "outcome '{}' has {} bits, mitigator covers {}",
                    key,
                    bits.len(),
                    n
                )));
            }
            probs[state_index(&bits)] += count / total;
        }

        // [[1-p01, p10], [p01, 1-p10]]^-1 = 1/det [[1-p10, -p10], [-p01, 1-p01]]
        for (q, a) in self.assignments.iter().enumerate() {
            let det = a.determinant();
            let inv00 = (1.0 - a.p10) / det;
            let inv01 = -a.p10 / det;
            let inv10 = -a.p01 / det;
            let inv11 = (1.0 - a.p01) / det;

            let mask = 1usize << q;
            for state in 0..probs.len() {
                if state & mask == 0 {
                    let partner = state | mask;
                    let (p0, p1) = (probs[state], probs[partner]);
                    probs[state] = inv00 * p0 + inv01 * p1;
                    probs[partner] = inv10 * p0 + inv11 * p1;
                }
            }
        }

        Ok(probs
            .into_iter()
            .enumerate()
            .filter(|(_, p)| p.abs() > QUASI_EPS)
            .map(|(state, p)| {
                let bits = Bitstring::new((0..n).map(|q| state & (1 << q) != 0).collect());
                (bits.to_segmented(&layout), p)
            })
            .collect())
    }

    /// Quasi-probabilities scaled back to `shots` quasi-counts
    pub fn mitigate_counts(&self, counts: &Counts, shots: u64) -> QcutResult<Counts> {
        let scale = shots as f64;
        Ok(self
            .quasi_probabilities(counts)?
            .into_iter()
            .map(|(key, p)| (key, p * scale))
            .collect())
    }
}

/// Fraction of shots in which each bit differs from its prepared value
fn flip_rates(counts: &Counts, num_bits: usize, prepared_zero: bool) -> QcutResult<Vec<f64>> {
    let total: f64 = counts.values().sum();
    if total <= 0.0 {
        return Err(QcutError::MitigationError(
            "calibration run returned no counts".into(),
        ));
    }

    let flipped = if prepared_zero { '1' } else { '0' };
    let mut rates = vec![0.0; num_bits];
    for (key, &count) in counts {
        let bits: Vec<char> = key.chars().filter(|c| !c.is_whitespace()).collect();
        if bits.len() != num_bits {
            return Err(QcutError::MitigationError(format!(
                "calibration outcome '{}' does not cover {} bits",
                key, num_bits
            )));
        }
        for (rate, &bit) in rates.iter_mut().zip(&bits) {
            if bit == flipped {
                *rate += count;
            }
        }
    }
    Ok(rates.into_iter().map(|r| r / total).collect())
}

fn state_index(bits: &Bitstring) -> usize {
    bits.bits()
        .iter()
        .enumerate()
        .filter(|(_, &b)| b)
        .map(|(i, _)| 1usize << i)
        .sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseModel;
    use crate::simulator::SimulatorBackend;
    use approx::assert_abs_diff_eq;
    use qcut_core::CircuitBuilder;

    fn counts(entries: &[(&str, f64)]) -> Counts {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_ideal_mitigator_normalizes() {
        let mitigator = LocalReadoutMitigator::ideal(2);
        let quasi = mitigator
            .quasi_probabilities(&counts(&[("0 1", 30.0), ("1 0", 70.0)]))
            .unwrap();
        assert_abs_diff_eq!(quasi["0 1"], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(quasi["1 0"], 0.7, epsilon = 1e-12);
        assert_eq!(quasi.len(), 2);
    }

    #[test]
    fn test_inverse_of_known_model() {
        // Prepared |0>, p01 = 0.1 gives observed (0.9, 0.1)
        let mitigator = LocalReadoutMitigator::from_assignments(vec![ReadoutAssignment {
            p01: 0.1,
            p10: 0.2,
        }])
        .unwrap();
        let quasi = mitigator
            .quasi_probabilities(&counts(&[("0", 900.0), ("1", 100.0)]))
            .unwrap();
        assert!((quasi["0"] - 1.0).abs() < 1e-10, "{:?}", quasi);
        assert!(!quasi.contains_key("1"));
    }

    #[test]
    fn test_negative_quasi_probabilities_are_kept() {
        // Fewer flips than the model predicts pushes the inverse below zero
        let mitigator = LocalReadoutMitigator::from_assignments(vec![ReadoutAssignment {
            p01: 0.2,
            p10: 0.2,
        }])
        .unwrap();
        let quasi = mitigator
            .quasi_probabilities(&counts(&[("0", 950.0), ("1", 50.0)]))
            .unwrap();
        assert!(quasi["1"] < 0.0);
        let sum: f64 = quasi.values().sum();
        assert!((sum - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_singular_assignment_rejected() {
        let result = LocalReadoutMitigator::from_assignments(vec![ReadoutAssignment {
            p01: 0.5,
            p10: 0.5,
        }]);
        assert!(matches!(result, Err(QcutError::MitigationError(_))));
    }

    #[test]
    fn test_width_mismatch() {
        let mitigator = LocalReadoutMitigator::ideal(3);
        assert!(mitigator
            .quasi_probabilities(&counts(&[("01", 1.0)]))
            .is_err());
    }

    #[test]
    fn test_characterize_and_mitigate_noisy_backend() {
        let backend = SimulatorBackend::new(2, NoiseModel::new(0.05, 0.1).unwrap()).with_seed(11);
        let mitigator = backend.characterize_readout(2, 50_000).unwrap();

        for a in mitigator.assignments() {
            assert!((a.p01 - 0.05).abs() < 0.01, "p01 = {}", a.p01);
            assert!((a.p10 - 0.1).abs() < 0.01, "p10 = {}", a.p10);
        }

        let circuit = CircuitBuilder::new(2).x(0).build();
        let raw = backend.execute(&circuit, 50_000).unwrap();
        let mitigated = mitigator.mitigate_counts(&raw.counts, raw.shots).unwrap();

        // Ideal outcome: bit 0 = 1, bit 1 = 0
        let target = mitigated.get("10").copied().unwrap_or(0.0) / raw.shots as f64;
        assert!((target - 1.0).abs() < 0.03, "P(10) = {}", target);
        assert!(raw.probability("10") < 0.9);
    }

    #[test]
    fn test_calibration_preparations_draw_independent_flips() {
        // Symmetric noise: shared random draws would make p01 == p10 on every bit
        let backend = SimulatorBackend::new(4, NoiseModel::new(0.05, 0.05).unwrap()).with_seed(17);
        let mitigator = backend.characterize_readout(4, 50_000).unwrap();

        let assignments = mitigator.assignments();
        assert!(assignments.iter().any(|a| a.p01 != a.p10), "{:?}", assignments);
        for a in assignments {
            assert!((a.p01 - 0.05).abs() < 0.01, "p01 = {}", a.p01);
            assert!((a.p10 - 0.05).abs() < 0.01, "p10 = {}", a.p10);
        }
    }
}
