//! Quasi-probability decomposition of the identity channel
//!
//! Gantree: L2_Knit → QpdTable
//!
//! A cut wire is rewritten as a sum of eight measure-and-prepare channels:
//!
//! ```text
//!   ρ = ½ Σ_i c_i · Tr(O_i ρ) · σ_i
//!
//!   i  O_i  σ_i    c_i
//!   0  I    |0⟩    +1
//!   1  I    |1⟩    +1
//!   2  X    |+⟩    +1
//!   3  X    |−⟩    −1
//!   4  Y    |+i⟩   +1
//!   5  Y    |−i⟩   −1
//!   6  Z    |0⟩    +1
//!   7  Z    |1⟩    −1
//! ```
//!
//! The ½ per cut is folded into the final `4^k / samples` normalization.

use qcut_core::{qpd, Basis, ClbitId, Gate, QcutError, QcutResult, QubitId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Channel Components
// ============================================================================

/// Measurement side of a QPD operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementBasis {
    /// Trace out without measuring
    Identity,
    /// Measure in a Pauli basis
    Pauli(Basis),
}

impl MeasurementBasis {
    /// True for the trace-only branch
    pub fn is_identity(&self) -> bool {
        matches!(self, MeasurementBasis::Identity)
    }

    /// Gates realizing the measurement into `clbit`
    pub fn gates(&self, qubit: QubitId, clbit: ClbitId) -> Vec<Gate> {
        match self {
            MeasurementBasis::Identity => Vec::new(),
            MeasurementBasis::Pauli(basis) => {
                let mut gates = Gate::basis_transform(qubit, *basis);
                gates.push(Gate::Measure(qubit, clbit));
                gates
            }
        }
    }
}

impl fmt::Display for MeasurementBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementBasis::Identity => write!(f, "I"),
            MeasurementBasis::Pauli(b) => write!(f, "{}", b.to_char()),
        }
    }
}

/// Preparation side of a QPD operation
/// Gantree: InitState // 초기 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InitState {
    /// |0⟩
    Zero,
    /// |1⟩
    One,
    /// |+⟩
    Plus,
    /// |−⟩
    Minus,
    /// |+i⟩
    PlusI,
    /// |−i⟩
    MinusI,
}

impl InitState {
    /// Gates preparing the state from |0⟩
    pub fn gates(&self, qubit: QubitId) -> Vec<Gate> {
        match self {
            InitState::Zero => vec![],
            InitState::One => vec![Gate::X(qubit)],
            InitState::Plus => vec![Gate::H(qubit)],
            InitState::Minus => vec![Gate::X(qubit), Gate::H(qubit)],
            InitState::PlusI => vec![Gate::H(qubit), Gate::S(qubit)],
            InitState::MinusI => vec![Gate::X(qubit), Gate::H(qubit), Gate::S(qubit)],
        }
    }
}

impl fmt::Display for InitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InitState::Zero => "|0>",
            InitState::One => "|1>",
            InitState::Plus => "|+>",
            InitState::Minus => "|->",
            InitState::PlusI => "|+i>",
            InitState::MinusI => "|-i>",
        };
        write!(f, "{}", label)
    }
}

/// One term of the identity decomposition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QpdOperation {
    /// Upstream measurement
    pub measurement: MeasurementBasis,
    /// Downstream preparation
    pub init: InitState,
    /// Term coefficient, ±1
    pub coefficient: f64,
}

/// The eight-term identity decomposition, indexed by QPD choice
/// Gantree: IDENTITY_QPD // 8항 분해표
pub static IDENTITY_QPD: [QpdOperation; qpd::BASIS_SIZE] = [
    QpdOperation {
        measurement: MeasurementBasis::Identity,
        init: InitState::Zero,
        coefficient: 1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Identity,
        init: InitState::One,
        coefficient: 1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Pauli(Basis::X),
        init: InitState::Plus,
        coefficient: 1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Pauli(Basis::X),
        init: InitState::Minus,
        coefficient: -1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Pauli(Basis::Y),
        init: InitState::PlusI,
        coefficient: 1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Pauli(Basis::Y),
        init: InitState::MinusI,
        coefficient: -1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Pauli(Basis::Z),
        init: InitState::Zero,
        coefficient: 1.0,
    },
    QpdOperation {
        measurement: MeasurementBasis::Pauli(Basis::Z),
        init: InitState::One,
        coefficient: -1.0,
    },
];

// ============================================================================
// Combinations
// ============================================================================

/// One QPD choice per cut
/// Gantree: QpdCombination // 조합
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QpdCombination {
    index: u64,
    choices: Vec<usize>,
}

impl QpdCombination {
    /// Decode the `index`-th combination for `cuts` cuts
    ///
    /// Cut 0 is the most significant base-8 digit.
    pub fn from_index(index: u64, cuts: usize) -> Self {
        let mut choices = vec![0; cuts];
        let mut rest = index;
        for choice in choices.iter_mut().rev() {
            *choice = (rest % qpd::BASIS_SIZE as u64) as usize;
            rest /= qpd::BASIS_SIZE as u64;
        }
        Self { index, choices }
    }

    /// Position in enumeration order
    pub fn index(&self) -> u64 {
        self.index
    }

    /// Choice per cut
    pub fn choices(&self) -> &[usize] {
        &self.choices
    }

    /// Number of cuts covered
    pub fn num_cuts(&self) -> usize {
        self.choices.len()
    }

    /// Operation assigned to `cut`
    pub fn operation(&self, cut: usize) -> Option<&'static QpdOperation> {
        self.choices.get(cut).and_then(|&c| IDENTITY_QPD.get(c))
    }

    /// Product of the assigned coefficients
    pub fn coefficient(&self) -> f64 {
        self.choices
            .iter()
            .filter_map(|&c| IDENTITY_QPD.get(c))
            .map(|op| op.coefficient)
            .product()
    }
}

impl fmt::Display for QpdCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [", self.index)?;
        for (i, op) in self.choices.iter().filter_map(|&c| IDENTITY_QPD.get(c)).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}{}", op.measurement, op.init)?;
        }
        write!(f, "]")
    }
}

/// Lazy enumeration of all `8^k` combinations
#[derive(Debug, Clone)]
pub struct QpdCombinations {
    cuts: usize,
    next: u64,
    total: u64,
}

impl Iterator for QpdCombinations {
    type Item = QpdCombination;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.total {
            return None;
        }
        let combination = QpdCombination::from_index(self.next, self.cuts);
        self.next += 1;
        Some(combination)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.total - self.next).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for QpdCombinations {}

/// Enumerate every combination of QPD choices for `cuts` cuts
///
/// The last cut varies fastest. Zero cuts yield one empty combination.
/// Gantree: qpd_combinations(k) -> Result<QpdCombinations> // 조합 생성
pub fn qpd_combinations(cuts: usize) -> QcutResult<QpdCombinations> {
    let total = qpd::experiment_count(cuts).ok_or_else(|| QcutError::BudgetOverflow {
        cuts,
        reason: "8^k does not fit in 64 bits".into(),
    })?;
    Ok(QpdCombinations {
        cuts,
        next: 0,
        total,
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use num_complex::Complex64;

    type Matrix = [[Complex64; 2]; 2];

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn pauli(basis: Option<Basis>) -> Matrix {
        let (o, l, i) = (c(0.0, 0.0), c(1.0, 0.0), c(0.0, 1.0));
        match basis {
            None => [[l, o], [o, l]],
            Some(Basis::X) => [[o, l], [l, o]],
            Some(Basis::Y) => [[o, -i], [i, o]],
            Some(Basis::Z) => [[l, o], [o, -l]],
        }
    }

    fn projector(state: InitState) -> Matrix {
        let s = std::f64::consts::FRAC_1_SQRT_2;
        let amp = match state {
            InitState::Zero => [c(1.0, 0.0), c(0.0, 0.0)],
            InitState::One => [c(0.0, 0.0), c(1.0, 0.0)],
            InitState::Plus => [c(s, 0.0), c(s, 0.0)],
            InitState::Minus => [c(s, 0.0), c(-s, 0.0)],
            InitState::PlusI => [c(s, 0.0), c(0.0, s)],
            InitState::MinusI => [c(s, 0.0), c(0.0, -s)],
        };
        let mut m = [[c(0.0, 0.0); 2]; 2];
        for r in 0..2 {
            for col in 0..2 {
                m[r][col] = amp[r] * amp[col].conj();
            }
        }
        m
    }

    fn trace_product(a: &Matrix, b: &Matrix) -> Complex64 {
        (0..2)
            .flat_map(|r| (0..2).map(move |k| (r, k)))
            .map(|(r, k)| a[r][k] * b[k][r])
            .sum()
    }

    fn density(x: f64, y: f64, z: f64) -> Matrix {
        [
            [c((1.0 + z) / 2.0, 0.0), c(x / 2.0, -y / 2.0)],
            [c(x / 2.0, y / 2.0), c((1.0 - z) / 2.0, 0.0)],
        ]
    }

    #[test]
    fn test_table_reconstructs_identity_channel() {
        for &(x, y, z) in &[
            (0.0, 0.0, 1.0),
            (0.6, -0.3, 0.2),
            (-0.1, 0.7, -0.5),
            (0.0, 0.0, 0.0),
        ] {
            let rho = density(x, y, z);
            let mut out = [[c(0.0, 0.0); 2]; 2];
            for op in &IDENTITY_QPD {
                let observable = match op.measurement {
                    MeasurementBasis::Identity => pauli(None),
                    MeasurementBasis::Pauli(b) => pauli(Some(b)),
                };
                let weight = 0.5 * op.coefficient * trace_product(&observable, &rho);
                let sigma = projector(op.init);
                for r in 0..2 {
                    for col in 0..2 {
                        out[r][col] += weight * sigma[r][col];
                    }
                }
            }
            for r in 0..2 {
                for col in 0..2 {
                    assert!(
                        (out[r][col] - rho[r][col]).norm() < 1e-12,
                        "bloch=({}, {}, {}) entry ({}, {})",
                        x,
                        y,
                        z,
                        r,
                        col
                    );
                }
            }
        }
    }

    #[test]
    fn test_measurement_gates() {
        assert!(MeasurementBasis::Identity.gates(0, 0).is_empty());
        assert_eq!(
            MeasurementBasis::Pauli(Basis::Y).gates(2, 1),
            vec![Gate::Sdg(2), Gate::H(2), Gate::Measure(2, 1)]
        );
        assert_eq!(
            MeasurementBasis::Pauli(Basis::Z).gates(0, 0),
            vec![Gate::Measure(0, 0)]
        );
    }

    #[test]
    fn test_combination_counts() {
        for k in 0..=5 {
            let combos = qpd_combinations(k).unwrap();
            assert_eq!(combos.len(), 8usize.pow(k as u32));
            assert_eq!(combos.count(), 8usize.pow(k as u32));
        }
        assert!(matches!(
            qpd_combinations(40),
            Err(QcutError::BudgetOverflow { .. })
        ));
    }

    #[test]
    fn test_zero_cuts_single_empty_combination() {
        let combos: Vec<_> = qpd_combinations(0).unwrap().collect();
        assert_eq!(combos.len(), 1);
        assert!(combos[0].choices().is_empty());
        assert!((combos[0].coefficient() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lexicographic_order() {
        let expected: Vec<Vec<usize>> = (0..3).map(|_| 0..8usize).multi_cartesian_product().collect();
        let actual: Vec<Vec<usize>> = qpd_combinations(3)
            .unwrap()
            .map(|c| c.choices().to_vec())
            .collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_coefficient_and_lookup() {
        let combo = QpdCombination::from_index(0o37, 2);
        assert_eq!(combo.choices(), &[3, 7]);
        assert!((combo.coefficient() - 1.0).abs() < 1e-12);
        assert_eq!(combo.operation(0).map(|op| op.init), Some(InitState::Minus));
        assert!(combo.operation(2).is_none());

        let combo = QpdCombination::from_index(0o34, 2);
        assert!((combo.coefficient() + 1.0).abs() < 1e-12);
        assert_eq!(combo.to_string(), "#28 [X|->, Y|+i>]");
    }
}
