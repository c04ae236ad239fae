//! Core types for QCut
//!
//! Gantree: L0_Foundation → CoreTypes
//!
//! Provides fundamental type aliases and validated wrapper types
//! used throughout the knitting pipeline.

use crate::error::{QcutError, QcutResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// Qubit identifier (0-indexed)
/// Gantree: QubitId // pub type QubitId = usize
pub type QubitId = usize;

/// Classical bit identifier (0-indexed, global across registers)
/// Gantree: ClbitId // pub type ClbitId = usize
pub type ClbitId = usize;

/// Rotation angle in radians
/// Gantree: Angle // pub type Angle = f64
pub type Angle = f64;

/// Measurement counts: bitstring -> count
///
/// Raw counts are whole numbers; readout-mitigated quasi-counts may be
/// fractional or negative and share the same type. Ordered so that every
/// pass over a result visits outcomes in the same sequence.
/// Gantree: Counts // pub type Counts = BTreeMap<String, f64>
pub type Counts = BTreeMap<String, f64>;

// ============================================================================
// Probability (Validated Wrapper)
// ============================================================================

/// Probability value in range [0, 1]
/// Gantree: Probability // 범위 검증 구조체
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Probability(f64);

impl Probability {
    /// Create a new Probability with validation
    /// Gantree: new(f64) -> Result<Self> // 생성+검증
    pub fn new(value: f64) -> QcutResult<Self> {
        if !(0.0..=1.0).contains(&value) {
            return Err(QcutError::InvalidProbability(value));
        }
        Ok(Self(value))
    }

    /// Get the probability value
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Get the complement (1 - p)
    #[inline]
    pub fn complement(&self) -> f64 {
        1.0 - self.0
    }

    /// Zero probability
    pub const ZERO: Self = Self(0.0);
}

impl Default for Probability {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

impl TryFrom<f64> for Probability {
    type Error = QcutError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

// ============================================================================
// Bitstring
// ============================================================================

/// Bitstring for measurement results
///
/// Character `i` of the textual form is classical bit `i`. Register
/// separators (spaces) are accepted by [`Bitstring::parse_registers`].
/// Gantree: Bitstring // 비트열 타입
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bitstring {
    bits: Vec<bool>,
}

impl Bitstring {
    /// Create from a vector of bools
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// Create from string (e.g., "0110")
    /// Gantree: parse(s) -> Self // 파싱
    pub fn parse(s: &str) -> QcutResult<Self> {
        let bits: Result<Vec<bool>, _> = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                _ => Err(QcutError::InvalidBitstring(s.to_string())),
            })
            .collect();
        Ok(Self { bits: bits? })
    }

    /// Parse a register-separated outcome (e.g., "01 110"), dropping separators
    pub fn parse_registers(s: &str) -> QcutResult<Self> {
        let joined: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Self::parse(&joined).map_err(|_| QcutError::InvalidBitstring(s.to_string()))
    }

    /// Get the number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Get bit at index
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Borrow the raw bits
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Split into `(head, tail)` at `mid`
    pub fn split_at(&self, mid: usize) -> Option<(Bitstring, Bitstring)> {
        if mid > self.bits.len() {
            return None;
        }
        let (head, tail) = self.bits.split_at(mid);
        Some((Bitstring::new(head.to_vec()), Bitstring::new(tail.to_vec())))
    }

    /// Map each bit to a Z eigenvalue: 0 -> -1, 1 -> +1
    /// Gantree: eigenvalues() -> Vec<i32> // 고유값 변환
    pub fn eigenvalues(&self) -> Vec<i32> {
        self.bits.iter().map(|&b| if b { 1 } else { -1 }).collect()
    }

    /// Format with a space after each segment of the given lengths
    pub fn to_segmented(&self, layout: &[usize]) -> String {
        let mut out = String::with_capacity(self.bits.len() + layout.len());
        let mut cursor = 0;
        for (i, &width) in layout.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            for &b in self.bits.iter().skip(cursor).take(width) {
                out.push(if b { '1' } else { '0' });
            }
            cursor += width;
        }
        out
    }
}

impl fmt::Display for Bitstring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.bits {
            write!(f, "{}", if b { '1' } else { '0' })?;
        }
        Ok(())
    }
}

// ============================================================================
// Basis
// ============================================================================

/// Measurement basis for a single qubit
/// Gantree: Basis // X/Y/Z
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// X (Hadamard) basis
    X,
    /// Y basis
    Y,
    /// Z (computational) basis
    Z,
}

impl Basis {
    /// Convert to character
    pub fn to_char(&self) -> char {
        match self {
            Basis::X => 'X',
            Basis::Y => 'Y',
            Basis::Z => 'Z',
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

// ============================================================================
// Tests
// ============================================================================
