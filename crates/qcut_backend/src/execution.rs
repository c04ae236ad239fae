//! Backend execution types and traits
//!
//! Gantree: L6_Backend → BackendTrait
//!
//! Defines the interface through which fragment circuits are executed.
//! Count keys list the classical registers in declaration order separated
//! by a single space; within a register, character `i` is bit `i`.

use crate::mitigation::LocalReadoutMitigator;
use qcut_core::{Circuit, Counts, QcutResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of circuit execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Measurement counts (bitstring -> count)
    pub counts: Counts,

    /// Number of shots executed
    pub shots: u64,

    /// Execution metadata
    pub metadata: ExecutionMetadata,
}

/// Execution metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionMetadata {
    /// Backend name
    pub backend: String,

    /// Execution time in milliseconds
    pub execution_time_ms: Option<u64>,

    /// Whether simulation was used
    pub simulated: bool,

    /// Seed used (if any)
    pub seed: Option<u64>,

    /// Random stream used (if any)
    pub stream: Option<u64>,
}

impl ExecutionResult {
    /// Create new execution result
    pub fn new(counts: Counts, shots: u64, backend: &str) -> Self {
        Self {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: backend.to_string(),
                simulated: true,
                ..Default::default()
            },
        }
    }

    /// Get total count (equals shots for raw counts)
    pub fn total_counts(&self) -> f64 {
        self.counts.values().sum()
    }

    /// Get probability of a specific bitstring
    pub fn probability(&self, bitstring: &str) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let count = self.counts.get(bitstring).copied().unwrap_or(0.0);
        count / self.shots as f64
    }

    /// Z expectation of a single classical bit, ignoring register separators
    pub fn z_expectation(&self, clbit: usize) -> f64 {
        if self.shots == 0 {
            return 0.0;
        }
        let mut total = 0.0;
        for (key, &count) in &self.counts {
            let bit = key.chars().filter(|c| !c.is_whitespace()).nth(clbit);
            match bit {
                Some('0') => total += count,
                Some('1') => total -= count,
                _ => {}
            }
        }
        total / self.shots as f64
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ExecutionResult(shots={}, unique={}, backend={})",
            self.shots,
            self.counts.len(),
            self.metadata.backend
        )
    }
}

/// Quantum backend trait
///
/// Circuits handed to a backend contain only executable gates; knitting
/// markers and placeholders must have been resolved already.
/// Gantree: BackendTrait // 백엔드 인터페이스
pub trait Backend: Send + Sync {
    /// Get backend name
    fn name(&self) -> &str;

    /// Get number of qubits
    fn num_qubits(&self) -> usize;

    /// Execute a circuit
    /// Gantree: execute(circuit, shots) -> Result<ExecutionResult>
    fn execute(&self, circuit: &Circuit, shots: u64) -> QcutResult<ExecutionResult>;

    /// Execute on an independent random stream
    ///
    /// Seeded backends use `stream` to keep results reproducible when
    /// executions are scheduled in arbitrary order.
    fn execute_stream(
        &self,
        circuit: &Circuit,
        shots: u64,
        _stream: u64,
    ) -> QcutResult<ExecutionResult> {
        self.execute(circuit, shots)
    }

    /// Characterize per-bit readout error on the first `num_bits` qubits
    /// Gantree: characterize_readout(n, shots) -> Result<Mitigator>
    fn characterize_readout(
        &self,
        num_bits: usize,
        shots: u64,
    ) -> QcutResult<LocalReadoutMitigator> {
        LocalReadoutMitigator::characterize(self, num_bits, shots)
    }

    /// Check if backend is simulator
    fn is_simulator(&self) -> bool {
        true
    }

    /// Get maximum shots per execution
    fn max_shots(&self) -> u64 {
        qcut_core::budget::DEFAULT_MAX_SHOTS
    }
}

impl<B: Backend + ?Sized> Backend for &B {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn num_qubits(&self) -> usize {
        (**self).num_qubits()
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QcutResult<ExecutionResult> {
        (**self).execute(circuit, shots)
    }

    fn execute_stream(
        &self,
        circuit: &Circuit,
        shots: u64,
        stream: u64,
    ) -> QcutResult<ExecutionResult> {
        (**self).execute_stream(circuit, shots, stream)
    }

    fn characterize_readout(
        &self,
        num_bits: usize,
        shots: u64,
    ) -> QcutResult<LocalReadoutMitigator> {
        (**self).characterize_readout(num_bits, shots)
    }

    fn is_simulator(&self) -> bool {
        (**self).is_simulator()
    }

    fn max_shots(&self) -> u64 {
        (**self).max_shots()
    }
}

// ============================================================================
// Tests
// ============================================================================
