//! Error types for QCut
//!
//! Gantree: L0_Foundation → Errors
//!
//! A single error enum covers every stage of the knitting pipeline.
//! Structural and resource errors are always raised before any backend
//! call is made.

// Error variant fields are self-documenting via error messages
#![allow(missing_docs)]

use thiserror::Error;

/// Main error type for QCut
/// Gantree: QcutError // enum
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QcutError {
    // ========================================================================
    // Validation Errors
    // ========================================================================
    /// Probability value out of range [0, 1]
    /// Gantree: InvalidProbability(f64) // 확률 범위
    #[error("Invalid probability {0}: must be in range [0, 1]")]
    InvalidProbability(f64),

    /// Invalid bitstring format
    #[error("Invalid bitstring '{0}': must contain only '0', '1' and register separators")]
    InvalidBitstring(String),

    /// Invalid target estimation error
    /// Gantree: InvalidErrorTarget(f64) // 목표 오차
    #[error("Invalid target error {0}: must be finite and > 0")]
    InvalidErrorTarget(f64),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Observable with no qubits
    #[error("Observable must act on at least one qubit")]
    EmptyObservable,

    /// Observable index outside the reconstructed measurement width
    /// Gantree: ObservableOutOfRange{{index,width}} // 관측량 범위
    #[error("Observable index {index} out of range: reconstructed width is {width}")]
    ObservableOutOfRange { index: usize, width: usize },

    // ========================================================================
    // Circuit Errors
    // ========================================================================
    /// Circuit with no qubits
    /// Gantree: EmptyCircuit // 빈 회로
    #[error("Circuit has no qubits")]
    EmptyCircuit,

    /// Gate on non-existent qubit
    #[error("Gate references qubit {qubit} but circuit has only {num_qubits} qubits")]
    GateQubitMismatch { qubit: usize, num_qubits: usize },

    /// Measurement into non-existent classical bit
    #[error("Gate references clbit {clbit} but circuit has only {num_clbits} clbits")]
    GateClbitMismatch { clbit: usize, num_clbits: usize },

    /// Register name declared twice
    #[error("Classical register '{0}' declared twice")]
    DuplicateRegister(String),

    // ========================================================================
    // Structural Errors (cut topology)
    // ========================================================================
    /// Malformed cut marker
    /// Gantree: InvalidCut{{position,reason}} // 잘못된 컷
    #[error("Invalid cut at instruction {position}: {reason}")]
    InvalidCut { position: usize, reason: String },

    /// Instruction touching qubits of more than one fragment
    /// Gantree: CrossFragmentInstruction{{gate,qubits}} // 조각 간 게이트
    #[error("Instruction '{gate}' on qubits {qubits:?} spans more than one fragment")]
    CrossFragmentInstruction { gate: String, qubits: Vec<usize> },

    /// Operation on the upstream side of a wire after it was cut
    #[error("Qubit {qubit} is used after being measured out by cut {cut}")]
    OperationAfterCut { qubit: usize, cut: usize },

    /// Operation on the downstream side of a wire before it was initialized
    #[error("Qubit {qubit} is used before being initialized by cut {cut}")]
    OperationBeforeInit { qubit: usize, cut: usize },

    /// Cut without exactly one measure and one initialize placeholder
    #[error("Cut {0} must have exactly one measure and one initialize placeholder")]
    UnpairedCut(usize),

    /// Fragment references a cut with no assigned QPD choice
    /// Gantree: PlaceholderMismatch{{fragment,cut,choices}} // 배정 불일치
    #[error("Fragment {fragment} references cut {cut} but only {choices} QPD choices were assigned")]
    PlaceholderMismatch {
        fragment: usize,
        cut: usize,
        choices: usize,
    },

    /// Instruction kind not allowed at this stage
    #[error("Unsupported instruction '{0}' in input circuit")]
    UnsupportedInstruction(String),

    /// Raw results do not line up with the experiment layout
    #[error("Result shape mismatch: {0}")]
    ResultShapeMismatch(String),

    // ========================================================================
    // Resource Errors
    // ========================================================================
    /// Cut count above the configured limit
    /// Gantree: TooManyCuts{{cuts,max}} // 컷 수 초과
    #[error("{cuts} cuts exceed the limit of {max} ({experiments} experiments)")]
    TooManyCuts {
        cuts: usize,
        max: usize,
        experiments: String,
    },

    /// Budget arithmetic does not fit the integer range
    #[error("Resource budget overflow for {cuts} cuts: {reason}")]
    BudgetOverflow { cuts: usize, reason: String },

    /// Total shot budget above the configured limit
    #[error("Total shots {required} exceed the limit of {max}")]
    ShotBudgetExceeded { required: u64, max: u64 },

    // ========================================================================
    // Backend Errors
    // ========================================================================
    /// Backend execution error
    /// Gantree: BackendError(String) // 백엔드
    #[error("Backend error: {0}")]
    BackendError(String),

    /// Shots out of range
    #[error("Shots {0} out of range [{1}, {2}]")]
    ShotsOutOfRange(u64, u64, u64),

    /// Readout characterization failure
    #[error("Mitigation error: {0}")]
    MitigationError(String),

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(String),
}

/// Result type alias for QCut operations
/// Gantree: QcutResult<T> // type alias
pub type QcutResult<T> = Result<T, QcutError>;

// ============================================================================
// Error Conversion Helpers
// ============================================================================

impl From<serde_json::Error> for QcutError {
    fn from(err: serde_json::Error) -> Self {
        QcutError::JsonError(err.to_string())
    }
}

// ============================================================================
// Error Helpers
// ============================================================================

impl QcutError {
    /// Check if error is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            QcutError::InvalidProbability(_)
                | QcutError::InvalidBitstring(_)
                | QcutError::InvalidErrorTarget(_)
                | QcutError::InvalidConfig(_)
                | QcutError::EmptyObservable
                | QcutError::ObservableOutOfRange { .. }
        )
    }

    /// Check if error describes an invalid cut topology or circuit shape
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            QcutError::EmptyCircuit
                | QcutError::GateQubitMismatch { .. }
                | QcutError::GateClbitMismatch { .. }
                | QcutError::DuplicateRegister(_)
                | QcutError::InvalidCut { .. }
                | QcutError::CrossFragmentInstruction { .. }
                | QcutError::OperationAfterCut { .. }
                | QcutError::OperationBeforeInit { .. }
                | QcutError::UnpairedCut(_)
                | QcutError::PlaceholderMismatch { .. }
                | QcutError::UnsupportedInstruction(_)
                | QcutError::ResultShapeMismatch(_)
        )
    }

    /// Check if error is a resource-infeasibility error
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            QcutError::TooManyCuts { .. }
                | QcutError::BudgetOverflow { .. }
                | QcutError::ShotBudgetExceeded { .. }
                | QcutError::ShotsOutOfRange(..)
        )
    }

    /// Check if error came from the execution collaborator
    pub fn is_backend_error(&self) -> bool {
        matches!(
            self,
            QcutError::BackendError(_) | QcutError::MitigationError(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
