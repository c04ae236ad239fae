//! # QCut Engine
//!
//! Configuration, execution and the staged knitting pipeline.
//!
//! ## Gantree Architecture
//!
//! ```text
//! qcut_engine // L5-L7: Integration (완료)
//!     KnitConfig // 통합 설정 (완료)
//!         error, mitigate, limits, parallel, seed
//!         to_limits(), to_json()
//!     ExperimentRunner // 실험 실행기 (완료)
//!         characterize() - 폭별 판독 보정
//!         run() - 병렬/순차 실행
//!     KnitPipeline // 단계별 실행 (완료)
//!         plan() → generate() → execute() → reconstruct()
//!         run() - 전체 파이프라인
//!     run(), run_default() // 진입점 (완료)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use qcut_core::CircuitBuilder;
//! use qcut_engine::prelude::*;
//! use qcut_knit::ZObservable;
//!
//! // Prepare |+> and move it through a wire cut
//! let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).h(1).build();
//!
//! let config = KnitConfig::fast().with_seed(42);
//! let values = run_default(&circuit, &[ZObservable::single(0)], &config).unwrap();
//! println!("<Z> = {:.3}", values[0]);
//! ```
//!
//! ## Using Pipeline
//!
//! ```rust
//! use qcut_backend::SimulatorBackend;
//! use qcut_core::CircuitBuilder;
//! use qcut_engine::prelude::*;
//!
//! let circuit = CircuitBuilder::new(3).h(0).cnot(0, 1).cut(1, 2).build();
//! let backend = SimulatorBackend::ideal(3).with_seed(7);
//! let mut pipeline = KnitPipeline::new(KnitConfig::fast(), backend);
//!
//! // Inspect the cost before anything runs
//! let plan = pipeline.plan(&circuit).unwrap();
//! let observable = plan.observable_on(&[0, 2]).unwrap();
//! println!("{}", pipeline.resource_estimate().unwrap());
//!
//! pipeline.generate().unwrap();
//! pipeline.execute().unwrap();
//! let values = pipeline.reconstruct(&[observable]).unwrap();
//! assert_eq!(values.len(), 1);
//! ```

#![warn(missing_docs)]

// ============================================================================
// Module Declarations
// ============================================================================

/// Configuration (Gantree: L7_Integration → KnitConfig)
pub mod config;

/// Experiment execution (Gantree: L5_Execution → ExperimentRunner)
pub mod runner;

/// Staged pipeline (Gantree: L7_Integration → Pipeline)
pub mod pipeline;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::KnitConfig;
pub use pipeline::{
    run, run_default, KnitMetrics, KnitPipeline, KnitResult, PipelineStage, PipelineState,
};
pub use runner::{ExperimentRunner, MitigatorMap};

// ============================================================================
// Prelude
// ============================================================================

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use qcut_engine::prelude::*;
    //! ```

    pub use crate::config::KnitConfig;
    pub use crate::pipeline::{run, run_default, KnitPipeline, KnitResult, PipelineStage};
    pub use crate::runner::ExperimentRunner;
}

// ============================================================================
// Integration Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use approx::assert_abs_diff_eq;
    use qcut_backend::{Backend, ExecutionResult, SimulatorBackend};
    use qcut_core::{Circuit, CircuitBuilder, QcutError, QcutResult};
    use qcut_knit::{KnitPlan, ZObservable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TOLERANCE: f64 = 0.05;

    /// Simulator that counts every submitted circuit
    struct CountingBackend {
        inner: SimulatorBackend,
        calls: AtomicUsize,
    }

    impl CountingBackend {
        fn new(num_qubits: usize) -> Self {
            Self {
                inner: SimulatorBackend::ideal(num_qubits).with_seed(1),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Backend for CountingBackend {
        fn name(&self) -> &str {
            "counting"
        }

        fn num_qubits(&self) -> usize {
            self.inner.num_qubits()
        }

        fn execute(&self, circuit: &Circuit, shots: u64) -> QcutResult<ExecutionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.execute(circuit, shots)
        }

        fn execute_stream(
            &self,
            circuit: &Circuit,
            shots: u64,
            stream: u64,
        ) -> QcutResult<ExecutionResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.execute_stream(circuit, shots, stream)
        }

        fn max_shots(&self) -> u64 {
            self.inner.max_shots()
        }
    }

    fn precise(seed: u64) -> KnitConfig {
        KnitConfig::new().with_error(0.01).with_seed(seed)
    }

    #[test]
    fn test_single_cut_plus_state_across_seeds() {
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).build();
        for seed in 1..=3 {
            let values = run_default(&circuit, &[ZObservable::single(0)], &precise(seed)).unwrap();
            assert!(values[0].abs() < TOLERANCE, "seed {}: {}", seed, values[0]);
        }
    }

    #[test]
    fn test_bell_pair_through_cut() {
        let circuit = CircuitBuilder::new(3).h(0).cnot(0, 1).cut(1, 2).build();
        let plan = KnitPlan::from_circuit(&circuit).unwrap();
        let observables = vec![
            plan.observable_on(&[0]).unwrap(),
            plan.observable_on(&[2]).unwrap(),
            plan.observable_on(&[0, 2]).unwrap(),
        ];

        for seed in [11, 12] {
            let values = run_default(&circuit, &observables, &precise(seed)).unwrap();
            assert!(values[0].abs() < TOLERANCE, "<Z0> = {}", values[0]);
            assert!(values[1].abs() < TOLERANCE, "<Z2> = {}", values[1]);
            assert!((values[2] - 1.0).abs() < TOLERANCE, "<Z0 Z2> = {}", values[2]);
        }
    }

    #[test]
    fn test_rotation_single_cut() {
        let theta: f64 = 0.8;
        let circuit = CircuitBuilder::new(2).ry(0, theta).cut(0, 1).build();
        let values = run_default(&circuit, &[ZObservable::single(0)], &precise(21)).unwrap();
        assert_abs_diff_eq!(values[0], theta.cos(), epsilon = TOLERANCE);
    }

    #[test]
    fn test_two_cuts() {
        let circuit = CircuitBuilder::new(3)
            .ry(0, 0.7)
            .cut(0, 1)
            .ry(1, 0.4)
            .cut(1, 2)
            .build();
        let values = run_default(&circuit, &[ZObservable::single(0)], &precise(31)).unwrap();
        assert_abs_diff_eq!(values[0], 1.1f64.cos(), epsilon = TOLERANCE);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let circuit = CircuitBuilder::new(3).h(0).cnot(0, 1).cut(1, 2).build();
        let observables = [ZObservable::single(0), ZObservable::single(1)];
        let config = KnitConfig::fast().with_seed(5);

        let parallel = run_default(&circuit, &observables, &config.clone().with_parallel(true));
        let sequential = run_default(&circuit, &observables, &config.with_parallel(false));
        assert_eq!(parallel.unwrap(), sequential.unwrap());
    }

    #[test]
    fn test_readout_mitigation() {
        let circuit = CircuitBuilder::new(2).x(0).cut(0, 1).x(1).build();
        let observables = [ZObservable::single(0)];
        let backend = SimulatorBackend::with_readout_error(2, 0.05)
            .unwrap()
            .with_seed(5);

        // Each of the two readouts in a Z term shrinks the value by 0.9
        let raw = run(&circuit, &observables, &precise(5), &backend).unwrap();
        assert!((raw[0] - 0.81).abs() < TOLERANCE, "raw {}", raw[0]);

        let config = precise(5)
            .with_mitigation(true)
            .with_calibration_shots(50_000);
        let mut pipeline = KnitPipeline::new(config, &backend);
        let result = pipeline.run(&circuit, &observables).unwrap();
        assert!(result.metrics.mitigated);
        // 16 fragment circuits plus all-zeros and all-ones calibration at width 1
        assert_eq!(result.metrics.circuit_executions, 18);
        assert!(
            (result.values[0] - 1.0).abs() < TOLERANCE,
            "mitigated {}",
            result.values[0]
        );
    }

    #[test]
    fn test_too_many_cuts_before_execution() {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cut(0, 1)
            .h(1)
            .cut(1, 2)
            .build();
        let backend = CountingBackend::new(3);
        let config = KnitConfig::fast().with_max_cuts(1);

        let err = run(&circuit, &[ZObservable::single(0)], &config, &backend).unwrap_err();
        assert!(matches!(err, QcutError::TooManyCuts { cuts: 2, max: 1, .. }));
        assert!(err.is_resource_error());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_shot_limits_before_execution() {
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).build();
        let backend = CountingBackend::new(2);

        // fast(): 1600 samples, 200 shots on each of 16 circuits
        let config = KnitConfig::fast().with_max_total_shots(1000);
        let err = run(&circuit, &[ZObservable::single(0)], &config, &backend).unwrap_err();
        assert!(matches!(
            err,
            QcutError::ShotBudgetExceeded {
                required: 3200,
                max: 1000
            }
        ));

        let small = SimulatorBackend::ideal(2).with_max_shots(100);
        let err = run(&circuit, &[ZObservable::single(0)], &KnitConfig::fast(), &small).unwrap_err();
        assert!(matches!(err, QcutError::ShotsOutOfRange(200, 0, 100)));

        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_calibration_counted_before_execution() {
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).build();
        let backend = CountingBackend::new(2);

        // 3200 experiment shots fit, the two 1024-shot calibration runs do not
        let config = KnitConfig::fast().with_max_total_shots(4000);
        assert!(run(&circuit, &[ZObservable::single(0)], &config, &backend).is_ok());
        let calls = backend.calls();

        let err = run(
            &circuit,
            &[ZObservable::single(0)],
            &config.with_mitigation(true),
            &backend,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            QcutError::ShotBudgetExceeded {
                required: 5248,
                max: 4000
            }
        ));

        let small = CountingBackend::new(2);
        let config = KnitConfig::fast()
            .with_mitigation(true)
            .with_calibration_shots(200_000);
        let err = run(&circuit, &[ZObservable::single(0)], &config, &small).unwrap_err();
        assert!(matches!(err, QcutError::ShotsOutOfRange(200_000, 0, _)));

        assert_eq!(backend.calls(), calls);
        assert_eq!(small.calls(), 0);
    }

    #[test]
    fn test_structural_error_before_execution() {
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).x(0).build();
        let backend = CountingBackend::new(2);
        let err = run(&circuit, &[ZObservable::single(0)], &KnitConfig::fast(), &backend)
            .unwrap_err();
        assert!(err.is_structural());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_invalid_observable_before_execution() {
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).build();
        let backend = CountingBackend::new(2);
        let err = run(&circuit, &[ZObservable::single(1)], &KnitConfig::fast(), &backend)
            .unwrap_err();
        assert_eq!(err, QcutError::ObservableOutOfRange { index: 1, width: 1 });
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_counting_backend_sees_every_circuit() {
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).build();
        let backend = CountingBackend::new(2);
        run(&circuit, &[ZObservable::single(0)], &KnitConfig::fast(), &backend).unwrap();
        assert_eq!(backend.calls(), 16);
    }
}
