//! Pipeline for staged knitting
//!
//! Gantree: L7_Integration → Pipeline
//!
//! Plan → generate → execute → reconstruct, with every intermediate
//! result kept in the pipeline state. Planning checks the resource limits,
//! so an infeasible cut count is rejected before any circuit is submitted.

use crate::config::KnitConfig;
use crate::runner::ExperimentRunner;
use qcut_backend::{Backend, SimulatorBackend};
use qcut_core::{Circuit, Counts, QcutError, QcutResult};
use qcut_knit::{
    estimate_expectation_values, process_results, ExperimentSet, KnitPlan, ResourceEstimate,
    ShotBudget, TotalResult, ZObservable,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineStage {
    /// Initial state
    Initial,
    /// Circuit analyzed and budget checked
    Planned,
    /// Experiments instantiated
    Generated,
    /// Fragment circuits executed
    Executed,
    /// Expectation values reconstructed
    Reconstructed,
}

/// Pipeline state holding intermediate results
#[derive(Debug, Clone)]
pub struct PipelineState {
    /// Current stage
    pub stage: PipelineStage,

    /// Configuration
    pub config: KnitConfig,

    /// Knitting plan
    pub plan: Option<KnitPlan>,

    /// Shot budget
    pub budget: Option<ShotBudget>,

    /// Resource estimate
    pub estimate: Option<ResourceEstimate>,

    /// Instantiated experiments
    pub experiments: Option<ExperimentSet>,

    /// Raw counts `[experiment][fragment]`
    pub raw: Option<Vec<Vec<Counts>>>,

    /// Decoded results
    pub results: Option<Vec<TotalResult>>,

    /// Reconstructed expectation values
    pub values: Option<Vec<f64>>,
}

impl PipelineState {
    /// Create new pipeline state
    pub fn new(config: KnitConfig) -> Self {
        Self {
            stage: PipelineStage::Initial,
            config,
            plan: None,
            budget: None,
            estimate: None,
            experiments: None,
            raw: None,
            results: None,
            values: None,
        }
    }

    /// Check if planned
    pub fn is_planned(&self) -> bool {
        self.plan.is_some()
    }

    /// Check if experiments exist
    pub fn has_experiments(&self) -> bool {
        self.experiments.is_some()
    }

    /// Check if executed
    pub fn is_executed(&self) -> bool {
        self.raw.is_some()
    }

    /// Check if reconstructed
    pub fn is_reconstructed(&self) -> bool {
        self.values.is_some()
    }
}

/// Execution metrics of a full run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnitMetrics {
    /// Wall time in milliseconds
    pub total_time_ms: u64,

    /// Circuits executed, readout calibration included
    pub circuit_executions: u64,

    /// Shots over all executed circuits
    pub total_shots: u64,

    /// Whether readout mitigation was applied
    pub mitigated: bool,
}

/// Result of a full run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnitResult {
    /// One estimate per observable, in request order
    pub values: Vec<f64>,

    /// Requested observables
    pub observables: Vec<ZObservable>,

    /// Resources used
    pub estimate: ResourceEstimate,

    /// Metrics
    pub metrics: KnitMetrics,
}

/// Staged knitting pipeline
/// Gantree: Pipeline // 단계별 실행
pub struct KnitPipeline<B: Backend> {
    /// Current state
    state: PipelineState,

    /// Execution backend
    backend: B,
}

impl<B: Backend> KnitPipeline<B> {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create new pipeline with configuration and backend
    pub fn new(config: KnitConfig, backend: B) -> Self {
        Self {
            state: PipelineState::new(config),
            backend,
        }
    }

    // ========================================================================
    // Stage Accessors
    // ========================================================================

    /// Get current stage
    pub fn stage(&self) -> PipelineStage {
        self.state.stage
    }

    /// Get current state
    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Get configuration
    pub fn config(&self) -> &KnitConfig {
        &self.state.config
    }

    /// Get backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resource estimate of the planned circuit
    pub fn resource_estimate(&self) -> Option<&ResourceEstimate> {
        self.state.estimate.as_ref()
    }

    // ========================================================================
    // Pipeline Stages
    // ========================================================================

    /// Stage 1: Plan
    ///
    /// Locates cuts, partitions the circuit and checks the shot budget
    /// against the configured limits and the backend's shot limit.
    pub fn plan(&mut self, circuit: &Circuit) -> QcutResult<&KnitPlan> {
        self.state.config.validate().map_err(QcutError::InvalidConfig)?;
        self.reset();

        let config = &self.state.config;
        let plan = KnitPlan::from_circuit(circuit)?;
        let limits = config.to_limits(self.backend.max_shots());
        limits.check_cuts(plan.num_cuts())?;

        let budget = plan.budget(config.error)?;
        let mut estimate = ResourceEstimate::new(&budget, plan.num_fragments())?;
        // No shots means no experiment runs and no calibration either
        if config.mitigate && budget.shots_per_experiment() > 0 {
            estimate = estimate
                .with_calibration(plan.calibration_widths().len(), config.calibration_shots)?;
        }
        estimate.check(&limits)?;

        if budget.shots_per_experiment() == 0 {
            log::warn!(
                "{} samples spread over {} experiments leave no shots per experiment",
                budget.samples(),
                budget.experiments()
            );
        }

        log::info!(
            "Pipeline: planned {} cuts, {} fragments, {} executions, {} shots",
            plan.num_cuts(),
            plan.num_fragments(),
            estimate.circuit_executions,
            estimate.required_shots()
        );

        self.state.budget = Some(budget);
        self.state.estimate = Some(estimate);
        self.state.stage = PipelineStage::Planned;
        Ok(&*self.state.plan.insert(plan))
    }

    /// Stage 2: Generate experiments
    pub fn generate(&mut self) -> QcutResult<&ExperimentSet> {
        let plan = self.state.plan.as_ref().ok_or_else(|| missing("plan"))?;
        let experiments = plan.build_experiments()?;

        log::info!(
            "Pipeline: generated {} experiments ({} circuits)",
            experiments.len(),
            experiments.circuit_count()
        );

        self.state.raw = None;
        self.state.results = None;
        self.state.values = None;
        self.state.stage = PipelineStage::Generated;
        Ok(&*self.state.experiments.insert(experiments))
    }

    /// Stage 3: Execute every fragment circuit
    pub fn execute(&mut self) -> QcutResult<&[Vec<Counts>]> {
        let experiments = self
            .state
            .experiments
            .as_ref()
            .ok_or_else(|| missing("generate"))?;
        let budget = self.state.budget.as_ref().ok_or_else(|| missing("plan"))?;
        let config = &self.state.config;

        let mut runner = ExperimentRunner::new(&self.backend).with_parallel(config.parallel);
        if config.mitigate {
            runner = runner.with_mitigation(config.calibration_shots);
        }
        let raw = runner.run(experiments, budget.shots_per_experiment())?;

        log::info!(
            "Pipeline: executed {} experiments on {}",
            raw.len(),
            self.backend.name()
        );

        self.state.results = None;
        self.state.values = None;
        self.state.stage = PipelineStage::Executed;
        Ok(self.state.raw.insert(raw).as_slice())
    }

    /// Stage 4: Reconstruct expectation values
    pub fn reconstruct(&mut self, observables: &[ZObservable]) -> QcutResult<&[f64]> {
        let state = &self.state;
        let (Some(plan), Some(budget), Some(experiments), Some(raw)) = (
            state.plan.as_ref(),
            state.budget.as_ref(),
            state.experiments.as_ref(),
            state.raw.as_ref(),
        ) else {
            return Err(missing("execute"));
        };

        plan.validate_observables(observables)?;
        let results = process_results(raw, experiments)?;
        let values = estimate_expectation_values(
            &results,
            &experiments.coefficients(),
            budget,
            observables,
        )?;

        log::info!("Pipeline: reconstructed {} observables", values.len());

        self.state.results = Some(results);
        self.state.stage = PipelineStage::Reconstructed;
        Ok(self.state.values.insert(values).as_slice())
    }

    /// Run full pipeline
    ///
    /// Observables are checked right after planning, before any circuit
    /// is executed.
    pub fn run(&mut self, circuit: &Circuit, observables: &[ZObservable]) -> QcutResult<KnitResult> {
        let start_time = Instant::now();

        self.plan(circuit)?.validate_observables(observables)?;
        self.generate()?;
        self.execute()?;
        let values = self.reconstruct(observables)?.to_vec();

        let estimate = self.state.estimate.ok_or_else(|| missing("plan"))?;
        let total_time_ms = start_time.elapsed().as_millis() as u64;

        Ok(KnitResult {
            values,
            observables: observables.to_vec(),
            estimate,
            metrics: KnitMetrics {
                total_time_ms,
                circuit_executions: estimate.circuit_executions
                    + estimate.calibration_executions,
                total_shots: estimate.required_shots(),
                mitigated: self.state.config.mitigate,
            },
        })
    }

    // ========================================================================
    // Reset
    // ========================================================================

    /// Reset pipeline to initial state
    pub fn reset(&mut self) {
        let config = self.state.config.clone();
        self.state = PipelineState::new(config);
    }

    /// Reset and reconfigure
    pub fn reconfigure(&mut self, config: KnitConfig) {
        self.state = PipelineState::new(config);
    }
}

fn missing(stage: &str) -> QcutError {
    QcutError::InvalidConfig(format!("pipeline stage '{}' has not run", stage))
}

// ============================================================================
// Entry Points
// ============================================================================

/// Reconstruct the uncut expectation value of every observable
///
/// One value per observable, in the order given. Observable indices refer
/// to the reconstructed measurement vector (see [`ZObservable`]); map
/// original qubits with [`KnitPlan::observable_on`].
/// Gantree: run(circuit, observables, config, backend) -> Result<Vec<f64>> // 진입점
pub fn run<B: Backend>(
    circuit: &Circuit,
    observables: &[ZObservable],
    config: &KnitConfig,
    backend: &B,
) -> QcutResult<Vec<f64>> {
    let mut pipeline = KnitPipeline::new(config.clone(), backend);
    Ok(pipeline.run(circuit, observables)?.values)
}

/// [`run`] on an ideal simulator sized to the circuit
pub fn run_default(
    circuit: &Circuit,
    observables: &[ZObservable],
    config: &KnitConfig,
) -> QcutResult<Vec<f64>> {
    let mut backend = SimulatorBackend::ideal(circuit.num_qubits());
    if let Some(seed) = config.seed {
        backend = backend.with_seed(seed);
    }
    run(circuit, observables, config, &backend)
}

// ============================================================================
// Tests
// ============================================================================
