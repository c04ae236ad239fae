//! Experiment runner
//!
//! Gantree: L5_Execution → ExperimentRunner
//!
//! Executes every fragment circuit of an experiment set on a backend,
//! optionally in parallel, and applies readout mitigation per classical
//! register width. Each circuit gets its own random stream so results do
//! not depend on scheduling order.

use qcut_backend::{Backend, LocalReadoutMitigator};
use qcut_core::{Counts, QcutResult};
use qcut_knit::{Experiment, ExperimentSet};
use rayon::prelude::*;
use std::collections::HashMap;

/// Mitigators keyed by classical register width
pub type MitigatorMap = HashMap<usize, LocalReadoutMitigator>;

/// Runs experiment sets against a backend
/// Gantree: ExperimentRunner<B: Backend> // 실험 실행기
#[derive(Debug, Clone)]
pub struct ExperimentRunner<B: Backend> {
    backend: B,
    parallel: bool,
    calibration_shots: Option<u64>,
}

impl<B: Backend> ExperimentRunner<B> {
    /// Sequential runner without mitigation
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            parallel: false,
            calibration_shots: None,
        }
    }

    /// Enable or disable parallel execution
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Enable readout mitigation with `shots` per calibration circuit
    pub fn with_mitigation(mut self, shots: u64) -> Self {
        self.calibration_shots = Some(shots);
        self
    }

    /// Underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Whether readout mitigation is applied
    pub fn is_mitigating(&self) -> bool {
        self.calibration_shots.is_some()
    }

    // ========================================================================
    // Calibration
    // ========================================================================

    /// Characterize readout once per distinct register width
    /// Gantree: characterize(experiments) -> Result<MitigatorMap> // 보정
    pub fn characterize(&self, experiments: &ExperimentSet) -> QcutResult<MitigatorMap> {
        let Some(shots) = self.calibration_shots else {
            return Ok(MitigatorMap::new());
        };

        let mut widths: Vec<usize> = experiments
            .iter()
            .flat_map(|e| e.layouts().iter().map(|l| l.width()))
            .collect();
        widths.sort_unstable();
        widths.dedup();

        widths
            .into_iter()
            .map(|width| {
                let mitigator = self.backend.characterize_readout(width, shots)?;
                Ok((width, mitigator))
            })
            .collect()
    }

    // ========================================================================
    // Execution
    // ========================================================================

    /// Execute every fragment circuit with `shots` shots
    ///
    /// Returns counts indexed `[experiment][fragment]`. With zero shots no
    /// circuit is submitted and every entry is empty.
    /// Gantree: run(experiments, shots) -> Result<Vec<Vec<Counts>>> // 실행
    pub fn run(&self, experiments: &ExperimentSet, shots: u64) -> QcutResult<Vec<Vec<Counts>>> {
        if shots == 0 {
            return Ok(experiments
                .iter()
                .map(|e| vec![Counts::new(); e.circuits().len()])
                .collect());
        }

        let mitigators = self.characterize(experiments)?;
        let run_one = |experiment: &Experiment| self.run_experiment(experiment, shots, &mitigators);

        log::debug!(
            "Executing {} circuits at {} shots on {} ({})",
            experiments.circuit_count(),
            shots,
            self.backend.name(),
            if self.parallel { "parallel" } else { "sequential" }
        );

        if self.parallel {
            experiments
                .experiments()
                .par_iter()
                .map(run_one)
                .collect()
        } else {
            experiments.iter().map(run_one).collect()
        }
    }

    fn run_experiment(
        &self,
        experiment: &Experiment,
        shots: u64,
        mitigators: &MitigatorMap,
    ) -> QcutResult<Vec<Counts>> {
        let fragments = experiment.circuits().len() as u64;
        experiment
            .circuits()
            .iter()
            .zip(experiment.layouts())
            .enumerate()
            .map(|(fragment, (circuit, layout))| {
                let stream = experiment.index() as u64 * fragments + fragment as u64;
                let counts = self.backend.execute_stream(circuit, shots, stream)?.counts;
                match mitigators.get(&layout.width()) {
                    Some(mitigator) => mitigator.mitigate_counts(&counts, shots),
                    None => Ok(counts),
                }
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcut_backend::SimulatorBackend;
    use qcut_core::CircuitBuilder;
    use qcut_knit::KnitPlan;

    fn experiments() -> ExperimentSet {
        let circuit = CircuitBuilder::new(3)
            .h(0)
            .cnot(0, 1)
            .cut(1, 2)
            .x(2)
            .build();
        KnitPlan::from_circuit(&circuit)
            .unwrap()
            .build_experiments()
            .unwrap()
    }

    #[test]
    fn test_run_shape() {
        let set = experiments();
        let runner = ExperimentRunner::new(SimulatorBackend::ideal(3).with_seed(1));
        let raw = runner.run(&set, 100).unwrap();

        assert_eq!(raw.len(), 8);
        for counts in &raw {
            assert_eq!(counts.len(), 2);
            for fragment in counts {
                assert_eq!(fragment.values().sum::<f64>(), 100.0);
            }
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let set = experiments();
        let backend = SimulatorBackend::with_readout_error(3, 0.02)
            .unwrap()
            .with_seed(9);
        let sequential = ExperimentRunner::new(&backend).run(&set, 500).unwrap();
        let parallel = ExperimentRunner::new(&backend)
            .with_parallel(true)
            .run(&set, 500)
            .unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_zero_shots_skip_backend() {
        let set = experiments();
        let runner = ExperimentRunner::new(SimulatorBackend::ideal(3)).with_mitigation(100);
        let raw = runner.run(&set, 0).unwrap();
        assert_eq!(raw.len(), 8);
        assert!(raw.iter().flatten().all(|c| c.is_empty()));
    }

    #[test]
    fn test_characterize_per_width() {
        let set = experiments();
        let backend = SimulatorBackend::with_readout_error(3, 0.05)
            .unwrap()
            .with_seed(3);

        let plain = ExperimentRunner::new(&backend);
        assert!(plain.characterize(&set).unwrap().is_empty());

        let runner = ExperimentRunner::new(&backend).with_mitigation(20_000);
        assert!(runner.is_mitigating());
        let mitigators = runner.characterize(&set).unwrap();

        let mut expected: Vec<usize> = set
            .iter()
            .flat_map(|e| e.layouts().iter().map(|l| l.width()))
            .collect();
        expected.sort_unstable();
        expected.dedup();
        let mut widths: Vec<usize> = mitigators.keys().copied().collect();
        widths.sort_unstable();
        assert_eq!(widths, expected);

        for (width, mitigator) in &mitigators {
            assert_eq!(mitigator.num_bits(), *width);
        }
    }

    #[test]
    fn test_backend_errors_propagate() {
        let set = experiments();
        let runner = ExperimentRunner::new(SimulatorBackend::ideal(3).with_max_shots(10));
        assert!(runner.run(&set, 11).is_err());
    }
}
