//! Simulator backend for QCut
//!
//! Gantree: L6_Backend → SimulatorBackend
//!
//! Statevector simulator with mid-circuit measurement support. The
//! circuit is evaluated once into an exact distribution over classical
//! outcomes (one statevector per measurement branch), then shots are
//! drawn from it and passed through the readout noise model.

use crate::execution::{Backend, ExecutionMetadata, ExecutionResult};
use crate::noise::NoiseModel;
use num_complex::Complex64;
use qcut_core::{Bitstring, Circuit, Counts, Gate, QcutError, QcutResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_1_SQRT_2, PI};
use std::time::Instant;

/// Branches below this probability are dropped
const PRUNE_EPS: f64 = 1e-12;

/// Largest register the simulator will allocate
const MAX_SIM_QUBITS: usize = 24;

/// Simulator backend with readout noise
/// Gantree: SimulatorBackend // 시뮬레이터 구현
#[derive(Debug, Clone)]
pub struct SimulatorBackend {
    /// Backend name
    name: String,

    /// Number of qubits
    num_qubits: usize,

    /// Readout noise model
    noise_model: NoiseModel,

    /// Random seed
    seed: Option<u64>,

    /// Shot limit per execution
    max_shots: u64,
}

/// One measurement history with its post-measurement state
struct Branch {
    state: Vec<Complex64>,
    clbits: Vec<bool>,
    probability: f64,
}

impl SimulatorBackend {
    // ========================================================================
    // Constructors
    // ========================================================================

    /// Create new simulator backend
    pub fn new(num_qubits: usize, noise_model: NoiseModel) -> Self {
        Self {
            name: "qcut_simulator".to_string(),
            num_qubits,
            noise_model,
            seed: None,
            max_shots: qcut_core::budget::DEFAULT_MAX_SHOTS,
        }
    }

    /// Create ideal (noiseless) simulator
    pub fn ideal(num_qubits: usize) -> Self {
        Self::new(num_qubits, NoiseModel::ideal())
    }

    /// Create with symmetric readout error
    pub fn with_readout_error(num_qubits: usize, readout_error: f64) -> QcutResult<Self> {
        Ok(Self::new(num_qubits, NoiseModel::symmetric(readout_error)?))
    }

    /// Set seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set backend name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set shot limit per execution
    pub fn with_max_shots(mut self, max_shots: u64) -> Self {
        self.max_shots = max_shots;
        self
    }

    /// Get noise model
    pub fn noise_model(&self) -> &NoiseModel {
        &self.noise_model
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Exact distribution over recorded outcomes, before readout noise
    ///
    /// A circuit without classical registers reads out every qubit at the
    /// end, bit `i` being qubit `i`.
    /// Gantree: outcome_distribution(circuit) -> Result<Vec<(Bitstring, f64)>>
    pub fn outcome_distribution(&self, circuit: &Circuit) -> QcutResult<Vec<(Bitstring, f64)>> {
        let n = circuit.num_qubits();
        if n > self.num_qubits {
            return Err(QcutError::BackendError(format!(
                "circuit needs {} qubits but '{}' has {}",
                n, self.name, self.num_qubits
            )));
        }
        if n > MAX_SIM_QUBITS {
            return Err(QcutError::BackendError(format!(
                "{} qubits exceed the statevector limit of {}",
                n, MAX_SIM_QUBITS
            )));
        }

        let implicit_readout = circuit.cregs().is_empty();
        let width = if implicit_readout {
            n
        } else {
            circuit.num_clbits()
        };

        let mut initial = vec![Complex64::new(0.0, 0.0); 1 << n];
        initial[0] = Complex64::new(1.0, 0.0);
        let mut branches = vec![Branch {
            state: initial,
            clbits: vec![false; width],
            probability: 1.0,
        }];

        for gate in circuit.gates() {
            match gate {
                Gate::Measure(q, c) => {
                    branches = branches
                        .into_iter()
                        .flat_map(|b| measure_branch(b, *q, Some(*c), false))
                        .collect();
                }
                Gate::Reset(q) => {
                    branches = branches
                        .into_iter()
                        .flat_map(|b| measure_branch(b, *q, None, true))
                        .collect();
                }
                Gate::Barrier(_) | Gate::Id(_) => {}
                Gate::Cut(_, _) | Gate::Placeholder(_) => {
                    return Err(QcutError::BackendError(format!(
                        "unresolved knitting instruction '{}'",
                        gate.name()
                    )));
                }
                unitary => {
                    for branch in &mut branches {
                        apply_gate(&mut branch.state, unitary);
                    }
                }
            }
        }

        let mut distribution: BTreeMap<Vec<bool>, f64> = BTreeMap::new();
        for branch in branches {
            if implicit_readout {
                for (index, amp) in branch.state.iter().enumerate() {
                    let p = branch.probability * amp.norm_sqr();
                    if p < PRUNE_EPS {
                        continue;
                    }
                    let bits: Vec<bool> = (0..n).map(|q| index & (1 << q) != 0).collect();
                    *distribution.entry(bits).or_insert(0.0) += p;
                }
            } else {
                *distribution.entry(branch.clbits).or_insert(0.0) += branch.probability;
            }
        }

        Ok(distribution
            .into_iter()
            .map(|(bits, p)| (Bitstring::new(bits), p))
            .collect())
    }

    /// Draw shots from the exact distribution and apply readout noise
    fn sample(
        &self,
        distribution: &[(Bitstring, f64)],
        layout: &[usize],
        shots: u64,
        rng: &mut ChaCha8Rng,
    ) -> Counts {
        let mut counts = Counts::new();
        if distribution.is_empty() || shots == 0 {
            return counts;
        }

        let cumulative: Vec<f64> = distribution
            .iter()
            .scan(0.0, |acc, (_, p)| {
                *acc += p;
                Some(*acc)
            })
            .collect();
        let total = cumulative.last().copied().unwrap_or(1.0);

        for _ in 0..shots {
            let r = rng.gen::<f64>() * total;
            let index = cumulative
                .partition_point(|&c| c <= r)
                .min(distribution.len() - 1);
            let mut bits = distribution[index].0.bits().to_vec();

            if !self.noise_model.is_ideal() {
                for bit in bits.iter_mut() {
                    if rng.gen::<f64>() < self.noise_model.flip_probability(*bit) {
                        *bit = !*bit;
                    }
                }
            }

            let key = Bitstring::new(bits).to_segmented(layout);
            *counts.entry(key).or_insert(0.0) += 1.0;
        }

        counts
    }

    fn rng_for(&self, stream: u64) -> ChaCha8Rng {
        let mut rng = match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        rng.set_stream(stream);
        rng
    }
}

// ============================================================================
// Measurement
// ============================================================================

/// Split a branch on the outcome of measuring `q`
fn measure_branch(branch: Branch, q: usize, record: Option<usize>, reset: bool) -> Vec<Branch> {
    let mask = 1usize << q;
    let p1: f64 = branch
        .state
        .iter()
        .enumerate()
        .filter(|(i, _)| i & mask != 0)
        .map(|(_, a)| a.norm_sqr())
        .sum();
    let p0 = (1.0 - p1).max(0.0);

    let mut out = Vec::with_capacity(2);
    for (outcome, p) in [(false, p0), (true, p1)] {
        if p < PRUNE_EPS {
            continue;
        }
        let scale = 1.0 / p.sqrt();
        let mut state: Vec<Complex64> = branch
            .state
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                if (i & mask != 0) == outcome {
                    a * scale
                } else {
                    Complex64::new(0.0, 0.0)
                }
            })
            .collect();
        if reset && outcome {
            apply_single_qubit_gate(&mut state, q, |a, b| (b, a));
        }
        let mut clbits = branch.clbits.clone();
        if let Some(c) = record {
            if let Some(slot) = clbits.get_mut(c) {
                *slot = outcome;
            }
        }
        out.push(Branch {
            state,
            clbits,
            probability: branch.probability * p,
        });
    }
    out
}

// ============================================================================
// Gate Application
// ============================================================================

fn apply_gate(state: &mut [Complex64], gate: &Gate) {
    let i = Complex64::new(0.0, 1.0);
    match *gate {
        Gate::H(q) => apply_single_qubit_gate(state, q, |a, b| {
            ((a + b) * FRAC_1_SQRT_2, (a - b) * FRAC_1_SQRT_2)
        }),
        Gate::X(q) => apply_single_qubit_gate(state, q, |a, b| (b, a)),
        Gate::Y(q) => apply_single_qubit_gate(state, q, |a, b| (-i * b, i * a)),
        Gate::Z(q) => apply_single_qubit_gate(state, q, |a, b| (a, -b)),
        Gate::S(q) => apply_phase(state, q, i),
        Gate::Sdg(q) => apply_phase(state, q, -i),
        Gate::T(q) => apply_phase(state, q, Complex64::from_polar(1.0, PI / 4.0)),
        Gate::Tdg(q) => apply_phase(state, q, Complex64::from_polar(1.0, -PI / 4.0)),
        Gate::P(q, lambda) => apply_phase(state, q, Complex64::from_polar(1.0, lambda)),
        Gate::Sx(q) => {
            let (p, m) = (Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5));
            apply_single_qubit_gate(state, q, |a, b| (p * a + m * b, m * a + p * b))
        }
        Gate::Sxdg(q) => {
            let (p, m) = (Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5));
            apply_single_qubit_gate(state, q, |a, b| (p * a + m * b, m * a + p * b))
        }
        Gate::Rx(q, angle) => {
            let (c, s) = ((angle / 2.0).cos(), (angle / 2.0).sin());
            let ms = Complex64::new(0.0, -s);
            apply_single_qubit_gate(state, q, |a, b| (a * c + b * ms, a * ms + b * c))
        }
        Gate::Ry(q, angle) => {
            let (c, s) = ((angle / 2.0).cos(), (angle / 2.0).sin());
            apply_single_qubit_gate(state, q, |a, b| (a * c - b * s, a * s + b * c))
        }
        Gate::Rz(q, angle) => {
            let neg = Complex64::from_polar(1.0, -angle / 2.0);
            let pos = Complex64::from_polar(1.0, angle / 2.0);
            apply_single_qubit_gate(state, q, |a, b| (a * neg, b * pos))
        }
        Gate::Cnot(c, t) => apply_controlled_x(state, 1 << c, t),
        Gate::Ccx(c1, c2, t) => apply_controlled_x(state, (1 << c1) | (1 << c2), t),
        Gate::Cz(a, b) => {
            let mask = (1usize << a) | (1usize << b);
            for (idx, amp) in state.iter_mut().enumerate() {
                if idx & mask == mask {
                    *amp = -*amp;
                }
            }
        }
        Gate::Swap(a, b) => {
            let (ma, mb) = (1usize << a, 1usize << b);
            for idx in 0..state.len() {
                if idx & ma != 0 && idx & mb == 0 {
                    state.swap(idx, idx ^ ma ^ mb);
                }
            }
        }
        // Non-unitary instructions are handled by the caller
        _ => {}
    }
}

fn apply_phase(state: &mut [Complex64], q: usize, phase: Complex64) {
    apply_single_qubit_gate(state, q, |a, b| (a, b * phase));
}

fn apply_controlled_x(state: &mut [Complex64], control_mask: usize, target: usize) {
    let target_mask = 1usize << target;
    for idx in 0..state.len() {
        if idx & control_mask == control_mask && idx & target_mask == 0 {
            state.swap(idx, idx | target_mask);
        }
    }
}

fn apply_single_qubit_gate<F>(state: &mut [Complex64], q: usize, f: F)
where
    F: Fn(Complex64, Complex64) -> (Complex64, Complex64),
{
    let mask = 1usize << q;
    for i in 0..state.len() {
        if i & mask == 0 {
            let j = i | mask;
            let (new_i, new_j) = f(state[i], state[j]);
            state[i] = new_i;
            state[j] = new_j;
        }
    }
}

// ============================================================================
// Backend Implementation
// ============================================================================

impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    fn execute(&self, circuit: &Circuit, shots: u64) -> QcutResult<ExecutionResult> {
        self.execute_stream(circuit, shots, 0)
    }

    fn execute_stream(
        &self,
        circuit: &Circuit,
        shots: u64,
        stream: u64,
    ) -> QcutResult<ExecutionResult> {
        if shots > self.max_shots {
            return Err(QcutError::ShotsOutOfRange(shots, 0, self.max_shots));
        }
        let start = Instant::now();

        let distribution = self.outcome_distribution(circuit)?;
        let mut layout = if circuit.cregs().is_empty() {
            vec![circuit.num_qubits()]
        } else {
            circuit.register_layout()
        };
        layout.retain(|&w| w > 0);

        let mut rng = self.rng_for(stream);
        let counts = self.sample(&distribution, &layout, shots, &mut rng);

        Ok(ExecutionResult {
            counts,
            shots,
            metadata: ExecutionMetadata {
                backend: self.name.clone(),
                simulated: true,
                seed: self.seed,
                stream: Some(stream),
                execution_time_ms: Some(start.elapsed().as_millis() as u64),
                ..Default::default()
            },
        })
    }

    fn is_simulator(&self) -> bool {
        true
    }

    fn max_shots(&self) -> u64 {
        self.max_shots
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use qcut_core::CircuitBuilder;

    #[test]
    fn test_simulator_bell_state() {
        let backend = SimulatorBackend::ideal(3).with_seed(42);
        let circuit = CircuitBuilder::new(2).h(0).cnot(0, 1).build();

        let result = backend.execute(&circuit, 1000).unwrap();

        let p00 = result.probability("00");
        let p11 = result.probability("11");
        assert!(p00 > 0.4 && p00 < 0.6, "P(00) = {}", p00);
        assert!(p11 > 0.4 && p11 < 0.6, "P(11) = {}", p11);
        assert!((p00 + p11 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_distribution_ry() {
        let theta = 1.1;
        let backend = SimulatorBackend::ideal(1);
        let circuit = CircuitBuilder::new(1).ry(0, theta).build();

        let dist = backend.outcome_distribution(&circuit).unwrap();
        let p1: f64 = dist
            .iter()
            .filter(|(b, _)| b.get(0) == Some(true))
            .map(|(_, p)| p)
            .sum();
        assert!((p1 - (theta / 2.0).sin().powi(2)).abs() < 1e-12, "P(1) = {}", p1);
    }

    #[test]
    fn test_mid_circuit_measurement_registers() {
        let backend = SimulatorBackend::ideal(2).with_seed(7);
        let circuit = CircuitBuilder::new(2)
            .creg("c", 1)
            .creg("meas", 1)
            .h(0)
            .measure(0, 0)
            .cnot(0, 1)
            .measure(1, 1)
            .try_build()
            .unwrap();

        let result = backend.execute(&circuit, 500).unwrap();
        for key in result.counts.keys() {
            assert!(key == "0 0" || key == "1 1", "unexpected outcome {}", key);
        }
    }

    #[test]
    fn test_measurement_collapses_superposition() {
        // Measuring between two H gates destroys interference
        let backend = SimulatorBackend::ideal(1);
        let circuit = CircuitBuilder::new(1)
            .creg("c", 2)
            .h(0)
            .measure(0, 0)
            .h(0)
            .measure(0, 1)
            .try_build()
            .unwrap();

        let dist = backend.outcome_distribution(&circuit).unwrap();
        assert_eq!(dist.len(), 4);
        for (_, p) in dist {
            assert!((p - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_reset() {
        let backend = SimulatorBackend::ideal(1);
        let circuit = CircuitBuilder::new(1).h(0).reset(0).build();
        let dist = backend.outcome_distribution(&circuit).unwrap();
        assert_eq!(dist.len(), 1);
        assert_eq!(dist[0].0.to_string(), "0");
    }

    #[test]
    fn test_y_basis_rotation() {
        // |+i> = S H |0>, measured after Sdg, H reads 0 deterministically
        let backend = SimulatorBackend::ideal(1);
        let circuit = CircuitBuilder::new(1).h(0).s(0).sdg(0).h(0).build();
        let dist = backend.outcome_distribution(&circuit).unwrap();
        assert_eq!(dist.len(), 1);
        assert_eq!(dist[0].0.to_string(), "0");

        // |-i> = S H X |0>
        let circuit = CircuitBuilder::new(1).x(0).h(0).s(0).sdg(0).h(0).build();
        let dist = backend.outcome_distribution(&circuit).unwrap();
        assert_eq!(dist.len(), 1);
        assert_eq!(dist[0].0.to_string(), "1");
    }

    #[test]
    fn test_readout_noise() {
        let backend = SimulatorBackend::new(1, NoiseModel::new(0.0, 0.1).unwrap()).with_seed(42);
        let circuit = CircuitBuilder::new(1).x(0).build();

        let result = backend.execute(&circuit, 20_000).unwrap();
        let p0 = result.probability("0");
        assert!((p0 - 0.1).abs() < 0.01, "P(0) = {}", p0);
    }

    #[test]
    fn test_rejects_unresolved_cut() {
        let backend = SimulatorBackend::ideal(2);
        let circuit = CircuitBuilder::new(2).h(0).cut(0, 1).build();
        let result = backend.execute(&circuit, 10);
        assert!(matches!(result, Err(QcutError::BackendError(_))));
    }

    #[test]
    fn test_qubit_limit() {
        let backend = SimulatorBackend::ideal(3);
        let circuit = CircuitBuilder::new(5).build();
        assert!(backend.execute(&circuit, 100).is_err());
    }

    #[test]
    fn test_shot_limit() {
        let backend = SimulatorBackend::ideal(1).with_max_shots(10);
        let circuit = CircuitBuilder::new(1).build();
        assert!(matches!(
            backend.execute(&circuit, 11),
            Err(QcutError::ShotsOutOfRange(11, 0, 10))
        ));
    }

    #[test]
    fn test_seed_and_stream_reproducibility() {
        let backend = SimulatorBackend::with_readout_error(3, 0.02)
            .unwrap()
            .with_seed(42);
        let circuit = CircuitBuilder::new(3).h(0).cnot(0, 1).cnot(1, 2).build();

        let a = backend.execute_stream(&circuit, 200, 5).unwrap();
        let b = backend.execute_stream(&circuit, 200, 5).unwrap();
        assert_eq!(a.counts, b.counts);
        assert_eq!(a.metadata.stream, Some(5));
    }
}
