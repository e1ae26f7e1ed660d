//! The per-step inter-atomic force/potential accumulator.
//!
//! One trait, two backends: [`cpu::CpuForceKernel`] (always available,
//! `rayon`-parallel) and, behind the `cuda` feature,
//! `cuda::CudaForceKernel`. [`select_backend`] is the runtime factory
//! that picks CUDA when available and falls back to CPU with a
//! `log::warn!` otherwise.

pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;

use crate::pbc::BoxGeometry;
use crate::species::PairLjConstants;

/// The Lennard-Jones force, divided by `r`, so that multiplying by the
/// unnormalized displacement vector yields the cartesian force.
#[inline]
pub fn lj_force_over_r(p: f32, epsilon: f32, r: f32) -> f32 {
    (-4.0 * epsilon * (6.0 * p - 12.0 * p * p)) / (r * r)
}

/// Shifted Lennard-Jones potential energy, continuous at `r = rcut` for
/// `rcut_fact = 2`.
#[inline]
pub fn lj_energy(p: f32, epsilon: f32) -> f32 {
    epsilon * (4.0 * (p * p - p) + crate::constants::PE_SHIFT as f32)
}

/// Which of the three parameter sets (AA/BB/AB) governs a pair, given
/// the fixed contiguous species split at `n_a`.
#[inline]
pub fn pair_for(i: usize, j: usize, n_a: usize) -> PairSelector {
    (i < n_a, j < n_a).into()
}

impl From<(bool, bool)> for PairSelector {
    fn from(v: (bool, bool)) -> Self {
        match v {
            (true, true) => PairSelector::AA,
            (false, false) => PairSelector::BB,
            _ => PairSelector::AB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSelector {
    AA,
    BB,
    AB,
}

impl PairSelector {
    #[inline]
    pub fn constants(self, c: &PairLjConstants) -> (f32, f32, f32) {
        match self {
            PairSelector::AA => (c.epsilon_a as f32, c.sigma_a as f32, c.rcut_a as f32),
            PairSelector::BB => (c.epsilon_b as f32, c.sigma_b as f32, c.rcut_b as f32),
            PairSelector::AB => (c.epsilon_ab as f32, c.sigma_ab as f32, c.rcut_ab as f32),
        }
    }
}

/// Per-atom output of one force evaluation.
#[derive(Debug, Clone)]
pub struct ForceOutput {
    pub f: Vec<[f32; 2]>,
    pub pe: Vec<f32>,
    pub count: Vec<f32>,
}

/// Capability exposed by both backends: `set_positions` / `run` /
/// `read_*`, mirroring `ForcesComputeCPU`/`ForcesComputeGPU` in
/// `moldyn/simulation/forces_CPU.py`.
pub trait ForceKernel: Send {
    fn n(&self) -> usize;
    fn set_positions(&mut self, pos: &[[f32; 2]]);
    fn run(&mut self, n_a: usize, pair: PairLjConstants, box_geom: BoxGeometry);
    fn forces(&self) -> &[[f32; 2]];
    fn potential_energies(&self) -> &[f32];
    fn counts(&self) -> &[f32];
}

/// Convenience one-shot: set positions, run, and collect the output.
pub fn compute_once(
    kernel: &mut dyn ForceKernel,
    pos: &[[f32; 2]],
    n_a: usize,
    pair: PairLjConstants,
    box_geom: BoxGeometry,
) -> ForceOutput {
    kernel.set_positions(pos);
    kernel.run(n_a, pair, box_geom);
    ForceOutput {
        f: kernel.forces().to_vec(),
        pe: kernel.potential_energies().to_vec(),
        count: kernel.counts().to_vec(),
    }
}

/// Build the preferred backend for `n` atoms: CUDA when the `cuda`
/// feature is compiled in and a device is present, else CPU.
pub fn select_backend(n: usize) -> Box<dyn ForceKernel> {
    #[cfg(feature = "cuda")]
    {
        match cuda::CudaForceKernel::new(n) {
            Ok(k) => return Box::new(k),
            Err(e) => log::warn!("CUDA force kernel unavailable ({e}), falling back to CPU"),
        }
    }
    Box::new(cpu::CpuForceKernel::new(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_selector_picks_ab_for_mixed_indices() {
        assert_eq!(pair_for(0, 5, 3), PairSelector::AB);
        assert_eq!(pair_for(0, 1, 3), PairSelector::AA);
        assert_eq!(pair_for(3, 4, 3), PairSelector::BB);
    }
}
