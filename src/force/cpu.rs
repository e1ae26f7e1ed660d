//! CPU force kernel: one `rayon` task per atom, shared read-only
//! position slice, disjoint per-atom output slots. No locking is
//! required since outputs are partitioned by atom index.
//!
//! Grounded on `moldyn/simulation/forces_CPU.py`'s `ForcesComputeCPU`
//! (`numba`+`multiprocessing` there, `rayon` here, same shape: a
//! worker pool sharing a read-only position buffer).

use rayon::prelude::*;

use super::{lj_energy, lj_force_over_r, pair_for, ForceKernel};
use crate::pbc::BoxGeometry;
use crate::species::PairLjConstants;

pub struct CpuForceKernel {
    pos: Vec<[f32; 2]>,
    f: Vec<[f32; 2]>,
    pe: Vec<f32>,
    count: Vec<f32>,
}

impl CpuForceKernel {
    pub fn new(n: usize) -> Self {
        Self {
            pos: vec![[0.0, 0.0]; n],
            f: vec![[0.0, 0.0]; n],
            pe: vec![0.0; n],
            count: vec![0.0; n],
        }
    }
}

impl ForceKernel for CpuForceKernel {
    fn n(&self) -> usize {
        self.pos.len()
    }

    fn set_positions(&mut self, pos: &[[f32; 2]]) {
        debug_assert_eq!(pos.len(), self.pos.len());
        self.pos.copy_from_slice(pos);
    }

    fn run(&mut self, n_a: usize, pair: PairLjConstants, box_geom: BoxGeometry) {
        let pos = &self.pos;
        let n = pos.len();

        let results: Vec<([f32; 2], f32, f32)> = (0..n)
            .into_par_iter()
            .map(|i| {
                let pi = pos[i];
                let mut f = [0.0f32, 0.0];
                let mut e = 0.0f32;
                let mut cnt = 0.0f32;

                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let (epsilon, sigma, rcut) = pair_for(i, j, n_a).constants(&pair);

                    let d = box_geom.min_image(pi, pos[j]);
                    if d[0].abs() >= rcut || d[1].abs() >= rcut {
                        continue;
                    }
                    let r2 = d[0] * d[0] + d[1] * d[1];
                    let r = r2.sqrt();
                    if r >= rcut {
                        continue;
                    }

                    let p = (sigma / r).powi(6);
                    let coeff = lj_force_over_r(p, epsilon, r);
                    f[0] += coeff * d[0];
                    f[1] += coeff * d[1];
                    e += lj_energy(p, epsilon);
                    cnt += 1.0;
                }

                (f, e, cnt)
            })
            .collect();

        for (i, (f, e, cnt)) in results.into_iter().enumerate() {
            self.f[i] = f;
            self.pe[i] = e;
            self.count[i] = cnt;
        }
    }

    fn forces(&self) -> &[[f32; 2]] {
        &self.f
    }

    fn potential_energies(&self) -> &[f32] {
        &self.pe
    }

    fn counts(&self) -> &[f32] {
        &self.count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn argon_pair() -> PairLjConstants {
        use crate::species::SpeciesParams;
        let a = SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26);
        PairLjConstants::from_species_kong(a, a)
    }

    fn open_box() -> BoxGeometry {
        let mut b = BoxGeometry::new(-1e-6, 1e-6, -1e-6, 1e-6);
        b.x_periodic = false;
        b.y_periodic = false;
        b
    }

    #[test]
    fn translation_invariance_nonperiodic() {
        let pair = argon_pair();
        let sigma = pair.sigma_a as f32;
        let pos = vec![[0.0, 0.0], [sigma * 1.2, 0.0], [0.0, sigma * 1.5]];
        let mut k1 = CpuForceKernel::new(3);
        let out1 = super::super::compute_once(&mut k1, &pos, 3, pair, open_box());

        let shift = [1.234e-9, -5.678e-9];
        let shifted: Vec<_> = pos.iter().map(|p| [p[0] + shift[0], p[1] + shift[1]]).collect();
        let mut k2 = CpuForceKernel::new(3);
        let out2 = super::super::compute_once(&mut k2, &shifted, 3, pair, open_box());

        for i in 0..3 {
            assert_relative_eq!(out1.f[i][0], out2.f[i][0], epsilon = 1e-3);
            assert_relative_eq!(out1.f[i][1], out2.f[i][1], epsilon = 1e-3);
            assert_relative_eq!(out1.pe[i], out2.pe[i], epsilon = 1e-6);
            assert_eq!(out1.count[i], out2.count[i]);
        }
    }

    #[test]
    fn pair_consistency_two_atoms() {
        let pair = argon_pair();
        let sigma = pair.sigma_a as f32;
        let r = sigma * 1.3;
        let pos = vec![[0.0, 0.0], [r, 0.0]];
        let mut k = CpuForceKernel::new(2);
        let out = super::super::compute_once(&mut k, &pos, 2, pair, open_box());

        assert_relative_eq!(out.f[0][0], -out.f[1][0], epsilon = 1e-3);
        assert_relative_eq!(out.f[0][1], -out.f[1][1], epsilon = 1e-6);

        let p = (sigma / r).powi(6);
        let expected_mag = (4.0 * pair.epsilon_a as f32 * (6.0 * p - 12.0 * p * p) / r).abs();
        let mag0 = (out.f[0][0] * out.f[0][0] + out.f[0][1] * out.f[0][1]).sqrt();
        assert_relative_eq!(mag0, expected_mag, epsilon = 1e-3);
    }

    #[test]
    fn cutoff_continuity() {
        let pair = argon_pair();
        let epsilon = pair.epsilon_a as f32;
        let rcut = pair.rcut_a as f32;
        let sigma = pair.sigma_a as f32;

        let delta = 1e-5 * rcut;
        let p_at = (sigma / rcut).powi(6);
        let p_near = (sigma / (rcut - delta)).powi(6);

        let e_at = lj_energy(p_at, epsilon);
        let e_near = lj_energy(p_near, epsilon);

        assert!(e_at.abs() < 1e-30);
        assert!((e_near - e_at).abs() < 1e-3 * epsilon.abs() || (e_near - e_at).abs() < 1e-25);
    }

    #[test]
    fn cutoff_rejects_distant_third_atom() {
        // N=3 in a line, spacing re, 3*re; atom 2 is beyond rcut = 2*re.
        let pair = argon_pair();
        let re = pair.sigma_a as f32 * 2f32.powf(1.0 / 6.0);
        let pos = vec![[0.0, 0.0], [re, 0.0], [re + 3.0 * re, 0.0]];
        let mut k = CpuForceKernel::new(3);
        let out = super::super::compute_once(&mut k, &pos, 3, pair, open_box());

        // isolated two-body reference between atoms 0 and 1 only.
        let mut k_pair = CpuForceKernel::new(2);
        let out_pair =
            super::super::compute_once(&mut k_pair, &pos[0..2], 2, pair, open_box());

        assert_relative_eq!(out.f[0][0], out_pair.f[0][0], epsilon = 1e-3);
        assert_eq!(out.count[0], 1.0);
        assert_eq!(out.count[2], 0.0);
    }
}
