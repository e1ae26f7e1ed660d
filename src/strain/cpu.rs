//! CPU strain kernel: one `rayon` task per atom, identical neighbor-scan
//! shape to [`crate::force::cpu::CpuForceKernel`].
//!
//! Grounded on `moldyn/processing/strain_CPU.py`'s `StrainComputeCPU`.

use nalgebra::Matrix2;
use rayon::prelude::*;

use super::{StrainKernel, Tensor2, ZERO_TENSOR};
use crate::pbc::BoxGeometry;

pub struct CpuStrainKernel {
    pos_t: Vec<[f32; 2]>,
    pos_tprev: Vec<[f32; 2]>,
    eps: Vec<Tensor2>,
}

impl CpuStrainKernel {
    pub fn new(n: usize) -> Self {
        Self {
            pos_t: vec![[0.0, 0.0]; n],
            pos_tprev: vec![[0.0, 0.0]; n],
            eps: vec![ZERO_TENSOR; n],
        }
    }
}

impl StrainKernel for CpuStrainKernel {
    fn n(&self) -> usize {
        self.pos_t.len()
    }

    fn set_positions(&mut self, pos_t: &[[f32; 2]], pos_tprev: &[[f32; 2]]) {
        debug_assert_eq!(pos_t.len(), self.pos_t.len());
        debug_assert_eq!(pos_tprev.len(), self.pos_tprev.len());
        self.pos_t.copy_from_slice(pos_t);
        self.pos_tprev.copy_from_slice(pos_tprev);
    }

    fn run(&mut self, rcut_strain: f32, box_geom: BoxGeometry) {
        let pos_t = &self.pos_t;
        let pos_tprev = &self.pos_tprev;
        let n = pos_t.len();

        self.eps = (0..n)
            .into_par_iter()
            .map(|i| {
                let mut x = Matrix2::<f32>::zeros();
                let mut y = Matrix2::<f32>::zeros();

                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    let dt = box_geom.min_image(pos_t[i], pos_t[j]);
                    if dt[0].abs() >= rcut_strain || dt[1].abs() >= rcut_strain {
                        continue;
                    }
                    let r = (dt[0] * dt[0] + dt[1] * dt[1]).sqrt();
                    if r >= rcut_strain {
                        continue;
                    }

                    let dtprev = box_geom.min_image(pos_tprev[i], pos_tprev[j]);

                    // X[a][b] += dr_t[a] * dr_tprev[b]; Y[a][b] += dr_tprev[a] * dr_tprev[b].
                    for a in 0..2 {
                        for b in 0..2 {
                            x[(a, b)] += dt[a] * dtprev[b];
                            y[(a, b)] += dtprev[a] * dtprev[b];
                        }
                    }
                }

                match y.try_inverse() {
                    Some(y_inv) => {
                        let e = x * y_inv - Matrix2::<f32>::identity();
                        [[e[(0, 0)], e[(0, 1)]], [e[(1, 0)], e[(1, 1)]]]
                    }
                    // Singular Y: isolated atom or fewer than two
                    // independent neighbors. Leave undefined as zero.
                    None => ZERO_TENSOR,
                }
            })
            .collect();
    }

    fn strains(&self) -> &[Tensor2] {
        &self.eps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid(n_x: usize, n_y: usize, d: f32) -> Vec<[f32; 2]> {
        let mut pos = Vec::with_capacity(n_x * n_y);
        for iy in 0..n_y {
            for ix in 0..n_x {
                pos.push([ix as f32 * d, iy as f32 * d]);
            }
        }
        pos
    }

    fn open_box() -> BoxGeometry {
        BoxGeometry::new(-1e3, 1e3, -1e3, 1e3)
    }

    fn interior_indices(n_x: usize, n_y: usize) -> Vec<usize> {
        let mut v = Vec::new();
        for iy in 1..n_y - 1 {
            for ix in 1..n_x - 1 {
                v.push(iy * n_x + ix);
            }
        }
        v
    }

    #[test]
    fn identity_motion_gives_zero_strain() {
        let pos = grid(6, 6, 1.0);
        let mut k = CpuStrainKernel::new(pos.len());
        let eps = super::super::compute_once(&mut k, &pos, &pos, 1.3, open_box());
        for &i in &interior_indices(6, 6) {
            for a in 0..2 {
                for b in 0..2 {
                    assert_relative_eq!(eps[i][a][b], 0.0, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn pure_translation_gives_zero_strain() {
        let pos_tprev = grid(6, 6, 1.0);
        let pos_t: Vec<_> = pos_tprev.iter().map(|p| [p[0] + 0.3, p[1] - 0.2]).collect();
        let mut k = CpuStrainKernel::new(pos_tprev.len());
        let eps = super::super::compute_once(&mut k, &pos_t, &pos_tprev, 1.3, open_box());
        for &i in &interior_indices(6, 6) {
            for a in 0..2 {
                for b in 0..2 {
                    assert_relative_eq!(eps[i][a][b], 0.0, epsilon = 1e-4);
                }
            }
        }
    }

    #[test]
    fn uniform_stretch_recovers_s_minus_identity() {
        let pos_tprev = grid(8, 8, 1.0);
        // S = [[1.05, 0.0], [0.0, 0.95]]
        let s = [[1.05f32, 0.0], [0.0, 0.95]];
        let pos_t: Vec<_> = pos_tprev
            .iter()
            .map(|p| [s[0][0] * p[0] + s[0][1] * p[1], s[1][0] * p[0] + s[1][1] * p[1]])
            .collect();

        let mut k = CpuStrainKernel::new(pos_tprev.len());
        let eps = super::super::compute_once(&mut k, &pos_t, &pos_tprev, 1.3, open_box());

        for &i in &interior_indices(8, 8) {
            assert_relative_eq!(eps[i][0][0], s[0][0] - 1.0, epsilon = 1e-3);
            assert_relative_eq!(eps[i][1][1], s[1][1] - 1.0, epsilon = 1e-3);
            assert_relative_eq!(eps[i][0][1], 0.0, epsilon = 1e-3);
            assert_relative_eq!(eps[i][1][0], 0.0, epsilon = 1e-3);
        }
    }

    /// Pure shear on a 20x20 grid. S = [[1, 0.01], [0, 1]]; the
    /// symmetrized xy component at interior atoms should land within
    /// +/-1e-3 of 0.005, with xx/yy within +/-1e-3 of 0.
    #[test]
    fn pure_shear_recovers_offdiagonal_strain() {
        let pos_tprev = grid(20, 20, 1.0);
        let s = [[1.0f32, 0.01], [0.0, 1.0]];
        let pos_t: Vec<_> = pos_tprev
            .iter()
            .map(|p| [s[0][0] * p[0] + s[0][1] * p[1], s[1][0] * p[0] + s[1][1] * p[1]])
            .collect();

        let mut k = CpuStrainKernel::new(pos_tprev.len());
        let eps = super::super::compute_once(&mut k, &pos_t, &pos_tprev, 1.2, open_box());

        for &i in &interior_indices(20, 20) {
            let symmetrized_xy = 0.5 * (eps[i][0][1] + eps[i][1][0]);
            assert_relative_eq!(symmetrized_xy, 0.005, epsilon = 1e-3);
            assert_relative_eq!(eps[i][0][0], 0.0, epsilon = 1e-3);
            assert_relative_eq!(eps[i][1][1], 0.0, epsilon = 1e-3);
        }
    }
}
