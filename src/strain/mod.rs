//! The local 2D strain tensor between two position snapshots. One
//! trait, two backends, mirroring [`crate::force`].

pub mod cpu;
#[cfg(feature = "cuda")]
pub mod cuda;

use crate::pbc::BoxGeometry;

/// A 2x2 tensor, row-major: `m[row][col]`.
pub type Tensor2 = [[f32; 2]; 2];

pub const ZERO_TENSOR: Tensor2 = [[0.0, 0.0], [0.0, 0.0]];

/// Capability exposed by both backends: install the two snapshots, run,
/// read back the per-atom strain tensor.
pub trait StrainKernel: Send {
    fn n(&self) -> usize;
    fn set_positions(&mut self, pos_t: &[[f32; 2]], pos_tprev: &[[f32; 2]]);
    fn run(&mut self, rcut_strain: f32, box_geom: BoxGeometry);
    fn strains(&self) -> &[Tensor2];
}

/// Convenience one-shot: set positions, run, and collect the output.
pub fn compute_once(
    kernel: &mut dyn StrainKernel,
    pos_t: &[[f32; 2]],
    pos_tprev: &[[f32; 2]],
    rcut_strain: f32,
    box_geom: BoxGeometry,
) -> Vec<Tensor2> {
    kernel.set_positions(pos_t, pos_tprev);
    kernel.run(rcut_strain, box_geom);
    kernel.strains().to_vec()
}

/// Build the preferred backend for `n` atoms, falling back to CPU.
pub fn select_backend(n: usize) -> Box<dyn StrainKernel> {
    #[cfg(feature = "cuda")]
    {
        match cuda::CudaStrainKernel::new(n) {
            Ok(k) => return Box::new(k),
            Err(e) => log::warn!("CUDA strain kernel unavailable ({e}), falling back to CPU"),
        }
    }
    Box::new(cpu::CpuStrainKernel::new(n))
}
