//! CUDA force kernel: one thread per atom, `LAYOUT_SIZE`-atom blocks,
//! PTX compiled once at construction via `cudarc`'s NVRTC front-end.
//!
//! Grounded on `David-OConnor/daedalus`'s force-dispatch code (the
//! `CudaStream`/`CudaModule`/`LaunchConfig`/`launch_builder` shape) and
//! on `moldyn/simulation/forces_GPU.py`'s tiling over
//! `LAYOUT_SIZE`-atom workgroups.

use std::sync::Arc;

use cudarc::driver::{CudaContext, CudaModule, CudaSlice, CudaStream, LaunchConfig, PushKernelArg};
use cudarc::nvrtc::compile_ptx;

use super::ForceKernel;
use crate::constants::LAYOUT_SIZE;
use crate::error::BackendError;
use crate::pbc::BoxGeometry;
use crate::species::PairLjConstants;

const KERNEL_SRC: &str = r#"
extern "C" __global__ void lj_force_kernel(
    float2* out_f,
    float* out_pe,
    float* out_count,
    const float2* pos,
    int n,
    int n_a,
    float eps_a, float sigma_a, float rcut_a,
    float eps_b, float sigma_b, float rcut_b,
    float eps_ab, float sigma_ab, float rcut_ab,
    float length_x, float length_y,
    int x_periodic, int y_periodic)
{
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i >= n) return;

    float2 pi = pos[i];
    float2 f = make_float2(0.0f, 0.0f);
    float e = 0.0f;
    float cnt = 0.0f;

    bool i_is_a = i < n_a;

    for (int j = 0; j < n; ++j) {
        if (j == i) continue;
        bool j_is_a = j < n_a;

        float eps, sigma, rcut;
        if (i_is_a && j_is_a) { eps = eps_a; sigma = sigma_a; rcut = rcut_a; }
        else if (!i_is_a && !j_is_a) { eps = eps_b; sigma = sigma_b; rcut = rcut_b; }
        else { eps = eps_ab; sigma = sigma_ab; rcut = rcut_ab; }

        float dx = pi.x - pos[j].x;
        float dy = pi.y - pos[j].y;

        if (x_periodic) {
            float shift_x = length_x * 0.5f;
            if (dx > shift_x) dx -= length_x;
            else if (dx < -shift_x) dx += length_x;
        }
        if (y_periodic) {
            float shift_y = length_y * 0.5f;
            if (dy > shift_y) dy -= length_y;
            else if (dy < -shift_y) dy += length_y;
        }

        if (fabsf(dx) >= rcut || fabsf(dy) >= rcut) continue;
        float r2 = dx * dx + dy * dy;
        float r = sqrtf(r2);
        if (r >= rcut) continue;

        float sr = sigma / r;
        float p = sr * sr * sr * sr * sr * sr;
        float coeff = (-4.0f * eps * (6.0f * p - 12.0f * p * p)) / r2;
        f.x += coeff * dx;
        f.y += coeff * dy;
        e += eps * (4.0f * (p * p - p) + 127.0f / 4096.0f);
        cnt += 1.0f;
    }

    out_f[i] = f;
    out_pe[i] = e;
    out_count[i] = cnt;
}
"#;

pub struct CudaForceKernel {
    n: usize,
    stream: Arc<CudaStream>,
    module: Arc<CudaModule>,

    pos_dev: CudaSlice<[f32; 2]>,
    f_dev: CudaSlice<[f32; 2]>,
    pe_dev: CudaSlice<f32>,
    count_dev: CudaSlice<f32>,

    f_host: Vec<[f32; 2]>,
    pe_host: Vec<f32>,
    count_host: Vec<f32>,
}

impl CudaForceKernel {
    pub fn new(n: usize) -> Result<Self, BackendError> {
        if n == 0 {
            return Err(BackendError::EmptySystem);
        }

        let ctx = CudaContext::new(0)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let stream = ctx.new_stream().map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;

        let ptx = compile_ptx(KERNEL_SRC)
            .map_err(|e| BackendError::CudaUnavailable(format!("nvrtc compile failed: {e}")))?;
        let module = ctx
            .load_module(ptx)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;

        let pos_dev = stream
            .alloc_zeros::<[f32; 2]>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let f_dev = stream
            .alloc_zeros::<[f32; 2]>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let pe_dev = stream
            .alloc_zeros::<f32>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let count_dev = stream
            .alloc_zeros::<f32>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;

        Ok(Self {
            n,
            stream,
            module,
            pos_dev,
            f_dev,
            pe_dev,
            count_dev,
            f_host: vec![[0.0, 0.0]; n],
            pe_host: vec![0.0; n],
            count_host: vec![0.0; n],
        })
    }
}

impl ForceKernel for CudaForceKernel {
    fn n(&self) -> usize {
        self.n
    }

    fn set_positions(&mut self, pos: &[[f32; 2]]) {
        self.stream
            .memcpy_htod(pos, &mut self.pos_dev)
            .expect("CUDA host-to-device copy of positions failed");
    }

    fn run(&mut self, n_a: usize, pair: PairLjConstants, box_geom: BoxGeometry) {
        let func = self
            .module
            .load_function("lj_force_kernel")
            .expect("lj_force_kernel entry point missing from compiled module");

        let cfg = LaunchConfig {
            grid_dim: ((self.n as u32).div_ceil(LAYOUT_SIZE as u32), 1, 1),
            block_dim: (LAYOUT_SIZE as u32, 1, 1),
            shared_mem_bytes: 0,
        };

        let n = self.n as i32;
        let n_a = n_a as i32;
        let (eps_a, sigma_a, rcut_a) = (pair.epsilon_a as f32, pair.sigma_a as f32, pair.rcut_a as f32);
        let (eps_b, sigma_b, rcut_b) = (pair.epsilon_b as f32, pair.sigma_b as f32, pair.rcut_b as f32);
        let (eps_ab, sigma_ab, rcut_ab) =
            (pair.epsilon_ab as f32, pair.sigma_ab as f32, pair.rcut_ab as f32);
        let length_x = box_geom.length_x() as f32;
        let length_y = box_geom.length_y() as f32;
        let x_periodic = box_geom.x_periodic as i32;
        let y_periodic = box_geom.y_periodic as i32;

        let mut launch_args = self.stream.launch_builder(&func);
        launch_args.arg(&mut self.f_dev);
        launch_args.arg(&mut self.pe_dev);
        launch_args.arg(&mut self.count_dev);
        launch_args.arg(&self.pos_dev);
        launch_args.arg(&n);
        launch_args.arg(&n_a);
        launch_args.arg(&eps_a);
        launch_args.arg(&sigma_a);
        launch_args.arg(&rcut_a);
        launch_args.arg(&eps_b);
        launch_args.arg(&sigma_b);
        launch_args.arg(&rcut_b);
        launch_args.arg(&eps_ab);
        launch_args.arg(&sigma_ab);
        launch_args.arg(&rcut_ab);
        launch_args.arg(&length_x);
        launch_args.arg(&length_y);
        launch_args.arg(&x_periodic);
        launch_args.arg(&y_periodic);

        unsafe { launch_args.launch(cfg) }.expect("lj_force_kernel launch failed");

        self.f_host = self
            .stream
            .memcpy_dtov(&self.f_dev)
            .expect("CUDA device-to-host copy of forces failed");
        self.pe_host = self
            .stream
            .memcpy_dtov(&self.pe_dev)
            .expect("CUDA device-to-host copy of potential energies failed");
        self.count_host = self
            .stream
            .memcpy_dtov(&self.count_dev)
            .expect("CUDA device-to-host copy of neighbor counts failed");
    }

    fn forces(&self) -> &[[f32; 2]] {
        &self.f_host
    }

    fn potential_energies(&self) -> &[f32] {
        &self.pe_host
    }

    fn counts(&self) -> &[f32] {
        &self.count_host
    }
}
