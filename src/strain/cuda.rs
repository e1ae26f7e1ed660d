//! CUDA strain kernel: one thread per atom, same tiling and dispatch
//! shape as [`crate::force::cuda::CudaForceKernel`], the 2x2 matrix
//! solve done in-kernel since it's a fixed-size, branch-free inverse.
//!
//! Grounded on `moldyn/processing/strain_GPU.py` and on
//! `David-OConnor/daedalus`'s CUDA dispatch code for the
//! `CudaStream`/`CudaModule`/`LaunchConfig`/`launch_builder` shape.

use std::sync::Arc;

use cudarc::driver::{CudaContext, CudaModule, CudaSlice, CudaStream, LaunchConfig, PushKernelArg};
use cudarc::nvrtc::compile_ptx;

use super::{StrainKernel, Tensor2};
use crate::constants::LAYOUT_SIZE;
use crate::error::BackendError;
use crate::pbc::BoxGeometry;

const KERNEL_SRC: &str = r#"
extern "C" __global__ void strain_kernel(
    float4* out_eps,
    const float2* pos_t,
    const float2* pos_tprev,
    int n,
    float rcut_strain,
    float length_x, float length_y,
    int x_periodic, int y_periodic)
{
    int i = blockIdx.x * blockDim.x + threadIdx.x;
    if (i >= n) return;

    float2 pit = pos_t[i];
    float2 pitprev = pos_tprev[i];

    float x00 = 0.0f, x01 = 0.0f, x10 = 0.0f, x11 = 0.0f;
    float y00 = 0.0f, y01 = 0.0f, y10 = 0.0f, y11 = 0.0f;

    for (int j = 0; j < n; ++j) {
        if (j == i) continue;

        float dtx = pit.x - pos_t[j].x;
        float dty = pit.y - pos_t[j].y;
        if (x_periodic) {
            float sx = length_x * 0.5f;
            if (dtx > sx) dtx -= length_x; else if (dtx < -sx) dtx += length_x;
        }
        if (y_periodic) {
            float sy = length_y * 0.5f;
            if (dty > sy) dty -= length_y; else if (dty < -sy) dty += length_y;
        }

        if (fabsf(dtx) >= rcut_strain || fabsf(dty) >= rcut_strain) continue;
        float r = sqrtf(dtx * dtx + dty * dty);
        if (r >= rcut_strain) continue;

        float dpx = pitprev.x - pos_tprev[j].x;
        float dpy = pitprev.y - pos_tprev[j].y;
        if (x_periodic) {
            float sx = length_x * 0.5f;
            if (dpx > sx) dpx -= length_x; else if (dpx < -sx) dpx += length_x;
        }
        if (y_periodic) {
            float sy = length_y * 0.5f;
            if (dpy > sy) dpy -= length_y; else if (dpy < -sy) dpy += length_y;
        }

        x00 += dtx * dpx; x01 += dtx * dpy;
        x10 += dty * dpx; x11 += dty * dpy;
        y00 += dpx * dpx; y01 += dpx * dpy;
        y10 += dpy * dpx; y11 += dpy * dpy;
    }

    float det = y00 * y11 - y01 * y10;
    float4 eps;
    if (fabsf(det) < 1e-20f) {
        eps = make_float4(0.0f, 0.0f, 0.0f, 0.0f);
    } else {
        float inv00 = y11 / det, inv01 = -y01 / det;
        float inv10 = -y10 / det, inv11 = y00 / det;
        eps.x = x00 * inv00 + x01 * inv10 - 1.0f;
        eps.y = x00 * inv01 + x01 * inv11;
        eps.z = x10 * inv00 + x11 * inv10;
        eps.w = x10 * inv01 + x11 * inv11 - 1.0f;
    }
    out_eps[i] = eps;
}
"#;

pub struct CudaStrainKernel {
    n: usize,
    stream: Arc<CudaStream>,
    module: Arc<CudaModule>,

    pos_t_dev: CudaSlice<[f32; 2]>,
    pos_tprev_dev: CudaSlice<[f32; 2]>,
    eps_dev: CudaSlice<[f32; 4]>,

    eps_host: Vec<Tensor2>,
}

impl CudaStrainKernel {
    pub fn new(n: usize) -> Result<Self, BackendError> {
        if n == 0 {
            return Err(BackendError::EmptySystem);
        }

        let ctx = CudaContext::new(0).map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let stream = ctx.new_stream().map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;

        let ptx = compile_ptx(KERNEL_SRC)
            .map_err(|e| BackendError::CudaUnavailable(format!("nvrtc compile failed: {e}")))?;
        let module = ctx
            .load_module(ptx)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;

        let pos_t_dev = stream
            .alloc_zeros::<[f32; 2]>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let pos_tprev_dev = stream
            .alloc_zeros::<[f32; 2]>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;
        let eps_dev = stream
            .alloc_zeros::<[f32; 4]>(n)
            .map_err(|e| BackendError::CudaUnavailable(e.to_string()))?;

        Ok(Self {
            n,
            stream,
            module,
            pos_t_dev,
            pos_tprev_dev,
            eps_dev,
            eps_host: vec![super::ZERO_TENSOR; n],
        })
    }
}

impl StrainKernel for CudaStrainKernel {
    fn n(&self) -> usize {
        self.n
    }

    fn set_positions(&mut self, pos_t: &[[f32; 2]], pos_tprev: &[[f32; 2]]) {
        self.stream
            .memcpy_htod(pos_t, &mut self.pos_t_dev)
            .expect("CUDA host-to-device copy of pos_t failed");
        self.stream
            .memcpy_htod(pos_tprev, &mut self.pos_tprev_dev)
            .expect("CUDA host-to-device copy of pos_tprev failed");
    }

    fn run(&mut self, rcut_strain: f32, box_geom: BoxGeometry) {
        let func = self
            .module
            .load_function("strain_kernel")
            .expect("strain_kernel entry point missing from compiled module");

        let cfg = LaunchConfig {
            grid_dim: ((self.n as u32).div_ceil(LAYOUT_SIZE as u32), 1, 1),
            block_dim: (LAYOUT_SIZE as u32, 1, 1),
            shared_mem_bytes: 0,
        };

        let n = self.n as i32;
        let length_x = box_geom.length_x() as f32;
        let length_y = box_geom.length_y() as f32;
        let x_periodic = box_geom.x_periodic as i32;
        let y_periodic = box_geom.y_periodic as i32;

        let mut launch_args = self.stream.launch_builder(&func);
        launch_args.arg(&mut self.eps_dev);
        launch_args.arg(&self.pos_t_dev);
        launch_args.arg(&self.pos_tprev_dev);
        launch_args.arg(&n);
        launch_args.arg(&rcut_strain);
        launch_args.arg(&length_x);
        launch_args.arg(&length_y);
        launch_args.arg(&x_periodic);
        launch_args.arg(&y_periodic);

        unsafe { launch_args.launch(cfg) }.expect("strain_kernel launch failed");

        let flat: Vec<[f32; 4]> = self
            .stream
            .memcpy_dtov(&self.eps_dev)
            .expect("CUDA device-to-host copy of strain tensors failed");
        self.eps_host = flat
            .into_iter()
            .map(|e| [[e[0], e[1]], [e[2], e[3]]])
            .collect();
    }

    fn strains(&self) -> &[Tensor2] {
        &self.eps_host
    }
}
