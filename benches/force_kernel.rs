use criterion::{black_box, criterion_group, criterion_main, Criterion};

use moldyn2d::force::cpu::CpuForceKernel;
use moldyn2d::force::{self, ForceKernel};
use moldyn2d::species::{PairLjConstants, SpeciesParams};
use moldyn2d::BoxGeometry;

fn grid(n_x: usize, n_y: usize, d: f32) -> Vec<[f32; 2]> {
    let mut pos = Vec::with_capacity(n_x * n_y);
    for iy in 0..n_y {
        for ix in 0..n_x {
            pos.push([ix as f32 * d, iy as f32 * d]);
        }
    }
    pos
}

fn bench_force_kernel_32x32(c: &mut Criterion) {
    let argon = SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26);
    let pair = PairLjConstants::from_species_kong(argon, argon);
    let d = argon.re() as f32;
    let pos = grid(32, 32, d);
    let box_geom = BoxGeometry::new(0.0, 32.0 * d as f64, 0.0, 32.0 * d as f64);
    let mut kernel = CpuForceKernel::new(pos.len());

    c.bench_function("force_kernel_cpu_32x32", |b| {
        b.iter(|| {
            black_box(force::compute_once(
                &mut kernel,
                black_box(&pos),
                pos.len() / 2,
                pair,
                box_geom,
            ))
        })
    });
}

criterion_group!(benches, bench_force_kernel_32x32);
criterion_main!(benches);
