//! Local density map: a per-atom area-weighted density estimate.
//!
//! The source (`moldyn/processing/data_proc.py::density`) builds a
//! Voronoi tessellation (via `scipy.spatial.Voronoi`) and takes the
//! reciprocal cell area per atom; no Voronoi crate is part of the
//! teacher's or pack's dependency stack, so this is deliberately an
//! approximation: a neighbor-count-within-radius estimate of local
//! density, `n_neighbors / (pi * r^2)`, which converges to the same
//! quantity for a locally uniform packing and needs no new dependency.

use crate::pbc::BoxGeometry;

/// Local density at each atom, estimated from the count of neighbors
/// within `radius` (minimum-image, same convention as the force
/// kernel).
pub fn local_density(pos: &[[f64; 2]], box_geom: BoxGeometry, radius: f64) -> Vec<f64> {
    let n = pos.len();
    let area = std::f64::consts::PI * radius * radius;
    if area <= 0.0 {
        return vec![0.0; n];
    }

    (0..n)
        .map(|i| {
            let pi = [pos[i][0] as f32, pos[i][1] as f32];
            let mut count = 0.0f64;
            for j in 0..n {
                if i == j {
                    continue;
                }
                let pj = [pos[j][0] as f32, pos[j][1] as f32];
                let d = box_geom.min_image(pi, pj);
                let r = (d[0] * d[0] + d[1] * d[1]).sqrt() as f64;
                if r < radius {
                    count += 1.0;
                }
            }
            count / area
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_grid_gives_roughly_uniform_density() {
        let d = 1.0;
        let mut pos = Vec::new();
        for iy in 0..10 {
            for ix in 0..10 {
                pos.push([ix as f64 * d, iy as f64 * d]);
            }
        }
        let box_geom = BoxGeometry::new(0.0, 10.0 * d, 0.0, 10.0 * d);
        let density = local_density(&pos, box_geom, 2.5 * d);

        // interior atoms should all see roughly the same neighbor count.
        let interior: Vec<f64> = (22..78)
            .filter(|&i| i % 10 != 0 && i % 10 != 9)
            .map(|i| density[i])
            .collect();
        let mean = interior.iter().sum::<f64>() / interior.len() as f64;
        for &rho in &interior {
            assert!((rho - mean).abs() / mean < 0.25);
        }
    }
}
