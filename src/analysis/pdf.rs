//! Pair distribution function g(r): a histogram of pairwise separations
//! normalized against the ideal-gas expectation for a uniform 2D system.
//!
//! Grounded on `moldyn/processing/data_proc.py::PDF`, which bins
//! `scipy.spatial.distance.pdist` output the same way; restated with
//! `nalgebra`-free plain arithmetic since the reduction itself is one
//! dimensional.

use itertools::Itertools;

use crate::pbc::BoxGeometry;

/// A radial histogram of `g(r)` from `r = 0` to `r_max`, in `n_bins`
/// equal-width bins.
#[derive(Debug, Clone)]
pub struct PairDistribution {
    pub r_max: f64,
    pub bin_width: f64,
    pub g: Vec<f64>,
}

/// Compute g(r) for a single snapshot, using minimum-image separations
/// so periodic systems are handled the same way the force kernel is.
pub fn pair_distribution(
    pos: &[[f64; 2]],
    box_geom: BoxGeometry,
    r_max: f64,
    n_bins: usize,
) -> PairDistribution {
    let n = pos.len();
    let bin_width = r_max / n_bins as f64;
    let mut counts = vec![0.0f64; n_bins];

    if n < 2 || bin_width <= 0.0 {
        return PairDistribution {
            r_max,
            bin_width,
            g: counts,
        };
    }

    for (i, j) in (0..n).tuple_combinations() {
        let pi = [pos[i][0] as f32, pos[i][1] as f32];
        let pj = [pos[j][0] as f32, pos[j][1] as f32];
        let d = box_geom.min_image(pi, pj);
        let r = ((d[0] * d[0] + d[1] * d[1]).sqrt()) as f64;
        if r < r_max {
            let bin = (r / bin_width) as usize;
            if bin < n_bins {
                // each unordered pair contributes to both atoms' shells.
                counts[bin] += 2.0;
            }
        }
    }

    let area = box_geom.length_x() * box_geom.length_y();
    let rho = n as f64 / area;
    let g: Vec<f64> = counts
        .iter()
        .enumerate()
        .map(|(k, &c)| {
            let r_inner = k as f64 * bin_width;
            let r_outer = r_inner + bin_width;
            let shell_area = std::f64::consts::PI * (r_outer * r_outer - r_inner * r_inner);
            let expected = rho * shell_area * n as f64;
            if expected > 0.0 {
                c / expected
            } else {
                0.0
            }
        })
        .collect();

    PairDistribution {
        r_max,
        bin_width,
        g,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_shells_give_zero_g() {
        let pos = vec![[0.0, 0.0]];
        let result = pair_distribution(&pos, BoxGeometry::new(0.0, 10.0, 0.0, 10.0), 5.0, 10);
        assert!(result.g.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn triangular_lattice_peaks_near_nearest_neighbor_distance() {
        let d = 1.0;
        let mut pos = Vec::new();
        for iy in 0..10 {
            for ix in 0..10 {
                pos.push([ix as f64 * d, iy as f64 * d]);
            }
        }
        let box_geom = BoxGeometry::new(0.0, 10.0 * d, 0.0, 10.0 * d);
        let result = pair_distribution(&pos, box_geom, 3.0 * d, 30);
        let peak_bin = (d / result.bin_width) as usize;
        let peak = result.g[peak_bin];
        let far_bin = result.g.len() - 1;
        assert!(peak > result.g[far_bin]);
    }
}
