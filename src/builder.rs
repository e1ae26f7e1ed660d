//! Regular-grid model construction.
//!
//! Grounded on `moldyn/simulation/builder.py::Model.atom_grid` and
//! `moldyn/ui/create_model.py`'s grid wizard.

use rand::Rng;

use crate::model::Model;
use crate::pbc::BoxGeometry;
use crate::species::SpeciesParams;

/// Populates a [`Model`] on a regular `n_x` x `n_y` grid of spacing `d`,
/// lower-left corner at `(-d/2, -d/2)`, and derives the box limits from
/// it the way the original does.
pub struct ModelBuilder {
    species_a: SpeciesParams,
    species_b: SpeciesParams,
    n_x: usize,
    n_y: usize,
    spacing: f64,
    x_a: f64,
}

impl ModelBuilder {
    pub fn new(species_a: SpeciesParams, species_b: SpeciesParams) -> Self {
        Self {
            species_a,
            species_b,
            n_x: 1,
            n_y: 1,
            spacing: 1.0,
            x_a: 1.0,
        }
    }

    /// Grid shape and lattice spacing (m).
    pub fn grid(mut self, n_x: usize, n_y: usize, spacing: f64) -> Self {
        self.n_x = n_x;
        self.n_y = n_y;
        self.spacing = spacing;
        self
    }

    /// Initial mole fraction of species A, clamped to `[0, 1]`.
    pub fn mole_fraction(mut self, x_a: f64) -> Self {
        self.x_a = x_a.clamp(0.0, 1.0);
        self
    }

    /// Build the model. `shuffle`/`rng` interleave species A and B
    /// spatially when `Some`; otherwise A occupies the first `n_a` grid
    /// sites in row-major order.
    pub fn build<R: Rng + ?Sized>(self, rng: Option<&mut R>) -> Model {
        let n = self.n_x * self.n_y;
        let n_a = (self.x_a * n as f64) as usize;
        let n_b = n - n_a;
        let d = self.spacing;

        let x_lim_inf = -0.5 * d;
        let y_lim_inf = -0.5 * d;
        let x_lim_sup = (self.n_x as f64 - 0.5) * d;
        let y_lim_sup = (self.n_y as f64 - 0.5) * d;

        let mut pos = Vec::with_capacity(n);
        for iy in 0..self.n_y {
            for ix in 0..self.n_x {
                pos.push([ix as f64 * d, iy as f64 * d]);
            }
        }

        let box_geom = BoxGeometry::new(x_lim_inf, x_lim_sup, y_lim_inf, y_lim_sup);
        let mut model = Model::new(self.species_a, self.species_b, n_a, n_b, box_geom);
        model.set_pos(pos);

        if let Some(rng) = rng {
            model.shuffle_positions(rng);
        }

        model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn argon() -> SpeciesParams {
        SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26)
    }

    #[test]
    fn grid_produces_expected_box_and_count() {
        let model = ModelBuilder::new(argon(), argon())
            .grid(8, 8, 3.4e-10 * 2f64.powf(1.0 / 6.0))
            .build::<StdRng>(None);
        assert_eq!(model.n(), 64);
        let b = model.box_geom();
        assert!((b.x_lim_inf - (-0.5 * 3.4e-10 * 2f64.powf(1.0 / 6.0))).abs() < 1e-20);
    }

    #[test]
    fn shuffle_preserves_count_and_species_split() {
        let model = ModelBuilder::new(argon(), argon())
            .grid(4, 4, 1.0)
            .mole_fraction(0.5)
            .build(Some(&mut StdRng::seed_from_u64(7)));
        assert_eq!(model.n(), 16);
        assert_eq!(model.n_a(), 8);
    }
}
