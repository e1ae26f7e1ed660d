//! The physical state and static parameters of a run.
//!
//! A value container with parameter-coherence logic only, no force
//! evaluation, no integration. Grounded on `moldyn/simulation/builder.py`'s
//! `Model` class, restated as explicit typed fields with derived
//! accessors instead of a reflective `__getattr__`/`params` dict.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::constants::K_B;
use crate::pbc::BoxGeometry;
use crate::species::{PairLjConstants, SpeciesParams};

/// Which species an atom index belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Species {
    A,
    B,
}

/// The region of the box that receives an external body force.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForcingZone {
    /// Atoms with `y > up_zone_lower_limit` receive the external force.
    pub up_zone_lower_limit: f64,
    pub apply_force_x: bool,
    pub apply_force_y: bool,
}

impl Default for ForcingZone {
    fn default() -> Self {
        Self {
            up_zone_lower_limit: f64::INFINITY,
            apply_force_x: false,
            apply_force_y: false,
        }
    }
}

/// The region of the box immobilized for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrozenZone {
    pub enabled: bool,
    /// Atoms with initial `y > low_zone_upper_limit` stay mobile; the
    /// rest are frozen for the whole run.
    pub low_zone_upper_limit: f64,
}

impl Default for FrozenZone {
    fn default() -> Self {
        Self {
            enabled: false,
            low_zone_upper_limit: f64::NEG_INFINITY,
        }
    }
}

/// Velocity-rescale thermostat coupling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thermostat {
    pub enabled: bool,
    pub gamma: f64,
}

impl Default for Thermostat {
    fn default() -> Self {
        Self {
            enabled: false,
            gamma: 0.5,
        }
    }
}

/// Full physical state and static parameters of a 2D two-species LJ
/// system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pos: Vec<[f64; 2]>,
    vel: Vec<[f64; 2]>,
    n_a: usize,

    species_a: SpeciesParams,
    species_b: SpeciesParams,
    pair: PairLjConstants,

    box_geom: BoxGeometry,
    dt: f64,

    pub forcing: ForcingZone,
    pub frozen: FrozenZone,
    pub thermostat: Thermostat,
}

impl Model {
    /// Build a model with zeroed positions/velocities, `n_a` atoms of
    /// species A followed by `n_b` atoms of species B.
    pub fn new(
        species_a: SpeciesParams,
        species_b: SpeciesParams,
        n_a: usize,
        n_b: usize,
        box_geom: BoxGeometry,
    ) -> Self {
        let n = n_a + n_b;
        let pair = PairLjConstants::from_species_kong(species_a, species_b);
        let mut model = Self {
            pos: vec![[0.0, 0.0]; n],
            vel: vec![[0.0, 0.0]; n],
            n_a,
            species_a,
            species_b,
            pair,
            box_geom,
            dt: 0.0,
            forcing: ForcingZone::default(),
            frozen: FrozenZone::default(),
            thermostat: Thermostat::default(),
        };
        model.dt = model.decent_dt();
        model
    }

    // -- basic shape -----------------------------------------------------

    pub fn n(&self) -> usize {
        self.pos.len()
    }

    pub fn n_a(&self) -> usize {
        self.n_a
    }

    pub fn n_b(&self) -> usize {
        self.n() - self.n_a
    }

    /// `x_a = N_A / N`, clamped to `[0, 1]`.
    pub fn x_a(&self) -> f64 {
        if self.n() == 0 {
            0.0
        } else {
            (self.n_a as f64 / self.n() as f64).clamp(0.0, 1.0)
        }
    }

    pub fn species_of(&self, i: usize) -> Species {
        if i < self.n_a {
            Species::A
        } else {
            Species::B
        }
    }

    pub fn mass_of(&self, i: usize) -> f64 {
        match self.species_of(i) {
            Species::A => self.species_a.mass,
            Species::B => self.species_b.mass,
        }
    }

    /// Total system mass, `N_A m_A + N_B m_B`.
    pub fn mass_total(&self) -> f64 {
        self.n_a as f64 * self.species_a.mass + self.n_b() as f64 * self.species_b.mass
    }

    // -- positions / velocities -------------------------------------------

    pub fn pos(&self) -> &[[f64; 2]] {
        &self.pos
    }

    pub fn pos_mut(&mut self) -> &mut [[f64; 2]] {
        &mut self.pos
    }

    pub fn set_pos(&mut self, pos: Vec<[f64; 2]>) {
        assert_eq!(pos.len(), self.n(), "position array length must match N");
        self.pos = pos;
    }

    pub fn vel(&self) -> &[[f64; 2]] {
        &self.vel
    }

    pub fn vel_mut(&mut self) -> &mut [[f64; 2]] {
        &mut self.vel
    }

    pub fn set_vel(&mut self, vel: Vec<[f64; 2]>) {
        assert_eq!(vel.len(), self.n(), "velocity array length must match N");
        self.vel = vel;
    }

    /// In-place Fisher-Yates shuffle of the position array, so the two
    /// species mix spatially under a fixed contiguous species split
    /// (`moldyn/simulation/builder.py::shuffle_atoms`).
    pub fn shuffle_positions<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let n = self.pos.len();
        for i in (1..n).rev() {
            let j = rng.random_range(0..=i);
            self.pos.swap(i, j);
        }
    }

    /// Draw independent standard-normal velocities for every atom/axis
    /// (`moldyn/simulation/builder.py::random_speed`).
    pub fn randomize_velocities<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for v in self.vel.iter_mut() {
            v[0] = StandardNormal.sample(rng);
            v[1] = StandardNormal.sample(rng);
        }
    }

    // -- species / pair parameters ----------------------------------------

    pub fn species_a(&self) -> SpeciesParams {
        self.species_a
    }

    pub fn species_b(&self) -> SpeciesParams {
        self.species_b
    }

    pub fn pair(&self) -> PairLjConstants {
        self.pair
    }

    pub fn set_species_a(&mut self, params: SpeciesParams) {
        self.species_a = params;
        self.pair = PairLjConstants::from_species_kong(self.species_a, self.species_b);
    }

    pub fn set_species_b(&mut self, params: SpeciesParams) {
        self.species_b = params;
        self.pair = PairLjConstants::from_species_kong(self.species_a, self.species_b);
    }

    /// Override the AB pair parameters directly, bypassing Kong mixing.
    /// Once set this way, AB is a constant pair parameter.
    pub fn set_ab_override(&mut self, epsilon_ab: f64, sigma_ab: f64) {
        self.pair =
            PairLjConstants::from_species_with_ab(self.species_a, self.species_b, epsilon_ab, sigma_ab);
    }

    // -- box geometry -------------------------------------------------------

    pub fn box_geom(&self) -> BoxGeometry {
        self.box_geom
    }

    pub fn set_x_lim(&mut self, inf: f64, sup: f64) {
        self.box_geom.set_x_lim(inf, sup);
    }

    pub fn set_y_lim(&mut self, inf: f64, sup: f64) {
        self.box_geom.set_y_lim(inf, sup);
    }

    pub fn set_periodic(&mut self, x: bool, y: bool) {
        self.box_geom.x_periodic = x;
        self.box_geom.y_periodic = y;
    }

    // -- timestep -------------------------------------------------------------

    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Set the integration timestep; always stored as `|dt|`.
    pub fn set_timestep(&mut self, dt: f64) {
        self.dt = dt.abs();
    }

    /// `period/50` where
    /// `period = 2*pi*sqrt(m_min * sigma_min^2 / (57.1464 * epsilon_max))`
    /// taken across {A, B, AB}.
    pub fn decent_dt(&self) -> f64 {
        let m_min = self.species_a.mass.min(self.species_b.mass);
        let sigma_min = self
            .species_a
            .sigma
            .min(self.species_b.sigma)
            .min(self.pair.sigma_ab);
        let epsilon_max = self
            .species_a
            .epsilon
            .max(self.species_b.epsilon)
            .max(self.pair.epsilon_ab);

        let period =
            2.0 * std::f64::consts::PI * (m_min * sigma_min * sigma_min / (57.1464 * epsilon_max)).sqrt();
        period / 50.0
    }

    // -- derived kinetic quantities -------------------------------------------

    /// Total kinetic energy `EC_total = 1/2 sum m_i (v_i . v_i)`.
    pub fn kinetic_energy_total(&self) -> f64 {
        (0..self.n())
            .map(|i| {
                let v = self.vel[i];
                0.5 * self.mass_of(i) * (v[0] * v[0] + v[1] * v[1])
            })
            .sum()
    }

    /// Mean velocity `<v> = (1/N) sum v_i`.
    pub fn mean_velocity(&self) -> [f64; 2] {
        let n = self.n();
        if n == 0 {
            return [0.0, 0.0];
        }
        let (mut sx, mut sy) = (0.0, 0.0);
        for v in &self.vel {
            sx += v[0];
            sy += v[1];
        }
        [sx / n as f64, sy / n as f64]
    }

    /// Frame-independent microscopic kinetic energy: subtracts the mean
    /// velocity before summing.
    pub fn kinetic_energy_microscopic(&self) -> f64 {
        let mean = self.mean_velocity();
        (0..self.n())
            .map(|i| {
                let v = self.vel[i];
                let dvx = v[0] - mean[0];
                let dvy = v[1] - mean[1];
                0.5 * self.mass_of(i) * (dvx * dvx + dvy * dvy)
            })
            .sum()
    }

    /// `T = EC / (kB * N)` using the microscopic kinetic energy (2D,
    /// two degrees of freedom per atom, no explicit 1/2 per dof).
    pub fn temperature(&self) -> f64 {
        if self.n() == 0 {
            return 0.0;
        }
        self.kinetic_energy_microscopic() / (K_B * self.n() as f64)
    }

    /// Rescale velocities to reach `target` kelvin. If the system is
    /// currently at `T == 0`, seeds a one-shot standard-normal velocity
    /// draw first.
    pub fn set_temperature<R: Rng + ?Sized>(&mut self, target: f64, rng: &mut R) {
        if self.temperature() == 0.0 {
            if target <= 0.0 {
                return;
            }
            self.randomize_velocities(rng);
        }
        let current = self.temperature();
        if current <= 0.0 {
            return;
        }
        let scale = (target / current).sqrt();
        for v in self.vel.iter_mut() {
            v[0] *= scale;
            v[1] *= scale;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn argon() -> SpeciesParams {
        SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26)
    }

    #[test]
    fn mass_total_matches_species_split() {
        let a = argon();
        let b = SpeciesParams::new(1.2e-21, 3.0e-10, 5.0e-26);
        let model = Model::new(a, b, 3, 5, BoxGeometry::new(0.0, 10.0, 0.0, 10.0));
        assert_relative_eq!(model.mass_total(), 3.0 * a.mass + 5.0 * b.mass);
    }

    #[test]
    fn set_temperature_from_rest_gives_target_within_tolerance() {
        let a = argon();
        let mut model = Model::new(a, a, 32, 32, BoxGeometry::new(0.0, 10.0, 0.0, 10.0));
        let mut rng = StdRng::seed_from_u64(42);
        assert_eq!(model.temperature(), 0.0);
        model.set_temperature(50.0, &mut rng);
        assert!(model.temperature() > 0.0);
        assert_relative_eq!(model.temperature(), 50.0, max_relative = 1e-6);
    }

    #[test]
    fn length_nonnegative_after_limit_changes() {
        let a = argon();
        let mut model = Model::new(a, a, 1, 1, BoxGeometry::new(0.0, 10.0, 0.0, 10.0));
        model.set_x_lim(5.0, -5.0);
        assert!(model.box_geom().length_x() >= 0.0);
    }
}
