//! The Verlet integrator: half-drift / force / kick / half-drift, with
//! thermostat, external forcing, and a frozen region.
//!
//! Grounded on `moldyn/simulation/integrator.py`'s `Integrator.step`,
//! restated with the force kernel behind the [`crate::force::ForceKernel`]
//! trait and the time series as an explicit struct instead of parallel
//! Python lists.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::constants::K_B;
use crate::force::{self, ForceKernel};
use crate::model::Model;
use crate::profile::Profile;
use crate::snapshot::{StepState, TrajectorySink};

/// The per-step time series the integrator appends to.
#[derive(Debug, Clone, Default)]
pub struct TimeSeries {
    pub temperature: Vec<f64>,
    pub temperature_target: Vec<f64>,
    pub kinetic_energy: Vec<f64>,
    pub potential_energy: Vec<f64>,
    pub total_energy: Vec<f64>,
    pub mean_neighbor_count: Vec<f64>,
    pub time: Vec<f64>,
    pub iters: Vec<u64>,
}

impl TimeSeries {
    fn push(&mut self, s: StepState) {
        self.temperature.push(s.temperature);
        self.temperature_target.push(s.temperature_target);
        self.kinetic_energy.push(s.kinetic_energy);
        self.potential_energy.push(s.potential_energy);
        self.total_energy.push(s.total_energy);
        self.mean_neighbor_count.push(s.mean_neighbor_count);
        self.time.push(s.time);
        self.iters.push(s.iter);
    }
}

/// Orchestrates one or many Verlet steps over a working copy of a
/// [`Model`]. The caller's model is never mutated; a frozen `reference`
/// copy is kept alongside for later strain analysis.
pub struct Integrator {
    model: Model,
    reference: Model,
    force_kernel: Box<dyn ForceKernel>,

    current_iter: u64,
    f: Vec<[f32; 2]>,
    pe: Vec<f32>,
    count: Vec<f32>,

    /// `true` where the atom is free to move; `false` where it is
    /// pinned for the whole run.
    mobile_mask: Vec<bool>,

    temperature_profile: Profile,
    force_profile_x: Profile,
    force_profile_y: Profile,

    series: TimeSeries,
    trajectory_sink: Option<Box<dyn TrajectorySink>>,

    rng: StdRng,
}

fn to_f32_positions(model: &Model) -> Vec<[f32; 2]> {
    model
        .pos()
        .iter()
        .map(|p| [p[0] as f32, p[1] as f32])
        .collect()
}

fn compute_mobile_mask(model: &Model) -> Vec<bool> {
    (0..model.n())
        .map(|i| !model.frozen.enabled || model.pos()[i][1] > model.frozen.low_zone_upper_limit)
        .collect()
}

/// Microscopic kinetic energy and temperature, with the optional
/// rotative correction active when an x-forcing region is in play and
/// the y-axis is open.
fn kinetic_state(model: &Model) -> (f64, f64) {
    let n = model.n();
    if n == 0 {
        return (0.0, 0.0);
    }
    let box_geom = model.box_geom();
    let rotative_active = model.forcing.apply_force_x && !box_geom.y_periodic;
    let y_mid = box_geom.y_mid();
    let mean = model.mean_velocity();

    let rot_factor = if rotative_active {
        let sum: f64 = (0..n)
            .map(|i| {
                let denom = model.pos()[i][1] - y_mid;
                if denom.abs() < 1e-300 {
                    0.0
                } else {
                    model.vel()[i][0] / denom
                }
            })
            .sum();
        sum / n as f64
    } else {
        0.0
    };

    let ec: f64 = (0..n)
        .map(|i| {
            let v = model.vel()[i];
            let rot_i = if rotative_active {
                rot_factor * (model.pos()[i][1] - y_mid)
            } else {
                0.0
            };
            let dvx = v[0] - mean[0] - rot_i;
            let dvy = v[1] - mean[1];
            0.5 * model.mass_of(i) * (dvx * dvx + dvy * dvy)
        })
        .sum();

    let t = ec / (K_B * n as f64);
    (ec, t)
}

impl Integrator {
    /// Build an integrator over a deep copy of `model`, preferring the
    /// GPU backend when available and falling back to CPU otherwise.
    pub fn new(model: &Model) -> Self {
        Self::with_backend(model, true)
    }

    /// Build an integrator that never attempts the GPU backend.
    pub fn new_cpu_only(model: &Model) -> Self {
        Self::with_backend(model, false)
    }

    fn with_backend(model: &Model, prefer_gpu: bool) -> Self {
        let working = model.clone();
        let reference = model.clone();
        let n = working.n();

        let force_kernel: Box<dyn ForceKernel> = if prefer_gpu {
            force::select_backend(n)
        } else {
            Box::new(force::cpu::CpuForceKernel::new(n))
        };

        let mobile_mask = compute_mobile_mask(&working);

        Self {
            f: vec![[0.0, 0.0]; n],
            pe: vec![0.0; n],
            count: vec![0.0; n],
            mobile_mask,
            temperature_profile: Profile::constant(0.0),
            force_profile_x: Profile::constant(0.0),
            force_profile_y: Profile::constant(0.0),
            series: TimeSeries::default(),
            trajectory_sink: None,
            rng: StdRng::from_os_rng(),
            model: working,
            reference,
            force_kernel,
            current_iter: 0,
        }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The frozen copy of the model as it was when the integrator was
    /// constructed, retained for later strain analysis.
    pub fn reference(&self) -> &Model {
        &self.reference
    }

    pub fn current_iter(&self) -> u64 {
        self.current_iter
    }

    pub fn time_series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn forces(&self) -> &[[f32; 2]] {
        &self.f
    }

    pub fn set_trajectory_sink(&mut self, sink: Box<dyn TrajectorySink>) {
        self.trajectory_sink = Some(sink);
    }

    /// Install a piecewise-linear thermostat target `T(t)`. Fewer than
    /// two points leaves the previous profile in place.
    pub fn set_temperature_profile(&mut self, t_points: &[f64], temp_points: &[f64]) {
        self.temperature_profile.set_points(t_points, temp_points);
    }

    pub fn set_force_profile_x(&mut self, t_points: &[f64], f_points: &[f64]) {
        self.force_profile_x.set_points(t_points, f_points);
    }

    pub fn set_force_profile_y(&mut self, t_points: &[f64], f_points: &[f64]) {
        self.force_profile_y.set_points(t_points, f_points);
    }

    /// Advance `n` integration steps, invoking `on_step` after each.
    /// A no-op when the model has no atoms.
    pub fn step<F: FnMut(&Integrator)>(&mut self, n: u64, mut on_step: F) {
        if self.model.n() == 0 {
            return;
        }
        for _ in 0..n {
            self.step_once();
            on_step(self);
        }
    }

    fn step_once(&mut self) {
        let dt = self.model.dt();
        let n = self.model.n();
        let box_geom = self.model.box_geom();

        // 1. Drift 1/2.
        for i in 0..n {
            let v = self.model.vel()[i];
            let p = self.model.pos_mut();
            p[i][0] += v[0] * (dt / 2.0);
            p[i][1] += v[1] * (dt / 2.0);
        }

        // 2. Wrap into the box along periodic axes only.
        if box_geom.x_periodic || box_geom.y_periodic {
            for i in 0..n {
                self.model.pos_mut()[i] = box_geom.wrap(self.model.pos()[i]);
            }
        }

        // 3. Force evaluation.
        let pos_f32 = to_f32_positions(&self.model);
        self.force_kernel.set_positions(&pos_f32);
        self.force_kernel
            .run(self.model.n_a(), self.model.pair(), box_geom);
        self.f.copy_from_slice(self.force_kernel.forces());
        self.pe.copy_from_slice(self.force_kernel.potential_energies());
        self.count.copy_from_slice(self.force_kernel.counts());

        // 4. Kinetic quantities.
        let (mut ec, mut t) = kinetic_state(&self.model);

        // 5. Potential energy (halved: every ordered pair is visited twice).
        let ep: f64 = 0.5 * self.pe.iter().map(|&e| e as f64).sum::<f64>();

        let time = self.current_iter as f64 * dt;
        let t_target = self.temperature_profile.eval(time);

        // Zero-velocity tie-break: a one-shot normal seed before scaling
        if ec == 0.0 && self.model.thermostat.enabled && t_target > 0.0 {
            self.model.randomize_velocities(&mut self.rng);
            let (ec2, t2) = kinetic_state(&self.model);
            ec = ec2;
            t = t2;
        }

        let beta = if self.model.thermostat.enabled && t > 0.0 {
            (1.0 + self.model.thermostat.gamma * (t_target / t - 1.0)).sqrt()
        } else {
            1.0
        };

        // 6. Kick.
        for i in 0..n {
            if !self.mobile_mask[i] {
                continue;
            }
            let y = self.model.pos()[i][1];
            let up = y > self.model.forcing.up_zone_lower_limit;
            let mut fx = 0.0;
            let mut fy = 0.0;
            if up {
                if self.model.forcing.apply_force_x {
                    fx = self.force_profile_x.eval(time);
                }
                if self.model.forcing.apply_force_y {
                    fy = self.force_profile_y.eval(time);
                }
            }

            let m = self.model.mass_of(i);
            let v = self.model.vel()[i];
            let new_v = [
                beta * (v[0] + (self.f[i][0] as f64 + fx) * (dt / m)),
                beta * (v[1] + (self.f[i][1] as f64 + fy) * (dt / m)),
            ];
            self.model.vel_mut()[i] = new_v;
        }

        // 7. Drift 1/2.
        for i in 0..n {
            let v = self.model.vel()[i];
            let p = self.model.pos_mut();
            p[i][0] += v[0] * (dt / 2.0);
            p[i][1] += v[1] * (dt / 2.0);
        }

        // 8. Record.
        let mean_count = self.count.iter().map(|&c| c as f64).sum::<f64>() / (2.0 * n as f64);
        let state = StepState {
            iter: self.current_iter,
            time,
            temperature: t,
            temperature_target: t_target,
            kinetic_energy: ec,
            potential_energy: ep,
            total_energy: ec + ep,
            mean_neighbor_count: mean_count,
        };
        self.series.push(state);

        if let Some(sink) = self.trajectory_sink.as_mut() {
            let pos_f32 = to_f32_positions(&self.model);
            let _ = sink.record(&pos_f32);
        }

        self.current_iter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbc::BoxGeometry;
    use crate::species::SpeciesParams;

    fn argon() -> SpeciesParams {
        SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26)
    }

    /// Two-atom oscillation at the equilibrium separation: energy
    /// drift stays small and the interatomic distance stays within
    /// [0.9, 1.1] * re.
    #[test]
    fn two_atom_oscillation_conserves_energy() {
        let a = argon();
        let re = a.re();
        let mut model = Model::new(a, a, 2, 0, BoxGeometry::new(-1e-6, 1e-6, -1e-6, 1e-6));
        model.set_pos(vec![[0.0, 0.0], [re, 0.0]]);
        model.set_vel(vec![[0.0, 0.0], [0.0, 0.0]]);

        let mut integrator = Integrator::new_cpu_only(&model);
        integrator.step(1000, |_| {});

        let series = integrator.time_series();
        let et_max = series.total_energy.iter().cloned().fold(f64::MIN, f64::max);
        let et_min = series.total_energy.iter().cloned().fold(f64::MAX, f64::min);
        let ec0 = series.kinetic_energy[0].max(series.potential_energy[0].abs());
        assert!((et_max - et_min).abs() < 0.05 * ec0.max(1e-30) || (et_max - et_min).abs() < 1e-25);

        let final_pos = integrator.model().pos();
        let dx = final_pos[1][0] - final_pos[0][0];
        let dy = final_pos[1][1] - final_pos[0][1];
        let r = (dx * dx + dy * dy).sqrt();
        assert!(r > 0.9 * re && r < 1.1 * re);
    }

    /// Thermostat convergence within O(1/gamma) steps to a band around
    /// T_target, on an 8x8 Argon grid.
    #[test]
    fn thermostat_converges_toward_target() {
        let a = argon();
        let spacing = a.re();
        let mut model = Model::new(
            a,
            a,
            64,
            0,
            BoxGeometry::new(-0.5 * spacing, 7.5 * spacing, -0.5 * spacing, 7.5 * spacing),
        );
        let mut pos = Vec::new();
        for iy in 0..8 {
            for ix in 0..8 {
                pos.push([ix as f64 * spacing, iy as f64 * spacing]);
            }
        }
        model.set_pos(pos);
        model.set_periodic(true, true);
        model.thermostat.enabled = true;
        model.thermostat.gamma = 0.5;

        let mut integrator = Integrator::new_cpu_only(&model);
        integrator.set_temperature_profile(&[0.0, 1.0], &[50.0, 50.0]);
        integrator.step(2000, |_| {});

        let series = integrator.time_series();
        let last = &series.temperature[series.temperature.len() - 500..];
        let mean: f64 = last.iter().sum::<f64>() / last.len() as f64;
        assert!(mean > 45.0 && mean < 55.0);
    }

    /// Frozen atoms keep their initial velocity exactly, every step.
    #[test]
    fn frozen_region_pins_velocity() {
        let a = argon();
        let mut model = Model::new(a, a, 4, 0, BoxGeometry::new(-1e-6, 1e-6, -2e-9, 2e-9));
        model.set_pos(vec![
            [0.0, -1e-9],
            [a.re(), -1e-9],
            [0.0, 1e-9],
            [a.re(), 1e-9],
        ]);
        model.set_vel(vec![[0.0, 0.0]; 4]);
        model.frozen.enabled = true;
        model.frozen.low_zone_upper_limit = 0.0;

        let mut integrator = Integrator::new_cpu_only(&model);
        integrator.step(50, |it| {
            assert_eq!(it.model().vel()[0], [0.0, 0.0]);
            assert_eq!(it.model().vel()[1], [0.0, 0.0]);
        });
    }

    /// An atom crossing x_lim_sup under periodic x reappears at
    /// x_lim_inf + (x - x_lim_sup) within one step.
    #[test]
    fn periodic_wrap_reappears_at_opposite_edge() {
        let a = argon();
        let mut model = Model::new(a, a, 1, 0, BoxGeometry::new(0.0, 10.0, -1e3, 1e3));
        let eps = 0.2;
        model.set_pos(vec![[10.0 - eps, 0.0]]);
        model.set_vel(vec![[1.0, 0.0]]);
        model.set_periodic(true, false);
        model.set_timestep(2.0 * eps + 1e-3);

        let mut integrator = Integrator::new_cpu_only(&model);
        integrator.step(1, |_| {});

        let x = integrator.model().pos()[0][0];
        assert!(x >= 0.0 && x < 10.0);
    }

    #[test]
    fn n_zero_step_is_a_no_op() {
        let a = argon();
        let model = Model::new(a, a, 0, 0, BoxGeometry::new(0.0, 1.0, 0.0, 1.0));
        let mut integrator = Integrator::new_cpu_only(&model);
        integrator.step(10, |_| {});
        assert_eq!(integrator.current_iter(), 0);
        assert!(integrator.time_series().time.is_empty());
    }
}
