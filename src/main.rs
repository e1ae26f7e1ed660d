//! Demo binary: runs a two-atom Argon oscillation and prints a short
//! energy-conservation summary.

use log::info;
use moldyn2d::species::SpeciesParams;
use moldyn2d::{BoxGeometry, Integrator, Model};

fn main() {
    env_logger::init();

    let argon = SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26);
    let re = argon.re();

    let mut model = Model::new(argon, argon, 2, 0, BoxGeometry::new(-1e-6, 1e-6, -1e-6, 1e-6));
    model.set_pos(vec![[0.0, 0.0], [re, 0.0]]);

    info!("running {} steps at dt = {:e}", 1000, model.dt());

    let mut integrator = Integrator::new(&model);
    integrator.step(1000, |it| {
        if it.current_iter() % 200 == 0 {
            let series = it.time_series();
            let last = series.total_energy.len() - 1;
            info!(
                "iter {:>5}  T={:.3}  ET={:.6e}",
                it.current_iter(),
                series.temperature[last],
                series.total_energy[last]
            );
        }
    });

    let series = integrator.time_series();
    let et_max = series.total_energy.iter().cloned().fold(f64::MIN, f64::max);
    let et_min = series.total_energy.iter().cloned().fold(f64::MAX, f64::min);
    println!("total energy drift over run: {:.3e}", et_max - et_min);

    let final_pos = integrator.model().pos();
    let dx = final_pos[1][0] - final_pos[0][0];
    let dy = final_pos[1][1] - final_pos[0][1];
    println!("final separation: {:.6e} m (re = {:.6e} m)", (dx * dx + dy * dy).sqrt(), re);
}
