//! Snapshot archives: positions, velocities, parameters, and optionally
//! the time-series/trajectory of a completed run.
//!
//! Grounded on `moldyn/simulation/data_mng.py`'s `DynState`/`ParamIO`,
//! which persist the same four artifacts into a directory (there, via
//! `pickle`/plain text; here, `serde_json` for parameters and `csv` for
//! the time series).

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ArchiveError, ArchiveResult};
use crate::integrator::TimeSeries;
use crate::model::Model;

/// The model's parameter keys, written as a flat key-value record
/// instead of the source's reflective parameter dict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveParameters {
    /// When this parameter record was written, for provenance when an
    /// archive directory is later zipped and moved around.
    pub created_at: DateTime<Utc>,
    pub n: usize,
    pub n_a: usize,
    pub epsilon_a: f64,
    pub sigma_a: f64,
    pub mass_a: f64,
    pub epsilon_b: f64,
    pub sigma_b: f64,
    pub mass_b: f64,
    pub epsilon_ab: f64,
    pub sigma_ab: f64,
    pub x_lim_inf: f64,
    pub x_lim_sup: f64,
    pub y_lim_inf: f64,
    pub y_lim_sup: f64,
    pub x_periodic: bool,
    pub y_periodic: bool,
    pub dt: f64,
    pub up_zone_lower_limit: f64,
    pub up_apply_force_x: bool,
    pub up_apply_force_y: bool,
    pub low_zone_upper_limit: f64,
    pub frozen_enabled: bool,
    pub gamma: f64,
    pub thermostat_enabled: bool,
}

impl ArchiveParameters {
    pub fn from_model(model: &Model) -> Self {
        let species_a = model.species_a();
        let species_b = model.species_b();
        let pair = model.pair();
        let box_geom = model.box_geom();
        Self {
            created_at: Utc::now(),
            n: model.n(),
            n_a: model.n_a(),
            epsilon_a: species_a.epsilon,
            sigma_a: species_a.sigma,
            mass_a: species_a.mass,
            epsilon_b: species_b.epsilon,
            sigma_b: species_b.sigma,
            mass_b: species_b.mass,
            epsilon_ab: pair.epsilon_ab,
            sigma_ab: pair.sigma_ab,
            x_lim_inf: box_geom.x_lim_inf,
            x_lim_sup: box_geom.x_lim_sup,
            y_lim_inf: box_geom.y_lim_inf,
            y_lim_sup: box_geom.y_lim_sup,
            x_periodic: box_geom.x_periodic,
            y_periodic: box_geom.y_periodic,
            dt: model.dt(),
            up_zone_lower_limit: model.forcing.up_zone_lower_limit,
            up_apply_force_x: model.forcing.apply_force_x,
            up_apply_force_y: model.forcing.apply_force_y,
            low_zone_upper_limit: model.frozen.low_zone_upper_limit,
            frozen_enabled: model.frozen.enabled,
            gamma: model.thermostat.gamma,
            thermostat_enabled: model.thermostat.enabled,
        }
    }
}

/// Writes the four named artifacts of a run into `dir`, creating it if
/// needed. `state_functions` and `position_history` are optional.
pub struct ArchiveWriter {
    dir: std::path::PathBuf,
}

impl ArchiveWriter {
    pub fn new(dir: impl AsRef<Path>) -> ArchiveResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| ArchiveError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        Ok(Self { dir })
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.join(name)
    }

    fn write_raw_f32(&self, name: &str, pos: &[[f64; 2]]) -> ArchiveResult<()> {
        let path = self.path(name);
        let mut w = BufWriter::new(File::create(&path).map_err(|e| ArchiveError::Io {
            path: path.display().to_string(),
            source: e,
        })?);
        for p in pos {
            w.write_all(&(p[0] as f32).to_le_bytes())
                .and_then(|_| w.write_all(&(p[1] as f32).to_le_bytes()))
                .map_err(|e| ArchiveError::Io {
                    path: path.display().to_string(),
                    source: e,
                })?;
        }
        Ok(())
    }

    pub fn write_positions(&self, model: &Model) -> ArchiveResult<()> {
        self.write_raw_f32("positions", model.pos())
    }

    pub fn write_velocities(&self, model: &Model) -> ArchiveResult<()> {
        self.write_raw_f32("velocities", model.vel())
    }

    pub fn write_parameters(&self, model: &Model) -> ArchiveResult<()> {
        let path = self.path("parameters");
        let params = ArchiveParameters::from_model(model);
        let json = serde_json::to_string_pretty(&params)?;
        fs::write(&path, json).map_err(|e| ArchiveError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    /// Writes the time-series dictionary (T, T_target, EC, EP, ET,
    /// bonds, time, iters) as CSV, one row per recorded step.
    pub fn write_state_functions(&self, series: &TimeSeries) -> ArchiveResult<()> {
        let path = self.path("state_functions");
        let mut w = csv::Writer::from_path(&path)?;
        w.write_record([
            "iter", "time", "temperature", "temperature_target", "ec", "ep", "et", "bonds",
        ])?;
        for i in 0..series.iters.len() {
            w.write_record(&[
                series.iters[i].to_string(),
                series.time[i].to_string(),
                series.temperature[i].to_string(),
                series.temperature_target[i].to_string(),
                series.kinetic_energy[i].to_string(),
                series.potential_energy[i].to_string(),
                series.total_energy[i].to_string(),
                series.mean_neighbor_count[i].to_string(),
            ])?;
        }
        w.flush().map_err(|e| ArchiveError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Ok(())
    }

    /// Writes the per-step trajectory as the canonical raw, unframed
    /// `f32` stream.
    pub fn write_position_history(&self, history: &[Vec<[f32; 2]>]) -> ArchiveResult<()> {
        let path = self.path("position_history");
        let mut w = BufWriter::new(File::create(&path).map_err(|e| ArchiveError::Io {
            path: path.display().to_string(),
            source: e,
        })?);
        for frame in history {
            for p in frame {
                w.write_all(&p[0].to_le_bytes())
                    .and_then(|_| w.write_all(&p[1].to_le_bytes()))
                    .map_err(|e| ArchiveError::Io {
                        path: path.display().to_string(),
                        source: e,
                    })?;
            }
        }
        Ok(())
    }
}
