//! Physical constants shared across the crate.

/// Boltzmann constant, J/K (SI).
pub const K_B: f64 = 1.380_648_52e-23;

/// Default cutoff multiplier: `rcut = RCUT_FACT * re`. At this separation
/// `p = (sigma/r)^6 = 1/128` and `4(p^2 - p) + 127/4096 == 0`, which is why
/// the potential energy shift below makes `PE` continuous at the cutoff.
pub const RCUT_FACT: f64 = 2.0;

/// Additive shift applied to the Lennard-Jones potential so it vanishes
/// exactly at `r = RCUT_FACT * re` (see [`RCUT_FACT`]).
pub const PE_SHIFT: f64 = 127.0 / 4096.0;

/// Number of atoms per GPU compute tile / workgroup.
pub const LAYOUT_SIZE: usize = 256;
