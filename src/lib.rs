//! 2D two-species Lennard-Jones molecular dynamics core.
//!
//! Three pieces carry essentially all of the runtime cost and
//! correctness risk: [`force`] (the N-body inner kernel), [`integrator`]
//! (the Verlet loop wrapping it), and [`strain`] (the local deformation
//! tensor between two snapshots). Everything else here ([`model`],
//! [`species`], [`pbc`], [`builder`], [`profile`], [`snapshot`],
//! [`archive`], [`analysis`]) is the ambient state, construction, and
//! persistence the three core pieces need to be useful end to end.

pub mod analysis;
pub mod archive;
pub mod builder;
pub mod constants;
pub mod error;
pub mod force;
pub mod integrator;
pub mod model;
pub mod pbc;
pub mod profile;
pub mod snapshot;
pub mod species;
pub mod strain;

pub use builder::ModelBuilder;
pub use integrator::Integrator;
pub use model::Model;
pub use pbc::BoxGeometry;
pub use species::{PairLjConstants, SpeciesParams};
