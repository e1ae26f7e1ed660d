//! Per-species Lennard-Jones parameters and the Kong mixing rule used to
//! derive the heteroatomic (AB) pair from the two homoatomic ones.
//!
//! Grounded on `moldyn/simulation/builder.py`'s `Model.set_species` /
//! `Model.calc_ab` (the `kong` class attribute) and restated as typed
//! fields instead of a string-keyed `eval`'d dict.

use serde::{Deserialize, Serialize};

use crate::constants::RCUT_FACT;

/// Lennard-Jones well depth/length/mass triple for one species, plus the
/// quantities derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParams {
    /// Well depth, J.
    pub epsilon: f64,
    /// Zero-crossing length, m.
    pub sigma: f64,
    /// Particle mass, kg.
    pub mass: f64,
}

impl SpeciesParams {
    pub fn new(epsilon: f64, sigma: f64, mass: f64) -> Self {
        Self {
            epsilon,
            sigma,
            mass,
        }
    }

    /// Equilibrium separation `re = 2^(1/6) * sigma`.
    pub fn re(&self) -> f64 {
        2f64.powf(1.0 / 6.0) * self.sigma
    }

    /// Interaction cutoff `rcut = rcut_fact * re`.
    pub fn rcut(&self) -> f64 {
        RCUT_FACT * self.re()
    }
}

/// The nine Lennard-Jones constants consumed by the force/strain kernels:
/// `{epsilon, sigma, rcut}` for each of AA, BB, AB.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PairLjConstants {
    pub epsilon_a: f64,
    pub sigma_a: f64,
    pub rcut_a: f64,
    pub epsilon_b: f64,
    pub sigma_b: f64,
    pub rcut_b: f64,
    pub epsilon_ab: f64,
    pub sigma_ab: f64,
    pub rcut_ab: f64,
}

impl PairLjConstants {
    /// Derive AB from AA/BB via the Kong mixing rule.
    ///
    /// ```text
    /// sigma_ab = ( (eA sA^12 (1 + ((eB sB^12)/(eA sA^12))^(1/13))^13) /
    ///              (2^13 sqrt(eB sB^6 eA sA^6)) )^(1/6)
    /// epsilon_ab = sqrt(eB sB^6 eA sA^6) / sigma_ab^6
    /// ```
    pub fn from_species_kong(a: SpeciesParams, b: SpeciesParams) -> Self {
        let (ea, sa) = (a.epsilon, a.sigma);
        let (eb, sb) = (b.epsilon, b.sigma);

        let sa12 = sa.powi(12);
        let sb12 = sb.powi(12);
        let sa6 = sa.powi(6);
        let sb6 = sb.powi(6);

        let inner = 1.0 + ((eb * sb12) / (ea * sa12)).powf(1.0 / 13.0);
        let numer = ea * sa12 * inner.powi(13);
        let denom = 2f64.powi(13) * (eb * sb6 * ea * sa6).sqrt();
        let sigma_ab = (numer / denom).powf(1.0 / 6.0);

        let epsilon_ab = (eb * sb6 * ea * sa6).sqrt() / sigma_ab.powi(6);

        Self::from_species_with_ab(a, b, epsilon_ab, sigma_ab)
    }

    /// Build with a user-supplied AB pair, bypassing Kong mixing. Once
    /// set this way the AB pair is treated as a constant.
    pub fn from_species_with_ab(
        a: SpeciesParams,
        b: SpeciesParams,
        epsilon_ab: f64,
        sigma_ab: f64,
    ) -> Self {
        let re_ab = 2f64.powf(1.0 / 6.0) * sigma_ab;
        Self {
            epsilon_a: a.epsilon,
            sigma_a: a.sigma,
            rcut_a: a.rcut(),
            epsilon_b: b.epsilon,
            sigma_b: b.sigma,
            rcut_b: b.rcut(),
            epsilon_ab,
            sigma_ab,
            rcut_ab: RCUT_FACT * re_ab,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn re_and_rcut_ab_track_sigma_ab() {
        let a = SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26);
        let b = SpeciesParams::new(1.2e-21, 3.0e-10, 5.0e-26);
        let pair = PairLjConstants::from_species_kong(a, b);

        let re_ab = 2f64.powf(1.0 / 6.0) * pair.sigma_ab;
        assert_relative_eq!(pair.rcut_ab, RCUT_FACT * re_ab, epsilon = 1e-18);
    }

    #[test]
    fn identical_species_kong_mixing_reduces_to_homoatomic() {
        let a = SpeciesParams::new(1.65e-21, 3.4e-10, 6.69e-26);
        let pair = PairLjConstants::from_species_kong(a, a);
        assert_relative_eq!(pair.sigma_ab, a.sigma, max_relative = 1e-10);
        assert_relative_eq!(pair.epsilon_ab, a.epsilon, max_relative = 1e-10);
    }
}
