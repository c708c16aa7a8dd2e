//! Cumulative scattering-probability tables.
//!
//! Built once at startup, per carrier species, over 1 meV energy bins.
//! Three real channels — phonon absorption, phonon emission, impact
//! ionization — plus the self-scattering remainder that makes the total rate
//! Γ energy-independent so drift times can be sampled from one exponential.
//!
//! Phonon rates follow the deformation-potential form, impact ionization the
//! Keldysh form. Γ is the maximum summed real rate over all bins, so the
//! cumulative probabilities are ≤ 1 by construction; anything else is a
//! fatal construction error.

use crate::error::{Result, SmcError};
use crate::material::{MaterialParams, KB, Q};

/// Outcome of one scattering draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterOutcome {
    /// Phonon absorption: energy gains ℏω.
    Absorb,
    /// Phonon emission: energy loses ℏω.
    Emit,
    /// Impact ionization: pair generation, energy split.
    Ionize,
    /// Fictitious event: state preserved.
    SelfScatter,
}

/// Energy bin index: energy in meV, rounded (bin = ⌊E·1000/q + 0.5⌋).
pub fn energy_bin(energy: f64) -> usize {
    (energy * 1000.0 / Q + 0.5).floor() as usize
}

/// Cumulative probability table for one carrier species.
pub struct SpeciesTable {
    /// `cumulative[bin] = [P(ab), P(ab∪em), P(ab∪em∪ii)]`, len NUMPOINTS+1.
    cumulative: Vec<[f64; 3]>,
    /// Total (self-scattering-padded) rate Γ (s⁻¹) for drift-time sampling.
    pub gamma: f64,
}

impl SpeciesTable {
    fn build(
        species: &'static str,
        params: &MaterialParams,
        coupling: f64,
        threshold: f64,
        ii_prefactor: f64,
    ) -> Result<Self> {
        let hw = params.phonon_energy;
        let n_q = 1.0 / ((hw / (KB * params.lattice_temperature)).exp() - 1.0);
        let bins = params.numpoints + 1;

        let mut rates = Vec::with_capacity(bins);
        let mut gamma = 0.0f64;
        for bin in 0..bins {
            let energy = bin as f64 * 1e-3 * Q;
            let absorb = n_q * coupling * (energy + hw).sqrt();
            let emit = if energy > hw {
                (n_q + 1.0) * coupling * (energy - hw).sqrt()
            } else {
                0.0
            };
            let ionize = if energy > threshold {
                ii_prefactor * ((energy - threshold) / threshold).powf(params.ii_exponent)
            } else {
                0.0
            };
            gamma = gamma.max(absorb + emit + ionize);
            rates.push([absorb, emit, ionize]);
        }

        let mut cumulative = Vec::with_capacity(bins);
        for (bin, [absorb, emit, ionize]) in rates.into_iter().enumerate() {
            let p = [
                absorb / gamma,
                (absorb + emit) / gamma,
                (absorb + emit + ionize) / gamma,
            ];
            if p[2] > 1.0 {
                return Err(SmcError::Tables {
                    species,
                    bin,
                    value: p[2],
                });
            }
            cumulative.push(p);
        }

        Ok(Self { cumulative, gamma })
    }

    /// Cumulative probabilities at a bin (clamped to the saturation bin).
    pub fn probabilities(&self, bin: usize) -> [f64; 3] {
        self.cumulative[bin.min(self.cumulative.len() - 1)]
    }

    /// The forced draw used at energy saturation: `p[2]` of the last bin,
    /// which leaves only impact ionization (or self-scattering) reachable.
    pub fn saturated_draw(&self) -> f64 {
        self.cumulative[self.cumulative.len() - 1][2]
    }

    /// Classify a uniform draw against the cumulative channel edges.
    pub fn outcome(&self, bin: usize, u: f64) -> ScatterOutcome {
        let p = self.probabilities(bin);
        if u <= p[0] {
            ScatterOutcome::Absorb
        } else if u <= p[1] {
            ScatterOutcome::Emit
        } else if u <= p[2] {
            ScatterOutcome::Ionize
        } else {
            ScatterOutcome::SelfScatter
        }
    }
}

/// Electron and hole tables for one material.
pub struct ScatteringTables {
    electron: SpeciesTable,
    hole: SpeciesTable,
}

impl ScatteringTables {
    /// Build both species tables; fatal if any bin fails normalization.
    pub fn new(params: &MaterialParams) -> Result<Self> {
        let electron = SpeciesTable::build(
            "electron",
            params,
            params.electron_phonon_coupling,
            params.electron_threshold,
            params.electron_ii_prefactor,
        )?;
        let hole = SpeciesTable::build(
            "hole",
            params,
            params.hole_phonon_coupling,
            params.hole_threshold,
            params.hole_ii_prefactor,
        )?;
        log::debug!(
            "scattering tables built: gamma_e={:.3e} 1/s gamma_h={:.3e} 1/s",
            electron.gamma,
            hole.gamma
        );
        Ok(Self { electron, hole })
    }

    /// Tables with every real channel disabled: all draws self-scatter and
    /// carriers drift ballistically at rate `gamma`. Used to exercise pure
    /// transport.
    pub fn inert(params: &MaterialParams, gamma: f64) -> Self {
        let zero = vec![[0.0; 3]; params.numpoints + 1];
        Self {
            electron: SpeciesTable {
                cumulative: zero.clone(),
                gamma,
            },
            hole: SpeciesTable {
                cumulative: zero,
                gamma,
            },
        }
    }

    pub fn electron(&self) -> &SpeciesTable {
        &self.electron
    }

    pub fn hole(&self) -> &SpeciesTable {
        &self.hole
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;

    #[test]
    fn cdf_monotone_and_bounded() {
        let params = Material::Silicon.params();
        let tables = ScatteringTables::new(params).unwrap();
        for table in [tables.electron(), tables.hole()] {
            for bin in 0..=params.numpoints {
                let p = table.probabilities(bin);
                assert!(p[0] >= 0.0);
                assert!(p[0] <= p[1], "bin {bin}");
                assert!(p[1] <= p[2], "bin {bin}");
                assert!(p[2] <= 1.0, "bin {bin}");
            }
        }
    }

    #[test]
    fn gamma_is_attained() {
        // Some bin must sum to exactly Γ, i.e. p[2] == 1 there.
        let params = Material::Silicon.params();
        let tables = ScatteringTables::new(params).unwrap();
        let hit = (0..=params.numpoints)
            .any(|bin| (tables.electron().probabilities(bin)[2] - 1.0).abs() < 1e-12);
        assert!(hit);
    }

    #[test]
    fn no_emission_below_phonon_energy() {
        let params = Material::Silicon.params();
        let tables = ScatteringTables::new(params).unwrap();
        // Below ℏω the emission channel is closed: p[0] == p[1].
        let hw_bin = energy_bin(params.phonon_energy);
        for bin in 0..hw_bin {
            let p = tables.electron().probabilities(bin);
            assert_eq!(p[0], p[1], "bin {bin}");
        }
    }

    #[test]
    fn ionization_opens_above_threshold() {
        let params = Material::Silicon.params();
        let tables = ScatteringTables::new(params).unwrap();
        let below = energy_bin(params.electron_threshold) - 1;
        let p = tables.electron().probabilities(below);
        assert_eq!(p[1], p[2]);
        let p = tables.electron().probabilities(params.numpoints);
        assert!(p[2] > p[1]);
    }

    #[test]
    fn saturation_forces_ionization() {
        let params = Material::Silicon.params();
        let tables = ScatteringTables::new(params).unwrap();
        let u = tables.electron().saturated_draw();
        assert_eq!(
            tables.electron().outcome(params.numpoints, u),
            ScatterOutcome::Ionize
        );
    }

    #[test]
    fn energy_bin_rounds_to_mev() {
        assert_eq!(energy_bin(0.0), 0);
        assert_eq!(energy_bin(1.0e-3 * Q), 1);
        assert_eq!(energy_bin(1.49e-3 * Q), 1);
        assert_eq!(energy_bin(1.51e-3 * Q), 2);
    }

    #[test]
    fn inert_tables_always_self_scatter() {
        let params = Material::Silicon.params();
        let tables = ScatteringTables::inert(params, 1e13);
        assert_eq!(
            tables.electron().outcome(100, 0.5),
            ScatterOutcome::SelfScatter
        );
        assert_eq!(tables.hole().outcome(0, 1e-9), ScatterOutcome::SelfScatter);
    }
}
