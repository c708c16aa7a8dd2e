//! Material parameter catalogue.
//!
//! Immutable per-material constant sets for the three supported
//! multiplication-region materials. Masses, phonon energy, ionization
//! thresholds and the fitted scattering-model constants all live here; the
//! rest of the engine never hardcodes a material number.
//!
//! The coupling constants and Keldysh prefactors are calibration values
//! fitted so that the simple three-channel rate model reproduces measured
//! ionization coefficients; they are not first-principles quantities.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Elementary charge (C).
pub const Q: f64 = 1.602_176_634e-19;
/// Reduced Planck constant (J s).
pub const HBAR: f64 = 1.054_571_817e-34;
/// Boltzmann constant (J/K).
pub const KB: f64 = 1.380_649e-23;
/// Free electron mass (kg).
pub const M0: f64 = 9.109_383_701_5e-31;
/// Vacuum permittivity (F/m).
pub const EPS0: f64 = 8.854_187_812_8e-12;

/// Supported multiplication-region materials.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Material {
    Silicon,
    GalliumArsenide,
    IndiumGalliumPhosphide,
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Silicon => write!(f, "Silicon"),
            Self::GalliumArsenide => write!(f, "Gallium Arsenide"),
            Self::IndiumGalliumPhosphide => write!(f, "Indium Gallium Phosphide"),
        }
    }
}

impl FromStr for Material {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "si" | "silicon" => Ok(Self::Silicon),
            "gaas" | "gallium-arsenide" => Ok(Self::GalliumArsenide),
            "ingap" | "indium-gallium-phosphide" => Ok(Self::IndiumGalliumPhosphide),
            other => Err(format!(
                "unknown material '{other}' (expected si, gaas or ingap)"
            )),
        }
    }
}

/// Immutable physical constant set for one material.
#[derive(Debug)]
pub struct MaterialParams {
    /// Display name.
    pub name: &'static str,
    /// Electron effective mass (kg).
    pub electron_mass: f64,
    /// Hole effective mass (kg).
    pub hole_mass: f64,
    /// Optical phonon energy ℏω (J).
    pub phonon_energy: f64,
    /// Electron impact-ionization threshold (J).
    pub electron_threshold: f64,
    /// Hole impact-ionization threshold (J).
    pub hole_threshold: f64,
    /// Upper edge of the tabulated energy range (J).
    pub max_energy: f64,
    /// Number of 1 meV energy bins; bin index == energy in meV.
    pub numpoints: usize,
    /// Lattice temperature (K).
    pub lattice_temperature: f64,
    /// Relative permittivity of the depletion region.
    pub relative_permittivity: f64,
    /// Intrinsic carrier density (m⁻³), used for the built-in potential.
    pub intrinsic_density: f64,
    /// Electron phonon coupling (s⁻¹ J⁻¹ᐟ²), fitted.
    pub electron_phonon_coupling: f64,
    /// Hole phonon coupling (s⁻¹ J⁻¹ᐟ²), fitted.
    pub hole_phonon_coupling: f64,
    /// Electron Keldysh prefactor (s⁻¹), fitted.
    pub electron_ii_prefactor: f64,
    /// Hole Keldysh prefactor (s⁻¹), fitted.
    pub hole_ii_prefactor: f64,
    /// Keldysh softness exponent.
    pub ii_exponent: f64,
}

static SILICON: MaterialParams = MaterialParams {
    name: "Silicon",
    electron_mass: 0.48 * M0,
    hole_mass: 0.55 * M0,
    phonon_energy: 0.063 * Q,
    electron_threshold: 1.18 * Q,
    hole_threshold: 1.71 * Q,
    max_energy: 6.0 * Q,
    numpoints: 6000,
    lattice_temperature: 300.0,
    relative_permittivity: 11.7,
    intrinsic_density: 1.5e16,
    electron_phonon_coupling: 2.6e23,
    hole_phonon_coupling: 2.2e23,
    electron_ii_prefactor: 3.2e12,
    hole_ii_prefactor: 2.1e12,
    ii_exponent: 2.0,
};

static GALLIUM_ARSENIDE: MaterialParams = MaterialParams {
    name: "Gallium Arsenide",
    electron_mass: 0.35 * M0,
    hole_mass: 0.46 * M0,
    phonon_energy: 0.035 * Q,
    electron_threshold: 1.70 * Q,
    hole_threshold: 1.40 * Q,
    max_energy: 6.0 * Q,
    numpoints: 6000,
    lattice_temperature: 300.0,
    relative_permittivity: 12.9,
    intrinsic_density: 2.1e12,
    electron_phonon_coupling: 2.0e23,
    hole_phonon_coupling: 2.4e23,
    electron_ii_prefactor: 1.9e12,
    hole_ii_prefactor: 2.6e12,
    ii_exponent: 2.0,
};

static INDIUM_GALLIUM_PHOSPHIDE: MaterialParams = MaterialParams {
    name: "Indium Gallium Phosphide",
    electron_mass: 0.42 * M0,
    hole_mass: 0.52 * M0,
    phonon_energy: 0.045 * Q,
    electron_threshold: 2.05 * Q,
    hole_threshold: 2.10 * Q,
    max_energy: 6.0 * Q,
    numpoints: 6000,
    lattice_temperature: 300.0,
    relative_permittivity: 11.8,
    intrinsic_density: 1.0e9,
    electron_phonon_coupling: 2.3e23,
    hole_phonon_coupling: 2.5e23,
    electron_ii_prefactor: 1.4e12,
    hole_ii_prefactor: 1.5e12,
    ii_exponent: 2.0,
};

impl Material {
    /// Constant set for this material.
    pub fn params(&self) -> &'static MaterialParams {
        match self {
            Self::Silicon => &SILICON,
            Self::GalliumArsenide => &GALLIUM_ARSENIDE,
            Self::IndiumGalliumPhosphide => &INDIUM_GALLIUM_PHOSPHIDE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_is_consistent() {
        for material in [
            Material::Silicon,
            Material::GalliumArsenide,
            Material::IndiumGalliumPhosphide,
        ] {
            let p = material.params();
            assert!(p.electron_mass > 0.0 && p.hole_mass > 0.0);
            assert!(p.phonon_energy > 0.0);
            assert!(p.electron_threshold < p.max_energy);
            assert!(p.hole_threshold < p.max_energy);
            // Bin index is energy in meV, so NUMPOINTS must cover E_max.
            assert_eq!(p.numpoints, (p.max_energy / Q * 1000.0).round() as usize);
        }
    }

    #[test]
    fn parse_names() {
        assert_eq!("si".parse::<Material>().unwrap(), Material::Silicon);
        assert_eq!(
            "GaAs".parse::<Material>().unwrap(),
            Material::GalliumArsenide
        );
        assert_eq!(
            "ingap".parse::<Material>().unwrap(),
            Material::IndiumGalliumPhosphide
        );
        assert!("ge".parse::<Material>().is_err());
    }

    #[test]
    fn display_matches_catalogue_name() {
        assert_eq!(Material::Silicon.to_string(), Material::Silicon.params().name);
    }
}
