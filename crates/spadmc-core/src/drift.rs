//! Drift-velocity extraction.
//!
//! Auxiliary mode: one carrier per species is walked through a uniform field
//! for a fixed number of free flights, and the mean drift velocity is the
//! total displacement along the drift direction over the total elapsed time.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::carrier::{Carrier, Species};
use crate::config::FieldSweep;
use crate::error::{Result, SmcError};
use crate::material::{Material, HBAR, Q};
use crate::output::format_g;
use crate::rng::{Mt19937, FIELD_SWEEP_SEED};
use crate::tables::{energy_bin, ScatterOutcome, ScatteringTables, SpeciesTable};

/// Free flights per species per field point.
pub const DRIFT_FLIGHTS: usize = 100_000;

/// One output row of `drift_velocity.txt`.
#[derive(Debug, Clone, Serialize)]
pub struct DriftRow {
    pub field_kv_cm: f64,
    /// Mean electron drift velocity (m/s).
    pub electron_velocity: f64,
    /// Mean hole drift velocity (m/s).
    pub hole_velocity: f64,
}

/// Mean drift velocity of one species in a uniform field.
pub fn mean_velocity(
    species: Species,
    material: Material,
    table: &SpeciesTable,
    rng: &mut Mt19937,
    efield: f64,
    flights: usize,
) -> f64 {
    let params = material.params();
    let (mass, threshold) = match species {
        Species::Electron => (params.electron_mass, params.electron_threshold),
        Species::Hole => (params.hole_mass, params.hole_threshold),
    };

    let mut c = Carrier::seeded(0.0);
    let mut elapsed = 0.0;
    for _ in 0..flights {
        if !c.self_scattered {
            c.redraw_direction(mass, rng.uniform());
        }
        let tau = -rng.uniform().ln() / table.gamma;
        elapsed += tau;
        let impulse = Q * tau * efield / HBAR;
        match species {
            Species::Electron => c.kz += impulse,
            Species::Hole => c.kz -= impulse,
        }
        let energy = HBAR * HBAR / (2.0 * mass) * (c.kxy + c.kz * c.kz);
        let de = energy - c.energy;
        c.energy = energy;
        match species {
            Species::Electron => c.z += de / (Q * efield),
            Species::Hole => c.z -= de / (Q * efield),
        }

        let (bin, u) = if c.energy >= params.max_energy {
            (params.numpoints, table.saturated_draw())
        } else {
            (energy_bin(c.energy), rng.uniform())
        };
        match table.outcome(bin, u) {
            ScatterOutcome::Absorb => {
                c.energy += params.phonon_energy;
                c.self_scattered = false;
            }
            ScatterOutcome::Emit => {
                c.energy -= params.phonon_energy;
                c.self_scattered = false;
            }
            ScatterOutcome::Ionize => {
                // The survivor keeps the split energy; no pair is tracked.
                c.energy = (c.energy - threshold) / 3.0;
                c.self_scattered = false;
            }
            ScatterOutcome::SelfScatter => {
                c.self_scattered = true;
            }
        }
    }

    let displacement = match species {
        Species::Electron => c.z,
        Species::Hole => -c.z,
    };
    displacement / elapsed
}

/// Run the drift-velocity sweep, writing `drift_velocity.txt`.
pub fn run(material: Material, sweep: &FieldSweep, out_dir: &Path) -> Result<Vec<DriftRow>> {
    let params = material.params();
    let tables = ScatteringTables::new(params)?;
    let mut rng = Mt19937::new(FIELD_SWEEP_SEED);

    let path = out_dir.join("drift_velocity.txt");
    let mut out = File::create(&path)
        .map(BufWriter::new)
        .map_err(|e| SmcError::io(&path, e))?;
    writeln!(out, "Efield (kV/cm), ve (m/s), vh (m/s)").map_err(|e| SmcError::io(&path, e))?;

    let mut rows = Vec::new();
    for field_kv_cm in sweep.fields() {
        let efield = field_kv_cm * 1e5;
        log::info!("drift velocity at {field_kv_cm} kV/cm");
        let electron_velocity = mean_velocity(
            Species::Electron,
            material,
            tables.electron(),
            &mut rng,
            efield,
            DRIFT_FLIGHTS,
        );
        let hole_velocity = mean_velocity(
            Species::Hole,
            material,
            tables.hole(),
            &mut rng,
            efield,
            DRIFT_FLIGHTS,
        );
        writeln!(
            out,
            "{} {electron_velocity:e} {hole_velocity:e}",
            format_g(field_kv_cm)
        )
        .map_err(|e| SmcError::io(&path, e))?;
        rows.push(DriftRow {
            field_kv_cm,
            electron_velocity,
            hole_velocity,
        });
    }
    out.flush().map_err(|e| SmcError::io(&path, e))?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carriers_drift_forward() {
        let material = Material::Silicon;
        let tables = ScatteringTables::new(material.params()).unwrap();
        let mut rng = Mt19937::new(FIELD_SWEEP_SEED);
        let ve = mean_velocity(
            Species::Electron,
            material,
            tables.electron(),
            &mut rng,
            2.0e7,
            20_000,
        );
        let vh = mean_velocity(
            Species::Hole,
            material,
            tables.hole(),
            &mut rng,
            2.0e7,
            20_000,
        );
        // Both species drift along their field-driven direction at a
        // semiconductor-plausible speed.
        assert!(ve > 1e3 && ve < 1e7, "ve = {ve}");
        assert!(vh > 1e3 && vh < 1e7, "vh = {vh}");
    }

    #[test]
    fn velocity_is_deterministic() {
        let material = Material::Silicon;
        let tables = ScatteringTables::new(material.params()).unwrap();
        let mut a = Mt19937::new(FIELD_SWEEP_SEED);
        let mut b = Mt19937::new(FIELD_SWEEP_SEED);
        let va = mean_velocity(
            Species::Electron,
            material,
            tables.electron(),
            &mut a,
            1.0e7,
            5_000,
        );
        let vb = mean_velocity(
            Species::Electron,
            material,
            tables.electron(),
            &mut b,
            1.0e7,
            5_000,
        );
        assert_eq!(va, vb);
    }
}
