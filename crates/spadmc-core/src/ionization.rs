//! Impact-ionization coefficient extraction.
//!
//! Auxiliary mode sharing the scattering kernel but no circuit coupling: a
//! lone electron (then a lone hole) is walked through a uniform field until
//! it has triggered 20 000 impact-ionization events. The distance covered
//! between events goes to a per-field table, and the ionization coefficient
//! is the reciprocal mean distance: α = events / Σ distance (β likewise).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::carrier::{Carrier, Species};
use crate::config::FieldSweep;
use crate::error::{Result, SmcError};
use crate::material::{Material, HBAR, Q};
use crate::output::{bias_path, format_g};
use crate::rng::{Mt19937, FIELD_SWEEP_SEED};
use crate::tables::{energy_bin, ScatterOutcome, ScatteringTables, SpeciesTable};

/// Ionization events tracked per carrier species per field point.
pub const IONIZATION_EVENTS: usize = 20_000;

/// One output row of `alpha_beta.txt`.
#[derive(Debug, Clone, Serialize)]
pub struct IonizationRow {
    pub field_kv_cm: f64,
    /// Electron ionization coefficient (1/m).
    pub alpha: f64,
    /// Hole ionization coefficient (1/m).
    pub beta: f64,
}

/// Walk one carrier through a uniform field until `events` ionizations,
/// reporting each event's distance-since-last through `record`. Returns the
/// summed distance along the carrier's drift direction.
pub fn ionization_walk(
    species: Species,
    material: Material,
    table: &SpeciesTable,
    rng: &mut Mt19937,
    efield: f64,
    events: usize,
    mut record: impl FnMut(usize, f64) -> Result<()>,
) -> Result<f64> {
    let params = material.params();
    let (mass, threshold) = match species {
        Species::Electron => (params.electron_mass, params.electron_threshold),
        Species::Hole => (params.hole_mass, params.hole_threshold),
    };

    let mut c = Carrier::seeded(0.0);
    let mut count = 0usize;
    let mut total = 0.0;

    while count < events {
        if !c.self_scattered {
            c.redraw_direction(mass, rng.uniform());
        }
        let tau = -rng.uniform().ln() / table.gamma;
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
                c.energy = (c.energy - threshold) / 3.0;
                count += 1;
                c.self_scattered = false;
                let distance = match species {
                    Species::Electron => c.z,
                    Species::Hole => -c.z,
                };
                record(count, distance)?;
                total += distance;
                c.z = 0.0;
            }
            ScatterOutcome::SelfScatter => {
                c.self_scattered = true;
            }
        }
    }
    Ok(total)
}

/// Run the coefficient extraction over a field sweep, writing `alpha_beta.txt`
/// plus per-field `<E>epdf.txt` / `<E>hpdf.txt` event-distance tables.
pub fn run(material: Material, sweep: &FieldSweep, out_dir: &Path) -> Result<Vec<IonizationRow>> {
    let params = material.params();
    let tables = ScatteringTables::new(params)?;
    let mut rng = Mt19937::new(FIELD_SWEEP_SEED);

    let ab_path = out_dir.join("alpha_beta.txt");
    let mut ab = File::create(&ab_path)
        .map(BufWriter::new)
        .map_err(|e| SmcError::io(&ab_path, e))?;
    writeln!(ab, "Efield (kV/cm),  Alpha (1/m), Beta (1/m)")
        .map_err(|e| SmcError::io(&ab_path, e))?;

    let mut rows = Vec::new();
    for field_kv_cm in sweep.fields() {
        let efield = field_kv_cm * 1e5;
        log::info!("ionization coefficients at {field_kv_cm} kV/cm");

        let epdf_path = bias_path(out_dir, field_kv_cm, "epdf.txt");
        let mut epdf = File::create(&epdf_path)
            .map(BufWriter::new)
            .map_err(|e| SmcError::io(&epdf_path, e))?;
        let alpha_distance = ionization_walk(
            Species::Electron,
            material,
            tables.electron(),
            &mut rng,
            efield,
            IONIZATION_EVENTS,
            |event, distance| {
                writeln!(epdf, "{event} {distance:e}").map_err(|e| SmcError::io(&epdf_path, e))
            },
        )?;
        epdf.flush().map_err(|e| SmcError::io(&epdf_path, e))?;

        let hpdf_path = bias_path(out_dir, field_kv_cm, "hpdf.txt");
        let mut hpdf = File::create(&hpdf_path)
            .map(BufWriter::new)
            .map_err(|e| SmcError::io(&hpdf_path, e))?;
        let beta_distance = ionization_walk(
            Species::Hole,
            material,
            tables.hole(),
            &mut rng,
            efield,
            IONIZATION_EVENTS,
            |event, distance| {
                writeln!(hpdf, "{event} {distance:e}").map_err(|e| SmcError::io(&hpdf_path, e))
            },
        )?;
        hpdf.flush().map_err(|e| SmcError::io(&hpdf_path, e))?;

        let alpha = IONIZATION_EVENTS as f64 / alpha_distance;
        let beta = IONIZATION_EVENTS as f64 / beta_distance;
        writeln!(ab, "{} {alpha:e} {beta:e}", format_g(field_kv_cm))
            .map_err(|e| SmcError::io(&ab_path, e))?;
        rows.push(IonizationRow {
            field_kv_cm,
            alpha,
            beta,
        });
    }
    ab.flush().map_err(|e| SmcError::io(&ab_path, e))?;
    Ok(rows)
}
