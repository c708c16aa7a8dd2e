//! `spadmc ionization` / `spadmc drift` — uniform-field auxiliary modes.

use std::path::Path;

use anyhow::{Context, anyhow};

use spadmc_core::{drift, ionization, FieldSweep, Material};

use super::flag_or_prompt;

fn resolve(
    min_field: Option<f64>,
    max_field: Option<f64>,
    step: Option<f64>,
    material: &str,
) -> anyhow::Result<(Material, FieldSweep)> {
    let material: Material = material.parse().map_err(|e: String| anyhow!(e))?;
    let sweep = FieldSweep {
        min_kv_cm: flag_or_prompt(min_field, "Minimum electric field (kV/cm)")?,
        max_kv_cm: flag_or_prompt(max_field, "Maximum electric field (kV/cm)")?,
        step_kv_cm: flag_or_prompt(step, "Electric field step size (kV/cm)")?,
    };
    if sweep.step_kv_cm <= 0.0 || sweep.max_kv_cm < sweep.min_kv_cm {
        return Err(anyhow!("field sweep must have a positive step and max >= min"));
    }
    Ok((material, sweep))
}

/// Run the impact-ionization-coefficient sweep.
pub fn run_ionization(
    min_field: Option<f64>,
    max_field: Option<f64>,
    step: Option<f64>,
    material: &str,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let (material, sweep) = resolve(min_field, max_field, step, material)?;
    let rows = ionization::run(material, &sweep, out_dir).context("ionization sweep failed")?;
    for row in &rows {
        println!(
            "{} kV/cm: alpha = {:e} 1/m, beta = {:e} 1/m",
            row.field_kv_cm, row.alpha, row.beta
        );
    }
    println!("Done");
    Ok(())
}

/// Run the drift-velocity sweep.
pub fn run_drift(
    min_field: Option<f64>,
    max_field: Option<f64>,
    step: Option<f64>,
    material: &str,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let (material, sweep) = resolve(min_field, max_field, step, material)?;
    let rows = drift::run(material, &sweep, out_dir).context("drift-velocity sweep failed")?;
    for row in &rows {
        println!(
            "{} kV/cm: ve = {:e} m/s, vh = {:e} m/s",
            row.field_kv_cm, row.electron_velocity, row.hole_velocity
        );
    }
    println!("Done");
    Ok(())
}
