//! `spadmc device` — the device-properties mode.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, anyhow};

use spadmc_core::{run_sweep, Injection, Material, SimConfig};

use super::flag_or_prompt;

/// Run the device-properties sweep.
#[allow(clippy::too_many_arguments)]
pub fn run(
    resistance: f64,
    material: &str,
    timeslice: Option<u32>,
    injection: Option<&str>,
    sim_time: Option<f64>,
    trials: Option<usize>,
    seed: Option<u32>,
    bias_file: PathBuf,
    doping_file: PathBuf,
    out_dir: PathBuf,
    summary_json: Option<PathBuf>,
) -> anyhow::Result<()> {
    let material: Material = material.parse().map_err(|e: String| anyhow!(e))?;

    let mut config = SimConfig::new(resistance);
    config.material = material;
    config.timeslice = flag_or_prompt(timeslice, "Divisions per transit time")?;
    let injection_choice: String = flag_or_prompt(
        injection.map(str::to_string),
        "Injection: 1) Pure Electron, 2) Pure Hole",
    )?;
    config.injection = injection_choice
        .parse::<Injection>()
        .map_err(|e| anyhow!(e))?;
    config.sim_time = flag_or_prompt(sim_time, "Simulation time limit (s)")?;
    config.n_trials = flag_or_prompt(trials, "Number of trials")?;
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.bias_file = bias_file;
    config.doping_file = doping_file;
    config.out_dir = out_dir;

    println!("resistance {resistance} Ohm entered");
    let summaries = run_sweep(&config).context("bias sweep failed")?;

    for s in &summaries {
        if s.cutoff {
            println!("V= {:.6} M= cutoff F= cutoff, Pb= {:.6}", s.v_bias, s.breakdown_probability);
        } else {
            println!(
                "V= {:.6} M= {:.6} F= {:.6}, Pb= {:.6}",
                s.v_bias, s.gain, s.excess_noise, s.breakdown_probability
            );
        }
    }

    if let Some(path) = summary_json {
        let json = serde_json::to_string_pretty(&summaries)?;
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    }

    println!("Done");
    Ok(())
}
