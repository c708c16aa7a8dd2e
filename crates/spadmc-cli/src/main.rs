//! CLI for spadmc — SPAD Monte Carlo simulation.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "spadmc")]
#[command(about = "spadmc — ensemble Monte Carlo simulation of single-photon avalanche diodes")]
#[command(version = spadmc_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Device properties: gain, excess noise factor, breakdown probability
    /// and quench transients under an external R–C circuit.
    /// Unset options are prompted for on stdin.
    Device {
        /// External series resistance (Ω)
        resistance: f64,

        /// Material: si, gaas or ingap
        #[arg(long, default_value = "si")]
        material: String,

        /// Time-bin divisions per saturated-velocity transit
        #[arg(long)]
        timeslice: Option<u32>,

        /// Injection condition: 1/electron or 2/hole
        #[arg(long)]
        injection: Option<String>,

        /// Simulated time window per trial (s)
        #[arg(long)]
        sim_time: Option<f64>,

        /// Trials per bias point
        #[arg(long)]
        trials: Option<usize>,

        /// RNG seed (default reproduces the reference runs)
        #[arg(long)]
        seed: Option<u32>,

        /// Bias list, one f64 volts per line
        #[arg(long, default_value = "bias_input.txt")]
        bias_file: PathBuf,

        /// Doping stack: `width_m doping_m3 type` per line
        #[arg(long, default_value = "doping_profile.txt")]
        doping_file: PathBuf,

        /// Directory receiving all output files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Also write the per-bias summaries as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Impact-ionization coefficients α and β over a uniform-field sweep
    Ionization {
        /// Minimum electric field (kV/cm)
        #[arg(long)]
        min_field: Option<f64>,

        /// Maximum electric field (kV/cm)
        #[arg(long)]
        max_field: Option<f64>,

        /// Field step size (kV/cm)
        #[arg(long)]
        step: Option<f64>,

        /// Material: si, gaas or ingap
        #[arg(long, default_value = "si")]
        material: String,

        /// Directory receiving all output files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Mean carrier drift velocity over a uniform-field sweep
    Drift {
        /// Minimum electric field (kV/cm)
        #[arg(long)]
        min_field: Option<f64>,

        /// Maximum electric field (kV/cm)
        #[arg(long)]
        max_field: Option<f64>,

        /// Field step size (kV/cm)
        #[arg(long)]
        step: Option<f64>,

        /// Material: si, gaas or ingap
        #[arg(long, default_value = "si")]
        material: String,

        /// Directory receiving all output files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Device {
            resistance,
            material,
            timeslice,
            injection,
            sim_time,
            trials,
            seed,
            bias_file,
            doping_file,
            out_dir,
            summary_json,
        } => commands::device::run(
            resistance,
            &material,
            timeslice,
            injection.as_deref(),
            sim_time,
            trials,
            seed,
            bias_file,
            doping_file,
            out_dir,
            summary_json,
        ),
        Commands::Ionization {
            min_field,
            max_field,
            step,
            material,
            out_dir,
        } => commands::field_sweep::run_ionization(min_field, max_field, step, &material, &out_dir),
        Commands::Drift {
            min_field,
            max_field,
            step,
            material,
            out_dir,
        } => commands::field_sweep::run_drift(min_field, max_field, step, &material, &out_dir),
    }
}
