//! Run configuration for the device-properties mode.
//!
//! Everything the bias sweep needs in one place: material, injection,
//! circuit resistance, time discretization, trial count, seed and the input
//! file paths. The chosen inputs are logged to `user_inputs.txt` next to the
//! result files.

use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use serde::Serialize;

use crate::carrier::Injection;
use crate::error::{Result, SmcError};
use crate::material::Material;
use crate::rng::DEVICE_SEED;

/// Inputs of one device-properties run.
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    pub material: Material,
    /// Injection condition seeding each trial.
    #[serde(skip)]
    pub injection: Injection,
    /// External series resistance (Ω).
    pub resistance: f64,
    /// Time-bin divisions per saturated-velocity transit.
    pub timeslice: u32,
    /// Simulated time window per trial (s).
    pub sim_time: f64,
    /// Trials per bias point.
    pub n_trials: usize,
    /// RNG seed; the default reproduces the reference runs.
    pub seed: u32,
    pub bias_file: PathBuf,
    pub doping_file: PathBuf,
    pub out_dir: PathBuf,
}

impl SimConfig {
    /// A config with the compile-time defaults of the original program:
    /// Silicon, pure-electron injection, reference seed.
    pub fn new(resistance: f64) -> Self {
        Self {
            material: Material::Silicon,
            injection: Injection::PureElectron,
            resistance,
            timeslice: 20,
            sim_time: 1e-9,
            n_trials: 1000,
            seed: DEVICE_SEED,
            bias_file: PathBuf::from("bias_input.txt"),
            doping_file: PathBuf::from("doping_profile.txt"),
            out_dir: PathBuf::from("."),
        }
    }

    /// Read the bias list: one f64 volts per line, order preserved.
    pub fn read_biases(&self) -> Result<Vec<f64>> {
        let text = fs::read_to_string(&self.bias_file)
            .map_err(|e| SmcError::io(&self.bias_file, e))?;
        let mut biases = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            let v: f64 = line.parse().map_err(|_| SmcError::Parse {
                path: self.bias_file.clone(),
                line: idx + 1,
                message: format!("bad bias '{line}'"),
            })?;
            biases.push(v);
        }
        Ok(biases)
    }

    /// Log the chosen inputs to `user_inputs.txt`.
    pub fn log_user_inputs(&self) -> Result<()> {
        let path = self.out_dir.join("user_inputs.txt");
        let mut out = File::create(&path).map_err(|e| SmcError::io(&path, e))?;
        let write = |out: &mut File, line: String| -> Result<()> {
            writeln!(out, "{line}").map_err(|e| SmcError::io(&path, e))
        };
        write(&mut out, format!("{}", self.material))?;
        write(
            &mut out,
            format!("Divisions Per Transit time: {}", self.timeslice),
        )?;
        write(&mut out, format!("{}", self.injection))?;
        write(
            &mut out,
            format!("Simulation time limit: {} ps", self.sim_time / 1e-12),
        )?;
        write(&mut out, format!("Number of Trials: {}", self.n_trials))?;
        write(
            &mut out,
            format!("Series resistance: {} Ohm", self.resistance),
        )?;
        Ok(())
    }
}

/// Uniform-field sweep bounds for the auxiliary modes (kV/cm).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSweep {
    pub min_kv_cm: f64,
    pub max_kv_cm: f64,
    pub step_kv_cm: f64,
}

impl FieldSweep {
    /// The swept field values, inclusive of both ends.
    pub fn fields(&self) -> Vec<f64> {
        let mut fields = Vec::new();
        let mut field = self.min_kv_cm;
        while field <= self.max_kv_cm {
            fields.push(field);
            field += self.step_kv_cm;
        }
        fields
    }
}
