//! Bias sweep driver: the outer loop of the device-properties mode.
//!
//! For each bias read from the input list it runs the configured number of
//! trials sequentially through one shared RNG, accumulates gain, the
//! squared-multiplication sum and the breakdown count, and emits the output
//! files: the per-bias summary, per-trial breakdown times and charge
//! records, the first fifty trial transients and — for sweeps that never
//! broke down — the mean current transient.

use serde::Serialize;

use crate::circuit::{CircuitSolver, TimeBinSeries};
use crate::config::SimConfig;
use crate::device::DeviceField;
use crate::error::Result;
use crate::output::{
    write_mean_current, write_trial_traces, BiasWriters, SummaryWriter,
};
use crate::rng::Mt19937;
use crate::tables::ScatteringTables;
use crate::transport::{Transport, TrialState};
use crate::trial::{TrialDriver, TrialResult};

/// How many leading trials get their full transients written to disk.
pub const TRIALS_TO_SAVE: usize = 50;

/// RC time constant of the cosmetic recharge curve stitched onto saved
/// voltage traces after the quench (s).
pub const RECHARGE_TAU: f64 = 2e-9;

/// Per-bias sweep summary.
#[derive(Debug, Clone, Serialize)]
pub struct BiasSummary {
    pub v_bias: f64,
    /// Mean multiplication ⟨M⟩.
    pub gain: f64,
    /// Excess noise factor ⟨M²⟩/⟨M⟩².
    pub excess_noise: f64,
    /// Fraction of trials whose current crossed the breakdown threshold.
    pub breakdown_probability: f64,
    pub breakdowns: usize,
    pub trials: usize,
    /// Whether any trial ran out of simulated time.
    pub cutoff: bool,
}

/// Run the full sweep described by a config. Returns one summary per bias.
pub fn run_sweep(config: &SimConfig) -> Result<Vec<BiasSummary>> {
    let params = config.material.params();
    let tables = ScatteringTables::new(params)?;
    let mut device = DeviceField::from_file(&config.doping_file, params)?;
    let biases = config.read_biases()?;
    config.log_user_inputs()?;

    let mut rng = Mt19937::new(config.seed);
    let mut summary_out = SummaryWriter::open(&config.out_dir)?;
    let mut summaries = Vec::with_capacity(biases.len());

    log::info!(
        "sweep: {} bias points, {} trials each, R = {} Ohm, {}",
        biases.len(),
        config.n_trials,
        config.resistance,
        params.name
    );

    for v_bias in biases {
        device.profile(v_bias);
        let dt = device.width() / (f64::from(config.timeslice) * 1e5);
        let n_bins = (config.sim_time / dt) as usize;
        log::info!(
            "V = {v_bias} V: width = {:.4e} m, dt = {dt:.4e} s, {n_bins} bins",
            device.width()
        );

        let mut bins = TimeBinSeries::new(n_bins, dt);
        let driver = TrialDriver {
            transport: Transport::new(params, &tables),
            circuit: CircuitSolver::new(v_bias, config.resistance),
            injection: config.injection,
            n_bins,
        };
        let mut state = TrialState::new(v_bias, n_bins);
        let mut writers = BiasWriters::open(&config.out_dir, v_bias)?;

        let n_trials = config.n_trials as f64;
        let mut gain = 0.0;
        let mut ms = 0.0;
        let mut breakdowns = 0usize;
        let mut cutoff = false;
        let to_save = TRIALS_TO_SAVE.min(config.n_trials);
        let mut saved: Vec<(Vec<f64>, Vec<f64>)> = Vec::with_capacity(to_save);

        for trial in 0..config.n_trials {
            let result = driver.run(&mut rng, &mut device, &mut bins, &mut state);
            let tn = result.multiplication as f64;
            gain += tn / n_trials;
            ms += tn * tn / n_trials;
            cutoff |= result.cutoff;

            if let Some(bin) = result.breakdown_bin {
                breakdowns += 1;
                writers.record_breakdown(trial, bin as f64 * dt)?;
            }
            writers.record_gain(trial, result.charge_electrons, tn)?;
            log::debug!(
                "trial {trial}: M = {tn}, events = {:?}, min V = {:.3}",
                result.counters,
                result.min_voltage
            );

            if trial < to_save {
                saved.push((bins.i_num.clone(), recharge_trace(&bins, &result, v_bias)));
            }
            if (trial + 1) % 100 == 0 {
                log::info!(
                    "V = {v_bias} V: trial {}/{} gain = {:.4} Pb = {:.4}",
                    trial + 1,
                    config.n_trials,
                    gain * n_trials / (trial + 1) as f64,
                    breakdowns as f64 / (trial + 1) as f64
                );
            }
        }

        for (trial, (current, voltage)) in saved.iter().enumerate() {
            write_trial_traces(&config.out_dir, trial, dt, current, voltage)?;
        }

        let excess_noise = ms / (gain * gain);
        let pb = if config.n_trials == 0 {
            0.0
        } else {
            breakdowns as f64 / n_trials
        };
        summary_out.record(v_bias, gain, excess_noise, pb, cutoff)?;
        if breakdowns == 0 && config.n_trials > 0 {
            write_mean_current(&config.out_dir, v_bias, dt, &bins.i_avg, config.n_trials)?;
        }

        if cutoff {
            log::info!("V = {v_bias} V: M = cutoff, Pb = {pb:.6}");
        } else {
            log::info!("V = {v_bias} V: M = {gain:.6}, F = {excess_noise:.6}, Pb = {pb:.6}");
        }

        summaries.push(BiasSummary {
            v_bias,
            gain,
            excess_noise,
            breakdown_probability: pb,
            breakdowns,
            trials: config.n_trials,
            cutoff,
        });
    }

    Ok(summaries)
}

/// The trial's voltage trace with the analytic recharge curve stitched on
/// after the quench point of a breakdown trial. Display-only: the simulated
/// series itself is not touched.
fn recharge_trace(bins: &TimeBinSeries, result: &TrialResult, v_bias: f64) -> Vec<f64> {
    let mut voltage = bins.v_num.clone();
    if result.breakdown {
        for bin in (result.quench_bin + 1)..voltage.len() {
            let elapsed = (bin - result.quench_bin) as f64 * bins.dt;
            voltage[bin] = result.min_voltage
                + (v_bias - result.min_voltage) * (1.0 - (-elapsed / RECHARGE_TAU).exp());
        }
    }
    voltage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::EventCounters;

    fn fake_result(breakdown: bool, quench_bin: usize, min_voltage: f64) -> TrialResult {
        TrialResult {
            multiplication: 1,
            breakdown,
            breakdown_bin: breakdown.then_some(quench_bin),
            quench_bin,
            min_voltage,
            cutoff: false,
            charge_electrons: 1.0,
            counters: EventCounters::default(),
        }
    }

    #[test]
    fn recharge_is_monotone_toward_supply() {
        let mut bins = TimeBinSeries::new(64, 1e-12);
        bins.reset_trial(22.0);
        let result = fake_result(true, 10, 18.5);
        let trace = recharge_trace(&bins, &result, 22.0);
        for bin in 11..63 {
            assert!(trace[bin + 1] >= trace[bin]);
            assert!(trace[bin] >= 18.5 && trace[bin] <= 22.0);
        }
        // Bins before the quench point are untouched.
        assert_eq!(trace[10], 22.0);
    }

    #[test]
    fn recharge_time_constant() {
        let mut bins = TimeBinSeries::new(4096, 1e-12);
        bins.reset_trial(22.0);
        let result = fake_result(true, 0, 12.0);
        let trace = recharge_trace(&bins, &result, 22.0);
        // After one τ_rc the trace has covered ~63% of the swing.
        let bin_at_tau = (RECHARGE_TAU / 1e-12) as usize;
        let expected = 12.0 + 10.0 * (1.0 - (-1.0f64).exp());
        assert!((trace[bin_at_tau] - expected).abs() < 0.02);
    }

    #[test]
    fn non_breakdown_trace_untouched() {
        let mut bins = TimeBinSeries::new(16, 1e-12);
        bins.reset_trial(20.0);
        bins.v_num[7] = 19.5;
        let result = fake_result(false, 15, 20.0);
        let trace = recharge_trace(&bins, &result, 20.0);
        assert_eq!(trace, bins.v_num);
    }
}
