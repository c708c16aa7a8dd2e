//! One-trial driver: seed, sweep to completion, book the results.
//!
//! A trial runs the transport kernel until no carrier is left inside the
//! device or the early-exit rule fires (more carriers in flight than the
//! Ramo estimate needs to sustain the breakdown current, and some bin
//! already above it). Termination bookkeeping scans the trial's current
//! series for the first breakdown crossing and integrates the induced
//! charge.

use crate::carrier::{Carrier, Injection};
use crate::circuit::{CircuitSolver, TimeBinSeries, BREAKDOWN_CURRENT};
use crate::device::DeviceField;
use crate::material::Q;
use crate::rng::Mt19937;
use crate::transport::{EventCounters, Transport, TrialState};

/// Outcome of one trial.
#[derive(Debug, Clone)]
pub struct TrialResult {
    /// Multiplication: pairs generated including the seed pair.
    pub multiplication: u64,
    /// Whether the trial's current crossed the breakdown threshold.
    pub breakdown: bool,
    /// First bin above threshold (end-of-trial scan), if any.
    pub breakdown_bin: Option<usize>,
    /// Earliest breakdown bin the circuit solver observed mid-trial; used
    /// for the recharge overwrite on saved voltage traces.
    pub quench_bin: usize,
    /// Minimum diode voltage reached during the trial (V).
    pub min_voltage: f64,
    /// Whether any carrier hit the simulation-time cutoff.
    pub cutoff: bool,
    /// Trapezoidal charge under the trial's current curve, in units of q.
    pub charge_electrons: f64,
    pub counters: EventCounters,
}

/// Driver for the trials of one bias point.
pub struct TrialDriver<'a> {
    pub transport: Transport<'a>,
    pub circuit: CircuitSolver,
    pub injection: Injection,
    pub n_bins: usize,
}

impl TrialDriver<'_> {
    /// Number of in-flight carriers that, at saturated velocity, would
    /// sustain the breakdown current (Ramo estimate).
    pub fn carrier_limit(&self, device: &DeviceField) -> f64 {
        BREAKDOWN_CURRENT * device.width() / (5.0 * Q * 1e5)
    }

    /// Run one trial to completion or early exit.
    pub fn run(
        &self,
        rng: &mut Mt19937,
        device: &mut DeviceField,
        bins: &mut TimeBinSeries,
        state: &mut TrialState,
    ) -> TrialResult {
        let v_bias = self.circuit.v_bias;

        // Every trial starts from the supply bias and its field profile.
        device.profile(v_bias);
        bins.reset_trial(v_bias);
        state.reset(v_bias, self.n_bins, bins.dt);

        match self.injection {
            Injection::PureElectron => {
                state.pool.seed(
                    Carrier::seeded(device.x_min() + 1e-10),
                    // Hole parked out of range; keeps pair indices aligned.
                    Carrier::seeded(device.x_min() - 1.0),
                );
            }
            Injection::PureHole => {
                state.pool.seed(
                    Carrier::seeded(device.x_max() + 1e-10),
                    Carrier::seeded(device.x_max() - 1e-10),
                );
            }
        }
        state.present = 1;

        let carrier_limit = self.carrier_limit(device);
        let cutoff_time = (self.n_bins as f64 - 5.0) * bins.dt;

        while state.present > 0 {
            self.transport
                .sweep(rng, device, &self.circuit, bins, state, cutoff_time);
            // Early exit once the avalanche is self-sustaining.
            if state.present as f64 > carrier_limit
                && bins.i_num.iter().any(|&i| i > BREAKDOWN_CURRENT)
            {
                break;
            }
        }

        let breakdown_bin = bins.i_num.iter().position(|&i| i > BREAKDOWN_CURRENT);

        // Trapezium rule over the current transient, in elementary charges.
        let mut area = 0.0;
        for window in bins.i_num.windows(2) {
            area += 0.5 * (window[0] + window[1]) * bins.dt;
        }
        let charge_electrons = area / Q;

        TrialResult {
            multiplication: state.pairs_generated,
            breakdown: breakdown_bin.is_some(),
            breakdown_bin,
            quench_bin: state.tracker.first_bd_bin,
            min_voltage: state.tracker.min_voltage,
            cutoff: state.cutoff,
            charge_electrons,
            counters: state.counters,
        }
    }
}
