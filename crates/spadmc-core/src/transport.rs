//! Carrier transport kernel: drift, scattering and Ramo current.
//!
//! One sweep walks every pair index once, electron then hole, advancing each
//! carrier whose own clock lags the global clock. A carrier visit is one
//! free flight (exponentially distributed drift time at the constant total
//! rate Γ), the field impulse on its longitudinal momentum, the position
//! advance `dE/(q·E)`, then one scattering draw against the cumulative
//! tables. Impact ionization appends a fresh electron–hole pair at the end
//! of the pool, where the same sweep picks it up once the pair index reaches
//! it.
//!
//! Whenever a carrier's accumulated drift interval crosses time-bin
//! boundaries it commits `q·dx/(dt·W)` into every crossed bin (Ramo's
//! theorem) of both the per-trial and the cross-trial series, and each
//! committed bin immediately runs the circuit update, which may re-bias the
//! field under the carriers still in flight.
//!
//! RNG draw order is part of the reproducibility contract: direction redraw
//! (unless self-scattered), drift time, scattering draw — electron first,
//! then hole, in pair-index order.

use crate::carrier::{CarrierPool, Species};
use crate::circuit::{BreakdownTracker, CircuitSolver, TimeBinSeries};
use crate::device::DeviceField;
use crate::material::{MaterialParams, HBAR, Q};
use crate::rng::Mt19937;
use crate::tables::{energy_bin, ScatterOutcome, ScatteringTables, SpeciesTable};

/// Scattering-event tallies for one trial.
#[derive(Debug, Clone, Copy, Default)]
pub struct EventCounters {
    pub absorptions: u64,
    pub emissions: u64,
    pub ionizations: u64,
    pub electron_self_scatters: u64,
    pub hole_self_scatters: u64,
}

/// Mutable per-trial state threaded through the kernel.
pub struct TrialState {
    pub pool: CarrierPool,
    /// Carriers currently inside the device.
    pub present: i64,
    /// Total pairs generated, including the seed pair.
    pub pairs_generated: u64,
    /// Global clock (s); carriers only advance while behind it.
    pub global_t: f64,
    /// Set when any carrier was ejected at the simulation-time cutoff.
    pub cutoff: bool,
    pub counters: EventCounters,
    pub tracker: BreakdownTracker,
}

impl TrialState {
    pub fn new(v_bias: f64, n_bins: usize) -> Self {
        Self {
            pool: CarrierPool::new(),
            present: 0,
            pairs_generated: 0,
            global_t: 0.0,
            cutoff: false,
            counters: EventCounters::default(),
            tracker: BreakdownTracker::new(v_bias, n_bins),
        }
    }

    /// Reset for the next trial, keeping the pool's allocations.
    pub fn reset(&mut self, v_bias: f64, n_bins: usize, dt: f64) {
        self.pool.reset();
        self.present = 0;
        self.pairs_generated = 1;
        self.global_t = dt;
        self.cutoff = false;
        self.counters = EventCounters::default();
        self.tracker = BreakdownTracker::new(v_bias, n_bins);
    }
}

/// The drift + scatter kernel for one material.
pub struct Transport<'a> {
    params: &'static MaterialParams,
    tables: &'a ScatteringTables,
}

impl<'a> Transport<'a> {
    pub fn new(params: &'static MaterialParams, tables: &'a ScatteringTables) -> Self {
        Self { params, tables }
    }

    /// One full pass over all pair indices. Advances the global clock by Δt
    /// when no visited carrier remained behind it.
    #[allow(clippy::too_many_arguments)]
    pub fn sweep(
        &self,
        rng: &mut Mt19937,
        device: &mut DeviceField,
        circuit: &CircuitSolver,
        bins: &mut TimeBinSeries,
        state: &mut TrialState,
        cutoff_time: f64,
    ) {
        let mut flag: i32 = 0;
        let mut pair = 0;
        // Pairs spawned mid-sweep extend the range and are visited too.
        while pair < state.pool.pairs() {
            self.step(
                Species::Electron,
                pair,
                rng,
                device,
                circuit,
                bins,
                state,
                cutoff_time,
                &mut flag,
            );
            self.step(
                Species::Hole,
                pair,
                rng,
                device,
                circuit,
                bins,
                state,
                cutoff_time,
                &mut flag,
            );
            pair += 1;
        }
        if flag == 0 {
            state.global_t += bins.dt;
        }
    }

    fn species_table(&self, species: Species) -> (&SpeciesTable, f64, f64) {
        match species {
            Species::Electron => (
                self.tables.electron(),
                self.params.electron_mass,
                self.params.electron_threshold,
            ),
            Species::Hole => (
                self.tables.hole(),
                self.params.hole_mass,
                self.params.hole_threshold,
            ),
        }
    }

    /// Advance one carrier by one free flight, commit crossed bins, scatter.
    #[allow(clippy::too_many_arguments)]
    fn step(
        &self,
        species: Species,
        pair: usize,
        rng: &mut Mt19937,
        device: &mut DeviceField,
        circuit: &CircuitSolver,
        bins: &mut TimeBinSeries,
        state: &mut TrialState,
        cutoff_time: f64,
        flag: &mut i32,
    ) {
        let (table, mass, threshold) = self.species_table(species);
        let mut c = state.pool.get(species, pair);

        // Recover the rare numerical excursion out the wrong boundary.
        match species {
            Species::Electron if c.z < device.x_min() => {
                log::debug!("electron {pair} recovered from z={:.3e}", c.z);
                c.z = device.x_min() + 1e-10;
            }
            Species::Hole if c.z > device.x_max() => {
                log::debug!("hole {pair} recovered from z={:.3e}", c.z);
                c.z = device.x_max() - 1e-10;
            }
            _ => {}
        }

        let in_flight = match species {
            Species::Electron => c.z < device.x_max(),
            Species::Hole => c.z >= device.x_min(),
        };
        if !in_flight || c.t >= state.global_t {
            return;
        }
        *flag += 1;

        if !c.self_scattered {
            c.redraw_direction(mass, rng.uniform());
        }

        // Free flight.
        let tau = -rng.uniform().ln() / table.gamma;
        c.t += tau;
        c.dt += tau;

        let efield = device.field_at(c.z);
        let impulse = Q * tau * efield / HBAR;
        match species {
            Species::Electron => c.kz += impulse,
            Species::Hole => c.kz -= impulse,
        }
        let energy = HBAR * HBAR / (2.0 * mass) * (c.kxy + c.kz * c.kz);
        let de = energy - c.energy;
        c.energy = energy;
        let advance = de / (Q * efield);
        match species {
            Species::Electron => c.z += advance,
            Species::Hole => c.z -= advance,
        }
        c.dx += advance;

        if c.t > cutoff_time {
            // Out of simulated time: eject and flag the trial.
            c.z = match species {
                Species::Electron => device.x_max() + 10.0,
                Species::Hole => device.x_min() - 10.0,
            };
            state.cutoff = true;
        }

        if c.dt >= bins.dt {
            let reached = ((c.t / bins.dt).floor() as usize).min(bins.n_bins().saturating_sub(1));
            for bin in (c.bin + 1)..=reached {
                // Width is re-read per bin: the circuit feedback below may
                // re-profile the device while the commit loop runs.
                let contribution = Q * c.dx / (c.dt * device.width());
                bins.i_avg[bin] += contribution;
                bins.i_num[bin] += contribution;
                circuit.update_bin(bin, bins, device, &mut state.tracker);
            }
            c.bin = reached;
            c.dt = 0.0;
            c.dx = 0.0;
        }

        // Drift overshoot past the wrong boundary is clamped back inside.
        match species {
            Species::Electron if c.z < device.x_min() => c.z = device.x_min() + 1e-10,
            Species::Hole if c.z > device.x_max() => c.z = device.x_max() - 1e-10,
            _ => {}
        }

        let inside = match species {
            Species::Electron => c.z <= device.x_max(),
            Species::Hole => c.z >= device.x_min(),
        };
        if inside {
            let (bin_e, u) = if c.energy >= self.params.max_energy {
                // At saturation only ionization or self-scattering remain.
                (self.params.numpoints, table.saturated_draw())
            } else {
                (energy_bin(c.energy), rng.uniform())
            };
            match table.outcome(bin_e, u) {
                ScatterOutcome::Absorb => {
                    c.energy += self.params.phonon_energy;
                    state.counters.absorptions += 1;
                    c.self_scattered = false;
                }
                ScatterOutcome::Emit => {
                    c.energy -= self.params.phonon_energy;
                    state.counters.emissions += 1;
                    c.self_scattered = false;
                }
                ScatterOutcome::Ionize => {
                    c.energy = (c.energy - threshold) / 3.0;
                    let spawn_bin =
                        ((c.t / bins.dt).floor() as usize).min(bins.n_bins().saturating_sub(1));
                    state.pool.spawn_pair(c.z, c.energy, c.t, spawn_bin);
                    state.pairs_generated += 1;
                    state.present += 2;
                    state.counters.ionizations += 1;
                    c.self_scattered = false;
                }
                ScatterOutcome::SelfScatter => {
                    match species {
                        Species::Electron => state.counters.electron_self_scatters += 1,
                        Species::Hole => state.counters.hole_self_scatters += 1,
                    }
                    c.self_scattered = true;
                }
            }
        } else {
            state.present -= 1;
        }

        if c.t > state.global_t {
            *flag -= 1;
        }
        state.pool.put(species, pair, c);
    }
}
