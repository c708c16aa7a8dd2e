//! # spadmc-core
//!
//! **Ensemble Monte Carlo engine for single-photon avalanche diodes.**
//!
//! For each applied bias the engine tracks every electron and hole through a
//! reverse-biased multiplication region — ballistic free flights in the local
//! field, discrete scattering events (phonon absorption, phonon emission,
//! impact ionization, self-scattering), Ramo-theorem current induction — and
//! couples the induced current to an external R–C quench circuit whose
//! voltage sag feeds back into the field profile. Out the other end come
//! multiplication gain M, excess noise factor F, breakdown probability Pb,
//! time-to-breakdown statistics and per-trial current/voltage transients.
//!
//! ## Quick start
//!
//! ```no_run
//! use spadmc_core::{run_sweep, SimConfig};
//!
//! let config = SimConfig::new(10_000.0); // 10 kΩ series resistor
//! let summaries = run_sweep(&config).unwrap();
//! for s in &summaries {
//!     println!("V={} M={:.2} F={:.2} Pb={:.3}", s.v_bias, s.gain, s.excess_noise,
//!         s.breakdown_probability);
//! }
//! ```
//!
//! ## Architecture
//!
//! Bias sweep → trials → (transport kernel ↔ carrier pool ↔ device field) →
//! circuit solver → back into the device field.
//!
//! Everything is single-threaded and sequential: one MT19937 stream drives
//! every draw in a pinned order, so a seed plus the input files reproduces a
//! run exactly. The two auxiliary modes ([`ionization`] coefficients and
//! [`drift`] velocity) reuse the same scattering kernel without the circuit.

pub mod carrier;
pub mod circuit;
pub mod config;
pub mod device;
pub mod drift;
pub mod error;
pub mod ionization;
pub mod material;
pub mod output;
pub mod rng;
pub mod sweep;
pub mod tables;
pub mod transport;
pub mod trial;

pub use carrier::{Carrier, CarrierPool, Injection, Species};
pub use circuit::{CircuitSolver, TimeBinSeries, BREAKDOWN_CURRENT};
pub use config::{FieldSweep, SimConfig};
pub use device::{DeviceField, DopingStack};
pub use error::{Result, SmcError};
pub use material::{Material, MaterialParams};
pub use rng::{Mt19937, DEVICE_SEED, FIELD_SWEEP_SEED};
pub use sweep::{run_sweep, BiasSummary, TRIALS_TO_SAVE};
pub use tables::{ScatteringTables, SpeciesTable};
pub use transport::Transport;
pub use trial::{TrialDriver, TrialResult};

/// Library version (from Cargo.toml).
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
