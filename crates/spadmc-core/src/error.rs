//! Error taxonomy for the simulation core.
//!
//! Anything that would leave the engine with undefined downstream behavior
//! (unreadable input file, malformed line, unnormalizable scattering table,
//! undepleable doping stack) is a hard failure carried as a [`SmcError`].
//! Numerical oddities inside a trial are never errors — the transport kernel
//! clamps and continues.

use std::path::PathBuf;

use thiserror::Error;

/// All fatal conditions raised by the core.
#[derive(Debug, Error)]
pub enum SmcError {
    /// A required input or output file could not be opened or read.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A malformed line in a whitespace-separated input file.
    #[error("{}:{line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Scattering-table construction produced a cumulative probability
    /// above 1 — the rate model and Γ are inconsistent.
    #[error("cumulative {species} scattering probability {value} > 1 at energy bin {bin}")]
    Tables {
        species: &'static str,
        bin: usize,
        value: f64,
    },

    /// The doping stack cannot be turned into a field profile.
    #[error("doping profile: {0}")]
    Profile(String),
}

impl SmcError {
    /// Attach a path to a raw I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SmcError>;
