//! Plain-text output writers.
//!
//! Every result file is whitespace- or comma-separated text, streamed through
//! buffered writers. Per-bias file names carry the bias formatted `%g`-style
//! as a prefix (`22time_to_breakdown.txt`, `22.5gain_out.txt`, …).

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, SmcError};

/// `%g`-style formatting: up to six significant digits, trailing zeros
/// stripped, scientific notation outside `[1e-4, 1e6)`.
pub fn format_g(x: f64) -> String {
    if x == 0.0 {
        return "0".to_string();
    }
    if !x.is_finite() {
        return format!("{x}");
    }
    let mut exp = x.abs().log10().floor() as i32;
    // log10 can land one ulp under an exact power of ten.
    if x.abs() / 10f64.powi(exp) >= 10.0 {
        exp += 1;
    }
    if (-4..6).contains(&exp) {
        let decimals = (5 - exp).max(0) as usize;
        trim_zeros(format!("{x:.decimals$}"))
    } else {
        let mantissa = x / 10f64.powi(exp);
        let m = trim_zeros(format!("{mantissa:.5}"));
        format!("{}e{}{:02}", m, if exp < 0 { "-" } else { "+" }, exp.abs())
    }
}

fn trim_zeros(s: String) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

/// Per-bias output path: `<dir>/<bias><name>`.
pub fn bias_path(dir: &Path, v_bias: f64, name: &str) -> PathBuf {
    dir.join(format!("{}{name}", format_g(v_bias)))
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| SmcError::io(path, e))
}

/// `Result_1.txt`: one summary line per bias, flushed as it lands.
pub struct SummaryWriter {
    path: PathBuf,
    out: BufWriter<File>,
}

impl SummaryWriter {
    pub fn open(dir: &Path) -> Result<Self> {
        let path = dir.join("Result_1.txt");
        Ok(Self {
            out: create(&path)?,
            path,
        })
    }

    pub fn record(
        &mut self,
        v_bias: f64,
        gain: f64,
        excess_noise: f64,
        pb: f64,
        cutoff: bool,
    ) -> Result<()> {
        if cutoff {
            writeln!(self.out, "V= {v_bias:.6} M= cutoff F= cutoff, Pb= {pb:.6}")
        } else {
            writeln!(
                self.out,
                "V= {v_bias:.6} M= {gain:.6} F= {excess_noise:.6}, Pb= {pb:.6}"
            )
        }
        .and_then(|()| self.out.flush())
        .map_err(|e| SmcError::io(&self.path, e))
    }
}

/// The per-trial record files of one bias point.
pub struct BiasWriters {
    tb_path: PathBuf,
    breakdown_times: BufWriter<File>,
    gain_path: PathBuf,
    gain: BufWriter<File>,
    // Reserved event-count dump; created, currently left empty.
    _events: BufWriter<File>,
}

impl BiasWriters {
    pub fn open(dir: &Path, v_bias: f64) -> Result<Self> {
        let tb_path = bias_path(dir, v_bias, "time_to_breakdown.txt");
        let gain_path = bias_path(dir, v_bias, "gain_out.txt");
        let events_path = bias_path(dir, v_bias, "eventcounter.txt");
        Ok(Self {
            breakdown_times: create(&tb_path)?,
            tb_path,
            gain: create(&gain_path)?,
            gain_path,
            _events: create(&events_path)?,
        })
    }

    /// One `<trial> <t_bd>` line per breakdown trial.
    pub fn record_breakdown(&mut self, trial: usize, t_bd: f64) -> Result<()> {
        writeln!(self.breakdown_times, "{trial} {}", format_g(t_bd))
            .and_then(|()| self.breakdown_times.flush())
            .map_err(|e| SmcError::io(&self.tb_path, e))
    }

    /// One `<trial> <charge> <tn>` line per trial.
    pub fn record_gain(&mut self, trial: usize, charge_electrons: f64, tn: f64) -> Result<()> {
        writeln!(
            self.gain,
            "{trial} {} {}",
            format_g(charge_electrons),
            format_g(tn)
        )
        .and_then(|()| self.gain.flush())
        .map_err(|e| SmcError::io(&self.gain_path, e))
    }
}

/// `<n>_trial_current.txt` / `<n>_trial_voltage.txt`: CSV `t,value` rows.
pub fn write_trial_traces(
    dir: &Path,
    trial: usize,
    dt: f64,
    current: &[f64],
    voltage: &[f64],
) -> Result<()> {
    for (name, series) in [("current", current), ("voltage", voltage)] {
        let path = dir.join(format!("{trial}_trial_{name}.txt"));
        let mut out = create(&path)?;
        let rows = series.len().saturating_sub(1);
        for (bin, &value) in series.iter().enumerate().take(rows) {
            writeln!(out, "{},{}", format_g(bin as f64 * dt), format_g(value))
                .map_err(|e| SmcError::io(&path, e))?;
        }
        out.flush().map_err(|e| SmcError::io(&path, e))?;
    }
    Ok(())
}

/// `<V>current.txt`: mean current transient, written only for sweeps with
/// zero breakdowns.
pub fn write_mean_current(
    dir: &Path,
    v_bias: f64,
    dt: f64,
    i_avg: &[f64],
    n_trials: usize,
) -> Result<()> {
    let path = bias_path(dir, v_bias, "current.txt");
    let mut out = create(&path)?;
    writeln!(out, "V= {v_bias:.6}").map_err(|e| SmcError::io(&path, e))?;
    writeln!(out, "time step size in {dt:e} s").map_err(|e| SmcError::io(&path, e))?;
    writeln!(out, "t                I ").map_err(|e| SmcError::io(&path, e))?;
    for (bin, &i) in i_avg.iter().enumerate() {
        let mean = i / n_trials as f64;
        writeln!(out, "{} {} ", format_g(bin as f64 * dt), format_g(mean))
            .map_err(|e| SmcError::io(&path, e))?;
    }
    out.flush().map_err(|e| SmcError::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn g_format_matches_printf() {
        assert_eq!(format_g(0.0), "0");
        assert_eq!(format_g(22.0), "22");
        assert_eq!(format_g(22.5), "22.5");
        assert_eq!(format_g(-3.25), "-3.25");
        assert_eq!(format_g(5e-13), "5e-13");
        assert_eq!(format_g(1e6), "1e+06");
        assert_eq!(format_g(0.00012), "0.00012");
        assert_eq!(format_g(123456.0), "123456");
    }

    #[test]
    fn bias_prefixed_names() {
        let dir = Path::new("run");
        assert_eq!(
            bias_path(dir, 22.0, "gain_out.txt"),
            dir.join("22gain_out.txt")
        );
        assert_eq!(
            bias_path(dir, 22.5, "time_to_breakdown.txt"),
            dir.join("22.5time_to_breakdown.txt")
        );
    }

    #[test]
    fn trace_files_are_csv() {
        let dir = tempfile::tempdir().unwrap();
        let current = vec![0.0, 1e-6, 2e-6, 0.0];
        let voltage = vec![20.0, 19.9, 19.8, 20.0];
        write_trial_traces(dir.path(), 3, 1e-12, &current, &voltage).unwrap();
        let text = std::fs::read_to_string(dir.path().join("3_trial_current.txt")).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        // One row per bin except the last.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], "1e-12,1e-06");
    }

    #[test]
    fn summary_lines() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = SummaryWriter::open(dir.path()).unwrap();
        writer.record(22.0, 9.25, 3.1, 0.125, false).unwrap();
        writer.record(25.0, 0.0, f64::NAN, 0.75, true).unwrap();
        drop(writer);
        let text = std::fs::read_to_string(dir.path().join("Result_1.txt")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "V= 22.000000 M= 9.250000 F= 3.100000, Pb= 0.125000");
        assert_eq!(lines[1], "V= 25.000000 M= cutoff F= cutoff, Pb= 0.750000");
    }
}
