//! One-dimensional device field profile.
//!
//! Reads a layered doping stack from `doping_profile.txt` and, for a given
//! reverse bias, solves a depletion-approximation field profile across the
//! p / (i) / n stack. The profile is sampled onto a fixed grid of cell
//! midpoints; `field_at` is a cell lookup.
//!
//! `profile(V)` is memoized by the millivolt-truncated bias. The circuit
//! solver re-biases the device mid-trial at millivolt resolution, so the
//! truncated key doubles as the cache key and repeated quench transients hit
//! the same handful of solved profiles.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{Result, SmcError};
use crate::material::{MaterialParams, EPS0, KB, Q};

/// Grid cells per solved profile.
const NCELLS: usize = 512;

/// Layer type in the doping stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    P,
    I,
    N,
}

/// One layer of the stack: thickness (m) and doping (m⁻³).
#[derive(Debug, Clone, Copy)]
pub struct Layer {
    pub width: f64,
    pub doping: f64,
    pub kind: LayerKind,
}

/// Validated p / optional-i / n stack.
#[derive(Debug, Clone)]
pub struct DopingStack {
    pub p: Layer,
    pub i: Option<Layer>,
    pub n: Layer,
}

impl DopingStack {
    /// Validate a parsed layer sequence as p / (i) / n.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        let mut iter = layers.into_iter();
        let (p, mid, n) = match (iter.next(), iter.next(), iter.next(), iter.next()) {
            (Some(a), Some(b), None, None) => (a, None, b),
            (Some(a), Some(b), Some(c), None) => (a, Some(b), c),
            _ => {
                return Err(SmcError::Profile(
                    "expected 2 or 3 layers (p [i] n)".to_string(),
                ));
            }
        };
        if p.kind != LayerKind::P || n.kind != LayerKind::N {
            return Err(SmcError::Profile(
                "stack must start with a p layer and end with an n layer".to_string(),
            ));
        }
        if let Some(i) = mid {
            if i.kind != LayerKind::I {
                return Err(SmcError::Profile("middle layer must be intrinsic".to_string()));
            }
        }
        if p.width <= 0.0 || n.width <= 0.0 || p.doping <= 0.0 || n.doping <= 0.0 {
            return Err(SmcError::Profile(
                "layer widths and dopings must be positive".to_string(),
            ));
        }
        Ok(Self { p, i: mid, n })
    }

    /// Parse `doping_profile.txt`: one `width_m doping_m3 type` line per
    /// layer, `#` comments and blank lines ignored.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| SmcError::io(path, e))?;
        let mut layers = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parse = |field: &str, what: &str| {
                field.parse::<f64>().map_err(|_| SmcError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: format!("bad {what} '{field}'"),
                })
            };
            let mut fields = line.split_whitespace();
            let (Some(w), Some(d), Some(k)) = (fields.next(), fields.next(), fields.next()) else {
                return Err(SmcError::Parse {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    message: "expected 'width doping type'".to_string(),
                });
            };
            let kind = match k {
                "p" | "P" => LayerKind::P,
                "i" | "I" => LayerKind::I,
                "n" | "N" => LayerKind::N,
                other => {
                    return Err(SmcError::Parse {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        message: format!("bad layer type '{other}'"),
                    });
                }
            };
            layers.push(Layer {
                width: parse(w, "width")?,
                doping: parse(d, "doping")?,
                kind,
            });
        }
        Self::from_layers(layers)
    }
}

/// One solved field profile at a fixed bias.
#[derive(Debug, Clone)]
struct FieldProfile {
    x_min: f64,
    x_max: f64,
    width: f64,
    cell: f64,
    grid: Vec<f64>,
}

impl FieldProfile {
    fn solve(stack: &DopingStack, params: &MaterialParams, bias: f64) -> Self {
        let eps = EPS0 * params.relative_permittivity;
        let na = stack.p.doping;
        let nd = stack.n.doping;
        let wp = stack.p.width;
        let wn = stack.n.width;
        let wi = stack.i.map_or(0.0, |l| l.width);

        let vbi = KB * params.lattice_temperature / Q
            * (na * nd / (params.intrinsic_density * params.intrinsic_density)).ln();
        let phi = (bias + vbi).max(1e-3);

        // Depletion depths from charge balance Na·xp = Nd·xn and the
        // integrated potential a·xp² + b·xp = phi.
        let a = Q * na / (2.0 * eps) * (1.0 + na / nd);
        let b = Q * na * wi / eps;
        let xp = ((-b + (b * b + 4.0 * a * phi).sqrt()) / (2.0 * a)).min(wp);
        let xn = (na * xp / nd).min(wn);

        // Achieved potential with clamped depths; any punch-through deficit
        // appears as a uniform field on top of the triangular profile.
        let peak = Q * na * xp / eps;
        let achieved =
            Q * na * xp * xp / (2.0 * eps) + peak * wi + Q * nd * xn * xn / (2.0 * eps);
        let x_min = wp - xp;
        let x_max = wp + wi + xn;
        let width = x_max - x_min;
        let extra = ((phi - achieved) / width).max(0.0);

        let cell = width / NCELLS as f64;
        let mut grid = Vec::with_capacity(NCELLS);
        for c in 0..NCELLS {
            let x = x_min + (c as f64 + 0.5) * cell;
            let triangular = if x < wp {
                Q * na * (x - x_min) / eps
            } else if x < wp + wi {
                peak
            } else {
                (peak - Q * nd * (x - wp - wi) / eps).max(0.0)
            };
            grid.push(triangular + extra);
        }

        Self {
            x_min,
            x_max,
            width,
            cell,
            grid,
        }
    }

    fn field_at(&self, x: f64) -> f64 {
        let idx = ((x - self.x_min) / self.cell) as usize;
        self.grid[idx.min(NCELLS - 1)]
    }
}

/// Device under bias: the doping stack plus the active field profile.
pub struct DeviceField {
    params: &'static MaterialParams,
    stack: DopingStack,
    cache: HashMap<i64, FieldProfile>,
    current: FieldProfile,
}

/// Millivolt truncation used both for re-biasing and as the cache key.
fn quantize_mv(bias: f64) -> i64 {
    (bias * 1000.0).trunc() as i64
}

impl DeviceField {
    /// Build from an already-validated stack; starts at zero bias.
    pub fn new(stack: DopingStack, params: &'static MaterialParams) -> Self {
        let current = FieldProfile::solve(&stack, params, 0.0);
        let mut cache = HashMap::new();
        cache.insert(0, current.clone());
        Self {
            params,
            stack,
            cache,
            current,
        }
    }

    /// Build from `doping_profile.txt`.
    pub fn from_file(path: &Path, params: &'static MaterialParams) -> Result<Self> {
        Ok(Self::new(DopingStack::from_file(path)?, params))
    }

    /// Re-solve (or recall) the field profile for a bias. All subsequent
    /// `field_at` calls reflect this bias exclusively.
    pub fn profile(&mut self, bias: f64) {
        let key = quantize_mv(bias);
        let profile = self
            .cache
            .entry(key)
            .or_insert_with(|| {
                log::debug!("solving field profile at {key} mV");
                FieldProfile::solve(&self.stack, self.params, key as f64 / 1000.0)
            })
            .clone();
        self.current = profile;
    }

    /// Field magnitude (V/m) at a position inside the depletion region.
    pub fn field_at(&self, x: f64) -> f64 {
        self.current.field_at(x)
    }

    pub fn x_min(&self) -> f64 {
        self.current.x_min
    }

    pub fn x_max(&self) -> f64 {
        self.current.x_max
    }

    /// Depletion width (m).
    pub fn width(&self) -> f64 {
        self.current.width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use std::io::Write;

    fn pin_stack() -> DopingStack {
        DopingStack::from_layers(vec![
            Layer {
                width: 1.0e-7,
                doping: 1.0e24,
                kind: LayerKind::P,
            },
            Layer {
                width: 5.0e-7,
                doping: 1.0e20,
                kind: LayerKind::I,
            },
            Layer {
                width: 1.0e-7,
                doping: 1.0e24,
                kind: LayerKind::N,
            },
        ])
        .unwrap()
    }

    #[test]
    fn parses_profile_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doping_profile.txt");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "# p / i / n stack").unwrap();
        writeln!(f, "1.0e-7 1.0e24 p").unwrap();
        writeln!(f, "5.0e-7 1.0e20 i").unwrap();
        writeln!(f, "1.0e-7 1.0e24 n").unwrap();
        let stack = DopingStack::from_file(&path).unwrap();
        assert!(stack.i.is_some());
        assert_eq!(stack.p.kind, LayerKind::P);
    }

    #[test]
    fn rejects_bad_stack_order() {
        let layers = vec![
            Layer {
                width: 1.0e-7,
                doping: 1.0e24,
                kind: LayerKind::N,
            },
            Layer {
                width: 1.0e-7,
                doping: 1.0e24,
                kind: LayerKind::P,
            },
        ];
        assert!(DopingStack::from_layers(layers).is_err());
    }

    #[test]
    fn rejects_malformed_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doping_profile.txt");
        fs::write(&path, "1.0e-7 oops p\n").unwrap();
        assert!(matches!(
            DopingStack::from_file(&path),
            Err(SmcError::Parse { .. })
        ));
    }

    #[test]
    fn profile_is_idempotent() {
        let params = Material::Silicon.params();
        let mut dev = DeviceField::new(pin_stack(), params);
        dev.profile(20.0);
        let first: Vec<f64> = (0..8)
            .map(|k| dev.field_at(dev.x_min() + dev.width() * (k as f64 + 0.5) / 8.0))
            .collect();
        let w = dev.width();
        dev.profile(20.0);
        let second: Vec<f64> = (0..8)
            .map(|k| dev.field_at(dev.x_min() + dev.width() * (k as f64 + 0.5) / 8.0))
            .collect();
        assert_eq!(first, second);
        assert_eq!(w, dev.width());
    }

    #[test]
    fn millivolt_truncation_shares_profiles() {
        let params = Material::Silicon.params();
        let mut dev = DeviceField::new(pin_stack(), params);
        dev.profile(20.0001);
        let a = dev.field_at(dev.x_min() + dev.width() / 2.0);
        dev.profile(20.0009);
        let b = dev.field_at(dev.x_min() + dev.width() / 2.0);
        assert_eq!(a, b);
    }

    #[test]
    fn field_rises_with_bias() {
        let params = Material::Silicon.params();
        let mut dev = DeviceField::new(pin_stack(), params);
        dev.profile(10.0);
        let low = dev.field_at(dev.x_min() + dev.width() / 2.0);
        dev.profile(40.0);
        let high = dev.field_at(dev.x_min() + dev.width() / 2.0);
        assert!(high > low, "low={low} high={high}");
    }

    #[test]
    fn punch_through_keeps_domain_bounded() {
        let params = Material::Silicon.params();
        let mut dev = DeviceField::new(pin_stack(), params);
        dev.profile(200.0);
        let total = 1.0e-7 + 5.0e-7 + 1.0e-7;
        assert!(dev.width() <= total + 1e-12);
        assert!(dev.x_min() >= -1e-12);
        assert!(dev.field_at(dev.x_min() + dev.width() / 2.0).is_finite());
    }
}
