//! Level parameters and their validation.
//!
//! Callers hand in raw numbers (from a config file, a CLI flag, or a genetic
//! gene vector). `LevelParams::validate` turns them into a checked pair.
//! Two modes exist:
//! - `Strict` rejects anything that is not a positive window and a
//!   non-negative integer bias.
//! - `Coerce` keeps the historical permissive behaviour: when either value is
//!   fractional or out of range, both become `ceil(|x|)`.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validated `(window_size, bias)` pair for the level annotator.
///
/// Deserialization goes through `try_new`, so a zero window is rejected on
/// load rather than reaching the annotator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawLevelParams")]
pub struct LevelParams {
    /// Number of bars in the rolling window (>= 1).
    pub window_size: usize,
    /// Extra bars the levels are shifted into the past (>= 0).
    pub bias: usize,
}

/// How out-of-range or fractional parameters are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    Strict,
    #[default]
    Coerce,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParamError {
    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },
    #[error("{name} must be an integer, got {value}")]
    NotInteger { name: &'static str, value: f64 },
    #[error("window_size must be >= 1, got {0}")]
    WindowTooSmall(f64),
    #[error("bias must be >= 0, got {0}")]
    NegativeBias(f64),
}

#[derive(Deserialize)]
struct RawLevelParams {
    window_size: usize,
    bias: usize,
}

impl TryFrom<RawLevelParams> for LevelParams {
    type Error = ParamError;

    fn try_from(raw: RawLevelParams) -> Result<Self, Self::Error> {
        Self::try_new(raw.window_size, raw.bias)
    }
}

impl LevelParams {
    /// Build params from already-checked integers.
    ///
    /// Panics if `window_size` is zero. Use `try_new` for unchecked input.
    pub fn new(window_size: usize, bias: usize) -> Self {
        assert!(window_size >= 1, "window_size must be >= 1");
        Self { window_size, bias }
    }

    pub fn try_new(window_size: usize, bias: usize) -> Result<Self, ParamError> {
        if window_size == 0 {
            return Err(ParamError::WindowTooSmall(0.0));
        }
        Ok(Self { window_size, bias })
    }

    /// Validate raw numeric parameters according to `mode`.
    pub fn validate(window_size: f64, bias: f64, mode: ValidationMode) -> Result<Self, ParamError> {
        check_finite("window_size", window_size)?;
        check_finite("bias", bias)?;

        match mode {
            ValidationMode::Strict => {
                if window_size.fract() != 0.0 {
                    return Err(ParamError::NotInteger {
                        name: "window_size",
                        value: window_size,
                    });
                }
                if bias.fract() != 0.0 {
                    return Err(ParamError::NotInteger {
                        name: "bias",
                        value: bias,
                    });
                }
                if window_size < 1.0 {
                    return Err(ParamError::WindowTooSmall(window_size));
                }
                if bias < 0.0 {
                    return Err(ParamError::NegativeBias(bias));
                }
                Ok(Self {
                    window_size: window_size as usize,
                    bias: bias as usize,
                })
            }
            ValidationMode::Coerce => {
                let irregular = window_size.fract() != 0.0
                    || bias.fract() != 0.0
                    || window_size <= 0.0
                    || bias < 0.0;
                let (window_size, bias) = if irregular {
                    (window_size.abs().ceil(), bias.abs().ceil())
                } else {
                    (window_size, bias)
                };
                // ceil(|0|) is still zero: there is no empty rolling window.
                if window_size < 1.0 {
                    return Err(ParamError::WindowTooSmall(window_size));
                }
                Ok(Self {
                    window_size: window_size as usize,
                    bias: bias as usize,
                })
            }
        }
    }

    /// Number of leading bars consumed before the first level is known.
    pub fn warmup_bars(&self) -> usize {
        self.window_size + self.bias - 1
    }
}

impl fmt::Display for LevelParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window={} bias={}", self.window_size, self.bias)
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), ParamError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParamError::NotFinite { name, value })
    }
}
