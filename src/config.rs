//! TOML-based run configuration and preset definitions.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::disagg::preprocess::PreprocessOptions;
use crate::disagg::shape::Shape;

/// Top-level disaggregation configuration parsed from TOML.
///
/// All fields have defaults matching the `default` preset. Load from TOML
/// with [`DisaggConfig::from_toml_file`] or use [`DisaggConfig::from_preset`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisaggConfig {
    /// Labelled runs, each evaluated independently on the same input.
    #[serde(default = "default_runs")]
    pub runs: Vec<RunConfig>,
    /// SOC and netting options.
    #[serde(default)]
    pub preprocess: PreprocessConfig,
    /// Numeric floors.
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    /// Shape extractor selection.
    #[serde(default)]
    pub shape: ShapeConfig,
}

fn default_runs() -> Vec<RunConfig> {
    vec![RunConfig::default()]
}

/// One labelled run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Label attached to every output row of this run.
    pub kind: String,
    /// Round-trip efficiency in (0, 1].
    pub eff: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            kind: "default".to_string(),
            eff: 1.0,
        }
    }
}

/// Preprocessing options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessConfig {
    /// Rebuild internal charge/discharge from SOC differences.
    pub net_flows: bool,
    /// Largest SOC magnitude still treated as the empty-storage origin.
    pub origin_tolerance: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            net_flows: true,
            origin_tolerance: 0.0,
        }
    }
}

/// Absolute numeric floors.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdConfig {
    /// Internal power below this is zeroed after preprocessing.
    pub power_floor: f64,
    /// Residual profile values below this are not allocated.
    pub allocation_floor: f64,
    /// Per-event residuals below this are clamped to zero after matching.
    pub residual_floor: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            power_floor: 1e-9,
            allocation_floor: 1e-10,
            residual_floor: 1e-3,
        }
    }
}

/// Shape extractor selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShapeConfig {
    /// One of [`Shape::MODELS`].
    pub model: String,
}

impl Default for ShapeConfig {
    fn default() -> Self {
        Self {
            model: "level_cut".to_string(),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"runs[0].eff"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl Default for DisaggConfig {
    fn default() -> Self {
        Self {
            runs: default_runs(),
            preprocess: PreprocessConfig::default(),
            thresholds: ThresholdConfig::default(),
            shape: ShapeConfig::default(),
        }
    }
}

impl DisaggConfig {
    /// Returns the proportional preset: uniform scaling instead of peak cuts.
    pub fn proportional() -> Self {
        Self {
            shape: ShapeConfig {
                model: "proportional".to_string(),
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["default", "proportional"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "default" => Ok(Self::default()),
            "proportional" => Ok(Self::proportional()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.runs.is_empty() {
            errors.push(ConfigError {
                field: "runs".into(),
                message: "at least one run is required".into(),
            });
        }
        for (i, run) in self.runs.iter().enumerate() {
            if run.kind.trim().is_empty() {
                errors.push(ConfigError {
                    field: format!("runs[{i}].kind"),
                    message: "must not be empty".into(),
                });
            }
            if self.runs[..i].iter().any(|r| r.kind == run.kind) {
                errors.push(ConfigError {
                    field: format!("runs[{i}].kind"),
                    message: format!("duplicate kind \"{}\"", run.kind),
                });
            }
            if !(run.eff > 0.0 && run.eff <= 1.0) {
                errors.push(ConfigError {
                    field: format!("runs[{i}].eff"),
                    message: format!("must be in (0.0, 1.0], got {}", run.eff),
                });
            }
        }

        let tol = self.preprocess.origin_tolerance;
        if tol.is_nan() || tol < 0.0 {
            errors.push(ConfigError {
                field: "preprocess.origin_tolerance".into(),
                message: "must be >= 0".into(),
            });
        }

        let t = &self.thresholds;
        for (name, value) in [
            ("power_floor", t.power_floor),
            ("allocation_floor", t.allocation_floor),
            ("residual_floor", t.residual_floor),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ConfigError {
                    field: format!("thresholds.{name}"),
                    message: "must be finite and >= 0".into(),
                });
            }
        }

        if Shape::from_name(&self.shape.model).is_none() {
            errors.push(ConfigError {
                field: "shape.model".into(),
                message: format!(
                    "must be one of {}, got \"{}\"",
                    Shape::MODELS.join(", "),
                    self.shape.model
                ),
            });
        }

        errors
    }

    /// Preprocessing options for the engine.
    pub fn preprocess_options(&self) -> PreprocessOptions {
        PreprocessOptions {
            net_flows: self.preprocess.net_flows,
            origin_tolerance: self.preprocess.origin_tolerance,
            power_floor: self.thresholds.power_floor,
        }
    }

    /// Shape extractor named by `shape.model`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the model is unknown.
    pub fn shape(&self) -> Result<Shape, ConfigError> {
        Shape::from_name(&self.shape.model).ok_or_else(|| ConfigError {
            field: "shape.model".into(),
            message: format!("unknown model \"{}\"", self.shape.model),
        })
    }
}
