//! Quality presets and error thresholds
//!
//! Resolves a named quality preset into a concrete target polygon count and
//! a size-relative Hausdorff tolerance into an absolute one.

use lowpoly_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Named quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityPreset {
    /// Lightweight assets for mobile and web
    Low,
    /// Balanced default
    Medium,
    /// Hero assets
    High,
    /// Caller-supplied target polygon count
    Custom,
}

impl QualityPreset {
    pub fn name(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
            QualityPreset::Custom => "custom",
        }
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(QualityPreset::Low),
            "medium" => Ok(QualityPreset::Medium),
            "high" => Ok(QualityPreset::High),
            "custom" => Ok(QualityPreset::Custom),
            other => Err(Error::InvalidConfiguration(format!(
                "unknown quality preset '{}', expected one of low, medium, high, custom",
                other
            ))),
        }
    }
}

/// Target polygon counts of the fixed presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresetTargets {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl PresetTargets {
    pub const LOW: usize = 25_000;
    pub const MEDIUM: usize = 100_000;
    pub const HIGH: usize = 200_000;

    /// Targets must be positive, distinct and increasing.
    pub fn validate(&self) -> Result<()> {
        if self.low == 0 || self.low >= self.medium || self.medium >= self.high {
            return Err(Error::InvalidConfiguration(format!(
                "preset targets must satisfy 0 < low < medium < high, got {} / {} / {}",
                self.low, self.medium, self.high
            )));
        }
        Ok(())
    }
}

impl Default for PresetTargets {
    fn default() -> Self {
        Self {
            low: Self::LOW,
            medium: Self::MEDIUM,
            high: Self::HIGH,
        }
    }
}

/// Absolute and relative Hausdorff tolerance of one decimation session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityThreshold {
    /// Fraction of the bounding-box diagonal
    pub relative: f64,
    /// `relative` scaled by the (floored) diagonal
    pub absolute: f64,
}

impl QualityThreshold {
    /// Scale `relative` by the mesh diagonal.
    pub fn from_diagonal(diagonal: f64, relative: f64) -> Result<Self> {
        validate_relative_threshold(relative)?;
        Ok(Self {
            relative,
            absolute: compute_adaptive_threshold(diagonal, relative),
        })
    }
}

fn validate_relative_threshold(relative: f64) -> Result<()> {
    if !relative.is_finite() || relative <= 0.0 {
        return Err(Error::InvalidConfiguration(format!(
            "relative Hausdorff threshold must be a positive number, got {}",
            relative
        )));
    }
    Ok(())
}

/// Absolute tolerance for a mesh of the given diagonal.
///
/// A zero, negative or non-finite diagonal is replaced with `1.0`, so the
/// result is never zero for a positive `relative`.
pub fn compute_adaptive_threshold(diagonal: f64, relative: f64) -> f64 {
    let diagonal = if diagonal.is_finite() && diagonal > 0.0 {
        diagonal
    } else {
        1.0
    };
    relative * diagonal
}

/// Maps presets to target polygon counts
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct QualityPolicy {
    pub targets: PresetTargets,
    /// Reject unknown preset names instead of falling back to medium
    pub strict: bool,
}

impl QualityPolicy {
    pub fn new(targets: PresetTargets, strict: bool) -> Result<Self> {
        targets.validate()?;
        Ok(Self { targets, strict })
    }

    /// Resolve a preset to its target polygon count.
    pub fn resolve(&self, preset: QualityPreset, custom_target: Option<usize>) -> Result<usize> {
        match preset {
            QualityPreset::Low => Ok(self.targets.low),
            QualityPreset::Medium => Ok(self.targets.medium),
            QualityPreset::High => Ok(self.targets.high),
            QualityPreset::Custom => match custom_target {
                Some(target) if target > 0 => Ok(target),
                Some(target) => Err(Error::InvalidConfiguration(format!(
                    "custom target must be a positive polygon count, got {}",
                    target
                ))),
                None => Err(Error::InvalidConfiguration(
                    "custom preset requires a target polygon count".to_string(),
                )),
            },
        }
    }

    /// Resolve a preset by name.
    ///
    /// Unknown names fall back to medium with a warning unless the policy is
    /// strict.
    pub fn resolve_named(&self, name: &str, custom_target: Option<usize>) -> Result<usize> {
        let preset = match name.parse::<QualityPreset>() {
            Ok(preset) => preset,
            Err(err) if self.strict => return Err(err),
            Err(_) => {
                warn!(preset = name, "unknown quality preset, falling back to medium");
                QualityPreset::Medium
            }
        };
        self.resolve(preset, custom_target)
    }
}

/// Settings of the adaptive decimation stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecimationConfig {
    /// Preset name: low, medium, high or custom
    pub preset: String,
    /// Target polygon count for the custom preset
    pub custom_target: Option<usize>,
    /// Hausdorff tolerance as a fraction of the bounding-box diagonal
    pub relative_threshold: f64,
    /// Decimation passes allowed per session
    pub max_attempts: usize,
    /// Reject unknown preset names
    pub strict_presets: bool,
    /// Target growth after a rejected attempt
    pub growth_factor: f64,
    pub targets: PresetTargets,
}

impl Default for DecimationConfig {
    fn default() -> Self {
        Self {
            preset: QualityPreset::Medium.name().to_string(),
            custom_target: None,
            relative_threshold: 0.001,
            max_attempts: 6,
            strict_presets: false,
            growth_factor: 1.5,
            targets: PresetTargets::default(),
        }
    }
}

impl DecimationConfig {
    pub const MIN_GROWTH_FACTOR: f64 = 1.5;

    pub fn validate(&self) -> Result<()> {
        validate_relative_threshold(self.relative_threshold)?;
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfiguration(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if !self.growth_factor.is_finite() || self.growth_factor < Self::MIN_GROWTH_FACTOR {
            return Err(Error::InvalidConfiguration(format!(
                "growth_factor must be at least {}, got {}",
                Self::MIN_GROWTH_FACTOR,
                self.growth_factor
            )));
        }
        self.targets.validate()
    }

    pub fn policy(&self) -> Result<QualityPolicy> {
        QualityPolicy::new(self.targets, self.strict_presets)
    }

    /// Validate and resolve the initial target polygon count.
    pub fn initial_target(&self) -> Result<usize> {
        self.validate()?;
        self.policy()?.resolve_named(&self.preset, self.custom_target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fixed_presets_are_increasing() {
        let policy = QualityPolicy::default();
        let low = policy.resolve(QualityPreset::Low, None).unwrap();
        let medium = policy.resolve(QualityPreset::Medium, None).unwrap();
        let high = policy.resolve(QualityPreset::High, None).unwrap();
        assert_eq!((low, medium, high), (25_000, 100_000, 200_000));
        assert!(low < medium && medium < high);
    }

    #[test]
    fn test_custom_requires_positive_target() {
        let policy = QualityPolicy::default();
        assert_eq!(policy.resolve(QualityPreset::Custom, Some(1234)).unwrap(), 1234);
        assert!(matches!(
            policy.resolve(QualityPreset::Custom, None),
            Err(Error::InvalidConfiguration(_))
        ));
        assert!(matches!(
            policy.resolve(QualityPreset::Custom, Some(0)),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_custom_target_ignored_for_fixed_presets() {
        let policy = QualityPolicy::default();
        assert_eq!(policy.resolve(QualityPreset::Low, Some(7)).unwrap(), 25_000);
    }

    #[test]
    fn test_unknown_preset_fallback() {
        let permissive = QualityPolicy::default();
        assert_eq!(permissive.resolve_named("ultra", None).unwrap(), 100_000);
        assert_eq!(permissive.resolve_named(" HIGH ", None).unwrap(), 200_000);

        let strict = QualityPolicy::new(PresetTargets::default(), true).unwrap();
        assert!(matches!(
            strict.resolve_named("ultra", None),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_preset_targets_validation() {
        let bad = PresetTargets {
            low: 100,
            medium: 100,
            high: 300,
        };
        assert!(bad.validate().is_err());
        assert!(QualityPolicy::new(bad, false).is_err());
    }

    #[test]
    fn test_adaptive_threshold() {
        assert_relative_eq!(compute_adaptive_threshold(10.0, 0.001), 0.01);
        // Degenerate diagonals are floored to 1.0
        assert_relative_eq!(compute_adaptive_threshold(0.0, 0.001), 0.001);
        assert_relative_eq!(compute_adaptive_threshold(-3.0, 0.001), 0.001);
        assert_relative_eq!(compute_adaptive_threshold(f64::NAN, 0.001), 0.001);
    }

    #[test]
    fn test_threshold_rejects_bad_relative() {
        assert!(QualityThreshold::from_diagonal(1.0, 0.0).is_err());
        assert!(QualityThreshold::from_diagonal(1.0, f64::INFINITY).is_err());
        let t = QualityThreshold::from_diagonal(0.0, 0.002).unwrap();
        assert!(t.absolute > 0.0);
    }

    #[test]
    fn test_config_defaults_and_validation() {
        let config = DecimationConfig::default();
        assert_eq!(config.initial_target().unwrap(), 100_000);

        let mut config = DecimationConfig::default();
        config.growth_factor = 1.2;
        assert!(config.validate().is_err());

        let mut config = DecimationConfig::default();
        config.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = DecimationConfig::default();
        config.preset = "custom".to_string();
        assert!(matches!(config.initial_target(), Err(Error::InvalidConfiguration(_))));
    }

    #[test]
    fn test_preset_display_roundtrip() {
        for preset in [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High, QualityPreset::Custom] {
            assert_eq!(preset.to_string().parse::<QualityPreset>().unwrap(), preset);
        }
    }
}
