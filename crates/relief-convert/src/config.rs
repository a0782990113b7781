//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `RELIEF_BLUR_INTENSITY`, `RELIEF_BLUR_RADIUS`, `RELIEF_COMPLETION`
//! 2. Project-local: `.relief/config.toml`
//! 3. Global: `~/.relief/config.toml`

use relief_core::{ReliefError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
#[cfg(feature = "fixed-delay")]
use std::time::Duration;

use crate::clock::{TickClock, DEFAULT_TICK_HZ};
use crate::completion::CompletionStrategy;
#[cfg(feature = "fixed-delay")]
use crate::completion::DEFAULT_FIXED_DELAY;
use crate::job::{JobOptions, DEFAULT_INTENSITY};
use crate::kernels::gaussian::DEFAULT_RADIUS;

/// Blur pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlurConfig {
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    #[serde(default = "default_radius")]
    pub radius: u32,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            intensity: default_intensity(),
            radius: default_radius(),
        }
    }
}

fn default_intensity() -> f32 {
    DEFAULT_INTENSITY
}
fn default_radius() -> u32 {
    DEFAULT_RADIUS
}

/// How iteration completion is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionMode {
    #[default]
    Signal,
    FixedDelay,
}

impl std::str::FromStr for CompletionMode {
    type Err = ReliefError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "signal" => Ok(CompletionMode::Signal),
            "fixed_delay" | "fixed-delay" => Ok(CompletionMode::FixedDelay),
            other => Err(ReliefError::ConfigError(format!(
                "unknown completion mode '{}' (expected 'signal' or 'fixed_delay')",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default)]
    pub mode: CompletionMode,
    #[serde(default = "default_fixed_delay_secs")]
    pub fixed_delay_secs: f64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            mode: CompletionMode::default(),
            fixed_delay_secs: default_fixed_delay_secs(),
        }
    }
}

fn default_fixed_delay_secs() -> f64 {
    3.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
        }
    }
}

fn default_tick_hz() -> f64 {
    DEFAULT_TICK_HZ
}

/// Top-level config file structure. Every field is optional so that an
/// overlay only replaces what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReliefConfigFile {
    #[serde(default)]
    pub blur: Option<PartialBlur>,
    #[serde(default)]
    pub completion: Option<PartialCompletion>,
    #[serde(default)]
    pub scheduler: Option<PartialScheduler>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialBlur {
    pub intensity: Option<f32>,
    pub radius: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialCompletion {
    pub mode: Option<CompletionMode>,
    pub fixed_delay_secs: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialScheduler {
    pub tick_hz: Option<f64>,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReliefConfig {
    pub blur: BlurConfig,
    pub completion: CompletionConfig,
    pub scheduler: SchedulerConfig,
}

impl ReliefConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = ReliefConfig::default();

        // Layer 1: Global config (~/.relief/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                config.merge(Self::load_file(&global_path)?);
            }
        }

        // Layer 2: Project-local config (.relief/config.toml)
        let local_path = PathBuf::from(".relief/config.toml");
        if local_path.exists() {
            config.merge(Self::load_file(&local_path)?);
        }

        // Layer 3: Environment variable overrides
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = ReliefConfig::default();
        config.merge(Self::load_file(path)?);
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Completion strategy named by `[completion] mode`
    pub fn completion_strategy(&self) -> Result<CompletionStrategy> {
        match self.completion.mode {
            CompletionMode::Signal => Ok(CompletionStrategy::Signal),
            #[cfg(feature = "fixed-delay")]
            CompletionMode::FixedDelay => {
                let secs = self.completion.fixed_delay_secs;
                if secs.is_finite() && secs > 0.0 {
                    Ok(CompletionStrategy::FixedDelay(Duration::from_secs_f64(secs)))
                } else {
                    Ok(CompletionStrategy::FixedDelay(DEFAULT_FIXED_DELAY))
                }
            }
            #[cfg(not(feature = "fixed-delay"))]
            CompletionMode::FixedDelay => Err(ReliefError::ConfigError(
                "completion mode 'fixed_delay' requires the 'fixed-delay' feature".to_string(),
            )),
        }
    }

    /// Options for a new conversion job
    pub fn job_options(&self) -> Result<JobOptions> {
        Ok(JobOptions {
            intensity: self.blur.intensity,
            completion: self.completion_strategy()?,
            ..JobOptions::default()
        })
    }

    /// Clock pacing the scheduler at `[scheduler] tick_hz`
    pub fn clock(&self) -> TickClock {
        TickClock::with_rate(self.scheduler.tick_hz)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".relief").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ReliefConfigFile> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ReliefError::io(path, e))?;
        let config: ReliefConfigFile = toml::from_str(&content).map_err(|e| {
            ReliefError::TomlParseError(format!("{}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge(&mut self, overlay: ReliefConfigFile) {
        if let Some(blur) = overlay.blur {
            if let Some(intensity) = blur.intensity {
                self.blur.intensity = intensity;
            }
            if let Some(radius) = blur.radius {
                self.blur.radius = radius;
            }
        }
        if let Some(completion) = overlay.completion {
            if let Some(mode) = completion.mode {
                self.completion.mode = mode;
            }
            if let Some(secs) = completion.fixed_delay_secs {
                self.completion.fixed_delay_secs = secs;
            }
        }
        if let Some(scheduler) = overlay.scheduler {
            if let Some(hz) = scheduler.tick_hz {
                self.scheduler.tick_hz = hz;
            }
        }
    }

    /// Apply `RELIEF_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("RELIEF_BLUR_INTENSITY") {
            self.blur.intensity = value.trim().parse().map_err(|_| {
                ReliefError::ConfigError(format!("RELIEF_BLUR_INTENSITY is not a number: '{}'", value))
            })?;
        }
        if let Some(value) = lookup("RELIEF_BLUR_RADIUS") {
            self.blur.radius = value.trim().parse().map_err(|_| {
                ReliefError::ConfigError(format!("RELIEF_BLUR_RADIUS is not an integer: '{}'", value))
            })?;
        }
        if let Some(value) = lookup("RELIEF_COMPLETION") {
            self.completion.mode = value.parse()?;
        }
        Ok(())
    }

    /// Reject values the blur pipeline cannot run with. Call again after
    /// applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.blur.intensity) {
            return Err(ReliefError::ConfigError(format!(
                "blur intensity must be within 0..1, got {}",
                self.blur.intensity
            )));
        }
        let delay = self.completion.fixed_delay_secs;
        if !delay.is_finite() || delay < 0.0 {
            return Err(ReliefError::ConfigError(format!(
                "completion fixed_delay_secs must be a finite, non-negative number, got {}",
                delay
            )));
        }
        if !(self.scheduler.tick_hz.is_finite() && self.scheduler.tick_hz > 0.0) {
            return Err(ReliefError::ConfigError(format!(
                "scheduler tick_hz must be positive, got {}",
                self.scheduler.tick_hz
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn temp_config(content: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("relief_config_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    fn cleanup(path: &Path) {
        std::fs::remove_file(path).ok();
        std::fs::remove_dir(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_defaults() {
        let config = ReliefConfig::default();
        assert_eq!(config.blur.intensity, 1.0);
        assert_eq!(config.blur.radius, DEFAULT_RADIUS);
        assert_eq!(config.completion.mode, CompletionMode::Signal);
        assert_eq!(config.completion.fixed_delay_secs, 3.0);
        assert_eq!(config.completion_strategy().unwrap(), CompletionStrategy::Signal);
    }

    #[test]
    fn test_load_config_from_file() {
        let path = temp_config(
            r#"
[blur]
intensity = 0.5
radius = 4

[scheduler]
tick_hz = 30.0
"#,
        );
        let mut config = ReliefConfig::default();
        config.merge(ReliefConfig::load_file(&path).unwrap());

        assert_eq!(config.blur.intensity, 0.5);
        assert_eq!(config.blur.radius, 4);
        assert_eq!(config.scheduler.tick_hz, 30.0);
        assert_eq!(config.clock().interval(), TickClock::with_rate(30.0).interval());
        // Untouched sections keep their defaults
        assert_eq!(config.completion, CompletionConfig::default());

        cleanup(&path);
    }

    #[test]
    fn test_overlay_only_replaces_named_fields() {
        let mut config = ReliefConfig::default();
        config.merge(toml::from_str("[blur]\nradius = 6\n").unwrap());
        config.merge(toml::from_str("[blur]\nintensity = 0.25\n").unwrap());

        assert_eq!(config.blur.radius, 6);
        assert_eq!(config.blur.intensity, 0.25);
    }

    #[test]
    fn test_env_var_override() {
        let env: HashMap<&str, &str> = [
            ("RELIEF_BLUR_INTENSITY", "0.75"),
            ("RELIEF_BLUR_RADIUS", "3"),
            ("RELIEF_COMPLETION", "signal"),
        ]
        .into_iter()
        .collect();

        let mut config = ReliefConfig::default();
        config.merge(toml::from_str("[blur]\nintensity = 0.1\n").unwrap());
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.blur.intensity, 0.75);
        assert_eq!(config.blur.radius, 3);
    }

    #[test]
    fn test_bad_env_value_is_config_error() {
        let mut config = ReliefConfig::default();
        let result = config.apply_env_overrides(|key| {
            (key == "RELIEF_BLUR_RADIUS").then(|| "wide".to_string())
        });
        assert!(matches!(result, Err(ReliefError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_toml() {
        let path = temp_config("[blur\nintensity = ");
        assert!(matches!(
            ReliefConfig::load_file(&path),
            Err(ReliefError::TomlParseError(_))
        ));
        cleanup(&path);
    }

    #[test]
    fn test_intensity_out_of_range() {
        let mut config = ReliefConfig::default();
        config.blur.intensity = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut config = ReliefConfig::default();
        config.blur.intensity = f32::NAN;
        assert!(matches!(config.validate(), Err(ReliefError::ConfigError(_))));

        let mut config = ReliefConfig::default();
        config.merge(toml::from_str("[completion]\nfixed_delay_secs = inf\n").unwrap());
        assert!(config.completion.fixed_delay_secs.is_infinite());
        assert!(matches!(config.validate(), Err(ReliefError::ConfigError(_))));

        let mut config = ReliefConfig::default();
        config.scheduler.tick_hz = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_intensity_env_override_fails_validation() {
        let mut config = ReliefConfig::default();
        config
            .apply_env_overrides(|key| (key == "RELIEF_BLUR_INTENSITY").then(|| "NaN".to_string()))
            .unwrap();
        assert!(config.blur.intensity.is_nan());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("fixed_delay".parse::<CompletionMode>().unwrap(), CompletionMode::FixedDelay);
        assert_eq!(" Signal ".parse::<CompletionMode>().unwrap(), CompletionMode::Signal);
        assert!("sometimes".parse::<CompletionMode>().is_err());
    }

    #[cfg(not(feature = "fixed-delay"))]
    #[test]
    fn test_fixed_delay_needs_feature() {
        let mut config = ReliefConfig::default();
        config.completion.mode = CompletionMode::FixedDelay;
        assert!(matches!(
            config.completion_strategy(),
            Err(ReliefError::ConfigError(_))
        ));
    }

    #[cfg(feature = "fixed-delay")]
    #[test]
    fn test_fixed_delay_strategy() {
        let mut config = ReliefConfig::default();
        config.completion.mode = CompletionMode::FixedDelay;
        config.completion.fixed_delay_secs = 1.5;
        assert_eq!(
            config.job_options().unwrap().completion,
            CompletionStrategy::FixedDelay(Duration::from_millis(1500))
        );

        config.completion.fixed_delay_secs = f64::INFINITY;
        assert_eq!(
            config.completion_strategy().unwrap(),
            CompletionStrategy::FixedDelay(DEFAULT_FIXED_DELAY)
        );
    }
}
