use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::snapshot::BiometricSnapshot;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BciConfig {
    pub generator: GeneratorConfig,
    pub classifier: ClassifierConfig,
    pub scheduler: SchedulerConfig,
    pub history: HistoryConfig,
    /// Initial snapshot the simulation starts from
    pub seed: BiometricSnapshot,
}

impl BciConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::from_toml(&content)
    }

    /// Load from path; if the file doesn't exist, return defaults with env
    /// overrides. A file that exists but can't be read or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content)
                .with_context(|| format!("Invalid config file: {}", path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Config file {} not found, using defaults", path.display());
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                Ok(cfg)
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to read config file: {}", path.display())),
        }
    }

    fn from_toml(content: &str) -> Result<Self> {
        let mut config: BciConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("BIC_TICK_INTERVAL_MS") {
            if let Ok(n) = v.parse() {
                self.scheduler.tick_interval_ms = n;
            }
        }
        if let Ok(v) = std::env::var("BIC_SETTLE_DELAY_MS") {
            if let Ok(n) = v.parse() {
                self.scheduler.settle_delay_ms = n;
            }
        }
        if let Ok(v) = std::env::var("BIC_HISTORY_CAPACITY") {
            if let Ok(n) = v.parse() {
                self.history.capacity = n;
            }
        }
        if let Ok(v) = std::env::var("BIC_SEED") {
            if let Ok(n) = v.parse() {
                self.generator.seed = Some(n);
            }
        }
    }

    /// Check every section. Called before anything is built from the config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.generator.validate()?;
        self.classifier.validate()?;
        self.scheduler.validate()?;
        self.history.validate()?;
        self.validate_seed()
    }

    fn validate_seed(&self) -> Result<(), ConfigError> {
        let g = &self.generator;
        let specs = [&g.eeg, &g.eeg, &g.eeg, &g.eeg, &g.heart_rate, &g.stress, &g.focus, &g.fatigue];
        for ((field, value), spec) in self.seed.fields().into_iter().zip(specs) {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue { field });
            }
            if value < spec.lower || value > spec.upper {
                return Err(ConfigError::SeedOutOfBounds {
                    field,
                    value,
                    lower: spec.lower,
                    upper: spec.upper,
                });
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

/// Random-walk parameters for one channel: each step moves the value by
/// `(u - 0.5) * amplitude` for a uniform draw `u`, then clamps it.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct FieldSpec {
    pub amplitude: f64,
    pub lower: f64,
    pub upper: f64,
}

impl FieldSpec {
    pub const fn new(amplitude: f64, lower: f64, upper: f64) -> Self {
        Self {
            amplitude,
            lower,
            upper,
        }
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.amplitude.is_finite() || !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(ConfigError::NonFiniteValue { field });
        }
        if self.lower < 0.0 {
            return Err(ConfigError::NegativeBound {
                field,
                value: self.lower,
            });
        }
        if self.lower > self.upper {
            return Err(ConfigError::InvertedBounds {
                field,
                lower: self.lower,
                upper: self.upper,
            });
        }
        if self.amplitude < 0.0 {
            return Err(ConfigError::NegativeAmplitude {
                field,
                value: self.amplitude,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Shared by all four EEG bands
    pub eeg: FieldSpec,
    pub heart_rate: FieldSpec,
    pub stress: FieldSpec,
    pub focus: FieldSpec,
    pub fatigue: FieldSpec,
    /// Fixed RNG seed for reproducible runs. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            eeg: FieldSpec::new(10.0, 0.0, 100.0),
            heart_rate: FieldSpec::new(4.0, 60.0, 100.0),
            stress: FieldSpec::new(8.0, 0.0, 100.0),
            focus: FieldSpec::new(6.0, 0.0, 100.0),
            fatigue: FieldSpec::new(5.0, 0.0, 100.0),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.eeg.validate("generator.eeg")?;
        self.heart_rate.validate("generator.heart_rate")?;
        self.stress.validate("generator.stress")?;
        self.focus.validate("generator.focus")?;
        self.fatigue.validate("generator.fatigue")
    }
}

/// Rule thresholds. Every comparison is strict.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub stress_above: f64,
    pub fatigue_above: f64,
    pub focus_above: f64,
    pub focus_below: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            stress_above: 60.0,
            fatigue_above: 70.0,
            focus_above: 80.0,
            focus_below: 40.0,
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("classifier.stress_above", self.stress_above),
            ("classifier.fatigue_above", self.fatigue_above),
            ("classifier.focus_above", self.focus_above),
            ("classifier.focus_below", self.focus_below),
        ];
        for (field, value) in thresholds {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteValue { field });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Generation tick period
    pub tick_interval_ms: u64,
    /// Quiet period after the last snapshot change before classification runs
    pub settle_delay_ms: u64,
    /// Append a history point every N generation ticks
    pub history_every_n_ticks: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::realtime()
    }
}

impl SchedulerConfig {
    /// Dashboard cadence: a new reading every 2s, classified 1s after it
    /// settles, one chart point per three readings
    pub fn realtime() -> Self {
        Self {
            tick_interval_ms: 2000,
            settle_delay_ms: 1000,
            history_every_n_ticks: 3,
        }
    }

    /// Tight cadence for tests
    pub fn testing() -> Self {
        Self {
            tick_interval_ms: 20,
            settle_delay_ms: 10,
            history_every_n_ticks: 1,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::NonPositiveInterval {
                field: "scheduler.tick_interval_ms",
            });
        }
        if self.settle_delay_ms == 0 {
            return Err(ConfigError::NonPositiveInterval {
                field: "scheduler.settle_delay_ms",
            });
        }
        if self.history_every_n_ticks == 0 {
            return Err(ConfigError::ZeroSampleRatio);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Maximum retained chart points
    pub capacity: usize,
    /// Label of the first history point, "HH:MM"
    pub start_label: String,
    /// Spacing between consecutive labels
    pub label_step_secs: u32,
    /// Pre-fill the buffer with the dashboard's reference chart
    pub seed_reference_points: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            start_label: "10:00".to_string(),
            label_step_secs: 300,
            seed_reference_points: true,
        }
    }
}

impl HistoryConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.label_step_secs == 0 {
            return Err(ConfigError::NonPositiveInterval {
                field: "history.label_step_secs",
            });
        }
        chrono::NaiveTime::parse_from_str(&self.start_label, "%H:%M")
            .map_err(|_| ConfigError::InvalidLabel(self.start_label.clone()))?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let cfg = BciConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.scheduler.tick_interval(), Duration::from_secs(2));
        assert_eq!(cfg.scheduler.settle_delay(), Duration::from_secs(1));
        assert_eq!(cfg.scheduler.history_every_n_ticks, 3);
        assert_eq!(cfg.generator.heart_rate, FieldSpec::new(4.0, 60.0, 100.0));
        assert_eq!(cfg.classifier.stress_above, 60.0);
        assert!(cfg.generator.seed.is_none());
    }

    #[test]
    fn test_parse_minimal_toml() {
        let toml_str = r#"
[scheduler]
tick_interval_ms = 500
"#;
        let cfg: BciConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.scheduler.tick_interval_ms, 500);
        // Defaults for unspecified fields
        assert_eq!(cfg.scheduler.settle_delay_ms, 1000);
        assert_eq!(cfg.history.capacity, 20);
        assert_eq!(cfg.seed.focus, 82.0);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[generator]
seed = 7
eeg = { amplitude = 12.0, lower = 0.0, upper = 100.0 }
heart_rate = { amplitude = 2.0, lower = 55.0, upper = 110.0 }

[classifier]
stress_above = 50.0
focus_below = 30.0

[scheduler]
tick_interval_ms = 1000
settle_delay_ms = 250
history_every_n_ticks = 3

[history]
capacity = 8
start_label = "09:30"
label_step_secs = 60
seed_reference_points = false

[seed]
heart_rate = 80.0
stress = 10.0
"#;
        let cfg: BciConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.generator.seed, Some(7));
        assert_eq!(cfg.generator.eeg.amplitude, 12.0);
        assert_eq!(cfg.generator.heart_rate.lower, 55.0);
        assert_eq!(cfg.generator.stress, FieldSpec::new(8.0, 0.0, 100.0));
        assert_eq!(cfg.classifier.stress_above, 50.0);
        assert_eq!(cfg.classifier.fatigue_above, 70.0);
        assert_eq!(cfg.scheduler.history_every_n_ticks, 3);
        assert_eq!(cfg.history.start_label, "09:30");
        assert!(!cfg.history.seed_reference_points);
        assert_eq!(cfg.seed.heart_rate, 80.0);
        assert_eq!(cfg.seed.focus, 82.0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_example_config_matches_defaults() {
        let cfg: BciConfig = toml::from_str(include_str!("../../../bic.example.toml")).unwrap();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.generator.eeg, GeneratorConfig::default().eeg);
        assert_eq!(cfg.seed, BiometricSnapshot::default());
        assert_eq!(cfg.history.capacity, HistoryConfig::default().capacity);
        assert_eq!(
            cfg.scheduler.history_every_n_ticks,
            SchedulerConfig::default().history_every_n_ticks
        );
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut cfg = BciConfig::default();
        cfg.generator.focus = FieldSpec::new(6.0, 90.0, 10.0);
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::InvertedBounds { field: "generator.focus", .. })
        ));
    }

    #[test]
    fn test_negative_bound_and_amplitude_rejected() {
        let mut cfg = BciConfig::default();
        cfg.generator.stress = FieldSpec::new(8.0, -5.0, 100.0);
        assert!(matches!(cfg.validate(), Err(ConfigError::NegativeBound { .. })));

        let mut cfg = BciConfig::default();
        cfg.generator.fatigue = FieldSpec::new(-1.0, 0.0, 100.0);
        assert!(matches!(cfg.validate(), Err(ConfigError::NegativeAmplitude { .. })));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        let mut cfg = BciConfig::default();
        cfg.scheduler.tick_interval_ms = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonPositiveInterval { .. })));

        let mut cfg = BciConfig::default();
        cfg.scheduler.history_every_n_ticks = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroSampleRatio));

        let mut cfg = BciConfig::default();
        cfg.history.capacity = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroCapacity));
    }

    #[test]
    fn test_seed_outside_bounds_rejected() {
        let mut cfg = BciConfig::default();
        cfg.seed.heart_rate = 40.0;
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::SeedOutOfBounds { field: "heart_rate", .. })
        ));

        let mut cfg = BciConfig::default();
        cfg.seed.stress = f64::NAN;
        assert!(matches!(cfg.validate(), Err(ConfigError::NonFiniteValue { .. })));
    }

    #[test]
    fn test_bad_start_label_rejected() {
        let mut cfg = BciConfig::default();
        cfg.history.start_label = "half past ten".to_string();
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidLabel(_))));
    }

    #[test]
    fn test_env_overrides_and_defaults() {
        // Part 1: env overrides
        std::env::set_var("BIC_TICK_INTERVAL_MS", "750");
        std::env::set_var("BIC_SEED", "42");

        let mut cfg = BciConfig::default();
        cfg.apply_env_overrides();

        assert_eq!(cfg.scheduler.tick_interval_ms, 750);
        assert_eq!(cfg.generator.seed, Some(42));

        // Clean up env vars before testing defaults
        std::env::remove_var("BIC_TICK_INTERVAL_MS");
        std::env::remove_var("BIC_SEED");

        // Part 2: nonexistent path returns defaults (no env interference)
        let cfg = BciConfig::load_or_default("/nonexistent/path.toml").unwrap();
        assert_eq!(cfg.scheduler.tick_interval_ms, 2000);
    }

    #[test]
    fn test_unparseable_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("bic-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[scheduler]\ntick_interval_ms = -5\n").unwrap();

        let result = BciConfig::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(format!("{:#}", err).contains("Invalid config file"));
    }

    #[test]
    fn test_load_or_default_reads_existing_file() {
        let path = std::env::temp_dir().join(format!("bic-ok-{}.toml", std::process::id()));
        std::fs::write(&path, "[history]\ncapacity = 8\n").unwrap();

        let result = BciConfig::load_or_default(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(result.unwrap().history.capacity, 8);
    }
}
