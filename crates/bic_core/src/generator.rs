//! Signal Generator - bounded random walk over every biometric channel
//!
//! Each step draws one uniform sample per channel and moves the channel by
//! `(u - 0.5) * amplitude`, then clamps to the channel's bounds. Draw order
//! is fixed (alpha, beta, theta, delta, heart rate, stress, focus, fatigue),
//! so a seeded RNG always yields the same trajectory.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{FieldSpec, GeneratorConfig};
use crate::error::ConfigError;
use crate::snapshot::{BiometricSnapshot, EegBands};

/// Guard against NaN and Infinity in channel values.
/// A non-finite value is replaced by the channel's lower bound.
#[inline]
fn sanitize(v: f64, fallback: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in snapshot, resetting to fallback {}", fallback);
        fallback
    }
}

impl FieldSpec {
    /// Step `value` by a centred draw `u` in [0, 1) and clamp to bounds.
    pub fn perturb(&self, value: f64, u: f64) -> f64 {
        self.clamp(sanitize(value, self.lower) + (u - 0.5) * self.amplitude)
    }

    pub fn clamp(&self, value: f64) -> f64 {
        sanitize(value, self.lower).clamp(self.lower, self.upper)
    }
}

/// Derive the next snapshot from `prev` using draws from `rng`.
pub fn next_snapshot<R: Rng + ?Sized>(
    prev: &BiometricSnapshot,
    config: &GeneratorConfig,
    rng: &mut R,
) -> BiometricSnapshot {
    let eeg = EegBands {
        alpha: config.eeg.perturb(prev.eeg.alpha, rng.gen()),
        beta: config.eeg.perturb(prev.eeg.beta, rng.gen()),
        theta: config.eeg.perturb(prev.eeg.theta, rng.gen()),
        delta: config.eeg.perturb(prev.eeg.delta, rng.gen()),
    };
    BiometricSnapshot {
        eeg,
        heart_rate: config.heart_rate.perturb(prev.heart_rate, rng.gen()),
        stress: config.stress.perturb(prev.stress, rng.gen()),
        focus: config.focus.perturb(prev.focus, rng.gen()),
        fatigue: config.fatigue.perturb(prev.fatigue, rng.gen()),
    }
}

/// Force every channel of `snapshot` into its configured domain.
pub fn clamp_snapshot(snapshot: &BiometricSnapshot, config: &GeneratorConfig) -> BiometricSnapshot {
    BiometricSnapshot {
        eeg: EegBands {
            alpha: config.eeg.clamp(snapshot.eeg.alpha),
            beta: config.eeg.clamp(snapshot.eeg.beta),
            theta: config.eeg.clamp(snapshot.eeg.theta),
            delta: config.eeg.clamp(snapshot.eeg.delta),
        },
        heart_rate: config.heart_rate.clamp(snapshot.heart_rate),
        stress: config.stress.clamp(snapshot.stress),
        focus: config.focus.clamp(snapshot.focus),
        fatigue: config.fatigue.clamp(snapshot.fatigue),
    }
}

/// Generator owning its RNG stream
pub struct SignalGenerator {
    config: GeneratorConfig,
    rng: StdRng,
}

impl SignalGenerator {
    /// Build a generator. Bounds and amplitudes are checked here so that
    /// stepping can never hit an inverted or non-finite range.
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { config, rng })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn next(&mut self, prev: &BiometricSnapshot) -> BiometricSnapshot {
        next_snapshot(prev, &self.config, &mut self.rng)
    }

    pub fn clamp(&self, snapshot: &BiometricSnapshot) -> BiometricSnapshot {
        clamp_snapshot(snapshot, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn seeded(seed: u64) -> SignalGenerator {
        SignalGenerator::new(GeneratorConfig {
            seed: Some(seed),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_invalid_bounds_rejected_at_construction() {
        let config = GeneratorConfig {
            focus: FieldSpec::new(6.0, 90.0, 10.0),
            ..Default::default()
        };
        assert!(matches!(
            SignalGenerator::new(config),
            Err(ConfigError::InvertedBounds { field: "generator.focus", .. })
        ));

        let config = GeneratorConfig {
            heart_rate: FieldSpec::new(f64::NAN, 60.0, 100.0),
            ..Default::default()
        };
        assert!(matches!(
            SignalGenerator::new(config),
            Err(ConfigError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn test_perturb_is_centred_on_half() {
        let spec = FieldSpec::new(10.0, 0.0, 100.0);
        assert_eq!(spec.perturb(50.0, 0.5), 50.0);
        assert_eq!(spec.perturb(50.0, 0.0), 45.0);
        assert!((spec.perturb(50.0, 0.99) - 54.9).abs() < 1e-9);
    }

    #[test]
    fn test_perturb_clamps_at_bounds() {
        let hr = FieldSpec::new(4.0, 60.0, 100.0);
        assert_eq!(hr.perturb(60.5, 0.0), 60.0);
        assert_eq!(hr.perturb(99.5, 0.999), 100.0);
    }

    #[test]
    fn test_non_finite_input_recovers() {
        let spec = FieldSpec::new(6.0, 0.0, 100.0);
        let v = spec.perturb(f64::NAN, 0.5);
        assert_eq!(v, 0.0);
        assert_eq!(spec.clamp(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_zero_draws_move_every_channel_down() {
        // StepRng(0, 0) makes every f64 draw 0.0
        let mut rng = StepRng::new(0, 0);
        let prev = BiometricSnapshot::default();
        let next = next_snapshot(&prev, &GeneratorConfig::default(), &mut rng);
        assert_eq!(next.eeg.alpha, 60.0);
        assert_eq!(next.eeg.delta, 27.0);
        assert_eq!(next.heart_rate, 70.0);
        assert_eq!(next.stress, 21.0);
        assert_eq!(next.focus, 79.0);
        assert_eq!(next.fatigue, 12.5);
    }

    #[test]
    fn test_same_seed_same_trajectory() {
        let mut a = seeded(11);
        let mut b = seeded(11);
        let mut sa = BiometricSnapshot::default();
        let mut sb = BiometricSnapshot::default();
        for _ in 0..50 {
            sa = a.next(&sa);
            sb = b.next(&sb);
            assert_eq!(sa, sb);
        }
    }

    #[test]
    fn test_step_size_bounded_by_half_amplitude() {
        let mut g = seeded(3);
        let prev = BiometricSnapshot::default();
        let next = g.next(&prev);
        assert!((next.eeg.alpha - prev.eeg.alpha).abs() <= 5.0);
        assert!((next.heart_rate - prev.heart_rate).abs() <= 2.0);
        assert!((next.stress - prev.stress).abs() <= 4.0);
        assert!((next.focus - prev.focus).abs() <= 3.0);
        assert!((next.fatigue - prev.fatigue).abs() <= 2.5);
    }

    #[test]
    fn test_clamp_snapshot_pulls_values_into_domain() {
        let g = seeded(0);
        let wild = BiometricSnapshot {
            heart_rate: 250.0,
            stress: -3.0,
            focus: f64::NAN,
            ..Default::default()
        };
        let s = g.clamp(&wild);
        assert_eq!(s.heart_rate, 100.0);
        assert_eq!(s.stress, 0.0);
        assert_eq!(s.focus, 0.0);
        assert_eq!(s.eeg, wild.eeg);
    }
}
