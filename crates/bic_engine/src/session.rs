//! Session - the synchronous step machine behind the scheduler
//!
//! A session owns the current snapshot, the chart history and the current
//! mental state. It exposes exactly three transitions (tick, replace,
//! settle); the scheduler decides when each one runs.

use bic_core::history::build_history;
use bic_core::{
    BciConfig, BiometricSnapshot, ConfigError, HistoryBuffer, HistoryClock, HistoryPoint,
    MentalState, SignalGenerator, StateClassifier,
};

/// Result of one generation tick
#[derive(Debug, Clone)]
pub struct TickOutcome {
    pub snapshot: BiometricSnapshot,
    /// Set when this tick also sampled a chart point
    pub history_point: Option<HistoryPoint>,
}

pub struct Session {
    generator: SignalGenerator,
    classifier: StateClassifier,
    history: HistoryBuffer,
    clock: HistoryClock,
    snapshot: BiometricSnapshot,
    state: MentalState,
    ticks: u64,
    history_every: u64,
}

impl Session {
    /// Build a session from a config, validating it first.
    pub fn new(config: &BciConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let (history, clock) = build_history(&config.history)?;
        Ok(Self {
            generator: SignalGenerator::new(config.generator.clone())?,
            classifier: StateClassifier::new(&config.classifier),
            history,
            clock,
            snapshot: config.seed,
            state: MentalState::default(),
            ticks: 0,
            history_every: config.scheduler.history_every_n_ticks,
        })
    }

    /// Replace the rule table (e.g. with extra labels).
    pub fn with_classifier(mut self, classifier: StateClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Generate the next snapshot; every `history_every` ticks also append a
    /// chart point derived from it.
    pub fn tick(&mut self) -> TickOutcome {
        self.snapshot = self.generator.next(&self.snapshot);
        self.ticks += 1;

        let history_point = if self.ticks % self.history_every == 0 {
            let point = HistoryPoint::from_snapshot(self.clock.next_label(), &self.snapshot);
            self.history.append(point.clone());
            Some(point)
        } else {
            None
        };

        TickOutcome {
            snapshot: self.snapshot,
            history_point,
        }
    }

    /// Install an externally supplied snapshot, clamped into the configured
    /// domain. History is not touched.
    pub fn replace_snapshot(&mut self, snapshot: BiometricSnapshot) -> BiometricSnapshot {
        self.snapshot = self.generator.clamp(&snapshot);
        self.snapshot
    }

    /// Classify the latest snapshot. Returns the new state when a rule fired;
    /// `None` means the previous state was kept.
    pub fn settle(&mut self) -> Option<MentalState> {
        let verdict = self.classifier.classify(&self.snapshot)?;
        self.state = verdict.clone();
        Some(verdict)
    }

    pub fn snapshot(&self) -> &BiometricSnapshot {
        &self.snapshot
    }

    pub fn state(&self) -> &MentalState {
        &self.state
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bic_core::MentalLabel;

    fn config() -> BciConfig {
        let mut cfg = BciConfig::default();
        cfg.generator.seed = Some(5);
        cfg
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let mut cfg = config();
        cfg.scheduler.settle_delay_ms = 0;
        assert!(Session::new(&cfg).is_err());
    }

    #[test]
    fn test_initial_state() {
        let s = Session::new(&config()).unwrap();
        assert_eq!(*s.snapshot(), BiometricSnapshot::default());
        assert_eq!(s.state().label, MentalLabel::Focused);
        assert!(s.state().message.is_empty());
        assert_eq!(s.history().len(), 5);
        assert_eq!(s.ticks(), 0);
    }

    #[test]
    fn test_tick_appends_history_point() {
        let mut cfg = config();
        cfg.scheduler.history_every_n_ticks = 1;
        let mut s = Session::new(&cfg).unwrap();
        let out = s.tick();
        let point = out.history_point.unwrap();
        assert_eq!(point.timestamp, "10:25");
        assert_eq!(point.focus, out.snapshot.focus);
        assert_eq!(s.history().len(), 6);
        assert_eq!(s.history().latest(), Some(&point));
    }

    #[test]
    fn test_history_sampling_ratio() {
        let mut cfg = config();
        cfg.scheduler.history_every_n_ticks = 3;
        cfg.history.seed_reference_points = false;
        let mut s = Session::new(&cfg).unwrap();
        let sampled: Vec<bool> = (0..6).map(|_| s.tick().history_point.is_some()).collect();
        assert_eq!(sampled, vec![false, false, true, false, false, true]);
        assert_eq!(s.history().len(), 2);
    }

    #[test]
    fn test_history_bounded_by_capacity() {
        let mut cfg = config();
        cfg.history.capacity = 4;
        let mut s = Session::new(&cfg).unwrap();
        for _ in 0..10 {
            s.tick();
        }
        assert_eq!(s.history().len(), 4);
    }

    #[test]
    fn test_settle_retains_on_no_match() {
        let mut s = Session::new(&config()).unwrap();
        s.replace_snapshot(BiometricSnapshot {
            stress: 75.0,
            ..Default::default()
        });
        assert_eq!(s.settle().unwrap().label, MentalLabel::Stressed);

        s.replace_snapshot(BiometricSnapshot {
            stress: 30.0,
            fatigue: 20.0,
            focus: 60.0,
            ..Default::default()
        });
        assert!(s.settle().is_none());
        assert_eq!(s.state().label, MentalLabel::Stressed);
    }

    #[test]
    fn test_custom_rule_table() {
        use bic_core::{Condition, Metric, Rule};

        let classifier = StateClassifier::with_rules(vec![Rule::new(
            Metric::HeartRate,
            Condition::Above(90.0),
            MentalLabel::Stressed,
            "Your heart rate is climbing.",
        )]);
        let mut s = Session::new(&config()).unwrap().with_classifier(classifier);

        // Default seed (focus 82) matches none of the custom rules
        assert!(s.settle().is_none());
        s.replace_snapshot(BiometricSnapshot {
            heart_rate: 95.0,
            ..Default::default()
        });
        assert_eq!(s.settle().unwrap().message, "Your heart rate is climbing.");
    }

    #[test]
    fn test_replace_snapshot_clamps() {
        let mut s = Session::new(&config()).unwrap();
        let installed = s.replace_snapshot(BiometricSnapshot {
            heart_rate: 20.0,
            focus: 140.0,
            ..Default::default()
        });
        assert_eq!(installed.heart_rate, 60.0);
        assert_eq!(installed.focus, 100.0);
        assert_eq!(s.history().len(), 5);
    }
}
