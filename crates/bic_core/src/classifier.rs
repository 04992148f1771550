//! State Classifier - ordered threshold rules over a snapshot
//!
//! Rules are evaluated in priority order and the first match wins. A
//! snapshot that matches no rule produces no verdict; the caller keeps the
//! state it already has.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::ClassifierConfig;
use crate::snapshot::BiometricSnapshot;

pub const STRESSED_MESSAGE: &str = "I notice your stress levels are elevated. Would you like me to guide you through a breathing exercise?";
pub const TIRED_MESSAGE: &str =
    "You seem fatigued. Consider taking a short break or adjusting your task complexity.";
pub const FOCUSED_MESSAGE: &str = "Great focus! You're in an optimal state for complex tasks.";
pub const DISTRACTED_MESSAGE: &str =
    "Your attention seems scattered. Let me adjust the interface to reduce distractions.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MentalLabel {
    Focused,
    Stressed,
    Tired,
    Distracted,
}

impl MentalLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Focused => "focused",
            Self::Stressed => "stressed",
            Self::Tired => "tired",
            Self::Distracted => "distracted",
        }
    }
}

impl fmt::Display for MentalLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current mental-state label plus the advisory shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentalState {
    pub label: MentalLabel,
    pub message: String,
}

impl Default for MentalState {
    /// The dashboard opens as "focused" with no advisory yet.
    fn default() -> Self {
        Self {
            label: MentalLabel::Focused,
            message: String::new(),
        }
    }
}

/// Snapshot channel a rule inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Stress,
    Fatigue,
    Focus,
    HeartRate,
}

impl Metric {
    fn read(&self, s: &BiometricSnapshot) -> f64 {
        match self {
            Self::Stress => s.stress,
            Self::Fatigue => s.fatigue,
            Self::Focus => s.focus,
            Self::HeartRate => s.heart_rate,
        }
    }
}

/// Strict comparison against a threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Above(f64),
    Below(f64),
}

impl Condition {
    fn holds(&self, value: f64) -> bool {
        match *self {
            Self::Above(t) => value > t,
            Self::Below(t) => value < t,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub metric: Metric,
    pub condition: Condition,
    pub label: MentalLabel,
    pub message: String,
}

impl Rule {
    pub fn new(metric: Metric, condition: Condition, label: MentalLabel, message: &str) -> Self {
        Self {
            metric,
            condition,
            label,
            message: message.to_string(),
        }
    }

    pub fn matches(&self, s: &BiometricSnapshot) -> bool {
        self.condition.holds(self.metric.read(s))
    }

    fn verdict(&self) -> MentalState {
        MentalState {
            label: self.label,
            message: self.message.clone(),
        }
    }
}

/// Pure classifier: holds only its rule table.
#[derive(Debug, Clone)]
pub struct StateClassifier {
    rules: Vec<Rule>,
}

impl StateClassifier {
    /// Standard four-rule table: stressed, tired, focused, distracted.
    pub fn new(config: &ClassifierConfig) -> Self {
        Self::with_rules(vec![
            Rule::new(
                Metric::Stress,
                Condition::Above(config.stress_above),
                MentalLabel::Stressed,
                STRESSED_MESSAGE,
            ),
            Rule::new(
                Metric::Fatigue,
                Condition::Above(config.fatigue_above),
                MentalLabel::Tired,
                TIRED_MESSAGE,
            ),
            Rule::new(
                Metric::Focus,
                Condition::Above(config.focus_above),
                MentalLabel::Focused,
                FOCUSED_MESSAGE,
            ),
            Rule::new(
                Metric::Focus,
                Condition::Below(config.focus_below),
                MentalLabel::Distracted,
                DISTRACTED_MESSAGE,
            ),
        ])
    }

    /// Custom rule table, evaluated in the given order.
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule's verdict, or `None` when no rule fires.
    pub fn classify(&self, s: &BiometricSnapshot) -> Option<MentalState> {
        self.rules.iter().find(|r| r.matches(s)).map(Rule::verdict)
    }

    /// Verdict for `s`, or a copy of `previous` when no rule fires.
    pub fn classify_or_retain(&self, s: &BiometricSnapshot, previous: &MentalState) -> MentalState {
        self.classify(s).unwrap_or_else(|| previous.clone())
    }
}

impl Default for StateClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}
