//! Read-only projections consumed by the presentation layer, plus the
//! intents it may send back.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::BiometricSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

impl ConnectionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Connected => "BCI Connected",
            Self::Disconnected => "BCI Disconnected",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    Dashboard,
    Signals,
    Chat,
    Training,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Signals, Tab::Chat, Tab::Training];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Signals => "signals",
            Self::Chat => "chat",
            Self::Training => "training",
        }
    }

    /// Parse from string.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the user did in the dashboard. The simulation never reacts to
/// these; they are accepted and recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserIntent {
    SwitchTab(Tab),
    AcceptSuggestion,
    ModifySuggestion,
}

/// One dashboard card: title, rounded value and unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub title: &'static str,
    pub value: i64,
    pub unit: &'static str,
}

impl fmt::Display for MetricCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}{}", self.title, self.value, self.unit)
    }
}

/// The four headline cards, values rounded to the nearest integer.
pub fn metric_cards(s: &BiometricSnapshot) -> [MetricCard; 4] {
    let card = |title: &'static str, value: f64, unit: &'static str| MetricCard {
        title,
        value: value.round() as i64,
        unit,
    };
    [
        card("Focus Level", s.focus, "%"),
        card("Stress Level", s.stress, "%"),
        card("Heart Rate", s.heart_rate, " BPM"),
        card("Fatigue Level", s.fatigue, "%"),
    ]
}
