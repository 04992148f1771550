//! Biometric snapshot data model
//!
//! A snapshot is one immutable reading of every simulated channel. The
//! generator never edits a snapshot in place; each tick derives a new one
//! from the previous value.

use serde::{Deserialize, Serialize};

/// Relative power of the four EEG bands (0.0 - 100.0 each)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EegBands {
    pub alpha: f64,
    pub beta: f64,
    pub theta: f64,
    pub delta: f64,
}

impl Default for EegBands {
    fn default() -> Self {
        Self {
            alpha: 65.0,
            beta: 78.0,
            theta: 45.0,
            delta: 32.0,
        }
    }
}

impl EegBands {
    /// Bands in display order, paired with their names.
    pub fn named(&self) -> [(&'static str, f64); 4] {
        [
            ("Alpha", self.alpha),
            ("Beta", self.beta),
            ("Theta", self.theta),
            ("Delta", self.delta),
        ]
    }
}

/// One reading of all biometric channels at a point in simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiometricSnapshot {
    pub eeg: EegBands,

    /// Beats per minute (60.0 - 100.0)
    pub heart_rate: f64,

    /// Stress level (0.0 - 100.0)
    pub stress: f64,

    /// Focus level (0.0 - 100.0)
    pub focus: f64,

    /// Fatigue level (0.0 - 100.0)
    pub fatigue: f64,
}

impl Default for BiometricSnapshot {
    fn default() -> Self {
        Self {
            eeg: EegBands::default(),
            heart_rate: 72.0,
            stress: 25.0,
            focus: 82.0,
            fatigue: 15.0,
        }
    }
}

impl BiometricSnapshot {
    /// All eight scalar channels with their field names.
    pub fn fields(&self) -> [(&'static str, f64); 8] {
        [
            ("eeg.alpha", self.eeg.alpha),
            ("eeg.beta", self.eeg.beta),
            ("eeg.theta", self.eeg.theta),
            ("eeg.delta", self.eeg.delta),
            ("heart_rate", self.heart_rate),
            ("stress", self.stress),
            ("focus", self.focus),
            ("fatigue", self.fatigue),
        ]
    }
}

/// A chart sample carried forward from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Wall-clock label, e.g. "10:25"
    pub timestamp: String,
    pub focus: f64,
    pub stress: f64,
    pub heart_rate: f64,
}

impl HistoryPoint {
    pub fn from_snapshot(timestamp: impl Into<String>, snapshot: &BiometricSnapshot) -> Self {
        Self {
            timestamp: timestamp.into(),
            focus: snapshot.focus,
            stress: snapshot.stress,
            heart_rate: snapshot.heart_rate,
        }
    }
}
