//! History Buffer - bounded FIFO of chart points
//!
//! Points are kept in insertion order. Once the buffer is full, each append
//! evicts the oldest point first.

use chrono::{Duration, NaiveTime};
use std::collections::VecDeque;

use crate::config::HistoryConfig;
use crate::error::ConfigError;
use crate::snapshot::HistoryPoint;

/// The dashboard's reference chart: (focus, stress, heart rate)
const REFERENCE_POINTS: [(f64, f64, f64); 5] = [
    (75.0, 20.0, 70.0),
    (80.0, 15.0, 72.0),
    (85.0, 18.0, 74.0),
    (78.0, 25.0, 76.0),
    (82.0, 22.0, 72.0),
];

#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append a point, evicting the oldest one if the buffer is full.
    pub fn append(&mut self, point: HistoryPoint) {
        if self.points.len() == self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }

    /// Ordered copy of the retained points, oldest first.
    pub fn snapshot(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Produces "HH:MM" labels at a fixed spacing, wrapping at midnight.
#[derive(Debug, Clone)]
pub struct HistoryClock {
    next: NaiveTime,
    step: Duration,
}

impl HistoryClock {
    pub fn new(start_label: &str, step_secs: u32) -> Result<Self, ConfigError> {
        let next = NaiveTime::parse_from_str(start_label, "%H:%M")
            .map_err(|_| ConfigError::InvalidLabel(start_label.to_string()))?;
        Ok(Self {
            next,
            step: Duration::seconds(i64::from(step_secs)),
        })
    }

    /// Label for the next point; advances the clock.
    pub fn next_label(&mut self) -> String {
        let label = self.next.format("%H:%M").to_string();
        self.next = self.next + self.step;
        label
    }
}

/// Build the buffer and label clock described by `config`, pre-filled with
/// the reference chart when requested.
pub fn build_history(config: &HistoryConfig) -> Result<(HistoryBuffer, HistoryClock), ConfigError> {
    let mut buffer = HistoryBuffer::new(config.capacity)?;
    let mut clock = HistoryClock::new(&config.start_label, config.label_step_secs)?;
    if config.seed_reference_points {
        for (focus, stress, heart_rate) in REFERENCE_POINTS {
            buffer.append(HistoryPoint {
                timestamp: clock.next_label(),
                focus,
                stress,
                heart_rate,
            });
        }
    }
    Ok((buffer, clock))
}
