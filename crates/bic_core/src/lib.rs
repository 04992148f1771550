//! # BCI Core
//!
//! Data model and pure building blocks of the brain-computer-interface
//! session simulator:
//!
//! - **Signal generator**: bounded random walk producing each new snapshot
//! - **History buffer**: capacity-bounded FIFO of chart points
//! - **State classifier**: ordered threshold rules mapping a snapshot to a
//!   mental-state label and advisory
//!
//! Nothing here owns a clock. Timing lives in `bic_engine`.

pub mod classifier;
pub mod config;
pub mod dashboard;
mod error;
pub mod generator;
pub mod history;
pub mod snapshot;

pub use classifier::{Condition, MentalLabel, MentalState, Metric, Rule, StateClassifier};
pub use config::{
    BciConfig, ClassifierConfig, FieldSpec, GeneratorConfig, HistoryConfig, SchedulerConfig,
};
pub use dashboard::{metric_cards, ConnectionStatus, MetricCard, Tab, UserIntent};
pub use error::ConfigError;
pub use generator::SignalGenerator;
pub use history::{HistoryBuffer, HistoryClock};
pub use snapshot::{BiometricSnapshot, EegBands, HistoryPoint};
