use thiserror::Error;

/// Configuration defects. Detected when an engine or session is built,
/// never while the simulation is ticking.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field}: lower bound {lower} is above upper bound {upper}")]
    InvertedBounds {
        field: &'static str,
        lower: f64,
        upper: f64,
    },

    #[error("{field}: bound {value} is negative")]
    NegativeBound { field: &'static str, value: f64 },

    #[error("{field}: amplitude {value} is negative")]
    NegativeAmplitude { field: &'static str, value: f64 },

    #[error("{field}: value is not finite")]
    NonFiniteValue { field: &'static str },

    #[error("{field}: interval must be positive")]
    NonPositiveInterval { field: &'static str },

    #[error("history capacity must be at least 1")]
    ZeroCapacity,

    #[error("history sampling ratio must be at least 1 tick")]
    ZeroSampleRatio,

    #[error("seed snapshot {field}={value} lies outside [{lower}, {upper}]")]
    SeedOutOfBounds {
        field: &'static str,
        value: f64,
        lower: f64,
        upper: f64,
    },

    #[error("invalid history start label '{0}' (expected HH:MM)")]
    InvalidLabel(String),
}
