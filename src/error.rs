use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverDiscoveryError {
    #[error("No series provided for analysis")]
    EmptySeriesSet,

    #[error("Series '{0}' has no months")]
    EmptySeries(String),

    #[error("Series '{series}' does not share the analysis month axis: expected {expected}, found {found}")]
    MismatchedMonthAxis {
        series: String,
        expected: String,
        found: String,
    },

    #[error("Invalid series '{series}': {details}")]
    InvalidSeries { series: String, details: String },

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Invalid scoring weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid threshold {name} = {value}: must be between 0.0 and 1.0")]
    InvalidThreshold { name: String, value: f64 },

    #[error("Invalid forecast horizon {0}: must be between 1 and 120 months")]
    InvalidHorizon(u32),

    #[error("Date calculation error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DriverDiscoveryError>;
