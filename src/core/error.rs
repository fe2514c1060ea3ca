use thiserror::Error;

#[derive(Error, Debug)]
pub enum OddsError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Insufficient units: requested {requested} casualties but only {available} available")]
    InsufficientUnits { requested: usize, available: usize },

    #[error("Simulation hit the round cap after {rounds} rounds")]
    SimulationTimeout { rounds: u32 },

    #[error("Simulation cancelled before any trial completed")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

impl OddsError {
    /// Errors that make every trial of a batch invalid, not just one
    pub fn is_fatal_for_batch(&self) -> bool {
        matches!(self, Self::InvalidArgument(_) | Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, OddsError>;
