use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid problem configuration: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("solver unavailable: {0}")]
    SolverUnavailable(String),

    #[error("failed to write model file: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("site {0} is declared more than once")]
    DuplicateSite(String),

    #[error("area {0} is declared more than once")]
    DuplicateArea(String),

    #[error("{table} references undeclared site {site}")]
    UnknownSite { table: &'static str, site: String },

    #[error("{table} references undeclared area {area}")]
    UnknownArea { table: &'static str, area: String },

    #[error("{table} has no entry for {key}")]
    MissingEntry { table: &'static str, key: String },

    #[error("{table} entry for {key} must be finite and non-negative, got {value}")]
    InvalidValue {
        table: &'static str,
        key: String,
        value: f64,
    },

    #[error("big M ({big_m}) is smaller than total demand ({total_demand})")]
    BigMTooSmall { big_m: f64, total_demand: f64 },
}
