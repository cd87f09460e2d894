use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to parse config {}: {source}", .path.display())]
    Config {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid glob pattern \"{pattern}\": {message}")]
    Pattern { pattern: String, message: String },

    #[error("Expected a JSON array of deployments in {}", .path.display())]
    NotADeploymentList { path: PathBuf },
}

/// Faults absorbed by post-call reconciliation
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Pricing(#[from] PricingError),

    #[error("Failed to encode canonical usage: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Faults in externally supplied pricing data
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("Pricing table must be a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },

    #[error("Price \"{field}\" is not a number: {value}")]
    NonNumeric { field: &'static str, value: String },

    #[error("Price \"{field}\" is negative: {value}")]
    Negative { field: &'static str, value: f64 },
}
