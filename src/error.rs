// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
    /// A layout dimension was below the minimum of 2.
    #[error("invalid {layout} topology parameters: {first}x{second} (each dimension must be >= 2)")]
    InvalidTopologyParameters {
        layout: &'static str,
        first: usize,
        second: usize,
    },

    #[error("failed to parse animator config: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MeshError>;
