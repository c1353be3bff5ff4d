//! Error types shared across the renderer.

use thiserror::Error;

/// Top-level error type for the renderer.
#[derive(Error, Debug)]
pub enum Error {
    /// Graphics API errors
    #[error("Graphics error: {0}")]
    Graphics(String),

    /// Window creation or management errors
    #[error("Window error: {0}")]
    Window(String),

    /// Asset loading errors
    #[error("Asset error: {0}")]
    Asset(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

/// Result type alias using the renderer's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
