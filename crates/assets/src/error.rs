//! Asset-loading error types.

use thiserror::Error;

/// Errors produced while loading meshes and textures.
#[derive(Error, Debug)]
pub enum AssetError {
    /// OBJ parsing error
    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    /// Image decoding error
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally invalid asset data
    #[error("Malformed asset: {0}")]
    Malformed(String),
}

/// Result type alias for asset operations.
pub type AssetResult<T> = std::result::Result<T, AssetError>;
