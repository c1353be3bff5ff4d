//! Asset loading for the Aster renderer.
//!
//! This crate is the loader collaborator the renderer consumes opaque data
//! from:
//! - [`MeshData`] - a flat, deduplicated vertex list plus a `u32` index
//!   list, loaded from Wavefront OBJ files
//! - [`TextureData`] - a raw RGBA8 pixel buffer with dimensions, decoded
//!   from common image formats
//!
//! The renderer treats both as plain inputs to GPU buffer and image
//! creation; no GPU types appear here.

mod error;
mod mesh;
mod texture;

pub use error::{AssetError, AssetResult};
pub use mesh::{MeshData, MeshVertex};
pub use texture::TextureData;
