//! Platform layer: windowing and Vulkan surface creation.
//!
//! Thin wrappers around winit and ash-window. The renderer only sees the
//! [`Window`] and [`Surface`] types; event plumbing stays in the
//! application binary.

mod window;

pub use window::{Surface, Window};
