//! Rendering orchestration.
//!
//! This crate drives the per-frame loop on top of the RHI:
//! - Frame slot management and CPU/GPU synchronization ([`frame`])
//! - Depth buffer ([`depth`])
//! - Per-object GPU resource bundles ([`object`])
//! - Shader uniform layout ([`ubo`])
//! - The top-level [`Renderer`]

pub mod depth;
pub mod frame;
pub mod object;
pub mod renderer;
pub mod ubo;

pub use renderer::{Renderer, SceneObjectDesc};

/// Maximum number of frames that can be in flight simultaneously.
///
/// Two slots let the CPU record frame N+1 while the GPU executes frame N;
/// the per-slot fence bounds how far ahead the CPU can run.
pub const MAX_FRAMES_IN_FLIGHT: usize = 2;
