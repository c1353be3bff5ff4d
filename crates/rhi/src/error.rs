//! RHI-specific error types.

use ash::vk;
use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] vk::Result),

    /// Failed to load Vulkan library
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No suitable GPU found
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader loading or module creation error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface creation error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// An image layout transition outside the supported set was requested.
    /// This indicates a bug in the caller, not a runtime condition.
    #[error("Unsupported image layout transition: {from:?} -> {to:?}")]
    UnsupportedLayoutTransition {
        from: vk::ImageLayout,
        to: vk::ImageLayout,
    },

    /// No candidate format satisfied the requested tiling and features.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid handle or argument error
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
