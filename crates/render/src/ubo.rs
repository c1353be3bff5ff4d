//! Uniform buffer object definitions for shaders.
//!
//! These structures must match the shader uniform block layouts exactly.
//! `#[repr(C)]` keeps the memory layout predictable and `Pod`/`Zeroable`
//! allow safe byte casting into mapped uniform memory.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Per-object shader uniforms: the model/view/projection triple.
///
/// One copy exists per scene object per frame slot, so the CPU writing
/// next frame's transforms never races the GPU reading this frame's.
///
/// # Memory Layout
///
/// - Offset 0: model matrix (64 bytes)
/// - Offset 64: view matrix (64 bytes)
/// - Offset 128: projection matrix (64 bytes)
/// - Total size: 192 bytes
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
pub struct UniformBufferObject {
    /// Model matrix (object to world space).
    pub model: Mat4,
    /// View matrix (world to view space).
    pub view: Mat4,
    /// Projection matrix (view to clip space, Y already flipped).
    pub proj: Mat4,
}

impl UniformBufferObject {
    /// Size of the struct in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();

    /// Creates a uniform block from the three transforms.
    pub fn new(model: Mat4, view: Mat4, proj: Mat4) -> Self {
        Self { model, view, proj }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ubo_size() {
        // 3 Mat4 = 3 * 64 = 192 bytes
        assert_eq!(UniformBufferObject::SIZE, 192);
    }

    #[test]
    fn test_ubo_alignment() {
        // Mat4 requires 16-byte alignment for GPU consumption
        assert_eq!(std::mem::align_of::<UniformBufferObject>(), 16);
    }

    #[test]
    fn test_ubo_byte_cast() {
        let ubo = UniformBufferObject::new(Mat4::IDENTITY, Mat4::IDENTITY, Mat4::IDENTITY);
        let bytes: &[u8] = bytemuck::bytes_of(&ubo);
        assert_eq!(bytes.len(), UniformBufferObject::SIZE);
    }
}
