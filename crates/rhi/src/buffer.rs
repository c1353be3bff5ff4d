//! GPU buffer management.
//!
//! This module handles vertex, index, uniform, and staging buffers. It uses
//! gpu-allocator for memory management.
//!
//! # Memory classes
//!
//! Two memory classes exist:
//!
//! - **Device-local** (vertex and index buffers): populated through a
//!   staging buffer and a one-shot transfer, then never written again.
//! - **Host-visible coherent** (uniform and staging buffers): persistently
//!   mapped for the buffer's lifetime, written with a plain memcpy. Uniform
//!   buffers are rewritten every frame, so the staging round-trip would
//!   cost more than it saves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use aster_rhi::command::CommandPool;
//! use aster_rhi::device::Device;
//! use aster_rhi::buffer::{Buffer, BufferUsage};
//!
//! # fn example(device: Arc<Device>, pool: &CommandPool) -> Result<(), aster_rhi::RhiError> {
//! // Device-local vertex buffer uploaded through staging
//! let vertices: [f32; 6] = [0.0, 0.5, -0.5, -0.5, 0.5, -0.5];
//! let vertex_buffer = Buffer::device_local_with_data(
//!     device,
//!     pool,
//!     BufferUsage::Vertex,
//!     bytemuck::cast_slice(&vertices),
//! )?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::debug;

use crate::command::{self, CommandPool};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Buffer usage type.
///
/// Defines the intended use of the buffer, which determines the Vulkan
/// usage flags and which memory class backs it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer - device-local, filled once through staging
    Vertex,
    /// Index buffer - device-local, filled once through staging
    Index,
    /// Uniform buffer - host-visible, rewritten every frame
    Uniform,
    /// Staging buffer - host-visible transfer source
    Staging,
}

impl BufferUsage {
    /// Converts to Vulkan buffer usage flags.
    pub fn to_vk_usage(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Vertex => {
                vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
            }
            BufferUsage::Index => {
                vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST
            }
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
            BufferUsage::Staging => vk::BufferUsageFlags::TRANSFER_SRC,
        }
    }

    /// Returns the memory class backing this buffer type.
    pub fn memory_location(self) -> MemoryLocation {
        match self {
            // Static geometry lives in device memory, uploaded via staging
            BufferUsage::Vertex | BufferUsage::Index => MemoryLocation::GpuOnly,
            // Per-frame-updated and transfer-source memory stays mapped
            BufferUsage::Uniform | BufferUsage::Staging => MemoryLocation::CpuToGpu,
        }
    }

    /// Returns a human-readable name for the buffer type.
    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::Vertex => "vertex",
            BufferUsage::Index => "index",
            BufferUsage::Uniform => "uniform",
            BufferUsage::Staging => "staging",
        }
    }
}

/// GPU buffer wrapper with managed memory.
///
/// Wraps a Vulkan buffer and its gpu-allocator allocation. Host-visible
/// buffers stay mapped for their whole lifetime; device-local buffers are
/// written only through [`Buffer::device_local_with_data`].
pub struct Buffer {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan buffer handle.
    buffer: vk::Buffer,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Buffer size in bytes.
    size: vk::DeviceSize,
    /// Buffer usage type.
    usage: BufferUsage,
}

impl Buffer {
    /// Creates a new buffer with the specified size.
    ///
    /// # Errors
    ///
    /// Returns an error if the size is zero or buffer/memory allocation
    /// fails.
    pub fn new(device: Arc<Device>, usage: BufferUsage, size: vk::DeviceSize) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidHandle(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage.to_vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: usage.name(),
                requirements,
                location: usage.memory_location(),
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())?;
        }

        debug!("Created {} buffer: {} bytes", usage.name(), size);

        Ok(Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            usage,
        })
    }

    /// Creates a host-visible buffer and fills it with data.
    ///
    /// The usage must map to host-visible memory (uniform or staging).
    ///
    /// # Errors
    ///
    /// Returns an error if buffer creation or the write fails.
    pub fn new_with_data(device: Arc<Device>, usage: BufferUsage, data: &[u8]) -> RhiResult<Self> {
        let buffer = Self::new(device, usage, data.len() as vk::DeviceSize)?;
        buffer.write(0, data)?;
        Ok(buffer)
    }

    /// Creates a device-local buffer and uploads data through staging.
    ///
    /// A host-visible staging buffer is written, a one-shot command buffer
    /// copies it device-side, and the staging buffer is dropped - the
    /// two-phase upload pattern for geometry that never changes after load.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool for the one-shot transfer
    /// * `usage` - Must be [`BufferUsage::Vertex`] or [`BufferUsage::Index`]
    /// * `data` - The data to upload
    ///
    /// # Errors
    ///
    /// Returns an error if creation, the transfer, or its fence wait fails.
    pub fn device_local_with_data(
        device: Arc<Device>,
        pool: &CommandPool,
        usage: BufferUsage,
        data: &[u8],
    ) -> RhiResult<Self> {
        if usage.memory_location() != MemoryLocation::GpuOnly {
            return Err(RhiError::InvalidHandle(format!(
                "{} buffers are not device-local",
                usage.name()
            )));
        }

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, data)?;
        let buffer = Buffer::new(device.clone(), usage, data.len() as vk::DeviceSize)?;

        command::submit_one_time(&device, pool, |cmd| {
            let region = vk::BufferCopy::default().size(data.len() as vk::DeviceSize);
            cmd.copy_buffer(staging.handle(), buffer.handle(), &[region]);
        })?;

        debug!(
            "Uploaded {} bytes to device-local {} buffer",
            data.len(),
            usage.name()
        );

        // staging is dropped here, after the copy has completed
        Ok(buffer)
    }

    /// Writes data into a host-visible buffer at the specified offset.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The buffer memory is not mapped (device-local buffers)
    /// - The write would exceed the buffer size
    pub fn write(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        let end = offset + data.len() as vk::DeviceSize;
        if end > self.size {
            return Err(RhiError::InvalidHandle(format!(
                "Write exceeds buffer size: offset {} + data {} > buffer {}",
                offset,
                data.len(),
                self.size
            )));
        }

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            RhiError::InvalidHandle("Buffer allocation is not available".to_string())
        })?;

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| RhiError::InvalidHandle("Buffer memory is not mapped".to_string()))?;

        unsafe {
            let dst = mapped_ptr.as_ptr().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst as *mut u8, data.len());
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Returns the buffer usage type.
    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        // Free allocation first, then destroy buffer
        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free buffer allocation: {:?}", e);
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_usage_to_vk_usage() {
        assert!(
            BufferUsage::Vertex
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST)
        );
        assert!(
            BufferUsage::Index
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST)
        );
        assert!(
            BufferUsage::Uniform
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::UNIFORM_BUFFER)
        );
        assert!(
            BufferUsage::Staging
                .to_vk_usage()
                .contains(vk::BufferUsageFlags::TRANSFER_SRC)
        );
    }

    #[test]
    fn test_static_geometry_is_device_local() {
        assert_eq!(BufferUsage::Vertex.memory_location(), MemoryLocation::GpuOnly);
        assert_eq!(BufferUsage::Index.memory_location(), MemoryLocation::GpuOnly);
    }

    #[test]
    fn test_per_frame_buffers_are_host_visible() {
        assert_eq!(
            BufferUsage::Uniform.memory_location(),
            MemoryLocation::CpuToGpu
        );
        assert_eq!(
            BufferUsage::Staging.memory_location(),
            MemoryLocation::CpuToGpu
        );
    }

    #[test]
    fn test_buffer_usage_name() {
        assert_eq!(BufferUsage::Vertex.name(), "vertex");
        assert_eq!(BufferUsage::Index.name(), "index");
        assert_eq!(BufferUsage::Uniform.name(), "uniform");
        assert_eq!(BufferUsage::Staging.name(), "staging");
    }
}
