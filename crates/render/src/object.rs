//! Per-object GPU resource bundles.
//!
//! A [`RenderObject`] owns everything one scene entity needs at draw time:
//! device-local vertex and index buffers, a sampled texture, and - per
//! frame slot - a uniform buffer and a descriptor set. Descriptor sets are
//! allocated and written once at load; every frame only the uniform buffer
//! *contents* for the active slot are refreshed.

use std::sync::Arc;

use glam::Mat4;
use tracing::debug;

use aster_assets::{MeshData, TextureData};
use aster_rhi::buffer::{Buffer, BufferUsage};
use aster_rhi::command::{CommandBuffer, CommandPool};
use aster_rhi::descriptor::{self, DescriptorPool, DescriptorSetLayout};
use aster_rhi::device::Device;
use aster_rhi::image::TextureImage;
use aster_rhi::pipeline::PipelineLayout;
use aster_rhi::vertex::Vertex;
use aster_rhi::{RhiResult, vk};

use aster_scene::Transform;

use crate::MAX_FRAMES_IN_FLIGHT;
use crate::ubo::UniformBufferObject;

/// GPU resources for one scene entity.
pub struct RenderObject {
    /// Device-local vertex buffer.
    vertex_buffer: Buffer,
    /// Device-local index buffer.
    index_buffer: Buffer,
    /// Number of indices to draw.
    index_count: u32,
    /// Sampled color texture.
    texture: TextureImage,
    /// One uniform buffer per frame slot.
    uniform_buffers: Vec<Buffer>,
    /// Pool the object's descriptor sets are allocated from.
    descriptor_pool: DescriptorPool,
    /// One descriptor set per frame slot.
    descriptor_sets: Vec<vk::DescriptorSet>,
    /// Model transform.
    transform: Transform,
}

impl RenderObject {
    /// Creates the GPU bundle for one object.
    ///
    /// Vertex and index data are uploaded through staging into device-local
    /// memory; the texture is uploaded the same way. Uniform buffers stay
    /// host-visible and mapped because they are rewritten every frame.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool for one-shot uploads
    /// * `layout` - Descriptor set layout (binding 0 uniform, binding 1
    ///   combined image sampler)
    /// * `mesh` - Deduplicated mesh data from the asset loader
    /// * `texture` - Decoded RGBA8 texture from the asset loader
    /// * `transform` - Initial model transform
    ///
    /// # Errors
    ///
    /// Returns an error if any buffer, image, or descriptor operation
    /// fails.
    pub fn new(
        device: &Arc<Device>,
        pool: &CommandPool,
        layout: &DescriptorSetLayout,
        mesh: &MeshData,
        texture: &TextureData,
        transform: Transform,
    ) -> RhiResult<Self> {
        let vertices: Vec<Vertex> = mesh
            .vertices
            .iter()
            .map(|v| Vertex::new(v.position, v.color, v.tex_coord))
            .collect();

        let vertex_buffer = Buffer::device_local_with_data(
            device.clone(),
            pool,
            BufferUsage::Vertex,
            bytemuck::cast_slice(&vertices),
        )?;

        let index_buffer = Buffer::device_local_with_data(
            device.clone(),
            pool,
            BufferUsage::Index,
            bytemuck::cast_slice(&mesh.indices),
        )?;

        let texture = TextureImage::from_rgba(
            device.clone(),
            pool,
            &texture.pixels,
            texture.width,
            texture.height,
        )?;

        let uniform_buffers: Vec<Buffer> = (0..MAX_FRAMES_IN_FLIGHT)
            .map(|_| {
                Buffer::new(
                    device.clone(),
                    BufferUsage::Uniform,
                    UniformBufferObject::SIZE as vk::DeviceSize,
                )
            })
            .collect::<RhiResult<_>>()?;

        let pool_sizes = [
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32),
            vk::DescriptorPoolSize::default()
                .ty(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .descriptor_count(MAX_FRAMES_IN_FLIGHT as u32),
        ];
        let descriptor_pool =
            DescriptorPool::new(device.clone(), MAX_FRAMES_IN_FLIGHT as u32, &pool_sizes)?;

        let layouts = vec![layout.handle(); MAX_FRAMES_IN_FLIGHT];
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;

        // Written once; per-frame updates touch only the buffer contents
        for (slot, &set) in descriptor_sets.iter().enumerate() {
            let buffer_infos = [descriptor::buffer_info(
                uniform_buffers[slot].handle(),
                0,
                UniformBufferObject::SIZE as vk::DeviceSize,
            )];
            let image_infos = [descriptor::image_info(
                texture.sampler(),
                texture.view(),
                vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            )];

            let writes = [
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(0)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .buffer_info(&buffer_infos),
                vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(1)
                    .dst_array_element(0)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .image_info(&image_infos),
            ];
            descriptor::update_descriptor_sets(device, &writes);
        }

        debug!(
            "Render object created: {} vertices, {} indices",
            vertices.len(),
            mesh.indices.len()
        );

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            texture,
            uniform_buffers,
            descriptor_pool,
            descriptor_sets,
            transform,
        })
    }

    /// Writes fresh transform data into this object's uniform buffer for
    /// `slot`.
    ///
    /// Called each frame after image acquisition so the slot-correct buffer
    /// is targeted - the buffer for the other slot may still be read by the
    /// GPU.
    ///
    /// # Errors
    ///
    /// Returns an error if the mapped write fails.
    pub fn update_uniforms(&self, slot: usize, view: Mat4, proj: Mat4) -> RhiResult<()> {
        let ubo = UniformBufferObject::new(self.transform.matrix(), view, proj);
        self.uniform_buffers[slot].write(0, bytemuck::bytes_of(&ubo))
    }

    /// Records this object's draw into `cmd` using `slot`'s descriptor set.
    pub fn record_draw(&self, cmd: &CommandBuffer, layout: &PipelineLayout, slot: usize) {
        cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()], &[0]);
        cmd.bind_index_buffer(self.index_buffer.handle(), 0, vk::IndexType::UINT32);
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            layout.handle(),
            0,
            &[self.descriptor_sets[slot]],
            &[],
        );
        cmd.draw_indexed(self.index_count, 1, 0, 0, 0);
    }

    /// Returns the object's transform.
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    /// Returns a mutable reference to the object's transform.
    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    /// Number of indices drawn for this object.
    #[inline]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Returns the object's sampled texture.
    #[inline]
    pub fn texture(&self) -> &TextureImage {
        &self.texture
    }
}
