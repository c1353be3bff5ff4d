//! Image, image view, and sampler management.
//!
//! This module covers sampled textures and the format/layout plumbing
//! around images:
//!
//! - [`TextureImage`] - a sampled 2D image uploaded from raw RGBA pixels
//!   through a staging buffer
//! - [`transition_masks`] - the exhaustive table of supported image layout
//!   transitions
//! - [`find_supported_format`] / [`find_depth_format`] - format capability
//!   queries
//!
//! Layout transitions outside the supported set are a programmer error and
//! fail with [`RhiError::UnsupportedLayoutTransition`] rather than falling
//! back to a catch-all barrier.

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, info};

use crate::buffer::{Buffer, BufferUsage};
use crate::command::{self, CommandBuffer, CommandPool};
use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Source and destination stage/access masks for a layout transition.
pub type TransitionMasks = (
    vk::PipelineStageFlags,
    vk::AccessFlags,
    vk::PipelineStageFlags,
    vk::AccessFlags,
);

/// Returns the barrier masks for a supported layout transition.
///
/// The supported set is exactly what the engine performs:
/// - `UNDEFINED -> TRANSFER_DST_OPTIMAL` (before a staging copy)
/// - `TRANSFER_DST_OPTIMAL -> SHADER_READ_ONLY_OPTIMAL` (after the copy)
/// - `UNDEFINED -> DEPTH_STENCIL_ATTACHMENT_OPTIMAL` (depth image priming)
///
/// # Errors
///
/// Any other combination returns
/// [`RhiError::UnsupportedLayoutTransition`]; extend the table when a new
/// transition is introduced.
pub fn transition_masks(
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> RhiResult<TransitionMasks> {
    match (old_layout, new_layout) {
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::TRANSFER_DST_OPTIMAL) => Ok((
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::TRANSFER,
            vk::AccessFlags::TRANSFER_WRITE,
        )),
        (vk::ImageLayout::TRANSFER_DST_OPTIMAL, vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL) => {
            Ok((
                vk::PipelineStageFlags::TRANSFER,
                vk::AccessFlags::TRANSFER_WRITE,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::AccessFlags::SHADER_READ,
            ))
        }
        (vk::ImageLayout::UNDEFINED, vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL) => Ok((
            vk::PipelineStageFlags::TOP_OF_PIPE,
            vk::AccessFlags::empty(),
            vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )),
        (from, to) => Err(RhiError::UnsupportedLayoutTransition { from, to }),
    }
}

/// Records a layout transition barrier for `image` into `cmd`.
///
/// # Errors
///
/// Returns an error for transitions outside the supported set.
pub fn record_layout_transition(
    cmd: &CommandBuffer,
    image: vk::Image,
    format: vk::Format,
    old_layout: vk::ImageLayout,
    new_layout: vk::ImageLayout,
) -> RhiResult<()> {
    let (src_stage, src_access, dst_stage, dst_access) =
        transition_masks(old_layout, new_layout)?;

    let aspect_mask = if new_layout == vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL {
        if has_stencil_component(format) {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::DEPTH
        }
    } else {
        vk::ImageAspectFlags::COLOR
    };

    let barrier = vk::ImageMemoryBarrier::default()
        .old_layout(old_layout)
        .new_layout(new_layout)
        .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
        .image(image)
        .subresource_range(
            vk::ImageSubresourceRange::default()
                .aspect_mask(aspect_mask)
                .base_mip_level(0)
                .level_count(1)
                .base_array_layer(0)
                .layer_count(1),
        )
        .src_access_mask(src_access)
        .dst_access_mask(dst_access);

    cmd.pipeline_barrier(src_stage, dst_stage, &[barrier]);

    Ok(())
}

/// Checks whether a depth format carries a stencil component.
pub fn has_stencil_component(format: vk::Format) -> bool {
    matches!(
        format,
        vk::Format::D32_SFLOAT_S8_UINT | vk::Format::D24_UNORM_S8_UINT
    )
}

/// Finds the first candidate format supporting the given tiling and features.
///
/// # Errors
///
/// Returns [`RhiError::UnsupportedFormat`] if no candidate qualifies.
pub fn find_supported_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    candidates: &[vk::Format],
    tiling: vk::ImageTiling,
    features: vk::FormatFeatureFlags,
) -> RhiResult<vk::Format> {
    for &format in candidates {
        let props =
            unsafe { instance.get_physical_device_format_properties(physical_device, format) };

        let supported = match tiling {
            vk::ImageTiling::LINEAR => props.linear_tiling_features.contains(features),
            vk::ImageTiling::OPTIMAL => props.optimal_tiling_features.contains(features),
            _ => false,
        };

        if supported {
            return Ok(format);
        }
    }

    Err(RhiError::UnsupportedFormat(format!(
        "no candidate in {:?} supports {:?} with {:?} tiling",
        candidates, features, tiling
    )))
}

/// Finds a depth attachment format supported by the device.
///
/// # Errors
///
/// Returns [`RhiError::UnsupportedFormat`] if the device supports none of
/// the depth candidates.
pub fn find_depth_format(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> RhiResult<vk::Format> {
    find_supported_format(
        instance,
        physical_device,
        &[
            vk::Format::D32_SFLOAT,
            vk::Format::D32_SFLOAT_S8_UINT,
            vk::Format::D24_UNORM_S8_UINT,
        ],
        vk::ImageTiling::OPTIMAL,
        vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT,
    )
}

/// A sampled 2D texture: image, view, sampler, and backing memory.
///
/// Uploaded once at load time from raw RGBA pixels through a staging
/// buffer, then read-only for its lifetime.
pub struct TextureImage {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Vulkan image handle.
    image: vk::Image,
    /// Image view for shader access.
    view: vk::ImageView,
    /// Sampler with anisotropic filtering.
    sampler: vk::Sampler,
    /// GPU memory allocation.
    allocation: Option<Allocation>,
    /// Image dimensions.
    extent: vk::Extent2D,
}

impl TextureImage {
    /// Creates a sampled texture from raw RGBA8 pixels.
    ///
    /// The pixels are written to a staging buffer, the image is transitioned
    /// to the transfer layout, copied into, and transitioned to the shader
    /// read-only layout - all within one one-shot command buffer.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool for the one-shot upload
    /// * `pixels` - Tightly packed RGBA8 data, `width * height * 4` bytes
    /// * `width` - Texture width in pixels
    /// * `height` - Texture height in pixels
    ///
    /// # Errors
    ///
    /// Returns an error if the pixel buffer size does not match the
    /// dimensions, or if any Vulkan object creation or the upload fails.
    pub fn from_rgba(
        device: Arc<Device>,
        pool: &CommandPool,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> RhiResult<Self> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(RhiError::InvalidHandle(format!(
                "Pixel buffer is {} bytes, expected {} for {}x{} RGBA",
                pixels.len(),
                expected,
                width,
                height
            )));
        }

        let format = vk::Format::R8G8B8A8_SRGB;
        let extent = vk::Extent2D { width, height };

        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .mip_levels(1)
            .array_layers(1)
            .samples(vk::SampleCountFlags::TYPE_1)
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(vk::ImageUsageFlags::TRANSFER_DST | vk::ImageUsageFlags::SAMPLED)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe { device.handle().create_image(&image_info, None)? };

        let requirements = unsafe { device.handle().get_image_memory_requirements(image) };

        let allocation = {
            let mut allocator = device.allocator().lock().unwrap();
            allocator.allocate(&AllocationCreateDesc {
                name: "texture",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })?
        };

        unsafe {
            device
                .handle()
                .bind_image_memory(image, allocation.memory(), allocation.offset())?;
        }

        let staging = Buffer::new_with_data(device.clone(), BufferUsage::Staging, pixels)?;

        let mut transition_result = Ok(());
        command::submit_one_time(&device, pool, |cmd| {
            transition_result = (|| {
                record_layout_transition(
                    cmd,
                    image,
                    format,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                )?;

                let region = vk::BufferImageCopy::default()
                    .buffer_offset(0)
                    .buffer_row_length(0)
                    .buffer_image_height(0)
                    .image_subresource(
                        vk::ImageSubresourceLayers::default()
                            .aspect_mask(vk::ImageAspectFlags::COLOR)
                            .mip_level(0)
                            .base_array_layer(0)
                            .layer_count(1),
                    )
                    .image_extent(vk::Extent3D {
                        width,
                        height,
                        depth: 1,
                    });

                cmd.copy_buffer_to_image(
                    staging.handle(),
                    image,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    &[region],
                );

                record_layout_transition(
                    cmd,
                    image,
                    format,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                )
            })();
        })?;
        transition_result?;

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .base_mip_level(0)
                    .level_count(1)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe { device.handle().create_image_view(&view_info, None)? };

        let sampler_info = vk::SamplerCreateInfo::default()
            .mag_filter(vk::Filter::LINEAR)
            .min_filter(vk::Filter::LINEAR)
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(true)
            .max_anisotropy(16.0)
            .border_color(vk::BorderColor::INT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .mipmap_mode(vk::SamplerMipmapMode::LINEAR);

        let sampler = unsafe { device.handle().create_sampler(&sampler_info, None)? };

        info!("Texture uploaded: {}x{} ({:?})", width, height, format);

        Ok(Self {
            device,
            image,
            view,
            sampler,
            allocation: Some(allocation),
            extent,
        })
    }

    /// Returns the Vulkan image handle.
    #[inline]
    pub fn image(&self) -> vk::Image {
        self.image
    }

    /// Returns the image view handle.
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view
    }

    /// Returns the sampler handle.
    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler
    }

    /// Returns the texture dimensions.
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}

impl Drop for TextureImage {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_sampler(self.sampler, None);
            self.device.handle().destroy_image_view(self.view, None);
            self.device.handle().destroy_image(self.image, None);
        }

        if let Some(allocation) = self.allocation.take() {
            let mut allocator = self.device.allocator().lock().unwrap();
            if let Err(e) = allocator.free(allocation) {
                tracing::error!("Failed to free texture allocation: {:?}", e);
            }
        }

        debug!(
            "Destroyed texture: {}x{}",
            self.extent.width, self.extent.height
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_transitions() {
        let (src_stage, src_access, dst_stage, dst_access) = transition_masks(
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        )
        .unwrap();
        assert_eq!(src_stage, vk::PipelineStageFlags::TOP_OF_PIPE);
        assert_eq!(src_access, vk::AccessFlags::empty());
        assert_eq!(dst_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(dst_access, vk::AccessFlags::TRANSFER_WRITE);

        let (src_stage, _, dst_stage, dst_access) = transition_masks(
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        )
        .unwrap();
        assert_eq!(src_stage, vk::PipelineStageFlags::TRANSFER);
        assert_eq!(dst_stage, vk::PipelineStageFlags::FRAGMENT_SHADER);
        assert_eq!(dst_access, vk::AccessFlags::SHADER_READ);

        assert!(
            transition_masks(
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            )
            .is_ok()
        );
    }

    #[test]
    fn test_unsupported_transition_fails_loudly() {
        let result = transition_masks(
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        assert!(matches!(
            result,
            Err(RhiError::UnsupportedLayoutTransition { .. })
        ));

        let result = transition_masks(
            vk::ImageLayout::PRESENT_SRC_KHR,
            vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        );
        assert!(matches!(
            result,
            Err(RhiError::UnsupportedLayoutTransition { .. })
        ));
    }

    #[test]
    fn test_has_stencil_component() {
        assert!(has_stencil_component(vk::Format::D32_SFLOAT_S8_UINT));
        assert!(has_stencil_component(vk::Format::D24_UNORM_S8_UINT));
        assert!(!has_stencil_component(vk::Format::D32_SFLOAT));
        assert!(!has_stencil_component(vk::Format::R8G8B8A8_SRGB));
    }
}
