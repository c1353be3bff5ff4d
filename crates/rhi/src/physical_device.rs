//! Physical device (GPU) selection.
//!
//! This module handles GPU enumeration and selection based on capabilities.
//!
//! # Overview
//!
//! The physical device selection process involves:
//! 1. Enumerating all available GPUs
//! 2. Collecting a capability report ([`AdapterProfile`]) for each
//! 3. Scoring each report with a pure function
//! 4. Selecting the highest-scoring device
//!
//! Scoring favors discrete GPUs (+1000) and larger 2D image limits, and
//! disqualifies devices that lack the geometry-shader feature or fail the
//! suitability check (resolvable graphics and present queue families, the
//! swapchain device extension, non-empty surface format and present-mode
//! lists, and sampler anisotropy). Ties are broken by enumeration order,
//! so selection is deterministic for a fixed device list.

use std::ffi::CStr;

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::RhiError;

/// Queue family indices required for rendering and presentation.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueueFamilyIndices {
    /// Index of the queue family that supports graphics operations.
    pub graphics_family: Option<u32>,
    /// Index of the queue family that supports presentation to a surface.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Checks if the minimum required queue families are available.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Returns the unique queue family indices as a vector.
    ///
    /// This is useful when creating logical devices to avoid creating
    /// duplicate queues for the same family.
    pub fn unique_families(&self) -> Vec<u32> {
        let mut families = Vec::with_capacity(2);

        if let Some(graphics) = self.graphics_family {
            families.push(graphics);
        }
        if let Some(present) = self.present_family {
            if !families.contains(&present) {
                families.push(present);
            }
        }

        families
    }
}

/// A capability report for one physical device.
///
/// Everything the scoring function looks at, collected into a plain struct
/// so that scoring is a pure function of the report and can be tested
/// without a GPU.
#[derive(Clone, Copy, Debug)]
pub struct AdapterProfile {
    /// Device type (discrete, integrated, etc.).
    pub device_type: vk::PhysicalDeviceType,
    /// Maximum supported 2D image dimension.
    pub max_image_dimension_2d: u32,
    /// Whether the geometry-shader feature is present.
    pub has_geometry_shader: bool,
    /// Whether the sampler-anisotropy feature is present.
    pub has_sampler_anisotropy: bool,
    /// Whether the swapchain device extension is available.
    pub supports_swapchain: bool,
    /// Whether a graphics queue family was resolved.
    pub has_graphics_queue: bool,
    /// Whether a present-capable queue family was resolved.
    pub has_present_queue: bool,
    /// Number of supported surface formats.
    pub surface_format_count: usize,
    /// Number of supported present modes.
    pub present_mode_count: usize,
}

impl AdapterProfile {
    /// Checks whether the device satisfies the hard requirements.
    pub fn is_suitable(&self) -> bool {
        self.has_graphics_queue
            && self.has_present_queue
            && self.supports_swapchain
            && self.surface_format_count > 0
            && self.present_mode_count > 0
            && self.has_sampler_anisotropy
    }

    /// Scores the device.
    ///
    /// Discrete GPUs get a 1000-point head start; the maximum 2D image
    /// dimension is added on top as a rough capability proxy. A device
    /// without geometry-shader support, or one failing [`is_suitable`],
    /// scores 0 and is disqualified.
    ///
    /// [`is_suitable`]: Self::is_suitable
    pub fn score(&self) -> u32 {
        if !self.has_geometry_shader || !self.is_suitable() {
            return 0;
        }

        let mut score = 0u32;
        if self.device_type == vk::PhysicalDeviceType::DISCRETE_GPU {
            score += 1000;
        }
        score += self.max_image_dimension_2d;
        score
    }
}

/// Information about a selected physical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version, etc.).
    pub properties: vk::PhysicalDeviceProperties,
    /// Supported device features.
    pub features: vk::PhysicalDeviceFeatures,
    /// Queue family indices for graphics and presentation.
    pub queue_families: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        unsafe {
            CStr::from_ptr(self.properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown Device")
        }
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

/// Selects the most suitable physical device for rendering.
///
/// # Arguments
///
/// * `instance` - The Vulkan instance
/// * `surface` - The window surface for present support checking
/// * `surface_loader` - The surface extension loader
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no device qualifies.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<PhysicalDeviceInfo, RhiError> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let mut best: Option<(PhysicalDeviceInfo, u32)> = None;

    for device in devices {
        let (info, profile) = inspect_device(instance, device, surface, surface_loader)?;
        let score = profile.score();
        debug!(
            "GPU '{}' ({}) - score {}",
            info.device_name(),
            info.device_type_name(),
            score
        );

        if score == 0 {
            continue;
        }

        // Strictly-greater keeps the first enumerated device on ties.
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((info, score)),
        }
    }

    let (selected, score) = best.ok_or_else(|| {
        warn!("No suitable GPU found with required capabilities");
        RhiError::NoSuitableGpu
    })?;

    info!(
        "Selected GPU: '{}' ({}), score {}",
        selected.device_name(),
        selected.device_type_name(),
        score
    );

    Ok(selected)
}

/// Collects device info and a scoring profile for one physical device.
fn inspect_device(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> Result<(PhysicalDeviceInfo, AdapterProfile), RhiError> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let features = unsafe { instance.get_physical_device_features(device) };

    let queue_families = find_queue_families(instance, device, surface, surface_loader);
    let supports_swapchain = supports_swapchain_extension(instance, device)?;

    // Surface queries are only meaningful when the swapchain extension exists.
    let (format_count, present_mode_count) = if supports_swapchain {
        let formats =
            unsafe { surface_loader.get_physical_device_surface_formats(device, surface)? };
        let modes =
            unsafe { surface_loader.get_physical_device_surface_present_modes(device, surface)? };
        (formats.len(), modes.len())
    } else {
        (0, 0)
    };

    let profile = AdapterProfile {
        device_type: properties.device_type,
        max_image_dimension_2d: properties.limits.max_image_dimension2_d,
        has_geometry_shader: features.geometry_shader == vk::TRUE,
        has_sampler_anisotropy: features.sampler_anisotropy == vk::TRUE,
        supports_swapchain,
        has_graphics_queue: queue_families.graphics_family.is_some(),
        has_present_queue: queue_families.present_family.is_some(),
        surface_format_count: format_count,
        present_mode_count,
    };

    let info = PhysicalDeviceInfo {
        device,
        properties,
        features,
        queue_families,
    };

    Ok((info, profile))
}

/// Finds graphics and present queue family indices.
fn find_queue_families(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
) -> QueueFamilyIndices {
    let queue_families = unsafe { instance.get_physical_device_queue_family_properties(device) };

    let mut indices = QueueFamilyIndices::default();

    for (i, family) in queue_families.iter().enumerate() {
        let i = i as u32;

        if family.queue_count == 0 {
            continue;
        }

        if indices.graphics_family.is_none()
            && family.queue_flags.contains(vk::QueueFlags::GRAPHICS)
        {
            indices.graphics_family = Some(i);
        }

        if indices.present_family.is_none() {
            let present_support = unsafe {
                surface_loader
                    .get_physical_device_surface_support(device, i, surface)
                    .unwrap_or(false)
            };
            if present_support {
                indices.present_family = Some(i);
            }
        }

        if indices.is_complete() {
            break;
        }
    }

    indices
}

/// Checks whether the device exposes the swapchain extension.
fn supports_swapchain_extension(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
) -> Result<bool, RhiError> {
    let extensions = unsafe { instance.enumerate_device_extension_properties(device)? };

    let wanted = ash::khr::swapchain::NAME.to_bytes_with_nul();
    let found = extensions.iter().any(|ext| {
        let name = unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) };
        name.to_bytes_with_nul() == wanted
    });

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suitable_profile() -> AdapterProfile {
        AdapterProfile {
            device_type: vk::PhysicalDeviceType::INTEGRATED_GPU,
            max_image_dimension_2d: 4096,
            has_geometry_shader: true,
            has_sampler_anisotropy: true,
            supports_swapchain: true,
            has_graphics_queue: true,
            has_present_queue: true,
            surface_format_count: 2,
            present_mode_count: 2,
        }
    }

    #[test]
    fn test_discrete_beats_integrated() {
        let integrated = suitable_profile();
        let discrete = AdapterProfile {
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            max_image_dimension_2d: 8192,
            ..suitable_profile()
        };

        // 1000 + 8192 > 0 + 4096
        assert!(discrete.score() > integrated.score());
        assert_eq!(discrete.score(), 1000 + 8192);
        assert_eq!(integrated.score(), 4096);
    }

    #[test]
    fn test_missing_geometry_shader_disqualifies() {
        let profile = AdapterProfile {
            has_geometry_shader: false,
            ..suitable_profile()
        };
        assert_eq!(profile.score(), 0);
    }

    #[test]
    fn test_unsuitable_device_disqualifies() {
        let no_present = AdapterProfile {
            has_present_queue: false,
            ..suitable_profile()
        };
        assert_eq!(no_present.score(), 0);

        let no_formats = AdapterProfile {
            surface_format_count: 0,
            ..suitable_profile()
        };
        assert_eq!(no_formats.score(), 0);

        let no_anisotropy = AdapterProfile {
            has_sampler_anisotropy: false,
            ..suitable_profile()
        };
        assert_eq!(no_anisotropy.score(), 0);

        let no_swapchain = AdapterProfile {
            supports_swapchain: false,
            ..suitable_profile()
        };
        assert_eq!(no_swapchain.score(), 0);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let profile = suitable_profile();
        let first = profile.score();
        for _ in 0..100 {
            assert_eq!(profile.score(), first);
        }
    }

    #[test]
    fn test_queue_family_indices_complete() {
        let indices = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(1),
        };
        assert!(indices.is_complete());
        assert_eq!(indices.unique_families(), vec![0, 1]);

        let shared = QueueFamilyIndices {
            graphics_family: Some(0),
            present_family: Some(0),
        };
        assert!(shared.is_complete());
        assert_eq!(shared.unique_families(), vec![0]);
    }

    #[test]
    fn test_queue_family_indices_incomplete() {
        assert!(!QueueFamilyIndices::default().is_complete());
        assert!(
            !QueueFamilyIndices {
                graphics_family: Some(0),
                present_family: None,
            }
            .is_complete()
        );
    }
}
