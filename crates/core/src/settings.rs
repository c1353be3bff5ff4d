//! Render settings.

use std::path::PathBuf;

/// Startup configuration for the renderer.
///
/// Collected in one place and passed by reference into the renderer at
/// construction, rather than read from globals.
#[derive(Clone, Debug)]
pub struct RenderSettings {
    /// Initial window width in pixels.
    pub width: u32,
    /// Initial window height in pixels.
    pub height: u32,
    /// Window and application title.
    pub title: String,
    /// Enable Vulkan validation layers when available.
    pub enable_validation: bool,
    /// Path to the precompiled vertex shader.
    pub vertex_shader: PathBuf,
    /// Path to the precompiled fragment shader.
    pub fragment_shader: PathBuf,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Aster".to_string(),
            enable_validation: cfg!(debug_assertions),
            vertex_shader: PathBuf::from("shaders/spirv/scene.vert.spv"),
            fragment_shader: PathBuf::from("shaders/spirv/scene.frag.spv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = RenderSettings::default();
        assert!(settings.width > 0);
        assert!(settings.height > 0);
        assert!(!settings.title.is_empty());
    }
}
