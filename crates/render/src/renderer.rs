//! Main renderer orchestration.
//!
//! [`Renderer`] owns the full Vulkan resource graph and runs one frame of
//! the synchronization protocol per [`render_frame`](Renderer::render_frame)
//! call.
//!
//! # Construction and destruction order
//!
//! Resources are built instance -> surface -> device -> swapchain ->
//! render pass -> depth buffer -> framebuffers -> descriptors -> pipeline
//! -> command pool -> scene objects -> frame slots, and destroyed in
//! strict reverse order after a device-idle wait. `ManuallyDrop` pins the
//! order explicitly; no resource is freed by hand anywhere else.

use std::mem::ManuallyDrop;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info};

use aster_assets::{MeshData, TextureData};
use aster_core::RenderSettings;
use aster_platform::{Surface, Window};
use aster_rhi::command::CommandPool;
use aster_rhi::descriptor::{self, DescriptorSetLayout};
use aster_rhi::device::Device;
use aster_rhi::image;
use aster_rhi::instance::Instance;
use aster_rhi::physical_device::select_physical_device;
use aster_rhi::pipeline::{CullMode, GraphicsPipelineBuilder, Pipeline, PipelineLayout};
use aster_rhi::render_pass::{Framebuffer, RenderPass};
use aster_rhi::shader::{Shader, ShaderStage};
use aster_rhi::swapchain::{AcquiredImage, SurfaceStatus, Swapchain};
use aster_rhi::vertex::Vertex;
use aster_rhi::{RhiError, RhiResult, vk};
use aster_scene::{Camera, Transform};

use crate::frame::FrameManager;
use crate::object::RenderObject;
use crate::depth::DepthBuffer;

/// Description of one scene object to load at startup.
#[derive(Clone, Debug)]
pub struct SceneObjectDesc {
    /// Path to the OBJ mesh file.
    pub mesh: PathBuf,
    /// Path to the color texture file.
    pub texture: PathBuf,
    /// Initial model transform.
    pub transform: Transform,
}

/// Owns all Vulkan resources and drives the frame loop.
pub struct Renderer {
    // Declared in construction order; Drop runs the reverse explicitly.
    instance: ManuallyDrop<Instance>,
    surface: ManuallyDrop<Surface>,
    device: ManuallyDrop<Arc<Device>>,
    swapchain: ManuallyDrop<Swapchain>,
    render_pass: ManuallyDrop<RenderPass>,
    depth_buffer: ManuallyDrop<DepthBuffer>,
    framebuffers: Vec<Framebuffer>,
    descriptor_set_layout: ManuallyDrop<DescriptorSetLayout>,
    pipeline_layout: ManuallyDrop<PipelineLayout>,
    pipeline: ManuallyDrop<Pipeline>,
    command_pool: ManuallyDrop<CommandPool>,
    objects: Vec<RenderObject>,
    frames: ManuallyDrop<FrameManager>,

    /// Scene camera.
    camera: Camera,
    /// Depth format selected at startup, reused on rebuild.
    depth_format: vk::Format,
    /// Set by `resize`, consumed at the top of the next frame.
    pending_rebuild: bool,
    /// Current drawable width.
    width: u32,
    /// Current drawable height.
    height: u32,
}

impl Renderer {
    /// Initializes the renderer and loads the scene.
    ///
    /// Any failure here is fatal: the error propagates out and the run
    /// loop is never entered.
    ///
    /// # Arguments
    ///
    /// * `window` - The window to render to
    /// * `settings` - Startup configuration (validation, shader paths)
    /// * `scene` - Objects to load
    ///
    /// # Errors
    ///
    /// Returns an error if device selection, any Vulkan object creation,
    /// or asset loading fails.
    pub fn new(
        window: &Window,
        settings: &RenderSettings,
        scene: &[SceneObjectDesc],
    ) -> RhiResult<Self> {
        let width = window.width();
        let height = window.height();

        info!("Initializing renderer ({}x{})", width, height);

        let instance = Instance::new(&settings.title, settings.enable_validation)?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device_info =
            select_physical_device(instance.handle(), surface.handle(), surface.loader())?;

        let device = Device::new(&instance, &physical_device_info)?;

        let swapchain = Swapchain::new(&instance, device.clone(), surface.handle(), width, height)?;

        let depth_format =
            image::find_depth_format(instance.handle(), device.physical_device())?;

        let render_pass = RenderPass::new(device.clone(), swapchain.format(), depth_format)?;

        let extent = swapchain.extent();
        let depth_buffer =
            DepthBuffer::new(device.clone(), extent.width, extent.height, depth_format)?;

        let framebuffers =
            Self::create_framebuffers(&device, &render_pass, &swapchain, &depth_buffer)?;

        // Binding 0: per-object uniforms in the vertex stage.
        // Binding 1: color texture in the fragment stage.
        let bindings = [
            descriptor::uniform_buffer_binding(0, vk::ShaderStageFlags::VERTEX),
            descriptor::combined_image_sampler_binding(1, vk::ShaderStageFlags::FRAGMENT),
        ];
        let descriptor_set_layout = DescriptorSetLayout::new(device.clone(), &bindings)?;

        let pipeline_layout =
            PipelineLayout::new(device.clone(), &[descriptor_set_layout.handle()])?;

        let vertex_shader = Shader::from_spirv_file(
            device.clone(),
            &settings.vertex_shader,
            ShaderStage::Vertex,
            "main",
        )?;
        let fragment_shader = Shader::from_spirv_file(
            device.clone(),
            &settings.fragment_shader,
            ShaderStage::Fragment,
            "main",
        )?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&vertex_shader)
            .fragment_shader(&fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .cull_mode(CullMode::Back)
            .build(device.clone(), &pipeline_layout, &render_pass)?;

        let graphics_family = device.queue_families().graphics_family.unwrap();
        let command_pool = CommandPool::new(device.clone(), graphics_family)?;

        let mut objects = Vec::with_capacity(scene.len());
        for desc in scene {
            let mesh = MeshData::load_obj(&desc.mesh)
                .map_err(|e| RhiError::InvalidHandle(e.to_string()))?;
            let texture = TextureData::load(&desc.texture)
                .map_err(|e| RhiError::InvalidHandle(e.to_string()))?;

            objects.push(RenderObject::new(
                &device,
                &command_pool,
                &descriptor_set_layout,
                &mesh,
                &texture,
                desc.transform,
            )?);
        }

        let frames = FrameManager::new(device.clone(), &command_pool, swapchain.image_count())?;

        info!(
            "Renderer initialized: {} swapchain images, {} objects",
            swapchain.image_count(),
            objects.len()
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            surface: ManuallyDrop::new(surface),
            device: ManuallyDrop::new(device),
            swapchain: ManuallyDrop::new(swapchain),
            render_pass: ManuallyDrop::new(render_pass),
            depth_buffer: ManuallyDrop::new(depth_buffer),
            framebuffers,
            descriptor_set_layout: ManuallyDrop::new(descriptor_set_layout),
            pipeline_layout: ManuallyDrop::new(pipeline_layout),
            pipeline: ManuallyDrop::new(pipeline),
            command_pool: ManuallyDrop::new(command_pool),
            objects,
            frames: ManuallyDrop::new(frames),
            camera: Camera::new(),
            depth_format,
            pending_rebuild: false,
            width,
            height,
        })
    }

    /// Creates one framebuffer per swapchain image.
    fn create_framebuffers(
        device: &Arc<Device>,
        render_pass: &RenderPass,
        swapchain: &Swapchain,
        depth_buffer: &DepthBuffer,
    ) -> RhiResult<Vec<Framebuffer>> {
        let extent = swapchain.extent();
        let mut framebuffers = Vec::with_capacity(swapchain.image_count());

        for index in 0..swapchain.image_count() {
            framebuffers.push(Framebuffer::new(
                device.clone(),
                render_pass,
                swapchain.image_view(index),
                depth_buffer.image_view(),
                extent,
            )?);
        }

        debug!("Created {} framebuffers", framebuffers.len());
        Ok(framebuffers)
    }

    /// Notifies the renderer that the window has been resized.
    ///
    /// The swapchain rebuild happens at the top of the next frame.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            debug!("Ignoring resize to zero dimensions");
            return;
        }

        if width != self.width || height != self.height {
            debug!(
                "Resize: {}x{} -> {}x{}",
                self.width, self.height, width, height
            );
            self.width = width;
            self.height = height;
            self.pending_rebuild = true;
        }
    }

    /// Returns the scene camera.
    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Returns a mutable reference to the scene camera.
    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Advances the scene animation by `delta_secs` seconds.
    ///
    /// Each object spins about the Z axis at a quarter turn per second.
    pub fn update(&mut self, delta_secs: f32) {
        let angle = delta_secs * 90.0_f32.to_radians();
        for object in &mut self.objects {
            object.transform_mut().rotate_z(angle);
        }
    }

    /// Renders one frame.
    ///
    /// Runs the full per-frame protocol: fence wait, command buffer reset,
    /// image acquire, image-ownership cross-check, command recording,
    /// uniform refresh, submit, present, slot advance. An out-of-date
    /// surface triggers a swapchain rebuild and skips the frame.
    ///
    /// # Errors
    ///
    /// Returns an error if any Vulkan operation fails in a way that is not
    /// a recoverable surface condition.
    pub fn render_frame(&mut self) -> RhiResult<()> {
        if self.pending_rebuild {
            debug!("Rebuild requested, recreating swapchain before acquire");
            self.rebuild_swapchain()?;
        }

        // 1. Wait until this slot's previous submission has retired
        self.frames.wait_for_slot()?;

        // 2. The fence wait makes resetting the command buffer safe
        self.frames.reset_recording()?;

        // 3. Acquire a presentable image
        let suboptimal = match self.frames.acquire(&self.swapchain)? {
            AcquiredImage::Ready { suboptimal, .. } => suboptimal,
            AcquiredImage::OutOfDate => {
                self.rebuild_swapchain()?;
                return Ok(());
            }
        };

        // 4. Do not touch an image another slot still has in flight
        self.frames.sync_image_ownership()?;

        // 5. Record this frame's commands
        let image_index = self.frames.image_index();
        self.record_commands(image_index)?;

        // 6. Refresh per-object uniforms for this slot
        self.update_uniforms()?;

        // 7. Re-arm the fence and submit
        self.frames.submit()?;

        // 8. Present, gated on render-finished
        let status = self.frames.present(&self.swapchain)?;

        // 9. Next slot
        self.frames.advance();

        if suboptimal || status != SurfaceStatus::Optimal {
            debug!("Surface {:?} after present, rebuilding swapchain", status);
            self.rebuild_swapchain()?;
        }

        Ok(())
    }

    /// Records the current frame's commands into the active slot's buffer.
    ///
    /// Purely sequential and side-effect-free beyond the command buffer;
    /// nothing is submitted here.
    fn record_commands(&self, image_index: u32) -> RhiResult<()> {
        let slot = self.frames.current_slot();
        let slot_index = self.frames.current_index();
        let cmd = slot.command_buffer();
        let extent = self.swapchain.extent();

        cmd.begin()?;

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: [0.05, 0.05, 0.08, 1.0],
                },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: 1.0,
                    stencil: 0,
                },
            },
        ];

        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent,
        };

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(self.render_pass.handle())
            .framebuffer(self.framebuffers[image_index as usize].handle())
            .render_area(render_area)
            .clear_values(&clear_values);

        cmd.begin_render_pass(&begin_info);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        cmd.set_viewport(&viewport);
        cmd.set_scissor(&render_area);

        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());

        for object in &self.objects {
            object.record_draw(cmd, &self.pipeline_layout, slot_index);
        }

        cmd.end_render_pass();
        cmd.end()?;

        Ok(())
    }

    /// Writes fresh view/projection/model data into every object's uniform
    /// buffer for the active slot.
    fn update_uniforms(&self) -> RhiResult<()> {
        let slot = self.frames.current_index();
        let extent = self.swapchain.extent();
        let aspect = extent.width as f32 / extent.height as f32;

        let view = self.camera.view_matrix();
        let proj = self.camera.projection_matrix(aspect);

        for object in &self.objects {
            object.update_uniforms(slot, view, proj)?;
        }

        Ok(())
    }

    /// Rebuilds the swapchain and everything derived from it.
    ///
    /// Order: device idle -> swapchain (reusing the old handle) -> depth
    /// buffer -> framebuffers -> frame sync state (fresh semaphores, image
    /// ownership cleared). The pipeline survives because viewport and
    /// scissor are dynamic; descriptor sets survive because they reference
    /// only uniform buffers and textures, never swapchain views.
    fn rebuild_swapchain(&mut self) -> RhiResult<()> {
        self.device.wait_idle()?;

        self.swapchain.recreate(
            &self.instance,
            self.surface.handle(),
            self.width,
            self.height,
        )?;

        let extent = self.swapchain.extent();
        let new_depth = DepthBuffer::new(
            (*self.device).clone(),
            extent.width,
            extent.height,
            self.depth_format,
        )?;
        unsafe {
            ManuallyDrop::drop(&mut self.depth_buffer);
        }
        self.depth_buffer = ManuallyDrop::new(new_depth);

        self.framebuffers.clear();
        self.framebuffers = Self::create_framebuffers(
            &self.device,
            &self.render_pass,
            &self.swapchain,
            &self.depth_buffer,
        )?;

        self.frames.rebuild_sync(self.swapchain.image_count())?;

        self.pending_rebuild = false;
        info!(
            "Swapchain rebuilt: {}x{}, {} images",
            extent.width,
            extent.height,
            self.swapchain.image_count()
        );

        Ok(())
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Nothing may be destroyed while the GPU still reads it
        if let Err(e) = self.device.wait_idle() {
            error!("Failed to wait for device idle during drop: {:?}", e);
        }

        unsafe {
            ManuallyDrop::drop(&mut self.frames);
            self.objects.clear();
            self.framebuffers.clear();
            ManuallyDrop::drop(&mut self.command_pool);
            ManuallyDrop::drop(&mut self.pipeline);
            ManuallyDrop::drop(&mut self.pipeline_layout);
            ManuallyDrop::drop(&mut self.descriptor_set_layout);
            ManuallyDrop::drop(&mut self.depth_buffer);
            ManuallyDrop::drop(&mut self.render_pass);
            ManuallyDrop::drop(&mut self.swapchain);
            // The device goes before the surface and instance it borrows
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
