//! Frame slot management and CPU/GPU synchronization.
//!
//! This module implements the frames-in-flight protocol at the heart of the
//! render loop:
//!
//! 1. While the GPU executes frame N, the CPU records frame N+1
//! 2. Each frame slot owns its command buffer, semaphores, and fence
//! 3. The slot fence is the only point the CPU blocks on GPU progress
//!
//! # Per-frame protocol
//!
//! ```text
//! 1. Wait on the slot's in-flight fence (CPU blocks until the slot's
//!    previous submission has fully retired)
//! 2. Reset the slot's command buffer (safe after the fence wait)
//! 3. Acquire a swapchain image (signals the slot's image-available
//!    semaphore GPU-side)
//! 4. If a *different* slot last targeted this image, wait on that slot's
//!    fence too, then record this slot as the image's owner
//! 5. Record commands into the slot's command buffer
//! 6. Write fresh uniform data into the slot's per-object buffers
//! 7. Reset the fence, then submit:
//!      wait  = image-available (at color-attachment-output)
//!      signal = render-finished
//!      fence  = in-flight
//! 8. Present, gated on render-finished
//! 9. Advance to the next slot
//! ```
//!
//! Step 4 exists because the swapchain image count and the slot count are
//! independent (e.g. 3 images, 2 slots): without it, two slots could have
//! submissions targeting the same physical image at once. Resetting the
//! fence in step 7 rather than right after the wait means a waiter can
//! never observe the fence signaled while the submission that re-arms it
//! is still pending.
//!
//! The slot bookkeeping (current index, image ownership) lives in
//! [`FlightTracker`], which is plain state with no Vulkan dependencies.

use std::sync::Arc;

use tracing::{debug, info};

use aster_rhi::command::{CommandBuffer, CommandPool};
use aster_rhi::device::Device;
use aster_rhi::swapchain::{AcquiredImage, SurfaceStatus, Swapchain};
use aster_rhi::sync::{Fence, Semaphore};
use aster_rhi::{RhiResult, vk};

use crate::MAX_FRAMES_IN_FLIGHT;

/// Slot and image-ownership bookkeeping for the frame loop.
///
/// Pure state: the current slot index, advanced modulo the slot count, and
/// a map from swapchain image index to the slot that last submitted work
/// targeting it.
#[derive(Debug, Clone)]
pub struct FlightTracker {
    /// Index of the slot being recorded, always < `slot_count`.
    current: usize,
    /// Number of frame slots.
    slot_count: usize,
    /// Which slot last targeted each swapchain image.
    image_owner: Vec<Option<usize>>,
}

impl FlightTracker {
    /// Creates a tracker for `slot_count` slots over `image_count`
    /// swapchain images.
    pub fn new(slot_count: usize, image_count: usize) -> Self {
        assert!(slot_count > 0, "at least one frame slot is required");
        Self {
            current: 0,
            slot_count,
            image_owner: vec![None; image_count],
        }
    }

    /// Index of the slot currently being recorded.
    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    /// Number of frame slots.
    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Advances to the next slot, wrapping at the slot count.
    #[inline]
    pub fn advance(&mut self) {
        self.current = (self.current + 1) % self.slot_count;
    }

    /// Records the current slot as the owner of `image_index`.
    ///
    /// Returns the slot that previously owned the image when it differs
    /// from the current slot; the caller must wait on that slot's fence
    /// before reusing the image.
    pub fn claim_image(&mut self, image_index: usize) -> Option<usize> {
        let prior = self.image_owner[image_index];
        self.image_owner[image_index] = Some(self.current);
        prior.filter(|&slot| slot != self.current)
    }

    /// Clears image ownership for a rebuilt swapchain with `image_count`
    /// images.
    pub fn reset_images(&mut self, image_count: usize) {
        self.image_owner.clear();
        self.image_owner.resize(image_count, None);
    }
}

/// Per-frame-slot resources.
///
/// Each slot owns the command buffer it records into and the
/// synchronization objects gating its reuse. The fence starts signaled so
/// the first wait on a never-submitted slot returns immediately.
pub struct FrameSlot {
    /// Command buffer recorded for this slot's frame.
    command_buffer: CommandBuffer,
    /// Signaled when the acquired swapchain image is ready.
    image_available: Semaphore,
    /// Signaled when this slot's submission finishes executing.
    render_finished: Semaphore,
    /// Signaled when this slot's submission fully retires.
    in_flight: Fence,
}

impl FrameSlot {
    fn new(device: Arc<Device>, pool: &CommandPool) -> RhiResult<Self> {
        let command_buffer = CommandBuffer::new(device.clone(), pool)?;
        let image_available = Semaphore::new(device.clone())?;
        let render_finished = Semaphore::new(device.clone())?;
        // Signaled so the first frame does not wait forever
        let in_flight = Fence::new(device, true)?;

        Ok(Self {
            command_buffer,
            image_available,
            render_finished,
            in_flight,
        })
    }

    /// Returns the slot's command buffer.
    #[inline]
    pub fn command_buffer(&self) -> &CommandBuffer {
        &self.command_buffer
    }

    /// Returns the slot's in-flight fence.
    #[inline]
    pub fn in_flight_fence(&self) -> &Fence {
        &self.in_flight
    }
}

/// Drives the frames-in-flight protocol.
///
/// Owns [`MAX_FRAMES_IN_FLIGHT`] slots and the [`FlightTracker`]. The
/// methods map one-to-one onto the protocol steps; the renderer calls them
/// in order each frame.
///
/// # Thread Safety
///
/// Not thread-safe. A single thread drives recording and submission.
pub struct FrameManager {
    /// Reference to the logical device.
    device: Arc<Device>,
    /// Per-slot resources.
    slots: Vec<FrameSlot>,
    /// Slot and image-ownership bookkeeping.
    tracker: FlightTracker,
    /// Swapchain image index acquired for the frame being recorded.
    image_index: u32,
}

impl FrameManager {
    /// Creates a frame manager with [`MAX_FRAMES_IN_FLIGHT`] slots.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `pool` - Command pool to allocate the per-slot command buffers from
    /// * `image_count` - Current swapchain image count
    ///
    /// # Errors
    ///
    /// Returns an error if any per-slot resource creation fails.
    pub fn new(device: Arc<Device>, pool: &CommandPool, image_count: usize) -> RhiResult<Self> {
        let mut slots = Vec::with_capacity(MAX_FRAMES_IN_FLIGHT);

        for i in 0..MAX_FRAMES_IN_FLIGHT {
            slots.push(FrameSlot::new(device.clone(), pool)?);
            debug!("Created frame slot {}", i);
        }

        info!(
            "Frame manager created: {} slots, {} swapchain images",
            MAX_FRAMES_IN_FLIGHT, image_count
        );

        Ok(Self {
            device,
            slots,
            tracker: FlightTracker::new(MAX_FRAMES_IN_FLIGHT, image_count),
            image_index: 0,
        })
    }

    /// Returns the slot currently being recorded.
    #[inline]
    pub fn current_slot(&self) -> &FrameSlot {
        &self.slots[self.tracker.current()]
    }

    /// Returns the index of the slot currently being recorded.
    #[inline]
    pub fn current_index(&self) -> usize {
        self.tracker.current()
    }

    /// Returns the swapchain image index acquired for this frame.
    #[inline]
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Step 1: blocks until the current slot's previous submission retires.
    ///
    /// After this returns, the GPU no longer reads the slot's command
    /// buffer or per-slot uniform memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn wait_for_slot(&self) -> RhiResult<()> {
        self.current_slot().in_flight.wait(u64::MAX)
    }

    /// Step 2: resets the current slot's command buffer for re-recording.
    ///
    /// Only safe after [`wait_for_slot`](Self::wait_for_slot).
    ///
    /// # Errors
    ///
    /// Returns an error if the reset fails.
    pub fn reset_recording(&self) -> RhiResult<()> {
        self.current_slot().command_buffer.reset()
    }

    /// Step 3: acquires the next swapchain image.
    ///
    /// On success the image index is stored for the rest of the frame and
    /// the slot's image-available semaphore will be signaled when the image
    /// is ready. [`AcquiredImage::OutOfDate`] means the caller must rebuild
    /// the swapchain and skip this frame.
    ///
    /// # Errors
    ///
    /// Returns an error if acquisition fails for a reason other than an
    /// out-of-date swapchain.
    pub fn acquire(&mut self, swapchain: &Swapchain) -> RhiResult<AcquiredImage> {
        let acquired = swapchain.acquire_next_image(self.current_slot().image_available.handle())?;

        if let AcquiredImage::Ready { image_index, .. } = acquired {
            self.image_index = image_index;
        }

        Ok(acquired)
    }

    /// Step 4: ensures no other slot still targets the acquired image.
    ///
    /// When the image was last targeted by a different slot, waits on that
    /// slot's fence before proceeding, then records the current slot as the
    /// image's owner. This is what keeps 3 swapchain images safe with 2
    /// frame slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence wait fails.
    pub fn sync_image_ownership(&mut self) -> RhiResult<()> {
        if let Some(prior_slot) = self.tracker.claim_image(self.image_index as usize) {
            debug!(
                "Image {} still owned by slot {}, waiting",
                self.image_index, prior_slot
            );
            self.slots[prior_slot].in_flight.wait(u64::MAX)?;
        }
        Ok(())
    }

    /// Step 7: submits the recorded command buffer to the graphics queue.
    ///
    /// The fence is reset here, immediately before submission, so it can
    /// never be observed signaled while unarmed. The submission waits on
    /// the slot's image-available semaphore at the color-attachment-output
    /// stage, signals render-finished, and signals the in-flight fence on
    /// retirement.
    ///
    /// # Errors
    ///
    /// Returns an error if the fence reset or queue submission fails.
    pub fn submit(&self) -> RhiResult<()> {
        let slot = self.current_slot();

        slot.in_flight.reset()?;

        let wait_semaphores = [slot.image_available.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [slot.render_finished.handle()];
        let command_buffers = [slot.command_buffer.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe {
            self.device.handle().queue_submit(
                self.device.graphics_queue(),
                &[submit_info],
                slot.in_flight.handle(),
            )?;
        }

        Ok(())
    }

    /// Step 8: presents the acquired image, gated on render-finished.
    ///
    /// # Errors
    ///
    /// Returns an error if presentation fails for a reason other than a
    /// suboptimal or out-of-date swapchain, which are reported through
    /// [`SurfaceStatus`].
    pub fn present(&self, swapchain: &Swapchain) -> RhiResult<SurfaceStatus> {
        let slot = self.current_slot();

        swapchain.present(
            self.device.present_queue(),
            self.image_index,
            slot.render_finished.handle(),
        )
    }

    /// Step 9: advances to the next frame slot.
    #[inline]
    pub fn advance(&mut self) {
        self.tracker.advance();
    }

    /// Waits until every slot's outstanding work has retired.
    ///
    /// Used before destroying resources and before swapchain rebuild.
    ///
    /// # Errors
    ///
    /// Returns an error if any fence wait fails.
    pub fn wait_all(&self) -> RhiResult<()> {
        for slot in &self.slots {
            slot.in_flight.wait(u64::MAX)?;
        }
        Ok(())
    }

    /// Re-arms synchronization state after a swapchain rebuild.
    ///
    /// A successful acquire whose present never happened leaves a stale
    /// signal on an image-available semaphore, so all per-slot semaphores
    /// are replaced. Image ownership is cleared for the new image count.
    /// The caller must have waited for the device or all slots first.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn rebuild_sync(&mut self, image_count: usize) -> RhiResult<()> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            slot.image_available = Semaphore::new(self.device.clone())?;
            slot.render_finished = Semaphore::new(self.device.clone())?;
            debug!("Replaced semaphores for slot {}", i);
        }

        self.tracker.reset_images(image_count);

        info!("Frame sync rebuilt for {} swapchain images", image_count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_index_is_periodic() {
        let mut tracker = FlightTracker::new(MAX_FRAMES_IN_FLIGHT, 3);

        for frame in 0..10 {
            assert_eq!(tracker.current(), frame % MAX_FRAMES_IN_FLIGHT);
            assert!(tracker.current() < MAX_FRAMES_IN_FLIGHT);
            tracker.advance();
        }
    }

    #[test]
    fn test_claim_image_reports_prior_owner() {
        let mut tracker = FlightTracker::new(2, 3);

        // Slot 0 takes image 0: nobody owned it
        assert_eq!(tracker.claim_image(0), None);
        tracker.advance();

        // Slot 1 takes image 1: nobody owned it
        assert_eq!(tracker.claim_image(1), None);
        tracker.advance();

        // Slot 0 takes image 1: slot 1 still owns it
        assert_eq!(tracker.claim_image(1), Some(1));
        tracker.advance();
    }

    #[test]
    fn test_claim_image_ignores_self_ownership() {
        let mut tracker = FlightTracker::new(2, 2);

        assert_eq!(tracker.claim_image(0), None);
        // Same slot re-targets the same image without advancing: no wait needed
        assert_eq!(tracker.claim_image(0), None);
    }

    #[test]
    fn test_reset_images_clears_ownership() {
        let mut tracker = FlightTracker::new(2, 3);
        tracker.claim_image(0);
        tracker.claim_image(2);

        tracker.reset_images(4);

        for image in 0..4 {
            assert_eq!(tracker.claim_image(image), None);
        }
    }

    /// Runs the protocol against a fake GPU for 10 frames with 3 images
    /// and 2 slots, checking the CPU never runs more than `slot_count`
    /// submissions ahead of completed work.
    #[test]
    fn test_cpu_never_outruns_gpu_by_more_than_slot_count() {
        const SLOTS: usize = 2;
        const IMAGES: usize = 3;

        let mut tracker = FlightTracker::new(SLOTS, IMAGES);
        // pending[slot] models an unsignaled fence for submitted work
        let mut pending = [false; SLOTS];
        let mut submitted = 0usize;
        let mut completed = 0usize;

        for frame in 0..10 {
            let slot = tracker.current();

            // Step 1: waiting on the slot fence completes its prior work
            if pending[slot] {
                pending[slot] = false;
                completed += 1;
            }

            // Step 3: the presentation engine hands out images round-robin
            let image = frame % IMAGES;

            // Step 4: waiting on the prior owner's fence completes its work
            if let Some(prior) = tracker.claim_image(image) {
                if pending[prior] {
                    pending[prior] = false;
                    completed += 1;
                }
            }

            // Steps 5-7: the slot's buffer is free here (its fence was
            // observed signaled), so recording and submitting is safe
            assert!(!pending[slot]);
            pending[slot] = true;
            submitted += 1;

            // The fence bound: at most SLOTS submissions beyond completion
            assert!(
                submitted <= completed + SLOTS,
                "frame {}: {} submitted vs {} completed",
                frame,
                submitted,
                completed
            );

            tracker.advance();
        }

        assert_eq!(submitted, 10);
    }

    #[test]
    #[should_panic(expected = "at least one frame slot")]
    fn test_zero_slots_rejected() {
        FlightTracker::new(0, 1);
    }
}
