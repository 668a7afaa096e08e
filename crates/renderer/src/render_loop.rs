//! The render thread's main loop.
//!
//! One iteration:
//!
//! 1. Drain the event channel (input, resize, terminate)
//! 2. Upload the board if a layer asked for it
//! 3. Rebuild the swapchain if a resize is pending
//! 4. Wait for the current frame slot to become reusable
//! 5. Acquire an image
//! 6. Record the board, overlay and decoration passes
//! 7. Submit and present
//! 8. Mark a rebuild for the next iteration on stale presentation
//! 9. Advance the frame counter
//!
//! While the surface is zero-sized the loop only drains events.

use std::thread;

use glam::Vec2;
use modeler_core::{FrameTimeEstimator, RenderConfig, Timer};
use modeler_platform::{Event, PlatformBridge, Receiver, WindowGeometry};
use tracing::{debug, error, info, trace, warn};

use crate::frame_sync::FrameSynchronizer;
use crate::gpu::{CommandTarget, GpuDevice, PresentationResult};
use crate::layers::{FrameContext, InputResponse, Layer, LayerId, LayerInput, Scene};
use crate::swapchain_manager::{Recreated, SwapchainManager};
use crate::{RenderError, RenderResult};

/// Whether the loop should keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IterationOutcome {
    Continue,
    Terminated,
}

/// Pointer state tracked across events.
#[derive(Debug, Default)]
struct PointerState {
    position: Vec2,
    hovered: Option<LayerId>,
}

/// Drives frame slots, the swapchain and the scene from the event channel.
pub struct RenderLoop<D: GpuDevice> {
    device: D,
    events: Receiver<Event>,
    scene: Scene,
    config: RenderConfig,
    geometry: WindowGeometry,
    frames: FrameSynchronizer<D>,
    swapchain: SwapchainManager<D>,
    frame_index: u64,
    resize_pending: bool,
    board_update_pending: bool,
    paused: bool,
    pointer: PointerState,
    frame_time: FrameTimeEstimator,
    frame_timer: Timer,
    torn_down: bool,
}

impl<D: GpuDevice> RenderLoop<D> {
    /// Create the frame slots and the first swapchain.
    ///
    /// A zero-sized initial geometry starts the loop paused.
    pub fn new(
        mut device: D,
        events: Receiver<Event>,
        scene: Scene,
        config: RenderConfig,
        geometry: WindowGeometry,
    ) -> RenderResult<Self> {
        config.validate()?;

        let mut frames = FrameSynchronizer::new(&mut device, config.slot_timeout)?;
        let mut swapchain = SwapchainManager::new();
        let paused = match swapchain.create(&mut device, &geometry) {
            Ok(created) => created == Recreated::NotPresentable,
            Err(e) => {
                frames.destroy(&mut device);
                return Err(e);
            }
        };

        info!(
            "Render loop ready: {}x{}, overlay {}",
            geometry.surface.width,
            geometry.surface.height,
            if config.overlay_enabled { "on" } else { "off" }
        );

        Ok(Self {
            device,
            events,
            scene,
            frame_time: FrameTimeEstimator::new(config.frame_time_smoothing),
            config,
            geometry,
            frames,
            swapchain,
            frame_index: 0,
            resize_pending: false,
            board_update_pending: true,
            paused,
            pointer: PointerState::default(),
            frame_timer: Timer::new(),
            torn_down: false,
        })
    }

    /// Run until a `Terminate` event or a fatal error.
    ///
    /// Returns only after the device is idle and every swapchain and slot
    /// object is released.
    pub fn run(&mut self, bridge: &dyn PlatformBridge) -> RenderResult<()> {
        let uptime = Timer::new();
        info!("Render loop started");
        loop {
            match self.run_iteration(bridge) {
                Ok(IterationOutcome::Continue) => {}
                Ok(IterationOutcome::Terminated) => break,
                Err(e) => {
                    error!("Render loop failed at frame {}: {}", self.frame_index, e);
                    return Err(e);
                }
            }
        }
        info!(
            "Render loop stopped after {} frames in {:.1?}",
            self.frame_index,
            uptime.elapsed()
        );
        Ok(())
    }

    /// One pass of the loop.
    pub fn run_iteration(&mut self, bridge: &dyn PlatformBridge) -> RenderResult<IterationOutcome> {
        if self.torn_down {
            return Ok(IterationOutcome::Terminated);
        }

        if self.drain_events() == IterationOutcome::Terminated {
            info!("Terminate received, draining GPU work");
            self.shutdown()?;
            return Ok(IterationOutcome::Terminated);
        }

        if self.board_update_pending {
            self.board_update_pending = false;
            self.scene.board.upload_board_state()?;
        }

        if self.resize_pending {
            self.resize_pending = false;
            self.apply_resize(bridge)?;
        }

        if self.paused {
            if self.events.is_empty() {
                thread::sleep(self.config.paused_poll_interval);
            }
            return Ok(IterationOutcome::Continue);
        }

        self.draw_frame()?;
        Ok(IterationOutcome::Continue)
    }

    /// Wait for the device, then release the swapchain and frame slots.
    /// Safe to call more than once.
    pub fn shutdown(&mut self) -> RenderResult<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        let idle = self.device.wait_idle();
        self.swapchain.destroy(&mut self.device);
        self.frames.destroy(&mut self.device);
        debug!("Render loop resources released");
        idle
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Whether drawing is suspended for a zero-sized surface.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn geometry(&self) -> &WindowGeometry {
        &self.geometry
    }

    pub fn swapchain(&self) -> &SwapchainManager<D> {
        &self.swapchain
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn frame_time(&self) -> &FrameTimeEstimator {
        &self.frame_time
    }

    // =========================================================================
    // Events
    // =========================================================================

    fn drain_events(&mut self) -> IterationOutcome {
        while let Some(event) = self.events.try_pop() {
            trace!("Event: {}", event.kind());
            match event {
                Event::Terminate => return IterationOutcome::Terminated,
                Event::Resize(geometry) => self.on_resize(geometry),
                Event::PointerMove(position) => self.on_pointer_move(position),
                Event::NormalizedPointerMove(normalized) => {
                    let position = self.geometry.active.denormalize(normalized);
                    self.on_pointer_move(position);
                }
                Event::PointerLeave => self.on_pointer_leave(),
                Event::ButtonDown => self.on_button(LayerInput::ButtonDown),
                Event::ButtonUp => self.on_button(LayerInput::ButtonUp),
            }
        }
        IterationOutcome::Continue
    }

    fn on_resize(&mut self, geometry: WindowGeometry) {
        if self.swapchain.needs_rebuild(&geometry) {
            self.resize_pending = true;
        }
        debug!(
            "Resize to {}x{} (pending: {})",
            geometry.surface.width, geometry.surface.height, self.resize_pending
        );
        self.geometry = geometry;
        // Layouts moved under a resting pointer; re-deliver it against the new one.
        if self.pointer.hovered.is_some() {
            self.on_pointer_move(self.pointer.position);
        }
    }

    fn on_pointer_move(&mut self, position: Vec2) {
        self.pointer.position = position;
        let hit = self
            .scene
            .hit_test(&self.geometry, position, self.config.overlay_enabled);

        if self.pointer.hovered != hit
            && let Some(previous) = self.pointer.hovered
        {
            let response = self.scene.dispatch(previous, LayerInput::PointerLeave, &self.geometry);
            self.apply_response(response);
        }
        self.pointer.hovered = hit;

        if let Some(id) = hit
            && let Some(viewport) = self.scene.viewport_of(id, &self.geometry)
        {
            let response = self
                .scene
                .dispatch(id, LayerInput::PointerMove(viewport.normalize(position)), &self.geometry);
            self.apply_response(response);
        }
    }

    fn on_pointer_leave(&mut self) {
        if let Some(previous) = self.pointer.hovered.take() {
            let response = self.scene.dispatch(previous, LayerInput::PointerLeave, &self.geometry);
            self.apply_response(response);
        }
    }

    fn on_button(&mut self, input: LayerInput) {
        let hit = self
            .scene
            .hit_test(&self.geometry, self.pointer.position, self.config.overlay_enabled);
        if let Some(id) = hit {
            let response = self.scene.dispatch(id, input, &self.geometry);
            self.apply_response(response);
        }
    }

    fn apply_response(&mut self, response: InputResponse) {
        if response == InputResponse::RequestBoardUpdate {
            self.board_update_pending = true;
        }
    }

    // =========================================================================
    // Swapchain
    // =========================================================================

    fn apply_resize(&mut self, bridge: &dyn PlatformBridge) -> RenderResult<()> {
        match self.swapchain.recreate(&mut self.device, &self.geometry)? {
            Recreated::Live(extent) => {
                if self.paused {
                    info!("Presentation resumed at {}x{}", extent.width, extent.height);
                    // The paused interval is not a frame.
                    self.frame_timer.reset();
                }
                self.paused = false;
                bridge.acknowledge_resize(&self.geometry);
            }
            Recreated::NotPresentable => {
                if !self.paused {
                    info!("Presentation paused");
                }
                self.paused = true;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Frame
    // =========================================================================

    fn draw_frame(&mut self) -> RenderResult<()> {
        let Some(state) = self.swapchain.state() else {
            return Err(RenderError::InvalidState("drawing without a live swapchain".into()));
        };

        let slot = self.frames.acquire_slot(self.frame_index);
        self.frames.wait_until_reusable(&mut self.device, slot)?;

        let resources = self.frames.signal_image_requested(slot)?;
        let (image_index, suboptimal) = match self.device.acquire_next_image(&state.swapchain, resources) {
            PresentationResult::Success(index) => (index, false),
            PresentationResult::SuboptimalButUsable(index) => (index, true),
            PresentationResult::OutOfDate => {
                debug!("Acquire: swapchain out of date");
                self.resize_pending = true;
                return Ok(());
            }
            PresentationResult::Fatal(message) => {
                return Err(RenderError::Presentation(format!("acquire: {message}")));
            }
        };
        if suboptimal {
            debug!("Acquire: swapchain suboptimal");
            self.resize_pending = true;
        }

        let frame_time = self.frame_time.add_sample(self.frame_timer.delta_secs());
        let frame = FrameContext {
            geometry: self.geometry,
            frame_time,
            fps: self.frame_time.fps(),
            frame_index: self.frame_index,
        };

        self.device
            .begin_frame(resources, &state.framebuffers, image_index, state.extent)?;

        record_layer(&mut self.device, self.scene.board.as_mut(), &frame)?;
        self.device.next_pass();
        if self.config.overlay_enabled
            && let Some(overlay) = self.scene.overlay.as_mut()
        {
            record_layer(&mut self.device, overlay.as_mut(), &frame)?;
        }
        self.device.next_pass();
        record_layer(&mut self.device, self.scene.decoration.as_mut(), &frame)?;

        self.device.end_frame()?;

        self.frames.signal_render_complete(&mut self.device, slot)?;

        let Some(resources) = self.frames.slot(slot) else {
            return Err(RenderError::InvalidState(format!(
                "frame slot {} vanished",
                slot.index()
            )));
        };
        match self.device.present(&state.swapchain, resources, image_index) {
            PresentationResult::Success(()) => {}
            PresentationResult::SuboptimalButUsable(()) | PresentationResult::OutOfDate => {
                debug!("Present: swapchain stale, rebuilding before next frame");
                self.resize_pending = true;
            }
            PresentationResult::Fatal(message) => {
                return Err(RenderError::Presentation(format!("present: {message}")));
            }
        }

        self.frame_index += 1;
        Ok(())
    }
}

impl<D: GpuDevice> Drop for RenderLoop<D> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to wait for device idle during render loop drop: {}", e);
        }
    }
}

/// Set the layer's viewport, then let it record.
fn record_layer<D, L>(device: &mut D, layer: &mut L, frame: &FrameContext) -> RenderResult<()>
where
    D: GpuDevice,
    L: Layer + ?Sized,
{
    device.set_viewport(layer.viewport(&frame.geometry));
    layer
        .record_draw(device as &mut dyn CommandTarget, frame)
        .map_err(|e| match e {
            RenderError::Layer { .. } => e,
            other => RenderError::Layer {
                layer: layer.name(),
                message: other.to_string(),
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeCall, FakeDevice};
    use modeler_platform::{Extent, Rect, channel};

    struct Plain(Rect);

    impl Layer for Plain {
        fn name(&self) -> &'static str {
            "plain"
        }

        fn viewport(&self, _geometry: &WindowGeometry) -> Rect {
            self.0
        }

        fn record_draw(&mut self, _target: &mut dyn CommandTarget, _frame: &FrameContext) -> RenderResult<()> {
            Ok(())
        }
    }

    impl crate::layers::BoardLayer for Plain {
        fn upload_board_state(&mut self) -> RenderResult<()> {
            Ok(())
        }
    }

    struct NoBridge;

    impl PlatformBridge for NoBridge {
        fn current_window_geometry(&self) -> WindowGeometry {
            WindowGeometry::default()
        }
        fn acknowledge_resize(&self, _geometry: &WindowGeometry) {}
        fn notify_fatal_error(&self, _message: &str) {}
    }

    fn scene() -> Scene {
        Scene::new(
            Box::new(Plain(Rect::new(0, 0, 10, 10))),
            Box::new(Plain(Rect::new(0, 0, 10, 10))),
        )
    }

    #[test]
    fn test_frames_alternate_slots() {
        let (_tx, rx) = channel();
        let mut render_loop = RenderLoop::new(
            FakeDevice::default(),
            rx,
            scene(),
            RenderConfig::default(),
            WindowGeometry::default(),
        )
        .unwrap();

        for _ in 0..3 {
            render_loop.run_iteration(&NoBridge).unwrap();
        }
        assert_eq!(render_loop.frame_index(), 3);

        let submits: Vec<_> = render_loop
            .device()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::Submit(slot) => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(submits, vec![0, 1, 0]);
    }

    #[test]
    fn test_zero_initial_geometry_starts_paused() {
        let (_tx, rx) = channel();
        let config = RenderConfig {
            paused_poll_interval: std::time::Duration::from_millis(1),
            ..RenderConfig::default()
        };
        let geometry = WindowGeometry::windowed(Extent::new(0, 0), 1.0);
        let mut render_loop = RenderLoop::new(FakeDevice::default(), rx, scene(), config, geometry).unwrap();

        assert!(render_loop.is_paused());
        render_loop.run_iteration(&NoBridge).unwrap();
        assert_eq!(render_loop.frame_index(), 0);
        assert_eq!(render_loop.device().count(|c| matches!(c, FakeCall::Acquire(_))), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let (_tx, rx) = channel();
        let config = RenderConfig {
            frame_time_smoothing: 0.0,
            ..RenderConfig::default()
        };
        let result = RenderLoop::new(FakeDevice::default(), rx, scene(), config, WindowGeometry::default());
        assert!(matches!(result, Err(RenderError::Core(_))));
    }
}
