//! Modeler - desktop entry point
//!
//! The winit event loop runs on the main thread and owns the borderless
//! window. Rendering happens on a dedicated thread that receives input,
//! resize and termination events through the platform channel.

mod board;
mod bridge;
mod layers;

use std::thread::JoinHandle;

use anyhow::{Result, anyhow};
use tracing::{debug, error, info, warn};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop, EventLoopProxy};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use modeler_core::RenderConfig;
use modeler_platform::{
    Event, PointerAction, PointerTracker, Sender, Window, WindowGeometry, WindowRegion, channel,
};
use modeler_renderer::{VulkanDevice, spawn_render_thread};

use bridge::{UserEvent, WinitBridge};

struct App {
    proxy: EventLoopProxy<UserEvent>,
    window: Option<Window>,
    events: Option<Sender<Event>>,
    render_thread: Option<JoinHandle<()>>,
    pointer: PointerTracker,
    /// Set when the render thread reported an error.
    failure: Option<String>,
}

impl App {
    fn new(proxy: EventLoopProxy<UserEvent>) -> Self {
        Self {
            proxy,
            window: None,
            events: None,
            render_thread: None,
            pointer: PointerTracker::new(),
            failure: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let config = RenderConfig::from_env()?;
        let window = Window::new(event_loop, WindowGeometry::default(), "Modeler")?;
        let (sender, receiver) = channel();

        let bridge = WinitBridge::new(self.proxy.clone(), window.geometry());
        let native = window.inner_arc();
        let proxy = self.proxy.clone();
        let thread = spawn_render_thread(config, bridge, receiver, move |config, _geometry| {
            let device = VulkanDevice::new(native, config)?;
            let scene = layers::build_scene(move || {
                if proxy.send_event(UserEvent::ToggleFullscreen).is_err() {
                    warn!("Event loop closed, fullscreen toggle dropped");
                }
            });
            Ok((device, scene))
        })?;

        info!("Initialization complete, render thread running");
        self.window = Some(window);
        self.events = Some(sender);
        self.render_thread = Some(thread);
        Ok(())
    }

    fn send(&self, event: Event) {
        if let Some(events) = &self.events {
            events.push(event);
        }
    }

    fn handle_pointer(&self, action: PointerAction) {
        match action {
            PointerAction::Forward(event) => self.send(event),
            PointerAction::DragWindow => {
                if let Some(window) = &self.window {
                    window.begin_interaction(WindowRegion::Chrome);
                }
            }
            PointerAction::DragResize(region) => {
                if let Some(window) = &self.window {
                    window.begin_interaction(region);
                }
            }
            PointerAction::Ignore => {}
        }
    }

    fn toggle_fullscreen(&mut self) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let fullscreen = !window.geometry().fullscreen;
        window.set_fullscreen(fullscreen);
        info!("Fullscreen {}", if fullscreen { "on" } else { "off" });
        let geometry = window.geometry();
        self.send(Event::Resize(geometry));
    }

    /// Stop the render thread and leave the event loop. Safe to call twice.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(events) = self.events.take() {
            events.push(Event::Terminate);
        }
        if let Some(thread) = self.render_thread.take() {
            debug!("Waiting for render thread");
            if thread.join().is_err() {
                error!("Render thread panicked");
                self.failure.get_or_insert_with(|| "render thread panicked".to_string());
            }
        }
        event_loop.exit();
    }
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.start(event_loop) {
            error!("Failed to start: {:#}", e);
            self.failure = Some(format!("{:#}", e));
            self.shutdown(event_loop);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(window) = self.window.as_mut() {
                    let geometry = window.resize(size.width, size.height);
                    self.send(Event::Resize(geometry));
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let action = self.pointer.on_cursor_moved(position.x, position.y);
                self.handle_pointer(action);
            }
            WindowEvent::CursorLeft { .. } => {
                let action = self.pointer.on_cursor_left();
                self.handle_pointer(action);
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(geometry) = self.window.as_ref().map(Window::geometry) {
                    let action = self.pointer.on_button(&geometry, button.into(), state);
                    self.handle_pointer(action);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if !event.state.is_pressed() || event.repeat {
                    return;
                }
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::F11) => self.toggle_fullscreen(),
                    PhysicalKey::Code(KeyCode::Escape)
                        if self.window.as_ref().is_some_and(|w| w.geometry().fullscreen) =>
                    {
                        self.toggle_fullscreen()
                    }
                    _ => {}
                }
            }
            _ => {}
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::ResizeAcknowledged(geometry) => {
                debug!(
                    "Render thread is presenting at {}x{}",
                    geometry.surface.width, geometry.surface.height
                );
                if let Some(window) = &self.window
                    && window.geometry().surface != geometry.surface
                {
                    debug!("Window has moved on since; another resize is queued");
                }
            }
            UserEvent::ToggleFullscreen => self.toggle_fullscreen(),
            UserEvent::Fatal { message, startup } => {
                if startup {
                    error!("Renderer failed to start: {}", message);
                } else {
                    error!("Renderer stopped: {}", message);
                }
                self.failure = Some(message);
                self.shutdown(event_loop);
            }
        }
    }

    fn exiting(&mut self, event_loop: &ActiveEventLoop) {
        self.shutdown(event_loop);
    }
}

fn main() -> Result<()> {
    modeler_core::init_logging();
    info!("Starting Modeler");

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;
    // The render thread paces itself; the platform thread only reacts.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(event_loop.create_proxy());
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(message) => Err(anyhow!(message)),
        None => Ok(()),
    }
}
