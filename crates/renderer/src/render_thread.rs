//! Render thread entry point.

use std::thread::{self, JoinHandle};

use modeler_core::{Error, RenderConfig, Result};
use modeler_platform::{Event, PlatformBridge, Receiver, WindowGeometry};
use tracing::{error, info};

use crate::gpu::GpuDevice;
use crate::layers::Scene;
use crate::render_loop::RenderLoop;
use crate::RenderResult;

/// Name of the render thread, as it shows up in logs.
pub const RENDER_THREAD_NAME: &str = "render";

/// Spawn the render thread.
///
/// `config`, `bridge` and the receiving end of the event channel move into
/// the thread; nothing is shared back except through `bridge`. `init` runs on
/// the new thread and creates the device and scene for the geometry the
/// bridge reports.
///
/// Startup failures are reported once through
/// [`PlatformBridge::notify_startup_failure`] and the loop never runs. Errors
/// from the running loop go to [`PlatformBridge::notify_fatal_error`].
pub fn spawn_render_thread<B, D, F>(
    config: RenderConfig,
    bridge: B,
    events: Receiver<Event>,
    init: F,
) -> Result<JoinHandle<()>>
where
    B: PlatformBridge + 'static,
    D: GpuDevice,
    F: FnOnce(&RenderConfig, &WindowGeometry) -> RenderResult<(D, Scene)> + Send + 'static,
{
    thread::Builder::new()
        .name(RENDER_THREAD_NAME.to_string())
        .spawn(move || {
            let geometry = bridge.current_window_geometry();
            let started = init(&config, &geometry)
                .and_then(|(device, scene)| RenderLoop::new(device, events, scene, config, geometry));

            let mut render_loop = match started {
                Ok(render_loop) => render_loop,
                Err(e) => {
                    error!("Render thread failed to start: {}", e);
                    bridge.notify_startup_failure(&e.to_string());
                    return;
                }
            };

            if let Err(e) = render_loop.run(&bridge) {
                bridge.notify_fatal_error(&e.to_string());
                return;
            }
            info!("Render thread exiting");
        })
        .map_err(|e| Error::Thread(format!("spawn failed: {}", e)))
}
