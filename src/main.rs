// Vulkan device and presentation bootstrap
//
// Startup pipeline: window -> instance -> surface -> device selection ->
// queue resolution -> logical device -> swapchain. Every step is a
// blocking call in dependency order; any failure is fatal and aborts
// before the window is shown. After bootstrap the event loop only polls
// for the quit signal; rendering is out of scope here.

mod backend;
mod config;

use anyhow::Result;
use ash::vk;
use backend::{Swapchain, VulkanDevice, VulkanInstance, WindowSurface};
use config::{Config, VulkanRequirements};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

fn main() -> Result<()> {
    let config = Config::load();
    init_logging();

    log::info!("Starting Vulkan bootstrap");
    log::info!(
        "Window: {}x{} \"{}\"",
        config.window.width,
        config.window.height,
        config.window.title
    );

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    // A bootstrap failure exits the loop with the error stashed here so the
    // process reports it instead of silently exiting.
    if let Some(err) = app.fatal.take() {
        return Err(err);
    }
    Ok(())
}

fn init_logging() {
    use env_logger::Builder;
    use log::LevelFilter;

    let mut builder = Builder::from_default_env();
    builder.filter_level(LevelFilter::Info);
    builder.init();
}

/// The bootstrapped Vulkan objects. Field order is drop order: swapchain
/// image views and swapchain first, then the device, the surface, and the
/// instance last - the exact reverse of creation.
struct VulkanState {
    swapchain: Swapchain,
    device: Arc<VulkanDevice>,
    _surface: Arc<WindowSurface>,
    _instance: Arc<VulkanInstance>,
}

struct App {
    config: Config,
    window: Option<Arc<Window>>,
    vulkan: Option<VulkanState>,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            window: None,
            vulkan: None,
            fatal: None,
        }
    }

    /// Run the one-time device and presentation negotiation for `window`.
    fn init_vulkan(&mut self, window: &Window) -> Result<()> {
        let enable_validation = cfg!(debug_assertions) && self.config.debug.validation_layers;

        let display_handle = window.raw_display_handle();
        let window_handle = window.raw_window_handle();

        // Assemble the full requirement set before any Vulkan call; the
        // window system's surface extensions are merged here and the
        // result stays immutable for the rest of bootstrap.
        let window_extensions = backend::instance::required_window_extensions(display_handle)?;
        let requirements =
            VulkanRequirements::new(enable_validation).with_window_extensions(&window_extensions);

        let instance =
            VulkanInstance::new(&self.config.window.title, &requirements, enable_validation)?;
        let surface = WindowSurface::new(instance.clone(), display_handle, window_handle)?;
        let device = VulkanDevice::new(instance.clone(), &surface, &requirements)?;

        let requested_extent = vk::Extent2D {
            width: self.config.window.width,
            height: self.config.window.height,
        };
        let swapchain = Swapchain::new(device.clone(), surface.clone(), requested_extent)?;

        self.vulkan = Some(VulkanState {
            swapchain,
            device,
            _surface: surface,
            _instance: instance,
        });

        log::info!("Vulkan bootstrap complete");
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        // The window stays hidden until bootstrap has succeeded; fatal
        // errors abort before anything is shown.
        let window_attributes = WindowAttributes::default()
            .with_title(&self.config.window.title)
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_visible(false);

        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                self.fatal = Some(e.into());
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_vulkan(&window) {
            log::error!("Vulkan bootstrap failed: {e}");
            self.fatal = Some(e);
            event_loop.exit();
            return;
        }

        window.set_visible(true);
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                // Swapchain recreation is a later concern; the negotiation
                // itself takes fresh inputs each call.
                log::debug!("Window resized to {}x{}", size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};

                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    log::info!("Escape pressed, exiting");
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(state) = self.vulkan.take() {
            // Let in-flight driver work settle before reverse-order release.
            if let Err(e) = state.device.wait_idle() {
                log::warn!("wait_idle failed during shutdown: {e}");
            }
            log::info!(
                "Releasing swapchain ({} image views), device, surface, instance",
                state.swapchain.image_views.len()
            );
            drop(state);
        }
    }
}
