// =============================================================================
// VULKAN BRING-UP DEMO
// =============================================================================
//
// Opens a window, negotiates instance/surface/device/queues against it, logs
// what was selected and what a swapchain could use, then idles until the
// window is closed.
//
// FLOW:
// 1. Load config.toml, initialize logging
// 2. Window created (winit `resumed`)
// 3. VulkanContext::new runs the bring-up sequence
// 4. Close/Escape: context dropped (reverse teardown), then the window
//
// =============================================================================

use anyhow::{Context, Result};
use std::sync::Arc;
use vk_bringup::backend::{AshDriver, VulkanContext};
use vk_bringup::config::Config;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowAttributes},
};

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() -> Result<()> {
    // Load configuration from config.toml
    let config = Config::load();

    // Initialize logging
    init_logging(&config);
    log::info!("Starting Vulkan bring-up");
    log::info!("Window: {}x{}", config.window.width, config.window.height);

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Initialize logging; RUST_LOG still overrides the configured level
fn init_logging(config: &Config) {
    use env_logger::Builder;

    let mut builder = Builder::new();
    builder.filter_level(config.log_level());
    builder.parse_default_env();
    builder.init();
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// IMPORTANT: Field order matters for Drop! The context must go before the
/// window its surface is bound to.
struct App {
    config: Config,
    context: Option<VulkanContext<AshDriver>>,
    window: Option<Arc<Window>>,
    /// First bring-up failure, reported from main
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config) -> Self {
        Self {
            config,
            context: None,
            window: None,
            error: None,
        }
    }

    /// Run the bring-up sequence against the window
    fn init_vulkan(&mut self, window: &Window) -> Result<()> {
        // Validation only in debug builds, and only if the config wants it
        let enable_validation = cfg!(debug_assertions);
        let settings = self.config.bringup_settings(enable_validation)?;

        let driver = AshDriver::load().context("Is Vulkan installed?")?;
        let context = VulkanContext::new(driver, window, &settings)
            .context("Vulkan bring-up failed")?;

        self.log_swapchain_support(&context, window);
        self.context = Some(context);
        Ok(())
    }

    /// What a swapchain built on this context would pick
    fn log_swapchain_support(&self, context: &VulkanContext<AshDriver>, window: &Window) {
        let support = context.swapchain_support();
        let size = window.inner_size();

        log::info!(
            "Surface: {} format(s), {} present mode(s)",
            support.formats.len(),
            support.present_modes.len()
        );
        if let Some(format) = support.preferred_surface_format() {
            log::info!("Preferred format: {:?} / {:?}", format.format, format.color_space);
        }
        log::info!(
            "Present mode: {:?}",
            support.preferred_present_mode(self.config.get_present_mode())
        );
        log::info!(
            "Extent: {:?}, {} image(s)",
            support.preferred_extent(size.width, size.height),
            support.preferred_image_count()
        );
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ))
            .with_resizable(false);

        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                self.error = Some(anyhow::Error::new(e).context("Failed to create window"));
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_vulkan(&window) {
            log::error!("{:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
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
                log::info!("Close requested");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                use winit::keyboard::{KeyCode, PhysicalKey};
                if event.state.is_pressed()
                    && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
                {
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        // Surface before window
        self.context = None;
        self.window = None;
    }
}
