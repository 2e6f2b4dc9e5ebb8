// Instance + surface creation
//
// First two steps of bring-up. Name arrays handed to the driver only live
// for the duration of the creating call.

use super::driver::Driver;
use super::error::{BringupError, Stage};
use super::validation::missing_validation_layers;
use super::window::WindowSurface;
use ash::extensions::ext::DebugUtils;
use ash::vk;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;

/// `(major << 22) | (minor << 12) | patch`
pub const fn make_version(major: u32, minor: u32, patch: u32) -> u32 {
    vk::make_api_version(0, major, minor, patch)
}

/// Everything instance creation needs from the application
#[derive(Debug, Clone)]
pub struct InstanceSettings {
    pub app_name: CString,
    pub engine_name: CString,
    pub app_version: u32,
    pub engine_version: u32,
    pub api_version: u32,
    /// `None` skips the layer gate entirely
    pub validation_layers: Option<Vec<CString>>,
}

impl Default for InstanceSettings {
    fn default() -> Self {
        Self {
            app_name: CString::from(c"App"),
            engine_name: CString::from(c"No Engine"),
            app_version: make_version(1, 0, 0),
            engine_version: make_version(1, 0, 0),
            api_version: vk::API_VERSION_1_3,
            validation_layers: None,
        }
    }
}

impl InstanceSettings {
    /// Layers to enable; empty when none were requested
    pub fn layers(&self) -> &[CString] {
        self.validation_layers.as_deref().unwrap_or(&[])
    }

    /// The debug messenger rides along with validation
    pub fn wants_debug_messenger(&self) -> bool {
        !self.layers().is_empty()
    }
}

pub(crate) fn name_pointers<'a>(names: impl IntoIterator<Item = &'a CStr>) -> Vec<*const c_char> {
    names.into_iter().map(CStr::as_ptr).collect()
}

/// Create the instance. Requested validation layers are checked first; if
/// any is missing nothing is allocated in the driver.
pub fn create_instance<D: Driver, W: WindowSurface>(
    driver: &D,
    settings: &InstanceSettings,
    window: &W,
) -> Result<D::Instance, BringupError> {
    if let Some(requested) = &settings.validation_layers {
        let missing = missing_validation_layers(driver, requested)?;
        if !missing.is_empty() {
            return Err(BringupError::ValidationLayersUnavailable { missing });
        }
    }

    let mut extensions = window.required_extensions()?;
    if settings.wants_debug_messenger() {
        extensions.push(DebugUtils::name());
    }
    log::info!("Instance extensions: {:?}", extensions);

    let app_info = vk::ApplicationInfo::builder()
        .application_name(&settings.app_name)
        .application_version(settings.app_version)
        .engine_name(&settings.engine_name)
        .engine_version(settings.engine_version)
        .api_version(settings.api_version);

    let extension_names = name_pointers(extensions.iter().copied());
    let layer_names = name_pointers(settings.layers().iter().map(CString::as_c_str));

    let create_info = vk::InstanceCreateInfo::builder()
        .application_info(&app_info)
        .enabled_extension_names(&extension_names)
        .enabled_layer_names(&layer_names);

    let instance = driver
        .create_instance(&create_info)
        .map_err(BringupError::driver(Stage::CreateInstance))?;
    if driver.instance_handle(&instance) == vk::Instance::null() {
        return Err(BringupError::NullHandle(Stage::CreateInstance));
    }

    log::info!(
        "Created Vulkan instance for {:?} ({} validation layers)",
        settings.app_name,
        layer_names.len()
    );
    Ok(instance)
}

/// Route driver diagnostics into the log
pub fn create_debug_messenger<D: Driver>(
    driver: &D,
    instance: &D::Instance,
) -> Result<vk::DebugUtilsMessengerEXT, BringupError> {
    let messenger = driver
        .create_debug_messenger(instance)
        .map_err(BringupError::driver(Stage::CreateDebugMessenger))?;
    if messenger == vk::DebugUtilsMessengerEXT::null() {
        return Err(BringupError::NullHandle(Stage::CreateDebugMessenger));
    }
    Ok(messenger)
}

/// Bind a surface to the window. A null surface reported as success is the
/// same failure as a non-success status.
pub fn create_surface<D: Driver, W: WindowSurface>(
    driver: &D,
    instance: &D::Instance,
    window: &W,
) -> Result<vk::SurfaceKHR, BringupError> {
    let (display, window) = window.raw_handles()?;
    let surface = driver
        .create_surface(instance, display, window)
        .map_err(BringupError::driver(Stage::CreateSurface))?;
    if surface == vk::SurfaceKHR::null() {
        return Err(BringupError::NullHandle(Stage::CreateSurface));
    }
    Ok(surface)
}
