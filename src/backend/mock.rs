// Scripted driver for unit tests
//
// GPUs, layers and failures are described up front; every create/destroy
// and the interesting parts of each create-info are recorded in a shared
// log so tests can inspect them after the context has taken ownership.

use super::driver::Driver;
use ash::prelude::VkResult;
use ash::vk::{self, Handle};
use parking_lot::Mutex;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::Arc;

const INSTANCE: u64 = 0x1000;
const MESSENGER: u64 = 0x2000;
const SURFACE: u64 = 0x3000;
const DEVICE: u64 = 0x4000;

pub(crate) fn fixed_name<const N: usize>(name: &str) -> [c_char; N] {
    let mut buffer = [0 as c_char; N];
    for (dst, src) in buffer.iter_mut().zip(name.bytes()) {
        *dst = src as c_char;
    }
    buffer
}

pub(crate) fn layer(name: &str) -> vk::LayerProperties {
    vk::LayerProperties {
        layer_name: fixed_name(name),
        ..Default::default()
    }
}

pub(crate) fn queue_family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties {
        queue_flags: flags,
        queue_count: 1,
        ..Default::default()
    }
}

pub(crate) fn srgb_format() -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

/// One scripted physical device
#[derive(Clone)]
pub(crate) struct MockGpu {
    pub name: String,
    pub features: vk::PhysicalDeviceFeatures,
    pub queue_families: Vec<vk::QueueFamilyProperties>,
    pub present_support: Vec<bool>,
    pub present_support_error: bool,
    pub extensions: Vec<String>,
    pub extension_error: bool,
    pub capabilities_error: bool,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub format_error: bool,
    pub present_modes: Vec<vk::PresentModeKHR>,
    pub present_mode_error: bool,
}

impl MockGpu {
    /// A device that passes every check with default requirements
    pub fn suitable(name: &str) -> Self {
        Self {
            name: name.to_string(),
            features: vk::PhysicalDeviceFeatures {
                geometry_shader: vk::TRUE,
                ..Default::default()
            },
            queue_families: vec![queue_family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)],
            present_support: vec![true],
            present_support_error: false,
            extensions: vec!["VK_KHR_swapchain".to_string()],
            extension_error: false,
            capabilities_error: false,
            formats: vec![srgb_format()],
            format_error: false,
            present_modes: vec![vk::PresentModeKHR::FIFO],
            present_mode_error: false,
        }
    }

    pub fn without_geometry_shader(mut self) -> Self {
        self.features.geometry_shader = vk::FALSE;
        self
    }

    pub fn with_queue_families(mut self, families: &[(vk::QueueFlags, bool)]) -> Self {
        self.queue_families = families.iter().map(|&(flags, _)| queue_family(flags)).collect();
        self.present_support = families.iter().map(|&(_, present)| present).collect();
        self
    }

    pub fn with_extensions(mut self, extensions: &[&str]) -> Self {
        self.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn with_present_modes(mut self, modes: &[vk::PresentModeKHR]) -> Self {
        self.present_modes = modes.to_vec();
        self
    }

    pub fn with_formats(mut self, formats: &[vk::SurfaceFormatKHR]) -> Self {
        self.formats = formats.to_vec();
        self
    }
}

/// Failures the driver should report
#[derive(Default, Clone)]
pub(crate) struct Failures {
    pub layer_enumeration: bool,
    pub instance: bool,
    pub null_instance: bool,
    pub surface: bool,
    pub null_surface: bool,
    pub device_enumeration: bool,
    pub device: bool,
    pub null_device: bool,
    pub null_graphics_queue: bool,
    pub null_present_queue: bool,
}

/// Everything the driver was asked to do
#[derive(Default, Debug)]
pub(crate) struct CallLog {
    pub layer_queries: usize,
    pub instances_created: usize,
    pub instance_extensions: Vec<String>,
    pub instance_layers: Vec<String>,
    pub application_name: String,
    pub engine_name: String,
    pub application_version: u32,
    pub messengers_created: usize,
    pub surfaces_created: usize,
    pub devices_created: usize,
    pub queue_create_families: Vec<u32>,
    pub queue_priorities: Vec<f32>,
    pub device_extensions: Vec<String>,
    pub device_layers: Vec<String>,
    pub enabled_geometry_shader: bool,
    pub queue_requests: Vec<(u32, u32)>,
    /// Destruction order, by object kind
    pub destroyed: Vec<&'static str>,
}

pub(crate) struct MockDriver {
    pub layers: Vec<vk::LayerProperties>,
    pub gpus: Vec<MockGpu>,
    pub fail: Failures,
    log: Arc<Mutex<CallLog>>,
}

impl MockDriver {
    pub fn new(gpus: Vec<MockGpu>) -> Self {
        Self {
            layers: vec![layer("VK_LAYER_KHRONOS_validation")],
            gpus,
            fail: Failures::default(),
            log: Arc::new(Mutex::new(CallLog::default())),
        }
    }

    pub fn with_failures(mut self, fail: Failures) -> Self {
        self.fail = fail;
        self
    }

    pub fn log(&self) -> Arc<Mutex<CallLog>> {
        Arc::clone(&self.log)
    }

    pub fn physical_device(index: usize) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(index as u64 + 1)
    }

    fn gpu(&self, physical_device: vk::PhysicalDevice) -> &MockGpu {
        &self.gpus[physical_device.as_raw() as usize - 1]
    }
}

fn fill<T: Copy>(source: &[T], out: Option<&mut [T]>) -> VkResult<u32> {
    match out {
        None => Ok(source.len() as u32),
        Some(buffer) => {
            let written = buffer.len().min(source.len());
            buffer[..written].copy_from_slice(&source[..written]);
            Ok(written as u32)
        }
    }
}

unsafe fn names(pointers: *const *const c_char, count: u32) -> Vec<String> {
    if count == 0 || pointers.is_null() {
        return Vec::new();
    }
    std::slice::from_raw_parts(pointers, count as usize)
        .iter()
        .map(|&name| CStr::from_ptr(name).to_string_lossy().into_owned())
        .collect()
}

impl Driver for MockDriver {
    type Instance = vk::Instance;
    type Device = vk::Device;

    fn enumerate_instance_layer_properties(
        &self,
        out: Option<&mut [vk::LayerProperties]>,
    ) -> VkResult<u32> {
        self.log.lock().layer_queries += 1;
        if self.fail.layer_enumeration {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        fill(&self.layers, out)
    }

    fn create_instance(&self, create_info: &vk::InstanceCreateInfo) -> VkResult<vk::Instance> {
        if self.fail.instance {
            return Err(vk::Result::ERROR_INCOMPATIBLE_DRIVER);
        }
        let mut log = self.log.lock();
        log.instances_created += 1;
        unsafe {
            log.instance_extensions = names(
                create_info.pp_enabled_extension_names,
                create_info.enabled_extension_count,
            );
            log.instance_layers =
                names(create_info.pp_enabled_layer_names, create_info.enabled_layer_count);
            let app_info = &*create_info.p_application_info;
            log.application_name = CStr::from_ptr(app_info.p_application_name)
                .to_string_lossy()
                .into_owned();
            log.engine_name = CStr::from_ptr(app_info.p_engine_name)
                .to_string_lossy()
                .into_owned();
            log.application_version = app_info.application_version;
        }
        if self.fail.null_instance {
            return Ok(vk::Instance::null());
        }
        Ok(vk::Instance::from_raw(INSTANCE))
    }

    fn instance_handle(&self, instance: &vk::Instance) -> vk::Instance {
        *instance
    }

    fn destroy_instance(&self, _instance: &vk::Instance) {
        self.log.lock().destroyed.push("instance");
    }

    fn create_debug_messenger(
        &self,
        _instance: &vk::Instance,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        self.log.lock().messengers_created += 1;
        Ok(vk::DebugUtilsMessengerEXT::from_raw(MESSENGER))
    }

    fn destroy_debug_messenger(
        &self,
        _instance: &vk::Instance,
        _messenger: vk::DebugUtilsMessengerEXT,
    ) {
        self.log.lock().destroyed.push("debug messenger");
    }

    fn create_surface(
        &self,
        _instance: &vk::Instance,
        _display: RawDisplayHandle,
        _window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        if self.fail.surface {
            return Err(vk::Result::ERROR_NATIVE_WINDOW_IN_USE_KHR);
        }
        self.log.lock().surfaces_created += 1;
        if self.fail.null_surface {
            return Ok(vk::SurfaceKHR::null());
        }
        Ok(vk::SurfaceKHR::from_raw(SURFACE))
    }

    fn destroy_surface(&self, _instance: &vk::Instance, _surface: vk::SurfaceKHR) {
        self.log.lock().destroyed.push("surface");
    }

    fn enumerate_physical_devices(
        &self,
        _instance: &vk::Instance,
        out: Option<&mut [vk::PhysicalDevice]>,
    ) -> VkResult<u32> {
        if self.fail.device_enumeration {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        let handles: Vec<_> = (0..self.gpus.len()).map(Self::physical_device).collect();
        fill(&handles, out)
    }

    fn get_physical_device_properties(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        vk::PhysicalDeviceProperties {
            device_name: fixed_name(&self.gpu(physical_device).name),
            device_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            api_version: vk::API_VERSION_1_3,
            ..Default::default()
        }
    }

    fn get_physical_device_features(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        self.gpu(physical_device).features
    }

    fn get_physical_device_queue_family_properties(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
        out: Option<&mut [vk::QueueFamilyProperties]>,
    ) -> u32 {
        fill(&self.gpu(physical_device).queue_families, out).unwrap_or(0)
    }

    fn enumerate_device_extension_properties(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
        out: Option<&mut [vk::ExtensionProperties]>,
    ) -> VkResult<u32> {
        let gpu = self.gpu(physical_device);
        if gpu.extension_error {
            return Err(vk::Result::ERROR_INITIALIZATION_FAILED);
        }
        let extensions: Vec<_> = gpu
            .extensions
            .iter()
            .map(|name| vk::ExtensionProperties {
                extension_name: fixed_name(name),
                spec_version: 1,
            })
            .collect();
        fill(&extensions, out)
    }

    fn get_physical_device_surface_support(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        let gpu = self.gpu(physical_device);
        if gpu.present_support_error {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        Ok(gpu.present_support[queue_family_index as usize])
    }

    fn get_physical_device_surface_capabilities(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        if self.gpu(physical_device).capabilities_error {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        Ok(vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 3,
            current_extent: vk::Extent2D {
                width: 800,
                height: 600,
            },
            ..Default::default()
        })
    }

    fn get_physical_device_surface_formats(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
        out: Option<&mut [vk::SurfaceFormatKHR]>,
    ) -> VkResult<u32> {
        let gpu = self.gpu(physical_device);
        if gpu.format_error {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        fill(&gpu.formats, out)
    }

    fn get_physical_device_surface_present_modes(
        &self,
        _instance: &vk::Instance,
        physical_device: vk::PhysicalDevice,
        _surface: vk::SurfaceKHR,
        out: Option<&mut [vk::PresentModeKHR]>,
    ) -> VkResult<u32> {
        let gpu = self.gpu(physical_device);
        if gpu.present_mode_error {
            return Err(vk::Result::ERROR_SURFACE_LOST_KHR);
        }
        fill(&gpu.present_modes, out)
    }

    fn create_device(
        &self,
        _instance: &vk::Instance,
        _physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> VkResult<vk::Device> {
        if self.fail.device {
            return Err(vk::Result::ERROR_FEATURE_NOT_PRESENT);
        }
        let mut log = self.log.lock();
        log.devices_created += 1;
        unsafe {
            let queue_infos = std::slice::from_raw_parts(
                create_info.p_queue_create_infos,
                create_info.queue_create_info_count as usize,
            );
            log.queue_create_families = queue_infos.iter().map(|q| q.queue_family_index).collect();
            log.queue_priorities = queue_infos
                .iter()
                .flat_map(|q| {
                    std::slice::from_raw_parts(q.p_queue_priorities, q.queue_count as usize)
                        .iter()
                        .copied()
                })
                .collect();
            log.device_extensions = names(
                create_info.pp_enabled_extension_names,
                create_info.enabled_extension_count,
            );
            log.device_layers =
                names(create_info.pp_enabled_layer_names, create_info.enabled_layer_count);
            log.enabled_geometry_shader = !create_info.p_enabled_features.is_null()
                && (*create_info.p_enabled_features).geometry_shader == vk::TRUE;
        }
        if self.fail.null_device {
            return Ok(vk::Device::null());
        }
        Ok(vk::Device::from_raw(DEVICE))
    }

    fn device_handle(&self, device: &vk::Device) -> vk::Device {
        *device
    }

    fn get_device_queue(&self, _device: &vk::Device, family_index: u32, queue_index: u32) -> vk::Queue {
        let mut log = self.log.lock();
        log.queue_requests.push((family_index, queue_index));
        let is_graphics_request = log.queue_requests.len() == 1;
        if (is_graphics_request && self.fail.null_graphics_queue)
            || (!is_graphics_request && self.fail.null_present_queue)
        {
            return vk::Queue::null();
        }
        vk::Queue::from_raw(0x5000 + family_index as u64)
    }

    fn device_wait_idle(&self, _device: &vk::Device) -> VkResult<()> {
        Ok(())
    }

    fn destroy_device(&self, _device: &vk::Device) {
        self.log.lock().destroyed.push("device");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::driver::raw_name;

    #[test]
    fn test_fixed_name_reads_back() {
        let properties = layer("VK_LAYER_LUNARG_monitor");
        assert_eq!(raw_name(&properties.layer_name), "VK_LAYER_LUNARG_monitor");
    }
}
