// Native driver binding on top of ash
//
// Thin pass-through: enumerations go straight to the raw function tables so
// the two-call contract stays visible to the caller, everything else uses
// ash's wrappers. Surfaces are created from raw-window-handle 0.6 handles for
// Win32, Xlib, Xcb and Wayland.

use super::driver::Driver;
use super::error::BringupError;
use ash::extensions::{ext::DebugUtils, khr};
use ash::prelude::VkResult;
use ash::{vk, Entry};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CStr;
use std::ptr;

/// Loaded Vulkan library
pub struct AshDriver {
    entry: Entry,
}

impl AshDriver {
    pub fn load() -> Result<Self, BringupError> {
        let entry = unsafe { Entry::load() }?;
        Ok(Self { entry })
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }
}

/// Instance with the extension loaders bring-up uses
pub struct AshInstance {
    pub instance: ash::Instance,
    pub surface_loader: khr::Surface,
    debug_utils: DebugUtils,
}

/// Count and data pointer for one native two-call step; a null pointer
/// asks for the count
fn call_buffer<T>(out: Option<&mut [T]>) -> (u32, *mut T) {
    match out {
        Some(buffer) => (buffer.len() as u32, buffer.as_mut_ptr()),
        None => (0, ptr::null_mut()),
    }
}

fn two_call<T>(
    out: Option<&mut [T]>,
    call: impl FnOnce(*mut u32, *mut T) -> vk::Result,
) -> VkResult<u32> {
    let (mut count, data) = call_buffer(out);
    call(&mut count, data).result_with_success(count)
}

impl Driver for AshDriver {
    type Instance = AshInstance;
    type Device = ash::Device;

    fn enumerate_instance_layer_properties(
        &self,
        out: Option<&mut [vk::LayerProperties]>,
    ) -> VkResult<u32> {
        let fp = self.entry.fp_v1_0();
        two_call(out, |count, data| unsafe {
            (fp.enumerate_instance_layer_properties)(count, data)
        })
    }

    fn create_instance(&self, create_info: &vk::InstanceCreateInfo) -> VkResult<AshInstance> {
        let instance = unsafe { self.entry.create_instance(create_info, None) }?;
        let surface_loader = khr::Surface::new(&self.entry, &instance);
        let debug_utils = DebugUtils::new(&self.entry, &instance);
        Ok(AshInstance {
            instance,
            surface_loader,
            debug_utils,
        })
    }

    fn instance_handle(&self, instance: &AshInstance) -> vk::Instance {
        instance.instance.handle()
    }

    fn destroy_instance(&self, instance: &AshInstance) {
        unsafe { instance.instance.destroy_instance(None) };
    }

    fn create_debug_messenger(
        &self,
        instance: &AshInstance,
    ) -> VkResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        unsafe {
            instance
                .debug_utils
                .create_debug_utils_messenger(&create_info, None)
        }
    }

    fn destroy_debug_messenger(
        &self,
        instance: &AshInstance,
        messenger: vk::DebugUtilsMessengerEXT,
    ) {
        unsafe {
            instance
                .debug_utils
                .destroy_debug_utils_messenger(messenger, None)
        };
    }

    fn create_surface(
        &self,
        instance: &AshInstance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR> {
        let entry = &self.entry;
        let inst = &instance.instance;

        unsafe {
            match (display, window) {
                (RawDisplayHandle::Windows(_), RawWindowHandle::Win32(handle)) => {
                    let hinstance = handle.hinstance.map(|h| h.get()).unwrap_or(0);
                    let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                        .hinstance(hinstance as vk::HINSTANCE)
                        .hwnd(handle.hwnd.get() as vk::HWND);
                    khr::Win32Surface::new(entry, inst).create_win32_surface(&create_info, None)
                }
                (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window)) => {
                    let dpy = display.display.map_or(ptr::null_mut(), |d| d.as_ptr());
                    let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                        .dpy(dpy.cast())
                        .window(window.window);
                    khr::XlibSurface::new(entry, inst).create_xlib_surface(&create_info, None)
                }
                (RawDisplayHandle::Xcb(display), RawWindowHandle::Xcb(window)) => {
                    let connection = display.connection.map_or(ptr::null_mut(), |c| c.as_ptr());
                    let create_info = vk::XcbSurfaceCreateInfoKHR::builder()
                        .connection(connection.cast())
                        .window(window.window.get());
                    khr::XcbSurface::new(entry, inst).create_xcb_surface(&create_info, None)
                }
                (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(window)) => {
                    let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                        .display(display.display.as_ptr().cast())
                        .surface(window.surface.as_ptr().cast());
                    khr::WaylandSurface::new(entry, inst)
                        .create_wayland_surface(&create_info, None)
                }
                _ => Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT),
            }
        }
    }

    fn destroy_surface(&self, instance: &AshInstance, surface: vk::SurfaceKHR) {
        unsafe { instance.surface_loader.destroy_surface(surface, None) };
    }

    fn enumerate_physical_devices(
        &self,
        instance: &AshInstance,
        out: Option<&mut [vk::PhysicalDevice]>,
    ) -> VkResult<u32> {
        let handle = instance.instance.handle();
        let fp = instance.instance.fp_v1_0();
        two_call(out, |count, data| unsafe {
            (fp.enumerate_physical_devices)(handle, count, data)
        })
    }

    fn get_physical_device_properties(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties {
        unsafe {
            instance
                .instance
                .get_physical_device_properties(physical_device)
        }
    }

    fn get_physical_device_features(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures {
        unsafe { instance.instance.get_physical_device_features(physical_device) }
    }

    fn get_physical_device_queue_family_properties(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        out: Option<&mut [vk::QueueFamilyProperties]>,
    ) -> u32 {
        // returns void natively, so there is no status to check
        let fp = instance.instance.fp_v1_0();
        let (mut count, data) = call_buffer(out);
        unsafe {
            (fp.get_physical_device_queue_family_properties)(physical_device, &mut count, data)
        };
        count
    }

    fn enumerate_device_extension_properties(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        out: Option<&mut [vk::ExtensionProperties]>,
    ) -> VkResult<u32> {
        let fp = instance.instance.fp_v1_0();
        two_call(out, |count, data| unsafe {
            (fp.enumerate_device_extension_properties)(physical_device, ptr::null(), count, data)
        })
    }

    fn get_physical_device_surface_support(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool> {
        unsafe {
            instance.surface_loader.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                surface,
            )
        }
    }

    fn get_physical_device_surface_capabilities(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            instance
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
        }
    }

    fn get_physical_device_surface_formats(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        out: Option<&mut [vk::SurfaceFormatKHR]>,
    ) -> VkResult<u32> {
        let fp = instance.surface_loader.fp();
        two_call(out, |count, data| unsafe {
            (fp.get_physical_device_surface_formats_khr)(physical_device, surface, count, data)
        })
    }

    fn get_physical_device_surface_present_modes(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        out: Option<&mut [vk::PresentModeKHR]>,
    ) -> VkResult<u32> {
        let fp = instance.surface_loader.fp();
        two_call(out, |count, data| unsafe {
            (fp.get_physical_device_surface_present_modes_khr)(physical_device, surface, count, data)
        })
    }

    fn create_device(
        &self,
        instance: &AshInstance,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> VkResult<ash::Device> {
        unsafe {
            instance
                .instance
                .create_device(physical_device, create_info, None)
        }
    }

    fn device_handle(&self, device: &ash::Device) -> vk::Device {
        device.handle()
    }

    fn get_device_queue(&self, device: &ash::Device, family_index: u32, queue_index: u32) -> vk::Queue {
        unsafe { device.get_device_queue(family_index, queue_index) }
    }

    fn device_wait_idle(&self, device: &ash::Device) -> VkResult<()> {
        unsafe { device.device_wait_idle() }
    }

    fn destroy_device(&self, device: &ash::Device) {
        unsafe { device.destroy_device(None) };
    }
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }
    let message = CStr::from_ptr((*p_callback_data).p_message).to_string_lossy();

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan {:?}] {}", message_type, message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan {:?}] {}", message_type, message);
        }
        _ => {
            log::debug!("[Vulkan {:?}] {}", message_type, message);
        }
    }

    vk::FALSE
}
