// Driver binding - the native calls bring-up depends on
//
// One method per native entry point. Enumerations follow the native
// two-call contract: `None` asks for the element count, `Some(buffer)`
// fills up to `buffer.len()` elements and returns how many were written.
// Everything here is synchronous; the driver is trusted not to hang.

use ash::prelude::VkResult;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::os::raw::c_char;

pub trait Driver {
    /// Loaded instance (function tables + handle)
    type Instance;
    /// Loaded logical device (function tables + handle)
    type Device;

    fn enumerate_instance_layer_properties(
        &self,
        out: Option<&mut [vk::LayerProperties]>,
    ) -> VkResult<u32>;

    fn create_instance(&self, create_info: &vk::InstanceCreateInfo) -> VkResult<Self::Instance>;
    fn instance_handle(&self, instance: &Self::Instance) -> vk::Instance;
    fn destroy_instance(&self, instance: &Self::Instance);

    fn create_debug_messenger(
        &self,
        instance: &Self::Instance,
    ) -> VkResult<vk::DebugUtilsMessengerEXT>;
    fn destroy_debug_messenger(
        &self,
        instance: &Self::Instance,
        messenger: vk::DebugUtilsMessengerEXT,
    );

    fn create_surface(
        &self,
        instance: &Self::Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> VkResult<vk::SurfaceKHR>;
    fn destroy_surface(&self, instance: &Self::Instance, surface: vk::SurfaceKHR);

    fn enumerate_physical_devices(
        &self,
        instance: &Self::Instance,
        out: Option<&mut [vk::PhysicalDevice]>,
    ) -> VkResult<u32>;

    fn get_physical_device_properties(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceProperties;

    fn get_physical_device_features(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> vk::PhysicalDeviceFeatures;

    /// Infallible natively, so only the count comes back
    fn get_physical_device_queue_family_properties(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        out: Option<&mut [vk::QueueFamilyProperties]>,
    ) -> u32;

    fn enumerate_device_extension_properties(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        out: Option<&mut [vk::ExtensionProperties]>,
    ) -> VkResult<u32>;

    fn get_physical_device_surface_support(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
        surface: vk::SurfaceKHR,
    ) -> VkResult<bool>;

    fn get_physical_device_surface_capabilities(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> VkResult<vk::SurfaceCapabilitiesKHR>;

    fn get_physical_device_surface_formats(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        out: Option<&mut [vk::SurfaceFormatKHR]>,
    ) -> VkResult<u32>;

    fn get_physical_device_surface_present_modes(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        out: Option<&mut [vk::PresentModeKHR]>,
    ) -> VkResult<u32>;

    fn create_device(
        &self,
        instance: &Self::Instance,
        physical_device: vk::PhysicalDevice,
        create_info: &vk::DeviceCreateInfo,
    ) -> VkResult<Self::Device>;
    fn device_handle(&self, device: &Self::Device) -> vk::Device;
    fn get_device_queue(&self, device: &Self::Device, family_index: u32, queue_index: u32)
        -> vk::Queue;
    fn device_wait_idle(&self, device: &Self::Device) -> VkResult<()>;
    fn destroy_device(&self, device: &Self::Device);
}

/// Run a two-call enumeration: count, allocate once, fill.
///
/// A count of zero is an empty Vec, not an error. If the driver writes fewer
/// elements on the second call the tail is dropped; a count that grows
/// between the calls is not defended against.
pub fn enumerate<T, F>(mut call: F) -> VkResult<Vec<T>>
where
    T: Default + Clone,
    F: FnMut(Option<&mut [T]>) -> VkResult<u32>,
{
    let count = call(None)? as usize;
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut items = vec![T::default(); count];
    let written = call(Some(&mut items))? as usize;
    items.truncate(written);
    Ok(items)
}

/// Read a name out of a fixed-size driver buffer, stopping at the first NUL
/// (or the end of the buffer if the driver forgot to terminate it).
pub fn raw_name(raw: &[c_char]) -> String {
    let bytes: Vec<u8> = raw
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}
