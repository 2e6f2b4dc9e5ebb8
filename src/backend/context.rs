// Vulkan context - the whole bring-up sequence
//
// instance -> (debug messenger) -> surface -> physical device -> logical
// device + queues, strictly in that order. The first failure is returned as
// is; objects created before it are left to the caller, the library does not
// clean up behind a failed sequence. A finished context tears everything
// down in reverse on drop.

use super::device::{
    create_logical_device, pick_physical_device, LogicalDevice, PhysicalDeviceSelection, Queue,
};
use super::driver::Driver;
use super::error::BringupError;
use super::instance::{
    create_debug_messenger, create_instance, create_surface, InstanceSettings,
};
use super::query::{QueueFamilies, QueueFamilyIndices, SwapchainSupportDetails};
use super::suitability::DeviceRequirements;
use super::window::WindowSurface;
use ash::prelude::VkResult;
use ash::vk;

/// Application side of the negotiation
#[derive(Debug, Clone, Default)]
pub struct BringupSettings {
    pub instance: InstanceSettings,
    pub device: DeviceRequirements,
}

/// Everything a render loop needs, owned in creation order.
///
/// IMPORTANT: teardown happens in Drop, device first and instance last.
pub struct VulkanContext<D: Driver> {
    device: LogicalDevice<D::Device>,
    physical_device: PhysicalDeviceSelection,
    surface: vk::SurfaceKHR,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    instance: D::Instance,
    driver: D,
}

impl<D: Driver> VulkanContext<D> {
    /// Run the full bring-up against `window`.
    ///
    /// On failure the driver and every handle created so far are dropped
    /// without being destroyed. Callers that need to reclaim them run the
    /// stage functions (`create_instance`, `create_surface`,
    /// `pick_physical_device`, `create_logical_device`) on a driver they keep,
    /// and destroy what they got back in reverse order.
    pub fn new<W: WindowSurface>(
        driver: D,
        window: &W,
        settings: &BringupSettings,
    ) -> Result<Self, BringupError> {
        log::info!("Initializing Vulkan...");

        // Step 1: Instance (validation gate runs inside)
        let instance = create_instance(&driver, &settings.instance, window)?;

        // Step 2: Debug messenger if validation is on
        let debug_messenger = if settings.instance.wants_debug_messenger() {
            Some(create_debug_messenger(&driver, &instance)?)
        } else {
            None
        };

        // Step 3: Surface
        let surface = create_surface(&driver, &instance, window)?;

        // Step 4: Physical device
        let physical_device = pick_physical_device(&driver, &instance, surface, &settings.device)?;

        // Step 5: Logical device + queues
        let device = create_logical_device(
            &driver,
            &instance,
            physical_device.physical_device,
            physical_device.queue_families,
            settings.instance.validation_layers.as_deref(),
            &settings.device,
        )?;

        log::info!("Vulkan initialized successfully!");
        Ok(Self {
            device,
            physical_device,
            surface,
            debug_messenger,
            instance,
            driver,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn instance(&self) -> &D::Instance {
        &self.instance
    }

    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device.physical_device
    }

    /// Name, type and everything learned while selecting the GPU
    pub fn selection(&self) -> &PhysicalDeviceSelection {
        &self.physical_device
    }

    pub fn queue_family_indices(&self) -> QueueFamilyIndices {
        self.physical_device.indices
    }

    pub fn queue_families(&self) -> QueueFamilies {
        self.device.queue_families
    }

    pub fn device(&self) -> &D::Device {
        &self.device.device
    }

    pub fn graphics_queue(&self) -> Queue {
        self.device.graphics_queue
    }

    pub fn present_queue(&self) -> Queue {
        self.device.present_queue
    }

    /// Surface support of the selected device, as seen during selection
    pub fn swapchain_support(&self) -> &SwapchainSupportDetails {
        &self.physical_device.swapchain_support
    }

    /// Wait for the device to be idle (e.g., before cleanup)
    pub fn wait_idle(&self) -> VkResult<()> {
        self.driver.device_wait_idle(&self.device.device)
    }
}

impl<D: Driver> Drop for VulkanContext<D> {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan context...");

        // Wait for device to finish
        if let Err(e) = self.wait_idle() {
            log::warn!("device_wait_idle failed during teardown: {}", e);
        }

        // Cleanup in reverse order; queues go with the device
        self.driver.destroy_device(&self.device.device);
        self.driver.destroy_surface(&self.instance, self.surface);
        if let Some(messenger) = self.debug_messenger.take() {
            self.driver.destroy_debug_messenger(&self.instance, messenger);
        }
        self.driver.destroy_instance(&self.instance);
    }
}
