// Vulkan Device - physical device selection + logical device creation
//
// Responsibilities:
// - Pick the first physical device that satisfies the requirements
// - Create one queue per distinct queue family (graphics, present)
// - Retrieve the graphics and present queues

use super::driver::{enumerate, raw_name, Driver};
use super::error::{BringupError, Stage};
use super::instance::name_pointers;
use super::query::{QueueFamilies, QueueFamilyIndices, SwapchainSupportDetails};
use super::suitability::{is_device_suitable, DeviceRequirements};
use ash::vk;
use std::ffi::CString;

/// The chosen GPU and what was learned about it while choosing
#[derive(Debug, Clone)]
pub struct PhysicalDeviceSelection {
    pub physical_device: vk::PhysicalDevice,
    pub name: String,
    pub device_type: vk::PhysicalDeviceType,
    pub api_version: u32,
    pub indices: QueueFamilyIndices,
    pub queue_families: QueueFamilies,
    pub swapchain_support: SwapchainSupportDetails,
}

/// Enumerate every physical device and return the first suitable one, in
/// driver order. No ranking.
pub fn pick_physical_device<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    surface: vk::SurfaceKHR,
    requirements: &DeviceRequirements,
) -> Result<PhysicalDeviceSelection, BringupError> {
    let devices = enumerate(|out| driver.enumerate_physical_devices(instance, out))
        .map_err(BringupError::driver(Stage::EnumeratePhysicalDevices))?;

    if devices.is_empty() {
        return Err(BringupError::NoPhysicalDevices);
    }
    log::info!("Found {} physical device(s)", devices.len());

    for physical_device in devices {
        let props = driver.get_physical_device_properties(instance, physical_device);
        let name = raw_name(&props.device_name);

        let verdict = is_device_suitable(driver, instance, physical_device, surface, requirements)?;
        let queue_families = match verdict.indices.complete() {
            Some(families) if verdict.is_suitable() => families,
            _ => {
                log::debug!("Skipping {}: {}", name, verdict.rejections().join(", "));
                continue;
            }
        };

        log::info!("Selected GPU: {} ({:?})", name, props.device_type);
        log::info!(
            "API Version: {}.{}.{}",
            vk::api_version_major(props.api_version),
            vk::api_version_minor(props.api_version),
            vk::api_version_patch(props.api_version)
        );
        log::info!(
            "Queue families: graphics={}, present={}",
            queue_families.graphics,
            queue_families.present
        );

        return Ok(PhysicalDeviceSelection {
            physical_device,
            name,
            device_type: props.device_type,
            api_version: props.api_version,
            indices: verdict.indices,
            queue_families,
            swapchain_support: verdict.swapchain_support,
        });
    }

    Err(BringupError::NoSuitableDevice)
}

/// A queue retrieved from a logical device. Valid for as long as that device
/// is; `device` only identifies the owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Queue {
    pub handle: vk::Queue,
    pub family_index: u32,
    device: vk::Device,
}

impl Queue {
    pub fn device(&self) -> vk::Device {
        self.device
    }
}

/// Logical device plus its graphics and present queues
pub struct LogicalDevice<H> {
    pub device: H,
    pub handle: vk::Device,
    pub graphics_queue: Queue,
    pub present_queue: Queue,
    pub queue_families: QueueFamilies,
}

impl<H> LogicalDevice<H> {
    /// Whether `queue` was retrieved from this device
    pub fn owns(&self, queue: &Queue) -> bool {
        queue.device == self.handle
    }
}

/// One queue-create request per distinct family, one queue each
pub fn queue_create_infos(
    families: &QueueFamilies,
    priorities: &[f32],
) -> Vec<vk::DeviceQueueCreateInfo> {
    families
        .unique()
        .into_iter()
        .map(|family| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(family)
                .queue_priorities(priorities)
                .build()
        })
        .collect()
}

/// Create the logical device and fetch queue 0 of the graphics and present
/// families. Layers are passed again at device level for older loaders.
pub fn create_logical_device<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    physical_device: vk::PhysicalDevice,
    queue_families: QueueFamilies,
    validation_layers: Option<&[CString]>,
    requirements: &DeviceRequirements,
) -> Result<LogicalDevice<D::Device>, BringupError> {
    let queue_priorities = [1.0];
    let queue_infos = queue_create_infos(&queue_families, &queue_priorities);

    let extensions = name_pointers(requirements.extensions.iter().map(CString::as_c_str));
    let layers = name_pointers(validation_layers.unwrap_or(&[]).iter().map(CString::as_c_str));
    let features = requirements.enabled_features();

    let create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_infos)
        .enabled_extension_names(&extensions)
        .enabled_layer_names(&layers)
        .enabled_features(&features);

    let device = driver
        .create_device(instance, physical_device, &create_info)
        .map_err(BringupError::driver(Stage::CreateDevice))?;
    let handle = driver.device_handle(&device);
    if handle == vk::Device::null() {
        return Err(BringupError::NullHandle(Stage::CreateDevice));
    }

    let graphics_queue = retrieve_queue(
        driver,
        &device,
        handle,
        queue_families.graphics,
        Stage::GetGraphicsQueue,
    )?;
    let present_queue = retrieve_queue(
        driver,
        &device,
        handle,
        queue_families.present,
        Stage::GetPresentQueue,
    )?;

    log::info!(
        "Created logical device with {} queue family request(s)",
        queue_infos.len()
    );

    Ok(LogicalDevice {
        device,
        handle,
        graphics_queue,
        present_queue,
        queue_families,
    })
}

fn retrieve_queue<D: Driver>(
    driver: &D,
    device: &D::Device,
    handle: vk::Device,
    family_index: u32,
    stage: Stage,
) -> Result<Queue, BringupError> {
    let queue = driver.get_device_queue(device, family_index, 0);
    if queue == vk::Queue::null() {
        return Err(BringupError::NullHandle(stage));
    }
    Ok(Queue {
        handle: queue,
        family_index,
        device: handle,
    })
}
