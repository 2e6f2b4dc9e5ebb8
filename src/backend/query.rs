// Capability queries
//
// Raw facts about a (physical device, surface) pair: which queue families
// can draw and present, what the surface supports, which extensions the
// device exposes. No judgement here; that's the suitability module's job.

use super::driver::{enumerate, raw_name, Driver};
use super::error::{BringupError, Stage};
use ash::vk;
use std::collections::{BTreeSet, HashSet};
use std::ffi::CString;

/// Queue families found on a candidate device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics_family: Option<u32>,
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Both indices, if both were found
    pub fn complete(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics_family?,
            present: self.present_family?,
        })
    }
}

/// Queue families of a device that has both; may alias the same index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct family indices, ascending
    pub fn unique(&self) -> Vec<u32> {
        let set: BTreeSet<u32> = [self.graphics, self.present].into_iter().collect();
        set.into_iter().collect()
    }
}

/// Walk the queue families in driver order. The first graphics-capable
/// family and the first family that can present to `surface` win; the scan
/// stops once both are known.
pub fn find_queue_families<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<QueueFamilyIndices, BringupError> {
    let families = enumerate(|out| {
        Ok(driver.get_physical_device_queue_family_properties(instance, physical_device, out))
    })
    .map_err(BringupError::driver(Stage::QueryPresentSupport))?;

    let mut indices = QueueFamilyIndices::default();
    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if indices.graphics_family.is_none() && family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics_family = Some(index);
        }

        if indices.present_family.is_none() {
            let supported = driver
                .get_physical_device_surface_support(instance, physical_device, index, surface)
                .map_err(BringupError::driver(Stage::QueryPresentSupport))?;
            if supported {
                indices.present_family = Some(index);
            }
        }

        if indices.is_complete() {
            break;
        }
    }

    Ok(indices)
}

/// What a surface supports on a given device
#[derive(Debug, Clone, Default)]
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// At least one format and one present mode
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }

    /// SRGB BGRA8 if offered, otherwise whatever comes first
    pub fn preferred_surface_format(&self) -> Option<vk::SurfaceFormatKHR> {
        self.formats
            .iter()
            .find(|f| {
                f.format == vk::Format::B8G8R8A8_SRGB
                    && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .or_else(|| self.formats.first())
            .copied()
    }

    /// `wanted` if offered, then MAILBOX, then FIFO (always supported)
    pub fn preferred_present_mode(&self, wanted: vk::PresentModeKHR) -> vk::PresentModeKHR {
        [wanted, vk::PresentModeKHR::MAILBOX]
            .into_iter()
            .find(|mode| self.present_modes.contains(mode))
            .unwrap_or(vk::PresentModeKHR::FIFO)
    }

    /// The surface's own extent, or the window size clamped to the limits
    /// when the surface leaves it to us (current extent of u32::MAX)
    pub fn preferred_extent(&self, width: u32, height: u32) -> vk::Extent2D {
        let caps = &self.capabilities;
        if caps.current_extent.width != u32::MAX {
            return caps.current_extent;
        }
        vk::Extent2D {
            width: width
                .max(caps.min_image_extent.width)
                .min(caps.max_image_extent.width),
            height: height
                .max(caps.min_image_extent.height)
                .min(caps.max_image_extent.height),
        }
    }

    /// One more than the minimum, capped by the maximum (0 = no maximum)
    pub fn preferred_image_count(&self) -> u32 {
        let caps = &self.capabilities;
        let count = caps.min_image_count + 1;
        if caps.max_image_count > 0 {
            count.min(caps.max_image_count)
        } else {
            count
        }
    }
}

/// Capabilities, then formats, then present modes.
///
/// Only the capabilities call can fail the query. A format or present-mode
/// enumeration that errors leaves that list empty, which makes the device
/// inadequate later on.
pub fn query_swapchain_support<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
) -> Result<SwapchainSupportDetails, BringupError> {
    let capabilities = driver
        .get_physical_device_surface_capabilities(instance, physical_device, surface)
        .map_err(BringupError::driver(Stage::QuerySurfaceCapabilities))?;

    let formats = enumerate(|out| {
        driver.get_physical_device_surface_formats(instance, physical_device, surface, out)
    })
    .unwrap_or_else(|e| {
        log::warn!("Surface format query failed: {}", e);
        Vec::new()
    });

    let present_modes = enumerate(|out| {
        driver.get_physical_device_surface_present_modes(instance, physical_device, surface, out)
    })
    .unwrap_or_else(|e| {
        log::warn!("Present mode query failed: {}", e);
        Vec::new()
    });

    Ok(SwapchainSupportDetails {
        capabilities,
        formats,
        present_modes,
    })
}

/// Device extension names as reported by the driver
pub fn device_extensions<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<HashSet<String>, BringupError> {
    let properties = enumerate(|out| {
        driver.enumerate_device_extension_properties(instance, physical_device, out)
    })
    .map_err(BringupError::driver(Stage::EnumerateDeviceExtensions))?;

    Ok(properties.iter().map(|p| raw_name(&p.extension_name)).collect())
}

/// Every required extension is reported by the device (exact name match)
pub fn check_device_extension_support<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    physical_device: vk::PhysicalDevice,
    required: &[CString],
) -> Result<bool, BringupError> {
    if required.is_empty() {
        return Ok(true);
    }
    let available = device_extensions(driver, instance, physical_device)?;
    Ok(required
        .iter()
        .all(|name| available.contains(&*name.to_string_lossy())))
}
