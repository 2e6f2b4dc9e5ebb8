// Device suitability
//
// A candidate qualifies when it has the required features, a graphics and a
// present queue family, every required extension, and at least one surface
// format and present mode. All four checks run so rejected devices can be
// logged with every reason at once.

use super::driver::Driver;
use super::error::BringupError;
use super::query::{
    check_device_extension_support, find_queue_families, query_swapchain_support,
    QueueFamilyIndices, SwapchainSupportDetails,
};
use ash::vk;
use serde::Deserialize;
use std::ffi::CString;

/// Optional core features an application can insist on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceFeature {
    GeometryShader,
    TessellationShader,
    SamplerAnisotropy,
    FillModeNonSolid,
    WideLines,
    ShaderInt64,
    ShaderFloat64,
    MultiDrawIndirect,
}

impl DeviceFeature {
    fn flag(self, features: &vk::PhysicalDeviceFeatures) -> vk::Bool32 {
        match self {
            DeviceFeature::GeometryShader => features.geometry_shader,
            DeviceFeature::TessellationShader => features.tessellation_shader,
            DeviceFeature::SamplerAnisotropy => features.sampler_anisotropy,
            DeviceFeature::FillModeNonSolid => features.fill_mode_non_solid,
            DeviceFeature::WideLines => features.wide_lines,
            DeviceFeature::ShaderInt64 => features.shader_int64,
            DeviceFeature::ShaderFloat64 => features.shader_float64,
            DeviceFeature::MultiDrawIndirect => features.multi_draw_indirect,
        }
    }

    pub fn is_supported(self, features: &vk::PhysicalDeviceFeatures) -> bool {
        self.flag(features) == vk::TRUE
    }

    pub fn enable(self, features: &mut vk::PhysicalDeviceFeatures) {
        let flag = match self {
            DeviceFeature::GeometryShader => &mut features.geometry_shader,
            DeviceFeature::TessellationShader => &mut features.tessellation_shader,
            DeviceFeature::SamplerAnisotropy => &mut features.sampler_anisotropy,
            DeviceFeature::FillModeNonSolid => &mut features.fill_mode_non_solid,
            DeviceFeature::WideLines => &mut features.wide_lines,
            DeviceFeature::ShaderInt64 => &mut features.shader_int64,
            DeviceFeature::ShaderFloat64 => &mut features.shader_float64,
            DeviceFeature::MultiDrawIndirect => &mut features.multi_draw_indirect,
        };
        *flag = vk::TRUE;
    }
}

/// What the application needs from a physical device
#[derive(Debug, Clone)]
pub struct DeviceRequirements {
    pub features: Vec<DeviceFeature>,
    pub extensions: Vec<CString>,
}

impl Default for DeviceRequirements {
    fn default() -> Self {
        Self {
            features: vec![DeviceFeature::GeometryShader],
            extensions: vec![ash::extensions::khr::Swapchain::name().to_owned()],
        }
    }
}

impl DeviceRequirements {
    /// The feature struct to enable on the logical device
    pub fn enabled_features(&self) -> vk::PhysicalDeviceFeatures {
        let mut features = vk::PhysicalDeviceFeatures::default();
        for feature in &self.features {
            feature.enable(&mut features);
        }
        features
    }

    pub fn features_supported(&self, features: &vk::PhysicalDeviceFeatures) -> bool {
        self.features.iter().all(|f| f.is_supported(features))
    }
}

/// Outcome of evaluating one candidate
#[derive(Debug, Clone)]
pub struct Suitability {
    pub features: bool,
    pub extensions: bool,
    pub indices: QueueFamilyIndices,
    pub swapchain_support: SwapchainSupportDetails,
}

impl Suitability {
    pub fn is_suitable(&self) -> bool {
        self.features
            && self.indices.is_complete()
            && self.extensions
            && self.swapchain_support.is_adequate()
    }

    /// Human-readable reasons a candidate was turned down
    pub fn rejections(&self) -> Vec<&'static str> {
        let mut reasons = Vec::new();
        if !self.features {
            reasons.push("missing required features");
        }
        if self.indices.graphics_family.is_none() {
            reasons.push("no graphics queue family");
        }
        if self.indices.present_family.is_none() {
            reasons.push("no queue family can present to the surface");
        }
        if !self.extensions {
            reasons.push("missing required extensions");
        }
        if !self.swapchain_support.is_adequate() {
            reasons.push("no surface formats or present modes");
        }
        reasons
    }
}

/// Evaluate a candidate. The queue family indices and surface support come
/// back with the verdict so the caller doesn't have to query them again.
pub fn is_device_suitable<D: Driver>(
    driver: &D,
    instance: &D::Instance,
    physical_device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    requirements: &DeviceRequirements,
) -> Result<Suitability, BringupError> {
    let features = driver.get_physical_device_features(instance, physical_device);
    let indices = find_queue_families(driver, instance, physical_device, surface)?;
    let extensions =
        check_device_extension_support(driver, instance, physical_device, &requirements.extensions)?;
    let swapchain_support = query_swapchain_support(driver, instance, physical_device, surface)?;

    Ok(Suitability {
        features: requirements.features_supported(&features),
        extensions,
        indices,
        swapchain_support,
    })
}
