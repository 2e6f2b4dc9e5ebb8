// Bring-up errors
//
// Every stage returns Result<T, BringupError>. The first error aborts the
// sequence; nothing is retried and nothing already created is destroyed.

use ash::vk;
use std::fmt;
use thiserror::Error;

/// The bring-up step a driver failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    EnumerateLayers,
    CreateInstance,
    CreateDebugMessenger,
    CreateSurface,
    EnumeratePhysicalDevices,
    QueryPresentSupport,
    QuerySurfaceCapabilities,
    EnumerateDeviceExtensions,
    CreateDevice,
    GetGraphicsQueue,
    GetPresentQueue,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Stage::EnumerateLayers => "failed to get layer properties",
            Stage::CreateInstance => "failed to create instance",
            Stage::CreateDebugMessenger => "failed to set up debug messenger",
            Stage::CreateSurface => "failed to create surface",
            Stage::EnumeratePhysicalDevices => "failed to enumerate physical devices",
            Stage::QueryPresentSupport => "failed to get physical device surface support",
            Stage::QuerySurfaceCapabilities => "failed to retrieve the surface capabilities",
            Stage::EnumerateDeviceExtensions => "failed to enumerate device extensions",
            Stage::CreateDevice => "failed to create logical device",
            Stage::GetGraphicsQueue => "failed to get graphics queue",
            Stage::GetPresentQueue => "failed to get present queue",
        };
        f.write_str(message)
    }
}

/// Coarse grouping used by callers that only care who is at fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The driver reported non-success, or success with a null handle
    Driver,
    /// Nothing available satisfies what the application asked for
    Policy,
    /// Loader, window system or caller-supplied names
    Environment,
}

#[derive(Debug, Error)]
pub enum BringupError {
    #[error("{stage}: {result}")]
    Driver { stage: Stage, result: vk::Result },

    #[error("{0}: driver returned a null handle")]
    NullHandle(Stage),

    #[error("validation layers requested, but not available: {}", .missing.join(", "))]
    ValidationLayersUnavailable { missing: Vec<String> },

    #[error("no physical devices found")]
    NoPhysicalDevices,

    #[error("failed to find a suitable GPU")]
    NoSuitableDevice,

    #[error("failed to load Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("window handle unavailable: {0}")]
    WindowHandle(#[from] raw_window_handle::HandleError),

    #[error("unsupported window system: {0}")]
    UnsupportedWindowSystem(String),

    #[error("invalid name: {0}")]
    InvalidName(#[from] std::ffi::NulError),
}

impl BringupError {
    /// Shorthand for `map_err` on driver results
    pub fn driver(stage: Stage) -> impl FnOnce(vk::Result) -> Self {
        move |result| BringupError::Driver { stage, result }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            BringupError::Driver { .. } | BringupError::NullHandle(_) => ErrorClass::Driver,
            BringupError::ValidationLayersUnavailable { .. }
            | BringupError::NoPhysicalDevices
            | BringupError::NoSuitableDevice => ErrorClass::Policy,
            BringupError::Loading(_)
            | BringupError::WindowHandle(_)
            | BringupError::UnsupportedWindowSystem(_)
            | BringupError::InvalidName(_) => ErrorClass::Environment,
        }
    }

    pub fn stage(&self) -> Option<Stage> {
        match self {
            BringupError::Driver { stage, .. } | BringupError::NullHandle(stage) => Some(*stage),
            _ => None,
        }
    }
}
