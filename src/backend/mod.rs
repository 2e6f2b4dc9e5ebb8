// Backend module - Vulkan bring-up
//
// Design: stage functions generic over a `Driver`, so the negotiation logic
// runs the same against the real loader and a scripted one.
// Order: instance -> surface -> physical device -> logical device + queues

pub mod ash_driver;
pub mod context;
pub mod device;
pub mod driver;
pub mod error;
pub mod instance;
pub mod query;
pub mod suitability;
pub mod validation;
pub mod window;

#[cfg(test)]
pub(crate) mod mock;

pub use ash_driver::AshDriver;
pub use context::{BringupSettings, VulkanContext};
pub use device::{PhysicalDeviceSelection, Queue};
pub use driver::Driver;
pub use error::{BringupError, ErrorClass, Stage};
pub use instance::{make_version, InstanceSettings};
pub use query::{QueueFamilies, QueueFamilyIndices, SwapchainSupportDetails};
pub use suitability::{DeviceFeature, DeviceRequirements};
pub use window::WindowSurface;
