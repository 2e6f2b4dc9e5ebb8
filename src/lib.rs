// =============================================================================
// VULKAN BRING-UP - instance, surface, device and queue negotiation
// =============================================================================
//
// Everything a renderer needs before it can build a swapchain:
//
// ┌─────────────────────────────────────────────────────────────────┐
// │  CreateInstance  (validation layer gate, platform extensions)   │
// │    └── CreateSurface  (window -> VkSurfaceKHR)                  │
// │          └── PickPhysicalDevice  (first suitable GPU)           │
// │                └── CreateLogicalDevice  (graphics + present)    │
// └─────────────────────────────────────────────────────────────────┘
//
// The render loop consumes a finished `VulkanContext`.
//
// =============================================================================

pub mod backend;
pub mod config;
