// Backend module - Vulkan abstraction layer
//
// Device and presentation bootstrap: instance, surface, device selection,
// queue resolution, swapchain negotiation.

pub mod capability;
pub mod device;
pub mod error;
pub mod instance;
pub mod negotiate;
pub mod queue_family;
pub mod select;
pub mod swapchain;

pub use device::VulkanDevice;
pub use error::BootstrapError;
pub use instance::{VulkanInstance, WindowSurface};
pub use swapchain::Swapchain;
