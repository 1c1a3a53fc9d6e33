// Bootstrap error taxonomy
//
// Every variant is fatal to device bootstrap: nothing here is retried and
// there is no fallback device search. The only non-fatal condition in the
// whole pipeline (a missing transfer/compute queue family) is logged as a
// warning instead of surfacing here.

use ash::vk;
use thiserror::Error;

/// Queue roles a device can expose. Graphics and present are mandatory for
/// a usable device; transfer and compute are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRole {
    Graphics,
    Transfer,
    Compute,
    Present,
}

impl std::fmt::Display for QueueRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            QueueRole::Graphics => "graphics",
            QueueRole::Transfer => "transfer",
            QueueRole::Compute => "compute",
            QueueRole::Present => "present",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to load the Vulkan library: {0}")]
    LibraryLoad(#[from] ash::LoadingError),

    #[error("failed to create Vulkan instance: {0}")]
    InstanceCreation(vk::Result),

    #[error("failed to create window surface: {0}")]
    SurfaceCreation(vk::Result),

    /// A capability query against the driver failed (e.g. device lost).
    /// "No results" is never an error; it is an empty set.
    #[error("capability query failed: {0}")]
    Query(vk::Result),

    #[error("no Vulkan compatible device found")]
    NoCompatibleDevice,

    #[error("none of the {device_count} enumerated device(s) is a suitable discrete GPU")]
    NoSuitableDevice { device_count: usize },

    #[error("selected device has no {role} queue family")]
    IncompleteQueueSupport { role: QueueRole },

    #[error("failed to create logical device: {0}")]
    DeviceCreation(vk::Result),

    #[error("failed to create swapchain: {0}")]
    SwapchainCreation(vk::Result),

    #[error("failed to create swapchain image view: {0}")]
    ImageViewCreation(vk::Result),
}
