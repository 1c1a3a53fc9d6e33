// Capability queries - read-only adapter over the Vulkan runtime
//
// Everything here is queried fresh per selection pass; nothing is cached.
// A query only fails when the underlying driver call fails, never because
// a result set is empty.

use ash::vk;
use std::collections::HashSet;
use std::ffi::CStr;

use super::error::BootstrapError;

/// Surface-dependent swapchain support for one device/surface pair.
pub struct SwapchainSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    pub fn query(
        surface_loader: &ash::extensions::khr::Surface,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, BootstrapError> {
        unsafe {
            let capabilities = surface_loader
                .get_physical_device_surface_capabilities(physical_device, surface)
                .map_err(BootstrapError::Query)?;
            let formats = surface_loader
                .get_physical_device_surface_formats(physical_device, surface)
                .map_err(BootstrapError::Query)?;
            let present_modes = surface_loader
                .get_physical_device_surface_present_modes(physical_device, surface)
                .map_err(BootstrapError::Query)?;
            Ok(Self {
                capabilities,
                formats,
                present_modes,
            })
        }
    }
}

/// Set of device extension names supported by a physical device.
pub fn supported_extensions(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<HashSet<String>, BootstrapError> {
    let properties = unsafe { instance.enumerate_device_extension_properties(physical_device) }
        .map_err(BootstrapError::Query)?;

    Ok(properties
        .iter()
        .map(|ext| {
            unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) }
                .to_string_lossy()
                .into_owned()
        })
        .collect())
}

/// Queue family properties in family-index order.
pub fn queue_family_properties(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Vec<vk::QueueFamilyProperties> {
    unsafe { instance.get_physical_device_queue_family_properties(physical_device) }
}

/// Human-readable device name from cached properties.
pub fn device_name(properties: &vk::PhysicalDeviceProperties) -> String {
    unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
        .to_string_lossy()
        .into_owned()
}
