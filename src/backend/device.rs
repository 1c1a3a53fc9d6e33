// Logical device and queues
//
// Selects the physical device, resolves and validates its queue families,
// then creates the logical device from the de-duplicated queue plan and
// pulls one queue handle per role.

use ash::vk;
use std::sync::Arc;

use crate::config::{self, VulkanRequirements};

use super::error::BootstrapError;
use super::instance::{VulkanInstance, WindowSurface};
use super::queue_family::{self, QueueFamilyIndices};
use super::{capability, select};

/// One queue handle per role. Roles resolved to the same family at queue
/// index 0 alias the same underlying queue; that is expected, not an
/// error. Transfer and compute are absent when the device has no family
/// with the capability.
pub struct DeviceQueues {
    pub graphics: vk::Queue,
    pub present: vk::Queue,
    pub transfer: Option<vk::Queue>,
    pub compute: Option<vk::Queue>,
}

pub struct VulkanDevice {
    pub device: ash::Device,
    pub physical_device: vk::PhysicalDevice,
    pub queue_families: QueueFamilyIndices,
    pub queues: DeviceQueues,
    pub instance: Arc<VulkanInstance>,
}

impl VulkanDevice {
    /// Select a physical device for `surface` and realize the logical
    /// device and queues on it.
    pub fn new(
        instance: Arc<VulkanInstance>,
        surface: &WindowSurface,
        requirements: &VulkanRequirements,
    ) -> Result<Arc<Self>, BootstrapError> {
        let physical_device = select::pick_physical_device(
            &instance.instance,
            &surface.loader,
            surface.surface,
            &requirements.device_extensions,
        )?;

        let families = capability::queue_family_properties(&instance.instance, physical_device);
        let queue_families = queue_family::resolve(&families, |family_index| {
            surface.supports_present(physical_device, family_index)
        })?;

        // Coarse device eligibility does not verify per-role queue
        // existence, so a selected device can still fail here. That is
        // fatal; there is no fallback to the next candidate.
        let (graphics_family, present_family) = queue_families.require_mandatory()?;
        queue_families.warn_missing_optional();

        let device = Self::create_logical_device(
            &instance.instance,
            physical_device,
            &queue_families,
            requirements,
        )?;

        let queues = DeviceQueues {
            graphics: unsafe { device.get_device_queue(graphics_family, 0) },
            present: unsafe { device.get_device_queue(present_family, 0) },
            transfer: queue_families
                .transfer
                .map(|family| unsafe { device.get_device_queue(family, 0) }),
            compute: queue_families
                .compute
                .map(|family| unsafe { device.get_device_queue(family, 0) }),
        };

        Ok(Arc::new(Self {
            device,
            physical_device,
            queue_families,
            queues,
            instance,
        }))
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        queue_families: &QueueFamilyIndices,
        requirements: &VulkanRequirements,
    ) -> Result<ash::Device, BootstrapError> {
        // One queue per distinct family, no matter how many roles the
        // family satisfies.
        let queue_priorities = [1.0_f32];
        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
            .queue_plan()
            .into_iter()
            .map(|family_index| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family_index)
                    .queue_priorities(&queue_priorities)
                    .build()
            })
            .collect();

        let layer_ptrs = config::as_c_char_ptrs(&requirements.device_layers);
        let extension_ptrs = config::as_c_char_ptrs(&requirements.device_extensions);
        let features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_create_infos)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&features);

        let device = unsafe { instance.create_device(physical_device, &create_info, None) }
            .map_err(BootstrapError::DeviceCreation)?;

        log::info!(
            "Created logical device with {} queue create info(s)",
            queue_create_infos.len()
        );
        Ok(device)
    }

    /// Wait for the device to go idle, e.g. before teardown.
    pub fn wait_idle(&self) -> Result<(), BootstrapError> {
        unsafe { self.device.device_wait_idle() }.map_err(BootstrapError::Query)
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        log::info!("Destroying logical device");
        // Queues are owned by the device and are not destroyed separately.
        unsafe {
            self.device.destroy_device(None);
        }
    }
}
