// Vulkan instance and window surface
//
// Owns the loader entry, the instance, the optional validation messenger,
// and the presentation surface. Each layer is a Drop type holding its
// parent alive through an Arc, so release always happens in reverse
// creation order, including when a later bootstrap step fails.

use ash::{vk, Entry};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::{CStr, CString};
use std::sync::Arc;

use crate::config::{self, VulkanRequirements};

use super::error::BootstrapError;

/// Instance extensions the window system needs for surface creation on the
/// current platform. Merged into the requirements before the instance is
/// created.
pub fn required_window_extensions(
    display_handle: RawDisplayHandle,
) -> Result<Vec<&'static CStr>, BootstrapError> {
    let extensions = ash_window::enumerate_required_extensions(display_handle)
        .map_err(BootstrapError::InstanceCreation)?;
    // The returned pointers are 'static names baked into ash-window.
    Ok(extensions
        .iter()
        .map(|&ptr| unsafe { CStr::from_ptr(ptr) })
        .collect())
}

pub struct VulkanInstance {
    pub entry: Entry,
    pub instance: ash::Instance,
    debug_utils: Option<(ash::extensions::ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,
}

impl VulkanInstance {
    pub fn new(
        app_name: &str,
        requirements: &VulkanRequirements,
        enable_validation: bool,
    ) -> Result<Arc<Self>, BootstrapError> {
        let entry = unsafe { Entry::load() }?;

        // A title with an interior NUL falls back to an empty name.
        let app_name = CString::new(app_name).unwrap_or_default();
        let engine_name = c"No Engine";

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(engine_name)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let layer_ptrs = config::as_c_char_ptrs(&requirements.instance_layers);
        let extension_ptrs = config::as_c_char_ptrs(&requirements.instance_extensions);

        let create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(BootstrapError::InstanceCreation)?;

        // The raw instance has no drop glue of its own, so hand it to its
        // Drop owner before the one remaining fallible step; an error from
        // the messenger then releases the instance on the way out.
        let mut bootstrap = Self {
            entry,
            instance,
            debug_utils: None,
        };
        if enable_validation {
            bootstrap.debug_utils = Some(Self::create_debug_messenger(
                &bootstrap.entry,
                &bootstrap.instance,
            )?);
        }

        Ok(Arc::new(bootstrap))
    }

    fn create_debug_messenger(
        entry: &Entry,
        instance: &ash::Instance,
    ) -> Result<(ash::extensions::ext::DebugUtils, vk::DebugUtilsMessengerEXT), BootstrapError>
    {
        let debug_utils = ash::extensions::ext::DebugUtils::new(entry, instance);

        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
            .map_err(BootstrapError::InstanceCreation)?;

        Ok((debug_utils, messenger))
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan instance");
        unsafe {
            if let Some((debug_utils, messenger)) = self.debug_utils.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

/// Presentation surface for one window, plus the extension loader needed to
/// query and destroy it.
pub struct WindowSurface {
    pub surface: vk::SurfaceKHR,
    pub loader: ash::extensions::khr::Surface,
    // Keeps the instance alive until the surface is destroyed.
    _instance: Arc<VulkanInstance>,
}

impl WindowSurface {
    pub fn new(
        instance: Arc<VulkanInstance>,
        display_handle: RawDisplayHandle,
        window_handle: RawWindowHandle,
    ) -> Result<Arc<Self>, BootstrapError> {
        let loader = ash::extensions::khr::Surface::new(&instance.entry, &instance.instance);

        let surface = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.instance,
                display_handle,
                window_handle,
                None,
            )
        }
        .map_err(BootstrapError::SurfaceCreation)?;

        Ok(Arc::new(Self {
            surface,
            loader,
            _instance: instance,
        }))
    }

    /// Whether queue family `family_index` of `physical_device` can present
    /// to this surface.
    pub fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool, BootstrapError> {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, family_index, self.surface)
        }
        .map_err(BootstrapError::Query)
    }
}

impl Drop for WindowSurface {
    fn drop(&mut self) {
        unsafe {
            self.loader.destroy_surface(self.surface, None);
        }
    }
}

// Routes validation layer messages into the log facade.
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*p_callback_data).p_message);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] {}", message.to_string_lossy());
        }
        _ => {
            log::debug!("[Vulkan] {}", message.to_string_lossy());
        }
    }

    vk::FALSE
}
