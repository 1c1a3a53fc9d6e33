// Physical device selection
//
// The first device in enumeration order that passes every eligibility
// check wins; there is no scoring and no fallback past the first match.
// Checks run in a fixed order and short-circuit, so a non-discrete device
// never has its extensions or surface support queried.

use ash::vk;
use std::collections::HashSet;
use std::ffi::CString;

use super::capability::{self, SwapchainSupportDetails};
use super::error::BootstrapError;

/// Outcome of probing one candidate device, in check order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Suitability {
    Suitable,
    NotDiscrete,
    MissingExtensions,
    NoSwapchainSupport,
}

/// Walk candidates in enumeration order and return the first one the probe
/// accepts. An empty candidate list and an exhausted list are distinct,
/// user-visible failures.
fn select_first<T, F>(candidates: &[T], mut probe: F) -> Result<T, BootstrapError>
where
    T: Copy,
    F: FnMut(T) -> Result<Suitability, BootstrapError>,
{
    if candidates.is_empty() {
        return Err(BootstrapError::NoCompatibleDevice);
    }
    for &candidate in candidates {
        if probe(candidate)? == Suitability::Suitable {
            return Ok(candidate);
        }
    }
    Err(BootstrapError::NoSuitableDevice {
        device_count: candidates.len(),
    })
}

fn supports_required_extensions(supported: &HashSet<String>, required: &[CString]) -> bool {
    required
        .iter()
        .all(|ext| supported.contains(&*ext.to_string_lossy()))
}

fn has_swapchain_support(support: &SwapchainSupportDetails) -> bool {
    !support.formats.is_empty() && !support.present_modes.is_empty()
}

/// Enumerate physical devices and pick the first suitable discrete GPU for
/// the given surface.
pub fn pick_physical_device(
    instance: &ash::Instance,
    surface_loader: &ash::extensions::khr::Surface,
    surface: vk::SurfaceKHR,
    required_extensions: &[CString],
) -> Result<vk::PhysicalDevice, BootstrapError> {
    let devices =
        unsafe { instance.enumerate_physical_devices() }.map_err(BootstrapError::Query)?;
    if !devices.is_empty() {
        log::info!("Found {} Vulkan compatible device(s)", devices.len());
    }

    let physical_device = select_first(&devices, |device| {
        let suitability = probe_device(
            instance,
            surface_loader,
            surface,
            device,
            required_extensions,
        )?;
        if suitability != Suitability::Suitable {
            let properties = unsafe { instance.get_physical_device_properties(device) };
            log::debug!(
                "Rejecting device {:?}: {:?}",
                capability::device_name(&properties),
                suitability
            );
        }
        Ok(suitability)
    })?;

    let properties = unsafe { instance.get_physical_device_properties(physical_device) };
    log::info!("Device selected: {}", capability::device_name(&properties));
    Ok(physical_device)
}

fn probe_device(
    instance: &ash::Instance,
    surface_loader: &ash::extensions::khr::Surface,
    surface: vk::SurfaceKHR,
    device: vk::PhysicalDevice,
    required_extensions: &[CString],
) -> Result<Suitability, BootstrapError> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    if properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU {
        return Ok(Suitability::NotDiscrete);
    }

    let supported = capability::supported_extensions(instance, device)?;
    if !supports_required_extensions(&supported, required_extensions) {
        return Ok(Suitability::MissingExtensions);
    }

    let support = SwapchainSupportDetails::query(surface_loader, device, surface)?;
    if !has_swapchain_support(&support) {
        return Ok(Suitability::NoSwapchainSupport);
    }

    Ok(Suitability::Suitable)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_enumeration_is_no_compatible_device() {
        let mut probed = 0;
        let result = select_first(&[], |_: u32| {
            probed += 1;
            Ok(Suitability::Suitable)
        });
        assert!(matches!(result, Err(BootstrapError::NoCompatibleDevice)));
        assert_eq!(probed, 0);
    }

    #[test]
    fn first_passing_device_wins_in_enumeration_order() {
        // Device 10 fails, 20 and 30 both pass; 20 must be chosen, never
        // a "better" later entry.
        let chosen = select_first(&[10u32, 20, 30], |device| {
            Ok(if device == 10 {
                Suitability::NotDiscrete
            } else {
                Suitability::Suitable
            })
        })
        .unwrap();
        assert_eq!(chosen, 20);
    }

    #[test]
    fn selection_stops_at_first_match() {
        let mut probed = Vec::new();
        select_first(&[1u32, 2, 3], |device| {
            probed.push(device);
            Ok(Suitability::Suitable)
        })
        .unwrap();
        assert_eq!(probed, vec![1]);
    }

    #[test]
    fn exhausted_list_is_no_suitable_device() {
        let result = select_first(&[1u32, 2], |_| Ok(Suitability::NotDiscrete));
        assert!(matches!(
            result,
            Err(BootstrapError::NoSuitableDevice { device_count: 2 })
        ));
    }

    #[test]
    fn probe_error_aborts_selection() {
        let result = select_first(&[1u32, 2], |_| {
            Err(BootstrapError::Query(vk::Result::ERROR_DEVICE_LOST))
        });
        assert!(matches!(result, Err(BootstrapError::Query(_))));
    }

    #[test]
    fn required_extensions_must_all_be_supported() {
        let supported: HashSet<String> = ["VK_KHR_swapchain", "VK_KHR_maintenance1"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let required = vec![CString::new("VK_KHR_swapchain").unwrap()];
        assert!(supports_required_extensions(&supported, &required));

        let missing = vec![
            CString::new("VK_KHR_swapchain").unwrap(),
            CString::new("VK_KHR_ray_tracing_pipeline").unwrap(),
        ];
        assert!(!supports_required_extensions(&supported, &missing));
    }

    #[test]
    fn empty_required_set_is_always_satisfied() {
        assert!(supports_required_extensions(&HashSet::new(), &[]));
    }

    #[test]
    fn swapchain_support_requires_both_sets_non_empty() {
        let format = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };

        let no_modes = SwapchainSupportDetails {
            capabilities: Default::default(),
            formats: vec![format],
            present_modes: Vec::new(),
        };
        assert!(!has_swapchain_support(&no_modes));

        let no_formats = SwapchainSupportDetails {
            capabilities: Default::default(),
            formats: Vec::new(),
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(!has_swapchain_support(&no_formats));

        let both = SwapchainSupportDetails {
            capabilities: Default::default(),
            formats: vec![format],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(has_swapchain_support(&both));
    }
}
