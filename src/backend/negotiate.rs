// Swapchain parameter negotiation
//
// Pure preference rules over the sets a device/surface pair reports. The
// driver calls live in capability.rs and swapchain.rs; everything here is
// plain data in, plain data out.

use ash::vk;

/// Prefer 8-bit BGRA with non-linear sRGB encoding; otherwise take the
/// first reported format as-is. Returns `None` only for an empty set,
/// which an eligible device never reports.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_SRGB
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

/// Prefer MAILBOX (low-latency triple buffering). FIFO is the fallback and
/// is guaranteed available by the presentation contract, so this cannot
/// fail.
pub fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// When the surface reports a defined current extent it dictates the size.
/// The `u32::MAX` sentinel in both dimensions means the surface imposes no
/// extent; then the requested window size is clamped per axis into the
/// supported range.
pub fn choose_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    requested: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX
        && capabilities.current_extent.height != u32::MAX
    {
        return capabilities.current_extent;
    }
    vk::Extent2D {
        width: requested.width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: requested.height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    }
}

/// One image above the minimum, clamped back into the supported range when
/// the surface reports a bound (`max_image_count == 0` means unbounded).
pub fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let image_count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        image_count.clamp(capabilities.min_image_count, capabilities.max_image_count)
    } else {
        image_count
    }
}

/// Swapchain images must be shared between queue families exactly when
/// graphics and present resolve to different families. The concurrent
/// index list preserves [graphics, present] order.
pub fn choose_sharing_mode(graphics_family: u32, present_family: u32) -> (vk::SharingMode, Vec<u32>) {
    if graphics_family != present_family {
        (
            vk::SharingMode::CONCURRENT,
            vec![graphics_family, present_family],
        )
    } else {
        (vk::SharingMode::EXCLUSIVE, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_format_prefers_bgra_srgb_regardless_of_position() {
        let linear = vk::SurfaceFormatKHR {
            format: vk::Format::A8B8G8R8_UNORM_PACK32,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        };
        let srgb = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };

        let chosen = choose_surface_format(&[linear, srgb]).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn surface_format_falls_back_to_first_entry() {
        let only = vk::SurfaceFormatKHR {
            format: vk::Format::A8B8G8R8_UNORM_PACK32,
            color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
        };

        let chosen = choose_surface_format(&[only]).unwrap();
        assert_eq!(chosen.format, only.format);
        assert_eq!(chosen.color_space, only.color_space);
    }

    #[test]
    fn surface_format_empty_set_yields_none() {
        assert!(choose_surface_format(&[]).is_none());
    }

    #[test]
    fn present_mode_prefers_mailbox() {
        let chosen = choose_present_mode(&[
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ]);
        assert_eq!(chosen, vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn present_mode_falls_back_to_fifo_over_other_modes() {
        let chosen = choose_present_mode(&[
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::FIFO_RELAXED,
        ]);
        assert_eq!(chosen, vk::PresentModeKHR::FIFO);
    }

    fn capabilities_with_extents(
        current: vk::Extent2D,
        min: vk::Extent2D,
        max: vk::Extent2D,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            current_extent: current,
            min_image_extent: min,
            max_image_extent: max,
            ..Default::default()
        }
    }

    #[test]
    fn defined_current_extent_wins_over_request() {
        let capabilities = capabilities_with_extents(
            vk::Extent2D {
                width: 1280,
                height: 720,
            },
            vk::Extent2D {
                width: 1,
                height: 1,
            },
            vk::Extent2D {
                width: 4096,
                height: 4096,
            },
        );

        let chosen = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 1920,
                height: 1080,
            },
        );
        assert_eq!(chosen.width, 1280);
        assert_eq!(chosen.height, 720);
    }

    #[test]
    fn undefined_extent_uses_request_within_bounds() {
        let capabilities = capabilities_with_extents(
            vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            vk::Extent2D {
                width: 400,
                height: 400,
            },
            vk::Extent2D {
                width: 1000,
                height: 1000,
            },
        );

        let chosen = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 800,
                height: 600,
            },
        );
        assert_eq!(chosen.width, 800);
        assert_eq!(chosen.height, 600);
    }

    #[test]
    fn undefined_extent_clamps_each_axis_independently() {
        let capabilities = capabilities_with_extents(
            vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            vk::Extent2D {
                width: 400,
                height: 400,
            },
            vk::Extent2D {
                width: 1000,
                height: 1000,
            },
        );

        let chosen = choose_extent(
            &capabilities,
            vk::Extent2D {
                width: 1200,
                height: 300,
            },
        );
        assert_eq!(chosen.width, 1000);
        assert_eq!(chosen.height, 400);
    }

    #[test]
    fn image_count_is_min_plus_one_when_unbounded() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&capabilities), 3);
    }

    #[test]
    fn image_count_clamps_to_maximum() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(choose_image_count(&capabilities), 2);
    }

    #[test]
    fn same_family_shares_exclusively() {
        let (mode, indices) = choose_sharing_mode(1, 1);
        assert_eq!(mode, vk::SharingMode::EXCLUSIVE);
        assert!(indices.is_empty());
    }

    #[test]
    fn split_families_share_concurrently_in_order() {
        let (mode, indices) = choose_sharing_mode(2, 0);
        assert_eq!(mode, vk::SharingMode::CONCURRENT);
        assert_eq!(indices, vec![2, 0]);
    }
}
