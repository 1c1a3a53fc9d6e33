// Swapchain creation
//
// Re-queries surface support for the selected device, applies the
// negotiated format/present-mode/extent, and realizes the swapchain, its
// images, and one color view per image. The swapchain owns its images;
// only the views are destroyed on drop.

use ash::vk;
use std::sync::Arc;

use super::capability::SwapchainSupportDetails;
use super::device::VulkanDevice;
use super::error::BootstrapError;
use super::instance::WindowSurface;
use super::negotiate;

pub struct Swapchain {
    pub swapchain: vk::SwapchainKHR,
    pub loader: ash::extensions::khr::Swapchain,
    pub images: Vec<vk::Image>,
    pub image_views: Vec<vk::ImageView>,
    pub format: vk::Format,
    pub extent: vk::Extent2D,
    device: Arc<VulkanDevice>,
    // The surface must outlive the swapchain it backs.
    _surface: Arc<WindowSurface>,
}

impl Swapchain {
    pub fn new(
        device: Arc<VulkanDevice>,
        surface: Arc<WindowSurface>,
        window_extent: vk::Extent2D,
    ) -> Result<Self, BootstrapError> {
        let support = SwapchainSupportDetails::query(
            &surface.loader,
            device.physical_device,
            surface.surface,
        )?;

        // An eligible device reported non-empty sets at selection time; an
        // empty re-query means the negotiated config cannot be realized.
        let surface_format = negotiate::choose_surface_format(&support.formats).ok_or(
            BootstrapError::SwapchainCreation(vk::Result::ERROR_FORMAT_NOT_SUPPORTED),
        )?;
        let present_mode = negotiate::choose_present_mode(&support.present_modes);
        let extent = negotiate::choose_extent(&support.capabilities, window_extent);
        let image_count = negotiate::choose_image_count(&support.capabilities);

        let (graphics_family, present_family) = device.queue_families.require_mandatory()?;
        let (sharing_mode, family_indices) =
            negotiate::choose_sharing_mode(graphics_family, present_family);

        log::info!(
            "Creating swapchain: {}x{}, {:?}, {:?}, {} image(s), {:?} sharing",
            extent.width,
            extent.height,
            surface_format.format,
            present_mode,
            image_count,
            sharing_mode
        );

        let loader = ash::extensions::khr::Swapchain::new(
            &device.instance.instance,
            &device.device,
        );

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(&family_indices)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true);

        let swapchain = unsafe { loader.create_swapchain(&create_info, None) }
            .map_err(BootstrapError::SwapchainCreation)?;

        let images = match unsafe { loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(err) => {
                unsafe { loader.destroy_swapchain(swapchain, None) };
                return Err(BootstrapError::SwapchainCreation(err));
            }
        };

        // From here the struct owns the handles, so an image view failure
        // below unwinds through Drop in reverse order.
        let mut result = Self {
            swapchain,
            loader,
            images,
            image_views: Vec::new(),
            format: surface_format.format,
            extent,
            device,
            _surface: surface,
        };
        result.create_image_views()?;

        log::info!("Created swapchain with {} image(s)", result.images.len());
        Ok(result)
    }

    fn create_image_views(&mut self) -> Result<(), BootstrapError> {
        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe { self.device.device.create_image_view(&create_info, None) }
                .map_err(BootstrapError::ImageViewCreation)?;
            self.image_views.push(view);
        }
        Ok(())
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &view in &self.image_views {
                self.device.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
