//! Presentation: swapchain lifecycle on top of a `PresentationDevice`

mod swapchain;

pub use swapchain::{
    choose_extent, choose_image_count, choose_pre_transform, choose_present_mode,
    swapchain_render_pass_desc, Swapchain, SwapchainState,
};
