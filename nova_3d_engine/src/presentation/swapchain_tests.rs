use std::sync::atomic::Ordering;
use std::sync::Arc;
use crate::config::Config;
use crate::error::Error;
use crate::graphics_device::mock_graphics_device::{
    desktop_capabilities, framebuffer_id, recorded, render_pass_id, MockCommandList, MockGraphicsDevice,
};
use crate::graphics_device::{
    CommandList, CommandListLevel, Extent2D, GraphicsDevice, ImageLayout, LoadOp, PresentMode, RenderTarget,
    StoreOp, SurfaceCapabilities, SurfaceTransform, TextureFormat, SURFACE_EXTENT_UNDEFINED,
};
use crate::log::LogSink;
use crate::presentation::{
    choose_extent, choose_image_count, choose_pre_transform, choose_present_mode, swapchain_render_pass_desc,
    Swapchain, SwapchainState,
};

const CLEAR: [f32; 4] = [0.1, 0.2, 0.3, 1.0];

fn setup(capabilities: SurfaceCapabilities, modes: Vec<PresentMode>) -> (Arc<MockGraphicsDevice>, Swapchain) {
    let device = Arc::new(MockGraphicsDevice::new());
    let presentation = device.presentation(capabilities, modes);
    let swapchain = Swapchain::new(
        device.clone(),
        Box::new(presentation),
        &Config::default(),
        LogSink::console(),
    );
    (device, swapchain)
}

fn depth_target(device: &MockGraphicsDevice, format: TextureFormat) -> Arc<dyn RenderTarget> {
    device.create_depth_target(800, 600, format).unwrap()
}

fn initialized(modes: Vec<PresentMode>) -> (Arc<MockGraphicsDevice>, Swapchain) {
    let (device, mut swapchain) = setup(desktop_capabilities(), modes);
    swapchain.init(depth_target(&device, TextureFormat::D32_FLOAT)).unwrap();
    (device, swapchain)
}

fn run_frame(swapchain: &mut Swapchain) -> u32 {
    let index = swapchain.acquire_next_image().unwrap();
    let mut primary = MockCommandList::new(CommandListLevel::Primary);
    primary.begin(None).unwrap();
    swapchain.clear_image(&mut primary, CLEAR).unwrap();
    primary.end_render_pass().unwrap();
    primary.end().unwrap();
    swapchain.present(&primary).unwrap();
    index
}

// ============================================================================
// SELECTION RULES
// ============================================================================

#[test]
fn test_present_mode_prefers_mailbox() {
    assert_eq!(choose_present_mode(&[PresentMode::Fifo, PresentMode::Mailbox]), PresentMode::Mailbox);
    assert_eq!(
        choose_present_mode(&[PresentMode::Immediate, PresentMode::Mailbox, PresentMode::Fifo]),
        PresentMode::Mailbox
    );
}

#[test]
fn test_present_mode_immediate_over_fifo() {
    assert_eq!(choose_present_mode(&[PresentMode::Fifo, PresentMode::Immediate]), PresentMode::Immediate);
}

#[test]
fn test_present_mode_falls_back_to_fifo() {
    assert_eq!(choose_present_mode(&[PresentMode::Fifo]), PresentMode::Fifo);
    assert_eq!(choose_present_mode(&[PresentMode::FifoRelaxed]), PresentMode::Fifo);
    assert_eq!(choose_present_mode(&[]), PresentMode::Fifo);
}

#[test]
fn test_extent_uses_surface_extent_when_defined() {
    let extent = choose_extent(&desktop_capabilities(), Extent2D::new(1280, 720));
    assert_eq!(extent, Extent2D::new(800, 600));
}

#[test]
fn test_extent_sentinel_uses_window_size() {
    let mut caps = desktop_capabilities();
    caps.current_extent = Extent2D::new(SURFACE_EXTENT_UNDEFINED, SURFACE_EXTENT_UNDEFINED);
    assert_eq!(choose_extent(&caps, Extent2D::new(1280, 720)), Extent2D::new(1280, 720));
}

#[test]
fn test_extent_sentinel_clamped_to_surface_limits() {
    let mut caps = desktop_capabilities();
    caps.current_extent = Extent2D::new(SURFACE_EXTENT_UNDEFINED, SURFACE_EXTENT_UNDEFINED);
    caps.max_image_extent = Extent2D::new(1024, 512);
    assert_eq!(choose_extent(&caps, Extent2D::new(1280, 720)), Extent2D::new(1024, 512));
}

#[test]
fn test_extent_sentinel_with_inverted_limits_does_not_panic() {
    let mut caps = desktop_capabilities();
    caps.current_extent = Extent2D::new(SURFACE_EXTENT_UNDEFINED, SURFACE_EXTENT_UNDEFINED);
    caps.min_image_extent = Extent2D::new(2048, 2048);
    caps.max_image_extent = Extent2D::new(1024, 512);
    assert_eq!(choose_extent(&caps, Extent2D::new(1280, 720)), Extent2D::new(1024, 512));

    caps.min_image_extent = Extent2D::new(16, 16);
    caps.max_image_extent = Extent2D::new(0, 0);
    assert_eq!(choose_extent(&caps, Extent2D::new(1280, 720)), Extent2D::new(1, 1));
}

#[test]
fn test_image_count_one_above_minimum() {
    assert_eq!(choose_image_count(&desktop_capabilities()), 3);
}

#[test]
fn test_image_count_capped_by_maximum() {
    let mut caps = desktop_capabilities();
    caps.min_image_count = 3;
    caps.max_image_count = 3;
    assert_eq!(choose_image_count(&caps), 3);
}

#[test]
fn test_image_count_unbounded_maximum() {
    let mut caps = desktop_capabilities();
    caps.min_image_count = 4;
    caps.max_image_count = 0;
    assert_eq!(choose_image_count(&caps), 5);
}

#[test]
fn test_pre_transform_identity_when_supported() {
    assert_eq!(choose_pre_transform(&desktop_capabilities()), SurfaceTransform::IDENTITY);
}

#[test]
fn test_pre_transform_current_when_identity_unsupported() {
    let mut caps = desktop_capabilities();
    caps.supported_transforms = SurfaceTransform::ROTATE_90 | SurfaceTransform::ROTATE_270;
    caps.current_transform = SurfaceTransform::ROTATE_90;
    assert_eq!(choose_pre_transform(&caps), SurfaceTransform::ROTATE_90);
}

#[test]
fn test_render_pass_desc_attachments() {
    let desc = swapchain_render_pass_desc(TextureFormat::B8G8R8A8_SRGB, TextureFormat::D32_FLOAT);

    assert_eq!(desc.color_attachments.len(), 1);
    let color = desc.color_attachments[0];
    assert_eq!(color.load_op, LoadOp::Clear);
    assert_eq!(color.store_op, StoreOp::Store);
    assert_eq!(color.stencil_load_op, LoadOp::DontCare);
    assert_eq!(color.initial_layout, ImageLayout::ColorAttachment);
    assert_eq!(color.final_layout, ImageLayout::ColorAttachment);

    let depth = desc.depth_attachment.unwrap();
    assert_eq!(depth.format, TextureFormat::D32_FLOAT);
    assert_eq!(depth.load_op, LoadOp::Clear);
    assert_eq!(depth.stencil_load_op, LoadOp::Load);
    assert_eq!(depth.stencil_store_op, StoreOp::Store);
    assert_eq!(depth.final_layout, ImageLayout::DepthStencilAttachment);
}

// ============================================================================
// INIT
// ============================================================================

#[test]
fn test_init_creates_swapchain_pass_and_framebuffers() {
    let (device, swapchain) = initialized(vec![PresentMode::Fifo, PresentMode::Mailbox]);

    assert_eq!(swapchain.state(), SwapchainState::Initialized);
    assert_eq!(swapchain.image_count(), 3);
    assert_eq!(swapchain.extent(), Extent2D::new(800, 600));
    assert_eq!(swapchain.present_mode(), PresentMode::Mailbox);
    assert_eq!(swapchain.color_format(), TextureFormat::B8G8R8A8_SRGB);
    assert_eq!(device.stats.count("create_swapchain:3"), 1);
    assert_eq!(device.stats.count("create_render_pass"), 1);
    assert_eq!(device.stats.count("create_framebuffer"), 3);
    assert!(swapchain.render_pass().is_some());
    assert!(swapchain.current_image_index().is_none());
}

#[test]
fn test_framebuffers_pair_view_with_shared_depth() {
    let (device, mut swapchain) = setup(desktop_capabilities(), vec![PresentMode::Fifo]);
    let depth = depth_target(&device, TextureFormat::D32_FLOAT);
    swapchain.init(depth.clone()).unwrap();

    let framebuffer_events: Vec<String> = device
        .stats
        .events()
        .into_iter()
        .filter(|e| e.starts_with("create_framebuffer"))
        .collect();
    assert_eq!(framebuffer_events.len(), 3);

    let depth_id = device
        .stats
        .events()
        .into_iter()
        .find(|e| e.starts_with("create_depth_target"))
        .unwrap()
        .rsplit(':')
        .next()
        .unwrap()
        .to_string();
    for event in framebuffer_events {
        assert!(event.ends_with(&format!(", {}]", depth_id)), "{}", event);
    }
}

#[test]
fn test_init_with_sentinel_extent_uses_configured_window() {
    let mut caps = desktop_capabilities();
    caps.current_extent = Extent2D::new(SURFACE_EXTENT_UNDEFINED, SURFACE_EXTENT_UNDEFINED);
    let (device, mut swapchain) = setup(caps, vec![PresentMode::Fifo]);
    swapchain.init(depth_target(&device, TextureFormat::D32_FLOAT)).unwrap();

    assert_eq!(swapchain.extent(), Extent2D::new(1280, 720));
    assert_eq!(swapchain.present_mode(), PresentMode::Fifo);
}

#[test]
fn test_init_twice_rejected() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    let result = swapchain.init(depth_target(&device, TextureFormat::D32_FLOAT));
    assert!(matches!(result, Err(Error::InvalidState(_))));
}

// ============================================================================
// FRAME LOOP
// ============================================================================

#[test]
fn test_frame_cycles_keep_pass_and_framebuffers() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    let pass_id = render_pass_id(swapchain.render_pass().unwrap());
    let framebuffer_ids: Vec<u64> = (0..3).map(|i| framebuffer_id(swapchain.framebuffer(i).unwrap())).collect();

    let indices: Vec<u32> = (0..6).map(|_| run_frame(&mut swapchain)).collect();

    assert_eq!(indices, vec![0, 1, 2, 0, 1, 2]);
    assert_eq!(render_pass_id(swapchain.render_pass().unwrap()), pass_id);
    let after: Vec<u64> = (0..3).map(|i| framebuffer_id(swapchain.framebuffer(i).unwrap())).collect();
    assert_eq!(after, framebuffer_ids);
    assert_eq!(device.stats.count("create_render_pass"), 1);
    assert_eq!(device.stats.count("create_framebuffer"), 3);
    assert_eq!(device.stats.count("destroy_framebuffer"), 0);
    assert_eq!(swapchain.state(), SwapchainState::Initialized);
}

#[test]
fn test_semaphores_created_and_destroyed_per_frame() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    for _ in 0..4 {
        run_frame(&mut swapchain);
    }
    assert_eq!(device.stats.count("create_semaphore"), 8);
    assert_eq!(device.stats.count("destroy_semaphore"), 8);
}

#[test]
fn test_present_waits_on_acquire_and_signals_render_complete() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    device.stats.clear();
    run_frame(&mut swapchain);

    let events = device.stats.events();
    let semaphores: Vec<String> = events
        .iter()
        .filter(|e| e.starts_with("create_semaphore:"))
        .map(|e| e.trim_start_matches("create_semaphore:").to_string())
        .collect();
    let (acquired, complete) = (&semaphores[0], &semaphores[1]);

    assert!(events.contains(&format!("acquire:0:signal={}", acquired)));
    assert!(events
        .iter()
        .any(|e| e.starts_with("submit:") && e.ends_with(&format!("wait={}:BottomOfPipe:signal={}", acquired, complete))));
    assert!(events.contains(&format!("present:0:wait={}", complete)));

    let present = device.stats.position("present:").unwrap();
    let destroyed = device.stats.position("destroy_semaphore").unwrap();
    assert!(present < destroyed);
}

#[test]
fn test_clear_image_begins_pass_on_acquired_framebuffer() {
    let (_device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain.acquire_next_image().unwrap();
    let expected_framebuffer = framebuffer_id(swapchain.current_framebuffer().unwrap());
    let expected_pass = render_pass_id(swapchain.render_pass().unwrap());

    let mut primary = MockCommandList::new(CommandListLevel::Primary);
    swapchain.clear_image(&mut primary, CLEAR).unwrap();

    let commands = recorded(&primary);
    assert_eq!(commands.len(), 1);
    assert_eq!(
        commands[0],
        format!(
            "begin_render_pass(render_pass={}, framebuffer={}, area=800x600, clear=[Color([0.1, 0.2, 0.3, 1.0]), DepthStencil {{ depth: 1.0, stencil: 0 }}], contents=SecondaryCommandLists)",
            expected_pass, expected_framebuffer
        )
    );
    assert_eq!(swapchain.state(), SwapchainState::Recording);
}

// ============================================================================
// STATE ERRORS
// ============================================================================

#[test]
fn test_acquire_before_init_rejected() {
    let (_device, mut swapchain) = setup(desktop_capabilities(), vec![PresentMode::Fifo]);
    assert!(matches!(swapchain.acquire_next_image(), Err(Error::InvalidState(_))));
}

#[test]
fn test_second_acquire_rejected_until_present() {
    let (_device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain.acquire_next_image().unwrap();

    assert!(matches!(swapchain.acquire_next_image(), Err(Error::InvalidState(_))));
    assert_eq!(swapchain.state(), SwapchainState::ImageAcquired);
    assert_eq!(swapchain.current_image_index(), Some(0));
}

#[test]
fn test_present_without_recording_rejected() {
    let (_device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain.acquire_next_image().unwrap();
    let primary = MockCommandList::new(CommandListLevel::Primary);
    assert!(matches!(swapchain.present(&primary), Err(Error::InvalidState(_))));
}

#[test]
fn test_clear_image_without_acquire_rejected() {
    let (_device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    let mut primary = MockCommandList::new(CommandListLevel::Primary);
    assert!(matches!(swapchain.clear_image(&mut primary, CLEAR), Err(Error::InvalidState(_))));
    assert!(recorded(&primary).is_empty());
}

#[test]
fn test_recreate_mid_frame_rejected() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain.acquire_next_image().unwrap();
    let result = swapchain.recreate(640, 480, depth_target(&device, TextureFormat::D32_FLOAT));
    assert!(matches!(result, Err(Error::InvalidState(_))));
}

#[test]
fn test_operations_after_teardown_rejected() {
    let (_device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain.teardown();
    assert_eq!(swapchain.state(), SwapchainState::TornDown);
    assert!(matches!(swapchain.acquire_next_image(), Err(Error::InvalidState(_))));
}

// ============================================================================
// RECREATE / TEARDOWN
// ============================================================================

#[test]
fn test_recreate_keeps_render_pass_for_same_formats() {
    let mut caps = desktop_capabilities();
    caps.current_extent = Extent2D::new(SURFACE_EXTENT_UNDEFINED, SURFACE_EXTENT_UNDEFINED);
    let (device, mut swapchain) = setup(caps, vec![PresentMode::Fifo]);
    swapchain.init(depth_target(&device, TextureFormat::D32_FLOAT)).unwrap();
    let pass_id = render_pass_id(swapchain.render_pass().unwrap());

    swapchain
        .recreate(1024, 768, depth_target(&device, TextureFormat::D32_FLOAT))
        .unwrap();

    assert_eq!(swapchain.extent(), Extent2D::new(1024, 768));
    assert_eq!(render_pass_id(swapchain.render_pass().unwrap()), pass_id);
    assert_eq!(device.stats.count("create_render_pass"), 1);
    assert_eq!(device.stats.count("destroy_framebuffer"), 3);
    assert_eq!(device.stats.count("create_framebuffer"), 6);
    assert_eq!(device.stats.count("create_swapchain"), 2);

    let idle = device.stats.position("wait_idle").unwrap();
    let destroyed = device.stats.position("destroy_framebuffer").unwrap();
    assert!(idle < destroyed);

    run_frame(&mut swapchain);
}

#[test]
fn test_recreate_with_new_depth_format_rebuilds_render_pass() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain
        .recreate(800, 600, depth_target(&device, TextureFormat::D24_UNORM_S8_UINT))
        .unwrap();
    assert_eq!(device.stats.count("create_render_pass"), 2);
    assert_eq!(device.stats.count("destroy_render_pass"), 1);
}

#[test]
fn test_teardown_order() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    run_frame(&mut swapchain);
    swapchain.teardown();

    let framebuffer = device.stats.position("destroy_framebuffer").unwrap();
    let view = device.stats.position("destroy_view").unwrap();
    let pass = device.stats.position("destroy_render_pass").unwrap();
    let chain = device.stats.position("destroy_swapchain").unwrap();
    assert!(framebuffer < view);
    assert!(view < pass);
    assert!(pass < chain);
    assert_eq!(device.stats.count("destroy_framebuffer"), 3);
}

#[test]
fn test_drop_tears_down_once() {
    let (device, mut swapchain) = initialized(vec![PresentMode::Fifo]);
    swapchain.teardown();
    drop(swapchain);
    assert_eq!(device.stats.count("destroy_swapchain"), 1);
    assert_eq!(device.stats.count("destroy_render_pass"), 1);
}

#[test]
fn test_drop_without_teardown_releases_everything() {
    let (device, swapchain) = initialized(vec![PresentMode::Fifo]);
    drop(swapchain);
    assert_eq!(device.stats.count("destroy_swapchain"), 1);
    assert_eq!(device.stats.count("destroy_framebuffer"), 3);
    assert_eq!(device.stats.count("destroy_render_pass"), 1);
}

#[test]
fn test_drop_uninitialized_touches_nothing() {
    let (device, swapchain) = setup(desktop_capabilities(), vec![PresentMode::Fifo]);
    drop(swapchain);
    assert_eq!(device.stats.count("destroy_swapchain"), 0);
}

#[test]
fn test_failed_present_drains_queue_before_destroying_semaphores() {
    let device = Arc::new(MockGraphicsDevice::new());
    let presentation = device.presentation(desktop_capabilities(), vec![PresentMode::Fifo]);
    let fail_present = presentation.fail_present.clone();
    let mut swapchain = Swapchain::new(device.clone(), Box::new(presentation), &Config::default(), LogSink::console());
    swapchain.init(depth_target(&device, TextureFormat::D32_FLOAT)).unwrap();
    device.stats.clear();

    fail_present.store(true, Ordering::SeqCst);
    swapchain.acquire_next_image().unwrap();
    let mut primary = MockCommandList::new(CommandListLevel::Primary);
    primary.begin(None).unwrap();
    swapchain.clear_image(&mut primary, CLEAR).unwrap();
    primary.end_render_pass().unwrap();
    primary.end().unwrap();

    assert!(matches!(swapchain.present(&primary), Err(Error::BackendError(_))));
    assert_eq!(swapchain.state(), SwapchainState::Initialized);

    let failed = device.stats.position("present_failed").unwrap();
    let idle = device.stats.position("queue_wait_idle").unwrap();
    let destroyed = device.stats.position("destroy_semaphore").unwrap();
    assert!(failed < idle);
    assert!(idle < destroyed);
    assert_eq!(device.stats.count("destroy_semaphore"), 2);

    // The swapchain can be rebuilt and used again
    fail_present.store(false, Ordering::SeqCst);
    swapchain.recreate(800, 600, depth_target(&device, TextureFormat::D32_FLOAT)).unwrap();
    run_frame(&mut swapchain);
}
