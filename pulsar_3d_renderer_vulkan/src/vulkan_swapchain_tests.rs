/// Tests for the swapchain negotiation policies
///
/// The choosers are pure over queried surface data, so they are tested
/// directly on hand-built capability structs.

use super::*;

fn surface_format(format: vk::Format, color_space: vk::ColorSpaceKHR) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR { format, color_space }
}

fn capabilities() -> vk::SurfaceCapabilitiesKHR {
    vk::SurfaceCapabilitiesKHR {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
        min_image_extent: vk::Extent2D { width: 1, height: 1 },
        max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
        ..Default::default()
    }
}

// ============================================================================
// Tests: surface format selection
// ============================================================================

#[test]
fn test_format_prefers_bgra8_srgb_nonlinear_pair() {
    let formats = [
        surface_format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        surface_format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    ];

    let chosen = choose_surface_format(&formats);
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

#[test]
fn test_format_falls_back_to_first_supported() {
    let formats = [
        surface_format(vk::Format::R16G16B16A16_SFLOAT, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
        surface_format(vk::Format::R8G8B8A8_UNORM, vk::ColorSpaceKHR::SRGB_NONLINEAR),
    ];

    let chosen = choose_surface_format(&formats);
    assert_eq!(chosen.format, vk::Format::R16G16B16A16_SFLOAT);
}

#[test]
fn test_format_any_sentinel_defaults_to_preferred_pair() {
    let formats = [surface_format(vk::Format::UNDEFINED, vk::ColorSpaceKHR::SRGB_NONLINEAR)];

    let chosen = choose_surface_format(&formats);
    assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
    assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
}

#[test]
fn test_format_requires_matching_color_space_for_preference() {
    // BGRA8 offered, but only in a non-sRGB color space: not the
    // preferred pair, so the first entry wins.
    let formats = [
        surface_format(vk::Format::R8G8B8A8_SRGB, vk::ColorSpaceKHR::SRGB_NONLINEAR),
        surface_format(vk::Format::B8G8R8A8_UNORM, vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT),
    ];

    let chosen = choose_surface_format(&formats);
    assert_eq!(chosen.format, vk::Format::R8G8B8A8_SRGB);
}

// ============================================================================
// Tests: present mode selection
// ============================================================================

#[test]
fn test_present_mode_mailbox_wins_over_immediate() {
    let modes = [
        vk::PresentModeKHR::FIFO,
        vk::PresentModeKHR::IMMEDIATE,
        vk::PresentModeKHR::MAILBOX,
    ];
    assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
}

#[test]
fn test_present_mode_immediate_when_no_mailbox() {
    let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
    assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::IMMEDIATE);
}

#[test]
fn test_present_mode_fifo_fallback() {
    let modes = [vk::PresentModeKHR::FIFO];
    assert_eq!(choose_present_mode(&modes), vk::PresentModeKHR::FIFO);
}

// ============================================================================
// Tests: extent selection
// ============================================================================

#[test]
fn test_extent_fixed_by_surface_is_taken_verbatim() {
    let mut caps = capabilities();
    caps.current_extent = vk::Extent2D { width: 1280, height: 720 };

    // The window hint is ignored entirely.
    let extent = choose_extent(&caps, (555, 333));
    assert_eq!(extent, vk::Extent2D { width: 1280, height: 720 });
}

#[test]
fn test_extent_undefined_sentinel_uses_framebuffer_size() {
    let extent = choose_extent(&capabilities(), (1024, 768));
    assert_eq!(extent, vk::Extent2D { width: 1024, height: 768 });
}

#[test]
fn test_extent_clamps_into_surface_bounds() {
    let mut caps = capabilities();
    caps.min_image_extent = vk::Extent2D { width: 200, height: 200 };
    caps.max_image_extent = vk::Extent2D { width: 800, height: 600 };

    assert_eq!(
        choose_extent(&caps, (10_000, 50)),
        vk::Extent2D { width: 800, height: 200 }
    );
}

#[test]
fn test_extent_zero_framebuffer_substitutes_default_window_size() {
    let extent = choose_extent(&capabilities(), (0, 0));
    assert_eq!(
        extent,
        vk::Extent2D {
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT
        }
    );
}

#[test]
fn test_extent_zero_dimension_substituted_independently() {
    let extent = choose_extent(&capabilities(), (1024, 0));
    assert_eq!(
        extent,
        vk::Extent2D { width: 1024, height: DEFAULT_WINDOW_HEIGHT }
    );
}

// ============================================================================
// Tests: image count selection
// ============================================================================

#[test]
fn test_image_count_is_min_plus_one() {
    let mut caps = capabilities();
    caps.min_image_count = 2;
    caps.max_image_count = 0; // unbounded
    assert_eq!(choose_image_count(&caps), 3);
}

#[test]
fn test_image_count_clamped_by_bounded_max() {
    let mut caps = capabilities();
    caps.min_image_count = 2;
    caps.max_image_count = 2;
    assert_eq!(choose_image_count(&caps), 2);
}

#[test]
fn test_image_count_unclamped_when_max_allows() {
    let mut caps = capabilities();
    caps.min_image_count = 3;
    caps.max_image_count = 8;
    assert_eq!(choose_image_count(&caps), 4);
}
