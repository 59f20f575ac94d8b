/// Tests for the color value utility

use super::*;

// ============================================================================
// Tests: construction and packing
// ============================================================================

#[test]
fn test_default_is_transparent_black() {
    let c = Color::default();
    assert_eq!(c.packed(), 0);
    assert_eq!((c.r, c.g, c.b, c.a), (0, 0, 0, 0));
}

#[test]
fn test_new_packs_all_channels() {
    let c = Color::new(255, 255, 255, 255);
    assert_eq!(c.packed(), 0xFFFF_FFFF);

    let c = Color::new(240, 70, 202, 200);
    assert_eq!(c.packed(), 0xC8F0_46CA);
}

#[test]
fn test_opaque_forces_alpha() {
    let c = Color::opaque(66, 66, 66);
    assert_eq!(c.packed(), 0xFF42_4242);
}

#[test]
fn test_argb_unpacks_channels() {
    let c = Color::argb(0x778B_6C42);
    assert_eq!((c.r, c.g, c.b, c.a), (0x8B, 0x6C, 0x42, 0x77));
    assert_eq!(c.packed(), 0x778B_6C42);
}

#[test]
fn test_packed_layout_constructors_agree() {
    // The same #8B6C42 color expressed in every packed layout.
    let expected = Color::argb(0xFF8B_6C42);

    assert_eq!(Color::rgb(0x8B6C42), expected);
    assert_eq!(Color::rgba(0x8B6C_42FF), expected);
    assert_eq!(Color::abgr(0xFF42_6C8B), expected);
    assert_eq!(Color::bgra(0x426C_8BFF), expected);
}

#[test]
fn test_rgb_ignores_high_byte() {
    assert_eq!(Color::rgb(0x778B_6C42), Color::argb(0xFF8B_6C42));
}

#[test]
fn test_u32_conversions_round_trip() {
    let c = Color::from(0xC8F0_46CAu32);
    assert_eq!((c.r, c.g, c.b, c.a), (0xF0, 0x46, 0xCA, 0xC8));
    assert_eq!(u32::from(c), 0xC8F0_46CA);
}

// ============================================================================
// Tests: blending
// ============================================================================

#[test]
fn test_blend_none_saturates_per_channel() {
    let dst = Color::new(200, 0, 5, 100);
    let src = Color::new(100, 10, 5, 200);

    let out = dst.blend(src, BlendMode::None);
    assert_eq!((out.r, out.g, out.b, out.a), (255, 10, 10, 255));
}

#[test]
fn test_add_operator_is_blend_none() {
    let dst = Color::new(200, 0, 5, 100);
    let src = Color::new(100, 10, 5, 200);
    assert_eq!(dst + src, dst.blend(src, BlendMode::None));
}

#[test]
fn test_blend_alpha_weights_by_source_alpha() {
    let dst = Color::new(100, 100, 100, 255);
    let src = Color::new(200, 200, 200, 128);

    let out = dst.blend(src, BlendMode::Alpha);
    // 100 * (1 - 128/255) + 200 * (128/255) = 150.19... -> 150
    assert_eq!((out.r, out.g, out.b), (150, 150, 150));
    assert_eq!(out.a, 255);
}

#[test]
fn test_blend_alpha_with_transparent_source_keeps_destination() {
    let dst = Color::new(10, 20, 30, 40);
    let src = Color::new(200, 200, 200, 0);

    let out = dst.blend(src, BlendMode::Alpha);
    assert_eq!(out, dst);
}

#[test]
fn test_blend_additive_keeps_source_alpha() {
    let dst = Color::new(100, 0, 0, 50);
    let src = Color::new(100, 0, 0, 128);

    let out = dst.blend(src, BlendMode::Additive);
    // 100 + 100 * (128/255) = 150.19... -> 150
    assert_eq!(out.r, 150);
    assert_eq!(out.a, 128);
}

#[test]
fn test_blend_modulate_multiplies_and_keeps_destination_alpha() {
    let dst = Color::new(2, 3, 255, 77);
    let src = Color::new(3, 10, 2, 200);

    let out = dst.blend(src, BlendMode::Modulate);
    assert_eq!((out.r, out.g, out.b, out.a), (6, 30, 255, 77));
}

#[test]
fn test_blend_mode_default_is_none() {
    assert_eq!(BlendMode::default(), BlendMode::None);
}

// ============================================================================
// Tests: utilities
// ============================================================================

#[test]
fn test_alpha_normalization() {
    assert_eq!(Color::new(0, 0, 0, 255).alpha(), 1.0);
    assert_eq!(Color::new(0, 0, 0, 0).alpha(), 0.0);
}

#[test]
fn test_luma_uses_itu_weights() {
    assert!((Color::opaque(255, 255, 255).luma() - 255.0).abs() < 1e-9);
    assert!(Color::opaque(0, 255, 0).luma() > Color::opaque(255, 0, 0).luma());
    assert!(Color::opaque(255, 0, 0).luma() > Color::opaque(0, 0, 255).luma());
}

#[test]
fn test_distance_is_euclidean_rgb() {
    let a = Color::opaque(0, 0, 0);
    let b = Color::opaque(3, 4, 0);
    assert_eq!(a.distance(b), 5.0);
    assert_eq!(b.distance(a), 5.0);
}

#[test]
fn test_distance_ignores_alpha() {
    let a = Color::new(10, 10, 10, 0);
    let b = Color::new(10, 10, 10, 255);
    assert_eq!(a.distance(b), 0.0);
}

#[test]
fn test_display_format() {
    let c = Color::new(240, 70, 202, 200);
    assert_eq!(c.to_string(), "rgba(r: 240 g: 70 b: 202 a: 200)");
}
