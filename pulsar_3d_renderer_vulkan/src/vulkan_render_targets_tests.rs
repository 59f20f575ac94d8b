/// Tests for depth format selection
///
/// The probe is pure over a feature-query closure, so candidates can be
/// simulated without a device.

use super::*;
use pulsar_3d_renderer::pulsar3d::Error;

fn support_only(supported: &[vk::Format]) -> impl Fn(vk::Format) -> vk::FormatFeatureFlags + '_ {
    move |format| {
        if supported.contains(&format) {
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::FormatFeatureFlags::empty()
        }
    }
}

#[test]
fn test_depth_probe_prefers_d32_sfloat() {
    let chosen = first_supported_depth_format(
        &DEPTH_FORMAT_CANDIDATES,
        support_only(&DEPTH_FORMAT_CANDIDATES),
    )
    .unwrap();
    assert_eq!(chosen, vk::Format::D32_SFLOAT);
}

#[test]
fn test_depth_probe_follows_preference_order() {
    let chosen = first_supported_depth_format(
        &DEPTH_FORMAT_CANDIDATES,
        support_only(&[vk::Format::D24_UNORM_S8_UINT, vk::Format::D32_SFLOAT_S8_UINT]),
    )
    .unwrap();
    assert_eq!(chosen, vk::Format::D32_SFLOAT_S8_UINT);
}

#[test]
fn test_depth_probe_takes_last_resort_candidate() {
    let chosen = first_supported_depth_format(
        &DEPTH_FORMAT_CANDIDATES,
        support_only(&[vk::Format::D24_UNORM_S8_UINT]),
    )
    .unwrap();
    assert_eq!(chosen, vk::Format::D24_UNORM_S8_UINT);
}

#[test]
fn test_depth_probe_fails_when_nothing_is_supported() {
    match first_supported_depth_format(&DEPTH_FORMAT_CANDIDATES, support_only(&[])) {
        Err(Error::NoSupportedFormat(_)) => {}
        other => panic!("expected NoSupportedFormat, got {:?}", other),
    }
}

#[test]
fn test_depth_probe_requires_attachment_feature_not_just_presence() {
    // The format exists but only with sampled-image features.
    let query = |_format: vk::Format| vk::FormatFeatureFlags::SAMPLED_IMAGE;
    assert!(first_supported_depth_format(&DEPTH_FORMAT_CANDIDATES, query).is_err());
}

#[test]
fn test_stencil_component_detection() {
    assert!(!has_stencil_component(vk::Format::D32_SFLOAT));
    assert!(has_stencil_component(vk::Format::D32_SFLOAT_S8_UINT));
    assert!(has_stencil_component(vk::Format::D24_UNORM_S8_UINT));
}
