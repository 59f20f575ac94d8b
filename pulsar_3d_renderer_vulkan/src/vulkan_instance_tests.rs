/// Tests for the instance support-report helpers

use super::*;

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// Tests: missing_names
// ============================================================================

#[test]
fn test_missing_names_empty_required() {
    let missing = missing_names(&[], &names(&["VK_KHR_surface"]));
    assert!(missing.is_empty());
}

#[test]
fn test_missing_names_all_available() {
    let required = names(&["VK_KHR_surface", "VK_KHR_xcb_surface"]);
    let available = names(&["VK_KHR_surface", "VK_KHR_xcb_surface", "VK_EXT_debug_utils"]);
    assert!(missing_names(&required, &available).is_empty());
}

#[test]
fn test_missing_names_reports_each_absent_entry() {
    let required = names(&["VK_KHR_surface", "VK_EXT_debug_utils"]);
    let available = names(&["VK_KHR_surface"]);
    assert_eq!(missing_names(&required, &available), names(&["VK_EXT_debug_utils"]));
}

#[test]
fn test_missing_names_with_empty_available_set() {
    let required = names(&["VK_KHR_surface"]);
    assert_eq!(missing_names(&required, &[]), required);
}

// ============================================================================
// Tests: report_support
// ============================================================================

#[test]
fn test_report_support_passes_when_all_present() {
    let required = names(&["VK_KHR_surface"]);
    let available = names(&["VK_KHR_surface", "VK_KHR_display"]);
    assert!(report_support("Extensions", &required, &available));
}

#[test]
fn test_report_support_fails_on_missing_entry() {
    let required = names(&["VK_LAYER_KHRONOS_validation"]);
    assert!(!report_support("Layers", &required, &[]));
}
