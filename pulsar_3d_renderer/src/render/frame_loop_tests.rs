/// Tests for the frame loop driver
///
/// All tests run against the mock presenter/window; the properties under
/// test are the synchronization-slot discipline, the staleness recovery
/// transitions, and the minimized-window rebuild behavior.

use super::*;
use crate::render::mock_presenter::{
    MockPresenter, MockWindow, ScriptedAcquire, ScriptedPresent,
};

fn rendered(outcome: IterationOutcome) -> u32 {
    match outcome {
        IterationOutcome::Rendered { image_index } => image_index,
        other => panic!("expected Rendered, got {:?}", other),
    }
}

// ============================================================================
// Tests: fence discipline
// ============================================================================

#[test]
fn test_first_frames_never_block_on_fence() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    for _ in 0..2 {
        frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
    }

    // Pre-signaled fences: the first N iterations find their slot free.
    assert_eq!(presenter.blocked_waits, 0);
}

#[test]
fn test_fence_wait_blocks_once_ring_wraps() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    for _ in 0..3 {
        frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
    }

    // The third iteration reuses slot 0, whose fence was reset at submit.
    assert_eq!(presenter.blocked_waits, 1);
}

#[test]
fn test_fence_resets_at_submit_not_at_wait() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert!(!presenter.fence_signaled(0));
    assert!(presenter.fence_signaled(1));
}

#[test]
fn test_abandoned_iteration_leaves_fence_signaled() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    // No submit happened, so re-waiting slot 0 cannot deadlock.
    assert!(presenter.fence_signaled(0));
    assert_eq!(presenter.blocked_waits, 0);
}

// ============================================================================
// Tests: slot advancement
// ============================================================================

#[test]
fn test_slot_advances_cyclically() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    assert_eq!(frame_loop.current_slot(), 0);
    for expected in [1, 0, 1, 0] {
        frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
        assert_eq!(frame_loop.current_slot(), expected);
    }
}

#[test]
fn test_image_indices_cycle_over_swapchain() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    let mut indices = Vec::new();
    for _ in 0..4 {
        indices.push(rendered(
            frame_loop.run_iteration(&mut presenter, &mut window).unwrap(),
        ));
    }

    assert_eq!(indices, vec![0, 1, 2, 0]);
}

// ============================================================================
// Tests: staleness at acquire
// ============================================================================

#[test]
fn test_acquire_out_of_date_rebuilds_without_advancing_slot() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(outcome, IterationOutcome::Rebuilt);
    assert_eq!(frame_loop.current_slot(), 0);
    assert_eq!(presenter.rebuild_count, 1);
    assert_eq!(frame_loop.phase(), LoopPhase::Rendering);

    // The retry on the same slot renders normally.
    let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
    assert_eq!(rendered(outcome), 0);
    assert_eq!(frame_loop.current_slot(), 1);
}

#[test]
fn test_double_staleness_rebuilds_twice_with_stable_slot() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    for _ in 0..2 {
        let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
        assert_eq!(outcome, IterationOutcome::Rebuilt);
        assert_eq!(frame_loop.current_slot(), 0);
    }

    assert_eq!(presenter.rebuild_count, 2);
    assert_eq!(frame_loop.phase(), LoopPhase::Rendering);
}

#[test]
fn test_transient_acquire_failure_skips_without_advancing() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::Fail);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(outcome, IterationOutcome::Skipped);
    assert_eq!(frame_loop.current_slot(), 0);
    assert_eq!(presenter.rebuild_count, 0);

    // The loop keeps going afterwards.
    let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
    assert_eq!(rendered(outcome), 0);
}

// ============================================================================
// Tests: staleness at present
// ============================================================================

#[test]
fn test_present_out_of_date_rebuilds_and_advances_slot() {
    let mut presenter = MockPresenter::new(2);
    presenter.present_script.push_back(ScriptedPresent::OutOfDate);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    // The frame was submitted, so the slot advances even though the
    // present was dropped.
    assert_eq!(rendered(outcome), 0);
    assert_eq!(frame_loop.current_slot(), 1);
    assert_eq!(presenter.rebuild_count, 1);
}

#[test]
fn test_present_suboptimal_rebuilds() {
    let mut presenter = MockPresenter::new(2);
    presenter.present_script.push_back(ScriptedPresent::Suboptimal);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(presenter.rebuild_count, 1);
    assert_eq!(frame_loop.phase(), LoopPhase::Rendering);
}

#[test]
fn test_present_failure_is_logged_not_fatal() {
    let mut presenter = MockPresenter::new(2);
    presenter.present_script.push_back(ScriptedPresent::Fail);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    let outcome = frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(rendered(outcome), 0);
    assert_eq!(frame_loop.current_slot(), 1);
    assert_eq!(presenter.rebuild_count, 0);
}

// ============================================================================
// Tests: resize notifications
// ============================================================================

#[test]
fn test_resize_notification_rebuilds_after_present() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    frame_loop.notify_resized();
    assert!(frame_loop.resize_pending());

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(presenter.rebuild_count, 1);
    assert!(!frame_loop.resize_pending());
}

#[test]
fn test_suboptimal_acquire_triggers_rebuild_via_resize_flag() {
    let mut presenter = MockPresenter::new(2);
    presenter
        .acquire_script
        .push_back(ScriptedAcquire::AcquireSuboptimal);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(presenter.rebuild_count, 1);
    assert!(!frame_loop.resize_pending());
}

// ============================================================================
// Tests: rebuild transition
// ============================================================================

#[test]
fn test_rebuild_uses_current_framebuffer_size() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    let mut window = MockWindow::with_size(640, 360);
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(presenter.last_rebuild_extent, Some((640, 360)));
}

#[test]
fn test_rebuild_waits_out_minimized_window() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    let mut window = MockWindow::with_size(0, 0);
    window.pending_sizes.push_back((0, 0));
    window.pending_sizes.push_back((1024, 768));
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(window.polls, 2);
    assert_eq!(presenter.last_rebuild_extent, Some((1024, 768)));
    assert_eq!(frame_loop.phase(), LoopPhase::Rendering);
}

#[test]
fn test_rebuild_aborts_when_window_closes_while_minimized() {
    let mut presenter = MockPresenter::new(2);
    presenter.acquire_script.push_back(ScriptedAcquire::OutOfDate);
    let mut window = MockWindow::with_size(0, 0);
    window.close_after_polls = Some(1);
    let mut frame_loop = FrameLoop::new();

    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();

    assert_eq!(presenter.rebuild_count, 0);
    assert_eq!(frame_loop.phase(), LoopPhase::ShuttingDown);
}

// ============================================================================
// Tests: lifecycle
// ============================================================================

#[test]
fn test_phase_transitions_idle_to_rendering() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    let mut frame_loop = FrameLoop::new();

    assert_eq!(frame_loop.phase(), LoopPhase::Idle);
    frame_loop.run_iteration(&mut presenter, &mut window).unwrap();
    assert_eq!(frame_loop.phase(), LoopPhase::Rendering);
}

#[test]
fn test_run_terminates_on_window_close() {
    let mut presenter = MockPresenter::new(2);
    let mut window = MockWindow::new();
    window.close_after_polls = Some(3);
    let mut frame_loop = FrameLoop::new();

    frame_loop.run(&mut presenter, &mut window).unwrap();

    assert_eq!(frame_loop.phase(), LoopPhase::Terminated);
    assert!(presenter.drained());
}

#[test]
fn test_shutdown_drains_device() {
    let mut presenter = MockPresenter::new(2);
    let mut frame_loop = FrameLoop::new();

    frame_loop.shutdown(&mut presenter).unwrap();

    assert!(presenter.drained());
    assert_eq!(frame_loop.phase(), LoopPhase::Terminated);
}
