/// Tests for ring slot advancement

use super::*;

#[test]
fn test_advance_cycles_with_period_two() {
    assert_eq!(advance_slot(0, 2), 1);
    assert_eq!(advance_slot(1, 2), 0);
}

#[test]
fn test_advance_cycles_with_period_three() {
    let mut slot = 0;
    let visited: Vec<usize> = (0..6)
        .map(|_| {
            slot = advance_slot(slot, 3);
            slot
        })
        .collect();
    assert_eq!(visited, vec![1, 2, 0, 1, 2, 0]);
}

#[test]
fn test_advance_single_slot_ring_stays_put() {
    assert_eq!(advance_slot(0, 1), 0);
}
