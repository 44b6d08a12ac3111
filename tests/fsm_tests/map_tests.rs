//! Tests for FreeSpaceMap
//!
//! These tests verify:
//! - Best-fit selection (smallest non-zero free count first)
//! - Slot reservation and removal of exhausted pages
//! - Min-heap ordering after push, pop, and remove
//! - The panic on an inconsistent root

use pagestore::fsm::FreeSpaceMap;

// =============================================================================
// Helper Functions
// =============================================================================

/// Pop one slot, returning the page and whether it was the page's last slot
fn pop(map: &mut FreeSpaceMap<&'static str>) -> Option<(&'static str, bool)> {
    map.pop().map(|r| (*r, r.is_last()))
}

fn assert_heap_order<P>(map: &FreeSpaceMap<P>) {
    let free: Vec<u32> = map.iter().map(|(_, free)| free).collect();

    for (i, &value) in free.iter().enumerate() {
        for child in [2 * i + 1, 2 * i + 2] {
            if child < free.len() {
                assert!(
                    value <= free[child],
                    "heap order violated at {} -> {}: {:?}",
                    i,
                    child,
                    free
                );
            }
        }
    }
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_map_is_empty() {
    let map: FreeSpaceMap<&'static str> = FreeSpaceMap::new();

    assert!(map.is_empty());
    assert_eq!(map.len(), 0);
    assert_eq!(map.total_free(), 0);
}

#[test]
fn test_pop_empty_returns_none() {
    let mut map: FreeSpaceMap<&'static str> = FreeSpaceMap::new();

    assert!(pop(&mut map).is_none());
}

#[test]
fn test_pop_reserves_until_exhausted() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 3);

    assert_eq!(pop(&mut map), Some(("a", false)));
    assert_eq!(map.total_free(), 2);

    assert_eq!(pop(&mut map), Some(("a", false)));
    assert_eq!(map.total_free(), 1);
    assert_eq!(map.len(), 1);

    // Last slot: the page leaves the map
    assert_eq!(pop(&mut map), Some(("a", true)));
    assert!(map.is_empty());

    assert_eq!(pop(&mut map), None);
}

#[test]
fn test_partial_reservation_gives_mutable_access() {
    let mut map = FreeSpaceMap::new();
    map.push(vec![1u8], 2);

    {
        let mut page = map.pop().unwrap();
        assert!(!page.is_last());
        page.push(2);
    }

    let (page, free) = map.iter().next().unwrap();
    assert_eq!(page, &vec![1u8, 2]);
    assert_eq!(free, 1);
}

// =============================================================================
// Best-Fit Tests
// =============================================================================

#[test]
fn test_pop_prefers_tightest_fit() {
    let mut map = FreeSpaceMap::new();
    map.push("roomy", 3);
    map.push("tight", 1);

    // Tightest page fills first, then the roomy one
    assert_eq!(pop(&mut map), Some(("tight", true)));
    assert_eq!(pop(&mut map), Some(("roomy", false)));
    assert_eq!(pop(&mut map), Some(("roomy", false)));
    assert_eq!(pop(&mut map), Some(("roomy", true)));
    assert_eq!(pop(&mut map), None);
}

#[test]
fn test_pop_order_drains_smallest_first() {
    let mut map = FreeSpaceMap::new();
    let pages: [(&'static str, u32); 7] = [
        ("p5", 5),
        ("p3", 3),
        ("p8", 8),
        ("p1", 1),
        ("p9", 9),
        ("p2", 2),
        ("p7", 7),
    ];
    for (page, free) in pages {
        map.push(page, free);
        assert_heap_order(&map);
    }

    let mut drained = Vec::new();
    while let Some((page, _)) = pop(&mut map) {
        drained.push(page);
        assert_heap_order(&map);
    }

    // Each page is handed out once per free slot, tightest page first
    let mut expected = Vec::new();
    for (page, free) in [("p1", 1), ("p2", 2), ("p3", 3), ("p5", 5), ("p7", 7), ("p8", 8), ("p9", 9)] {
        expected.extend(std::iter::repeat(page).take(free));
    }
    assert_eq!(drained, expected);
}

#[test]
fn test_heap_order_holds_after_many_pushes() {
    let mut map = FreeSpaceMap::new();

    for i in 0..100u32 {
        // Scrambled but deterministic free counts
        map.push(i, (i * 37) % 23 + 1);
        assert_heap_order(&map);
    }

    assert_eq!(map.len(), 100);
    let (_, root_free) = map.iter().next().unwrap();
    assert_eq!(root_free, 1);
}

// =============================================================================
// Remove Tests
// =============================================================================

#[test]
fn test_remove_returns_page_and_free() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 4);
    map.push("b", 2);
    map.push("c", 6);

    let removed = map.remove(|p| *p == "a");

    assert_eq!(removed, Some(("a", 4)));
    assert_eq!(map.len(), 2);
    assert_eq!(map.total_free(), 8);
    assert_heap_order(&map);
}

#[test]
fn test_remove_missing_returns_none() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 4);

    assert_eq!(map.remove(|p| *p == "zzz"), None);
    assert_eq!(map.len(), 1);
}

#[test]
fn test_remove_keeps_heap_order() {
    let mut map = FreeSpaceMap::new();
    for i in 0..31u32 {
        map.push(i, (i * 7) % 13 + 1);
    }

    // Remove from the middle, the root, and the tail
    for target in [15u32, 0, 30, 7, 22] {
        let before = map.len();
        assert!(map.remove(|p| *p == target).is_some());
        assert_eq!(map.len(), before - 1);
        assert_heap_order(&map);
    }
}

#[test]
fn test_remove_last_remaining() {
    let mut map = FreeSpaceMap::new();
    map.push("only", 1);

    assert_eq!(map.remove(|_| true), Some(("only", 1)));
    assert!(map.is_empty());
}

#[test]
fn test_update_moves_page_to_new_position() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 2);
    map.push("b", 5);
    map.push("c", 7);

    // Loosen the root: it must sink below "b"
    assert!(map.update(|p| *p == "a", 6));
    assert_heap_order(&map);
    assert_eq!(pop(&mut map), Some(("b", false)));

    // Tighten a leaf: it must rise to the root
    assert!(map.update(|p| *p == "c", 1));
    assert_heap_order(&map);
    assert_eq!(pop(&mut map), Some(("c", true)));

    assert_eq!(map.total_free(), 4 + 6);
}

#[test]
fn test_update_missing_returns_false() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 4);

    assert!(!map.update(|p| *p == "zzz", 1));
    assert_eq!(map.total_free(), 4);
}

#[test]
#[should_panic(expected = "must have free slots")]
fn test_update_to_zero_panics() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 4);

    map.update(|p| *p == "a", 0);
}

#[test]
fn test_into_pages_yields_everything() {
    let mut map = FreeSpaceMap::new();
    map.push("a", 1);
    map.push("b", 2);

    let mut pages: Vec<_> = map.into_pages().collect();
    pages.sort();

    assert_eq!(pages, vec![("a", 1), ("b", 2)]);
}

// =============================================================================
// Invariant Violation Tests
// =============================================================================

#[test]
#[should_panic(expected = "no free slots")]
fn test_pop_panics_when_root_has_no_free_slots() {
    let mut map = FreeSpaceMap::new();

    // Only a caller with broken bookkeeping pushes a full page
    map.push("full", 0);
    map.push("roomy", 5);

    let _ = map.pop();
}
