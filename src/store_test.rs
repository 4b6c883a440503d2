#![allow(clippy::float_cmp)]

use super::*;

fn dot(i: i16) -> Dot {
    Dot { x: i, y: -i, radius: f32::from(i) * 0.5 }
}

fn point(i: i16) -> PathPoint {
    PathPoint { x: i32::from(i) * 10, y: i32::from(i) * 20, index_x: i, index_y: i + 1, visible: i % 2 == 0 }
}

// --- construction ---

#[test]
fn new_store_is_empty_with_default_capacity() {
    let dots = DotArray::new();
    assert!(dots.is_empty());
    assert_eq!(dots.len(), 0);
    assert_eq!(dots.capacity(), DEFAULT_STORE_CAPACITY);
    assert_eq!(dots.growth_factor(), DEFAULT_GROWTH_FACTOR);
}

#[test]
fn growth_factor_below_minimum_is_rejected() {
    let err = DotArray::with_capacity(10, 2).expect_err("factor 2 should fail");
    assert_eq!(err, StoreError::InvalidGrowthFactor(2));
}

#[test]
fn growth_factor_at_minimum_is_accepted() {
    let dots = DotArray::with_capacity(3, MIN_GROWTH_FACTOR).expect("store");
    assert_eq!(dots.capacity(), 3);
}

// --- push / growth ---

#[test]
fn scenario_c_fifteen_dots_into_capacity_ten() {
    let mut dots = DotArray::new();
    for i in 1..=15 {
        dots.push(dot(i));
    }
    assert_eq!(dots.len(), 15);
    assert_eq!(dots.capacity(), 40);
    assert_eq!(dots.get(14).expect("dot #15"), dot(15));
}

#[test]
fn growth_preserves_every_record_across_reallocations() {
    let mut path = ThreadPathArray::with_capacity(2, 4).expect("store");
    for i in 0..200 {
        path.push(point(i));
    }
    assert_eq!(path.len(), 200);
    // 2 -> 8 -> 32 -> 128 -> 512
    assert_eq!(path.capacity(), 512);
    for i in 0..200 {
        assert_eq!(path.get(usize::try_from(i).expect("index")).expect("record"), point(i));
    }
}

#[test]
fn zero_capacity_store_grows_on_first_push() {
    let mut lines = GridThreadArray::with_capacity(0, 4).expect("store");
    lines.push(GridThread { from_x: 1, from_y: 2, to_x: 3, to_y: 4 });
    assert_eq!(lines.len(), 1);
    assert_eq!(lines.capacity(), 4);
    assert_eq!(lines.from_x(), &[1]);
    assert_eq!(lines.to_y(), &[4]);
}

#[test]
fn push_at_exact_capacity_does_not_grow() {
    let mut dots = DotArray::with_capacity(4, 4).expect("store");
    for i in 0..4 {
        dots.push(dot(i));
    }
    assert_eq!(dots.capacity(), 4);
    dots.push(dot(4));
    assert_eq!(dots.capacity(), 16);
}

// --- pop / clear ---

#[test]
fn pop_returns_last_and_keeps_capacity() {
    let mut dots = DotArray::new();
    for i in 0..12 {
        dots.push(dot(i));
    }
    let capacity = dots.capacity();
    assert_eq!(dots.pop(), Some(dot(11)));
    assert_eq!(dots.len(), 11);
    assert_eq!(dots.capacity(), capacity);
}

#[test]
fn pop_on_empty_is_none() {
    let mut dots = DotArray::new();
    assert_eq!(dots.pop(), None);
}

#[test]
fn undo_redo_cycles_never_reallocate() {
    let mut path = ThreadPathArray::new();
    for i in 0..10 {
        path.push(point(i));
    }
    let capacity = path.capacity();
    for _ in 0..50 {
        let last = path.pop().expect("record");
        path.push(last);
    }
    assert_eq!(path.capacity(), capacity);
    assert_eq!(path.len(), 10);
}

#[test]
fn clear_resets_length_only() {
    let mut dots = DotArray::new();
    for i in 0..30 {
        dots.push(dot(i));
    }
    let capacity = dots.capacity();
    dots.clear();
    assert!(dots.is_empty());
    assert_eq!(dots.capacity(), capacity);
    assert!(dots.positions_x().is_empty());
}

// --- reads ---

#[test]
fn get_past_length_is_an_invariant_error() {
    let mut dots = DotArray::new();
    dots.push(dot(1));
    assert_eq!(dots.get(1), Err(StoreError::IndexOutOfBounds { index: 1, len: 1 }));
}

#[test]
fn popped_slot_is_not_readable() {
    let mut dots = DotArray::new();
    dots.push(dot(1));
    dots.push(dot(2));
    dots.pop();
    assert!(dots.get(1).is_err());
    assert_eq!(dots.positions_x().len(), 1);
}

#[test]
fn column_slices_are_truncated_to_length() {
    let mut dots = DotArray::new();
    for i in 0..3 {
        dots.push(dot(i));
    }
    assert_eq!(dots.positions_x(), &[0, 1, 2]);
    assert_eq!(dots.positions_y(), &[0, -1, -2]);
    assert_eq!(dots.radius(), &[0.0, 0.5, 1.0]);
    assert!(dots.capacity() > dots.positions_x().len());
}

#[test]
fn thread_path_columns_expose_indexes_and_visibility() {
    let mut path = ThreadPathArray::new();
    path.push(point(0));
    path.push(point(1));
    assert_eq!(path.positions_x(), &[0, 10]);
    assert_eq!(path.positions_y(), &[0, 20]);
    assert_eq!(path.indexes_x(), &[0, 1]);
    assert_eq!(path.indexes_y(), &[1, 2]);
    assert_eq!(path.visibility(), &[true, false]);
}

#[test]
fn last_and_iter_follow_insertion_order() {
    let mut dots = DotArray::new();
    assert_eq!(dots.last(), None);
    for i in 0..5 {
        dots.push(dot(i));
    }
    assert_eq!(dots.last(), Some(dot(4)));
    let xs: Vec<i16> = dots.iter().map(|d| d.x).collect();
    assert_eq!(xs, vec![0, 1, 2, 3, 4]);
}

// --- relayout ---

#[test]
fn relayout_rewrites_positions_from_indexes() {
    let mut path = ThreadPathArray::new();
    path.push(point(1));
    path.push(point(2));
    path.relayout(|ix, iy| (i32::from(ix) * 100, i32::from(iy) * 100));
    assert_eq!(path.positions_x(), &[100, 200]);
    assert_eq!(path.positions_y(), &[200, 300]);
    assert_eq!(path.visibility(), &[false, true]);
}
