//! Property-based tests for ring building and the tolerance unifier.
//!
//! These tests verify:
//! - rings of a nested isochrone stack never overlap
//! - the union of all rings covers the largest isochrone
//! - intervals are contiguous and ascending
//! - participant order never changes the shared region

use equal_time_lib::geometry::{rect_region, union_all};
use equal_time_lib::intersect::{intersect_rings_for_many, MinuteBounds};
use equal_time_lib::rings::build_time_rings;
use equal_time_lib::Isochrone;
use geo::{Area, BooleanOps};
use proptest::prelude::*;

mod helpers;
use helpers::same_area;

/// Nested rectangles: each step pushes every side out by a non-negative amount.
fn nested_stack() -> impl Strategy<Value = Vec<Isochrone>> {
    (
        (1.0f64..5.0, 1.0f64..5.0),
        prop::collection::vec((0.0f64..2.0, 0.0f64..2.0, 0.0f64..2.0, 0.0f64..2.0), 0..5),
    )
        .prop_map(|((w, h), growth)| {
            let (mut x0, mut y0, mut x1, mut y1) = (0.0, 0.0, w, h);
            let mut stack = vec![Isochrone::new(600, rect_region((x0, y0), (x1, y1)))];
            for (i, (left, down, right, up)) in growth.into_iter().enumerate() {
                x0 -= left;
                y0 -= down;
                x1 += right;
                y1 += up;
                let duration = 600 * (i as u32 + 2);
                stack.push(Isochrone::new(duration, rect_region((x0, y0), (x1, y1))));
            }
            stack
        })
}

proptest! {
    #[test]
    fn rings_never_overlap(stack in nested_stack()) {
        let rings = build_time_rings(&stack);
        for (i, a) in rings.iter().enumerate() {
            for b in &rings[i + 1..] {
                let overlap = a.region.intersection(&b.region).unsigned_area();
                prop_assert!(
                    overlap < 1e-9,
                    "rings {:?} and {:?} overlap by {}",
                    a.interval,
                    b.interval,
                    overlap
                );
            }
        }
    }

    #[test]
    fn rings_cover_largest_isochrone(stack in nested_stack()) {
        let rings = build_time_rings(&stack);
        let covered = union_all(rings.iter().map(|r| r.region.clone())).unwrap();
        let largest = &stack.last().unwrap().region;
        prop_assert!(same_area(&covered, largest, 1e-6));
    }

    #[test]
    fn ring_intervals_ascend_without_gaps_in_upper_bounds(stack in nested_stack()) {
        let rings = build_time_rings(&stack);
        prop_assert_eq!(rings[0].interval.0, 0);
        for pair in rings.windows(2) {
            prop_assert!(pair[0].interval.1 <= pair[1].interval.0);
            prop_assert!(pair[1].interval.0 < pair[1].interval.1);
        }
    }

    #[test]
    fn shared_region_ignores_participant_order(
        a in nested_stack(),
        b in nested_stack(),
        tolerance in 0u32..30,
    ) {
        let ab = vec![build_time_rings(&a), build_time_rings(&b)];
        let ba = vec![build_time_rings(&b), build_time_rings(&a)];

        let forward = intersect_rings_for_many(&ab, tolerance, MinuteBounds::unrestricted());
        let backward = intersect_rings_for_many(&ba, tolerance, MinuteBounds::unrestricted());

        match (forward, backward) {
            (None, None) => {}
            (Some(f), Some(g)) => prop_assert!(same_area(&f, &g, 1e-6)),
            (f, g) => prop_assert!(
                f.map_or(0.0, |r| r.unsigned_area()) < 1e-6
                    && g.map_or(0.0, |r| r.unsigned_area()) < 1e-6
            ),
        }
    }
}
