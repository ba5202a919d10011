//! # Cross-Participant Intersection
//!
//! The first ring set is the reference. Each of its rings is intersected with
//! the tolerance-matched area of every other participant, and the surviving
//! pieces are unioned into the shared region.
//!
//! Every other participant is reduced to a *union* of its matching rings, so the
//! choice of reference does not change the resulting set.

use crate::geometry::is_empty;
use crate::rings::union_of_close_time_rings;
use crate::{Region, RingSet};
use geo::BooleanOps;
use log::debug;

/// Optional limits on which reference rings are considered, in minutes.
///
/// Compared against a ring's midpoint. Unset means unrestricted.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MinuteBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl MinuteBounds {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn contains(&self, minutes: f64) -> bool {
        self.min.map_or(true, |min| minutes >= min) && self.max.map_or(true, |max| minutes <= max)
    }
}

/// Shared region of every participant, or `None` when no reference ring survives.
///
/// A returned region is never empty.
pub fn intersect_rings_for_many(
    rings_list: &[RingSet],
    tolerance_minutes: u32,
    bounds: MinuteBounds,
) -> Option<Region> {
    let (reference, others) = rings_list.split_first()?;
    let tolerance_sec = f64::from(tolerance_minutes) * 60.0;
    let mut result: Option<Region> = None;

    for ring in reference {
        let t_mid = ring.midpoint_sec();
        if !bounds.contains(t_mid / 60.0) {
            continue;
        }

        let Some(shared) = narrow_to_others(&ring.region, others, t_mid, tolerance_sec) else {
            debug!(
                "reference ring {:?} has no shared area with the other participants",
                ring.interval
            );
            continue;
        };

        result = Some(match result {
            None => shared,
            Some(acc) => acc.union(&shared),
        });
    }

    result
}

/// Intersect `start` with each participant's matching rings in turn.
fn narrow_to_others(
    start: &Region,
    others: &[RingSet],
    t_mid: f64,
    tolerance_sec: f64,
) -> Option<Region> {
    let mut current = start.clone();
    for rings in others {
        let candidate = union_of_close_time_rings(rings, t_mid, tolerance_sec)?;
        current = current.intersection(&candidate);
        if is_empty(&current) {
            return None;
        }
    }
    if is_empty(&current) {
        None
    } else {
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::rect_region;
    use crate::rings::build_time_rings;
    use crate::{Isochrone, TimeRing};
    use geo::Area;

    fn single_ring(duration_sec: u32, min: (f64, f64), max: (f64, f64)) -> RingSet {
        build_time_rings(&[Isochrone::new(duration_sec, rect_region(min, max))])
    }

    #[test]
    fn two_overlapping_squares_share_their_overlap() {
        let rings = vec![
            single_ring(1200, (0.0, 0.0), (2.0, 2.0)),
            single_ring(1200, (1.0, 1.0), (3.0, 3.0)),
        ];

        let shared = intersect_rings_for_many(&rings, 10, MinuteBounds::unrestricted()).unwrap();
        assert!((shared.unsigned_area() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_squares_have_no_result() {
        let rings = vec![
            single_ring(1200, (0.0, 0.0), (1.0, 1.0)),
            single_ring(1200, (5.0, 5.0), (6.0, 6.0)),
        ];
        assert!(intersect_rings_for_many(&rings, 10, MinuteBounds::unrestricted()).is_none());
    }

    #[test]
    fn midpoints_outside_tolerance_do_not_match() {
        // Midpoints 600 s and 1500 s: 15 minutes apart
        let rings = vec![
            single_ring(1200, (0.0, 0.0), (2.0, 2.0)),
            vec![TimeRing {
                interval: (1200, 1800),
                region: rect_region((0.0, 0.0), (2.0, 2.0)),
            }],
        ];

        assert!(intersect_rings_for_many(&rings, 10, MinuteBounds::unrestricted()).is_none());
        assert!(intersect_rings_for_many(&rings, 15, MinuteBounds::unrestricted()).is_some());
    }

    #[test]
    fn single_participant_returns_own_rings() {
        let rings = vec![single_ring(1200, (0.0, 0.0), (2.0, 2.0))];
        let shared = intersect_rings_for_many(&rings, 0, MinuteBounds::unrestricted()).unwrap();
        assert!((shared.unsigned_area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn no_participants_is_none() {
        assert!(intersect_rings_for_many(&[], 10, MinuteBounds::unrestricted()).is_none());
    }

    #[test]
    fn bounds_filter_reference_rings() {
        let rings = vec![
            single_ring(1200, (0.0, 0.0), (2.0, 2.0)),
            single_ring(1200, (0.0, 0.0), (2.0, 2.0)),
        ];
        // Only ring has midpoint 10 minutes
        let above = MinuteBounds {
            min: Some(11.0),
            max: None,
        };
        let below = MinuteBounds {
            min: None,
            max: Some(9.0),
        };
        let around = MinuteBounds {
            min: Some(10.0),
            max: Some(10.0),
        };

        assert!(intersect_rings_for_many(&rings, 10, above).is_none());
        assert!(intersect_rings_for_many(&rings, 10, below).is_none());
        assert!(intersect_rings_for_many(&rings, 10, around).is_some());
    }

    #[test]
    fn surviving_reference_rings_are_unioned() {
        let stack = |h: f64| {
            vec![
                Isochrone::new(1200, rect_region((0.0, 0.0), (h, h))),
                Isochrone::new(1800, rect_region((0.0, 0.0), (2.0 * h, 2.0 * h))),
            ]
        };
        let rings = vec![build_time_rings(&stack(1.0)), build_time_rings(&stack(1.0))];

        // Tolerance 0: each reference ring only matches its twin, union covers everything
        let shared = intersect_rings_for_many(&rings, 0, MinuteBounds::unrestricted()).unwrap();
        assert!((shared.unsigned_area() - 4.0).abs() < 1e-9);
    }
}
