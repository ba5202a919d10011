//! # Time Rings
//!
//! Turns one participant's cumulative isochrone stack into disjoint time rings,
//! and merges the rings whose midpoint lands close to a target time.
//!
//! ```text
//!   isochrones:  [ 20 min ]  ⊂  [   30 min   ]  ⊂  [      40 min      ]
//!   rings:       (0,1200)      (1200,1800)         (1800,2400)
//!                = 20 min       = 30 min − 20 min   = 40 min − 30 min
//! ```

use crate::geometry::{is_empty, union_all};
use crate::{Isochrone, Region, RingSet, TimeRing};
use geo::BooleanOps;

/// Cut an ascending isochrone stack into disjoint time rings.
///
/// The first isochrone becomes ring `(0, d)` as is. Every later isochrone
/// contributes `current − previous` over `(previous_d, d)`; when that
/// difference is empty the interval is skipped.
///
/// Input must be sorted by duration ascending. Nothing here sorts or checks it.
pub fn build_time_rings(isochrones: &[Isochrone]) -> RingSet {
    let mut rings = Vec::with_capacity(isochrones.len());
    let mut prev: Option<(u32, &Region)> = None;

    for iso in isochrones {
        match prev {
            None => rings.push(TimeRing {
                interval: (0, iso.duration_sec),
                region: iso.region.clone(),
            }),
            Some((prev_t, prev_region)) => {
                let diff = iso.region.difference(prev_region);
                if !is_empty(&diff) {
                    rings.push(TimeRing {
                        interval: (prev_t, iso.duration_sec),
                        region: diff,
                    });
                }
            }
        }
        prev = Some((iso.duration_sec, &iso.region));
    }

    rings
}

/// Union of every ring whose midpoint is within `tolerance_sec` of `target_mid_sec`.
///
/// Returns `None` when no ring qualifies.
pub fn union_of_close_time_rings(
    rings: &[TimeRing],
    target_mid_sec: f64,
    tolerance_sec: f64,
) -> Option<Region> {
    union_all(
        rings
            .iter()
            .filter(|ring| (ring.midpoint_sec() - target_mid_sec).abs() <= tolerance_sec)
            .map(|ring| ring.region.clone()),
    )
}
