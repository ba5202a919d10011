//! # Equal Time Area Core Library
//!
//! This library answers one question: given N people's locations, which area can
//! all of them reach within roughly the same travel time?
//!
//! ## Design Philosophy
//!
//! ### Rings, not raw isochrones
//! A provider hands back cumulative isochrones: the 30-minute polygon contains the
//! 20-minute one. Comparing those directly would say nothing about *when* someone
//! arrives, so each participant's stack is first cut into disjoint time rings
//! (area reachable within `t_hi` but not within `t_lo`). Rings from different
//! people are then matched by their midpoint time within a tolerance window.
//!
//! ### Stateless per request
//! Every geometry is a value owned by a single search. Nothing is cached and
//! nothing outlives the call that produced it; configuration is passed in
//! explicitly through [`search::SearchConfig`].
//!
//! ### Data Flow
//! 1. **Fetch**: one isochrone per participant at the current minute budget
//! 2. **Rings**: [`rings::build_time_rings`] turns each stack into a [`RingSet`]
//! 3. **Intersect**: [`intersect::intersect_rings_for_many`] finds the shared area
//! 4. **Iterate**: [`search::EqualTimeSearch`] grows the budget until found or capped
//!
//! ## Core Types
//! - [`Coordinate`]: a participant's origin
//! - [`Region`]: planar (multi-)polygon in lon/lat degrees
//! - [`Isochrone`]: one provider polygon for one duration
//! - [`TimeRing`] / [`RingSet`]: disjoint per-interval slices of an isochrone stack

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

// Module declarations
pub mod config;
pub mod geometry;
pub mod intersect;
pub mod provider;
pub mod render;
pub mod rings;
pub mod search;

/// Planar region, possibly multi-part. `x` is longitude and `y` is latitude.
pub type Region = MultiPolygon<f64>;

/// A participant's origin.
///
/// # Example
/// ```
/// use equal_time_lib::Coordinate;
///
/// let red_square = Coordinate::new(55.7539, 37.6208);
/// assert_eq!(red_square.lat, 55.7539);
/// assert_eq!(red_square.to_point().x(), 37.6208);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Planar point with longitude on the x axis.
    pub fn to_point(self) -> geo::Point<f64> {
        geo::Point::new(self.lon, self.lat)
    }
}

/// Area reachable from one origin within `duration_sec`.
#[derive(Clone, Debug)]
pub struct Isochrone {
    pub duration_sec: u32,
    pub region: Region,
}

impl Isochrone {
    pub fn new(duration_sec: u32, region: Region) -> Self {
        Self {
            duration_sec,
            region,
        }
    }
}

/// Area reachable within `interval.1` seconds but not within `interval.0`.
///
/// The first ring of a set has `interval.0 == 0` and holds the smallest
/// isochrone unchanged.
#[derive(Clone, Debug)]
pub struct TimeRing {
    /// `(t_lo, t_hi)` in seconds
    pub interval: (u32, u32),
    pub region: Region,
}

impl TimeRing {
    /// Representative travel time of the ring, in seconds.
    ///
    /// ```
    /// use equal_time_lib::TimeRing;
    /// use geo::MultiPolygon;
    ///
    /// let ring = TimeRing { interval: (0, 1200), region: MultiPolygon(vec![]) };
    /// assert_eq!(ring.midpoint_sec(), 600.0);
    /// ```
    pub fn midpoint_sec(&self) -> f64 {
        (f64::from(self.interval.0) + f64::from(self.interval.1)) / 2.0
    }
}

/// One participant's rings, sorted by `t_hi` ascending and pairwise disjoint.
pub type RingSet = Vec<TimeRing>;

/// Travel mode requested from the isochrone provider.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Walking,
    Driving,
    Bicycle,
    #[default]
    PublicTransport,
}

impl TransportMode {
    /// Wire name used by the provider API.
    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Walking => "walking",
            TransportMode::Driving => "driving",
            TransportMode::Bicycle => "bicycle",
            TransportMode::PublicTransport => "public_transport",
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
