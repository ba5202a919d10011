//! Shared test helpers: a scripted isochrone provider and planar shapes.

#![allow(dead_code)]

use async_trait::async_trait;
use equal_time_lib::provider::{IsochroneProvider, IsochroneRequest, IsochroneStack, ProviderError};
use equal_time_lib::{Coordinate, Region};
use geo::{Area, BooleanOps, MultiPolygon, Polygon};
use std::sync::{Arc, Mutex};

/// Every call a [`ScriptedProvider`] received, in order.
pub type CallLog = Arc<Mutex<Vec<(Coordinate, IsochroneRequest)>>>;

/// Provider whose answer is a pure function of origin and requested minutes.
pub struct ScriptedProvider<F> {
    answer: F,
    log: CallLog,
}

impl<F> ScriptedProvider<F>
where
    F: Fn(Coordinate, u32) -> Result<Region, ProviderError> + Send + Sync,
{
    pub fn new(answer: F) -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                answer,
                log: Arc::clone(&log),
            },
            log,
        )
    }
}

#[async_trait]
impl<F> IsochroneProvider for ScriptedProvider<F>
where
    F: Fn(Coordinate, u32) -> Result<Region, ProviderError> + Send + Sync,
{
    async fn isochrones(
        &self,
        origin: Coordinate,
        request: &IsochroneRequest,
    ) -> Result<IsochroneStack, ProviderError> {
        self.log.lock().unwrap().push((origin, request.clone()));

        let mut stack = IsochroneStack::new();
        for &duration_sec in &request.durations_sec {
            let region = (self.answer)(origin, duration_sec / 60)?;
            stack.merge(duration_sec, region);
        }
        Ok(stack)
    }
}

/// Closed polygon from a list of `(x, y)` vertices.
pub fn polygon_region(vertices: &[(f64, f64)]) -> Region {
    MultiPolygon(vec![Polygon::new(vertices.to_vec().into(), vec![])])
}

/// Axis-aligned square centered on `(cx, cy)`.
pub fn square(cx: f64, cy: f64, half: f64) -> Region {
    equal_time_lib::geometry::rect_region((cx - half, cy - half), (cx + half, cy + half))
}

/// True when the two regions cover the same area up to `eps`.
pub fn same_area(a: &Region, b: &Region, eps: f64) -> bool {
    a.xor(b).unsigned_area() <= eps
}

/// Participants laid out along the x axis, identified by longitude.
pub fn people_on_x_axis(xs: &[f64]) -> Vec<Coordinate> {
    xs.iter().map(|&x| Coordinate::new(0.0, x)).collect()
}
