//! # Isochrone Providers
//!
//! The search engine only sees [`IsochroneProvider`]: give it an origin and a
//! set of durations, get back an [`IsochroneStack`] sorted by duration. The
//! HTTP implementation lives in [`dgis`].
//!
//! ## Error Classes
//! A failed call is either *unavailable* (transport or HTTP status) or an
//! *empty result* (the service answered but produced nothing usable). The
//! search driver reports the two differently, see [`ProviderError::is_empty_result`].

use crate::geometry::is_empty;
use crate::{Coordinate, Isochrone, Region, TransportMode};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use geo::BooleanOps;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod dgis;

pub use dgis::DgisClient;

/// Errors raised while fetching isochrones for a single origin.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// HTTP request failed (connect, timeout, body decode)
    #[error("isochrone request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success HTTP status
    #[error("isochrone API HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Service answered but refused to build isochrones
    #[error("isochrone API rejected the request: {0}")]
    Rejected(String),

    /// Response could not be decoded into durations and polygons
    #[error("malformed isochrone response: {0}")]
    Malformed(String),

    /// Service answered with no usable isochrone at all
    #[error("provider returned no isochrones; check coordinates, transport and start time")]
    Empty,

    /// Provider settings cannot be turned into a working client
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    /// True for answers that arrived but carried nothing usable.
    pub fn is_empty_result(&self) -> bool {
        matches!(
            self,
            ProviderError::Rejected(_) | ProviderError::Malformed(_) | ProviderError::Empty
        )
    }
}

/// Parameters shared by every participant's call within one search round.
#[derive(Clone, Debug, PartialEq)]
pub struct IsochroneRequest {
    /// Requested durations in seconds
    pub durations_sec: Vec<u32>,
    pub transport: TransportMode,
    /// `false`: reachable *from* the origin; `true`: reaching *to* it
    pub reverse: bool,
    pub start_time: Option<DateTime<Utc>>,
    /// Polygon detail level, 0..1
    pub detailing: Option<f64>,
}

impl IsochroneRequest {
    pub fn new(durations_sec: Vec<u32>) -> Self {
        Self {
            durations_sec,
            transport: TransportMode::PublicTransport,
            reverse: false,
            start_time: None,
            detailing: None,
        }
    }
}

/// Source of isochrones for one origin.
///
/// Implementations must return an error rather than an empty stack, and
/// must merge chunked responses with [`IsochroneStack::merge`].
#[async_trait]
pub trait IsochroneProvider: Send + Sync {
    async fn isochrones(
        &self,
        origin: Coordinate,
        request: &IsochroneRequest,
    ) -> Result<IsochroneStack, ProviderError>;
}

/// Isochrones keyed by duration, kept in ascending order.
///
/// Inserting a duration that is already present unions the two regions.
#[derive(Clone, Debug, Default)]
pub struct IsochroneStack {
    by_duration: BTreeMap<u32, Region>,
}

impl IsochroneStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a region for `duration_sec`, unioning with any region already stored.
    pub fn merge(&mut self, duration_sec: u32, region: Region) {
        match self.by_duration.get_mut(&duration_sec) {
            Some(existing) => *existing = existing.union(&region),
            None => {
                self.by_duration.insert(duration_sec, region);
            }
        }
    }

    /// Merge every entry of `other` into `self`.
    pub fn extend(&mut self, other: IsochroneStack) {
        for (duration_sec, region) in other.by_duration {
            self.merge(duration_sec, region);
        }
    }

    pub fn len(&self) -> usize {
        self.by_duration.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_duration.is_empty()
    }

    /// True when no stored region has any area.
    pub fn has_no_area(&self) -> bool {
        self.by_duration.values().all(is_empty)
    }

    pub fn durations(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_duration.keys().copied()
    }

    /// Ascending isochrones, ready for ring building.
    pub fn into_isochrones(self) -> Vec<Isochrone> {
        self.by_duration
            .into_iter()
            .map(|(duration_sec, region)| Isochrone::new(duration_sec, region))
            .collect()
    }
}

impl FromIterator<(u32, Region)> for IsochroneStack {
    fn from_iter<I: IntoIterator<Item = (u32, Region)>>(iter: I) -> Self {
        let mut stack = IsochroneStack::new();
        for (duration_sec, region) in iter {
            stack.merge(duration_sec, region);
        }
        stack
    }
}

/// Deduplicate and sort durations, then split into batches of at most `max_per_call`.
///
/// A `max_per_call` of zero is treated as one.
pub fn batch_durations(durations_sec: &[u32], max_per_call: usize) -> Vec<Vec<u32>> {
    let mut unique = durations_sec.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
        .chunks(max_per_call.max(1))
        .map(<[u32]>::to_vec)
        .collect()
}
