//! # Iterative Equal-Time Search
//!
//! Grows a single travel-time budget until every participant's isochrone
//! shares some area, or the configured cap is passed.
//!
//! ## State Machine
//! ```text
//!   SEARCHING ──intersection──▶ FOUND
//!      │  ▲
//!      │  └── no intersection: t += step
//!      └──── t > cap ─────────▶ EXHAUSTED
//! ```
//!
//! Each round asks the provider for one duration per participant, so every
//! participant contributes exactly one ring. The ring and tolerance machinery
//! still handles richer stacks should a provider return more.
//!
//! ## Failure Semantics
//! Any participant's provider failure aborts the whole search with a
//! [`SearchError`]; there is no partial geometry. Running out of budget is not
//! an error: it is [`SearchOutcome::NotFound`] with the full trace.

use crate::intersect::{intersect_rings_for_many, MinuteBounds};
use crate::provider::{IsochroneProvider, IsochroneRequest, ProviderError};
use crate::rings::build_time_rings;
use crate::{Coordinate, Region, RingSet, TransportMode};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Transport mode every search requests.
const SEARCH_TRANSPORT: TransportMode = TransportMode::PublicTransport;

/// Errors that abort a search.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Provider could not be reached or answered with a failure status
    #[error("isochrone provider unavailable for participant {participant}: {source}")]
    ProviderUnavailable {
        participant: usize,
        source: ProviderError,
    },

    /// Provider answered but gave nothing usable for this participant
    #[error("no usable isochrones for participant {participant}: {source}")]
    EmptyProviderResult {
        participant: usize,
        source: ProviderError,
    },

    /// Request rejected before any provider call
    #[error("invalid search request: {0}")]
    InvalidRequest(String),
}

impl SearchError {
    fn from_provider(participant: usize, source: ProviderError) -> Self {
        if source.is_empty_result() {
            SearchError::EmptyProviderResult {
                participant,
                source,
            }
        } else {
            SearchError::ProviderUnavailable {
                participant,
                source,
            }
        }
    }
}

/// Default search parameters and the minute cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// First budget tried, in minutes
    pub start_minutes: u32,
    /// Budget increase per round, in minutes
    pub step_minutes: u32,
    /// Midpoint tolerance, in minutes
    pub tolerance_minutes: u32,
    /// Largest budget ever tried; requests cannot raise it
    pub max_minutes_cap: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            start_minutes: 20,
            step_minutes: 10,
            tolerance_minutes: 10,
            max_minutes_cap: 40,
        }
    }
}

impl SearchConfig {
    /// Rounds a search starting at `start` with `step` runs before giving up.
    ///
    /// ```
    /// use equal_time_lib::search::SearchConfig;
    ///
    /// let config = SearchConfig::default(); // cap 40
    /// assert_eq!(config.max_attempts(20, 10), 3); // 20, 30, 40
    /// assert_eq!(config.max_attempts(50, 10), 0);
    /// ```
    pub fn max_attempts(&self, start: u32, step: u32) -> usize {
        if step == 0 || start > self.max_minutes_cap {
            return 0;
        }
        ((self.max_minutes_cap - start) / step) as usize + 1
    }
}

/// One search call: who is meeting and how to search.
///
/// Unset minute fields fall back to [`SearchConfig`].
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub people: Vec<Coordinate>,
    pub start_minutes: Option<u32>,
    pub step_minutes: Option<u32>,
    pub tolerance_minutes: Option<u32>,
    /// Departure time hint for the provider
    pub start_time: Option<DateTime<Utc>>,
    /// Polygon detail hint for the provider, 0..1
    pub detailing: Option<f64>,
}

impl SearchRequest {
    pub fn new(people: Vec<Coordinate>) -> Self {
        Self {
            people,
            ..Self::default()
        }
    }
}

/// Outcome tag of one round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    IntersectionFound,
    NoIntersectionRetry,
}

/// What one round tried and how it ended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub t_minutes: u32,
    pub durations_sec: Vec<u32>,
    pub status: AttemptStatus,
}

/// Every round of a search, in order, plus the fixed request flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchTrace {
    pub transport: TransportMode,
    pub reverse: bool,
    attempts: Vec<AttemptRecord>,
}

impl SearchTrace {
    fn new(transport: TransportMode, reverse: bool) -> Self {
        Self {
            transport,
            reverse,
            attempts: Vec::new(),
        }
    }

    fn record(&mut self, t_minutes: u32, durations_sec: Vec<u32>, status: AttemptStatus) {
        self.attempts.push(AttemptRecord {
            t_minutes,
            durations_sec,
            status,
        });
    }

    pub fn attempts(&self) -> &[AttemptRecord] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }
}

/// Where the search state machine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Searching,
    Found,
    Exhausted,
}

/// Terminal result of a search.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// Shared area found at budget `minutes`; never empty
    Found { region: Region, minutes: u32 },
    /// Cap passed without any shared area
    NotFound,
}

/// Outcome plus the trace explaining it.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub trace: SearchTrace,
}

impl SearchReport {
    pub fn state(&self) -> SearchState {
        match self.outcome {
            SearchOutcome::Found { .. } => SearchState::Found,
            SearchOutcome::NotFound => SearchState::Exhausted,
        }
    }

    pub fn region(&self) -> Option<&Region> {
        match &self.outcome {
            SearchOutcome::Found { region, .. } => Some(region),
            SearchOutcome::NotFound => None,
        }
    }

    pub fn into_region(self) -> Option<Region> {
        match self.outcome {
            SearchOutcome::Found { region, .. } => Some(region),
            SearchOutcome::NotFound => None,
        }
    }
}

/// Search driver bound to one provider and one configuration.
pub struct EqualTimeSearch<P> {
    provider: P,
    config: SearchConfig,
}

impl<P: IsochroneProvider> EqualTimeSearch<P> {
    pub fn new(provider: P, config: SearchConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run the search to `FOUND` or `EXHAUSTED`.
    pub async fn run(&self, request: &SearchRequest) -> Result<SearchReport, SearchError> {
        if request.people.len() < 2 {
            return Err(SearchError::InvalidRequest(format!(
                "at least 2 participants required, got {}",
                request.people.len()
            )));
        }
        let start = request.start_minutes.unwrap_or(self.config.start_minutes);
        let step = request.step_minutes.unwrap_or(self.config.step_minutes);
        let tolerance = request
            .tolerance_minutes
            .unwrap_or(self.config.tolerance_minutes);
        if step == 0 {
            return Err(SearchError::InvalidRequest(
                "step_minutes must be positive".to_string(),
            ));
        }

        let cap = self.config.max_minutes_cap;
        let mut trace = SearchTrace::new(SEARCH_TRANSPORT, false);
        let mut state = SearchState::Searching;
        let mut current_t = start;
        debug!(
            "searching {} participants from {start} min, step {step}, cap {cap}, tol {tolerance}",
            request.people.len()
        );

        while state == SearchState::Searching {
            if current_t > cap {
                state = SearchState::Exhausted;
                continue;
            }

            let durations = vec![current_t.saturating_mul(60)];
            let iso_request = IsochroneRequest {
                transport: SEARCH_TRANSPORT,
                start_time: request.start_time,
                detailing: request.detailing,
                ..IsochroneRequest::new(durations.clone())
            };
            let ring_sets = self.fetch_ring_sets(&request.people, &iso_request).await?;

            match intersect_rings_for_many(&ring_sets, tolerance, MinuteBounds::unrestricted()) {
                Some(region) => {
                    trace.record(current_t, durations, AttemptStatus::IntersectionFound);
                    info!("{current_t} min: intersection found");
                    return Ok(SearchReport {
                        outcome: SearchOutcome::Found {
                            region,
                            minutes: current_t,
                        },
                        trace,
                    });
                }
                None => {
                    trace.record(current_t, durations, AttemptStatus::NoIntersectionRetry);
                    info!("{current_t} min: no intersection, retrying");
                    match current_t.checked_add(step) {
                        Some(next) => current_t = next,
                        None => state = SearchState::Exhausted,
                    }
                }
            }
        }

        info!(
            "no shared area within {cap} min after {} attempts",
            trace.len()
        );
        Ok(SearchReport {
            outcome: SearchOutcome::NotFound,
            trace,
        })
    }

    /// One ring set per participant, in input order. Calls run concurrently;
    /// the first failure fails the round.
    async fn fetch_ring_sets(
        &self,
        people: &[Coordinate],
        request: &IsochroneRequest,
    ) -> Result<Vec<RingSet>, SearchError> {
        let calls = people.iter().enumerate().map(|(participant, &origin)| async move {
            debug!(
                "participant {participant}: requesting {:?}s from ({}, {})",
                request.durations_sec, origin.lat, origin.lon
            );
            let stack = self
                .provider
                .isochrones(origin, request)
                .await
                .map_err(|source| SearchError::from_provider(participant, source))?;

            // Refuse to go on without usable geometry, whatever the provider claims
            if stack.is_empty() || stack.has_no_area() {
                return Err(SearchError::EmptyProviderResult {
                    participant,
                    source: ProviderError::Empty,
                });
            }
            Ok(build_time_rings(&stack.into_isochrones()))
        });

        try_join_all(calls).await
    }
}
