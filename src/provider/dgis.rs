//! # 2GIS Isochrone Client
//!
//! HTTP implementation of [`IsochroneProvider`] against the 2GIS Isochrone API.
//!
//! ## Request Pipeline
//! 1. **Batch**: durations are deduplicated, sorted and split into groups of at
//!    most `max_durations_per_call`
//! 2. **Post**: one JSON POST per batch, WKT geometry requested
//! 3. **Retry**: 502/503/504 and transport failures are retried with
//!    exponential backoff, everything else fails immediately
//! 4. **Merge**: every batch is folded into one [`IsochroneStack`]; a duration
//!    reported twice has its polygons unioned
//!
//! ## Wire Format
//! ```json
//! {"status": "OK", "isochrones": [{"duration": 1200, "geometry": "POLYGON((...))"}]}
//! ```

use super::{batch_durations, IsochroneProvider, IsochroneRequest, IsochroneStack, ProviderError};
use crate::config::ProviderConfig;
use crate::geometry::region_from_geometry;
use crate::{Coordinate, TransportMode};
use async_trait::async_trait;
use chrono::SecondsFormat;
use geo::Geometry;
use log::{debug, warn};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use wkt::TryFromWkt;

/// HTTP statuses worth another attempt.
const RETRY_STATUSES: [u16; 3] = [502, 503, 504];

/// 2GIS Isochrone API client.
///
/// Cheap to share across participants: the underlying `reqwest::Client`
/// pools connections per host.
pub struct DgisClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    max_durations_per_call: usize,
    retry_total: u32,
    retry_backoff: Duration,
}

impl DgisClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_sec))
            .pool_max_idle_per_host(config.pool_size)
            .build()?;
        let retry_backoff = Duration::try_from_secs_f64(config.retry_backoff_sec.max(0.0))
            .map_err(|e| {
                ProviderError::InvalidConfig(format!(
                    "retry_backoff_sec = {}: {e}",
                    config.retry_backoff_sec
                ))
            })?;

        Ok(Self {
            http,
            url: config.isochrone_url.clone(),
            api_key: config.api_key.clone(),
            max_durations_per_call: config.max_durations_per_call,
            retry_total: config.retry_total,
            retry_backoff,
        })
    }

    /// POST one batch, retrying transient failures. Returns the raw body.
    async fn post_batch(&self, payload: &IsochronePayload<'_>) -> Result<String, ProviderError> {
        let mut attempt: u32 = 0;
        loop {
            let sent = self
                .http
                .post(&self.url)
                .query(&[("key", self.api_key.as_str())])
                .json(payload)
                .send()
                .await;

            let failure = match sent {
                Ok(response) if response.status() == StatusCode::OK => {
                    return Ok(response.text().await?);
                }
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.text().await.unwrap_or_default();
                    if !RETRY_STATUSES.contains(&status) {
                        return Err(ProviderError::Status { status, body });
                    }
                    ProviderError::Status { status, body }
                }
                Err(err) if err.is_builder() => return Err(err.into()),
                Err(err) => err.into(),
            };

            if attempt >= self.retry_total {
                return Err(failure);
            }
            let delay = backoff_delay(self.retry_backoff, attempt);
            attempt += 1;
            warn!(
                "isochrone call failed ({failure}), retry {attempt}/{} in {:?}",
                self.retry_total, delay
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl IsochroneProvider for DgisClient {
    async fn isochrones(
        &self,
        origin: Coordinate,
        request: &IsochroneRequest,
    ) -> Result<IsochroneStack, ProviderError> {
        let start_time = request
            .start_time
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true));
        let mut stack = IsochroneStack::new();

        for batch in batch_durations(&request.durations_sec, self.max_durations_per_call) {
            let payload = IsochronePayload {
                durations: &batch,
                start: StartPoint {
                    lat: origin.lat,
                    lon: origin.lon,
                },
                transport: request.transport,
                reverse: request.reverse,
                format: "wkt",
                start_time: start_time.as_deref(),
                detailing: request.detailing,
            };

            debug!(
                "requesting isochrones {:?}s from ({}, {})",
                batch, origin.lat, origin.lon
            );
            let body = self.post_batch(&payload).await?;
            stack.extend(parse_response(&body)?);
        }

        if stack.is_empty() {
            return Err(ProviderError::Empty);
        }
        Ok(stack)
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`.
pub(crate) fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

#[derive(Debug, Serialize)]
struct StartPoint {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Serialize)]
struct IsochronePayload<'a> {
    durations: &'a [u32],
    start: StartPoint,
    transport: TransportMode,
    reverse: bool,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_time: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detailing: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct IsochroneResponse {
    status: Option<String>,
    isochrones: Option<Vec<IsochroneItem>>,
}

#[derive(Debug, Deserialize)]
struct IsochroneItem {
    duration: f64,
    geometry: Option<String>,
}

/// Decode one response body into a stack.
///
/// Items without geometry are skipped. The stack may come back empty; the
/// caller decides whether that is fatal.
fn parse_response(body: &str) -> Result<IsochroneStack, ProviderError> {
    let response: IsochroneResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::Malformed(e.to_string()))?;

    let items = match (response.status.as_deref(), response.isochrones) {
        (Some("OK"), Some(items)) => items,
        _ => return Err(ProviderError::Rejected(body.to_string())),
    };

    let mut stack = IsochroneStack::new();
    for item in items {
        let Some(text) = item.geometry.as_deref().filter(|g| !g.trim().is_empty()) else {
            continue;
        };
        if !item.duration.is_finite() || item.duration < 0.0 || item.duration > f64::from(u32::MAX)
        {
            return Err(ProviderError::Malformed(format!(
                "invalid duration {}",
                item.duration
            )));
        }

        let geometry = Geometry::<f64>::try_from_wkt_str(text)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;
        let region = region_from_geometry(geometry).ok_or_else(|| {
            ProviderError::Malformed(format!(
                "isochrone for {}s has no polygon",
                item.duration
            ))
        })?;

        stack.merge(item.duration as u32, region);
    }
    Ok(stack)
}
