//! TfL Unified API client
//!
//! Fetches the raw stop, route and route-sequence documents the importer
//! converts. Requests are rate limited (token bucket) and carry the
//! `app_id` / `app_key` credentials when configured.

use crate::error::{LinkerError, LinkerResult};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::num::NonZeroU32;
use std::time::Duration;

/// Default API root
pub const DEFAULT_API_BASE: &str = "https://api.tfl.gov.uk";

const USER_AGENT: &str = concat!("announce-linker/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const SERVICE_TYPES: &str = "Regular,Night";

// Keyed TfL access allows 500 requests per minute
const REQUESTS_PER_SECOND: NonZeroU32 = match NonZeroU32::new(8) {
    Some(n) => n,
    None => panic!("rate must be non-zero"),
};

/// Source of raw upstream transit documents
#[async_trait]
pub trait TransitSource: Send + Sync {
    /// One page (1-based) of bus stop points
    async fn stop_points_page(&self, page: u32) -> LinkerResult<Value>;

    /// Every bus line, with its route sections
    async fn bus_routes(&self) -> LinkerResult<Vec<Value>>;

    /// Stop sequence of one line direction
    async fn route_sequence(&self, route_id: &str, direction: &str) -> LinkerResult<Value>;
}

/// Connection settings for [`TflClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TflSettings {
    pub api_base: String,
    pub app_id: Option<String>,
    pub app_key: Option<String>,
}

impl Default for TflSettings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            app_id: None,
            app_key: None,
        }
    }
}

/// HTTP client for the TfL Unified API
pub struct TflClient {
    client: Client,
    settings: TflSettings,
    rate_limiter: RateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TflClient {
    pub fn new(settings: TflSettings) -> LinkerResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LinkerError::Api(format!("Failed to build HTTP client: {}", e)))?;

        if settings.app_key.is_none() {
            tracing::warn!("No TfL app key configured; anonymous requests are heavily throttled");
        }

        Ok(Self {
            client,
            settings,
            rate_limiter: RateLimiter::direct(Quota::per_second(REQUESTS_PER_SECOND)),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.api_base.trim_end_matches('/'), path)
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> LinkerResult<Value> {
        self.rate_limiter.until_ready().await;

        let url = self.url(path);
        tracing::debug!(url = %url, "Querying TfL API");

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(params);
        if let Some(app_id) = &self.settings.app_id {
            request = request.query(&[("app_id", app_id)]);
        }
        if let Some(app_key) = &self.settings.app_key {
            request = request.query(&[("app_key", app_key)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LinkerError::Api(format!("GET {} failed: {}", path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LinkerError::Api(format!(
                "GET {} returned {}: {}",
                path, status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| LinkerError::Api(format!("Invalid JSON from {}: {}", path, e)))
    }
}

#[async_trait]
impl TransitSource for TflClient {
    async fn stop_points_page(&self, page: u32) -> LinkerResult<Value> {
        let page = page.to_string();
        self.get_json("StopPoint/Mode/bus", &[("page", page.as_str())])
            .await
    }

    async fn bus_routes(&self) -> LinkerResult<Vec<Value>> {
        let lines = self
            .get_json("Line/Route", &[("serviceTypes", SERVICE_TYPES)])
            .await?;

        let Value::Array(lines) = lines else {
            return Err(LinkerError::Api(
                "Line/Route did not return an array".to_string(),
            ));
        };

        Ok(lines.into_iter().filter(is_bus_line).collect())
    }

    async fn route_sequence(&self, route_id: &str, direction: &str) -> LinkerResult<Value> {
        let path = format!("Line/{}/Route/Sequence/{}", route_id, direction);
        self.get_json(
            &path,
            &[("serviceTypes", SERVICE_TYPES), ("excludeCrowding", "true")],
        )
        .await
    }
}

fn is_bus_line(line: &Value) -> bool {
    line.get("modeName").and_then(Value::as_str) == Some("bus")
}
