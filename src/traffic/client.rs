//! Traffic API client.

use std::time::Duration;

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use tracing::{debug, error, info, instrument, warn};

use crate::error::TrafficError;

use super::normalize;
use super::transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
use super::types::{
    City, EvaluationStatus, HistoricalQuery, ListAllParams, Page, PageParams, Road,
    TrafficRecord, TrafficStats, DEFAULT_HISTORICAL_SIZE, DEFAULT_LIST_SIZE,
    DEFAULT_OVERVIEW_SIZE, DEFAULT_ROAD_SIZE, DEFAULT_SORT_BY,
};

/// Longest time range `get_historical` accepts.
pub const MAX_HISTORICAL_RANGE: time::Duration = time::Duration::days(30);

/// Per-client configuration. Each client owns its own copy; there is no
/// process-wide state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL including the `/api` prefix.
    pub base_url: String,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// Log each outgoing request at info level.
    pub log_requests: bool,
    /// Log each response status at info level.
    pub log_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_secs(10),
            log_requests: true,
            log_responses: true,
        }
    }
}

/// Typed client for the traffic REST API.
#[derive(Debug, Clone)]
pub struct TrafficClient<T = HttpTransport> {
    config: ClientConfig,
    transport: T,
}

impl TrafficClient<HttpTransport> {
    /// Create a client that talks HTTP to `config.base_url`.
    pub fn new(config: ClientConfig) -> Result<Self, TrafficError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self { config, transport })
    }
}

impl<T: Transport> TrafficClient<T> {
    /// Create a client over an arbitrary transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the transport reference.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// List the latest record of every road, paginated and sorted.
    #[instrument(skip(self))]
    pub async fn list_all(
        &self,
        params: ListAllParams,
    ) -> Result<Page<TrafficRecord>, TrafficError> {
        let (page, size) = PageParams {
            page: params.page,
            size: params.size,
        }
        .resolve(DEFAULT_LIST_SIZE)
        .map_err(|e| self.rejected(e))?;
        let sort_by = params
            .sort_by
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SORT_BY.to_string());
        let sort_dir = params.sort_dir.unwrap_or_default();

        let request = ApiRequest::new(["traffic"])
            .param("page", page)
            .param("size", size)
            .param("sortBy", sort_by)
            .param("sortDir", sort_dir);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::page_from_body(body, page, size))
    }

    /// List records for a city.
    #[instrument(skip(self))]
    pub async fn list_by_city(
        &self,
        city: &str,
        params: PageParams,
    ) -> Result<Page<TrafficRecord>, TrafficError> {
        let city = required("city", city)?;
        let (page, size) = params
            .resolve(DEFAULT_LIST_SIZE)
            .map_err(|e| self.rejected(e))?;

        let request = ApiRequest::new(["traffic", "city", city])
            .param("page", page)
            .param("size", size);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::page_from_body(body, page, size))
    }

    /// List records for a road within a city.
    #[instrument(skip(self))]
    pub async fn list_by_road_and_city(
        &self,
        road_name: &str,
        city: &str,
        params: PageParams,
    ) -> Result<Page<TrafficRecord>, TrafficError> {
        let road_name = required("road name", road_name)?;
        let city = required("city", city)?;
        let (page, size) = params
            .resolve(DEFAULT_ROAD_SIZE)
            .map_err(|e| self.rejected(e))?;

        let request = ApiRequest::new(["traffic", "road", road_name, "city", city])
            .param("page", page)
            .param("size", size);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::page_from_body(body, page, size))
    }

    /// List records with the given evaluation status (0-4).
    #[instrument(skip(self))]
    pub async fn list_by_status(&self, status: u8) -> Result<Vec<TrafficRecord>, TrafficError> {
        let status =
            EvaluationStatus::try_from(i64::from(status)).map_err(|e| self.rejected(e))?;

        let code = status.code().to_string();
        let request = ApiRequest::new(["traffic", "status", code.as_str()]);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::records_from_body(body))
    }

    /// Keyword search. An empty keyword is passed through.
    #[instrument(skip(self))]
    pub async fn search(&self, keyword: &str) -> Result<Vec<TrafficRecord>, TrafficError> {
        let request = ApiRequest::new(["traffic", "search"]).param("keyword", keyword);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::records_from_body(body))
    }

    /// Aggregate statistics.
    #[instrument(skip(self))]
    pub async fn get_stats(&self) -> Result<TrafficStats, TrafficError> {
        let request = ApiRequest::new(["traffic", "stats"]);

        let body = self.fetch(&request).await?;
        let stats = match body {
            Value::Null => Ok(TrafficStats::default()),
            other => serde_json::from_value(other)
                .map_err(|e| TrafficError::InvalidResponse(format!("malformed stats: {}", e))),
        };
        self.decode(&request, stats)
    }

    /// Single record by id.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: u64) -> Result<TrafficRecord, TrafficError> {
        if id == 0 {
            return Err(self.reject("id must be a positive integer"));
        }

        let id = id.to_string();
        let request = ApiRequest::new(["traffic", id.as_str()]);

        let body = self.fetch(&request).await?;
        if body.is_null() {
            let err = TrafficError::NotFound;
            self.log_failure(&request, &err);
            return Err(err);
        }
        self.decode(&request, normalize::record_from_value(body))
    }

    /// Landing-page summary, paginated.
    #[instrument(skip(self))]
    pub async fn get_overview(
        &self,
        params: PageParams,
    ) -> Result<Page<TrafficRecord>, TrafficError> {
        let (page, size) = params
            .resolve(DEFAULT_OVERVIEW_SIZE)
            .map_err(|e| self.rejected(e))?;

        let request = ApiRequest::new(["traffic", "overview"])
            .param("page", page)
            .param("size", size);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::page_from_body(body, page, size))
    }

    /// Records ranked by popularity (server-defined).
    #[instrument(skip(self))]
    pub async fn get_popular(&self) -> Result<Vec<TrafficRecord>, TrafficError> {
        let request = ApiRequest::new(["traffic", "popular"]);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::records_from_body(body))
    }

    /// Records for a road within `[start_time, end_time]`.
    ///
    /// Road, city and both bounds are checked before any request is made.
    #[instrument(skip(self))]
    pub async fn get_historical(
        &self,
        query: HistoricalQuery,
    ) -> Result<Vec<TrafficRecord>, TrafficError> {
        let (road_name, city) = match (
            non_empty(query.road_name.as_deref()),
            non_empty(query.city.as_deref()),
        ) {
            (Some(road), Some(city)) => (road, city),
            _ => return Err(self.reject("road name and city must not be empty")),
        };
        let (start_time, end_time) = match (
            non_empty(query.start_time.as_deref()),
            non_empty(query.end_time.as_deref()),
        ) {
            (Some(start), Some(end)) => (start, end),
            _ => return Err(self.reject("start time and end time must not be empty")),
        };
        check_time_range(start_time, end_time).map_err(|e| self.rejected(e))?;
        let (page, size) = PageParams {
            page: query.page,
            size: query.size,
        }
        .resolve(DEFAULT_HISTORICAL_SIZE)
        .map_err(|e| self.rejected(e))?;

        let request = ApiRequest::new(["traffic", "historical"])
            .param("roadName", road_name)
            .param("city", city)
            .param("startTime", start_time)
            .param("endTime", end_time)
            .param("page", page)
            .param("size", size);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::records_from_body(body))
    }

    /// Roads known for a city; empty when the backend has none.
    #[instrument(skip(self))]
    pub async fn list_roads_by_city(&self, city: &str) -> Result<Vec<Road>, TrafficError> {
        let city = required("city", city)?;

        let request = ApiRequest::new(["traffic", "cities", city, "roads"]);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::roads_from_body(body, city))
    }

    /// Cities the backend has data for; empty when none.
    #[instrument(skip(self))]
    pub async fn list_supported_cities(&self) -> Result<Vec<City>, TrafficError> {
        let request = ApiRequest::new(["traffic", "cities"]);

        let body = self.fetch(&request).await?;
        self.decode(&request, normalize::cities_from_body(body))
    }

    /// Send a request and return the JSON body of a 2xx response.
    ///
    /// An empty body decodes as `null`.
    async fn fetch(&self, request: &ApiRequest) -> Result<Value, TrafficError> {
        if self.config.log_requests {
            info!(endpoint = %request.path(), query = ?request.query, "API request");
        }

        let response = match self.transport.get(request).await {
            Ok(response) => response,
            Err(err) => {
                self.log_failure(request, &err);
                return Err(err);
            }
        };

        if self.config.log_responses {
            info!(endpoint = %request.path(), status = response.status, "API response");
        }

        if !response.is_success() {
            let err = TrafficError::from_status(response.status, &response.body);
            debug!(status = response.status, body = %response.body, "Error response body");
            self.log_failure(request, &err);
            return Err(err);
        }

        parse_body(&response).map_err(|err| {
            self.log_failure(request, &err);
            err
        })
    }

    /// Log a decode failure with request context before returning it.
    fn decode<R>(
        &self,
        request: &ApiRequest,
        result: Result<R, TrafficError>,
    ) -> Result<R, TrafficError> {
        result.map_err(|err| {
            self.log_failure(request, &err);
            err
        })
    }

    fn reject(&self, message: &str) -> TrafficError {
        self.rejected(TrafficError::validation(message))
    }

    fn rejected(&self, err: TrafficError) -> TrafficError {
        warn!(reason = err.detail().unwrap_or_default(), "Rejected request before sending");
        err
    }

    fn log_failure(&self, request: &ApiRequest, err: &TrafficError) {
        error!(
            endpoint = %request.path(),
            query = ?request.query,
            kind = err.kind(),
            detail = err.detail().unwrap_or_default(),
            error = %err,
            "Traffic API call failed"
        );
    }
}

fn parse_body(response: &ApiResponse) -> Result<Value, TrafficError> {
    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&response.body)
        .map_err(|e| TrafficError::InvalidResponse(format!("body is not JSON: {}", e)))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, TrafficError> {
    non_empty(Some(value)).ok_or_else(|| {
        warn!(field, "Rejected request before sending");
        TrafficError::validation(format!("{} must not be empty", field))
    })
}

/// Parse an ISO-8601 date-time, with or without a UTC offset. Local times
/// are compared as if they were UTC.
fn parse_iso_datetime(field: &str, value: &str) -> Result<OffsetDateTime, TrafficError> {
    if let Ok(dt) = OffsetDateTime::parse(value, &Rfc3339) {
        return Ok(dt);
    }
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second][optional [.[subsecond]]]]]"
    );
    PrimitiveDateTime::parse(value, local)
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|_| {
            TrafficError::validation(format!(
                "{} must be an ISO-8601 date-time, got {:?}",
                field, value
            ))
        })
}

fn check_time_range(start: &str, end: &str) -> Result<(), TrafficError> {
    let start = parse_iso_datetime("start time", start)?;
    let end = parse_iso_datetime("end time", end)?;
    if start > end {
        return Err(TrafficError::validation(
            "start time must not be after end time",
        ));
    }
    // Span is measured in whole hours, matching the backend.
    if (end - start).whole_hours() > MAX_HISTORICAL_RANGE.whole_hours() {
        return Err(TrafficError::validation(
            "time range must not exceed 30 days",
        ));
    }
    Ok(())
}
