//! In-memory fake backend for tests and demos.
//!
//! `MockTrafficBackend` implements [`Transport`] with a fixed path lookup
//! table, an optional simulated delay, failure injection and a log of every
//! request it received. Inject it with [`TrafficClient::with_transport`].
//!
//! [`TrafficClient::with_transport`]: super::TrafficClient::with_transport

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{json, Value};

use crate::error::TrafficError;

use super::transport::{ApiRequest, ApiResponse, Transport};

/// Configuration for mock backend behavior.
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Simulated latency in milliseconds.
    pub latency_ms: u64,
    /// Fail every request as if no response arrived.
    pub fail_transport: bool,
    /// Fail every request as if it could not be built.
    pub fail_config: bool,
}

/// Fake traffic backend keyed by request path.
#[derive(Debug, Clone, Default)]
pub struct MockTrafficBackend {
    /// Mock configuration.
    config: MockConfig,
    /// Canned responses by path, e.g. `/traffic/stats`.
    routes: Arc<Mutex<HashMap<String, ApiResponse>>>,
    /// Requests received, in order.
    requests: Arc<Mutex<Vec<ApiRequest>>>,
}

impl MockTrafficBackend {
    /// Create an empty backend; every path answers 404.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend with custom configuration.
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Answer `path` with 200 and `body`.
    pub fn route(&self, path: &str, body: Value) {
        self.route_status(path, 200, body);
    }

    /// Answer `path` with `status` and `body`.
    pub fn route_status(&self, path: &str, status: u16, body: Value) {
        self.route_raw(path, status, body.to_string());
    }

    /// Answer `path` with `status` and an arbitrary body string.
    pub fn route_raw(&self, path: &str, status: u16, body: impl Into<String>) {
        lock(&self.routes).insert(
            path.to_string(),
            ApiResponse {
                status,
                body: body.into(),
            },
        );
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Most recent request, if any.
    pub fn last_request(&self) -> Option<ApiRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Clear all routes and the request log.
    pub fn clear(&self) {
        lock(&self.routes).clear();
        lock(&self.requests).clear();
    }

    fn respond(&self, request: &ApiRequest) -> Result<ApiResponse, TrafficError> {
        lock(&self.requests).push(request.clone());

        if self.config.fail_config {
            return Err(TrafficError::RequestConfig(
                "Mock request config failure".to_string(),
            ));
        }
        if self.config.fail_transport {
            return Err(TrafficError::Transport(
                "Mock connection failure".to_string(),
            ));
        }

        let response = lock(&self.routes)
            .get(&request.path())
            .cloned()
            .unwrap_or_else(|| ApiResponse {
                status: 404,
                body: json!({"error": "API endpoint not found"}).to_string(),
            });
        Ok(response)
    }
}

impl Transport for MockTrafficBackend {
    async fn get(&self, request: &ApiRequest) -> Result<ApiResponse, TrafficError> {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.config.latency_ms)).await;
        }
        self.respond(request)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Builder for backend-shaped (camelCase) traffic records.
pub struct MockRecordBuilder {
    fields: serde_json::Map<String, Value>,
}

impl MockRecordBuilder {
    /// Record with an id, road name and status 1.
    pub fn new(id: i64, road_name: impl Into<String>) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("id".to_string(), json!(id));
        fields.insert("roadName".to_string(), json!(road_name.into()));
        fields.insert("evaluationStatus".to_string(), json!(1));
        Self { fields }
    }

    /// Set the city.
    pub fn city(self, city: impl Into<String>) -> Self {
        self.field("city", json!(city.into()))
    }

    /// Set the evaluation status.
    pub fn status(self, status: i32) -> Self {
        self.field("evaluationStatus", json!(status))
    }

    /// Set the description.
    pub fn description(self, text: impl Into<String>) -> Self {
        self.field("description", json!(text.into()))
    }

    /// Set the request time.
    pub fn request_time(self, time: impl Into<String>) -> Self {
        self.field("requestTime", json!(time.into()))
    }

    /// Set the speed.
    pub fn speed(self, speed: f64) -> Self {
        self.field("speed", json!(speed))
    }

    /// Set any other field verbatim.
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Build the JSON record.
    pub fn build(self) -> Value {
        Value::Object(self.fields)
    }
}

/// Wrap records in a backend page envelope.
pub fn page_envelope(records: Vec<Value>, number: u32, size: u32, total_elements: u64) -> Value {
    let total_pages = if size == 0 {
        0
    } else {
        total_elements.div_ceil(u64::from(size))
    };
    json!({
        "content": records,
        "totalElements": total_elements,
        "totalPages": total_pages,
        "number": number,
        "size": size,
        "first": number == 0,
        "last": u64::from(number) + 1 >= total_pages,
    })
}
