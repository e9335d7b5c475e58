//! Traffic data access layer.
//!
//! This module handles:
//! - Traffic record types and request parameters
//! - Pure record normalization and status classification
//! - The transport seam and its reqwest implementation
//! - The typed API client
//! - An in-memory fake backend for tests

pub mod client;
pub mod mock;
pub mod normalize;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, TrafficClient};
pub use mock::{MockConfig, MockRecordBuilder, MockTrafficBackend};
pub use normalize::{classify_status, normalize_record};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Transport};
pub use types::{
    City, CongestionClass, EvaluationStatus, HistoricalQuery, ListAllParams, Page, PageParams,
    RawTrafficRecord, Road, SortDir, TrafficRecord, TrafficStats,
};
