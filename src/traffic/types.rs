//! Traffic record types and request parameters.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::TrafficError;

/// Default page index.
pub const DEFAULT_PAGE: u32 = 0;
/// Default page size for `list_all` and `list_by_city`.
pub const DEFAULT_LIST_SIZE: u32 = 20;
/// Default page size for `list_by_road_and_city`.
pub const DEFAULT_ROAD_SIZE: u32 = 10;
/// Default page size for `get_overview`.
pub const DEFAULT_OVERVIEW_SIZE: u32 = 12;
/// Default page size for `get_historical`.
pub const DEFAULT_HISTORICAL_SIZE: u32 = 100;
/// Default sort field for `list_all`.
pub const DEFAULT_SORT_BY: &str = "requestTime";

/// Server-assigned congestion level.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EvaluationStatus {
    /// No reading. Counted as smooth in statistics.
    Unknown = 0,
    /// Free-flowing traffic.
    Smooth = 1,
    /// Slow traffic.
    Slow = 2,
    /// Congested.
    Congested = 3,
    /// Severe congestion.
    Severe = 4,
}

impl EvaluationStatus {
    /// All statuses in code order.
    pub const ALL: [EvaluationStatus; 5] = [
        EvaluationStatus::Unknown,
        EvaluationStatus::Smooth,
        EvaluationStatus::Slow,
        EvaluationStatus::Congested,
        EvaluationStatus::Severe,
    ];

    /// Wire code (0-4).
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<i64> for EvaluationStatus {
    type Error = TrafficError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Unknown),
            1 => Ok(Self::Smooth),
            2 => Ok(Self::Slow),
            3 => Ok(Self::Congested),
            4 => Ok(Self::Severe),
            other => Err(TrafficError::validation(format!(
                "evaluation status must be between 0 and 4, got {}",
                other
            ))),
        }
    }
}

/// Fixed display category for a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, Default)]
pub enum CongestionClass {
    /// Unknown or unclassifiable status.
    #[default]
    #[strum(serialize = "congestion-0")]
    #[serde(rename = "congestion-0")]
    Level0,
    #[strum(serialize = "congestion-1")]
    #[serde(rename = "congestion-1")]
    Level1,
    #[strum(serialize = "congestion-2")]
    #[serde(rename = "congestion-2")]
    Level2,
    #[strum(serialize = "congestion-3")]
    #[serde(rename = "congestion-3")]
    Level3,
    #[strum(serialize = "congestion-4")]
    #[serde(rename = "congestion-4")]
    Level4,
}

/// Sort direction for `list_all`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDir {
    /// Ascending.
    Asc,
    /// Descending.
    #[default]
    Desc,
}

/// Canonical traffic record handed to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TrafficRecord {
    /// Record identifier.
    pub id: i64,
    /// Road name.
    pub road_name: String,
    /// City name.
    pub city: String,
    /// Evaluation status, expected 0-4.
    pub evaluation_status: i32,
    /// Server label for the status.
    pub evaluation_status_desc: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Request timestamp as sent by the server.
    pub request_time: Option<String>,
    /// Average speed.
    pub speed: Option<f64>,
    /// Congestion distance.
    pub congestion_distance: Option<f64>,
    /// Status text.
    pub status_text: Option<String>,
}

impl TrafficRecord {
    /// Typed status, if the code is in range.
    pub fn status(&self) -> Option<EvaluationStatus> {
        EvaluationStatus::try_from(i64::from(self.evaluation_status)).ok()
    }

    /// Display category for this record.
    pub fn congestion_class(&self) -> CongestionClass {
        super::normalize::classify_status(self.evaluation_status)
    }
}

/// Traffic record as the backend sends it.
///
/// Field names are camelCase on the wire; snake_case aliases let an
/// already-normalized record be read back through the same path.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawTrafficRecord {
    pub id: Option<i64>,
    #[serde(alias = "road_name")]
    pub road_name: Option<String>,
    pub city: Option<String>,
    #[serde(alias = "evaluation_status")]
    pub evaluation_status: Option<i32>,
    #[serde(alias = "evaluation_status_desc")]
    pub evaluation_status_desc: Option<String>,
    pub description: Option<String>,
    #[serde(alias = "request_time")]
    pub request_time: Option<String>,
    pub speed: Option<f64>,
    #[serde(alias = "congestion_distance")]
    pub congestion_distance: Option<f64>,
    #[serde(alias = "status_text")]
    pub status_text: Option<String>,
}

/// A supported city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    /// City name.
    pub name: String,
}

/// A road within a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    /// Road name.
    pub name: String,
    /// City the road belongs to.
    pub city: String,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    /// Items on this page.
    pub content: Vec<T>,
    /// Total items across all pages.
    pub total_elements: u64,
    /// Total number of pages.
    pub total_pages: u32,
    /// Zero-based page index.
    pub number: u32,
    /// Requested page size.
    pub size: u32,
}

impl<T> Page<T> {
    /// Whether this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Whether more pages follow this one.
    pub fn has_next(&self) -> bool {
        self.number.saturating_add(1) < self.total_pages
    }
}

/// Aggregate traffic statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TrafficStats {
    #[serde(alias = "totalRoads", alias = "roadCount")]
    pub total_roads: u64,
    #[serde(alias = "smoothRoads")]
    pub smooth_roads: u64,
    #[serde(alias = "slowRoads")]
    pub slow_roads: u64,
    #[serde(alias = "congestedRoads", alias = "congestionCount")]
    pub congested_roads: u64,
    #[serde(alias = "heavyRoads")]
    pub heavy_roads: u64,
    /// Count per status label.
    #[serde(alias = "statusDistribution")]
    pub status_distribution: BTreeMap<String, u64>,
    /// Average speed, when the backend reports it.
    #[serde(alias = "avgSpeed", alias = "averageSpeed")]
    pub average_speed: Option<f64>,
    /// Average congestion index, when the backend reports it.
    #[serde(alias = "avgCongestion", alias = "averageCongestion")]
    pub average_congestion: Option<f64>,
}

impl TrafficStats {
    /// Share of roads that are congested or worse, in `[0, 1]`.
    pub fn congested_share(&self) -> f64 {
        if self.total_roads == 0 {
            return 0.0;
        }
        (self.congested_roads + self.heavy_roads) as f64 / self.total_roads as f64
    }
}

/// Page parameters; `None` means "use the operation's default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    /// Explicit page and size.
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
        }
    }

    /// Apply defaults and check the size.
    pub fn resolve(self, default_size: u32) -> Result<(u32, u32), TrafficError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let size = self.size.unwrap_or(default_size);
        if size == 0 {
            return Err(TrafficError::validation("page size must be greater than 0"));
        }
        Ok((page, size))
    }
}

/// Parameters for `list_all`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListAllParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<SortDir>,
}

/// Parameters for `get_historical`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoricalQuery {
    pub road_name: Option<String>,
    pub city: Option<String>,
    /// ISO-8601 start bound.
    pub start_time: Option<String>,
    /// ISO-8601 end bound.
    pub end_time: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl HistoricalQuery {
    /// Query for a road over a time range, with default paging.
    pub fn new(
        road_name: impl Into<String>,
        city: impl Into<String>,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            road_name: Some(road_name.into()),
            city: Some(city.into()),
            start_time: Some(start_time.into()),
            end_time: Some(end_time.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn evaluation_status_from_code() {
        assert_eq!(EvaluationStatus::try_from(2i64).unwrap(), EvaluationStatus::Slow);
        assert_eq!(EvaluationStatus::Severe.code(), 4);
        assert!(EvaluationStatus::try_from(5i64).is_err());
        assert!(EvaluationStatus::try_from(-1i64).is_err());
    }

    #[test]
    fn evaluation_status_labels() {
        assert_eq!(EvaluationStatus::Congested.to_string(), "congested");
        assert_eq!(
            EvaluationStatus::from_str("smooth").unwrap(),
            EvaluationStatus::Smooth
        );
    }

    #[test]
    fn sort_dir_parses_case_insensitively() {
        assert_eq!(SortDir::from_str("ASC").unwrap(), SortDir::Asc);
        assert_eq!(SortDir::from_str("desc").unwrap(), SortDir::Desc);
        assert_eq!(SortDir::default().to_string(), "desc");
        assert!(SortDir::from_str("sideways").is_err());
    }

    #[test]
    fn page_params_defaults() {
        assert_eq!(PageParams::default().resolve(12).unwrap(), (0, 12));
        assert_eq!(PageParams::new(3, 5).resolve(12).unwrap(), (3, 5));
        let only_page = PageParams {
            page: Some(2),
            size: None,
        };
        assert_eq!(only_page.resolve(20).unwrap(), (2, 20));
    }

    #[test]
    fn page_params_reject_zero_size() {
        let err = PageParams::new(0, 0).resolve(20).unwrap_err();
        assert!(matches!(err, TrafficError::Validation(_)));
    }

    #[test]
    fn stats_accept_backend_field_names() {
        let stats: TrafficStats = serde_json::from_str(
            r#"{"totalRoads":10,"smoothRoads":5,"slowRoads":2,"congestedRoads":2,"heavyRoads":1,
                "statusDistribution":{"smooth":5,"slow":2}}"#,
        )
        .unwrap();
        assert_eq!(stats.total_roads, 10);
        assert_eq!(stats.heavy_roads, 1);
        assert_eq!(stats.status_distribution.get("slow"), Some(&2));
        assert!(stats.average_speed.is_none());
        assert!((stats.congested_share() - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_stats_share_is_zero() {
        assert_eq!(TrafficStats::default().congested_share(), 0.0);
    }

    #[test]
    fn record_status_accessors() {
        let record = TrafficRecord {
            evaluation_status: 3,
            ..TrafficRecord::default()
        };
        assert_eq!(record.status(), Some(EvaluationStatus::Congested));
        assert_eq!(record.congestion_class(), CongestionClass::Level3);

        let odd = TrafficRecord {
            evaluation_status: 99,
            ..TrafficRecord::default()
        };
        assert_eq!(odd.status(), None);
        assert_eq!(odd.congestion_class(), CongestionClass::Level0);
    }

    #[test]
    fn page_navigation() {
        let page = Page {
            content: vec![1, 2],
            total_elements: 5,
            total_pages: 3,
            number: 1,
            size: 2,
        };
        assert!(page.has_next());
        assert!(!page.is_empty());
    }

    #[test]
    fn last_page_index_does_not_overflow() {
        let page: Page<i32> = Page {
            content: vec![],
            total_elements: 0,
            total_pages: 1,
            number: u32::MAX,
            size: 20,
        };
        assert!(!page.has_next());
    }
}
