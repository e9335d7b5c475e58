//! Integration tests for the traffic client.
//!
//! Every test drives the public client against `MockTrafficBackend`, so no
//! network access is needed. The test against a live backend is ignored by
//! default; run it with: cargo test --test integration -- --ignored

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};

use traffic_client::config::Config;
use traffic_client::traffic::mock::page_envelope;
use traffic_client::traffic::{
    classify_status, ClientConfig, CongestionClass, HistoricalQuery, ListAllParams, MockConfig,
    MockRecordBuilder, MockTrafficBackend, PageParams, TrafficClient,
};
use traffic_client::TrafficError;

fn client_over(backend: &MockTrafficBackend) -> TrafficClient<MockTrafficBackend> {
    TrafficClient::with_transport(ClientConfig::default(), backend.clone())
}

fn beijing_records() -> Vec<Value> {
    vec![
        MockRecordBuilder::new(1, "Jianguo Road")
            .city("Beijing")
            .status(2)
            .description("heavy eastbound flow")
            .request_time("2024-05-01 08:30:00")
            .build(),
        MockRecordBuilder::new(2, "Chang'an Avenue")
            .city("Beijing")
            .status(1)
            .speed(45.0)
            .build(),
        MockRecordBuilder::new(3, "Third Ring Road")
            .city("Beijing")
            .status(3)
            .build(),
    ]
}

#[tokio::test]
async fn defaults_are_applied_per_operation() {
    let backend = MockTrafficBackend::new();
    backend.route("/traffic", page_envelope(vec![], 0, 20, 0));
    backend.route("/traffic/city/Beijing", page_envelope(vec![], 0, 20, 0));
    backend.route("/traffic/road/Jianguo Road/city/Beijing", json!([]));
    backend.route("/traffic/overview", page_envelope(vec![], 0, 12, 0));
    backend.route("/traffic/historical", json!([]));
    let client = client_over(&backend);

    assert_ok!(client.list_all(ListAllParams::default()).await);
    assert_ok!(client.list_by_city("Beijing", PageParams::default()).await);
    assert_ok!(
        client
            .list_by_road_and_city("Jianguo Road", "Beijing", PageParams::default())
            .await
    );
    assert_ok!(client.get_overview(PageParams::default()).await);
    assert_ok!(
        client
            .get_historical(HistoricalQuery::new(
                "Jianguo Road",
                "Beijing",
                "2024-05-01T00:00:00",
                "2024-05-01T12:00:00",
            ))
            .await
    );

    let sizes: Vec<(String, Option<String>)> = backend
        .requests()
        .iter()
        .map(|r| (r.path(), r.query_value("size").map(str::to_string)))
        .collect();
    assert_eq!(
        sizes,
        vec![
            ("/traffic".to_string(), Some("20".to_string())),
            ("/traffic/city/Beijing".to_string(), Some("20".to_string())),
            (
                "/traffic/road/Jianguo Road/city/Beijing".to_string(),
                Some("10".to_string())
            ),
            ("/traffic/overview".to_string(), Some("12".to_string())),
            ("/traffic/historical".to_string(), Some("100".to_string())),
        ]
    );
    assert!(backend
        .requests()
        .iter()
        .all(|r| r.query_value("page") == Some("0")));
}

#[tokio::test]
async fn explicit_paging_overrides_defaults() {
    let backend = MockTrafficBackend::new();
    backend.route(
        "/traffic/city/Beijing",
        page_envelope(beijing_records(), 1, 3, 6),
    );
    let client = client_over(&backend);

    let page = assert_ok!(client.list_by_city("Beijing", PageParams::new(1, 3)).await);
    assert_eq!(page.content.len(), 3);
    assert_eq!(page.total_elements, 6);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.number, 1);
    assert!(!page.has_next());

    let sent = backend.last_request().unwrap();
    assert_eq!(sent.query_value("page"), Some("1"));
    assert_eq!(sent.query_value("size"), Some("3"));
}

#[tokio::test]
async fn list_by_status_scenario() {
    let backend = MockTrafficBackend::new();
    backend.route(
        "/traffic/status/2",
        json!([{ "id": 9, "roadName": "Jianguo Road", "city": "Beijing", "evaluation_status": 2 }]),
    );
    let client = client_over(&backend);

    let records = assert_ok!(client.list_by_status(2).await);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].evaluation_status, 2);
    assert_eq!(records[0].congestion_class(), CongestionClass::Level2);
}

#[tokio::test]
async fn get_by_id_404_scenario() {
    let backend = MockTrafficBackend::new();
    backend.route_status("/traffic/404", 404, json!({"message": "traffic record not found"}));
    let client = client_over(&backend);

    let err = assert_err!(client.get_by_id(404).await);
    assert_eq!(err, TrafficError::NotFound);
    assert_eq!(err.to_string(), "resource not found");
}

#[tokio::test]
async fn get_by_id_returns_detail() {
    let backend = MockTrafficBackend::new();
    backend.route(
        "/traffic/1",
        MockRecordBuilder::new(1, "Jianguo Road")
            .city("Beijing")
            .status(2)
            .speed(23.5)
            .field("congestionDistance", json!(3))
            .field("statusText", json!("slow"))
            .build(),
    );
    let client = client_over(&backend);

    let record = assert_ok!(client.get_by_id(1).await);
    assert_eq!(record.road_name, "Jianguo Road");
    assert_eq!(record.speed, Some(23.5));
    assert_eq!(record.congestion_distance, Some(3.0));
    assert_eq!(record.status_text.as_deref(), Some("slow"));
}

#[tokio::test]
async fn historical_without_bounds_sends_nothing() {
    let backend = MockTrafficBackend::new();
    let client = client_over(&backend);

    let query = HistoricalQuery {
        road_name: Some("Main St".to_string()),
        city: Some("X".to_string()),
        ..HistoricalQuery::default()
    };
    let err = assert_err!(client.get_historical(query).await);
    assert!(matches!(err, TrafficError::Validation(_)));
    assert_eq!(backend.request_count(), 0);
}

#[tokio::test]
async fn historical_returns_page_content() {
    let backend = MockTrafficBackend::new();
    backend.route(
        "/traffic/historical",
        page_envelope(beijing_records(), 0, 100, 3),
    );
    let client = client_over(&backend);

    let records = assert_ok!(
        client
            .get_historical(HistoricalQuery::new(
                "Jianguo Road",
                "Beijing",
                "2024-05-01T00:00:00+08:00",
                "2024-05-03T00:00:00+08:00",
            ))
            .await
    );
    assert_eq!(records.len(), 3);

    let sent = backend.last_request().unwrap();
    assert_eq!(sent.query_value("city"), Some("Beijing"));
    assert_eq!(sent.query_value("endTime"), Some("2024-05-03T00:00:00+08:00"));
}

#[tokio::test]
async fn lookups_return_empty_lists() {
    let backend = MockTrafficBackend::new();
    backend.route("/traffic/cities", json!([]));
    backend.route_raw("/traffic/cities/Nowhere/roads", 200, "");
    let client = client_over(&backend);

    assert_eq!(assert_ok!(client.list_supported_cities().await), vec![]);
    assert_eq!(assert_ok!(client.list_roads_by_city("Nowhere").await), vec![]);
}

#[tokio::test]
async fn lookups_attach_city_to_roads() {
    let backend = MockTrafficBackend::new();
    backend.route("/traffic/cities", json!(["Beijing", "Shanghai"]));
    backend.route(
        "/traffic/cities/Beijing/roads",
        json!(["Jianguo Road", "Chang'an Avenue"]),
    );
    let client = client_over(&backend);

    let cities = assert_ok!(client.list_supported_cities().await);
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[1].name, "Shanghai");

    let roads = assert_ok!(client.list_roads_by_city("Beijing").await);
    assert_eq!(roads.len(), 2);
    assert!(roads.iter().all(|r| r.city == "Beijing"));
}

#[tokio::test]
async fn stats_are_decoded() {
    let backend = MockTrafficBackend::new();
    backend.route(
        "/traffic/stats",
        json!({
            "totalRoads": 156,
            "smoothRoads": 100,
            "slowRoads": 33,
            "congestedRoads": 18,
            "heavyRoads": 5,
            "statusDistribution": {"smooth": 100, "slow": 33, "congested": 18, "severe": 5},
            "avgSpeed": 42.0
        }),
    );
    let client = client_over(&backend);

    let stats = assert_ok!(client.get_stats().await);
    assert_eq!(stats.total_roads, 156);
    assert_eq!(stats.status_distribution.len(), 4);
    assert_eq!(stats.average_speed, Some(42.0));
}

#[tokio::test]
async fn error_taxonomy() {
    let backend = MockTrafficBackend::new();
    backend.route_status("/traffic/popular", 500, json!({}));
    backend.route_status("/traffic/search", 400, json!({"message": "keyword too long"}));
    backend.route_status("/traffic/overview", 403, json!({}));
    let client = client_over(&backend);

    let server = assert_err!(client.get_popular().await);
    assert_eq!(server.to_string(), "internal server error");

    let backend_msg = assert_err!(client.search("x").await);
    assert_eq!(backend_msg.to_string(), "keyword too long");

    let generic = assert_err!(client.get_overview(PageParams::default()).await);
    assert_eq!(generic.to_string(), "request failed");

    let unrouted = assert_err!(client.get_by_id(77).await);
    assert_eq!(unrouted, TrafficError::NotFound);
}

#[tokio::test]
async fn transport_and_config_failures() {
    let offline = MockTrafficBackend::with_config(MockConfig {
        fail_transport: true,
        ..MockConfig::default()
    });
    let err = assert_err!(client_over(&offline).list_supported_cities().await);
    assert_eq!(err.to_string(), "network connection failed, check network settings");

    let misconfigured = MockTrafficBackend::with_config(MockConfig {
        fail_config: true,
        ..MockConfig::default()
    });
    let err = assert_err!(client_over(&misconfigured).get_stats().await);
    assert_eq!(err.to_string(), "request configuration error");
}

#[tokio::test]
async fn independent_clients_do_not_share_state() {
    let first = MockTrafficBackend::new();
    let second = MockTrafficBackend::with_config(MockConfig {
        latency_ms: 10,
        ..MockConfig::default()
    });
    first.route("/traffic/popular", json!(beijing_records()));
    second.route("/traffic/popular", json!([]));

    let quiet = TrafficClient::with_transport(
        ClientConfig {
            log_requests: false,
            log_responses: false,
            ..ClientConfig::default()
        },
        second.clone(),
    );

    let loud = client_over(&first);
    let (a, b) = tokio::join!(loud.get_popular(), quiet.get_popular());
    assert_eq!(assert_ok!(a).len(), 3);
    assert!(assert_ok!(b).is_empty());
    assert_eq!(first.request_count(), 1);
    assert_eq!(second.request_count(), 1);
    assert!(!quiet.config().log_requests);
}

#[test]
fn classify_status_fallback() {
    for (status, class) in [
        (0, CongestionClass::Level0),
        (1, CongestionClass::Level1),
        (2, CongestionClass::Level2),
        (3, CongestionClass::Level3),
        (4, CongestionClass::Level4),
        (99, CongestionClass::Level0),
    ] {
        assert_eq!(classify_status(status), class);
    }
}

/// Test against a running backend at TRAFFIC_API_BASE_URL.
#[tokio::test]
#[ignore = "requires a running traffic backend"]
async fn test_live_backend_cities() {
    dotenvy::dotenv().ok();
    let config = match Config::load() {
        Ok(c) if std::env::var("TRAFFIC_API_BASE_URL").is_ok() => c,
        _ => {
            println!("Skipping: TRAFFIC_API_BASE_URL not set");
            return;
        }
    };

    let client = TrafficClient::new(config.client_config()).expect("client");
    let result = client.list_supported_cities().await;
    assert!(result.is_ok(), "Failed to list cities: {:?}", result.err());

    println!("Found {} cities", result.unwrap().len());
}
