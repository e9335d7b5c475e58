//! Logging setup and text rendering helpers for the CLI.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::traffic::{City, Page, Road, TrafficRecord, TrafficStats};

/// Initialize the global tracing subscriber.
///
/// `verbose` forces debug output for this crate; otherwise `RUST_LOG` from
/// the environment wins, then the configured level.
pub fn init_tracing(config: &Config, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("traffic_client=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.rust_log))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs() {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}

/// One table row for a record.
pub fn record_row(record: &TrafficRecord) -> String {
    let label = record
        .status()
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("status {}", record.evaluation_status));
    let speed = record
        .speed
        .map(|s| format!("{:.1} km/h", s))
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:>6}  {:<24} {:<12} {:<13} {:<10} {:>11}  {}",
        record.id,
        record.road_name,
        record.city,
        record.congestion_class(),
        label,
        speed,
        record.request_time.as_deref().unwrap_or("-"),
    )
}

/// Render records as a table.
pub fn records_table(records: &[TrafficRecord]) -> String {
    if records.is_empty() {
        return "(no records)".to_string();
    }
    let mut out = format!(
        "{:>6}  {:<24} {:<12} {:<13} {:<10} {:>11}  {}\n",
        "ID", "ROAD", "CITY", "CLASS", "STATUS", "SPEED", "TIME"
    );
    for record in records {
        out.push_str(&record_row(record));
        out.push('\n');
    }
    out
}

/// Render a page of records with a footer.
pub fn page_table(page: &Page<TrafficRecord>) -> String {
    let mut out = records_table(&page.content);
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&format!(
        "page {}/{} ({} records total)",
        u64::from(page.number) + 1,
        page.total_pages.max(1),
        page.total_elements
    ));
    out
}

/// Render statistics.
pub fn stats_text(stats: &TrafficStats) -> String {
    let mut out = format!(
        "total: {}\nsmooth: {}\nslow: {}\ncongested: {}\nheavy: {}\ncongested share: {:.1}%",
        stats.total_roads,
        stats.smooth_roads,
        stats.slow_roads,
        stats.congested_roads,
        stats.heavy_roads,
        stats.congested_share() * 100.0,
    );
    if let Some(speed) = stats.average_speed {
        out.push_str(&format!("\naverage speed: {:.1}", speed));
    }
    if let Some(congestion) = stats.average_congestion {
        out.push_str(&format!("\naverage congestion: {:.2}", congestion));
    }
    for (label, count) in &stats.status_distribution {
        out.push_str(&format!("\n  {}: {}", label, count));
    }
    out
}

/// Render city names, one per line.
pub fn cities_text(cities: &[City]) -> String {
    if cities.is_empty() {
        return "(no cities)".to_string();
    }
    cities
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render road names, one per line.
pub fn roads_text(roads: &[Road]) -> String {
    if roads.is_empty() {
        return "(no roads)".to_string();
    }
    roads
        .iter()
        .map(|r| format!("{} ({})", r.name, r.city))
        .collect::<Vec<_>>()
        .join("\n")
}
