//! Traffic information CLI entry point.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, error};

use traffic_client::config::Config;
use traffic_client::traffic::{
    HistoricalQuery, ListAllParams, PageParams, SortDir, TrafficClient,
};
use traffic_client::utils::{
    cities_text, init_tracing, page_table, records_table, roads_text, stats_text,
};

/// Query the carpool traffic-information API.
#[derive(Parser, Debug)]
#[command(name = "traffic-cli")]
#[command(about = "Query live and historical road traffic from the carpool backend")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    /// Override the API base URL.
    #[arg(long, global = true, env = "TRAFFIC_API_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

/// Page selection shared by paginated subcommands.
#[derive(clap::Args, Debug)]
struct PageArgs {
    /// Zero-based page index.
    #[arg(long)]
    page: Option<u32>,

    /// Page size.
    #[arg(long)]
    size: Option<u32>,
}

impl From<PageArgs> for PageParams {
    fn from(args: PageArgs) -> Self {
        PageParams {
            page: args.page,
            size: args.size,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the latest record of every road.
    List {
        #[command(flatten)]
        page: PageArgs,

        /// Sort field.
        #[arg(long)]
        sort_by: Option<String>,

        /// Sort direction (asc or desc).
        #[arg(long)]
        sort_dir: Option<SortDir>,
    },

    /// List records for a city.
    City {
        /// City name.
        city: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List records for a road within a city.
    Road {
        /// Road name.
        road: String,

        /// City name.
        city: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List records with an evaluation status (0-4).
    Status {
        /// Evaluation status.
        status: u8,
    },

    /// Search records by keyword.
    Search {
        /// Keyword; may be empty.
        #[arg(default_value = "")]
        keyword: String,
    },

    /// Show aggregate statistics.
    Stats,

    /// Show a single record.
    Get {
        /// Record id.
        id: u64,
    },

    /// Show the landing-page overview.
    Overview {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show popular roads.
    Popular,

    /// Show historical records for a road.
    Historical {
        /// Road name.
        #[arg(long)]
        road: Option<String>,

        /// City name.
        #[arg(long)]
        city: Option<String>,

        /// Start of the range (ISO-8601).
        #[arg(long)]
        start: Option<String>,

        /// End of the range (ISO-8601).
        #[arg(long)]
        end: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// List roads in a city.
    Roads {
        /// City name.
        city: String,
    },

    /// List supported cities.
    Cities,

    /// Check configuration validity.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration from environment")?;
    if let Some(base_url) = args.base_url.clone() {
        config.traffic_api_base_url = base_url;
    }

    // Initialize logging
    init_tracing(&config, args.verbose);
    debug!(base_url = %config.traffic_api_base_url, "Configuration loaded");

    // Handle subcommands
    match args.command {
        Command::CheckConfig => cmd_check_config(&config),
        command => {
            if let Err(e) = config.validate() {
                error!(error = %e, "Invalid configuration");
                return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
            }
            let client = TrafficClient::new(config.client_config())?;
            run(&client, command, args.json).await
        }
    }
}

/// Execute one query subcommand against the backend.
async fn run(
    client: &TrafficClient,
    command: Command,
    json: bool,
) -> anyhow::Result<()> {
    match command {
        Command::List {
            page,
            sort_by,
            sort_dir,
        } => {
            let params = ListAllParams {
                page: page.page,
                size: page.size,
                sort_by,
                sort_dir,
            };
            let page = client.list_all(params).await?;
            emit(json, &page, || page_table(&page))
        }
        Command::City { city, page } => {
            let page = client.list_by_city(&city, page.into()).await?;
            emit(json, &page, || page_table(&page))
        }
        Command::Road { road, city, page } => {
            let page = client
                .list_by_road_and_city(&road, &city, page.into())
                .await?;
            emit(json, &page, || page_table(&page))
        }
        Command::Status { status } => {
            let records = client.list_by_status(status).await?;
            emit(json, &records, || records_table(&records))
        }
        Command::Search { keyword } => {
            let records = client.search(&keyword).await?;
            emit(json, &records, || records_table(&records))
        }
        Command::Stats => {
            let stats = client.get_stats().await?;
            emit(json, &stats, || stats_text(&stats))
        }
        Command::Get { id } => {
            let record = client.get_by_id(id).await?;
            emit(json, &record, || records_table(std::slice::from_ref(&record)))
        }
        Command::Overview { page } => {
            let page = client.get_overview(page.into()).await?;
            emit(json, &page, || page_table(&page))
        }
        Command::Popular => {
            let records = client.get_popular().await?;
            emit(json, &records, || records_table(&records))
        }
        Command::Historical {
            road,
            city,
            start,
            end,
            page,
        } => {
            let query = HistoricalQuery {
                road_name: road,
                city,
                start_time: start,
                end_time: end,
                page: page.page,
                size: page.size,
            };
            let records = client.get_historical(query).await?;
            emit(json, &records, || records_table(&records))
        }
        Command::Roads { city } => {
            let roads = client.list_roads_by_city(&city).await?;
            emit(json, &roads, || roads_text(&roads))
        }
        Command::Cities => {
            let cities = client.list_supported_cities().await?;
            emit(json, &cities, || cities_text(&cities))
        }
        Command::CheckConfig => unreachable!("check-config is handled before a client is built"),
    }
}

/// Print `value` as pretty JSON or as the text rendering.
fn emit<T, F>(json: bool, value: &T, text: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce() -> String,
{
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("TRAFFIC CLI - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    print!("Building HTTP client... ");
    match TrafficClient::new(config.client_config()) {
        Ok(_) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("HTTP client construction failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Base URL: {}", config.traffic_api_base_url);
    println!("  Timeout: {}ms", config.http_timeout_ms);
    println!("  Log Requests: {}", config.log_requests);
    println!("  Log Responses: {}", config.log_responses);
    println!("  Log Format: {}", config.log_format);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}
