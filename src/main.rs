use api::routes::{compute_routes, ApiOutcome, RouteRequest, DEFAULT_DESTINATION, DEFAULT_ORIGIN};
use chrono::Local;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use dotenv::dotenv;
use env_logger::{Builder, Env};
use report::RoadRule;

mod api;
mod report;

/// Queries the Google Routes API for the commute between two addresses and
/// prints travel time, distance and traffic delay per candidate route.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Origin address
    #[arg(long, default_value = DEFAULT_ORIGIN)]
    origin: String,

    /// Destination address
    #[arg(long, default_value = DEFAULT_DESTINATION)]
    destination: String,

    /// Emit one semicolon-delimited row per route instead of the report
    #[arg(long)]
    log_line: bool,

    /// How to recognize major roads in navigation instructions
    #[arg(long, value_enum, default_value = "motorway-numbers")]
    road_rule: RoadRule,
}

fn init_logging() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}

fn main() -> Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    init_logging();

    let cli = Cli::parse();

    // Resolved before anything touches the network.
    let api_key = std::env::var("GOOGLE_MAPS_API_KEY")
        .wrap_err("Missing Google Maps API key. Set GOOGLE_MAPS_API_KEY in the environment")?;

    let request = RouteRequest::drive(&cli.origin, &cli.destination);

    match compute_routes(&api_key, &request)? {
        ApiOutcome::Routes(response) => {
            // One timestamp per invocation, shared by every log row.
            let now = Local::now().naive_local();
            let output = if cli.log_line {
                report::log_lines(&response, now)?
            } else {
                report::human_report(&response, cli.road_rule)?
            };
            println!("{}", output);
        }
        // The service answering with an error is reported but does not fail
        // the run, unlike a missing credential.
        ApiOutcome::Failed { status, body } => {
            println!("{}", report::http_failure_notice(status, &body));
        }
    }

    Ok(())
}
