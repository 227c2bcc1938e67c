//! Channel Insights — marketing channel performance dashboard.
//!
//! Loads the attribution export once, then either serves the interactive
//! dashboard or prints a one-off summary.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use insights_api::{ApiServer, AppState};
use insights_core::config::AppConfig;
use insights_core::{ChannelTaxonomy, Dimension};
use insights_ingest::{load_csv, EventTable, Selection};
use insights_reporting::{build_summary, export, view_rows, View};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "channel-insights")]
#[command(about = "Marketing channel performance dashboard")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "CHANNEL_INSIGHTS_CONFIG")]
    config: Option<String>,

    /// Semicolon-delimited export to load (overrides config)
    #[arg(long, global = true)]
    data: Option<String>,

    /// Field delimiter (overrides config)
    #[arg(long, global = true)]
    delimiter: Option<char>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the interactive dashboard
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// HTTP port (overrides config)
        #[arg(long)]
        http_port: Option<u16>,

        /// Do not start the Prometheus exporter
        #[arg(long, default_value_t = false)]
        no_metrics: bool,
    },

    /// Print an aggregated summary
    Summary {
        /// Comma-separated grouping: market, channel, month
        #[arg(short, long, default_value = "market,channel")]
        group_by: String,

        /// Restrict to a dashboard view: paid, owned_earned, unclassified, monthly
        /// (uses the view's own grouping)
        #[arg(long)]
        view: Option<String>,

        /// Comma-separated markets to include; `(blank)` selects rows with no market
        #[arg(short, long)]
        market: Option<String>,

        /// Comma-separated months (YYYY-MM) to include; `(blank)` selects undated rows
        #[arg(long)]
        month: Option<String>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// List the markets and months available for filtering
    Filters,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Csv,
    Json,
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "channel_insights=info,insights_api=info,insights_ingest=info,tower_http=info".into()
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

/// Load the export named by the configuration and report channels that
/// fall outside the taxonomy.
fn load_table(config: &AppConfig, taxonomy: &ChannelTaxonomy) -> anyhow::Result<EventTable> {
    let path = config.data.require_path()?;
    let delimiter = config.data.delimiter_byte()?;
    let table = load_csv(path, delimiter).with_context(|| format!("failed to load {path}"))?;

    let channels = table.channels();
    let unmapped = taxonomy.unmapped(channels.iter().map(String::as_str));
    if !unmapped.is_empty() {
        warn!(
            channels = ?unmapped,
            surfaced = taxonomy.surface_unclassified(),
            "Channels outside the paid and owned/earned lists"
        );
    }
    Ok(table)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(matches!(cli.command, Commands::Serve { .. }));

    // Load configuration
    let mut config = AppConfig::load_from(cli.config.as_deref())
        .with_context(|| "failed to load configuration")?;

    // Apply CLI overrides
    if let Some(data) = cli.data {
        config.data.path = Some(data);
    }
    if let Some(delimiter) = cli.delimiter {
        config.data.delimiter = delimiter.to_string();
    }

    let taxonomy = ChannelTaxonomy::from_config(&config.channels);

    match cli.command {
        Commands::Serve {
            host,
            http_port,
            no_metrics,
        } => {
            if let Some(host) = host {
                config.api.host = host;
            }
            if let Some(port) = http_port {
                config.api.http_port = port;
            }
            if no_metrics {
                config.metrics.enabled = false;
            }

            info!(
                data = ?config.data.path,
                host = %config.api.host,
                http_port = config.api.http_port,
                metrics_port = config.metrics.port,
                "Configuration loaded"
            );

            let table = load_table(&config, &taxonomy)?;
            let source = config.data.require_path()?.to_string();
            let server = ApiServer::new(config.clone(), AppState::new(table, taxonomy, source));

            if let Err(e) = server.start_metrics().await {
                warn!(error = %e, "Failed to start metrics exporter");
            }

            info!("Channel Insights is ready to serve traffic");
            server.start_http().await?;
        }

        Commands::Summary {
            group_by,
            view,
            market,
            month,
            format,
        } => {
            let table = load_table(&config, &taxonomy)?;
            let selection = Selection::from_lists(market.as_deref(), month.as_deref());

            let (rows, dims) = match view {
                Some(view) => {
                    let view: View = view.parse()?;
                    let rows = view_rows(&table, &selection, &taxonomy, view)?;
                    (rows, view.group_by().to_vec())
                }
                None => {
                    let dims = Dimension::parse_list(&group_by)?;
                    let selected = table.filter(&selection);
                    (build_summary(&selected, &dims)?, dims)
                }
            };

            let output = match format {
                OutputFormat::Table => export::to_table(&rows, &dims),
                OutputFormat::Csv => export::to_csv(&rows, &dims)?,
                OutputFormat::Json => export::to_json(&rows)?,
            };
            print!("{output}");
            if matches!(format, OutputFormat::Json) {
                println!();
            }
        }

        Commands::Filters => {
            let table = load_table(&config, &taxonomy)?;
            let listing = serde_json::json!({
                "markets": table.market_options(),
                "months": table.month_options(),
                "channels": table.channels(),
                "rows": table.len(),
                "load": table.report(),
            });
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_summary_args() {
        let cli = Cli::parse_from([
            "channel-insights",
            "summary",
            "--data",
            "export.csv",
            "--group-by",
            "month",
            "--market",
            "UK,US",
            "--format",
            "csv",
        ]);
        assert_eq!(cli.data.as_deref(), Some("export.csv"));
        match cli.command {
            Commands::Summary {
                group_by,
                market,
                format,
                ..
            } => {
                assert_eq!(group_by, "month");
                assert_eq!(market.as_deref(), Some("UK,US"));
                assert!(matches!(format, OutputFormat::Csv));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_missing_data_path_is_reported() {
        let config = AppConfig::default();
        let err = load_table(&config, &ChannelTaxonomy::default()).unwrap_err();
        assert!(err.to_string().contains("no data file configured"));
    }
}
