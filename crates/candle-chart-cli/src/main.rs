use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use candle_chart_bridge::bridge::{BridgeState, ChartBridge};
use candle_chart_bridge::event_loop::{ChartEventLoop, DEFAULT_OVERLAY_DELAY, ScheduledTask, UiCommand};
use candle_chart_bridge::html::HtmlPage;
use candle_chart_bridge::overlay::{HorizontalLine, LineStyle};
use candle_chart_bridge::renderer::{Renderer, ScriptWriter};
use candle_chart_bridge::script;
use candle_chart_core::loader::SeriesLoader;
use candle_chart_core::parser::ParseReport;
use candle_chart_core::series::CandleSeries;
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

/// Data file the desktop shell ships with.
const DEFAULT_RESOURCE: &str = "/data/1d.csv";

#[derive(Parser)]
#[command(
    name = "candle-chart",
    about = "Load OHLC candles from CSV and drive a chart renderer"
)]
struct Cli {
    /// Root directory resource ids are resolved against
    #[arg(long, env = "CANDLE_CHART_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JSON payload handed to the renderer
    Payload {
        /// Resource id of the CSV file
        #[arg(default_value = DEFAULT_RESOURCE)]
        resource: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,

        /// Sort candles by time before serializing
        #[arg(long)]
        sort: bool,
    },

    /// Print the command scripts a renderer would receive
    Script {
        #[command(flatten)]
        delivery: DeliveryArgs,
    },

    /// Write a standalone HTML chart page
    Html {
        #[command(flatten)]
        delivery: DeliveryArgs,

        /// Output file
        #[arg(short, long)]
        output: PathBuf,

        /// Page title (defaults to the resource id)
        #[arg(long)]
        title: Option<String>,
    },

    /// Report skipped rows, timestamp fallbacks and ordering problems
    Validate {
        /// Resource id of the CSV file
        #[arg(default_value = DEFAULT_RESOURCE)]
        resource: String,
    },
}

#[derive(Args)]
struct DeliveryArgs {
    /// Resource id of the CSV file
    #[arg(default_value = DEFAULT_RESOURCE)]
    resource: String,

    /// Horizontal line as PRICE:COLOR:LABEL[:WIDTH[:STYLE]] (repeatable)
    #[arg(short, long = "line", value_parser = parse_line_spec)]
    lines: Vec<HorizontalLine>,

    /// Delay before horizontal lines are drawn, in milliseconds
    #[arg(long, default_value_t = DEFAULT_OVERLAY_DELAY.as_millis() as u64)]
    overlay_delay_ms: u64,

    /// Sort candles by time before delivery
    #[arg(long)]
    sort: bool,
}

impl DeliveryArgs {
    fn overlay_delay(&self) -> Duration {
        Duration::from_millis(self.overlay_delay_ms)
    }
}

fn parse_line_spec(spec: &str) -> Result<HorizontalLine, String> {
    let parts: Vec<&str> = spec.split(':').collect();
    if !(3..=5).contains(&parts.len()) {
        return Err(format!(
            "expected PRICE:COLOR:LABEL[:WIDTH[:STYLE]], got {spec:?}"
        ));
    }

    let price: f64 = parts[0]
        .trim()
        .parse()
        .map_err(|e| format!("invalid price {:?}: {e}", parts[0]))?;
    if !price.is_finite() {
        return Err(format!("price must be finite, got {:?}", parts[0]));
    }

    let mut line = HorizontalLine::new(price, parts[1].trim(), parts[2]);
    if let Some(width) = parts.get(3) {
        let width = width
            .trim()
            .parse()
            .map_err(|e| format!("invalid width {width:?}: {e}"))?;
        line = line.with_width(width);
    }
    if let Some(style) = parts.get(4) {
        let style = style
            .trim()
            .parse::<u8>()
            .ok()
            .and_then(LineStyle::from_code)
            .ok_or_else(|| format!("invalid line style {style:?}, expected 0-4"))?;
        line = line.with_style(style);
    }
    Ok(line)
}

fn load(loader: &SeriesLoader, resource: &str, sort: bool) -> Result<CandleSeries> {
    let series = loader
        .load(resource)
        .with_context(|| format!("failed to load {resource}"))?;
    if sort && !series.is_time_ordered() {
        info!("{resource}: sorting candles by time");
        return Ok(series.sorted_by_time());
    }
    Ok(series)
}

/// Run the event loop against a renderer that is ready immediately, with each
/// line scheduled `delay` after startup.
async fn drive<R: Renderer>(
    renderer: R,
    series: CandleSeries,
    lines: Vec<HorizontalLine>,
    delay: Duration,
) -> ChartBridge<R> {
    let (event_loop, handle, ready) = ChartEventLoop::new(renderer, series);
    // headless renderers have nothing to load
    ready.fire();
    let _pending: Vec<ScheduledTask> = lines
        .into_iter()
        .map(|line| handle.schedule(delay, UiCommand::horizontal_line(line)))
        .collect();
    drop(handle);
    event_loop.run().await
}

fn cmd_payload(loader: &SeriesLoader, resource: &str, pretty: bool, sort: bool) -> Result<()> {
    let series = load(loader, resource, sort)?;
    let json = if pretty {
        script::payload_pretty(&series)
    } else {
        script::payload(&series)
    }
    .context("failed to serialize candle series")?;
    println!("{json}");
    Ok(())
}

async fn cmd_script(loader: &SeriesLoader, args: DeliveryArgs) -> Result<()> {
    let series = load(loader, &args.resource, args.sort)?;
    let delay = args.overlay_delay();
    let bridge = drive(ScriptWriter::new(io::stdout()), series, args.lines, delay).await;
    if bridge.state() != BridgeState::DataDelivered {
        warn!(state = ?bridge.state(), "chart data was not delivered");
    }
    Ok(())
}

async fn cmd_html(
    loader: &SeriesLoader,
    args: DeliveryArgs,
    output: &Path,
    title: Option<String>,
) -> Result<()> {
    let series = load(loader, &args.resource, args.sort)?;
    let page = HtmlPage::new().with_title(title.unwrap_or_else(|| args.resource.clone()));
    let delay = args.overlay_delay();
    let bridge = drive(page, series, args.lines, delay).await;

    std::fs::write(output, bridge.renderer().render())
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote {} ({} command(s))",
        output.display(),
        bridge.renderer().commands().len()
    );
    Ok(())
}

fn format_time(time: i64) -> String {
    DateTime::from_timestamp(time, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| time.to_string())
}

/// One line per problem found in a parse.
fn validation_issues(report: &ParseReport) -> Vec<String> {
    let mut issues = Vec::new();

    for row in &report.skipped {
        issues.push(format!("line {}: skipped: {}", row.line, row.error));
    }
    for fallback in &report.timestamp_fallbacks {
        issues.push(format!(
            "line {}: {} (time set to epoch 0)",
            fallback.line, fallback.error
        ));
    }
    if let Some(index) = report.series.first_out_of_order() {
        issues.push(format!(
            "candles not in ascending time order at index {index}"
        ));
    }
    let inconsistent = report
        .series
        .iter()
        .filter(|c| !c.is_consistent())
        .count();
    if inconsistent > 0 {
        issues.push(format!(
            "{inconsistent} candle(s) with high/low not bounding open/close"
        ));
    }

    issues
}

fn cmd_validate(loader: &SeriesLoader, resource: &str) -> Result<()> {
    let report = loader
        .load_with_report(resource)
        .with_context(|| format!("failed to load {resource}"))?;

    match report.series.time_range() {
        Some((first, last)) => println!(
            "{resource}: {} candle(s), {} to {}",
            report.series.len(),
            format_time(first),
            format_time(last)
        ),
        None => println!("{resource}: no candles"),
    }

    let issues = validation_issues(&report);
    for issue in &issues {
        println!("WARN: {issue}");
    }

    if issues.is_empty() {
        println!("All rows valid.");
    } else {
        println!("{} issue(s) found.", issues.len());
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .init();

    let loader = SeriesLoader::new(&cli.data_dir);

    match cli.command {
        Commands::Payload {
            resource,
            pretty,
            sort,
        } => {
            cmd_payload(&loader, &resource, pretty, sort)?;
        }
        Commands::Script { delivery } => {
            cmd_script(&loader, delivery).await?;
        }
        Commands::Html {
            delivery,
            output,
            title,
        } => {
            cmd_html(&loader, delivery, &output, title).await?;
        }
        Commands::Validate { resource } => {
            cmd_validate(&loader, &resource)?;
        }
    }

    Ok(())
}
