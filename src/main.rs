use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use medalboard::chart::{ChartKind, ChartSpec};
use medalboard::dashboard::Dashboard;
use medalboard::data::Dataset;
use medalboard::filter::FilterSpec;
use medalboard::view::ChartView;
use medalboard::{parser, render, BoardConfig, OutputFormat};
use serde_json::json;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "medalboard")]
#[command(about = "Olympic medal charts, filters and headline numbers from JSON or CSV data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw one chart as PNG or SVG
    Render(RenderArgs),
    /// Print the filtered records, aggregates and filter summary as JSON
    Filter(DataArgs),
    /// Print headline numbers for the unfiltered data as JSON
    Kpi(DataArgs),
}

#[derive(Args, Debug)]
struct DataArgs {
    /// Records as a JSON array or CSV file (reads stdin when omitted)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Athletes-per-year series used for the latest-year headline
    #[arg(long)]
    participation: Option<PathBuf>,

    /// Population table (code or country, population, region) joined into scatter charts
    #[arg(long)]
    population: Option<PathBuf>,

    /// Filter expression, e.g. 'countries(China, "United States") | medals(gold)'
    #[arg(long)]
    filter: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    input: DataArgs,

    /// Chart type key (bar, stacked_bar, bubble, scatter, line, multi_line, clustered_bar,
    /// heatmap, medal_heatmap, sunburst, violin, parallel, matrix)
    #[arg(long)]
    chart: Option<String>,

    /// JSON file with optional "chart", "scales" and "render" sections
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file (writes stdout when omitted)
    #[arg(long)]
    out: Option<PathBuf>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Render(args) => run_render(args),
        Command::Filter(args) => run_filter(args),
        Command::Kpi(args) => run_kpi(args),
    }
}

fn read_dataset(path: Option<&Path>) -> Result<Dataset> {
    match path {
        Some(path) => Dataset::load(path).with_context(|| format!("Failed to load {}", path.display())),
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read data from stdin")?;
            Dataset::from_text(&input).context("Failed to parse data from stdin")
        }
    }
}

fn read_optional(path: Option<&Path>) -> Result<Option<Dataset>> {
    path.map(|p| Dataset::load(p).with_context(|| format!("Failed to load {}", p.display())))
        .transpose()
}

fn load_board(args: &DataArgs) -> Result<(Dashboard, FilterSpec)> {
    let base = read_dataset(args.data.as_deref())?;
    let participation = read_optional(args.participation.as_deref())?;
    let population = read_optional(args.population.as_deref())?;
    let filters = match &args.filter {
        Some(expr) => parser::parse_filter(expr).context("Failed to parse filter expression")?,
        None => FilterSpec::default(),
    };
    let board = Dashboard::with_participation(base, participation).with_population(population);
    Ok((board, filters))
}

fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(bytes).context("Failed to write to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

fn run_render(args: RenderArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            BoardConfig::from_json_str(&text)?
        }
        None => BoardConfig::default(),
    };

    let mut options = config.render.clone();
    if let Some(width) = args.width {
        options.width = width;
    }
    if let Some(height) = args.height {
        options.height = height;
    }
    if let Some(format) = args.format {
        options.format = format;
    }
    let frame = options.frame();

    // A configured chart is used unless --chart asks for a different type.
    let spec = match (&args.chart, config.chart) {
        (None, Some(spec)) => Some(spec),
        (Some(key), Some(spec)) if key.parse::<ChartKind>().ok() == Some(spec.kind()) => Some(spec),
        (Some(_), _) => None,
        (None, None) => Some(ChartSpec::default_for(ChartKind::Bar)),
    };
    let view = match (spec, config.scales) {
        (Some(spec), Some(scales)) => ChartView::mount_with_scales(spec, frame, scales),
        (Some(spec), None) => ChartView::mount(spec, frame),
        (None, _) => ChartView::mount_key(args.chart.as_deref().unwrap_or_default(), frame),
    };

    let (mut board, filters) = load_board(&args.input)?;
    let index = board.mount(view);
    board.set_filters(filters);
    tracing::info!(summary = %board.summary(), "rendering");

    let view = &board.views()[index];
    let bytes = render::render(view.scene(), view.frame(), &options.format).context("Failed to render chart")?;
    write_output(args.out.as_deref(), &bytes)
}

fn run_filter(args: DataArgs) -> Result<()> {
    let (mut board, filters) = load_board(&args)?;
    board.set_filters(filters);
    let report = json!({
        "summary": board.summary(),
        "activeFilters": board.filters().active_count(),
        "aggregates": board.aggregates(),
        "records": board.filtered(),
        "perMillion": board.per_million(),
    });
    let text = serde_json::to_string_pretty(&report).context("Failed to serialize filter result")?;
    write_output(None, format!("{}\n", text).as_bytes())
}

fn run_kpi(args: DataArgs) -> Result<()> {
    let (board, _) = load_board(&args)?;
    let text = serde_json::to_string_pretty(board.kpis()).context("Failed to serialize KPIs")?;
    write_output(None, format!("{}\n", text).as_bytes())
}
