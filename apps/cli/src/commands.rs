//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use partnerscout_core::{
    EnrichmentPipeline, GapFillSummary, Pacer, PipelineOptions, ProgressReporter, RetryPolicy,
    RetryingGenerator, RetryingSource, run_benchmark,
};
use partnerscout_crawler::PageFetcher;
use partnerscout_llm::{Backend, TextGenerator, build_generator};
use partnerscout_search::TavilyClient;
use partnerscout_shared::{
    AppConfig, PartnershipRecord, init_config, load_config, load_config_from, resolve_secret,
};
use partnerscout_storage::{RecordTable, default_output_path, split_table, write_grid, write_rows};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PartnerScout: track AI partnership announcements.
#[derive(Parser)]
#[command(
    name = "partnerscout",
    version,
    about = "Discover AI partnerships on the open web and fill gaps in a partnership table.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.partnerscout/partnerscout.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Search the web for partnerships missing from the input table.
    Discover {
        /// Table of known partnerships.
        #[arg(short, long, default_value = "data/AI Partnerships.csv")]
        input: PathBuf,

        /// Where newly discovered partnerships are written.
        #[arg(short, long, default_value = "data/new_partnerships.csv")]
        output: PathBuf,

        /// Recency window in days (overrides [pipeline].days_back).
        #[arg(long)]
        days_back: Option<u32>,

        /// Results per query (overrides [pipeline].max_results_per_query).
        #[arg(long)]
        max_results: Option<usize>,

        /// Search query; repeat to run several. Replaces the configured list.
        #[arg(short, long = "query")]
        queries: Vec<String>,

        /// Write discovered records without looking up summaries.
        #[arg(long)]
        skip_enrich: bool,
    },

    /// Fill missing dates, links, and summaries in an existing table.
    Fill {
        /// Table to enrich.
        input: PathBuf,

        /// Output table (defaults to <input>_updated.csv).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Benchmark summarization models over a table's raw content.
    Compare {
        /// Table with a raw_content column.
        input: PathBuf,

        /// Directory for the comparison and statistics tables.
        #[arg(short, long, default_value = "data/benchmark")]
        out_dir: PathBuf,
    },

    /// Fetch a page and print it as Markdown.
    Crawl {
        /// Page URL.
        url: String,
    },

    /// Split a table into fixed-size chunks.
    Split {
        /// Table to split.
        input: PathBuf,

        /// Chunk path prefix (defaults to the input path without extension).
        #[arg(short, long)]
        prefix: Option<PathBuf>,

        /// Data rows per chunk.
        #[arg(long, default_value = "50")]
        max_rows: usize,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "partnerscout=info",
        1 => "partnerscout=debug",
        _ => "partnerscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Discover {
            input,
            output,
            days_back,
            max_results,
            queries,
            skip_enrich,
        } => {
            let mut config = resolve_config(config_path)?;
            if let Some(days) = days_back {
                config.pipeline.days_back = days;
            }
            if let Some(n) = max_results {
                config.pipeline.max_results_per_query = n;
            }
            if !queries.is_empty() {
                config.pipeline.discovery_queries = queries;
            }
            cmd_discover(&config, &input, &output, skip_enrich).await
        }
        Command::Fill { input, output } => {
            let config = resolve_config(config_path)?;
            let output = output.unwrap_or_else(|| default_output_path(&input));
            cmd_fill(&config, &input, &output).await
        }
        Command::Compare { input, out_dir } => {
            let config = resolve_config(config_path)?;
            cmd_compare(&config, &input, &out_dir).await
        }
        Command::Crawl { url } => {
            let config = resolve_config(config_path)?;
            cmd_crawl(&config, &url).await
        }
        Command::Split {
            input,
            prefix,
            max_rows,
        } => cmd_split(&input, prefix.as_deref(), max_rows),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config file and apply environment overrides once.
fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config.with_env_overrides(env_var))
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Wire the search and generation backends into a pipeline.
///
/// Missing API keys fail here, before any record is read.
fn build_pipeline(config: &AppConfig) -> Result<EnrichmentPipeline> {
    let policy = RetryPolicy::from_config(&config.pipeline);

    let api_key = resolve_secret(&config.search.api_key_env, env_var)?;
    let tavily = TavilyClient::new(&config.search.endpoint, api_key, config.search.timeout_secs)?;

    let backend = Backend::from_config(&config.llm);
    let generator = build_generator(&config.llm, backend, None, env_var)?;
    info!(?backend, model = generator.model(), "text generator ready");

    Ok(EnrichmentPipeline::new(
        Arc::new(RetryingSource::new(tavily, policy)),
        Arc::new(RetryingGenerator::new(generator, policy)),
        Pacer::per_second(config.pipeline.requests_per_second),
        PipelineOptions::from_config(config),
    ))
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_discover(
    config: &AppConfig,
    input: &Path,
    output: &Path,
    skip_enrich: bool,
) -> Result<()> {
    let queries = &config.pipeline.discovery_queries;
    if queries.is_empty() {
        return Err(eyre!("no discovery queries configured"));
    }

    let pipeline = build_pipeline(config)?;
    let table = RecordTable::read(input)?;
    let mut known = table.known_pairs();
    info!(
        input = %input.display(),
        known = known.len(),
        queries = queries.len(),
        days_back = config.pipeline.days_back,
        "starting discovery"
    );

    let mut found = pipeline
        .discover(
            &mut known,
            queries,
            config.pipeline.max_results_per_query,
            &CliProgress::new(),
        )
        .await;

    if found.is_empty() {
        println!("No new partnerships found.");
        return Ok(());
    }

    if !skip_enrich {
        let summary = pipeline.fill_gaps(&mut found, &CliProgress::new()).await;
        info!(?summary, "enriched discovered records");
    }

    RecordTable::from_records(found.clone()).write(output)?;

    println!();
    println!("  New partnerships: {}", found.len());
    for record in &found {
        println!(
            "    {} & {} ({})",
            record.partner1,
            record.partner2,
            record.announced.as_deref().unwrap_or("date unknown")
        );
    }
    println!("  Written to:       {}", output.display());
    println!();

    Ok(())
}

async fn cmd_fill(config: &AppConfig, input: &Path, output: &Path) -> Result<()> {
    let pipeline = build_pipeline(config)?;
    let mut table = RecordTable::read(input)?;
    info!(input = %input.display(), records = table.len(), "filling gaps");

    let summary = pipeline
        .fill_gaps(table.records_mut(), &CliProgress::new())
        .await;
    table.write(output)?;

    print_gap_summary(&summary, output);
    Ok(())
}

fn print_gap_summary(summary: &GapFillSummary, output: &Path) {
    println!();
    println!("  Records:    {}", summary.total);
    println!("  Looked up:  {}", summary.lookups);
    println!("  Refreshed:  {}", summary.refreshes);
    println!("  Complete:   {}", summary.complete);
    println!("  Skipped:    {}", summary.skipped);
    println!("  Written to: {}", output.display());
    println!();
}

async fn cmd_compare(config: &AppConfig, input: &Path, out_dir: &Path) -> Result<()> {
    let mut generators: Vec<Box<dyn TextGenerator>> = Vec::new();
    for model in &config.benchmark.ollama_models {
        generators.push(build_generator(&config.llm, Backend::Ollama, Some(model), env_var)?);
    }
    for model in &config.benchmark.openai_models {
        generators.push(build_generator(&config.llm, Backend::OpenAi, Some(model), env_var)?);
    }
    if generators.is_empty() {
        return Err(eyre!("no benchmark models configured"));
    }

    let records: Vec<PartnershipRecord> = RecordTable::read(input)?.into_records();
    info!(
        input = %input.display(),
        records = records.len(),
        models = generators.len(),
        "starting benchmark"
    );

    let report = run_benchmark(
        &generators,
        &config.benchmark.prompt,
        &records,
        config.llm.max_content_chars,
        &CliProgress::new(),
    )
    .await;

    let (headers, rows) = report.comparison_table(&records);
    let summaries_path = out_dir.join("model_summaries.csv");
    write_grid(&summaries_path, &headers, &rows)?;

    let stats = report.stats();
    let stats_path = out_dir.join("model_stats.csv");
    write_rows(&stats_path, &stats)?;

    println!();
    println!(
        "  {:<24} {:>6} {:>10} {:>10} {:>10}",
        "Model", "Calls", "Avg (s)", "Median (s)", "Avg len"
    );
    for s in &stats {
        println!(
            "  {:<24} {:>6} {:>10.2} {:>10.2} {:>10.1}",
            s.model, s.calls, s.mean_secs, s.median_secs, s.mean_len
        );
    }
    println!();
    println!("  Summaries:  {}", summaries_path.display());
    println!("  Statistics: {}", stats_path.display());
    println!();

    Ok(())
}

async fn cmd_crawl(config: &AppConfig, url: &str) -> Result<()> {
    let fetcher = PageFetcher::new(config.search.timeout_secs)?;
    let page = fetcher.fetch(url).await?;
    info!(url = %page.url, title = ?page.title, "page fetched");
    print!("{}", page.markdown);
    Ok(())
}

fn cmd_split(input: &Path, prefix: Option<&Path>, max_rows: usize) -> Result<()> {
    let prefix = prefix.map_or_else(|| default_split_prefix(input), Path::to_path_buf);
    let written = split_table(input, &prefix, max_rows)?;
    for path in &written {
        println!("{}", path.display());
    }
    info!(chunks = written.len(), "table split");
    Ok(())
}

fn default_split_prefix(input: &Path) -> PathBuf {
    input.with_extension("")
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner. One per operation.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn query_started(&self, query: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Searching [{current}/{total}] {query}"));
    }

    fn record_started(&self, label: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Processing [{current}/{total}] {label}"));
    }

    fn partnership_found(&self, record: &PartnershipRecord) {
        self.spinner
            .println(format!("  + {} & {}", record.partner1, record.partner2));
    }

    fn done(&self, message: &str) {
        self.spinner.finish_and_clear();
        eprintln!("{message}");
    }
}
