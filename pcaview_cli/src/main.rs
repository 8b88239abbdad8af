use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};
use pcaview::{
    derive, extract_color_encoding, validate, ExtensionMatch, PcaError, ResultDocument, SectionId,
    Session, ViewerConfig,
};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod report;

use report::HtmlSurface;

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and plot precomputed PCA result files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check one or more result files and report problems
    Validate(ValidateArgs),
    /// Print the summary statistics of a result file
    Stats(StatsArgs),
    /// Write a self-contained HTML report with the interactive charts
    Render(RenderArgs),
    /// Export the points or per-component table as CSV
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
struct CommonArgs {
    /// Viewer configuration JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Accept `.JSON`, `.Json`, ... as well as `.json`
    #[arg(long, action = ArgAction::SetTrue)]
    ignore_extension_case: bool,

    /// Verbose logging
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Result files to check
    #[arg(required = true, value_hint = ValueHint::FilePath)]
    inputs: Vec<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct StatsArgs {
    /// Result file
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Print the statistics as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Result file
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output HTML path
    #[arg(short, long, default_value = "pca_report.html", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    /// Sections shown initially (comma separated: pca,contribution,cumulative)
    #[arg(long)]
    sections: Option<String>,

    /// Also write the chart descriptions as JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    charts_json: Option<PathBuf>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Result file
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Table to export
    #[arg(long, value_enum, default_value_t = TableOpt::Points)]
    table: TableOpt,

    /// Output CSV path (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TableOpt {
    Points,
    Components,
}

impl Command {
    fn common(&self) -> &CommonArgs {
        match self {
            Command::Validate(args) => &args.common,
            Command::Stats(args) => &args.common,
            Command::Render(args) => &args.common,
            Command::Export(args) => &args.common,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.command.common().verbose {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match cli.command {
        Command::Validate(args) => handle_validate(args),
        Command::Stats(args) => handle_stats(args),
        Command::Render(args) => handle_render(args),
        Command::Export(args) => handle_export(args),
    }
}

fn load_config(common: &CommonArgs) -> Result<ViewerConfig> {
    let mut config = match common.config.as_ref() {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    if common.ignore_extension_case {
        config.extension_match = ExtensionMatch::IgnoreCase;
    }
    debug!(?config, "viewer configuration");
    Ok(config)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_text(path: &Path) -> Result<String, PcaError> {
    fs::read_to_string(path).map_err(|e| PcaError::ReadFailed(format!("{}: {e}", path.display())))
}

/// Name filter, read and validation without any presentation.
fn load_document(path: &Path, config: &ViewerConfig) -> Result<ResultDocument, PcaError> {
    let name = file_name_of(path);
    if !config.extension_match.accepts(&name) {
        return Err(PcaError::UnsupportedFileType(name));
    }
    validate(&read_text(path)?)
}

fn handle_validate(args: ValidateArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let outcomes: Vec<(PathBuf, Result<ResultDocument, PcaError>)> = args
        .inputs
        .par_iter()
        .map(|path| (path.clone(), load_document(path, &config)))
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failures = 0usize;
    for (path, outcome) in &outcomes {
        match outcome {
            Ok(doc) => {
                writeln!(
                    out,
                    "OK    {} ({} points, {} components)",
                    path.display(),
                    doc.points.len(),
                    doc.component_count()
                )?;
                for note in doc.consistency_warnings() {
                    writeln!(out, "      warning: {note}")?;
                }
            }
            Err(err) => {
                failures += 1;
                writeln!(out, "ERROR {}: {err}", path.display())?;
            }
        }
    }
    out.flush()?;

    if failures > 0 {
        return Err(anyhow!("{failures} of {} file(s) failed validation", outcomes.len()));
    }
    info!("{} file(s) valid", outcomes.len());
    Ok(())
}

fn handle_stats(args: StatsArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let doc = load_document(&args.input, &config)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    let stats = derive(&doc)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &stats)?;
        writeln!(out)?;
    } else {
        for card in stats.cards() {
            writeln!(out, "{:<18} {}", card.label, card.value)?;
        }
    }
    Ok(())
}

fn parse_sections(input: &str) -> Result<Vec<SectionId>> {
    let mut out = Vec::new();
    for token in input.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let section: SectionId = token.parse()?;
        if !out.contains(&section) {
            out.push(section);
        }
    }
    Ok(out)
}

fn handle_render(args: RenderArgs) -> Result<()> {
    let mut config = load_config(&args.common)?;
    if let Some(list) = args.sections.as_ref() {
        config.default_sections = parse_sections(list)?;
        if config.default_sections.is_empty() {
            warn!("--sections selected nothing; report will only show statistics");
        }
    }

    let mut session = Session::new(config);
    let mut surface = HtmlSurface::default();
    let name = file_name_of(&args.input);
    let outcome = session.handle_upload(&name, || read_text(&args.input), &mut surface);
    for message in &surface.alerts {
        warn!("{message}");
    }
    outcome.with_context(|| format!("failed to load {}", args.input.display()))?;

    let html = report::render_html(&surface, &session, &chrono::Utc::now());
    fs::write(&args.output, html)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    info!(
        "Wrote report: {} ({} chart(s))",
        args.output.display(),
        surface.charts.len()
    );

    if let Some(path) = args.charts_json.as_ref() {
        let charts: BTreeMap<&str, _> = surface
            .charts
            .iter()
            .map(|(section, chart)| (section.as_str(), chart))
            .collect();
        let text = serde_json::to_string_pretty(&charts)?;
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote chart descriptions: {}", path.display());
    }
    Ok(())
}

fn handle_export(args: ExportArgs) -> Result<()> {
    let config = load_config(&args.common)?;
    let doc = load_document(&args.input, &config)
        .with_context(|| format!("failed to load {}", args.input.display()))?;

    if args.output.as_os_str() == "-" {
        let stdout = io::stdout();
        let mut writer = csv::Writer::from_writer(stdout.lock());
        write_table(&doc, args.table, &mut writer)
    } else {
        let file = File::create(&args.output)
            .with_context(|| format!("failed to create {}", args.output.display()))?;
        let mut writer = csv::Writer::from_writer(file);
        write_table(&doc, args.table, &mut writer)?;
        info!("Wrote {:?} table: {}", args.table, args.output.display());
        Ok(())
    }
}

fn write_table<W: Write>(doc: &ResultDocument, table: TableOpt, writer: &mut csv::Writer<W>) -> Result<()> {
    match table {
        TableOpt::Points => write_point_rows(doc, writer)?,
        TableOpt::Components => write_component_rows(doc, writer)?,
    }
    writer.flush()?;
    Ok(())
}

fn write_point_rows<W: Write>(doc: &ResultDocument, writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record(["index", "label", "x", "y", "time_ps", "color_value"])?;
    let encoding = extract_color_encoding(&doc.points);
    for (idx, point) in doc.points.iter().enumerate() {
        writer.write_record([
            idx.to_string(),
            point.label.clone(),
            point.x.to_string(),
            point.y.to_string(),
            encoding.times_ps[idx]
                .map(|t| t.to_string())
                .unwrap_or_default(),
            encoding.values[idx].to_string(),
        ])?;
    }
    Ok(())
}

fn write_component_rows<W: Write>(doc: &ResultDocument, writer: &mut csv::Writer<W>) -> Result<()> {
    writer.write_record([
        "component",
        "explained_variance_ratio",
        "explained_variance_pct",
        "cumulative_variance_ratio",
    ])?;
    for (idx, ratio) in doc.explained_variance_ratio_all.iter().enumerate() {
        let cumulative = doc
            .cumulative_variance_ratio_all
            .get(idx)
            .map(|c| c.to_string())
            .unwrap_or_default();
        writer.write_record([
            format!("PC{}", idx + 1),
            ratio.to_string(),
            format!("{:.2}", ratio * 100.0),
            cumulative,
        ])?;
    }
    Ok(())
}
