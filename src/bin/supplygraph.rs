//! supplygraph CLI
//!
//! Traces one or more root products through a YAML catalog and writes the
//! diagram (DOT, Cypher, JSON) or an emissions report.
//!
//! ```text
//! supplygraph supply-chain-data.yml --root product1 -o diagram.gv --svg
//! supplygraph data.yml --root bike --root scooter --format report -o out.json
//! ```
//!
//! With several roots and `--output`, the root id is appended to the file
//! stem (`out-bike.json`, `out-scooter.json`). Exit code 1 on any error; no
//! file is written for a root whose trace fails.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::{fmt, EnvFilter};

use supplygraph::config::LocatorConfig;
use supplygraph::{Config, SupplyChain, Trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Graphviz DOT source
    Dot,
    /// Cypher CREATE script
    Cypher,
    /// Diagram nodes and edges as JSON
    Json,
    /// Emissions report as JSON
    Report,
}

/// Supply-chain diagrams with transport CO2e estimates
#[derive(Debug, Parser)]
#[command(name = "supplygraph")]
#[command(version)]
#[command(about = "Render a supply-chain diagram and estimate transport emissions")]
struct Cli {
    /// YAML catalog of materials, products and suppliers
    catalog: PathBuf,

    /// Product to trace; repeat for several
    #[arg(short, long = "root", required = true)]
    roots: Vec<String>,

    #[arg(short, long, value_enum, default_value_t = Format::Dot)]
    format: Format,

    /// Output file; stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML run configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// YAML address table; overrides the configured locator
    #[arg(short, long)]
    gazetteer: Option<PathBuf>,

    /// Also run `dot -Tsvg` on each DOT output file
    #[arg(long)]
    svg: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    run(cli)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.output.is_none() && cli.roots.len() > 1 {
        bail!("--output is required when tracing more than one root");
    }
    if cli.svg && (cli.format != Format::Dot || cli.output.is_none()) {
        bail!("--svg needs --format dot and --output");
    }

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(path) = &cli.gazetteer {
        config.locator = LocatorConfig::Gazetteer { path: Some(path.clone()) };
    }

    let chain = SupplyChain::open(&cli.catalog)
        .with_context(|| format!("loading catalog {}", cli.catalog.display()))?
        .configured(&config);
    let locator = config.locator.build().context("building locator")?;

    for root in &cli.roots {
        let trace = chain
            .trace(root, &locator)
            .with_context(|| format!("tracing '{root}'"))?;

        tracing::info!(
            root = %root,
            total_kg = trace.total_emissions_kg(),
            nodes = trace.diagram.nodes().len(),
            edges = trace.diagram.edges().len(),
            "rendering"
        );

        match output_path(cli.output.as_deref(), root, cli.roots.len() > 1) {
            Some(path) => {
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                let mut writer = BufWriter::new(file);
                write_trace(&trace, cli.format, &config, &mut writer)?;
                writer.flush()?;
                eprintln!("{root}: {:.4} kg CO2e -> {}", trace.total_emissions_kg(), path.display());

                if cli.svg {
                    render_svg(&path)?;
                }
            }
            None => {
                let stdout = std::io::stdout();
                let mut writer = stdout.lock();
                write_trace(&trace, cli.format, &config, &mut writer)?;
                writer.flush()?;
            }
        }
    }

    Ok(())
}

fn write_trace(trace: &Trace, format: Format, config: &Config, writer: &mut dyn Write) -> anyhow::Result<()> {
    match format {
        Format::Dot => trace.render_dot(&config.diagram, writer)?,
        Format::Cypher => trace.export_cypher(writer)?,
        Format::Json => writeln!(writer, "{}", trace.diagram.to_json()?)?,
        Format::Report => writeln!(writer, "{}", trace.report().to_json()?)?,
    }
    Ok(())
}

/// `out.gv` → `out-<root>.gv` when tracing several roots.
fn output_path(output: Option<&Path>, root: &str, suffix: bool) -> Option<PathBuf> {
    let output = output?;
    if !suffix {
        return Some(output.to_path_buf());
    }
    let stem = output.file_stem().map(|s| s.to_string_lossy()).unwrap_or_default();
    let name = match output.extension() {
        Some(ext) => format!("{stem}-{root}.{}", ext.to_string_lossy()),
        None => format!("{stem}-{root}"),
    };
    Some(output.with_file_name(name))
}

fn render_svg(dot_path: &Path) -> anyhow::Result<()> {
    let svg_path = dot_path.with_extension("svg");
    let status = Command::new("dot")
        .arg("-Tsvg")
        .arg(dot_path)
        .arg("-o")
        .arg(&svg_path)
        .status()
        .context("running graphviz `dot`; is it installed?")?;
    if !status.success() {
        bail!("`dot` exited with {status}");
    }
    tracing::info!(path = %svg_path.display(), "wrote svg");
    Ok(())
}
