// SPDX-License-Identifier: MIT OR Apache-2.0
//! texprep - prepare scanned material graphs and mix color variants.

mod args;
mod palette;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use palette::StaticPalette;
use std::fs;
use std::path::{Path, PathBuf};
use texprep_engine::{
    ColorResolver, ColorSpec, EngineConfig, ExplicitList, MixRequest, NearestPalette, ProceduralSpread, Session,
    SessionReport,
};
use texprep_graph::library::create_compositing_registry;
use texprep_graph::{Graph, NodeId, Position, PropertyValue, Rgba, PHYSICAL_SIZE};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "texprep")]
#[command(about = "Prepare scanned material graphs and mix color variants")]
#[command(version)]
struct Cli {
    /// Config file path, `texprep.ron` next to the graph by default
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean up a scanned material and derive its displacement output
    Prep {
        /// Graph file (RON)
        graph: PathBuf,

        /// Where to write the result, the input file by default
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replicate a source map into color variants
    Mix(MixArgs),

    /// Set the physical size of each graph from its bitmap resolution, in place
    Size {
        /// Graph files (RON)
        #[arg(required = true)]
        graphs: Vec<PathBuf>,
    },

    /// Print the nodes of a graph in evaluation order
    Inspect {
        /// Graph file (RON)
        graph: PathBuf,
    },
}

#[derive(Args)]
struct MixArgs {
    /// Graph file (RON)
    graph: PathBuf,

    /// Label of the node to replicate
    #[arg(short, long)]
    source: String,

    /// Number of variants, the number of given colors by default
    #[arg(short = 'n', long)]
    count: Option<usize>,

    /// Explicit colors (repeatable, e.g. "#b03a2e")
    #[arg(long = "color", value_parser = args::parse_hex_color, conflicts_with = "spots")]
    colors: Vec<Rgba>,

    /// Palette entries by name (repeatable)
    #[arg(long = "spot", requires_all = ["book", "palette"])]
    spots: Vec<String>,

    /// Palette book; without colors or spots, snaps the hue spread to it
    #[arg(long, requires = "palette")]
    book: Option<String>,

    /// Palette file (RON)
    #[arg(long)]
    palette: Option<PathBuf>,

    /// Replication anchor as x,y, the source position by default
    #[arg(long, value_parser = args::parse_position, allow_hyphen_values = true)]
    anchor: Option<Position>,

    /// Do not create outputs for the other bitmaps
    #[arg(long)]
    no_maps: bool,

    /// Where to write the result, the input file by default
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Logs go to stderr, results to stdout
    let env_filter = tracing_subscriber::EnvFilter::from_default_env().add_directive("texprep=info".parse()?);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    tracing::debug!("texprep v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let registry = create_compositing_registry();

    match cli.command {
        Commands::Prep { graph: path, output } => {
            let config = load_config(cli.config.as_deref(), &path)?;
            let mut graph = load_graph(&path)?;
            let session = Session::new(&registry, config);

            let report = session.prepare_material(&mut graph)?;
            print_report(&report);
            save_graph(&graph, output.as_deref().unwrap_or(&path))?;
        }

        Commands::Mix(args) => {
            let config = load_config(cli.config.as_deref(), &args.graph)?;
            let mut graph = load_graph(&args.graph)?;
            let source = find_source(&graph, &args.source)?;
            let palette = args
                .palette
                .as_deref()
                .map(|path| StaticPalette::load(path).with_context(|| format!("reading palette {}", path.display())))
                .transpose()?;
            let spread = ProceduralSpread::from(config.spread);
            let (colors, count) = color_resolver(&args, palette.as_ref(), spread)?;

            let session = Session::new(&registry, config);
            let request = MixRequest {
                source,
                count,
                anchor: args.anchor,
                expose_maps: !args.no_maps,
            };
            let outcome = session.mix_colors(&mut graph, &request, colors.as_ref())?;
            for handle in &outcome.outputs {
                let rgba = handle.color.rgba;
                match &handle.color.spot {
                    Some(spot) => println!("{}: {} / {}", handle.identifier, spot.book, spot.name),
                    None => println!("{}: ({:.3}, {:.3}, {:.3})", handle.identifier, rgba.r, rgba.g, rgba.b),
                }
            }
            print_report(&outcome.report);
            save_graph(&graph, args.output.as_deref().unwrap_or(&args.graph))?;
        }

        Commands::Size { graphs } => {
            for path in &graphs {
                let config = load_config(cli.config.as_deref(), path)?;
                let mut graph = load_graph(path)?;
                let report = Session::new(&registry, config).adjust_size(&mut graph)?;
                print_report(&report);
                if !report.is_clean() {
                    continue;
                }
                if let Some(size) = size_summary(&graph) {
                    println!("{}: physical size {size}", path.display());
                }
                save_graph(&graph, path)?;
            }
        }

        Commands::Inspect { graph: path } => {
            let mut graph = load_graph(&path)?;
            inspect(&mut graph)?;
        }
    }

    Ok(())
}

fn load_config(explicit: Option<&Path>, graph: &Path) -> Result<EngineConfig> {
    match explicit {
        Some(path) => EngineConfig::load(path).with_context(|| format!("reading config {}", path.display())),
        None => {
            let dir = graph.parent().unwrap_or_else(|| Path::new("."));
            EngineConfig::discover(dir).context("reading texprep.ron")
        }
    }
}

fn load_graph(path: &Path) -> Result<Graph> {
    let content = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let graph: Graph = ron::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
    tracing::debug!("Loaded '{}' with {} nodes", graph.name, graph.node_count());
    Ok(graph)
}

fn save_graph(graph: &Graph, path: &Path) -> Result<()> {
    let content = ron::ser::to_string_pretty(graph, ron::ser::PrettyConfig::default())?;
    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("Saved to {}", path.display());
    Ok(())
}

/// The single node carrying `label`
fn find_source(graph: &Graph, label: &str) -> Result<NodeId> {
    let mut matches = graph.nodes().filter(|n| n.label() == label);
    let Some(first) = matches.next() else {
        bail!("no node labelled '{label}'");
    };
    if matches.next().is_some() {
        bail!("more than one node is labelled '{label}'");
    }
    Ok(first.id)
}

/// Resolver chosen by the mix arguments, with the number of variants to create
fn color_resolver<'p>(
    args: &MixArgs,
    palette: Option<&'p StaticPalette>,
    spread: ProceduralSpread,
) -> Result<(Box<dyn ColorResolver + 'p>, usize)> {
    if !args.colors.is_empty() {
        let colors = args.colors.iter().copied().map(ColorSpec::Rgba).collect();
        let list: Box<dyn ColorResolver + 'p> = Box::new(ExplicitList::new(colors));
        return Ok((list, args.count.unwrap_or(args.colors.len())));
    }

    if !args.spots.is_empty() {
        let (Some(book), Some(palette)) = (&args.book, palette) else {
            bail!("--spot needs --book and --palette");
        };
        let colors = args
            .spots
            .iter()
            .map(|name| ColorSpec::Spot {
                book: book.clone(),
                name: name.clone(),
            })
            .collect();
        let list: Box<dyn ColorResolver + 'p> = Box::new(ExplicitList::new(colors).with_palette(palette));
        return Ok((list, args.count.unwrap_or(args.spots.len())));
    }

    let count = args.count.context("--count is required without --color or --spot")?;
    let resolver: Box<dyn ColorResolver + 'p> = match (&args.book, palette) {
        (Some(book), Some(palette)) => Box::new(NearestPalette::new(book, palette).with_spread(spread)),
        (Some(_), None) => bail!("--book needs --palette"),
        (None, _) => Box::new(spread),
    };
    Ok((resolver, count))
}

fn inspect(graph: &mut Graph) -> Result<()> {
    let order = graph.compute()?.order.clone();

    println!("{} ({} nodes, {} connections)", graph.name, graph.node_count(), graph.connection_count());
    if let Some(size) = size_summary(graph) {
        println!("  physical size: {size}");
    }
    for (rank, id) in order.iter().enumerate() {
        let Some(node) = graph.node(*id) else {
            continue;
        };
        let identifier = node.identifier().map(|i| format!(" [{i}]")).unwrap_or_default();
        println!(
            "  {rank:>3} {:<18} {:<24} ({}, {}){identifier}",
            node.definition,
            node.label(),
            node.position.x,
            node.position.y
        );
    }
    Ok(())
}

/// The physical size annotation as "x x y"
fn size_summary(graph: &Graph) -> Option<String> {
    match graph.graph_annotation(PHYSICAL_SIZE)? {
        PropertyValue::Float3([x, y, _]) => Some(format!("{x} x {y}")),
        other => Some(format!("{other:?}")),
    }
}

fn print_report(report: &SessionReport) {
    for pass in &report.passes {
        println!(
            "{}: {} created, {} removed",
            pass.name,
            pass.created.len(),
            pass.removed.len()
        );
        for skip in &pass.skipped {
            println!("  skipped {skip}");
        }
        if let Some(err) = &pass.aborted {
            println!("  stopped: {err}");
        }
    }
}
