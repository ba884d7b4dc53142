use super::index_client;
use crate::console;
use anyhow::Result;
use clap::Args;
use pydeps_core::operations::{self, DependencyReport};
use pydeps_core::resolve::{DEFAULT_MAX_DEPTH, NodeState};
use pydeps_core::{PydepsConfig, ResolveRequest, ResolverSettings};
use tokio_util::sync::CancellationToken;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Root package name
    pub package: String,

    /// Resolve this release of the root instead of the latest
    #[arg(long = "release", value_name = "VERSION")]
    pub version: Option<String>,

    /// Target Python version used to evaluate environment markers
    #[arg(long)]
    pub python: Option<String>,

    /// Optional feature of the root package to include (repeatable)
    #[arg(short = 'e', long = "extra")]
    pub extras: Vec<String>,

    /// Include development groups (test, docs, lint, ...) of every package
    #[arg(short = 'D', long)]
    pub dev: bool,

    /// Maximum depth to expand (1 to 20)
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub depth: usize,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: ResolveArgs, config: &PydepsConfig) -> Result<()> {
    if !args.json {
        console::header("resolve");
    }

    let mut request = ResolveRequest::new(&args.package)
        .extras(args.extras)
        .include_development(args.dev)
        .max_depth(args.depth);

    if let Some(version) = &args.version {
        request = request.pinned(version);
    }
    if let Some(python) = &args.python {
        request = request.python(python);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let index = index_client(config)?;
    let settings = ResolverSettings::from_config(config);
    let report =
        operations::resolve_dependencies_with_cancel(index, settings, &request, &cancel).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    print_report(&report);
    Ok(())
}

fn print_report(report: &DependencyReport) {
    let resolution = &report.resolution;
    let analysis = &report.analysis;

    print!("{}", resolution.tree.render());

    let failed: Vec<_> = resolution
        .nodes
        .values()
        .filter_map(|node| match &node.state {
            NodeState::FetchFailed { message, .. } => Some((node.name.as_str(), message)),
            _ => None,
        })
        .collect();

    for (name, message) in &failed {
        console::warn(&format!("could not fetch {}: {}", name, message));
    }

    for edge in &resolution.circular_dependencies {
        console::warn(&format!(
            "circular dependency {} -> {} at depth {}",
            edge.from, edge.to, edge.at_depth
        ));
    }

    console::section("summary");
    console::info(&format!(
        "  packages: {} ({} transitive)",
        resolution.nodes.len(),
        analysis.summary.total_transitive_packages
    ));
    console::info(&format!(
        "  depth: max {}, average {:.2}",
        analysis.depth.max_depth, analysis.depth.average_depth
    ));
    console::info(&format!(
        "  direct: {} runtime, {} development, {} optional groups",
        analysis.summary.direct_runtime_count,
        analysis.summary.direct_dev_count,
        analysis.summary.direct_optional_groups
    ));
    console::info(&format!(
        "  complexity: {} ({:?}) {}",
        analysis.complexity.score,
        analysis.complexity.level,
        console::dim(analysis.complexity.recommendation)
    ));
    console::info(&format!(
        "  install estimate: ~{}s, ~{} MB ({:?})",
        analysis.performance.estimated_install_time_seconds,
        analysis.performance.estimated_memory_footprint_mb,
        analysis.performance.performance_level
    ));

    for conflict in &analysis.potential_conflicts {
        let sources: Vec<String> = conflict
            .requirements
            .iter()
            .map(|source| format!("{} wants {}", source.required_by, source.constraint))
            .collect();
        console::warn(&format!(
            "possible conflict on {}: {}",
            conflict.package,
            sources.join(", ")
        ));
    }

    for recommendation in &analysis.performance.recommendations {
        console::info(&console::dim(&format!("  {}", recommendation)));
    }
}
