//! Indexes every package of one or more repositories into a single JSON
//! document keyed by package file name.

use std::io::Write;
use std::sync::Arc;

use clap::Parser;
use repo_xref::xref::{report, IndexBuilder, ListStage, XrefPipeline};
use repo_xref::{RepoSpec, RepodataProvider, XrefConfig};

/// Index repository packages with checksums, dependencies and module labels
#[derive(Parser, Debug)]
#[command(name = "repo-index")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Repository location (local path or file:// URL); repeatable
    #[arg(long = "repo", required = true)]
    repos: Vec<String>,

    /// Print `name version release repoid arch` per package instead of JSON
    #[arg(long)]
    summary: bool,

    /// Skip module label resolution
    #[arg(long)]
    no_modules: bool,

    /// Pretty-print the JSON document
    #[arg(long)]
    pretty: bool,

    /// Configuration file (TOML or JSON)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    repo_xref::logging::init(args.debug);

    let config = match &args.config {
        Some(path) => XrefConfig::from_file(path)?,
        None => XrefConfig::default(),
    };

    let repos: Vec<RepoSpec> = args
        .repos
        .iter()
        .map(|location| {
            let repo = RepoSpec::new(location.as_str()).with_hotfixes(config.loader.module_hotfixes);
            tracing::info!("Using repo ID {} => {}", repo.id, repo.location);
            repo
        })
        .collect();

    let pipeline = XrefPipeline::with_config(Arc::new(RepodataProvider::new()), &config.loader);
    let mut stdout = std::io::stdout().lock();

    if args.summary {
        let result = pipeline.run(repos, &ListStage).await?;
        report::render_summary(&result.output.packages, &mut stdout)?;
    } else {
        let builder = IndexBuilder::new(config.classifier.clone())
            .with_module_resolution(!args.no_modules);
        let result = pipeline.run(repos, &builder).await?;
        report::render_warnings(&result.output.warnings, &mut std::io::stderr().lock())?;
        report::render_index(&result.output.index, args.pretty, &mut stdout)?;
    }

    stdout.flush()?;
    Ok(())
}
