//! Pairs each source RPM with the binary RPMs built from it.
//!
//! Meant for build result directories where every SRPM sits next to its
//! RPMs; a binary RPM is only attributed to a source RPM in its own
//! directory.

use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use repo_xref::xref::{report, PairingEngine, XrefPipeline};
use repo_xref::{RepoSpec, RepodataProvider, XrefConfig};

/// List source RPMs and the binary RPMs paired with them
#[derive(Parser, Debug)]
#[command(name = "srpm-pairs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Repository location (local path or file:// URL)
    repo: Option<String>,

    /// Configuration file (TOML or JSON)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let Some(location) = args.repo else {
        eprintln!("one argument expected - repourl");
        return Ok(ExitCode::from(1));
    };

    repo_xref::logging::init(args.debug);

    let config = match &args.config {
        Some(path) => XrefConfig::from_file(path)?,
        None => XrefConfig::default(),
    };

    let pipeline = XrefPipeline::with_config(Arc::new(RepodataProvider::new()), &config.loader);
    let repo = RepoSpec::new(location).with_hotfixes(config.loader.module_hotfixes);
    let result = pipeline.run(vec![repo], &PairingEngine::new()).await?;

    report::render_warnings(&result.output.warnings, &mut std::io::stderr().lock())?;

    let mut stdout = std::io::stdout().lock();
    report::render_pairs(&result.output.pairs, &mut stdout)?;
    stdout.flush()?;

    Ok(ExitCode::SUCCESS)
}
