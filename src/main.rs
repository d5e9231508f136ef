use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;
use bibble::{RenderConfig, Renderer};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Render a BibTeX .bib file to HTML using an HTML template.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// BibTeX or BibLaTeX database to render
    #[arg(value_name = "BIBFILE.bib")]
    bibfile: PathBuf,

    /// Template that receives the sorted `entries`
    #[arg(value_name = "TEMPLATE.html")]
    template: PathBuf,

    /// Write the rendered output here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render a placeholder venue for entry types without a venue rule
    #[arg(long)]
    lenient: bool,

    /// Normalize and sort entries on all cores
    #[arg(long)]
    parallel: bool,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "bibble=debug" } else { "bibble=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let bib = std::fs::read_to_string(&cli.bibfile)
        .with_context(|| format!("Failed to read {}", cli.bibfile.display()))?;
    let template = std::fs::read_to_string(&cli.template)
        .with_context(|| format!("Failed to read {}", cli.template.display()))?;

    let renderer = Renderer::new().with_config(RenderConfig {
        lenient_venues: cli.lenient,
        run_in_parallel: cli.parallel,
    });
    let html = renderer
        .render(&bib, &template)
        .with_context(|| format!("Failed to render {}", cli.bibfile.display()))?;

    match cli.output {
        Some(path) => {
            std::fs::write(&path, format!("{html}\n"))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!(path = %path.display(), "wrote output");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{html}")?;
        }
    }

    Ok(())
}
