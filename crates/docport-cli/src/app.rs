//! CLI application logic
//!
//! Contains the command-line interface implementation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use docport_core::{
    DirectoryDelivery, ExportFormat, ExportOutcome, Exporter, SemanticExporter, TabularExporter,
};
use docport_ooxml::HtmlDocxPackager;
use docport_pdf::{NativeRasterizer, RasterExporter};
use docport_snapshot::HttpFetcher;
use docport_surface::RenderTree;

use crate::config::Settings;

#[derive(Parser)]
#[command(name = "docport")]
#[command(author, version, about = "Export rendered editor documents to PDF, DOCX and XLSX", long_about = None)]
struct Cli {
    /// Log pipeline steps (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a paginated image PDF
    Pdf(ExportArgs),
    /// Export a styled DOCX
    Docx(ExportArgs),
    /// Export the document text as an XLSX sheet
    Xlsx(ExportArgs),
    /// Run all three exports
    All(ExportArgs),
}

/// Arguments shared by every export command
#[derive(Debug, Clone, Default, Args)]
pub struct ExportArgs {
    /// Rendered editor markup (HTML or XHTML)
    pub input: PathBuf,

    /// Id of the editor surface element
    #[arg(long)]
    pub root: Option<String>,

    /// Extra host stylesheet(s)
    #[arg(long)]
    pub stylesheet: Vec<PathBuf>,

    /// Base name of exported files
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (default: ./docport.toml if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// URL relative image sources resolve against (default: input directory)
    #[arg(long)]
    pub base_url: Option<String>,
}

/// Run the CLI application
///
/// Parses arguments, installs logging and dispatches to [`export_command`].
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let (formats, args) = match cli.command {
        Commands::Pdf(args) => (vec![ExportFormat::Pdf], args),
        Commands::Docx(args) => (vec![ExportFormat::Docx], args),
        Commands::Xlsx(args) => (vec![ExportFormat::Xlsx], args),
        Commands::All(args) => (ExportFormat::ALL.to_vec(), args),
    };

    println!("docport v{}", docport_core::VERSION);
    println!("Exporting: {}", args.input.display());
    for outcome in export_command(&formats, &args).await? {
        match outcome {
            ExportOutcome::Delivered { path, bytes, .. } => {
                println!("  Created: {} ({} bytes)", path.display(), bytes);
            }
            ExportOutcome::Skipped { format } => {
                println!("  Skipped {}: no editor surface", format);
            }
        }
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Execute the export command for `formats`.
///
/// The three formats of `all` run concurrently. Every format runs to
/// completion and the first failure is returned afterwards.
pub async fn export_command(formats: &[ExportFormat], args: &ExportArgs) -> Result<Vec<ExportOutcome>> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let mut settings = Settings::discover(args.config.as_deref())?;
    if let Some(name) = &args.name {
        settings.export.file_name = name.clone();
    }
    if let Some(output) = &args.output {
        settings.export.output_dir = output.clone();
    }

    let tree = load_tree(&args.input, args.root.as_deref(), &args.stylesheet)?;

    let fetcher = match &args.base_url {
        Some(url) => HttpFetcher::new()
            .with_base_url(url)
            .with_context(|| format!("Invalid base URL: {}", url))?,
        None => HttpFetcher::new().with_base_dir(input_dir(&args.input)),
    };

    let exporter = Exporter::new(
        RasterExporter::new(NativeRasterizer::new(fetcher.clone()))
            .with_options(settings.capture_options()),
        SemanticExporter::with_packager(fetcher, HtmlDocxPackager::new(settings.docx_options())),
        TabularExporter::new(),
        DirectoryDelivery::new(&settings.export.output_dir),
    )
    .with_file_name(settings.export.file_name.clone());

    let results: Vec<_> = if formats == ExportFormat::ALL.as_slice() {
        exporter.export_all(&tree).await.into_iter().collect()
    } else {
        let mut results = Vec::with_capacity(formats.len());
        for format in formats {
            results.push(exporter.export(*format, &tree).await);
        }
        results
    };

    let mut outcomes = Vec::with_capacity(results.len());
    let mut first_error = None;
    for (format, result) in formats.iter().zip(results) {
        match result {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::error!(%format, error = %e, "export failed");
                first_error.get_or_insert_with(|| {
                    let label = format.extension().to_uppercase();
                    anyhow::Error::new(e).context(format!("{} export failed", label))
                });
            }
        }
    }
    match first_error {
        Some(e) => Err(e),
        None => Ok(outcomes),
    }
}

/// Read the input page and any extra stylesheets into a render tree
pub fn load_tree(input: &Path, root: Option<&str>, stylesheets: &[PathBuf]) -> Result<RenderTree> {
    let markup = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input.display()))?;
    let mut tree = RenderTree::from_page(&markup, root)
        .with_context(|| format!("Failed to parse input file: {}", input.display()))?;
    for path in stylesheets {
        let css = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read stylesheet: {}", path.display()))?;
        tree = tree.with_stylesheet(&css);
    }
    Ok(tree)
}

fn input_dir(input: &Path) -> PathBuf {
    match input.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_all_flags() {
        let cli = Cli::try_parse_from([
            "docport",
            "all",
            "page.html",
            "--root",
            "editor",
            "--stylesheet",
            "a.css",
            "--stylesheet",
            "b.css",
            "--name",
            "Report",
            "--output",
            "out",
            "--base-url",
            "https://example.com/",
        ])
        .unwrap();
        let Commands::All(args) = cli.command else {
            panic!("expected all");
        };
        assert_eq!(args.root.as_deref(), Some("editor"));
        assert_eq!(args.stylesheet.len(), 2);
        assert_eq!(args.name.as_deref(), Some("Report"));
        assert_eq!(args.output, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_input_dir() {
        assert_eq!(input_dir(Path::new("page.html")), PathBuf::from("."));
        assert_eq!(input_dir(Path::new("a/b/page.html")), PathBuf::from("a/b"));
    }
}
