//! CLI binary for pdf2tex.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, renders poll progress, and prints the final output
//! path.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2tex::{
    convert, ConversionConfig, ConversionProgress, Credentials, JobHandle, JobState,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress observer using indicatif ────────────────────────────────────

/// Terminal progress observer: a single in-place bar that tracks the
/// service-reported completion percentage during the poll phase, with
/// spinner-only rendering for the upload and download phases.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(spinner_style);
        bar.set_prefix("Uploading");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    /// Switch to the percentage bar once polling starts.
    fn activate_bar(&self) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgress for CliProgress {
    fn on_upload_start(&self, path: &Path) {
        self.bar.set_message(path.display().to_string());
    }

    fn on_submitted(&self, job: &JobHandle) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Submitted (job id: {job})"))
        ));
        self.activate_bar();
    }

    fn on_status(&self, state: &JobState, percent: u8) {
        self.bar.set_position(percent as u64);
        self.bar.set_message(state.to_string());
    }

    fn on_download_start(&self, url: &str) {
        self.bar.set_prefix("Downloading");
        self.bar.set_message(url.to_string());
    }

    fn on_extracted(&self, files: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} file(s) extracted",
            green("✔"),
            bold(&files.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert next to the input file
  pdf2tex paper.pdf

  # Convert into a specific directory
  pdf2tex paper.pdf out/

  # Shorter poll budget, quieter output
  pdf2tex --timeout 120 -q paper.pdf

  # Structured JSON result (job id, paths, stats)
  pdf2tex --json paper.pdf > result.json

ENVIRONMENT VARIABLES:
  MATHPIX_APP_ID    Mathpix application ID (required)
  MATHPIX_API_KEY   Mathpix API key (required)

SETUP:
  1. Get credentials:  https://accounts.mathpix.com/
  2. Export them:      export MATHPIX_APP_ID=... MATHPIX_API_KEY=...
  3. Convert:          pdf2tex paper.pdf
"#;

/// Convert PDF documents to LaTeX via the Mathpix conversion API.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2tex",
    version,
    about = "Convert PDF documents to LaTeX via the Mathpix conversion API",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file to convert.
    input: PathBuf,

    /// Output directory for the extracted files (default: the input's directory).
    output_dir: Option<PathBuf>,

    /// Submission endpoint base URL.
    #[arg(long, env = "PDF2TEX_BASE_URL", default_value = "https://api.mathpix.com/v3/pdf")]
    base_url: String,

    /// Requested archive format.
    #[arg(long, env = "PDF2TEX_FORMAT", default_value = "tex.zip")]
    format: String,

    /// Poll budget in seconds.
    #[arg(long, env = "PDF2TEX_TIMEOUT", default_value_t = 600)]
    timeout: u64,

    /// Delay between status queries in seconds.
    #[arg(long, env = "PDF2TEX_POLL_INTERVAL", default_value_t = 2)]
    poll_interval: u64,

    /// Output structured JSON (ConversionOutput) instead of the plain path.
    #[arg(long, env = "PDF2TEX_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDF2TEX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2TEX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the final path.
    #[arg(short, long, env = "PDF2TEX_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Library INFO logs are suppressed when the progress bar is active; the
    // bar is all the feedback that matters. Verbose mode wins regardless.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    // ── Credentials first: fail fast, before any network work ───────────
    let credentials = Credentials::from_env()?;

    let output_dir = match &cli.output_dir {
        Some(dir) => dir.clone(),
        None => cli
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    // ── Build config ─────────────────────────────────────────────────────
    let mut builder = ConversionConfig::builder()
        .base_url(&cli.base_url)
        .target_format(&cli.format)
        .poll_timeout(Duration::from_secs(cli.timeout))
        .poll_interval(Duration::from_secs(cli.poll_interval));

    if show_progress {
        builder = builder.progress(CliProgress::new() as Arc<dyn ConversionProgress>);
    }

    let config = builder.build().context("Invalid configuration")?;

    // ── Run the workflow ─────────────────────────────────────────────────
    let result = convert(&cli.input, &output_dir, &credentials, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise output")?
        );
    } else {
        println!("{}", result.output.resolved_path().display());
        if !cli.quiet {
            match &result.output.primary {
                Some(_) => {}
                None => eprintln!(
                    "No .{} file found among the extracted output; path above is the output directory",
                    config.primary_extension
                ),
            }
            eprintln!(
                "   {}  {} queries  {}ms total",
                dim(&format!("job {}", result.job_id)),
                dim(&result.stats.status_queries.to_string()),
                result.stats.total_ms,
            );
        }
    }

    Ok(())
}
