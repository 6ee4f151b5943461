//! CLI binary for cloudpdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use cloudpdf::{
    convert, CancelToken, CleanupOutcome, CleanupPolicy, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, ProgressCallback, Stage, DEFAULT_BASE_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner showing the current stage, plus one
/// log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        let step = Stage::ALL.iter().position(|s| *s == stage).unwrap_or(0) + 1;
        self.bar.set_prefix(format!("[{step}/{}]", Stage::ALL.len()));
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed: Duration) {
        self.bar.println(format!(
            "  {} {:<20} {}",
            green("✓"),
            stage.label(),
            dim(&format!("{:.1}s", elapsed.as_secs_f64())),
        ));
    }

    fn on_poll(&self, attempt: u32, status: &str) {
        self.bar
            .set_message(format!("poll status… check #{attempt}: {status}"));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg = match error.char_indices().nth(80) {
            Some((cut, _)) => format!("{}\u{2026}", &error[..cut]),
            None => error.to_string(),
        };
        self.bar
            .println(format!("  {} {:<20} {}", red("✗"), stage.label(), red(&msg)));
        // A best-effort cleanup failure is the only non-fatal stage error, and
        // it is also the last stage, so the spinner is never needed again.
        self.bar.finish_and_clear();
    }

    fn on_conversion_complete(&self, _output: &ConversionOutput) {
        self.bar.finish_and_clear();
    }
}

/// Exit status for a second Ctrl-C (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert report.docx → report.pdf
  cloudpdf report.docx

  # Explicit output path
  cloudpdf slides.pptx -o out/slides.pdf

  # Keep going even if the remote asset cannot be deleted
  cloudpdf --cleanup best-effort report.docx

  # Machine-readable summary
  cloudpdf --json --no-progress report.docx > summary.json

SUPPORTED INPUTS:
  docx doc pptx ppt xlsx xls rtf txt html htm bmp gif jpg jpeg png tif tiff
  Other files need --media-type.

ENVIRONMENT VARIABLES:
  PDF_SERVICES_CLIENT_ID      OAuth client id (required)
  PDF_SERVICES_CLIENT_SECRET  OAuth client secret (required)
  PDF_SERVICES_BASE_URL       Service endpoint (default: https://pdf-services-ue1.adobe.io)
  RUST_LOG                    Override log filter (e.g. cloudpdf=debug)
"#;

/// Convert documents to PDF with the Adobe PDF Services API.
#[derive(Parser, Debug)]
#[command(
    name = "cloudpdf",
    version,
    about = "Convert documents to PDF with the Adobe PDF Services API",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local document to convert (e.g. report.docx).
    input: PathBuf,

    /// Write the PDF here instead of next to the input.
    #[arg(short, long, env = "CLOUDPDF_OUTPUT")]
    output: Option<PathBuf>,

    /// OAuth client id.
    #[arg(long, env = "PDF_SERVICES_CLIENT_ID", hide_env_values = true)]
    client_id: Option<String>,

    /// OAuth client secret.
    #[arg(long, env = "PDF_SERVICES_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Service base address.
    #[arg(long, env = "PDF_SERVICES_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Media type of the input; inferred from the extension when omitted.
    #[arg(long, env = "CLOUDPDF_MEDIA_TYPE")]
    media_type: Option<String>,

    /// Delay before the second status check, in milliseconds (doubles each time).
    #[arg(long, env = "CLOUDPDF_POLL_INTERVAL_MS", default_value_t = 500)]
    poll_interval_ms: u64,

    /// Upper bound for the delay between status checks, in milliseconds.
    #[arg(long, env = "CLOUDPDF_POLL_MAX_INTERVAL_MS", default_value_t = 5000)]
    poll_max_interval_ms: u64,

    /// Give up waiting for the conversion after this many seconds.
    #[arg(long, env = "CLOUDPDF_POLL_TIMEOUT", default_value_t = 300)]
    poll_timeout: u64,

    /// Per-request HTTP timeout in seconds.
    #[arg(long, env = "CLOUDPDF_REQUEST_TIMEOUT", default_value_t = 60)]
    request_timeout: u64,

    /// What to do with the remote asset: strict, best-effort, skip.
    #[arg(long, env = "CLOUDPDF_CLEANUP", value_enum, default_value = "strict")]
    cleanup: CleanupArg,

    /// Print a JSON summary (ConversionOutput) on stdout.
    #[arg(long, env = "CLOUDPDF_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "CLOUDPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "CLOUDPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "CLOUDPDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum CleanupArg {
    Strict,
    BestEffort,
    Skip,
}

impl From<CleanupArg> for CleanupPolicy {
    fn from(v: CleanupArg) -> Self {
        match v {
            CleanupArg::Strict => CleanupPolicy::Strict,
            CleanupArg::BestEffort => CleanupPolicy::BestEffort,
            CleanupArg::Skip => CleanupPolicy::Skip,
        }
    }
}

/// Parse arguments; usage errors exit with status 1, help and version with 0.
fn parse_cli() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active;
    // the spinner provides all the feedback that matters to the user.
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
        .with_writer(io::stderr)
        .init();

    // ── Cancellation on Ctrl-C ───────────────────────────────────────────
    // First Ctrl-C cancels the in-flight stage; a second one exits at once.
    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            cancel.cancel();
            if tokio::signal::ctrl_c().await.is_ok() {
                std::process::exit(EXIT_INTERRUPTED);
            }
        });
    }

    // ── Build config ─────────────────────────────────────────────────────
    let spinner = show_progress.then(CliProgressCallback::new);
    let progress_cb = spinner
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);

    // ── Run conversion ───────────────────────────────────────────────────
    let result = match build_config(&cli, progress_cb, cancel) {
        Ok(config) => convert(&cli.input, &config)
            .await
            .context("Conversion failed"),
        Err(e) => Err(e),
    };
    if let Some(ref spinner) = spinner {
        spinner.bar.finish_and_clear();
    }
    let output = result?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {}  {}  →  {}",
            green("✔"),
            cli.input.display(),
            dim(&format!(
                "{} bytes in {}ms, {} status checks",
                output.stats.downloaded_bytes,
                output.stats.total_duration_ms,
                output.stats.poll_attempts
            )),
            bold(&output.output_path.display().to_string()),
        );
        match output.cleanup {
            CleanupOutcome::Deleted => {}
            CleanupOutcome::Skipped => eprintln!(
                "   {} remote asset {} left on the service",
                cyan("⚠"),
                output.asset_id
            ),
            CleanupOutcome::Failed { ref error } => eprintln!(
                "   {} could not delete remote asset {}: {}",
                cyan("⚠"),
                output.asset_id,
                error
            ),
        }
    }

    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(
    cli: &Cli,
    progress: Option<ProgressCallback>,
    cancel: CancelToken,
) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .base_url(&cli.base_url)
        .credentials(
            cli.client_id.clone().unwrap_or_default(),
            cli.client_secret.clone().unwrap_or_default(),
        )
        .request_timeout_secs(cli.request_timeout)
        .poll_initial_delay(Duration::from_millis(cli.poll_interval_ms))
        .poll_max_delay(Duration::from_millis(cli.poll_max_interval_ms))
        .poll_timeout(Duration::from_secs(cli.poll_timeout))
        .cleanup(cli.cleanup.clone().into())
        .cancel_token(cancel);

    if let Some(ref mt) = cli.media_type {
        builder = builder.media_type(mt);
    }
    if let Some(ref out) = cli.output {
        builder = builder.output_path(out);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
