//! CLI binary for edgequake-fileconv.
//!
//! A thin shim over the library crate that queues the given files, maps CLI
//! flags to `ConversionConfig`, and reports one line per file.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_fileconv::backend::pdfium::PdfiumBackend;
use edgequake_fileconv::queue::format_bytes;
use edgequake_fileconv::{
    Backends, BatchReport, ConversionConfig, ConversionOutcome, ConversionProgressCallback,
    Converter, DirectorySink, FileQueue, FormatCategory, OutputFormat, PageSize, ProgressCallback,
    QueuedFile, TargetFormat,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
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

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over the batch plus a log line per
/// file. PDF rasterisation updates the bar message page by page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the file currently being converted.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&TICKS);

        let bar = ProgressBar::new(0);
        bar.set_style(style);
        bar.set_prefix("Converting");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.bar.set_length(total_files as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_files} files…"))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        *self.started.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());
        self.bar.set_message(name.to_string());
    }

    fn on_file_complete(&self, index: usize, total: usize, output_name: &str) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index,
            total,
            output_name,
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        let secs = self.elapsed_secs();
        // Keep output tidy: first line only, at most 80 chars.
        let first_line = error.lines().next().unwrap_or_default();
        let msg = if first_line.chars().count() > 80 {
            format!("{}\u{2026}", first_line.chars().take(79).collect::<String>())
        } else {
            first_line.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            red("✗"),
            index,
            total,
            red(&msg),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_progress(&self, completed: usize, _total: usize) {
        self.bar.set_position(completed as u64);
    }

    fn on_page_progress(&self, page: usize, total_pages: usize) {
        self.bar.set_message(format!("page {page}/{total_pages}"));
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = total_files.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} files converted successfully",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert with each file's default target (images → PNG, PDF → ZIP of PNGs,
  # DOCX/TXT/MD → PDF)
  fileconv photo.webp report.pdf notes.md

  # Re-encode photos as JPEG at 80% quality into ./out
  fileconv --to jpg --quality 0.8 -o out *.png

  # One favicon per image
  fileconv --to ico --ico-size 64 logo.png

  # Images onto A4 PDF pages, or pages shaped like the image
  fileconv --to pdf --page-size a4 scan.jpg
  fileconv --to pdf --page-size auto scan.jpg

  # Show which targets make sense for these files
  fileconv --list-targets photo.png report.pdf

  # Machine-readable report
  fileconv --json --to zip-jpg slides.pdf > report.json

TARGETS:
  Input               Targets                        Auto
  ─────────────────   ─────────────────────────────  ───────
  PNG / JPEG / WEBP   png, jpg, webp, ico, pdf       png
  PDF                 zip-png, zip-jpg               zip-png
  DOCX / TXT / MD     pdf                            pdf

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH     Directory containing libpdfium (PDF inputs and outputs)
  RUST_LOG            Override log filtering (e.g. edgequake_fileconv=debug)

Output files never overwrite existing ones: a clash saves `name (1).ext`.
"#;

/// Convert images, PDFs, DOCX, text and Markdown files locally.
#[derive(Parser, Debug)]
#[command(
    name = "fileconv",
    version,
    about = "Convert images, PDFs, DOCX, text and Markdown files locally",
    long_about = "Convert a batch of files in one go: images between PNG, JPEG, WEBP, ICO and \
PDF; PDFs to ZIP archives of page images; DOCX, plain text and Markdown to PDF. Nothing is \
uploaded anywhere. A file that cannot be converted is reported and the rest still run.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Files to convert, processed in the order given.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Target format: auto, png, jpg, webp, ico, pdf, zip-png, zip-jpg.
    #[arg(short, long, env = "FILECONV_TO", default_value = "auto")]
    to: TargetFormat,

    /// Image encode quality (0.0 exclusive – 1.0).
    #[arg(long, env = "FILECONV_QUALITY", default_value_t = 0.92)]
    quality: f32,

    /// PDF page size: auto, a3, a4, a5, letter, legal.
    #[arg(long, env = "FILECONV_PAGE_SIZE", default_value = "a4")]
    page_size: PageSize,

    /// Icon edge length in pixels for --to ico (16–256).
    #[arg(long, env = "FILECONV_ICO_SIZE", default_value_t = 32,
          value_parser = clap::value_parser!(u32).range(16..=256))]
    ico_size: u32,

    /// Directory receiving the converted files (created if missing).
    #[arg(short, long, env = "FILECONV_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Media type applied to every input instead of guessing from the name.
    #[arg(long, env = "FILECONV_MIME")]
    mime: Option<String>,

    /// Per-file timeout in seconds.
    #[arg(long, env = "FILECONV_TIMEOUT")]
    timeout: Option<u64>,

    /// Print the targets available for these files and exit.
    #[arg(long)]
    list_targets: bool,

    /// Print the batch report as JSON on stdout.
    #[arg(long, env = "FILECONV_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "FILECONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "FILECONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "FILECONV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.list_targets;
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

    // ── Queue the inputs ─────────────────────────────────────────────────
    let mut queue = FileQueue::new();
    for path in &cli.files {
        let mut file = QueuedFile::from_path(path)
            .with_context(|| format!("Cannot queue {}", path.display()))?;
        if let Some(ref mime) = cli.mime {
            file = file.with_media_type(mime.clone());
        }
        queue.push(file);
    }

    // ── List-targets mode ────────────────────────────────────────────────
    if cli.list_targets {
        if cli.json {
            let targets: Vec<&str> = queue.available_targets().iter().map(|t| t.as_str()).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&targets).context("Failed to serialise targets")?
            );
        } else {
            for file in queue.iter() {
                println!(
                    "{:<5} {}  {}",
                    file.category().tag(),
                    file.display_name,
                    dim(&format_bytes(file.byte_size))
                );
            }
            println!();
            for target in queue.available_targets() {
                println!("{}", target.as_str());
            }
        }
        return Ok(());
    }

    // ── Build config and converter ───────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ConversionProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb)?;

    let backends = if needs_pdf_engine(&queue, cli.to) {
        // Bind up front so a missing libpdfium is explained once, not per file.
        match PdfiumBackend::bind() {
            Ok(engine) => Backends::default().with_pdf_engine(Arc::new(engine)),
            Err(e) => {
                warn!("{e}");
                if !cli.quiet {
                    eprintln!("{} {}", cyan("⚠"), e);
                }
                Backends::default()
            }
        }
    } else {
        Backends::default()
    };

    let sink = DirectorySink::new(&cli.output_dir).context("Cannot use output directory")?;
    let converter = Converter::new(config, backends, Arc::new(sink));

    // ── Run conversion ───────────────────────────────────────────────────
    let report = converter
        .convert_queue(&queue, cli.to)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialise report")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        // The progress callback already printed per-file lines otherwise.
        print_summary(&report);
    }

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .image_quality(cli.quality)
        .page_size(cli.page_size)
        .ico_size(cli.ico_size);

    if let Some(secs) = cli.timeout {
        builder = builder.file_timeout_secs(secs);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Whether any queued file will touch pdfium: PDF inputs, or anything that
/// produces a PDF.
fn needs_pdf_engine(queue: &FileQueue, target: TargetFormat) -> bool {
    if target == TargetFormat::Explicit(OutputFormat::Pdf) {
        return true;
    }
    queue.categories_present().iter().any(|c| {
        matches!(
            c,
            FormatCategory::PortableDocument
                | FormatCategory::RichDocument
                | FormatCategory::PlainText
                | FormatCategory::Markdown
        )
    })
}

fn print_summary(report: &BatchReport) {
    for file in &report.files {
        match &file.outcome {
            ConversionOutcome::Success {
                saved_to, byte_len, ..
            } => eprintln!(
                "{} {}  →  {}  {}",
                green("✓"),
                file.input_name,
                bold(&saved_to.display().to_string()),
                dim(&format_bytes(*byte_len as u64)),
            ),
            ConversionOutcome::Failure { reason, .. } => eprintln!(
                "{} {}  {}",
                red("✗"),
                file.input_name,
                red(reason.lines().next().unwrap_or_default()),
            ),
        }
    }
    eprintln!(
        "Converted {}/{} files in {}ms",
        report.stats.succeeded, report.stats.total_files, report.stats.duration_ms
    );
}
