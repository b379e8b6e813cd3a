use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use flipbook::{
    Container, DropOutcome, ExportOptions, FfmpegLogLevel, OperationType, ProgressInfo, Reporter,
    Session, Severity, StatusMessage, UploadFile, UploadOrder, UploadSummary,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  flipbook frames a.png b.png c.png --json\n  flipbook export a.png b.png c.png --out renders --fps 12 --progress\n  flipbook export *.png --out renders --move 0:2 --remove 1 --transparent\n  flipbook completions zsh > _flipbook";

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "Turn still images into a looping video",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Show a progress bar where supported.
    #[arg(long)]
    progress: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Encode images into a video.
    #[command(
        about = "Export images as a looping video",
        after_help = "Examples:\n  flipbook export a.png b.png --out renders\n  flipbook export a.png b.png c.png --out renders --fps 4 --move 0:2 --remove 1\n\nMoves are applied first, in order, then removals, in order. Each index\nrefers to the frame order at the time it is applied."
    )]
    Export {
        /// Input images, in initial frame order.
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Directory the video is written to.
        #[arg(long)]
        out: PathBuf,
        /// Frames per second (1-60).
        #[arg(long, default_value_t = flipbook::DEFAULT_FPS)]
        fps: u32,
        /// Keep transparent pixels instead of painting onto white.
        #[arg(long)]
        transparent: bool,
        /// Output container: webm | gif.
        #[arg(long, default_value = "webm")]
        format: String,
        /// Move a frame, as FROM:TO. May be repeated.
        #[arg(long = "move", value_name = "FROM:TO")]
        moves: Vec<String>,
        /// Remove the frame at INDEX. May be repeated.
        #[arg(long = "remove", value_name = "INDEX")]
        removals: Vec<usize>,
        /// Target encoder bitrate in bits per second.
        #[arg(long, default_value_t = flipbook::DEFAULT_BITRATE)]
        bitrate: usize,
        /// Append frames in the order decodes finish instead of argument order.
        #[arg(long)]
        completion_order: bool,
    },

    /// List the frames the given images would produce.
    #[command(
        about = "List accepted frames",
        after_help = "Examples:\n  flipbook frames a.png b.jpg notes.txt\n  flipbook frames *.png --json"
    )]
    Frames {
        /// Input images.
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Output the frame list as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

fn parse_move(value: &str) -> Option<(usize, usize)> {
    let (from, to) = value.split_once(':')?;
    Some((from.trim().parse().ok()?, to.trim().parse().ok()?))
}

fn parse_container(value: &str) -> Result<Container, Box<dyn std::error::Error>> {
    match Container::from_name(value) {
        Some(container) => Ok(container),
        None if value.eq_ignore_ascii_case("gif") => {
            Err("--format gif requires building with the `gif` feature".into())
        }
        None => Err(format!("unsupported --format: {value}").into()),
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level
            .parse()
            .map_err(|_| format!("unsupported --log-level: {level}"))?;
        flipbook::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

fn ensure_output_dir(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() && !path.is_dir() {
        return Err(format!("--out must be a directory: {}", path.display()).into());
    }
    Ok(())
}

fn read_uploads(
    paths: &[PathBuf],
    verbose: bool,
) -> Result<Vec<UploadFile>, Box<dyn std::error::Error>> {
    paths
        .iter()
        .map(|path| {
            let file = UploadFile::from_path(path)?;
            if verbose {
                eprintln!("read {} ({}, {} bytes)", path.display(), file.mime, file.bytes.len());
            }
            Ok(file)
        })
        .collect()
}

fn report_upload(summary: &UploadSummary) {
    if summary.skipped > 0 || summary.failed > 0 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            format!(
                "{} skipped (not an image), {} failed to decode",
                summary.skipped, summary.failed
            )
            .yellow()
        );
    }
}

/// Prints status notifications and, with `--progress`, drives a bar.
struct TerminalReporter {
    bar: Option<ProgressBar>,
}

impl TerminalReporter {
    fn new(progress: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = if progress {
            let pb = ProgressBar::new(100);
            let style =
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}% {msg}")?;
            pb.set_style(style.progress_chars("##-"));
            Some(pb)
        } else {
            None
        };
        Ok(Self { bar })
    }

    fn finish(&self) {
        if let Some(pb) = &self.bar {
            pb.finish_and_clear();
        }
    }
}

impl Reporter for TerminalReporter {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(pb) = &self.bar {
            let label = match info.operation {
                OperationType::Upload => "decoding",
                OperationType::Export => "encoding",
                _ => "working",
            };
            pb.set_message(label);
            pb.set_position(info.percent.round() as u64);
        }
    }

    fn on_status(&self, status: &StatusMessage) {
        let line = match status.severity {
            Severity::Info => format!("{} {}", "info:".cyan().bold(), status.message),
            Severity::Success => format!("{} {}", "success:".green().bold(), status.message.green()),
            Severity::Error => format!("{} {}", "error:".red().bold(), status.message.red()),
        };
        match &self.bar {
            Some(pb) => pb.println(line),
            None => eprintln!("{line}"),
        }
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn std::error::Error>> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Export {
            images,
            out,
            fps,
            transparent,
            format,
            moves,
            removals,
            bitrate,
            completion_order,
        } => {
            ensure_output_dir(&out)?;
            let container = parse_container(&format)?;
            let moves = moves
                .iter()
                .map(|value| {
                    parse_move(value).ok_or(format!("invalid --move (expected FROM:TO): {value}"))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let uploads = read_uploads(&images, cli.global.verbose)?;
            let reporter = Arc::new(TerminalReporter::new(cli.global.progress)?);
            let order = if completion_order {
                UploadOrder::Completion
            } else {
                UploadOrder::Submission
            };
            let mut session = Session::new()
                .with_reporter(reporter.clone())
                .with_upload_order(order);

            let options = ExportOptions::new()
                .with_fps(fps)
                .with_transparency(transparent)
                .with_bitrate(bitrate)
                .with_container(container);
            if options.fps() != fps {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!("--fps {fps} clamped to {}", options.fps()).yellow()
                );
            }

            let verbose = cli.global.verbose;
            let runtime = runtime()?;
            let path = runtime.block_on(async move {
                let summary = session.upload(uploads).await?;
                report_upload(&summary);

                for (from, to) in moves {
                    session.drag_start(from);
                    if session.drop_on(to) == DropOutcome::Ignored && verbose {
                        eprintln!("move {from}:{to} ignored");
                    }
                }
                for index in removals {
                    if session.remove_frame(index).is_none() && verbose {
                        eprintln!("remove {index} ignored (only {} frames)", session.frame_count());
                    }
                }

                let artifact = session.export(&options).await?;
                if verbose {
                    eprintln!(
                        "encoded {} frame(s) with {} in {:?}",
                        artifact.frame_count(),
                        artifact.codec().unwrap_or("unknown codec"),
                        artifact.duration(),
                    );
                }
                session.download(&out)
            });
            reporter.finish();

            let path = path?.ok_or("export produced no video")?;
            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Wrote {}", path.display()).green()
            );
        }
        Commands::Frames { images, json } => {
            let uploads = read_uploads(&images, cli.global.verbose)?;
            let mut session = Session::new();
            let runtime = runtime()?;
            let summary = runtime.block_on(session.upload(uploads))?;

            if json {
                let frames: Vec<_> = session
                    .frames()
                    .iter()
                    .enumerate()
                    .map(|(index, frame)| {
                        json!({
                            "index": index,
                            "name": frame.name(),
                            "mime": frame.mime(),
                            "width": frame.width(),
                            "height": frame.height(),
                            "bytes": frame.source().len(),
                        })
                    })
                    .collect();
                let payload = json!({
                    "frames": frames,
                    "skipped": summary.skipped,
                    "failed": summary.failed,
                    "nominal_duration_seconds":
                        nominal_duration(session.frame_count(), flipbook::DEFAULT_FPS).as_secs_f64(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for (index, frame) in session.frames().iter().enumerate() {
                    println!(
                        "{index:>3}  {}  {}x{}  [{}]",
                        frame.name(),
                        frame.width(),
                        frame.height(),
                        frame.mime(),
                    );
                }
                report_upload(&summary);
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "flipbook", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn nominal_duration(frames: usize, fps: u32) -> Duration {
    Duration::from_secs(frames as u64) / fps.max(1)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
