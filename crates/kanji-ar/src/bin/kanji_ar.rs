//! kanji-ar CLI: glyph marker detection on still images.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use kanji_ar::detect::{detect_report, load_config, to_luma_image};
use kanji_ar::overlay::{draw_combinations, draw_debug, draw_markers};
use kanji_ar::recognizer::CommandRecognizer;
use kanji_ar::tracker::FrameReport;
use kanji_ar::{MarkerDetector, TrackerConfig, TrackerState};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "kanji-ar")]
#[command(about = "Detect glyph fiducial markers, identify their glyphs and estimate their poses")]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace) from the stderr logger.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit logs as JSON lines.
    #[cfg(feature = "tracing")]
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect markers in an image.
    Detect(CliDetectArgs),

    /// Write a default tracker config.
    InitConfig {
        /// Output path of the JSON config.
        #[arg(long)]
        out: PathBuf,

        /// Dictionary file referenced by the config.
        #[arg(long, default_value = "meta.json")]
        dictionary_path: String,
    },
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to the tracker config (JSON).
    #[arg(long)]
    config: PathBuf,

    /// Binarization threshold; overrides the config value.
    #[arg(long)]
    threshold: Option<u8>,

    /// Write the annotated frame here.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Write every canonical marker image into this directory.
    #[arg(long)]
    canonical_dir: Option<PathBuf>,

    /// Write the JSON report here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Also draw connectors for marker pairs that form no combination.
    #[arg(long)]
    draw_all_links: bool,

    /// OCR program; defaults to tesseract.
    #[arg(long)]
    ocr_program: Option<String>,

    /// OCR argument, repeatable; `{whitelist}` is replaced by the glyph set.
    #[arg(long = "ocr-arg", allow_hyphen_values = true)]
    ocr_args: Vec<String>,
}

fn init_logging(cli: &Cli) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        kanji_ar::core::init_tracing(cli.json_logs);
        if cli.verbose > 0 {
            log::debug!("filter comes from RUST_LOG; -v has no effect with tracing");
        }
    }
    #[cfg(not(feature = "tracing"))]
    {
        let level = match cli.verbose {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };
        kanji_ar::core::init_with_level(level)?;
    }
    Ok(())
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    match &cli.command {
        Commands::Detect(args) => run_detect(args),
        Commands::InitConfig {
            out,
            dictionary_path,
        } => run_init_config(out, dictionary_path),
    }
}

fn run_init_config(out: &Path, dictionary_path: &str) -> CliResult<()> {
    let config = TrackerConfig {
        dictionary_path: Some(dictionary_path.to_string()),
        ..TrackerConfig::default()
    };
    config.write_json(out)?;
    log::info!("Config written to {}", out.display());
    Ok(())
}

fn recognizer(args: &CliDetectArgs) -> CommandRecognizer {
    match &args.ocr_program {
        Some(program) => CommandRecognizer::new(program.clone(), args.ocr_args.iter().cloned()),
        None => CommandRecognizer::default(),
    }
}

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    let (mut config, dictionary) = load_config(&args.config)?;
    log::info!(
        "Loaded config {} ({} glyphs)",
        args.config.display(),
        dictionary.glyphs().len()
    );
    if args.overlay.is_some() || args.canonical_dir.is_some() {
        config.detector.collect_debug = true;
    }
    let threshold = args.threshold.unwrap_or(config.threshold);

    let img = image::open(&args.image).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", args.image.display(), e).into()
    })?;
    log::info!(
        "Image {}: {}x{}",
        args.image.display(),
        img.width(),
        img.height()
    );

    let detector = MarkerDetector::new(config.detector, dictionary, recognizer(args));
    let report = detect_report(&detector, &img, threshold);
    log::info!(
        "Detected {} markers, {} combinations",
        report.markers.len(),
        report.combinations.matches().count()
    );

    if let Some(dir) = &args.canonical_dir {
        write_canonical_images(&report, dir)?;
    }

    if let Some(path) = &args.overlay {
        let mut rgb = img.to_rgb8();
        if let Some(debug) = &report.debug {
            draw_debug(&mut rgb, debug);
        }
        let markers = report
            .markers
            .iter()
            .cloned()
            .fold(TrackerState::new(), |mut state, m| {
                state.insert(m);
                state
            });
        draw_markers(&mut rgb, &markers);
        draw_combinations(&mut rgb, &report.combinations, args.draw_all_links);
        rgb.save(path)?;
        log::info!("Overlay written to {}", path.display());
    }

    let json = serde_json::to_string_pretty(&report)?;
    match &args.report {
        Some(path) => {
            std::fs::write(path, &json)?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn write_canonical_images(report: &FrameReport, dir: &Path) -> CliResult<()> {
    std::fs::create_dir_all(dir)?;
    let Some(debug) = &report.debug else {
        return Ok(());
    };
    let mut written = 0usize;
    for (i, cand) in debug.candidates.iter().enumerate() {
        let Some(canonical) = &cand.canonical else {
            continue;
        };
        let name = match cand.label {
            Some(id) => format!("candidate_{i:03}_label_{id}.png"),
            None => format!("candidate_{i:03}.png"),
        };
        to_luma_image(canonical)?.save(dir.join(name))?;
        written += 1;
    }
    log::info!("{written} canonical images written to {}", dir.display());
    Ok(())
}
