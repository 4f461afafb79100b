//! geodots CLI: digitize hand-drawn dots on scanned maps into coordinates.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use geodots::{
    ControlPoint, DetectConfig, DotDetector, Error, FitMethod, ImageFileSink, JobConfig,
    TransformModel,
};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "geodots")]
#[command(about = "Detect hand-drawn dots on scanned maps and georeference them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job file: detect, georeference, write CSV (and optional outputs).
    Run(CliRunArgs),

    /// Detect dots only and report pixel positions.
    Detect(CliDetectArgs),

    /// Fit the control-point transform and print matrix and residuals.
    Fit(CliFitArgs),

    /// Print a starter job file.
    JobTemplate {
        /// Image path to put in the template.
        #[arg(long, default_value = "historical_map.jpg")]
        image: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModelArg {
    Auto,
    Affine,
    Projective,
}

impl From<ModelArg> for TransformModel {
    fn from(m: ModelArg) -> Self {
        match m {
            ModelArg::Auto => TransformModel::Auto,
            ModelArg::Affine => TransformModel::Affine,
            ModelArg::Projective => TransformModel::Projective,
        }
    }
}

/// Fit options shared by `run` and `fit`; unset flags keep the job's values.
#[derive(Debug, Clone, Args)]
struct CliFitOverrides {
    /// Transform model.
    #[arg(long, value_enum)]
    model: Option<ModelArg>,

    /// Use RANSAC instead of plain least squares.
    #[arg(long)]
    ransac: bool,

    /// RANSAC inlier threshold in destination units (degrees).
    #[arg(long)]
    ransac_thresh: Option<f64>,
}

impl CliFitOverrides {
    fn apply(&self, job: &mut JobConfig) {
        if let Some(model) = self.model {
            job.fit.model = model.into();
        }
        if self.ransac {
            job.fit.method = FitMethod::Ransac;
        }
        if let Some(t) = self.ransac_thresh {
            job.fit.ransac.inlier_threshold = t;
        }
    }
}

#[derive(Debug, Clone, Args)]
struct CliRunArgs {
    /// Path to the job file (JSON, schema geodots.job.v1).
    #[arg(long)]
    job: PathBuf,

    /// Override the input image.
    #[arg(long)]
    image: Option<PathBuf>,

    /// Override the output CSV path.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the visualization image path.
    #[arg(long)]
    visualization: Option<PathBuf>,

    /// Write the JSON run report here.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Override the minimum dot area (px², exclusive).
    #[arg(long)]
    size_min: Option<f64>,

    /// Override the maximum dot area (px², exclusive).
    #[arg(long)]
    size_max: Option<f64>,

    /// Drop detections within this radius (px) of a control point.
    #[arg(long)]
    exclude_control_radius: Option<f64>,

    #[command(flatten)]
    fit: CliFitOverrides,
}

#[derive(Debug, Clone, Args)]
struct CliDetectArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Path to write pixel positions (CSV, header `x,y`).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Path to write the full detection result (JSON).
    #[arg(long)]
    json: Option<PathBuf>,

    /// Path to write the annotated image.
    #[arg(long)]
    visualization: Option<PathBuf>,

    /// Minimum dot area in px² (exclusive).
    #[arg(long, default_value_t = 10.0)]
    size_min: f64,

    /// Maximum dot area in px² (exclusive).
    #[arg(long, default_value_t = 1000.0)]
    size_max: f64,

    /// Merge detections closer than this radius (px).
    #[arg(long)]
    dedup_radius: Option<f64>,

    /// Skip histogram equalization.
    #[arg(long)]
    no_equalize: bool,
}

#[derive(Debug, Clone, Args)]
struct CliFitArgs {
    /// Path to the job file (JSON, schema geodots.job.v1).
    #[arg(long)]
    job: PathBuf,

    /// Path to write the fit (JSON).
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    fit: CliFitOverrides,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run(args) => run_job(&args),
        Commands::Detect(args) => run_detect(&args),
        Commands::Fit(args) => run_fit(&args),
        Commands::JobTemplate { image } => run_job_template(&image),
    };

    if let Err(err) = outcome {
        eprintln!("Error: {err}");
        eprintln!("Suggestions:");
        for hint in suggestions(err.as_ref()) {
            eprintln!("  - {hint}");
        }
        std::process::exit(1);
    }
}

// ── operator hints ─────────────────────────────────────────────────────

const HINT_IMAGE: &str = "Ensure the image exists and is readable (paths in a job file are relative to it)";
const HINT_CONTROL: &str = "Verify control points are accurate and not all on one line";
const HINT_CONTRAST: &str = "Check dot contrast (try enhancing the image or adjusting --size-min/--size-max)";

fn suggestions(err: &(dyn std::error::Error + 'static)) -> Vec<&'static str> {
    match err.downcast_ref::<Error>() {
        Some(Error::ImageLoad { .. }) => vec![HINT_IMAGE],
        Some(Error::InsufficientControlPoints { .. }) | Some(Error::DegenerateTransform { .. }) => {
            vec![HINT_CONTROL]
        }
        Some(Error::InvalidConfig(_)) | Some(Error::Job { .. }) => {
            vec!["Check the job file against `geodots job-template`"]
        }
        _ => vec![HINT_IMAGE, HINT_CONTROL, HINT_CONTRAST],
    }
}

// ── run ────────────────────────────────────────────────────────────────

fn load_job(path: &Path) -> CliResult<JobConfig> {
    tracing::info!("Loading job: {}", path.display());
    Ok(JobConfig::from_json_file(path)?)
}

fn run_job(args: &CliRunArgs) -> CliResult<()> {
    let mut job = load_job(&args.job)?;

    if let Some(image) = &args.image {
        job.image = image.clone();
    }
    if let Some(out) = &args.out {
        job.output_csv = out.clone();
    }
    if let Some(vis) = &args.visualization {
        job.visualization = Some(vis.clone());
    }
    if let Some(report) = &args.report {
        job.report = Some(report.clone());
    }
    if let Some(v) = args.size_min {
        job.detect.size_min = v;
    }
    if let Some(v) = args.size_max {
        job.detect.size_max = v;
    }
    if let Some(r) = args.exclude_control_radius {
        job.exclude_control_radius_px = Some(r);
    }
    args.fit.apply(&mut job);

    let report = geodots::run_job(&job)?;

    if report.points.is_empty() {
        tracing::warn!("No dots detected; the CSV holds only the header");
    }
    println!(
        "Processed {} dots; coordinates saved to {}",
        report.points.len(),
        report.output_csv.display()
    );
    if let Some(vis) = &report.visualization {
        println!("Visualization saved to {}", vis.display());
    }
    Ok(())
}

// ── detect ─────────────────────────────────────────────────────────────

fn run_detect(args: &CliDetectArgs) -> CliResult<()> {
    let config = DetectConfig {
        size_min: args.size_min,
        size_max: args.size_max,
        equalize: !args.no_equalize,
        dedup_radius_px: args.dedup_radius,
        ..DetectConfig::default()
    };
    let detector = DotDetector::new(config)?;

    let image = geodots::load_image(&args.image)?;
    tracing::info!("Image size: {}x{}", image.width(), image.height());

    let result = match &args.visualization {
        Some(vis) => detector.detect_with_sink(&image, &mut ImageFileSink::new(vis))?,
        None => detector.detect(&image),
    };

    let points = result.pixel_points();
    match &args.out {
        Some(path) => geodots::write_pixel_csv_file(path, &points)?,
        None => {
            let stdout = std::io::stdout();
            geodots::write_pixel_csv(&mut stdout.lock(), &points)?;
        }
    }
    if let Some(path) = &args.json {
        geodots::write_json_file(path, &result)?;
    }
    Ok(())
}

// ── fit ────────────────────────────────────────────────────────────────

fn run_fit(args: &CliFitArgs) -> CliResult<()> {
    let mut job = load_job(&args.job)?;
    args.fit.apply(&mut job);

    let fit = geodots::fit_homography(&job.control_points, &job.fit)?;

    println!("Model:        {:?} ({:?})", fit.model, fit.method);
    println!("Conditioning: {:.3e}", fit.conditioning);
    println!("Matrix (pixel -> lon/lat):");
    for row in &fit.matrix {
        println!("  [{:>16.9e} {:>16.9e} {:>16.9e}]", row[0], row[1], row[2]);
    }
    println!("Residuals (degrees):");
    for (i, cp) in job.control_points.iter().enumerate() {
        println!(
            "  #{:<2} ({:>8.1}, {:>8.1}) {:>12.3e}{}  {}",
            i,
            cp.pixel_x,
            cp.pixel_y,
            fit.residuals[i],
            if fit.inlier_mask[i] { "" } else { " (outlier)" },
            cp.label.as_deref().unwrap_or("")
        );
    }
    println!(
        "RMS {:.3e}, max {:.3e}",
        fit.rms_residual, fit.max_residual
    );

    if let Some(path) = &args.out {
        geodots::write_json_file(path, &fit)?;
    }
    Ok(())
}

// ── job-template ───────────────────────────────────────────────────────

fn run_job_template(image: &Path) -> CliResult<()> {
    let control_points = vec![
        ControlPoint::new(100.0, 150.0, -101.2345, 43.1234).with_label("Top-left known point"),
        ControlPoint::new(2500.0, 300.0, -100.9876, 43.1567).with_label("Top-right known point"),
        ControlPoint::new(800.0, 1800.0, -101.1234, 42.9876).with_label("Bottom known point"),
    ];
    let mut job = JobConfig::new(image, control_points);
    job.visualization = Some(PathBuf::from("detected_dots.jpg"));
    println!("{}", job.to_json_pretty()?);
    Ok(())
}
