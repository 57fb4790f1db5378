//! Vitals CLI - Command-line interface for Synheart Vitals
//!
//! Commands:
//! - heart-rate: Estimate heart rate from a directory of extracted video frames
//! - respiratory-rate: Estimate respiratory rate from an accelerometer trace
//! - record: Measure both and emit a vitals record with symptom ratings
//! - config: Print or check engine calibration
//! - doctor: Diagnose installation and configuration

use clap::{Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use synheart_vitals::record::{Symptom, VitalsRecord};
use synheart_vitals::sampling::sample_indices;
use synheart_vitals::source::{ImageSequenceClip, VideoSource};
use synheart_vitals::{VitalsConfig, VitalsProcessor, PRODUCER_NAME, VITALS_VERSION};

/// Vitals - On-device vital-sign estimation
#[derive(Parser)]
#[command(name = "vitals")]
#[command(author = "Synheart AI Inc")]
#[command(version = VITALS_VERSION)]
#[command(about = "Estimate heart and respiratory rate from captured data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate heart rate from extracted video frames
    HeartRate {
        /// Directory holding one image per video frame
        #[arg(short, long)]
        frames: PathBuf,

        /// Frame rate the frames were extracted at
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Calibration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Estimate respiratory rate from an accelerometer trace
    RespiratoryRate {
        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Calibration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Measure both vital signs and emit a record
    Record {
        /// Directory holding one image per video frame
        #[arg(short, long)]
        frames: PathBuf,

        /// Frame rate the frames were extracted at
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Accelerometer trace file
        #[arg(short, long)]
        accel: PathBuf,

        /// Symptom rating as NAME=RATING (repeatable), e.g. "Fever=3"
        #[arg(short, long = "symptom")]
        symptoms: Vec<String>,

        /// Calibration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Append the record to this NDJSON file instead of printing it
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective calibration, or check a calibration file
    Config {
        /// Calibration file to check
        #[arg(long)]
        check: Option<PathBuf>,
    },

    /// Diagnose installation and configuration
    Doctor {
        /// Check calibration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check that a frames directory yields enough samples for a heart rate
        #[arg(short, long)]
        frames: Option<PathBuf>,

        /// Frame rate the frames were extracted at
        #[arg(long, default_value = "30")]
        fps: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    match cli.command {
        Commands::HeartRate {
            frames,
            fps,
            config,
            json,
        } => cmd_heart_rate(&frames, fps, config.as_deref(), json),
        Commands::RespiratoryRate {
            input,
            config,
            json,
        } => cmd_respiratory_rate(&input, config.as_deref(), json),
        Commands::Record {
            frames,
            fps,
            accel,
            symptoms,
            config,
            output,
        } => cmd_record(
            &frames,
            fps,
            &accel,
            &symptoms,
            config.as_deref(),
            output.as_deref(),
        ),
        Commands::Config { check } => cmd_config(check.as_deref()),
        Commands::Doctor {
            config,
            frames,
            fps,
            json,
        } => cmd_doctor(config.as_deref(), frames.as_deref(), fps, json),
    }
}

fn cmd_heart_rate(
    frames: &Path,
    fps: u32,
    config: Option<&Path>,
    json: bool,
) -> Result<(), VitalsCliError> {
    let processor = load_processor(config)?;
    let clip = ImageSequenceClip::open(frames, fps)?;
    let rate = processor.heart_rate(&clip)?;

    if json {
        println!("{}", serde_json::json!({ "heart_rate": rate }));
    } else {
        println!("Heart Rate: {rate}");
    }
    Ok(())
}

fn cmd_respiratory_rate(
    input: &Path,
    config: Option<&Path>,
    json: bool,
) -> Result<(), VitalsCliError> {
    let processor = load_processor(config)?;
    let text = read_input(input)?;
    let rate = processor.respiratory_rate(&text)?;

    if json {
        println!("{}", serde_json::json!({ "respiratory_rate": rate }));
    } else {
        println!("Respiratory Rate: {rate}");
    }
    Ok(())
}

fn cmd_record(
    frames: &Path,
    fps: u32,
    accel: &Path,
    symptoms: &[String],
    config: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), VitalsCliError> {
    // Parse ratings before measuring so typos fail fast
    let ratings = symptoms
        .iter()
        .map(|s| parse_symptom_arg(s))
        .collect::<Result<Vec<_>, _>>()?;

    let processor = load_processor(config)?;
    let clip = ImageSequenceClip::open(frames, fps)?;
    let text = fs::read_to_string(accel)?;

    let measurement = processor.measure(&clip, &text);
    let mut record = VitalsRecord::from_measurement(measurement)?;
    for (symptom, rating) in ratings {
        record.rate(symptom, rating)?;
    }

    let line = record.to_json()?;
    match output {
        Some(path) => {
            let mut file = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(file, "{line}")?;
            log::info!("appended record {} to {}", record.id, path.display());
        }
        None => println!("{line}"),
    }
    Ok(())
}

fn cmd_config(check: Option<&Path>) -> Result<(), VitalsCliError> {
    let config = match check {
        Some(path) => VitalsConfig::from_path(path)?,
        None => VitalsConfig::default(),
    };
    println!("{}", config.to_json()?);
    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    frames: Option<&Path>,
    fps: u32,
    json: bool,
) -> Result<(), VitalsCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();
    let mut calibration = VitalsConfig::default();

    // Check Vitals version
    checks.push(DoctorCheck {
        name: "vitals_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitals version {}", VITALS_VERSION),
    });

    // Check calibration file if provided
    if let Some(config_path) = config {
        if config_path.exists() {
            match VitalsConfig::from_path(config_path) {
                Ok(cfg) => {
                    calibration = cfg;
                    let status = if calibration == VitalsConfig::default() {
                        CheckStatus::Ok
                    } else {
                        CheckStatus::Warning
                    };
                    let message = match status {
                        CheckStatus::Ok => "Calibration file valid (default values)".to_string(),
                        _ => "Calibration file valid (overrides default calibration)".to_string(),
                    };
                    checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status,
                        message,
                    });
                }
                Err(e) => {
                    checks.push(DoctorCheck {
                        name: "config".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid calibration file: {}", e),
                    });
                }
            }
        } else {
            checks.push(DoctorCheck {
                name: "config".to_string(),
                status: CheckStatus::Warning,
                message: "Calibration file does not exist".to_string(),
            });
        }
    }

    // Check the frames directory covers the smoother
    if let Some(dir) = frames {
        checks.push(check_frames(dir, fps, &calibration));
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: VITALS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vitals Doctor Report");
        println!("====================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitalsCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn check_frames(dir: &Path, fps: u32, config: &VitalsConfig) -> DoctorCheck {
    let name = "frames".to_string();
    let clip = match ImageSequenceClip::open(dir, fps) {
        Ok(clip) => clip,
        Err(e) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("Cannot read frames directory: {}", e),
            }
        }
    };

    let required = config.heart.smoothing_window.saturating_add(1);
    let sampled = match sample_indices(fps, clip.duration_seconds(), &config.heart) {
        Ok(indices) => indices.count(),
        Err(e) => {
            return DoctorCheck {
                name,
                status: CheckStatus::Error,
                message: format!("Cannot sample frames: {}", e),
            }
        }
    };

    let (status, message) = if sampled >= required {
        (
            CheckStatus::Ok,
            format!(
                "{} frames, {} sampled (need {})",
                clip.frame_count(),
                sampled,
                required
            ),
        )
    } else {
        (
            CheckStatus::Warning,
            format!(
                "{} frames give only {} samples; a heart rate needs {}",
                clip.frame_count(),
                sampled,
                required
            ),
        )
    };
    DoctorCheck {
        name,
        status,
        message,
    }
}

fn load_processor(config: Option<&Path>) -> Result<VitalsProcessor, VitalsCliError> {
    match config {
        Some(path) => Ok(VitalsProcessor::with_config(VitalsConfig::from_path(path)?)?),
        None => Ok(VitalsProcessor::new()),
    }
}

fn read_input(input: &Path) -> Result<String, VitalsCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(VitalsCliError::NoPipedInput);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn parse_symptom_arg(arg: &str) -> Result<(Symptom, u8), VitalsCliError> {
    let (name, rating) = arg
        .rsplit_once('=')
        .ok_or_else(|| VitalsCliError::BadSymptom(arg.to_string()))?;
    let symptom =
        Symptom::from_name(name).ok_or_else(|| VitalsCliError::BadSymptom(arg.to_string()))?;
    let rating = rating
        .trim()
        .parse::<u8>()
        .map_err(|_| VitalsCliError::BadSymptom(arg.to_string()))?;
    Ok((symptom, rating))
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Compute(synheart_vitals::VitalsError),
    Json(serde_json::Error),
    BadSymptom(String),
    NoPipedInput,
    DoctorFailed,
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<synheart_vitals::VitalsError> for VitalsCliError {
    fn from(e: synheart_vitals::VitalsError) -> Self {
        VitalsCliError::Compute(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Compute(e) => CliError {
                code: e.code().to_string(),
                hint: compute_hint(&e),
                message: e.to_string(),
            },
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitalsCliError::BadSymptom(arg) => CliError {
                code: "BAD_SYMPTOM".to_string(),
                message: format!("Cannot parse symptom rating '{}'", arg),
                hint: Some(format!(
                    "Use NAME=RATING with a rating 0-5; known symptoms: {}",
                    Symptom::ALL
                        .iter()
                        .map(|s| s.display_name())
                        .collect::<Vec<_>>()
                        .join(", ")
                )),
            },
            VitalsCliError::NoPipedInput => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal; no accelerometer trace was piped".to_string(),
                hint: Some("Pipe a trace, e.g. 'cat trace.csv | vitals respiratory-rate -i -'".to_string()),
            },
            VitalsCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn compute_hint(e: &synheart_vitals::VitalsError) -> Option<String> {
    use synheart_vitals::VitalsError::*;
    let hint = match e {
        NoVideoTrack => "Ensure the frames directory holds PNG/JPEG frame images",
        EmptyFrameSequence => "Capture a longer clip; sampling starts at frame 10",
        FrameTooSmall { .. } => "Frames must be at least as large as the aggregation block",
        FrameSizeMismatch { .. } => "All frames must share the same dimensions",
        InsufficientSamples { .. } => "Capture a longer recording",
        MalformedInput(_) => "Traces need one number per line; clips need a finite duration",
        InvalidConfig(_) => "Run 'vitals config' to see valid defaults",
        _ => return None,
    };
    Some(hint.to_string())
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
