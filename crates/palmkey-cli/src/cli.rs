use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use palmkey_hand_core::hands::{CaptureStep, HandSide};

#[derive(Debug, Parser)]
#[command(
    name = "palmkey",
    about = "Manage palm and finger biometric enrollments",
    version
)]
pub struct Cli {
    /// Emit structured JSON to stdout instead of human-readable logs
    #[arg(long)]
    pub json: bool,

    /// Increase verbosity (may be used multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn output_mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Human
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Measure lighting and sharpness of an image the way the capture gate does
    Quality(QualityArgs),
    /// Store a capture image (and, for the palm, its landmark template)
    Enroll(EnrollArgs),
    /// Show per-hand enrollment progress reconstructed from the store
    Status(StatusArgs),
    /// Score a live landmark file against a stored palm template
    Verify(VerifyArgs),
    /// Delete every stored capture of one hand
    Remove(RemoveArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandArg {
    Left,
    Right,
}

impl From<HandArg> for HandSide {
    fn from(arg: HandArg) -> Self {
        match arg {
            HandArg::Left => HandSide::Left,
            HandArg::Right => HandSide::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StepArg {
    Palm,
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl From<StepArg> for CaptureStep {
    fn from(arg: StepArg) -> Self {
        match arg {
            StepArg::Palm => CaptureStep::Palm,
            StepArg::Thumb => CaptureStep::Thumb,
            StepArg::Index => CaptureStep::Index,
            StepArg::Middle => CaptureStep::Middle,
            StepArg::Ring => CaptureStep::Ring,
            StepArg::Little => CaptureStep::Little,
        }
    }
}

#[derive(Debug, Args)]
pub struct QualityArgs {
    /// Image file to analyze (decoded to RGBA before sampling)
    pub image: PathBuf,
}

#[derive(Debug, Args)]
pub struct EnrollArgs {
    /// Which hand the capture belongs to
    #[arg(long, value_enum)]
    pub hand: HandArg,

    /// Which enrollment step the capture completes
    #[arg(long, value_enum)]
    pub step: StepArg,

    /// Capture image file to store
    #[arg(long)]
    pub image: PathBuf,

    /// Landmark JSON file; required to register a palm template
    #[arg(long)]
    pub landmarks: Option<PathBuf>,

    /// Capture store directory (overrides config and environment)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Capture store directory (overrides config and environment)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// Which hand's stored template to score against
    #[arg(long, value_enum)]
    pub hand: HandArg,

    /// Live landmark JSON file to score
    #[arg(long)]
    pub landmarks: PathBuf,

    /// Acceptance threshold; defaults to the configured value
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Capture store directory (overrides config and environment)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RemoveArgs {
    /// Which hand to forget
    #[arg(long, value_enum)]
    pub hand: HandArg,

    /// Capture store directory (overrides config and environment)
    #[arg(long)]
    pub store_dir: Option<PathBuf>,
}
