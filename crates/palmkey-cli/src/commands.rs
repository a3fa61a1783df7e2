use std::fs;
use std::path::Path;

use serde::Serialize;

use palmkey_hand_core::errors::{AppError, AppResult};
use palmkey_hand_core::hands::geometry::Point;
use palmkey_hand_core::hands::{
    similarity, CaptureStep, CaptureStore, FilesystemCaptureStore, HandSide, PalmTemplateFile,
    LANDMARK_COUNT,
};
use palmkey_hand_core::quality::measure_quality;
use palmkey_hand_core::BiometricSession;

use crate::cli::{EnrollArgs, QualityArgs, RemoveArgs, StatusArgs, VerifyArgs};
use crate::config;

#[derive(Debug, Serialize)]
pub struct QualitySummary {
    pub success: bool,
    pub image_path: String,
    pub luminosity: f64,
    pub blur_variance: f64,
    pub lighting: String,
    pub sharp: bool,
}

#[derive(Debug)]
pub struct QualityOutcome {
    pub summary: QualitySummary,
    pub logs: Vec<String>,
}

pub fn run_quality(args: &QualityArgs) -> AppResult<QualityOutcome> {
    if !args.image.exists() {
        return Err(AppError::MissingInput {
            path: args.image.clone(),
        });
    }

    let image = image::open(&args.image).map_err(|err| AppError::ImageDecode {
        path: args.image.clone(),
        message: err.to_string(),
    })?;
    let rgba = image.to_rgba8();

    let mut logs = Vec::new();
    logs.push(format!(
        "Loaded image {} ({}x{})",
        args.image.display(),
        rgba.width(),
        rgba.height()
    ));

    let metrics = measure_quality(rgba.as_raw(), rgba.width(), rgba.height());
    logs.push(format!(
        "Luminosity {:.1} ({}), blur variance {:.1} ({})",
        metrics.luminosity,
        metrics.lighting().name(),
        metrics.blur_variance,
        if metrics.is_sharp() { "sharp" } else { "blurry" }
    ));

    Ok(QualityOutcome {
        summary: QualitySummary {
            success: true,
            image_path: args.image.display().to_string(),
            luminosity: metrics.luminosity,
            blur_variance: metrics.blur_variance,
            lighting: metrics.lighting().name().to_string(),
            sharp: metrics.is_sharp(),
        },
        logs,
    })
}

#[derive(Debug, Serialize)]
pub struct EnrollSummary {
    pub success: bool,
    pub hand: String,
    pub step: String,
    pub image_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<String>,
    pub next_step: String,
    pub fully_enrolled: bool,
}

#[derive(Debug)]
pub struct EnrollOutcome {
    pub summary: EnrollSummary,
    pub logs: Vec<String>,
}

pub fn run_enroll(args: &EnrollArgs) -> AppResult<EnrollOutcome> {
    let side = HandSide::from(args.hand);
    let step = CaptureStep::from(args.step);
    let store_dir = config::resolve_store_dir(args.store_dir.clone())?;

    let image_bytes = read_input_file(&args.image)?;
    let landmarks = match &args.landmarks {
        Some(path) => Some(load_landmark_file(path)?),
        None => None,
    };

    let store = FilesystemCaptureStore::new(&store_dir);
    let mut session = BiometricSession::new(store, config::session_config()?);
    session.refresh_from_storage()?;

    let commit = session.commit_capture(side, step, &image_bytes, landmarks.as_deref())?;
    let mut logs = commit.logs.clone();

    let fully_enrolled = session.enrollment().is_hand_fully_enrolled(side);
    let next_step = session.enrollment().next_incomplete_step(side);
    if fully_enrolled {
        logs.push(format!(
            "{} hand fully enrolled; ready for review",
            side.display_name()
        ));
    } else {
        logs.push(format!("Next step: {}", next_step.display_name()));
    }
    if step.is_palm() && landmarks.is_none() {
        logs.push("No landmarks supplied; palm template left unchanged".to_string());
    }

    Ok(EnrollOutcome {
        summary: EnrollSummary {
            success: true,
            hand: side.label().to_string(),
            step: step.display_name().to_string(),
            image_path: commit.image_path.display().to_string(),
            template_path: commit
                .template_path
                .map(|path| path.display().to_string()),
            next_step: next_step.display_name().to_string(),
            fully_enrolled,
        },
        logs,
    })
}

#[derive(Debug, Serialize)]
pub struct StepStatus {
    pub step: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HandStatus {
    pub hand: String,
    pub registered: bool,
    pub fully_enrolled: bool,
    pub next_step: String,
    pub steps: Vec<StepStatus>,
}

#[derive(Debug, Serialize)]
pub struct StatusSummary {
    pub success: bool,
    pub store_dir: String,
    pub any_hand_registered: bool,
    pub hands: Vec<HandStatus>,
}

#[derive(Debug)]
pub struct StatusOutcome {
    pub summary: StatusSummary,
    pub logs: Vec<String>,
}

pub fn run_status(args: &StatusArgs) -> AppResult<StatusOutcome> {
    let store_dir = config::resolve_store_dir(args.store_dir.clone())?;
    let store = FilesystemCaptureStore::new(&store_dir);
    let mut session = BiometricSession::new(store, config::session_config()?);
    session.refresh_from_storage()?;

    let mut logs = Vec::new();
    logs.push(format!("Capture store: {}", store_dir.display()));

    let mut hands = Vec::with_capacity(HandSide::BOTH.len());
    for side in HandSide::BOTH {
        let enrollment = session.enrollment().hand(side);
        let fully_enrolled = enrollment.is_fully_enrolled();
        let next_step = if fully_enrolled {
            "review".to_string()
        } else {
            enrollment.next_incomplete_step().display_name().to_string()
        };

        let steps = CaptureStep::ALL
            .iter()
            .map(|step| {
                let record = enrollment.record(*step);
                StepStatus {
                    step: step.display_name().to_string(),
                    completed: record.completed,
                    path: record
                        .storage_path
                        .as_ref()
                        .map(|path| path.display().to_string()),
                }
            })
            .collect();

        logs.push(format!(
            "{} hand: {}/6 steps, {}",
            side.display_name(),
            enrollment.completed_count(),
            if enrollment.is_registered() {
                "registered"
            } else {
                "not registered"
            }
        ));

        hands.push(HandStatus {
            hand: side.label().to_string(),
            registered: enrollment.is_registered(),
            fully_enrolled,
            next_step,
            steps,
        });
    }

    Ok(StatusOutcome {
        summary: StatusSummary {
            success: true,
            store_dir: store_dir.display().to_string(),
            any_hand_registered: session.enrollment().is_any_hand_registered(),
            hands,
        },
        logs,
    })
}

#[derive(Debug, Serialize)]
pub struct VerifySummary {
    pub success: bool,
    pub hand: String,
    pub score: f64,
    pub threshold: f64,
    pub matched: bool,
}

#[derive(Debug)]
pub struct VerifyOutcome {
    pub summary: VerifySummary,
    pub logs: Vec<String>,
}

pub fn run_verify(args: &VerifyArgs) -> AppResult<VerifyOutcome> {
    let side = HandSide::from(args.hand);
    let store_dir = config::resolve_store_dir(args.store_dir.clone())?;
    let threshold = config::resolve_threshold(args.threshold)?;

    let store = FilesystemCaptureStore::new(&store_dir);
    let stored = store
        .load_template(side)?
        .ok_or_else(|| AppError::HandNotEnrolled {
            side: side.label().to_string(),
        })?;

    let live = load_landmark_file(&args.landmarks)?;
    let score = similarity(&stored, &live) as f64;
    let matched = score > threshold;

    let logs = vec![
        format!("Loaded stored {} palm template", side.label()),
        format!("Similarity score {score:.4} (threshold {threshold:.2})"),
        if matched {
            "VERIFIED: Identity Confirmed".to_string()
        } else {
            "FAILED: Fingerprints Do Not Match".to_string()
        },
    ];

    Ok(VerifyOutcome {
        summary: VerifySummary {
            success: true,
            hand: side.label().to_string(),
            score,
            threshold,
            matched,
        },
        logs,
    })
}

#[derive(Debug, Serialize)]
pub struct RemoveSummary {
    pub success: bool,
    pub hand: String,
    pub removed: Vec<String>,
}

#[derive(Debug)]
pub struct RemoveOutcome {
    pub summary: RemoveSummary,
    pub logs: Vec<String>,
}

pub fn run_remove(args: &RemoveArgs) -> AppResult<RemoveOutcome> {
    let side = HandSide::from(args.hand);
    let store_dir = config::resolve_store_dir(args.store_dir.clone())?;

    let store = FilesystemCaptureStore::new(&store_dir);
    let mut session = BiometricSession::new(store, config::session_config()?);
    let removed = session.remove_hand(side)?;

    let logs = vec![format!(
        "Removed {} artifact(s) for the {} hand",
        removed.len(),
        side.display_name()
    )];

    Ok(RemoveOutcome {
        summary: RemoveSummary {
            success: true,
            hand: side.label().to_string(),
            removed: removed
                .iter()
                .map(|path| path.display().to_string())
                .collect(),
        },
        logs,
    })
}

fn read_input_file(path: &Path) -> AppResult<Vec<u8>> {
    if !path.exists() {
        return Err(AppError::MissingInput {
            path: path.to_path_buf(),
        });
    }
    fs::read(path).map_err(|source| AppError::CaptureRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Live landmark input is strict, unlike the lenient stored-template read:
/// a bad file here is an operator mistake worth reporting.
fn load_landmark_file(path: &Path) -> AppResult<Vec<Point>> {
    let data = read_input_file(path)?;
    let parsed: PalmTemplateFile =
        serde_json::from_slice(&data).map_err(|err| AppError::LandmarkValidation {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
    if parsed.landmarks.len() != LANDMARK_COUNT {
        return Err(AppError::LandmarkValidation {
            path: path.to_path_buf(),
            message: format!(
                "expected {} landmarks, found {}",
                LANDMARK_COUNT,
                parsed.landmarks.len()
            ),
        });
    }
    Ok(parsed.landmarks)
}
