use std::fs;
use std::path::Path;

use tempfile::TempDir;

use palmkey_cli::cli::{EnrollArgs, HandArg, QualityArgs, RemoveArgs, StatusArgs, StepArg, VerifyArgs};
use palmkey_cli::commands::{run_enroll, run_quality, run_remove, run_status, run_verify};
use palmkey_hand_core::errors::AppError;
use palmkey_hand_core::hands::geometry::{Point, LANDMARK_COUNT};
use palmkey_hand_core::hands::PalmTemplateFile;

fn noise(x: u32, y: u32, channel: u32) -> u8 {
    let mut v = x
        .wrapping_mul(374_761_393)
        .wrapping_add(y.wrapping_mul(668_265_263))
        .wrapping_add(channel.wrapping_mul(2_146_121_005));
    v = (v ^ (v >> 13)).wrapping_mul(1_274_126_177);
    (v >> 16) as u8
}

// Deterministic noise: mid-range mean brightness and strong local contrast,
// so the frame reads as Normal lighting and sharp.
fn write_test_png(path: &Path) {
    let mut img = image::RgbaImage::new(32, 32);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = image::Rgba([noise(x, y, 0), noise(x, y, 1), noise(x, y, 2), 255]);
    }
    img.save(path).unwrap();
}

fn write_landmarks(path: &Path) {
    // a simple spread-out hand: distinct wrist, middle base and fingertips
    let mut landmarks = vec![Point { x: 0.5, y: 0.9 }; LANDMARK_COUNT];
    for (i, point) in landmarks.iter_mut().enumerate() {
        point.x = 0.2 + 0.03 * i as f32;
        point.y = 0.9 - 0.03 * i as f32;
    }
    let file = PalmTemplateFile { landmarks };
    fs::write(path, serde_json::to_vec_pretty(&file).unwrap()).unwrap();
}

#[test]
fn quality_reports_sharp_checkerboard() {
    let tmp = TempDir::new().unwrap();
    let image_path = tmp.path().join("frame.png");
    write_test_png(&image_path);

    let outcome = run_quality(&QualityArgs {
        image: image_path,
    })
    .unwrap();
    assert!(outcome.summary.sharp);
    assert_eq!(outcome.summary.lighting, "Normal");
}

#[test]
fn enroll_status_verify_round_trip() {
    let tmp = TempDir::new().unwrap();
    let store_dir = tmp.path().join("store");
    let image_path = tmp.path().join("palm.png");
    let landmarks_path = tmp.path().join("palm.json");
    write_test_png(&image_path);
    write_landmarks(&landmarks_path);

    let enroll = run_enroll(&EnrollArgs {
        hand: HandArg::Left,
        step: StepArg::Palm,
        image: image_path.clone(),
        landmarks: Some(landmarks_path.clone()),
        store_dir: Some(store_dir.clone()),
    })
    .unwrap();
    assert!(enroll.summary.template_path.is_some());
    assert_eq!(enroll.summary.next_step, "Thumb");

    let status = run_status(&StatusArgs {
        store_dir: Some(store_dir.clone()),
    })
    .unwrap();
    assert!(status.summary.any_hand_registered);
    let left = &status.summary.hands[0];
    assert_eq!(left.hand, "Left");
    assert!(left.registered);
    assert!(!left.fully_enrolled);

    // the live landmarks are the enrolled ones, so the score is 1.0
    let verify = run_verify(&VerifyArgs {
        hand: HandArg::Left,
        landmarks: landmarks_path,
        threshold: None,
        store_dir: Some(store_dir.clone()),
    })
    .unwrap();
    assert!(verify.summary.matched);
    assert!((verify.summary.score - 1.0).abs() < 1e-5);

    let removed = run_remove(&RemoveArgs {
        hand: HandArg::Left,
        store_dir: Some(store_dir.clone()),
    })
    .unwrap();
    assert_eq!(removed.summary.removed.len(), 2);

    let status = run_status(&StatusArgs {
        store_dir: Some(store_dir),
    })
    .unwrap();
    assert!(!status.summary.any_hand_registered);
}

#[test]
fn verify_without_enrollment_names_the_hand() {
    let tmp = TempDir::new().unwrap();
    let landmarks_path = tmp.path().join("live.json");
    write_landmarks(&landmarks_path);

    let err = run_verify(&VerifyArgs {
        hand: HandArg::Right,
        landmarks: landmarks_path,
        threshold: Some(0.85),
        store_dir: Some(tmp.path().join("empty-store")),
    })
    .unwrap_err();
    assert!(matches!(err, AppError::HandNotEnrolled { .. }));
}

#[test]
fn enroll_rejects_short_landmark_files() {
    let tmp = TempDir::new().unwrap();
    let store_dir = tmp.path().join("store");
    let image_path = tmp.path().join("palm.png");
    let landmarks_path = tmp.path().join("short.json");
    write_test_png(&image_path);
    let file = PalmTemplateFile {
        landmarks: vec![Point { x: 0.5, y: 0.5 }; 7],
    };
    fs::write(&landmarks_path, serde_json::to_vec(&file).unwrap()).unwrap();

    let err = run_enroll(&EnrollArgs {
        hand: HandArg::Left,
        step: StepArg::Palm,
        image: image_path,
        landmarks: Some(landmarks_path),
        store_dir: Some(store_dir),
    })
    .unwrap_err();
    assert!(matches!(err, AppError::LandmarkValidation { .. }));
}
