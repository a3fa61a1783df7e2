use std::time::{Duration, Instant};

use tempfile::TempDir;

use palmkey_hand_core::detector::Detection;
use palmkey_hand_core::hands::{
    CaptureStep, FilesystemCaptureStore, HandSide, VerifyStatus,
};
use palmkey_hand_core::hands::geometry::{
    Point, INDEX_MCP, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, LITTLE_MCP, LITTLE_PIP, LITTLE_TIP,
    MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, RING_MCP, RING_PIP, RING_TIP, THUMB_MCP, THUMB_TIP, WRIST,
};
use palmkey_hand_core::{BiometricSession, SessionConfig};

fn open_left_palm() -> Vec<Point> {
    let mut points = vec![Point { x: 0.5, y: 0.9 }; LANDMARK_COUNT];
    points[WRIST] = Point { x: 0.5, y: 0.9 };
    points[THUMB_MCP] = Point { x: 0.40, y: 0.75 };
    points[THUMB_TIP] = Point { x: 0.30, y: 0.60 };
    points[INDEX_MCP] = Point { x: 0.42, y: 0.55 };
    points[INDEX_PIP] = Point { x: 0.42, y: 0.45 };
    points[INDEX_TIP] = Point { x: 0.42, y: 0.30 };
    points[MIDDLE_MCP] = Point { x: 0.50, y: 0.54 };
    points[MIDDLE_PIP] = Point { x: 0.50, y: 0.42 };
    points[MIDDLE_TIP] = Point { x: 0.50, y: 0.25 };
    points[RING_MCP] = Point { x: 0.58, y: 0.55 };
    points[RING_PIP] = Point { x: 0.58, y: 0.44 };
    points[RING_TIP] = Point { x: 0.58, y: 0.28 };
    points[LITTLE_MCP] = Point { x: 0.66, y: 0.58 };
    points[LITTLE_PIP] = Point { x: 0.66, y: 0.48 };
    points[LITTLE_TIP] = Point { x: 0.66, y: 0.34 };
    points
}

#[test]
fn integration_enroll_refresh_and_verify_on_disk() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemCaptureStore::new(tmp.path());
    let mut session = BiometricSession::new(store, SessionConfig::default());

    let landmarks = open_left_palm();
    let outcome = session
        .commit_capture(
            HandSide::Left,
            CaptureStep::Palm,
            b"palm-jpeg-bytes",
            Some(&landmarks),
        )
        .expect("palm commit works");
    assert!(outcome.image_path.exists());
    assert!(outcome.template_path.as_ref().is_some_and(|p| p.exists()));

    session
        .commit_capture(HandSide::Left, CaptureStep::Thumb, b"thumb-jpeg", None)
        .expect("thumb commit works");

    // a second session over the same directory sees the same state
    let store = FilesystemCaptureStore::new(tmp.path());
    let mut restored = BiometricSession::new(store, SessionConfig::default());
    restored.refresh_from_storage().expect("refresh works");

    assert!(restored.enrollment().is_any_hand_registered());
    assert!(restored.enrollment().hand(HandSide::Left).is_registered());
    assert_eq!(
        restored.enrollment().next_incomplete_step(HandSide::Left),
        CaptureStep::Index
    );
    assert!(restored.templates().contains(HandSide::Left));

    let start = Instant::now();
    let detection = Detection {
        side: HandSide::Left,
        landmarks,
    };
    restored.observe_verification_frame(Some(&detection), start);
    assert_eq!(restored.verification_status(), VerifyStatus::Processing);
    assert!(restored.poll_verification(start + Duration::from_secs(3)));
    assert_eq!(restored.verification_status(), VerifyStatus::Success);
}

#[test]
fn integration_full_enrollment_reaches_review_sentinel() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemCaptureStore::new(tmp.path());
    let mut session = BiometricSession::new(store, SessionConfig::default());

    let landmarks = open_left_palm();
    for step in CaptureStep::ALL {
        let points = step.is_palm().then_some(landmarks.as_slice());
        session
            .commit_capture(HandSide::Right, step, b"jpeg", points)
            .expect("commit works");
    }

    assert!(session.enrollment().is_hand_fully_enrolled(HandSide::Right));
    assert_eq!(
        session.enrollment().next_incomplete_step(HandSide::Right),
        CaptureStep::Palm
    );
    assert!(!session.enrollment().is_hand_fully_enrolled(HandSide::Left));
}
