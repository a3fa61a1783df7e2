pub mod enrollment;
pub mod gate;
pub mod geometry;
pub mod store;
pub mod verify;

pub use enrollment::{
    CaptureRecord, CaptureStep, EnrollmentState, HandEnrollment, HandSide,
};

pub use gate::{evaluate_gate, GateDecision, GateInput};

pub use geometry::{
    count_extended_fingers, distance, has_full_hand, is_finger_extended, is_palm_facing_camera,
    Finger, Point, LANDMARK_COUNT,
};

pub use store::{
    classify_entry, CaptureStore, EnvStoreDirResolver, FilesystemCaptureStore, PalmTemplateFile,
    StoreDirResolver, StoredEntry,
};

pub use verify::{
    similarity, TemplateCatalog, VerificationSession, VerifierConfig, VerifyStatus,
    SIMILARITY_THRESHOLD,
};
