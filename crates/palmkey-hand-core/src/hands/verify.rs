use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::detector::Detection;
use crate::hands::enrollment::HandSide;
use crate::hands::geometry::{distance, has_full_hand, Point, WRIST};

pub const SIMILARITY_THRESHOLD: f32 = 0.85;
pub const SETTLE_DELAY: Duration = Duration::from_secs(3);
pub const IDLE_PROMPT: &str = "Scan your hand...";

const FINGER_TIPS: [usize; 5] = [4, 8, 12, 16, 20];
const FINGER_BASES: [usize; 5] = [2, 5, 9, 13, 17];
const SCALE_REFERENCE: usize = 9;

/// Compares relative finger-length proportions, normalized by the
/// wrist-to-middle-base span so distance from the camera cancels out.
/// A simple affine-invariant shape descriptor, not a cryptographic
/// biometric. Returns 0.0 for anything that is not a full 21-point pair.
pub fn similarity(stored: &[Point], live: &[Point]) -> f32 {
    if !has_full_hand(stored) || !has_full_hand(live) {
        return 0.0;
    }

    let stored_scale = distance(stored[WRIST], stored[SCALE_REFERENCE]);
    let live_scale = distance(live[WRIST], live[SCALE_REFERENCE]);
    if stored_scale == 0.0 || live_scale == 0.0 {
        return 0.0;
    }

    let mut total_error = 0.0;
    for (tip, base) in FINGER_TIPS.iter().zip(FINGER_BASES.iter()) {
        let stored_ratio = distance(stored[*tip], stored[*base]) / stored_scale;
        let live_ratio = distance(live[*tip], live[*base]) / live_scale;
        total_error += (stored_ratio - live_ratio).abs();
    }

    let avg_error = total_error / FINGER_TIPS.len() as f32;
    (1.0 - avg_error * 5.0).clamp(0.0, 1.0)
}

/// In-memory palm reference templates, one per enrolled hand side.
#[derive(Debug, Clone, Default)]
pub struct TemplateCatalog {
    templates: BTreeMap<HandSide, Vec<Point>>,
}

impl TemplateCatalog {
    pub fn insert(&mut self, side: HandSide, landmarks: Vec<Point>) {
        self.templates.insert(side, landmarks);
    }

    pub fn get(&self, side: HandSide) -> Option<&Vec<Point>> {
        self.templates.get(&side)
    }

    pub fn contains(&self, side: HandSide) -> bool {
        self.templates.contains_key(&side)
    }

    pub fn clear(&mut self) {
        self.templates.clear();
    }
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub threshold: f32,
    pub settle_delay: Duration,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            threshold: SIMILARITY_THRESHOLD,
            settle_delay: SETTLE_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    Idle,
    Processing,
    Success,
    Fail,
}

#[derive(Debug, Clone)]
struct PendingScore {
    side: HandSide,
    landmarks: Vec<Point>,
    deadline: Instant,
}

/// Session state machine for one verification attempt. The settle delay is
/// UX pacing, not computation cost: a frame starts the attempt, the decision
/// lands once the deadline passes, and the `running` guard keeps a second
/// attempt from starting mid-flight.
#[derive(Debug)]
pub struct VerificationSession {
    config: VerifierConfig,
    status: VerifyStatus,
    message: String,
    running: bool,
    pending: Option<PendingScore>,
}

impl Default for VerificationSession {
    fn default() -> Self {
        Self::new(VerifierConfig::default())
    }
}

impl VerificationSession {
    pub fn new(config: VerifierConfig) -> Self {
        Self {
            config,
            status: VerifyStatus::Idle,
            message: IDLE_PROMPT.to_string(),
            running: false,
            pending: None,
        }
    }

    pub fn status(&self) -> VerifyStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Feeds one detector frame. Only an Idle session with a detected hand
    /// starts an attempt; frames during a pending attempt are ignored.
    pub fn observe_frame(&mut self, detection: Option<&Detection>, now: Instant) {
        if self.running || self.status != VerifyStatus::Idle {
            return;
        }

        let detection = match detection {
            Some(detection) => detection,
            None => {
                self.message = IDLE_PROMPT.to_string();
                return;
            }
        };

        self.running = true;
        self.status = VerifyStatus::Processing;
        self.message = format!("{} Hand Detected. Verifying...", detection.side.label());
        self.pending = Some(PendingScore {
            side: detection.side,
            landmarks: detection.landmarks.clone(),
            deadline: now + self.config.settle_delay,
        });
    }

    /// Settles the pending attempt once its deadline has passed. Returns
    /// true when a decision was made this call.
    pub fn poll(&mut self, templates: &TemplateCatalog, now: Instant) -> bool {
        let pending = match self.pending.take() {
            Some(pending) if now >= pending.deadline => pending,
            Some(pending) => {
                self.pending = Some(pending);
                return false;
            }
            None => return false,
        };
        match templates.get(pending.side) {
            None => {
                self.status = VerifyStatus::Fail;
                self.message = format!("FAILED: No {} Hand Registered", pending.side.label());
            }
            Some(stored) => {
                let score = similarity(stored, &pending.landmarks);
                debug!(side = pending.side.label(), score = %score, "verification scored");
                if score > self.config.threshold {
                    self.status = VerifyStatus::Success;
                    self.message = "VERIFIED: Identity Confirmed".to_string();
                } else {
                    self.status = VerifyStatus::Fail;
                    self.message = "FAILED: Fingerprints Do Not Match".to_string();
                }
            }
        }
        self.running = false;
        true
    }

    pub fn reset(&mut self) {
        self.status = VerifyStatus::Idle;
        self.message = IDLE_PROMPT.to_string();
        self.running = false;
        self.pending = None;
    }
}
