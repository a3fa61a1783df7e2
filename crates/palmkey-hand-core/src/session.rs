use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, warn};

use crate::detector::{Detection, DetectorEvent};
use crate::errors::AppResult;
use crate::hands::enrollment::{CaptureStep, EnrollmentState, HandSide};
use crate::hands::gate::{evaluate_gate, GateDecision, GateInput, BLUR_FEEDBACK};
use crate::hands::geometry::Point;
use crate::hands::store::CaptureStore;
use crate::hands::verify::{TemplateCatalog, VerificationSession, VerifierConfig, VerifyStatus};
use crate::quality::{LightingState, QualityMetrics};

#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub verifier: VerifierConfig,
}

#[derive(Debug)]
pub struct CommitOutcome {
    pub side: HandSide,
    pub step: CaptureStep,
    pub image_path: PathBuf,
    pub template_path: Option<PathBuf>,
    pub logs: Vec<String>,
}

/// One owned biometric session: enrollment bookkeeping, the in-memory
/// template catalog, the per-frame gate verdict and the verification
/// machine, all observable through read-only getters. Per-frame paths never
/// touch the store; only `commit_capture` and the refresh/remove operations
/// perform I/O.
pub struct BiometricSession<S: CaptureStore> {
    store: S,
    enrollment: EnrollmentState,
    templates: TemplateCatalog,
    lighting: LightingState,
    image_clear: bool,
    gate: GateDecision,
    frozen: bool,
    verification: VerificationSession,
    last_detector_error: Option<String>,
}

impl<S: CaptureStore> BiometricSession<S> {
    pub fn new(store: S, config: SessionConfig) -> Self {
        Self {
            store,
            enrollment: EnrollmentState::default(),
            templates: TemplateCatalog::default(),
            lighting: LightingState::Normal,
            image_clear: true,
            gate: GateDecision::default(),
            frozen: false,
            verification: VerificationSession::new(config.verifier),
            last_detector_error: None,
        }
    }

    pub fn update_quality(&mut self, metrics: &QualityMetrics) {
        self.lighting = metrics.lighting();
        self.image_clear = metrics.is_sharp();
        if self.lighting != LightingState::Normal || !self.image_clear {
            self.gate.capture_enabled = false;
        }
    }

    /// Evaluates the capture gate for one detector frame. Frames arriving
    /// while a capture is frozen for review are ignored.
    pub fn process_detection(
        &mut self,
        detection: Option<&Detection>,
        side: HandSide,
        step: CaptureStep,
    ) {
        if self.frozen {
            return;
        }
        self.gate = evaluate_gate(&GateInput {
            lighting: self.lighting,
            is_sharp: self.image_clear,
            detection,
            side,
            step,
        });
    }

    pub fn process_event(&mut self, event: &DetectorEvent, side: HandSide, step: CaptureStep) {
        match event {
            DetectorEvent::Result(detection) => {
                self.process_detection(detection.as_ref(), side, step)
            }
            DetectorEvent::Error(reason) => {
                warn!(reason = %reason, "detector error; frame dropped");
                self.last_detector_error = Some(reason.clone());
            }
        }
    }

    pub fn freeze_review(&mut self) {
        self.frozen = true;
    }

    pub fn dismiss_review(&mut self) {
        self.frozen = false;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Persists a capture and marks the step complete. The palm step also
    /// persists the reference template when landmarks are supplied. Storage
    /// stays the source of truth: the in-memory state is rebuilt from it
    /// afterwards.
    pub fn commit_capture(
        &mut self,
        side: HandSide,
        step: CaptureStep,
        image_bytes: &[u8],
        landmarks: Option<&[Point]>,
    ) -> AppResult<CommitOutcome> {
        let mut logs = Vec::new();

        let image_path = self.store.save_image(side, step, image_bytes)?;
        logs.push(format!("Saved capture image to {}", image_path.display()));

        let mut template_path = None;
        if step.is_palm() {
            if let Some(points) = landmarks {
                let path = self.store.save_template(side, points)?;
                logs.push(format!("Saved palm template to {}", path.display()));
                self.templates.insert(side, points.to_vec());
                template_path = Some(path);
            }
        }

        self.enrollment.record_capture(side, step, &image_path);
        self.refresh_from_storage()?;
        self.frozen = false;

        logs.push(format!(
            "Completed {} {} capture ({}/6 steps done)",
            side.display_name(),
            step.display_name(),
            self.enrollment.hand(side).completed_count()
        ));

        Ok(CommitOutcome {
            side,
            step,
            image_path,
            template_path,
            logs,
        })
    }

    /// Rebuilds enrollment state and the template catalog from the store.
    /// Completed records whose backing files are gone drop out here.
    pub fn refresh_from_storage(&mut self) -> AppResult<()> {
        let entries = self.store.list()?;
        let mut rebuilt = EnrollmentState::default();
        rebuilt.apply_listing(&entries);
        self.enrollment = rebuilt;

        let mut catalog = TemplateCatalog::default();
        for side in HandSide::BOTH {
            if let Some(points) = self.store.load_template(side)? {
                catalog.insert(side, points);
            }
        }
        self.templates = catalog;

        debug!(captures = entries.len(), "refreshed enrollment from storage");
        Ok(())
    }

    pub fn remove_hand(&mut self, side: HandSide) -> AppResult<Vec<PathBuf>> {
        let removed = self.store.remove_hand(side)?;
        self.refresh_from_storage()?;
        Ok(removed)
    }

    pub fn observe_verification_frame(&mut self, detection: Option<&Detection>, now: Instant) {
        self.verification.observe_frame(detection, now);
    }

    pub fn poll_verification(&mut self, now: Instant) -> bool {
        self.verification.poll(&self.templates, now)
    }

    pub fn reset_verification(&mut self) {
        self.verification.reset();
    }

    /// Display feedback. Quality problems override the gate's hand
    /// guidance, matching the rule order of the gate itself.
    pub fn feedback(&self) -> &str {
        if let Some(message) = self.lighting.feedback() {
            message
        } else if !self.image_clear {
            BLUR_FEEDBACK
        } else {
            &self.gate.feedback
        }
    }

    pub fn capture_enabled(&self) -> bool {
        self.gate.capture_enabled
            && self.lighting == LightingState::Normal
            && self.image_clear
    }

    pub fn enrollment(&self) -> &EnrollmentState {
        &self.enrollment
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn verification_status(&self) -> VerifyStatus {
        self.verification.status()
    }

    pub fn verification_message(&self) -> &str {
        self.verification.message()
    }

    pub fn last_detector_error(&self) -> Option<&str> {
        self.last_detector_error.as_deref()
    }
}
