use crate::detector::Detection;
use crate::hands::enrollment::{CaptureStep, HandSide};
use crate::hands::geometry::{count_extended_fingers, is_finger_extended, is_palm_facing_camera};
use crate::quality::LightingState;

pub const NEUTRAL_FEEDBACK: &str = "Align your hand";
pub const BLUR_FEEDBACK: &str = "Image is Blurry. Hold still.";

const MIN_OPEN_PALM_FINGERS: usize = 3;
const MAX_ISOLATION_FINGERS: usize = 2;

#[derive(Debug, Clone)]
pub struct GateInput<'a> {
    pub lighting: LightingState,
    pub is_sharp: bool,
    pub detection: Option<&'a Detection>,
    pub side: HandSide,
    pub step: CaptureStep,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub capture_enabled: bool,
    pub feedback: String,
}

impl GateDecision {
    fn disabled(feedback: String) -> Self {
        Self {
            capture_enabled: false,
            feedback,
        }
    }

    fn enabled(feedback: String) -> Self {
        Self {
            capture_enabled: true,
            feedback,
        }
    }
}

impl Default for GateDecision {
    fn default() -> Self {
        GateDecision::disabled(NEUTRAL_FEEDBACK.to_string())
    }
}

/// Judges one frame. Stateless; rules are checked in priority order and the
/// first failing one decides the feedback.
pub fn evaluate_gate(input: &GateInput<'_>) -> GateDecision {
    if let Some(message) = input.lighting.feedback() {
        return GateDecision::disabled(message.to_string());
    }
    if !input.is_sharp {
        return GateDecision::disabled(BLUR_FEEDBACK.to_string());
    }

    let detection = match input.detection {
        Some(detection) => detection,
        None => {
            return GateDecision::disabled(format!(
                "Show your {} {}",
                input.side.display_name(),
                input.step.display_name()
            ));
        }
    };

    if detection.side != input.side {
        return GateDecision::disabled(format!(
            "Wrong Hand! Please show {}.",
            input.side.display_name()
        ));
    }

    let is_left = detection.side == HandSide::Left;
    if !is_palm_facing_camera(&detection.landmarks, is_left) {
        let message = if input.step.is_palm() {
            "Palm dorsal side detected, minutiae points won't be extracted.".to_string()
        } else {
            "Finger dorsal side detected, please show palm side.".to_string()
        };
        return GateDecision::disabled(message);
    }

    match input.step.finger() {
        None => {
            if count_extended_fingers(&detection.landmarks) < MIN_OPEN_PALM_FINGERS {
                GateDecision::disabled("Open your hand fully.".to_string())
            } else {
                GateDecision::enabled("Perfect Palm! Hold still.".to_string())
            }
        }
        Some(finger) => {
            if !is_finger_extended(&detection.landmarks, finger) {
                return GateDecision::disabled(format!(
                    "Extend your {} finger.",
                    input.step.display_name()
                ));
            }

            let extended = count_extended_fingers(&detection.landmarks);
            if extended > MAX_ISOLATION_FINGERS && input.step != CaptureStep::Thumb {
                GateDecision::disabled(format!(
                    "Isolate the {}. Curl others.",
                    input.step.display_name()
                ))
            } else {
                GateDecision::enabled(format!("Perfect {}!", input.step.display_name()))
            }
        }
    }
}
