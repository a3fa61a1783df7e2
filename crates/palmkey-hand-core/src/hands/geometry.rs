use serde::{Deserialize, Serialize};

pub const LANDMARK_COUNT: usize = 21;

// Landmark indices follow the 21-point hand convention: wrist at 0, then
// four joints per digit from base to tip.
pub const WRIST: usize = 0;
pub const THUMB_MCP: usize = 2;
pub const THUMB_TIP: usize = 4;
pub const INDEX_MCP: usize = 5;
pub const INDEX_PIP: usize = 6;
pub const INDEX_TIP: usize = 8;
pub const MIDDLE_MCP: usize = 9;
pub const MIDDLE_PIP: usize = 10;
pub const MIDDLE_TIP: usize = 12;
pub const RING_MCP: usize = 13;
pub const RING_PIP: usize = 14;
pub const RING_TIP: usize = 16;
pub const LITTLE_MCP: usize = 17;
pub const LITTLE_PIP: usize = 18;
pub const LITTLE_TIP: usize = 20;

const THUMB_EXTENSION_MIN_DISTANCE: f32 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl Finger {
    fn tip(&self) -> usize {
        match self {
            Finger::Thumb => THUMB_TIP,
            Finger::Index => INDEX_TIP,
            Finger::Middle => MIDDLE_TIP,
            Finger::Ring => RING_TIP,
            Finger::Little => LITTLE_TIP,
        }
    }

    fn pip(&self) -> usize {
        match self {
            Finger::Thumb => THUMB_MCP,
            Finger::Index => INDEX_PIP,
            Finger::Middle => MIDDLE_PIP,
            Finger::Ring => RING_PIP,
            Finger::Little => LITTLE_PIP,
        }
    }
}

pub fn distance(a: Point, b: Point) -> f32 {
    (b.x - a.x).hypot(b.y - a.y)
}

pub fn has_full_hand(landmarks: &[Point]) -> bool {
    landmarks.len() == LANDMARK_COUNT
}

/// Thumb extension is judged by the tip's distance from the index base;
/// the other fingers by the tip sitting above its PIP joint in image
/// coordinates. The vertical test assumes an upright, front-facing frame
/// and is a 2D approximation, not a flexion measurement.
pub fn is_finger_extended(landmarks: &[Point], finger: Finger) -> bool {
    if !has_full_hand(landmarks) {
        return false;
    }
    match finger {
        Finger::Thumb => {
            distance(landmarks[THUMB_TIP], landmarks[INDEX_MCP]) > THUMB_EXTENSION_MIN_DISTANCE
        }
        _ => landmarks[finger.tip()].y < landmarks[finger.pip()].y,
    }
}

/// Counts extended fingers excluding the thumb, which would make most
/// isolation poses read as two fingers up.
pub fn count_extended_fingers(landmarks: &[Point]) -> usize {
    [Finger::Index, Finger::Middle, Finger::Ring, Finger::Little]
        .iter()
        .filter(|finger| is_finger_extended(landmarks, **finger))
        .count()
}

/// Orientation test via the z-component of the 2D cross product of
/// wrist->index-base and wrist->little-base. The sign flips with the hand
/// side. Coarse proxy; can misclassify at extreme wrist rotation.
pub fn is_palm_facing_camera(landmarks: &[Point], is_left_hand: bool) -> bool {
    if !has_full_hand(landmarks) {
        return false;
    }

    let wrist = landmarks[WRIST];
    let index_mcp = landmarks[INDEX_MCP];
    let little_mcp = landmarks[LITTLE_MCP];

    let v1x = index_mcp.x - wrist.x;
    let v1y = index_mcp.y - wrist.y;
    let v2x = little_mcp.x - wrist.x;
    let v2y = little_mcp.y - wrist.y;

    let cross_z = v1x * v2y - v1y * v2x;

    if is_left_hand {
        cross_z > 0.0
    } else {
        cross_z < 0.0
    }
}
