use crate::hands::geometry::{
    Finger, Point, INDEX_MCP, INDEX_PIP, INDEX_TIP, LANDMARK_COUNT, LITTLE_MCP, LITTLE_PIP,
    LITTLE_TIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, RING_MCP, RING_PIP, RING_TIP, THUMB_MCP,
    THUMB_TIP, WRIST,
};

/// Upright left hand, palm toward the camera, all fingers extended.
/// Fingertips sit above (smaller y) their PIP joints; the index base is left
/// of the little base so the orientation cross product is positive.
pub fn open_left_palm() -> Vec<Point> {
    let mut points = vec![Point::new(0.5, 0.9); LANDMARK_COUNT];
    points[WRIST] = Point::new(0.5, 0.9);
    points[THUMB_MCP] = Point::new(0.40, 0.75);
    points[THUMB_TIP] = Point::new(0.30, 0.60);
    points[INDEX_MCP] = Point::new(0.42, 0.55);
    points[INDEX_PIP] = Point::new(0.42, 0.45);
    points[INDEX_TIP] = Point::new(0.42, 0.30);
    points[MIDDLE_MCP] = Point::new(0.50, 0.54);
    points[MIDDLE_PIP] = Point::new(0.50, 0.42);
    points[MIDDLE_TIP] = Point::new(0.50, 0.25);
    points[RING_MCP] = Point::new(0.58, 0.55);
    points[RING_PIP] = Point::new(0.58, 0.44);
    points[RING_TIP] = Point::new(0.58, 0.28);
    points[LITTLE_MCP] = Point::new(0.66, 0.58);
    points[LITTLE_PIP] = Point::new(0.66, 0.48);
    points[LITTLE_TIP] = Point::new(0.66, 0.34);
    points
}

/// Drops a fingertip below its PIP joint so the vertical extension test
/// fails. Not meaningful for the thumb, whose test is distance-based.
pub fn curl_finger(points: &mut [Point], finger: Finger) {
    let (tip, pip) = match finger {
        Finger::Thumb => (THUMB_TIP, THUMB_MCP),
        Finger::Index => (INDEX_TIP, INDEX_PIP),
        Finger::Middle => (MIDDLE_TIP, MIDDLE_PIP),
        Finger::Ring => (RING_TIP, RING_PIP),
        Finger::Little => (LITTLE_TIP, LITTLE_PIP),
    };
    points[tip].y = points[pip].y + 0.1;
}
