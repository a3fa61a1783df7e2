use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hands::geometry::Finger;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandSide {
    Left,
    Right,
}

impl HandSide {
    pub const BOTH: [HandSide; 2] = [HandSide::Left, HandSide::Right];

    /// Detector handedness vocabulary.
    pub fn label(&self) -> &'static str {
        match self {
            HandSide::Left => "Left",
            HandSide::Right => "Right",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            HandSide::Left => "LEFT",
            HandSide::Right => "RIGHT",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            HandSide::Left => "Left_Hand",
            HandSide::Right => "Right_Hand",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CaptureStep {
    Palm,
    Thumb,
    Index,
    Middle,
    Ring,
    Little,
}

impl CaptureStep {
    /// Enrollment order. The sequencing of `next_incomplete_step` and the
    /// storage listing both depend on it.
    pub const ALL: [CaptureStep; 6] = [
        CaptureStep::Palm,
        CaptureStep::Thumb,
        CaptureStep::Index,
        CaptureStep::Middle,
        CaptureStep::Ring,
        CaptureStep::Little,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            CaptureStep::Palm => "Palm",
            CaptureStep::Thumb => "Thumb",
            CaptureStep::Index => "Index",
            CaptureStep::Middle => "Middle",
            CaptureStep::Ring => "Ring",
            CaptureStep::Little => "Little",
        }
    }

    pub fn is_palm(&self) -> bool {
        matches!(self, CaptureStep::Palm)
    }

    pub fn finger(&self) -> Option<Finger> {
        match self {
            CaptureStep::Palm => None,
            CaptureStep::Thumb => Some(Finger::Thumb),
            CaptureStep::Index => Some(Finger::Index),
            CaptureStep::Middle => Some(Finger::Middle),
            CaptureStep::Ring => Some(Finger::Ring),
            CaptureStep::Little => Some(Finger::Little),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CaptureRecord {
    pub storage_path: Option<PathBuf>,
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandEnrollment {
    steps: BTreeMap<CaptureStep, CaptureRecord>,
}

impl Default for HandEnrollment {
    fn default() -> Self {
        let steps = CaptureStep::ALL
            .iter()
            .map(|step| (*step, CaptureRecord::default()))
            .collect();
        Self { steps }
    }
}

impl HandEnrollment {
    pub fn record(&self, step: CaptureStep) -> &CaptureRecord {
        // every step is inserted by the constructor
        &self.steps[&step]
    }

    pub fn mark_completed(&mut self, step: CaptureStep, path: &Path) {
        self.steps.insert(
            step,
            CaptureRecord {
                storage_path: Some(path.to_path_buf()),
                completed: true,
            },
        );
    }

    /// First incomplete step in enrollment order. A fully captured hand has
    /// no next step, so Palm doubles as the review-mode sentinel.
    pub fn next_incomplete_step(&self) -> CaptureStep {
        CaptureStep::ALL
            .iter()
            .copied()
            .find(|step| !self.record(*step).completed)
            .unwrap_or(CaptureStep::Palm)
    }

    pub fn is_fully_enrolled(&self) -> bool {
        CaptureStep::ALL
            .iter()
            .all(|step| self.record(*step).completed)
    }

    pub fn is_registered(&self) -> bool {
        self.record(CaptureStep::Palm).completed
    }

    pub fn completed_count(&self) -> usize {
        CaptureStep::ALL
            .iter()
            .filter(|step| self.record(**step).completed)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnrollmentState {
    pub left: HandEnrollment,
    pub right: HandEnrollment,
}

impl EnrollmentState {
    pub fn hand(&self, side: HandSide) -> &HandEnrollment {
        match side {
            HandSide::Left => &self.left,
            HandSide::Right => &self.right,
        }
    }

    pub fn hand_mut(&mut self, side: HandSide) -> &mut HandEnrollment {
        match side {
            HandSide::Left => &mut self.left,
            HandSide::Right => &mut self.right,
        }
    }

    pub fn record_capture(&mut self, side: HandSide, step: CaptureStep, path: &Path) {
        self.hand_mut(side).mark_completed(step, path);
    }

    pub fn next_incomplete_step(&self, side: HandSide) -> CaptureStep {
        self.hand(side).next_incomplete_step()
    }

    pub fn is_hand_fully_enrolled(&self, side: HandSide) -> bool {
        self.hand(side).is_fully_enrolled()
    }

    pub fn is_any_hand_registered(&self) -> bool {
        self.left.is_registered() || self.right.is_registered()
    }

    /// Rebuilds completion flags from a storage listing. Safe to call
    /// repeatedly on top of existing state; the last entry for a pair wins.
    pub fn apply_listing<'a, I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = &'a crate::hands::store::StoredEntry>,
    {
        for entry in entries {
            self.record_capture(entry.side, entry.step, &entry.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hands::store::StoredEntry;

    #[test]
    fn next_step_of_empty_hand_is_palm() {
        let state = EnrollmentState::default();
        assert_eq!(state.next_incomplete_step(HandSide::Left), CaptureStep::Palm);
    }

    #[test]
    fn next_step_of_fully_captured_hand_is_palm_sentinel() {
        let mut state = EnrollmentState::default();
        for step in CaptureStep::ALL {
            state.record_capture(HandSide::Right, step, Path::new("cap.jpg"));
        }
        assert!(state.is_hand_fully_enrolled(HandSide::Right));
        assert_eq!(
            state.next_incomplete_step(HandSide::Right),
            CaptureStep::Palm
        );
    }

    #[test]
    fn next_step_skips_completed_steps_in_order() {
        let mut state = EnrollmentState::default();
        for step in CaptureStep::ALL {
            if step != CaptureStep::Thumb {
                state.record_capture(HandSide::Left, step, Path::new("cap.jpg"));
            }
        }
        assert_eq!(
            state.next_incomplete_step(HandSide::Left),
            CaptureStep::Thumb
        );
    }

    #[test]
    fn registered_means_palm_completed() {
        let mut state = EnrollmentState::default();
        assert!(!state.is_any_hand_registered());

        state.record_capture(HandSide::Left, CaptureStep::Index, Path::new("cap.jpg"));
        assert!(!state.is_any_hand_registered());

        state.record_capture(HandSide::Left, CaptureStep::Palm, Path::new("palm.jpg"));
        assert!(state.is_any_hand_registered());
        assert!(state.hand(HandSide::Left).is_registered());
        assert!(!state.hand(HandSide::Right).is_registered());
    }

    #[test]
    fn apply_listing_is_idempotent_and_overwrites() {
        let mut state = EnrollmentState::default();
        let entries = vec![
            StoredEntry {
                side: HandSide::Left,
                step: CaptureStep::Palm,
                path: PathBuf::from("Left_Hand_1.jpg"),
            },
            StoredEntry {
                side: HandSide::Left,
                step: CaptureStep::Palm,
                path: PathBuf::from("Left_Hand_2.jpg"),
            },
        ];
        state.apply_listing(&entries);
        state.apply_listing(&entries);

        let record = state.hand(HandSide::Left).record(CaptureStep::Palm);
        assert!(record.completed);
        assert_eq!(record.storage_path.as_deref(), Some(Path::new("Left_Hand_2.jpg")));
        assert_eq!(state.hand(HandSide::Left).completed_count(), 1);
    }
}
