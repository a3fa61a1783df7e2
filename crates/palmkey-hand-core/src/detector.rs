use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::warn;

use crate::hands::enrollment::HandSide;
use crate::hands::geometry::Point;

/// One hand as reported by the external landmark detector: the classified
/// side and the 21 tracked points in normalized image coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub side: HandSide,
    pub landmarks: Vec<Point>,
}

pub fn parse_handedness(label: &str) -> Option<HandSide> {
    match label {
        "Left" => Some(HandSide::Left),
        "Right" => Some(HandSide::Right),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DetectorEvent {
    /// A processed frame; `None` means no hand was found in it.
    Result(Option<Detection>),
    /// Transient detector failure. Logged and dropped, never fatal.
    Error(String),
}

/// Single-slot hand-off between the detector worker and the frame consumer.
/// The producer never blocks: an unconsumed value is replaced by the newer
/// one, so the consumer always sees the latest result and stale frames are
/// dropped on the floor.
pub struct LatestSlot<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> LatestSlot<T> {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }

    pub fn publish(&self, value: T) {
        match self.tx.try_send(value) {
            Ok(()) => {}
            Err(TrySendError::Full(value)) => {
                let _ = self.rx.try_recv();
                if self.tx.try_send(value).is_err() {
                    warn!("latest-slot hand-off lost a race; frame dropped");
                }
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    pub fn take(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}
