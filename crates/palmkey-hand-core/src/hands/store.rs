use std::env;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::hands::enrollment::{CaptureStep, HandSide};
use crate::hands::geometry::{Point, LANDMARK_COUNT};

pub const DEFAULT_STORE_DIR: &str = "/var/lib/palmkey/captures";
pub const STORE_DIR_ENV: &str = "PALMKEY_STORE_DIR";
const FINGER_TAG: &str = "Finger";
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// On-disk schema of the palm reference template.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PalmTemplateFile {
    pub landmarks: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub side: HandSide,
    pub step: CaptureStep,
    pub path: PathBuf,
}

pub trait CaptureStore {
    fn save_image(&self, side: HandSide, step: CaptureStep, bytes: &[u8]) -> AppResult<PathBuf>;
    fn save_template(&self, side: HandSide, landmarks: &[Point]) -> AppResult<PathBuf>;
    fn load_template(&self, side: HandSide) -> AppResult<Option<Vec<Point>>>;
    fn list(&self) -> AppResult<Vec<StoredEntry>>;
    fn remove_hand(&self, side: HandSide) -> AppResult<Vec<PathBuf>>;
}

pub trait StoreDirResolver {
    fn resolve(&self, override_dir: Option<&Path>) -> PathBuf;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvStoreDirResolver;

impl StoreDirResolver for EnvStoreDirResolver {
    fn resolve(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            dir.to_path_buf()
        } else if let Ok(env_value) = env::var(STORE_DIR_ENV) {
            PathBuf::from(env_value)
        } else {
            PathBuf::from(DEFAULT_STORE_DIR)
        }
    }
}

/// Maps a stored file name back to the (hand, step) pair it captures.
/// Finger captures carry the step name and a "Finger" tag; an image without
/// the tag is the palm. Anything else (including template JSON) is skipped.
pub fn classify_entry(name: &str) -> Option<(HandSide, CaptureStep)> {
    let side = if name.starts_with(HandSide::Left.file_prefix()) {
        HandSide::Left
    } else if name.starts_with(HandSide::Right.file_prefix()) {
        HandSide::Right
    } else {
        return None;
    };

    let rest = &name[side.file_prefix().len()..];
    let step = if rest.contains(CaptureStep::Thumb.display_name()) {
        CaptureStep::Thumb
    } else if rest.contains(CaptureStep::Index.display_name()) {
        CaptureStep::Index
    } else if rest.contains(CaptureStep::Middle.display_name()) {
        CaptureStep::Middle
    } else if rest.contains(CaptureStep::Ring.display_name()) {
        CaptureStep::Ring
    } else if rest.contains(CaptureStep::Little.display_name()) {
        CaptureStep::Little
    } else if !rest.contains(FINGER_TAG) && is_image_name(name) {
        CaptureStep::Palm
    } else {
        return None;
    };

    Some((side, step))
}

fn is_image_name(name: &str) -> bool {
    name.ends_with(".jpg") || name.ends_with(".png")
}

#[derive(Debug, Clone)]
pub struct FilesystemCaptureStore {
    root: PathBuf,
}

impl FilesystemCaptureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn capture_file_name(side: HandSide, step: CaptureStep) -> String {
        let timestamp = Utc::now().format(TIMESTAMP_FORMAT);
        if step.is_palm() {
            format!("{}_{}.jpg", side.file_prefix(), timestamp)
        } else {
            format!(
                "{}_{}_{}_{}.jpg",
                side.file_prefix(),
                step.display_name(),
                FINGER_TAG,
                timestamp
            )
        }
    }

    fn entries(&self) -> AppResult<Vec<PathBuf>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let read_dir = fs::read_dir(&self.root).map_err(|source| AppError::StoreList {
            path: self.root.clone(),
            source,
        })?;
        let mut paths = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| AppError::StoreList {
                path: self.root.clone(),
                source,
            })?;
            paths.push(entry.path());
        }
        Ok(paths)
    }

    fn find_palm_image(&self, side: HandSide) -> AppResult<Option<PathBuf>> {
        Ok(self.entries()?.into_iter().find(|path| {
            file_name(path).is_some_and(|name| {
                name.starts_with(side.file_prefix())
                    && !name.contains(FINGER_TAG)
                    && is_image_name(name)
            })
        }))
    }

    fn find_template_file(&self, side: HandSide) -> AppResult<Option<PathBuf>> {
        Ok(self.entries()?.into_iter().find(|path| {
            file_name(path).is_some_and(|name| {
                name.starts_with(side.file_prefix())
                    && !name.contains(FINGER_TAG)
                    && name.ends_with(".json")
            })
        }))
    }

    /// A new capture replaces the previous one for the same (hand, step)
    /// pair; a palm re-capture also invalidates the stale template.
    fn delete_old_captures(&self, side: HandSide, step: CaptureStep) -> AppResult<()> {
        for path in self.entries()? {
            let name = match file_name(&path) {
                Some(name) => name.to_string(),
                None => continue,
            };
            if !name.starts_with(side.file_prefix()) {
                continue;
            }

            let stale = if step.is_palm() {
                !name.contains(FINGER_TAG)
            } else {
                name.contains(FINGER_TAG) && name.contains(step.display_name())
            };
            if stale {
                debug!(path = %path.display(), "removing stale capture");
                fs::remove_file(&path).map_err(|source| AppError::CaptureWrite {
                    path: path.clone(),
                    source,
                })?;
            }
        }
        Ok(())
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> AppResult<()> {
        fs::create_dir_all(&self.root).map_err(|source| AppError::CaptureWrite {
            path: self.root.clone(),
            source,
        })?;

        let mut tmp = NamedTempFile::new_in(&self.root).map_err(|source| AppError::CaptureWrite {
            path: path.to_path_buf(),
            source,
        })?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            writer
                .write_all(bytes)
                .and_then(|_| writer.flush())
                .map_err(|source| AppError::CaptureWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        tmp.persist(path).map_err(|err| AppError::CaptureWrite {
            path: path.to_path_buf(),
            source: err.error,
        })?;
        Ok(())
    }
}

impl CaptureStore for FilesystemCaptureStore {
    fn save_image(&self, side: HandSide, step: CaptureStep, bytes: &[u8]) -> AppResult<PathBuf> {
        self.delete_old_captures(side, step)?;
        let path = self.root.join(Self::capture_file_name(side, step));
        self.write_atomic(&path, bytes)?;
        debug!(path = %path.display(), "saved capture image");
        Ok(path)
    }

    fn save_template(&self, side: HandSide, landmarks: &[Point]) -> AppResult<PathBuf> {
        let path = match self.find_palm_image(side)? {
            // the template shares the palm image's stem
            Some(image) => image.with_extension("json"),
            None => {
                let timestamp = Utc::now().format(TIMESTAMP_FORMAT);
                self.root
                    .join(format!("{}_{}.json", side.file_prefix(), timestamp))
            }
        };

        if landmarks.len() != LANDMARK_COUNT {
            return Err(AppError::LandmarkValidation {
                path,
                message: format!(
                    "expected {} landmarks, found {}",
                    LANDMARK_COUNT,
                    landmarks.len()
                ),
            });
        }

        let file = PalmTemplateFile {
            landmarks: landmarks.to_vec(),
        };
        let payload = serde_json::to_vec_pretty(&file)?;
        self.write_atomic(&path, &payload)?;
        debug!(path = %path.display(), "saved palm template");
        Ok(path)
    }

    fn load_template(&self, side: HandSide) -> AppResult<Option<Vec<Point>>> {
        let path = match self.find_template_file(side)? {
            Some(path) => path,
            None => return Ok(None),
        };

        let data = fs::read(&path).map_err(|source| AppError::CaptureRead {
            path: path.clone(),
            source,
        })?;

        // A malformed template degrades to "not registered" instead of
        // failing the whole session.
        let parsed: PalmTemplateFile = match serde_json::from_slice(&data) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring corrupt palm template");
                return Ok(None);
            }
        };
        if parsed.landmarks.len() != LANDMARK_COUNT {
            warn!(
                path = %path.display(),
                found = parsed.landmarks.len(),
                "ignoring palm template with wrong landmark count"
            );
            return Ok(None);
        }

        Ok(Some(parsed.landmarks))
    }

    fn list(&self) -> AppResult<Vec<StoredEntry>> {
        let mut listed = Vec::new();
        for path in self.entries()? {
            let Some(name) = file_name(&path) else {
                continue;
            };
            if let Some((side, step)) = classify_entry(name) {
                listed.push(StoredEntry { side, step, path });
            }
        }
        Ok(listed)
    }

    fn remove_hand(&self, side: HandSide) -> AppResult<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for path in self.entries()? {
            let matches = file_name(&path)
                .is_some_and(|name| name.starts_with(side.file_prefix()));
            if matches {
                fs::remove_file(&path).map_err(|source| AppError::CaptureWrite {
                    path: path.clone(),
                    source,
                })?;
                removed.push(path);
            }
        }
        Ok(removed)
    }
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    use crate::test_utils::open_left_palm;

    #[test]
    fn classify_recognizes_palm_and_finger_names() {
        assert_eq!(
            classify_entry("Left_Hand_20240210_101500.jpg"),
            Some((HandSide::Left, CaptureStep::Palm))
        );
        assert_eq!(
            classify_entry("Right_Hand_Index_Finger_20240210_101500.jpg"),
            Some((HandSide::Right, CaptureStep::Index))
        );
        assert_eq!(
            classify_entry("Right_Hand_Ring_Finger_20240210_101500.jpg"),
            Some((HandSide::Right, CaptureStep::Ring))
        );
        // template JSON is not a capture
        assert_eq!(classify_entry("Left_Hand_20240210_101500.json"), None);
        assert_eq!(classify_entry("notes.txt"), None);
    }

    #[test]
    fn save_image_and_list_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemCaptureStore::new(tmp.path());

        store
            .save_image(HandSide::Left, CaptureStep::Palm, b"palm-bytes")
            .unwrap();
        store
            .save_image(HandSide::Left, CaptureStep::Index, b"index-bytes")
            .unwrap();

        let mut listed = store.list().unwrap();
        listed.sort_by_key(|entry| entry.step);
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].step, CaptureStep::Palm);
        assert_eq!(listed[1].step, CaptureStep::Index);
        assert!(listed.iter().all(|entry| entry.side == HandSide::Left));
    }

    #[test]
    fn recapture_replaces_previous_artifacts() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemCaptureStore::new(tmp.path());

        store
            .save_image(HandSide::Left, CaptureStep::Palm, b"first")
            .unwrap();
        store
            .save_template(HandSide::Left, &open_left_palm())
            .unwrap();
        let second = store
            .save_image(HandSide::Left, CaptureStep::Palm, b"second")
            .unwrap();

        // the palm re-capture removed the old image and its template
        let palm_entries: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .filter(|entry| entry.step == CaptureStep::Palm)
            .collect();
        assert_eq!(palm_entries.len(), 1);
        assert_eq!(palm_entries[0].path, second);
        assert_eq!(store.load_template(HandSide::Left).unwrap(), None);
    }

    #[test]
    fn template_round_trip_shares_palm_image_stem() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemCaptureStore::new(tmp.path());

        let image = store
            .save_image(HandSide::Right, CaptureStep::Palm, b"palm")
            .unwrap();
        let template = store
            .save_template(HandSide::Right, &open_left_palm())
            .unwrap();
        assert_eq!(template, image.with_extension("json"));

        let loaded = store.load_template(HandSide::Right).unwrap().unwrap();
        assert_eq!(loaded, open_left_palm());
        assert_eq!(store.load_template(HandSide::Left).unwrap(), None);
    }

    #[test]
    fn corrupt_or_short_template_reads_as_absent() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemCaptureStore::new(tmp.path());

        let path = tmp.path().join("Left_Hand_20240210_101500.json");
        fs::write(&path, b"{ not json").unwrap();
        assert_eq!(store.load_template(HandSide::Left).unwrap(), None);

        let short = PalmTemplateFile {
            landmarks: vec![Point::new(0.1, 0.2); 5],
        };
        fs::write(&path, serde_json::to_vec(&short).unwrap()).unwrap();
        assert_eq!(store.load_template(HandSide::Left).unwrap(), None);
    }

    #[test]
    fn save_template_rejects_wrong_point_count() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemCaptureStore::new(tmp.path());
        let err = store
            .save_template(HandSide::Left, &[Point::new(0.0, 0.0); 3])
            .unwrap_err();
        assert!(matches!(err, AppError::LandmarkValidation { .. }));
    }

    #[test]
    fn remove_hand_only_touches_that_side() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemCaptureStore::new(tmp.path());
        store
            .save_image(HandSide::Left, CaptureStep::Palm, b"left")
            .unwrap();
        store
            .save_image(HandSide::Right, CaptureStep::Palm, b"right")
            .unwrap();

        let removed = store.remove_hand(HandSide::Left).unwrap();
        assert_eq!(removed.len(), 1);

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].side, HandSide::Right);
    }

    #[test]
    fn listing_a_missing_store_dir_is_empty() {
        let store = FilesystemCaptureStore::new("/nonexistent/palmkey-store");
        assert!(store.list().unwrap().is_empty());
        assert_eq!(store.load_template(HandSide::Left).unwrap(), None);
    }

    #[test]
    fn env_resolver_prefers_override() {
        let resolver = EnvStoreDirResolver;
        let override_dir = PathBuf::from("/tmp/palmkey-override");
        assert_eq!(resolver.resolve(Some(&override_dir)), override_dir);
    }
}
