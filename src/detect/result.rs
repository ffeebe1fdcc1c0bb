use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One label/mask/score triple returned by the inference backend.
///
/// Labels are display keys only; the backend may repeat them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    /// Base64-encoded raster image marking the object's extent.
    pub mask: String,
    /// Confidence in [0, 1].
    pub score: f64,
}

impl DetectedObject {
    /// Score as a whole percentage, rounded half up.
    pub fn percent(&self) -> i64 {
        (self.score * 100.0).round() as i64
    }
}

/// Response envelope of the inference route: `{ "body": [...] }`.
#[derive(Debug, Deserialize)]
pub struct InferenceResponse {
    pub body: Vec<DetectedObject>,
}

/// Ordered detections from a single inference call.
///
/// Entries are reference counted so a selection can be matched by identity
/// rather than by value: an equal object from a later list is a different
/// entry.
#[derive(Clone, Debug, Default)]
pub struct DetectionList {
    entries: Vec<Arc<DetectedObject>>,
}

impl DetectionList {
    pub fn new(objects: Vec<DetectedObject>) -> Self {
        Self {
            entries: objects.into_iter().map(Arc::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<DetectedObject>> {
        self.entries.iter()
    }

    /// First entry carrying `label`.
    pub fn find_label(&self, label: &str) -> Option<&Arc<DetectedObject>> {
        self.entries.iter().find(|entry| entry.label == label)
    }

    /// True when `object` is one of this list's entries (identity, not value).
    pub fn contains(&self, object: &Arc<DetectedObject>) -> bool {
        self.entries.iter().any(|entry| Arc::ptr_eq(entry, object))
    }

    /// Entry with the highest score. On ties the earliest entry wins.
    pub fn most_likely(&self) -> Option<&Arc<DetectedObject>> {
        most_likely(&self.entries)
    }
}

impl From<Vec<DetectedObject>> for DetectionList {
    fn from(objects: Vec<DetectedObject>) -> Self {
        Self::new(objects)
    }
}

/// Highest-scoring object; the earlier element is kept on equal scores.
pub fn most_likely<T: AsRef<DetectedObject>>(objects: &[T]) -> Option<&T> {
    objects.iter().fold(None, |best: Option<&T>, current| match best {
        Some(best) if current.as_ref().score <= best.as_ref().score => Some(best),
        _ => Some(current),
    })
}

impl AsRef<DetectedObject> for DetectedObject {
    fn as_ref(&self) -> &DetectedObject {
        self
    }
}
