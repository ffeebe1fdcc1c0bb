use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use crate::detect::backend::{IdentifyError, InferenceBackend};
use crate::detect::result::DetectedObject;
use crate::image_source::ImageSource;

/// Stub backend for tests and offline demos.
///
/// Replies are queued; once the queue is empty every call returns the
/// fallback reply. Calls are counted so callers can assert that nothing was
/// sent.
pub struct StubBackend {
    replies: RefCell<VecDeque<Result<Vec<DetectedObject>, IdentifyError>>>,
    fallback: Vec<DetectedObject>,
    calls: Cell<usize>,
    last_digest: RefCell<Option<String>>,
}

impl StubBackend {
    pub fn new() -> Self {
        Self::with_fallback(Vec::new())
    }

    pub fn with_fallback(fallback: Vec<DetectedObject>) -> Self {
        Self {
            replies: RefCell::new(VecDeque::new()),
            fallback,
            calls: Cell::new(0),
            last_digest: RefCell::new(None),
        }
    }

    /// Queue the outcome of the next unanswered call.
    pub fn push_reply(&self, reply: Result<Vec<DetectedObject>, IdentifyError>) {
        self.replies.borrow_mut().push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    /// Digest of the most recently submitted image.
    pub fn last_digest(&self) -> Option<String> {
        self.last_digest.borrow().clone()
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn identify(&self, image: &ImageSource) -> Result<Vec<DetectedObject>, IdentifyError> {
        self.calls.set(self.calls.get() + 1);
        *self.last_digest.borrow_mut() = Some(image.digest().to_string());
        match self.replies.borrow_mut().pop_front() {
            Some(reply) => reply,
            None => Ok(self.fallback.clone()),
        }
    }
}
