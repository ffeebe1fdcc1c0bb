//! Application state and its transitions.
//!
//! All UI state lives in one `AppState`: the chosen image, the busy flag, the
//! detection list, the shown selection and the camera flags. Everything that
//! changes it goes through a method here.
//!
//! Identify calls are split into `begin_identify` and `complete_identify` so
//! the network round trip happens outside the state. Each call gets a ticket
//! with a generation number; only the newest ticket may apply its outcome, so
//! a slow stale response can never overwrite a fresher one.

use std::sync::Arc;

use crate::capture::CameraState;
use crate::detect::{DetectedObject, DetectionList, IdentifyError, InferenceBackend};
use crate::image_source::ImageSource;

/// Handle for one in-flight identify call.
#[derive(Debug, PartialEq, Eq)]
pub struct IdentifyTicket {
    generation: u64,
}

impl IdentifyTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What `complete_identify` did with an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifyOutcome {
    /// The detection list was replaced.
    Applied,
    /// The call failed; the previous list is unchanged.
    Failed,
    /// A newer call was started; the outcome was discarded.
    Stale,
}

#[derive(Debug, Default)]
pub struct AppState {
    image: Option<ImageSource>,
    busy: bool,
    generation: u64,
    detections: DetectionList,
    selection: Option<Arc<DetectedObject>>,
    pub camera: CameraState,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn image(&self) -> Option<&ImageSource> {
        self.image.as_ref()
    }

    /// Replace the current image. The previous one, and its preview, is dropped.
    pub fn set_image(&mut self, image: ImageSource) {
        if let Some(previous) = &self.image {
            log::debug!(
                "replacing image {} with {}",
                previous.digest(),
                image.digest()
            );
        }
        self.image = Some(image);
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn detections(&self) -> &DetectionList {
        &self.detections
    }

    /// Label of the highest-scoring detection.
    pub fn most_likely_label(&self) -> Option<&str> {
        self.detections.most_likely().map(|obj| obj.label.as_str())
    }

    /// The shown detection, if it still belongs to the current list.
    pub fn selection(&self) -> Option<&DetectedObject> {
        self.selection
            .as_ref()
            .filter(|selected| self.detections.contains(selected))
            .map(|selected| &**selected)
    }

    /// Show the first detection labelled `label`, or hide it if it is
    /// already shown. An unknown label clears the selection.
    pub fn toggle_selection(&mut self, label: &str) {
        let found = self.detections.find_label(label).cloned();
        let already_shown = match (&self.selection, &found) {
            (Some(current), Some(found)) => Arc::ptr_eq(current, found),
            _ => false,
        };
        self.selection = if already_shown { None } else { found };
    }

    /// Start an identify call.
    ///
    /// Returns `None` without touching any state when no image is chosen.
    pub fn begin_identify(&mut self) -> Option<IdentifyTicket> {
        let image = self.image.as_ref()?;
        self.generation += 1;
        self.busy = true;
        log::info!(
            "identify #{}: submitting image {} ({} bytes)",
            self.generation,
            image.digest(),
            image.len()
        );
        Some(IdentifyTicket {
            generation: self.generation,
        })
    }

    /// Finish an identify call.
    ///
    /// A current ticket always clears the busy flag. Success replaces the list
    /// and clears the selection; failure keeps the previous list. A stale
    /// ticket changes nothing.
    pub fn complete_identify(
        &mut self,
        ticket: IdentifyTicket,
        outcome: Result<Vec<DetectedObject>, IdentifyError>,
    ) -> IdentifyOutcome {
        if ticket.generation != self.generation {
            log::warn!(
                "identify #{}: discarding result, #{} is newer",
                ticket.generation,
                self.generation
            );
            return IdentifyOutcome::Stale;
        }
        self.busy = false;
        match outcome {
            Ok(objects) => {
                log::info!(
                    "identify #{}: {} objects detected",
                    ticket.generation,
                    objects.len()
                );
                self.detections = DetectionList::new(objects);
                self.selection = None;
                IdentifyOutcome::Applied
            }
            Err(err @ IdentifyError::Status(_)) => {
                log::error!("identify #{}: failed to upload file: {}", ticket.generation, err);
                IdentifyOutcome::Failed
            }
            Err(err) => {
                log::error!(
                    "identify #{}: error during inference call: {}",
                    ticket.generation,
                    err
                );
                IdentifyOutcome::Failed
            }
        }
    }

    /// Run a whole identify call against `backend`.
    ///
    /// Returns `None` when no image is chosen; the backend is not called.
    pub fn identify<B: InferenceBackend + ?Sized>(
        &mut self,
        backend: &B,
    ) -> Option<IdentifyOutcome> {
        let ticket = self.begin_identify()?;
        let image = self.image.as_ref()?;
        log::debug!(
            "identify #{}: sending to {} backend",
            ticket.generation,
            backend.name()
        );
        let outcome = backend.identify(image);
        Some(self.complete_identify(ticket, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::StubBackend;

    fn obj(label: &str, score: f64) -> DetectedObject {
        DetectedObject {
            label: label.to_string(),
            mask: String::new(),
            score,
        }
    }

    fn state_with_image() -> AppState {
        let mut state = AppState::new();
        let image = ImageSource::captured_png(vec![1, 2, 3]).expect("image");
        state.set_image(image);
        state
    }

    fn state_with_list(objects: Vec<DetectedObject>) -> AppState {
        let mut state = state_with_image();
        let ticket = state.begin_identify().expect("ticket");
        assert_eq!(
            state.complete_identify(ticket, Ok(objects)),
            IdentifyOutcome::Applied
        );
        state
    }

    #[test]
    fn identify_without_image_is_a_no_op() {
        let mut state = AppState::new();
        let backend = StubBackend::new();
        assert_eq!(state.identify(&backend), None);
        assert_eq!(backend.calls(), 0);
        assert!(!state.is_busy());
    }

    #[test]
    fn busy_is_set_while_in_flight() {
        let mut state = state_with_image();
        let ticket = state.begin_identify().expect("ticket");
        assert!(state.is_busy());
        state.complete_identify(ticket, Ok(vec![]));
        assert!(!state.is_busy());
    }

    #[test]
    fn most_likely_label_follows_list() {
        let state = state_with_list(vec![obj("cat", 0.92), obj("dog", 0.91)]);
        assert_eq!(state.most_likely_label(), Some("cat"));
    }

    #[test]
    fn toggling_twice_deselects() {
        let mut state = state_with_list(vec![obj("cat", 0.92), obj("dog", 0.91)]);
        state.toggle_selection("cat");
        assert_eq!(state.selection().map(|o| o.label.as_str()), Some("cat"));
        state.toggle_selection("cat");
        assert!(state.selection().is_none());
    }

    #[test]
    fn selecting_another_label_switches() {
        let mut state = state_with_list(vec![obj("cat", 0.92), obj("dog", 0.91)]);
        state.toggle_selection("cat");
        state.toggle_selection("dog");
        assert_eq!(state.selection().map(|o| o.label.as_str()), Some("dog"));
    }

    #[test]
    fn unknown_label_clears_selection() {
        let mut state = state_with_list(vec![obj("cat", 0.92)]);
        state.toggle_selection("cat");
        state.toggle_selection("zebra");
        assert!(state.selection().is_none());
    }

    #[test]
    fn duplicate_labels_resolve_to_first_entry() {
        let mut state = state_with_list(vec![obj("cup", 0.4), obj("cup", 0.9)]);
        state.toggle_selection("cup");
        assert_eq!(state.selection().map(|o| o.score), Some(0.4));
    }

    #[test]
    fn new_list_invalidates_selection_even_with_equal_values() {
        let mut state = state_with_list(vec![obj("cat", 0.92)]);
        state.toggle_selection("cat");
        let ticket = state.begin_identify().expect("ticket");
        state.complete_identify(ticket, Ok(vec![obj("cat", 0.92)]));
        assert!(state.selection().is_none());
        // The equal-valued entry in the new list is a fresh selection.
        state.toggle_selection("cat");
        assert_eq!(state.selection().map(|o| o.label.as_str()), Some("cat"));
    }

    #[test]
    fn http_failure_keeps_previous_list() {
        let mut state = state_with_list(vec![obj("cat", 0.92), obj("dog", 0.91)]);
        state.toggle_selection("dog");
        let ticket = state.begin_identify().expect("ticket");
        let outcome = state.complete_identify(ticket, Err(IdentifyError::Status(500)));
        assert_eq!(outcome, IdentifyOutcome::Failed);
        assert!(!state.is_busy());
        let labels: Vec<_> = state.detections().iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, vec!["cat", "dog"]);
        assert_eq!(state.selection().map(|o| o.label.as_str()), Some("dog"));
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut state = state_with_image();
        let first = state.begin_identify().expect("first");
        let second = state.begin_identify().expect("second");
        assert_eq!(
            state.complete_identify(second, Ok(vec![obj("new", 0.5)])),
            IdentifyOutcome::Applied
        );
        let third = state.begin_identify().expect("third");
        assert_eq!(
            state.complete_identify(first, Ok(vec![obj("old", 0.9)])),
            IdentifyOutcome::Stale
        );
        assert_eq!(state.most_likely_label(), Some("new"));
        // The stale call must not clear the busy flag of the newest call.
        assert!(state.is_busy());
        state.complete_identify(third, Err(IdentifyError::Transport("reset".into())));
        assert!(!state.is_busy());
    }

    #[test]
    fn replacing_image_releases_previous_preview() -> anyhow::Result<()> {
        let mut state = state_with_image();
        let old_preview = state.image().expect("image").preview_path().to_path_buf();
        state.set_image(ImageSource::captured_png(vec![4, 5, 6])?);
        assert!(!old_preview.exists());
        assert!(state.image().expect("image").preview_path().exists());
        Ok(())
    }
}
