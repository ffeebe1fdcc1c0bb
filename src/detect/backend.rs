use thiserror::Error;

use crate::detect::result::DetectedObject;
use crate::image_source::ImageSource;

/// Why an identify call produced no detections.
///
/// The state machine keeps the previous detection list for every variant;
/// the split only decides how the failure is reported.
#[derive(Debug, Error)]
pub enum IdentifyError {
    /// Backend answered with a non-success status. The body is not inspected.
    #[error("inference backend returned HTTP {0}")]
    Status(u16),

    #[error("inference request failed: {0}")]
    Transport(String),

    /// Success status, but the body was not `{ "body": DetectedObject[] }`.
    #[error("invalid inference response: {0}")]
    Decode(String),
}

/// Inference backend trait.
///
/// Implementations submit one image and return the ordered detections. They
/// must not retry; a failed call is reported once and the caller decides what
/// to keep.
pub trait InferenceBackend {
    /// Backend identifier for logs.
    fn name(&self) -> &'static str;

    fn identify(&self, image: &ImageSource) -> Result<Vec<DetectedObject>, IdentifyError>;
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for &B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn identify(&self, image: &ImageSource) -> Result<Vec<DetectedObject>, IdentifyError> {
        (**self).identify(image)
    }
}

impl<B: InferenceBackend + ?Sized> InferenceBackend for Box<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn identify(&self, image: &ImageSource) -> Result<Vec<DetectedObject>, IdentifyError> {
        (**self).identify(image)
    }
}
