mod backend;
mod backends;
mod result;

pub use backend::{IdentifyError, InferenceBackend};
pub use backends::{HttpBackendConfig, HttpInferenceClient, StubBackend, IMAGE_FIELD};
pub use result::{most_likely, DetectedObject, DetectionList, InferenceResponse};
