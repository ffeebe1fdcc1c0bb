pub mod http;
pub mod stub;

pub use http::{HttpBackendConfig, HttpInferenceClient, IMAGE_FIELD};
pub use stub::StubBackend;
