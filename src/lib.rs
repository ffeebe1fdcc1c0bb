//! AI-Dentifier
//!
//! Select a photo or capture one from a camera, send it to an object
//! detection backend, and inspect what came back: labels with confidence,
//! the most likely label, and a per-object segmentation mask overlay.
//!
//! # Architecture
//!
//! - `image_source`: the chosen image and its scoped preview file
//! - `capture`: media devices, facing selection, frame capture
//! - `detect`: detection types and inference backends (HTTP, stub)
//! - `state`: the single application state and its transitions
//! - `present`: result text and mask compositing
//! - `session`: command loop mapping user actions onto the state
//! - `config`, `ui`: configuration loading and terminal progress
//!
//! Inference happens remotely. This crate never runs a model; it uploads the
//! image as `multipart/form-data` and reads `{ "body": DetectedObject[] }`.

pub mod capture;
pub mod config;
pub mod detect;
pub mod image_source;
pub mod present;
pub mod session;
pub mod state;
pub mod ui;

pub use capture::{
    open_media_devices, select_device, Camera, CameraState, DeviceInfo, DeviceKind, Facing,
    MediaDevices, SyntheticDevices, VideoFrame, VideoStream,
};
#[cfg(feature = "camera-v4l2")]
pub use capture::{V4l2Config, V4l2Devices};
pub use config::AppConfig;
pub use detect::{
    DetectedObject, DetectionList, HttpBackendConfig, HttpInferenceClient, IdentifyError,
    InferenceBackend, StubBackend,
};
pub use image_source::ImageSource;
pub use session::{Command, Flow, Session};
pub use state::{AppState, IdentifyOutcome, IdentifyTicket};
