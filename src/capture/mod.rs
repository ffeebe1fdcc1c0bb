//! Camera acquisition.
//!
//! This module provides the camera side of image selection:
//! - Media device enumeration behind the `MediaDevices` trait
//! - Facing-preference device selection (label substring heuristic)
//! - Live stream lifecycle (start, restart on facing flip, release on capture)
//! - Frame capture encoded as a PNG `ImageSource`
//!
//! Backends:
//! - Synthetic devices (`stub://` ids) for tests and demos
//! - V4L2 devices (feature: camera-v4l2)
//!
//! Device labels are platform and driver dependent, so matching on them is a
//! best-effort heuristic. The chosen device id is recorded in `CameraState` so
//! callers can see what the heuristic picked.

mod synthetic;
#[cfg(feature = "camera-v4l2")]
pub mod v4l2;

use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::io::Cursor;
use std::str::FromStr;

use crate::image_source::ImageSource;

pub use synthetic::SyntheticDevices;
#[cfg(feature = "camera-v4l2")]
pub use v4l2::{V4l2Config, V4l2Devices};

/// Requested camera facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    #[default]
    Front,
    Back,
}

impl Facing {
    pub fn flipped(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    /// Lowercase keyword searched for in device labels.
    pub fn label_keyword(self) -> &'static str {
        match self {
            Facing::Front => "front",
            Facing::Back => "back",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label_keyword())
    }
}

impl FromStr for Facing {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "front" | "user" => Ok(Facing::Front),
            "back" | "rear" | "environment" => Ok(Facing::Back),
            other => Err(anyhow!(
                "unknown camera facing '{}'; expected front or back",
                other
            )),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

/// One enumerated media device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    /// Human-readable label; may be empty when the platform hides it.
    pub label: String,
}

/// An RGB8 frame at the stream's native resolution.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pixels: Vec<u8>,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 3;
        if pixels.len() < expected {
            return Err(anyhow!(
                "frame buffer holds {} bytes, {}x{} rgb needs {}",
                pixels.len(),
                width,
                height,
                expected
            ));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let expected = self.width as usize * self.height as usize * 3;
        let image =
            image::RgbImage::from_raw(self.width, self.height, self.pixels[..expected].to_vec())
                .ok_or_else(|| anyhow!("frame dimensions do not match pixel buffer"))?;
        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), image::ImageFormat::Png)
            .context("encode frame as png")?;
        Ok(encoded)
    }
}

/// A live video stream. Dropping it releases the device.
pub trait VideoStream {
    fn device_id(&self) -> &str;

    fn grab_frame(&mut self) -> Result<VideoFrame>;
}

/// Media device access: enumeration plus stream acquisition.
pub trait MediaDevices {
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>>;

    /// Open a video stream. `None` selects the platform default device.
    fn open(&mut self, device_id: Option<&str>) -> Result<Box<dyn VideoStream>>;
}

/// Open media devices from a config string: `stub://` for synthetic devices,
/// `v4l2` for local V4L2 nodes.
pub fn open_media_devices(backend: &str) -> Result<Box<dyn MediaDevices>> {
    if backend.starts_with("stub://") {
        return Ok(Box::new(SyntheticDevices::default()));
    }
    if backend == "v4l2" {
        #[cfg(feature = "camera-v4l2")]
        {
            return Ok(Box::new(V4l2Devices::new(V4l2Config::default())));
        }
        #[cfg(not(feature = "camera-v4l2"))]
        {
            return Err(anyhow!("v4l2 cameras require the camera-v4l2 feature"));
        }
    }
    Err(anyhow!(
        "unsupported camera backend '{}'; expected stub:// or v4l2",
        backend
    ))
}

/// Pick the first video input whose label mentions the requested facing.
///
/// Matching is a case-insensitive substring search. Returns `None` when no
/// label matches; callers then fall back to the default device.
pub fn select_device(devices: &[DeviceInfo], facing: Facing) -> Option<&DeviceInfo> {
    let keyword = facing.label_keyword();
    devices
        .iter()
        .filter(|device| device.kind == DeviceKind::VideoInput)
        .find(|device| device.label.to_lowercase().contains(keyword))
}

/// Camera UI state.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CameraState {
    /// The live view was requested. Stays set when acquisition fails.
    pub requested: bool,
    pub facing: Facing,
    /// Device chosen by the last start; `None` means the default device.
    pub device_id: Option<String>,
}

/// Owns the media devices and the live stream.
pub struct Camera {
    devices: Box<dyn MediaDevices>,
    stream: Option<Box<dyn VideoStream>>,
}

impl Camera {
    pub fn new(devices: Box<dyn MediaDevices>) -> Self {
        Self {
            devices,
            stream: None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.stream.is_some()
    }

    /// Start the live view for `state.facing`.
    ///
    /// `state.requested` is set before acquisition and left set on failure.
    pub fn start(&mut self, state: &mut CameraState) -> Result<()> {
        state.requested = true;
        self.stream = None;

        let devices = self
            .devices
            .enumerate_devices()
            .context("enumerate media devices")?;
        state.device_id = select_device(&devices, state.facing).map(|d| d.device_id.clone());
        match &state.device_id {
            Some(id) => log::info!("camera: {} facing matched device {}", state.facing, id),
            None => log::info!(
                "camera: no device label matches '{}', using default device",
                state.facing
            ),
        }

        let stream = self
            .devices
            .open(state.device_id.as_deref())
            .context("acquire camera stream")?;
        log::info!("camera: streaming from {}", stream.device_id());
        self.stream = Some(stream);
        Ok(())
    }

    /// Flip the facing preference and restart acquisition.
    pub fn toggle_facing(&mut self, state: &mut CameraState) -> Result<()> {
        state.facing = state.facing.flipped();
        self.start(state)
    }

    /// Grab the current frame as a PNG image and close the live view.
    pub fn capture_frame(&mut self, state: &mut CameraState) -> Result<ImageSource> {
        let stream = self
            .stream
            .as_mut()
            .ok_or_else(|| anyhow!("camera not streaming; start it first"))?;
        let frame = stream.grab_frame().context("grab camera frame")?;
        let png = frame.encode_png()?;
        let source = ImageSource::captured_png(png)?;
        log::info!(
            "camera: captured {}x{} frame as image {}",
            frame.width,
            frame.height,
            source.digest()
        );
        self.stop(state);
        Ok(source)
    }

    /// Release the stream and clear the live view.
    pub fn stop(&mut self, state: &mut CameraState) {
        self.stream = None;
        state.requested = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(id: &str, kind: DeviceKind, label: &str) -> DeviceInfo {
        DeviceInfo {
            device_id: id.to_string(),
            kind,
            label: label.to_string(),
        }
    }

    #[test]
    fn selects_by_case_insensitive_label() {
        let devices = vec![
            device("a", DeviceKind::VideoInput, "Integrated Camera"),
            device("b", DeviceKind::VideoInput, "BACK Camera 0"),
            device("c", DeviceKind::VideoInput, "Front Camera"),
        ];
        assert_eq!(
            select_device(&devices, Facing::Back).map(|d| d.device_id.as_str()),
            Some("b")
        );
        assert_eq!(
            select_device(&devices, Facing::Front).map(|d| d.device_id.as_str()),
            Some("c")
        );
    }

    #[test]
    fn ignores_non_video_devices() {
        let devices = vec![
            device("mic", DeviceKind::AudioInput, "Front Microphone"),
            device("cam", DeviceKind::VideoInput, "USB Camera"),
        ];
        assert!(select_device(&devices, Facing::Front).is_none());
    }

    #[test]
    fn no_match_falls_back_to_none() {
        let devices = vec![device("cam", DeviceKind::VideoInput, "")];
        assert!(select_device(&devices, Facing::Back).is_none());
    }

    #[test]
    fn facing_parses_aliases_and_flips() -> Result<()> {
        assert_eq!("Rear".parse::<Facing>()?, Facing::Back);
        assert_eq!("user".parse::<Facing>()?, Facing::Front);
        assert!("sideways".parse::<Facing>().is_err());
        assert_eq!(Facing::Front.flipped(), Facing::Back);
        Ok(())
    }

    #[test]
    fn video_frame_rejects_short_buffer() {
        assert!(VideoFrame::new(4, 4, vec![0; 10]).is_err());
    }

    #[test]
    fn video_frame_encodes_png() -> Result<()> {
        let frame = VideoFrame::new(2, 2, vec![128; 12])?;
        let png = frame.encode_png()?;
        let decoded = image::load_from_memory(&png)?;
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
        Ok(())
    }

    #[test]
    fn open_media_devices_rejects_unknown_backend() {
        assert!(open_media_devices("dshow").is_err());
        assert!(open_media_devices("stub://").is_ok());
    }
}
