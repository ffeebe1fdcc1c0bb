//! V4L2 media devices.
//!
//! This module provides `V4l2Devices` for acquiring photos from local V4L2
//! nodes (e.g., /dev/video0).
//!
//! The V4L2 backend is responsible for:
//! - Enumerating device nodes and reporting their card names as labels
//! - Negotiating an RGB24 capture format at the preferred resolution
//! - Streaming frames in-memory until the stream is dropped

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::{DeviceInfo, DeviceKind, MediaDevices, VideoFrame, VideoStream};

/// Configuration for V4L2 acquisition.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device opened when no label matched the facing preference.
    pub default_device: String,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            default_device: "/dev/video0".to_string(),
            width: 640,
            height: 480,
        }
    }
}

pub struct V4l2Devices {
    config: V4l2Config,
}

impl V4l2Devices {
    pub fn new(config: V4l2Config) -> Self {
        Self { config }
    }
}

impl MediaDevices for V4l2Devices {
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        let devices = v4l::context::enum_devices()
            .into_iter()
            .map(|node| DeviceInfo {
                device_id: node.path().display().to_string(),
                kind: DeviceKind::VideoInput,
                label: node.name().unwrap_or_default(),
            })
            .collect::<Vec<_>>();
        if devices.is_empty() {
            return Err(anyhow!("no v4l2 devices found"));
        }
        Ok(devices)
    }

    fn open(&mut self, device_id: Option<&str>) -> Result<Box<dyn VideoStream>> {
        let path = device_id.unwrap_or(&self.config.default_device);
        let stream = V4l2Stream::connect(path, self.config.width, self.config.height)?;
        Ok(Box::new(stream))
    }
}

#[self_referencing]
struct V4l2StreamState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

struct V4l2Stream {
    device_id: String,
    state: V4l2StreamState,
    width: u32,
    height: u32,
}

impl V4l2Stream {
    fn connect(path: &str, width: u32, height: u32) -> Result<Self> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let device =
            v4l::Device::with_path(path).with_context(|| format!("open v4l2 device {}", path))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = width;
        format.height = height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!("V4l2Devices: failed to set format on {}: {}", path, err);
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(anyhow!(
                "v4l2 device {} does not support RGB3 capture (got {})",
                path,
                format.fourcc
            ));
        }

        let state = V4l2StreamStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;

        log::info!(
            "V4l2Devices: connected to {} ({}x{})",
            path,
            format.width,
            format.height
        );
        Ok(Self {
            device_id: path.to_string(),
            state,
            width: format.width,
            height: format.height,
        })
    }
}

impl VideoStream for V4l2Stream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn grab_frame(&mut self) -> Result<VideoFrame> {
        use v4l::io::traits::CaptureStream;

        let pixels = self
            .state
            .with_stream_mut(|stream| stream.next().map(|(buf, _meta)| buf.to_vec()))
            .context("capture v4l2 frame")?;
        VideoFrame::new(self.width, self.height, pixels)
    }
}
