// ----------------------------------------------------------------------------
// Synthetic media devices (stub://) for tests and demos
// ----------------------------------------------------------------------------

use anyhow::{anyhow, Result};

use super::{DeviceInfo, DeviceKind, MediaDevices, VideoFrame, VideoStream};

const DEFAULT_WIDTH: u32 = 320;
const DEFAULT_HEIGHT: u32 = 240;

/// Synthetic device set.
///
/// The default set has a front camera, a back camera and a microphone, so
/// facing selection and the video-input filter both have something to do.
pub struct SyntheticDevices {
    devices: Vec<DeviceInfo>,
    width: u32,
    height: u32,
    permission_denied: bool,
}

impl SyntheticDevices {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self {
            devices,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            permission_denied: false,
        }
    }

    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Make every enumeration and open fail as if the user refused access.
    pub fn deny_permission(mut self) -> Self {
        self.permission_denied = true;
        self
    }

    fn check_permission(&self) -> Result<()> {
        if self.permission_denied {
            return Err(anyhow!("permission denied: camera access refused"));
        }
        Ok(())
    }
}

impl Default for SyntheticDevices {
    fn default() -> Self {
        Self::new(vec![
            DeviceInfo {
                device_id: "stub://front".to_string(),
                kind: DeviceKind::VideoInput,
                label: "Synthetic Front Camera".to_string(),
            },
            DeviceInfo {
                device_id: "stub://back".to_string(),
                kind: DeviceKind::VideoInput,
                label: "Synthetic Back Camera".to_string(),
            },
            DeviceInfo {
                device_id: "stub://mic".to_string(),
                kind: DeviceKind::AudioInput,
                label: "Synthetic Front Microphone".to_string(),
            },
        ])
    }
}

impl MediaDevices for SyntheticDevices {
    fn enumerate_devices(&self) -> Result<Vec<DeviceInfo>> {
        self.check_permission()?;
        Ok(self.devices.clone())
    }

    fn open(&mut self, device_id: Option<&str>) -> Result<Box<dyn VideoStream>> {
        self.check_permission()?;
        let mut video = self
            .devices
            .iter()
            .filter(|device| device.kind == DeviceKind::VideoInput);
        let device = match device_id {
            Some(id) => video
                .find(|device| device.device_id == id)
                .ok_or_else(|| anyhow!("no video device with id {}", id))?,
            None => video
                .next()
                .ok_or_else(|| anyhow!("no camera available"))?,
        };
        log::info!("SyntheticDevices: opened {} (synthetic)", device.device_id);
        Ok(Box::new(SyntheticStream::new(
            device.device_id.clone(),
            self.width,
            self.height,
        )))
    }
}

struct SyntheticStream {
    device_id: String,
    width: u32,
    height: u32,
    frame_count: u64,
    /// Per-device offset so front and back produce different pictures.
    seed: u8,
}

impl SyntheticStream {
    fn new(device_id: String, width: u32, height: u32) -> Self {
        let seed = device_id.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
        Self {
            device_id,
            width,
            height,
            frame_count: 0,
            seed,
        }
    }

    /// Diagonal gradient that shifts with every frame.
    fn generate_pixels(&self) -> Vec<u8> {
        let pixel_count = (self.width * self.height * 3) as usize;
        let mut pixels = vec![0u8; pixel_count];
        for (i, pixel) in pixels.iter_mut().enumerate() {
            *pixel = ((i as u64 + self.frame_count + self.seed as u64) % 256) as u8;
        }
        pixels
    }
}

impl VideoStream for SyntheticStream {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn grab_frame(&mut self) -> Result<VideoFrame> {
        self.frame_count += 1;
        VideoFrame::new(self.width, self.height, self.generate_pixels())
    }
}
