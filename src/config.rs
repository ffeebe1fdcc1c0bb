use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::capture::Facing;
use crate::detect::HttpBackendConfig;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3000/api";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_CAMERA_BACKEND: &str = "stub://";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AppConfigFile {
    endpoint: Option<String>,
    timeout_secs: Option<u64>,
    camera: Option<CameraConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    backend: Option<String>,
    facing: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Inference route receiving the multipart upload.
    pub endpoint: String,
    pub timeout: Duration,
    pub camera: CameraSettings,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// `stub://` for synthetic devices, `v4l2` for local cameras.
    pub backend: String,
    /// Facing requested when the camera is first started.
    pub facing: Facing,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            camera: CameraSettings {
                backend: DEFAULT_CAMERA_BACKEND.to_string(),
                facing: Facing::default(),
            },
        }
    }
}

impl AppConfig {
    /// Defaults, then the JSON file named by `DENTIFIER_CONFIG`, then
    /// `DENTIFIER_*` environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("DENTIFIER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: AppConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let camera = file.camera.unwrap_or_default();
        let facing = match camera.facing {
            Some(facing) => facing.parse()?,
            None => defaults.camera.facing,
        };
        Ok(Self {
            endpoint: file.endpoint.unwrap_or(defaults.endpoint),
            timeout: file
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            camera: CameraSettings {
                backend: camera.backend.unwrap_or(defaults.camera.backend),
                facing,
            },
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(endpoint) = std::env::var("DENTIFIER_ENDPOINT") {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(timeout) = std::env::var("DENTIFIER_TIMEOUT_SECS") {
            let seconds: u64 = timeout.trim().parse().map_err(|_| {
                anyhow!("DENTIFIER_TIMEOUT_SECS must be an integer number of seconds")
            })?;
            self.timeout = Duration::from_secs(seconds);
        }
        if let Ok(facing) = std::env::var("DENTIFIER_FACING") {
            if !facing.trim().is_empty() {
                self.camera.facing = facing.parse()?;
            }
        }
        if let Ok(backend) = std::env::var("DENTIFIER_CAMERA_DEVICE") {
            if !backend.trim().is_empty() {
                self.camera.backend = backend;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.endpoint)
            .map_err(|e| anyhow!("invalid endpoint '{}': {}", self.endpoint, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(anyhow!(
                "endpoint '{}' must use http or https",
                self.endpoint
            ));
        }
        if self.timeout.as_secs() == 0 {
            return Err(anyhow!("timeout must be greater than zero"));
        }
        if self.camera.backend != "v4l2" && !self.camera.backend.starts_with("stub://") {
            return Err(anyhow!(
                "camera backend '{}' must be stub:// or v4l2",
                self.camera.backend
            ));
        }
        Ok(())
    }

    pub fn http_backend(&self) -> HttpBackendConfig {
        HttpBackendConfig {
            endpoint: self.endpoint.clone(),
            timeout: self.timeout,
        }
    }
}

fn read_config_file(path: &Path) -> Result<AppConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
