use crate::util::trim_trailing_slashes;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment override for `service.base_url`.
pub const BASE_URL_ENV: &str = "SNAPAUTO_API_URL";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub service: Service,
    #[serde(default)]
    pub upload: Upload,
    #[serde(default)]
    pub evaluation: Evaluation,
    #[serde(default)]
    pub export: Export,
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg.with_env_overrides())
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                self.service.base_url = url;
            }
        }
        self
    }

    /// Service address with trailing slashes removed.
    pub fn base_url(&self) -> String {
        trim_trailing_slashes(&self.service.base_url).to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub base_url: String,
    pub request_timeout_seconds: u64,
}
impl Default for Service {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".into(),
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Upload {
    pub interval_sec: u32,
}
impl Default for Upload {
    fn default() -> Self {
        Self { interval_sec: 1 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evaluation {
    pub max_frames: u32,
    pub poll_interval_ms: u64,
    pub timeout_seconds: u64,
}
impl Default for Evaluation {
    fn default() -> Self {
        Self {
            max_frames: 12,
            poll_interval_ms: 2000,
            timeout_seconds: 5 * 60,
        }
    }
}

impl Evaluation {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Export {
    pub out_dir: String,
    pub write_pdf: bool,
    pub write_status_json: bool,
    pub page_width_mm: f32,
    pub page_height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
    pub line_height_mm: f32,
    pub title_font_size: f32,
    pub heading_font_size: f32,
    pub body_font_size: f32,
}
impl Default for Export {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            write_pdf: true,
            write_status_json: true,
            page_width_mm: 210.0,
            page_height_mm: 297.0,
            margin_left_mm: 15.0,
            margin_right_mm: 15.0,
            margin_top_mm: 20.0,
            margin_bottom_mm: 20.0,
            line_height_mm: 6.0,
            title_font_size: 16.0,
            heading_font_size: 14.0,
            body_font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: false,
            file_path: "".into(),
        }
    }
}
