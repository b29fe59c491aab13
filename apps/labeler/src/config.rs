use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::layout::{Alignment, LabelSpec, Unit};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub font_path: PathBuf,
    pub title_font_path: PathBuf,
    pub asset_dir: PathBuf,
    /// Label used when a job does not bring its own.
    pub default_label: LabelSpec,
    pub default_alignment: Alignment,
    /// Raw TCP printer (`host:9100`). Unset means jobs go to `printer_spool_dir`.
    pub printer_addr: Option<String>,
    pub printer_spool_dir: PathBuf,
    pub printer_dpmm: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let font_path = PathBuf::from(require_env("FONT_PATH")?);
        let title_font_path = optional_env("TITLE_FONT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| font_path.clone());
        let asset_dir = optional_env("ASSET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("labeler-assets"));
        let printer_spool_dir = optional_env("PRINTER_SPOOL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| asset_dir.join("spool"));

        let unit: Unit = serde_json::from_value(serde_json::Value::String(
            optional_env("LABEL_UNIT").unwrap_or_else(|| "inches".to_string()),
        ))
        .context("LABEL_UNIT must be one of inches, pixels, mm")?;

        let default_label = LabelSpec {
            width: parse_env("LABEL_WIDTH", 3.0)?,
            height: parse_env("LABEL_HEIGHT", 4.0)?,
            resolution: parse_env("LABEL_RESOLUTION", 203.0)?,
            unit,
        };

        let default_alignment = optional_env("ALIGNMENT")
            .map(|s| s.parse::<Alignment>().map_err(|e| anyhow!(e)))
            .transpose()
            .context("ALIGNMENT must be left, center or right")?
            .unwrap_or_default();

        Ok(Config {
            port: parse_env("PORT", 8080)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            font_path,
            title_font_path,
            asset_dir,
            default_label,
            default_alignment,
            printer_addr: optional_env("PRINTER_ADDR"),
            printer_spool_dir,
            printer_dpmm: parse_env("PRINTER_DPMM", 8)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
