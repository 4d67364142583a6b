//! Application configuration
//!
//! Loaded from a JSON file with per-deployment profile selection through
//! the `TABLEFUSION_PROFILE` environment variable. A missing file yields
//! the defaults. The engine only reads the merge/transform/export
//! defaults and limits; UI-facing fields ride along untouched.

use crate::error::{Error, Result};
use crate::export::ExportFormat;
use crate::merge::{FillSpec, MergeMethod, MergeSpec};
use crate::reader::ReadOptions;
use crate::schema::DEFAULT_FUZZY_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable selecting a deployment profile
pub const PROFILE_ENV: &str = "TABLEFUSION_PROFILE";

fn default_theme() -> String {
    "light".to_string()
}

fn default_max_file_size_mb() -> u64 {
    100
}

fn default_true() -> bool {
    true
}

fn default_export_formats() -> Vec<ExportFormat> {
    vec![ExportFormat::Csv, ExportFormat::Xlsx, ExportFormat::Json]
}

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_smart_threshold() -> f64 {
    crate::merge::DEFAULT_SMART_THRESHOLD
}

/// Structured application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// UI theme name, passed through to the presentation layer
    #[serde(default = "default_theme")]
    pub theme: String,

    /// Maximum accepted upload size, in megabytes
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Merge method preselected for new sessions
    #[serde(default)]
    pub default_merge_method: MergeMethodDefault,

    /// Export formats offered for download
    #[serde(default = "default_export_formats")]
    pub export_formats: Vec<ExportFormat>,

    /// Whether registered transformers are offered
    #[serde(default = "default_true")]
    pub plugins_enabled: bool,

    /// Default per-type missing-value fill
    #[serde(default)]
    pub default_fill: FillSpec,

    /// Similarity required to fuzzy-group column names
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Column overlap required before a smart merge joins
    #[serde(default = "default_smart_threshold")]
    pub smart_threshold: f64,
}

/// Newtype default so a bare config file still deserializes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergeMethodDefault(pub MergeMethod);

impl Default for MergeMethodDefault {
    fn default() -> Self {
        Self(MergeMethod::Append)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            max_file_size_mb: default_max_file_size_mb(),
            default_merge_method: MergeMethodDefault::default(),
            export_formats: default_export_formats(),
            plugins_enabled: true,
            default_fill: FillSpec::default(),
            fuzzy_threshold: default_fuzzy_threshold(),
            smart_threshold: default_smart_threshold(),
        }
    }
}

impl AppConfig {
    /// Load configuration, honoring the deployment profile variable
    ///
    /// With `TABLEFUSION_PROFILE=prod` and a base path of `config.json`,
    /// `config.prod.json` is preferred when it exists.
    pub fn load(base: &Path) -> Result<Self> {
        let path = match std::env::var(PROFILE_ENV) {
            Ok(profile) if !profile.is_empty() => {
                let candidate = profile_path(base, &profile);
                if candidate.exists() {
                    candidate
                } else {
                    log::warn!(
                        "profile '{}' has no config at {}, using base",
                        profile,
                        candidate.display()
                    );
                    base.to_path_buf()
                }
            }
            _ => base.to_path_buf(),
        };

        if !path.exists() {
            log::info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        let config: Self = serde_json::from_str(&content).map_err(Error::Json)?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Upload size limit in bytes
    pub fn max_size_bytes(&self) -> usize {
        self.max_file_size_mb as usize * 1024 * 1024
    }

    /// Read options carrying the configured size limit
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            max_size_bytes: Some(self.max_size_bytes()),
            ..ReadOptions::default()
        }
    }

    /// A merge spec seeded with the configured defaults
    pub fn merge_spec(&self) -> MergeSpec {
        MergeSpec {
            method: self.default_merge_method.0,
            fuzzy_threshold: self.fuzzy_threshold,
            smart_threshold: self.smart_threshold,
            ..MergeSpec::default()
        }
    }

    /// Whether an export format is enabled for this deployment
    pub fn format_enabled(&self, format: ExportFormat) -> bool {
        self.export_formats.contains(&format)
    }
}

/// `config.json` + `prod` -> `config.prod.json`, beside the base file
fn profile_path(base: &Path, profile: &str) -> PathBuf {
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("config");
    let ext = base
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("json");
    let name = format!("{}.{}.{}", stem, profile, ext);
    match base.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.max_file_size_mb, 100);
        assert_eq!(config.default_merge_method.0, MergeMethod::Append);
        assert!(config.format_enabled(ExportFormat::Xlsx));
        assert_eq!(config.max_size_bytes(), 100 * 1024 * 1024);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"max_file_size_mb": 5, "export_formats": ["csv"]}"#)
                .unwrap();

        assert_eq!(config.max_file_size_mb, 5);
        assert!(config.format_enabled(ExportFormat::Csv));
        assert!(!config.format_enabled(ExportFormat::Xlsx));
        assert_eq!(config.theme, "light");
        assert!(config.plugins_enabled);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AppConfig::load(Path::new("definitely/not/here.json")).unwrap();
        assert_eq!(config.max_file_size_mb, 100);
    }

    #[test]
    fn test_profile_path_naming() {
        let p = profile_path(Path::new("conf/config.json"), "prod");
        assert_eq!(p, PathBuf::from("conf/config.prod.json"));
    }

    #[test]
    fn test_merge_spec_carries_thresholds() {
        let config: AppConfig =
            serde_json::from_str(r#"{"fuzzy_threshold": 0.9, "smart_threshold": 0.7}"#).unwrap();
        let spec = config.merge_spec();
        assert_eq!(spec.fuzzy_threshold, 0.9);
        assert_eq!(spec.smart_threshold, 0.7);
    }
}
