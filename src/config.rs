//! Runtime configuration for the report CLI.
//!
//! Which records feed the reports is decided here, once, and handed to the
//! loader as a `RecordSource`. The report functions never see it.

use crate::error::{ReportError, ReportResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CRM_REPORT_CONFIG";
pub const SAMPLE_ENV: &str = "CRM_REPORT_SAMPLE";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordSource {
    /// Client export in CSV form.
    Csv { path: PathBuf },
    /// Built-in demonstration records, dated relative to the load time.
    Sample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: RecordSource,
    pub output_dir: PathBuf,
    pub preview_rows: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: RecordSource::Csv {
                path: PathBuf::from("clients.csv"),
            },
            output_dir: PathBuf::from("."),
            preview_rows: 5,
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> ReportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let cfg: AppConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Resolve the configuration from the environment: the JSON file named
    /// by `CRM_REPORT_CONFIG` if set, otherwise defaults; then
    /// `CRM_REPORT_SAMPLE=1` switches the source to the sample data set.
    pub fn from_env() -> ReportResult<Self> {
        let config_path = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let sample = std::env::var(SAMPLE_ENV).ok();
        Self::resolve(config_path.as_deref(), sample.as_deref())
    }

    fn resolve(config_path: Option<&Path>, sample: Option<&str>) -> ReportResult<Self> {
        let mut cfg = match config_path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        if matches!(sample.map(str::trim), Some("1") | Some("true")) {
            info!("{} set, using sample records", SAMPLE_ENV);
            cfg.source = RecordSource::Sample;
        }
        Ok(cfg)
    }

    fn validate(&self) -> ReportResult<()> {
        if let RecordSource::Csv { path } = &self.source {
            if path.as_os_str().is_empty() {
                return Err(ReportError::Config("csv source path is empty".into()));
            }
        }
        if self.preview_rows == 0 {
            return Err(ReportError::Config("preview_rows must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_read_clients_csv() {
        let cfg = AppConfig::resolve(None, None).unwrap();
        assert_eq!(cfg, AppConfig::default());
    }

    #[test]
    fn sample_flag_overrides_source() {
        let cfg = AppConfig::resolve(None, Some("1")).unwrap();
        assert_eq!(cfg.source, RecordSource::Sample);
        let cfg = AppConfig::resolve(None, Some("0")).unwrap();
        assert!(matches!(cfg.source, RecordSource::Csv { .. }));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_config(r#"{ "source": { "kind": "csv", "path": "export.csv" } }"#);
        let cfg = AppConfig::resolve(Some(file.path()), None).unwrap();
        assert_eq!(
            cfg.source,
            RecordSource::Csv {
                path: PathBuf::from("export.csv")
            }
        );
        assert_eq!(cfg.preview_rows, 5);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let file = write_config(r#"{ "preview_rows": 0 }"#);
        let err = AppConfig::resolve(Some(file.path()), None).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));

        let file = write_config("not json");
        let err = AppConfig::resolve(Some(file.path()), None).unwrap_err();
        assert!(matches!(err, ReportError::Json(_)));
    }
}
