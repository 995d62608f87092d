use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReportError, Result};

/// Largest accepted `--sigma`; wider kernels only flatten the chart.
pub const MAX_SIGMA: f64 = 100.0;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Monthly COVID-19 hospital data report for a French department
#[derive(Parser, Debug, Clone)]
#[command(
    name = "covid-report",
    about = "Monthly COVID-19 hospital data report for a French department",
    version
)]
pub struct Settings {
    /// Department name (prompted for when not given)
    #[arg(long)]
    pub department: Option<String>,

    /// Directory receiving the snapshot, CSV tables, charts and HTML report
    #[arg(long, default_value = "data")]
    pub output_dir: PathBuf,

    /// Maximum number of records requested from the dataset
    #[arg(long, default_value = "10000", value_parser = clap::value_parser!(u32).range(1..=10000))]
    pub rows: u32,

    /// Build the report even when the dataset holds more records than `--rows`
    #[arg(long)]
    pub allow_partial: bool,

    /// Gaussian smoothing width applied to chart series
    #[arg(long, default_value = "1.0")]
    pub sigma: f64,

    /// Read records from a saved JSON snapshot instead of the remote dataset
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Table shown in the terminal once the report is written
    #[arg(long, default_value = "monthly", value_parser = ["monthly", "cumulative", "none"])]
    pub view: String,

    /// Display theme
    #[arg(long, default_value = "auto", value_parser = ["light", "dark", "auto"])]
    pub theme: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.covid-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".covid-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments and merge with last-used params where no explicit
    /// CLI value was provided, then persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if settings.department.is_none() {
            settings.department = last.department;
        }
        if !is_arg_explicitly_set(&matches, "view") {
            if let Some(v) = last.view {
                settings.view = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "theme") {
            if let Some(v) = last.theme {
                settings.theme = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// Remember the department actually used for this run (it may have been
    /// prompted for) so the next run defaults to it.
    pub fn remember_department(&self, department: &str, config_path: &std::path::Path) {
        let mut params = LastUsedParams::from(self);
        params.department = Some(department.to_string());
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!(error = %e, "could not persist last-used department");
        }
    }

    /// Reject values clap cannot range-check on its own.
    pub fn validate(&self) -> Result<()> {
        if !self.sigma.is_finite() || self.sigma <= 0.0 || self.sigma > MAX_SIGMA {
            return Err(ReportError::Config(format!(
                "sigma must be in (0, {MAX_SIGMA}], got {}",
                self.sigma
            )));
        }
        if let Some(dep) = &self.department {
            if dep.trim().is_empty() {
                return Err(ReportError::Config(
                    "department name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            department: s.department.clone(),
            view: Some(s.view.clone()),
            theme: Some(s.theme.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        let params = LastUsedParams {
            department: Some("Paris".to_string()),
            view: Some("cumulative".to_string()),
            theme: Some("dark".to_string()),
        };
        params.save_to(&path).expect("save");

        let loaded = LastUsedParams::load_from(&path);
        assert_eq!(loaded.department, Some("Paris".to_string()));
        assert_eq!(loaded.view, Some("cumulative".to_string()));
        assert_eq!(loaded.theme, Some("dark".to_string()));
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.department.is_none());
        assert!(loaded.view.is_none());
        assert!(loaded.theme.is_none());
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&path).expect("save");
        assert!(path.exists());

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists());
    }

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["covid-report"]);

        assert!(settings.department.is_none());
        assert_eq!(settings.output_dir, PathBuf::from("data"));
        assert_eq!(settings.rows, 10_000);
        assert!((settings.sigma - 1.0).abs() < f64::EPSILON);
        assert!(settings.input.is_none());
        assert_eq!(settings.view, "monthly");
        assert_eq!(settings.theme, "auto");
        assert_eq!(settings.log_level, "INFO");
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_department_and_output() {
        let settings = Settings::parse_from([
            "covid-report",
            "--department",
            "Gironde",
            "--output-dir",
            "/tmp/out",
        ]);
        assert_eq!(settings.department.as_deref(), Some("Gironde"));
        assert_eq!(settings.output_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_settings_rows_out_of_range_rejected() {
        let result = Settings::try_parse_from(["covid-report", "--rows", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_sigma() {
        let mut settings = Settings::parse_from(["covid-report"]);
        settings.sigma = 0.0;
        assert!(matches!(settings.validate(), Err(ReportError::Config(_))));
        settings.sigma = 2.5;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_sigma() {
        let mut settings = Settings::parse_from(["covid-report", "--sigma", "1e12"]);
        assert!(matches!(settings.validate(), Err(ReportError::Config(_))));
        settings.sigma = MAX_SIGMA;
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_allow_partial_flag() {
        assert!(!Settings::parse_from(["covid-report"]).allow_partial);
        assert!(Settings::parse_from(["covid-report", "--allow-partial"]).allow_partial);
    }

    #[test]
    fn test_validate_rejects_blank_department() {
        let settings = Settings::parse_from(["covid-report", "--department", "  "]);
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_load_with_last_used_restores_department() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            department: Some("Rhône".to_string()),
            ..Default::default()
        }
        .save_to(&config_path)
        .expect("save");

        let settings =
            Settings::load_with_last_used_impl(vec!["covid-report".into()], &config_path);
        assert_eq!(settings.department.as_deref(), Some("Rhône"));
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams {
            department: Some("Rhône".to_string()),
            view: Some("none".to_string()),
            theme: Some("dark".to_string()),
        }
        .save_to(&config_path)
        .expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec![
                "covid-report".into(),
                "--department".into(),
                "Paris".into(),
                "--view".into(),
                "cumulative".into(),
            ],
            &config_path,
        );
        assert_eq!(settings.department.as_deref(), Some("Paris"));
        assert_eq!(settings.view, "cumulative");
        assert_eq!(settings.theme, "dark");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        LastUsedParams::default().save_to(&config_path).expect("save");

        Settings::load_with_last_used_impl(
            vec!["covid-report".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["covid-report".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_remember_department_persists_prompted_name() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);
        let settings = Settings::parse_from(["covid-report"]);

        settings.remember_department("Nord", &config_path);

        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.department.as_deref(), Some("Nord"));
        assert_eq!(loaded.view.as_deref(), Some("monthly"));
    }
}
