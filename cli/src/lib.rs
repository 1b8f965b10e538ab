use dark_item::DetectParams;

use clap::Args;
use serde::{Serialize, de::DeserializeOwned};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// TOML/JSON persistence for configuration types.
pub trait ConfigFile: Serialize + DeserializeOwned {
    /// Load configuration from a TOML file
    fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from TOML string
    fn from_toml(content: &str) -> Result<Self, CliError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a JSON file
    fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load configuration from JSON string
    fn from_json(content: &str) -> Result<Self, CliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load configuration
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CliError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(CliError::UnsupportedFileFormat),
        }
    }

    fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn to_json(&self) -> Result<String, CliError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ConfigFile for DetectParams {}

/// Per-field overrides taken from command-line flags.
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct ParamOverrides {
    /// Working resolution width in pixels
    #[arg(long)]
    pub target_width: Option<u32>,
    /// Gaussian kernel size (even values are bumped to odd)
    #[arg(long)]
    pub blur_kernel: Option<u32>,
    /// Smallest accepted region as a fraction of the image area
    #[arg(long)]
    pub min_area_ratio: Option<f64>,
    /// Largest accepted region as a fraction of the image area
    #[arg(long)]
    pub max_area_ratio: Option<f64>,
    /// Score multiplier for regions touching the border
    #[arg(long)]
    pub edge_penalty: Option<f64>,
    /// Outline simplification tolerance in working pixels
    #[arg(long)]
    pub approx_eps: Option<f64>,
}

impl ParamOverrides {
    pub fn apply(&self, base: DetectParams) -> DetectParams {
        DetectParams {
            target_width: self.target_width.unwrap_or(base.target_width),
            blur_kernel: self.blur_kernel.unwrap_or(base.blur_kernel),
            min_area_ratio: self.min_area_ratio.unwrap_or(base.min_area_ratio),
            max_area_ratio: self.max_area_ratio.unwrap_or(base.max_area_ratio),
            edge_penalty: self.edge_penalty.unwrap_or(base.edge_penalty),
            approx_eps: self.approx_eps.unwrap_or(base.approx_eps),
        }
    }
}

/// Defaults, then the config file if given, then flags. The merged set is clamped
/// into the accepted ranges.
pub fn resolve_params(
    config: Option<&Path>,
    overrides: &ParamOverrides,
) -> Result<DetectParams, CliError> {
    let base = match config {
        Some(path) => DetectParams::from_file(path)?,
        None => DetectParams::default(),
    };
    Ok(overrides.apply(base).clamped())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("{}_{name}", std::process::id()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let params = DetectParams::from_toml("targetWidth = 640\nedge_penalty = 0.5\n").unwrap();
        assert_eq!(params.target_width, 640);
        assert_eq!(params.edge_penalty, 0.5);
        assert_eq!(params.blur_kernel, DetectParams::default().blur_kernel);
    }

    #[test]
    fn test_json_config() {
        let params = DetectParams::from_json(r#"{"minAreaRatio": 0.01, "approxEps": 3.5}"#).unwrap();
        assert_eq!(params.min_area_ratio, 0.01);
        assert_eq!(params.approx_eps, 3.5);
        assert_eq!(params.max_area_ratio, 0.90);
    }

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let toml_path = temp_file("params.toml", "blurKernel = 9\n");
        let json_path = temp_file("params.json", r#"{"blurKernel": 7}"#);
        let yaml_path = temp_file("params.yaml", "blurKernel: 7\n");

        assert_eq!(DetectParams::from_file(&toml_path).unwrap().blur_kernel, 9);
        assert_eq!(DetectParams::from_file(&json_path).unwrap().blur_kernel, 7);
        assert!(matches!(
            DetectParams::from_file(&yaml_path),
            Err(CliError::UnsupportedFileFormat)
        ));

        for path in [toml_path, json_path, yaml_path] {
            fs::remove_file(path).unwrap();
        }
    }

    #[test]
    fn test_malformed_toml_is_reported() {
        assert!(matches!(
            DetectParams::from_toml("targetWidth = \"wide\""),
            Err(CliError::TomlDeError(_))
        ));
    }

    #[test]
    fn test_flags_override_file_and_are_clamped() {
        let path = temp_file("override.toml", "targetWidth = 800\nedgePenalty = 0.6\n");
        let overrides = ParamOverrides {
            target_width: Some(50),
            approx_eps: Some(4.0),
            ..ParamOverrides::default()
        };

        let params = resolve_params(Some(&path), &overrides).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(params.target_width, DetectParams::TARGET_WIDTH_RANGE.0);
        assert_eq!(params.edge_penalty, 0.6);
        assert_eq!(params.approx_eps, 4.0);
    }

    #[test]
    fn test_no_config_gives_defaults() {
        let params = resolve_params(None, &ParamOverrides::default()).unwrap();
        assert_eq!(params, DetectParams::default());
    }

    #[test]
    fn test_toml_output_loads_back() {
        let params = DetectParams {
            target_width: 1280,
            ..DetectParams::default()
        };
        let text = params.to_toml().unwrap();
        assert_eq!(DetectParams::from_toml(&text).unwrap(), params);
    }
}
