//! Layered settings for `apiconv convert` and `apiconv parse`.
//!
//! Settings come from four layers, later ones winning:
//!
//! 1. `defaults/apiconv.default.toml`, embedded so the documented defaults are the ones the
//!    binary runs with
//! 2. `apiconv.toml` in the working directory, when there is one
//! 3. the file named by `--config`, which must exist
//! 4. `--from`, `--to`, `--validate` and `--format` on the command line
//!
//! [`Loader`] stacks the layers and [`Loader::build`] checks the result into an
//! [`ApiconvConfig`]: dialect names are validated here, so a bad `convert.from` in any file is
//! reported before a document is read.

use apiconv::DialectKind;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;

pub use config::ConfigError;

const DEFAULT_TOML: &str = include_str!("../defaults/apiconv.default.toml");

/// Top-level configuration consumed by apiconv applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiconvConfig {
    pub convert: ConvertConfig,
    pub export: ExportConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Dialect selection for `apiconv convert`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConvertConfig {
    pub from: DialectKind,
    pub to: DialectKind,
    pub validate: bool,
}

/// Knobs handed to the exporters.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub default_media_type: String,
    pub trait_catalog: bool,
    pub preserve_templates: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    Yaml,
    Json,
    /// JSON when the output path ends in `.json`, YAML otherwise.
    Auto,
}

impl OutputFormat {
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
            OutputFormat::Auto => "auto",
        }
    }

    pub fn is_json_for(self, path: Option<&Path>) -> bool {
        match self {
            OutputFormat::Json => true,
            OutputFormat::Yaml => false,
            OutputFormat::Auto => path
                .and_then(|p| p.extension())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json")),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            "auto" => Ok(OutputFormat::Auto),
            other => Err(format!("unknown output format '{other}' (yaml, json or auto)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
}

/// File picked up from the working directory when present.
pub const PROJECT_FILE: &str = "apiconv.toml";

/// Stacks the settings layers over the embedded defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start from the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer `apiconv.toml` from `dir`, if it exists.
    pub fn with_project_file(mut self, dir: impl AsRef<Path>) -> Self {
        let source = File::from(dir.as_ref().join(PROJECT_FILE))
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an explicitly named settings file. A missing file fails the build.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    pub fn source_dialect(self, kind: DialectKind) -> Result<Self, ConfigError> {
        self.set("convert.from", kind.name())
    }

    pub fn target_dialect(self, kind: DialectKind) -> Result<Self, ConfigError> {
        self.set("convert.to", kind.name())
    }

    pub fn validate(self, validate: bool) -> Result<Self, ConfigError> {
        self.set("convert.validate", validate)
    }

    pub fn output_format(self, format: OutputFormat) -> Result<Self, ConfigError> {
        self.set("output.format", format.name())
    }

    fn set<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge the layers and deserialize them.
    pub fn build(self) -> Result<ApiconvConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// The embedded defaults alone.
pub fn load_defaults() -> Result<ApiconvConfig, ConfigError> {
    Loader::new().build()
}
