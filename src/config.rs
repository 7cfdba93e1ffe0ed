//! Run configuration
//!
//! Read from a TOML file into `toml::Value` and mapped onto `Config` by
//! walking the tables. Every key is optional; a missing key keeps its
//! default and an unknown key is ignored with a warning.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn, LevelFilter};

use crate::annotation::DEFAULT_STORE_SUFFIX;
use crate::batch::BatchLayout;
use crate::compression::CompressionFactory;
use crate::errors::{PatchError, PatchResult};
use crate::extractor::{ExtractionPolicy, ExtractionSettings};

/// File looked for in the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "voxpatch.toml";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: LevelFilter,
    pub file: Option<PathBuf>,
    /// Receives one summary line per command run
    pub run_log: Option<PathBuf>,
    /// Show a progress bar during batch runs
    pub progress: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LevelFilter::Info,
            file: None,
            run_log: None,
            progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub extraction: ExtractionSettings,
    /// Compression name for written patches
    pub output_compression: String,
    pub layout: BatchLayout,
    /// Suffix of the store written by interactive sessions
    pub store_suffix: String,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            extraction: ExtractionSettings::default(),
            output_compression: "none".to_string(),
            layout: BatchLayout::default(),
            store_suffix: DEFAULT_STORE_SUFFIX.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Loads `path`, or `voxpatch.toml` from the working directory when it
    /// exists, or the defaults
    pub fn resolve(path: Option<&Path>) -> PatchResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Self::from_file(Path::new(DEFAULT_CONFIG_FILE)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> PatchResult<Self> {
        debug!("Reading configuration from {}", path.display());
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
            .map_err(|e| PatchError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn from_toml_str(content: &str) -> PatchResult<Self> {
        let value: toml::Value = content.parse()
            .map_err(|e| PatchError::Config(format!("Failed to parse TOML: {}", e)))?;

        let mut config = Config::default();
        if let Some(table) = section(&value, "extraction")? {
            config.read_extraction(table)?;
        }
        if let Some(table) = section(&value, "layout")? {
            config.read_layout(table)?;
        }
        if let Some(table) = section(&value, "annotation")? {
            for (key, item) in table {
                match key.as_str() {
                    "store_suffix" => config.store_suffix = string_value("annotation.store_suffix", item)?,
                    other => warn!("Ignoring unknown key annotation.{}", other),
                }
            }
        }
        if let Some(table) = section(&value, "logging")? {
            config.read_logging(table)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn read_extraction(&mut self, table: &toml::value::Table) -> PatchResult<()> {
        for (key, item) in table {
            match key.as_str() {
                "policy" => {
                    let name = string_value("extraction.policy", item)?;
                    self.extraction.policy = name.parse::<ExtractionPolicy>()
                        .map_err(|e| PatchError::Config(format!("extraction.policy: {}", e)))?;
                }
                "patch_size" => self.extraction.patch_size = count_value("extraction.patch_size", item)?,
                "depth_stride" => self.extraction.depth_stride = count_value("extraction.depth_stride", item)?,
                "depth_samples" => self.extraction.depth_samples = count_value("extraction.depth_samples", item)?,
                "output_compression" => self.output_compression = string_value("extraction.output_compression", item)?,
                other => warn!("Ignoring unknown key extraction.{}", other),
            }
        }
        Ok(())
    }

    fn read_layout(&mut self, table: &toml::value::Table) -> PatchResult<()> {
        let layout = &mut self.layout;
        for (key, item) in table {
            let target = match key.as_str() {
                "volume_prefix" => &mut layout.volume_prefix,
                "crop_folder" => &mut layout.crop_folder,
                "predictions_folder" => &mut layout.predictions_folder,
                "central_folder" => &mut layout.central_folder,
                "volume_suffix" => &mut layout.volume_suffix,
                "batch_store_suffix" => &mut layout.batch_store_suffix,
                "patch_folder_suffix" => &mut layout.patch_folder_suffix,
                "segmentation_folder" => &mut layout.segmentation_folder,
                other => {
                    warn!("Ignoring unknown key layout.{}", other);
                    continue;
                }
            };
            *target = string_value(&format!("layout.{}", key), item)?;
        }
        Ok(())
    }

    fn read_logging(&mut self, table: &toml::value::Table) -> PatchResult<()> {
        for (key, item) in table {
            match key.as_str() {
                "level" => {
                    let level = string_value("logging.level", item)?;
                    self.logging.level = level.parse::<LevelFilter>()
                        .map_err(|_| PatchError::Config(format!("logging.level: unknown level '{}'", level)))?;
                }
                "file" => self.logging.file = Some(PathBuf::from(string_value("logging.file", item)?)),
                "run_log" => self.logging.run_log = Some(PathBuf::from(string_value("logging.run_log", item)?)),
                "progress" => {
                    self.logging.progress = item.as_bool()
                        .ok_or_else(|| PatchError::Config("logging.progress must be true or false".to_string()))?;
                }
                other => warn!("Ignoring unknown key logging.{}", other),
            }
        }
        Ok(())
    }

    /// Checks values that parse but cannot be used
    pub fn validate(&self) -> PatchResult<()> {
        self.extraction.validate()
            .map_err(|e| PatchError::Config(format!("[extraction] {}", e)))?;

        if CompressionFactory::get_handler_by_name(&self.output_compression).is_err() {
            return Err(PatchError::Config(format!(
                "extraction.output_compression: unsupported '{}' (expected none, deflate or zstd)",
                self.output_compression)));
        }
        if self.layout.volume_prefix.is_empty() {
            return Err(PatchError::Config("layout.volume_prefix must not be empty".to_string()));
        }
        if self.store_suffix.is_empty() || self.layout.batch_store_suffix.is_empty() {
            return Err(PatchError::Config("Store suffixes must not be empty".to_string()));
        }
        Ok(())
    }
}

fn section<'a>(value: &'a toml::Value, name: &str) -> PatchResult<Option<&'a toml::value::Table>> {
    match value.get(name) {
        None => Ok(None),
        Some(item) => item.as_table()
            .map(Some)
            .ok_or_else(|| PatchError::Config(format!("[{}] must be a table", name))),
    }
}

fn string_value(key: &str, item: &toml::Value) -> PatchResult<String> {
    item.as_str()
        .map(str::to_string)
        .ok_or_else(|| PatchError::Config(format!("{} must be a string", key)))
}

fn count_value(key: &str, item: &toml::Value) -> PatchResult<usize> {
    item.as_integer()
        .filter(|v| *v > 0)
        .map(|v| v as usize)
        .ok_or_else(|| PatchError::Config(format!("{} must be a positive integer", key)))
}
