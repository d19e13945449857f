use std::fs;
use std::path::Path;

use bincode::config as bincode_config;
use serde::{Deserialize, Serialize};

use crate::common::exception::ConfigError;
use crate::network::codec::ContentType;

/// Largest frame (header or body) a codec accepts by default: 1 MiB.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 1 << 20;

/// Frame lengths travel as a big-endian `u32`, so no limit may exceed this.
pub const MAX_FRAME_SIZE_LIMIT: usize = u32::MAX as usize;

pub const DEFAULT_CONTENT_TYPE: ContentType = ContentType::Bincode;

/// Bincode configuration for call headers and bodies on the wire.
///
/// Keep this centralized so both ends of a connection agree on the encoding.
/// NOTE: Changing this is a wire format change.
#[inline]
pub(crate) fn wire_bincode_config() -> impl bincode_config::Config {
    // Pinned explicitly: little-endian, fixed-width integers.
    bincode_config::standard()
        .with_little_endian()
        .with_fixed_int_encoding()
}

/// Codec settings, loadable from a TOML file:
///
/// ```toml
/// content_type = "application/json"
/// max_frame_size = 65536
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    pub content_type: ContentType,
    pub max_frame_size: usize,
}

impl CodecConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CodecConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_max_frame_size(mut self, max_frame_size: usize) -> Self {
        self.max_frame_size = max_frame_size;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_size == 0 {
            return Err(ConfigError::Invalid(
                "max_frame_size must be greater than zero".to_string(),
            ));
        }
        if self.max_frame_size > MAX_FRAME_SIZE_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "max_frame_size {} exceeds {}",
                self.max_frame_size, MAX_FRAME_SIZE_LIMIT
            )));
        }
        Ok(())
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            content_type: DEFAULT_CONTENT_TYPE,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
