// Configuration management
//
// Buffer and window geometry, title and window flags, persisted as TOML.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

bitflags! {
    /// Window creation flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct WindowFlags: u32 {
        const RESIZABLE = 1 << 0;
        const FULLSCREEN = 1 << 1;
        const MAXIMIZED = 1 << 2;
        /// Fullscreen at the desktop resolution
        const FULLSCREEN_NATIVE = 1 << 3;
        /// Scale the buffer by whole multiples only
        const INTEGER_SCALE = 1 << 4;
    }
}

/// Errors that can occur while loading or saving a configuration
#[derive(Debug)]
pub enum ConfigError {
    /// I/O error
    Io(io::Error),

    /// TOML parse error
    Parse(toml::de::Error),

    /// TOML serialization error
    Serialize(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Serialize(e) => write!(f, "Serialization error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<io::Error> for ConfigError {
    fn from(e: io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(e: toml::ser::Error) -> Self {
        ConfigError::Serialize(e)
    }
}

/// Presenter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    /// Logical buffer width in pixels
    pub buffer_width: u32,

    /// Logical buffer height in pixels
    pub buffer_height: u32,

    /// Initial window width
    pub window_width: u32,

    /// Initial window height
    pub window_height: u32,

    /// Window title
    pub title: String,

    /// Window flags
    pub flags: WindowFlags,

    /// Wait for vertical sync when presenting
    pub vsync: bool,
}

impl PresenterConfig {
    /// Create a configuration for a `width`×`height` buffer
    ///
    /// The window starts at the buffer size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            buffer_width: width,
            buffer_height: height,
            window_width: width,
            window_height: height,
            ..Self::default()
        }
    }

    /// Set the window size
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_width = width;
        self.window_height = height;
        self
    }

    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window flags
    pub fn with_flags(mut self, flags: WindowFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set VSync enabled or disabled
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Number of bytes in one frame buffer
    pub fn buffer_len(&self) -> usize {
        self.buffer_width as usize * self.buffer_height as usize
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Load configuration from file or create default
    ///
    /// If the file can't be read, the default configuration is written to it.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        Self::load(path).unwrap_or_else(|err| {
            log::debug!("using default configuration ({}): {}", path.display(), err);
            let config = Self::default();
            // Try to save the default config, but don't fail if we can't
            let _ = config.save(path);
            config
        })
    }
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            buffer_width: 320,
            buffer_height: 200,
            window_width: 960,
            window_height: 600,
            title: "palfb".to_string(),
            flags: WindowFlags::RESIZABLE | WindowFlags::INTEGER_SCALE,
            vsync: true,
        }
    }
}
