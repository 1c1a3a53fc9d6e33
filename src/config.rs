// Configuration - config.toml settings plus the fixed Vulkan requirements
//
// Runtime-tunable settings come from config.toml with sensible defaults.
// The layer/extension requirements are assembled once, up front, into an
// immutable VulkanRequirements value; the window system's extensions are
// merged in as an explicit step rather than appended to a shared list
// somewhere mid-bootstrap.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::ffi::{CStr, CString};
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub debug: DebugConfig,
}

/// Window settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Vulkan Engine".to_string(),
            width: 1280,
            height: 720,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults if not found
    pub fn load() -> Self {
        Self::load_from_path("config.toml").unwrap_or_else(|e| {
            log::warn!("Failed to load config.toml: {}. Using defaults.", e);
            Config::default()
        })
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }
}

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// The fixed set of layers and extensions the bootstrap requests. Built
/// once before any Vulkan call and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct VulkanRequirements {
    pub instance_layers: Vec<CString>,
    pub instance_extensions: Vec<CString>,
    pub device_layers: Vec<CString>,
    pub device_extensions: Vec<CString>,
}

impl VulkanRequirements {
    /// Baseline requirements: the swapchain device extension always, the
    /// validation layer and debug-utils extension only when validation is
    /// enabled.
    pub fn new(enable_validation: bool) -> Self {
        let mut instance_layers = Vec::new();
        let mut instance_extensions = Vec::new();
        if enable_validation {
            instance_layers.push(VALIDATION_LAYER.to_owned());
            instance_extensions.push(ash::extensions::ext::DebugUtils::name().to_owned());
        }

        Self {
            instance_layers,
            instance_extensions,
            device_layers: Vec::new(),
            device_extensions: vec![ash::extensions::khr::Swapchain::name().to_owned()],
        }
    }

    /// Merge the instance extensions the window system requires for surface
    /// creation. Duplicates of extensions already requested are skipped.
    pub fn with_window_extensions(mut self, extensions: &[&CStr]) -> Self {
        for &extension in extensions {
            let extension = extension.to_owned();
            if !self.instance_extensions.contains(&extension) {
                self.instance_extensions.push(extension);
            }
        }
        self
    }
}

/// Borrow a list of C strings as the raw pointer array Vulkan create infos
/// expect. The returned pointers borrow from `names`.
pub fn as_c_char_ptrs(names: &[CString]) -> Vec<*const std::os::raw::c_char> {
    names.iter().map(|name| name.as_ptr()).collect()
}
