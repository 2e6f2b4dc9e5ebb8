// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.

use crate::backend::{
    make_version, BringupSettings, DeviceFeature, DeviceRequirements, InstanceSettings,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::ffi::CString;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowConfig,
    pub application: ApplicationConfig,
    pub graphics: GraphicsConfig,
    pub debug: DebugConfig,
    pub device: DeviceConfig,
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
            title: "Vulkan Bring-up".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// What the instance reports about the application
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub name: String,
    pub engine_name: String,
    pub version: [u32; 3],
    pub engine_version: [u32; 3],
    pub api_version: [u32; 3],
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "App".to_string(),
            engine_name: "Engine".to_string(),
            version: [1, 0, 0],
            engine_version: [1, 0, 0],
            api_version: [1, 3, 0],
        }
    }
}

/// Graphics settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    pub present_mode: String,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            present_mode: "fifo".to_string(),
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub validation_layers: bool,
    pub layers: Vec<String>,
    pub log_level: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            validation_layers: true,
            layers: vec!["VK_LAYER_KHRONOS_validation".to_string()],
            log_level: "info".to_string(),
        }
    }
}

/// What a GPU must offer to be picked
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub required_extensions: Vec<String>,
    pub required_features: Vec<DeviceFeature>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            required_extensions: vec!["VK_KHR_swapchain".to_string()],
            required_features: vec![DeviceFeature::GeometryShader],
        }
    }
}

fn c_names(names: &[String]) -> Result<Vec<CString>> {
    names
        .iter()
        .map(|name| CString::new(name.as_str()).with_context(|| format!("Invalid name: {:?}", name)))
        .collect()
}

fn version([major, minor, patch]: [u32; 3]) -> u32 {
    make_version(major, minor, patch)
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
        log::debug!("Config: {:?}", config);

        Ok(config)
    }

    /// Get present mode as Vulkan enum
    pub fn get_present_mode(&self) -> ash::vk::PresentModeKHR {
        match self.graphics.present_mode.to_lowercase().as_str() {
            "immediate" => ash::vk::PresentModeKHR::IMMEDIATE,
            "mailbox" => ash::vk::PresentModeKHR::MAILBOX,
            "fifo" => ash::vk::PresentModeKHR::FIFO,
            "fifo_relaxed" => ash::vk::PresentModeKHR::FIFO_RELAXED,
            _ => {
                log::warn!(
                    "Unknown present mode '{}', defaulting to FIFO",
                    self.graphics.present_mode
                );
                ash::vk::PresentModeKHR::FIFO
            }
        }
    }

    /// Log filter from the debug section
    pub fn log_level(&self) -> log::LevelFilter {
        self.debug.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }

    /// Bring-up settings. Layers are only requested when `enable_validation`
    /// is set and the config asks for them.
    pub fn bringup_settings(&self, enable_validation: bool) -> Result<BringupSettings> {
        let app = &self.application;
        let validation_layers = if enable_validation && self.debug.validation_layers {
            Some(c_names(&self.debug.layers)?)
        } else {
            None
        };

        Ok(BringupSettings {
            instance: InstanceSettings {
                app_name: CString::new(app.name.as_str()).context("Invalid application name")?,
                engine_name: CString::new(app.engine_name.as_str())
                    .context("Invalid engine name")?,
                app_version: version(app.version),
                engine_version: version(app.engine_version),
                api_version: version(app.api_version),
                validation_layers,
            },
            device: DeviceRequirements {
                features: self.device.required_features.clone(),
                extensions: c_names(&self.device.required_extensions)?,
            },
        })
    }
}
