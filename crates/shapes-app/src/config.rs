//! Application configuration.

use shapes_platform::PlatformConfig;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Window title, also used as the Vulkan application name.
    pub title: String,
    /// Window width.
    pub width: u32,
    /// Window height.
    pub height: u32,
    /// Enable Vulkan validation layers (default: debug builds only).
    pub validation: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Shapes!??".to_string(),
            width: 800,
            height: 600,
            validation: cfg!(debug_assertions),
        }
    }
}

impl AppConfig {
    /// Create a new config with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Set the window dimensions.
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable validation layers.
    #[must_use]
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Window settings. The window is never resizable.
    pub fn platform(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            width: self.width,
            height: self.height,
            resizable: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo_window() {
        let config = AppConfig::default();
        assert_eq!(config.title, "Shapes!??");
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.validation, cfg!(debug_assertions));
    }

    #[test]
    fn builder_overrides() {
        let config = AppConfig::new("Triangle")
            .with_size(1024, 768)
            .with_validation(false);
        assert_eq!(config.title, "Triangle");
        assert_eq!((config.width, config.height), (1024, 768));
        assert!(!config.validation);

        let platform = config.platform();
        assert_eq!(platform.title, "Triangle");
        assert_eq!((platform.width, platform.height), (1024, 768));
        assert!(!platform.resizable);
    }
}
