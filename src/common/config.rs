//! User configuration, read from `~/.config/spacelabel/config.toml`.
//!
//! Every field has a default, so an absent file or a partial file is fine.
//! The app variants (window chrome, colors, how editing starts) are all
//! expressed here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub fn config_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".config").join("spacelabel")
}

pub fn config_file() -> PathBuf { config_dir().join("config.toml") }

pub fn default_labels_file() -> PathBuf { config_dir().join("labels.json") }

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir().unwrap_or_default().join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config file {}: {message}", path.display())]
    Invalid { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub appearance: AppearanceSettings,
    pub behavior: BehaviorSettings,
    pub storage: StorageSettings,
}

impl Config {
    /// Reads `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file; using defaults");
                return Ok(Config::default());
            }
            Err(source) => {
                return Err(ConfigError::Io { path: path.to_path_buf(), source });
            }
        };
        let config = Self::parse(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        config
            .appearance
            .validate()
            .map_err(|message| ConfigError::Invalid { path: path.to_path_buf(), message })?;
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Config, toml::de::Error> { toml::from_str(text) }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> { toml::to_string_pretty(self) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppearanceSettings {
    pub chrome: Chrome,
    pub scheme: ColorScheme,
    pub uppercase: bool,
    pub corner: Corner,
    pub margin: f64,
    pub width: f64,
    pub height: f64,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            chrome: Chrome::Hud,
            scheme: ColorScheme::Tinted,
            uppercase: true,
            corner: Corner::BottomLeft,
            margin: 10.0,
            width: 220.0,
            height: 44.0,
        }
    }
}

impl AppearanceSettings {
    /// Smallest overlay that still fits the dot, the label and both buttons.
    pub const MIN_WIDTH: f64 = 160.0;
    /// Smallest overlay that still fits the edit field.
    pub const MIN_HEIGHT: f64 = 32.0;

    pub fn validate(&self) -> Result<(), String> {
        if !(self.width.is_finite() && self.width >= Self::MIN_WIDTH) {
            return Err(format!("appearance.width must be at least {}", Self::MIN_WIDTH));
        }
        if !(self.height.is_finite() && self.height >= Self::MIN_HEIGHT) {
            return Err(format!("appearance.height must be at least {}", Self::MIN_HEIGHT));
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err("appearance.margin must not be negative".to_owned());
        }
        Ok(())
    }

    /// Origin of the overlay for a screen with the given origin and size, in
    /// bottom-left-origin screen coordinates.
    pub fn place(&self, screen_origin: (f64, f64), screen_size: (f64, f64)) -> (f64, f64) {
        let (sx, sy) = screen_origin;
        let (sw, sh) = screen_size;
        let left = sx + self.margin;
        let right = sx + sw - self.width - self.margin;
        let bottom = sy + self.margin;
        let top = sy + sh - self.height - self.margin;
        match self.corner {
            Corner::BottomLeft => (left, bottom),
            Corner::BottomRight => (right, bottom),
            Corner::TopLeft => (left, top),
            Corner::TopRight => (right, top),
        }
    }
}

/// Window decoration of the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chrome {
    /// Borderless, blurred HUD panel with rounded corners.
    Hud,
    /// Titled window with a transparent, hidden title bar.
    Titled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScheme {
    /// Green when named, red when not.
    Tinted,
    /// Accent color when named, gray when not.
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    BottomLeft,
    BottomRight,
    TopLeft,
    TopRight,
}

/// Semantic system colors; the UI maps these onto `NSColor` so they follow
/// the light/dark appearance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemColor {
    Green,
    Red,
    Accent,
    Gray,
    TertiaryLabel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swatch {
    pub color: SystemColor,
    pub alpha: f64,
}

impl Swatch {
    const fn new(color: SystemColor, alpha: f64) -> Self { Self { color, alpha } }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub tint: Swatch,
    pub dot: Swatch,
}

impl ColorScheme {
    pub fn palette(self, labeled: bool) -> Palette {
        use SystemColor::*;
        match (self, labeled) {
            (ColorScheme::Tinted, true) => Palette {
                tint: Swatch::new(Green, 0.45),
                dot: Swatch::new(Green, 1.0),
            },
            (ColorScheme::Tinted, false) => Palette {
                tint: Swatch::new(Red, 0.40),
                dot: Swatch::new(TertiaryLabel, 1.0),
            },
            (ColorScheme::Neutral, true) => Palette {
                tint: Swatch::new(Accent, 0.30),
                dot: Swatch::new(Accent, 1.0),
            },
            (ColorScheme::Neutral, false) => Palette {
                tint: Swatch::new(Gray, 0.20),
                dot: Swatch::new(TertiaryLabel, 1.0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorSettings {
    pub edit_trigger: EditTrigger,
    /// Delay before the overlay takes focus after launch.
    pub focus_delay_ms: u64,
}

impl Default for BehaviorSettings {
    fn default() -> Self {
        Self {
            edit_trigger: EditTrigger::DoubleClick,
            focus_delay_ms: 100,
        }
    }
}

/// How many clicks on the label start an edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditTrigger {
    Click,
    DoubleClick,
}

impl EditTrigger {
    pub fn clicks(self) -> isize {
        match self {
            EditTrigger::Click => 1,
            EditTrigger::DoubleClick => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Label file for [`StorageBackend::File`]. `~` is expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let backend = if cfg!(target_os = "macos") {
            StorageBackend::UserDefaults
        } else {
            StorageBackend::File
        };
        Self { backend, path: None }
    }
}

impl StorageSettings {
    pub fn labels_file(&self) -> PathBuf {
        self.path.as_deref().map(expand_tilde).unwrap_or_else(default_labels_file)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// The app's preference domain (`NSUserDefaults`).
    UserDefaults,
    /// A JSON file, see [`StorageSettings::path`].
    File,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = Config::parse(
            r#"
            [appearance]
            scheme = "neutral"
            corner = "top_right"

            [behavior]
            edit_trigger = "click"
            "#,
        )
        .unwrap();

        assert_eq!(config.appearance.scheme, ColorScheme::Neutral);
        assert_eq!(config.appearance.corner, Corner::TopRight);
        assert_eq!(config.appearance.chrome, Chrome::Hud);
        assert_eq!(config.appearance.width, 220.0);
        assert_eq!(config.behavior.edit_trigger.clicks(), 1);
        assert_eq!(config.behavior.focus_delay_ms, 100);
        assert_eq!(config.storage, StorageSettings::default());
    }

    #[test]
    fn unknown_values_are_rejected() {
        assert!(Config::parse("[appearance]\nchrome = \"glass\"").is_err());
        assert!(Config::parse("[appearance]\ncolour = \"red\"").is_err());
        assert!(Config::parse("[telemetry]").is_err());
    }

    #[test]
    fn default_config_survives_toml() {
        let text = Config::default().to_toml().unwrap();
        assert_eq!(Config::parse(&text).unwrap(), Config::default());
    }

    #[test]
    fn errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[appearance\n").unwrap();
        let message = Config::load(&path).unwrap_err().to_string();
        assert!(message.contains(&*path.to_string_lossy()), "{message}");
    }

    #[test]
    fn defaults_are_valid() {
        assert_eq!(AppearanceSettings::default().validate(), Ok(()));
    }

    #[test]
    fn undersized_overlay_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for body in ["width = 80.0", "height = 10.0", "margin = -4.0"] {
            std::fs::write(&path, format!("[appearance]\n{body}\n")).unwrap();
            match Config::load(&path) {
                Err(ConfigError::Invalid { path: reported, .. }) => assert_eq!(reported, path),
                other => panic!("expected {body:?} to be rejected, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[appearance\n").unwrap();
        match Config::load(&path) {
            Err(ConfigError::Parse { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn placement_respects_corner_and_margin() {
        let mut appearance = AppearanceSettings::default();
        let screen = ((0.0, 0.0), (1440.0, 900.0));
        assert_eq!(appearance.place(screen.0, screen.1), (10.0, 10.0));

        appearance.corner = Corner::TopRight;
        assert_eq!(appearance.place(screen.0, screen.1), (1210.0, 846.0));

        appearance.corner = Corner::BottomRight;
        appearance.margin = 0.0;
        assert_eq!(appearance.place((-1440.0, 0.0), screen.1), (-220.0, 0.0));
    }

    #[test]
    fn palette_tracks_labeled_state() {
        let named = ColorScheme::Tinted.palette(true);
        let unnamed = ColorScheme::Tinted.palette(false);
        assert_eq!(named.tint.color, SystemColor::Green);
        assert_eq!(unnamed.tint.color, SystemColor::Red);
        assert_eq!(unnamed.dot.color, SystemColor::TertiaryLabel);
        assert_ne!(ColorScheme::Neutral.palette(true), named);
    }

    #[test]
    fn storage_path_expands_home() {
        let storage = StorageSettings {
            backend: StorageBackend::File,
            path: Some(PathBuf::from("~/labels.json")),
        };
        assert_eq!(storage.labels_file(), dirs::home_dir().unwrap_or_default().join("labels.json"));
        assert_eq!(StorageSettings::default().labels_file(), default_labels_file());
    }
}
