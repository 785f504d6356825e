// Distributed under the GNU Affero General Public License v3.0 or later.
// See accompanying file LICENSE or https://www.gnu.org/licenses/agpl-3.0.html for details.
use crate::color::Color;
use crate::sampling::Filter;
use dirs_next::config_dir;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TextureSettings {
    pub filter: Filter,
    /// Directory relative texture paths are resolved against.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RenderSettings {
    pub tint: Color,
}

/// Contents of `quadtex.toml`. Every table and key is optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    pub textures: TextureSettings,
    pub render: RenderSettings,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not read settings: {0}")]
    Io(#[from] io::Error),

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("no configuration directory on this platform")]
    NoConfigDir,
}

impl Settings {
    /// `<config dir>/quadtex/quadtex.toml`
    pub fn user_settings_path() -> Result<PathBuf, SettingsError> {
        let dir = config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(dir.join("quadtex").join("quadtex.toml"))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Reads the user's settings file. A missing file means defaults; an
    /// unreadable or malformed one is reported and also yields defaults.
    pub fn load_user_settings() -> Settings {
        let path = match Settings::user_settings_path() {
            Ok(path) => path,
            Err(e) => {
                warn!("{}; using default settings", e);
                return Settings::default();
            }
        };
        match Settings::load_from_file(&path) {
            Ok(settings) => settings,
            Err(SettingsError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings at {}; using defaults", path.display());
                Settings::default()
            }
            Err(e) => {
                warn!("Ignoring {}: {}", path.display(), e);
                Settings::default()
            }
        }
    }

    /// Resolves a relative texture path against the configured asset directory.
    pub fn resolve_asset(&self, path: &Path) -> PathBuf {
        match &self.textures.asset_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial; // To run tests serially when modifying environment variables
    use std::env;
    use tempfile::tempdir;

    const USER_SETTINGS: &str = r#"
        [textures]
        filter = "nearest"
        asset_dir = "/srv/assets"

        [render.tint]
        red = 1.0
        green = 0.5
        blue = 0.25
        alpha = 1.0
    "#;

    /// Points dirs-next at a temporary directory for the lifetime of the guard.
    struct ConfigDirGuard {
        temp_dir: tempfile::TempDir,
        original_home: String,
        original_xdg_config_home: Option<String>,
    }

    impl ConfigDirGuard {
        fn new() -> Self {
            let temp_dir = tempdir().expect("Failed to create temporary directory");
            let original_home = env::var("HOME").unwrap_or_default();
            let original_xdg_config_home = env::var("XDG_CONFIG_HOME").ok();
            env::set_var("HOME", temp_dir.path());
            env::set_var("XDG_CONFIG_HOME", temp_dir.path());
            Self {
                temp_dir,
                original_home,
                original_xdg_config_home,
            }
        }
    }

    impl Drop for ConfigDirGuard {
        fn drop(&mut self) {
            env::set_var("HOME", &self.original_home);
            match &self.original_xdg_config_home {
                Some(val) => env::set_var("XDG_CONFIG_HOME", val),
                None => env::remove_var("XDG_CONFIG_HOME"),
            }
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    #[serial]
    fn test_user_settings_path() {
        let guard = ConfigDirGuard::new();
        assert_eq!(
            Settings::user_settings_path().unwrap(),
            guard.temp_dir.path().join("quadtex").join("quadtex.toml")
        );
    }

    #[test]
    #[serial]
    fn test_load_user_settings_reads_file() {
        let _guard = ConfigDirGuard::new();
        write(&Settings::user_settings_path().unwrap(), USER_SETTINGS);

        let settings = Settings::load_user_settings();

        assert_eq!(settings.textures.filter, Filter::Nearest);
        assert_eq!(
            settings.textures.asset_dir,
            Some(PathBuf::from("/srv/assets"))
        );
        assert_eq!(settings.render.tint, Color::new(1.0, 0.5, 0.25, 1.0));
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_defaults_without_writing() {
        let _guard = ConfigDirGuard::new();
        let path = Settings::user_settings_path().unwrap();

        let settings = Settings::load_user_settings();

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.render.tint, Color::WHITE);
        assert!(!path.exists());
    }

    #[test]
    #[serial]
    fn test_malformed_file_yields_defaults() {
        let _guard = ConfigDirGuard::new();
        let path = Settings::user_settings_path().unwrap();
        write(&path, "[textures]\nfilter = \"bogus\"\n");

        assert!(matches!(
            Settings::load_from_file(&path),
            Err(SettingsError::Parse(_))
        ));
        assert_eq!(Settings::load_user_settings(), Settings::default());
        // left untouched for the user to fix
        assert!(fs::read_to_string(&path).unwrap().contains("bogus"));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quadtex.toml");
        write(&path, "[render.tint]\nred = 0.0\ngreen = 0.0\nblue = 0.0\nalpha = 1.0\n");

        let settings = Settings::load_from_file(&path).unwrap();

        assert_eq!(settings.render.tint, Color::BLACK);
        assert_eq!(settings.textures, TextureSettings::default());
    }

    #[test]
    fn test_default_settings_serialize_without_asset_dir() {
        let text = toml::to_string_pretty(&Settings::default()).unwrap();
        assert!(text.contains("filter = \"linear\""));
        assert!(!text.contains("asset_dir"));
        assert_eq!(toml::from_str::<Settings>(&text).unwrap(), Settings::default());
    }

    #[test]
    fn test_resolve_asset() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.resolve_asset(Path::new("a.png")),
            PathBuf::from("a.png")
        );

        settings.textures.asset_dir = Some(PathBuf::from("/data/textures"));
        assert_eq!(
            settings.resolve_asset(Path::new("ui/a.png")),
            PathBuf::from("/data/textures/ui/a.png")
        );
        assert_eq!(
            settings.resolve_asset(Path::new("/abs/b.png")),
            PathBuf::from("/abs/b.png")
        );
    }
}
