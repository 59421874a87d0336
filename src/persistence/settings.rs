use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

const APP_DIR: &str = "Sim-Family-Tree";
#[cfg(not(target_os = "windows"))]
const STATE_DIR: &str = "sim-family-tree";

#[cfg(not(target_os = "windows"))]
fn home_dir() -> PathBuf {
    std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("~"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    // Where state.ron is kept; per-OS state dir when unset
    #[serde(default)]
    pub autosave_override: Option<PathBuf>,
    // Target of the Export button; temp dir when unset
    #[serde(default)]
    pub export_override: Option<PathBuf>,
    #[serde(default = "AppSettings::default_autosave_interval")]
    pub autosave_interval_secs: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            autosave_override: None,
            export_override: None,
            autosave_interval_secs: Self::default_autosave_interval(),
        }
    }
}

impl AppSettings {
    pub(crate) fn default_autosave_interval() -> u64 { 30 }

    // Per-user directory holding settings.json
    fn config_dir() -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            return home_dir().join("Library").join("Application Support").join(APP_DIR);
        }
        #[cfg(target_os = "windows")]
        {
            return match std::env::var_os("APPDATA") {
                Some(appdata) => PathBuf::from(appdata).join(APP_DIR),
                None => PathBuf::from(APP_DIR),
            };
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            return match std::env::var_os("XDG_CONFIG_HOME") {
                Some(xdg) => PathBuf::from(xdg).join(APP_DIR),
                None => home_dir().join(".config").join(APP_DIR),
            };
        }
    }

    // state.ron lives here unless overridden
    fn autosave_default_dir() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            return match std::env::var_os("LOCALAPPDATA") {
                Some(local) => PathBuf::from(local).join(APP_DIR).join("Autosave"),
                None => std::env::temp_dir().join(APP_DIR),
            };
        }
        #[cfg(not(target_os = "windows"))]
        {
            if let Some(xdg) = std::env::var_os("XDG_STATE_HOME") {
                return PathBuf::from(xdg).join(STATE_DIR);
            }
            return match std::env::var_os("HOME") {
                Some(home) => PathBuf::from(home).join(".local").join("state").join(STATE_DIR),
                None => std::env::temp_dir().join(APP_DIR),
            };
        }
    }

    pub fn settings_path() -> PathBuf { Self::config_dir().join("settings.json") }

    /// Load from the per-user settings file; a missing file yields defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let mut raw = String::new();
        fs::File::open(path)?.read_to_string(&mut raw)?;
        Ok(serde_json::from_str(&raw)?)
    }

    // Settings problems should never stop the app from starting
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            warn!("falling back to default settings: {}", e);
            Self::default()
        })
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::settings_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::File::create(path)?.write_all(json.as_bytes())?;
        Ok(())
    }

    pub fn autosave_dir(&self) -> PathBuf {
        self.autosave_override.clone().unwrap_or_else(Self::autosave_default_dir)
    }

    /// `{temp_dir}/Sim-Family-Tree/exports`
    pub fn export_default_dir() -> PathBuf {
        std::env::temp_dir().join(APP_DIR).join("exports")
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export_override.clone().unwrap_or_else(Self::export_default_dir)
    }

    /// Create the autosave and export directories if they are missing.
    pub fn ensure_dirs(&self) -> anyhow::Result<()> {
        fs::create_dir_all(self.autosave_dir())?;
        fs::create_dir_all(self.export_dir())?;
        Ok(())
    }

    pub fn autosave_interval(&self) -> std::time::Duration {
        // Zero would save on every frame
        std::time::Duration::from_secs(self.autosave_interval_secs.max(1))
    }
}
