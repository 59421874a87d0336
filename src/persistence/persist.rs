use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use egui::Vec2;
use log::debug;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::graph_utils::snapshot::Snapshot;
use crate::gui::viewport::Viewport;
use super::settings::AppSettings;

/// Autosaved session: the tree plus where the user was looking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppStateFile {
    pub snapshot: Snapshot,
    pub offset: (f32, f32),
    pub scale: f32,
}

impl AppStateFile {
    pub fn from_runtime(snapshot: Snapshot, viewport: &Viewport) -> Self {
        Self {
            snapshot,
            offset: (viewport.offset.x, viewport.offset.y),
            scale: viewport.scale(),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    pub fn to_runtime(self) -> (Snapshot, Viewport) {
        let viewport = Viewport::new(self.scale, Vec2::new(self.offset.0, self.offset.1));
        (self.snapshot, viewport)
    }
}

static SETTINGS_OVERRIDE: OnceLock<AppSettings> = OnceLock::new();

pub fn set_settings_override(settings: AppSettings) {
    let _ = SETTINGS_OVERRIDE.set(settings);
}

fn autosave_dir() -> PathBuf {
    // If an override is set (e.g. from main.rs), use it.
    if let Some(settings) = SETTINGS_OVERRIDE.get() {
        return settings.autosave_dir();
    }
    AppSettings::load_or_default().autosave_dir()
}

pub fn active_state_path() -> PathBuf {
    autosave_dir().join("state.ron")
}

fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let tmp_path = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp_path)?;
        f.write_all(data)?;
        f.flush()?;
    }
    fs::rename(tmp_path, path)?;
    Ok(())
}

pub fn save_active(state: &AppStateFile) -> anyhow::Result<PathBuf> {
    let path = active_state_path();
    save_to_path(state, &path)?;
    Ok(path)
}

pub fn save_to_path(state: &AppStateFile, path: &Path) -> anyhow::Result<()> {
    let pretty = PrettyConfig::new().separate_tuple_members(true);
    let s = ron::ser::to_string_pretty(state, pretty)?;
    atomic_write(path, s.as_bytes())?;
    debug!("saved state to {}", path.display());
    Ok(())
}

pub fn load_active() -> anyhow::Result<Option<AppStateFile>> {
    let path = active_state_path();
    if !path.exists() {
        return Ok(None);
    }
    load_from_path(&path).map(Some)
}

pub fn load_from_path(path: &Path) -> anyhow::Result<AppStateFile> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let state: AppStateFile = ron::from_str(&buf)?;
    Ok(state)
}

// JSON import/export of a snapshot file

pub fn export_file_name_now() -> String {
    let now = OffsetDateTime::now_utc();
    let fmt = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = now.format(fmt).unwrap_or_else(|_| "now".to_string());
    format!("family-tree-{}.json", stamp)
}

pub fn export_snapshot_json(snapshot: &Snapshot, path: &Path) -> anyhow::Result<()> {
    let mut s = snapshot.to_json_pretty()?;
    // ensure newline at end
    s.push('\n');
    atomic_write(path, s.as_bytes())?;
    Ok(())
}

pub fn import_snapshot_json(path: &Path) -> anyhow::Result<Snapshot> {
    let mut f = File::open(path)?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    Snapshot::from_json(&buf)
}
