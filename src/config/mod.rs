use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::model::{ColorPair, FontDescriptor, PaletteColor, FACE_NAME_LEN};
use crate::registry::{
    Defaults, NoteLayout, DEFAULT_FONT_FACE, DEFAULT_NOTE_HEIGHT, DEFAULT_NOTE_WIDTH,
    DEFAULT_POINT_SIZE,
};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Stickies";
const APP_NAME: &str = "stickies";

pub const CONFIG_ENV: &str = "STICKIES_CONFIG";
pub const DATA_ENV: &str = "STICKIES_DATA";
pub const DEFAULT_DATA_SUFFIX: &str = ".data";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn from_paths(paths: ConfigPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            self.write_default_config(&default_cfg)?;
            default_cfg.post_load(&self.paths)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    /// Data file forced through the environment; otherwise it sits beside the
    /// executable.
    pub data_override: Option<PathBuf>,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let data_override = env::var_os(DATA_ENV).map(PathBuf::from);

        let config_dir = match &override_config {
            Some(p) if p.is_dir() => p.clone(),
            Some(p) => p
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| p.clone()),
            None => ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
                .context("resolving XDG project directories")?
                .config_dir()
                .to_path_buf(),
        };

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        Ok(Self {
            config_dir,
            config_file,
            data_override,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "creating application directory {}",
                self.config_dir.display()
            )
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub note: NoteSettings,
    pub storage: StorageOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.note.sanitize();
        self.storage
            .resolve(paths)
            .context("resolving storage paths")?;
        Ok(())
    }
}

/// Starting values for notes while no data file exists yet. Once one does,
/// the defaults stored in it win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NoteSettings {
    pub width: i32,
    pub height: i32,
    pub font_face: String,
    pub font_point_size: u32,
    pub background: PaletteColor,
    pub text: PaletteColor,
}

impl Default for NoteSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_NOTE_WIDTH,
            height: DEFAULT_NOTE_HEIGHT,
            font_face: DEFAULT_FONT_FACE.to_owned(),
            font_point_size: DEFAULT_POINT_SIZE,
            background: PaletteColor::Yellow,
            text: PaletteColor::White,
        }
    }
}

impl NoteSettings {
    pub fn defaults(&self) -> Defaults {
        Defaults {
            font: FontDescriptor::with_face(&self.font_face),
            colors: ColorPair::new(self.background, self.text),
        }
    }

    pub fn layout(&self) -> NoteLayout {
        NoteLayout {
            width: self.width,
            height: self.height,
            point_size: self.font_point_size,
        }
    }

    fn sanitize(&mut self) {
        if self.width <= 0 || self.height <= 0 {
            tracing::warn!(
                width = self.width,
                height = self.height,
                "invalid note size in config, falling back to {DEFAULT_NOTE_WIDTH}x{DEFAULT_NOTE_HEIGHT}"
            );
            self.width = DEFAULT_NOTE_WIDTH;
            self.height = DEFAULT_NOTE_HEIGHT;
        }
        if self.font_point_size == 0 {
            tracing::warn!("font_point_size of 0 in config, using {DEFAULT_POINT_SIZE}");
            self.font_point_size = DEFAULT_POINT_SIZE;
        }
        if self.font_face.len() >= FACE_NAME_LEN {
            tracing::warn!(face = %self.font_face, "font face name will be truncated");
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Explicit data file; empty means `<executable><data_suffix>`.
    pub data_file: PathBuf,
    pub data_suffix: String,
    pub checkpoint_on_deactivate: bool,
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            data_file: PathBuf::new(),
            data_suffix: DEFAULT_DATA_SUFFIX.to_owned(),
            checkpoint_on_deactivate: true,
        }
    }
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        if let Some(path) = &paths.data_override {
            self.data_file = path.clone();
        }
        if self.data_file.as_os_str().is_empty() {
            self.data_file = data_file_beside_executable(&self.data_suffix)?;
        }
        Ok(())
    }
}

/// `<path of the running executable><suffix>`, e.g. `stickies.exe.data`.
pub fn data_file_beside_executable(suffix: &str) -> Result<PathBuf> {
    let exe = env::current_exe().context("locating the running executable")?;
    let mut path: OsString = exe.into_os_string();
    path.push(suffix);
    Ok(PathBuf::from(path))
}
