use crate::error::SettingsError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILENAME: &str = "settings.json";
/// 最近打开文件列表的最大长度
pub const MAX_RECENT_FILES: usize = 8;

/// 持久化的用户设置
/// 未知字段在读取时被忽略，缺失字段使用默认值，以兼容旧版本的设置文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 最近打开的文件，最新的在最前
    pub recent_files: Vec<PathBuf>,
    /// 上次关闭时主窗口的内部尺寸
    pub window_size: [f32; 2],
    /// 启动画面至少显示的时间（毫秒）
    pub splash_min_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recent_files: Vec::new(),
            window_size: [1200.0, 800.0],
            splash_min_ms: 1500,
        }
    }
}

impl Settings {
    /// 将文件加入最近列表：去重、置顶并截断到上限
    pub fn push_recent(&mut self, path: &Path) {
        self.recent_files.retain(|p| p != path);
        self.recent_files.insert(0, path.to_path_buf());
        self.recent_files.truncate(MAX_RECENT_FILES);
    }
}

/// 设置文件的存储位置
/// 目录由 (组织名, 应用名) 命名空间决定，可用 FRAGMENTARIUM_CONFIG_DIR 覆盖
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn for_namespace(organization: &str, application: &str) -> Result<Self, SettingsError> {
        if let Some(dir) = std::env::var_os("FRAGMENTARIUM_CONFIG_DIR") {
            return Ok(Self::in_dir(PathBuf::from(dir)));
        }
        let proj = ProjectDirs::from("", organization, application).ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::in_dir(proj.config_dir().to_path_buf()))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self { path: dir.join(SETTINGS_FILENAME) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取设置。文件不存在时返回默认设置
    pub fn load(&self) -> Result<Settings, SettingsError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => return Err(SettingsError::Io { path: self.path.clone(), source }),
        };

        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// 读取设置，失败时记录警告并使用默认值
    pub fn load_or_default(&self) -> Settings {
        self.load().unwrap_or_else(|e| {
            tracing::warn!("{e}; using default settings");
            Settings::default()
        })
    }

    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        let content = serde_json::to_string_pretty(settings).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, content).map_err(|source| SettingsError::Io {
            path: self.path.clone(),
            source,
        })
    }
}
