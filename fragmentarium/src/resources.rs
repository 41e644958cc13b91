use crate::error::ResourceError;

/// 启动画面在资源包中的路径
pub const SPLASH: &str = ":/misc/splash.png";
/// 窗口图标在资源包中的路径
pub const ICON: &str = ":/icon.png";

/// 编译期打包进可执行文件的资源
/// 无需随程序分发额外文件即可使用
const ENTRIES: &[(&str, &[u8])] = &[
    (SPLASH, include_bytes!("../assets/misc/splash.png")),
    (ICON, include_bytes!("../assets/icon.png")),
];

/// 内嵌资源注册表
/// 由入口函数创建一次，并以引用形式传给需要资源的模块
#[derive(Debug, Clone)]
pub struct ResourceBundle {
    entries: Vec<(&'static str, &'static [u8])>,
}

impl ResourceBundle {
    /// 初始化资源注册表，并校验每一项都能被解码为图片
    /// 任何一项缺失或损坏都会返回错误，调用方应视为致命错误
    pub fn init() -> Result<Self, ResourceError> {
        Self::from_entries(ENTRIES)
    }

    fn from_entries(entries: &[(&'static str, &'static [u8])]) -> Result<Self, ResourceError> {
        for (path, bytes) in entries {
            if bytes.is_empty() {
                return Err(ResourceError::Missing { path: path.to_string() });
            }
            image::load_from_memory(bytes).map_err(|source| ResourceError::Corrupt {
                path: path.to_string(),
                source,
            })?;
        }

        tracing::debug!("resource bundle initialized ({} entries)", entries.len());
        Ok(Self { entries: entries.to_vec() })
    }

    /// 按资源路径查找内容
    pub fn get(&self, path: &str) -> Result<&'static [u8], ResourceError> {
        self.entries
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(_, bytes)| *bytes)
            .ok_or_else(|| ResourceError::Missing { path: path.to_string() })
    }

    /// 窗口图标，解码失败时返回 None（使用平台默认图标）
    pub fn icon(&self) -> Option<egui::IconData> {
        let bytes = self.get(ICON).ok()?;
        eframe::icon_data::from_png_bytes(bytes).ok()
    }
}
