use std::path::PathBuf;
use thiserror::Error;

/// 内嵌资源包错误
/// 资源包在编译期打包进可执行文件，出错说明构建产物损坏，属于致命错误
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("embedded resource not found: {path}")]
    Missing { path: String },

    #[error("embedded resource is corrupt: {path}")]
    Corrupt {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// 启动画面图片加载错误
/// 可恢复：由启动流程决定回退到内嵌图片还是继续使用空白画面
#[derive(Debug, Error)]
pub enum SplashError {
    #[error("cannot read splash image {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode splash image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// 应用程序实例错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error("an Application instance already exists in this process")]
    AlreadyRunning,

    #[error("event loop failed: {0}")]
    EventLoop(String),
}

/// 持久化设置错误
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("could not determine a configuration directory")]
    NoConfigDir,

    #[error("settings file {} is not accessible", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {} is malformed", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
