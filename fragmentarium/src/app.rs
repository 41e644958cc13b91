use crate::error::{AppError, SettingsError};
use crate::settings::SettingsStore;
use eframe::egui;
use std::ffi::OsString;
use std::sync::atomic::{AtomicBool, Ordering};

/// 持久化设置命名空间：组织名
pub const ORGANIZATION_NAME: &str = "Syntopia Software";
/// 持久化设置命名空间：应用名
pub const APPLICATION_NAME: &str = "Fragmentarium";

/// 进程内是否已存在 Application 实例
static INSTANCE_ALIVE: AtomicBool = AtomicBool::new(false);

/// 应用程序实例
/// 每个进程只能存在一个，由入口函数显式创建并以引用形式传递；它拥有事件循环
#[derive(Debug)]
pub struct Application {
    organization_name: String,
    application_name: String,
    arguments: Vec<OsString>,
}

impl Application {
    /// 以原始进程参数创建实例
    /// 若已有实例存活则返回 `AppError::AlreadyRunning`
    pub fn new(arguments: Vec<OsString>) -> Result<Self, AppError> {
        if INSTANCE_ALIVE.swap(true, Ordering::SeqCst) {
            return Err(AppError::AlreadyRunning);
        }

        Ok(Self {
            organization_name: String::new(),
            application_name: String::new(),
            arguments,
        })
    }

    pub fn set_organization_name(&mut self, name: &str) {
        self.organization_name = name.to_owned();
    }

    pub fn set_application_name(&mut self, name: &str) {
        self.application_name = name.to_owned();
    }

    pub fn organization_name(&self) -> &str {
        &self.organization_name
    }

    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// 创建时传入的原始参数（包含程序名）
    pub fn arguments(&self) -> &[OsString] {
        &self.arguments
    }

    /// 以 (组织名, 应用名) 为命名空间的设置存储
    pub fn settings_store(&self) -> Result<SettingsStore, SettingsError> {
        SettingsStore::for_namespace(&self.organization_name, &self.application_name)
    }

    /// 进入事件循环，阻塞直到最后一个窗口关闭
    pub fn exec<A>(&self, options: eframe::NativeOptions, app: A) -> Result<(), AppError>
    where
        A: eframe::App + 'static,
    {
        tracing::info!(
            "starting event loop for {}/{}",
            self.organization_name(),
            self.application_name()
        );

        eframe::run_native(
            self.application_name(),
            options,
            Box::new(move |_cc| Ok(Box::new(app))),
        )
        .map_err(|e| AppError::EventLoop(e.to_string()))
    }
}

impl Drop for Application {
    fn drop(&mut self) {
        INSTANCE_ALIVE.store(false, Ordering::SeqCst);
    }
}

/// 启动画面阶段需要透明的清屏颜色，主窗口的面板会覆盖整个窗口
pub fn clear_color() -> [f32; 4] {
    egui::Rgba::TRANSPARENT.to_array()
}
