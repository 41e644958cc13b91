//! 启动流程
//!
//! 1. 初始化内嵌资源包（失败即退出）
//! 2. 创建 Application 实例并设置组织名/应用名
//! 3. 加载并显示启动画面
//! 4. 解码命令行参数
//! 5. 根据参数个数决定主窗口的构造方式
//! 6. 把启动画面交给主窗口
//! 7. 显示主窗口
//! 8. 进入事件循环，直到窗口关闭
//!
//! 原生事件循环只存在于 `eframe::run_native` 内部，所以第 3 步的"处理挂起事件"
//! 以及第 5~7 步由 [`Startup`] 状态机在事件循环中完成：第一帧只绘制启动画面，
//! 下一帧才构造主窗口。

use crate::app::{self, Application, APPLICATION_NAME, ORGANIZATION_NAME};
use crate::args::{self, LaunchRequest};
use crate::main_window::MainWindow;
use crate::resources::{self, ResourceBundle};
use crate::settings::SettingsStore;
use crate::splash::{self, SplashMask, SplashSurface};
use anyhow::{Context, Result};
use eframe::egui;
use std::ffi::OsString;
use std::path::Path;
use std::process::ExitCode;

/// 主窗口在启动流程中需要提供的操作
pub trait StartupWindow {
    /// 接管启动画面，由窗口决定何时关闭
    fn set_splash_widget(&mut self, splash: SplashSurface);
    fn show(&mut self, ctx: &egui::Context);
    /// 每帧调用
    fn update(&mut self, ctx: &egui::Context);
}

/// 根据启动请求构造主窗口
pub trait WindowFactory {
    type Window: StartupWindow;

    fn create(&mut self, ctx: &egui::Context, request: LaunchRequest) -> Self::Window;
}

/// 构造真正的主窗口
pub struct MainWindowFactory {
    pub store: SettingsStore,
}

impl WindowFactory for MainWindowFactory {
    type Window = MainWindow;

    fn create(&mut self, ctx: &egui::Context, request: LaunchRequest) -> MainWindow {
        match request.initial_file {
            None => MainWindow::new(ctx, self.store.clone()),
            Some(path) => MainWindow::with_file(ctx, self.store.clone(), &path),
        }
    }
}

enum Stage<W> {
    /// 启动画面已显示，等待第一帧绘制完成
    Splash {
        splash: SplashSurface,
        request: LaunchRequest,
        painted: bool,
    },
    Running(W),
    /// 阶段切换过程中的占位
    Switching,
}

/// 事件循环内的启动状态机
pub struct Startup<F: WindowFactory> {
    factory: F,
    stage: Stage<F::Window>,
}

impl<F: WindowFactory> Startup<F> {
    /// `splash` 应当已经调用过 `show()`
    pub fn new(factory: F, splash: SplashSurface, request: LaunchRequest) -> Self {
        Self {
            factory,
            stage: Stage::Splash {
                splash,
                request,
                painted: false,
            },
        }
    }

    /// 主窗口，尚未构造时为 None
    #[cfg(test)]
    pub fn window(&self) -> Option<&F::Window> {
        match &self.stage {
            Stage::Running(window) => Some(window),
            _ => None,
        }
    }

    /// 推进一帧
    pub fn frame(&mut self, ctx: &egui::Context) {
        let stage = std::mem::replace(&mut self.stage, Stage::Switching);
        self.stage = match stage {
            Stage::Splash {
                mut splash,
                request,
                painted: false,
            } => {
                // 先让启动画面完整绘制一帧，再进行耗时的初始化
                splash.render(ctx);
                ctx.request_repaint();
                Stage::Splash {
                    splash,
                    request,
                    painted: true,
                }
            }
            Stage::Splash { splash, request, .. } => {
                tracing::debug!("constructing main window (initial file: {:?})", request.initial_file);
                let mut window = self.factory.create(ctx, request);
                window.set_splash_widget(splash);
                window.show(ctx);
                window.update(ctx);
                Stage::Running(window)
            }
            Stage::Running(mut window) => {
                window.update(ctx);
                Stage::Running(window)
            }
            Stage::Switching => Stage::Switching,
        };
    }
}

impl<F> eframe::App for Startup<F>
where
    F: WindowFactory,
{
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.frame(ctx);
    }

    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        app::clear_color()
    }
}

/// 加载启动画面：优先使用 Misc 目录中的 splash.png，失败时回退到内嵌图片，
/// 两者都不可用时使用空白画面。每次回退都会记录警告
pub fn create_splash(misc_dir: &Path, resources: &ResourceBundle) -> SplashSurface {
    let path = misc_dir.join(splash::SPLASH_FILENAME);

    let pixmap = splash::load_pixmap(&path).or_else(|e| {
        tracing::warn!("{e:#}; using the built-in splash image");
        let bytes = resources.get(resources::SPLASH).map_err(|e| {
            tracing::warn!("{e}");
            e
        });
        match bytes {
            Ok(bytes) => splash::decode_pixmap(bytes, Path::new(resources::SPLASH)),
            Err(_) => Err(e),
        }
    });

    match pixmap {
        Ok(pixmap) => {
            let mut surface = SplashSurface::new(&pixmap, true);
            surface.set_mask(SplashMask::from_alpha(&pixmap));
            if surface.mask().bounds().is_none() {
                tracing::warn!("splash image is fully transparent");
            }
            surface
        }
        Err(e) => {
            tracing::warn!("{e:#}; continuing without a splash image");
            SplashSurface::empty(true)
        }
    }
}

/// 完整的启动流程，返回进程退出码
pub fn run(raw_args: Vec<OsString>) -> Result<ExitCode> {
    let resources = ResourceBundle::init().context("failed to initialize embedded resources")?;

    let mut app = Application::new(raw_args)?;
    app.set_organization_name(ORGANIZATION_NAME);
    app.set_application_name(APPLICATION_NAME);

    let mut splash = create_splash(&MainWindow::misc_dir(), &resources);
    splash.show();

    let request = args::parse_process_args(app.arguments().to_vec());

    let store = app.settings_store().unwrap_or_else(|e| {
        let dir = std::env::temp_dir().join(APPLICATION_NAME);
        tracing::warn!("{e}; storing settings in {}", dir.display());
        SettingsStore::in_dir(dir)
    });

    let mut viewport = splash.viewport_builder().with_app_id("fragmentarium");
    if let Some(icon) = resources.icon() {
        viewport = viewport.with_icon(icon);
    }
    let options = eframe::NativeOptions {
        viewport,
        centered: true,
        ..Default::default()
    };

    let startup = Startup::new(MainWindowFactory { store }, splash, request);
    match app.exec(options, startup) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            tracing::error!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
