use crate::bootstrap::StartupWindow;
use crate::document::Document;
use crate::library::{self, ExampleEntry};
use crate::settings::{Settings, SettingsStore};
use crate::splash::SplashSurface;
use eframe::egui;
use rfd::FileDialog;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 菜单和快捷操作，在本帧 UI 绘制结束后统一执行
enum Action {
    New,
    Open,
    OpenPath(PathBuf),
    Save,
    SaveAs,
    ShowInFolder,
    Quit,
}

/// 应用程序主窗口
/// 负责编辑片段源文件，并在自身初始化完成后关闭启动画面
pub struct MainWindow {
    document: Document,
    settings: Settings,
    store: SettingsStore,
    /// Examples 目录中找到的示例
    examples: Vec<ExampleEntry>,
    /// 启动画面，关闭后置为 None
    splash: Option<SplashSurface>,
    /// 是否已请求显示
    shown: bool,
    /// 窗口是否已从启动画面样式切换为主窗口样式
    presented: bool,
    /// 上一次设置的窗口标题，避免每帧都发送视口命令
    title: String,
    show_about: bool,
    /// 底部状态栏显示的提示消息
    status_msg: String,
    /// 询问是否放弃未保存的修改，参数为文档名
    ask_discard: fn(&str) -> bool,
}

impl MainWindow {
    /// 创建不打开任何文件的主窗口
    pub fn new(ctx: &egui::Context, store: SettingsStore) -> Self {
        // 安装图片加载器，关于对话框中的 logo 需要它
        egui_extras::install_image_loaders(ctx);

        tracing::debug!("settings file: {}", store.path().display());
        let settings = store.load_or_default();
        let examples = library::scan(&Self::examples_dir());
        tracing::info!("{} example fragment(s) available", examples.len());

        Self {
            document: Document::default(),
            settings,
            store,
            examples,
            splash: None,
            shown: false,
            presented: false,
            title: String::new(),
            show_about: false,
            status_msg: "Ready.".to_owned(),
            ask_discard: discard_dialog,
        }
    }

    /// 创建主窗口并打开初始文件
    pub fn with_file(ctx: &egui::Context, store: SettingsStore, path: &Path) -> Self {
        let mut window = Self::new(ctx, store);
        window.open_file(path);
        window
    }

    /// Misc 资源目录（启动画面等），可用 FRAGMENTARIUM_MISC_DIR 覆盖
    /// 目录中的 splash.png 是可选的，缺失时使用内嵌图片
    pub fn misc_dir() -> PathBuf {
        resolve_asset_dir(
            std::env::var_os("FRAGMENTARIUM_MISC_DIR"),
            std::env::current_exe().ok(),
            "Misc",
            dev_asset_dir("assets/misc").as_deref(),
        )
    }

    /// 示例片段目录，可用 FRAGMENTARIUM_EXAMPLES_DIR 覆盖
    pub fn examples_dir() -> PathBuf {
        resolve_asset_dir(
            std::env::var_os("FRAGMENTARIUM_EXAMPLES_DIR"),
            std::env::current_exe().ok(),
            "Examples",
            dev_asset_dir("Examples").as_deref(),
        )
    }

    /// 打开文件，成功时加入最近文件列表并保存设置
    /// 读取失败时保留空文档，并在状态栏提示
    pub fn open_file(&mut self, path: &Path) {
        match Document::open(path) {
            Ok(document) => {
                tracing::info!("opened {}", path.display());
                self.document = document;
                self.settings.push_recent(path);
                self.persist_settings();
                self.status_msg = format!("Loaded {}", path.display());
            }
            Err(e) => {
                tracing::warn!("{e:#}");
                self.status_msg = format!("Failed to open {}: {e:#}", path.display());
            }
        }
    }

    fn save(&mut self) {
        if self.document.path.is_none() {
            self.save_as();
            return;
        }
        match self.document.save() {
            Ok(()) => self.status_msg = format!("Saved {}", self.document.display_name()),
            Err(e) => {
                tracing::error!("{e:#}");
                self.status_msg = format!("Save failed: {e:#}");
            }
        }
    }

    fn save_as(&mut self) {
        let Some(path) = FileDialog::new()
            .add_filter("Fragment", &["frag"])
            .set_file_name(self.document.display_name())
            .save_file()
        else {
            return;
        };

        match self.document.save_as(&path) {
            Ok(()) => {
                self.settings.push_recent(&path);
                self.persist_settings();
                self.status_msg = format!("Saved {}", path.display());
            }
            Err(e) => {
                tracing::error!("{e:#}");
                self.status_msg = format!("Save failed: {e:#}");
            }
        }
    }

    fn persist_settings(&self) {
        if let Err(e) = self.store.save(&self.settings) {
            tracing::warn!("{e}");
        }
    }

    /// 当前文档有未保存修改时询问用户是否放弃
    fn confirm_discard(&self) -> bool {
        !self.document.modified || (self.ask_discard)(&self.document.display_name())
    }

    fn apply(&mut self, ctx: &egui::Context, action: Action) {
        match action {
            Action::New => {
                if self.confirm_discard() {
                    self.document = Document::default();
                    self.status_msg = "New document.".to_owned();
                }
            }
            Action::Open => {
                if !self.confirm_discard() {
                    return;
                }
                let mut dialog = FileDialog::new().add_filter("Fragment", &["frag"]);
                if let Some(dir) = self.document.path.as_ref().and_then(|p| p.parent()) {
                    dialog = dialog.set_directory(dir);
                }
                if let Some(path) = dialog.pick_file() {
                    self.open_file(&path);
                }
            }
            Action::OpenPath(path) => {
                if self.confirm_discard() {
                    self.open_file(&path);
                }
            }
            Action::Save => self.save(),
            Action::SaveAs => self.save_as(),
            Action::ShowInFolder => {
                // 使用系统默认文件管理器打开所在目录
                if let Some(dir) = self.document.path.as_ref().and_then(|p| p.parent()) {
                    if let Err(e) = open::that(dir) {
                        self.status_msg = format!("Cannot open {}: {e}", dir.display());
                    }
                }
            }
            Action::Quit => {
                if self.confirm_discard() {
                    self.remember_window_size(ctx);
                    self.persist_settings();
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            }
        }
    }

    /// 初始化完成且达到最短显示时间后关闭启动画面
    /// 返回 true 表示启动画面仍在显示
    fn update_splash(&mut self, ctx: &egui::Context) -> bool {
        let Some(splash) = &mut self.splash else {
            return false;
        };

        let min = Duration::from_millis(self.settings.splash_min_ms);
        let elapsed = splash.elapsed();
        if splash.is_visible() && elapsed < min {
            splash.render(ctx);
            if splash.is_visible() {
                ctx.request_repaint_after(min - elapsed);
                return true;
            }
        }

        splash.close();
        self.splash = None;
        ctx.request_repaint();
        false
    }

    /// 把根视口从启动画面样式切换为普通主窗口
    fn present(&mut self, ctx: &egui::Context) {
        let size = egui::Vec2::from(self.settings.window_size);
        ctx.send_viewport_cmd(egui::ViewportCommand::Decorations(true));
        ctx.send_viewport_cmd(egui::ViewportCommand::WindowLevel(egui::WindowLevel::Normal));
        ctx.send_viewport_cmd(egui::ViewportCommand::Resizable(true));
        ctx.send_viewport_cmd(egui::ViewportCommand::MinInnerSize(egui::vec2(640.0, 400.0)));
        ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
        if let Some(monitor) = ctx.input(|i| i.viewport().monitor_size) {
            let pos = ((monitor - size) * 0.5).max(egui::Vec2::ZERO);
            ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(pos.to_pos2()));
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
        self.presented = true;
    }

    fn remember_window_size(&mut self, ctx: &egui::Context) {
        if let Some(rect) = ctx.input(|i| i.viewport().inner_rect) {
            self.settings.window_size = [rect.width(), rect.height()];
        }
    }

    fn sync_title(&mut self, ctx: &egui::Context) {
        let title = self.document.window_title();
        if title != self.title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.title = title;
        }
    }

    fn ui_menu(&mut self, ctx: &egui::Context) -> Option<Action> {
        let mut action = None;
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("New").clicked() {
                        action = Some(Action::New);
                        ui.close_menu();
                    }
                    if ui.button("Open…").clicked() {
                        action = Some(Action::Open);
                        ui.close_menu();
                    }
                    if ui.button("Save").clicked() {
                        action = Some(Action::Save);
                        ui.close_menu();
                    }
                    if ui.button("Save As…").clicked() {
                        action = Some(Action::SaveAs);
                        ui.close_menu();
                    }
                    ui.separator();

                    ui.menu_button("Recent Files", |ui| {
                        if self.settings.recent_files.is_empty() {
                            ui.weak("(none)");
                        }
                        for path in &self.settings.recent_files {
                            if ui.button(path.display().to_string()).clicked() {
                                action = Some(Action::OpenPath(path.clone()));
                                ui.close_menu();
                            }
                        }
                    });
                    ui.menu_button("Examples", |ui| {
                        if self.examples.is_empty() {
                            ui.weak("(no examples found)");
                        }
                        egui::ScrollArea::vertical().max_height(400.0).show(ui, |ui| {
                            for example in &self.examples {
                                if ui.button(&example.name).clicked() {
                                    action = Some(Action::OpenPath(example.path.clone()));
                                    ui.close_menu();
                                }
                            }
                        });
                    });

                    let has_path = self.document.path.is_some();
                    if ui.add_enabled(has_path, egui::Button::new("Show in Folder")).clicked() {
                        action = Some(Action::ShowInFolder);
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        action = Some(Action::Quit);
                        ui.close_menu();
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About Fragmentarium").clicked() {
                        self.show_about = true;
                        ui.close_menu();
                    }
                });
            });
        });
        action
    }

    fn ui_about(&mut self, ctx: &egui::Context) {
        egui::Window::new("About Fragmentarium")
            .open(&mut self.show_about)
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add(
                        egui::Image::new(egui::include_image!("../assets/misc/splash.png"))
                            .max_width(320.0),
                    );
                    ui.heading(format!("Fragmentarium {}", env!("CARGO_PKG_VERSION")));
                    ui.label("Syntopia Software");
                });
            });
    }

    fn ui_editor(&mut self, ctx: &egui::Context) {
        // 底部状态栏
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status_msg);
                if let Some(path) = &self.document.path {
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(egui::RichText::new(path.to_string_lossy()).weak().small());
                    });
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::both().auto_shrink([false, false]).show(ui, |ui| {
                let editor = egui::TextEdit::multiline(&mut self.document.text)
                    .code_editor()
                    .desired_width(f32::INFINITY)
                    .desired_rows(40);
                if ui.add(editor).changed() {
                    self.document.modified = true;
                }
            });
        });
    }

    fn shortcuts(&self, ctx: &egui::Context) -> Option<Action> {
        let open = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::O);
        let save = egui::KeyboardShortcut::new(egui::Modifiers::COMMAND, egui::Key::S);
        ctx.input_mut(|i| {
            if i.consume_shortcut(&open) {
                Some(Action::Open)
            } else if i.consume_shortcut(&save) {
                Some(Action::Save)
            } else {
                None
            }
        })
    }
}

impl StartupWindow for MainWindow {
    fn set_splash_widget(&mut self, splash: SplashSurface) {
        self.splash = Some(splash);
    }

    fn show(&mut self, _ctx: &egui::Context) {
        self.shown = true;
    }

    fn update(&mut self, ctx: &egui::Context) {
        if self.update_splash(ctx) || !self.shown {
            return;
        }
        if !self.presented {
            self.present(ctx);
        }
        self.sync_title(ctx);

        if ctx.input(|i| i.viewport().close_requested()) {
            if self.confirm_discard() {
                self.remember_window_size(ctx);
                self.persist_settings();
            } else {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            }
        }

        let action = self.ui_menu(ctx).or_else(|| self.shortcuts(ctx));
        self.ui_about(ctx);
        self.ui_editor(ctx);

        if let Some(action) = action {
            self.apply(ctx, action);
        }
    }
}

fn discard_dialog(name: &str) -> bool {
    let answer = rfd::MessageDialog::new()
        .set_title("Fragmentarium")
        .set_description(format!("{name} has unsaved changes. Discard them?"))
        .set_buttons(rfd::MessageButtons::YesNo)
        .show();
    answer == rfd::MessageDialogResult::Yes
}

/// 资源目录解析顺序：环境变量覆盖 > 可执行文件旁的目录 > 开发目录（仅在前者不存在时）
fn resolve_asset_dir(
    overridden: Option<OsString>,
    exe: Option<PathBuf>,
    name: &str,
    dev_dir: Option<&Path>,
) -> PathBuf {
    if let Some(dir) = overridden {
        return PathBuf::from(dir);
    }
    let exe_dir = exe
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let dir = bundle_root(&exe_dir).join(name);
    match dev_dir {
        Some(dev) if !dir.is_dir() && dev.is_dir() => dev.to_path_buf(),
        _ => dir,
    }
}

/// 调试构建（cargo run）时可执行文件位于 target 目录，回退到源码树中的资源
fn dev_asset_dir(relative: &str) -> Option<PathBuf> {
    cfg!(debug_assertions).then(|| Path::new(env!("CARGO_MANIFEST_DIR")).join(relative))
}

/// macOS 应用包中可执行文件位于 Fragmentarium.app/Contents/MacOS，资源目录在包外
#[cfg(target_os = "macos")]
fn bundle_root(exe_dir: &Path) -> PathBuf {
    exe_dir.join("../../..")
}

#[cfg(not(target_os = "macos"))]
fn bundle_root(exe_dir: &Path) -> PathBuf {
    exe_dir.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn store_in(dir: &Path, splash_min_ms: u64) -> SettingsStore {
        let store = SettingsStore::in_dir(dir.join("config"));
        let settings = Settings {
            splash_min_ms,
            ..Settings::default()
        };
        store.save(&settings).unwrap();
        store
    }

    fn shown_splash() -> SplashSurface {
        let mut splash = SplashSurface::new(&RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])), true);
        splash.show();
        splash
    }

    fn run_frame(ctx: &egui::Context, window: &mut MainWindow) {
        let _ = ctx.run(egui::RawInput::default(), |ctx| window.update(ctx));
    }

    #[test]
    fn test_open_initial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.frag");
        fs::write(&path, "#camera 3D\n").unwrap();

        let ctx = egui::Context::default();
        let store = store_in(dir.path(), 0);
        let window = MainWindow::with_file(&ctx, store.clone(), &path);

        assert_eq!(window.document.text, "#camera 3D\n");
        assert_eq!(window.document.path.as_deref(), Some(path.as_path()));
        assert_eq!(store.load().unwrap().recent_files, vec![path]);
    }

    #[test]
    fn test_missing_initial_file() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let store = store_in(dir.path(), 0);
        let window = MainWindow::with_file(&ctx, store.clone(), &dir.path().join("missing.frag"));

        assert!(window.document.path.is_none());
        assert!(window.status_msg.starts_with("Failed to open"));
        assert!(store.load().unwrap().recent_files.is_empty());
    }

    #[test]
    fn test_splash_dismissed_after_init() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut window = MainWindow::new(&ctx, store_in(dir.path(), 0));
        window.set_splash_widget(shown_splash());
        window.show(&ctx);
        assert!(window.splash.as_ref().is_some_and(|s| s.is_visible()));

        run_frame(&ctx, &mut window);
        assert!(!window.splash.as_ref().is_some_and(|s| s.is_visible()));
        assert!(window.presented);
        assert_eq!(window.title, "Unnamed - Fragmentarium");
    }

    #[test]
    fn test_splash_kept_for_minimum_time() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut window = MainWindow::new(&ctx, store_in(dir.path(), 60_000));
        window.set_splash_widget(shown_splash());
        window.show(&ctx);

        run_frame(&ctx, &mut window);
        assert!(window.splash.as_ref().is_some_and(|s| s.is_visible()));
        assert!(!window.presented);
    }

    #[test]
    fn test_resolve_asset_dir() {
        let overridden =
            resolve_asset_dir(Some(OsString::from("/opt/frag/Misc")), None, "Misc", None);
        assert_eq!(overridden, PathBuf::from("/opt/frag/Misc"));

        let exe = PathBuf::from("/opt/frag/bin/fragmentarium");
        let resolved = resolve_asset_dir(None, Some(exe), "Examples", None);
        assert_eq!(resolved, bundle_root(Path::new("/opt/frag/bin")).join("Examples"));
    }

    #[test]
    fn test_dev_asset_dir_used_when_exe_dir_lacks_assets() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join("target/debug/fragmentarium");
        let dev = dir.path().join("assets/misc");
        fs::create_dir_all(&dev).unwrap();

        let resolved = resolve_asset_dir(None, Some(exe.clone()), "Misc", Some(&dev));
        assert_eq!(resolved, dev);

        // 可执行文件旁存在 Misc 时优先使用它
        let beside_exe = bundle_root(exe.parent().unwrap()).join("Misc");
        fs::create_dir_all(&beside_exe).unwrap();
        let resolved = resolve_asset_dir(None, Some(exe), "Misc", Some(&dev));
        assert_eq!(resolved, beside_exe);

        if let Some(misc) = dev_asset_dir("assets/misc") {
            assert!(misc.join(crate::splash::SPLASH_FILENAME).is_file());
        }
    }

    fn close_request() -> egui::RawInput {
        let mut input = egui::RawInput::default();
        input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .events
            .push(egui::ViewportEvent::Close);
        input
    }

    fn cancel_close_sent(output: &egui::FullOutput) -> bool {
        output
            .viewport_output
            .get(&egui::ViewportId::ROOT)
            .is_some_and(|v| {
                v.commands
                    .iter()
                    .any(|c| matches!(c, egui::ViewportCommand::CancelClose))
            })
    }

    #[test]
    fn test_close_with_unsaved_changes_is_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.frag");
        fs::write(&path, "original\n").unwrap();

        let ctx = egui::Context::default();
        let mut window = MainWindow::with_file(&ctx, store_in(dir.path(), 0), &path);
        window.ask_discard = |_| false;
        window.show(&ctx);
        run_frame(&ctx, &mut window);

        window.document.text.push_str("edited\n");
        window.document.modified = true;
        let output = ctx.run(close_request(), |ctx| window.update(ctx));

        assert!(cancel_close_sent(&output));
        assert!(window.document.modified);
        assert_eq!(fs::read_to_string(&path).unwrap(), "original\n");
    }

    #[test]
    fn test_close_after_discard_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let store = store_in(dir.path(), 0);
        let mut window = MainWindow::new(&ctx, store.clone());
        window.ask_discard = |_| true;
        window.show(&ctx);
        run_frame(&ctx, &mut window);

        window.document.text = "edited".to_owned();
        window.document.modified = true;
        fs::remove_file(store.path()).unwrap();
        let output = ctx.run(close_request(), |ctx| window.update(ctx));

        assert!(!cancel_close_sent(&output));
        assert!(store.path().is_file());
    }

    #[test]
    fn test_close_without_changes_never_asks() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = egui::Context::default();
        let mut window = MainWindow::new(&ctx, store_in(dir.path(), 0));
        window.ask_discard = |_| panic!("no unsaved changes, nothing to ask");
        window.show(&ctx);

        let output = ctx.run(close_request(), |ctx| window.update(ctx));
        assert!(!cancel_close_sent(&output));
    }
}
