//! 启动画面
//!
//! 在主窗口构建完成前显示的无边框、置顶、带透明遮罩的图片窗口。
//! 启动流程创建并显示它，随后交给主窗口，由主窗口在初始化完成后关闭。
//! 程序只有一个原生窗口：它先以启动画面的样式出现，关闭启动画面时再切换为主窗口。

use crate::error::SplashError;
use eframe::egui;
use image::RgbaImage;
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

/// 启动画面图片在 Misc 目录中的文件名
pub const SPLASH_FILENAME: &str = "splash.png";

/// 从磁盘加载启动画面图片
pub fn load_pixmap(path: &Path) -> Result<RgbaImage, SplashError> {
    let bytes = fs::read(path).map_err(|source| SplashError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_pixmap(&bytes, path)
}

/// 解码内存中的图片数据，`origin` 仅用于错误信息
pub fn decode_pixmap(bytes: &[u8], origin: &Path) -> Result<RgbaImage, SplashError> {
    image::load_from_memory(bytes)
        .map(|img| img.to_rgba8())
        .map_err(|source| SplashError::Decode {
            path: origin.to_path_buf(),
            source,
        })
}

/// 由图片透明度生成的显示遮罩
/// alpha 不为 0 的像素属于遮罩内部
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SplashMask {
    width: usize,
    height: usize,
    bits: Vec<bool>,
}

impl SplashMask {
    pub fn from_alpha(image: &RgbaImage) -> Self {
        let bits = image.pixels().map(|p| p.0[3] != 0).collect();
        Self {
            width: image.width() as usize,
            height: image.height() as usize,
            bits,
        }
    }

    pub fn size(&self) -> [usize; 2] {
        [self.width, self.height]
    }

    /// 像素坐标是否落在遮罩内，越界视为外部
    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.bits[y * self.width + x]
    }

    /// 不透明区域的包围盒 [min_x, min_y, max_x, max_y]（含端点）
    /// 全透明时返回 None
    pub fn bounds(&self) -> Option<[usize; 4]> {
        let mut bounds: Option<[usize; 4]> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if !self.bits[y * self.width + x] {
                    continue;
                }
                bounds = Some(match bounds {
                    None => [x, y, x, y],
                    Some([x0, y0, x1, y1]) => [x0.min(x), y0.min(y), x1.max(x), y1.max(y)],
                });
            }
        }
        bounds
    }
}

/// 启动画面窗口
pub struct SplashSurface {
    image: egui::ColorImage,
    mask: SplashMask,
    always_on_top: bool,
    visible: bool,
    shown_at: Option<Instant>,
    texture: Option<egui::TextureHandle>,
}

impl SplashSurface {
    pub fn new(pixmap: &RgbaImage, always_on_top: bool) -> Self {
        let size = [pixmap.width() as usize, pixmap.height() as usize];
        Self {
            image: egui::ColorImage::from_rgba_unmultiplied(size, pixmap.as_raw()),
            mask: SplashMask::default(),
            always_on_top,
            visible: false,
            shown_at: None,
            texture: None,
        }
    }

    /// 没有可用图片时使用的空白画面
    pub fn empty(always_on_top: bool) -> Self {
        Self::new(&RgbaImage::new(0, 0), always_on_top)
    }

    pub fn set_mask(&mut self, mask: SplashMask) {
        self.mask = mask;
    }

    pub fn mask(&self) -> &SplashMask {
        &self.mask
    }

    pub fn is_empty(&self) -> bool {
        self.image.width() == 0 || self.image.height() == 0
    }

    pub fn show(&mut self) {
        if !self.visible {
            self.visible = true;
            self.shown_at = Some(Instant::now());
        }
    }

    pub fn close(&mut self) {
        if self.visible {
            tracing::debug!("splash dismissed");
        }
        self.visible = false;
        self.texture = None;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// 自显示以来经过的时间，未显示时为 0
    pub fn elapsed(&self) -> Duration {
        self.shown_at.map(|t| t.elapsed()).unwrap_or(Duration::ZERO)
    }

    /// 启动画面窗口的初始属性：无边框、透明、不可调整大小、（可选）置顶
    /// 根视口以此创建，主窗口显示时再切换为普通窗口
    pub fn viewport_builder(&self) -> egui::ViewportBuilder {
        let size = self.size();
        let level = if self.always_on_top {
            egui::WindowLevel::AlwaysOnTop
        } else {
            egui::WindowLevel::Normal
        };

        egui::ViewportBuilder::default()
            .with_title("Fragmentarium")
            .with_inner_size(size.max(egui::vec2(1.0, 1.0)))
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_window_level(level)
    }

    pub fn size(&self) -> egui::Vec2 {
        egui::vec2(self.image.width() as f32, self.image.height() as f32)
    }

    fn texture(&mut self, ctx: &egui::Context) -> Option<egui::TextureHandle> {
        if self.is_empty() {
            return None;
        }
        let image = &self.image;
        let texture = self.texture.get_or_insert_with(|| {
            ctx.load_texture("splash", image.clone(), egui::TextureOptions::LINEAR)
        });
        Some(texture.clone())
    }

    /// 在当前视口中绘制启动画面。未显示时什么都不做
    /// 点击遮罩内的像素或请求关闭窗口会隐藏启动画面
    pub fn render(&mut self, ctx: &egui::Context) {
        if !self.visible {
            return;
        }

        let mut dismiss = false;
        let texture = self.texture(ctx);
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                if let Some(texture) = &texture {
                    let image = egui::Image::new(texture)
                        .fit_to_exact_size(texture.size_vec2())
                        .sense(egui::Sense::click());
                    dismiss = clicked_inside(&ui.add(image), &self.mask);
                }
            });

        if ctx.input(|i| i.viewport().close_requested()) {
            // 启动阶段不允许关闭窗口，只关闭启动画面
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            dismiss = true;
        }

        if dismiss {
            self.close();
        }
    }
}

/// 点击是否落在遮罩的不透明区域内
fn clicked_inside(response: &egui::Response, mask: &SplashMask) -> bool {
    if !response.clicked() {
        return false;
    }
    let Some(pos) = response.interact_pointer_pos() else {
        return false;
    };
    hit_test(mask, response.rect, pos)
}

/// 将屏幕坐标换算为图片像素坐标后查询遮罩
fn hit_test(mask: &SplashMask, rect: egui::Rect, pos: egui::Pos2) -> bool {
    if !rect.contains(pos) || rect.width() <= 0.0 || rect.height() <= 0.0 {
        return false;
    }
    let [w, h] = mask.size();
    let local = pos - rect.min;
    let x = (local.x / rect.width() * w as f32) as usize;
    let y = (local.y / rect.height() * h as f32) as usize;
    mask.contains(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    /// 4x2 的测试图片，左半透明、右半不透明
    fn half_transparent() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, _| {
            if x < 2 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([255, 0, 0, 255])
            }
        })
    }

    #[test]
    fn test_mask_from_alpha() {
        let mask = SplashMask::from_alpha(&half_transparent());
        assert_eq!(mask.size(), [4, 2]);
        assert!(!mask.contains(0, 0));
        assert!(!mask.contains(1, 1));
        assert!(mask.contains(2, 0));
        assert!(mask.contains(3, 1));
        assert!(!mask.contains(4, 0));
        assert_eq!(mask.bounds(), Some([2, 0, 3, 1]));
    }

    #[test]
    fn test_fully_transparent_mask_has_no_bounds() {
        let mask = SplashMask::from_alpha(&RgbaImage::new(3, 3));
        assert_eq!(mask.bounds(), None);
    }

    #[test]
    fn test_hit_test_scales_to_pixels() {
        let mask = SplashMask::from_alpha(&half_transparent());
        let rect = egui::Rect::from_min_size(egui::pos2(10.0, 10.0), egui::vec2(40.0, 20.0));
        assert!(!hit_test(&mask, rect, egui::pos2(15.0, 15.0)));
        assert!(hit_test(&mask, rect, egui::pos2(45.0, 25.0)));
        assert!(!hit_test(&mask, rect, egui::pos2(60.0, 25.0)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pixmap(&dir.path().join(SPLASH_FILENAME)).unwrap_err();
        assert!(matches!(err, SplashError::Io { .. }));
    }

    #[test]
    fn test_garbage_file_is_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SPLASH_FILENAME);
        fs::write(&path, b"definitely not a png").unwrap();
        assert!(matches!(load_pixmap(&path), Err(SplashError::Decode { .. })));
    }

    #[test]
    fn test_show_and_close() {
        let mut splash = SplashSurface::new(&half_transparent(), true);
        assert!(!splash.is_visible());
        assert_eq!(splash.elapsed(), Duration::ZERO);

        splash.show();
        assert!(splash.is_visible());
        splash.close();
        assert!(!splash.is_visible());
        assert!(SplashSurface::empty(true).is_empty());
    }

    #[test]
    fn test_viewport_is_undecorated_and_on_top() {
        let splash = SplashSurface::new(&half_transparent(), true);
        let builder = splash.viewport_builder();
        assert_eq!(builder.inner_size, Some(egui::vec2(4.0, 2.0)));
        assert_eq!(builder.transparent, Some(true));
        assert_eq!(builder.decorations, Some(false));
        assert_eq!(builder.window_level, Some(egui::WindowLevel::AlwaysOnTop));
    }

    #[test]
    fn test_render_headless() {
        let ctx = egui::Context::default();
        let mut splash = SplashSurface::new(&half_transparent(), true);
        splash.show();
        let _ = ctx.run(egui::RawInput::default(), |ctx| splash.render(ctx));
        assert!(splash.is_visible());
    }

    fn masked_splash() -> SplashSurface {
        let pixmap = half_transparent();
        let mut splash = SplashSurface::new(&pixmap, true);
        splash.set_mask(SplashMask::from_alpha(&pixmap));
        splash.show();
        splash
    }

    fn pointer_input(events: Vec<egui::Event>) -> egui::RawInput {
        egui::RawInput {
            events,
            ..Default::default()
        }
    }

    fn button(pos: egui::Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    /// 先绘制一帧让图片登记位置，再按下并松开主键
    fn click(ctx: &egui::Context, splash: &mut SplashSurface, pos: egui::Pos2) {
        let _ = ctx.run(egui::RawInput::default(), |ctx| splash.render(ctx));
        let press = pointer_input(vec![egui::Event::PointerMoved(pos), button(pos, true)]);
        let _ = ctx.run(press, |ctx| splash.render(ctx));
        let _ = ctx.run(pointer_input(vec![button(pos, false)]), |ctx| splash.render(ctx));
    }

    #[test]
    fn test_click_on_opaque_pixel_dismisses() {
        let ctx = egui::Context::default();
        let mut splash = masked_splash();
        click(&ctx, &mut splash, egui::pos2(3.5, 1.0));
        assert!(!splash.is_visible());
    }

    #[test]
    fn test_click_on_transparent_pixel_is_ignored() {
        let ctx = egui::Context::default();
        let mut splash = masked_splash();
        click(&ctx, &mut splash, egui::pos2(0.5, 1.0));
        assert!(splash.is_visible());
    }

    #[test]
    fn test_close_request_only_dismisses_splash() {
        let ctx = egui::Context::default();
        let mut splash = masked_splash();

        let mut input = egui::RawInput::default();
        input
            .viewports
            .entry(egui::ViewportId::ROOT)
            .or_default()
            .events
            .push(egui::ViewportEvent::Close);
        let output = ctx.run(input, |ctx| splash.render(ctx));

        assert!(!splash.is_visible());
        let commands = &output.viewport_output[&egui::ViewportId::ROOT].commands;
        assert!(commands
            .iter()
            .any(|c| matches!(c, egui::ViewportCommand::CancelClose)));
    }
}
