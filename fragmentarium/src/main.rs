#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // 在 Release 模式下隐藏 Windows 控制台窗口

// 声明项目中的模块
mod app; // 应用程序实例
mod args; // 命令行参数解码与解析
mod bootstrap; // 启动流程
mod document; // 正在编辑的片段文件
mod error; // 错误类型
mod library; // 示例片段扫描
mod logging; // 日志初始化
mod main_window; // 主窗口
mod resources; // 内嵌资源包
mod settings; // 持久化设置
mod splash; // 启动画面

use std::process::ExitCode;

// 程序入口点
// 资源包损坏等致命错误以 Err 返回；事件循环的结果转换为退出码
fn main() -> anyhow::Result<ExitCode> {
    logging::init()?;
    bootstrap::run(std::env::args_os().collect())
}
