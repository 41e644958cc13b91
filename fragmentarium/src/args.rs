//! 命令行参数解码与解析
//!
//! 参数解码按平台各有一个实现，在编译期选定：
//! - Unix 类平台：argv 中保存的是 UTF-8 字节，按 UTF-8 解码
//! - Windows：使用系统提供的宽字符（UTF-16）参数列表，以正确处理 Unicode 路径

use std::ffi::OsString;
use std::path::PathBuf;

/// 平台参数解码能力
pub trait ArgDecoder {
    /// 将原始进程参数解码为文本序列（包含程序名）
    fn decode(&self, raw: Vec<OsString>) -> Vec<String>;
}

/// Unix 类平台：从原始字节按 UTF-8 解码，非法序列替换为 U+FFFD
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct Utf8Decoder;

#[cfg(unix)]
impl ArgDecoder for Utf8Decoder {
    fn decode(&self, raw: Vec<OsString>) -> Vec<String> {
        use std::os::unix::ffi::OsStrExt;

        raw.iter()
            .map(|arg| String::from_utf8_lossy(arg.as_bytes()).into_owned())
            .collect()
    }
}

/// Windows：标准库的 args_os 来自 GetCommandLineW，这里按 UTF-16 解码
#[cfg(windows)]
#[derive(Debug, Default, Clone, Copy)]
pub struct WideDecoder;

#[cfg(windows)]
impl ArgDecoder for WideDecoder {
    fn decode(&self, raw: Vec<OsString>) -> Vec<String> {
        use std::os::windows::ffi::OsStrExt;

        raw.iter()
            .map(|arg| {
                let wide: Vec<u16> = arg.encode_wide().collect();
                String::from_utf16_lossy(&wide)
            })
            .collect()
    }
}

/// 其他平台：退回到标准库的有损转换
#[cfg(not(any(unix, windows)))]
#[derive(Debug, Default, Clone, Copy)]
pub struct LossyDecoder;

#[cfg(not(any(unix, windows)))]
impl ArgDecoder for LossyDecoder {
    fn decode(&self, raw: Vec<OsString>) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string_lossy().into_owned()).collect()
    }
}

/// 当前编译目标对应的解码器
#[cfg(unix)]
pub fn platform_decoder() -> impl ArgDecoder {
    Utf8Decoder
}

#[cfg(windows)]
pub fn platform_decoder() -> impl ArgDecoder {
    WideDecoder
}

#[cfg(not(any(unix, windows)))]
pub fn platform_decoder() -> impl ArgDecoder {
    LossyDecoder
}

/// 根据参数决定主窗口的构造方式
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LaunchRequest {
    /// 启动时打开的文件，None 表示不打开任何文件
    pub initial_file: Option<PathBuf>,
    /// 被忽略的多余参数个数
    pub ignored: usize,
}

impl LaunchRequest {
    /// 解析已解码的参数序列
    /// - 0 或 1 个参数（只有程序名）：不打开文件
    /// - 2 个及以上：只使用 args[1] 作为初始文件，其余参数忽略
    pub fn from_args(args: &[String]) -> Self {
        match args {
            [] | [_] => Self::default(),
            [_, file, rest @ ..] => Self {
                initial_file: Some(PathBuf::from(file)),
                ignored: rest.len(),
            },
        }
    }
}

/// 解码当前进程参数并生成启动请求
pub fn parse_process_args(raw: Vec<OsString>) -> LaunchRequest {
    let args = platform_decoder().decode(raw);
    let request = LaunchRequest::from_args(&args);

    if request.ignored > 0 {
        tracing::debug!("ignoring {} extra command-line argument(s)", request.ignored);
    }
    request
}
