fn main() {
    println!("cargo:rerun-if-changed=assets/fragmentarium.ico");

    // 仅在 Windows 目标上嵌入可执行文件图标
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("windows") {
        let mut res = winres::WindowsResource::new();
        res.set_icon("assets/fragmentarium.ico");
        if let Err(e) = res.compile() {
            println!("cargo:warning=failed to embed icon: {}", e);
        }
    }
}
