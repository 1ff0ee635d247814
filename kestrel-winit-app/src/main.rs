use std::path::PathBuf;

mod app;

/// SPIR-V 从命令行给定的目录读取，默认 `shaders/`
fn main() -> anyhow::Result<()> {
    kestrel_crate_tools::init_log::init_log();

    let shader_dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("shaders"));
    app::DemoApp::run(shader_dir)
}
