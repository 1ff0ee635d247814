use std::io::Write;

/// 彩色终端日志；默认 info 级别，RUST_LOG 环境变量可以覆盖
pub fn init_log() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| {
            let level_color = match record.level() {
                log::Level::Error => anstyle::AnsiColor::Red,
                log::Level::Warn => anstyle::AnsiColor::Yellow,
                log::Level::Info => anstyle::AnsiColor::Green,
                log::Level::Debug => anstyle::AnsiColor::Blue,
                log::Level::Trace => anstyle::AnsiColor::Magenta,
            };
            let level_style = anstyle::Style::new().bold().fg_color(Some(anstyle::Color::Ansi(level_color)));
            let dim_style =
                anstyle::Style::new().fg_color(Some(anstyle::Color::Rgb(anstyle::RgbColor(128, 128, 128))));

            let time = chrono::Local::now().format("%H:%M:%S%.3f");
            let target = record.target();
            writeln!(
                buf,
                "{dim_style}{time}{dim_style:#} {level_style}{:>5}{level_style:#} {dim_style}{target}{dim_style:#} {}",
                record.level(),
                record.args()
            )
        })
        .init();
}
