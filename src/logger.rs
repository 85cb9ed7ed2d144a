//! 日志初始化
//!
//! 日志输出到 stderr，stdout 只留给生成结果的 JSON。
//! `RUST_LOG` 优先于 `VERBOSE_LOGGING`。

use tracing_subscriber::EnvFilter;

/// 初始化全局日志，重复调用时忽略
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
