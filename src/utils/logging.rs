/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::{info, warn};

/// 记录程序启动信息
///
/// # 参数
/// - `total`: 待处理的请求数
pub fn log_startup(total: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 副本题生成模式");
    info!("📋 待处理请求: {} 个", total);
    info!("{}", "=".repeat(60));
}

/// 记录单个请求开始处理
///
/// # 参数
/// - `summary`: 请求摘要（模型、题数、选项数、类型）
/// - `base_question`: 原题题干
pub fn log_request_start(summary: &dyn std::fmt::Display, base_question: &str) {
    info!("\n{}", "─".repeat(60));
    info!(
        "📝 开始生成 {} - {}",
        summary,
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("原题: {}", truncate_text(base_question, 100));
}

/// 记录解析和校验统计
///
/// # 参数
/// - `parsed`: 从响应中解析出的候选题数
/// - `validated`: 通过校验的题数
/// - `requested`: 请求的题数
pub fn log_generation_stats(parsed: usize, validated: usize, requested: usize) {
    info!(
        "📊 解析 {} 道，校验通过 {} 道，请求 {} 道",
        parsed, validated, requested
    );
    if validated < requested {
        warn!("⚠️ 通过校验的题目不足: {}/{}", validated, requested);
    }
}

/// 打印最终统计信息
///
/// # 参数
/// - `success`: 成功数量
/// - `failed`: 失败数量
/// - `total`: 总数
pub fn print_final_stats(success: usize, failed: usize, total: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", success, total);
    info!("❌ 失败: {}", failed);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
