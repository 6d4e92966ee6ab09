//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::config::Config;
use crate::models::BatchResult;

/// 失败原因在汇总中显示的最大长度
const MAX_REASON_LEN: usize = 120;

/// 初始化日志文件（写入表头，之后的日志追加在后面）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &Path) -> Result<()> {
    let log_header = format!(
        "{}\n标签生成日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法创建日志文件: {}", log_file_path.display()))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多线程标签生成模式");
    info!("📊 工作线程数: {}", config.thread_count);
    info!("🏷️ 条码码制: {}", config.barcode_format);
    info!("📂 输出目录: {}", config.output_dir.display());
    info!("{}", "=".repeat(60));
}

/// 记录订单加载信息
///
/// # 参数
/// - `total`: 待处理订单数
/// - `skipped`: 已生成过标签而跳过的订单数
/// - `rejected`: 无法解析的记录数
/// - `threads`: 工作线程数
pub fn log_orders_loaded(total: usize, skipped: usize, rejected: usize, threads: usize) {
    info!("✓ 找到 {} 个待处理的订单", total);
    if skipped > 0 {
        info!("⏭️ 跳过 {} 个已生成标签的订单", skipped);
    }
    if rejected > 0 {
        info!("⚠️ {} 条记录无法解析，已记为失败", rejected);
    }
    info!("📋 将由 {} 个工作线程并行处理\n", threads);
}

/// 记录批次完成信息
pub fn log_batch_complete(result: &BatchResult) {
    info!("\n{}", "─".repeat(60));
    info!(
        "✓ 批次完成: 成功 {}/{}",
        result.succeeded,
        result.total()
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
pub fn print_final_stats(result: &BatchResult) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", result.succeeded, result.total());
    info!("❌ 失败: {}", result.failed);
    for failure in &result.failures {
        error!(
            "   - {}: {}",
            failure.order_id,
            truncate_text(&failure.reason, MAX_REASON_LEN)
        );
    }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("条码内容为空", 2), "条码...");
    }

    #[test]
    fn test_init_log_file_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        init_log_file(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("标签生成日志"));
    }
}
