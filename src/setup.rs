//! 初始化工作目录
//!
//! `label_generator init` 在配置文件所在目录生成：
//! - `config.json`
//! - `template.toml`（示例模板）
//! - `orders.json`（示例订单）
//! - `output/`

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::Config;
use crate::models::loaders::order_loader::write_sample_orders;
use crate::models::loaders::template_loader::write_starter_template;

/// 生成初始配置和示例文件
///
/// 已存在的模板和订单文件不会被覆盖；`force` 只影响 `config.json`。
pub async fn init_workspace(config_path: &Path, force: bool) -> Result<Config> {
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let config = Config::starter();

    config.write_to(config_path, force).await?;
    info!("✓ 已写入配置文件: {}", config_path.display());

    let template_path = base.join(&config.template_path);
    if !template_path.exists() {
        write_starter_template(&template_path).await?;
        info!("✓ 已写入示例模板: {}", template_path.display());
    }

    let orders_path = base.join(&config.order_source_path);
    if !orders_path.exists() {
        write_sample_orders(&orders_path).await?;
        info!("✓ 已写入示例订单: {}", orders_path.display());
    }

    let output_dir = base.join(&config.output_dir);
    tokio::fs::create_dir_all(&output_dir)
        .await
        .with_context(|| format!("无法创建输出目录: {}", output_dir.display()))?;
    info!("✓ 输出目录: {}", output_dir.display());

    Ok(config)
}
