use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{AppError, AppResult, OrderDataError, TemplateError};
use crate::models::order::Order;
use crate::models::template::LabelTemplate;

/// SKU 目录名取 SKU 的前几位
const SKU_DIR_PREFIX_LEN: usize = 5;

/// 解析 TOML 文本并校验模板
pub fn parse_template(content: &str, path: &Path) -> Result<LabelTemplate, TemplateError> {
    let template: LabelTemplate = toml::from_str(content).map_err(|source| TemplateError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    template.check().map_err(|reason| TemplateError::Invalid {
        path: path.display().to_string(),
        reason,
    })?;
    Ok(template)
}

fn read_error(path: &Path, source: std::io::Error) -> TemplateError {
    if source.kind() == std::io::ErrorKind::NotFound {
        TemplateError::NotFound {
            path: path.display().to_string(),
        }
    } else {
        TemplateError::ReadFailed {
            path: path.display().to_string(),
            source,
        }
    }
}

/// 从 TOML 文件加载模板
pub async fn load_template(path: &Path) -> Result<LabelTemplate, TemplateError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| read_error(path, e))?;
    parse_template(&content, path)
}

/// 同步加载模板（在工作线程中使用）
pub fn load_template_blocking(path: &Path) -> Result<LabelTemplate, TemplateError> {
    let content = std::fs::read_to_string(path).map_err(|e| read_error(path, e))?;
    parse_template(&content, path)
}

/// 在模板目录中查找 SKU 对应的模板
///
/// 目录结构为 `<root>/<SKU 前 5 位>/Labels <SKU>*.toml`，多个匹配时取文件名排序后的第一个。
pub fn find_template_for_sku(root: &Path, sku: &str) -> Result<PathBuf, TemplateError> {
    let prefix: String = sku.chars().take(SKU_DIR_PREFIX_LEN).collect();
    let sku_dir = root.join(&prefix);
    let not_found = || TemplateError::NoTemplateForSku {
        sku: sku.to_string(),
        dir: sku_dir.display().to_string(),
    };

    if !sku_dir.is_dir() {
        return Err(not_found());
    }

    let wanted = format!("Labels {}", sku);
    let entries = std::fs::read_dir(&sku_dir).map_err(|e| read_error(&sku_dir, e))?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension().and_then(|s| s.to_str()) == Some("toml")
                && path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|name| name.starts_with(&wanted))
        })
        .collect();
    candidates.sort();

    candidates.into_iter().next().ok_or_else(not_found)
}

/// 模板来源
#[derive(Debug, Clone)]
pub enum TemplateSource {
    /// 所有订单共用一个模板
    Single(Arc<LabelTemplate>),
    /// 按订单 SKU 在目录中查找模板
    PerSku { root: PathBuf },
}

impl TemplateSource {
    /// 根据路径打开模板来源：文件立即加载并校验，目录则在处理订单时按 SKU 查找
    pub async fn open(path: &Path) -> Result<Self, TemplateError> {
        if path.is_dir() {
            info!("📁 模板目录: {}（按 SKU 查找模板）", path.display());
            return Ok(TemplateSource::PerSku {
                root: path.to_path_buf(),
            });
        }
        let template = load_template(path).await?;
        info!(
            "📄 使用模板: {} ({} x {} mm, {} 个文本元素)",
            template.name,
            template.width_mm,
            template.height_mm,
            template.texts.len()
        );
        Ok(TemplateSource::Single(Arc::new(template)))
    }

    /// 同步版本的 [`TemplateSource::open`]
    pub fn open_blocking(path: &Path) -> Result<Self, TemplateError> {
        if path.is_dir() {
            return Ok(TemplateSource::PerSku {
                root: path.to_path_buf(),
            });
        }
        Ok(TemplateSource::Single(Arc::new(load_template_blocking(
            path,
        )?)))
    }

    /// 为订单选择模板
    pub fn resolve(&self, order: &Order) -> AppResult<Arc<LabelTemplate>> {
        match self {
            TemplateSource::Single(template) => Ok(Arc::clone(template)),
            TemplateSource::PerSku { root } => {
                let sku = order
                    .sku
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| OrderDataError::MissingField {
                        field: "sku".to_string(),
                    })?;
                let path = find_template_for_sku(root, sku)?;
                debug!("[订单 {}] 使用模板: {}", order.id, path.display());
                Ok(Arc::new(load_template_blocking(&path)?))
            }
        }
    }
}

/// 将初始模板写入文件
pub async fn write_starter_template(path: &Path) -> AppResult<()> {
    let content = toml::to_string_pretty(&LabelTemplate::starter())
        .map_err(|e| AppError::Other(format!("模板序列化失败: {}", e)))?;
    tokio::fs::write(path, content)
        .await
        .map_err(|e| AppError::file_write_failed(path, e))
}
