//! 程序配置
//!
//! 配置来自 `config.json`，加载时一次性完成解析、环境变量覆盖、相对路径解析和校验，
//! 之后在整个运行期间只读共享。

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// 默认工作线程数
pub const DEFAULT_THREAD_COUNT: usize = 4;

/// 条码码制
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarcodeFormat {
    /// Code 39（默认，不带校验位）
    #[default]
    Code39,
    /// Code 128（字符集 B）
    Code128,
    /// EAN-13
    Ean13,
}

impl BarcodeFormat {
    /// 配置文件中使用的名称
    pub fn name(self) -> &'static str {
        match self {
            BarcodeFormat::Code39 => "code39",
            BarcodeFormat::Code128 => "code128",
            BarcodeFormat::Ean13 => "ean13",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BarcodeFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code39" => Ok(BarcodeFormat::Code39),
            "code128" => Ok(BarcodeFormat::Code128),
            "ean13" => Ok(BarcodeFormat::Ean13),
            other => Err(format!("未知码制: {}", other)),
        }
    }
}

/// 程序配置文件
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 订单数据文件（JSON 数组）
    pub order_source_path: PathBuf,
    /// 标签模板：单个 TOML 文件，或按 SKU 分子目录存放模板的目录
    pub template_path: PathBuf,
    /// PDF 输出目录
    pub output_dir: PathBuf,
    /// 条码码制
    #[serde(default)]
    pub barcode_format: BarcodeFormat,
    /// 工作线程数
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,
    /// 处理完成后是否回写订单文件的 `labels_created` 标记
    #[serde(default)]
    pub mark_processed: bool,
}

fn default_thread_count() -> usize {
    DEFAULT_THREAD_COUNT
}

impl Config {
    /// 从 JSON 文件加载配置
    ///
    /// 依次执行：读取 → 解析 → 环境变量覆盖 → 相对路径解析 → 校验。
    /// 任意一步失败都返回 [`ConfigError`]，不会产生其他副作用。
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound {
                    path: path.display().to_string(),
                });
            }
            Err(e) => {
                return Err(ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    source: e,
                });
            }
        };

        let mut config = Self::from_json(&content, path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        config.validate()?;

        tracing::debug!("配置加载完成: {:?}", config);
        Ok(config)
    }

    /// 解析 JSON 文本（不做路径校验）
    pub fn from_json(content: &str, path: &Path) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// 应用环境变量覆盖
    ///
    /// - `LABEL_THREAD_COUNT`
    /// - `LABEL_OUTPUT_DIR`
    /// - `LABEL_BARCODE_FORMAT`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("LABEL_THREAD_COUNT") {
            self.thread_count =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::EnvVarParseFailed {
                        var_name: "LABEL_THREAD_COUNT",
                        value: value.clone(),
                        expected_type: "usize",
                    })?;
        }
        if let Some(value) = lookup("LABEL_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("LABEL_BARCODE_FORMAT") {
            self.barcode_format =
                value
                    .parse()
                    .map_err(|_| ConfigError::EnvVarParseFailed {
                        var_name: "LABEL_BARCODE_FORMAT",
                        value: value.clone(),
                        expected_type: "code39 | code128 | ean13",
                    })?;
        }
        Ok(())
    }

    /// 将相对路径解析为相对于配置文件所在目录
    pub fn resolve_relative_to(&mut self, base: &Path) {
        for path in [
            &mut self.order_source_path,
            &mut self.template_path,
            &mut self.output_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// 校验配置
    ///
    /// 所有引用的路径都必须已经存在，以便在启动时就失败，而不是在工作线程里失败。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.thread_count == 0 {
            return Err(ConfigError::InvalidValue {
                key: "thread_count",
                reason: "必须大于 0".to_string(),
            });
        }
        if !self.order_source_path.is_file() {
            return Err(ConfigError::MissingPath {
                key: "order_source_path",
                path: self.order_source_path.display().to_string(),
            });
        }
        if !self.template_path.exists() {
            return Err(ConfigError::MissingPath {
                key: "template_path",
                path: self.template_path.display().to_string(),
            });
        }
        if !self.output_dir.is_dir() {
            return Err(ConfigError::MissingPath {
                key: "output_dir",
                path: self.output_dir.display().to_string(),
            });
        }
        Ok(())
    }

    /// 生成初始配置（路径相对于配置文件所在目录）
    pub fn starter() -> Self {
        Self {
            order_source_path: PathBuf::from("orders.json"),
            template_path: PathBuf::from("template.toml"),
            output_dir: PathBuf::from("output"),
            barcode_format: BarcodeFormat::default(),
            thread_count: DEFAULT_THREAD_COUNT,
            mark_processed: false,
        }
    }

    /// 将配置写入文件，`force` 为 false 时不覆盖已有文件
    pub async fn write_to(&self, path: &Path, force: bool) -> Result<(), ConfigError> {
        if !force && path.exists() {
            return Err(ConfigError::AlreadyExists {
                path: path.display().to_string(),
            });
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        tokio::fs::write(path, json + "\n")
            .await
            .map_err(|source| ConfigError::WriteFailed {
                path: path.display().to_string(),
                source,
            })
    }
}
