use std::path::Path;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 配置错误（致命）
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 模板错误（启动时致命，单个订单时记为失败）
    #[error("模板错误: {0}")]
    Template(#[from] TemplateError),
    /// 订单数据错误
    #[error("订单数据错误: {0}")]
    OrderData(#[from] OrderDataError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// PDF 渲染错误
    #[error("渲染错误: {0}")]
    Render(String),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    NotFound { path: String },
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入配置文件失败
    #[error("写入配置文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败（格式错误或缺少必填字段）
    #[error("配置文件解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// 配置项引用的路径不存在
    #[error("配置项 {key} 指向的路径不存在: {path}")]
    MissingPath { key: &'static str, path: String },
    /// 配置项取值非法
    #[error("配置项 {key} 取值非法: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: &'static str,
        value: String,
        expected_type: &'static str,
    },
    /// 配置文件已存在（init 时未指定 --force）
    #[error("配置文件已存在: {path}")]
    AlreadyExists { path: String },
}

/// 模板错误
#[derive(Debug, Error)]
pub enum TemplateError {
    /// 模板文件不存在
    #[error("模板不存在: {path}")]
    NotFound { path: String },
    /// 读取模板失败
    #[error("读取模板失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("模板解析失败 ({path}): {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 模板内容不合法
    #[error("模板内容不合法 ({path}): {reason}")]
    Invalid { path: String, reason: String },
    /// 模板引用了订单中不存在的字段
    #[error("模板字段 {{{field}}} 在订单中不存在")]
    FieldMissing { field: String },
    /// 按 SKU 查找模板失败
    #[error("未找到 SKU {sku} 的模板 (目录: {dir})")]
    NoTemplateForSku { sku: String, dir: String },
}

/// 订单数据错误
#[derive(Debug, Error)]
pub enum OrderDataError {
    /// 订单记录无法解析
    #[error("订单记录 {record} 无法解析: {reason}")]
    Malformed { record: String, reason: String },
    /// 订单号不能作为文件名
    #[error("订单号 '{id}' 不合法: {reason}")]
    InvalidId { id: String, reason: String },
    /// 订单号重复
    #[error("订单号 '{id}' 重复")]
    DuplicateId { id: String },
    /// 条码内容为空
    #[error("条码内容为空")]
    EmptyCode,
    /// 条码内容无法用当前码制编码
    #[error("条码内容 '{code}' 无法按 {format} 编码: {reason}")]
    Unencodable {
        code: String,
        format: String,
        reason: String,
    },
    /// 日期格式错误
    #[error("订单日期 '{value}' 格式错误，应为 dd.mm.YYYY 或 YYYY-MM-DD")]
    InvalidDate { value: String },
    /// 缺少渲染所需的字段
    #[error("订单缺少字段: {field}")]
    MissingField { field: String },
    /// 文本包含标签字体无法显示的字符
    #[error("文本 '{text}' 包含字体 {font} 无法显示的字符 '{ch}'")]
    UnsupportedText { text: String, font: String, ch: char },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// JSON 解析失败
    #[error("JSON解析失败 ({path}): {source}")]
    JsonParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: &Path, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: &Path, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 创建渲染错误
    pub fn render_failed(reason: impl Into<String>) -> Self {
        AppError::Render(reason.into())
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
