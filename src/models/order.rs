use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

use crate::error::OrderDataError;

/// 订单日期接受的输入格式
const DATE_INPUT_FORMATS: [&str; 2] = ["%d.%m.%Y", "%Y-%m-%d"];
/// 订单日期在标签上的输出格式
const DATE_OUTPUT_FORMAT: &str = "%d.%m.%Y";

/// 文件名中不允许出现的字符
const FORBIDDEN_ID_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Windows 保留的设备名，带扩展名也不能使用
const RESERVED_ID_STEMS: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// 单个订单
///
/// 读取后不可变；除固定字段外，其余字段保存在 `extra` 中供模板引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// 订单号（同时决定输出文件名）
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// 条码内容；缺省时由订单号和位置号派生
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// 商品 SKU，按 SKU 查找模板时使用
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// 订单内位置号
    #[serde(default, deserialize_with = "optional_position")]
    pub position: Option<u32>,
    /// 订单日期
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_date: Option<String>,
    /// 是否已生成过标签
    #[serde(default, deserialize_with = "yes_no_or_bool")]
    pub labels_created: bool,
    /// 其他字段
    #[serde(flatten)]
    pub extra: BTreeMap<String, JsonValue>,
    /// 在订单文件中的记录序号（从0开始），回写时按序号定位记录
    #[serde(skip)]
    pub record_index: Option<usize>,
}

impl Order {
    /// 创建只有订单号和条码内容的订单
    pub fn new(id: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: Some(code.into()),
            recipient: None,
            destination: None,
            sku: None,
            position: None,
            order_date: None,
            labels_created: false,
            extra: BTreeMap::new(),
            record_index: None,
        }
    }

    /// 检查订单号能否安全地作为输出文件名
    pub fn validate_id(&self) -> Result<(), OrderDataError> {
        let invalid = |reason: &str| OrderDataError::InvalidId {
            id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.id.trim().is_empty() {
            return Err(invalid("订单号为空"));
        }
        if self.id.trim() != self.id {
            return Err(invalid("首尾包含空白字符"));
        }
        if self.id.starts_with('.') {
            return Err(invalid("不能以 '.' 开头"));
        }
        if self.id.ends_with('.') {
            return Err(invalid("不能以 '.' 结尾"));
        }
        if self
            .id
            .chars()
            .any(|c| c.is_control() || FORBIDDEN_ID_CHARS.contains(&c))
        {
            return Err(invalid("包含不能用于文件名的字符"));
        }
        let stem = self.id.split('.').next().unwrap_or_default().trim_end();
        if RESERVED_ID_STEMS
            .iter()
            .any(|reserved| reserved.eq_ignore_ascii_case(stem))
        {
            return Err(invalid("是系统保留的设备名"));
        }
        Ok(())
    }

    /// 输出文件名的比较键
    ///
    /// 不区分大小写的文件系统上 `a1` 与 `A1` 指向同一个文件。
    pub fn output_key(&self) -> String {
        self.id.to_lowercase()
    }

    /// 标签上使用的位置号：`00` + 三位位置号 + `00`
    pub fn formatted_position(&self) -> Option<String> {
        self.position.map(|p| format!("00{:03}00", p))
    }

    /// 短位置号：位置号 × 100，补齐到五位（`3` → `00300`）
    pub fn short_position(&self) -> Option<String> {
        self.position.map(|p| format!("{:05}", u64::from(p) * 100))
    }

    /// 规范化后的订单日期（dd.mm.YYYY）
    pub fn formatted_order_date(&self) -> Result<Option<String>, OrderDataError> {
        let Some(raw) = self.order_date.as_deref() else {
            return Ok(None);
        };
        let raw = raw.trim();
        DATE_INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .map(|date| Some(date.format(DATE_OUTPUT_FORMAT).to_string()))
            .ok_or_else(|| OrderDataError::InvalidDate {
                value: raw.to_string(),
            })
    }

    /// 条码内容
    ///
    /// 显式给出的 `code` 优先；未给出时使用 `00` + 订单号 + 位置号。
    /// 空白内容视为错误。
    pub fn barcode_payload(&self) -> Result<String, OrderDataError> {
        let payload = match (&self.code, self.formatted_position()) {
            (Some(code), _) => code.clone(),
            (None, Some(position)) => format!("00{}{}", self.id, position),
            (None, None) => String::new(),
        };
        if payload.trim().is_empty() {
            return Err(OrderDataError::EmptyCode);
        }
        Ok(payload)
    }

    /// 按名称查找模板字段的值
    ///
    /// 返回 `Ok(None)` 表示订单中没有该字段。
    pub fn field(&self, name: &str) -> Result<Option<String>, OrderDataError> {
        let value = match name {
            "id" => Some(self.id.clone()),
            "code" => Some(self.barcode_payload()?),
            "recipient" => self.recipient.clone(),
            "destination" => self.destination.clone(),
            "sku" => self.sku.clone(),
            "position" => self.formatted_position(),
            "position_short" => self.short_position(),
            "order_date" => self.formatted_order_date()?,
            other => self.extra.get(other).and_then(json_to_text),
        };
        Ok(value)
    }
}

fn json_to_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::Null => None,
        JsonValue::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("期望字符串或数字, 实际为 {}", other))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(None),
        JsonValue::String(s) => Ok(Some(s)),
        JsonValue::Number(n) => Ok(Some(n.to_string())),
        other => Err(D::Error::custom(format!("期望字符串或数字, 实际为 {}", other))),
    }
}

// 表格导出的位置号常见为 "3.0" 或 3.0
fn optional_position<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = JsonValue::deserialize(deserializer)?;
    let number = match &value {
        JsonValue::Null => return Ok(None),
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) if s.trim().is_empty() => return Ok(None),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) => Ok(Some(n as u32)),
        _ => Err(D::Error::custom(format!("位置号不合法: {}", value))),
    }
}

fn yes_no_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::Null => Ok(false),
        JsonValue::Bool(b) => Ok(b),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" => Ok(true),
            "no" | "n" | "false" | "" => Ok(false),
            _ => Err(D::Error::custom(format!("无法识别的标记值: {}", s))),
        },
        other => Err(D::Error::custom(format!("无法识别的标记值: {}", other))),
    }
}
