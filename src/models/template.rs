//! 标签模板
//!
//! 模板以 TOML 描述：页面尺寸、若干文本元素（可包含 `{field}` 占位符）和一个条码区域。
//! 坐标单位为毫米，原点位于页面左下角。

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// PDF 内置字体名称
pub const SUPPORTED_FONTS: [&str; 6] = [
    "Helvetica",
    "Helvetica-Bold",
    "Times-Roman",
    "Times-Bold",
    "Courier",
    "Courier-Bold",
];

/// 磅转毫米
pub const PT_TO_MM: f32 = 0.352_778;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("占位符正则无效"))
}

/// 标签模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelTemplate {
    #[serde(default = "default_name")]
    pub name: String,
    pub width_mm: f32,
    pub height_mm: f32,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default, rename = "text")]
    pub texts: Vec<TextElement>,
    pub barcode: BarcodeBox,
}

/// 文本元素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    /// 文本内容，`{field}` 会被替换为订单字段
    pub content: String,
    pub x_mm: f32,
    pub y_mm: f32,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

/// 条码区域
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarcodeBox {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    /// 是否在条码下方打印可读文本
    #[serde(default = "default_true")]
    pub human_readable: bool,
    #[serde(default = "default_font_size")]
    pub font_size: f32,
}

fn default_name() -> String {
    "label".to_string()
}

fn default_font() -> String {
    "Helvetica".to_string()
}

fn default_font_size() -> f32 {
    7.5
}

fn default_true() -> bool {
    true
}

/// 模板中的一段内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Field(&'a str),
}

/// 将文本拆分为字面量和占位符
pub fn segments(content: &str) -> Vec<Segment<'_>> {
    let mut result = Vec::new();
    let mut last = 0;
    for caps in placeholder_regex().captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            result.push(Segment::Literal(&content[last..whole.start()]));
        }
        result.push(Segment::Field(name.as_str()));
        last = whole.end();
    }
    if last < content.len() {
        result.push(Segment::Literal(&content[last..]));
    }
    result
}

impl LabelTemplate {
    /// 模板引用的所有字段名
    pub fn placeholders(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .texts
            .iter()
            .flat_map(|t| segments(&t.content))
            .filter_map(|s| match s {
                Segment::Field(name) => Some(name),
                Segment::Literal(_) => None,
            })
            .collect();
        fields.sort_unstable();
        fields.dedup();
        fields
    }

    /// 检查模板的几何和文本是否合法，返回第一个问题的描述
    pub fn check(&self) -> Result<(), String> {
        if !(self.width_mm > 0.0 && self.height_mm > 0.0) {
            return Err(format!(
                "页面尺寸必须为正数: {} x {} mm",
                self.width_mm, self.height_mm
            ));
        }
        if !SUPPORTED_FONTS.contains(&self.font.as_str()) {
            return Err(format!(
                "不支持的字体 {}，可选: {}",
                self.font,
                SUPPORTED_FONTS.join(", ")
            ));
        }

        let b = &self.barcode;
        if !(b.width_mm > 0.0 && b.height_mm > 0.0) {
            return Err("条码区域尺寸必须为正数".to_string());
        }
        if b.x_mm < 0.0
            || b.y_mm < 0.0
            || b.x_mm + b.width_mm > self.width_mm
            || b.y_mm + b.height_mm > self.height_mm
        {
            return Err("条码区域超出页面范围".to_string());
        }
        if b.human_readable && b.font_size * PT_TO_MM + 1.0 >= b.height_mm {
            return Err("条码区域过低，放不下可读文本".to_string());
        }

        for (idx, text) in self.texts.iter().enumerate() {
            if text.font_size <= 0.0 {
                return Err(format!("第 {} 个文本元素字号必须为正数", idx + 1));
            }
            if text.x_mm < 0.0
                || text.y_mm < 0.0
                || text.x_mm > self.width_mm
                || text.y_mm > self.height_mm
            {
                return Err(format!("第 {} 个文本元素超出页面范围", idx + 1));
            }
            let stray_brace = segments(&text.content).iter().any(|s| {
                matches!(s, Segment::Literal(lit) if lit.contains('{') || lit.contains('}'))
            });
            if stray_brace {
                return Err(format!(
                    "第 {} 个文本元素包含无法识别的占位符: {}",
                    idx + 1,
                    text.content
                ));
            }
        }
        Ok(())
    }

    /// 初始模板（100 x 60 mm）
    pub fn starter() -> Self {
        Self {
            name: "default".to_string(),
            width_mm: 100.0,
            height_mm: 60.0,
            font: default_font(),
            texts: vec![
                TextElement {
                    content: "Bestelling/positie: {id}/{position_short}".to_string(),
                    x_mm: 5.0,
                    y_mm: 22.0,
                    font_size: 7.5,
                },
                TextElement {
                    content: "Ontvangsdatum: {order_date}".to_string(),
                    x_mm: 5.0,
                    y_mm: 17.0,
                    font_size: 7.5,
                },
                TextElement {
                    content: "{recipient}".to_string(),
                    x_mm: 5.0,
                    y_mm: 10.0,
                    font_size: 10.0,
                },
                TextElement {
                    content: "{destination}".to_string(),
                    x_mm: 5.0,
                    y_mm: 5.0,
                    font_size: 9.0,
                },
            ],
            barcode: BarcodeBox {
                x_mm: 28.0,
                y_mm: 40.0,
                width_mm: 67.0,
                height_mm: 15.0,
                human_readable: true,
                font_size: 7.5,
            },
        }
    }
}
