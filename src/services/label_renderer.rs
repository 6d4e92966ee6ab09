//! 标签渲染服务 - 业务能力层
//!
//! 分两步：
//! 1. `layout`：模板 + 订单 + 条码 → [`LabelLayout`]（纯计算，相同输入得到相同结果）
//! 2. `render_pdf`：[`LabelLayout`] → PDF 字节

use printpdf::{BuiltinFont, Mm, PdfDocument, Rect};

use crate::error::{AppError, AppResult, OrderDataError, TemplateError};
use crate::models::order::Order;
use crate::models::template::{segments, LabelTemplate, Segment, PT_TO_MM};
use crate::services::barcode_service::Barcode;

/// 可读文本与条之间的间距
const HUMAN_READABLE_GAP_MM: f32 = 1.0;
/// Helvetica 平均字宽（相对字号）
const AVG_CHAR_WIDTH: f32 = 0.55;

/// 已定位的文本
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x_mm: f32,
    pub y_mm: f32,
    pub font_size: f32,
}

/// 条码中的一根条
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
}

/// 一张标签的完整版面
#[derive(Debug, Clone, PartialEq)]
pub struct LabelLayout {
    pub title: String,
    pub width_mm: f32,
    pub height_mm: f32,
    pub font: String,
    pub texts: Vec<PlacedText>,
    pub bars: Vec<BarRect>,
}

/// 用订单字段替换文本中的占位符
pub fn fill_placeholders(content: &str, order: &Order) -> AppResult<String> {
    let mut out = String::with_capacity(content.len());
    for segment in segments(content) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Field(name) => {
                let value = order.field(name)?.ok_or_else(|| TemplateError::FieldMissing {
                    field: name.to_string(),
                })?;
                out.push_str(&value);
            }
        }
    }
    Ok(out)
}

/// 内置字体按 WinAnsi 编码输出，只接受其中与 Latin-1 一致的可打印字符
fn unsupported_char(text: &str) -> Option<char> {
    text.chars().find(|c| !matches!(*c, ' '..='~' | '\u{A0}'..='\u{FF}'))
}

fn builtin_font(name: &str) -> Option<BuiltinFont> {
    match name {
        "Helvetica" => Some(BuiltinFont::Helvetica),
        "Helvetica-Bold" => Some(BuiltinFont::HelveticaBold),
        "Times-Roman" => Some(BuiltinFont::TimesRoman),
        "Times-Bold" => Some(BuiltinFont::TimesBold),
        "Courier" => Some(BuiltinFont::Courier),
        "Courier-Bold" => Some(BuiltinFont::CourierBold),
        _ => None,
    }
}

/// 标签渲染器
#[derive(Debug, Clone, Copy, Default)]
pub struct LabelRenderer;

impl LabelRenderer {
    pub fn new() -> Self {
        Self
    }

    /// 计算版面
    pub fn layout(
        &self,
        template: &LabelTemplate,
        order: &Order,
        barcode: &Barcode,
    ) -> AppResult<LabelLayout> {
        let mut texts = Vec::with_capacity(template.texts.len() + 1);
        for element in &template.texts {
            texts.push(PlacedText {
                text: fill_placeholders(&element.content, order)?,
                x_mm: element.x_mm,
                y_mm: element.y_mm,
                font_size: element.font_size,
            });
        }

        let area = &template.barcode;
        let text_band = if area.human_readable {
            area.font_size * PT_TO_MM + HUMAN_READABLE_GAP_MM
        } else {
            0.0
        };
        let bar_height = area.height_mm - text_band;
        let module_width = area.width_mm / barcode.module_count().max(1) as f32;

        let bars = barcode
            .bars()
            .into_iter()
            .map(|(start, width)| BarRect {
                x_mm: area.x_mm + start as f32 * module_width,
                y_mm: area.y_mm + text_band,
                width_mm: width as f32 * module_width,
                height_mm: bar_height,
            })
            .collect();

        if area.human_readable {
            let text_width =
                barcode.text.chars().count() as f32 * area.font_size * AVG_CHAR_WIDTH * PT_TO_MM;
            texts.push(PlacedText {
                text: barcode.text.clone(),
                x_mm: area.x_mm + ((area.width_mm - text_width) / 2.0).max(0.0),
                y_mm: area.y_mm,
                font_size: area.font_size,
            });
        }

        // 无法编码的字符会被静默丢弃，这里直接判为失败
        for placed in &texts {
            if let Some(ch) = unsupported_char(&placed.text) {
                return Err(OrderDataError::UnsupportedText {
                    text: placed.text.clone(),
                    font: template.font.clone(),
                    ch,
                }
                .into());
            }
        }

        Ok(LabelLayout {
            title: format!("{} {}", template.name, order.id),
            width_mm: template.width_mm,
            height_mm: template.height_mm,
            font: template.font.clone(),
            texts,
            bars,
        })
    }

    /// 将版面渲染为 PDF
    pub fn render_pdf(&self, layout: &LabelLayout) -> AppResult<Vec<u8>> {
        let font = builtin_font(&layout.font)
            .ok_or_else(|| AppError::render_failed(format!("不支持的字体: {}", layout.font)))?;

        let (doc, page, layer) = PdfDocument::new(
            layout.title.as_str(),
            Mm(layout.width_mm),
            Mm(layout.height_mm),
            "label",
        );
        let canvas = doc.get_page(page).get_layer(layer);
        let font = doc
            .add_builtin_font(font)
            .map_err(|e| AppError::render_failed(e.to_string()))?;

        for text in &layout.texts {
            canvas.use_text(
                text.text.clone(),
                text.font_size,
                Mm(text.x_mm),
                Mm(text.y_mm),
                &font,
            );
        }
        for bar in &layout.bars {
            canvas.add_rect(Rect::new(
                Mm(bar.x_mm),
                Mm(bar.y_mm),
                Mm(bar.x_mm + bar.width_mm),
                Mm(bar.y_mm + bar.height_mm),
            ));
        }

        doc.save_to_bytes()
            .map_err(|e| AppError::render_failed(e.to_string()))
    }
}
