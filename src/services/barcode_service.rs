//! 条码服务 - 业务能力层
//!
//! 只负责把条码内容编码为条/空模块，不关心模板和 PDF

use barcoders::sym::code128::Code128;
use barcoders::sym::code39::Code39;
use barcoders::sym::ean13::EAN13;

use crate::config::BarcodeFormat;
use crate::error::OrderDataError;

/// Code 128 字符集 B 的前缀字符
const CODE128_SET_B: char = '\u{0181}';

/// 编码后的条码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    /// 条码下方显示的内容
    pub text: String,
    pub format: BarcodeFormat,
    /// 1 为条，0 为空
    pub modules: Vec<u8>,
}

impl Barcode {
    pub fn module_count(&self) -> usize {
        self.modules.len()
    }

    /// 连续的条：(起始模块, 宽度)
    pub fn bars(&self) -> Vec<(usize, usize)> {
        let mut bars = Vec::new();
        let mut start = None;
        for (idx, module) in self.modules.iter().enumerate() {
            match (*module, start) {
                (1, None) => start = Some(idx),
                (0, Some(s)) => {
                    bars.push((s, idx - s));
                    start = None;
                }
                _ => {}
            }
        }
        if let Some(s) = start {
            bars.push((s, self.modules.len() - s));
        }
        bars
    }
}

/// 条码服务
#[derive(Debug, Clone, Copy)]
pub struct BarcodeService {
    format: BarcodeFormat,
}

impl BarcodeService {
    pub fn new(format: BarcodeFormat) -> Self {
        Self { format }
    }

    /// 编码条码内容
    pub fn encode(&self, payload: &str) -> Result<Barcode, OrderDataError> {
        if payload.trim().is_empty() {
            return Err(OrderDataError::EmptyCode);
        }

        let unencodable = |reason: String| OrderDataError::Unencodable {
            code: payload.to_string(),
            format: self.format.to_string(),
            reason,
        };

        let (text, modules) = match self.format {
            BarcodeFormat::Code39 => {
                // Code 39 只有大写字母
                let text = payload.to_ascii_uppercase();
                let modules = Code39::new(text.clone())
                    .map_err(|e| unencodable(e.to_string()))?
                    .encode();
                (text, modules)
            }
            BarcodeFormat::Code128 => {
                if !payload.chars().all(|c| (' '..='~').contains(&c)) {
                    return Err(unencodable("只支持可打印 ASCII 字符".to_string()));
                }
                let data = format!("{}{}", CODE128_SET_B, payload);
                let modules = Code128::new(data)
                    .map_err(|e| unencodable(e.to_string()))?
                    .encode();
                (payload.to_string(), modules)
            }
            BarcodeFormat::Ean13 => {
                let digits = ean13_digits(payload).map_err(unencodable)?;
                let modules = EAN13::new(digits.clone())
                    .map_err(|e| unencodable(e.to_string()))?
                    .encode();
                (format!("{}{}", digits, ean13_check_digit(&digits)), modules)
            }
        };

        Ok(Barcode {
            text,
            format: self.format,
            modules,
        })
    }
}

/// EAN-13 接受 12 位数字，或校验位正确的 13 位数字；返回前 12 位
fn ean13_digits(payload: &str) -> Result<String, String> {
    if !payload.chars().all(|c| c.is_ascii_digit()) {
        return Err("只能包含数字".to_string());
    }
    match payload.len() {
        12 => Ok(payload.to_string()),
        13 => {
            let (data, check) = payload.split_at(12);
            if check == ean13_check_digit(data).to_string() {
                Ok(data.to_string())
            } else {
                Err("校验位错误".to_string())
            }
        }
        n => Err(format!("长度应为 12 或 13 位，实际为 {} 位", n)),
    }
}

fn ean13_check_digit(data: &str) -> u32 {
    let sum: u32 = data
        .chars()
        .filter_map(|c| c.to_digit(10))
        .enumerate()
        .map(|(idx, d)| if idx % 2 == 0 { d } else { d * 3 })
        .sum();
    (10 - sum % 10) % 10
}
