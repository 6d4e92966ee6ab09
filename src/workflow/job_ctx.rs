//! 标签任务上下文
//!
//! 所有工作线程共享的只读资源

use std::sync::Arc;

use crate::config::Config;
use crate::models::TemplateSource;
use crate::services::{BarcodeService, LabelRenderer, LabelWriter};

/// 标签任务上下文
///
/// 创建后不再修改，通过 `Arc` 在工作线程间共享。
#[derive(Debug)]
pub struct JobContext {
    pub config: Arc<Config>,
    pub templates: TemplateSource,
    pub barcodes: BarcodeService,
    pub renderer: LabelRenderer,
    pub writer: LabelWriter,
}

impl JobContext {
    pub fn new(config: Arc<Config>, templates: TemplateSource) -> Self {
        Self {
            barcodes: BarcodeService::new(config.barcode_format),
            renderer: LabelRenderer::new(),
            writer: LabelWriter::new(config.output_dir.clone()),
            templates,
            config,
        }
    }
}
