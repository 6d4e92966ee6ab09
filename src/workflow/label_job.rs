//! 标签任务 - 流程层
//!
//! 定义"一个订单"的完整处理流程：
//! 校验订单号 → 选择模板 → 编码条码 → 计算版面 → 渲染 PDF → 写文件

use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info};

use crate::error::AppResult;
use crate::models::{JobFailure, LabelOutput, Order};
use crate::services::LabelLayout;
use crate::workflow::job_ctx::JobContext;

/// 单个任务的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded(LabelOutput),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn order_id(&self) -> &str {
        match self {
            JobOutcome::Succeeded(output) => &output.order_id,
            JobOutcome::Failed(failure) => &failure.order_id,
        }
    }
}

/// 标签任务：一个订单对应一个任务，由一个工作线程消费
#[derive(Debug, Clone)]
pub struct LabelJob {
    /// 订单在批次中的序号（从1开始，仅用于日志显示）
    pub index: usize,
    pub order: Order,
}

impl LabelJob {
    pub fn new(index: usize, order: Order) -> Self {
        Self { index, order }
    }

    pub fn order_id(&self) -> &str {
        &self.order.id
    }

    /// 计算版面（不写文件）
    pub fn layout(&self, ctx: &JobContext) -> AppResult<LabelLayout> {
        let order = &self.order;
        order.validate_id()?;
        let template = ctx.templates.resolve(order)?;
        let barcode = ctx.barcodes.encode(&order.barcode_payload()?)?;
        ctx.renderer.layout(&template, order, &barcode)
    }

    /// 生成标签文件
    pub fn run(&self, ctx: &JobContext) -> AppResult<PathBuf> {
        let layout = self.layout(ctx)?;
        let pdf = ctx.renderer.render_pdf(&layout)?;
        ctx.writer.write(self.order_id(), &pdf)
    }

    /// 执行任务并记录日志，错误不会向外传播
    pub fn execute(self, ctx: &JobContext) -> JobOutcome {
        let started = Instant::now();
        debug!("[订单 {}] 开始处理 (#{})", self.order.id, self.index);

        match self.run(ctx) {
            Ok(path) => {
                info!(
                    "[订单 {}] ✓ 标签已生成: {} ({} ms)",
                    self.order.id,
                    path.display(),
                    started.elapsed().as_millis()
                );
                JobOutcome::Succeeded(LabelOutput {
                    order_id: self.order.id,
                    path,
                    record_index: self.order.record_index,
                })
            }
            Err(e) => {
                error!("[订单 {}] ❌ 标签生成失败: {}", self.order.id, e);
                JobOutcome::Failed(JobFailure::new(self.order.id, e))
            }
        }
    }
}
