//! # Label Generator
//!
//! 一个从订单列表批量生成带条码 PDF 标签的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 订单、模板、批次结果，以及对应的加载器
//! - `TemplateSource` - 单个模板，或按 SKU 查找模板的目录
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单个订单
//! - `BarcodeService` - 条码编码能力
//! - `LabelRenderer` - 版面计算和 PDF 渲染能力
//! - `LabelWriter` - 写 PDF 文件能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个订单"的完整处理流程
//! - `JobContext` - 工作线程共享的只读上下文
//! - `LabelJob` - 流程编排（模板 → 条码 → 版面 → PDF → 文件）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量处理器，管理资源和并发
//! - `orchestrator/worker_pool` - 固定大小的工作线程池
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod setup;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{BarcodeFormat, Config};
pub use error::{AppError, AppResult};
pub use models::{BatchResult, JobFailure, Order};
pub use orchestrator::{generate_all, App, LabelBatchProcessor, WorkerPool};
pub use workflow::{JobContext, JobOutcome, LabelJob};
