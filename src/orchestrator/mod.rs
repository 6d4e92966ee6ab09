//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和并发调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量标签处理器
//! - 管理应用生命周期（初始化、运行、清理）
//! - 批量加载订单（Vec<Order>）
//! - 分发任务、汇总 BatchResult
//! - 输出全局统计信息，可选回写订单文件
//!
//! ### `worker_pool` - 工作线程池
//! - 固定数量的线程
//! - 有界任务队列
//! - 显式关闭（shutdown / drop）
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Order>)
//!     ↓  worker_pool
//! workflow::LabelJob (处理单个 Order)
//!     ↓
//! services (能力层：barcode / renderer / writer)
//! ```

pub mod batch_processor;
pub mod worker_pool;

// 重新导出主要类型
pub use batch_processor::{generate_all, App, LabelBatchProcessor};
pub use worker_pool::WorkerPool;
