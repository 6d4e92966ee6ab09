//! 批量标签处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量订单的处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：打开模板、创建工作线程池
//! 2. **批量加载**：读取订单文件（`Vec<Order>`）
//! 3. **并发控制**：固定大小的线程池 + 有界任务队列
//! 4. **结果汇总**：单个收集者从结果通道汇总 `BatchResult`
//! 5. **资源管理**：持有线程池，确保生命周期正确
//! 6. **回写订单**：可选地把已生成标签的订单标记为已处理
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个订单的细节，委托给 `workflow::LabelJob`
//! - **失败隔离**：单个订单失败只记录，不影响其他订单

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use crossbeam::channel;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppResult, OrderDataError};
use crate::models::loaders::{load_orders, mark_orders_processed};
use crate::models::{BatchResult, JobFailure, Order, TemplateSource};
use crate::orchestrator::worker_pool::WorkerPool;
use crate::utils::logging::{log_batch_complete, log_orders_loaded, log_startup, print_final_stats};
use crate::workflow::{JobContext, JobOutcome, LabelJob};

/// 批量标签处理器
///
/// 借用调用方创建的线程池，自身不持有线程。
pub struct LabelBatchProcessor<'a> {
    context: Arc<JobContext>,
    pool: &'a WorkerPool,
}

impl<'a> LabelBatchProcessor<'a> {
    pub fn new(context: Arc<JobContext>, pool: &'a WorkerPool) -> Self {
        Self { context, pool }
    }

    /// 为每个订单生成一张标签
    ///
    /// 重复的订单号（不区分大小写）只处理第一次出现的订单，其余记为失败。
    pub fn generate_all(&self, orders: Vec<Order>) -> BatchResult {
        let mut result = BatchResult::default();
        let (outcome_tx, outcome_rx) = channel::unbounded::<JobOutcome>();
        let mut seen = HashSet::new();
        let mut pending = HashSet::new();

        for (idx, order) in orders.into_iter().enumerate() {
            if !seen.insert(order.output_key()) {
                let err = OrderDataError::DuplicateId {
                    id: order.id.clone(),
                };
                error!("[订单 {}] ❌ {}", order.id, err);
                result.record_failure(JobFailure::new(order.id, err));
                continue;
            }

            let job = LabelJob::new(idx + 1, order);
            let order_id = job.order_id().to_string();
            let context = Arc::clone(&self.context);
            let tx = outcome_tx.clone();

            match self.pool.execute(move || {
                let outcome = job.execute(&context);
                let _ = tx.send(outcome);
            }) {
                Ok(()) => {
                    pending.insert(order_id);
                }
                Err(e) => {
                    error!("[订单 {}] ❌ 无法提交任务: {}", order_id, e);
                    result.record_failure(JobFailure::new(order_id, e));
                }
            }
        }

        // 所有发送端随任务结束而释放，收集循环随之结束
        drop(outcome_tx);
        for outcome in outcome_rx.iter() {
            pending.remove(outcome.order_id());
            match outcome {
                JobOutcome::Succeeded(output) => result.record_success(output),
                JobOutcome::Failed(failure) => result.record_failure(failure),
            }
        }

        // 任务 panic 时没有结果
        for order_id in pending {
            error!("[订单 {}] ❌ 任务异常终止", order_id);
            result.record_failure(JobFailure::new(order_id, "任务异常终止"));
        }

        result.finish()
    }
}

/// 用配置中的线程数创建线程池并处理全部订单
///
/// 模板在启动时加载，模板错误直接返回。
pub fn generate_all(config: Arc<Config>, orders: Vec<Order>) -> AppResult<BatchResult> {
    let templates = TemplateSource::open_blocking(&config.template_path)?;
    let pool = WorkerPool::new(config.thread_count)?;
    let context = Arc::new(JobContext::new(config, templates));
    let result = LabelBatchProcessor::new(context, &pool).generate_all(orders);
    pool.shutdown();
    Ok(result)
}

/// 应用主结构
pub struct App {
    config: Arc<Config>,
    context: Arc<JobContext>,
    pool: WorkerPool,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let templates = TemplateSource::open(&config.template_path)
            .await
            .context("无法加载标签模板")?;
        let pool = WorkerPool::new(config.thread_count)?;
        let config = Arc::new(config);
        let context = Arc::new(JobContext::new(Arc::clone(&config), templates));

        Ok(Self {
            config,
            context,
            pool,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(self) -> Result<BatchResult> {
        info!("\n📁 正在读取订单: {}", self.config.order_source_path.display());
        let batch = load_orders(&self.config.order_source_path)
            .await
            .context("无法读取订单文件")?;

        log_orders_loaded(
            batch.orders.len(),
            batch.skipped,
            batch.rejected.failed,
            self.config.thread_count,
        );

        let mut result = batch.rejected;
        if batch.orders.is_empty() {
            warn!("⚠️ 没有待处理的订单，程序结束");
            self.pool.shutdown();
            print_final_stats(&result);
            return Ok(result);
        }

        let App {
            config,
            context,
            pool,
        } = self;
        let orders = batch.orders;
        let processed = tokio::task::spawn_blocking(move || {
            let result = LabelBatchProcessor::new(context, &pool).generate_all(orders);
            pool.shutdown();
            result
        })
        .await
        .context("批处理任务异常终止")?;

        log_batch_complete(&processed);
        result.merge(processed);
        let result = result.finish();

        let records: HashSet<usize> = result.succeeded_records().collect();
        if config.mark_processed && !records.is_empty() {
            match mark_orders_processed(&config.order_source_path, &records).await {
                Ok(updated) => info!("📝 已回写订单文件: {} 条记录标记为已生成", updated),
                Err(e) => error!("❌ 回写订单文件失败: {}", e),
            }
        }

        print_final_stats(&result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LabelTemplate;
    use std::path::Path;

    fn context(output_dir: &Path) -> Arc<JobContext> {
        let mut config = Config::starter();
        config.output_dir = output_dir.to_path_buf();
        let mut template = LabelTemplate::starter();
        template.texts.truncate(1);
        Arc::new(JobContext::new(
            Arc::new(config),
            TemplateSource::Single(Arc::new(template)),
        ))
    }

    fn order(id: &str, code: &str) -> Order {
        let mut order = Order::new(id, code);
        order.position = Some(1);
        order
    }

    #[test]
    fn test_one_bad_order_among_valid_ones() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let orders = vec![order("A1", "111"), order("A2", ""), order("A3", "333")];

        let result = LabelBatchProcessor::new(context(dir.path()), &pool).generate_all(orders);
        pool.shutdown();

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(result.failures[0].order_id, "A2");
        assert!(dir.path().join("A1.pdf").is_file());
        assert!(dir.path().join("A3.pdf").is_file());
        assert!(!dir.path().join("A2.pdf").exists());
    }

    #[test]
    fn test_duplicate_ids_write_once() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::new(4).unwrap();
        let orders = vec![order("A1", "111"), order("A1", "222")];

        let result = LabelBatchProcessor::new(context(dir.path()), &pool).generate_all(orders);

        assert_eq!(result.succeeded, 1);
        assert_eq!(result.failed, 1);
        assert!(result.failures[0].reason.contains("重复"));
    }

    #[test]
    fn test_ids_differing_only_in_case_are_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::new(4).unwrap();
        let mut first = order("A1", "111");
        first.record_index = Some(0);
        let mut second = order("a1", "222");
        second.record_index = Some(1);

        let result =
            LabelBatchProcessor::new(context(dir.path()), &pool).generate_all(vec![first, second]);

        assert_eq!(result.succeeded_ids().collect::<Vec<_>>(), vec!["A1"]);
        assert_eq!(result.succeeded_records().collect::<Vec<_>>(), vec![0]);
        assert_eq!(result.failed_ids().collect::<Vec<_>>(), vec!["a1"]);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::new(1).unwrap();
        let result = LabelBatchProcessor::new(context(dir.path()), &pool).generate_all(Vec::new());
        assert_eq!(result, BatchResult::default());
    }

    #[test]
    fn test_pool_is_reusable_across_batches() {
        let dir = tempfile::tempdir().unwrap();
        let pool = WorkerPool::new(2).unwrap();
        let processor = LabelBatchProcessor::new(context(dir.path()), &pool);

        let first = processor.generate_all(vec![order("A1", "1")]);
        let second = processor.generate_all(vec![order("B1", "2")]);
        assert_eq!(first.succeeded, 1);
        assert_eq!(second.succeeded, 1);
    }
}
