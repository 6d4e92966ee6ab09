use std::path::PathBuf;

use serde::Serialize;

/// 单个订单的失败记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobFailure {
    pub order_id: String,
    pub reason: String,
}

impl JobFailure {
    pub fn new(order_id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            order_id: order_id.into(),
            reason: reason.to_string(),
        }
    }
}

/// 成功生成的标签
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelOutput {
    pub order_id: String,
    pub path: PathBuf,
    /// 对应订单文件中的记录序号
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_index: Option<usize>,
}

/// 批次处理结果
///
/// 完成顺序不固定，[`BatchResult::finish`] 之后按订单号排序。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchResult {
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<JobFailure>,
    pub outputs: Vec<LabelOutput>,
}

impl BatchResult {
    pub fn record_success(&mut self, output: LabelOutput) {
        self.succeeded += 1;
        self.outputs.push(output);
    }

    pub fn record_failure(&mut self, failure: JobFailure) {
        self.failed += 1;
        self.failures.push(failure);
    }

    /// 合并另一个结果（例如加载阶段被拒绝的订单）
    pub fn merge(&mut self, other: BatchResult) {
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.failures.extend(other.failures);
        self.outputs.extend(other.outputs);
    }

    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    /// 成功的订单号
    pub fn succeeded_ids(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(|o| o.order_id.as_str())
    }

    /// 成功订单在订单文件中的记录序号
    pub fn succeeded_records(&self) -> impl Iterator<Item = usize> + '_ {
        self.outputs.iter().filter_map(|o| o.record_index)
    }

    /// 失败的订单号
    pub fn failed_ids(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.order_id.as_str())
    }

    /// 排序后返回
    pub fn finish(mut self) -> Self {
        self.failures.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        self.outputs.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        self
    }
}
