use std::collections::HashSet;
use std::path::Path;

use serde_json::Value as JsonValue;
use tokio::fs;
use tracing::{info, warn};

use crate::error::{AppError, AppResult, FileError, OrderDataError};
use crate::models::batch_result::{BatchResult, JobFailure};
use crate::models::order::Order;

/// 订单文件的加载结果
#[derive(Debug, Default)]
pub struct OrderBatch {
    /// 待处理的订单
    pub orders: Vec<Order>,
    /// 无法解析的记录，记为失败
    pub rejected: BatchResult,
    /// 已生成过标签而跳过的订单数
    pub skipped: usize,
}

/// 记录的标识：优先使用其中的 `id`，否则使用序号
fn record_label(index: usize, value: &JsonValue) -> String {
    match value.get("id") {
        Some(JsonValue::String(s)) if !s.is_empty() => s.clone(),
        Some(JsonValue::Number(n)) => n.to_string(),
        _ => format!("#{}", index + 1),
    }
}

fn read_records(content: &str, path: &Path) -> AppResult<Vec<JsonValue>> {
    serde_json::from_str(content).map_err(|source| {
        AppError::File(FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        })
    })
}

/// 解析订单 JSON 数组
///
/// 单条记录解析失败不会影响其他记录。
pub fn parse_orders(content: &str, path: &Path) -> AppResult<OrderBatch> {
    let records = read_records(content, path)?;
    let mut batch = OrderBatch::default();

    for (index, record) in records.into_iter().enumerate() {
        let label = record_label(index, &record);
        match serde_json::from_value::<Order>(record) {
            Ok(order) if order.labels_created => {
                batch.skipped += 1;
            }
            Ok(mut order) => {
                order.record_index = Some(index);
                batch.orders.push(order);
            }
            Err(e) => {
                let err = OrderDataError::Malformed {
                    record: label.clone(),
                    reason: e.to_string(),
                };
                warn!("⚠️ 跳过无法解析的订单记录 {}: {}", label, err);
                batch.rejected.record_failure(JobFailure::new(label, err));
            }
        }
    }

    Ok(batch)
}

/// 从文件加载订单
pub async fn load_orders(path: &Path) -> AppResult<OrderBatch> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path, e))?;
    let batch = parse_orders(&content, path)?;
    info!(
        "成功加载 {} 个订单（跳过已生成 {} 个，无法解析 {} 个）",
        batch.orders.len(),
        batch.skipped,
        batch.rejected.failed
    );
    Ok(batch)
}

/// 回写订单文件：将指定序号记录的 `labels_created` 置为 true
///
/// 按加载时的记录序号定位，订单号重复或缺失的记录不会被误标记。
/// 先写临时文件再替换，返回被更新的记录数。
pub async fn mark_orders_processed(path: &Path, records: &HashSet<usize>) -> AppResult<usize> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path, e))?;
    let mut updated = 0;
    let mut values = read_records(&content, path)?;
    for (index, value) in values.iter_mut().enumerate() {
        if !records.contains(&index) {
            continue;
        }
        if let Some(object) = value.as_object_mut() {
            object.insert("labels_created".to_string(), JsonValue::Bool(true));
            updated += 1;
        }
    }

    let json = serde_json::to_string_pretty(&values).map_err(|source| {
        AppError::File(FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        })
    })?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json + "\n")
        .await
        .map_err(|e| AppError::file_write_failed(&tmp, e))?;
    fs::rename(&tmp, path)
        .await
        .map_err(|e| AppError::file_write_failed(path, e))?;

    Ok(updated)
}

/// 写入示例订单文件
pub async fn write_sample_orders(path: &Path) -> AppResult<()> {
    let sample = serde_json::json!([
        {
            "id": "A1",
            "code": "12345",
            "recipient": "J. Jansen",
            "destination": "Amsterdam",
            "position": 1,
            "order_date": "01.02.2024"
        },
        {
            "id": "A2",
            "position": 2,
            "recipient": "P. de Vries",
            "destination": "Utrecht",
            "order_date": "2024-02-01"
        }
    ]);
    let json = serde_json::to_string_pretty(&sample).map_err(|source| {
        AppError::File(FileError::JsonParseFailed {
            path: path.display().to_string(),
            source,
        })
    })?;
    fs::write(path, json + "\n")
        .await
        .map_err(|e| AppError::file_write_failed(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_orders_skips_and_rejects() {
        let content = r#"[
            {"id": "A1", "code": "12345"},
            {"id": "A2", "code": "1", "labels_created": "Yes"},
            {"code": "999"},
            {"id": "A4", "position": "x"},
            "not an object"
        ]"#;
        let batch = parse_orders(content, Path::new("orders.json")).unwrap();
        assert_eq!(batch.orders.len(), 1);
        assert_eq!(batch.orders[0].id, "A1");
        assert_eq!(batch.orders[0].record_index, Some(0));
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.rejected.failed, 3);
        let ids: Vec<&str> = batch.rejected.failed_ids().collect();
        assert_eq!(ids, vec!["#3", "A4", "#5"]);
    }

    #[test]
    fn test_parse_orders_requires_array() {
        let err = parse_orders(r#"{"id": "A1"}"#, Path::new("orders.json")).unwrap_err();
        assert!(matches!(err, AppError::File(FileError::JsonParseFailed { .. })));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_orders(&dir.path().join("orders.json")).await.unwrap_err();
        assert!(matches!(err, AppError::File(FileError::ReadFailed { .. })));
    }

    #[tokio::test]
    async fn test_mark_orders_processed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(
            &path,
            r#"[{"id": "A1", "code": "1", "note": "keep"}, {"id": 42, "code": "2"}, {"id": "A3", "code": "3"}]"#,
        )
        .unwrap();

        let records: HashSet<usize> = [0, 1].into_iter().collect();
        let updated = mark_orders_processed(&path, &records).await.unwrap();
        assert_eq!(updated, 2);

        let batch = load_orders(&path).await.unwrap();
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.orders.len(), 1);
        assert_eq!(batch.orders[0].id, "A3");

        let raw: JsonValue = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["note"], "keep");
        assert!(!dir.path().join("orders.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_mark_only_touches_given_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        std::fs::write(
            &path,
            r##"[{"id": "A5", "code": "555"}, {"id": "A5", "code": "556"}, {"code": "999"}, {"id": "#3", "code": "3"}]"##,
        )
        .unwrap();

        // 第二个 A5 因订单号重复失败，无订单号的记录无法解析
        let batch = load_orders(&path).await.unwrap();
        let indexes: Vec<Option<usize>> = batch.orders.iter().map(|o| o.record_index).collect();
        assert_eq!(indexes, vec![Some(0), Some(1), Some(3)]);
        assert_eq!(batch.rejected.failed_ids().collect::<Vec<_>>(), vec!["#3"]);

        let succeeded: HashSet<usize> = [0, 3].into_iter().collect();
        let updated = mark_orders_processed(&path, &succeeded).await.unwrap();
        assert_eq!(updated, 2);

        let raw: JsonValue = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw[0]["labels_created"], true);
        assert!(raw[1].get("labels_created").is_none());
        assert!(raw[2].get("labels_created").is_none());
        assert_eq!(raw[3]["labels_created"], true);
    }

    #[tokio::test]
    async fn test_sample_orders_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("orders.json");
        write_sample_orders(&path).await.unwrap();
        let batch = load_orders(&path).await.unwrap();
        assert_eq!(batch.orders.len(), 2);
        assert_eq!(batch.orders[1].barcode_payload().unwrap(), "00A20000200");
    }
}
