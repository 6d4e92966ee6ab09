//! 标签写入服务 - 业务能力层
//!
//! 只负责把一张标签写到 `<output_dir>/<order_id>.pdf`，不关心流程

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{AppError, AppResult};

/// 标签写入服务
///
/// 先写同目录下的临时文件，刷盘后再重命名，保证目标文件要么不存在、要么完整。
#[derive(Debug, Clone)]
pub struct LabelWriter {
    output_dir: PathBuf,
}

impl LabelWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// 订单对应的输出路径
    pub fn output_path(&self, order_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.pdf", order_id))
    }

    /// 写入标签，返回最终路径
    pub fn write(&self, order_id: &str, pdf: &[u8]) -> AppResult<PathBuf> {
        let target = self.output_path(order_id);
        let tmp = self.output_dir.join(format!(".{}.pdf.tmp", order_id));

        debug!("写入标签: {} ({} 字节)", target.display(), pdf.len());

        let result = fs::File::create(&tmp)
            .and_then(|mut file| {
                file.write_all(pdf)?;
                file.sync_all()
            })
            .map_err(|e| AppError::file_write_failed(&tmp, e))
            .and_then(|_| {
                fs::rename(&tmp, &target).map_err(|e| AppError::file_write_failed(&target, e))
            });

        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map(|_| target)
    }
}
