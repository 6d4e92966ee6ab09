//! 固定大小的工作线程池
//!
//! - 任务队列有界（容量为线程数的两倍），队列满时 `execute` 阻塞
//! - 每个线程循环从共享队列取任务，队列关闭后退出
//! - 单个任务 panic 只影响该任务，线程继续工作

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use tracing::{debug, error};

use crate::error::{AppError, AppResult, ConfigError};

type Task = Box<dyn FnOnce() + Send + 'static>;

struct Worker {
    id: usize,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(id: usize, receiver: Receiver<Task>) -> AppResult<Self> {
        let handle = thread::Builder::new()
            .name(format!("label-worker-{}", id))
            .spawn(move || {
                for task in receiver.iter() {
                    if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                        error!("工作线程 {} 中的任务发生 panic", id);
                    }
                }
                debug!("工作线程 {} 退出", id);
            })
            .map_err(|e| AppError::Other(format!("无法创建工作线程 {}: {}", id, e)))?;
        Ok(Self {
            id,
            handle: Some(handle),
        })
    }
}

/// 工作线程池
///
/// 由调用方显式创建并传给批处理器；调用 [`WorkerPool::shutdown`] 或 drop 时关闭队列并等待所有线程结束。
pub struct WorkerPool {
    workers: Vec<Worker>,
    sender: Option<Sender<Task>>,
}

impl WorkerPool {
    /// 创建 `size` 个工作线程
    pub fn new(size: usize) -> AppResult<Self> {
        if size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "thread_count",
                reason: "必须大于 0".to_string(),
            }
            .into());
        }

        let (sender, receiver) = channel::bounded::<Task>(size * 2);
        let workers = (1..=size)
            .map(|id| Worker::spawn(id, receiver.clone()))
            .collect::<AppResult<Vec<_>>>()?;

        debug!("工作线程池已启动: {} 个线程", size);
        Ok(Self {
            workers,
            sender: Some(sender),
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// 提交任务
    pub fn execute<F>(&self, task: F) -> AppResult<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self
            .sender
            .as_ref()
            .ok_or_else(|| AppError::Other("工作线程池已关闭".to_string()))?;
        sender
            .send(Box::new(task))
            .map_err(|_| AppError::Other("工作线程池已关闭".to_string()))
    }

    /// 关闭队列并等待所有线程结束
    pub fn shutdown(mut self) {
        self.join_all();
    }

    fn join_all(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(handle) = worker.handle.take() {
                if handle.join().is_err() {
                    error!("工作线程 {} 异常退出", worker.id);
                }
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.join_all();
    }
}
