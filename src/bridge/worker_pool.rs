//! 后台工作线程池
//!
//! 后台调度的命令主体在这里执行。任务队列有界，线程具名，关闭时等待线程退出。

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::ExecutionConfig;
use crate::utils::panic_message;

pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// 工作线程池配置
#[derive(Debug, Clone)]
pub struct WorkerPoolConfig {
    /// 工作线程数量
    pub worker_threads: usize,
    /// 任务队列容量
    pub queue_capacity: usize,
    /// 线程名前缀
    pub thread_name_prefix: String,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

impl From<&ExecutionConfig> for WorkerPoolConfig {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            worker_threads: config.effective_worker_threads(),
            queue_capacity: config.job_queue_capacity,
            thread_name_prefix: "ribbonkit-worker".to_string(),
        }
    }
}

/// 工作线程池统计信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerPoolStats {
    pub worker_threads: usize,
    pub submitted: u64,
    pub completed: u64,
    pub panicked: u64,
    pub pending: usize,
}

pub struct WorkerPool {
    config: WorkerPoolConfig,
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    worker_handles: Mutex<Option<Vec<JoinHandle<()>>>>,
    stats: Arc<Mutex<WorkerPoolStats>>,
}

impl WorkerPool {
    pub fn new(worker_threads: usize, queue_capacity: usize) -> Self {
        Self::with_config(WorkerPoolConfig {
            worker_threads,
            queue_capacity,
            ..WorkerPoolConfig::default()
        })
    }

    pub fn with_config(config: WorkerPoolConfig) -> Self {
        let worker_threads = config.worker_threads.max(1);
        let (sender, receiver) = bounded(config.queue_capacity.max(1));
        let stats = Arc::new(Mutex::new(WorkerPoolStats {
            worker_threads,
            ..WorkerPoolStats::default()
        }));

        let mut worker_handles = Vec::with_capacity(worker_threads);
        for worker_id in 0..worker_threads {
            let name = format!("{}-{}", config.thread_name_prefix, worker_id);
            match Self::spawn_worker_thread(name, receiver.clone(), Arc::clone(&stats)) {
                Ok(handle) => worker_handles.push(handle),
                Err(e) => warn!("启动工作线程 {} 失败: {}", worker_id, e),
            }
        }

        debug!("工作线程池启动: {} 个线程", worker_handles.len());

        Self {
            config,
            sender: Mutex::new(Some(sender)),
            receiver,
            worker_handles: Mutex::new(Some(worker_handles)),
            stats,
        }
    }

    /// 提交任务，不阻塞调用线程
    ///
    /// 线程池已关闭、没有可用线程或任务队列已满时原样退回。
    pub fn submit(&self, job: Job) -> Result<(), Job> {
        let alive = self
            .worker_handles
            .lock()
            .as_ref()
            .is_some_and(|handles| !handles.is_empty());
        if !alive {
            return Err(job);
        }

        let Some(sender) = self.sender.lock().clone() else {
            return Err(job);
        };

        sender.try_send(job).map_err(|e| {
            if e.is_full() {
                debug!("任务队列已满，退回任务");
            }
            e.into_inner()
        })?;
        self.stats.lock().submitted += 1;
        Ok(())
    }

    pub fn is_shutdown(&self) -> bool {
        self.sender.lock().is_none()
    }

    pub fn worker_threads(&self) -> usize {
        self.config.worker_threads
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> WorkerPoolStats {
        let mut stats = self.stats.lock().clone();
        stats.pending = self.receiver.len();
        stats
    }

    /// 关闭线程池，已入队的任务执行完后线程退出
    pub fn shutdown(&self) {
        drop(self.sender.lock().take());

        let handles = self.worker_handles.lock().take();
        let Some(handles) = handles else {
            return;
        };

        let current = thread::current().id();
        for handle in handles {
            // 在工作线程内部关闭时不能等待自己
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("工作线程退出时发生panic");
            }
        }
        debug!("工作线程池已关闭");
    }

    fn spawn_worker_thread(
        name: String,
        receiver: Receiver<Job>,
        stats: Arc<Mutex<WorkerPoolStats>>,
    ) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new().name(name).spawn(move || {
            while let Ok(job) = receiver.recv() {
                match catch_unwind(AssertUnwindSafe(job)) {
                    Ok(()) => stats.lock().completed += 1,
                    Err(payload) => {
                        warn!("后台任务panic: {}", panic_message(payload.as_ref()));
                        stats.lock().panicked += 1;
                    }
                }
            }
        })
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}
