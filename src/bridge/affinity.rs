//! 亲和线程调度
//!
//! 宿主 API 只能在创建它的线程上调用。`AffinityDispatcher` 记录该线程的 ID，
//! 并持有一个有界收件箱：其他线程把闭包连同各自的完成槽投递进来，
//! 由亲和线程依次取出执行，结果只回送给对应的完成槽。

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::Duration;

use crossbeam_channel::{bounded, select, Receiver, RecvTimeoutError, Sender};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::bridge::error::{run_delegate, BridgeError, BridgeResult};
use crate::utils::AppResult;

/// 投递到亲和线程的任务
type AffineTask = Box<dyn FnOnce() + Send + 'static>;

/// 收件箱统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub posted: u64,
    pub processed: u64,
    pub pending: usize,
}

pub struct AffinityDispatcher {
    thread_id: ThreadId,
    thread_name: Option<String>,
    sender: Sender<AffineTask>,
    receiver: Receiver<AffineTask>,
    posted: AtomicU64,
    processed: AtomicU64,
}

impl AffinityDispatcher {
    /// 以当前线程作为亲和线程
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        let current = thread::current();
        debug!(
            "亲和调度器绑定线程: {:?} ({})",
            current.id(),
            current.name().unwrap_or("unnamed")
        );

        Self {
            thread_id: current.id(),
            thread_name: current.name().map(str::to_string),
            sender,
            receiver,
            posted: AtomicU64::new(0),
            processed: AtomicU64::new(0),
        }
    }

    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    pub fn thread_name(&self) -> Option<&str> {
        self.thread_name.as_deref()
    }

    pub fn is_affinity_thread(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// 在亲和线程上执行并等待结果
    ///
    /// 在亲和线程上调用时直接内联执行。
    pub fn run_affine<T, F>(&self, delegate: F) -> BridgeResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.post(delegate).wait()
    }

    /// 委托本身返回 `AppResult` 时展开为单层结果
    pub fn try_run_affine<T, F>(&self, delegate: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_affine(delegate)?
    }

    /// 投递委托，立即返回可稍后等待的 `Handoff`
    pub fn post<T, F>(&self, delegate: F) -> Handoff<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_affinity_thread() {
            return Handoff::Ready(run_delegate(delegate));
        }

        let (slot, waiter) = bounded(1);
        let task: AffineTask = Box::new(move || {
            let _ = slot.send(run_delegate(delegate));
        });

        match self.enqueue(task) {
            Ok(()) => Handoff::Pending(waiter),
            Err(err) => Handoff::Ready(Err(err)),
        }
    }

    /// 异步版本，供 async 命令体使用
    pub fn run_affine_async<T, F>(
        &self,
        delegate: F,
    ) -> impl Future<Output = BridgeResult<T>> + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.handoff_async(delegate, self.is_affinity_thread())
    }

    pub(crate) fn handoff_async<T, F>(
        &self,
        delegate: F,
        inline: bool,
    ) -> impl Future<Output = BridgeResult<T>> + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (slot, waiter) = oneshot::channel();

        if inline {
            let _ = slot.send(run_delegate(delegate));
        } else {
            let task: AffineTask = Box::new(move || {
                let _ = slot.send(run_delegate(delegate));
            });
            // 入队失败时 slot 随任务一起被丢弃，等待方收到断开错误
            if let Err(err) = self.enqueue(task) {
                warn!("异步委托入队失败: {}", err);
            }
        }

        async move {
            match waiter.await {
                Ok(result) => result,
                Err(_) => Err(BridgeError::disconnected("run_affine_async")),
            }
        }
    }

    fn enqueue(&self, task: AffineTask) -> BridgeResult<()> {
        self.sender
            .send(task)
            .map_err(|_| BridgeError::disconnected("affinity inbox"))?;
        self.posted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn execute(&self, task: AffineTask) {
        task();
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    /// 执行收件箱中已有的全部任务，返回执行数量
    ///
    /// 宿主在亲和线程的空闲回调中调用。在其他线程调用时不做任何事。
    pub fn process_pending(&self) -> usize {
        if !self.is_affinity_thread() {
            warn!("process_pending 只能在亲和线程上调用");
            return 0;
        }

        let mut count = 0;
        while let Ok(task) = self.receiver.try_recv() {
            self.execute(task);
            count += 1;
        }
        count
    }

    /// 持续服务收件箱，直到 `shutdown` 收到消息或断开
    pub fn run_until(&self, shutdown: &Receiver<()>) {
        if !self.is_affinity_thread() {
            warn!("run_until 只能在亲和线程上调用");
            return;
        }

        debug!("亲和线程开始服务收件箱");
        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(self.receiver) -> task => match task {
                    Ok(task) => self.execute(task),
                    Err(_) => break,
                },
            }
        }
        // 退出前处理已入队的委托，避免等待方永久阻塞
        self.process_pending();
        debug!("亲和线程停止服务收件箱");
    }

    /// 等待 `done` 的同时服务收件箱
    ///
    /// 不在亲和线程上时只等待。`done` 断开时返回 None。
    pub fn pump_until<T>(&self, done: &Receiver<T>) -> Option<T> {
        if !self.is_affinity_thread() {
            return done.recv().ok();
        }

        loop {
            select! {
                recv(done) -> outcome => return outcome.ok(),
                recv(self.receiver) -> task => {
                    if let Ok(task) = task {
                        self.execute(task);
                    }
                }
            }
        }
    }

    pub fn stats(&self) -> DispatcherStats {
        DispatcherStats {
            posted: self.posted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            pending: self.receiver.len(),
        }
    }
}

impl std::fmt::Debug for AffinityDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityDispatcher")
            .field("thread_id", &self.thread_id)
            .field("thread_name", &self.thread_name)
            .field("pending", &self.receiver.len())
            .finish()
    }
}

/// 已投递委托的结果句柄
#[derive(Debug)]
pub enum Handoff<T> {
    /// 已在当前线程完成
    Ready(BridgeResult<T>),
    /// 等待亲和线程执行
    Pending(Receiver<BridgeResult<T>>),
}

impl<T> Handoff<T> {
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Ready(_) => true,
            Self::Pending(waiter) => !waiter.is_empty(),
        }
    }

    pub fn wait(self) -> BridgeResult<T> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(waiter) => waiter
                .recv()
                .map_err(|_| BridgeError::disconnected("run_affine"))?,
        }
    }

    pub fn wait_timeout(self, timeout: Duration) -> BridgeResult<T> {
        match self {
            Self::Ready(result) => result,
            Self::Pending(waiter) => match waiter.recv_timeout(timeout) {
                Ok(result) => result,
                Err(RecvTimeoutError::Timeout) => Err(BridgeError::Timeout {
                    operation: "run_affine".to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                }),
                Err(RecvTimeoutError::Disconnected) => {
                    Err(BridgeError::disconnected("run_affine"))
                }
            },
        }
    }
}
