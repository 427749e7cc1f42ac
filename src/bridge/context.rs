//! 单次命令执行的上下文

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use uuid::Uuid;

use crate::bridge::affinity::{AffinityDispatcher, Handoff};
use crate::bridge::error::{run_delegate, BridgeError, BridgeResult};
use crate::command::DispatchPolicy;
use crate::dialog::{DialogLifecycleController, DialogSession, ProgressSnapshot, ProgressTracker};
use crate::utils::AppResult;

/// 执行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExecutionState {
    Idle,
    PreExecuting,
    RunningAffine,
    RunningBackground,
    PostExecuting,
}

/// 向亲和线程委托工作的句柄
///
/// 可克隆、可跨线程传递。亲和调度时所有委托直接在当前线程执行。
#[derive(Clone)]
pub struct AffinityHandle {
    dispatcher: Arc<AffinityDispatcher>,
    inline: bool,
}

impl AffinityHandle {
    pub(crate) fn new(dispatcher: Arc<AffinityDispatcher>, policy: DispatchPolicy) -> Self {
        Self {
            dispatcher,
            inline: policy == DispatchPolicy::Affine,
        }
    }

    pub fn is_inline(&self) -> bool {
        self.inline
    }

    pub fn run_affine<T, F>(&self, delegate: F) -> BridgeResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.post_affine(delegate).wait()
    }

    pub fn try_run_affine<T, F>(&self, delegate: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.run_affine(delegate)?
    }

    /// 投递委托但不等待，用于同时发起多个委托
    pub fn post_affine<T, F>(&self, delegate: F) -> Handoff<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.inline {
            Handoff::Ready(run_delegate(delegate))
        } else {
            self.dispatcher.post(delegate)
        }
    }

    pub fn run_affine_async<T, F>(
        &self,
        delegate: F,
    ) -> impl Future<Output = BridgeResult<T>> + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let inline = self.inline || self.dispatcher.is_affinity_thread();
        self.dispatcher.handoff_async(delegate, inline)
    }
}

impl fmt::Debug for AffinityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AffinityHandle")
            .field("thread_id", &self.dispatcher.thread_id())
            .field("inline", &self.inline)
            .finish()
    }
}

/// 命令执行上下文
///
/// 在 `execute()` 入口创建、出口销毁。后台调度时随命令一起移动到工作线程，
/// 主体结束后再移回调用线程执行后置阶段。
pub struct ExecutionContext {
    invocation_id: Uuid,
    policy: DispatchPolicy,
    forced_affine: bool,
    started_at: DateTime<Local>,
    started: Instant,
    state: ExecutionState,
    progress: ProgressTracker,
    dialog: Option<DialogSession>,
    affinity: AffinityHandle,
    dialogs: DialogLifecycleController,
}

impl ExecutionContext {
    pub(crate) fn new(
        policy: DispatchPolicy,
        forced_affine: bool,
        dispatcher: Arc<AffinityDispatcher>,
        dialogs: DialogLifecycleController,
    ) -> Self {
        let started = Instant::now();
        Self {
            invocation_id: Uuid::new_v4(),
            policy,
            forced_affine,
            started_at: Local::now(),
            started,
            state: ExecutionState::Idle,
            progress: ProgressTracker::starting_at(started),
            dialog: None,
            affinity: AffinityHandle::new(dispatcher, policy),
            dialogs,
        }
    }

    pub fn invocation_id(&self) -> Uuid {
        self.invocation_id
    }

    /// 实际生效的调度策略
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    /// 声明为后台调度但被强制亲和模式改为同步执行
    pub fn is_forced_affine(&self) -> bool {
        self.forced_affine
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ExecutionState) {
        tracing::trace!(
            "执行 {} 状态: {:?} -> {:?}",
            self.invocation_id,
            self.state,
            state
        );
        self.state = state;
    }

    /// 可跨线程传递的委托句柄
    pub fn affinity(&self) -> AffinityHandle {
        self.affinity.clone()
    }

    pub fn run_affine<T, F>(&self, delegate: F) -> BridgeResult<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.affinity.run_affine(delegate)
    }

    pub fn try_run_affine<T, F>(&self, delegate: F) -> AppResult<T>
    where
        F: FnOnce() -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        self.affinity.try_run_affine(delegate)
    }

    pub fn post_affine<T, F>(&self, delegate: F) -> Handoff<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.affinity.post_affine(delegate)
    }

    pub fn run_affine_async<T, F>(
        &self,
        delegate: F,
    ) -> impl Future<Output = BridgeResult<T>> + Send + 'static
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.affinity.run_affine_async(delegate)
    }

    pub fn dialogs(&self) -> &DialogLifecycleController {
        &self.dialogs
    }

    /// 绑定对话框会话，每次执行最多一个
    pub fn attach_dialog(&mut self, session: DialogSession) -> BridgeResult<()> {
        if self.dialog.is_some() {
            return Err(BridgeError::DialogAlreadyAttached);
        }
        self.dialog = Some(session);
        Ok(())
    }

    pub fn dialog(&self) -> Option<&DialogSession> {
        self.dialog.as_ref()
    }

    pub fn take_dialog(&mut self) -> Option<DialogSession> {
        self.dialog.take()
    }

    /// 报告进度
    ///
    /// 绑定了对话框时同步刷新对话框；对话框尚未就绪时返回 None。
    pub fn update_percent(&mut self, percent: f64) -> Option<ProgressSnapshot> {
        match &self.dialog {
            Some(session) => self.dialogs.update_progress(session, percent),
            None => Some(self.progress.update(percent)),
        }
    }

    pub fn progress(&self) -> Option<ProgressSnapshot> {
        match &self.dialog {
            Some(session) => session.last_progress(),
            None => self.progress.last(),
        }
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("invocation_id", &self.invocation_id)
            .field("policy", &self.policy)
            .field("forced_affine", &self.forced_affine)
            .field("started_at", &self.started_at)
            .field("state", &self.state)
            .field("has_dialog", &self.dialog.is_some())
            .finish()
    }
}
