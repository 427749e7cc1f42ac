//! 执行桥
//!
//! 驱动命令的 pre → main → post 生命周期：前置与后置阶段总在调用线程上执行，
//! 主体按调度策略在调用线程或后台工作线程上执行。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Sender};
use tracing::{debug, error, warn};

use crate::bridge::affinity::AffinityDispatcher;
use crate::bridge::context::{ExecutionContext, ExecutionState};
use crate::bridge::error::{run_stage, BridgeError, BridgeResult};
use crate::bridge::test_mode;
use crate::bridge::worker_pool::{WorkerPool, WorkerPoolConfig};
use crate::command::{Command, DispatchPolicy};
use crate::config::FrameworkConfig;
use crate::dialog::DialogLifecycleController;

type StageOutcome = Result<(), String>;
type BackgroundOutcome = (Box<dyn Command>, ExecutionContext, StageOutcome);

/// 后台执行的主体任务
///
/// 未执行就被丢弃时也会把命令和上下文送回，保证后置阶段仍能执行。
struct BackgroundJob {
    command: Option<Box<dyn Command>>,
    ctx: Option<ExecutionContext>,
    reply: Sender<BackgroundOutcome>,
}

impl BackgroundJob {
    fn run(mut self) {
        if let (Some(mut command), Some(mut ctx)) = (self.command.take(), self.ctx.take()) {
            let outcome = run_stage(|| command.execute_main(&mut ctx));
            let _ = self.reply.send((command, ctx, outcome));
        }
    }
}

impl Drop for BackgroundJob {
    fn drop(&mut self) {
        if let (Some(command), Some(ctx)) = (self.command.take(), self.ctx.take()) {
            let _ = self
                .reply
                .send((command, ctx, Err("后台任务未执行即被丢弃".to_string())));
        }
    }
}

/// 进行中的执行计数
struct RunningGuard<'a>(&'a AtomicUsize);

impl<'a> RunningGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ExecutionBridge {
    dispatcher: Arc<AffinityDispatcher>,
    pool: WorkerPool,
    dialogs: DialogLifecycleController,
    running: AtomicUsize,
}

impl ExecutionBridge {
    /// 以当前线程作为亲和线程创建执行桥
    pub fn new(config: &FrameworkConfig) -> Self {
        let dispatcher = Arc::new(AffinityDispatcher::new(
            config.execution.affinity_queue_capacity,
        ));
        Self::with_dispatcher(dispatcher, config)
    }

    pub fn with_dispatcher(dispatcher: Arc<AffinityDispatcher>, config: &FrameworkConfig) -> Self {
        Self {
            dispatcher,
            pool: WorkerPool::with_config(WorkerPoolConfig::from(&config.execution)),
            dialogs: DialogLifecycleController::new(&config.dialog),
            running: AtomicUsize::new(0),
        }
    }

    pub fn dispatcher(&self) -> &Arc<AffinityDispatcher> {
        &self.dispatcher
    }

    pub fn worker_pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn dialogs(&self) -> &DialogLifecycleController {
        &self.dialogs
    }

    pub fn is_running(&self) -> bool {
        self.running_count() > 0
    }

    pub fn running_count(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// 执行一个命令
    ///
    /// 在亲和线程上调用且主体在后台执行时，等待期间持续服务亲和收件箱，
    /// 主体发起的委托因此可以完成。后置阶段无论主体成功、失败还是 panic 都恰好执行一次。
    pub fn execute(&self, mut command: Box<dyn Command>) -> BridgeResult<()> {
        let declared = command.dispatch_policy();
        let forced = declared == DispatchPolicy::Background && test_mode::is_force_affine();
        let policy = if forced {
            DispatchPolicy::Affine
        } else {
            declared
        };

        let _running = RunningGuard::enter(&self.running);
        let mut ctx = ExecutionContext::new(
            policy,
            forced,
            Arc::clone(&self.dispatcher),
            self.dialogs.clone(),
        );
        debug!(
            "开始执行命令 {} (策略: {:?}, 强制亲和: {})",
            ctx.invocation_id(),
            policy,
            forced
        );

        ctx.set_state(ExecutionState::PreExecuting);
        if let Err(message) = run_stage(|| command.pre_execute(&mut ctx)) {
            ctx.set_state(ExecutionState::Idle);
            let err = BridgeError::pre_execute(message);
            err.log();
            return Err(err);
        }

        let (mut command, mut ctx, main_outcome) = match policy {
            DispatchPolicy::Affine => {
                ctx.set_state(ExecutionState::RunningAffine);
                let outcome = run_stage(|| command.execute_main(&mut ctx));
                (command, ctx, outcome)
            }
            DispatchPolicy::Background => self.run_background(command, ctx)?,
        };

        ctx.set_state(ExecutionState::PostExecuting);
        let post_outcome = run_stage(|| command.post_execute(&mut ctx));
        ctx.set_state(ExecutionState::Idle);

        let result = match (main_outcome, post_outcome) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(message)) => Err(BridgeError::post_execute(message)),
            (Err(message), post) => {
                if let Err(post_message) = post {
                    warn!("主体失败后后置阶段也失败: {}", post_message);
                }
                Err(BridgeError::execution(message))
            }
        };

        match &result {
            Ok(()) => debug!(
                "命令 {} 执行完成，耗时 {:?}",
                ctx.invocation_id(),
                ctx.elapsed()
            ),
            Err(err) => err.log(),
        }
        result
    }

    fn run_background(
        &self,
        command: Box<dyn Command>,
        mut ctx: ExecutionContext,
    ) -> BridgeResult<BackgroundOutcome> {
        ctx.set_state(ExecutionState::RunningBackground);
        let (reply, outcome) = bounded(1);
        let job = BackgroundJob {
            command: Some(command),
            ctx: Some(ctx),
            reply,
        };

        if let Err(job) = self.pool.submit(Box::new(move || job.run())) {
            warn!("工作线程池不可用或任务队列已满，主体改为在调用线程执行");
            job();
        }

        self.dispatcher.pump_until(&outcome).ok_or_else(|| {
            error!("后台任务未返回执行结果");
            BridgeError::disconnected("background job")
        })
    }

    /// 关闭后台线程池，之后的后台命令在调用线程执行
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

impl std::fmt::Debug for ExecutionBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionBridge")
            .field("dispatcher", &self.dispatcher)
            .field("worker_threads", &self.pool.worker_threads())
            .field("running", &self.running_count())
            .finish()
    }
}
