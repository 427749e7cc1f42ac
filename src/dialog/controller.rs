//! 对话框生命周期
//!
//! 每个对话框运行在独立的 UI 线程上，控制器只通过向该线程的收件箱投递闭包与之通信。
//! 关闭时有限次轮询等待对话框就绪，超时只记录告警。

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::config::DialogConfig;
use crate::dialog::error::{DialogError, DialogResult};
use crate::dialog::progress::{DialogModel, ProgressSnapshot, ProgressTracker};
use crate::utils::panic_message;

/// 对话框视图，只存在于对话框线程上
pub trait DialogView: 'static {
    fn show(&mut self);

    fn on_progress(&mut self, _snapshot: &ProgressSnapshot) {}

    fn close(&mut self);

    /// 会话脱离执行后由视图自己驱动，直到用户关闭窗口
    ///
    /// 返回后对话框线程退出，不再调用 `close`。没有自己事件循环的视图默认直接关闭。
    fn run_detached(&mut self) {
        self.close();
    }
}

type ViewAction = Box<dyn FnOnce(&mut dyn DialogView) + Send + 'static>;

enum DialogMessage {
    Invoke(ViewAction),
    Close,
    Detach,
}

/// `close` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    /// 已通知对话框线程关闭并等待其退出
    Closed,
    /// 对话框始终未就绪，没有发送关闭消息
    TimedOut,
    /// 之前已经关闭过
    AlreadyClosed,
}

/// 一个已打开的对话框
pub struct DialogSession {
    id: Uuid,
    sender: Mutex<Option<Sender<DialogMessage>>>,
    model: Arc<OnceLock<Arc<dyn DialogModel>>>,
    progress: Mutex<ProgressTracker>,
    handle: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl DialogSession {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 视图与模型已在对话框线程上创建完成
    pub fn is_materialized(&self) -> bool {
        self.model.get().is_some()
    }

    pub fn model(&self) -> Option<Arc<dyn DialogModel>> {
        self.model.get().cloned()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_progress(&self) -> Option<ProgressSnapshot> {
        self.progress.lock().last()
    }

    /// 在对话框线程上对视图执行闭包
    pub fn post_to_view<F>(&self, action: F) -> DialogResult<()>
    where
        F: FnOnce(&mut dyn DialogView) + Send + 'static,
    {
        let sender = self.sender.lock();
        let sender = sender.as_ref().ok_or(DialogError::Closed)?;
        sender
            .send(DialogMessage::Invoke(Box::new(action)))
            .map_err(|_| DialogError::Closed)
    }

    /// 让对话框在执行结束后继续显示
    ///
    /// 已投递的视图操作照常执行，之后视图由 `DialogView::run_detached` 接管，
    /// 会话不再能关闭或更新它。
    pub fn detach(self) -> DetachedDialog {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(sender) = self.disconnect() {
            if sender.send(DialogMessage::Detach).is_err() {
                debug!("对话框 {} 线程已退出，无需脱离", self.id);
            }
        }
        debug!("对话框 {} 已脱离执行", self.id);
        let handle = self.handle.lock().take();
        DetachedDialog {
            id: self.id,
            handle,
        }
    }

    fn thread_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map_or(true, |handle| handle.is_finished())
    }

    fn disconnect(&self) -> Option<Sender<DialogMessage>> {
        self.sender.lock().take()
    }

    fn join(&self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        // 在对话框线程内部关闭时不能等待自己
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            warn!("对话框线程 {} 退出时发生panic", self.id);
        }
    }
}

impl std::fmt::Debug for DialogSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialogSession")
            .field("id", &self.id)
            .field("materialized", &self.is_materialized())
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// 已脱离执行的对话框，丢弃时不影响对话框线程
#[derive(Debug)]
pub struct DetachedDialog {
    id: Uuid,
    handle: Option<JoinHandle<()>>,
}

impl DetachedDialog {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 用户已关闭窗口，对话框线程已退出
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }

    /// 等待用户关闭窗口
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("对话框线程 {} 退出时发生panic", self.id);
            }
        }
    }
}

/// 对话框生命周期控制器
#[derive(Debug, Clone)]
pub struct DialogLifecycleController {
    poll_attempts: u32,
    poll_interval: Duration,
}

impl Default for DialogLifecycleController {
    fn default() -> Self {
        Self::new(&DialogConfig::default())
    }
}

impl DialogLifecycleController {
    pub fn new(config: &DialogConfig) -> Self {
        Self::with_polling(config.close_poll_attempts, config.close_poll_interval())
    }

    pub fn with_polling(poll_attempts: u32, poll_interval: Duration) -> Self {
        Self {
            poll_attempts,
            poll_interval,
        }
    }

    /// 在独立线程上创建视图和模型并显示
    pub fn open<V, M, FV, FM>(&self, view_factory: FV, model_factory: FM) -> DialogResult<DialogSession>
    where
        V: DialogView,
        M: DialogModel,
        FV: FnOnce() -> V + Send + 'static,
        FM: FnOnce(&V) -> Arc<M> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let (sender, inbox) = unbounded();
        let model: Arc<OnceLock<Arc<dyn DialogModel>>> = Arc::new(OnceLock::new());

        let slot = Arc::clone(&model);
        let handle = thread::Builder::new()
            .name(format!("ribbonkit-dialog-{}", id.simple()))
            .spawn(move || {
                let served = catch_unwind(AssertUnwindSafe(|| {
                    serve_dialog(view_factory, model_factory, &slot, inbox)
                }));
                if let Err(payload) = served {
                    error!(
                        "对话框线程 {} 异常退出: {}",
                        id,
                        panic_message(payload.as_ref())
                    );
                }
            })
            .map_err(|e| DialogError::spawn(e.to_string()))?;

        debug!("对话框 {} 已启动", id);

        Ok(DialogSession {
            id,
            sender: Mutex::new(Some(sender)),
            model,
            progress: Mutex::new(ProgressTracker::default()),
            handle: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
        })
    }

    /// 关闭对话框
    ///
    /// 可重复调用，不会失败。对话框在轮询期限内未就绪时返回 `TimedOut`，
    /// 此时断开收件箱，对话框线程就绪后会自行关闭。
    pub fn close(&self, session: &DialogSession) -> CloseOutcome {
        if session.closed.swap(true, Ordering::SeqCst) {
            debug!("对话框 {} 已关闭，忽略重复关闭", session.id);
            return CloseOutcome::AlreadyClosed;
        }

        if !self.wait_materialized(session) {
            let err = DialogError::Timeout {
                attempts: self.poll_attempts,
                interval_ms: self.poll_interval.as_millis() as u64,
            };
            warn!("对话框 {} 关闭失败: {}", session.id, err);
            drop(session.disconnect());
            return CloseOutcome::TimedOut;
        }

        if let Some(sender) = session.disconnect() {
            let _ = sender.send(DialogMessage::Close);
        }
        session.join();
        debug!("对话框 {} 已关闭", session.id);
        CloseOutcome::Closed
    }

    fn wait_materialized(&self, session: &DialogSession) -> bool {
        if session.is_materialized() {
            return true;
        }
        for _ in 0..self.poll_attempts {
            if session.thread_finished() {
                break;
            }
            thread::sleep(self.poll_interval);
            if session.is_materialized() {
                return true;
            }
        }
        session.is_materialized()
    }

    pub fn update_progress(
        &self,
        session: &DialogSession,
        percent: f64,
    ) -> Option<ProgressSnapshot> {
        self.update_progress_at(session, percent, Instant::now())
    }

    /// 更新模型并刷新视图，对话框尚未就绪时忽略
    pub fn update_progress_at(
        &self,
        session: &DialogSession,
        percent: f64,
        now: Instant,
    ) -> Option<ProgressSnapshot> {
        let Some(model) = session.model() else {
            debug!("对话框 {} 尚未就绪，忽略进度更新", session.id);
            return None;
        };

        let snapshot = session.progress.lock().update_at(percent, now);
        model.apply_progress(&snapshot);
        if let Err(e) = session.post_to_view(move |view| view.on_progress(&snapshot)) {
            debug!("对话框 {} 刷新进度失败: {}", session.id, e);
        }
        Some(snapshot)
    }
}

fn serve_dialog<V, M, FV, FM>(
    view_factory: FV,
    model_factory: FM,
    slot: &OnceLock<Arc<dyn DialogModel>>,
    inbox: Receiver<DialogMessage>,
) where
    V: DialogView,
    M: DialogModel,
    FV: FnOnce() -> V,
    FM: FnOnce(&V) -> Arc<M>,
{
    let mut view = view_factory();
    let model: Arc<dyn DialogModel> = model_factory(&view);
    let _ = slot.set(model);
    view.show();

    let detached = loop {
        match inbox.recv() {
            Ok(DialogMessage::Invoke(action)) => {
                if let Err(payload) = catch_unwind(AssertUnwindSafe(|| action(&mut view))) {
                    warn!("对话框视图操作panic: {}", panic_message(payload.as_ref()));
                }
            }
            Ok(DialogMessage::Close) => break false,
            Ok(DialogMessage::Detach) => break true,
            Err(_) => {
                debug!("对话框会话已释放，关闭视图");
                break false;
            }
        }
    };

    if detached {
        view.run_detached();
    } else {
        view.close();
    }
}
