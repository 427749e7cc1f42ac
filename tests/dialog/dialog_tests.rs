//! 对话框生命周期测试
//!
//! 对话框运行在独立线程上；关闭可重复调用且不会失败；进度按已用时间估算剩余时间。

#[cfg(test)]
mod dialog_tests {
    use std::sync::Arc;
    use std::thread::{self, ThreadId};
    use std::time::{Duration, Instant};

    use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
    use parking_lot::Mutex;
    use ribbonkit::bridge::BridgeError;
    use ribbonkit::dialog::{
        CloseOutcome, DialogCommand, DialogLifecycleController, DialogView, ProgressSnapshot,
        ProgressViewModel, WithDialog,
    };
    use ribbonkit::{
        AppResult, Command, DispatchPolicy, ExecutionBridge, ExecutionContext, FrameworkConfig,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum ViewEvent {
        Shown(ThreadId),
        Progress(f64),
        Closed(ThreadId),
        Detached,
        UserClosed,
    }

    struct RecordingView {
        events: Sender<ViewEvent>,
    }

    /// 脱离执行后等待“用户”关闭窗口的视图
    struct ModelessView {
        events: Sender<ViewEvent>,
        user_close: Receiver<()>,
    }

    impl DialogView for ModelessView {
        fn show(&mut self) {
            let _ = self.events.send(ViewEvent::Shown(thread::current().id()));
        }

        fn close(&mut self) {
            let _ = self.events.send(ViewEvent::Closed(thread::current().id()));
        }

        fn run_detached(&mut self) {
            let _ = self.events.send(ViewEvent::Detached);
            let _ = self.user_close.recv();
            let _ = self.events.send(ViewEvent::UserClosed);
        }
    }

    impl DialogView for RecordingView {
        fn show(&mut self) {
            let _ = self.events.send(ViewEvent::Shown(thread::current().id()));
        }

        fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
            let _ = self.events.send(ViewEvent::Progress(snapshot.percent));
        }

        fn close(&mut self) {
            let _ = self.events.send(ViewEvent::Closed(thread::current().id()));
        }
    }

    fn fast_controller() -> DialogLifecycleController {
        DialogLifecycleController::with_polling(100, Duration::from_millis(10))
    }

    fn open_recording(
        controller: &DialogLifecycleController,
    ) -> (
        ribbonkit::DialogSession,
        Arc<ProgressViewModel>,
        Receiver<ViewEvent>,
    ) {
        let (events, received) = unbounded();
        let model = Arc::new(ProgressViewModel::new("测试"));
        let bound = Arc::clone(&model);
        let session = controller
            .open(move || RecordingView { events }, move |_view| bound)
            .unwrap();
        (session, model, received)
    }

    fn wait_materialized(session: &ribbonkit::DialogSession) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !session.is_materialized() {
            assert!(Instant::now() < deadline, "dialog never materialized");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_dialog_lives_on_its_own_thread() {
        let controller = fast_controller();
        let (session, _model, events) = open_recording(&controller);

        let ViewEvent::Shown(ui_thread) = events.recv_timeout(Duration::from_secs(5)).unwrap()
        else {
            panic!("expected Shown first");
        };
        assert_ne!(ui_thread, thread::current().id());

        assert_eq!(controller.close(&session), CloseOutcome::Closed);
        assert_eq!(events.recv().unwrap(), ViewEvent::Closed(ui_thread));
        assert_eq!(controller.close(&session), CloseOutcome::AlreadyClosed);
    }

    #[test]
    fn test_progress_elapsed_and_reset() {
        let controller = fast_controller();
        let (session, model, events) = open_recording(&controller);
        wait_materialized(&session);

        let t0 = Instant::now();
        let start = controller.update_progress_at(&session, 0.0, t0).unwrap();
        assert_eq!(start.elapsed, Duration::ZERO);

        let half = controller
            .update_progress_at(&session, 50.0, t0 + Duration::from_secs(10))
            .unwrap();
        assert_eq!(half.elapsed, Duration::from_secs(10));
        assert!(half.remaining > Duration::ZERO);
        assert_eq!(model.percent(), 50.0);
        assert_eq!(model.elapsed(), Duration::from_secs(10));

        let reset = controller
            .update_progress_at(&session, 0.0, t0 + Duration::from_secs(11))
            .unwrap();
        assert_eq!(reset.elapsed, Duration::ZERO);
        assert_eq!(model.elapsed(), Duration::ZERO);
        assert_eq!(session.last_progress(), Some(reset));

        assert_eq!(controller.close(&session), CloseOutcome::Closed);
        let progress: Vec<_> = events
            .try_iter()
            .filter_map(|e| match e {
                ViewEvent::Progress(p) => Some(p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0.0, 50.0, 0.0]);
    }

    #[test]
    fn test_close_before_materialization_is_safe() {
        let controller = DialogLifecycleController::with_polling(3, Duration::from_millis(5));
        let (release_tx, release_rx) = bounded::<()>(1);
        let (events, received) = unbounded();

        let session = controller
            .open(
                move || {
                    // 视图构造被阻塞，模拟迟迟未就绪的窗口
                    let _ = release_rx.recv();
                    RecordingView { events }
                },
                |_view| Arc::new(ProgressViewModel::default()),
            )
            .unwrap();

        assert!(controller.update_progress(&session, 30.0).is_none());
        assert_eq!(controller.close(&session), CloseOutcome::TimedOut);
        assert_eq!(controller.close(&session), CloseOutcome::AlreadyClosed);
        assert_eq!(controller.close(&session), CloseOutcome::AlreadyClosed);

        // 就绪后发现会话已断开，自行关闭视图
        let _ = release_tx.send(());
        let first = received.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(first, ViewEvent::Shown(_)));
        let second = received.recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(matches!(second, ViewEvent::Closed(_)));
    }

    #[test]
    fn test_dropping_session_closes_view() {
        let controller = fast_controller();
        let (session, _model, events) = open_recording(&controller);
        wait_materialized(&session);
        drop(session);

        let mut closed = false;
        while let Ok(event) = events.recv_timeout(Duration::from_secs(5)) {
            if matches!(event, ViewEvent::Closed(_)) {
                closed = true;
                break;
            }
        }
        assert!(closed);
    }

    #[test]
    fn test_view_actions_run_on_dialog_thread() {
        let controller = fast_controller();
        let (session, _model, events) = open_recording(&controller);
        let (seen_tx, seen_rx) = bounded(1);

        session
            .post_to_view(move |_view| {
                let _ = seen_tx.send(thread::current().id());
            })
            .unwrap();

        let ViewEvent::Shown(ui_thread) = events.recv_timeout(Duration::from_secs(5)).unwrap()
        else {
            panic!("expected Shown first");
        };
        assert_eq!(seen_rx.recv_timeout(Duration::from_secs(5)).unwrap(), ui_thread);
        assert_eq!(controller.close(&session), CloseOutcome::Closed);
    }

    static EXPORT_EVENTS: Mutex<Vec<String>> = Mutex::new(Vec::new());

    struct LoggedView;

    impl DialogView for LoggedView {
        fn show(&mut self) {
            EXPORT_EVENTS.lock().push("show".into());
        }

        fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
            EXPORT_EVENTS.lock().push(format!("progress {}", snapshot.percent));
        }

        fn close(&mut self) {
            EXPORT_EVENTS.lock().push("close".into());
        }
    }

    struct Export;

    impl DialogCommand for Export {
        type View = LoggedView;
        type Model = ProgressViewModel;

        fn create_view() -> LoggedView {
            LoggedView
        }

        fn create_model(_view: &LoggedView) -> Arc<ProgressViewModel> {
            Arc::new(ProgressViewModel::new("Export"))
        }

        fn dispatch_policy(&self) -> DispatchPolicy {
            DispatchPolicy::Background
        }

        fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
            {
                let session = ctx.dialog().ok_or_else(|| anyhow::anyhow!("no dialog"))?;
                let deadline = Instant::now() + Duration::from_secs(5);
                while !session.is_materialized() && Instant::now() < deadline {
                    thread::sleep(Duration::from_millis(5));
                }
            }
            for percent in [0.0, 50.0, 100.0] {
                ctx.update_percent(percent);
            }
            Ok(())
        }

        fn post_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
            let closed = ctx.dialog().map(|s| s.is_closed()).unwrap_or(false);
            EXPORT_EVENTS.lock().push(format!("post closed={}", closed));
            Ok(())
        }
    }

    #[test]
    fn test_dialog_command_closes_before_inner_post() {
        let config = FrameworkConfig::default();
        let bridge = ExecutionBridge::new(&config);
        bridge.execute(Box::new(WithDialog::new(Export))).unwrap();

        let events = EXPORT_EVENTS.lock().clone();
        assert_eq!(
            events,
            vec![
                "show",
                "progress 0",
                "progress 50",
                "progress 100",
                "close",
                "post closed=true"
            ]
        );
    }

    #[test]
    fn test_second_dialog_is_rejected() {
        struct Greedy(Arc<Mutex<Option<BridgeError>>>);

        impl Command for Greedy {
            fn pre_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
                let quiet = || RecordingView {
                    events: unbounded().0,
                };
                let first = ctx
                    .dialogs()
                    .open(quiet, |_v| Arc::new(ProgressViewModel::default()))?;
                ctx.attach_dialog(first)?;

                let second = ctx
                    .dialogs()
                    .open(quiet, |_v| Arc::new(ProgressViewModel::default()))?;
                *self.0.lock() = ctx.attach_dialog(second).err();
                Ok(())
            }

            fn execute_main(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
                Ok(())
            }

            fn post_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
                if let Some(session) = ctx.dialog() {
                    ctx.dialogs().close(session);
                }
                Ok(())
            }
        }

        let rejected = Arc::new(Mutex::new(None));
        let bridge = ExecutionBridge::new(&FrameworkConfig::default());
        bridge
            .execute(Box::new(Greedy(Arc::clone(&rejected))))
            .unwrap();
        assert_eq!(*rejected.lock(), Some(BridgeError::DialogAlreadyAttached));
    }

    #[test]
    fn test_detached_dialog_stays_open_until_user_closes() {
        let controller = fast_controller();
        let (events, received) = unbounded();
        let (user_close_tx, user_close) = bounded::<()>(1);
        let session = controller
            .open(
                move || ModelessView { events, user_close },
                |_view| Arc::new(ProgressViewModel::default()),
            )
            .unwrap();
        wait_materialized(&session);
        controller.update_progress(&session, 40.0);

        let detached = session.detach();
        assert!(matches!(
            received.recv_timeout(Duration::from_secs(5)).unwrap(),
            ViewEvent::Shown(_)
        ));
        assert_eq!(
            received.recv_timeout(Duration::from_secs(5)).unwrap(),
            ViewEvent::Detached
        );
        thread::sleep(Duration::from_millis(50));
        assert!(!detached.is_finished());
        assert!(received.try_recv().is_err());

        let _ = user_close_tx.send(());
        detached.join();
        let rest: Vec<_> = received.try_iter().collect();
        assert_eq!(rest, vec![ViewEvent::UserClosed]);
    }

    static KEEP_OPEN_EVENTS: Mutex<Vec<&'static str>> = Mutex::new(Vec::new());
    static KEEP_OPEN_RELEASE: Mutex<Option<Receiver<()>>> = Mutex::new(None);

    struct SummaryView {
        user_close: Option<Receiver<()>>,
    }

    impl DialogView for SummaryView {
        fn show(&mut self) {
            KEEP_OPEN_EVENTS.lock().push("show");
        }

        fn close(&mut self) {
            KEEP_OPEN_EVENTS.lock().push("close");
        }

        fn run_detached(&mut self) {
            KEEP_OPEN_EVENTS.lock().push("detached");
            if let Some(user_close) = self.user_close.take() {
                let _ = user_close.recv_timeout(Duration::from_secs(5));
            }
            KEEP_OPEN_EVENTS.lock().push("user closed");
        }
    }

    struct Summary;

    impl DialogCommand for Summary {
        type View = SummaryView;
        type Model = ProgressViewModel;

        fn create_view() -> SummaryView {
            SummaryView {
                user_close: KEEP_OPEN_RELEASE.lock().take(),
            }
        }

        fn create_model(_view: &SummaryView) -> Arc<ProgressViewModel> {
            Arc::new(ProgressViewModel::new("Summary"))
        }

        fn close_view_when_finished(&self) -> bool {
            false
        }

        fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
            let session = ctx.dialog().ok_or_else(|| anyhow::anyhow!("no dialog"))?;
            let deadline = Instant::now() + Duration::from_secs(5);
            while !session.is_materialized() && Instant::now() < deadline {
                thread::sleep(Duration::from_millis(5));
            }
            thread::sleep(Duration::from_millis(100));
            Ok(())
        }

        fn post_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
            assert!(ctx.dialog().is_some_and(|s| !s.is_closed()));
            KEEP_OPEN_EVENTS.lock().push("post");
            Ok(())
        }
    }

    fn wait_for_event(event: &str) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !KEEP_OPEN_EVENTS.lock().iter().any(|e| *e == event) {
            assert!(Instant::now() < deadline, "missing event {}", event);
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_view_stays_open_when_not_closed_on_finish() {
        let (user_close_tx, user_close) = bounded::<()>(1);
        *KEEP_OPEN_RELEASE.lock() = Some(user_close);

        let bridge = ExecutionBridge::new(&FrameworkConfig::default());
        bridge.execute(Box::new(WithDialog::new(Summary))).unwrap();

        wait_for_event("detached");
        thread::sleep(Duration::from_millis(50));
        assert_eq!(*KEEP_OPEN_EVENTS.lock(), vec!["show", "post", "detached"]);

        let _ = user_close_tx.send(());
        wait_for_event("user closed");
        assert!(!KEEP_OPEN_EVENTS.lock().contains(&"close"));
    }
}
