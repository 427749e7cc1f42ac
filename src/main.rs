//! ribbonkit 演示程序
//!
//! 用内存功能区模拟宿主：注册一个演示模块，然后依次触发每个命令。

use std::cell::RefCell;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use ribbonkit::dialog::ProgressSnapshot;
use ribbonkit::utils::init_logging;
use ribbonkit::{
    AppResult, Command, CommandDeclaration, CommandModule, ConfigManager, DialogCommand,
    DialogView, DispatchPolicy, ExecutionBridge, ExecutionContext, GroupDeclaration,
    InMemoryRibbon, MetadataEntry, PluginApp, ProgressViewModel, SetupError, WithDialog,
};
use tracing::{error, info, warn};

thread_local! {
    // 只能在宿主线程上访问的“文档”
    static WALL_OFFSETS: RefCell<Vec<f64>> = RefCell::new(vec![0.0; 10]);
}

struct CommandEasy;

impl Command for CommandEasy {
    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        info!("CommandEasy 在调用线程执行 ({:?})", ctx.policy());
        Ok(())
    }
}

struct CommandAsync;

impl Command for CommandAsync {
    fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::Background
    }

    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        let handoffs: Vec<_> = (0..10)
            .map(|wall| {
                ctx.post_affine(move || {
                    WALL_OFFSETS.with(|walls| {
                        let mut walls = walls.borrow_mut();
                        walls[wall] = 0.2;
                        walls[wall]
                    })
                })
            })
            .collect();

        for handoff in handoffs {
            handoff.wait()?;
        }
        info!("CommandAsync 已在宿主线程上修改 10 面墙");
        Ok(())
    }
}

struct ConsoleView;

impl DialogView for ConsoleView {
    fn show(&mut self) {
        info!("进度窗口已显示");
    }

    fn on_progress(&mut self, snapshot: &ProgressSnapshot) {
        info!(
            "进度 {:.0}% 已用 {:?} 剩余 {:?}",
            snapshot.percent, snapshot.elapsed, snapshot.remaining
        );
    }

    fn close(&mut self) {
        info!("进度窗口已关闭");
    }
}

struct ExportReport;

impl DialogCommand for ExportReport {
    type View = ConsoleView;
    type Model = ProgressViewModel;

    fn create_view() -> ConsoleView {
        ConsoleView
    }

    fn create_model(_view: &ConsoleView) -> Arc<ProgressViewModel> {
        Arc::new(ProgressViewModel::new("Export"))
    }

    fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::Background
    }

    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        for percent in [0.0, 25.0, 50.0, 75.0, 100.0] {
            ctx.update_percent(percent);
            thread::sleep(Duration::from_millis(50));
        }
        Ok(())
    }
}

fn demo_module() -> CommandModule {
    CommandModule::new("RibbonDemo")
        .command(
            CommandDeclaration::new("CommandAsync", || CommandAsync)
                .metadata(MetadataEntry::new().name("Async One"))
                .metadata(MetadataEntry::new().image("Resources/Icons/RibbonIcon16.png"))
                .metadata(MetadataEntry::new().large_image("Resources/Icons/RibbonIcon32.png"))
                .metadata(MetadataEntry::new().panel("Commands"))
                .priority(5),
        )
        .command(
            CommandDeclaration::new("CommandEasy", || CommandEasy)
                .metadata(MetadataEntry::new().name("Easy One").panel("Commands"))
                .priority(1),
        )
        .command(
            CommandDeclaration::new("ExportReport", || WithDialog::new(ExportReport))
                .metadata(
                    MetadataEntry::new()
                        .name("Export")
                        .pulldown("Tools")
                        .tooltip("导出报告"),
                )
                .priority(10),
        )
        .group(GroupDeclaration::new(
            "Tools",
            MetadataEntry::new().tooltip("工具"),
        ))
}

fn run() -> Result<(), SetupError> {
    init_logging().map_err(SetupError::Logging)?;

    if let Err(e) = ConfigManager::init() {
        warn!("配置加载失败，使用默认配置: {}", e);
    }
    let config = ConfigManager::get_config();

    let app = PluginApp::new(demo_module(), config.clone());
    let mut host = InMemoryRibbon::new();
    let table = app.start(&mut host)?;

    let bridge = ExecutionBridge::new(&config);
    for entry in table.entries() {
        info!("触发命令 {} ({})", entry.display_name, entry.host_id);
        if let Err(e) = table.invoke(&entry.host_id, &bridge) {
            error!("命令 {} 执行失败: {}", entry.key, e);
        }
    }

    WALL_OFFSETS.with(|walls| info!("墙体偏移: {:?}", walls.borrow()));
    bridge.shutdown();
    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("ribbonkit 演示失败: {}", e);
        std::process::exit(1);
    }
}
