//! ribbonkit 插件命令框架
//!
//! 让插件模块以声明方式把命令注册到宿主的功能区，并在遵守宿主线程亲和约束的前提下执行：
//! - 命令元数据合并、优先级排序与按钮组归并
//! - pre → main → post 生命周期，主体可在后台执行并通过 `run_affine` 切回宿主线程
//! - 独立 UI 线程上的模态对话框与进度报告

pub mod bridge; // 线程亲和执行桥
pub mod command; // 命令声明与元数据
pub mod config; // 框架配置
pub mod dialog; // 对话框生命周期
pub mod registry; // 功能区注册与命令表
pub mod setup; // 模块启动
pub mod utils; // 错误处理与日志

pub use bridge::{
    AffinityDispatcher, AffinityHandle, BridgeError, BridgeResult, ExecutionBridge,
    ExecutionContext, ExecutionState, ForceAffineGuard, Handoff,
};
pub use command::{
    Command, CommandDeclaration, CommandDefinition, CommandModule, DispatchPolicy,
    EffectiveMetadata, GroupDeclaration, MetadataEntry,
};
pub use config::{ConfigManager, FrameworkConfig};
pub use dialog::{
    CloseOutcome, DetachedDialog, DialogCommand, DialogLifecycleController, DialogModel,
    DialogSession, DialogView, ProgressSnapshot, ProgressViewModel, WithDialog,
};
pub use registry::{
    CommandRegistry, CommandTable, HostCommandId, InMemoryRibbon, RegistryEntry, RegistryError,
    RibbonHost,
};
pub use setup::{PluginApp, SetupError, SetupResult};
pub use utils::{AppError, AppResult};
