//! 命令定义
//!
//! 模块以显式列表声明自己的命令：命令键、工厂函数、元数据和优先级。

use std::fmt;
use std::sync::Arc;

use crate::bridge::ExecutionContext;
use crate::command::metadata::{EffectiveMetadata, MetadataEntry};
use crate::utils::AppResult;

/// 主体执行的调度策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DispatchPolicy {
    /// 在调用线程（宿主的亲和线程）上同步执行
    #[default]
    Affine,
    /// 在后台工作线程上执行，宿主 API 调用需通过 `run_affine` 切回
    Background,
}

/// 插件命令
///
/// 三个阶段依次执行：`pre_execute` 和 `post_execute` 总在调用线程上运行，
/// `execute_main` 的位置由调度策略决定。任一阶段 panic 都按错误处理。
pub trait Command: Send + 'static {
    fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy::Affine
    }

    fn pre_execute(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
        Ok(())
    }

    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()>;

    fn post_execute(&mut self, _ctx: &mut ExecutionContext) -> AppResult<()> {
        Ok(())
    }
}

impl<C: Command + ?Sized> Command for Box<C> {
    fn dispatch_policy(&self) -> DispatchPolicy {
        (**self).dispatch_policy()
    }

    fn pre_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        (**self).pre_execute(ctx)
    }

    fn execute_main(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        (**self).execute_main(ctx)
    }

    fn post_execute(&mut self, ctx: &mut ExecutionContext) -> AppResult<()> {
        (**self).post_execute(ctx)
    }
}

/// 每次调用都产生一个新的命令实例
pub type CommandFactory = Arc<dyn Fn() -> Box<dyn Command> + Send + Sync>;

fn boxed_factory<F, C>(factory: F) -> CommandFactory
where
    F: Fn() -> C + Send + Sync + 'static,
    C: Command,
{
    Arc::new(move || Box::new(factory()) as Box<dyn Command>)
}

/// 经过校验的命令定义，发现之后不再变化
#[derive(Clone)]
pub struct CommandDefinition {
    pub key: String,
    pub entries: Vec<MetadataEntry>,
    pub priority: i32,
    pub factory: CommandFactory,
}

impl CommandDefinition {
    pub fn instantiate(&self) -> Box<dyn Command> {
        (self.factory)()
    }

    pub fn effective_metadata(&self, default_panel: &str) -> EffectiveMetadata {
        EffectiveMetadata::resolve(&self.key, &self.entries, default_panel)
    }
}

impl fmt::Debug for CommandDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDefinition")
            .field("key", &self.key)
            .field("entries", &self.entries)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// 尚未校验的命令声明
#[derive(Clone)]
pub struct CommandDeclaration {
    pub(crate) key: String,
    pub(crate) entries: Vec<MetadataEntry>,
    pub(crate) priority: i32,
    pub(crate) factory: Option<CommandFactory>,
}

impl CommandDeclaration {
    pub fn new<F, C>(key: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Command,
    {
        Self {
            key: key.into(),
            entries: Vec::new(),
            priority: 0,
            factory: Some(boxed_factory(factory)),
        }
    }

    /// 没有工厂的声明，发现阶段会被跳过
    pub fn unbound(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            entries: Vec::new(),
            priority: 0,
            factory: None,
        }
    }

    pub fn factory<F, C>(mut self, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Command,
    {
        self.factory = Some(boxed_factory(factory));
        self
    }

    /// 追加一条元数据，声明顺序即合并顺序
    pub fn metadata(mut self, entry: MetadataEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// 数值越小越靠前
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Debug for CommandDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDeclaration")
            .field("key", &self.key)
            .field("entries", &self.entries)
            .field("priority", &self.priority)
            .field("has_factory", &self.factory.is_some())
            .finish()
    }
}

/// 下拉按钮组自身的元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDeclaration {
    pub name: String,
    pub metadata: MetadataEntry,
}

impl GroupDeclaration {
    pub fn new(name: impl Into<String>, metadata: MetadataEntry) -> Self {
        Self {
            name: name.into(),
            metadata,
        }
    }
}

/// 一个插件模块的显式注册清单
#[derive(Debug, Clone)]
pub struct CommandModule {
    name: String,
    commands: Vec<CommandDeclaration>,
    groups: Vec<GroupDeclaration>,
}

impl CommandModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            commands: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn command(mut self, declaration: CommandDeclaration) -> Self {
        self.commands.push(declaration);
        self
    }

    pub fn group(mut self, declaration: GroupDeclaration) -> Self {
        self.groups.push(declaration);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn declarations(&self) -> &[CommandDeclaration] {
        &self.commands
    }

    /// 同名组声明多次时取第一条
    pub fn group_metadata(&self, group: &str) -> Option<&MetadataEntry> {
        self.groups
            .iter()
            .find(|g| g.name == group)
            .map(|g| &g.metadata)
    }
}
