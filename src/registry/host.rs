//! 宿主界面接口
//!
//! 面板、按钮组和按钮由宿主创建和渲染，这里只以不透明句柄引用它们。

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PanelHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonHandle(pub u64);

/// 宿主分配的命令标识，用于从宿主侧触发命令
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostCommandId(pub String);

impl HostCommandId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HostCommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 按钮的容器
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonParent {
    Panel(PanelHandle),
    Group(GroupHandle),
}

/// 可以设置外观属性的界面元素
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemHandle {
    Button(ButtonHandle),
    Group(GroupHandle),
}

/// 外观属性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemProperty {
    Image,
    LargeImage,
    HelpUrl,
    Tooltip,
    LongDescription,
    TooltipImage,
}

impl ItemProperty {
    /// 值为资源路径，需要加上模块资源根
    pub fn is_resource(self) -> bool {
        matches!(self, Self::Image | Self::LargeImage | Self::TooltipImage)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("宿主操作失败: {operation} - {message}")]
pub struct HostError {
    pub operation: String,
    pub message: String,
}

impl HostError {
    pub fn new(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;

/// 宿主的功能区接口
///
/// 实现方只会在宿主的亲和线程上被调用。
pub trait RibbonHost {
    /// 获取或创建 `tab` 下名为 `panel` 的面板
    fn create_panel(&mut self, tab: &str, panel: &str) -> HostResult<PanelHandle>;

    /// 获取或创建面板上的下拉按钮组，返回值中的 bool 表示是否为本次新建
    fn add_or_get_group(
        &mut self,
        panel: PanelHandle,
        key: &str,
        display_name: &str,
    ) -> HostResult<(GroupHandle, bool)>;

    fn add_button(
        &mut self,
        parent: ButtonParent,
        key: &str,
        display_name: &str,
    ) -> HostResult<ButtonHandle>;

    fn command_id(&self, button: ButtonHandle) -> HostResult<HostCommandId>;

    /// 设置单个外观属性，各属性互不影响
    fn set_property(&mut self, item: ItemHandle, property: ItemProperty, value: &str)
        -> HostResult<()>;
}
