//! 命令注册：功能区结构、外观参数与命令表

pub mod button_param;
pub mod error;
pub mod host;
pub mod memory_host;
#[allow(clippy::module_inception)]
pub mod registry;
pub mod store;
pub mod table;

pub use button_param::{resource_path, ApplyReport, ButtonParam};
pub use error::{RegistryError, RegistryResult};
pub use host::{
    ButtonHandle, ButtonParent, GroupHandle, HostCommandId, HostError, HostResult, ItemHandle,
    ItemProperty, PanelHandle, RibbonHost,
};
pub use memory_host::{ButtonRecord, FailurePoint, GroupRecord, InMemoryRibbon, PanelRecord};
pub use registry::{group_key, CommandRegistry};
pub use table::{CommandTable, RegistryEntry};
