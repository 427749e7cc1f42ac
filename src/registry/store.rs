//! 进程级命令表
//!
//! 每个模块在启动阶段发布一次自己的命令表，之后只读。命令键在模块内唯一，
//! 跨模块按发布顺序查找。

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::{info, warn};

use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::host::HostCommandId;
use crate::registry::table::{CommandTable, RegistryEntry};

type PublishedTables = RwLock<Vec<(String, Arc<CommandTable>)>>;

static COMMANDS: OnceLock<PublishedTables> = OnceLock::new();

fn tables() -> &'static PublishedTables {
    COMMANDS.get_or_init(|| RwLock::new(Vec::new()))
}

/// 发布模块的命令表，每个模块只能发布一次
pub fn publish(module: &str, table: CommandTable) -> RegistryResult<Arc<CommandTable>> {
    let mut published = tables().write();
    if published.iter().any(|(name, _)| name == module) {
        warn!("模块 {} 的命令表已发布，忽略重复发布", module);
        return Err(RegistryError::AlreadyPublished {
            module: module.to_string(),
        });
    }

    let table = Arc::new(table);
    info!("模块 {} 的命令表已发布: {} 个命令", module, table.len());
    published.push((module.to_string(), Arc::clone(&table)));
    Ok(table)
}

/// 指定模块已发布的命令表
pub fn commands(module: &str) -> Option<Arc<CommandTable>> {
    tables()
        .read()
        .iter()
        .find(|(name, _)| name == module)
        .map(|(_, table)| Arc::clone(table))
}

pub fn is_published(module: &str) -> bool {
    commands(module).is_some()
}

/// 已发布的模块名，按发布顺序
pub fn modules() -> Vec<String> {
    tables().read().iter().map(|(name, _)| name.clone()).collect()
}

/// 按命令键查找宿主命令标识
pub fn lookup(key: &str) -> Option<HostCommandId> {
    tables()
        .read()
        .iter()
        .find_map(|(_, table)| table.lookup(key).cloned())
}

/// 按宿主命令标识找到所属命令表和条目，供宿主的调用入口使用
pub fn find_by_host_id(id: &HostCommandId) -> Option<(Arc<CommandTable>, RegistryEntry)> {
    tables().read().iter().find_map(|(_, table)| {
        table
            .by_host_id(id)
            .cloned()
            .map(|entry| (Arc::clone(table), entry))
    })
}
