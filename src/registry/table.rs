//! 命令表：命令键、宿主命令标识与工厂的对应关系

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::bridge::ExecutionBridge;
use crate::command::{Command, CommandFactory};
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::host::HostCommandId;

/// 已注册到宿主界面的命令，创建后不再变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub key: String,
    pub module: String,
    pub host_id: HostCommandId,
    pub panel: String,
    /// 所在下拉按钮组的键，直接放在面板上时为 None
    pub group: Option<String>,
    pub display_name: String,
}

#[derive(Clone, Default)]
pub struct CommandTable {
    entries: Vec<RegistryEntry>,
    factories: Vec<CommandFactory>,
    by_key: HashMap<String, usize>,
    by_host_id: HashMap<HostCommandId, usize>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entry: RegistryEntry, factory: CommandFactory) -> RegistryResult<()> {
        if self.by_key.contains_key(&entry.key) {
            return Err(RegistryError::DuplicateKey { key: entry.key });
        }

        let index = self.entries.len();
        self.by_key.insert(entry.key.clone(), index);
        self.by_host_id.insert(entry.host_id.clone(), index);
        self.entries.push(entry);
        self.factories.push(factory);
        Ok(())
    }

    /// 按注册顺序
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.by_key.get(key).map(|&i| &self.entries[i])
    }

    pub fn lookup(&self, key: &str) -> Option<&HostCommandId> {
        self.get(key).map(|entry| &entry.host_id)
    }

    pub fn by_host_id(&self, id: &HostCommandId) -> Option<&RegistryEntry> {
        self.by_host_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn instantiate(&self, id: &HostCommandId) -> RegistryResult<Box<dyn Command>> {
        let index = self
            .by_host_id
            .get(id)
            .copied()
            .ok_or_else(|| RegistryError::UnknownCommand { id: id.clone() })?;
        Ok((self.factories[index])())
    }

    /// 宿主触发命令的入口：创建新实例并交给执行桥
    pub fn invoke(&self, id: &HostCommandId, bridge: &ExecutionBridge) -> RegistryResult<()> {
        let command = self.instantiate(id)?;
        debug!("调用命令: {}", id);
        bridge.execute(command)?;
        Ok(())
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
