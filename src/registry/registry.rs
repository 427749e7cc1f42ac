//! 把命令注册到宿主功能区

use tracing::{debug, info};

use crate::command::{discover, CommandDefinition, CommandModule, EffectiveMetadata};
use crate::config::RibbonConfig;
use crate::registry::button_param::ButtonParam;
use crate::registry::error::{RegistryError, RegistryResult};
use crate::registry::host::{ButtonParent, ItemHandle, RibbonHost};
use crate::registry::table::{CommandTable, RegistryEntry};

/// 下拉按钮组的内部键，加上模块名避免与其他模块冲突
pub fn group_key(module: &str, group: &str) -> String {
    format!("{}:{}", module, group)
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    config: RibbonConfig,
    table: CommandTable,
}

impl CommandRegistry {
    pub fn new(config: RibbonConfig) -> Self {
        Self {
            config,
            table: CommandTable::new(),
        }
    }

    pub fn table(&self) -> &CommandTable {
        &self.table
    }

    pub fn into_table(self) -> CommandTable {
        self.table
    }

    /// 发现模块中的命令并按优先级依次注册
    pub fn register_module(
        &mut self,
        host: &mut dyn RibbonHost,
        module: &CommandModule,
    ) -> RegistryResult<Vec<RegistryEntry>> {
        let definitions = discover(module);
        let mut entries = Vec::with_capacity(definitions.len());

        for definition in &definitions {
            let metadata = definition.effective_metadata(&self.config.default_panel);
            entries.push(self.register(host, module, definition, &metadata)?);
        }

        info!("模块 {} 注册了 {} 个命令", module.name(), entries.len());
        Ok(entries)
    }

    /// 为一个命令创建按钮并记录其宿主命令标识
    ///
    /// 面板、按钮组、按钮或命令标识失败时返回结构性错误；外观属性失败只记录日志。
    pub fn register(
        &mut self,
        host: &mut dyn RibbonHost,
        module: &CommandModule,
        definition: &CommandDefinition,
        metadata: &EffectiveMetadata,
    ) -> RegistryResult<RegistryEntry> {
        let key = definition.key.as_str();
        let structural = |e| RegistryError::structural(key, e);
        let resource_root = self.config.resource_root(module.name());

        let panel = host
            .create_panel(module.name(), &metadata.panel)
            .map_err(structural)?;

        let (parent, group) = match metadata.pulldown_group() {
            None => (ButtonParent::Panel(panel), None),
            Some(group) => {
                let container_key = group_key(module.name(), group);
                let (handle, created) = host
                    .add_or_get_group(panel, &container_key, group)
                    .map_err(structural)?;

                if created {
                    if let Some(entry) = module.group_metadata(group) {
                        let report = ButtonParam::from_entry(entry).apply(
                            host,
                            ItemHandle::Group(handle),
                            &resource_root,
                        );
                        debug!("按钮组 {} 外观: {:?}", container_key, report);
                    }
                }

                (ButtonParent::Group(handle), Some(container_key))
            }
        };

        let button = host
            .add_button(parent, key, &metadata.name)
            .map_err(structural)?;
        let host_id = host.command_id(button).map_err(structural)?;

        let report = ButtonParam::from_metadata(metadata).apply(
            host,
            ItemHandle::Button(button),
            &resource_root,
        );
        if !report.failed.is_empty() {
            debug!("命令 {} 部分外观属性设置失败: {:?}", key, report.failed);
        }

        let entry = RegistryEntry {
            key: key.to_string(),
            module: module.name().to_string(),
            host_id,
            panel: metadata.panel.clone(),
            group,
            display_name: metadata.name.clone(),
        };
        self.table.insert(entry.clone(), definition.factory.clone())?;

        debug!("注册命令 {} -> {}", entry.key, entry.host_id);
        Ok(entry)
    }
}
