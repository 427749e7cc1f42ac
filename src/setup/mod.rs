//! 插件模块启动

pub mod error;

pub use error::{SetupError, SetupResult};

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::command::CommandModule;
use crate::config::FrameworkConfig;
use crate::registry::{store, CommandRegistry, CommandTable, RegistryError, RibbonHost};

/// 一个插件模块及其启动配置
#[derive(Debug, Clone)]
pub struct PluginApp {
    module: CommandModule,
    config: FrameworkConfig,
}

impl PluginApp {
    pub fn new(module: CommandModule, config: FrameworkConfig) -> Self {
        Self { module, config }
    }

    pub fn module(&self) -> &CommandModule {
        &self.module
    }

    pub fn config(&self) -> &FrameworkConfig {
        &self.config
    }

    /// 用户数据目录下以模块命名的标记文件
    pub fn marker_file(&self) -> Option<PathBuf> {
        self.config
            .startup
            .resolve_data_dir()
            .map(|dir| dir.join(format!("{}.txt", self.module.name())))
    }

    /// 创建模块的功能区并清理标记文件
    ///
    /// 配置无效或功能区结构创建失败时中止并返回错误；标记文件清理失败不影响启动。
    pub fn on_startup(&self, host: &mut dyn RibbonHost) -> SetupResult<CommandTable> {
        self.config.validate()?;

        let mut registry = CommandRegistry::new(self.config.ribbon.clone());
        registry.register_module(host, &self.module)?;

        if self.config.startup.clear_marker_file {
            self.clear_marker_file();
        }

        info!("模块 {} 启动完成", self.module.name());
        Ok(registry.into_table())
    }

    /// 启动并发布到进程级命令表
    ///
    /// 同一模块只能启动一次，重复启动时不会再次改动宿主界面。
    pub fn start(&self, host: &mut dyn RibbonHost) -> SetupResult<Arc<CommandTable>> {
        let name = self.module.name();
        if store::is_published(name) {
            return Err(RegistryError::AlreadyPublished {
                module: name.to_string(),
            }
            .into());
        }

        let table = self.on_startup(host)?;
        Ok(store::publish(name, table)?)
    }

    /// 删除标记文件，返回是否删除了文件
    pub fn clear_marker_file(&self) -> bool {
        let Some(path) = self.marker_file() else {
            debug!("无法确定用户数据目录，跳过标记文件清理");
            return false;
        };

        if !path.exists() {
            return false;
        }

        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("已删除标记文件: {:?}", path);
                true
            }
            Err(e) => {
                debug!("删除标记文件失败，已忽略: {:?} - {}", path, e);
                false
            }
        }
    }
}
