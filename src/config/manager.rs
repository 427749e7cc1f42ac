/*!
 * 全局配置管理器
 *
 * 启动阶段初始化一次，之后只读访问。
 */

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

use super::error::{ConfigError, ConfigResult};
use super::types::FrameworkConfig;
use super::{CONFIG_FILE_CANDIDATES, CONFIG_FILE_NAME, USER_CONFIG_DIR};

/// 全局配置
static GLOBAL_CONFIG: OnceLock<Arc<RwLock<FrameworkConfig>>> = OnceLock::new();

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 初始化全局配置（按优先级：文件 -> 环境变量 -> 默认值）
    pub fn init() -> ConfigResult<()> {
        let config = Self::load_config()?;
        Self::init_with(config)
    }

    /// 使用给定配置初始化全局配置
    pub fn init_with(config: FrameworkConfig) -> ConfigResult<()> {
        config.validate()?;
        GLOBAL_CONFIG
            .set(Arc::new(RwLock::new(config)))
            .map_err(|_| ConfigError::AlreadyInitialized)?;
        info!("配置管理器初始化成功");
        Ok(())
    }

    /// 获取全局配置
    pub fn get() -> Arc<RwLock<FrameworkConfig>> {
        GLOBAL_CONFIG
            .get_or_init(|| {
                warn!("配置管理器未初始化，使用默认配置");
                Arc::new(RwLock::new(FrameworkConfig::default()))
            })
            .clone()
    }

    /// 获取配置的只读副本
    pub fn get_config() -> FrameworkConfig {
        Self::get().read().clone()
    }

    /// 是否已初始化
    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }

    fn load_config() -> ConfigResult<FrameworkConfig> {
        let mut config = FrameworkConfig::default();

        for path in Self::candidate_paths() {
            if path.exists() {
                match FrameworkConfig::from_file(&path) {
                    Ok(file_config) => {
                        config = file_config;
                        break;
                    }
                    Err(e) => {
                        warn!("加载配置文件失败 {:?}: {}", path, e);
                    }
                }
            }
        }

        config.override_from_env();
        config.validate()?;
        Ok(config)
    }

    /// 工作目录下的候选文件，然后是用户配置目录
    pub fn candidate_paths() -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = CONFIG_FILE_CANDIDATES.iter().map(PathBuf::from).collect();
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join(USER_CONFIG_DIR).join(CONFIG_FILE_NAME));
        }
        paths
    }
}
