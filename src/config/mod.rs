/*!
 * 框架配置模块
 *
 * 提供基于 TOML 格式的配置加载、环境变量覆盖、验证，以及全局只读访问。
 */

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, ConfigResult};
pub use manager::ConfigManager;
pub use types::*;

/// 默认配置文件搜索路径（按优先级）
pub const CONFIG_FILE_CANDIDATES: &[&str] = &["ribbonkit.toml", "config/ribbonkit.toml"];

/// 用户配置目录下的子目录与文件名
pub const USER_CONFIG_DIR: &str = "ribbonkit";
pub const CONFIG_FILE_NAME: &str = "ribbonkit.toml";

/// 环境变量前缀
pub const ENV_PREFIX: &str = "RIBBONKIT_";
