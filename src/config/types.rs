//! 框架配置类型

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::ENV_PREFIX;

/// 框架配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameworkConfig {
    /// Ribbon 注册配置
    pub ribbon: RibbonConfig,
    /// 执行桥配置
    pub execution: ExecutionConfig,
    /// 对话框生命周期配置
    pub dialog: DialogConfig,
    /// 启动配置
    pub startup: StartupConfig,
}

/// Ribbon 注册配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RibbonConfig {
    /// 命令未声明面板时使用的面板名
    pub default_panel: String,
    /// 资源路径前缀模板，`{module}` 会被替换为模块名
    pub resource_root_template: String,
}

/// 执行桥配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionConfig {
    /// 后台工作线程数（None 表示按 CPU 数量）
    pub worker_threads: Option<usize>,
    /// 后台任务队列容量
    pub job_queue_capacity: usize,
    /// 亲和线程收件箱容量
    pub affinity_queue_capacity: usize,
}

/// 对话框生命周期配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialogConfig {
    /// 关闭前等待界面对象出现的轮询次数
    pub close_poll_attempts: u32,
    /// 每次轮询间隔（毫秒）
    pub close_poll_interval_ms: u64,
}

/// 启动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartupConfig {
    /// 用户数据目录（标记文件所在目录），None 时使用系统数据目录
    pub data_dir: Option<PathBuf>,
    /// 启动时是否清理模块标记文件
    pub clear_marker_file: bool,
}

impl Default for RibbonConfig {
    fn default() -> Self {
        Self {
            default_panel: "Default".to_string(),
            resource_root_template: "/{module};component/".to_string(),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            worker_threads: None, // 使用系统默认
            job_queue_capacity: 256,
            affinity_queue_capacity: 1024,
        }
    }
}

impl Default for DialogConfig {
    fn default() -> Self {
        Self {
            close_poll_attempts: 10,
            close_poll_interval_ms: 100,
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            clear_marker_file: true,
        }
    }
}

impl RibbonConfig {
    /// 模块的资源根路径
    pub fn resource_root(&self, module: &str) -> String {
        self.resource_root_template.replace("{module}", module)
    }
}

impl ExecutionConfig {
    /// 实际使用的工作线程数
    pub fn effective_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(2)
        })
    }
}

impl DialogConfig {
    pub fn close_poll_interval(&self) -> Duration {
        Duration::from_millis(self.close_poll_interval_ms)
    }
}

impl StartupConfig {
    /// 解析标记文件目录
    pub fn resolve_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(dirs::data_dir)
    }
}

impl FrameworkConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("从文件加载配置: {:?}", path);

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;

        info!("配置加载成功: {:?}", path);
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!("配置保存成功: {:?}", path);
        Ok(())
    }

    /// 从环境变量覆盖配置
    pub fn override_from_env(&mut self) {
        self.override_with(|key| std::env::var(key).ok());
    }

    /// 使用给定的查找函数覆盖配置，便于测试
    pub fn override_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(panel) = var("DEFAULT_PANEL") {
            debug!("从环境变量设置 ribbon.default_panel = {}", panel);
            self.ribbon.default_panel = panel;
        }

        if let Some(threads) = var("WORKER_THREADS").and_then(|v| v.parse::<usize>().ok()) {
            self.execution.worker_threads = Some(threads);
            debug!("从环境变量设置 execution.worker_threads = {}", threads);
        }

        if let Some(capacity) = var("AFFINITY_QUEUE_CAPACITY").and_then(|v| v.parse::<usize>().ok())
        {
            self.execution.affinity_queue_capacity = capacity;
            debug!("从环境变量设置 execution.affinity_queue_capacity = {}", capacity);
        }

        if let Some(attempts) = var("DIALOG_POLL_ATTEMPTS").and_then(|v| v.parse::<u32>().ok()) {
            self.dialog.close_poll_attempts = attempts;
            debug!("从环境变量设置 dialog.close_poll_attempts = {}", attempts);
        }

        if let Some(interval) = var("DIALOG_POLL_INTERVAL_MS").and_then(|v| v.parse::<u64>().ok())
        {
            self.dialog.close_poll_interval_ms = interval;
            debug!("从环境变量设置 dialog.close_poll_interval_ms = {}", interval);
        }

        if let Some(dir) = var("DATA_DIR") {
            debug!("从环境变量设置 startup.data_dir = {}", dir);
            self.startup.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ribbon.default_panel.trim().is_empty() {
            return Err(ConfigError::validation(
                "ribbon.defaultPanel",
                "默认面板名不能为空",
            ));
        }

        if self.execution.worker_threads == Some(0) {
            return Err(ConfigError::validation(
                "execution.workerThreads",
                "工作线程数不能为0",
            ));
        }

        if self.execution.job_queue_capacity == 0 {
            return Err(ConfigError::validation(
                "execution.jobQueueCapacity",
                "任务队列容量不能为0",
            ));
        }

        if self.execution.affinity_queue_capacity == 0 {
            return Err(ConfigError::validation(
                "execution.affinityQueueCapacity",
                "亲和线程收件箱容量不能为0",
            ));
        }

        debug!("配置验证通过");
        Ok(())
    }
}
