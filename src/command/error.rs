use thiserror::Error;

/// 命令声明校验错误
///
/// 发现阶段只记录并跳过出错的声明，模块整体不会失败。
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("Command declaration #{index} in module '{module}' has an empty key")]
    EmptyKey { module: String, index: usize },
    #[error("Duplicate command key '{key}' in module '{module}'")]
    DuplicateKey { module: String, key: String },
    #[error("Command '{key}' in module '{module}' has no factory")]
    MissingFactory { module: String, key: String },
}

impl DiscoveryError {
    /// 出错声明的命令键（空键时为 None）
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::EmptyKey { .. } => None,
            Self::DuplicateKey { key, .. } | Self::MissingFactory { key, .. } => Some(key),
        }
    }
}
