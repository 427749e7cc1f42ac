use thiserror::Error;

use crate::bridge::BridgeError;
use crate::registry::host::{HostCommandId, HostError};

pub type RegistryResult<T> = Result<T, RegistryError>;

/// 命令注册与调用错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// 面板、按钮组、按钮或命令标识创建失败，模块启动中止
    #[error("Ribbon structure failed for command '{key}': {source}")]
    Structural {
        key: String,
        #[source]
        source: HostError,
    },
    #[error("Command key '{key}' is already registered")]
    DuplicateKey { key: String },
    #[error("Unknown command id: {id}")]
    UnknownCommand { id: HostCommandId },
    #[error("Command table of module '{module}' has already been published")]
    AlreadyPublished { module: String },
    #[error("Command invocation failed: {0}")]
    Invocation(#[from] BridgeError),
}

impl RegistryError {
    pub fn structural(key: impl Into<String>, source: HostError) -> Self {
        Self::Structural {
            key: key.into(),
            source,
        }
    }

    /// 结构性错误会中止模块启动
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. } | Self::DuplicateKey { .. })
    }
}
