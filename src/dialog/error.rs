use thiserror::Error;

pub type DialogResult<T> = Result<T, DialogError>;

/// 对话框生命周期错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("Dialog thread spawn failed: {message}")]
    Spawn { message: String },
    #[error("Dialog did not materialize after {attempts} attempts ({interval_ms}ms interval)")]
    Timeout { attempts: u32, interval_ms: u64 },
    #[error("Dialog session is closed")]
    Closed,
}

impl DialogError {
    pub fn spawn(message: impl Into<String>) -> Self {
        Self::Spawn {
            message: message.into(),
        }
    }

    /// 超时和已关闭都不影响命令本身
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Spawn { .. })
    }
}
