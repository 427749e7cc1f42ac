//! 执行桥错误类型

use std::panic::{catch_unwind, AssertUnwindSafe};

use thiserror::Error;
use tracing::{error, warn};

use crate::utils::{panic_message, AppResult};

/// 执行桥错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// 前置阶段失败，主体与后置阶段均未执行
    #[error("前置阶段失败: {message}")]
    PreExecute { message: String },

    /// 主体执行失败（后置阶段已执行）
    #[error("命令执行失败: {message}")]
    Execution { message: String },

    /// 主体成功但后置阶段失败
    #[error("后置阶段失败: {message}")]
    PostExecute { message: String },

    /// 亲和线程上的委托发生 panic
    #[error("亲和线程委托panic: {message}")]
    HandoffPanicked { message: String },

    /// 委托通道已断开
    #[error("通道已断开: {operation}")]
    Disconnected { operation: String },

    /// 等待委托结果超时
    #[error("等待超时: {operation} (超时: {timeout_ms}ms)")]
    Timeout { operation: String, timeout_ms: u64 },

    /// 同一次执行只能绑定一个对话框
    #[error("执行上下文已绑定对话框")]
    DialogAlreadyAttached,
}

impl BridgeError {
    pub fn pre_execute(message: impl Into<String>) -> Self {
        Self::PreExecute {
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    pub fn post_execute(message: impl Into<String>) -> Self {
        Self::PostExecute {
            message: message.into(),
        }
    }

    pub fn handoff_panicked(message: impl Into<String>) -> Self {
        Self::HandoffPanicked {
            message: message.into(),
        }
    }

    pub fn disconnected(operation: impl Into<String>) -> Self {
        Self::Disconnected {
            operation: operation.into(),
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::PreExecute { .. } | Self::PostExecute { .. } => ErrorSeverity::Medium,
            Self::Execution { .. } => ErrorSeverity::High,
            Self::HandoffPanicked { .. } => ErrorSeverity::High,
            Self::Disconnected { .. } => ErrorSeverity::Critical,
            Self::Timeout { .. } => ErrorSeverity::Medium,
            Self::DialogAlreadyAttached => ErrorSeverity::Low,
        }
    }

    /// 宿主可以继续接受后续调用
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Disconnected { .. })
    }

    pub fn log(&self) {
        match self.severity() {
            ErrorSeverity::Critical => error!("CRITICAL: {}", self),
            ErrorSeverity::High => error!("HIGH: {}", self),
            ErrorSeverity::Medium => warn!("MEDIUM: {}", self),
            ErrorSeverity::Low => warn!("LOW: {}", self),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

pub type BridgeResult<T> = Result<T, BridgeError>;

/// 执行一个命令阶段，把返回的错误和 panic 都折叠为错误信息
pub(crate) fn run_stage<F>(stage: F) -> Result<(), String>
where
    F: FnOnce() -> AppResult<()>,
{
    match catch_unwind(AssertUnwindSafe(stage)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(format!("{:#}", err)),
        Err(payload) => Err(format!("panic: {}", panic_message(payload.as_ref()))),
    }
}

/// 执行委托，panic 转换为 `HandoffPanicked`
pub(crate) fn run_delegate<T, F>(delegate: F) -> BridgeResult<T>
where
    F: FnOnce() -> T,
{
    catch_unwind(AssertUnwindSafe(delegate))
        .map_err(|payload| BridgeError::handoff_panicked(panic_message(payload.as_ref())))
}
