/*!
 * 错误处理模块
 *
 * 基于 anyhow 的统一错误处理系统，命令的各阶段统一返回 AppResult。
 * 各子系统边界上的结构化错误使用各自的 thiserror 枚举。
 */

use anyhow::{anyhow, Result as AnyhowResult};
use std::any::Any;

/// 统一的应用程序结果类型
pub type AppResult<T> = AnyhowResult<T>;

/// 统一的应用程序错误类型
pub type AppError = anyhow::Error;

// ============================================================================
// 便捷的错误处理工具函数
// ============================================================================

/// 创建简单的应用程序错误
pub fn app_error(msg: impl Into<String>) -> AppError {
    anyhow!(msg.into())
}

/// 从 panic 负载中提取可读信息
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "未知panic".to_string()
    }
}
