// 工具模块

pub mod error;

pub mod logging;

pub use error::{app_error, panic_message, AppError, AppResult};
pub use logging::init_logging;
