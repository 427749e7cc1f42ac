//! 模态对话框生命周期与进度报告

pub mod command;
pub mod controller;
pub mod error;
pub mod progress;

pub use command::{DialogCommand, WithDialog};
pub use controller::{
    CloseOutcome, DetachedDialog, DialogLifecycleController, DialogSession, DialogView,
};
pub use error::{DialogError, DialogResult};
pub use progress::{
    estimate_remaining, DialogModel, ProgressSnapshot, ProgressTracker, ProgressViewModel,
};
