//! 强制亲和模式
//!
//! 打开后所有声明为后台调度的命令都在调用线程上同步执行，
//! 用于让测试摆脱线程切换。这是进程级开关，修改它的测试需要串行执行。

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

static FORCE_AFFINE: AtomicBool = AtomicBool::new(false);

pub fn set_force_affine(enabled: bool) -> bool {
    let previous = FORCE_AFFINE.swap(enabled, Ordering::SeqCst);
    if previous != enabled {
        debug!("强制亲和模式: {} -> {}", previous, enabled);
    }
    previous
}

pub fn is_force_affine() -> bool {
    FORCE_AFFINE.load(Ordering::SeqCst)
}

/// 作用域内强制亲和模式，离开作用域时恢复原值
#[must_use = "guard 被丢弃时立即恢复原值"]
pub struct ForceAffineGuard {
    previous: bool,
}

impl ForceAffineGuard {
    pub fn enable() -> Self {
        Self {
            previous: set_force_affine(true),
        }
    }

    pub fn disable() -> Self {
        Self {
            previous: set_force_affine(false),
        }
    }
}

impl Drop for ForceAffineGuard {
    fn drop(&mut self) {
        set_force_affine(self.previous);
    }
}
