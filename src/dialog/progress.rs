//! 进度跟踪与剩余时间估算

use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// 某一时刻的进度
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    /// 0..=100
    pub percent: f64,
    pub elapsed: Duration,
    pub remaining: Duration,
}

/// 按已用时间和完成比例线性估算剩余时间
///
/// `remaining = elapsed / r * (1 - r)`，其中 `r = percent / 100`；percent 为 0 时返回 0。
pub fn estimate_remaining(elapsed: Duration, percent: f64) -> Duration {
    let percent = clamp_percent(percent);
    if percent <= 0.0 {
        return Duration::ZERO;
    }
    let ratio = percent / 100.0;
    Duration::from_secs_f64(elapsed.as_secs_f64() / ratio * (1.0 - ratio))
}

fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

/// 进度跟踪器
///
/// 以基准时刻计算已用时间，percent 为 0 时重置基准。
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    baseline: Instant,
    last: Option<ProgressSnapshot>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::starting_at(Instant::now())
    }
}

impl ProgressTracker {
    pub fn starting_at(baseline: Instant) -> Self {
        Self {
            baseline,
            last: None,
        }
    }

    pub fn update(&mut self, percent: f64) -> ProgressSnapshot {
        self.update_at(percent, Instant::now())
    }

    pub fn update_at(&mut self, percent: f64, now: Instant) -> ProgressSnapshot {
        let percent = clamp_percent(percent);
        if percent == 0.0 {
            self.baseline = now;
        }

        let elapsed = now.saturating_duration_since(self.baseline);
        let snapshot = ProgressSnapshot {
            percent,
            elapsed,
            remaining: estimate_remaining(elapsed, percent),
        };
        self.last = Some(snapshot);
        snapshot
    }

    pub fn last(&self) -> Option<ProgressSnapshot> {
        self.last
    }
}

/// 对话框绑定的模型
///
/// 由对话框线程创建，之后可在任意线程读写。
pub trait DialogModel: Send + Sync + 'static {
    fn apply_progress(&self, snapshot: &ProgressSnapshot);
}

/// 默认的进度视图模型
#[derive(Debug, Default)]
pub struct ProgressViewModel {
    title: String,
    state: Mutex<Option<ProgressSnapshot>>,
}

impl ProgressViewModel {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            state: Mutex::new(None),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn percent(&self) -> f64 {
        self.snapshot().map(|s| s.percent).unwrap_or(0.0)
    }

    pub fn elapsed(&self) -> Duration {
        self.snapshot().map(|s| s.elapsed).unwrap_or_default()
    }

    pub fn remaining(&self) -> Duration {
        self.snapshot().map(|s| s.remaining).unwrap_or_default()
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        *self.state.lock()
    }
}

impl DialogModel for ProgressViewModel {
    fn apply_progress(&self, snapshot: &ProgressSnapshot) {
        *self.state.lock() = Some(*snapshot);
    }
}
