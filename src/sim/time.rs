//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。一个"虚拟时间单位"对应 1 秒（1e9 tick）。

use serde::{Deserialize, Serialize};

/// 仿真时间（纳秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);
    const NANOS_PER_SEC: f64 = 1_000_000_000.0;

    pub fn from_micros(us: u64) -> SimTime {
        SimTime(us.saturating_mul(1_000))
    }
    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }
    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000_000_000))
    }

    /// 从浮点虚拟时间单位构造；负数与 NaN 视为 0。
    pub fn from_secs_f64(s: f64) -> SimTime {
        if s.is_nan() || s <= 0.0 {
            return SimTime::ZERO;
        }
        let nanos = (s * Self::NANOS_PER_SEC).round();
        if nanos >= u64::MAX as f64 {
            SimTime(u64::MAX)
        } else {
            SimTime(nanos as u64)
        }
    }

    /// 以虚拟时间单位表示
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::NANOS_PER_SEC
    }

    pub fn saturating_add(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }
}
