//! 单题倒计时 - 业务能力层
//!
//! 剩余秒数在每次变化后写入 `TimerStore`，进程重启后从存储恢复而不是重置。
//! 只有提交（手动或超时）才删除存储项；离开题目本身不删除。

use std::sync::Arc;

use tracing::debug;

use crate::error::AppResult;
use crate::infrastructure::{TimerKey, TimerStore};

/// 一次 tick 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running(u32),
    Expired,
}

pub struct Countdown {
    key: TimerKey,
    remaining: u32,
    store: Arc<dyn TimerStore>,
}

impl Countdown {
    /// 有存储值则恢复，否则从本题限时开始并立即写入
    pub fn resume_or_start(
        store: Arc<dyn TimerStore>,
        key: TimerKey,
        allotment_secs: u32,
    ) -> AppResult<Self> {
        let remaining = match store.load(&key)? {
            Some(saved) => {
                debug!("⏱️ 恢复计时器 {}: 剩余 {} 秒", key, saved);
                saved
            }
            None => {
                store.save(&key, allotment_secs)?;
                debug!("⏱️ 新建计时器 {}: {} 秒", key, allotment_secs);
                allotment_secs
            }
        };

        Ok(Self {
            key,
            remaining,
            store,
        })
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn key(&self) -> &TimerKey {
        &self.key
    }

    pub fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// 减少一秒并持久化；到零时删除存储项并返回 `Expired`
    pub fn tick(&mut self) -> AppResult<TickOutcome> {
        if self.remaining <= 1 {
            self.remaining = 0;
            self.store.remove(&self.key)?;
            return Ok(TickOutcome::Expired);
        }

        self.remaining -= 1;
        self.store.save(&self.key, self.remaining)?;
        Ok(TickOutcome::Running(self.remaining))
    }

    /// 提交时调用：删除存储项
    pub fn clear(&mut self) -> AppResult<()> {
        self.store.remove(&self.key)
    }

    pub fn display(&self) -> String {
        format_remaining(self.remaining)
    }
}

/// 格式化为 `MM:SS`
pub fn format_remaining(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::MemoryTimerStore;

    fn store() -> Arc<MemoryTimerStore> {
        Arc::new(MemoryTimerStore::new())
    }

    #[test]
    fn starts_from_allotment_and_persists_immediately() {
        let store = store();
        let key = TimerKey::new("s1", "q1");
        let countdown = Countdown::resume_or_start(store.clone(), key.clone(), 60).unwrap();
        assert_eq!(countdown.remaining(), 60);
        assert_eq!(store.load(&key).unwrap(), Some(60));
    }

    #[test]
    fn resumes_after_reload() {
        let store = store();
        let key = TimerKey::new("s1", "q1");
        let mut first = Countdown::resume_or_start(store.clone(), key.clone(), 60).unwrap();
        for _ in 0..45 {
            first.tick().unwrap();
        }
        drop(first);

        let resumed = Countdown::resume_or_start(store.clone(), key, 60).unwrap();
        assert_eq!(resumed.remaining(), 15);
        assert_eq!(resumed.display(), "00:15");
    }

    #[test]
    fn expiry_removes_the_key() {
        let store = store();
        let key = TimerKey::new("s1", "q1");
        let mut countdown = Countdown::resume_or_start(store.clone(), key.clone(), 2).unwrap();
        assert_eq!(countdown.tick().unwrap(), TickOutcome::Running(1));
        assert_eq!(store.load(&key).unwrap(), Some(1));
        assert_eq!(countdown.tick().unwrap(), TickOutcome::Expired);
        assert_eq!(store.load(&key).unwrap(), None);
        assert!(countdown.is_expired());
    }

    #[test]
    fn unspecified_allotment_is_already_expired() {
        let store = store();
        let mut countdown =
            Countdown::resume_or_start(store.clone(), TimerKey::new("s1", "q1"), 0).unwrap();
        assert!(countdown.is_expired());
        assert_eq!(countdown.tick().unwrap(), TickOutcome::Expired);
        assert!(store.is_empty());
    }

    #[test]
    fn other_question_never_reads_stale_entry() {
        let store = store();
        store.save(&TimerKey::new("s1", "q1"), 5).unwrap();
        let countdown =
            Countdown::resume_or_start(store.clone(), TimerKey::new("s1", "q2"), 60).unwrap();
        assert_eq!(countdown.remaining(), 60);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(75), "01:15");
        assert_eq!(format_remaining(3600), "60:00");
    }
}
