//! 计时器持久化存储 - 基础设施层
//!
//! 以 (sessionId, questionId) 为键保存剩余秒数，重启进程后仍可恢复倒计时。
//! 同一键被多个进程同时写入时以最后一次写入为准。

use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::error::{AppError, AppResult, FileError};

/// 计时器存储键，格式 `timer_{sessionId}_{questionId}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimerKey(String);

impl TimerKey {
    pub fn new(session_id: &str, question_id: &str) -> Self {
        Self(format!("timer_{}_{}", session_id, question_id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TimerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 持久化键值存储
pub trait TimerStore: Send + Sync {
    fn load(&self, key: &TimerKey) -> AppResult<Option<u32>>;
    fn save(&self, key: &TimerKey, remaining_secs: u32) -> AppResult<()>;
    fn remove(&self, key: &TimerKey) -> AppResult<()>;
}

/// 内存存储，进程退出即丢失
#[derive(Default)]
pub struct MemoryTimerStore {
    entries: Mutex<HashMap<TimerKey, u32>>,
}

impl MemoryTimerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TimerStore for MemoryTimerStore {
    fn load(&self, key: &TimerKey) -> AppResult<Option<u32>> {
        let entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(entries.get(key).copied())
    }

    fn save(&self, key: &TimerKey, remaining_secs: u32) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.insert(key.clone(), remaining_secs);
        Ok(())
    }

    fn remove(&self, key: &TimerKey) -> AppResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// JSON 文件存储
///
/// 每次操作都重新读取整个文件，写入时先写临时文件再重命名
pub struct FileTimerStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTimerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> AppResult<BTreeMap<String, u32>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AppError::file_read_failed(self.path.display().to_string(), e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            AppError::File(FileError::CorruptStore {
                path: self.path.display().to_string(),
                source: Box::new(e),
            })
        })
    }

    fn write_all(&self, entries: &BTreeMap<String, u32>) -> AppResult<()> {
        let tmp = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&tmp, content)
            .map_err(|e| AppError::file_write_failed(tmp.display().to_string(), e))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| AppError::file_write_failed(self.path.display().to_string(), e))?;
        Ok(())
    }
}

impl TimerStore for FileTimerStore {
    fn load(&self, key: &TimerKey) -> AppResult<Option<u32>> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self.read_all()?.get(key.as_str()).copied())
    }

    fn save(&self, key: &TimerKey, remaining_secs: u32) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), remaining_secs);
        self.write_all(&entries)
    }

    fn remove(&self, key: &TimerKey) -> AppResult<()> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut entries = self.read_all()?;
        if entries.remove(key.as_str()).is_some() {
            debug!("🗑️ 删除计时器 {}", key);
            self.write_all(&entries)?;
        }
        Ok(())
    }
}
