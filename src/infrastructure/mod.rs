pub mod http_executor;
pub mod timer_store;

pub use http_executor::HttpExecutor;
pub use timer_store::{FileTimerStore, MemoryTimerStore, TimerKey, TimerStore};
