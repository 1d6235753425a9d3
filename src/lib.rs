// taskboard - Local task list with due dates, filtered views, and pluggable persistence

pub mod clock;
pub mod config;
pub mod due;
pub mod error;
pub mod filter;
pub mod kv;
pub mod models;
pub mod snapshot;
pub mod sqlite;
pub mod store;

// Re-export main types for convenience
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{Backend, Config};
pub use error::{Result, TaskError};
pub use filter::TaskFilter;
pub use kv::{FileKv, KvStore, MemoryKv, UnavailableKv};
pub use models::{Stats, Task, TaskId};
pub use sqlite::SqliteKv;
pub use store::TaskStore;
