#![forbid(unsafe_code)]

pub mod bank_file;
pub mod repository;
pub mod snapshot;
pub mod sqlite;

pub use repository::{InMemoryRepository, KeyValueStore, Storage, StorageError};
pub use snapshot::{QuizStateStore, STATE_KEY};
