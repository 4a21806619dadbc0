#![forbid(unsafe_code)]

mod mapping;
pub mod repository;
pub mod sqlite;

pub use repository::{
    AnswerSnapshot, AnswerStore, InMemoryStore, ReportRecord, ReportStore, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteStore};
