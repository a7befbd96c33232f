//! Persistence layer for onboarding progress.

pub mod json_file;
pub mod libsql_backend;
pub mod memory;
pub mod migrations;
pub mod traits;

pub use json_file::JsonFileBackend;
pub use libsql_backend::LibSqlBackend;
pub use memory::MemoryBackend;
pub use traits::{
    EditOutcome, ProgressBackend, RecordEdit, RecordMutation, UpdatedRecord, mutation,
};
