#![forbid(unsafe_code)]

pub mod question_source;
pub mod repository;
pub mod sqlite;

pub use question_source::{DataFormatError, QuestionSource, Table, UploadError, load_questions};
pub use repository::{
    InMemoryRepository, RegistrationSink, SessionStore, Storage, StorageError,
};
