#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;

pub use quiz_core::Clock;

pub use error::QuizServiceError;
pub use quiz::{
    DEFAULT_SESSION_TTL_MINUTES, QuestionView, QuizService, QuizView, RegistrationForm, shuffled,
};
