mod plan;
mod service;
mod view;

pub use plan::shuffled;
pub use service::{DEFAULT_SESSION_TTL_MINUTES, QuizService, RegistrationForm};
pub use view::{QuestionView, QuizView};
