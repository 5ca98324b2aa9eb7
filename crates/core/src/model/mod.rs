mod ids;
mod question;
mod registration;
mod session;

pub use ids::{ParseIdError, RegistrationId, SessionId};
pub use question::{OPTION_COUNT, Question, QuestionError, QuestionKind, answers_match};
pub use registration::{Registration, RegistrationError};
pub use session::{AnswerOutcome, QuizError, QuizProgress, QuizResult, QuizSession, QuizStep};
