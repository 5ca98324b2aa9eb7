use serde::Serialize;

use quiz_core::model::{Question, QuizSession, QuizStep};

/// A question as shown to the quiz taker. Never carries the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub kind: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub image_url: Option<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            kind: question.kind().to_string(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            image_url: question.image_ref().map(str::to_owned),
        }
    }
}

/// Where a browser session stands in its quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuizView {
    NotStarted,
    InProgress {
        user_name: String,
        question: QuestionView,
        index: usize,
        score: u32,
        total: usize,
        remaining: usize,
    },
    Completed {
        user_name: String,
        score: u32,
        total: usize,
    },
}

impl QuizView {
    #[must_use]
    pub fn from_session(session: &QuizSession) -> Self {
        let user_name = session.user_name().to_owned();
        let remaining = session.progress().remaining;
        match session.current() {
            QuizStep::Question {
                question,
                index,
                score,
                total,
            } => Self::InProgress {
                user_name,
                question: question.into(),
                index,
                score,
                total,
                remaining,
            },
            QuizStep::Completed(result) => Self::Completed {
                user_name,
                score: result.score,
                total: result.total,
            },
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}
