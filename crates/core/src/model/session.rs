use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::question::Question;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejections from answering. State is left untouched when one is returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("choice {index} is out of range (expected 0..4)")]
    InvalidChoice { index: i64 },

    #[error("no active question: the quiz is already completed")]
    NoActiveQuestion,
}

//
// ─── VIEWS ─────────────────────────────────────────────────────────────────────
//

/// Final score of a completed quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizResult {
    pub score: u32,
    pub total: usize,
}

/// What the quiz taker should see next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizStep<'a> {
    Question {
        question: &'a Question,
        index: usize,
        score: u32,
        total: usize,
    },
    Completed(QuizResult),
}

/// Outcome of an accepted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub score: u32,
    pub index: usize,
    pub is_complete: bool,
}

/// Aggregated view of quiz progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizProgress {
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Per-user quiz state.
///
/// Owns its own copy of the questions, so replacing the question source never
/// affects a quiz already in progress. `index` only moves forward; once it
/// reaches the number of questions the session stays completed.
///
/// `updated_at` is the last accepted activity and drives store expiry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    user_name: String,
    questions: Vec<Question>,
    index: usize,
    score: u32,
    started_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QuizSession {
    /// Start a quiz over the given (already ordered) questions.
    ///
    /// An empty question list yields a session that is completed from the start.
    #[must_use]
    pub fn start(user_name: impl Into<String>, questions: Vec<Question>, now: DateTime<Utc>) -> Self {
        let completed_at = questions.is_empty().then_some(now);
        Self {
            user_name: user_name.into(),
            questions,
            index: 0,
            score: 0,
            started_at: now,
            updated_at: now,
            completed_at,
        }
    }

    #[must_use]
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Time from start to the last answer, once the quiz is completed.
    #[must_use]
    pub fn time_taken(&self) -> Option<Duration> {
        self.completed_at.map(|done| done - self.started_at)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.index >= self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.index)
    }

    /// The question to show next, or the final result.
    #[must_use]
    pub fn current(&self) -> QuizStep<'_> {
        match self.current_question() {
            Some(question) => QuizStep::Question {
                question,
                index: self.index,
                score: self.score,
                total: self.total(),
            },
            None => QuizStep::Completed(QuizResult {
                score: self.score,
                total: self.total(),
            }),
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let total = self.total();
        let answered = self.index.min(total);
        QuizProgress {
            total,
            answered,
            remaining: total - answered,
            is_complete: self.is_complete(),
        }
    }

    /// Score the option at `selected` against the current question and advance.
    ///
    /// Negative indexes are rejected like any other out-of-range choice.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoActiveQuestion` if every question has been answered.
    /// Returns `QuizError::InvalidChoice` if `selected` is not a valid option index.
    pub fn submit(
        &mut self,
        selected: i64,
        answered_at: DateTime<Utc>,
    ) -> Result<AnswerOutcome, QuizError> {
        let question = self
            .questions
            .get(self.index)
            .ok_or(QuizError::NoActiveQuestion)?;
        let selected_text = usize::try_from(selected)
            .ok()
            .and_then(|idx| question.option(idx))
            .ok_or(QuizError::InvalidChoice { index: selected })?;

        let correct = question.is_correct(selected_text);
        if correct {
            self.score = self.score.saturating_add(1);
        }
        self.index += 1;
        self.updated_at = answered_at;
        if self.is_complete() {
            self.completed_at = Some(answered_at);
        }

        Ok(AnswerOutcome {
            correct,
            score: self.score,
            index: self.index,
            is_complete: self.is_complete(),
        })
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("user_name", &self.user_name)
            .field("questions_len", &self.questions.len())
            .field("index", &self.index)
            .field("score", &self.score)
            .field("started_at", &self.started_at)
            .field("updated_at", &self.updated_at)
            .field("completed_at", &self.completed_at)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionKind;
    use crate::time::fixed_now;
    use std::collections::HashSet;

    fn question(prompt: &str, options: [&str; 4], answer: &str) -> Question {
        Question::new(
            QuestionKind::Text,
            prompt,
            options.map(str::to_owned),
            answer,
            None,
        )
        .unwrap()
    }

    fn arithmetic() -> Question {
        question("2+2?", ["3", "4", "5", "6"], "4")
    }

    #[test]
    fn single_question_scenario() {
        let now = fixed_now();
        let mut session = QuizSession::start("ada", vec![arithmetic()], now);

        match session.current() {
            QuizStep::Question {
                question, score, ..
            } => {
                assert_eq!(question.prompt(), "2+2?");
                assert_eq!(score, 0);
            }
            QuizStep::Completed(_) => panic!("expected a question"),
        }

        let outcome = session.submit(1, now).unwrap();
        assert!(outcome.correct);
        assert_eq!(session.score(), 1);
        assert_eq!(session.index(), 1);
        assert_eq!(
            session.current(),
            QuizStep::Completed(QuizResult { score: 1, total: 1 })
        );
        assert_eq!(session.completed_at(), Some(now));
    }

    #[test]
    fn empty_quiz_is_completed_immediately() {
        let session = QuizSession::start("ada", Vec::new(), fixed_now());
        assert!(session.is_complete());
        assert_eq!(
            session.current(),
            QuizStep::Completed(QuizResult { score: 0, total: 0 })
        );
    }

    #[test]
    fn comparison_is_whitespace_and_case_insensitive() {
        let mut session = QuizSession::start(
            "ada",
            vec![question("Capital of France?", ["Lyon", " Paris ", "Nice", "Lille"], "paris")],
            fixed_now(),
        );
        let outcome = session.submit(1, fixed_now()).unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.score, 1);
    }

    #[test]
    fn wrong_answer_still_advances() {
        let mut session = QuizSession::start("ada", vec![arithmetic(), arithmetic()], fixed_now());
        let outcome = session.submit(0, fixed_now()).unwrap();
        assert!(!outcome.correct);
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.index, 1);
        assert!(!outcome.is_complete);
    }

    #[test]
    fn out_of_range_choice_leaves_state_unchanged() {
        let mut session = QuizSession::start("ada", vec![arithmetic()], fixed_now());
        let before = session.clone();

        let err = session.submit(5, fixed_now()).unwrap_err();

        assert_eq!(err, QuizError::InvalidChoice { index: 5 });
        assert_eq!(session, before);
        assert_eq!(session.index(), 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn negative_choice_is_rejected() {
        let mut session = QuizSession::start("ada", vec![arithmetic()], fixed_now());
        let before = session.clone();

        let err = session.submit(-1, fixed_now()).unwrap_err();

        assert_eq!(err, QuizError::InvalidChoice { index: -1 });
        assert_eq!(session, before);
    }

    #[test]
    fn accepted_answer_touches_updated_at() {
        let start = fixed_now();
        let later = start + Duration::minutes(3);
        let mut session = QuizSession::start("ada", vec![arithmetic(), arithmetic()], start);
        assert_eq!(session.updated_at(), start);

        session.submit(1, later).unwrap();
        assert_eq!(session.updated_at(), later);
        assert_eq!(session.time_taken(), None);

        session.submit(1, later + Duration::minutes(1)).unwrap();
        assert_eq!(session.time_taken(), Some(Duration::minutes(4)));
    }

    #[test]
    fn rejected_answer_keeps_updated_at() {
        let mut session = QuizSession::start("ada", vec![arithmetic()], fixed_now());
        session
            .submit(7, fixed_now() + Duration::hours(1))
            .unwrap_err();
        assert_eq!(session.updated_at(), fixed_now());
    }

    #[test]
    fn answering_after_completion_is_rejected() {
        let mut session = QuizSession::start("ada", vec![arithmetic()], fixed_now());
        session.submit(1, fixed_now()).unwrap();
        let before = session.clone();

        let err = session.submit(1, fixed_now()).unwrap_err();

        assert_eq!(err, QuizError::NoActiveQuestion);
        assert_eq!(session, before);
    }

    #[test]
    fn late_submission_wins_over_bad_index() {
        let mut session = QuizSession::start("ada", Vec::new(), fixed_now());
        assert_eq!(
            session.submit(9, fixed_now()).unwrap_err(),
            QuizError::NoActiveQuestion
        );
    }

    #[test]
    fn walk_visits_every_question_once() {
        let questions: Vec<Question> = (0..6)
            .map(|i| question(&format!("Q{i}"), ["a", "b", "c", "d"], "a"))
            .collect();
        let mut session = QuizSession::start("ada", questions.clone(), fixed_now());

        let mut seen = HashSet::new();
        while let QuizStep::Question { question, .. } = session.current() {
            assert!(seen.insert(question.prompt().to_owned()));
            session.submit(0, fixed_now()).unwrap();
        }

        assert_eq!(seen.len(), questions.len());
        assert_eq!(
            session.current(),
            QuizStep::Completed(QuizResult { score: 6, total: 6 })
        );
    }

    #[test]
    fn progress_tracks_answers() {
        let mut session = QuizSession::start("ada", vec![arithmetic(), arithmetic()], fixed_now());
        session.submit(2, fixed_now()).unwrap();
        assert_eq!(
            session.progress(),
            QuizProgress {
                total: 2,
                answered: 1,
                remaining: 1,
                is_complete: false,
            }
        );
    }

    #[test]
    fn session_survives_json_roundtrip() {
        let mut session = QuizSession::start("ada", vec![arithmetic()], fixed_now());
        session.submit(1, fixed_now()).unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let back: QuizSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
    }
}
