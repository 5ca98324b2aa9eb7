use std::fmt;
use std::sync::Arc;

use chrono::Duration;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

use quiz_core::model::{AnswerOutcome, Question, QuizSession, Registration, SessionId};
use storage::question_source::QuestionSource;
use storage::repository::{RegistrationSink, SessionStore, Storage};

use crate::Clock;
use crate::error::QuizServiceError;
use crate::quiz::plan::shuffled;
use crate::quiz::view::QuizView;

/// Sessions idle for longer than this are evicted.
pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 24 * 60;

/// Registration form as submitted by the browser.
///
/// Only `name` is required; the other fields default to empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RegistrationForm {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub notice_period: String,
}

/// Orchestrates registration, quiz progression and question uploads.
///
/// Each started session gets its own shuffled copy of the current question
/// set; later uploads only affect sessions started afterwards. Sessions with
/// no accepted activity within the TTL read as not started and are swept
/// whenever a new quiz starts.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    source: QuestionSource,
    sessions: Arc<dyn SessionStore>,
    registrations: Arc<dyn RegistrationSink>,
    session_ttl: Duration,
    seed: Option<u64>,
}

impl QuizService {
    #[must_use]
    pub fn new(
        clock: Clock,
        source: QuestionSource,
        sessions: Arc<dyn SessionStore>,
        registrations: Arc<dyn RegistrationSink>,
    ) -> Self {
        Self {
            clock,
            source,
            sessions,
            registrations,
            session_ttl: Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            seed: None,
        }
    }

    #[must_use]
    pub fn from_storage(clock: Clock, source: QuestionSource, storage: &Storage) -> Self {
        Self::new(
            clock,
            source,
            Arc::clone(&storage.sessions),
            Arc::clone(&storage.registrations),
        )
    }

    /// Use a fixed seed for shuffling so question order is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn source(&self) -> &QuestionSource {
        &self.source
    }

    fn shuffle(&self, questions: &[Question]) -> Vec<Question> {
        match self.seed {
            Some(seed) => shuffled(questions, &mut StdRng::seed_from_u64(seed)),
            None => shuffled(questions, &mut rand::rng()),
        }
    }

    /// Load the session unless it has been idle past the TTL; expired state is dropped.
    async fn load_live(
        &self,
        session_id: SessionId,
    ) -> Result<Option<QuizSession>, QuizServiceError> {
        let Some(session) = self.sessions.load(session_id).await? else {
            return Ok(None);
        };
        if session.updated_at() < self.clock.cutoff(self.session_ttl) {
            self.sessions.remove(session_id).await?;
            tracing::debug!(%session_id, "expired session dropped");
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Record the registration and start a fresh quiz for the session.
    ///
    /// Failing to record the registration is logged and does not block the quiz.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Registration` if the name is blank.
    /// Otherwise see [`QuizService::start`].
    pub async fn register(
        &self,
        session_id: SessionId,
        form: RegistrationForm,
    ) -> Result<QuizView, QuizServiceError> {
        let registration = Registration::new(
            form.name,
            form.phone,
            form.experience,
            form.company,
            form.notice_period,
            self.clock.now(),
        )?;

        match self.registrations.record(&registration).await {
            Ok(id) => tracing::info!(registration_id = %id, "registration recorded"),
            Err(err) => tracing::warn!(error = %err, "could not record registration"),
        }

        self.start(session_id, registration.name()).await
    }

    /// Start (or restart) a quiz: load the current question set, shuffle a
    /// copy and store it with index and score at zero.
    ///
    /// Idle sessions are swept first; a failed sweep is logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::DataFormat` if the question file is malformed.
    /// Returns `QuizServiceError::Task` if the blocking load is cancelled.
    /// Returns `QuizServiceError::Storage` if the session cannot be saved.
    pub async fn start(
        &self,
        session_id: SessionId,
        user_name: &str,
    ) -> Result<QuizView, QuizServiceError> {
        let source = self.source.clone();
        let questions = tokio::task::spawn_blocking(move || source.load()).await??;

        match self.sessions.prune(self.clock.cutoff(self.session_ttl)).await {
            Ok(0) => {}
            Ok(dropped) => tracing::debug!(dropped, "idle sessions evicted"),
            Err(err) => tracing::warn!(error = %err, "could not evict idle sessions"),
        }

        let session = QuizSession::start(user_name, self.shuffle(&questions), self.clock.now());
        self.sessions.save(session_id, &session).await?;

        tracing::info!(%session_id, total = session.total(), "quiz started");
        Ok(QuizView::from_session(&session))
    }

    /// Current question or final result for the session.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the session cannot be read.
    pub async fn current(&self, session_id: SessionId) -> Result<QuizView, QuizServiceError> {
        let view = self
            .load_live(session_id)
            .await?
            .map_or(QuizView::NotStarted, |s| QuizView::from_session(&s));
        Ok(view)
    }

    /// Answer the current question with the option at `selected`.
    ///
    /// Rejected answers leave the stored session untouched.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::NotStarted` if the session has no quiz or it expired.
    /// Returns `QuizServiceError::Quiz` for out-of-range choices or answers after completion.
    /// Returns `QuizServiceError::Storage` if the session cannot be read or saved.
    pub async fn answer(
        &self,
        session_id: SessionId,
        selected: i64,
    ) -> Result<AnswerOutcome, QuizServiceError> {
        let mut session = self
            .load_live(session_id)
            .await?
            .ok_or(QuizServiceError::NotStarted)?;

        let outcome = session.submit(selected, self.clock.now())?;
        self.sessions.save(session_id, &session).await?;

        tracing::debug!(
            %session_id,
            correct = outcome.correct,
            score = outcome.score,
            index = outcome.index,
            "answer accepted"
        );
        if outcome.is_complete {
            let seconds = session.time_taken().map_or(0, |d| d.num_seconds());
            tracing::info!(
                %session_id,
                score = outcome.score,
                total = session.total(),
                seconds,
                "quiz completed"
            );
        }
        Ok(outcome)
    }

    /// Forget the session's quiz state.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` if the store cannot be reached.
    pub async fn end(&self, session_id: SessionId) -> Result<(), QuizServiceError> {
        self.sessions.remove(session_id).await?;
        Ok(())
    }

    /// Replace the question file used by future sessions.
    ///
    /// Returns the number of questions in the new set.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Upload` if the file is rejected; the
    /// previous question set stays in effect.
    /// Returns `QuizServiceError::Task` if the blocking write is cancelled.
    pub async fn upload(&self, filename: &str, bytes: Vec<u8>) -> Result<usize, QuizServiceError> {
        let source = self.source.clone();
        let filename = filename.to_owned();
        let count =
            tokio::task::spawn_blocking(move || source.replace(&filename, &bytes)).await??;
        Ok(count)
    }
}

impl fmt::Debug for QuizService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizService")
            .field("clock", &self.clock)
            .field("source", &self.source)
            .field("session_ttl", &self.session_ttl)
            .field("seed", &self.seed)
            .finish_non_exhaustive()
    }
}
