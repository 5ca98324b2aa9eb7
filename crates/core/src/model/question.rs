use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Every question carries exactly this many answer options.
pub const OPTION_COUNT: usize = 4;

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// How a question is presented.
///
/// The set is open: unknown `type` values are kept verbatim as `Other` and
/// treated like plain text questions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuestionKind {
    Text,
    Image,
    TextImage,
    Other(String),
}

impl QuestionKind {
    /// Parses a spreadsheet `type` cell. Matching ignores case and surrounding whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "text_image" => Self::TextImage,
            _ => Self::Other(trimmed.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::TextImage => "text_image",
            Self::Other(raw) => raw,
        }
    }

    /// Whether questions of this kind must reference an image.
    #[must_use]
    pub fn requires_image(&self) -> bool {
        matches!(self, Self::Image | Self::TextImage)
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for QuestionKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<QuestionKind> for String {
    fn from(kind: QuestionKind) -> Self {
        kind.as_str().to_owned()
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyPrompt,

    #[error("option {position} cannot be empty")]
    EmptyOption { position: usize },

    #[error("correct answer cannot be empty")]
    EmptyAnswer,

    #[error("{kind} question requires an image reference")]
    MissingImage { kind: QuestionKind },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single multiple-choice question. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Question {
    kind: QuestionKind,
    prompt: String,
    options: [String; OPTION_COUNT],
    correct_answer: String,
    image_ref: Option<String>,
}

impl Question {
    /// Build a validated question.
    ///
    /// `image_ref` is only kept for kinds that display an image; for other
    /// kinds it is discarded.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt, an option or the answer is blank,
    /// or when an image kind has no image reference.
    pub fn new(
        kind: QuestionKind,
        prompt: impl Into<String>,
        options: [String; OPTION_COUNT],
        correct_answer: impl Into<String>,
        image_ref: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        let correct_answer = correct_answer.into();

        if prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }
        if let Some(idx) = options.iter().position(|o| o.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { position: idx + 1 });
        }
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyAnswer);
        }

        let image_ref = if kind.requires_image() {
            match image_ref.filter(|r| !r.trim().is_empty()) {
                Some(r) => Some(r),
                None => return Err(QuestionError::MissingImage { kind }),
            }
        } else {
            None
        };

        Ok(Self {
            kind,
            prompt,
            options,
            correct_answer,
            image_ref,
        })
    }

    #[must_use]
    pub fn kind(&self) -> &QuestionKind {
        &self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String; OPTION_COUNT] {
        &self.options
    }

    #[must_use]
    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn image_ref(&self) -> Option<&str> {
        self.image_ref.as_deref()
    }

    /// Whether the option text matches this question's answer.
    #[must_use]
    pub fn is_correct(&self, selected: &str) -> bool {
        answers_match(selected, &self.correct_answer)
    }
}

/// Compares two answer texts ignoring surrounding whitespace and case.
#[must_use]
pub fn answers_match(selected: &str, expected: &str) -> bool {
    selected.trim().to_lowercase() == expected.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
