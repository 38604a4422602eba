use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    BlankPrompt,

    #[error("question needs at least 2 options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct option {index} is out of range for {len} options")]
    CorrectIndexOutOfRange { index: usize, len: usize },
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// Persisted shape of a question.
///
/// Keys are the compact ones used by question-bank files; the long names are
/// accepted on input as well.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(rename = "p", alias = "prompt")]
    pub prompt: String,
    #[serde(rename = "o", alias = "options")]
    pub options: Vec<String>,
    #[serde(rename = "c", alias = "correctIndex")]
    pub correct_index: usize,
    #[serde(
        rename = "e",
        alias = "explanation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub explanation: Option<String>,
}

/// A validated multiple-choice question.
///
/// Identity is positional: a question is addressed by its index in the
/// sequence that contains it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuestionRecord", into = "QuestionRecord")]
pub struct Question {
    prompt: String,
    options: Vec<String>,
    correct_index: usize,
    explanation: Option<String>,
}

impl Question {
    /// Build a question, validating prompt, option count and answer index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, fewer than two options
    /// are given, or `correct_index` does not point at an option.
    pub fn new(
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_index: usize,
        explanation: Option<String>,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(QuestionError::BlankPrompt);
        }
        if options.len() < 2 {
            return Err(QuestionError::TooFewOptions { len: options.len() });
        }
        if correct_index >= options.len() {
            return Err(QuestionError::CorrectIndexOutOfRange {
                index: correct_index,
                len: options.len(),
            });
        }

        Ok(Self {
            prompt,
            options,
            correct_index,
            explanation: explanation.filter(|text| !text.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_index(&self) -> usize {
        self.correct_index
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn is_correct(&self, index: usize) -> bool {
        index == self.correct_index
    }
}

impl TryFrom<QuestionRecord> for Question {
    type Error = QuestionError;

    fn try_from(record: QuestionRecord) -> Result<Self, Self::Error> {
        Self::new(
            record.prompt,
            record.options,
            record.correct_index,
            record.explanation,
        )
    }
}

impl From<Question> for QuestionRecord {
    fn from(question: Question) -> Self {
        Self {
            prompt: question.prompt,
            options: question.options,
            correct_index: question.correct_index,
            explanation: question.explanation,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
