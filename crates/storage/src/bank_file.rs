//! Loading the question bank from a JSON file.
//!
//! The file is an object mapping module numbers to question arrays:
//!
//! ```json
//! { "1": [ { "p": "Prompt", "o": ["A", "B"], "c": 0, "e": "Why A" } ] }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quiz_core::QuestionBank;
use quiz_core::model::{ModuleNumber, Question, QuestionError, QuestionRecord};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankFileError {
    #[error("failed to read question bank {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("question bank is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid module key {0:?}")]
    InvalidModule(String),

    #[error("module {module}, question {index}: {source}")]
    InvalidQuestion {
        module: ModuleNumber,
        index: usize,
        #[source]
        source: QuestionError,
    },
}

/// Read and validate a question bank file.
///
/// # Errors
///
/// Returns `BankFileError` if the file cannot be read or its content is not a
/// valid question bank.
pub fn load_question_bank(path: &Path) -> Result<QuestionBank, BankFileError> {
    let raw = std::fs::read_to_string(path).map_err(|source| BankFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let bank = parse_question_bank(&raw)?;
    tracing::debug!(
        path = %path.display(),
        modules = bank.module_numbers().count(),
        questions = bank.all_questions().len(),
        "loaded question bank"
    );
    Ok(bank)
}

/// Parse and validate a question bank from JSON text.
///
/// # Errors
///
/// Returns `BankFileError::Parse` for malformed JSON, `InvalidModule` for keys
/// that are not module numbers and `InvalidQuestion` for questions that fail
/// validation.
pub fn parse_question_bank(raw: &str) -> Result<QuestionBank, BankFileError> {
    let records: BTreeMap<String, Vec<QuestionRecord>> = serde_json::from_str(raw)?;

    let mut modules = BTreeMap::new();
    for (key, questions) in records {
        let module: ModuleNumber = key
            .parse()
            .map_err(|_| BankFileError::InvalidModule(key.clone()))?;

        let questions = questions
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                Question::try_from(record).map_err(|source| BankFileError::InvalidQuestion {
                    module,
                    index,
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        modules.insert(module, questions);
    }

    Ok(QuestionBank::new(modules))
}
