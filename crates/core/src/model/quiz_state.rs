use std::collections::BTreeMap;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::QuestionBank;
use crate::model::{
    AdvanceOutcome, AnswerOutcome, ModuleId, ModuleNumber, Question, ScoreReport,
    SimuladoProgress, TickOutcome,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("unknown module: {0}")]
    UnknownModule(ModuleId),

    #[error("the session has no current question")]
    NoCurrentQuestion,
}

/// How a `start_session` call was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// An unfinished session was picked up with its answers, score and timer intact.
    Resumed,
    /// A new session replaced whatever the record held before.
    Started { question_count: usize },
}

/// All quiz progress: the displayed module and one progress record per module
/// plus the random mix.
///
/// Every operation acts on the record of the selected module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizState {
    selected_module_id: ModuleId,
    progressions: BTreeMap<ModuleId, SimuladoProgress>,
}

impl QuizState {
    /// Fresh state with an empty record for every module and the random mix.
    ///
    /// The lowest module number is selected; with no modules the random mix is.
    #[must_use]
    pub fn fresh(modules: impl IntoIterator<Item = ModuleNumber>) -> Self {
        let mut progressions: BTreeMap<ModuleId, SimuladoProgress> = modules
            .into_iter()
            .map(|number| (ModuleId::Ordinary(number), SimuladoProgress::empty()))
            .collect();
        progressions.insert(ModuleId::RandomMix, SimuladoProgress::empty());

        let selected_module_id = progressions
            .keys()
            .copied()
            .next()
            .unwrap_or(ModuleId::RandomMix);

        Self {
            selected_module_id,
            progressions,
        }
    }

    #[must_use]
    pub fn for_bank(bank: &QuestionBank) -> Self {
        Self::fresh(bank.module_numbers())
    }

    /// Add empty records for bank modules a restored snapshot does not know.
    ///
    /// Existing records are never touched. A selection that points at a
    /// missing record falls back to the default selection.
    ///
    /// Returns `true` if anything changed.
    pub fn ensure_modules(&mut self, bank: &QuestionBank) -> bool {
        let mut changed = false;
        let ids = bank
            .module_numbers()
            .map(ModuleId::Ordinary)
            .chain(std::iter::once(ModuleId::RandomMix));
        for id in ids {
            if !self.progressions.contains_key(&id) {
                self.progressions.insert(id, SimuladoProgress::empty());
                changed = true;
            }
        }

        if !self.progressions.contains_key(&self.selected_module_id) {
            self.selected_module_id = self
                .progressions
                .keys()
                .copied()
                .next()
                .unwrap_or(ModuleId::RandomMix);
            changed = true;
        }
        changed
    }

    #[must_use]
    pub fn selected_module_id(&self) -> ModuleId {
        self.selected_module_id
    }

    #[must_use]
    pub fn progressions(&self) -> &BTreeMap<ModuleId, SimuladoProgress> {
        &self.progressions
    }

    #[must_use]
    pub fn progress(&self, id: ModuleId) -> Option<&SimuladoProgress> {
        self.progressions.get(&id)
    }

    #[must_use]
    pub fn active_progress(&self) -> Option<&SimuladoProgress> {
        self.progress(self.selected_module_id)
    }

    /// Question sequence a record runs over: its captured session questions,
    /// or the module's full list from the bank.
    #[must_use]
    pub fn questions_for<'a>(&'a self, id: ModuleId, bank: &'a QuestionBank) -> &'a [Question] {
        if let Some(questions) = self
            .progressions
            .get(&id)
            .and_then(|progress| progress.session_questions().custom())
        {
            return questions;
        }
        match id {
            ModuleId::Ordinary(number) => bank.module(number).unwrap_or_default(),
            ModuleId::RandomMix => &[],
        }
    }

    #[must_use]
    pub fn active_questions<'a>(&'a self, bank: &'a QuestionBank) -> &'a [Question] {
        self.questions_for(self.selected_module_id, bank)
    }

    #[must_use]
    pub fn score_report(&self, bank: &QuestionBank) -> Option<ScoreReport> {
        let progress = self.active_progress()?;
        Some(ScoreReport::new(
            progress.score(),
            self.active_questions(bank).len(),
        ))
    }

    /// Whether the countdown applies to the selected record.
    #[must_use]
    pub fn timer_should_run(&self) -> bool {
        self.active_progress()
            .is_some_and(SimuladoProgress::timer_should_run)
    }

    fn active_mut(&mut self) -> Result<&mut SimuladoProgress, QuizError> {
        let id = self.selected_module_id;
        self.progressions
            .get_mut(&id)
            .ok_or(QuizError::UnknownModule(id))
    }

    //
    // ─── TRANSITIONS ───────────────────────────────────────────────────────────
    //

    /// Change which module is displayed.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` if there is no record for `id`.
    pub fn select_module(&mut self, id: ModuleId) -> Result<(), QuizError> {
        if !self.progressions.contains_key(&id) {
            return Err(QuizError::UnknownModule(id));
        }
        self.selected_module_id = id;
        Ok(())
    }

    /// Start or resume a session.
    ///
    /// The target is the random mix when `is_random` is set, otherwise the
    /// selected module. An unfinished session on the target is resumed
    /// untouched; otherwise the target's record is replaced by a new session
    /// over at most `question_count` questions: a shuffled draw from every
    /// module for the random mix, or a prefix of the module's questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` if the target module is not in the
    /// bank. State is left untouched.
    pub fn start_session<R: Rng + ?Sized>(
        &mut self,
        bank: &QuestionBank,
        duration: Option<u32>,
        question_count: usize,
        is_random: bool,
        rng: &mut R,
    ) -> Result<StartOutcome, QuizError> {
        let target = if is_random {
            ModuleId::RandomMix
        } else {
            self.selected_module_id
        };

        if let Some(progress) = self.progressions.get_mut(&target) {
            if progress.has_resumable_progress() {
                progress.resume();
                self.selected_module_id = target;
                return Ok(StartOutcome::Resumed);
            }
        }

        let questions: Vec<Question> = match target {
            ModuleId::RandomMix => {
                let mut pool = bank.all_questions().to_vec();
                pool.shuffle(rng);
                pool.truncate(question_count);
                pool
            }
            ModuleId::Ordinary(number) => bank
                .module(number)
                .ok_or(QuizError::UnknownModule(target))?
                .iter()
                .take(question_count)
                .cloned()
                .collect(),
        };

        let question_count = questions.len();
        self.progressions
            .insert(target, SimuladoProgress::started(duration, questions));
        self.selected_module_id = target;
        Ok(StartOutcome::Started { question_count })
    }

    /// Lock in an answer for the current question of the selected record.
    ///
    /// A question that is already answered keeps its answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::NoCurrentQuestion` when the session has no question
    /// at the current position, or `QuizError::UnknownModule` when the
    /// selected record is missing.
    pub fn select_option(
        &mut self,
        bank: &QuestionBank,
        index: usize,
    ) -> Result<AnswerOutcome, QuizError> {
        let id = self.selected_module_id;
        let current = self
            .active_progress()
            .ok_or(QuizError::UnknownModule(id))?
            .current_index();
        let correct_index = self
            .questions_for(id, bank)
            .get(current)
            .map(Question::correct_index)
            .ok_or(QuizError::NoCurrentQuestion)?;

        Ok(self.active_mut()?.record_answer(index, correct_index))
    }

    /// Move to the next question, or show the result after the last one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` when the selected record is missing.
    pub fn advance(&mut self, bank: &QuestionBank) -> Result<AdvanceOutcome, QuizError> {
        let session_len = self.active_questions(bank).len();
        Ok(self.active_mut()?.advance(session_len))
    }

    /// Discard the selected record's session entirely.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` when the selected record is missing.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        *self.active_mut()? = SimuladoProgress::empty();
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` when the selected record is missing.
    pub fn enter_review(&mut self) -> Result<(), QuizError> {
        self.active_mut()?.enter_review();
        Ok(())
    }

    /// Leave the session without discarding it.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` when the selected record is missing.
    pub fn exit(&mut self) -> Result<(), QuizError> {
        self.active_mut()?.exit();
        Ok(())
    }

    /// Apply one second of countdown to the selected record.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownModule` when the selected record is missing.
    pub fn tick(&mut self) -> Result<TickOutcome, QuizError> {
        Ok(self.active_mut()?.tick())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
