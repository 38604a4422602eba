use serde::{Deserialize, Serialize};

use crate::model::Question;

//
// ─── SESSION QUESTIONS ─────────────────────────────────────────────────────────
//

/// Question sequence a progress record runs over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "questions", rename_all = "camelCase")]
pub enum SessionQuestions {
    /// Use the module's full question list from the bank.
    #[default]
    FullModule,
    /// A sliced or shuffled selection captured when the session started.
    Custom(Vec<Question>),
}

impl SessionQuestions {
    #[must_use]
    pub fn custom(&self) -> Option<&[Question]> {
        match self {
            Self::FullModule => None,
            Self::Custom(questions) => Some(questions),
        }
    }
}

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

/// Screen-level phase derived from a progress record's flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    NotStarted,
    InProgress,
    Result,
    Review,
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of locking in an answer for the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    /// The current question was already answered; nothing changed.
    AlreadyAnswered,
}

/// Result of moving past the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    Next { index: usize },
    Finished,
}

/// Result of one timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The timer does not apply to the record in its current state.
    Idle,
    Counting { remaining: u32 },
    Expired,
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// Progress of one module (or the random mix) through its current or most
/// recent session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimuladoProgress {
    current_index: usize,
    score: u32,
    user_answers: Vec<Option<usize>>,
    is_answered: bool,
    selected_option: Option<usize>,
    has_started: bool,
    show_result: bool,
    is_review_mode: bool,
    time_left: Option<u32>,
    total_time: Option<u32>,
    #[serde(default)]
    session_questions: SessionQuestions,
}

impl SimuladoProgress {
    /// The record of a module that has never been started (or was restarted).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A freshly started session over `questions`.
    #[must_use]
    pub fn started(duration: Option<u32>, questions: Vec<Question>) -> Self {
        Self {
            has_started: true,
            total_time: duration,
            time_left: duration,
            user_answers: vec![None; questions.len()],
            session_questions: SessionQuestions::Custom(questions),
            ..Self::empty()
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn user_answers(&self) -> &[Option<usize>] {
        &self.user_answers
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.is_answered
    }

    #[must_use]
    pub fn selected_option(&self) -> Option<usize> {
        self.selected_option
    }

    #[must_use]
    pub fn has_started(&self) -> bool {
        self.has_started
    }

    #[must_use]
    pub fn show_result(&self) -> bool {
        self.show_result
    }

    #[must_use]
    pub fn is_review_mode(&self) -> bool {
        self.is_review_mode
    }

    #[must_use]
    pub fn time_left(&self) -> Option<u32> {
        self.time_left
    }

    #[must_use]
    pub fn total_time(&self) -> Option<u32> {
        self.total_time
    }

    #[must_use]
    pub fn session_questions(&self) -> &SessionQuestions {
        &self.session_questions
    }

    /// Number of questions that have an answer recorded.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.user_answers.iter().filter(|a| a.is_some()).count()
    }

    #[must_use]
    pub fn phase(&self) -> ProgressPhase {
        if !self.has_started {
            ProgressPhase::NotStarted
        } else if self.is_review_mode {
            ProgressPhase::Review
        } else if self.show_result {
            ProgressPhase::Result
        } else {
            ProgressPhase::InProgress
        }
    }

    /// True when starting this record again picks it up where it left off
    /// instead of discarding it.
    ///
    /// Holds for any unfinished session that has moved past its first
    /// question or answered it, whether running, exited or in review. The
    /// start screen's "in progress" marker uses the same rule.
    #[must_use]
    pub fn has_resumable_progress(&self) -> bool {
        !self.show_result && (self.current_index > 0 || self.is_answered)
    }

    /// Whether the countdown applies to this record.
    #[must_use]
    pub fn timer_should_run(&self) -> bool {
        self.has_started && !self.show_result && !self.is_review_mode && self.time_left.is_some()
    }

    pub(crate) fn resume(&mut self) {
        self.has_started = true;
    }

    /// Lock in `index` for the current question.
    ///
    /// `correct_index` is the current question's answer key.
    pub(crate) fn record_answer(&mut self, index: usize, correct_index: usize) -> AnswerOutcome {
        if self.is_answered {
            return AnswerOutcome::AlreadyAnswered;
        }

        if let Some(slot) = self.user_answers.get_mut(self.current_index) {
            *slot = Some(index);
        }
        self.selected_option = Some(index);
        self.is_answered = true;

        if index == correct_index {
            self.score = self.score.saturating_add(1);
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }

    /// Move to the next question, or finish when `session_len` is exhausted.
    pub(crate) fn advance(&mut self, session_len: usize) -> AdvanceOutcome {
        if self.current_index + 1 >= session_len {
            self.show_result = true;
            return AdvanceOutcome::Finished;
        }

        self.current_index += 1;
        self.is_answered = false;
        self.selected_option = None;
        AdvanceOutcome::Next {
            index: self.current_index,
        }
    }

    pub(crate) fn enter_review(&mut self) {
        self.is_review_mode = true;
        self.show_result = false;
    }

    pub(crate) fn exit(&mut self) {
        self.has_started = false;
    }

    pub(crate) fn tick(&mut self) -> TickOutcome {
        if !self.timer_should_run() {
            return TickOutcome::Idle;
        }
        match self.time_left {
            Some(0) => {
                self.show_result = true;
                TickOutcome::Expired
            }
            Some(left) => {
                let remaining = left - 1;
                self.time_left = Some(remaining);
                TickOutcome::Counting { remaining }
            }
            None => TickOutcome::Idle,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(n: usize) -> Vec<Question> {
        (0..n)
            .map(|i| {
                Question::new(format!("Q{i}"), vec!["a".into(), "b".into()], i % 2, None).unwrap()
            })
            .collect()
    }

    #[test]
    fn started_record_has_one_slot_per_question() {
        let progress = SimuladoProgress::started(Some(60), questions(3));
        assert!(progress.has_started());
        assert_eq!(progress.user_answers(), &[None, None, None]);
        assert_eq!(progress.time_left(), Some(60));
        assert_eq!(progress.total_time(), Some(60));
        assert_eq!(progress.phase(), ProgressPhase::InProgress);
    }

    #[test]
    fn answer_is_locked_once_recorded() {
        let mut progress = SimuladoProgress::started(None, questions(2));
        assert_eq!(progress.record_answer(0, 0), AnswerOutcome::Correct);
        assert_eq!(progress.record_answer(1, 0), AnswerOutcome::AlreadyAnswered);
        assert_eq!(progress.user_answers(), &[Some(0), None]);
        assert_eq!(progress.selected_option(), Some(0));
        assert_eq!(progress.score(), 1);
    }

    #[test]
    fn advance_on_last_question_finishes_in_place() {
        let mut progress = SimuladoProgress::started(None, questions(2));
        assert_eq!(progress.advance(2), AdvanceOutcome::Next { index: 1 });
        assert_eq!(progress.advance(2), AdvanceOutcome::Finished);
        assert_eq!(progress.current_index(), 1);
        assert_eq!(progress.phase(), ProgressPhase::Result);
    }

    #[test]
    fn empty_session_finishes_immediately() {
        let mut progress = SimuladoProgress::started(None, Vec::new());
        assert_eq!(progress.advance(0), AdvanceOutcome::Finished);
        assert_eq!(progress.current_index(), 0);
    }

    #[test]
    fn untimed_record_never_ticks() {
        let mut progress = SimuladoProgress::started(None, questions(1));
        assert!(!progress.timer_should_run());
        assert_eq!(progress.tick(), TickOutcome::Idle);
    }

    #[test]
    fn exited_record_keeps_data_and_is_resumable() {
        let mut progress = SimuladoProgress::started(Some(30), questions(3));
        progress.record_answer(1, 0);
        progress.advance(3);
        progress.exit();

        assert_eq!(progress.phase(), ProgressPhase::NotStarted);
        assert!(progress.has_resumable_progress());
        assert!(!progress.timer_should_run());
        assert_eq!(progress.user_answers(), &[Some(1), None, None]);
    }

    #[test]
    fn answered_first_question_is_resumable() {
        let mut progress = SimuladoProgress::started(None, questions(3));
        assert!(!progress.has_resumable_progress());
        progress.record_answer(0, 0);
        assert_eq!(progress.current_index(), 0);
        assert!(progress.has_resumable_progress());
    }

    #[test]
    fn reviewed_record_is_resumable_and_finished_is_not() {
        let mut progress = SimuladoProgress::started(None, questions(2));
        progress.record_answer(0, 0);
        progress.advance(2);
        progress.record_answer(1, 0);
        progress.advance(2);
        assert!(!progress.has_resumable_progress());

        progress.enter_review();
        assert!(progress.has_resumable_progress());
    }

    #[test]
    fn round_trips_through_json() {
        let mut progress = SimuladoProgress::started(Some(90), questions(2));
        progress.record_answer(1, 0);
        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.contains("\"userAnswers\":[1,null]"));
        let back: SimuladoProgress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, progress);
    }
}
