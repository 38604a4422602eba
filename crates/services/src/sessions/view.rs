use serde::Serialize;

use quiz_core::QuestionBank;
use quiz_core::model::{ModuleId, ProgressPhase, QuizState, ScoreReport, SimuladoProgress};

/// Remaining time below which the countdown should be shown as urgent.
pub const LOW_TIME_THRESHOLD_SECS: u32 = 300;

/// Presentation-agnostic snapshot of what the selected module shows.
///
/// This is intentionally **not** a UI view-model:
/// - no pre-formatted strings
/// - no localization assumptions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "screen", rename_all = "camelCase")]
pub enum Screen {
    Start(StartView),
    Question(QuestionView),
    Result(ResultView),
    Review(ReviewView),
}

impl Screen {
    #[must_use]
    pub fn from_state(state: &QuizState, bank: &QuestionBank) -> Self {
        let Some(progress) = state.active_progress() else {
            return Self::Start(StartView::from_state(state, bank));
        };
        match progress.phase() {
            ProgressPhase::NotStarted => Self::Start(StartView::from_state(state, bank)),
            ProgressPhase::Review => Self::Review(ReviewView::from_state(state, bank)),
            ProgressPhase::Result => Self::Result(ResultView::from_state(state, bank)),
            // A running session without a current question has nothing left to ask.
            ProgressPhase::InProgress => QuestionView::from_state(state, bank)
                .map_or_else(|| Self::Result(ResultView::from_state(state, bank)), Self::Question),
        }
    }
}

//
// ─── START ─────────────────────────────────────────────────────────────────────
//

/// One selectable ordinary module on the start screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleCard {
    pub id: ModuleId,
    pub question_count: usize,
    /// Answered questions as a rounded share of the module's questions.
    pub answered_percent: u8,
    pub resumable: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RandomMixCard {
    pub pool_size: usize,
    pub resumable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartView {
    pub selected: ModuleId,
    pub modules: Vec<ModuleCard>,
    pub random_mix: RandomMixCard,
}

impl StartView {
    #[must_use]
    pub fn from_state(state: &QuizState, bank: &QuestionBank) -> Self {
        let selected = state.selected_module_id();
        let modules = bank
            .module_numbers()
            .map(|number| {
                let id = ModuleId::Ordinary(number);
                let question_count = bank.module_len(number);
                let progress = state.progress(id);
                ModuleCard {
                    id,
                    question_count,
                    answered_percent: percent(
                        progress.map_or(0, SimuladoProgress::answered_count),
                        question_count,
                    ),
                    resumable: progress.is_some_and(SimuladoProgress::has_resumable_progress),
                    selected: id == selected,
                }
            })
            .collect();

        let random_mix = RandomMixCard {
            pool_size: bank.all_questions().len(),
            resumable: state
                .progress(ModuleId::RandomMix)
                .is_some_and(SimuladoProgress::has_resumable_progress),
        };

        Self {
            selected,
            modules,
            random_mix,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub module: ModuleId,
    /// 1-based position of the current question.
    pub position: usize,
    pub total: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub is_answered: bool,
    pub selected_option: Option<usize>,
    /// Only revealed once the question is answered.
    pub correct_index: Option<usize>,
    /// Only revealed once the question is answered.
    pub explanation: Option<String>,
    pub time_left: Option<u32>,
    pub is_time_low: bool,
    pub progress_percent: u8,
    pub is_last: bool,
}

impl QuestionView {
    /// `None` when the session has no question at the current position.
    #[must_use]
    pub fn from_state(state: &QuizState, bank: &QuestionBank) -> Option<Self> {
        let progress = state.active_progress()?;
        let questions = state.active_questions(bank);
        let index = progress.current_index();
        let question = questions.get(index)?;
        let answered = progress.is_answered();
        let position = index + 1;

        Some(Self {
            module: state.selected_module_id(),
            position,
            total: questions.len(),
            prompt: question.prompt().to_owned(),
            options: question.options().to_vec(),
            is_answered: answered,
            selected_option: progress.selected_option(),
            correct_index: answered.then(|| question.correct_index()),
            explanation: answered
                .then(|| question.explanation().map(str::to_owned))
                .flatten(),
            time_left: progress.time_left(),
            is_time_low: progress
                .time_left()
                .is_some_and(|left| left < LOW_TIME_THRESHOLD_SECS),
            progress_percent: percent(position, questions.len()),
            is_last: position == questions.len(),
        })
    }
}

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub module: ModuleId,
    pub score: u32,
    pub total: usize,
    pub percentage: u8,
    pub approved: bool,
}

impl ResultView {
    #[must_use]
    pub fn from_state(state: &QuizState, bank: &QuestionBank) -> Self {
        let report = state
            .score_report(bank)
            .unwrap_or_else(|| ScoreReport::new(0, 0));
        Self {
            module: state.selected_module_id(),
            score: report.score(),
            total: report.total(),
            percentage: report.rounded_percentage(),
            approved: report.is_approved(),
        }
    }
}

//
// ─── REVIEW ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewItem {
    /// 1-based question number.
    pub number: usize,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub user_answer: Option<usize>,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewView {
    pub module: ModuleId,
    pub items: Vec<ReviewItem>,
}

impl ReviewView {
    #[must_use]
    pub fn from_state(state: &QuizState, bank: &QuestionBank) -> Self {
        let answers = state
            .active_progress()
            .map(SimuladoProgress::user_answers)
            .unwrap_or_default();
        let items = state
            .active_questions(bank)
            .iter()
            .enumerate()
            .map(|(index, question)| {
                let user_answer = answers.get(index).copied().flatten();
                ReviewItem {
                    number: index + 1,
                    prompt: question.prompt().to_owned(),
                    options: question.options().to_vec(),
                    correct_index: question.correct_index(),
                    user_answer,
                    is_correct: user_answer.is_some_and(|answer| question.is_correct(answer)),
                    explanation: question.explanation().map(str::to_owned),
                }
            })
            .collect();

        Self {
            module: state.selected_module_id(),
            items,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    (part as f64 / whole as f64 * 100.0).round().clamp(0.0, 100.0) as u8
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ModuleNumber, Question};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::BTreeMap;

    fn bank() -> QuestionBank {
        let questions = (0..4)
            .map(|i| {
                Question::new(
                    format!("Q{i}"),
                    vec!["a".into(), "b".into(), "c".into()],
                    1,
                    Some(format!("because {i}")),
                )
                .unwrap()
            })
            .collect();
        let mut modules = BTreeMap::new();
        modules.insert(ModuleNumber::new(1), questions);
        modules.insert(ModuleNumber::new(2), Vec::new());
        QuestionBank::new(modules)
    }

    fn started(bank: &QuestionBank, duration: Option<u32>) -> QuizState {
        let mut state = QuizState::for_bank(bank);
        state
            .start_session(bank, duration, 4, false, &mut StdRng::seed_from_u64(0))
            .unwrap();
        state
    }

    #[test]
    fn fresh_state_shows_start_screen() {
        let bank = bank();
        let state = QuizState::for_bank(&bank);
        let Screen::Start(view) = Screen::from_state(&state, &bank) else {
            panic!("expected start screen");
        };
        assert_eq!(view.selected, ModuleId::ordinary(1));
        assert_eq!(view.modules.len(), 2);
        assert_eq!(view.modules[0].question_count, 4);
        assert!(view.modules[0].selected);
        assert_eq!(view.modules[1].answered_percent, 0);
        assert_eq!(view.random_mix.pool_size, 4);
        assert!(!view.random_mix.resumable);
    }

    #[test]
    fn question_view_hides_answer_until_answered() {
        let bank = bank();
        let mut state = started(&bank, Some(200));

        let Screen::Question(view) = Screen::from_state(&state, &bank) else {
            panic!("expected question screen");
        };
        assert_eq!(view.position, 1);
        assert_eq!(view.total, 4);
        assert_eq!(view.correct_index, None);
        assert_eq!(view.explanation, None);
        assert!(view.is_time_low);
        assert_eq!(view.progress_percent, 25);
        assert!(!view.is_last);

        state.select_option(&bank, 2).unwrap();
        let view = QuestionView::from_state(&state, &bank).unwrap();
        assert_eq!(view.selected_option, Some(2));
        assert_eq!(view.correct_index, Some(1));
        assert_eq!(view.explanation.as_deref(), Some("because 0"));
    }

    #[test]
    fn exited_session_shows_progress_on_start_screen() {
        let bank = bank();
        let mut state = started(&bank, None);
        state.select_option(&bank, 1).unwrap();
        state.advance(&bank).unwrap();
        state.exit().unwrap();

        let Screen::Start(view) = Screen::from_state(&state, &bank) else {
            panic!("expected start screen");
        };
        assert_eq!(view.modules[0].answered_percent, 25);
        assert!(view.modules[0].resumable);
    }

    #[test]
    fn answered_first_question_marks_module_in_progress() {
        let bank = bank();
        let mut untouched = started(&bank, None);
        untouched.exit().unwrap();
        let view = StartView::from_state(&untouched, &bank);
        assert!(!view.modules[0].resumable);

        let mut state = started(&bank, None);
        state.select_option(&bank, 1).unwrap();
        state.exit().unwrap();
        let view = StartView::from_state(&state, &bank);
        assert_eq!(view.modules[0].answered_percent, 25);
        assert!(view.modules[0].resumable);
    }

    #[test]
    fn result_and_review_views_report_answers() {
        let bank = bank();
        let mut state = started(&bank, None);
        for choice in [1, 0, 1, 1] {
            state.select_option(&bank, choice).unwrap();
            state.advance(&bank).unwrap();
        }

        let Screen::Result(result) = Screen::from_state(&state, &bank) else {
            panic!("expected result screen");
        };
        assert_eq!(result.score, 3);
        assert_eq!(result.total, 4);
        assert_eq!(result.percentage, 75);
        assert!(result.approved);

        state.enter_review().unwrap();
        let Screen::Review(review) = Screen::from_state(&state, &bank) else {
            panic!("expected review screen");
        };
        assert_eq!(review.items.len(), 4);
        assert!(review.items[0].is_correct);
        assert!(!review.items[1].is_correct);
        assert_eq!(review.items[1].user_answer, Some(0));
        assert_eq!(review.items[3].number, 4);
    }

    #[test]
    fn empty_module_session_shows_zero_result() {
        let bank = bank();
        let mut state = QuizState::for_bank(&bank);
        state.select_module(ModuleId::ordinary(2)).unwrap();
        state
            .start_session(&bank, None, 10, false, &mut StdRng::seed_from_u64(0))
            .unwrap();

        let Screen::Result(result) = Screen::from_state(&state, &bank) else {
            panic!("expected result screen");
        };
        assert_eq!(result.total, 0);
        assert_eq!(result.percentage, 0);
        assert!(!result.approved);
    }

    #[test]
    fn screen_serializes_with_tag() {
        let bank = bank();
        let state = QuizState::for_bank(&bank);
        let json = serde_json::to_value(Screen::from_state(&state, &bank)).unwrap();
        assert_eq!(json["screen"], "start");
        assert_eq!(json["selected"], "1");
    }
}
