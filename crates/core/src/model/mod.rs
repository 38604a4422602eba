mod ids;
mod progress;
mod question;
mod quiz_state;
mod score;

pub use ids::{ModuleId, ModuleNumber, ParseIdError};
pub use progress::{
    AdvanceOutcome, AnswerOutcome, ProgressPhase, SessionQuestions, SimuladoProgress,
    TickOutcome,
};
pub use question::{Question, QuestionError, QuestionRecord};
pub use quiz_state::{QuizError, QuizState, StartOutcome};
pub use score::{PASSING_PERCENT, ScoreReport};
