#![forbid(unsafe_code)]

pub mod error;
pub mod sessions;

pub use error::SessionError;
pub use sessions::{
    Countdown, ModuleCard, QuestionView, RandomMixCard, ResultView, ReviewItem, ReviewView,
    Screen, SessionManager, StartView, TimerTick,
};
