mod countdown;
mod manager;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use countdown::{Countdown, DEFAULT_TICK_PERIOD, TimerTick};
pub use manager::SessionManager;
pub use view::{
    LOW_TIME_THRESHOLD_SECS, ModuleCard, QuestionView, RandomMixCard, ResultView, ReviewItem,
    ReviewView, Screen, StartView,
};
