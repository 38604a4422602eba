use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use quiz_core::QuestionBank;
use quiz_core::model::{
    AdvanceOutcome, AnswerOutcome, ModuleId, QuizState, StartOutcome, TickOutcome,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::StorageError;
use storage::snapshot::QuizStateStore;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::countdown::{Countdown, DEFAULT_TICK_PERIOD, TimerTick};
use super::view::Screen;
use crate::error::SessionError;

/// Owns the quiz state and drives every user-facing transition.
///
/// Each operation applies its transition to the in-memory state and then
/// writes the whole state to the store. A failed write is logged and kept in
/// `last_persist_error`; the in-memory state stays authoritative.
///
/// When a tick channel is attached with `with_ticks`, the manager keeps
/// exactly one `Countdown` alive while the selected session is timed and
/// running, and none otherwise.
pub struct SessionManager {
    state: QuizState,
    bank: Arc<QuestionBank>,
    store: QuizStateStore,
    rng: StdRng,
    ticks: Option<UnboundedSender<TimerTick>>,
    tick_period: Duration,
    countdown: Option<Countdown>,
    generation: u64,
    last_persist_error: Option<StorageError>,
}

impl SessionManager {
    /// Restore the last saved state, or start fresh.
    ///
    /// A missing, unreadable or undecodable snapshot never fails startup: it is
    /// logged and replaced by a fresh state. Records for bank modules the
    /// snapshot does not know are added. The resulting state is written back.
    pub async fn initialize(bank: Arc<QuestionBank>, store: QuizStateStore) -> Self {
        let state = match store.load().await {
            Ok(Some(mut state)) => {
                if state.ensure_modules(&bank) {
                    debug!("added progress records for new modules");
                }
                debug!(selected = %state.selected_module_id(), "restored quiz state");
                state
            }
            Ok(None) => {
                debug!("no saved quiz state; starting fresh");
                QuizState::for_bank(&bank)
            }
            Err(err) => {
                warn!(error = %err, key = store.key(), "discarding unreadable quiz state");
                QuizState::for_bank(&bank)
            }
        };

        let mut manager = Self {
            state,
            bank,
            store,
            rng: StdRng::from_os_rng(),
            ticks: None,
            tick_period: DEFAULT_TICK_PERIOD,
            countdown: None,
            generation: 0,
            last_persist_error: None,
        };
        manager.persist().await;
        manager
    }

    /// Use a deterministic RNG for random-mix draws.
    #[must_use]
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Tick more often than once a second.
    #[must_use]
    pub fn with_tick_period(mut self, period: Duration) -> Self {
        self.tick_period = period;
        self
    }

    /// Attach the channel countdown ticks are delivered to and start the
    /// countdown if the restored session is already running.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn with_ticks(mut self, ticks: UnboundedSender<TimerTick>) -> Self {
        self.ticks = Some(ticks);
        self.sync_countdown();
        self
    }

    #[must_use]
    pub fn state(&self) -> &QuizState {
        &self.state
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    /// Read model for whatever the selected module currently shows.
    #[must_use]
    pub fn screen(&self) -> Screen {
        Screen::from_state(&self.state, &self.bank)
    }

    /// Error of the most recent failed write, cleared by the next successful one.
    #[must_use]
    pub fn last_persist_error(&self) -> Option<&StorageError> {
        self.last_persist_error.as_ref()
    }

    #[must_use]
    pub fn is_countdown_running(&self) -> bool {
        self.countdown.is_some()
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if `id` has no progress record.
    pub async fn select_module(&mut self, id: ModuleId) -> Result<(), SessionError> {
        self.state.select_module(id)?;
        debug!(module = %id, "selected module");
        self.commit().await;
        Ok(())
    }

    /// Start a new session or resume the unfinished one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the target module is not in the bank.
    pub async fn start_session(
        &mut self,
        duration: Option<u32>,
        question_count: usize,
        is_random: bool,
    ) -> Result<StartOutcome, SessionError> {
        let outcome = self.state.start_session(
            &self.bank,
            duration,
            question_count,
            is_random,
            &mut self.rng,
        )?;
        let module = self.state.selected_module_id();
        match outcome {
            StartOutcome::Resumed => info!(%module, "resumed session"),
            StartOutcome::Started { question_count } => {
                // A new session always gets its own countdown.
                self.countdown = None;
                info!(%module, question_count, ?duration, "started session");
            }
        }
        self.commit().await;
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` when there is no current question.
    pub async fn select_option(&mut self, index: usize) -> Result<AnswerOutcome, SessionError> {
        let outcome = self.state.select_option(&self.bank, index)?;
        debug!(index, ?outcome, "selected option");
        self.commit().await;
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the selected record is missing.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        let outcome = self.state.advance(&self.bank)?;
        if outcome == AdvanceOutcome::Finished {
            self.log_finished("answered every question");
        }
        self.commit().await;
        Ok(outcome)
    }

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the selected record is missing.
    pub async fn restart(&mut self) -> Result<(), SessionError> {
        self.state.restart()?;
        debug!(module = %self.state.selected_module_id(), "restarted module");
        self.commit().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the selected record is missing.
    pub async fn enter_review(&mut self) -> Result<(), SessionError> {
        self.state.enter_review()?;
        self.commit().await;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the selected record is missing.
    pub async fn exit(&mut self) -> Result<(), SessionError> {
        self.state.exit()?;
        debug!(module = %self.state.selected_module_id(), "left session");
        self.commit().await;
        Ok(())
    }

    /// Apply one second of countdown to the selected session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the selected record is missing.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        let outcome = self.state.tick()?;
        if outcome == TickOutcome::Expired {
            self.log_finished("time is up");
        }
        self.commit().await;
        Ok(outcome)
    }

    /// Handle a tick delivered by the countdown.
    ///
    /// Ticks from a countdown that has since been replaced or stopped are
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Quiz` if the selected record is missing.
    pub async fn on_timer_tick(&mut self, tick: TimerTick) -> Result<TickOutcome, SessionError> {
        let is_live = self
            .countdown
            .as_ref()
            .is_some_and(|countdown| countdown.generation() == tick.generation);
        if !is_live {
            debug!(generation = tick.generation, "ignoring stale timer tick");
            return Ok(TickOutcome::Idle);
        }
        self.tick().await
    }

    /// Forget all progress in every module.
    pub async fn reset_all(&mut self) {
        self.state = QuizState::for_bank(&self.bank);
        info!("reset all progress");
        self.commit().await;
    }

    /// Write the current state again, reporting the outcome.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the write fails.
    pub async fn flush(&mut self) -> Result<(), SessionError> {
        self.store.save(&self.state).await?;
        self.last_persist_error = None;
        Ok(())
    }

    //
    // ─── INTERNALS ─────────────────────────────────────────────────────────────
    //

    async fn commit(&mut self) {
        self.sync_countdown();
        self.persist().await;
    }

    async fn persist(&mut self) {
        match self.store.save(&self.state).await {
            Ok(()) => self.last_persist_error = None,
            Err(err) => {
                warn!(error = %err, "failed to persist quiz state; continuing in memory");
                self.last_persist_error = Some(err);
            }
        }
    }

    fn sync_countdown(&mut self) {
        let wanted = self
            .state
            .timer_should_run()
            .then(|| self.state.selected_module_id());
        let live = self.countdown.as_ref().map(Countdown::module);
        if wanted == live {
            return;
        }

        if self.countdown.take().is_some() {
            debug!("stopped countdown");
        }
        if let (Some(module), Some(ticks)) = (wanted, self.ticks.as_ref()) {
            self.generation += 1;
            self.countdown = Some(Countdown::spawn(
                module,
                self.generation,
                self.tick_period,
                ticks.clone(),
            ));
            debug!(%module, generation = self.generation, "started countdown");
        }
    }

    fn log_finished(&self, reason: &str) {
        if let Some(report) = self.state.score_report(&self.bank) {
            info!(
                module = %self.state.selected_module_id(),
                score = report.score(),
                total = report.total(),
                percentage = report.rounded_percentage(),
                reason,
                "session finished"
            );
        }
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("selected", &self.state.selected_module_id())
            .field("key", &self.store.key())
            .field("countdown", &self.countdown)
            .field("last_persist_error", &self.last_persist_error)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{ModuleNumber, Question};
    use std::collections::BTreeMap;
    use storage::repository::Storage;
    use tokio::sync::mpsc;

    fn bank() -> Arc<QuestionBank> {
        let questions = (0..4)
            .map(|i| {
                Question::new(format!("Q{i}"), vec!["a".into(), "b".into()], 0, None).unwrap()
            })
            .collect();
        let mut modules = BTreeMap::new();
        modules.insert(ModuleNumber::new(1), questions);
        Arc::new(QuestionBank::new(modules))
    }

    async fn manager() -> SessionManager {
        SessionManager::initialize(bank(), Storage::in_memory().quiz_state())
            .await
            .with_rng_seed(1)
    }

    #[tokio::test]
    async fn initialize_writes_fresh_state() {
        let storage = Storage::in_memory();
        let manager = SessionManager::initialize(bank(), storage.quiz_state()).await;
        let saved = storage.quiz_state().load().await.unwrap();
        assert_eq!(saved.as_ref(), Some(manager.state()));
        assert!(manager.last_persist_error().is_none());
    }

    #[tokio::test]
    async fn rejected_operation_changes_nothing() {
        let mut manager = manager().await;
        let before = manager.state().clone();
        let err = manager.select_module(ModuleId::ordinary(9)).await.unwrap_err();
        assert!(matches!(err, SessionError::Quiz(_)));
        assert_eq!(manager.state(), &before);
    }

    #[tokio::test]
    async fn no_countdown_without_tick_channel() {
        let mut manager = manager().await;
        manager.start_session(Some(10), 2, false).await.unwrap();
        assert!(manager.state().timer_should_run());
        assert!(!manager.is_countdown_running());
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_follows_running_state() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = manager()
            .await
            .with_tick_period(Duration::from_millis(10))
            .with_ticks(tx);
        assert!(!manager.is_countdown_running());

        let begun = tokio::time::Instant::now();
        manager.start_session(Some(10), 2, false).await.unwrap();
        assert!(manager.is_countdown_running());

        let tick = rx.recv().await.unwrap();
        assert_eq!(tick.module, ModuleId::ordinary(1));
        assert!(begun.elapsed() < DEFAULT_TICK_PERIOD);
        assert_eq!(
            manager.on_timer_tick(tick).await.unwrap(),
            TickOutcome::Counting { remaining: 9 }
        );

        manager.select_option(0).await.unwrap();
        manager.exit().await.unwrap();
        assert!(!manager.is_countdown_running());

        let outcome = manager.start_session(Some(10), 2, false).await.unwrap();
        assert_eq!(outcome, StartOutcome::Resumed);
        assert!(manager.is_countdown_running());
        assert_eq!(
            manager.state().active_progress().unwrap().time_left(),
            Some(9)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stale_ticks_are_ignored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = manager().await.with_ticks(tx);
        manager.start_session(Some(10), 2, false).await.unwrap();
        let tick = rx.recv().await.unwrap();

        manager.restart().await.unwrap();
        manager.start_session(Some(10), 2, false).await.unwrap();
        assert_eq!(manager.on_timer_tick(tick).await.unwrap(), TickOutcome::Idle);
        assert_eq!(
            manager.state().active_progress().unwrap().time_left(),
            Some(10)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_stops_the_countdown() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut manager = manager().await.with_ticks(tx);
        manager.start_session(Some(1), 2, false).await.unwrap();

        let first = rx.recv().await.unwrap();
        manager.on_timer_tick(first).await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(
            manager.on_timer_tick(second).await.unwrap(),
            TickOutcome::Expired
        );
        assert!(manager.state().active_progress().unwrap().show_result());
        assert!(!manager.is_countdown_running());
    }
}
