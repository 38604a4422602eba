//! Interactive terminal session.
//!
//! Reads one command per line from stdin while countdown ticks arrive on a
//! channel; both are multiplexed with `tokio::select!`.

use std::sync::Arc;

use anyhow::Context;
use quiz_core::QuestionBank;
use quiz_core::model::{ModuleId, TickOutcome};
use services::{Screen, SessionError, SessionManager};
use storage::QuizStateStore;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::warn;

use crate::render::{ScreenDisplay, format_clock, option_label};

/// Time limits offered on the start screen, in minutes.
pub const DURATION_CHOICES_MINUTES: [u32; 3] = [30, 60, 90];

const DEFAULT_DURATION_SECS: u32 = 3600;
const DEFAULT_QUESTION_COUNT: usize = 60;

/// Session parameters picked on the start screen before starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartOptions {
    pub random: bool,
    /// Time limit in seconds; `None` is untimed.
    pub duration: Option<u32>,
    pub count: usize,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            random: false,
            duration: Some(DEFAULT_DURATION_SECS),
            count: DEFAULT_QUESTION_COUNT,
        }
    }
}

impl StartOptions {
    /// Requested count limited to `[1, available]`.
    #[must_use]
    pub fn clamped_count(&self, available: usize) -> usize {
        self.count.clamp(1, available.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectModule(ModuleId),
    ToggleRandom,
    SetDuration(Option<u32>),
    SetCount(usize),
    Start,
    Answer(usize),
    Next,
    Exit,
    Review,
    Restart,
    Help,
    Quit,
}

/// Interpret one input line in the context of the current screen.
///
/// Returns `None` for input that means nothing on that screen.
pub fn parse_action(line: &str, screen: &Screen) -> Option<Action> {
    let line = line.trim().to_ascii_lowercase();
    let mut words = line.split_whitespace();
    let command = words.next()?;
    let argument = words.next();

    match command {
        "q" | "quit" => return Some(Action::Quit),
        "h" | "help" | "?" => return Some(Action::Help),
        _ => {}
    }

    match screen {
        Screen::Start(_) => match (command, argument) {
            ("s" | "start", None) => Some(Action::Start),
            ("r" | "random", None) => Some(Action::ToggleRandom),
            ("t" | "time", Some(value)) => parse_duration(value).map(Action::SetDuration),
            ("c" | "count", Some(value)) => value.parse().ok().map(Action::SetCount),
            ("m" | "module", Some(value)) => value.parse().ok().map(Action::SelectModule),
            (value, None) => value
                .parse()
                .ok()
                .map(|number| Action::SelectModule(ModuleId::ordinary(number))),
            _ => None,
        },
        Screen::Question(_) => match (command, argument) {
            ("n" | "next", None) => Some(Action::Next),
            ("x" | "exit", None) => Some(Action::Exit),
            (value, None) => parse_option(value).map(Action::Answer),
            _ => None,
        },
        Screen::Result(_) => match (command, argument) {
            ("r" | "review", None) => Some(Action::Review),
            ("restart", None) => Some(Action::Restart),
            ("x" | "exit", None) => Some(Action::Exit),
            _ => None,
        },
        Screen::Review(_) => match (command, argument) {
            ("restart" | "back" | "x" | "exit", None) => Some(Action::Restart),
            _ => None,
        },
    }
}

fn parse_duration(value: &str) -> Option<Option<u32>> {
    if matches!(value, "none" | "free" | "0") {
        return Some(None);
    }
    let minutes: u32 = value.parse().ok()?;
    DURATION_CHOICES_MINUTES
        .contains(&minutes)
        .then_some(Some(minutes * 60))
}

/// Option index from a letter (`a`) or a 1-based number (`1`).
fn parse_option(value: &str) -> Option<usize> {
    if let Ok(number) = value.parse::<usize>() {
        return number.checked_sub(1);
    }
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(letter @ 'a'..='z'), None) => Some(letter as usize - 'a' as usize),
        _ => None,
    }
}

/// What the loop does after an action.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Redraw,
    Note(String),
    Quit,
}

async fn apply(
    manager: &mut SessionManager,
    options: &mut StartOptions,
    screen: &Screen,
    action: Action,
) -> Result<Step, SessionError> {
    match action {
        Action::Quit => return Ok(Step::Quit),
        Action::Help => return Ok(Step::Note(help_text(screen).to_owned())),
        Action::SelectModule(id) => {
            manager.select_module(id).await?;
            options.random = false;
        }
        Action::ToggleRandom => options.random = !options.random,
        Action::SetDuration(duration) => options.duration = duration,
        Action::SetCount(count) => options.count = count,
        Action::Start => {
            let bank = manager.bank();
            let available = if options.random {
                bank.all_questions().len()
            } else {
                manager
                    .state()
                    .selected_module_id()
                    .module_number()
                    .map_or_else(|| bank.all_questions().len(), |n| bank.module_len(n))
            };
            let count = options.clamped_count(available);
            manager
                .start_session(options.duration, count, options.random)
                .await?;
        }
        Action::Answer(index) => {
            let Screen::Question(view) = screen else {
                return Ok(Step::Note("there is no question to answer".into()));
            };
            if index >= view.options.len() {
                let last = option_label(view.options.len().saturating_sub(1));
                return Ok(Step::Note(format!("choose an option from A to {last}")));
            }
            manager.select_option(index).await?;
        }
        Action::Next => {
            if matches!(screen, Screen::Question(view) if !view.is_answered) {
                return Ok(Step::Note("answer the question first".into()));
            }
            manager.advance().await?;
        }
        Action::Exit => manager.exit().await?,
        Action::Review => manager.enter_review().await?,
        Action::Restart => manager.restart().await?,
    }
    Ok(Step::Redraw)
}

fn help_text(screen: &Screen) -> &'static str {
    match screen {
        Screen::Start(_) => {
            "<number> or `module <id>`  select a module (`module random` for the mix)\n\
             random                     toggle random mix\n\
             time none|30|60|90         set the time limit in minutes\n\
             count <n>                  set how many questions to ask\n\
             start                      start or continue\n\
             quit                       leave"
        }
        Screen::Question(_) => {
            "a, b, c ... or 1, 2, 3 ...  answer\n\
             next                        go to the next question\n\
             exit                        pause and return to the start screen\n\
             quit                        leave"
        }
        Screen::Result(_) => {
            "review   go through every answer\n\
             restart  discard this session\n\
             exit     return to the start screen\n\
             quit     leave"
        }
        Screen::Review(_) => {
            "restart  leave the review and discard the session\n\
             quit     leave"
        }
    }
}

fn print_screen(manager: &SessionManager, options: &StartOptions) {
    let screen = manager.screen();
    println!();
    print!("{}", ScreenDisplay {
        screen: &screen,
        options,
    });
}

/// Run the interactive loop until `quit` or end of input.
///
/// # Errors
///
/// Returns an error if stdin cannot be read.
pub async fn run(bank: Arc<QuestionBank>, store: QuizStateStore) -> anyhow::Result<()> {
    let (ticks_tx, mut ticks) = mpsc::unbounded_channel();
    let mut manager = SessionManager::initialize(bank, store)
        .await
        .with_ticks(ticks_tx);
    let mut options = StartOptions::default();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_screen(&manager, &options);
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read from stdin")? else {
                    break;
                };
                let screen = manager.screen();
                let Some(action) = parse_action(&line, &screen) else {
                    if !line.trim().is_empty() {
                        println!("unknown command; type `help` for the list");
                    }
                    continue;
                };
                match apply(&mut manager, &mut options, &screen, action).await {
                    Ok(Step::Quit) => break,
                    Ok(Step::Redraw) => print_screen(&manager, &options),
                    Ok(Step::Note(note)) => println!("{note}"),
                    Err(err) => println!("error: {err}"),
                }
            }
            Some(tick) = ticks.recv() => match manager.on_timer_tick(tick).await {
                Ok(TickOutcome::Expired) => {
                    println!("time is up");
                    print_screen(&manager, &options);
                }
                Ok(TickOutcome::Counting { remaining }) if remaining % 60 == 0 || remaining <= 10 => {
                    println!("time left {}", format_clock(Some(remaining)));
                }
                Ok(_) => {}
                Err(err) => warn!(error = %err, "timer tick failed"),
            },
        }
    }

    if let Err(err) = manager.flush().await {
        warn!(error = %err, "could not save progress on exit");
    }
    Ok(())
}
