//! Plain-text rendering of the session read models.

use std::fmt;

use services::{QuestionView, ResultView, ReviewView, Screen, StartView};

use crate::play::StartOptions;

/// `h:mm:ss` from one hour up, `mm:ss` below, `free` for untimed sessions.
pub fn format_clock(seconds: Option<u32>) -> String {
    let Some(seconds) = seconds else {
        return "free".to_owned();
    };
    let (hours, minutes, secs) = (seconds / 3600, seconds % 3600 / 60, seconds % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Letter shown next to the option at `index` (`A`, `B`, ...).
pub fn option_label(index: usize) -> char {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or('?', |i| char::from(b'A' + i))
}

fn duration_label(duration: Option<u32>) -> String {
    duration.map_or_else(|| "no limit".to_owned(), |secs| format!("{} min", secs / 60))
}

/// Displays a `Screen` together with the pending start options.
pub struct ScreenDisplay<'a> {
    pub screen: &'a Screen,
    pub options: &'a StartOptions,
}

impl fmt::Display for ScreenDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.screen {
            Screen::Start(view) => write_start(f, view, self.options),
            Screen::Question(view) => write_question(f, view),
            Screen::Result(view) => write_result(f, view),
            Screen::Review(view) => write_review(f, view),
        }
    }
}

fn write_start(f: &mut fmt::Formatter<'_>, view: &StartView, options: &StartOptions) -> fmt::Result {
    writeln!(f, "== Exam simulator ==")?;
    for card in &view.modules {
        let marker = if card.selected && !options.random { '>' } else { ' ' };
        write!(
            f,
            " {marker} module {}  {:>3} questions  {:>3}% answered",
            card.id, card.question_count, card.answered_percent
        )?;
        if card.resumable {
            write!(f, "  (in progress)")?;
        }
        writeln!(f)?;
    }
    let marker = if options.random { '>' } else { ' ' };
    write!(
        f,
        " {marker} random mix {:>3} questions",
        view.random_mix.pool_size
    )?;
    if view.random_mix.resumable {
        write!(f, "  (in progress)")?;
    }
    writeln!(f)?;

    writeln!(
        f,
        "time: {}  questions: {}",
        duration_label(options.duration),
        options.count
    )?;
    writeln!(f, "type `start` to begin or `help` for commands")
}

fn write_question(f: &mut fmt::Formatter<'_>, view: &QuestionView) -> fmt::Result {
    let low = if view.is_time_low { " (!)" } else { "" };
    writeln!(
        f,
        "module {} | question {}/{} | {}% | time {}{low}",
        view.module,
        view.position,
        view.total,
        view.progress_percent,
        format_clock(view.time_left)
    )?;
    writeln!(f)?;
    writeln!(f, "{}", view.prompt)?;
    for (index, option) in view.options.iter().enumerate() {
        let note = match (view.correct_index, view.selected_option) {
            (Some(correct), _) if correct == index => "  <- correct",
            (Some(_), Some(selected)) if selected == index => "  <- your answer",
            _ => "",
        };
        writeln!(f, "  {}) {option}{note}", option_label(index))?;
    }
    if let Some(explanation) = &view.explanation {
        writeln!(f)?;
        writeln!(f, "explanation: {explanation}")?;
    }
    if view.is_answered {
        let next = if view.is_last { "finish" } else { "next" };
        writeln!(f, "type `next` to {next}")?;
    }
    Ok(())
}

fn write_result(f: &mut fmt::Formatter<'_>, view: &ResultView) -> fmt::Result {
    let verdict = if view.approved { "approved" } else { "not approved" };
    writeln!(f, "== Result: module {} ==", view.module)?;
    writeln!(
        f,
        "{}/{} correct ({}%) - {verdict}",
        view.score, view.total, view.percentage
    )?;
    writeln!(f, "type `review` to see every answer or `restart` to start over")
}

fn write_review(f: &mut fmt::Formatter<'_>, view: &ReviewView) -> fmt::Result {
    writeln!(f, "== Review: module {} ==", view.module)?;
    for item in &view.items {
        let mark = if item.is_correct { "ok" } else { "wrong" };
        writeln!(f)?;
        writeln!(f, "{}. [{mark}] {}", item.number, item.prompt)?;
        let answer = item.user_answer.map_or_else(
            || "not answered".to_owned(),
            |index| option_text(&item.options, index),
        );
        writeln!(f, "   your answer: {answer}")?;
        if !item.is_correct {
            writeln!(
                f,
                "   correct:     {}",
                option_text(&item.options, item.correct_index)
            )?;
        }
        if let Some(explanation) = &item.explanation {
            writeln!(f, "   {explanation}")?;
        }
    }
    writeln!(f)?;
    writeln!(f, "type `restart` to leave the review")
}

fn option_text(options: &[String], index: usize) -> String {
    let text = options.get(index).map_or("", String::as_str);
    format!("{}) {text}", option_label(index))
}
