//! Yes/no confirmation capability used during title resolution.
//!
//! The resolver never talks to a terminal directly; it asks a [`Confirm`]
//! implementation. The CLI injects [`TerminalPrompt`] or, with `--yes`,
//! [`AcceptDefaults`].

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::sync::Mutex;

/// Answers a yes/no question that carries a default answer.
pub trait Confirm {
    fn confirm(&self, question: &str, default: bool) -> bool;
}

/// Non-interactive policy: every question gets its default answer.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptDefaults;

impl Confirm for AcceptDefaults {
    fn confirm(&self, question: &str, default: bool) -> bool {
        log::debug!("auto-answered '{}' with {}", question, default);
        default
    }
}

/// Asks on stderr and reads the answer from stdin.
/// An empty line or end of input selects the default; anything unrecognized asks again.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Confirm for TerminalPrompt {
    fn confirm(&self, question: &str, default: bool) -> bool {
        let stdin = std::io::stdin();
        let mut input = stdin.lock();
        let mut stderr = std::io::stderr();
        loop {
            let hint = if default { "[Y/n]" } else { "[y/N]" };
            let _ = write!(stderr, "{} {} ", question, hint);
            let _ = stderr.flush();

            let mut line = String::new();
            match input.read_line(&mut line) {
                Ok(0) | Err(_) => return default,
                Ok(_) => {}
            }
            if let Some(answer) = parse_answer(&line, default) {
                return answer;
            }
        }
    }
}

/// Interpret a typed answer; `None` means the input was not a yes/no answer.
pub fn parse_answer(line: &str, default: bool) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "" => Some(default),
        "y" | "yes" | "true" => Some(true),
        "n" | "no" | "false" => Some(false),
        _ => None,
    }
}

/// Replays a fixed sequence of answers, then falls back to defaults.
/// Records every question it was asked.
#[derive(Debug, Default)]
pub struct Scripted {
    answers: Mutex<VecDeque<bool>>,
    asked: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.asked.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl Confirm for Scripted {
    fn confirm(&self, question: &str, default: bool) -> bool {
        if let Ok(mut asked) = self.asked.lock() {
            asked.push(question.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut a| a.pop_front())
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("\n", true), Some(true));
        assert_eq!(parse_answer("", false), Some(false));
        assert_eq!(parse_answer("Y\n", false), Some(true));
        assert_eq!(parse_answer(" no ", true), Some(false));
        assert_eq!(parse_answer("maybe", true), None);
    }

    #[test]
    fn test_scripted_replays_then_defaults() {
        let script = Scripted::new([false, true]);
        assert!(!script.confirm("first", true));
        assert!(script.confirm("second", false));
        assert!(script.confirm("third", true));
        assert!(!script.confirm("fourth", false));
        assert_eq!(script.questions(), vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_accept_defaults() {
        assert!(AcceptDefaults.confirm("anything", true));
        assert!(!AcceptDefaults.confirm("anything", false));
    }
}
