//! Line-based interactive prompts.
//!
//! Numbered menus accept `0` to cancel. Multi-selection menus take
//! comma-separated numbers and end with an "all" entry.

use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while prompting.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Input was not a number or out of range. Aborts the current operation only.
    #[error("invalid selection: {0}")]
    SelectionInvalid(String),
    #[error("failed to read input: {0}")]
    Io(#[from] io::Error),
}

/// Parses a comma-separated selection against `option_count` numbered options.
///
/// Returns zero-based indices in the order entered, or `None` for `0`.
/// Choosing the last option selects every option before it.
///
/// # Examples
///
/// ```
/// use romshelf::prompt::parse_selection;
///
/// assert_eq!(parse_selection("2, 1", 4).unwrap(), Some(vec![1, 0]));
/// assert_eq!(parse_selection("4", 4).unwrap(), Some(vec![0, 1, 2]));
/// assert_eq!(parse_selection("0", 4).unwrap(), None);
/// assert!(parse_selection("x", 4).is_err());
/// ```
pub fn parse_selection(input: &str, option_count: usize) -> Result<Option<Vec<usize>>, PromptError> {
    if input.trim() == "0" {
        return Ok(None);
    }

    let mut indices = Vec::new();
    for token in input.split(',') {
        let token = token.trim();
        let number: usize = token
            .parse()
            .map_err(|_| PromptError::SelectionInvalid(format!("'{token}' is not a number")))?;
        if number < 1 || number > option_count {
            return Err(PromptError::SelectionInvalid(format!(
                "{number} is not between 1 and {option_count}"
            )));
        }
        indices.push(number - 1);
    }

    if indices.contains(&(option_count - 1)) {
        return Ok(Some((0..option_count - 1).collect()));
    }
    Ok(Some(indices))
}

/// Parses a single menu choice; returns a zero-based index or `None` for `0`.
pub fn parse_choice(input: &str, option_count: usize) -> Result<Option<usize>, PromptError> {
    let token = input.trim();
    if token == "0" {
        return Ok(None);
    }
    match token.parse::<usize>() {
        Ok(number) if (1..=option_count).contains(&number) => Ok(Some(number - 1)),
        Ok(number) => Err(PromptError::SelectionInvalid(format!(
            "{number} is not between 1 and {option_count}"
        ))),
        Err(_) => Err(PromptError::SelectionInvalid(format!("'{token}' is not a number"))),
    }
}

/// A source of answer lines.
pub trait LineInput {
    /// The next line without its terminator.
    ///
    /// Returns `None` at end of input, or when `timeout` is given and elapses
    /// first. Sources that cannot time out ignore `timeout`.
    fn next_line(&mut self, timeout: Option<Duration>) -> io::Result<Option<String>>;
}

impl<R: BufRead> LineInput for R {
    fn next_line(&mut self, _timeout: Option<Duration>) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Stdin lines read on a background thread so pauses can time out.
pub struct StdinLines {
    receiver: mpsc::Receiver<String>,
}

impl StdinLines {
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
        Self { receiver }
    }
}

impl LineInput for StdinLines {
    fn next_line(&mut self, timeout: Option<Duration>) -> io::Result<Option<String>> {
        Ok(match timeout {
            Some(timeout) => self.receiver.recv_timeout(timeout).ok(),
            None => self.receiver.recv().ok(),
        })
    }
}

/// Reads answers from `input` and writes menus to `output`.
pub struct Prompter<I, W> {
    input: I,
    output: W,
}

impl Prompter<StdinLines, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(StdinLines::spawn(), io::stdout())
    }
}

impl<I: LineInput, W: Write> Prompter<I, W> {
    pub fn new(input: I, output: W) -> Self {
        Self { input, output }
    }

    /// Prints `message` and reads one trimmed line. End of input reads as `0`.
    pub fn ask(&mut self, message: &str) -> Result<String, PromptError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        Ok(self
            .input
            .next_line(None)?
            .map(|line| line.trim().to_string())
            .unwrap_or_else(|| "0".to_string()))
    }

    /// Waits for Enter, giving up after `timeout`.
    pub fn pause(&mut self, message: &str, timeout: Duration) -> Result<(), PromptError> {
        write!(self.output, "{message}")?;
        self.output.flush()?;
        if self.input.next_line(Some(timeout))?.is_none() {
            writeln!(self.output)?;
        }
        Ok(())
    }

    fn print_options<T: Display>(&mut self, title: &str, options: &[T]) -> Result<(), PromptError> {
        writeln!(self.output, "\n{title}")?;
        for (number, option) in options.iter().enumerate() {
            writeln!(self.output, "{}. {option}", number + 1)?;
        }
        Ok(())
    }

    /// Numbered single choice; `None` when cancelled.
    pub fn choose<T: Display>(&mut self, title: &str, options: &[T]) -> Result<Option<usize>, PromptError> {
        self.print_options(title, options)?;
        let answer = self.ask("Enter your choice (or 0 to cancel): ")?;
        parse_choice(&answer, options.len())
    }

    /// Numbered multiple choice with a trailing `all_label` entry.
    pub fn choose_many<T: Display>(
        &mut self,
        title: &str,
        options: &[T],
        all_label: &str,
    ) -> Result<Option<Vec<usize>>, PromptError> {
        let mut labels: Vec<String> = options.iter().map(ToString::to_string).collect();
        labels.push(all_label.to_string());
        self.print_options(title, &labels)?;
        let answer = self.ask("Enter your choice(s) separated by commas (or 0 to cancel): ")?;
        parse_selection(&answer, labels.len())
    }

    /// Asks a yes/no question; only `y` or `yes` count as yes.
    pub fn confirm(&mut self, question: &str) -> Result<bool, PromptError> {
        let answer = self.ask(&format!("{question} (y/n): "))?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_selection_order_and_all() {
        assert_eq!(parse_selection("3,1", 5).unwrap(), Some(vec![2, 0]));
        assert_eq!(parse_selection(" 1 , 5 ", 5).unwrap(), Some(vec![0, 1, 2, 3]));
    }

    #[test]
    fn test_parse_selection_rejects_bad_input() {
        assert!(matches!(parse_selection("1,a", 3), Err(PromptError::SelectionInvalid(_))));
        assert!(matches!(parse_selection("4", 3), Err(PromptError::SelectionInvalid(_))));
        assert!(matches!(parse_selection("", 3), Err(PromptError::SelectionInvalid(_))));
        assert!(matches!(parse_selection("-1", 3), Err(PromptError::SelectionInvalid(_))));
        assert!(matches!(parse_selection("0,1", 3), Err(PromptError::SelectionInvalid(_))));
    }

    #[test]
    fn test_parse_choice() {
        assert_eq!(parse_choice("2", 4).unwrap(), Some(1));
        assert_eq!(parse_choice("0", 4).unwrap(), None);
        assert!(parse_choice("5", 4).is_err());
        assert!(parse_choice("two", 4).is_err());
    }

    #[test]
    fn test_prompter_choose_many() {
        let mut output = Vec::new();
        let mut prompter = Prompter::new(Cursor::new("2\n"), &mut output);
        let selected = prompter
            .choose_many("Systems:", &["SNES", "GBA"], "All Systems")
            .unwrap();
        assert_eq!(selected, Some(vec![1]));

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("1. SNES"));
        assert!(shown.contains("3. All Systems"));
    }

    #[test]
    fn test_prompter_confirm_and_eof() {
        let mut prompter = Prompter::new(Cursor::new("Yes\nn\n"), Vec::new());
        assert!(prompter.confirm("Delete?").unwrap());
        assert!(!prompter.confirm("Delete?").unwrap());
        assert_eq!(prompter.ask("> ").unwrap(), "0");
    }

    #[test]
    fn test_pause_consumes_one_line() {
        let mut prompter = Prompter::new(Cursor::new("\n1\n"), Vec::new());
        prompter.pause("Press Enter...", Duration::from_millis(10)).unwrap();
        assert_eq!(prompter.ask("> ").unwrap(), "1");
    }

    #[test]
    fn test_stdin_lines_strip_terminators() {
        let mut input = Cursor::new("first\r\nsecond");
        assert_eq!(input.next_line(None).unwrap().as_deref(), Some("first"));
        assert_eq!(input.next_line(None).unwrap().as_deref(), Some("second"));
        assert_eq!(input.next_line(None).unwrap(), None);
    }
}
