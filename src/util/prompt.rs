//! Interactive prompts.
//!
//! Every prompt returns `Ok(None)` when the user cancels (Esc, `q`, Ctrl-C or
//! end of input). Cancellation is a value, never an error.

use std::io;

use console::Style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};

/// Source of user decisions.
pub trait Prompter {
    /// Whether a human is answering. Non-interactive prompters only ever
    /// return defaults.
    fn is_interactive(&self) -> bool;

    /// Pick one of `items`.
    fn select(&self, prompt: &str, items: &[String], default: usize) -> io::Result<Option<usize>>;

    /// Answer a yes/no question.
    fn confirm(&self, prompt: &str, default: bool) -> io::Result<Option<bool>>;
}

/// Terminal prompts on stderr.
pub struct InteractivePrompter {
    theme: ColorfulTheme,
}

impl InteractivePrompter {
    pub fn new() -> Self {
        InteractivePrompter {
            theme: ColorfulTheme {
                active_item_style: Style::new().for_stderr().magenta(),
                ..ColorfulTheme::default()
            },
        }
    }
}

impl Default for InteractivePrompter {
    fn default() -> Self {
        Self::new()
    }
}

/// Map an interrupted read to a cancel.
fn cancel_on_interrupt<T>(result: Result<Option<T>, dialoguer::Error>) -> io::Result<Option<T>> {
    match result {
        Ok(value) => Ok(value),
        Err(dialoguer::Error::IO(err)) => match err.kind() {
            io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof => Ok(None),
            _ => Err(err),
        },
    }
}

impl Prompter for InteractivePrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn select(&self, prompt: &str, items: &[String], default: usize) -> io::Result<Option<usize>> {
        cancel_on_interrupt(
            Select::with_theme(&self.theme)
                .with_prompt(prompt)
                .items(items)
                .default(default.min(items.len().saturating_sub(1)))
                .interact_opt(),
        )
    }

    fn confirm(&self, prompt: &str, default: bool) -> io::Result<Option<bool>> {
        cancel_on_interrupt(
            Confirm::with_theme(&self.theme)
                .with_prompt(prompt)
                .default(default)
                .show_default(true)
                .interact_opt(),
        )
    }
}

/// Answers every prompt with its default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompter;

impl Prompter for NonInteractivePrompter {
    fn is_interactive(&self) -> bool {
        false
    }

    fn select(&self, _prompt: &str, items: &[String], default: usize) -> io::Result<Option<usize>> {
        if items.is_empty() {
            return Ok(None);
        }
        Ok(Some(default.min(items.len() - 1)))
    }

    fn confirm(&self, _prompt: &str, default: bool) -> io::Result<Option<bool>> {
        Ok(Some(default))
    }
}

/// Interactive prompts when stdin and stderr are terminals, defaults otherwise.
pub fn default_prompter(no_interactive: bool) -> Box<dyn Prompter> {
    use std::io::IsTerminal;

    if no_interactive || !io::stdin().is_terminal() || !io::stderr().is_terminal() {
        Box::new(NonInteractivePrompter)
    } else {
        Box::new(InteractivePrompter::new())
    }
}
