//! Output rendering for the chat loop.
//!
//! The loop never prints directly; it reports through a [`Renderer`] so that the binary can
//! style output for a terminal and tests can capture it.

use std::io::{self, Stdout, Write};

/// ANSI escape code for dim text (used for automatic notices).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code for bold text (used for the assistant label).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for assistant replies).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print the assistant's reply to a turn.
    ///
    /// Provider failures arrive here too, already prefixed with the API error marker, because
    /// the turn reports them in place of a reply.
    fn print_reply(&mut self, reply: &str);

    /// Print an error that did not come from the provider.
    fn print_error(&mut self, error: &str);

    /// Print an informational message, e.g. a command confirmation.
    fn print_info(&mut self, info: &str);

    /// Print something the loop did on its own, e.g. an automatic summary.
    fn print_notice(&mut self, notice: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Returns true if ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_reply(&mut self, reply: &str) {
        if self.use_color {
            println!("\n{ANSI_BOLD}{ANSI_CYAN}Assistant:{ANSI_RESET} {reply}");
        } else {
            println!("\nAssistant: {reply}");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        if self.use_color {
            eprintln!("{ANSI_RED}Error: {error}{ANSI_RESET}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
        self.flush();
    }

    fn print_notice(&mut self, notice: &str) {
        if self.use_color {
            println!("\n{ANSI_DIM}{notice}{ANSI_RESET}");
        } else {
            println!("\n{notice}");
        }
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color());
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color());
    }
}
