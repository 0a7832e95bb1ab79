//! Output rendering for the chat application.
//!
//! This module provides a trait-based rendering abstraction that allows
//! for different output styles. The default implementation uses ANSI
//! escape codes to set pipeline progress lines apart from answer text.

use std::io::{self, Stdout, Write};

use crate::types::{PipelineStep, StepState};

/// ANSI escape code for dim text (used for progress lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for running steps).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for finished steps).
const ANSI_GREEN: &str = "\x1b[32m";

/// Trait for rendering chat output.
///
/// This abstraction allows for different rendering strategies:
/// - Plain text with ANSI styling
/// - Plain text without styling (for piping/redirecting)
/// - TUI rendering with an in-place progress indicator
pub trait Renderer: Send {
    /// Print a fragment of answer text.
    ///
    /// This is called incrementally as tokens stream in.
    fn print_text(&mut self, text: &str);

    /// Print a pipeline step transition.
    ///
    /// Called once per visible change, never for regressions or repeats.
    fn print_step(&mut self, step: PipelineStep, state: StepState);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called when an answer is complete.
    ///
    /// Used to ensure proper newlines and cleanup after streaming.
    fn finish_response(&mut self);

    /// Called when the stream is interrupted by the user.
    fn print_interrupted(&mut self);
}

/// Plain text renderer with optional ANSI styling.
///
/// Progress lines print dim and bracketed above the answer; answer text
/// streams unstyled.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self {
            stdout: io::stdout(),
            use_color: true,
        }
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
        }
    }

    /// Flushes stdout to ensure immediate display of streamed content.
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
    fn print_text(&mut self, text: &str) {
        print!("{text}");
        self.flush();
    }

    fn print_step(&mut self, step: PipelineStep, state: StepState) {
        let label = step.label();
        if self.use_color {
            let color = match state {
                StepState::Done => ANSI_GREEN,
                _ => ANSI_CYAN,
            };
            let marker = match state {
                StepState::Done => "ok",
                _ => "...",
            };
            println!("{ANSI_DIM}{color}[{label} {marker}]{ANSI_RESET}");
        } else {
            let marker = match state {
                StepState::Done => "ok",
                _ => "...",
            };
            println!("[{label} {marker}]");
        }
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        eprintln!("\nError: {error}");
    }

    fn print_info(&mut self, info: &str) {
        println!("{info}");
    }

    fn finish_response(&mut self) {
        println!();
        self.flush();
    }

    fn print_interrupted(&mut self) {
        println!("\n[interrupted]");
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }
}
