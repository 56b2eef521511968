//! Console Renderer - Drives turns from the terminal
//!
//! The `ConsoleRenderer` owns a `Console` and a conversation over the shared
//! `Components`. Each line typed is one turn: events are printed as they
//! arrive, then the raw answer and its insights.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;

use crate::app::{save_artifact, Components, ConversationContext};
use crate::core::FrameworkError;

use super::console::Console;

/// Console renderer for the stock transactions agent
///
/// # Example
///
/// ```ignore
/// let components = Arc::new(Components::initialize(config).await?);
/// ConsoleRenderer::new(components).run().await?;
/// ```
pub struct ConsoleRenderer {
    components: Arc<Components>,
    console: Console,
    conversation: ConversationContext,
    save_dir: Option<PathBuf>,
}

impl ConsoleRenderer {
    /// Create a renderer with a fresh conversation
    pub fn new(components: Arc<Components>) -> Self {
        let conversation = components.new_conversation();
        Self {
            components,
            console: Console::new(),
            conversation,
            save_dir: None,
        }
    }

    /// Create a renderer with a custom console
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// Save every raw final answer to `dir`
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = Some(dir.into());
        self
    }

    /// Print the banner, status and session state
    pub async fn print_intro(&self) {
        self.console.print_banner();
        self.console.print_status(&self.components.status().await);
        let snapshot = self.components.open_session(&self.conversation).await;
        self.console.print_session_state(&snapshot);
        self.console.println();
    }

    /// Run the interactive loop
    ///
    /// Returns when the user types "exit" or "quit", or stdin closes.
    pub async fn run(&self) -> io::Result<()> {
        self.print_intro().await;

        loop {
            let input = self.console.read_input()?;

            if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
                self.console.print_system("Shutting down...");
                break;
            }

            if input.trim().is_empty() {
                continue;
            }

            self.run_turn(&input).await;
            self.console.println();
        }

        Ok(())
    }

    /// Run a single turn and render it
    ///
    /// Returns false when the turn produced no final answer.
    pub async fn run_turn(&self, input: &str) -> bool {
        let console = &self.console;
        let result = self
            .components
            .process_turn_observed(&self.conversation, input, &mut |event| {
                console.print_event(event)
            })
            .await;

        let report = match result {
            Ok(report) => report,
            Err(FrameworkError::InvalidInput(_)) => {
                self.console.print_system("Please enter a message.");
                return false;
            }
            Err(e) => {
                self.console.print_error(&e.to_string());
                return false;
            }
        };

        self.console.print_report(&report);

        if let (Some(dir), Some(text)) = (&self.save_dir, report.final_text.as_deref()) {
            match save_artifact(dir, text, Local::now()) {
                Ok(path) => self
                    .console
                    .print_system(&format!("Saved response to {}", path.display())),
                Err(e) => self.console.print_error(&format!("Failed to save response: {}", e)),
            }
        }

        report.final_text.is_some()
    }

    /// Get the underlying console
    pub fn console(&self) -> &Console {
        &self.console
    }
}
