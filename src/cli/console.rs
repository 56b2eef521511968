use colored::*;
use std::io::{self, Write};

use crate::app::{ComponentStatus, TurnReport};
use crate::core::{Event, EventKind, IntermediateEvent};
use crate::session::SessionSnapshot;

const TOOL_OUTPUT_LIMIT: usize = 500;

/// Console handles all terminal I/O with colored formatting
pub struct Console {
    user_color: Color,
    assistant_color: Color,
    tool_color: Color,
    show_events: bool,
}

impl Console {
    /// Create a new Console with default colors
    pub fn new() -> Self {
        Self {
            user_color: Color::Cyan,
            assistant_color: Color::Green,
            tool_color: Color::Magenta,
            show_events: true,
        }
    }

    /// Set whether intermediate events are printed
    pub fn show_events(mut self, show: bool) -> Self {
        self.show_events = show;
        self
    }

    /// Print a user message with colored formatting
    pub fn print_user(&self, message: &str) {
        println!("{} {}", "User:".color(self.user_color).bold(), message);
    }

    /// Print a newline
    pub fn println(&self) {
        println!();
    }

    /// Print a system message (errors, info, etc.)
    pub fn print_system(&self, message: &str) {
        println!("{} {}", "System:".yellow().bold(), message);
    }

    /// Print an error message
    pub fn print_error(&self, error: &str) {
        eprintln!("{} {}", "Error:".red().bold(), error);
    }

    /// Read a line of input from the user
    pub fn read_input(&self) -> io::Result<String> {
        print!("{} ", ">".color(self.user_color).bold());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }

    /// Print a welcome banner
    pub fn print_banner(&self) {
        println!("{}", "=".repeat(60).bright_blue());
        println!(
            "{}",
            "  Fi Money Stock Transactions Agent".bright_blue().bold()
        );
        println!("{}", "=".repeat(60).bright_blue());
        println!();
        println!("Ask about your stock transactions. Type 'exit' or 'quit' to end the session.");
        println!();
    }

    /// Print a separator line
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(60).bright_black());
    }

    /// Print what the components connected to at startup
    pub fn print_status(&self, status: &ComponentStatus) {
        let mark = |ok: bool| if ok { "yes".green() } else { "no".red() };

        self.print_separator();
        println!("  API key found:  {}", mark(status.credential_found));
        println!(
            "  Tool server:    {} (connected: {})",
            status.mcp_server,
            mark(status.mcp_connected)
        );
        if let Some(ref name) = status.agent_name {
            println!(
                "  Agent:          {} on {}",
                name,
                status.agent_model.as_deref().unwrap_or("?")
            );
        }
        if let Some(ref model) = status.summary_model {
            println!("  Summary model:  {}", model);
        }
        if !status.tools.is_empty() {
            println!("  Tools:          {}", status.tools.join(", "));
        }
        self.print_separator();
    }

    /// Print the initial state of a session
    pub fn print_session_state(&self, snapshot: &SessionSnapshot) {
        println!("{} {}", "Session:".bright_white().bold(), snapshot.key);
        println!(
            "  created {} with {} messages and {} state keys",
            snapshot.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            snapshot.message_count,
            snapshot.state.len()
        );
    }

    /// Print a tool action message
    pub fn print_tool_action(&self, tool_name: &str, action: &str) {
        println!(
            "{} {} {}",
            "Tool:".color(self.tool_color).bold(),
            format!("[{}]", tool_name).color(self.tool_color),
            action
        );
    }

    /// Print a tool result
    pub fn print_tool_result(&self, result: &str, is_error: bool) {
        if is_error {
            println!("{} {}", "Tool Error:".red().bold(), result);
        } else {
            println!("{}", truncate(result, TOOL_OUTPUT_LIMIT).bright_black());
        }
    }

    /// Print one agent event as it is consumed
    pub fn print_event(&self, event: &Event) {
        if !self.show_events {
            return;
        }

        match &event.kind {
            EventKind::Intermediate { event: inner } => match inner {
                IntermediateEvent::ModelText { text } => {
                    println!("{} {}", format!("{}:", event.author).bright_black(), text);
                }
                IntermediateEvent::ToolCall { name, args, .. } => {
                    self.print_tool_action(name, &format!("called with {}", args));
                }
                IntermediateEvent::ToolResponse {
                    name,
                    output,
                    is_error,
                    ..
                } => {
                    self.print_tool_action(name, "returned");
                    self.print_tool_result(output, *is_error);
                }
            },
            EventKind::Final { .. } => {
                println!("{}", format!("[{}] final response", event.author).bright_black());
            }
        }
    }

    /// Print the agent's raw final answer
    pub fn print_final(&self, text: &str) {
        println!();
        println!("{}", "Agent Response:".color(self.assistant_color).bold());
        println!("{}", text.color(self.assistant_color));
    }

    /// Print the summary block
    pub fn print_insights(&self, insights: &str) {
        println!();
        println!("{}", "AI Insights:".bright_blue().bold());
        println!("{}", insights);
    }

    /// Print everything a turn produced after its events
    pub fn print_report(&self, report: &TurnReport) {
        if let Some(ref text) = report.final_text {
            self.print_final(text);
        } else if report.error.is_none() {
            self.print_system("The agent did not produce a final response.");
        }

        if let Some(ref error) = report.error {
            self.print_error(error);
        }
        if let Some(ref error) = report.insights_error {
            self.print_error(error);
        }

        self.print_insights(report.insights_or_placeholder());
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}

/// Cut `text` to at most `limit` bytes on a char boundary
fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...\n(output truncated)", &text[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_text_unchanged() {
        assert_eq!(truncate("three rows", 500), "three rows");
    }

    #[test]
    fn test_truncate_respects_char_boundary() {
        let text = "₹".repeat(200);
        let cut = truncate(&text, 500);
        assert!(cut.ends_with("(output truncated)"));
        assert!(cut.starts_with(&"₹".repeat(166)));
    }
}
