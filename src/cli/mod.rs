//! Terminal presentation
//!
//! - `Console` - Colored output and line input
//! - `ConsoleRenderer` - The interactive turn loop

mod console;
mod renderer;

pub use console::Console;
pub use renderer::ConsoleRenderer;
