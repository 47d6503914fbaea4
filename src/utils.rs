use colored::{Color, Colorize};

use crate::progress::ProgressSink;

/// Prints progress messages to stdout, the first line of each message
/// highlighted and the rest indented.
pub struct ConsoleSink {
    color: Color,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { color: Color::Cyan }
    }

    pub fn with_color(color: Color) -> Self {
        Self { color }
    }

    pub fn format(&self, message: &str) -> String {
        let mut lines = message.lines();
        let mut out = match lines.next() {
            Some(first) => format!("{} {}", "→".color(self.color), first.bold()),
            None => return String::new(),
        };
        for line in lines {
            out.push('\n');
            if !line.is_empty() {
                out.push_str(&format!("  {}", line.dimmed()));
            }
        }
        out
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for ConsoleSink {
    fn notify(&self, message: &str) {
        println!("{}", self.format(message));
    }
}
