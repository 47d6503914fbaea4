//! # Progress reporting
//!
//! Long running operations report what they are doing through a
//! [`ProgressSink`]. Callers that don't care pass [`Silent`]; any
//! `Fn(&str)` closure works as a sink as well.
//!
//! ```rust
//! use pdfebc::progress::{ProgressSink, Silent};
//!
//! let sink = |msg: &str| println!("{}", msg);
//! sink.notify("hello");
//! Silent.notify("nobody hears this");
//! ```

use std::fmt;
use std::path::Path;

/// Receiver of human readable status messages.
///
/// Called synchronously from the operation that emits the message; a sink
/// must not panic.
pub trait ProgressSink {
    fn notify(&self, message: &str);
}

/// Sink that drops every message
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressSink for Silent {
    fn notify(&self, _message: &str) {}
}

impl<F> ProgressSink for F
where
    F: Fn(&str),
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Status messages emitted at fixed points of compression and delivery.
#[derive(Debug, Clone)]
pub enum Status<'a> {
    BatchStarted {
        source_dir: &'a Path,
        output_dir: &'a Path,
        count: usize,
    },
    BatchDone {
        output_dir: &'a Path,
    },
    Compressing {
        source: &'a Path,
    },
    NotCompressing {
        source: &'a Path,
        size: u64,
        limit: u64,
    },
    FileDone {
        destination: &'a Path,
    },
    Sending {
        from: &'a str,
        to: &'a str,
        smtp_server: &'a str,
        smtp_port: &'a str,
        files: &'a [&'a Path],
    },
    FilesSent,
}

impl Status<'_> {
    /// Render the message and hand it to `sink`.
    pub fn emit(&self, sink: &dyn ProgressSink) {
        sink.notify(&self.to_string());
    }
}

impl fmt::Display for Status<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::BatchStarted { source_dir, output_dir, count } => write!(
                f,
                "Source directory: '{}'\nOutput directory: '{}'\nFound '{}' PDF files. Starting compression ...",
                source_dir.display(),
                output_dir.display(),
                count
            ),
            Status::BatchDone { output_dir } => {
                write!(f, "All files done!\nResults saved to '{}'", output_dir.display())
            }
            Status::Compressing { source } => write!(f, "Compressing '{}' ...", source.display()),
            Status::NotCompressing { source, size, limit } => write!(
                f,
                "Not compressing '{}'\nReason: Actual file size is {} bytes,\nlower limit for compression is {} bytes",
                source.display(),
                size,
                limit
            ),
            Status::FileDone { destination } => {
                write!(f, "File done! Result saved to '{}'", destination.display())
            }
            Status::Sending { from, to, smtp_server, smtp_port, files } => {
                let files = files
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join("\n");
                write!(
                    f,
                    "Sending files ...\nFrom: {}\nTo: {}\nSMTP Server: {}\nSMTP Port: {}\n\nFiles:\n{}",
                    from, to, smtp_server, smtp_port, files
                )
            }
            Status::FilesSent => write!(f, "Files successfully sent!"),
        }
    }
}
