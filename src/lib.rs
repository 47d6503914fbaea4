//! Compress PDF files to e-reader friendly sizes with Ghostscript and mail
//! the results.
//!
//! ```rust,no_run
//! use pdfebc::compress::compress_many;
//! use pdfebc::config::paths::{ConfigPathProvider, UserConfigDir};
//! use pdfebc::mail::send_preconfigured;
//! use pdfebc::utils::ConsoleSink;
//!
//! let sink = ConsoleSink::new();
//! let outputs = compress_many("papers", "papers/small", "gs", &sink)?;
//! send_preconfigured(&outputs, UserConfigDir.config_path()?, &sink)?;
//! # Ok::<(), pdfebc::errors::PdfebcError>(())
//! ```

pub mod compress;
pub mod config;
pub mod errors;
pub mod mail;
pub mod progress;
pub mod scanner;
pub mod utils;

pub use errors::{PdfebcError, Result};
