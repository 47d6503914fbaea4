// Central error aggregation module. This file defines the global `PdfebcError`
// and re-exports commonly used error types under `crate::errors::*`.
pub mod config;
pub mod pdfebc;

pub use config::ConfigError;

pub use pdfebc::PdfebcError;
pub type Result<T> = std::result::Result<T, PdfebcError>;
