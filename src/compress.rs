//! # PDF compression
//!
//! Ghostscript does the actual work. Files below [`FILE_SIZE_LOWER_LIMIT`]
//! are copied as they are, everything else is rewritten with the `/ebook`
//! preset.
//!
//! ```rust,no_run
//! use pdfebc::compress::compress_many;
//! use pdfebc::progress::Silent;
//!
//! let outputs = compress_many("scans", "scans/out", "gs", &Silent)?;
//! println!("{} files written", outputs.len());
//! # Ok::<(), pdfebc::errors::PdfebcError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::errors::{PdfebcError, Result};
use crate::progress::{ProgressSink, Status};
use crate::scanner::{has_pdf_extension, list_pdf_paths};

pub const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;
pub const FILE_SIZE_LOWER_LIMIT: u64 = BYTES_PER_MEGABYTE;

/// Fixed Ghostscript flags, output and input paths are appended per call.
pub const GS_ARGS: [&str; 6] = [
    "-sDEVICE=pdfwrite",
    "-dCompatibilityLevel=1.4",
    "-dPDFSETTINGS=/ebook",
    "-dNOPAUSE",
    "-dQUIET",
    "-dBATCH",
];

/// Compress a single PDF file.
///
/// Emits two status messages through `sink`: one before the work starts
/// and one when the result has been written to `destination`.
///
/// ## Errors
///
/// - `InvalidInput` if `source` does not end with `.pdf`, or if `source`
///   and `destination` are the same file
/// - `ToolNotFound` if `gs_binary` cannot be resolved to an executable
/// - `Io` if `source` cannot be read or `destination` written
/// - `CommandFailed` if Ghostscript exits unsuccessfully
pub fn compress_one<S, D>(source: S, destination: D, gs_binary: &str, sink: &dyn ProgressSink) -> Result<()>
where
    S: AsRef<Path>,
    D: AsRef<Path>,
{
    let source = source.as_ref();
    let destination = destination.as_ref();

    if !has_pdf_extension(source.as_os_str()) {
        return Err(PdfebcError::InvalidInput(format!(
            "Filename must end with .pdf!\n{} does not.",
            source.display()
        )));
    }
    let gs = resolve_tool(gs_binary)?;

    if is_same_file(source, destination)? {
        return Err(PdfebcError::InvalidInput(format!(
            "Refusing to overwrite {} with itself",
            source.display()
        )));
    }

    let size = fs::metadata(source)?.len();
    if size < FILE_SIZE_LOWER_LIMIT {
        log::debug!("{} is {} bytes, copying", source.display(), size);
        Status::NotCompressing { source, size, limit: FILE_SIZE_LOWER_LIMIT }.emit(sink);
        fs::copy(source, destination)?;
    } else {
        log::debug!("{} is {} bytes, compressing with {}", source.display(), size, gs.display());
        Status::Compressing { source }.emit(sink);
        run_ghostscript(&gs, gs_binary, source, destination)?;
    }

    Status::FileDone { destination }.emit(sink);
    Ok(())
}

/// Compress every PDF file in `source_dir` into `output_dir`.
///
/// Files are handled one at a time in discovery order and the first
/// failure aborts the batch. Returns the destination paths in the same
/// order, whether a file was compressed or copied.
pub fn compress_many<S, O>(source_dir: S, output_dir: O, gs_binary: &str, sink: &dyn ProgressSink) -> Result<Vec<PathBuf>>
where
    S: AsRef<Path>,
    O: AsRef<Path>,
{
    let source_dir = source_dir.as_ref();
    let output_dir = output_dir.as_ref();

    let sources = list_pdf_paths(source_dir)?;
    Status::BatchStarted { source_dir, output_dir, count: sources.len() }.emit(sink);

    let mut outputs = Vec::with_capacity(sources.len());
    for source in &sources {
        let file_name = source.file_name().ok_or_else(|| {
            PdfebcError::InvalidInput(format!("{} has no file name", source.display()))
        })?;
        let destination = output_dir.join(file_name);
        compress_one(source, &destination, gs_binary, sink)?;
        outputs.push(destination);
    }

    log::info!("compressed {} files into {}", outputs.len(), output_dir.display());
    Status::BatchDone { output_dir }.emit(sink);
    Ok(outputs)
}

/// Both the copy and Ghostscript truncate `destination` before reading
/// `source`, so the two must never name the same file.
fn is_same_file(source: &Path, destination: &Path) -> Result<bool> {
    if !destination.exists() {
        return Ok(false);
    }
    Ok(fs::canonicalize(source)? == fs::canonicalize(destination)?)
}

/// Locate `gs_binary` on `PATH`, or as a path if it contains a separator.
fn resolve_tool(gs_binary: &str) -> Result<PathBuf> {
    which::which(gs_binary).map_err(|e| {
        log::warn!("could not resolve '{}': {}", gs_binary, e);
        PdfebcError::ToolNotFound(gs_binary.to_string())
    })
}

/// Run Ghostscript and wait for it to exit
fn run_ghostscript(gs: &Path, gs_binary: &str, source: &Path, destination: &Path) -> Result<()> {
    let output = Command::new(gs)
        .args(GS_ARGS)
        .arg(format!("-sOutputFile={}", destination.display()))
        .arg(source)
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PdfebcError::ToolNotFound(gs_binary.to_string()),
            _ => PdfebcError::Io(e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        return Err(PdfebcError::CommandFailed(format!(
            "{} exited with {}: {}",
            gs_binary,
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}
