use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::errors::{PdfebcError, Result};

pub const PDF_EXTENSION: &str = ".pdf";

/// Byte-wise suffix check, so names that are not valid UTF-8 still match.
pub fn has_pdf_extension(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(PDF_EXTENSION.as_bytes())
}

/// List every `.pdf` entry directly inside `directory`.
///
/// The suffix match is case-sensitive and the result keeps the order in
/// which the filesystem yields entries.
pub fn list_pdf_paths<P: AsRef<Path>>(directory: P) -> Result<Vec<PathBuf>> {
    let directory = directory.as_ref();
    if !directory.is_dir() {
        return Err(PdfebcError::InvalidInput(format!(
            "{} is not a directory!",
            directory.display()
        )));
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry?;
        if has_pdf_extension(entry.file_name()) {
            paths.push(directory.join(entry.file_name()));
        }
    }
    log::debug!("found {} PDF files in {}", paths.len(), directory.display());
    Ok(paths)
}
