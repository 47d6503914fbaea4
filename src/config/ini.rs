//! Reader and writer for the `[section]` / `key = value` text format.

use std::io::{self, Write};

use indexmap::IndexMap;

use super::Section;
use crate::errors::ConfigError;

/// Fallback section of the format; never part of a parsed result.
pub const DEFAULT_SECTION: &str = "DEFAULT";

pub fn parse(text: &str) -> Result<IndexMap<String, Section>, ConfigError> {
    let mut sections: IndexMap<String, Section> = IndexMap::new();
    let mut current: Option<String> = None;
    let mut last_key: Option<String> = None;
    // blank lines seen since the last value line; they only become part of
    // the value if another continuation line follows
    let mut pending_blank = 0usize;

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            if last_key.is_some() {
                pending_blank += 1;
            }
            continue;
        }
        if trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        // continuation of the previous value
        if raw.starts_with(char::is_whitespace) {
            if let (Some(section), Some(key)) = (current.as_deref(), last_key.as_deref()) {
                if let Some(value) = sections.get_mut(section).and_then(|s| s.get_mut(key)) {
                    for _ in 0..=pending_blank {
                        value.push('\n');
                    }
                    value.push_str(trimmed);
                    pending_blank = 0;
                    continue;
                }
            }
        }
        pending_blank = 0;

        if let Some(name) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let name = name.trim();
            if sections.contains_key(name) {
                return Err(syntax(line, format!("duplicate section '{}'", name)));
            }
            sections.insert(name.to_string(), Section::new());
            current = Some(name.to_string());
            last_key = None;
            continue;
        }

        let section = current
            .as_deref()
            .ok_or_else(|| syntax(line, format!("option outside of any section: {}", trimmed)))?;
        let (key, value) = split_option(trimmed)
            .ok_or_else(|| syntax(line, format!("expected 'key = value', got: {}", trimmed)))?;
        if key.is_empty() {
            return Err(syntax(line, format!("empty option name: {}", trimmed)));
        }

        let entries = sections.entry(section.to_string()).or_default();
        if entries.contains_key(&key) {
            return Err(syntax(line, format!("duplicate option '{}' in section '{}'", key, section)));
        }
        entries.insert(key.clone(), value);
        last_key = Some(key);
    }

    sections.shift_remove(DEFAULT_SECTION);
    Ok(sections)
}

/// Split on the first `=` or `:`; the name is lower-cased and both sides
/// trimmed.
fn split_option(line: &str) -> Option<(String, String)> {
    let at = line.find(|c| c == '=' || c == ':')?;
    let key = line[..at].trim().to_lowercase();
    let value = line[at + 1..].trim().to_string();
    Some((key, value))
}

fn syntax(line: usize, message: String) -> ConfigError {
    ConfigError::Syntax { line, message }
}

/// Write sections in file form, one blank line after each section.
pub fn write<W: Write>(sections: &IndexMap<String, Section>, out: &mut W) -> io::Result<()> {
    for (name, entries) in sections {
        writeln!(out, "[{}]", name)?;
        for (key, value) in entries {
            writeln!(out, "{} = {}", key, value.replace('\n', "\n\t"))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Compact listing without blank lines between sections.
pub fn render(sections: &IndexMap<String, Section>) -> String {
    let mut lines = Vec::new();
    for (name, entries) in sections {
        lines.push(format!("[{}]", name));
        for (key, value) in entries {
            lines.push(format!("{} = {}", key, value));
        }
    }
    lines.join("\n")
}
