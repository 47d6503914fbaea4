//! # pdfebc configuration
//!
//! The configuration lives in `config.cnf` inside the per-user config
//! directory (see [`paths`]) and has exactly two sections:
//!
//! ```text
//! [EMAIL]
//! user = <sender_email>
//! pass = <password>
//! receiver = <receiver_email>
//! smtp_server = <smtp_server>
//! smtp_port = <smtp_port>
//!
//! [DEFAULTS]
//! gs_binary = <ghostscript_binary>
//! src = <source_dir>
//! out = <out_dir>
//! ```
//!
//! A [`Configuration`] is read fresh whenever it is needed and is not
//! mutated once validated.

pub mod ini;
pub mod paths;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use crate::errors::{ConfigError, PdfebcError, Result};
use self::paths::ConfigPathProvider;

pub const EMAIL_SECTION: &str = "EMAIL";
pub const USER_KEY: &str = "user";
pub const PASSWORD_KEY: &str = "pass";
pub const RECEIVER_KEY: &str = "receiver";
pub const SMTP_SERVER_KEY: &str = "smtp_server";
pub const SMTP_PORT_KEY: &str = "smtp_port";
pub const EMAIL_SECTION_KEYS: [&str; 5] = [USER_KEY, PASSWORD_KEY, RECEIVER_KEY, SMTP_SERVER_KEY, SMTP_PORT_KEY];

pub const DEFAULTS_SECTION: &str = "DEFAULTS";
pub const GS_BINARY_KEY: &str = "gs_binary";
pub const SRC_DIR_KEY: &str = "src";
pub const OUT_DIR_KEY: &str = "out";
pub const DEFAULTS_SECTION_KEYS: [&str; 3] = [GS_BINARY_KEY, SRC_DIR_KEY, OUT_DIR_KEY];

/// Required sections and the exact option set each must hold
pub const REQUIRED_SECTIONS: [(&str, &[&str]); 2] = [
    (EMAIL_SECTION, &EMAIL_SECTION_KEYS),
    (DEFAULTS_SECTION, &DEFAULTS_SECTION_KEYS),
];

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_GS_BINARY: &str = "gs";

/// Option name -> value, in insertion order
pub type Section = IndexMap<String, String>;

/// Two-level mapping of section name -> options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    sections: IndexMap<String, Section>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair each section name with its contents.
    ///
    /// Option names are lower-cased, the same way [`Configuration::load`]
    /// reads them back.
    ///
    /// ```rust
    /// use pdfebc::config::{Configuration, Section};
    ///
    /// let mut email = Section::new();
    /// email.insert("user".to_string(), "me@example.com".to_string());
    /// let config = Configuration::build(&["EMAIL"], vec![email])?;
    /// assert_eq!(config.get("EMAIL", "user"), Some("me@example.com"));
    /// # Ok::<(), pdfebc::errors::PdfebcError>(())
    /// ```
    pub fn build<S: AsRef<str>>(section_names: &[S], section_contents: Vec<Section>) -> Result<Self> {
        if section_names.len() != section_contents.len() {
            return Err(PdfebcError::InvalidInput(format!(
                "Mismatch between argument lengths.\nlen(sections) = {}\nlen(section_contents) = {}",
                section_names.len(),
                section_contents.len()
            )));
        }

        let mut config = Self::new();
        for (name, content) in section_names.iter().zip(section_contents) {
            let content = content
                .into_iter()
                .map(|(k, v)| (k.to_lowercase(), v))
                .collect();
            config.sections.insert(name.as_ref().to_string(), content);
        }
        Ok(config)
    }

    /// A complete configuration using the stock SMTP server and Ghostscript
    /// binary.
    pub fn email_template(user: &str, password: &str, receiver: &str, src: &Path, out: &Path) -> Self {
        let email: Section = [
            (USER_KEY, user.to_string()),
            (PASSWORD_KEY, password.to_string()),
            (RECEIVER_KEY, receiver.to_string()),
            (SMTP_SERVER_KEY, DEFAULT_SMTP_SERVER.to_string()),
            (SMTP_PORT_KEY, DEFAULT_SMTP_PORT.to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        let defaults: Section = [
            (GS_BINARY_KEY, DEFAULT_GS_BINARY.to_string()),
            (SRC_DIR_KEY, src.display().to_string()),
            (OUT_DIR_KEY, out.display().to_string()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let mut config = Self::new();
        config.sections.insert(EMAIL_SECTION.to_string(), email);
        config.sections.insert(DEFAULTS_SECTION.to_string(), defaults);
        config
    }

    /// Read a configuration file.
    ///
    /// Unknown sections and options are kept; the reserved `DEFAULT`
    /// section is dropped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PdfebcError::NotFound(format!(
                "No config file found at {}",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        let sections = ini::parse(&text)?;
        log::debug!("loaded {} sections from {}", sections.len(), path.display());
        Ok(Self { sections })
    }

    /// Load from the location given by `provider`.
    pub fn load_from(provider: &dyn ConfigPathProvider) -> Result<Self> {
        Self::load(provider.config_path()?)
    }

    /// Write the configuration to `path`, creating parent directories as
    /// needed.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut out = BufWriter::new(File::create(path)?);
        ini::write(&self.sections, &mut out)?;
        out.flush()?;
        log::debug!("wrote config to {}", path.display());
        Ok(())
    }

    /// Write to the location given by `provider` and return that path.
    pub fn persist_to(&self, provider: &dyn ConfigPathProvider) -> Result<PathBuf> {
        let path = provider.config_path()?;
        self.persist(&path)?;
        Ok(path)
    }

    /// Check that both required sections hold exactly the expected options.
    pub fn validate(&self) -> Result<()> {
        for (section, expected) in REQUIRED_SECTIONS {
            match self.section(section) {
                Some(content) if !content.is_empty() => {
                    if !section_is_healthy(content, expected) {
                        return Err(ConfigError::MalformedSection(section.to_string()).into());
                    }
                }
                _ => return Err(ConfigError::MissingSection(section.to_string()).into()),
            }
        }
        Ok(())
    }

    /// Look up an option that must be present.
    ///
    /// Only presence is checked: an option set to an empty string is
    /// returned as `""`.
    pub fn get_required(&self, section: &str, key: &str) -> Result<&str> {
        let content = self
            .section(section)
            .ok_or_else(|| ConfigError::MissingSection(section.to_string()))?;
        content
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| {
                ConfigError::MissingOption {
                    section: section.to_string(),
                    key: key.to_string(),
                }
                .into()
            })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key).map(String::as_str)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.get(name)
    }

    pub fn sections(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.sections.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Human readable `[section]` / `key = value` listing.
    pub fn render(&self) -> String {
        ini::render(&self.sections)
    }
}

impl fmt::Display for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn section_is_healthy(content: &Section, expected: &[&str]) -> bool {
    content.len() == expected.len() && expected.iter().all(|k| content.contains_key(*k))
}

/// Result of [`diagnose`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub config_path: PathBuf,
    /// Required sections that are absent or have no options at all
    pub missing_sections: BTreeSet<String>,
    /// Per section, the expected options that are absent or empty
    pub malformed_entries: BTreeMap<String, BTreeSet<String>>,
}

impl Diagnostics {
    pub fn is_healthy(&self) -> bool {
        self.missing_sections.is_empty() && self.malformed_entries.is_empty()
    }
}

/// Report missing sections and missing or empty options of the config at
/// `path`. Unexpected extra options are not reported.
pub fn diagnose<P: AsRef<Path>>(path: P) -> Result<Diagnostics> {
    let path = path.as_ref();
    let config = Configuration::load(path)?;

    let mut missing_sections = BTreeSet::new();
    let mut malformed_entries: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for (section, expected) in REQUIRED_SECTIONS {
        match config.section(section) {
            Some(content) if !content.is_empty() => {
                for option in expected {
                    let empty = content.get(*option).is_none_or(|v| v.is_empty());
                    if empty {
                        malformed_entries
                            .entry(section.to_string())
                            .or_default()
                            .insert(option.to_string());
                    }
                }
            }
            _ => {
                missing_sections.insert(section.to_string());
            }
        }
    }

    Ok(Diagnostics {
        config_path: path.to_path_buf(),
        missing_sections,
        malformed_entries,
    })
}

/// `true` if `path` is a readable, valid configuration file.
pub fn exists_and_valid<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if !path.is_file() {
        return false;
    }
    match Configuration::load(path).and_then(|c| c.validate()) {
        Ok(()) => true,
        Err(e) => {
            log::debug!("config at {} is not valid: {}", path.display(), e);
            false
        }
    }
}

/// Delivery settings taken from the EMAIL section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub user: String,
    pub password: String,
    pub receiver: String,
    pub smtp_server: String,
    pub smtp_port: u16,
}

impl EmailSettings {
    pub fn from_config(config: &Configuration) -> Result<Self> {
        let port = config.get_required(EMAIL_SECTION, SMTP_PORT_KEY)?;
        let smtp_port = port.trim().parse::<u16>().map_err(|_| ConfigError::InvalidValue {
            section: EMAIL_SECTION.to_string(),
            key: SMTP_PORT_KEY.to_string(),
            value: port.to_string(),
        })?;
        Ok(Self {
            user: config.get_required(EMAIL_SECTION, USER_KEY)?.to_string(),
            password: config.get_required(EMAIL_SECTION, PASSWORD_KEY)?.to_string(),
            receiver: config.get_required(EMAIL_SECTION, RECEIVER_KEY)?.to_string(),
            smtp_server: config.get_required(EMAIL_SECTION, SMTP_SERVER_KEY)?.to_string(),
            smtp_port,
        })
    }
}
