use thiserror::Error;

/// Errors raised when the configuration file is badly formed
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
	#[error("Config file badly formed! Section {0} is missing.")]
	MissingSection(String),
	#[error("The {0} section of the configuration file is badly formed!")]
	MalformedSection(String),
	#[error("Config file badly formed! Failed to get attribute '{key}' from section '{section}'!")]
	MissingOption { section: String, key: String },
	#[error("Invalid value for '{key}' in section '{section}': {value}")]
	InvalidValue { section: String, key: String, value: String },
	#[error("Syntax error on line {line}: {message}")]
	Syntax { line: usize, message: String },
}
