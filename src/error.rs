use colored::Colorize;
use std::fmt;

/// Errors raised while declaring, resolving or serializing variables
#[derive(Debug, Clone, PartialEq)]
pub enum EnvError {
    /// A variable sets `include_if` and `exclude_if` to the same reference
    ConflictingCondition { name: String, reference: String },
    /// A variable name does not match `[A-Z0-9_]+`
    InvalidName { name: String },
    /// A variable name was assigned twice
    NameAlreadySet { name: String, attempted: String },
    /// Two declarations share the same name
    Duplicate { name: String },
    /// Following include/exclude references from this variable loops back onto itself
    ConditionCycle { name: String },
    /// An include/exclude gate names a variable that is not declared or not visible
    UndeclaredReference { name: String },
    /// An environment-style name is not declared
    NotDeclared { name: String },
    /// The variable is hidden because its exclude condition holds
    Excluded { name: String },
    /// The variable is hidden because its include condition does not hold
    NotIncluded { name: String },
    /// Attribute-style lookup of an unknown name
    NoAttribute { name: String },
    /// Index-style lookup of an unknown name
    Key { name: String },
    /// A cast or processor rejected the raw value
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
    /// An input document could not be parsed
    Parse {
        line: Option<usize>,
        message: String,
    },
    /// Reading or writing a document failed
    Io { message: String },
}

impl EnvError {
    /// Declaration and visibility problems, the family `get()` and `contains()` swallow
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EnvError::ConflictingCondition { .. }
                | EnvError::InvalidName { .. }
                | EnvError::NameAlreadySet { .. }
                | EnvError::Duplicate { .. }
                | EnvError::ConditionCycle { .. }
                | EnvError::UndeclaredReference { .. }
                | EnvError::NotDeclared { .. }
                | EnvError::Excluded { .. }
                | EnvError::NotIncluded { .. }
        )
    }

    /// Lookup misses raised by index-style or attribute-style access
    pub fn is_not_found(&self) -> bool {
        matches!(self, EnvError::Key { .. } | EnvError::NoAttribute { .. })
    }
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvError::ConflictingCondition { name, reference } => write!(
                f,
                "{}: Cannot set both exclude_if and include_if to the same name ({})",
                name.magenta().bold(),
                reference.cyan()
            ),
            EnvError::InvalidName { name } => write!(
                f,
                "{}: Variable name must be uppercase ([A-Z0-9_]+)",
                name.magenta().bold()
            ),
            EnvError::NameAlreadySet { name, attempted } => write!(
                f,
                "{}: Variable name is immutable once set, cannot rename to {}",
                name.magenta().bold(),
                attempted.cyan()
            ),
            EnvError::Duplicate { name } => {
                write!(f, "Variable {} is declared more than once", name.magenta().bold())
            }
            EnvError::ConditionCycle { name } => write!(
                f,
                "Variable {} has include/exclude conditions that depend on itself",
                name.magenta().bold()
            ),
            EnvError::UndeclaredReference { name } => write!(
                f,
                "Variable {} is referenced but not declared",
                name.magenta().bold()
            ),
            EnvError::NotDeclared { name } => write!(
                f,
                "Variable {} is not declared in this configuration",
                name.magenta().bold()
            ),
            EnvError::Excluded { name } => write!(
                f,
                "Variable {} is explicitly excluded from this configuration",
                name.magenta().bold()
            ),
            EnvError::NotIncluded { name } => write!(
                f,
                "Conditions to include variable {} are not met",
                name.magenta().bold()
            ),
            EnvError::NoAttribute { name } => write!(
                f,
                "Wrapper has no variable or bundle named '{}'",
                name.magenta().bold()
            ),
            EnvError::Key { name } => write!(f, "Key '{}' not found", name.magenta().bold()),
            EnvError::InvalidValue { key, value, reason } => write!(
                f,
                "{}: Invalid value {}: {}",
                key.magenta().bold(),
                format!("'{}'", value).red(),
                reason
            ),
            EnvError::Parse { line, message } => match line {
                Some(line) => write!(f, "Parse error on line {}: {}", line, message),
                None => write!(f, "Parse error: {}", message),
            },
            EnvError::Io { message } => write!(f, "I/O error: {}", message),
        }
    }
}

impl std::error::Error for EnvError {}

/// One line per error under a colored count, as printed by `util-cli check`
pub fn format_errors(errors: &[EnvError]) -> String {
    let error_summary = errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Environment check failed with {} error(s):\n{}",
        errors.len().to_string().yellow().bold(),
        error_summary
    )
}

impl From<std::io::Error> for EnvError {
    fn from(err: std::io::Error) -> Self {
        EnvError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for EnvError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            EnvError::Io {
                message: err.to_string(),
            }
        } else {
            EnvError::Parse {
                line: Some(err.line()),
                message: err.to_string(),
            }
        }
    }
}
