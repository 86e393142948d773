//! Compile-time grammar errors.

use std::fmt;

use thiserror::Error;

/// Category of a fatal grammar defect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrammarErrorKind {
    /// A rule body references a name with no definition.
    UndefinedRule,
    /// The same rule name was defined twice.
    DuplicateRule,
    /// Typestate inference reached a contradiction.
    TypestateMismatch,
}

impl fmt::Display for GrammarErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GrammarErrorKind::UndefinedRule => "undefined rule",
            GrammarErrorKind::DuplicateRule => "duplicate rule",
            GrammarErrorKind::TypestateMismatch => "typestate mismatch",
        };
        f.write_str(s)
    }
}

/// A fatal defect found while assembling or analyzing a grammar.
///
/// Naming-convention findings are not errors; they surface as notices in
/// the compile report.
#[derive(Debug, Clone, Error)]
#[error("{kind} in rule `{rule}`: {message}")]
pub struct GrammarError {
    pub kind: GrammarErrorKind,
    pub rule: String,
    pub message: String,
}

impl GrammarError {
    pub fn undefined(name: &str) -> Self {
        Self {
            kind: GrammarErrorKind::UndefinedRule,
            rule: name.to_owned(),
            message: "no definition for this name".to_owned(),
        }
    }

    pub fn duplicate(name: &str) -> Self {
        Self {
            kind: GrammarErrorKind::DuplicateRule,
            rule: name.to_owned(),
            message: "rule is already defined".to_owned(),
        }
    }

    pub fn typestate(rule: &str, message: impl Into<String>) -> Self {
        Self {
            kind: GrammarErrorKind::TypestateMismatch,
            rule: rule.to_owned(),
            message: message.into(),
        }
    }
}
