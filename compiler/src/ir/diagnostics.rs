//! Diagnostics attached to declarations during body resolution

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    UnresolvedReference,
    /// Non-visible top-level declaration
    InvisibleReference,
    /// Non-visible class member
    InvisibleMember,
}

impl DiagnosticKind {
    /// Name used by `@Suppress`
    pub fn id(self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedReference => "UNRESOLVED_REFERENCE",
            DiagnosticKind::InvisibleReference => "INVISIBLE_REFERENCE",
            DiagnosticKind::InvisibleMember => "INVISIBLE_MEMBER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IrDiagnostic {
    pub kind: DiagnosticKind,
    /// Reference text the diagnostic is reported on
    pub element: String,
    pub message: String,
}

impl IrDiagnostic {
    pub fn new(kind: DiagnosticKind, element: &str, message: impl Into<String>) -> Self {
        Self {
            kind,
            element: element.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for IrDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on '{}': {}", self.kind.id(), self.element, self.message)
    }
}
