//! Resolution Errors
//!
//! Errors raised by the resolution engine. Lookup misses are never errors:
//! providers answer them with `None` or an empty list. What ends up here is
//! either a programmer error inside the engine (see [`ResolveError::is_internal`])
//! or a problem with the project description handed to it.

use crate::ids::{DeclarationId, FileId, ModuleId};
use crate::ir::ResolvePhase;
use crate::names::{ClassId, Name};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A lazy resolve request for `requested` was issued while the current thread
    /// was already resolving to `current`, with `requested >= current`
    ContractViolation {
        requested: ResolvePhase,
        current: ResolvePhase,
    },

    /// No designation path leads from the file to the declaration
    DesignationNotFound {
        declaration: DeclarationId,
        file: Option<FileId>,
    },

    /// A designated transformer finished without reaching its target
    DesignationNotVisited {
        target: String,
        phase: ResolvePhase,
    },

    /// A declaration is below the phase a transformer was supposed to reach
    PhaseNotReached {
        declaration: String,
        expected: ResolvePhase,
        actual: ResolvePhase,
    },

    /// Two generation extensions produced a nested class with the same name
    ConflictingGeneratedNestedClass {
        owner: ClassId,
        name: Name,
        declarations: Vec<String>,
    },

    /// An extension produced something that isn't allowed where it was requested
    InvalidGeneratedDeclaration {
        extension: String,
        message: String,
    },

    /// The same module was handed to a combined provider twice
    DuplicateModuleProvider { module: ModuleId },

    /// The module dependency graph has a cycle (names listed in cycle order)
    CyclicModuleDependencies { cycle: Vec<String> },

    UnknownModule { module: String },

    UnknownFile { file: FileId },

    /// The project manifest could not be read
    Manifest { message: String },

    /// A code fragment must consist of exactly one dangling expression or block
    InvalidCodeFragment { file: FileId, message: String },

    /// Failure reported by a pluggable phase resolver
    Resolution {
        phase: ResolvePhase,
        message: String,
    },

    /// The engine owning a session was dropped while the session was rebuilt
    SessionUnavailable { module: ModuleId },
}

impl ResolveError {
    /// Whether this error signals a bug in the engine or one of its plugins
    /// rather than a problem with user input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            ResolveError::ContractViolation { .. }
                | ResolveError::DesignationNotFound { .. }
                | ResolveError::DesignationNotVisited { .. }
                | ResolveError::PhaseNotReached { .. }
                | ResolveError::ConflictingGeneratedNestedClass { .. }
                | ResolveError::InvalidGeneratedDeclaration { .. }
                | ResolveError::DuplicateModuleProvider { .. }
                | ResolveError::SessionUnavailable { .. }
        )
    }

    pub fn resolution(phase: ResolvePhase, message: impl Into<String>) -> Self {
        ResolveError::Resolution {
            phase,
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::ContractViolation { requested, current } => write!(
                f,
                "Lazy resolve contract violation: cannot resolve to {} while resolving to {}",
                requested, current
            ),
            ResolveError::DesignationNotFound { declaration, file } => match file {
                Some(file) => write!(f, "No designation for {} in {}", declaration, file),
                None => write!(f, "No designation for {}", declaration),
            },
            ResolveError::DesignationNotVisited { target, phase } => write!(
                f,
                "Designation was not visited by the {} transformer: {}",
                phase, target
            ),
            ResolveError::PhaseNotReached {
                declaration,
                expected,
                actual,
            } => write!(
                f,
                "Expected {} to be resolved to {}, but it is at {}",
                declaration, expected, actual
            ),
            ResolveError::ConflictingGeneratedNestedClass {
                owner,
                name,
                declarations,
            } => {
                write!(
                    f,
                    "Multiple plugins generated nested class with same name {} for class {}:",
                    name, owner
                )?;
                for declaration in declarations {
                    write!(f, "\n{}", declaration)?;
                }
                Ok(())
            }
            ResolveError::InvalidGeneratedDeclaration { extension, message } => {
                write!(f, "Extension '{}' generated an invalid declaration: {}", extension, message)
            }
            ResolveError::DuplicateModuleProvider { module } => {
                write!(f, "More than one symbol provider registered for {}", module)
            }
            ResolveError::CyclicModuleDependencies { cycle } => {
                write!(f, "Cyclic module dependencies: {}", cycle.join(" -> "))
            }
            ResolveError::UnknownModule { module } => write!(f, "Unknown module '{}'", module),
            ResolveError::UnknownFile { file } => write!(f, "Unknown file {}", file),
            ResolveError::Manifest { message } => {
                write!(f, "Invalid project manifest: {}", message)
            }
            ResolveError::InvalidCodeFragment { file, message } => {
                write!(f, "Invalid code fragment {}: {}", file, message)
            }
            ResolveError::Resolution { phase, message } => {
                write!(f, "Resolution failed at {}: {}", phase, message)
            }
            ResolveError::SessionUnavailable { module } => {
                write!(f, "Session for {} is no longer available", module)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        let violation = ResolveError::ContractViolation {
            requested: ResolvePhase::BodyResolve,
            current: ResolvePhase::Types,
        };
        assert!(violation.is_internal());
        assert!(!ResolveError::UnknownModule {
            module: "app".to_string()
        }
        .is_internal());
        assert!(!ResolveError::Manifest {
            message: "bad".to_string()
        }
        .is_internal());
    }

    #[test]
    fn test_nested_class_collision_lists_declarations() {
        let error = ResolveError::ConflictingGeneratedNestedClass {
            owner: ClassId::from_string("app/Host"),
            name: Name::identifier("Nested"),
            declarations: vec![
                "class app/Host.Nested [first]".into(),
                "class app/Host.Nested [second]".into(),
            ],
        };
        let message = error.to_string();
        assert!(message.starts_with(
            "Multiple plugins generated nested class with same name Nested for class app/Host:"
        ));
        assert!(message.contains("[first]"));
        assert!(message.contains("[second]"));
    }
}
