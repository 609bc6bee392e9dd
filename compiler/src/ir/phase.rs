//! Resolution phases

use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Resolution stage of a declaration; declarations only ever move forward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum ResolvePhase {
    Raw = 0,
    Imports,
    CompilerRequiredAnnotations,
    CompanionGeneration,
    SuperTypes,
    Types,
    Status,
    ImplicitTypesBodyResolve,
    AnnotationArguments,
    BodyResolve,
}

impl ResolvePhase {
    pub const ALL: [ResolvePhase; 10] = [
        ResolvePhase::Raw,
        ResolvePhase::Imports,
        ResolvePhase::CompilerRequiredAnnotations,
        ResolvePhase::CompanionGeneration,
        ResolvePhase::SuperTypes,
        ResolvePhase::Types,
        ResolvePhase::Status,
        ResolvePhase::ImplicitTypesBodyResolve,
        ResolvePhase::AnnotationArguments,
        ResolvePhase::BodyResolve,
    ];

    pub const LAST: ResolvePhase = ResolvePhase::BodyResolve;

    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }

    pub fn next(self) -> Option<Self> {
        Self::from_u8(self as u8 + 1)
    }

    pub fn previous(self) -> Option<Self> {
        (self as u8).checked_sub(1).and_then(Self::from_u8)
    }

    /// Phases strictly after `self` up to and including `target`
    pub fn steps_to(self, target: ResolvePhase) -> impl Iterator<Item = ResolvePhase> {
        Self::ALL
            .into_iter()
            .filter(move |phase| *phase > self && *phase <= target)
    }

    pub fn name(self) -> &'static str {
        match self {
            ResolvePhase::Raw => "RAW_FIR",
            ResolvePhase::Imports => "IMPORTS",
            ResolvePhase::CompilerRequiredAnnotations => "COMPILER_REQUIRED_ANNOTATIONS",
            ResolvePhase::CompanionGeneration => "COMPANION_GENERATION",
            ResolvePhase::SuperTypes => "SUPER_TYPES",
            ResolvePhase::Types => "TYPES",
            ResolvePhase::Status => "STATUS",
            ResolvePhase::ImplicitTypesBodyResolve => "IMPLICIT_TYPES_BODY_RESOLVE",
            ResolvePhase::AnnotationArguments => "ANNOTATIONS_ARGUMENTS_MAPPING",
            ResolvePhase::BodyResolve => "BODY_RESOLVE",
        }
    }
}

impl fmt::Display for ResolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Atomic phase marker that never moves backwards
#[derive(Debug)]
pub struct PhaseCell(AtomicU8);

impl PhaseCell {
    pub fn new(phase: ResolvePhase) -> Self {
        Self(AtomicU8::new(phase as u8))
    }

    pub fn get(&self) -> ResolvePhase {
        ResolvePhase::from_u8(self.0.load(Ordering::Acquire)).unwrap_or(ResolvePhase::Raw)
    }

    /// Move to `phase` unless already past it; returns the phase before the call
    pub fn advance_to(&self, phase: ResolvePhase) -> ResolvePhase {
        let previous = self.0.fetch_max(phase as u8, Ordering::AcqRel);
        ResolvePhase::from_u8(previous).unwrap_or(ResolvePhase::Raw)
    }

    pub fn is_at_least(&self, phase: ResolvePhase) -> bool {
        self.get() >= phase
    }
}
