//! Lazy Resolve Contract
//!
//! A lazy resolve request for phase `A` may only be issued while the current
//! thread is resolving to a phase `B` with `A < B`. Anything else means a
//! lower phase would depend on a higher one.
//!
//! The current phase is one thread-local slot. Every transformation step sets
//! it to the phase the step produces and restores the previous value after.
//! While a thread is resolving compiler-required annotations, nested requests
//! are ignored altogether: annotation bootstrapping asks for itself.

use crate::error::{ResolveError, ResolveResult};
use crate::ir::ResolvePhase;
use log::{trace, warn};
use std::cell::Cell;

thread_local! {
    static CURRENT_PHASE: Cell<Option<ResolvePhase>> = const { Cell::new(None) };
}

/// Phase the current thread is resolving to, if any
pub fn current_phase() -> Option<ResolvePhase> {
    CURRENT_PHASE.with(Cell::get)
}

/// Restores the previous slot value on drop, including on early returns
struct PhaseGuard {
    previous: Option<ResolvePhase>,
}

impl PhaseGuard {
    fn enter(phase: ResolvePhase) -> Self {
        let previous = CURRENT_PHASE.with(|slot| slot.replace(Some(phase)));
        Self { previous }
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        CURRENT_PHASE.with(|slot| slot.set(self.previous));
    }
}

/// Run one transformation step with the current phase set to `phase`
pub fn run_at_phase<R>(phase: ResolvePhase, step: impl FnOnce() -> R) -> R {
    let _guard = PhaseGuard::enter(phase);
    step()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ContractChecker {
    suppress_violations: bool,
}

impl ContractChecker {
    pub fn new(suppress_violations: bool) -> Self {
        Self {
            suppress_violations,
        }
    }

    /// Run `resolve` as a lazy resolve request for `phase`
    pub fn lazy_resolve_to_phase_inside(
        &self,
        phase: ResolvePhase,
        resolve: impl FnOnce() -> ResolveResult<()>,
    ) -> ResolveResult<()> {
        if !self.admit(phase)? {
            return Ok(());
        }
        run_at_phase(phase, resolve)
    }

    /// Check a request for `phase` against the current thread's phase.
    ///
    /// `Ok(false)` means the request must be skipped: the thread is
    /// bootstrapping compiler-required annotations.
    pub fn admit(&self, phase: ResolvePhase) -> ResolveResult<bool> {
        if current_phase() == Some(ResolvePhase::CompilerRequiredAnnotations) {
            trace!("Ignoring request for {} during annotation bootstrap", phase);
            return Ok(false);
        }
        self.check(phase)?;
        Ok(true)
    }

    fn check(&self, requested: ResolvePhase) -> ResolveResult<()> {
        let Some(current) = current_phase() else {
            return Ok(());
        };
        if requested < current {
            return Ok(());
        }
        let violation = ResolveError::ContractViolation { requested, current };
        if self.suppress_violations {
            warn!("{}", violation);
            Ok(())
        } else {
            Err(violation)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nested(
        checker: ContractChecker,
        outer: ResolvePhase,
        inner: ResolvePhase,
    ) -> ResolveResult<bool> {
        let mut ran = false;
        checker.lazy_resolve_to_phase_inside(outer, || {
            checker.lazy_resolve_to_phase_inside(inner, || {
                ran = true;
                Ok(())
            })
        })?;
        Ok(ran)
    }

    #[test]
    fn test_lower_phase_is_allowed() {
        let checker = ContractChecker::new(false);
        assert_eq!(nested(checker, ResolvePhase::BodyResolve, ResolvePhase::Types), Ok(true));
        assert_eq!(current_phase(), None);
    }

    #[test]
    fn test_same_or_higher_phase_is_a_violation() {
        let checker = ContractChecker::new(false);
        for outer in ResolvePhase::ALL {
            if outer == ResolvePhase::CompilerRequiredAnnotations {
                continue;
            }
            for inner in ResolvePhase::ALL.into_iter().filter(|inner| *inner >= outer) {
                assert_eq!(
                    nested(checker, outer, inner),
                    Err(ResolveError::ContractViolation {
                        requested: inner,
                        current: outer
                    })
                );
                assert_eq!(current_phase(), None);
            }
        }
    }

    #[test]
    fn test_suppressed_violation_proceeds() {
        let checker = ContractChecker::new(true);
        assert_eq!(nested(checker, ResolvePhase::Types, ResolvePhase::Types), Ok(true));
    }

    #[test]
    fn test_bootstrap_phase_ignores_nested_requests() {
        let checker = ContractChecker::new(false);
        assert_eq!(
            nested(checker, ResolvePhase::CompilerRequiredAnnotations, ResolvePhase::BodyResolve),
            Ok(false)
        );
    }

    #[test]
    fn test_phase_slot_is_per_thread() {
        let checker = ContractChecker::new(false);
        checker
            .lazy_resolve_to_phase_inside(ResolvePhase::Types, || {
                let other = std::thread::spawn(move || {
                    nested(checker, ResolvePhase::BodyResolve, ResolvePhase::Status)
                });
                assert_eq!(other.join().unwrap(), Ok(true));
                assert_eq!(current_phase(), Some(ResolvePhase::Types));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_step_phase_is_restored() {
        let checker = ContractChecker::new(false);
        checker
            .lazy_resolve_to_phase_inside(ResolvePhase::BodyResolve, || {
                run_at_phase(ResolvePhase::SuperTypes, || {
                    assert_eq!(current_phase(), Some(ResolvePhase::SuperTypes));
                    assert_eq!(
                        checker.admit(ResolvePhase::Status),
                        Err(ResolveError::ContractViolation {
                            requested: ResolvePhase::Status,
                            current: ResolvePhase::SuperTypes
                        })
                    );
                });
                assert_eq!(current_phase(), Some(ResolvePhase::BodyResolve));
                Ok(())
            })
            .unwrap();
        assert_eq!(current_phase(), None);
    }
}
