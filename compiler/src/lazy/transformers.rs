//! Designated Lazy Transformers
//!
//! One transformer runs one phase along one designation: the enclosing
//! declarations on the path first, then the target. Siblings of the path are
//! never touched. Each declaration is resolved under its own lock with the
//! phase checked before and after taking it, so concurrent transformers
//! resolve a declaration at most once per phase.

use super::phase_resolver::{PhaseResolver, ResolveContext};
use crate::error::{ResolveError, ResolveResult};
use crate::ir::{Declaration, Designation, ResolvePhase};
use crate::session::{ModuleSession, ResolutionEngine};
use log::trace;
use std::sync::Arc;

pub struct DesignatedTransformer<'r> {
    designation: &'r Designation,
    phase: ResolvePhase,
    resolver: &'r dyn PhaseResolver,
    resolve_locals: bool,
}

impl<'r> DesignatedTransformer<'r> {
    pub fn new(
        designation: &'r Designation,
        phase: ResolvePhase,
        resolver: &'r dyn PhaseResolver,
        resolve_locals: bool,
    ) -> Self {
        Self {
            designation,
            phase,
            resolver,
            resolve_locals,
        }
    }

    pub fn transform(
        &self,
        engine: &ResolutionEngine,
        session: &ModuleSession,
    ) -> ResolveResult<()> {
        let designation = self.designation;
        let target = &designation.target;
        trace!(
            "{} of {} in {}: start ({})",
            self.phase,
            target.qualified_name(),
            designation.file.name,
            self.resolver.name()
        );

        let mut visited = false;
        let mut children: &[Arc<Declaration>] = &designation.file.declarations;
        let steps = designation.path.iter().chain(std::iter::once(target));
        for (depth, step) in steps.enumerate() {
            let Some(declaration) = children.iter().find(|child| Arc::ptr_eq(child, step)) else {
                break;
            };
            let context = ResolveContext {
                engine,
                session,
                file: &designation.file,
                containers: &designation.path[..depth],
                declaration,
            };
            let is_target = depth == designation.path.len();
            self.resolve_one(&context, is_target)?;
            visited = is_target;
            children = &declaration.members;
        }

        if !visited {
            return Err(ResolveError::DesignationNotVisited {
                target: target.qualified_name(),
                phase: self.phase,
            });
        }
        check_is_resolved(target, self.phase, self.resolve_locals)?;
        trace!("{} of {}: done", self.phase, target.qualified_name());
        Ok(())
    }

    fn resolve_one(&self, context: &ResolveContext<'_>, is_target: bool) -> ResolveResult<()> {
        let declaration = context.declaration;
        if declaration.phase() >= self.phase {
            return Ok(());
        }
        let _lock = declaration.lock();
        if declaration.phase() >= self.phase {
            return Ok(());
        }
        self.resolver.resolve_declaration(self.phase, context)?;
        if is_target {
            update_declaration_internals_phase(declaration, self.phase, self.resolve_locals);
        } else {
            declaration.advance_phase(self.phase);
        }
        Ok(())
    }
}

/// Advance `declaration` together with its parameters and, when
/// `resolve_locals` is set, the local declarations of its body
///
/// The internals move first: a reader that sees the declaration at `phase`
/// also sees its internals there.
pub fn update_declaration_internals_phase(
    declaration: &Declaration,
    phase: ResolvePhase,
    resolve_locals: bool,
) {
    for parameter in &declaration.parameters {
        parameter.advance_phase(phase);
    }
    if resolve_locals {
        if let Some(body) = &declaration.body {
            for local in body.local_declarations() {
                update_declaration_internals_phase(&local, phase, false);
            }
        }
    }
    declaration.advance_phase(phase);
}

fn check_is_resolved(
    declaration: &Declaration,
    phase: ResolvePhase,
    with_locals: bool,
) -> ResolveResult<()> {
    let not_reached = |name: String, actual: ResolvePhase| ResolveError::PhaseNotReached {
        declaration: name,
        expected: phase,
        actual,
    };
    if declaration.phase() < phase {
        return Err(not_reached(declaration.qualified_name(), declaration.phase()));
    }
    for parameter in &declaration.parameters {
        if parameter.phase() < phase {
            return Err(not_reached(
                format!("{}({})", declaration.qualified_name(), parameter.name),
                parameter.phase(),
            ));
        }
    }
    if with_locals {
        if let Some(body) = &declaration.body {
            let locals = body.local_declarations();
            if let Some(local) = locals.iter().find(|local| local.phase() < phase) {
                return Err(not_reached(
                    format!("local {} in {}", local.name, declaration.qualified_name()),
                    local.phase(),
                ));
            }
        }
    }
    Ok(())
}
