//! Lazy Declaration Resolver
//!
//! Entry point for "make sure this declaration is at least at phase P". The
//! resolver finds the declaration's designation in its session's file IR,
//! brings the file header (imports, file annotations) up to date and then runs
//! one designated transformer per missing phase, in phase order.
//!
//! Requests are admitted by the [`ContractChecker`] against the phase of the
//! step that issues them; [`Self::ensure_resolved`] is the one exception, used
//! when implicit type inference jumps from one declaration to another.
//!
//! Implicit type inference may lock several declarations in a row, so that
//! phase is additionally serialized by one resolver-wide lock.

use super::contract::{run_at_phase, ContractChecker};
use super::phase_resolver::{PhaseResolver, ReferenceResolver};
use super::transformers::DesignatedTransformer;
use crate::config::ResolveConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::ir::{Declaration, Designation, IrFile, ResolvePhase};
use crate::session::{ModuleSession, ResolutionEngine};
use log::debug;
use parking_lot::ReentrantMutex;
use rayon::prelude::*;
use std::sync::Arc;

pub struct LazyDeclarationResolver {
    contract: ContractChecker,
    phase_resolver: Arc<dyn PhaseResolver>,
    resolve_locals: bool,
    parallel: bool,
    implicit_types_lock: ReentrantMutex<()>,
}

impl LazyDeclarationResolver {
    pub fn new(config: &ResolveConfig) -> Self {
        Self {
            contract: ContractChecker::new(config.suppress_contract_violations),
            phase_resolver: Arc::new(ReferenceResolver::new()),
            resolve_locals: config.resolve_local_declarations,
            parallel: config.parallel_file_resolution,
            implicit_types_lock: ReentrantMutex::new(()),
        }
    }

    pub fn with_phase_resolver(mut self, phase_resolver: Arc<dyn PhaseResolver>) -> Self {
        self.phase_resolver = phase_resolver;
        self
    }

    pub fn phase_resolver(&self) -> &Arc<dyn PhaseResolver> {
        &self.phase_resolver
    }

    pub fn contract(&self) -> ContractChecker {
        self.contract
    }

    /// Resolve `declaration` to at least `phase`
    pub fn lazy_resolve(
        &self,
        engine: &ResolutionEngine,
        declaration: &Arc<Declaration>,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        if declaration.phase() >= phase || !self.contract.admit(phase)? {
            return Ok(());
        }
        self.resolve_steps(engine, declaration, phase)
    }

    /// Same as [`Self::lazy_resolve`] without the contract check
    pub fn ensure_resolved(
        &self,
        engine: &ResolutionEngine,
        declaration: &Arc<Declaration>,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        if declaration.phase() >= phase {
            return Ok(());
        }
        self.resolve_steps(engine, declaration, phase)
    }

    fn resolve_steps(
        &self,
        engine: &ResolutionEngine,
        declaration: &Arc<Declaration>,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        let file = declaration.file.ok_or(ResolveError::DesignationNotFound {
            declaration: declaration.id,
            file: None,
        })?;
        let session = engine.session_for(declaration.module)?;
        let file = session.file_ir(file)?;
        let designation = Designation::find(&file, declaration.id)?;
        self.resolve_designation(engine, &session, &designation, phase)
    }

    /// Run every phase from the target's current one up to `phase`, each
    /// step at its own phase
    pub fn resolve_designation(
        &self,
        engine: &ResolutionEngine,
        session: &ModuleSession,
        designation: &Designation,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        let header_phase = phase.min(ResolvePhase::CompilerRequiredAnnotations);
        self.resolve_file_header(session, &designation.file, header_phase)?;
        for step in designation.target.phase().steps_to(phase) {
            let _serialized = (step == ResolvePhase::ImplicitTypesBodyResolve)
                .then(|| self.implicit_types_lock.lock());
            let transformer = DesignatedTransformer::new(
                designation,
                step,
                self.phase_resolver.as_ref(),
                self.resolve_locals,
            );
            run_at_phase(step, || transformer.transform(engine, session))?;
        }
        Ok(())
    }

    fn resolve_file_header(
        &self,
        session: &ModuleSession,
        file: &IrFile,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        if file.phase() >= phase {
            return Ok(());
        }
        let _lock = file.lock();
        for step in file.phase().steps_to(phase) {
            run_at_phase(step, || self.phase_resolver.resolve_file(step, session, file))?;
            file.advance_phase(step);
        }
        Ok(())
    }

    /// Resolve every declaration of `file`, members included, to `phase`
    ///
    /// Each declaration is its own lazy resolve request; with parallel file
    /// resolution enabled the requests run on the rayon pool.
    pub fn resolve_file_to_phase(
        &self,
        engine: &ResolutionEngine,
        session: &ModuleSession,
        file: &Arc<IrFile>,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        if file.phase() >= phase || !self.contract.admit(phase)? {
            return Ok(());
        }
        let header_phase = phase.min(ResolvePhase::CompilerRequiredAnnotations);
        self.resolve_file_header(session, file, header_phase)?;

        let designations = collect_designations(file);
        debug!(
            "Resolving {} declarations of {} to {}{}",
            designations.len(),
            file.name,
            phase,
            if self.parallel { " in parallel" } else { "" }
        );
        let resolve = |designation: &Designation| {
            if designation.target.phase() >= phase {
                return Ok(());
            }
            self.resolve_designation(engine, session, designation, phase)
        };
        if self.parallel {
            designations.par_iter().try_for_each(resolve)?;
        } else {
            designations.iter().try_for_each(resolve)?;
        }
        file.advance_phase(phase);
        Ok(())
    }
}

/// Designations of every declaration in `file`, parents before members
pub fn collect_designations(file: &Arc<IrFile>) -> Vec<Designation> {
    fn visit(
        file: &Arc<IrFile>,
        path: &mut Vec<Arc<Declaration>>,
        declaration: &Arc<Declaration>,
        out: &mut Vec<Designation>,
    ) {
        out.push(Designation::new(file.clone(), path.iter().cloned(), declaration.clone()));
        path.push(declaration.clone());
        for member in &declaration.members {
            visit(file, path, member, out);
        }
        path.pop();
    }

    let mut out = Vec::new();
    let mut path = Vec::new();
    for declaration in &file.declarations {
        visit(file, &mut path, declaration, &mut out);
    }
    out
}
