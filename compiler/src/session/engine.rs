//! Resolution Engine
//!
//! Owns the project, the session cache and the lazy declaration resolver.
//! Everything else reaches sessions and lazy resolution through it.
//!
//! ```rust,ignore
//! let engine = Arc::new(ResolutionEngine::new(project));
//! let session = engine.resolve_session("app")?;
//! let main = SourceElement::declaration(file, &[0]);
//! let main = session.resolve_to_phase(&main, ResolvePhase::BodyResolve)?;
//! ```

use super::module_session::ModuleSession;
use super::resolve_session::ResolveSession;
use super::session_cache::SessionCache;
use crate::error::{ResolveError, ResolveResult};
use crate::ids::{FileId, ModuleId};
use crate::ir::{Declaration, ResolvePhase};
use crate::lazy::{LazyDeclarationResolver, PhaseResolver};
use crate::project::services::ProjectStructureProvider;
use crate::project::Project;
use crate::syntax::SourceFile;
use log::info;
use std::sync::Arc;

pub struct ResolutionEngine {
    project: Arc<Project>,
    sessions: Arc<SessionCache>,
    resolver: LazyDeclarationResolver,
}

impl ResolutionEngine {
    pub fn new(project: Project) -> Self {
        let project = Arc::new(project);
        info!(
            "Resolution engine over {} modules, {} source files",
            project.structure.modules().count(),
            project.sources.len()
        );
        Self {
            sessions: SessionCache::new(project.clone()),
            resolver: LazyDeclarationResolver::new(&project.config),
            project,
        }
    }

    /// Replace the default [`crate::lazy::ReferenceResolver`]
    pub fn with_phase_resolver(mut self, phase_resolver: Arc<dyn PhaseResolver>) -> Self {
        self.resolver = self.resolver.with_phase_resolver(phase_resolver);
        self
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn resolver(&self) -> &LazyDeclarationResolver {
        &self.resolver
    }

    pub fn sessions(&self) -> &Arc<SessionCache> {
        &self.sessions
    }

    pub fn session_for(&self, module: ModuleId) -> ResolveResult<Arc<ModuleSession>> {
        self.sessions.session_for(module)
    }

    /// Resolve `declaration` to at least `phase`, checking the phase contract
    pub fn lazy_resolve(
        &self,
        declaration: &Arc<Declaration>,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        self.resolver.lazy_resolve(self, declaration, phase)
    }

    /// Resolve without the contract check (for jumps between implicit types)
    pub fn ensure_resolved(
        &self,
        declaration: &Arc<Declaration>,
        phase: ResolvePhase,
    ) -> ResolveResult<()> {
        self.resolver.ensure_resolved(self, declaration, phase)
    }

    pub fn resolve_file_to_phase(&self, file: FileId, phase: ResolvePhase) -> ResolveResult<()> {
        let module = self
            .project
            .structure
            .module_of_file(file)
            .ok_or(ResolveError::UnknownFile { file })?;
        let session = self.session_for(module)?;
        let ir = session.file_ir(file)?;
        self.resolver.resolve_file_to_phase(self, &session, &ir, phase)
    }

    /// Use-site view of one module
    pub fn resolve_session(self: &Arc<Self>, module: &str) -> ResolveResult<ResolveSession> {
        let module = self.project.structure.module_by_name(module)?;
        Ok(ResolveSession::new(self.clone(), module))
    }

    /// Register `fragment` as a code fragment evaluated inside `host_file` and
    /// return the session of its synthetic module
    pub fn create_code_fragment(
        self: &Arc<Self>,
        host_file: FileId,
        fragment: SourceFile,
    ) -> ResolveResult<ResolveSession> {
        let host_module = self
            .project
            .structure
            .module_of_file(host_file)
            .ok_or(ResolveError::UnknownFile { file: host_file })?;
        let fragment_file = self.project.sources.add_detached_file(fragment);
        let module = self
            .project
            .structure
            .add_code_fragment_module(host_module, host_file, fragment_file)?;
        Ok(ResolveSession::new(self.clone(), module))
    }

    /// Release strong references to all sessions
    pub fn soften_caches(&self) {
        self.sessions.soften_all();
    }
}
