//! Use-site resolution session
//!
//! A [`ResolveSession`] answers requests on behalf of one module: building IR
//! for source elements, resolving them to a phase and symbol lookups through
//! the module's symbol provider. Sessions are cheap handles; the state lives in
//! the engine's session cache.

use super::engine::ResolutionEngine;
use super::module_session::ModuleSession;
use crate::error::ResolveResult;
use crate::ir::{Designation, IrElement, ResolvePhase};
use crate::names::{ClassId, FqName, Name};
use crate::project::module::Module;
use crate::project::services::ProjectStructureProvider;
use crate::providers::{CallableSymbol, ClassLikeSymbol, SymbolProvider};
use crate::syntax::SourceElement;
use std::sync::Arc;

#[derive(Clone)]
pub struct ResolveSession {
    engine: Arc<ResolutionEngine>,
    module: Arc<Module>,
}

impl ResolveSession {
    pub fn new(engine: Arc<ResolutionEngine>, module: Arc<Module>) -> Self {
        Self { engine, module }
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn engine(&self) -> &Arc<ResolutionEngine> {
        &self.engine
    }

    pub fn session(&self) -> ResolveResult<Arc<ModuleSession>> {
        self.engine.session_for(self.module.id)
    }

    /// IR of a file or declaration, unresolved beyond what earlier requests did
    ///
    /// `None` when the element's file isn't part of the project or the path
    /// doesn't lead to a declaration.
    pub fn get_or_build_ir_for(&self, element: &SourceElement) -> ResolveResult<Option<IrElement>> {
        let Some(owner) = self.engine.project().structure.module_of_file(element.file) else {
            return Ok(None);
        };
        let session = self.engine.session_for(owner)?;
        let Some(file) = session.files().get(element.file) else {
            return Ok(None);
        };
        if element.is_file() {
            return Ok(Some(IrElement::File(file)));
        }
        Ok(Designation::from_source_path(&file, &element.path)
            .map(|designation| IrElement::Declaration(designation.target)))
    }

    /// IR of `element` resolved to at least `phase`
    pub fn resolve_to_phase(
        &self,
        element: &SourceElement,
        phase: ResolvePhase,
    ) -> ResolveResult<Option<IrElement>> {
        let Some(ir) = self.get_or_build_ir_for(element)? else {
            return Ok(None);
        };
        match &ir {
            IrElement::File(file) => self.engine.resolve_file_to_phase(file.file, phase)?,
            IrElement::Declaration(declaration) => self.engine.lazy_resolve(declaration, phase)?,
        }
        Ok(Some(ir))
    }

    pub fn symbol_provider(&self) -> ResolveResult<SymbolProvider> {
        Ok(self.session()?.symbol_provider().clone())
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> ResolveResult<Option<ClassLikeSymbol>> {
        Ok(self.session()?.symbol_provider().class_like_symbol(class_id))
    }

    pub fn top_level_callables(
        &self,
        package: &FqName,
        name: &Name,
    ) -> ResolveResult<Vec<CallableSymbol>> {
        Ok(self.session()?.symbol_provider().top_level_callables(package, name))
    }

    /// Wrapper class generated for a code fragment session
    pub fn code_fragment_class(&self) -> ResolveResult<Option<ClassLikeSymbol>> {
        Ok(self
            .session()?
            .code_fragment_provider()
            .and_then(|provider| provider.registered()))
    }
}
