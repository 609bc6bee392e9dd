//! Per-module resolution state
//!
//! A session owns the raw IR of its module's files, the module's own symbol
//! providers, the provider over its dependencies and the per-class member
//! scopes. Dependency providers are taken from the dependency sessions, so a
//! declaration is the same instance whichever module looks it up.

use crate::caches::MemoMap;
use crate::error::{ResolveError, ResolveResult};
use crate::ids::{DeclarationId, FileId};
use crate::ir::{Declaration, IrFile, RawIrBuilder};
use crate::project::module::Module;
use crate::project::Project;
use crate::providers::{
    dependencies_provider, CodeFragmentSymbolProvider, CompositeSymbolProvider, FileIrCache,
    JavaSymbolProvider, ModuleSymbolProvider, SymbolProvider,
};
use crate::scopes::{ClassMemberScope, GeneratedMemberDeclarationsCache};
use std::sync::Arc;

pub struct ModuleSession {
    module: Arc<Module>,
    project: Arc<Project>,
    files: Arc<FileIrCache>,
    kotlin: Option<Arc<ModuleSymbolProvider>>,
    java: Option<Arc<JavaSymbolProvider>>,
    code_fragment: Option<Arc<CodeFragmentSymbolProvider>>,
    dependencies: SymbolProvider,
    symbol_provider: SymbolProvider,
    generated: GeneratedMemberDeclarationsCache,
    member_scopes: MemoMap<DeclarationId, Arc<ClassMemberScope>>,
}

impl std::fmt::Debug for ModuleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleSession")
            .field("module", &self.module)
            .finish_non_exhaustive()
    }
}

/// Providers a session serves its own module with
#[derive(Default)]
struct OwnProviders {
    kotlin: Option<Arc<ModuleSymbolProvider>>,
    java: Option<Arc<JavaSymbolProvider>>,
    code_fragment: Option<Arc<CodeFragmentSymbolProvider>>,
}

impl OwnProviders {
    fn in_order(&self) -> Vec<SymbolProvider> {
        let mut providers = Vec::new();
        providers.extend(self.code_fragment.clone().map(SymbolProvider::CodeFragment));
        providers.extend(self.kotlin.clone().map(SymbolProvider::Module));
        providers.extend(self.java.clone().map(SymbolProvider::Java));
        providers
    }
}

impl ModuleSession {
    /// Session of a source, library or SDK module
    pub fn source(
        project: Arc<Project>,
        module: Arc<Module>,
        dependencies: &[Arc<ModuleSession>],
    ) -> Self {
        let files = Arc::new(FileIrCache::new(
            project.sources.clone(),
            RawIrBuilder::new(module.id),
        ));
        let own = OwnProviders {
            kotlin: Some(Arc::new(ModuleSymbolProvider::new(
                module.clone(),
                files.clone(),
                project.declaration_provider(),
                &project.config,
            ))),
            java: Some(Arc::new(JavaSymbolProvider::new(
                module.clone(),
                project.java_class_finder(),
            ))),
            code_fragment: None,
        };
        Self::assemble(project, module, files, own, dependencies)
    }

    /// Session of a code fragment module; its only own symbol is the
    /// generated wrapper class, registered once the fragment IR is built
    pub fn code_fragment(
        project: Arc<Project>,
        module: Arc<Module>,
        dependencies: &[Arc<ModuleSession>],
    ) -> Self {
        let files = Arc::new(FileIrCache::new(
            project.sources.clone(),
            RawIrBuilder::new(module.id),
        ));
        let own = OwnProviders {
            code_fragment: Some(Arc::new(CodeFragmentSymbolProvider::new())),
            ..OwnProviders::default()
        };
        Self::assemble(project, module, files, own, dependencies)
    }

    fn assemble(
        project: Arc<Project>,
        module: Arc<Module>,
        files: Arc<FileIrCache>,
        own: OwnProviders,
        dependencies: &[Arc<ModuleSession>],
    ) -> Self {
        let dependencies = dependencies_provider(
            &project,
            dependencies.iter().filter_map(|s| s.kotlin.clone()).collect(),
            dependencies.iter().filter_map(|s| s.java.clone()).collect(),
        );
        let mut providers = own.in_order();
        providers.push(dependencies.clone());
        let symbol_provider =
            SymbolProvider::Composite(Arc::new(CompositeSymbolProvider::new(providers)));
        Self {
            module,
            project,
            files,
            kotlin: own.kotlin,
            java: own.java,
            code_fragment: own.code_fragment,
            dependencies,
            symbol_provider,
            generated: GeneratedMemberDeclarationsCache::new(),
            member_scopes: MemoMap::new(),
        }
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn project(&self) -> &Arc<Project> {
        &self.project
    }

    pub fn files(&self) -> &Arc<FileIrCache> {
        &self.files
    }

    /// IR of one of this session's files
    pub fn file_ir(&self, file: FileId) -> ResolveResult<Arc<IrFile>> {
        self.files.get(file).ok_or(ResolveError::UnknownFile { file })
    }

    pub fn kotlin_provider(&self) -> Option<&Arc<ModuleSymbolProvider>> {
        self.kotlin.as_ref()
    }

    pub fn java_provider(&self) -> Option<&Arc<JavaSymbolProvider>> {
        self.java.as_ref()
    }

    pub fn code_fragment_provider(&self) -> Option<&Arc<CodeFragmentSymbolProvider>> {
        self.code_fragment.as_ref()
    }

    pub fn dependencies_provider(&self) -> &SymbolProvider {
        &self.dependencies
    }

    /// Own symbols first, then dependencies
    pub fn symbol_provider(&self) -> &SymbolProvider {
        &self.symbol_provider
    }

    /// Member scope of `class`, one instance per class for the session's lifetime
    pub fn member_scope(&self, class: &Arc<Declaration>) -> Arc<ClassMemberScope> {
        self.member_scopes.get_or_compute(&class.id, || {
            Arc::new(ClassMemberScope::new(
                class.clone(),
                &self.project.extensions,
                &self.generated,
            ))
        })
    }

    pub fn generated_members(&self) -> &GeneratedMemberDeclarationsCache {
        &self.generated
    }
}
