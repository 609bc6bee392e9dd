//! Symbol provider over the source files of one module
//!
//! Raw IR for a file is built on first use and shared by every lookup of the
//! session afterwards, so a symbol for a declaration is always the same
//! instance no matter which path found it.

use super::symbols::{CallableSymbol, ClassLikeSymbol};
use crate::caches::{NameSet, SlruCache, SymbolNameCache};
use crate::config::ResolveConfig;
use crate::ids::FileId;
use crate::ir::{DeclarationKind, Designation, IrFile, RawIrBuilder};
use crate::names::{CallableId, ClassId, FqName, Name};
use crate::project::module::Module;
use crate::project::services::{DeclarationCandidate, DeclarationProvider};
use crate::scopes::GlobalSearchScope;
use crate::syntax::SourceStore;
use fxhash::FxHashMap;
use log::trace;
use parking_lot::RwLock;
use std::sync::Arc;

/// Raw IR of the files of one module
pub struct FileIrCache {
    sources: Arc<SourceStore>,
    builder: RawIrBuilder,
    files: RwLock<FxHashMap<FileId, Arc<IrFile>>>,
}

impl FileIrCache {
    pub fn new(sources: Arc<SourceStore>, builder: RawIrBuilder) -> Self {
        Self {
            sources,
            builder,
            files: RwLock::new(FxHashMap::default()),
        }
    }

    /// IR for `file`, building it at `RAW_FIR` on first request
    ///
    /// Building happens outside the lock; when two threads race the first
    /// inserted file wins and both get it.
    pub fn get(&self, file: FileId) -> Option<Arc<IrFile>> {
        if let Some(built) = self.files.read().get(&file) {
            return Some(built.clone());
        }
        let source = self.sources.get(file)?;
        let built = Arc::new(self.builder.build_file(file, &source));
        trace!("Built raw IR for {} ({})", source.name, file);
        Some(self.files.write().entry(file).or_insert(built).clone())
    }

    /// Register IR built elsewhere (code fragments)
    pub fn insert(&self, file: Arc<IrFile>) -> Arc<IrFile> {
        self.files.write().entry(file.file).or_insert(file).clone()
    }

    pub fn cached(&self, file: FileId) -> Option<Arc<IrFile>> {
        self.files.read().get(&file).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ModuleSymbolProvider {
    module: Arc<Module>,
    files: Arc<FileIrCache>,
    index: Arc<dyn DeclarationProvider>,
    scope: GlobalSearchScope,
    names: SymbolNameCache,
    classes: SlruCache<ClassId, Option<ClassLikeSymbol>>,
    callables: SlruCache<(FqName, Name), Arc<[CallableSymbol]>>,
}

impl ModuleSymbolProvider {
    pub fn new(
        module: Arc<Module>,
        files: Arc<FileIrCache>,
        index: Arc<dyn DeclarationProvider>,
        config: &ResolveConfig,
    ) -> Self {
        let scope = module.content_scope();
        let names = {
            let classifier_index = index.clone();
            let classifier_scope = scope.clone();
            let callable_index = index.clone();
            let callable_scope = scope.clone();
            SymbolNameCache::new(
                config.name_cache,
                move |package| {
                    classifier_index.classifier_names_in_package(package, &classifier_scope)
                },
                move |package| callable_index.callable_names_in_package(package, &callable_scope),
            )
        };
        Self {
            module,
            files,
            index,
            scope,
            names,
            classes: SlruCache::new(config.class_cache),
            callables: SlruCache::new(config.callable_cache),
        }
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn files(&self) -> &Arc<FileIrCache> {
        &self.files
    }

    pub fn scope(&self) -> &GlobalSearchScope {
        &self.scope
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        if !self.names.may_have_top_level_classifier(class_id) {
            return None;
        }
        self.classes.get_or_compute(class_id, || {
            self.index
                .class_like_declarations(class_id, &self.scope)
                .into_iter()
                .find_map(|candidate| self.symbol_for_candidate(class_id, &candidate))
        })
    }

    /// Symbol for a candidate the index returned; `None` when the candidate
    /// doesn't lead to a class-like declaration with this ID
    pub fn symbol_for_candidate(
        &self,
        class_id: &ClassId,
        candidate: &DeclarationCandidate,
    ) -> Option<ClassLikeSymbol> {
        let file = self.files.get(candidate.file)?;
        let designation = Designation::from_source_path(&file, &candidate.path)?;
        let target = designation.target;
        if !target.kind.is_class_like() || target.class_id.as_ref() != Some(class_id) {
            return None;
        }
        ClassLikeSymbol::new(target)
    }

    /// Top-level functions and properties named `name`, in file order
    pub fn top_level_callables(&self, package: &FqName, name: &Name) -> Arc<[CallableSymbol]> {
        if !self.names.may_have_top_level_callable(package, name) {
            return Arc::from(Vec::new());
        }
        let key = (package.clone(), name.clone());
        self.callables.get_or_compute(&key, || {
            let files = self.index.top_level_callable_files(package, name, &self.scope);
            let callable_id = CallableId::top_level(package.clone(), name.clone());
            Arc::from(self.callables_in_files(&callable_id, &files))
        })
    }

    /// Callables with `callable_id` declared at the top level of `files`
    pub fn callables_in_files(
        &self,
        callable_id: &CallableId,
        files: &[FileId],
    ) -> Vec<CallableSymbol> {
        let mut found = Vec::new();
        for file in files {
            let Some(ir) = self.files.get(*file) else {
                continue;
            };
            if ir.package != *callable_id.package() {
                continue;
            }
            found.extend(
                ir.top_level_named(callable_id.callable_name())
                    .filter(|d| {
                        matches!(d.kind, DeclarationKind::Function | DeclarationKind::Property)
                    })
                    .filter_map(|d| CallableSymbol::new(d.clone())),
            );
        }
        found
    }

    pub fn package(&self, package: &FqName) -> Option<FqName> {
        self.index
            .has_package(package, &self.scope)
            .then(|| package.clone())
    }

    pub fn known_classifier_names(&self, package: &FqName) -> Option<NameSet> {
        self.names.classifier_names(package)
    }

    pub fn known_callable_names(&self, package: &FqName) -> Option<NameSet> {
        self.names.callable_names(package)
    }

    pub fn may_have_top_level_classifier(&self, class_id: &ClassId) -> bool {
        self.names.may_have_top_level_classifier(class_id)
    }

    pub fn may_have_top_level_callable(&self, package: &FqName, name: &Name) -> bool {
        self.names.may_have_top_level_callable(package, name)
    }
}
