//! Combined Java Symbol Provider
//!
//! One class finder query over the union of the member modules; the winning
//! class is the one from the highest-precedence module. Classes without a
//! source file can't be attributed to a module cheaply, so their lookup falls
//! back to asking the member providers in order.

use super::java::JavaSymbolProvider;
use super::symbols::ClassLikeSymbol;
use super::{CompositeSymbolProvider, SymbolProvider};
use crate::caches::name_cache::union_names;
use crate::caches::{NameSet, SlruCache};
use crate::config::ResolveConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::ids::ModuleId;
use crate::names::{ClassId, FqName};
use crate::project::services::{JavaClass, JavaClassFinder, ProjectStructureProvider};
use crate::scopes::{GlobalSearchScope, GlobalSearchScopeFactory};
use fxhash::FxHashMap;
use log::{error, trace};
use std::sync::Arc;

pub struct CombinedJavaSymbolProvider {
    providers: Vec<Arc<JavaSymbolProvider>>,
    precedence: FxHashMap<ModuleId, usize>,
    finder: Arc<dyn JavaClassFinder>,
    structure: Arc<dyn ProjectStructureProvider>,
    scope: GlobalSearchScope,
    classes: SlruCache<ClassId, Option<ClassLikeSymbol>>,
}

impl CombinedJavaSymbolProvider {
    pub fn new(
        providers: Vec<Arc<JavaSymbolProvider>>,
        finder: Arc<dyn JavaClassFinder>,
        structure: Arc<dyn ProjectStructureProvider>,
        scopes: &dyn GlobalSearchScopeFactory,
        config: &ResolveConfig,
    ) -> ResolveResult<Self> {
        let mut precedence = FxHashMap::default();
        for (rank, provider) in providers.iter().enumerate() {
            let module = provider.module().id;
            if precedence.insert(module, rank).is_some() {
                return Err(ResolveError::DuplicateModuleProvider { module });
            }
        }
        let modules: Vec<_> = providers.iter().map(|p| p.module().clone()).collect();
        let scope = scopes.combined_content_scope(&modules);
        Ok(Self {
            providers,
            precedence,
            finder,
            structure,
            scope,
            classes: SlruCache::new(config.class_cache),
        })
    }

    /// Same collapsing rules as the Kotlin counterpart
    pub fn merge(
        providers: Vec<Arc<JavaSymbolProvider>>,
        finder: Arc<dyn JavaClassFinder>,
        structure: Arc<dyn ProjectStructureProvider>,
        scopes: &dyn GlobalSearchScopeFactory,
        config: &ResolveConfig,
    ) -> Option<SymbolProvider> {
        match providers.len() {
            0 => None,
            1 => providers.into_iter().next().map(SymbolProvider::Java),
            _ => match Self::new(providers.clone(), finder, structure, scopes, config) {
                Ok(combined) => Some(SymbolProvider::CombinedJava(Arc::new(combined))),
                Err(err) => {
                    error!("Cannot combine {} Java providers: {}", providers.len(), err);
                    Some(SymbolProvider::Composite(Arc::new(CompositeSymbolProvider::new(
                        providers.into_iter().map(SymbolProvider::Java).collect(),
                    ))))
                }
            },
        }
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        self.classes
            .get_or_compute(class_id, || self.compute_class_like_symbol(class_id))
    }

    fn compute_class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        let candidates = self.finder.find_classes(class_id, &self.scope);
        let mut winner: Option<(usize, JavaClass)> = None;
        for candidate in candidates {
            let Some(file) = candidate.source else {
                trace!("{} has no source file, asking providers one by one", class_id);
                return self.ask_one_by_one(class_id);
            };
            let Some(rank) = self
                .structure
                .module_of_file(file)
                .and_then(|module| self.precedence.get(&module).copied())
            else {
                continue;
            };
            if winner.as_ref().map_or(true, |(best, _)| rank < *best) {
                winner = Some((rank, candidate));
            }
        }
        let (rank, class) = winner?;
        if class.class_id != *class_id || class.has_metadata_annotation {
            return None;
        }
        self.providers[rank].symbol_for_java_class(&class)
    }

    fn ask_one_by_one(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        self.providers
            .iter()
            .find_map(|provider| provider.class_like_symbol(class_id))
    }

    pub fn package(&self, package: &FqName) -> Option<FqName> {
        self.providers
            .iter()
            .find_map(|provider| provider.package(package))
    }

    pub fn known_classifier_names(&self, package: &FqName) -> Option<NameSet> {
        union_names(self.providers.iter().map(|p| p.known_classifier_names(package))).map(Arc::new)
    }
}
