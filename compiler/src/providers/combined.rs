//! Combined Kotlin Symbol Provider
//!
//! Answers for a whole list of module providers with one index query over the
//! union of their content scopes, then hands each candidate to the provider of
//! the module owning it. Providers earlier in the list take precedence.
//!
//! Results are memoized in SLRU caches; per-package name sets are the union of
//! the member providers' sets and are consulted before touching the index.

use super::module_provider::ModuleSymbolProvider;
use super::symbols::{CallableSymbol, ClassLikeSymbol};
use super::{CompositeSymbolProvider, SymbolProvider};
use crate::caches::name_cache::union_names;
use crate::caches::{CacheStats, NameSet, SlruCache, SymbolNameCache};
use crate::config::ResolveConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::ids::{FileId, ModuleId};
use crate::names::{CallableId, ClassId, FqName, Name};
use crate::project::services::{DeclarationProvider, ProjectStructureProvider};
use crate::scopes::{GlobalSearchScope, GlobalSearchScopeFactory};
use fxhash::FxHashMap;
use indexmap::IndexMap;
use log::{error, trace};
use std::sync::Arc;

pub struct CombinedKotlinSymbolProvider {
    providers: Vec<Arc<ModuleSymbolProvider>>,
    precedence: FxHashMap<ModuleId, usize>,
    index: Arc<dyn DeclarationProvider>,
    structure: Arc<dyn ProjectStructureProvider>,
    scope: GlobalSearchScope,
    names: SymbolNameCache,
    classes: SlruCache<ClassId, Option<ClassLikeSymbol>>,
    callables: SlruCache<(FqName, Name), Arc<[CallableSymbol]>>,
}

impl CombinedKotlinSymbolProvider {
    pub fn new(
        providers: Vec<Arc<ModuleSymbolProvider>>,
        index: Arc<dyn DeclarationProvider>,
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

        let names = {
            let for_classifiers = providers.clone();
            let for_callables = providers.clone();
            SymbolNameCache::new(
                config.name_cache,
                move |package| {
                    union_names(for_classifiers.iter().map(|p| p.known_classifier_names(package)))
                },
                move |package| {
                    union_names(for_callables.iter().map(|p| p.known_callable_names(package)))
                },
            )
        };

        Ok(Self {
            providers,
            precedence,
            index,
            structure,
            scope,
            names,
            classes: SlruCache::new(config.class_cache),
            callables: SlruCache::new(config.callable_cache),
        })
    }

    /// Collapse `providers` into a single provider: nothing for an empty list,
    /// the provider itself for one, a combined provider otherwise
    ///
    /// A combined provider that can't be built is logged and replaced by a
    /// composite that asks the providers one by one.
    pub fn merge(
        providers: Vec<Arc<ModuleSymbolProvider>>,
        index: Arc<dyn DeclarationProvider>,
        structure: Arc<dyn ProjectStructureProvider>,
        scopes: &dyn GlobalSearchScopeFactory,
        config: &ResolveConfig,
    ) -> Option<SymbolProvider> {
        match providers.len() {
            0 => None,
            1 => providers.into_iter().next().map(SymbolProvider::Module),
            _ => match Self::new(providers.clone(), index, structure, scopes, config) {
                Ok(combined) => Some(SymbolProvider::CombinedKotlin(Arc::new(combined))),
                Err(err) => {
                    error!("Cannot combine {} Kotlin providers: {}", providers.len(), err);
                    Some(SymbolProvider::Composite(Arc::new(CompositeSymbolProvider::new(
                        providers.into_iter().map(SymbolProvider::Module).collect(),
                    ))))
                }
            },
        }
    }

    pub fn providers(&self) -> &[Arc<ModuleSymbolProvider>] {
        &self.providers
    }

    pub fn class_cache_stats(&self) -> CacheStats {
        self.classes.stats()
    }

    fn rank_of_file(&self, file: FileId) -> Option<usize> {
        let module = self.structure.module_of_file(file)?;
        let rank = self.precedence.get(&module).copied();
        if rank.is_none() {
            trace!("Dropping candidate in {}: {} has no provider here", file, module);
        }
        rank
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        if !self.names.may_have_top_level_classifier(class_id) {
            return None;
        }
        self.classes
            .get_or_compute(class_id, || self.compute_class_like_symbol(class_id))
    }

    /// Only the provider of the single best-ranked candidate is asked; a miss
    /// there is a miss for the combined provider
    fn compute_class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        let mut winner = None;
        for candidate in self.index.class_like_declarations(class_id, &self.scope) {
            let Some(rank) = self.rank_of_file(candidate.file) else {
                continue;
            };
            // ties keep the first candidate in index order
            if winner.as_ref().map_or(true, |(best, _)| rank < *best) {
                winner = Some((rank, candidate));
            }
        }
        let (rank, candidate) = winner?;
        self.providers[rank].symbol_for_candidate(class_id, &candidate)
    }

    pub fn top_level_callables(&self, package: &FqName, name: &Name) -> Arc<[CallableSymbol]> {
        if !self.names.may_have_top_level_callable(package, name) {
            return Arc::from(Vec::new());
        }
        let key = (package.clone(), name.clone());
        self.callables.get_or_compute(&key, || {
            let mut by_rank: IndexMap<usize, Vec<FileId>> = IndexMap::new();
            for file in self.index.top_level_callable_files(package, name, &self.scope) {
                if let Some(rank) = self.rank_of_file(file) {
                    by_rank.entry(rank).or_default().push(file);
                }
            }
            by_rank.sort_keys();
            let callable_id = CallableId::top_level(package.clone(), name.clone());
            let found: Vec<CallableSymbol> = by_rank
                .iter()
                .flat_map(|(rank, files)| {
                    self.providers[*rank].callables_in_files(&callable_id, files)
                })
                .collect();
            Arc::from(found)
        })
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
