//! Global Search Scopes
//!
//! A [`GlobalSearchScope`] restricts index and class-finder queries to a set of
//! files. Combined providers search the union of their modules' content scopes
//! with a single query; a [`GlobalSearchScopeFactory`] decides how that union
//! is represented.

use crate::ids::{FileId, ModuleId};
use crate::project::module::Module;
use crate::project::services::ProjectStructureProvider;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalSearchScope {
    Empty,
    Everything,
    /// Content of one module
    Module(ModuleId),
    /// Content of several modules, flattened
    Modules(Arc<BTreeSet<ModuleId>>),
    Files(Arc<BTreeSet<FileId>>),
    Union(Arc<[GlobalSearchScope]>),
}

impl GlobalSearchScope {
    pub fn modules(modules: impl IntoIterator<Item = ModuleId>) -> Self {
        GlobalSearchScope::Modules(Arc::new(modules.into_iter().collect()))
    }

    pub fn files(files: impl IntoIterator<Item = FileId>) -> Self {
        GlobalSearchScope::Files(Arc::new(files.into_iter().collect()))
    }

    pub fn contains_file(&self, file: FileId, structure: &dyn ProjectStructureProvider) -> bool {
        match self {
            GlobalSearchScope::Empty => false,
            GlobalSearchScope::Everything => true,
            GlobalSearchScope::Module(module) => structure.module_of_file(file) == Some(*module),
            GlobalSearchScope::Modules(modules) => structure
                .module_of_file(file)
                .map_or(false, |owner| modules.contains(&owner)),
            GlobalSearchScope::Files(files) => files.contains(&file),
            GlobalSearchScope::Union(scopes) => {
                scopes.iter().any(|scope| scope.contains_file(file, structure))
            }
        }
    }

    /// Whether binary content of `module` (content without a source file) is in scope
    pub fn contains_module(&self, module: ModuleId) -> bool {
        match self {
            GlobalSearchScope::Empty | GlobalSearchScope::Files(_) => false,
            GlobalSearchScope::Everything => true,
            GlobalSearchScope::Module(own) => *own == module,
            GlobalSearchScope::Modules(modules) => modules.contains(&module),
            GlobalSearchScope::Union(scopes) => {
                scopes.iter().any(|scope| scope.contains_module(module))
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            GlobalSearchScope::Empty => true,
            GlobalSearchScope::Modules(modules) => modules.is_empty(),
            GlobalSearchScope::Files(files) => files.is_empty(),
            GlobalSearchScope::Union(scopes) => scopes.iter().all(GlobalSearchScope::is_empty),
            GlobalSearchScope::Everything | GlobalSearchScope::Module(_) => false,
        }
    }
}

/// Builds the scope a combined provider searches
pub trait GlobalSearchScopeFactory: Send + Sync {
    fn union(&self, scopes: Vec<GlobalSearchScope>) -> GlobalSearchScope;

    /// Union of the content scopes of `modules`
    fn combined_content_scope(&self, modules: &[Arc<Module>]) -> GlobalSearchScope {
        self.union(modules.iter().map(|m| m.content_scope()).collect())
    }
}

/// Plain union of the given scopes
#[derive(Debug, Default, Clone, Copy)]
pub struct UnionSearchScopeFactory;

impl GlobalSearchScopeFactory for UnionSearchScopeFactory {
    fn union(&self, mut scopes: Vec<GlobalSearchScope>) -> GlobalSearchScope {
        scopes.retain(|scope| !scope.is_empty());
        match scopes.len() {
            0 => GlobalSearchScope::Empty,
            1 => scopes.remove(0),
            _ => GlobalSearchScope::Union(scopes.into()),
        }
    }
}

/// Flattens module scopes into one module set so membership is a single lookup
#[derive(Debug, Default, Clone, Copy)]
pub struct ModuleSetSearchScopeFactory;

impl GlobalSearchScopeFactory for ModuleSetSearchScopeFactory {
    fn union(&self, scopes: Vec<GlobalSearchScope>) -> GlobalSearchScope {
        let mut modules = BTreeSet::new();
        let mut rest = Vec::new();
        for scope in scopes {
            match scope {
                GlobalSearchScope::Module(module) => {
                    modules.insert(module);
                }
                GlobalSearchScope::Modules(set) => modules.extend(set.iter().copied()),
                GlobalSearchScope::Everything => return GlobalSearchScope::Everything,
                other => rest.push(other),
            }
        }
        if !modules.is_empty() {
            rest.push(GlobalSearchScope::Modules(Arc::new(modules)));
        }
        UnionSearchScopeFactory.union(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxhash::FxHashMap;

    struct Files(FxHashMap<FileId, ModuleId>);

    impl ProjectStructureProvider for Files {
        fn module_of_file(&self, file: FileId) -> Option<ModuleId> {
            self.0.get(&file).copied()
        }

        fn module(&self, _id: ModuleId) -> Option<Arc<Module>> {
            None
        }
    }

    fn structure() -> Files {
        let mut map = FxHashMap::default();
        map.insert(FileId::from_raw(0), ModuleId::from_raw(0));
        map.insert(FileId::from_raw(1), ModuleId::from_raw(1));
        map.insert(FileId::from_raw(2), ModuleId::from_raw(2));
        Files(map)
    }

    #[test]
    fn test_union_membership() {
        let structure = structure();
        let scope = UnionSearchScopeFactory.union(vec![
            GlobalSearchScope::Module(ModuleId::from_raw(0)),
            GlobalSearchScope::Module(ModuleId::from_raw(2)),
        ]);
        assert!(matches!(scope, GlobalSearchScope::Union(_)));
        assert!(scope.contains_file(FileId::from_raw(0), &structure));
        assert!(!scope.contains_file(FileId::from_raw(1), &structure));
        assert!(scope.contains_file(FileId::from_raw(2), &structure));
        assert!(scope.contains_module(ModuleId::from_raw(2)));
    }

    #[test]
    fn test_module_set_factory_flattens() {
        let scope = ModuleSetSearchScopeFactory.union(vec![
            GlobalSearchScope::Module(ModuleId::from_raw(0)),
            GlobalSearchScope::Module(ModuleId::from_raw(1)),
        ]);
        assert_eq!(
            scope,
            GlobalSearchScope::modules([ModuleId::from_raw(0), ModuleId::from_raw(1)])
        );
        assert!(scope.contains_file(FileId::from_raw(1), &structure()));
    }

    #[test]
    fn test_empty_union() {
        assert!(UnionSearchScopeFactory.union(vec![]).is_empty());
        let single = UnionSearchScopeFactory.union(vec![
            GlobalSearchScope::Empty,
            GlobalSearchScope::Module(ModuleId::from_raw(3)),
        ]);
        assert_eq!(single, GlobalSearchScope::Module(ModuleId::from_raw(3)));
    }
}
