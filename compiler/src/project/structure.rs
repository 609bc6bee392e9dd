//! Project structure: the module set and the file → module mapping

use super::graph::ModuleGraph;
use super::module::{Module, ModuleKind, ModuleSpec};
use super::services::ProjectStructureProvider;
use crate::error::{ResolveError, ResolveResult};
use crate::ids::{FileId, IdAllocator, ModuleId};
use fxhash::FxHashMap;
use indexmap::IndexMap;
use log::debug;
use parking_lot::RwLock;
use std::sync::Arc;

pub struct ProjectStructure {
    /// Configured modules, in registration order
    modules: IndexMap<ModuleId, Arc<Module>>,
    by_name: FxHashMap<String, ModuleId>,
    /// Modules created after construction (code fragments)
    synthetic: RwLock<FxHashMap<ModuleId, Arc<Module>>>,
    file_modules: RwLock<FxHashMap<FileId, ModuleId>>,
    ids: IdAllocator<ModuleId>,
}

impl ProjectStructure {
    /// Assign IDs, resolve dependency names and reject cyclic graphs
    pub fn from_specs(specs: &[ModuleSpec]) -> ResolveResult<Self> {
        let ids = IdAllocator::new();
        let mut by_name = FxHashMap::default();
        for spec in specs {
            if by_name.contains_key(&spec.name) {
                return Err(ResolveError::Manifest {
                    message: format!("module '{}' is declared twice", spec.name),
                });
            }
            by_name.insert(spec.name.clone(), ids.allocate());
        }

        let lookup = |name: &String| -> ResolveResult<ModuleId> {
            by_name
                .get(name)
                .copied()
                .ok_or_else(|| ResolveError::UnknownModule { module: name.clone() })
        };

        let mut resolved = Vec::with_capacity(specs.len());
        let mut graph = ModuleGraph::new();
        for spec in specs {
            let id = lookup(&spec.name)?;
            let resolve_all = |names: &[String]| {
                names.iter().map(&lookup).collect::<ResolveResult<Vec<_>>>()
            };
            let regular = resolve_all(&spec.dependencies)?;
            let depends_on = resolve_all(&spec.depends_on)?;
            let friends = resolve_all(&spec.friends)?;

            graph.add_module(id, &spec.name);
            for target in regular.iter().chain(&depends_on).chain(&friends) {
                graph.add_edge(id, *target);
            }
            resolved.push((id, spec, regular, depends_on, friends));
        }

        if let Some(cycle) = graph.find_cycle() {
            return Err(ResolveError::CyclicModuleDependencies { cycle });
        }

        let depends_on_edges: FxHashMap<ModuleId, Vec<ModuleId>> = resolved
            .iter()
            .map(|(id, _, _, depends_on, _)| (*id, depends_on.clone()))
            .collect();

        let mut modules = IndexMap::new();
        for (id, spec, regular, depends_on, friends) in resolved {
            let transitive = ModuleGraph::reachable(id, |m| {
                depends_on_edges.get(&m).cloned().unwrap_or_default()
            });
            let module = Module::new(
                id,
                spec.name.clone(),
                ModuleKind::from(spec.kind),
                regular,
                depends_on,
                transitive,
                friends,
            );
            modules.insert(id, Arc::new(module));
        }

        debug!(
            "Project structure: {} modules in dependency order {:?}",
            modules.len(),
            graph
                .topological_order()
                .iter()
                .map(|id| graph.name(*id).to_string())
                .collect::<Vec<_>>()
        );

        Ok(Self {
            modules,
            by_name,
            synthetic: RwLock::new(FxHashMap::default()),
            file_modules: RwLock::new(FxHashMap::default()),
            ids,
        })
    }

    pub fn module_by_name(&self, name: &str) -> ResolveResult<Arc<Module>> {
        self.by_name
            .get(name)
            .and_then(|id| self.modules.get(id))
            .cloned()
            .ok_or_else(|| ResolveError::UnknownModule {
                module: name.to_string(),
            })
    }

    /// Configured modules in registration order
    pub fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.modules.values()
    }

    pub fn assign_file(&self, file: FileId, module: ModuleId) {
        self.file_modules.write().insert(file, module);
    }

    pub fn files_of(&self, module: ModuleId) -> Vec<FileId> {
        let mut files: Vec<FileId> = self
            .file_modules
            .read()
            .iter()
            .filter(|(_, owner)| **owner == module)
            .map(|(file, _)| *file)
            .collect();
        files.sort();
        files
    }

    /// Register a synthetic module for a code fragment and give it the fragment file
    pub fn add_code_fragment_module(
        &self,
        source_module: ModuleId,
        source_file: FileId,
        fragment_file: FileId,
    ) -> ResolveResult<Arc<Module>> {
        let source = self.module(source_module).ok_or_else(|| ResolveError::UnknownModule {
            module: source_module.to_string(),
        })?;
        let module = Arc::new(Module::code_fragment(
            self.ids.allocate(),
            &source,
            source_file,
            fragment_file,
        ));
        self.synthetic.write().insert(module.id, module.clone());
        self.assign_file(fragment_file, module.id);
        debug!("Registered {} ({})", module.name, module.description());
        Ok(module)
    }
}

impl ProjectStructureProvider for ProjectStructure {
    fn module_of_file(&self, file: FileId) -> Option<ModuleId> {
        self.file_modules.read().get(&file).copied()
    }

    fn module(&self, id: ModuleId) -> Option<Arc<Module>> {
        self.modules
            .get(&id)
            .cloned()
            .or_else(|| self.synthetic.read().get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitive_depends_on() {
        let structure = ProjectStructure::from_specs(&[
            ModuleSpec::source("common"),
            ModuleSpec::source("jvm-common").refines("common"),
            ModuleSpec::source("jvm").refines("jvm-common"),
        ])
        .unwrap();
        let jvm = structure.module_by_name("jvm").unwrap();
        let common = structure.module_by_name("common").unwrap();
        let jvm_common = structure.module_by_name("jvm-common").unwrap();
        assert_eq!(jvm.depends_on_dependencies, vec![jvm_common.id]);
        assert_eq!(jvm.transitive_depends_on, vec![jvm_common.id, common.id]);
    }

    #[test]
    fn test_cyclic_dependencies_are_rejected() {
        let result = ProjectStructure::from_specs(&[
            ModuleSpec::source("a").depends("b"),
            ModuleSpec::source("b").friend("a"),
        ]);
        match result {
            Err(ResolveError::CyclicModuleDependencies { cycle }) => {
                assert_eq!(cycle, vec!["a", "b", "a"]);
            }
            other => panic!("expected a cycle, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unknown_dependency() {
        let result = ProjectStructure::from_specs(&[ModuleSpec::source("a").depends("missing")]);
        assert!(matches!(
            result,
            Err(ResolveError::UnknownModule { module }) if module == "missing"
        ));
    }

    #[test]
    fn test_code_fragment_module_registration() {
        let structure = ProjectStructure::from_specs(&[ModuleSpec::source("app")]).unwrap();
        let app = structure.module_by_name("app").unwrap();
        let host = FileId::from_raw(0);
        structure.assign_file(host, app.id);

        let fragment = structure
            .add_code_fragment_module(app.id, host, FileId::from_raw(1))
            .unwrap();
        assert_ne!(fragment.id, app.id);
        assert_eq!(structure.module_of_file(FileId::from_raw(1)), Some(fragment.id));
        assert_eq!(structure.module(fragment.id).map(|m| m.id), Some(fragment.id));
        assert_eq!(structure.modules().count(), 1);
    }
}
