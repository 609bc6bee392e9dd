//! Modules and their dependency lists

use crate::ids::{FileId, ModuleId};
use crate::scopes::search_scope::GlobalSearchScope;
use indexmap::IndexSet;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKindSpec {
    #[default]
    Source,
    Library,
    Sdk,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleKind {
    Source,
    Library,
    Sdk,
    /// Synthetic module holding a single debugger-evaluated fragment
    CodeFragment {
        source_module: ModuleId,
        /// Host file the fragment is evaluated in
        source_file: FileId,
        fragment_file: FileId,
    },
}

impl From<ModuleKindSpec> for ModuleKind {
    fn from(spec: ModuleKindSpec) -> Self {
        match spec {
            ModuleKindSpec::Source => ModuleKind::Source,
            ModuleKindSpec::Library => ModuleKind::Library,
            ModuleKindSpec::Sdk => ModuleKind::Sdk,
        }
    }
}

/// Module description before IDs are assigned (dependencies by name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    pub kind: ModuleKindSpec,
    pub dependencies: Vec<String>,
    pub depends_on: Vec<String>,
    pub friends: Vec<String>,
}

impl ModuleSpec {
    pub fn new(name: &str, kind: ModuleKindSpec) -> Self {
        Self {
            name: name.to_string(),
            kind,
            dependencies: Vec::new(),
            depends_on: Vec::new(),
            friends: Vec::new(),
        }
    }

    pub fn source(name: &str) -> Self {
        Self::new(name, ModuleKindSpec::Source)
    }

    pub fn library(name: &str) -> Self {
        Self::new(name, ModuleKindSpec::Library)
    }

    pub fn sdk(name: &str) -> Self {
        Self::new(name, ModuleKindSpec::Sdk)
    }

    pub fn depends(mut self, name: &str) -> Self {
        self.dependencies.push(name.to_string());
        self
    }

    /// Expect/actual ("depends-on") edge
    pub fn refines(mut self, name: &str) -> Self {
        self.depends_on.push(name.to_string());
        self
    }

    pub fn friend(mut self, name: &str) -> Self {
        self.friends.push(name.to_string());
        self
    }
}

/// A unit of content with immutable dependency lists
///
/// Compared by ID.
#[derive(Debug, Clone)]
pub struct Module {
    pub id: ModuleId,
    pub name: String,
    pub kind: ModuleKind,
    pub regular_dependencies: Vec<ModuleId>,
    pub depends_on_dependencies: Vec<ModuleId>,
    /// Closure of the depends-on edges
    pub transitive_depends_on: Vec<ModuleId>,
    pub friend_dependencies: Vec<ModuleId>,
    description: String,
}

impl Module {
    pub fn new(
        id: ModuleId,
        name: String,
        kind: ModuleKind,
        regular_dependencies: Vec<ModuleId>,
        depends_on_dependencies: Vec<ModuleId>,
        transitive_depends_on: Vec<ModuleId>,
        friend_dependencies: Vec<ModuleId>,
    ) -> Self {
        let description = match &kind {
            ModuleKind::Source => format!("source module '{}'", name),
            ModuleKind::Library => format!("library '{}'", name),
            ModuleKind::Sdk => format!("SDK '{}'", name),
            ModuleKind::CodeFragment { .. } => format!("code fragment '{}'", name),
        };
        Self {
            id,
            name,
            kind,
            regular_dependencies,
            depends_on_dependencies,
            transitive_depends_on,
            friend_dependencies,
            description,
        }
    }

    /// Synthetic module for a fragment evaluated inside `source_file` of `source`
    ///
    /// Inherits every dependency of the source module and adds the source
    /// module itself as a friend, so the fragment sees its internals.
    pub fn code_fragment(
        id: ModuleId,
        source: &Module,
        source_file: FileId,
        fragment_file: FileId,
    ) -> Self {
        Self {
            id,
            name: format!("{}#fragment{}", source.name, fragment_file.as_raw()),
            kind: ModuleKind::CodeFragment {
                source_module: source.id,
                source_file,
                fragment_file,
            },
            regular_dependencies: source.regular_dependencies.clone(),
            depends_on_dependencies: source.depends_on_dependencies.clone(),
            transitive_depends_on: source.transitive_depends_on.clone(),
            friend_dependencies: vec![source.id],
            description: format!("block code fragment from {}", source.description),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_code_fragment(&self) -> bool {
        matches!(self.kind, ModuleKind::CodeFragment { .. })
    }

    /// Files of a code fragment module belong to it; everything else is
    /// looked up through the content scope.
    pub fn content_scope(&self) -> GlobalSearchScope {
        match self.kind {
            ModuleKind::CodeFragment { source_module, .. } => {
                GlobalSearchScope::Module(source_module)
            }
            _ => GlobalSearchScope::Module(self.id),
        }
    }

    /// Dependencies in provider order: regular, friend, transitive depends-on
    ///
    /// A module reachable through several edges appears once, at its first position.
    pub fn dependencies_in_order(&self) -> Vec<ModuleId> {
        let mut ordered: IndexSet<ModuleId> = IndexSet::new();
        for id in self
            .regular_dependencies
            .iter()
            .chain(&self.friend_dependencies)
            .chain(&self.transitive_depends_on)
        {
            if *id != self.id {
                ordered.insert(*id);
            }
        }
        ordered.into_iter().collect()
    }

    pub fn is_friend_of(&self, other: ModuleId) -> bool {
        self.friend_dependencies.contains(&other)
    }
}

impl PartialEq for Module {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Module {}

impl std::hash::Hash for Module {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(id: u32, regular: &[u32], depends_on: &[u32], friends: &[u32]) -> Module {
        let ids = |raw: &[u32]| raw.iter().map(|r| ModuleId::from_raw(*r)).collect::<Vec<_>>();
        Module::new(
            ModuleId::from_raw(id),
            format!("m{}", id),
            ModuleKind::Source,
            ids(regular),
            ids(depends_on),
            ids(depends_on),
            ids(friends),
        )
    }

    #[test]
    fn test_dependency_order_is_deduplicated() {
        let m = module(0, &[2, 1], &[3, 1], &[4, 2]);
        let order: Vec<u32> = m.dependencies_in_order().iter().map(|id| id.as_raw()).collect();
        assert_eq!(order, vec![2, 1, 4, 3]);
    }

    #[test]
    fn test_code_fragment_inherits_dependencies() {
        let source = module(5, &[1], &[2], &[3]);
        let fragment = Module::code_fragment(
            ModuleId::from_raw(9),
            &source,
            FileId::from_raw(0),
            FileId::from_raw(7),
        );
        assert_eq!(fragment.regular_dependencies, source.regular_dependencies);
        assert_eq!(fragment.transitive_depends_on, source.transitive_depends_on);
        assert_eq!(fragment.friend_dependencies, vec![source.id]);
        assert_eq!(fragment.content_scope(), GlobalSearchScope::Module(source.id));
        assert_eq!(fragment.description(), "block code fragment from source module 'm5'");
        assert!(fragment.is_friend_of(source.id));
        assert_eq!(
            fragment.dependencies_in_order(),
            vec![ModuleId::from_raw(1), ModuleId::from_raw(5), ModuleId::from_raw(2)]
        );
    }
}
