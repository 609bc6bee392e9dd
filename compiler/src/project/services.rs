//! External Services
//!
//! Collaborators the resolution core consumes but doesn't implement: the
//! declaration index, the Java class finder, the project structure and
//! modification trackers. [`super::index`] has in-memory implementations
//! used when the engine runs standalone.

use super::module::Module;
use crate::ids::{FileId, ModuleId};
use crate::names::{ClassId, FqName, Name};
use crate::scopes::search_scope::GlobalSearchScope;
use crate::syntax::{SourcePath, Visibility};
use fxhash::FxHashSet;
use std::sync::Arc;

/// Monotonically increasing version counter
pub trait ModificationTracker: Send + Sync {
    fn modification_count(&self) -> u64;
}

/// Maps files to the modules owning them
pub trait ProjectStructureProvider: Send + Sync {
    fn module_of_file(&self, file: FileId) -> Option<ModuleId>;

    fn module(&self, id: ModuleId) -> Option<Arc<Module>>;
}

/// Location of a raw declaration found by the index
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeclarationCandidate {
    pub file: FileId,
    pub path: SourcePath,
}

/// Index of raw (unresolved) declarations
///
/// Every query is restricted to the files contained in `scope`. Name set queries
/// return `None` when the index can't enumerate the package.
pub trait DeclarationProvider: Send + Sync {
    /// Classes first, then type aliases, each in index order
    fn class_like_declarations(
        &self,
        class_id: &ClassId,
        scope: &GlobalSearchScope,
    ) -> Vec<DeclarationCandidate>;

    /// Files declaring a top-level function or property with this name
    fn top_level_callable_files(
        &self,
        package: &FqName,
        name: &Name,
        scope: &GlobalSearchScope,
    ) -> Vec<FileId>;

    fn classifier_names_in_package(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
    ) -> Option<FxHashSet<Name>>;

    fn callable_names_in_package(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
    ) -> Option<FxHashSet<Name>>;

    fn has_package(&self, package: &FqName, scope: &GlobalSearchScope) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaClassKind {
    Class,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JavaMemberKind {
    Method,
    Field,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JavaMember {
    pub name: Name,
    pub kind: JavaMemberKind,
    pub type_ref: String,
    pub visibility: Visibility,
}

/// Java class as seen by the class finder
#[derive(Debug, Clone, PartialEq)]
pub struct JavaClass {
    pub class_id: ClassId,
    pub kind: JavaClassKind,
    pub module: ModuleId,
    /// Source file when the class comes from Java sources rather than a binary
    pub source: Option<FileId>,
    /// Set on classes compiled from Kotlin (they must be served by Kotlin providers)
    pub has_metadata_annotation: bool,
    pub visibility: Visibility,
    pub supertypes: Vec<ClassId>,
    pub members: Vec<JavaMember>,
}

impl JavaClass {
    pub fn new(class_id: ClassId) -> Self {
        Self {
            class_id,
            kind: JavaClassKind::Class,
            module: ModuleId::invalid(),
            source: None,
            has_metadata_annotation: false,
            visibility: Visibility::Public,
            supertypes: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_method(mut self, name: &str, return_type: &str) -> Self {
        self.members.push(JavaMember {
            name: Name::identifier(name),
            kind: JavaMemberKind::Method,
            type_ref: return_type.to_string(),
            visibility: Visibility::Public,
        });
        self
    }

    pub fn with_field(mut self, name: &str, type_ref: &str) -> Self {
        self.members.push(JavaMember {
            name: Name::identifier(name),
            kind: JavaMemberKind::Field,
            type_ref: type_ref.to_string(),
            visibility: Visibility::Public,
        });
        self
    }

    pub fn with_metadata_annotation(mut self) -> Self {
        self.has_metadata_annotation = true;
        self
    }
}

/// Finds Java classes inside a search scope
pub trait JavaClassFinder: Send + Sync {
    /// Every class with this ID in the scope, in finder order
    fn find_classes(&self, class_id: &ClassId, scope: &GlobalSearchScope) -> Vec<JavaClass>;

    fn find_class(&self, class_id: &ClassId, scope: &GlobalSearchScope) -> Option<JavaClass> {
        self.find_classes(class_id, scope).into_iter().next()
    }

    fn class_names_in_package(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
    ) -> Option<FxHashSet<Name>>;

    fn has_package(&self, package: &FqName, scope: &GlobalSearchScope) -> bool;
}
