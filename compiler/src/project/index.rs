//! In-Memory Indexes
//!
//! [`StaticDeclarationIndex`] indexes raw source files by class ID, type alias
//! ID and top-level callable name. [`StaticJavaClassFinder`] serves a fixed set
//! of Java classes. Both answer queries through a [`GlobalSearchScope`] and
//! count them, so tests can tell whether a cache absorbed a lookup.

use super::services::{
    DeclarationCandidate, DeclarationProvider, JavaClass, JavaClassFinder, ProjectStructureProvider,
};
use crate::ids::FileId;
use crate::names::{ClassId, FqName, Name};
use crate::scopes::search_scope::GlobalSearchScope;
use crate::syntax::{SourceDeclaration, SourceDeclarationKind, SourceFile, SourcePath};
use fxhash::{FxHashMap, FxHashSet};
use indexmap::IndexMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Number of queries an index has answered, per query kind
#[derive(Debug, Default)]
pub struct IndexQueryCounters {
    class_like: AtomicUsize,
    callable: AtomicUsize,
    names: AtomicUsize,
    package: AtomicUsize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IndexQueryCounts {
    pub class_like: usize,
    pub callable: usize,
    pub names: usize,
    pub package: usize,
}

impl IndexQueryCounters {
    pub fn snapshot(&self) -> IndexQueryCounts {
        IndexQueryCounts {
            class_like: self.class_like.load(Ordering::SeqCst),
            callable: self.callable.load(Ordering::SeqCst),
            names: self.names.load(Ordering::SeqCst),
            package: self.package.load(Ordering::SeqCst),
        }
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct IndexedFile {
    package: FqName,
    classes: Vec<ClassId>,
    type_aliases: Vec<ClassId>,
    classifier_names: Vec<Name>,
    callable_names: Vec<Name>,
}

#[derive(Default)]
struct IndexState {
    /// Keyed by file so candidates come back in file order
    files: IndexMap<FileId, IndexedFile>,
    classes: FxHashMap<ClassId, Vec<DeclarationCandidate>>,
    type_aliases: FxHashMap<ClassId, Vec<DeclarationCandidate>>,
    callables: FxHashMap<(FqName, Name), Vec<FileId>>,
}

pub struct StaticDeclarationIndex {
    structure: Arc<dyn ProjectStructureProvider>,
    state: RwLock<IndexState>,
    counters: IndexQueryCounters,
}

impl StaticDeclarationIndex {
    pub fn new(structure: Arc<dyn ProjectStructureProvider>) -> Self {
        Self {
            structure,
            state: RwLock::new(IndexState::default()),
            counters: IndexQueryCounters::default(),
        }
    }

    pub fn counters(&self) -> IndexQueryCounts {
        self.counters.snapshot()
    }

    /// (Re)index a file, replacing whatever was indexed for it before
    pub fn index_file(&self, file: FileId, source: &SourceFile) {
        let mut state = self.state.write();
        Self::remove_locked(&mut state, file);

        let mut indexed = IndexedFile {
            package: source.package.clone(),
            ..IndexedFile::default()
        };
        for (index, declaration) in source.declarations.iter().enumerate() {
            let path = SourcePath::from_slice(&[index as u32]);
            match declaration.kind {
                kind if kind.is_class_like() => {
                    let name = Name::identifier(&declaration.name);
                    indexed.classifier_names.push(name.clone());
                    let class_id = ClassId::top_level(source.package.clone(), name);
                    Self::index_class_like(
                        &mut state,
                        &mut indexed,
                        file,
                        class_id,
                        path,
                        declaration,
                    );
                }
                SourceDeclarationKind::Function | SourceDeclarationKind::Property => {
                    let name = Name::identifier(&declaration.name);
                    let files = state
                        .callables
                        .entry((source.package.clone(), name.clone()))
                        .or_default();
                    if !files.contains(&file) {
                        files.push(file);
                    }
                    indexed.callable_names.push(name);
                }
                _ => {}
            }
        }
        state.files.insert(file, indexed);
    }

    fn index_class_like(
        state: &mut IndexState,
        indexed: &mut IndexedFile,
        file: FileId,
        class_id: ClassId,
        path: SourcePath,
        declaration: &SourceDeclaration,
    ) {
        let candidate = DeclarationCandidate {
            file,
            path: path.clone(),
        };
        if declaration.kind == SourceDeclarationKind::TypeAlias {
            state.type_aliases.entry(class_id.clone()).or_default().push(candidate);
            indexed.type_aliases.push(class_id);
            return;
        }
        state.classes.entry(class_id.clone()).or_default().push(candidate);
        indexed.classes.push(class_id.clone());

        for (index, member) in declaration.members.iter().enumerate() {
            if member.kind.is_class_like() {
                let mut member_path = path.clone();
                member_path.push(index as u32);
                let nested = class_id.create_nested(Name::identifier(&member.name));
                Self::index_class_like(state, indexed, file, nested, member_path, member);
            }
        }
    }

    pub fn remove_file(&self, file: FileId) {
        let mut state = self.state.write();
        Self::remove_locked(&mut state, file);
    }

    fn remove_locked(state: &mut IndexState, file: FileId) {
        let Some(previous) = state.files.shift_remove(&file) else {
            return;
        };
        for class_id in &previous.classes {
            if let Some(candidates) = state.classes.get_mut(class_id) {
                candidates.retain(|c| c.file != file);
            }
        }
        for class_id in &previous.type_aliases {
            if let Some(candidates) = state.type_aliases.get_mut(class_id) {
                candidates.retain(|c| c.file != file);
            }
        }
        for name in &previous.callable_names {
            let key = (previous.package.clone(), name.clone());
            if let Some(files) = state.callables.get_mut(&key) {
                files.retain(|f| *f != file);
            }
        }
    }

    fn in_scope(&self, file: FileId, scope: &GlobalSearchScope) -> bool {
        scope.contains_file(file, self.structure.as_ref())
    }

    fn collect_names(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
        select: impl Fn(&IndexedFile) -> &[Name],
    ) -> FxHashSet<Name> {
        let state = self.state.read();
        state
            .files
            .iter()
            .filter(|(file, indexed)| indexed.package == *package && self.in_scope(**file, scope))
            .flat_map(|(_, indexed)| select(indexed).iter().cloned())
            .collect()
    }
}

impl DeclarationProvider for StaticDeclarationIndex {
    fn class_like_declarations(
        &self,
        class_id: &ClassId,
        scope: &GlobalSearchScope,
    ) -> Vec<DeclarationCandidate> {
        IndexQueryCounters::bump(&self.counters.class_like);
        let state = self.state.read();
        let classes = state.classes.get(class_id).into_iter().flatten();
        let aliases = state.type_aliases.get(class_id).into_iter().flatten();
        classes
            .chain(aliases)
            .filter(|candidate| self.in_scope(candidate.file, scope))
            .cloned()
            .collect()
    }

    fn top_level_callable_files(
        &self,
        package: &FqName,
        name: &Name,
        scope: &GlobalSearchScope,
    ) -> Vec<FileId> {
        IndexQueryCounters::bump(&self.counters.callable);
        let state = self.state.read();
        state
            .callables
            .get(&(package.clone(), name.clone()))
            .into_iter()
            .flatten()
            .filter(|file| self.in_scope(**file, scope))
            .copied()
            .collect()
    }

    fn classifier_names_in_package(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
    ) -> Option<FxHashSet<Name>> {
        IndexQueryCounters::bump(&self.counters.names);
        Some(self.collect_names(package, scope, |f| f.classifier_names.as_slice()))
    }

    fn callable_names_in_package(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
    ) -> Option<FxHashSet<Name>> {
        IndexQueryCounters::bump(&self.counters.names);
        Some(self.collect_names(package, scope, |f| f.callable_names.as_slice()))
    }

    fn has_package(&self, package: &FqName, scope: &GlobalSearchScope) -> bool {
        IndexQueryCounters::bump(&self.counters.package);
        if package.is_root() {
            return true;
        }
        let state = self.state.read();
        state
            .files
            .iter()
            .any(|(file, indexed)| {
                indexed.package.starts_with(package) && self.in_scope(*file, scope)
            })
    }
}

/// Java classes registered up front
pub struct StaticJavaClassFinder {
    structure: Arc<dyn ProjectStructureProvider>,
    classes: Vec<JavaClass>,
    queries: AtomicUsize,
}

impl StaticJavaClassFinder {
    pub fn new(structure: Arc<dyn ProjectStructureProvider>, classes: Vec<JavaClass>) -> Self {
        Self {
            structure,
            classes,
            queries: AtomicUsize::new(0),
        }
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn in_scope(&self, class: &JavaClass, scope: &GlobalSearchScope) -> bool {
        match class.source {
            Some(file) => scope.contains_file(file, self.structure.as_ref()),
            None => scope.contains_module(class.module),
        }
    }
}

impl JavaClassFinder for StaticJavaClassFinder {
    fn find_classes(&self, class_id: &ClassId, scope: &GlobalSearchScope) -> Vec<JavaClass> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.classes
            .iter()
            .filter(|class| class.class_id == *class_id && self.in_scope(class, scope))
            .cloned()
            .collect()
    }

    fn class_names_in_package(
        &self,
        package: &FqName,
        scope: &GlobalSearchScope,
    ) -> Option<FxHashSet<Name>> {
        Some(
            self.classes
                .iter()
                .filter(|class| class.class_id.package() == package && self.in_scope(class, scope))
                .map(|class| class.class_id.outermost_class_name().clone())
                .collect(),
        )
    }

    fn has_package(&self, package: &FqName, scope: &GlobalSearchScope) -> bool {
        self.classes
            .iter()
            .any(|class| {
                class.class_id.package().starts_with(package) && self.in_scope(class, scope)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ModuleId;
    use crate::project::module::Module;
    use crate::syntax::SourceDeclaration;

    struct OneModule;

    impl ProjectStructureProvider for OneModule {
        fn module_of_file(&self, file: FileId) -> Option<ModuleId> {
            Some(ModuleId::from_raw(file.as_raw() % 2))
        }

        fn module(&self, _id: ModuleId) -> Option<Arc<Module>> {
            None
        }
    }

    fn index() -> StaticDeclarationIndex {
        let index = StaticDeclarationIndex::new(Arc::new(OneModule));
        index.index_file(
            FileId::from_raw(0),
            &SourceFile::new("Box.kt", "lib")
                .with_declaration(
                    SourceDeclaration::class("Box").with_member(SourceDeclaration::class("Inner")),
                )
                .with_declaration(SourceDeclaration::function("foo"))
                .with_declaration(SourceDeclaration::type_alias("Alias", "Box")),
        );
        index.index_file(
            FileId::from_raw(1),
            &SourceFile::new("Other.kt", "lib")
                .with_declaration(SourceDeclaration::class("Box"))
                .with_declaration(SourceDeclaration::property("foo")),
        );
        index
    }

    #[test]
    fn test_class_candidates_respect_scope() {
        let index = index();
        let box_id = ClassId::from_string("lib/Box");
        let all = index.class_like_declarations(&box_id, &GlobalSearchScope::Everything);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].file, FileId::from_raw(0));

        let odd_module = GlobalSearchScope::Module(ModuleId::from_raw(1));
        let only_odd = index.class_like_declarations(&box_id, &odd_module);
        assert_eq!(only_odd.len(), 1);
        assert_eq!(only_odd[0].file, FileId::from_raw(1));

        let nested = index.class_like_declarations(
            &ClassId::from_string("lib/Box.Inner"),
            &GlobalSearchScope::Everything,
        );
        assert_eq!(nested[0].path.as_slice(), &[0, 0]);

        let alias = index.class_like_declarations(
            &ClassId::from_string("lib/Alias"),
            &GlobalSearchScope::Everything,
        );
        assert_eq!(alias[0].path.as_slice(), &[2]);
        assert_eq!(index.counters().class_like, 4);
    }

    #[test]
    fn test_callables_and_names() {
        let index = index();
        let package = FqName::from_dotted("lib");
        let files = index.top_level_callable_files(
            &package,
            &Name::identifier("foo"),
            &GlobalSearchScope::Everything,
        );
        assert_eq!(files, vec![FileId::from_raw(0), FileId::from_raw(1)]);

        let even_module = GlobalSearchScope::Module(ModuleId::from_raw(0));
        let names = index
            .classifier_names_in_package(&package, &even_module)
            .unwrap();
        assert!(names.contains(&Name::identifier("Box")));
        assert!(names.contains(&Name::identifier("Alias")));
        assert!(!names.contains(&Name::identifier("Inner")));

        assert!(index.has_package(&FqName::from_dotted("lib"), &GlobalSearchScope::Everything));
        assert!(!index.has_package(&FqName::from_dotted("app"), &GlobalSearchScope::Everything));
    }

    #[test]
    fn test_reindex_replaces_previous_content() {
        let index = index();
        index.index_file(FileId::from_raw(1), &SourceFile::new("Other.kt", "lib"));
        let box_id = ClassId::from_string("lib/Box");
        assert_eq!(index.class_like_declarations(&box_id, &GlobalSearchScope::Everything).len(), 1);
        let files = index.top_level_callable_files(
            &FqName::from_dotted("lib"),
            &Name::identifier("foo"),
            &GlobalSearchScope::Everything,
        );
        assert_eq!(files, vec![FileId::from_raw(0)]);
    }
}
