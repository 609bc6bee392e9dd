//! Project Model
//!
//! A [`Project`] bundles everything a resolution engine consumes from the
//! outside world: module structure, source files, the declaration index, the
//! Java class finder, generation extensions and configuration.
//!
//! ```rust,ignore
//! let project = ProjectBuilder::new()
//!     .module(ModuleSpec::library("lib"))
//!     .module(ModuleSpec::source("app").depends("lib"))
//!     .source_file("lib", SourceFile::new("Box.kt", "lib").with_declaration(...))
//!     .build()?;
//! ```

pub mod graph;
pub mod index;
pub mod manifest;
pub mod module;
pub mod services;
pub mod structure;
pub mod tracker;

use crate::config::ResolveConfig;
use crate::error::{ResolveError, ResolveResult};
use crate::extensions::{DeclarationGenerationExtension, ExtensionRegistry};
use crate::ids::FileId;
use crate::syntax::{SourceFile, SourceStore};
use crate::scopes::search_scope::{GlobalSearchScopeFactory, UnionSearchScopeFactory};
use index::{StaticDeclarationIndex, StaticJavaClassFinder};
use log::info;
use manifest::ProjectManifest;
use module::ModuleSpec;
use services::{DeclarationProvider, JavaClass, JavaClassFinder, ProjectStructureProvider};
use std::sync::Arc;
use structure::ProjectStructure;
use tracker::SimpleModificationTracker;

pub struct Project {
    pub structure: Arc<ProjectStructure>,
    pub sources: Arc<SourceStore>,
    pub index: Arc<StaticDeclarationIndex>,
    pub java_classes: Arc<StaticJavaClassFinder>,
    pub tracker: Arc<SimpleModificationTracker>,
    pub extensions: Arc<ExtensionRegistry>,
    pub search_scopes: Arc<dyn GlobalSearchScopeFactory>,
    pub config: ResolveConfig,
}

impl Project {
    pub fn declaration_provider(&self) -> Arc<dyn DeclarationProvider> {
        self.index.clone()
    }

    pub fn java_class_finder(&self) -> Arc<dyn JavaClassFinder> {
        self.java_classes.clone()
    }

    pub fn structure_provider(&self) -> Arc<dyn ProjectStructureProvider> {
        self.structure.clone()
    }

    /// Replace a source file; every session built so far becomes stale
    pub fn update_file(&self, file: FileId, content: SourceFile) -> ResolveResult<()> {
        if self.sources.get(file).is_none() {
            return Err(ResolveError::UnknownFile { file });
        }
        self.index.index_file(file, &content);
        self.sources.update_file(file, content);
        Ok(())
    }

    /// Look up a file by module name and file name
    pub fn file_id(&self, module: &str, name: &str) -> Option<FileId> {
        let module = self.structure.module_by_name(module).ok()?;
        self.structure
            .files_of(module.id)
            .into_iter()
            .find(|file| self.sources.get(*file).map_or(false, |f| f.name == name))
    }
}

enum PendingJavaClass {
    Binary(String, JavaClass),
    Source(String, JavaClass),
}

pub struct ProjectBuilder {
    modules: Vec<ModuleSpec>,
    files: Vec<(String, SourceFile)>,
    java_classes: Vec<PendingJavaClass>,
    extensions: ExtensionRegistry,
    search_scopes: Arc<dyn GlobalSearchScopeFactory>,
    config: ResolveConfig,
}

impl ProjectBuilder {
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            files: Vec::new(),
            java_classes: Vec::new(),
            extensions: ExtensionRegistry::new(),
            search_scopes: Arc::new(UnionSearchScopeFactory),
            config: ResolveConfig::from_env(),
        }
    }

    /// Modules and settings from a manifest; every listed file is read through `load`
    pub fn from_manifest(
        manifest: &ProjectManifest,
        mut load: impl FnMut(&str) -> ResolveResult<SourceFile>,
    ) -> ResolveResult<Self> {
        let mut builder = Self::new();
        manifest.apply_to(&mut builder.config);
        for spec in manifest.module_specs() {
            builder = builder.module(spec);
        }
        for module in &manifest.modules {
            for path in &module.files {
                let file = load(path)?;
                builder = builder.source_file(&module.name, file);
            }
        }
        Ok(builder)
    }

    pub fn module(mut self, spec: ModuleSpec) -> Self {
        self.modules.push(spec);
        self
    }

    pub fn source_file(mut self, module: &str, file: SourceFile) -> Self {
        self.files.push((module.to_string(), file));
        self
    }

    /// Java class from a binary (no source file)
    pub fn java_class(mut self, module: &str, class: JavaClass) -> Self {
        self.java_classes
            .push(PendingJavaClass::Binary(module.to_string(), class));
        self
    }

    /// Java class declared in a Java source file of `module`
    pub fn java_source_class(mut self, module: &str, class: JavaClass) -> Self {
        self.java_classes
            .push(PendingJavaClass::Source(module.to_string(), class));
        self
    }

    pub fn extension(mut self, extension: Box<dyn DeclarationGenerationExtension>) -> Self {
        self.extensions.register(extension);
        self
    }

    pub fn search_scope_factory(mut self, factory: Arc<dyn GlobalSearchScopeFactory>) -> Self {
        self.search_scopes = factory;
        self
    }

    pub fn config(mut self, config: ResolveConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> ResolveResult<Project> {
        let structure = Arc::new(ProjectStructure::from_specs(&self.modules)?);
        let tracker = Arc::new(SimpleModificationTracker::new());
        let sources = Arc::new(SourceStore::new(tracker.clone()));
        let index = Arc::new(StaticDeclarationIndex::new(structure.clone()));

        for (module_name, file) in self.files {
            let module = structure.module_by_name(&module_name)?;
            let id = sources.reserve_file_id();
            index.index_file(id, &file);
            structure.assign_file(id, module.id);
            sources.insert_reserved(id, file);
        }

        let mut java_classes = Vec::with_capacity(self.java_classes.len());
        for pending in self.java_classes {
            let (module_name, mut class, with_source) = match pending {
                PendingJavaClass::Binary(module, class) => (module, class, false),
                PendingJavaClass::Source(module, class) => (module, class, true),
            };
            let module = structure.module_by_name(&module_name)?;
            class.module = module.id;
            if with_source {
                let file = sources.reserve_file_id();
                structure.assign_file(file, module.id);
                class.source = Some(file);
            }
            java_classes.push(class);
        }
        let java_classes = Arc::new(StaticJavaClassFinder::new(structure.clone(), java_classes));

        info!(
            "Project loaded: {} modules, {} source files, {} extensions",
            structure.modules().count(),
            sources.len(),
            self.extensions.len()
        );

        Ok(Project {
            structure,
            sources,
            index,
            java_classes,
            tracker,
            extensions: Arc::new(self.extensions),
            search_scopes: self.search_scopes,
            config: self.config,
        })
    }
}

impl Default for ProjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::SourceDeclaration;

    #[test]
    fn test_build_assigns_files_to_modules() {
        let project = ProjectBuilder::new()
            .module(ModuleSpec::library("lib"))
            .module(ModuleSpec::source("app").depends("lib"))
            .source_file(
                "lib",
                SourceFile::new("Box.kt", "lib").with_declaration(SourceDeclaration::class("Box")),
            )
            .source_file("app", SourceFile::new("Main.kt", "app"))
            .java_source_class(
                "lib",
                JavaClass::new(crate::names::ClassId::from_string("lib/JBox")),
            )
            .build()
            .unwrap();

        let lib = project.structure.module_by_name("lib").unwrap();
        let box_file = project.file_id("lib", "Box.kt").unwrap();
        assert_eq!(project.structure.module_of_file(box_file), Some(lib.id));
        assert!(project.file_id("app", "Box.kt").is_none());
        assert_eq!(project.structure.files_of(lib.id).len(), 2);
    }

    #[test]
    fn test_from_manifest_loads_listed_files() {
        let manifest = manifest::parse_manifest(
            r#"
[[module]]
name = "app"
files = ["Main.kt"]

[resolve]
resolve-local-declarations = false
"#,
        )
        .unwrap();
        let mut requested = Vec::new();
        let project = ProjectBuilder::from_manifest(&manifest, |path| {
            requested.push(path.to_string());
            Ok(SourceFile::new(path, "app"))
        })
        .unwrap()
        .build()
        .unwrap();
        assert_eq!(requested, vec!["Main.kt"]);
        assert!(!project.config.resolve_local_declarations);
        assert!(project.file_id("app", "Main.kt").is_some());
    }

    #[test]
    fn test_update_unknown_file() {
        let project = ProjectBuilder::new()
            .module(ModuleSpec::source("app"))
            .build()
            .unwrap();
        let result = project.update_file(FileId::from_raw(42), SourceFile::new("x.kt", "app"));
        assert!(matches!(result, Err(ResolveError::UnknownFile { .. })));
    }
}
