//! Generated Member Scopes
//!
//! Scopes over the members declaration generation extensions contribute to a
//! class. Generation runs lazily, per name, and its results are cached per
//! class in [`GeneratedMemberDeclarationsCache`]. Cache keys include the scope
//! instance that asked, so two scope instances never share generated
//! declarations while repeated queries through one instance return the same
//! `Arc`s.

use crate::caches::MemoMap;
use crate::error::{ResolveError, ResolveResult};
use crate::extensions::{stamp_generated, DeclarationGenerationExtension, ExtensionRegistry};
use crate::ids::{next_scope_instance_id, DeclarationId, ScopeInstanceId};
use crate::ir::render::render_declaration;
use crate::ir::{Declaration, DeclarationKind};
use crate::names::{CallableId, ClassId, Name};
use indexmap::IndexMap;
use log::trace;
use std::sync::Arc;

pub type Generated = Arc<[Arc<Declaration>]>;

type ExtensionsByName = IndexMap<Name, Vec<Arc<dyn DeclarationGenerationExtension>>>;

/// Per-class caches of generated declarations
#[derive(Default)]
pub struct ClassGeneratedCache {
    functions: MemoMap<(ScopeInstanceId, Name), Generated>,
    properties: MemoMap<(ScopeInstanceId, Name), Generated>,
    constructors: MemoMap<ScopeInstanceId, Generated>,
    classifiers: MemoMap<(ScopeInstanceId, Name), Option<Arc<Declaration>>>,
}

/// Generated declarations of every class, keyed by class declaration
#[derive(Default)]
pub struct GeneratedMemberDeclarationsCache {
    by_class: MemoMap<DeclarationId, Arc<ClassGeneratedCache>>,
}

impl GeneratedMemberDeclarationsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_class(&self, owner: &Declaration) -> Arc<ClassGeneratedCache> {
        self.by_class.get_or_compute(&owner.id, || Arc::new(ClassGeneratedCache::default()))
    }

    /// Number of classes that have a cache
    pub fn class_count(&self) -> usize {
        self.by_class.len()
    }
}

fn group_by_name(
    extensions: Vec<Arc<dyn DeclarationGenerationExtension>>,
    names_of: impl Fn(&dyn DeclarationGenerationExtension) -> Vec<Name>,
) -> ExtensionsByName {
    let mut grouped: ExtensionsByName = IndexMap::new();
    for extension in extensions {
        for name in names_of(extension.as_ref()) {
            let entry = grouped.entry(name).or_default();
            if !entry.iter().any(|e| Arc::ptr_eq(e, &extension)) {
                entry.push(extension.clone());
            }
        }
    }
    grouped
}

fn owner_class_id(owner: &Declaration) -> ResolveResult<ClassId> {
    owner.class_id.clone().ok_or_else(|| ResolveError::InvalidGeneratedDeclaration {
        extension: "<scope>".to_string(),
        message: format!("{} is not a class", owner.qualified_name()),
    })
}

/// Callables generated for one class
pub struct GeneratedClassDeclaredMemberScope {
    id: ScopeInstanceId,
    owner: Arc<Declaration>,
    owner_id: ClassId,
    extensions_by_name: ExtensionsByName,
    cache: Arc<ClassGeneratedCache>,
}

impl GeneratedClassDeclaredMemberScope {
    /// `None` when no extension generates callables for the class
    pub fn create(
        owner: &Arc<Declaration>,
        extensions: &ExtensionRegistry,
        caches: &GeneratedMemberDeclarationsCache,
    ) -> Option<Self> {
        let owner_id = owner.class_id.clone()?;
        let extensions_by_name = group_by_name(extensions.extensions_for_class(owner), |e| {
            e.callable_names_for_class(owner)
        });
        if extensions_by_name.is_empty() {
            return None;
        }
        Some(Self {
            id: next_scope_instance_id(),
            owner: owner.clone(),
            owner_id,
            extensions_by_name,
            cache: caches.for_class(owner),
        })
    }

    pub fn id(&self) -> ScopeInstanceId {
        self.id
    }

    pub fn callable_names(&self) -> impl Iterator<Item = &Name> {
        self.extensions_by_name.keys()
    }

    pub fn functions(&self, name: &Name) -> ResolveResult<Generated> {
        if !self.extensions_by_name.contains_key(name) {
            return Ok(Arc::from(Vec::new()));
        }
        self.cache
            .functions
            .get_or_try_compute(&(self.id, name.clone()), || {
                self.generate(name, DeclarationKind::Function)
            })
    }

    pub fn properties(&self, name: &Name) -> ResolveResult<Generated> {
        if !self.extensions_by_name.contains_key(name) {
            return Ok(Arc::from(Vec::new()));
        }
        self.cache
            .properties
            .get_or_try_compute(&(self.id, name.clone()), || {
                self.generate(name, DeclarationKind::Property)
            })
    }

    pub fn constructors(&self) -> ResolveResult<Generated> {
        self.cache
            .constructors
            .get_or_try_compute(&self.id, || self.generate_constructors())
    }

    fn generate(&self, name: &Name, kind: DeclarationKind) -> ResolveResult<Generated> {
        if name.is_init() {
            return Ok(Arc::from(Vec::new()));
        }
        let callable_id = CallableId::member(&self.owner_id, name.clone());
        let mut generated = Vec::new();
        for extension in self.extensions_by_name.get(name).into_iter().flatten() {
            let produced = match kind {
                DeclarationKind::Function => {
                    extension.generate_functions(&callable_id, &self.owner)
                }
                _ => extension.generate_properties(&callable_id, &self.owner),
            };
            for declaration in produced {
                self.validate(extension.name(), &declaration, kind, Some(name))?;
                let declaration = stamp_generated(declaration, extension.name(), &self.owner);
                generated.push(Arc::new(declaration));
            }
        }
        trace!(
            "Generated {} {:?} members named {} for {}",
            generated.len(),
            kind,
            name,
            self.owner_id
        );
        Ok(generated.into())
    }

    fn generate_constructors(&self) -> ResolveResult<Generated> {
        let mut generated = Vec::new();
        for extension in self.extensions_by_name.get(&Name::init()).into_iter().flatten() {
            for declaration in extension.generate_constructors(&self.owner) {
                self.validate(extension.name(), &declaration, DeclarationKind::Constructor, None)?;
                let declaration = stamp_generated(declaration, extension.name(), &self.owner);
                generated.push(Arc::new(declaration));
            }
        }
        Ok(generated.into())
    }

    fn validate(
        &self,
        extension: &str,
        declaration: &Declaration,
        kind: DeclarationKind,
        name: Option<&Name>,
    ) -> ResolveResult<()> {
        let invalid = |message: String| ResolveError::InvalidGeneratedDeclaration {
            extension: extension.to_string(),
            message,
        };
        if declaration.kind != kind {
            return Err(invalid(format!(
                "expected a {} for {}, got {}",
                kind.keyword(),
                self.owner_id,
                render_declaration(declaration).trim_end()
            )));
        }
        if let Some(name) = name {
            if declaration.name != *name {
                return Err(invalid(format!("asked for {}, generated {}", name, declaration.name)));
            }
        }
        if declaration.containing_class.as_ref() != Some(&self.owner_id) {
            return Err(invalid(format!(
                "{} is not a member of {}",
                declaration.qualified_name(),
                self.owner_id
            )));
        }
        Ok(())
    }
}

/// Nested classes generated for one class
pub struct GeneratedClassNestedClassifierScope {
    id: ScopeInstanceId,
    owner: Arc<Declaration>,
    owner_id: ClassId,
    extensions_by_name: ExtensionsByName,
    cache: Arc<ClassGeneratedCache>,
}

impl GeneratedClassNestedClassifierScope {
    /// `None` when no extension generates nested classes for the class
    pub fn create(
        owner: &Arc<Declaration>,
        extensions: &ExtensionRegistry,
        caches: &GeneratedMemberDeclarationsCache,
    ) -> Option<Self> {
        let owner_id = owner.class_id.clone()?;
        let extensions_by_name = group_by_name(extensions.extensions_for_class(owner), |e| {
            e.nested_classifier_names(owner)
        });
        if extensions_by_name.is_empty() {
            return None;
        }
        Some(Self {
            id: next_scope_instance_id(),
            owner: owner.clone(),
            owner_id,
            extensions_by_name,
            cache: caches.for_class(owner),
        })
    }

    pub fn id(&self) -> ScopeInstanceId {
        self.id
    }

    pub fn classifier_names(&self) -> impl Iterator<Item = &Name> {
        self.extensions_by_name.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions_by_name.is_empty()
    }

    pub fn nested_classifier(&self, name: &Name) -> ResolveResult<Option<Arc<Declaration>>> {
        self.cache
            .classifiers
            .get_or_try_compute(&(self.id, name.clone()), || self.generate(name))
    }

    fn generate(&self, name: &Name) -> ResolveResult<Option<Arc<Declaration>>> {
        if let Some(companion) = self.owner.generated_companion() {
            if companion.name == *name {
                return Ok(Some(companion));
            }
        }
        let Some(extensions) = self.extensions_by_name.get(name) else {
            return Ok(None);
        };

        let mut generated: Vec<(String, Declaration)> = Vec::new();
        for extension in extensions {
            if let Some(declaration) = extension.generate_nested_class_like(&self.owner, name) {
                generated.push((extension.name().to_string(), declaration));
            }
        }

        let (extension, declaration) = match generated.len() {
            0 => return Ok(None),
            1 => generated.remove(0),
            _ => {
                return Err(ResolveError::ConflictingGeneratedNestedClass {
                    owner: self.owner_id.clone(),
                    name: name.clone(),
                    declarations: generated
                        .iter()
                        .map(|(_, d)| render_declaration(d).trim_end().to_string())
                        .collect(),
                })
            }
        };

        if !declaration.kind.is_regular_class() {
            return Err(ResolveError::InvalidGeneratedDeclaration {
                extension,
                message: format!(
                    "Only regular classes are allowed as nested classes, got {}",
                    render_declaration(&declaration).trim_end()
                ),
            });
        }
        let expected = self.owner_id.create_nested(name.clone());
        if declaration.class_id.as_ref() != Some(&expected) {
            return Err(ResolveError::InvalidGeneratedDeclaration {
                extension,
                message: format!(
                    "nested class {} must have class ID {}",
                    declaration.qualified_name(),
                    expected
                ),
            });
        }
        Ok(Some(Arc::new(stamp_generated(declaration, &extension, &self.owner))))
    }
}

/// Companion object an extension generates for `owner`
///
/// More than one extension producing a companion is a conflict.
pub fn generate_companion(
    owner: &Declaration,
    extensions: &ExtensionRegistry,
) -> ResolveResult<Option<Arc<Declaration>>> {
    let owner_id = owner_class_id(owner)?;
    let mut generated: Vec<(String, Declaration)> = extensions
        .extensions_for_class(owner)
        .iter()
        .filter_map(|e| e.generate_companion(owner).map(|d| (e.name().to_string(), d)))
        .collect();
    match generated.len() {
        0 => Ok(None),
        1 => {
            let (extension, mut companion) = generated.remove(0);
            if companion.kind != DeclarationKind::Object {
                return Err(ResolveError::InvalidGeneratedDeclaration {
                    extension,
                    message: format!("companion of {} must be an object", owner_id),
                });
            }
            companion.is_companion = true;
            Ok(Some(Arc::new(stamp_generated(companion, &extension, owner))))
        }
        _ => {
            let name = generated[0].1.name.clone();
            Err(ResolveError::ConflictingGeneratedNestedClass {
                owner: owner_id,
                name,
                declarations: generated
                    .iter()
                    .map(|(_, d)| render_declaration(d).trim_end().to_string())
                    .collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ModuleId;
    use crate::ir::{DeclarationOrigin, IrTypeRef};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Builder {
        calls: Arc<AtomicUsize>,
    }

    impl DeclarationGenerationExtension for Builder {
        fn name(&self) -> &str {
            "builder"
        }

        fn callable_names_for_class(&self, _owner: &Declaration) -> Vec<Name> {
            vec![Name::identifier("build"), Name::init()]
        }

        fn nested_classifier_names(&self, _owner: &Declaration) -> Vec<Name> {
            vec![Name::identifier("Builder")]
        }

        fn generate_functions(
            &self,
            callable_id: &CallableId,
            _owner: &Declaration,
        ) -> Vec<Declaration> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            vec![Declaration::callable(
                DeclarationKind::Function,
                callable_id,
                DeclarationOrigin::Source,
                ModuleId::invalid(),
            )
            .with_type(IrTypeRef::written("Int"))]
        }

        fn generate_constructors(&self, owner: &Declaration) -> Vec<Declaration> {
            let owner_id = owner.class_id.clone().unwrap_or_else(|| ClassId::from_string("x/X"));
            vec![Declaration::callable(
                DeclarationKind::Constructor,
                &CallableId::member(&owner_id, Name::init()),
                DeclarationOrigin::Source,
                ModuleId::invalid(),
            )]
        }

        fn generate_nested_class_like(
            &self,
            owner: &Declaration,
            name: &Name,
        ) -> Option<Declaration> {
            let owner_id = owner.class_id.as_ref()?;
            Some(Declaration::class_like(
                DeclarationKind::Class,
                owner_id.create_nested(name.clone()),
                DeclarationOrigin::Source,
                ModuleId::invalid(),
            ))
        }
    }

    fn host() -> Arc<Declaration> {
        Arc::new(Declaration::class_like(
            DeclarationKind::Class,
            ClassId::from_string("app/Host"),
            DeclarationOrigin::Source,
            ModuleId::from_raw(1),
        ))
    }

    fn registry(calls: Arc<AtomicUsize>) -> ExtensionRegistry {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Builder { calls }));
        registry
    }

    #[test]
    fn test_generated_functions_are_cached_per_scope_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let registry = registry(calls.clone());
        let caches = GeneratedMemberDeclarationsCache::new();
        let owner = host();
        let build = Name::identifier("build");

        let scope = GeneratedClassDeclaredMemberScope::create(&owner, &registry, &caches).unwrap();
        let first = scope.functions(&build).unwrap();
        let second = scope.functions(&build).unwrap();
        assert_eq!(first.len(), 1);
        assert!(Arc::ptr_eq(&first[0], &second[0]));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first[0].module, ModuleId::from_raw(1));

        let other = GeneratedClassDeclaredMemberScope::create(&owner, &registry, &caches).unwrap();
        let third = other.functions(&build).unwrap();
        assert!(!Arc::ptr_eq(&first[0], &third[0]));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(caches.class_count(), 1);
    }

    #[test]
    fn test_init_yields_only_constructors() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let caches = GeneratedMemberDeclarationsCache::new();
        let scope = GeneratedClassDeclaredMemberScope::create(&host(), &registry, &caches).unwrap();
        assert!(scope.functions(&Name::init()).unwrap().is_empty());
        assert!(scope.properties(&Name::init()).unwrap().is_empty());
        assert_eq!(scope.constructors().unwrap().len(), 1);
        assert!(scope.functions(&Name::identifier("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_nested_class_generation() {
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let caches = GeneratedMemberDeclarationsCache::new();
        let owner = host();
        let scope =
            GeneratedClassNestedClassifierScope::create(&owner, &registry, &caches).unwrap();
        let nested = scope.nested_classifier(&Name::identifier("Builder")).unwrap().unwrap();
        assert_eq!(nested.class_id, Some(ClassId::from_string("app/Host.Builder")));
        assert_eq!(nested.origin.generated_by(), Some("builder"));
        assert!(scope.nested_classifier(&Name::identifier("Other")).unwrap().is_none());
    }
}
