//! Declaration Generation Extensions
//!
//! Extensions contribute members to classes that don't exist in source:
//! functions, properties, constructors, nested classes and companion objects.
//! They are consulted lazily, per class and per name, through the generated
//! member scopes in [`crate::scopes::generated_members`].
//!
//! ```rust,ignore
//! let mut registry = ExtensionRegistry::new();
//! registry.register(Box::new(BuilderGenerator));
//! let for_class = registry.extensions_for_class(&owner);
//! ```
//!
//! Extensions return plain [`Declaration`]s; the engine stamps them with the
//! generating extension, the owner's module and the `BODY_RESOLVE` phase.

use crate::ir::{Declaration, DeclarationOrigin, IrTypeRef, ResolvePhase, ResolvedType};
use crate::names::{CallableId, Name};
use std::sync::Arc;

/// Contributes generated declarations to classes
///
/// Every method has an empty default so an extension only implements what it
/// generates. Names returned by [`Self::callable_names_for_class`] may include
/// `<init>` to announce constructors.
pub trait DeclarationGenerationExtension: Send + Sync {
    /// Unique name, recorded as the origin of everything the extension generates
    fn name(&self) -> &str;

    fn callable_names_for_class(&self, _owner: &Declaration) -> Vec<Name> {
        Vec::new()
    }

    fn nested_classifier_names(&self, _owner: &Declaration) -> Vec<Name> {
        Vec::new()
    }

    fn generate_functions(
        &self,
        _callable_id: &CallableId,
        _owner: &Declaration,
    ) -> Vec<Declaration> {
        Vec::new()
    }

    fn generate_properties(
        &self,
        _callable_id: &CallableId,
        _owner: &Declaration,
    ) -> Vec<Declaration> {
        Vec::new()
    }

    fn generate_constructors(&self, _owner: &Declaration) -> Vec<Declaration> {
        Vec::new()
    }

    fn generate_nested_class_like(
        &self,
        _owner: &Declaration,
        _name: &Name,
    ) -> Option<Declaration> {
        None
    }

    /// Companion object for a class that doesn't declare one
    fn generate_companion(&self, _owner: &Declaration) -> Option<Declaration> {
        None
    }
}

/// Registered extensions, in registration order
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn DeclarationGenerationExtension>>,
}

impl ExtensionRegistry {
    pub fn new() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    pub fn register(&mut self, extension: Box<dyn DeclarationGenerationExtension>) {
        self.extensions.push(Arc::from(extension));
    }

    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<dyn DeclarationGenerationExtension>> {
        self.extensions.iter().find(|e| e.name() == name).cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn DeclarationGenerationExtension>> {
        self.extensions.iter()
    }

    /// Extensions allowed to contribute to `owner`: only the owner generator for
    /// generated classes, every extension otherwise
    pub fn extensions_for_class(
        &self,
        owner: &Declaration,
    ) -> Vec<Arc<dyn DeclarationGenerationExtension>> {
        match owner.origin.generated_by() {
            Some(generator) => self.by_name(generator).into_iter().collect(),
            None => self.extensions.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Mark `declaration` (and its members and parameters) as produced by `extension`
/// for a class of `owner`'s module
pub fn stamp_generated(
    mut declaration: Declaration,
    extension: &str,
    owner: &Declaration,
) -> Declaration {
    declaration.origin = DeclarationOrigin::Generated {
        extension: extension.to_string(),
    };
    declaration.module = owner.module;
    declaration.file = None;
    if !declaration.type_ref.is_resolved() {
        let resolved = match &declaration.type_ref.written {
            Some(written) => ResolvedType::builtin_named(written).unwrap_or_else(|| {
                ResolvedType::Error(format!("unresolved generated type {}", written))
            }),
            None if declaration.kind.is_callable() => ResolvedType::unit(),
            None => ResolvedType::Error("implicit generated type".to_string()),
        };
        if declaration.kind.is_callable() || declaration.type_ref.written.is_some() {
            declaration.type_ref = IrTypeRef::resolved_to(resolved);
        }
    }
    declaration.members = std::mem::take(&mut declaration.members)
        .into_iter()
        .map(|member| match Arc::try_unwrap(member) {
            Ok(member) => Arc::new(stamp_generated(member, extension, owner)),
            Err(shared) => shared,
        })
        .collect();
    declaration.at_phase(ResolvePhase::BodyResolve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ModuleId;
    use crate::ir::DeclarationKind;
    use crate::names::ClassId;

    struct Named(&'static str);

    impl DeclarationGenerationExtension for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn class(origin: DeclarationOrigin) -> Declaration {
        Declaration::class_like(
            DeclarationKind::Class,
            ClassId::from_string("app/Host"),
            origin,
            ModuleId::from_raw(3),
        )
    }

    #[test]
    fn test_registry_keeps_registration_order() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Named("first")));
        registry.register(Box::new(Named("second")));
        assert_eq!(registry.names(), vec!["first", "second"]);
        assert_eq!(registry.len(), 2);
        assert!(registry.by_name("second").is_some());
        assert!(registry.by_name("third").is_none());
    }

    #[test]
    fn test_generated_class_only_sees_owner_generator() {
        let mut registry = ExtensionRegistry::new();
        registry.register(Box::new(Named("first")));
        registry.register(Box::new(Named("second")));
        let source = class(DeclarationOrigin::Source);
        assert_eq!(registry.extensions_for_class(&source).len(), 2);

        let generated = class(DeclarationOrigin::Generated {
            extension: "second".to_string(),
        });
        let owners: Vec<String> = registry
            .extensions_for_class(&generated)
            .iter()
            .map(|e| e.name().to_string())
            .collect();
        assert_eq!(owners, vec!["second"]);
    }

    #[test]
    fn test_stamp_generated() {
        let owner = class(DeclarationOrigin::Source);
        let function = Declaration::callable(
            DeclarationKind::Function,
            &CallableId::member(&ClassId::from_string("app/Host"), Name::identifier("build")),
            DeclarationOrigin::Source,
            ModuleId::from_raw(0),
        )
        .with_type(IrTypeRef::written("String"));
        let stamped = stamp_generated(function, "builder", &owner);
        assert_eq!(stamped.origin.generated_by(), Some("builder"));
        assert_eq!(stamped.module, ModuleId::from_raw(3));
        assert_eq!(stamped.phase(), ResolvePhase::BodyResolve);
        assert_eq!(stamped.type_ref.resolved(), Some(ResolvedType::builtin("String")));
    }
}
