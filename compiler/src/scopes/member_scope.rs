//! Declared plus generated members of one class

use super::generated_members::{
    GeneratedClassDeclaredMemberScope, GeneratedClassNestedClassifierScope,
    GeneratedMemberDeclarationsCache,
};
use crate::error::ResolveResult;
use crate::extensions::ExtensionRegistry;
use crate::ir::{Declaration, DeclarationKind};
use crate::names::Name;
use indexmap::IndexSet;
use std::sync::Arc;

pub struct ClassMemberScope {
    owner: Arc<Declaration>,
    generated: Option<GeneratedClassDeclaredMemberScope>,
    nested: Option<GeneratedClassNestedClassifierScope>,
}

impl ClassMemberScope {
    pub fn new(
        owner: Arc<Declaration>,
        extensions: &ExtensionRegistry,
        caches: &GeneratedMemberDeclarationsCache,
    ) -> Self {
        let generated = GeneratedClassDeclaredMemberScope::create(&owner, extensions, caches);
        let nested = GeneratedClassNestedClassifierScope::create(&owner, extensions, caches);
        Self {
            owner,
            generated,
            nested,
        }
    }

    pub fn owner(&self) -> &Arc<Declaration> {
        &self.owner
    }

    /// Functions and properties named `name`, declared ones first
    pub fn callables(&self, name: &Name) -> ResolveResult<Vec<Arc<Declaration>>> {
        let mut found: Vec<Arc<Declaration>> = self
            .owner
            .members
            .iter()
            .filter(|m| {
                matches!(m.kind, DeclarationKind::Function | DeclarationKind::Property)
                    && m.name == *name
            })
            .cloned()
            .collect();
        if let Some(generated) = &self.generated {
            found.extend(generated.functions(name)?.iter().cloned());
            found.extend(generated.properties(name)?.iter().cloned());
        }
        Ok(found)
    }

    pub fn constructors(&self) -> ResolveResult<Vec<Arc<Declaration>>> {
        let mut found: Vec<Arc<Declaration>> = self
            .owner
            .members
            .iter()
            .filter(|m| m.kind == DeclarationKind::Constructor)
            .cloned()
            .collect();
        if let Some(generated) = &self.generated {
            found.extend(generated.constructors()?.iter().cloned());
        }
        Ok(found)
    }

    /// Nested class-like declaration: declared, then the generated companion,
    /// then generated nested classes
    pub fn classifier(&self, name: &Name) -> ResolveResult<Option<Arc<Declaration>>> {
        if let Some(declared) = self
            .owner
            .members
            .iter()
            .find(|m| m.kind.is_class_like() && m.name == *name)
        {
            return Ok(Some(declared.clone()));
        }
        if let Some(companion) = self.owner.generated_companion() {
            if companion.name == *name {
                return Ok(Some(companion));
            }
        }
        match &self.nested {
            Some(nested) => nested.nested_classifier(name),
            None => Ok(None),
        }
    }

    pub fn callable_names(&self) -> Vec<Name> {
        let mut names: IndexSet<Name> = self
            .owner
            .members
            .iter()
            .filter(|m| m.kind.is_callable())
            .map(|m| m.name.clone())
            .collect();
        if let Some(generated) = &self.generated {
            names.extend(generated.callable_names().cloned());
        }
        names.into_iter().collect()
    }

    pub fn classifier_names(&self) -> Vec<Name> {
        let mut names: IndexSet<Name> = self
            .owner
            .members
            .iter()
            .filter(|m| m.kind.is_class_like())
            .map(|m| m.name.clone())
            .collect();
        if let Some(companion) = self.owner.generated_companion() {
            names.insert(companion.name.clone());
        }
        if let Some(nested) = &self.nested {
            names.extend(nested.classifier_names().cloned());
        }
        names.into_iter().collect()
    }
}
