//! Java classes of one module, converted to IR on demand

use super::symbols::ClassLikeSymbol;
use crate::caches::{MemoMap, NameSet};
use crate::ir::{
    Declaration, DeclarationKind, DeclarationOrigin, IrTypeRef, ResolvePhase, ResolvedType,
};
use crate::names::{CallableId, ClassId, FqName, Name};
use crate::project::module::Module;
use crate::project::services::{JavaClass, JavaClassFinder, JavaClassKind, JavaMemberKind};
use crate::scopes::GlobalSearchScope;
use std::sync::Arc;

pub struct JavaSymbolProvider {
    module: Arc<Module>,
    finder: Arc<dyn JavaClassFinder>,
    scope: GlobalSearchScope,
    classes: MemoMap<ClassId, Option<ClassLikeSymbol>>,
}

impl JavaSymbolProvider {
    pub fn new(module: Arc<Module>, finder: Arc<dyn JavaClassFinder>) -> Self {
        let scope = module.content_scope();
        Self {
            module,
            finder,
            scope,
            classes: MemoMap::new(),
        }
    }

    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        if let Some(known) = self.classes.get(class_id) {
            return known;
        }
        let found = self
            .finder
            .find_classes(class_id, &self.scope)
            .into_iter()
            .find(|class| !class.has_metadata_annotation)?;
        self.symbol_for_java_class(&found)
    }

    /// Symbol for a class the finder already located; one instance per class ID
    pub fn symbol_for_java_class(&self, class: &JavaClass) -> Option<ClassLikeSymbol> {
        self.classes.get_or_compute(&class.class_id, || {
            ClassLikeSymbol::new(Arc::new(self.convert(class)))
        })
    }

    fn convert(&self, class: &JavaClass) -> Declaration {
        let kind = match class.kind {
            JavaClassKind::Class => DeclarationKind::Class,
            JavaClassKind::Interface => DeclarationKind::Interface,
        };
        let mut declaration = Declaration::class_like(
            kind,
            class.class_id.clone(),
            DeclarationOrigin::Java,
            self.module.id,
        )
        .with_visibility(class.visibility);
        declaration.file = class.source;
        declaration.supertypes = class
            .supertypes
            .iter()
            .map(|supertype| IrTypeRef::resolved_to(ResolvedType::Class(supertype.clone())))
            .collect();
        for member in &class.members {
            let kind = match member.kind {
                JavaMemberKind::Method => DeclarationKind::Function,
                JavaMemberKind::Field => DeclarationKind::Property,
            };
            let callable_id = CallableId::member(&class.class_id, member.name.clone());
            let converted =
                Declaration::callable(kind, &callable_id, DeclarationOrigin::Java, self.module.id)
                    .with_visibility(member.visibility)
                    .with_type(IrTypeRef::resolved_to(java_type(&member.type_ref)))
                    .at_phase(ResolvePhase::BodyResolve);
            declaration = declaration.with_member(converted);
        }
        declaration.at_phase(ResolvePhase::BodyResolve)
    }

    pub fn package(&self, package: &FqName) -> Option<FqName> {
        self.finder
            .has_package(package, &self.scope)
            .then(|| package.clone())
    }

    pub fn known_classifier_names(&self, package: &FqName) -> Option<NameSet> {
        self.finder
            .class_names_in_package(package, &self.scope)
            .map(Arc::new)
    }
}

/// Java type text mapped onto IR types
fn java_type(written: &str) -> ResolvedType {
    match written {
        "void" => ResolvedType::unit(),
        "int" | "java.lang.Integer" => ResolvedType::builtin("Int"),
        "long" | "java.lang.Long" => ResolvedType::builtin("Long"),
        "boolean" | "java.lang.Boolean" => ResolvedType::builtin("Boolean"),
        "double" | "java.lang.Double" => ResolvedType::builtin("Double"),
        "String" | "java.lang.String" => ResolvedType::builtin("String"),
        "Object" | "java.lang.Object" => ResolvedType::builtin("Any"),
        other => {
            let fq = FqName::from_dotted(other);
            match (fq.parent(), fq.short_name()) {
                (Some(package), Some(short)) => {
                    ResolvedType::Class(ClassId::top_level(package, short.clone()))
                }
                _ => {
                    ResolvedType::Class(ClassId::top_level(FqName::root(), Name::identifier(other)))
                }
            }
        }
    }
}
