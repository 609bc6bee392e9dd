//! Symbol Providers
//!
//! Providers answer "which declaration is `a/b/C`?" and "which top-level
//! callables are named `foo` in package `a.b`?" for some set of modules.
//! Misses are `None` or empty results, never errors.
//!
//! The provider kinds form a closed set, so [`SymbolProvider`] is an enum and
//! composition is by value:
//! - [`ModuleSymbolProvider`] serves the source files of one module
//! - [`JavaSymbolProvider`] serves the Java classes of one module
//! - [`CombinedKotlinSymbolProvider`] / [`CombinedJavaSymbolProvider`] serve a
//!   list of modules with one index query and precedence by list order
//! - [`CodeFragmentSymbolProvider`] serves the class generated for a code fragment
//! - [`CompositeSymbolProvider`] asks a list of providers in order

pub mod code_fragment;
pub mod combined;
pub mod combined_java;
pub mod composite;
pub mod dependencies;
pub mod java;
pub mod module_provider;
pub mod symbols;

pub use code_fragment::CodeFragmentSymbolProvider;
pub use combined::CombinedKotlinSymbolProvider;
pub use combined_java::CombinedJavaSymbolProvider;
pub use composite::CompositeSymbolProvider;
pub use dependencies::dependencies_provider;
pub use java::JavaSymbolProvider;
pub use module_provider::{FileIrCache, ModuleSymbolProvider};
pub use symbols::{CallableSymbol, ClassLikeSymbol};

use crate::caches::NameSet;
use crate::names::{ClassId, FqName, Name};
use fxhash::FxHashSet;
use std::sync::Arc;

#[derive(Clone)]
pub enum SymbolProvider {
    Module(Arc<ModuleSymbolProvider>),
    Java(Arc<JavaSymbolProvider>),
    CombinedKotlin(Arc<CombinedKotlinSymbolProvider>),
    CombinedJava(Arc<CombinedJavaSymbolProvider>),
    CodeFragment(Arc<CodeFragmentSymbolProvider>),
    Composite(Arc<CompositeSymbolProvider>),
}

impl SymbolProvider {
    pub fn kind(&self) -> &'static str {
        match self {
            SymbolProvider::Module(_) => "module",
            SymbolProvider::Java(_) => "java",
            SymbolProvider::CombinedKotlin(_) => "combined-kotlin",
            SymbolProvider::CombinedJava(_) => "combined-java",
            SymbolProvider::CodeFragment(_) => "code-fragment",
            SymbolProvider::Composite(_) => "composite",
        }
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        match self {
            SymbolProvider::Module(p) => p.class_like_symbol(class_id),
            SymbolProvider::Java(p) => p.class_like_symbol(class_id),
            SymbolProvider::CombinedKotlin(p) => p.class_like_symbol(class_id),
            SymbolProvider::CombinedJava(p) => p.class_like_symbol(class_id),
            SymbolProvider::CodeFragment(p) => p.class_like_symbol(class_id),
            SymbolProvider::Composite(p) => p.class_like_symbol(class_id),
        }
    }

    /// Append top-level functions and properties named `name` to `dest`
    pub fn top_level_callables_into(
        &self,
        dest: &mut Vec<CallableSymbol>,
        package: &FqName,
        name: &Name,
    ) {
        match self {
            SymbolProvider::Module(p) => {
                dest.extend(p.top_level_callables(package, name).iter().cloned())
            }
            SymbolProvider::CombinedKotlin(p) => {
                dest.extend(p.top_level_callables(package, name).iter().cloned())
            }
            SymbolProvider::Composite(p) => p.top_level_callables_into(dest, package, name),
            SymbolProvider::Java(_)
            | SymbolProvider::CombinedJava(_)
            | SymbolProvider::CodeFragment(_) => {}
        }
    }

    pub fn top_level_functions_into(
        &self,
        dest: &mut Vec<CallableSymbol>,
        package: &FqName,
        name: &Name,
    ) {
        let mut all = Vec::new();
        self.top_level_callables_into(&mut all, package, name);
        dest.extend(all.into_iter().filter(CallableSymbol::is_function));
    }

    pub fn top_level_properties_into(
        &self,
        dest: &mut Vec<CallableSymbol>,
        package: &FqName,
        name: &Name,
    ) {
        let mut all = Vec::new();
        self.top_level_callables_into(&mut all, package, name);
        dest.extend(all.into_iter().filter(CallableSymbol::is_property));
    }

    pub fn top_level_callables(&self, package: &FqName, name: &Name) -> Vec<CallableSymbol> {
        let mut found = Vec::new();
        self.top_level_callables_into(&mut found, package, name);
        found
    }

    /// `Some(package)` when the package exists in this provider's content
    pub fn package(&self, package: &FqName) -> Option<FqName> {
        match self {
            SymbolProvider::Module(p) => p.package(package),
            SymbolProvider::Java(p) => p.package(package),
            SymbolProvider::CombinedKotlin(p) => p.package(package),
            SymbolProvider::CombinedJava(p) => p.package(package),
            SymbolProvider::CodeFragment(_) => None,
            SymbolProvider::Composite(p) => p.package(package),
        }
    }

    /// Top-level classifier names of `package`; `None` when they can't be listed
    pub fn known_classifier_names(&self, package: &FqName) -> Option<NameSet> {
        match self {
            SymbolProvider::Module(p) => p.known_classifier_names(package),
            SymbolProvider::Java(p) => p.known_classifier_names(package),
            SymbolProvider::CombinedKotlin(p) => p.known_classifier_names(package),
            SymbolProvider::CombinedJava(p) => p.known_classifier_names(package),
            SymbolProvider::CodeFragment(_) => Some(empty_names()),
            SymbolProvider::Composite(p) => p.known_classifier_names(package),
        }
    }

    pub fn known_callable_names(&self, package: &FqName) -> Option<NameSet> {
        match self {
            SymbolProvider::Module(p) => p.known_callable_names(package),
            SymbolProvider::CombinedKotlin(p) => p.known_callable_names(package),
            SymbolProvider::Composite(p) => p.known_callable_names(package),
            SymbolProvider::Java(_)
            | SymbolProvider::CombinedJava(_)
            | SymbolProvider::CodeFragment(_) => Some(empty_names()),
        }
    }

    pub fn may_have_top_level_classifier(&self, class_id: &ClassId) -> bool {
        match self {
            SymbolProvider::Module(p) => p.may_have_top_level_classifier(class_id),
            SymbolProvider::CombinedKotlin(p) => p.may_have_top_level_classifier(class_id),
            SymbolProvider::Composite(p) => p.may_have_top_level_classifier(class_id),
            SymbolProvider::CodeFragment(p) => p.class_like_symbol(class_id).is_some(),
            SymbolProvider::Java(_) | SymbolProvider::CombinedJava(_) => {
                match self.known_classifier_names(class_id.package()) {
                    Some(names) => names.contains(class_id.outermost_class_name()),
                    None => true,
                }
            }
        }
    }

    pub fn may_have_top_level_callable(&self, package: &FqName, name: &Name) -> bool {
        match self {
            SymbolProvider::Module(p) => p.may_have_top_level_callable(package, name),
            SymbolProvider::CombinedKotlin(p) => p.may_have_top_level_callable(package, name),
            SymbolProvider::Composite(p) => p.may_have_top_level_callable(package, name),
            SymbolProvider::Java(_)
            | SymbolProvider::CombinedJava(_)
            | SymbolProvider::CodeFragment(_) => false,
        }
    }
}

fn empty_names() -> NameSet {
    Arc::new(FxHashSet::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ModuleId;
    use crate::ir::{Declaration, DeclarationKind, DeclarationOrigin};

    #[test]
    fn test_composite_asks_in_order() {
        let first = Arc::new(CodeFragmentSymbolProvider::new());
        let second = Arc::new(CodeFragmentSymbolProvider::new());
        let id = ClassId::from_string("Generated_for_debugger_class");
        for provider in [&first, &second] {
            provider.register(Arc::new(Declaration::class_like(
                DeclarationKind::Object,
                id.clone(),
                DeclarationOrigin::Synthetic,
                ModuleId::from_raw(0),
            )));
        }
        let composite = SymbolProvider::Composite(Arc::new(CompositeSymbolProvider::new(vec![
            SymbolProvider::CodeFragment(first.clone()),
            SymbolProvider::CodeFragment(second),
        ])));
        assert_eq!(composite.class_like_symbol(&id), first.registered());
        assert!(composite.may_have_top_level_classifier(&id));
        assert!(composite.package(&FqName::root()).is_none());
        assert!(composite
            .top_level_callables(&FqName::root(), &Name::identifier("x"))
            .is_empty());
        assert_eq!(composite.known_callable_names(&FqName::root()).map(|n| n.len()), Some(0));
    }
}
