//! Provider over every dependency of a module
//!
//! Kotlin providers of the dependency sessions are merged into one combined
//! provider, Java providers into another; the result asks Kotlin first.

use super::combined::CombinedKotlinSymbolProvider;
use super::combined_java::CombinedJavaSymbolProvider;
use super::java::JavaSymbolProvider;
use super::module_provider::ModuleSymbolProvider;
use super::{CompositeSymbolProvider, SymbolProvider};
use crate::project::Project;
use log::debug;
use std::sync::Arc;

/// `kotlin` and `java` must be in dependency order: the first module wins
/// when several declare the same class
pub fn dependencies_provider(
    project: &Project,
    kotlin: Vec<Arc<ModuleSymbolProvider>>,
    java: Vec<Arc<JavaSymbolProvider>>,
) -> SymbolProvider {
    debug!(
        "Merging dependency providers: {} Kotlin, {} Java",
        kotlin.len(),
        java.len()
    );
    let merged_kotlin = CombinedKotlinSymbolProvider::merge(
        kotlin,
        project.declaration_provider(),
        project.structure_provider(),
        project.search_scopes.as_ref(),
        &project.config,
    );
    let merged_java = CombinedJavaSymbolProvider::merge(
        java,
        project.java_class_finder(),
        project.structure_provider(),
        project.search_scopes.as_ref(),
        &project.config,
    );
    SymbolProvider::Composite(Arc::new(CompositeSymbolProvider::new(
        merged_kotlin.into_iter().chain(merged_java).collect(),
    )))
}
