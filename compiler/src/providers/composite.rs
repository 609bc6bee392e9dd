//! Providers asked in order

use super::symbols::{CallableSymbol, ClassLikeSymbol};
use super::SymbolProvider;
use crate::caches::name_cache::union_names;
use crate::caches::NameSet;
use crate::names::{ClassId, FqName, Name};
use std::sync::Arc;

pub struct CompositeSymbolProvider {
    providers: Vec<SymbolProvider>,
}

impl CompositeSymbolProvider {
    pub fn new(providers: Vec<SymbolProvider>) -> Self {
        Self { providers }
    }

    pub fn providers(&self) -> &[SymbolProvider] {
        &self.providers
    }

    /// First provider with an answer wins
    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        self.providers
            .iter()
            .find_map(|provider| provider.class_like_symbol(class_id))
    }

    /// Every provider contributes, in order
    pub fn top_level_callables_into(
        &self,
        dest: &mut Vec<CallableSymbol>,
        package: &FqName,
        name: &Name,
    ) {
        for provider in &self.providers {
            provider.top_level_callables_into(dest, package, name);
        }
    }

    pub fn package(&self, package: &FqName) -> Option<FqName> {
        self.providers
            .iter()
            .find_map(|provider| provider.package(package))
    }

    pub fn known_classifier_names(&self, package: &FqName) -> Option<NameSet> {
        union_names(
            self.providers
                .iter()
                .map(|provider| provider.known_classifier_names(package)),
        )
        .map(Arc::new)
    }

    pub fn known_callable_names(&self, package: &FqName) -> Option<NameSet> {
        union_names(
            self.providers
                .iter()
                .map(|provider| provider.known_callable_names(package)),
        )
        .map(Arc::new)
    }

    pub fn may_have_top_level_classifier(&self, class_id: &ClassId) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.may_have_top_level_classifier(class_id))
    }

    pub fn may_have_top_level_callable(&self, package: &FqName, name: &Name) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.may_have_top_level_callable(package, name))
    }
}
