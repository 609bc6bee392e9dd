//! Serves the synthetic class generated for a code fragment, and nothing else

use super::symbols::ClassLikeSymbol;
use crate::ir::Declaration;
use crate::names::ClassId;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Default)]
pub struct CodeFragmentSymbolProvider {
    class: RwLock<Option<ClassLikeSymbol>>,
}

impl CodeFragmentSymbolProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `declaration` the one class this provider knows; ignored unless class-like
    pub fn register(&self, declaration: Arc<Declaration>) {
        if let Some(symbol) = ClassLikeSymbol::new(declaration) {
            *self.class.write() = Some(symbol);
        }
    }

    pub fn class_like_symbol(&self, class_id: &ClassId) -> Option<ClassLikeSymbol> {
        self.class
            .read()
            .as_ref()
            .filter(|symbol| symbol.class_id() == class_id)
            .cloned()
    }

    pub fn registered(&self) -> Option<ClassLikeSymbol> {
        self.class.read().clone()
    }
}
