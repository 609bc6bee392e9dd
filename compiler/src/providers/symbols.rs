//! Symbols handed out by providers
//!
//! A symbol is a handle on a shared IR declaration. Two symbols are equal when
//! they point at the same declaration instance.

use crate::ids::ModuleId;
use crate::ir::{Declaration, DeclarationKind};
use crate::names::{CallableId, ClassId};
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct ClassLikeSymbol {
    class_id: ClassId,
    declaration: Arc<Declaration>,
}

impl ClassLikeSymbol {
    /// `None` unless `declaration` is class-like
    pub fn new(declaration: Arc<Declaration>) -> Option<Self> {
        let class_id = declaration.class_id.clone()?;
        Some(Self {
            class_id,
            declaration,
        })
    }

    pub fn class_id(&self) -> &ClassId {
        &self.class_id
    }

    pub fn declaration(&self) -> &Arc<Declaration> {
        &self.declaration
    }

    pub fn module(&self) -> ModuleId {
        self.declaration.module
    }

    pub fn kind(&self) -> DeclarationKind {
        self.declaration.kind
    }
}

impl PartialEq for ClassLikeSymbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.declaration, &other.declaration)
    }
}

impl Eq for ClassLikeSymbol {}

impl fmt::Debug for ClassLikeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassLikeSymbol({} in {})", self.class_id, self.declaration.module)
    }
}

#[derive(Clone)]
pub struct CallableSymbol {
    callable_id: CallableId,
    declaration: Arc<Declaration>,
}

impl CallableSymbol {
    /// `None` for local and non-callable declarations
    pub fn new(declaration: Arc<Declaration>) -> Option<Self> {
        let callable_id = declaration.callable_id()?;
        Some(Self {
            callable_id,
            declaration,
        })
    }

    pub fn callable_id(&self) -> &CallableId {
        &self.callable_id
    }

    pub fn declaration(&self) -> &Arc<Declaration> {
        &self.declaration
    }

    pub fn module(&self) -> ModuleId {
        self.declaration.module
    }

    pub fn is_function(&self) -> bool {
        self.declaration.kind == DeclarationKind::Function
    }

    pub fn is_property(&self) -> bool {
        self.declaration.kind == DeclarationKind::Property
    }
}

impl PartialEq for CallableSymbol {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.declaration, &other.declaration)
    }
}

impl Eq for CallableSymbol {}

impl fmt::Debug for CallableSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallableSymbol({} in {})", self.callable_id, self.declaration.module)
    }
}
