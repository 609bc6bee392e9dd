//! Lookup scopes: global search scopes over project content, and member
//! scopes of classes including extension-generated members.

pub mod generated_members;
pub mod member_scope;
pub mod search_scope;

pub use generated_members::{
    GeneratedClassDeclaredMemberScope, GeneratedClassNestedClassifierScope,
    GeneratedMemberDeclarationsCache,
};
pub use member_scope::ClassMemberScope;
pub use search_scope::{
    GlobalSearchScope, GlobalSearchScopeFactory, ModuleSetSearchScopeFactory,
    UnionSearchScopeFactory,
};
