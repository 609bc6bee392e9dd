//! Designations
//!
//! A designation is the path from a file through its enclosing declarations to
//! the one declaration a lazy transformer should resolve.

use super::declaration::{Declaration, IrFile};
use crate::error::{ResolveError, ResolveResult};
use crate::ids::DeclarationId;
use smallvec::SmallVec;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct Designation {
    pub file: Arc<IrFile>,
    /// Enclosing declarations, outermost first (the target is not included)
    pub path: SmallVec<[Arc<Declaration>; 4]>,
    pub target: Arc<Declaration>,
}

impl Designation {
    pub fn new(
        file: Arc<IrFile>,
        path: impl IntoIterator<Item = Arc<Declaration>>,
        target: Arc<Declaration>,
    ) -> Self {
        Self {
            file,
            path: path.into_iter().collect(),
            target,
        }
    }

    /// Search `file` for the declaration with this ID
    pub fn find(file: &Arc<IrFile>, declaration: DeclarationId) -> ResolveResult<Self> {
        let mut path = SmallVec::new();
        for top_level in &file.declarations {
            if let Some(target) = search(top_level, declaration, &mut path) {
                return Ok(Self {
                    file: file.clone(),
                    path,
                    target,
                });
            }
        }
        Err(ResolveError::DesignationNotFound {
            declaration,
            file: Some(file.file),
        })
    }

    /// Follow a member index path (as in [`crate::syntax::SourceElement`])
    pub fn from_source_path(file: &Arc<IrFile>, indices: &[u32]) -> Option<Self> {
        let (first, rest) = indices.split_first()?;
        let mut current = file.declarations.get(*first as usize)?.clone();
        let mut path = SmallVec::new();
        for index in rest {
            let next = current.members.get(*index as usize)?.clone();
            path.push(std::mem::replace(&mut current, next));
        }
        Some(Self {
            file: file.clone(),
            path,
            target: current,
        })
    }

    /// Whether the path really leads from the file to the target
    pub fn is_consistent(&self) -> bool {
        let mut expected_children: &[Arc<Declaration>] = &self.file.declarations;
        for step in self.path.iter().chain(std::iter::once(&self.target)) {
            if !expected_children.iter().any(|d| Arc::ptr_eq(d, step)) {
                return false;
            }
            expected_children = &step.members;
        }
        true
    }

    pub fn is_top_level(&self) -> bool {
        self.path.is_empty()
    }
}

fn search(
    current: &Arc<Declaration>,
    target: DeclarationId,
    path: &mut SmallVec<[Arc<Declaration>; 4]>,
) -> Option<Arc<Declaration>> {
    if current.id == target {
        return Some(current.clone());
    }
    path.push(current.clone());
    for member in &current.members {
        if let Some(found) = search(member, target, path) {
            return Some(found);
        }
    }
    path.pop();
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FileId, ModuleId};
    use crate::ir::builder::RawIrBuilder;
    use crate::syntax::{SourceDeclaration, SourceFile};

    fn file() -> Arc<IrFile> {
        let source = SourceFile::new("A.kt", "app")
            .with_declaration(SourceDeclaration::function("first"))
            .with_declaration(
                SourceDeclaration::class("Outer").with_member(
                    SourceDeclaration::class("Inner")
                        .with_member(SourceDeclaration::function("deep")),
                ),
            );
        Arc::new(RawIrBuilder::new(ModuleId::from_raw(0)).build_file(FileId::from_raw(0), &source))
    }

    #[test]
    fn test_find_nested_target() {
        let file = file();
        let deep = file.declarations[1].members[0].members[0].clone();
        let designation = Designation::find(&file, deep.id).unwrap();
        assert_eq!(designation.path.len(), 2);
        assert!(Arc::ptr_eq(&designation.target, &deep));
        assert!(designation.is_consistent());

        let by_path = Designation::from_source_path(&file, &[1, 0, 0]).unwrap();
        assert!(Arc::ptr_eq(&by_path.target, &deep));
    }

    #[test]
    fn test_missing_target() {
        let file = file();
        let result = Designation::find(&file, DeclarationId::invalid());
        assert!(matches!(result, Err(ResolveError::DesignationNotFound { .. })));
        assert!(Designation::from_source_path(&file, &[7]).is_none());
    }

    #[test]
    fn test_mismatched_path_is_inconsistent() {
        let file = file();
        let inner = file.declarations[1].members[0].clone();
        let designation = Designation::new(file.clone(), [file.declarations[0].clone()], inner);
        assert!(!designation.is_consistent());
    }
}
