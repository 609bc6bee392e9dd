//! Raw Syntax Model
//!
//! The shape of parsed source files as they reach the resolution core. The
//! parser itself lives outside the engine; anything that can produce these
//! structures can feed it. Type references and names are kept as written
//! (dotted strings); giving them meaning is the job of the resolver.
//!
//! A [`SourceStore`] owns the files of a project and bumps the project
//! modification tracker whenever one of them changes.

use crate::ids::{FileId, IdAllocator};
use crate::names::{FqName, Name};
use crate::project::tracker::SimpleModificationTracker;
use fxhash::FxHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Declared visibility, ordered from most to least restrictive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Protected,
    Internal,
    #[default]
    Public,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Visibility::Private => "private",
            Visibility::Protected => "protected",
            Visibility::Internal => "internal",
            Visibility::Public => "public",
        };
        write!(f, "{}", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceDeclarationKind {
    Class,
    Interface,
    Object,
    TypeAlias,
    Function,
    Property,
    Constructor,
}

impl SourceDeclarationKind {
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            SourceDeclarationKind::Class
                | SourceDeclarationKind::Interface
                | SourceDeclarationKind::Object
                | SourceDeclarationKind::TypeAlias
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            SourceDeclarationKind::Function
                | SourceDeclarationKind::Property
                | SourceDeclarationKind::Constructor
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceParameter {
    pub name: String,
    pub type_ref: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceAnnotation {
    pub name: String,
    pub arguments: Vec<String>,
}

/// Expression as written
#[derive(Debug, Clone, PartialEq)]
pub enum RawExpr {
    Int(i64),
    Str(String),
    Bool(bool),
    /// Possibly qualified name (`foo`, `Outer.Inner`, `lib.foo`)
    Reference(String),
    Call {
        callee: String,
        arguments: Vec<RawExpr>,
    },
    Block(Vec<RawStatement>),
}

impl RawExpr {
    pub fn reference(name: &str) -> Self {
        RawExpr::Reference(name.to_string())
    }

    pub fn call(callee: &str, arguments: Vec<RawExpr>) -> Self {
        RawExpr::Call {
            callee: callee.to_string(),
            arguments,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RawStatement {
    Expr(RawExpr),
    Return(RawExpr),
    /// Local function, property or class
    Declaration(Box<SourceDeclaration>),
}

/// Function body or property initializer
#[derive(Debug, Clone, PartialEq)]
pub enum RawBody {
    Expression(RawExpr),
    Block(Vec<RawStatement>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceDeclaration {
    pub name: String,
    pub kind: SourceDeclarationKind,
    pub visibility: Visibility,
    pub is_companion: bool,
    pub annotations: Vec<SourceAnnotation>,
    pub supertypes: Vec<String>,
    /// Return type, property type or aliased type
    pub type_ref: Option<String>,
    pub parameters: Vec<SourceParameter>,
    pub body: Option<RawBody>,
    pub members: Vec<SourceDeclaration>,
}

impl SourceDeclaration {
    pub fn new(kind: SourceDeclarationKind, name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            visibility: Visibility::Public,
            is_companion: false,
            annotations: Vec::new(),
            supertypes: Vec::new(),
            type_ref: None,
            parameters: Vec::new(),
            body: None,
            members: Vec::new(),
        }
    }

    pub fn class(name: &str) -> Self {
        Self::new(SourceDeclarationKind::Class, name)
    }

    pub fn interface(name: &str) -> Self {
        Self::new(SourceDeclarationKind::Interface, name)
    }

    pub fn object(name: &str) -> Self {
        Self::new(SourceDeclarationKind::Object, name)
    }

    pub fn companion(name: &str) -> Self {
        Self {
            is_companion: true,
            ..Self::new(SourceDeclarationKind::Object, name)
        }
    }

    pub fn type_alias(name: &str, expanded: &str) -> Self {
        Self::new(SourceDeclarationKind::TypeAlias, name).returns(expanded)
    }

    pub fn function(name: &str) -> Self {
        Self::new(SourceDeclarationKind::Function, name)
    }

    pub fn property(name: &str) -> Self {
        Self::new(SourceDeclarationKind::Property, name)
    }

    pub fn constructor() -> Self {
        Self::new(SourceDeclarationKind::Constructor, crate::names::INIT_NAME)
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn private(self) -> Self {
        self.with_visibility(Visibility::Private)
    }

    pub fn internal(self) -> Self {
        self.with_visibility(Visibility::Internal)
    }

    pub fn returns(mut self, type_ref: &str) -> Self {
        self.type_ref = Some(type_ref.to_string());
        self
    }

    pub fn with_supertype(mut self, supertype: &str) -> Self {
        self.supertypes.push(supertype.to_string());
        self
    }

    pub fn with_parameter(mut self, name: &str, type_ref: &str) -> Self {
        self.parameters.push(SourceParameter {
            name: name.to_string(),
            type_ref: type_ref.to_string(),
        });
        self
    }

    pub fn with_body(mut self, body: RawBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Expression body / initializer shorthand
    pub fn with_expression(self, expression: RawExpr) -> Self {
        self.with_body(RawBody::Expression(expression))
    }

    pub fn with_member(mut self, member: SourceDeclaration) -> Self {
        self.members.push(member);
        self
    }

    pub fn annotated(mut self, name: &str, arguments: &[&str]) -> Self {
        self.annotations.push(SourceAnnotation {
            name: name.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceImport {
    pub path: FqName,
    pub alias: Option<Name>,
    pub all_under: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub name: String,
    pub package: FqName,
    pub imports: Vec<SourceImport>,
    pub annotations: Vec<SourceAnnotation>,
    pub declarations: Vec<SourceDeclaration>,
    /// Top-level expressions outside any declaration (code fragments only)
    pub dangling: Vec<RawExpr>,
}

impl SourceFile {
    pub fn new(name: &str, package: &str) -> Self {
        Self {
            name: name.to_string(),
            package: FqName::from_dotted(package),
            imports: Vec::new(),
            annotations: Vec::new(),
            declarations: Vec::new(),
            dangling: Vec::new(),
        }
    }

    /// `import a.b.C` or `import a.b.*`
    pub fn with_import(mut self, path: &str) -> Self {
        let (path, all_under) = match path.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (path, false),
        };
        self.imports.push(SourceImport {
            path: FqName::from_dotted(path),
            alias: None,
            all_under,
        });
        self
    }

    pub fn with_aliased_import(mut self, path: &str, alias: &str) -> Self {
        self.imports.push(SourceImport {
            path: FqName::from_dotted(path),
            alias: Some(Name::identifier(alias)),
            all_under: false,
        });
        self
    }

    pub fn with_declaration(mut self, declaration: SourceDeclaration) -> Self {
        self.declarations.push(declaration);
        self
    }

    pub fn annotated(mut self, name: &str, arguments: &[&str]) -> Self {
        self.annotations.push(SourceAnnotation {
            name: name.to_string(),
            arguments: arguments.iter().map(|a| a.to_string()).collect(),
        });
        self
    }

    pub fn with_dangling(mut self, expression: RawExpr) -> Self {
        self.dangling.push(expression);
        self
    }

    /// Follow an index path through declarations and members
    pub fn declaration_at(&self, path: &[u32]) -> Option<&SourceDeclaration> {
        let (first, rest) = path.split_first()?;
        let mut current = self.declarations.get(*first as usize)?;
        for index in rest {
            current = current.members.get(*index as usize)?;
        }
        Some(current)
    }
}

/// Index path from a file through nested members
pub type SourcePath = SmallVec<[u32; 4]>;

/// A file, or a declaration inside it addressed by its member index path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceElement {
    pub file: FileId,
    pub path: SourcePath,
}

impl SourceElement {
    pub fn file(file: FileId) -> Self {
        Self {
            file,
            path: SourcePath::new(),
        }
    }

    pub fn declaration(file: FileId, path: &[u32]) -> Self {
        Self {
            file,
            path: SourcePath::from_slice(path),
        }
    }

    pub fn is_file(&self) -> bool {
        self.path.is_empty()
    }
}

/// Project source files addressed by [`FileId`]
pub struct SourceStore {
    files: RwLock<FxHashMap<FileId, Arc<SourceFile>>>,
    ids: IdAllocator<FileId>,
    tracker: Arc<SimpleModificationTracker>,
}

impl SourceStore {
    pub fn new(tracker: Arc<SimpleModificationTracker>) -> Self {
        Self {
            files: RwLock::new(FxHashMap::default()),
            ids: IdAllocator::new(),
            tracker,
        }
    }

    /// Fresh ID for a file whose content the store doesn't hold (e.g. Java sources)
    pub fn reserve_file_id(&self) -> FileId {
        self.ids.allocate()
    }

    pub fn add_file(&self, file: SourceFile) -> FileId {
        let id = self.ids.allocate();
        self.insert_reserved(id, file);
        id
    }

    /// Store content under an ID obtained from [`Self::reserve_file_id`]
    pub fn insert_reserved(&self, id: FileId, file: SourceFile) {
        self.files.write().insert(id, Arc::new(file));
        self.tracker.increment();
    }

    /// Register a file without invalidating anything built so far
    pub fn add_detached_file(&self, file: SourceFile) -> FileId {
        let id = self.ids.allocate();
        self.files.write().insert(id, Arc::new(file));
        id
    }

    /// Replace the content of an existing file; returns the previous content
    pub fn update_file(&self, id: FileId, file: SourceFile) -> Option<Arc<SourceFile>> {
        let previous = {
            let mut files = self.files.write();
            if !files.contains_key(&id) {
                return None;
            }
            files.insert(id, Arc::new(file))
        };
        self.tracker.increment();
        previous
    }

    pub fn get(&self, id: FileId) -> Option<Arc<SourceFile>> {
        self.files.read().get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::services::ModificationTracker;

    #[test]
    fn test_declaration_at_follows_members() {
        let file = SourceFile::new("Outer.kt", "app").with_declaration(
            SourceDeclaration::class("Outer")
                .with_member(SourceDeclaration::function("a"))
                .with_member(
                    SourceDeclaration::class("Inner").with_member(SourceDeclaration::function("b")),
                ),
        );
        assert_eq!(file.declaration_at(&[0, 1, 0]).map(|d| d.name.as_str()), Some("b"));
        assert!(file.declaration_at(&[0, 5]).is_none());
        assert!(file.declaration_at(&[]).is_none());
    }

    #[test]
    fn test_store_bumps_tracker() {
        let tracker = Arc::new(SimpleModificationTracker::new());
        let store = SourceStore::new(tracker.clone());
        let before = tracker.modification_count();
        let id = store.add_file(SourceFile::new("a.kt", "app"));
        assert!(tracker.modification_count() > before);

        let after_add = tracker.modification_count();
        store.add_detached_file(SourceFile::new("fragment.kt", ""));
        assert_eq!(tracker.modification_count(), after_add);

        assert!(store.update_file(id, SourceFile::new("a.kt", "app2")).is_some());
        assert!(tracker.modification_count() > after_add);
        assert_eq!(store.get(id).map(|f| f.package.as_string()), Some("app2".to_string()));
    }

    #[test]
    fn test_import_parsing() {
        let file = SourceFile::new("a.kt", "app")
            .with_import("lib.util.*")
            .with_import("lib.Box");
        assert!(file.imports[0].all_under);
        assert_eq!(file.imports[0].path, FqName::from_dotted("lib.util"));
        assert!(!file.imports[1].all_under);
    }
}
