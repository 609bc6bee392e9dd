//! Qualified Names
//!
//! Identifiers used by symbol lookups: simple [`Name`]s, dotted package paths
//! ([`FqName`]), class identifiers ([`ClassId`]) and callable identifiers
//! ([`CallableId`]). All of them are cheap to clone (shared string storage).

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// Simple (unqualified) name of a declaration
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(Arc<str>);

impl Name {
    /// Regular identifier
    pub fn identifier(text: &str) -> Self {
        Name(Arc::from(text))
    }

    /// Special name, written with angle brackets (e.g. `<init>`)
    pub fn special(text: &str) -> Self {
        debug_assert!(text.starts_with('<') && text.ends_with('>'));
        Name(Arc::from(text))
    }

    /// Name used for constructors
    pub fn init() -> Self {
        Name::special(INIT_NAME)
    }

    /// Placeholder for a declaration without a name
    pub fn no_name_provided() -> Self {
        Name::special(NO_NAME_PROVIDED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_special(&self) -> bool {
        self.0.starts_with('<')
    }

    pub fn is_init(&self) -> bool {
        &*self.0 == INIT_NAME
    }
}

/// Name under which constructors are registered
pub const INIT_NAME: &str = "<init>";

/// Name given to declarations that have none
pub const NO_NAME_PROVIDED: &str = "<no name provided>";

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::identifier(text)
    }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Fully qualified dotted name (`a.b.c`); the root name has no segments
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FqName {
    segments: Arc<[Name]>,
}

impl FqName {
    pub fn root() -> Self {
        FqName {
            segments: Arc::from(Vec::new()),
        }
    }

    /// Parse a dotted path; the empty string is the root
    pub fn from_dotted(path: &str) -> Self {
        if path.is_empty() {
            return FqName::root();
        }
        FqName::from_segments(path.split('.').map(Name::identifier))
    }

    pub fn from_segments(segments: impl IntoIterator<Item = Name>) -> Self {
        FqName {
            segments: segments.into_iter().collect::<Vec<_>>().into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Name] {
        &self.segments
    }

    pub fn child(&self, name: Name) -> Self {
        let mut segments = self.segments.to_vec();
        segments.push(name);
        FqName::from_segments(segments)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(FqName::from_segments(
            self.segments[..self.segments.len() - 1].iter().cloned(),
        ))
    }

    pub fn short_name(&self) -> Option<&Name> {
        self.segments.last()
    }

    /// Whether `self` equals `prefix` or lies beneath it
    pub fn starts_with(&self, prefix: &FqName) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments[..prefix.segments.len()] == *prefix.segments
    }

    pub fn as_string(&self) -> String {
        self.segments
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Debug for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_string())
    }
}

impl fmt::Display for FqName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.as_string())
        }
    }
}

impl Serialize for FqName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_string())
    }
}

/// Identifier of a (possibly nested) class-like declaration
///
/// `relative_class_name` holds the chain of enclosing classes, e.g. `Outer.Inner`,
/// and is never empty.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId {
    package: FqName,
    relative_class_name: FqName,
}

impl ClassId {
    /// An empty relative name becomes `<no name provided>`, which no
    /// identifier lookup matches
    pub fn new(package: FqName, relative_class_name: FqName) -> Self {
        let relative_class_name = if relative_class_name.is_root() {
            FqName::from_segments([Name::no_name_provided()])
        } else {
            relative_class_name
        };
        ClassId {
            package,
            relative_class_name,
        }
    }

    pub fn top_level(package: FqName, name: Name) -> Self {
        ClassId::new(package, FqName::from_segments([name]))
    }

    /// Parse `a/b/Outer.Inner` (package separated by `/`)
    pub fn from_string(text: &str) -> Self {
        match text.rsplit_once('/') {
            Some((package, relative)) => ClassId::new(
                FqName::from_dotted(&package.replace('/', ".")),
                FqName::from_dotted(relative),
            ),
            None => ClassId::new(FqName::root(), FqName::from_dotted(text)),
        }
    }

    pub fn package(&self) -> &FqName {
        &self.package
    }

    pub fn relative_class_name(&self) -> &FqName {
        &self.relative_class_name
    }

    pub fn short_class_name(&self) -> &Name {
        let segments = self.relative_class_name.segments();
        &segments[segments.len() - 1]
    }

    /// Name of the top-level class this ID lives under
    pub fn outermost_class_name(&self) -> &Name {
        &self.relative_class_name.segments()[0]
    }

    pub fn is_nested(&self) -> bool {
        self.relative_class_name.segments().len() > 1
    }

    pub fn outer_class_id(&self) -> Option<ClassId> {
        if !self.is_nested() {
            return None;
        }
        self.relative_class_name
            .parent()
            .map(|parent| ClassId::new(self.package.clone(), parent))
    }

    pub fn create_nested(&self, name: Name) -> ClassId {
        ClassId::new(self.package.clone(), self.relative_class_name.child(name))
    }

    pub fn as_fq_name(&self) -> FqName {
        FqName::from_segments(
            self.package
                .segments()
                .iter()
                .chain(self.relative_class_name.segments())
                .cloned(),
        )
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let package = self
            .package
            .segments()
            .iter()
            .map(Name::as_str)
            .collect::<Vec<_>>()
            .join("/");
        write!(f, "{}/{}", package, self.relative_class_name.as_string())
    }
}

impl Serialize for ClassId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Identifier of a function, property or constructor
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallableId {
    package: FqName,
    class_name: Option<FqName>,
    callable_name: Name,
}

impl CallableId {
    pub fn top_level(package: FqName, callable_name: Name) -> Self {
        CallableId {
            package,
            class_name: None,
            callable_name,
        }
    }

    pub fn member(owner: &ClassId, callable_name: Name) -> Self {
        CallableId {
            package: owner.package().clone(),
            class_name: Some(owner.relative_class_name().clone()),
            callable_name,
        }
    }

    pub fn package(&self) -> &FqName {
        &self.package
    }

    pub fn class_name(&self) -> Option<&FqName> {
        self.class_name.as_ref()
    }

    pub fn class_id(&self) -> Option<ClassId> {
        self.class_name
            .as_ref()
            .map(|class_name| ClassId::new(self.package.clone(), class_name.clone()))
    }

    pub fn callable_name(&self) -> &Name {
        &self.callable_name
    }

    pub fn is_top_level(&self) -> bool {
        self.class_name.is_none()
    }
}

impl fmt::Debug for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for CallableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let package = self.package.as_string().replace('.', "/");
        match &self.class_name {
            Some(class_name) => write!(f, "{}/{}.{}", package, class_name, self.callable_name),
            None => write!(f, "{}/{}", package, self.callable_name),
        }
    }
}

impl Serialize for CallableId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}
