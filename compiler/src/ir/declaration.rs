//! Typed IR Declarations
//!
//! Declarations are built once per session and shared behind `Arc`. Their
//! shape (names, members, bodies) is immutable; everything resolution fills in
//! lives in interior cells:
//!
//! - the [`PhaseCell`] phase marker, which only moves forward
//! - resolved type references, import targets and reference targets
//! - the effective visibility computed at `STATUS`
//! - the generated companion object and the diagnostics list
//!
//! A per-declaration reentrant lock serializes transformers working on the same
//! declaration. The phase is always checked before the lock is taken.

use super::diagnostics::IrDiagnostic;
use super::phase::{PhaseCell, ResolvePhase};
use crate::ids::{next_declaration_id, DeclarationId, FileId, ModuleId};
use crate::names::{CallableId, ClassId, FqName, Name};
use crate::syntax::Visibility;
use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    Class,
    Interface,
    Object,
    TypeAlias,
    Function,
    Property,
    Constructor,
    ValueParameter,
}

impl DeclarationKind {
    pub fn is_class_like(self) -> bool {
        matches!(
            self,
            DeclarationKind::Class
                | DeclarationKind::Interface
                | DeclarationKind::Object
                | DeclarationKind::TypeAlias
        )
    }

    /// Class, interface or object (not a type alias)
    pub fn is_regular_class(self) -> bool {
        matches!(
            self,
            DeclarationKind::Class | DeclarationKind::Interface | DeclarationKind::Object
        )
    }

    pub fn is_callable(self) -> bool {
        matches!(
            self,
            DeclarationKind::Function | DeclarationKind::Property | DeclarationKind::Constructor
        )
    }

    pub fn keyword(self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Interface => "interface",
            DeclarationKind::Object => "object",
            DeclarationKind::TypeAlias => "typealias",
            DeclarationKind::Function => "fun",
            DeclarationKind::Property => "val",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::ValueParameter => "param",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum DeclarationOrigin {
    Source,
    Java,
    /// Built by the engine itself (code fragment wrappers)
    Synthetic,
    /// Produced by a declaration generation extension
    Generated { extension: String },
}

impl DeclarationOrigin {
    pub fn generated_by(&self) -> Option<&str> {
        match self {
            DeclarationOrigin::Generated { extension } => Some(extension),
            _ => None,
        }
    }
}

const BUILTIN_TYPES: &[&str] = &[
    "Any", "Nothing", "Unit", "Int", "Long", "Short", "Byte", "Double", "Float", "Char", "Boolean",
    "String",
];

/// Type a type reference resolved to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ResolvedType {
    Class(ClassId),
    Error(String),
}

impl ResolvedType {
    pub fn builtin(name: &str) -> Self {
        ResolvedType::Class(ClassId::top_level(
            FqName::from_dotted("kotlin"),
            Name::identifier(name),
        ))
    }

    /// Builtin type for a written name (`Int`, `kotlin.String`, ...)
    pub fn builtin_named(written: &str) -> Option<Self> {
        let short = written.strip_prefix("kotlin.").unwrap_or(written);
        BUILTIN_TYPES
            .contains(&short)
            .then(|| ResolvedType::builtin(short))
    }

    pub fn unit() -> Self {
        ResolvedType::builtin("Unit")
    }

    pub fn class_id(&self) -> Option<&ClassId> {
        match self {
            ResolvedType::Class(class_id) => Some(class_id),
            ResolvedType::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ResolvedType::Error(_))
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedType::Class(class_id) => write!(f, "{}", class_id),
            ResolvedType::Error(message) => write!(f, "<error: {}>", message),
        }
    }
}

/// Type reference: the written text (absent for implicit types) and its resolution
#[derive(Debug, Default)]
pub struct IrTypeRef {
    pub written: Option<String>,
    resolved: RwLock<Option<ResolvedType>>,
}

impl IrTypeRef {
    pub fn written(text: &str) -> Self {
        Self {
            written: Some(text.to_string()),
            resolved: RwLock::new(None),
        }
    }

    pub fn implicit() -> Self {
        Self::default()
    }

    pub fn resolved_to(ty: ResolvedType) -> Self {
        Self {
            written: None,
            resolved: RwLock::new(Some(ty)),
        }
    }

    pub fn resolved(&self) -> Option<ResolvedType> {
        self.resolved.read().clone()
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.read().is_some()
    }

    /// First writer wins
    pub fn set_resolved(&self, ty: ResolvedType) {
        let mut slot = self.resolved.write();
        if slot.is_none() {
            *slot = Some(ty);
        }
    }
}

/// What a name reference was bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ReferenceTarget {
    Resolved {
        declaration: DeclarationId,
        /// Qualified rendering of the target (`lib/foo`, `app/Box.size`)
        target: String,
        kind: DeclarationKind,
        module: ModuleId,
        ty: Option<ResolvedType>,
    },
    Unresolved,
}

#[derive(Debug)]
pub struct IrReference {
    pub name: String,
    target: RwLock<Option<ReferenceTarget>>,
}

impl IrReference {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            target: RwLock::new(None),
        }
    }

    pub fn target(&self) -> Option<ReferenceTarget> {
        self.target.read().clone()
    }

    pub fn bind(&self, target: ReferenceTarget) {
        let mut slot = self.target.write();
        if slot.is_none() {
            *slot = Some(target);
        }
    }

    pub fn is_bound(&self) -> bool {
        self.target.read().is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrLiteral {
    Int(i64),
    Str(String),
    Bool(bool),
}

impl IrLiteral {
    pub fn ty(&self) -> ResolvedType {
        match self {
            IrLiteral::Int(_) => ResolvedType::builtin("Int"),
            IrLiteral::Str(_) => ResolvedType::builtin("String"),
            IrLiteral::Bool(_) => ResolvedType::builtin("Boolean"),
        }
    }
}

#[derive(Debug)]
pub enum IrExpression {
    Literal(IrLiteral),
    Reference(IrReference),
    Call {
        callee: IrReference,
        arguments: Vec<IrExpression>,
    },
    Block(Vec<IrStatement>),
}

#[derive(Debug)]
pub enum IrStatement {
    Expression(IrExpression),
    Return(IrExpression),
    Declaration(Arc<Declaration>),
}

#[derive(Debug)]
pub enum IrBody {
    Expression(IrExpression),
    Block(Vec<IrStatement>),
}

impl IrBody {
    /// Expression whose value the body produces (expression body or last statement)
    pub fn result_expression(&self) -> Option<&IrExpression> {
        match self {
            IrBody::Expression(expression) => Some(expression),
            IrBody::Block(statements) => match statements.last() {
                Some(IrStatement::Expression(e)) | Some(IrStatement::Return(e)) => Some(e),
                _ => None,
            },
        }
    }

    /// Local declarations, including those nested in blocks
    pub fn local_declarations(&self) -> Vec<Arc<Declaration>> {
        let mut out = Vec::new();
        match self {
            IrBody::Expression(expression) => collect_locals_in_expression(expression, &mut out),
            IrBody::Block(statements) => collect_locals(statements, &mut out),
        }
        out
    }
}

fn collect_locals(statements: &[IrStatement], out: &mut Vec<Arc<Declaration>>) {
    for statement in statements {
        match statement {
            IrStatement::Declaration(declaration) => {
                out.push(declaration.clone());
                if let Some(body) = &declaration.body {
                    out.extend(body.local_declarations());
                }
            }
            IrStatement::Expression(e) | IrStatement::Return(e) => {
                collect_locals_in_expression(e, out)
            }
        }
    }
}

fn collect_locals_in_expression(expression: &IrExpression, out: &mut Vec<Arc<Declaration>>) {
    match expression {
        IrExpression::Block(statements) => collect_locals(statements, out),
        IrExpression::Call { arguments, .. } => {
            for argument in arguments {
                collect_locals_in_expression(argument, out);
            }
        }
        IrExpression::Literal(_) | IrExpression::Reference(_) => {}
    }
}

#[derive(Debug)]
pub struct IrAnnotation {
    pub name: String,
    pub arguments: Vec<String>,
    resolved: RwLock<Option<ClassId>>,
}

impl IrAnnotation {
    pub fn new(name: &str, arguments: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            arguments,
            resolved: RwLock::new(None),
        }
    }

    pub fn resolved(&self) -> Option<ClassId> {
        self.resolved.read().clone()
    }

    pub fn set_resolved(&self, class_id: ClassId) {
        *self.resolved.write() = Some(class_id);
    }

    pub fn is_suppress(&self) -> bool {
        self.name == "Suppress" || self.name == "kotlin.Suppress"
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ImportTarget {
    Class(ClassId),
    /// Top-level callables `package.name`
    Callables { package: FqName, name: Name },
    /// Member of an object (`a.Box.Companion.create`)
    Member { owner: ClassId, name: Name },
    Package(FqName),
    Unresolved,
}

#[derive(Debug)]
pub struct IrImport {
    pub path: FqName,
    pub alias: Option<Name>,
    pub all_under: bool,
    resolved: RwLock<Option<ImportTarget>>,
}

impl IrImport {
    pub fn new(path: FqName, alias: Option<Name>, all_under: bool) -> Self {
        Self {
            path,
            alias,
            all_under,
            resolved: RwLock::new(None),
        }
    }

    /// Name the import makes visible (alias first)
    pub fn imported_name(&self) -> Option<&Name> {
        if self.all_under {
            return None;
        }
        self.alias.as_ref().or_else(|| self.path.short_name())
    }

    pub fn target(&self) -> Option<ImportTarget> {
        self.resolved.read().clone()
    }

    pub fn set_target(&self, target: ImportTarget) {
        *self.resolved.write() = Some(target);
    }
}

pub struct Declaration {
    pub id: DeclarationId,
    pub name: Name,
    pub kind: DeclarationKind,
    pub origin: DeclarationOrigin,
    pub module: ModuleId,
    pub file: Option<FileId>,
    pub package: FqName,
    /// Set for class-like declarations
    pub class_id: Option<ClassId>,
    pub containing_class: Option<ClassId>,
    pub visibility: Visibility,
    pub is_companion: bool,
    pub is_static: bool,
    pub is_local: bool,
    pub supertypes: Vec<IrTypeRef>,
    /// Return type, property type, parameter type or aliased type
    pub type_ref: IrTypeRef,
    pub parameters: Vec<Arc<Declaration>>,
    pub members: Vec<Arc<Declaration>>,
    pub body: Option<IrBody>,
    pub annotations: Vec<IrAnnotation>,
    phase: PhaseCell,
    lock: ReentrantMutex<()>,
    effective_visibility: RwLock<Option<Visibility>>,
    generated_companion: RwLock<Option<Arc<Declaration>>>,
    diagnostics: Mutex<Vec<IrDiagnostic>>,
}

impl Declaration {
    pub fn new(
        kind: DeclarationKind,
        name: Name,
        origin: DeclarationOrigin,
        module: ModuleId,
        package: FqName,
    ) -> Self {
        Self {
            id: next_declaration_id(),
            name,
            kind,
            origin,
            module,
            file: None,
            package,
            class_id: None,
            containing_class: None,
            visibility: Visibility::Public,
            is_companion: false,
            is_static: false,
            is_local: false,
            supertypes: Vec::new(),
            type_ref: IrTypeRef::implicit(),
            parameters: Vec::new(),
            members: Vec::new(),
            body: None,
            annotations: Vec::new(),
            phase: PhaseCell::new(ResolvePhase::Raw),
            lock: ReentrantMutex::new(()),
            effective_visibility: RwLock::new(None),
            generated_companion: RwLock::new(None),
            diagnostics: Mutex::new(Vec::new()),
        }
    }

    /// Class-like declaration with its class ID
    pub fn class_like(
        kind: DeclarationKind,
        class_id: ClassId,
        origin: DeclarationOrigin,
        module: ModuleId,
    ) -> Self {
        let mut declaration = Self::new(
            kind,
            class_id.short_class_name().clone(),
            origin,
            module,
            class_id.package().clone(),
        );
        declaration.containing_class = class_id.outer_class_id();
        declaration.class_id = Some(class_id);
        declaration
    }

    /// Callable declaration (top-level when the ID has no class)
    pub fn callable(
        kind: DeclarationKind,
        callable_id: &CallableId,
        origin: DeclarationOrigin,
        module: ModuleId,
    ) -> Self {
        let mut declaration = Self::new(
            kind,
            callable_id.callable_name().clone(),
            origin,
            module,
            callable_id.package().clone(),
        );
        declaration.containing_class = callable_id.class_id();
        declaration
    }

    pub fn in_file(mut self, file: FileId) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_type(mut self, type_ref: IrTypeRef) -> Self {
        self.type_ref = type_ref;
        self
    }

    pub fn with_parameter(mut self, parameter: Declaration) -> Self {
        self.parameters.push(Arc::new(parameter));
        self
    }

    pub fn with_member(mut self, member: Declaration) -> Self {
        self.members.push(Arc::new(member));
        self
    }

    pub fn with_body(mut self, body: IrBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn as_companion(mut self) -> Self {
        self.is_companion = true;
        self
    }

    /// Start out at `phase` (for declarations built already resolved)
    pub fn at_phase(self, phase: ResolvePhase) -> Self {
        self.phase.advance_to(phase);
        self
    }

    pub fn phase(&self) -> ResolvePhase {
        self.phase.get()
    }

    pub fn advance_phase(&self, phase: ResolvePhase) -> ResolvePhase {
        self.phase.advance_to(phase)
    }

    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    pub fn callable_id(&self) -> Option<CallableId> {
        if !self.kind.is_callable() || self.is_local {
            return None;
        }
        Some(match &self.containing_class {
            Some(owner) => CallableId::member(owner, self.name.clone()),
            None => CallableId::top_level(self.package.clone(), self.name.clone()),
        })
    }

    pub fn is_top_level(&self) -> bool {
        self.containing_class.is_none()
            && !self.is_local
            && self.kind != DeclarationKind::ValueParameter
    }

    pub fn effective_visibility(&self) -> Option<Visibility> {
        *self.effective_visibility.read()
    }

    pub fn set_effective_visibility(&self, visibility: Visibility) {
        *self.effective_visibility.write() = Some(visibility);
    }

    pub fn generated_companion(&self) -> Option<Arc<Declaration>> {
        self.generated_companion.read().clone()
    }

    pub fn set_generated_companion(&self, companion: Arc<Declaration>) {
        let mut slot = self.generated_companion.write();
        if slot.is_none() {
            *slot = Some(companion);
        }
    }

    /// Declared companion object, or the generated one
    pub fn companion(&self) -> Option<Arc<Declaration>> {
        self.members
            .iter()
            .find(|member| member.is_companion)
            .cloned()
            .or_else(|| self.generated_companion())
    }

    pub fn report(&self, diagnostic: IrDiagnostic) {
        let mut diagnostics = self.diagnostics.lock();
        if !diagnostics.contains(&diagnostic) {
            diagnostics.push(diagnostic);
        }
    }

    pub fn diagnostics(&self) -> Vec<IrDiagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Qualified rendering used in references and messages
    pub fn qualified_name(&self) -> String {
        if let Some(class_id) = &self.class_id {
            return class_id.to_string();
        }
        match self.callable_id() {
            Some(callable_id) => callable_id.to_string(),
            None => self.name.to_string(),
        }
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Declaration")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("name", &self.qualified_name())
            .field("phase", &self.phase())
            .finish()
    }
}

/// IR of one source file
#[derive(Debug)]
pub struct IrFile {
    pub file: FileId,
    pub module: ModuleId,
    pub name: String,
    pub package: FqName,
    pub imports: Vec<IrImport>,
    pub annotations: Vec<IrAnnotation>,
    pub declarations: Vec<Arc<Declaration>>,
    phase: PhaseCell,
    lock: ReentrantMutex<()>,
}

impl IrFile {
    pub fn new(file: FileId, module: ModuleId, name: &str, package: FqName) -> Self {
        Self {
            file,
            module,
            name: name.to_string(),
            package,
            imports: Vec::new(),
            annotations: Vec::new(),
            declarations: Vec::new(),
            phase: PhaseCell::new(ResolvePhase::Raw),
            lock: ReentrantMutex::new(()),
        }
    }

    pub fn phase(&self) -> ResolvePhase {
        self.phase.get()
    }

    pub fn advance_phase(&self, phase: ResolvePhase) -> ResolvePhase {
        self.phase.advance_to(phase)
    }

    pub fn lock(&self) -> ReentrantMutexGuard<'_, ()> {
        self.lock.lock()
    }

    /// Diagnostic IDs named in file-level `@Suppress` annotations
    pub fn suppressed_diagnostics(&self) -> Vec<&str> {
        self.annotations
            .iter()
            .filter(|annotation| annotation.is_suppress())
            .flat_map(|annotation| annotation.arguments.iter().map(String::as_str))
            .collect()
    }

    pub fn top_level_named(&self, name: &Name) -> impl Iterator<Item = &Arc<Declaration>> + '_ {
        let name = name.clone();
        self.declarations.iter().filter(move |d| d.name == name)
    }
}

/// A built file or one of its declarations
#[derive(Debug, Clone)]
pub enum IrElement {
    File(Arc<IrFile>),
    Declaration(Arc<Declaration>),
}

impl IrElement {
    pub fn as_declaration(&self) -> Option<&Arc<Declaration>> {
        match self {
            IrElement::Declaration(declaration) => Some(declaration),
            IrElement::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&Arc<IrFile>> {
        match self {
            IrElement::File(file) => Some(file),
            IrElement::Declaration(_) => None,
        }
    }
}
