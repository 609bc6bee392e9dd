//! Phase Resolvers
//!
//! A [`PhaseResolver`] does the actual work of one phase for one declaration:
//! the designated transformers only decide *which* declarations to visit and
//! in what order. [`ReferenceResolver`] is the resolver used by default:
//!
//! - `IMPORTS` binds file imports to classes, callables, object members or packages
//! - `COMPILER_REQUIRED_ANNOTATIONS` binds the annotations the engine itself understands
//! - `COMPANION_GENERATION` asks the extensions for a companion object
//! - `SUPER_TYPES` and `TYPES` resolve written type references
//! - `STATUS` computes effective visibility
//! - `IMPLICIT_TYPES_BODY_RESOLVE` infers omitted return and property types
//! - `BODY_RESOLVE` binds every name reference in bodies and reports
//!   `UNRESOLVED_REFERENCE`, `INVISIBLE_REFERENCE` and `INVISIBLE_MEMBER`
//!
//! Name lookup in bodies goes innermost first: locals and parameters, member
//! scopes of the enclosing classes (declared and generated members, then the
//! companion), the file's top-level declarations, explicit imports, the file's
//! package and finally star imports.

use crate::error::ResolveResult;
use crate::ids::DeclarationId;
use crate::ir::{
    Declaration, DeclarationKind, DiagnosticKind, ImportTarget, IrBody, IrDiagnostic, IrExpression,
    IrFile, IrReference, IrStatement, ReferenceTarget, ResolvePhase, ResolvedType,
};
use crate::names::{ClassId, FqName, Name};
use crate::providers::SymbolProvider;
use crate::scopes::generated_members::generate_companion;
use crate::session::{ModuleSession, ResolutionEngine};
use crate::syntax::Visibility;
use fxhash::FxHashSet;
use log::trace;
use std::cell::RefCell;
use std::sync::Arc;

/// Everything a resolver sees while working on one declaration
pub struct ResolveContext<'a> {
    pub engine: &'a ResolutionEngine,
    /// Session of the declaration's own module
    pub session: &'a ModuleSession,
    pub file: &'a Arc<IrFile>,
    /// Enclosing declarations, outermost first
    pub containers: &'a [Arc<Declaration>],
    pub declaration: &'a Arc<Declaration>,
}

impl ResolveContext<'_> {
    fn symbol_provider(&self) -> &SymbolProvider {
        self.session.symbol_provider()
    }

    fn enclosing_classes(&self) -> impl Iterator<Item = &Arc<Declaration>> + '_ {
        self.containers
            .iter()
            .rev()
            .filter(|container| container.kind.is_regular_class())
    }
}

pub trait PhaseResolver: Send + Sync {
    fn name(&self) -> &str;

    /// File-level part of `phase` (imports, file annotations); runs under the file lock
    fn resolve_file(
        &self,
        _phase: ResolvePhase,
        _session: &ModuleSession,
        _file: &IrFile,
    ) -> ResolveResult<()> {
        Ok(())
    }

    /// Resolve `context.declaration` to `phase`; runs under the declaration lock,
    /// with the declaration already at the phase before `phase`
    fn resolve_declaration(
        &self,
        phase: ResolvePhase,
        context: &ResolveContext<'_>,
    ) -> ResolveResult<()>;
}

thread_local! {
    /// Declarations whose implicit type this thread is inferring
    static INFERRING: RefCell<FxHashSet<DeclarationId>> = RefCell::new(FxHashSet::default());
}

struct InferenceGuard(DeclarationId);

impl InferenceGuard {
    fn enter(id: DeclarationId) -> Self {
        INFERRING.with(|set| set.borrow_mut().insert(id));
        Self(id)
    }

    fn is_inferring(id: DeclarationId) -> bool {
        INFERRING.with(|set| set.borrow().contains(&id))
    }
}

impl Drop for InferenceGuard {
    fn drop(&mut self) {
        INFERRING.with(|set| set.borrow_mut().remove(&self.0));
    }
}

/// Annotations resolved at `COMPILER_REQUIRED_ANNOTATIONS`
fn compiler_required_annotation(name: &str) -> Option<ClassId> {
    let short = name.rsplit('.').next().unwrap_or(name);
    match short {
        "Suppress" | "Deprecated" => Some(ClassId::from_string(&format!("kotlin/{}", short))),
        "JvmStatic" | "JvmName" | "JvmField" => {
            Some(ClassId::from_string(&format!("kotlin/jvm/{}", short)))
        }
        _ => None,
    }
}

/// Default resolver: name-based resolution over symbol providers
#[derive(Debug, Default, Clone, Copy)]
pub struct ReferenceResolver;

impl ReferenceResolver {
    pub fn new() -> Self {
        Self
    }

    fn resolve_imports(&self, provider: &SymbolProvider, file: &IrFile) {
        for import in &file.imports {
            if import.target().is_some() {
                continue;
            }
            let target = if import.all_under {
                match provider.package(&import.path) {
                    Some(package) => ImportTarget::Package(package),
                    None => ImportTarget::Unresolved,
                }
            } else {
                import_target(provider, &import.path)
            };
            trace!("import {} -> {:?}", import.path, target);
            import.set_target(target);
        }
    }

    fn resolve_companion(&self, context: &ResolveContext<'_>) -> ResolveResult<()> {
        let declaration = context.declaration;
        if !declaration.kind.is_regular_class()
            || declaration.is_companion
            || declaration.companion().is_some()
        {
            return Ok(());
        }
        let extensions = &context.session.project().extensions;
        if let Some(companion) = generate_companion(declaration, extensions)? {
            declaration.set_generated_companion(companion);
        }
        Ok(())
    }

    fn resolve_types(&self, context: &ResolveContext<'_>) -> ResolveResult<()> {
        let declaration = context.declaration;
        if declaration.kind == DeclarationKind::Constructor {
            if let Some(owner) = &declaration.containing_class {
                declaration.type_ref.set_resolved(ResolvedType::Class(owner.clone()));
            }
        } else if let Some(written) = &declaration.type_ref.written {
            declaration.type_ref.set_resolved(resolve_type(context, written)?);
        }
        for parameter in &declaration.parameters {
            if let Some(written) = &parameter.type_ref.written {
                parameter.type_ref.set_resolved(resolve_type(context, written)?);
            }
        }
        Ok(())
    }

    fn resolve_status(&self, context: &ResolveContext<'_>) {
        let visibility = context
            .containers
            .iter()
            .map(|container| container.visibility)
            .chain(std::iter::once(context.declaration.visibility))
            .min()
            .unwrap_or(Visibility::Public);
        context.declaration.set_effective_visibility(visibility);
    }

    fn resolve_implicit_type(&self, context: &ResolveContext<'_>) -> ResolveResult<()> {
        let declaration = context.declaration;
        if !matches!(declaration.kind, DeclarationKind::Function | DeclarationKind::Property)
            || declaration.type_ref.is_resolved()
        {
            return Ok(());
        }
        let _guard = InferenceGuard::enter(declaration.id);
        let inferred = match &declaration.body {
            Some(body) => BodyWalker::new(context, WalkMode::Infer).walk_body(body)?,
            None => None,
        };
        let ty = match (inferred, declaration.kind) {
            (Some(ty), _) => ty,
            (None, DeclarationKind::Function) => ResolvedType::unit(),
            (None, _) => ResolvedType::Error(format!("cannot infer type of {}", declaration.name)),
        };
        declaration.type_ref.set_resolved(ty);
        Ok(())
    }

    fn resolve_body(&self, context: &ResolveContext<'_>) -> ResolveResult<()> {
        if let Some(body) = &context.declaration.body {
            BodyWalker::new(context, WalkMode::Bind).walk_body(body)?;
        }
        Ok(())
    }
}

impl PhaseResolver for ReferenceResolver {
    fn name(&self) -> &str {
        "reference-resolver"
    }

    fn resolve_file(
        &self,
        phase: ResolvePhase,
        session: &ModuleSession,
        file: &IrFile,
    ) -> ResolveResult<()> {
        match phase {
            ResolvePhase::Imports => self.resolve_imports(session.symbol_provider(), file),
            ResolvePhase::CompilerRequiredAnnotations => {
                for annotation in &file.annotations {
                    if let Some(class_id) = compiler_required_annotation(&annotation.name) {
                        annotation.set_resolved(class_id);
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn resolve_declaration(
        &self,
        phase: ResolvePhase,
        context: &ResolveContext<'_>,
    ) -> ResolveResult<()> {
        match phase {
            ResolvePhase::Raw | ResolvePhase::Imports | ResolvePhase::AnnotationArguments => Ok(()),
            ResolvePhase::CompilerRequiredAnnotations => {
                for annotation in &context.declaration.annotations {
                    if let Some(class_id) = compiler_required_annotation(&annotation.name) {
                        annotation.set_resolved(class_id);
                    }
                }
                Ok(())
            }
            ResolvePhase::CompanionGeneration => self.resolve_companion(context),
            ResolvePhase::SuperTypes => {
                for supertype in &context.declaration.supertypes {
                    if let Some(written) = &supertype.written {
                        supertype.set_resolved(resolve_type(context, written)?);
                    }
                }
                Ok(())
            }
            ResolvePhase::Types => self.resolve_types(context),
            ResolvePhase::Status => {
                self.resolve_status(context);
                Ok(())
            }
            ResolvePhase::ImplicitTypesBodyResolve => self.resolve_implicit_type(context),
            ResolvePhase::BodyResolve => self.resolve_body(context),
        }
    }
}

/// Class ID addressed by a dotted path, trying the longest package first
fn class_by_path(provider: &SymbolProvider, path: &FqName) -> Option<ClassId> {
    let segments = path.segments();
    (0..segments.len()).rev().find_map(|split| {
        let class_id = ClassId::new(
            FqName::from_segments(segments[..split].iter().cloned()),
            FqName::from_segments(segments[split..].iter().cloned()),
        );
        provider.class_like_symbol(&class_id).map(|_| class_id)
    })
}

fn import_target(provider: &SymbolProvider, path: &FqName) -> ImportTarget {
    if let Some(class_id) = class_by_path(provider, path) {
        return ImportTarget::Class(class_id);
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.short_name()) {
        if !provider.top_level_callables(&parent, name).is_empty() {
            return ImportTarget::Callables {
                package: parent,
                name: name.clone(),
            };
        }
        if let Some(owner) = class_by_path(provider, &parent) {
            return ImportTarget::Member {
                owner,
                name: name.clone(),
            };
        }
    }
    match provider.package(path) {
        Some(package) => ImportTarget::Package(package),
        None => ImportTarget::Unresolved,
    }
}

/// Resolve a written type reference from the point of view of `context`
fn resolve_type(context: &ResolveContext<'_>, written: &str) -> ResolveResult<ResolvedType> {
    if let Some(builtin) = ResolvedType::builtin_named(written) {
        return Ok(builtin);
    }
    let provider = context.symbol_provider();
    let path = FqName::from_dotted(written);
    if path.segments().len() > 1 {
        let relative = ClassId::new(context.file.package.clone(), path.clone());
        if provider.class_like_symbol(&relative).is_some() {
            return Ok(ResolvedType::Class(relative));
        }
        return Ok(match class_by_path(provider, &path) {
            Some(class_id) => ResolvedType::Class(class_id),
            None => ResolvedType::Error(format!("unresolved type {}", written)),
        });
    }
    let name = Name::identifier(written);
    if let Some(class_id) = classifier_in_scope(context, &name)? {
        return Ok(ResolvedType::Class(class_id));
    }
    Ok(ResolvedType::Error(format!("unresolved type {}", written)))
}

/// Class-like declaration visible under a simple name
fn classifier_in_scope(
    context: &ResolveContext<'_>,
    name: &Name,
) -> ResolveResult<Option<ClassId>> {
    for container in context.enclosing_classes() {
        let scope = context.session.member_scope(container);
        if let Some(nested) = scope.classifier(name)? {
            return Ok(nested.class_id.clone());
        }
    }
    if let Some(local) = context
        .file
        .top_level_named(name)
        .find(|declaration| declaration.kind.is_class_like())
    {
        return Ok(local.class_id.clone());
    }
    let provider = context.symbol_provider();
    for import in &context.file.imports {
        if import.imported_name() == Some(name) {
            if let Some(ImportTarget::Class(class_id)) = import.target() {
                return Ok(Some(class_id));
            }
        }
    }
    let same_package = ClassId::top_level(context.file.package.clone(), name.clone());
    if provider.class_like_symbol(&same_package).is_some() {
        return Ok(Some(same_package));
    }
    for import in context.file.imports.iter().filter(|import| import.all_under) {
        if let Some(ImportTarget::Package(package)) = import.target() {
            let class_id = ClassId::top_level(package, name.clone());
            if provider.class_like_symbol(&class_id).is_some() {
                return Ok(Some(class_id));
            }
        }
    }
    Ok(None)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    /// Only compute the body's type; nothing is bound or reported
    Infer,
    /// Bind references and report diagnostics
    Bind,
}

/// Walks a body with a stack of visible local declarations
struct BodyWalker<'c, 'a> {
    context: &'c ResolveContext<'a>,
    mode: WalkMode,
    locals: Vec<Vec<Arc<Declaration>>>,
}

impl<'c, 'a> BodyWalker<'c, 'a> {
    fn new(context: &'c ResolveContext<'a>, mode: WalkMode) -> Self {
        Self {
            context,
            mode,
            locals: vec![context.declaration.parameters.clone()],
        }
    }

    /// Type of the value the body produces, if it produces one
    fn walk_body(&mut self, body: &IrBody) -> ResolveResult<Option<ResolvedType>> {
        match body {
            IrBody::Expression(expression) => self.walk_expression(expression).map(Some),
            IrBody::Block(statements) => self.walk_statements(statements),
        }
    }

    fn walk_statements(
        &mut self,
        statements: &[IrStatement],
    ) -> ResolveResult<Option<ResolvedType>> {
        self.locals.push(Vec::new());
        let mut last = None;
        for statement in statements {
            last = match statement {
                IrStatement::Expression(expression) | IrStatement::Return(expression) => {
                    Some(self.walk_expression(expression)?)
                }
                IrStatement::Declaration(local) => {
                    self.walk_local(local)?;
                    if let Some(scope) = self.locals.last_mut() {
                        scope.push(local.clone());
                    }
                    None
                }
            };
        }
        self.locals.pop();
        Ok(last)
    }

    fn walk_local(&mut self, local: &Arc<Declaration>) -> ResolveResult<()> {
        for parameter in &local.parameters {
            if let Some(written) = &parameter.type_ref.written {
                parameter.type_ref.set_resolved(resolve_type(self.context, written)?);
            }
        }
        self.locals.push(local.parameters.clone());
        let body_type = match &local.body {
            Some(body) => self.walk_body(body)?,
            None => None,
        };
        self.locals.pop();
        let ty = match (&local.type_ref.written, body_type) {
            (Some(written), _) => resolve_type(self.context, written)?,
            (None, Some(ty)) => ty,
            (None, None) if local.kind == DeclarationKind::Function => ResolvedType::unit(),
            (None, None) => ResolvedType::Error(format!("cannot infer type of {}", local.name)),
        };
        local.type_ref.set_resolved(ty);
        if self.mode == WalkMode::Bind {
            local.advance_phase(ResolvePhase::BodyResolve);
        }
        Ok(())
    }

    fn walk_expression(&mut self, expression: &IrExpression) -> ResolveResult<ResolvedType> {
        match expression {
            IrExpression::Literal(literal) => Ok(literal.ty()),
            IrExpression::Reference(reference) => self.resolve_reference(reference),
            IrExpression::Call { callee, arguments } => {
                for argument in arguments {
                    self.walk_expression(argument)?;
                }
                self.resolve_reference(callee)
            }
            IrExpression::Block(statements) => Ok(self
                .walk_statements(statements)?
                .unwrap_or_else(ResolvedType::unit)),
        }
    }

    fn resolve_reference(&mut self, reference: &IrReference) -> ResolveResult<ResolvedType> {
        if let Some(ReferenceTarget::Resolved { ty: Some(ty), .. }) = reference.target() {
            return Ok(ty);
        }
        let name = Name::identifier(&reference.name);
        let Some(target) = self.lookup(&name)? else {
            if self.mode == WalkMode::Bind {
                self.report(
                    DiagnosticKind::UnresolvedReference,
                    reference,
                    format!("unresolved reference {}", name),
                );
                reference.bind(ReferenceTarget::Unresolved);
            }
            return Ok(ResolvedType::Error(format!("unresolved reference {}", name)));
        };
        let ty = self.type_of(&target)?;
        if self.mode == WalkMode::Bind {
            if !self.is_visible(&target) {
                let kind = if target.is_top_level() {
                    DiagnosticKind::InvisibleReference
                } else {
                    DiagnosticKind::InvisibleMember
                };
                self.report(
                    kind,
                    reference,
                    format!(
                        "cannot access {}: it is {}",
                        target.qualified_name(),
                        effective_visibility(&target)
                    ),
                );
            }
            reference.bind(ReferenceTarget::Resolved {
                declaration: target.id,
                target: target.qualified_name(),
                kind: target.kind,
                module: target.module,
                ty: Some(ty.clone()),
            });
        }
        Ok(ty)
    }

    fn type_of(&self, target: &Arc<Declaration>) -> ResolveResult<ResolvedType> {
        if let Some(class_id) = &target.class_id {
            return Ok(ResolvedType::Class(class_id.clone()));
        }
        if !target.is_local && target.phase() < ResolvePhase::ImplicitTypesBodyResolve {
            match self.mode {
                WalkMode::Bind => self
                    .context
                    .engine
                    .lazy_resolve(target, ResolvePhase::ImplicitTypesBodyResolve)?,
                WalkMode::Infer if InferenceGuard::is_inferring(target.id) => {
                    return Ok(ResolvedType::Error("recursive implicit type".to_string()));
                }
                WalkMode::Infer => self
                    .context
                    .engine
                    .ensure_resolved(target, ResolvePhase::ImplicitTypesBodyResolve)?,
            }
        }
        Ok(target.type_ref.resolved().unwrap_or_else(|| {
            ResolvedType::Error(format!("type of {} is not resolved", target.name))
        }))
    }

    fn lookup(&self, name: &Name) -> ResolveResult<Option<Arc<Declaration>>> {
        for scope in self.locals.iter().rev() {
            if let Some(local) = scope.iter().rev().find(|local| local.name == *name) {
                return Ok(Some(local.clone()));
            }
        }
        let context = self.context;
        for container in context.enclosing_classes() {
            if let Some(member) = self.member_of(container, name)? {
                return Ok(Some(member));
            }
            if let Some(companion) = container.companion() {
                if let Some(member) = self.member_of(&companion, name)? {
                    return Ok(Some(member));
                }
            }
        }
        if let Some(top_level) = context
            .file
            .top_level_named(name)
            .find(|declaration| declaration.kind.is_callable() || declaration.kind.is_class_like())
        {
            return Ok(Some(top_level.clone()));
        }
        let provider = context.symbol_provider();
        for import in &context.file.imports {
            if import.imported_name() != Some(name) {
                continue;
            }
            let found = match import.target() {
                Some(ImportTarget::Class(class_id)) => {
                    provider.class_like_symbol(&class_id).map(|symbol| symbol.declaration().clone())
                }
                Some(ImportTarget::Callables { package, name }) => {
                    first_callable(provider, &package, &name)
                }
                Some(ImportTarget::Member { owner, name }) => {
                    match provider.class_like_symbol(&owner) {
                        Some(symbol) => self.member_of(symbol.declaration(), &name)?,
                        None => None,
                    }
                }
                _ => None,
            };
            if found.is_some() {
                return Ok(found);
            }
        }
        if let Some(found) = top_level_in_package(provider, &context.file.package, name) {
            return Ok(Some(found));
        }
        for import in context.file.imports.iter().filter(|import| import.all_under) {
            if let Some(ImportTarget::Package(package)) = import.target() {
                if let Some(found) = top_level_in_package(provider, &package, name) {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    fn member_of(
        &self,
        class: &Arc<Declaration>,
        name: &Name,
    ) -> ResolveResult<Option<Arc<Declaration>>> {
        let scope = self.context.session.member_scope(class);
        if let Some(callable) = scope.callables(name)?.into_iter().next() {
            return Ok(Some(callable));
        }
        scope.classifier(name)
    }

    fn is_visible(&self, target: &Declaration) -> bool {
        let context = self.context;
        let owned_by_enclosing = |owner: &ClassId| {
            context
                .containers
                .iter()
                .any(|container| container.class_id.as_ref() == Some(owner))
        };
        match effective_visibility(target) {
            Visibility::Public => true,
            Visibility::Internal => {
                let use_site = context.session.module();
                target.module == use_site.id || use_site.is_friend_of(target.module)
            }
            Visibility::Protected => match &target.containing_class {
                Some(owner) => {
                    owned_by_enclosing(owner)
                        || context.enclosing_classes().any(|class| {
                            class.supertypes.iter().any(|supertype| {
                                let resolved = supertype.resolved();
                                resolved.as_ref().and_then(ResolvedType::class_id) == Some(owner)
                            })
                        })
                }
                None => true,
            },
            Visibility::Private => {
                let same_file = target.file == Some(context.file.file);
                match &target.containing_class {
                    Some(owner) if target.visibility == Visibility::Private => {
                        same_file && owned_by_enclosing(owner)
                    }
                    _ => same_file,
                }
            }
        }
    }

    fn report(&self, kind: DiagnosticKind, reference: &IrReference, message: String) {
        let context = self.context;
        let suppressed = context
            .file
            .suppressed_diagnostics()
            .into_iter()
            .chain(
                context
                    .containers
                    .iter()
                    .chain(std::iter::once(context.declaration))
                    .flat_map(|declaration| declaration.annotations.iter())
                    .filter(|annotation| annotation.is_suppress())
                    .flat_map(|annotation| annotation.arguments.iter().map(String::as_str)),
            )
            .any(|id| id == kind.id());
        if suppressed {
            trace!("{} on {} suppressed", kind.id(), reference.name);
            return;
        }
        context
            .declaration
            .report(IrDiagnostic::new(kind, &reference.name, message));
    }
}

fn effective_visibility(declaration: &Declaration) -> Visibility {
    declaration
        .effective_visibility()
        .unwrap_or(declaration.visibility)
}

fn first_callable(
    provider: &SymbolProvider,
    package: &FqName,
    name: &Name,
) -> Option<Arc<Declaration>> {
    provider
        .top_level_callables(package, name)
        .into_iter()
        .next()
        .map(|symbol| symbol.declaration().clone())
}

fn top_level_in_package(
    provider: &SymbolProvider,
    package: &FqName,
    name: &Name,
) -> Option<Arc<Declaration>> {
    first_callable(provider, package, name).or_else(|| {
        provider
            .class_like_symbol(&ClassId::top_level(package.clone(), name.clone()))
            .map(|symbol| symbol.declaration().clone())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiler_required_annotations() {
        assert_eq!(
            compiler_required_annotation("Suppress"),
            Some(ClassId::from_string("kotlin/Suppress"))
        );
        assert_eq!(
            compiler_required_annotation("kotlin.jvm.JvmStatic"),
            Some(ClassId::from_string("kotlin/jvm/JvmStatic"))
        );
        assert_eq!(compiler_required_annotation("Serializable"), None);
    }

    #[test]
    fn test_inference_guard_is_scoped() {
        let id = DeclarationId::from_raw(7);
        {
            let _guard = InferenceGuard::enter(id);
            assert!(InferenceGuard::is_inferring(id));
        }
        assert!(!InferenceGuard::is_inferring(id));
    }
}
