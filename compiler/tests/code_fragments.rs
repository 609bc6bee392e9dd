use lazy_resolve::ir::{
    DiagnosticKind, IrBody, IrExpression, IrStatement, ReferenceTarget, ResolvedType,
};
use lazy_resolve::session::{GENERATED_CLASS_NAME, GENERATED_FUNCTION_NAME};
use lazy_resolve::syntax::RawExpr;
use lazy_resolve::*;
use std::sync::Arc;

fn engine() -> (Arc<ResolutionEngine>, FileId) {
    lazy_resolve::logging::init_test();
    let host = SourceFile::new("Main.kt", "app")
        .with_declaration(
            SourceDeclaration::function("secret")
                .private()
                .returns("Int")
                .with_expression(RawExpr::Int(42)),
        )
        .with_declaration(
            SourceDeclaration::class("Box").with_member(
                SourceDeclaration::companion("Factory").with_member(
                    SourceDeclaration::function("create").with_expression(RawExpr::Int(7)),
                ),
            ),
        );
    let shared = SourceFile::new("Shared.kt", "app")
        .with_declaration(
            SourceDeclaration::function("shared")
                .internal()
                .with_expression(RawExpr::Str("s".into())),
        );
    let project = ProjectBuilder::new()
        .module(ModuleSpec::source("app"))
        .source_file("app", host)
        .source_file("app", shared)
        .build()
        .unwrap();
    let host_file = project.file_id("app", "Main.kt").unwrap();
    (Arc::new(ResolutionEngine::new(project)), host_file)
}

fn fragment(expression: RawExpr) -> SourceFile {
    SourceFile::new("fragment.kt", "").with_dangling(expression)
}

/// The generated function of a fragment session, resolved to `BODY_RESOLVE`
fn resolved_function(engine: &Arc<ResolutionEngine>, session: &ResolveSession) -> Arc<Declaration> {
    let wrapper = session.code_fragment_class().unwrap().expect("wrapper registered");
    assert_eq!(wrapper.class_id().short_class_name().as_str(), GENERATED_CLASS_NAME);
    let function = wrapper
        .declaration()
        .members
        .iter()
        .find(|member| member.name.as_str() == GENERATED_FUNCTION_NAME)
        .cloned()
        .unwrap();
    engine.lazy_resolve(&function, ResolvePhase::BodyResolve).unwrap();
    function
}

fn returned_call(function: &Declaration) -> Option<ReferenceTarget> {
    match &function.body {
        Some(IrBody::Block(statements)) => match statements.first() {
            Some(IrStatement::Return(IrExpression::Call { callee, .. })) => callee.target(),
            _ => None,
        },
        _ => None,
    }
}

fn resolved_target(function: &Declaration) -> String {
    match returned_call(function) {
        Some(ReferenceTarget::Resolved { target, .. }) => target,
        other => panic!("fragment call not bound: {:?}", other),
    }
}

#[test]
fn test_private_host_declaration_is_reachable() {
    let (engine, host_file) = engine();
    let session = engine
        .create_code_fragment(host_file, fragment(RawExpr::call("secret", vec![])))
        .unwrap();
    assert!(session.module().is_code_fragment());

    let function = resolved_function(&engine, &session);
    assert_eq!(resolved_target(&function), "app/secret");
    assert!(function.diagnostics().is_empty());
    assert!(function.is_static);
    assert_eq!(function.type_ref.resolved(), Some(ResolvedType::builtin("Int")));
}

#[test]
fn test_companion_members_are_imported() {
    let (engine, host_file) = engine();
    let session = engine
        .create_code_fragment(host_file, fragment(RawExpr::call("create", vec![])))
        .unwrap();
    let function = resolved_function(&engine, &session);
    assert_eq!(resolved_target(&function), "app/Box.Factory.create");
    assert_eq!(function.type_ref.resolved(), Some(ResolvedType::builtin("Int")));
}

#[test]
fn test_internal_declarations_of_the_host_module() {
    let (engine, host_file) = engine();
    let session = engine
        .create_code_fragment(
            host_file,
            fragment(RawExpr::call("shared", vec![])).with_import("app.shared"),
        )
        .unwrap();
    let app = engine.project().structure.module_by_name("app").unwrap();
    assert!(session.module().is_friend_of(app.id));

    let function = resolved_function(&engine, &session);
    assert_eq!(resolved_target(&function), "app/shared");
    assert_eq!(function.type_ref.resolved(), Some(ResolvedType::builtin("String")));
}

#[test]
fn test_fragment_declarations_are_visible() {
    let (engine, host_file) = engine();
    let source = fragment(RawExpr::call("twice", vec![]))
        .with_declaration(
            SourceDeclaration::function("twice").with_expression(RawExpr::Bool(true)),
        );
    let session = engine.create_code_fragment(host_file, source).unwrap();
    let function = resolved_function(&engine, &session);
    assert!(resolved_target(&function).ends_with("twice"));
    assert_eq!(function.type_ref.resolved(), Some(ResolvedType::builtin("Boolean")));
}

#[test]
fn test_unresolved_references_are_still_reported() {
    let (engine, host_file) = engine();
    let session = engine
        .create_code_fragment(host_file, fragment(RawExpr::call("nothing", vec![])))
        .unwrap();
    let function = resolved_function(&engine, &session);
    assert_eq!(returned_call(&function), Some(ReferenceTarget::Unresolved));
    let kinds: Vec<_> = function.diagnostics().iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DiagnosticKind::UnresolvedReference]);
}

#[test]
fn test_fragment_sessions_are_independent() {
    let (engine, host_file) = engine();
    let first = engine
        .create_code_fragment(host_file, fragment(RawExpr::Int(1)))
        .unwrap();
    let second = engine
        .create_code_fragment(host_file, fragment(RawExpr::Int(2)))
        .unwrap();
    assert_ne!(first.module().id, second.module().id);
    let a = first.code_fragment_class().unwrap().unwrap();
    let b = second.code_fragment_class().unwrap().unwrap();
    assert_eq!(a.class_id(), b.class_id());
    assert_ne!(a, b);
}

#[test]
fn test_fragment_needs_a_single_expression() {
    let (engine, host_file) = engine();
    let session = engine
        .create_code_fragment(host_file, SourceFile::new("fragment.kt", ""))
        .unwrap();
    assert!(matches!(
        session.code_fragment_class(),
        Err(ResolveError::InvalidCodeFragment { .. })
    ));
}
