use lazy_resolve::ir::{
    DeclarationKind, DeclarationOrigin, IrBody, IrExpression, IrTypeRef, ReferenceTarget,
    ResolvedType,
};
use lazy_resolve::syntax::RawExpr;
use lazy_resolve::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Adds `build(): Int` to `Box` and a companion with `make(): String` to `Crate`
struct Builders {
    generated: Arc<AtomicUsize>,
}

impl DeclarationGenerationExtension for Builders {
    fn name(&self) -> &str {
        "builders"
    }

    fn callable_names_for_class(&self, owner: &Declaration) -> Vec<Name> {
        if owner.name.as_str() == "Box" {
            vec![Name::identifier("build")]
        } else {
            Vec::new()
        }
    }

    fn generate_functions(
        &self,
        callable_id: &CallableId,
        _owner: &Declaration,
    ) -> Vec<Declaration> {
        self.generated.fetch_add(1, Ordering::SeqCst);
        vec![Declaration::callable(
            DeclarationKind::Function,
            callable_id,
            DeclarationOrigin::Source,
            ModuleId::invalid(),
        )
        .with_type(IrTypeRef::written("Int"))]
    }

    fn generate_companion(&self, owner: &Declaration) -> Option<Declaration> {
        if owner.name.as_str() != "Crate" {
            return None;
        }
        let companion_id = owner.class_id.as_ref()?.create_nested(Name::identifier("Companion"));
        let make = Declaration::callable(
            DeclarationKind::Function,
            &CallableId::member(&companion_id, Name::identifier("make")),
            DeclarationOrigin::Source,
            ModuleId::invalid(),
        )
        .with_type(IrTypeRef::written("String"));
        Some(
            Declaration::class_like(
                DeclarationKind::Object,
                companion_id,
                DeclarationOrigin::Source,
                ModuleId::invalid(),
            )
            .with_member(make),
        )
    }
}

/// Generates a nested `Builder` class for every class
struct NestedBuilder(&'static str);

impl DeclarationGenerationExtension for NestedBuilder {
    fn name(&self) -> &str {
        self.0
    }

    fn nested_classifier_names(&self, _owner: &Declaration) -> Vec<Name> {
        vec![Name::identifier("Builder")]
    }

    fn generate_nested_class_like(&self, owner: &Declaration, name: &Name) -> Option<Declaration> {
        let owner_id = owner.class_id.as_ref()?;
        Some(Declaration::class_like(
            DeclarationKind::Class,
            owner_id.create_nested(name.clone()),
            DeclarationOrigin::Source,
            ModuleId::invalid(),
        ))
    }
}

fn source() -> SourceFile {
    SourceFile::new("Box.kt", "app")
        .with_declaration(
            SourceDeclaration::class("Box")
                .with_member(
                    SourceDeclaration::function("size")
                        .with_expression(RawExpr::call("build", vec![])),
                )
                .with_member(
                    SourceDeclaration::function("nested")
                        .with_expression(RawExpr::reference("Builder")),
                ),
        )
        .with_declaration(
            SourceDeclaration::class("Crate").with_member(
                SourceDeclaration::function("label").with_expression(RawExpr::call("make", vec![])),
            ),
        )
}

fn engine(extensions: Vec<Box<dyn DeclarationGenerationExtension>>) -> Arc<ResolutionEngine> {
    lazy_resolve::logging::init_test();
    let mut builder = ProjectBuilder::new()
        .module(ModuleSpec::source("app"))
        .source_file("app", source());
    for extension in extensions {
        builder = builder.extension(extension);
    }
    Arc::new(ResolutionEngine::new(builder.build().unwrap()))
}

fn member(engine: &Arc<ResolutionEngine>, path: &[u32]) -> Arc<Declaration> {
    let file = engine.project().file_id("app", "Box.kt").unwrap();
    let element = engine
        .resolve_session("app")
        .unwrap()
        .get_or_build_ir_for(&SourceElement::declaration(file, path))
        .unwrap()
        .unwrap();
    element.as_declaration().unwrap().clone()
}

fn bound_target(declaration: &Declaration) -> Option<ReferenceTarget> {
    match &declaration.body {
        Some(IrBody::Expression(IrExpression::Call { callee, .. })) => callee.target(),
        Some(IrBody::Expression(IrExpression::Reference(reference))) => reference.target(),
        _ => None,
    }
}

#[test]
fn test_generated_function_is_found_by_body_resolve() {
    let generated = Arc::new(AtomicUsize::new(0));
    let engine = engine(vec![Box::new(Builders {
        generated: generated.clone(),
    })]);
    let size = member(&engine, &[0, 0]);
    engine.lazy_resolve(&size, ResolvePhase::BodyResolve).unwrap();

    match bound_target(&size) {
        Some(ReferenceTarget::Resolved { target, kind, .. }) => {
            assert_eq!(target, "app/Box.build");
            assert_eq!(kind, DeclarationKind::Function);
        }
        other => panic!("build not bound: {:?}", other),
    }
    assert_eq!(size.type_ref.resolved(), Some(ResolvedType::builtin("Int")));
    assert!(size.diagnostics().is_empty());

    let session = engine.session_for(size.module).unwrap();
    let scope = session.member_scope(&member(&engine, &[0]));
    let build = scope.callables(&Name::identifier("build")).unwrap();
    assert_eq!(build.len(), 1);
    assert_eq!(build[0].origin.generated_by(), Some("builders"));
    assert_eq!(build[0].phase(), ResolvePhase::BodyResolve);
    assert_eq!(generated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_generated_companion_members_are_in_scope() {
    let engine = engine(vec![Box::new(Builders {
        generated: Arc::new(AtomicUsize::new(0)),
    })]);
    let label = member(&engine, &[1, 0]);
    engine.lazy_resolve(&label, ResolvePhase::BodyResolve).unwrap();

    let owner = member(&engine, &[1]);
    let companion = owner.companion().expect("companion generated");
    assert_eq!(companion.origin.generated_by(), Some("builders"));
    assert!(companion.is_companion);
    assert!(member(&engine, &[0]).companion().is_none());

    match bound_target(&label) {
        Some(ReferenceTarget::Resolved { target, .. }) => {
            assert_eq!(target, "app/Crate.Companion.make")
        }
        other => panic!("make not bound: {:?}", other),
    }
    assert_eq!(label.type_ref.resolved(), Some(ResolvedType::builtin("String")));
}

#[test]
fn test_single_nested_class_generator() {
    let engine = engine(vec![Box::new(NestedBuilder("first"))]);
    let nested = member(&engine, &[0, 1]);
    engine.lazy_resolve(&nested, ResolvePhase::BodyResolve).unwrap();
    assert_eq!(
        nested.type_ref.resolved(),
        Some(ResolvedType::Class(ClassId::from_string("app/Box.Builder")))
    );
}

#[test]
fn test_conflicting_nested_classes() {
    let engine = engine(vec![
        Box::new(NestedBuilder("first")),
        Box::new(NestedBuilder("second")),
    ]);
    let nested = member(&engine, &[0, 1]);
    let err = engine.lazy_resolve(&nested, ResolvePhase::BodyResolve).unwrap_err();
    match &err {
        ResolveError::ConflictingGeneratedNestedClass {
            owner,
            name,
            declarations,
        } => {
            assert_eq!(*owner, ClassId::from_string("app/Box"));
            assert_eq!(name.as_str(), "Builder");
            assert_eq!(declarations.len(), 2);
        }
        other => panic!("unexpected error: {}", other),
    }
    assert!(err.to_string().starts_with(
        "Multiple plugins generated nested class with same name Builder for class app/Box:"
    ));
}
