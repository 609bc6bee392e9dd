use lazy_resolve::ir::{DeclarationOrigin, DiagnosticKind, ResolvedType};
use lazy_resolve::project::manifest::parse_manifest;
use lazy_resolve::project::services::JavaClass;
use lazy_resolve::syntax::RawExpr;
use lazy_resolve::*;
use std::collections::HashMap;
use std::sync::Arc;

const MANIFEST: &str = r#"
[[module]]
name = "lib"
kind = "library"
files = ["lib/Util.kt"]

[[module]]
name = "app"
files = ["app/Main.kt"]
dependencies = ["lib"]

[cache]
class = { protected = 8, probationary = 4 }

[resolve]
parallel-file-resolution = false
"#;

fn sources() -> HashMap<&'static str, SourceFile> {
    let mut files = HashMap::new();
    files.insert(
        "lib/Util.kt",
        SourceFile::new("Util.kt", "lib")
            .with_declaration(SourceDeclaration::class("Box"))
            .with_declaration(
                SourceDeclaration::property("answer").with_expression(RawExpr::Int(42)),
            ),
    );
    files.insert(
        "app/Main.kt",
        SourceFile::new("Main.kt", "app")
            .with_import("lib.*")
            .with_declaration(SourceDeclaration::property("box").returns("Box"))
            .with_declaration(
                SourceDeclaration::function("read").with_expression(RawExpr::reference("answer")),
            ),
    );
    files
}

fn by_index(
    session: &ResolveSession,
    file: FileId,
    index: u32,
    phase: ResolvePhase,
) -> Arc<Declaration> {
    session
        .resolve_to_phase(&SourceElement::declaration(file, &[index]), phase)
        .unwrap()
        .unwrap()
        .as_declaration()
        .unwrap()
        .clone()
}

#[test]
fn test_project_from_manifest() {
    lazy_resolve::logging::init_test();
    let manifest = parse_manifest(MANIFEST).unwrap();
    let files = sources();
    let project = ProjectBuilder::from_manifest(&manifest, |path| {
        files.get(path).cloned().ok_or_else(|| ResolveError::Manifest {
            message: format!("missing {}", path),
        })
    })
    .unwrap()
    .build()
    .unwrap();
    assert_eq!(project.config.class_cache, SlruCapacity::new(8, 4));
    assert!(!project.config.parallel_file_resolution);

    let main = project.file_id("app", "Main.kt").unwrap();
    let engine = Arc::new(ResolutionEngine::new(project));
    let app = engine.resolve_session("app").unwrap();

    let boxed = by_index(&app, main, 0, ResolvePhase::Types);
    assert_eq!(
        boxed.type_ref.resolved(),
        Some(ResolvedType::Class(ClassId::from_string("lib/Box")))
    );
    let read = by_index(&app, main, 1, ResolvePhase::BodyResolve);
    assert_eq!(read.type_ref.resolved(), Some(ResolvedType::builtin("Int")));
    assert!(read.diagnostics().is_empty());

    engine.resolve_file_to_phase(main, ResolvePhase::BodyResolve).unwrap();
}

#[test]
fn test_manifest_with_missing_file() {
    let manifest = parse_manifest(MANIFEST).unwrap();
    let result = ProjectBuilder::from_manifest(&manifest, |path| {
        Err(ResolveError::Manifest {
            message: format!("cannot read {}", path),
        })
    });
    assert!(matches!(result, Err(ResolveError::Manifest { .. })));
}

#[test]
fn test_invalid_module_graphs() {
    let unknown = ProjectBuilder::new()
        .module(ModuleSpec::source("app").depends("nowhere"))
        .build();
    assert!(matches!(unknown, Err(ResolveError::UnknownModule { .. })));

    let cyclic = ProjectBuilder::new()
        .module(ModuleSpec::source("a").depends("b"))
        .module(ModuleSpec::source("b").depends("a"))
        .build();
    match cyclic {
        Err(ResolveError::CyclicModuleDependencies { cycle }) => {
            assert!(cycle.contains(&"a".to_string()));
            assert!(cycle.contains(&"b".to_string()));
        }
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("cycle accepted"),
    }
}

fn duplicate(package_file: &str) -> SourceFile {
    SourceFile::new(package_file, "shared")
        .with_declaration(SourceDeclaration::class("Dup"))
        .with_declaration(SourceDeclaration::function("util").with_expression(RawExpr::Int(1)))
}

fn precedence_engine(first: &str, second: &str) -> Arc<ResolutionEngine> {
    lazy_resolve::logging::init_test();
    let project = ProjectBuilder::new()
        .module(ModuleSpec::library("one"))
        .module(ModuleSpec::library("two"))
        .module(ModuleSpec::source("app").depends(first).depends(second))
        .source_file("one", duplicate("One.kt"))
        .source_file("two", duplicate("Two.kt"))
        .build()
        .unwrap();
    Arc::new(ResolutionEngine::new(project))
}

#[test]
fn test_dependency_order_decides_precedence() {
    for (first, second) in [("one", "two"), ("two", "one")] {
        let engine = precedence_engine(first, second);
        let app = engine.resolve_session("app").unwrap();
        let winner = engine.project().structure.module_by_name(first).unwrap().id;
        let loser = engine.project().structure.module_by_name(second).unwrap().id;

        let dup = app.class_like_symbol(&ClassId::from_string("shared/Dup")).unwrap().unwrap();
        assert_eq!(dup.module(), winner);

        let util = app
            .top_level_callables(&FqName::from_dotted("shared"), &Name::identifier("util"))
            .unwrap();
        let modules: Vec<ModuleId> = util.iter().map(|symbol| symbol.module()).collect();
        assert_eq!(modules, vec![winner, loser]);
    }
}

#[test]
fn test_combined_provider_is_cached() {
    let engine = precedence_engine("one", "two");
    let app = engine.resolve_session("app").unwrap();
    let id = ClassId::from_string("shared/Dup");
    let first = app.class_like_symbol(&id).unwrap();
    let queries = engine.project().index.counters().class_like;
    let second = app.class_like_symbol(&id).unwrap();
    assert_eq!(first, second);
    assert_eq!(engine.project().index.counters().class_like, queries);

    assert!(app.class_like_symbol(&ClassId::from_string("shared/Missing")).unwrap().is_none());
    assert_eq!(engine.project().index.counters().class_like, queries);
}

#[test]
fn test_java_classes_of_dependencies() {
    lazy_resolve::logging::init_test();
    let project = ProjectBuilder::new()
        .module(ModuleSpec::library("jlib"))
        .module(ModuleSpec::source("app").depends("jlib"))
        .java_class(
            "jlib",
            JavaClass::new(ClassId::from_string("jlib/Widget")).with_method("size", "int"),
        )
        .java_class(
            "jlib",
            JavaClass::new(ClassId::from_string("jlib/Compiled")).with_metadata_annotation(),
        )
        .source_file(
            "app",
            SourceFile::new("Main.kt", "app")
                .with_import("jlib.Widget")
                .with_declaration(SourceDeclaration::property("widget").returns("Widget")),
        )
        .build()
        .unwrap();
    let main = project.file_id("app", "Main.kt").unwrap();
    let engine = Arc::new(ResolutionEngine::new(project));
    let app = engine.resolve_session("app").unwrap();

    let widget = app.class_like_symbol(&ClassId::from_string("jlib/Widget")).unwrap().unwrap();
    assert_eq!(widget.declaration().origin, DeclarationOrigin::Java);
    assert_eq!(widget.declaration().phase(), ResolvePhase::BodyResolve);
    assert_eq!(widget.declaration().members.len(), 1);
    assert!(app.class_like_symbol(&ClassId::from_string("jlib/Compiled")).unwrap().is_none());

    let property = by_index(&app, main, 0, ResolvePhase::Types);
    assert_eq!(
        property.type_ref.resolved(),
        Some(ResolvedType::Class(ClassId::from_string("jlib/Widget")))
    );
}

#[test]
fn test_friend_modules_see_internals() {
    lazy_resolve::logging::init_test();
    let lib = SourceFile::new("Lib.kt", "lib")
        .with_declaration(
            SourceDeclaration::function("inner").internal().with_expression(RawExpr::Int(1)),
        );
    let caller = |name: &str| {
        SourceFile::new(&format!("{}.kt", name), name)
            .with_import("lib.inner")
            .with_declaration(
                SourceDeclaration::function("call").with_expression(RawExpr::call("inner", vec![])),
            )
    };
    let project = ProjectBuilder::new()
        .module(ModuleSpec::source("lib"))
        .module(ModuleSpec::source("tests").depends("lib").friend("lib"))
        .module(ModuleSpec::source("other").depends("lib"))
        .source_file("lib", lib)
        .source_file("tests", caller("tests"))
        .source_file("other", caller("other"))
        .build()
        .unwrap();
    let engine = Arc::new(ResolutionEngine::new(project));

    for (module, visible) in [("tests", true), ("other", false)] {
        let file = engine.project().file_id(module, &format!("{}.kt", module)).unwrap();
        let session = engine.resolve_session(module).unwrap();
        let call = by_index(&session, file, 0, ResolvePhase::BodyResolve);
        let kinds: Vec<DiagnosticKind> = call.diagnostics().iter().map(|d| d.kind).collect();
        if visible {
            assert!(kinds.is_empty(), "{}: {:?}", module, kinds);
        } else {
            assert_eq!(kinds, vec![DiagnosticKind::InvisibleReference], "{}", module);
        }
    }
}
