//! Code Fragment IR
//!
//! A code fragment is a single expression (or block) evaluated in the context
//! of a host source file, as a debugger does. Its IR file lives in the root
//! package and consists of:
//!
//! - a file-level `@Suppress("INVISIBLE_REFERENCE", "INVISIBLE_MEMBER")`,
//!   since the fragment may touch private members of the host
//! - the fragment's own imports, then implicit imports of everything the host
//!   file declares (classes, nested classes, companion contents, top-level
//!   functions and properties)
//! - the declarations written in the fragment
//! - the object `Generated_for_debugger_class` with a constructor and the
//!   static function `generated_for_debugger_fun`, whose body returns the
//!   fragment expression

use crate::error::{ResolveError, ResolveResult};
use crate::ids::{FileId, ModuleId};
use crate::ir::{
    Declaration, DeclarationKind, DeclarationOrigin, IrAnnotation, IrBody, IrFile, IrImport,
    IrStatement, IrTypeRef, RawIrBuilder,
};
use crate::names::{CallableId, ClassId, FqName, Name};
use crate::syntax::{SourceDeclaration, SourceDeclarationKind, SourceFile};
use indexmap::IndexSet;
use std::sync::Arc;

pub const GENERATED_CLASS_NAME: &str = "Generated_for_debugger_class";
pub const GENERATED_FUNCTION_NAME: &str = "generated_for_debugger_fun";

const SUPPRESSED_IN_FRAGMENTS: [&str; 2] = ["INVISIBLE_REFERENCE", "INVISIBLE_MEMBER"];

pub fn generated_class_id() -> ClassId {
    ClassId::top_level(FqName::root(), Name::identifier(GENERATED_CLASS_NAME))
}

/// Qualified names the host file makes available to a fragment without imports
pub fn collect_implicit_imports(host: &SourceFile) -> Vec<FqName> {
    let mut imports = IndexSet::new();
    for declaration in &host.declarations {
        let path = host.package.child(Name::identifier(&declaration.name));
        if declaration.kind.is_class_like() {
            collect_class(&path, declaration, &mut imports);
        } else if is_function_or_property(declaration) {
            imports.insert(path);
        }
    }
    imports.into_iter().collect()
}

fn is_function_or_property(declaration: &SourceDeclaration) -> bool {
    matches!(
        declaration.kind,
        SourceDeclarationKind::Function | SourceDeclarationKind::Property
    )
}

fn collect_class(path: &FqName, class: &SourceDeclaration, imports: &mut IndexSet<FqName>) {
    imports.insert(path.clone());
    for member in &class.members {
        if !member.kind.is_class_like() {
            continue;
        }
        let member_path = path.child(Name::identifier(&member.name));
        if member.is_companion {
            imports.insert(member_path.clone());
            for companion_member in member.members.iter().filter(|m| is_function_or_property(m)) {
                imports.insert(member_path.child(Name::identifier(&companion_member.name)));
            }
        }
        collect_class(&member_path, member, imports);
    }
}

/// Build the IR file of `fragment`, evaluated inside `host`
pub fn build_code_fragment_file(
    module: ModuleId,
    file: FileId,
    host: &SourceFile,
    fragment: &SourceFile,
) -> ResolveResult<IrFile> {
    let [expression] = fragment.dangling.as_slice() else {
        return Err(ResolveError::InvalidCodeFragment {
            file,
            message: format!(
                "expected exactly one expression or block, found {}",
                fragment.dangling.len()
            ),
        });
    };

    let root = FqName::root();
    let builder = RawIrBuilder::new(module);
    let mut ir = IrFile::new(file, module, &fragment.name, root.clone());
    ir.annotations.push(IrAnnotation::new(
        "Suppress",
        SUPPRESSED_IN_FRAGMENTS.iter().map(|id| id.to_string()).collect(),
    ));
    ir.imports.extend(
        fragment
            .imports
            .iter()
            .map(|import| {
                IrImport::new(import.path.clone(), import.alias.clone(), import.all_under)
            }),
    );
    ir.imports.extend(
        collect_implicit_imports(host)
            .into_iter()
            .map(|path| IrImport::new(path, None, false)),
    );
    ir.declarations.extend(
        fragment
            .declarations
            .iter()
            .map(|declaration| Arc::new(builder.build_top_level(file, &root, declaration))),
    );

    let class_id = generated_class_id();
    let constructor = Declaration::callable(
        DeclarationKind::Constructor,
        &CallableId::member(&class_id, Name::init()),
        DeclarationOrigin::Synthetic,
        module,
    )
    .in_file(file);
    let function = Declaration::callable(
        DeclarationKind::Function,
        &CallableId::member(&class_id, Name::identifier(GENERATED_FUNCTION_NAME)),
        DeclarationOrigin::Synthetic,
        module,
    )
    .in_file(file)
    .as_static()
    .with_body(IrBody::Block(vec![IrStatement::Return(
        builder.convert_expression(file, &root, expression),
    )]));
    let mut wrapper = Declaration::class_like(
        DeclarationKind::Object,
        class_id,
        DeclarationOrigin::Synthetic,
        module,
    )
    .in_file(file)
    .with_member(constructor)
    .with_member(function);
    wrapper.supertypes.push(IrTypeRef::written("Any"));
    ir.declarations.push(Arc::new(wrapper));
    Ok(ir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::RawExpr;

    fn host() -> SourceFile {
        SourceFile::new("Host.kt", "app")
            .with_declaration(
                SourceDeclaration::class("Box")
                    .with_member(SourceDeclaration::class("Lid"))
                    .with_member(
                        SourceDeclaration::companion("Companion")
                            .with_member(SourceDeclaration::function("create")),
                    )
                    .with_member(SourceDeclaration::function("open")),
            )
            .with_declaration(SourceDeclaration::function("helper").private())
            .with_declaration(SourceDeclaration::property("answer"))
    }

    #[test]
    fn test_implicit_imports_cover_host_declarations() {
        let imports: Vec<String> = collect_implicit_imports(&host())
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(
            imports,
            vec![
                "app.Box",
                "app.Box.Lid",
                "app.Box.Companion",
                "app.Box.Companion.create",
                "app.helper",
                "app.answer",
            ]
        );
    }

    #[test]
    fn test_fragment_file_shape() {
        let fragment =
            SourceFile::new("fragment.kt", "").with_dangling(RawExpr::call("helper", vec![]));
        let ir =
            build_code_fragment_file(ModuleId::from_raw(3), FileId::from_raw(9), &host(), &fragment)
                .unwrap();
        assert!(ir.package.is_root());
        assert_eq!(ir.suppressed_diagnostics(), SUPPRESSED_IN_FRAGMENTS.to_vec());
        let wrapper = ir.declarations.last().unwrap();
        assert_eq!(wrapper.class_id, Some(generated_class_id()));
        assert_eq!(wrapper.origin, DeclarationOrigin::Synthetic);
        assert!(wrapper.members[0].name.is_init());
        let function = &wrapper.members[1];
        assert!(function.is_static);
        assert_eq!(function.name.as_str(), GENERATED_FUNCTION_NAME);
        assert!(matches!(
            function.body,
            Some(IrBody::Block(ref statements)) if statements.len() == 1
        ));
    }

    #[test]
    fn test_fragment_needs_exactly_one_expression() {
        let empty = SourceFile::new("fragment.kt", "");
        let result =
            build_code_fragment_file(ModuleId::from_raw(3), FileId::from_raw(9), &host(), &empty);
        assert!(matches!(result, Err(ResolveError::InvalidCodeFragment { .. })));
    }
}
