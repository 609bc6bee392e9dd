//! IR Rendering
//!
//! Text rendering of declarations for error messages and debugging, and a JSON
//! snapshot of a file's declarations with their phases.

use super::declaration::{
    Declaration, DeclarationKind, IrBody, IrExpression, IrFile, IrLiteral, IrStatement,
    ReferenceTarget,
};
use super::phase::ResolvePhase;
use crate::names::Name;
use serde::Serialize;
use std::fmt::Write;

/// One-line header followed by members, indented
pub fn render_declaration(declaration: &Declaration) -> String {
    let mut out = String::new();
    render_into(&mut out, declaration, 0);
    out
}

pub fn render_file(file: &IrFile) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "FILE: {} [{}]", file.name, file.phase());
    if !file.package.is_root() {
        let _ = writeln!(out, "package {}", file.package);
    }
    for import in &file.imports {
        let suffix = if import.all_under { ".*" } else { "" };
        match &import.alias {
            Some(alias) => {
                let _ = writeln!(out, "import {}{} as {}", import.path, suffix, alias);
            }
            None => {
                let _ = writeln!(out, "import {}{}", import.path, suffix);
            }
        }
    }
    for declaration in &file.declarations {
        render_into(&mut out, declaration, 0);
    }
    out
}

fn render_into(out: &mut String, declaration: &Declaration, depth: usize) {
    let indent = "  ".repeat(depth);
    let _ = write!(out, "{}", indent);
    for annotation in &declaration.annotations {
        let _ = write!(out, "@{}", annotation.name);
        if !annotation.arguments.is_empty() {
            let _ = write!(out, "({})", annotation.arguments.join(", "));
        }
        out.push(' ');
    }
    let _ = write!(out, "{} ", declaration.visibility);
    if declaration.is_companion {
        out.push_str("companion ");
    }
    if declaration.is_static {
        out.push_str("static ");
    }
    let _ = write!(out, "{} {}", declaration.kind.keyword(), declaration.name);

    if !declaration.parameters.is_empty()
        || (declaration.kind.is_callable() && declaration.kind != DeclarationKind::Property)
    {
        let parameters: Vec<String> = declaration
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name, type_text(p)))
            .collect();
        let _ = write!(out, "({})", parameters.join(", "));
    }
    if declaration.kind.is_callable() || declaration.kind == DeclarationKind::TypeAlias {
        let _ = write!(out, ": {}", type_text(declaration));
    }
    if !declaration.supertypes.is_empty() {
        let supertypes: Vec<String> = declaration
            .supertypes
            .iter()
            .map(|s| match s.resolved() {
                Some(ty) => ty.to_string(),
                None => s.written.clone().unwrap_or_default(),
            })
            .collect();
        let _ = write!(out, " : {}", supertypes.join(", "));
    }
    if let Some(extension) = declaration.origin.generated_by() {
        let _ = write!(out, " <generated by {}>", extension);
    }
    let _ = writeln!(out, " [{}]", declaration.phase());

    if let Some(body) = &declaration.body {
        let _ = writeln!(out, "{}  = {}", indent, render_body(body));
    }
    for member in &declaration.members {
        render_into(out, member, depth + 1);
    }
    if let Some(companion) = declaration.generated_companion() {
        render_into(out, &companion, depth + 1);
    }
}

fn type_text(declaration: &Declaration) -> String {
    match (declaration.type_ref.resolved(), &declaration.type_ref.written) {
        (Some(ty), _) => ty.to_string(),
        (None, Some(written)) => written.clone(),
        (None, None) => "<implicit>".to_string(),
    }
}

pub fn render_body(body: &IrBody) -> String {
    match body {
        IrBody::Expression(expression) => render_expression(expression),
        IrBody::Block(statements) => render_statements(statements),
    }
}

fn render_statements(statements: &[IrStatement]) -> String {
    let rendered: Vec<String> = statements
        .iter()
        .map(|statement| match statement {
            IrStatement::Expression(e) => render_expression(e),
            IrStatement::Return(e) => format!("return {}", render_expression(e)),
            IrStatement::Declaration(d) => format!("{} {}", d.kind.keyword(), d.name),
        })
        .collect();
    format!("{{ {} }}", rendered.join("; "))
}

pub fn render_expression(expression: &IrExpression) -> String {
    match expression {
        IrExpression::Literal(IrLiteral::Int(value)) => value.to_string(),
        IrExpression::Literal(IrLiteral::Str(value)) => format!("{:?}", value),
        IrExpression::Literal(IrLiteral::Bool(value)) => value.to_string(),
        IrExpression::Reference(reference) => render_reference(&reference.name, reference.target()),
        IrExpression::Call { callee, arguments } => {
            let callee = render_reference(&callee.name, callee.target());
            let arguments: Vec<String> = arguments.iter().map(render_expression).collect();
            format!("{}({})", callee, arguments.join(", "))
        }
        IrExpression::Block(statements) => render_statements(statements),
    }
}

fn render_reference(name: &str, target: Option<ReferenceTarget>) -> String {
    match target {
        Some(ReferenceTarget::Resolved { target, .. }) => format!("{}#{}", name, target),
        Some(ReferenceTarget::Unresolved) => format!("{}#?", name),
        None => name.to_string(),
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DeclarationSnapshot {
    pub name: Name,
    pub kind: DeclarationKind,
    pub phase: ResolvePhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<DeclarationSnapshot>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct FileSnapshot {
    pub name: String,
    pub package: String,
    pub phase: ResolvePhase,
    pub declarations: Vec<DeclarationSnapshot>,
}

pub fn snapshot_declaration(declaration: &Declaration) -> DeclarationSnapshot {
    DeclarationSnapshot {
        name: declaration.name.clone(),
        kind: declaration.kind,
        phase: declaration.phase(),
        ty: declaration.type_ref.resolved().map(|ty| ty.to_string()),
        diagnostics: declaration.diagnostics().iter().map(|d| d.to_string()).collect(),
        members: declaration.members.iter().map(|m| snapshot_declaration(m)).collect(),
    }
}

/// JSON snapshot of a file's declarations and phases
pub fn snapshot_file(file: &IrFile) -> serde_json::Value {
    let snapshot = FileSnapshot {
        name: file.name.clone(),
        package: file.package.as_string(),
        phase: file.phase(),
        declarations: file.declarations.iter().map(|d| snapshot_declaration(d)).collect(),
    };
    serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{FileId, ModuleId};
    use crate::ir::builder::RawIrBuilder;
    use crate::syntax::{RawExpr, SourceDeclaration, SourceFile};

    fn file() -> IrFile {
        let source = SourceFile::new("Box.kt", "lib")
            .with_import("kotlin.collections.*")
            .with_declaration(
                SourceDeclaration::class("Box").with_supertype("Any").with_member(
                    SourceDeclaration::function("size")
                        .returns("Int")
                        .with_expression(RawExpr::Int(3)),
                ),
            );
        RawIrBuilder::new(ModuleId::from_raw(0)).build_file(FileId::from_raw(0), &source)
    }

    #[test]
    fn test_render_file() {
        let rendered = render_file(&file());
        assert!(rendered.contains("FILE: Box.kt [RAW_FIR]"));
        assert!(rendered.contains("import kotlin.collections.*"));
        assert!(rendered.contains("public class Box : Any [RAW_FIR]"));
        assert!(rendered.contains("  public fun size(): Int [RAW_FIR]"));
        assert!(rendered.contains("= 3"));
    }

    #[test]
    fn test_snapshot_file() {
        let snapshot = snapshot_file(&file());
        assert_eq!(snapshot["package"], "lib");
        assert_eq!(snapshot["declarations"][0]["kind"], "class");
        assert_eq!(snapshot["declarations"][0]["phase"], "RAW");
        assert_eq!(snapshot["declarations"][0]["members"][0]["name"], "size");
    }
}
