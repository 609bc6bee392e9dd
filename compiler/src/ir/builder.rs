//! Raw IR Builder
//!
//! Turns a [`SourceFile`] into an [`IrFile`] at phase `RAW_FIR`. Member order is
//! preserved, so a [`SourcePath`](crate::syntax::SourcePath) that addresses a
//! declaration in the source also addresses it in the IR.

use super::declaration::{
    Declaration, DeclarationKind, DeclarationOrigin, IrAnnotation, IrBody, IrExpression, IrFile,
    IrImport, IrLiteral, IrReference, IrStatement, IrTypeRef,
};
use crate::ids::{FileId, ModuleId};
use crate::names::{ClassId, FqName, Name};
use crate::syntax::{
    RawBody, RawExpr, RawStatement, SourceAnnotation, SourceDeclaration, SourceDeclarationKind,
    SourceFile, SourceParameter,
};
use log::trace;
use std::sync::Arc;

/// Where a declaration being converted lives
#[derive(Debug, Clone)]
enum Container {
    TopLevel,
    Class(ClassId),
    Local,
}

/// Builds raw IR for one module
pub struct RawIrBuilder {
    module: ModuleId,
    origin: DeclarationOrigin,
}

impl RawIrBuilder {
    pub fn new(module: ModuleId) -> Self {
        Self {
            module,
            origin: DeclarationOrigin::Source,
        }
    }

    pub fn with_origin(mut self, origin: DeclarationOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn build_file(&self, file: FileId, source: &SourceFile) -> IrFile {
        let mut ir = IrFile::new(file, self.module, &source.name, source.package.clone());
        ir.imports = source
            .imports
            .iter()
            .map(|import| {
                IrImport::new(import.path.clone(), import.alias.clone(), import.all_under)
            })
            .collect();
        ir.annotations = convert_annotations(&source.annotations);
        ir.declarations = source
            .declarations
            .iter()
            .map(|declaration| {
                Arc::new(self.convert(file, &source.package, &Container::TopLevel, declaration))
            })
            .collect();
        trace!(
            "Built raw IR for {} ({} declarations)",
            source.name,
            ir.declarations.len()
        );
        ir
    }

    /// Convert a top-level declaration of `package`
    pub fn build_top_level(
        &self,
        file: FileId,
        package: &FqName,
        declaration: &SourceDeclaration,
    ) -> Declaration {
        self.convert(file, package, &Container::TopLevel, declaration)
    }

    fn convert(
        &self,
        file: FileId,
        package: &FqName,
        container: &Container,
        source: &SourceDeclaration,
    ) -> Declaration {
        let kind = convert_kind(source.kind);
        let name = if source.kind == SourceDeclarationKind::Constructor {
            Name::init()
        } else {
            Name::identifier(&source.name)
        };

        let mut declaration = if kind.is_class_like() && !matches!(container, Container::Local) {
            let class_id = match container {
                Container::Class(owner) => owner.create_nested(name),
                _ => ClassId::top_level(package.clone(), name),
            };
            Declaration::class_like(kind, class_id, self.origin.clone(), self.module)
        } else {
            let mut declaration =
                Declaration::new(kind, name, self.origin.clone(), self.module, package.clone());
            match container {
                Container::Class(owner) => declaration.containing_class = Some(owner.clone()),
                Container::Local => declaration.is_local = true,
                Container::TopLevel => {}
            }
            declaration
        };

        declaration.file = Some(file);
        declaration.visibility = source.visibility;
        declaration.is_companion = source.is_companion;
        declaration.annotations = convert_annotations(&source.annotations);
        declaration.supertypes = source.supertypes.iter().map(|s| IrTypeRef::written(s)).collect();
        declaration.type_ref = match &source.type_ref {
            Some(written) => IrTypeRef::written(written),
            None => IrTypeRef::implicit(),
        };
        declaration.parameters = source
            .parameters
            .iter()
            .map(|parameter| Arc::new(self.convert_parameter(file, package, parameter)))
            .collect();
        declaration.body = source.body.as_ref().map(|body| self.convert_body(file, package, body));

        if let Some(class_id) = declaration.class_id.clone() {
            let member_container = Container::Class(class_id);
            declaration.members = source
                .members
                .iter()
                .map(|member| Arc::new(self.convert(file, package, &member_container, member)))
                .collect();
        }
        declaration
    }

    fn convert_parameter(
        &self,
        file: FileId,
        package: &FqName,
        parameter: &SourceParameter,
    ) -> Declaration {
        let mut declaration = Declaration::new(
            DeclarationKind::ValueParameter,
            Name::identifier(&parameter.name),
            self.origin.clone(),
            self.module,
            package.clone(),
        )
        .in_file(file)
        .with_type(IrTypeRef::written(&parameter.type_ref));
        declaration.is_local = true;
        declaration
    }

    pub fn convert_body(&self, file: FileId, package: &FqName, body: &RawBody) -> IrBody {
        match body {
            RawBody::Expression(expression) => {
                IrBody::Expression(self.convert_expression(file, package, expression))
            }
            RawBody::Block(statements) => {
                IrBody::Block(self.convert_statements(file, package, statements))
            }
        }
    }

    fn convert_statements(
        &self,
        file: FileId,
        package: &FqName,
        statements: &[RawStatement],
    ) -> Vec<IrStatement> {
        statements
            .iter()
            .map(|statement| match statement {
                RawStatement::Expr(e) => {
                    IrStatement::Expression(self.convert_expression(file, package, e))
                }
                RawStatement::Return(e) => {
                    IrStatement::Return(self.convert_expression(file, package, e))
                }
                RawStatement::Declaration(local) => {
                    let local = self.convert(file, package, &Container::Local, local);
                    IrStatement::Declaration(Arc::new(local))
                }
            })
            .collect()
    }

    pub fn convert_expression(
        &self,
        file: FileId,
        package: &FqName,
        expression: &RawExpr,
    ) -> IrExpression {
        match expression {
            RawExpr::Int(value) => IrExpression::Literal(IrLiteral::Int(*value)),
            RawExpr::Str(value) => IrExpression::Literal(IrLiteral::Str(value.clone())),
            RawExpr::Bool(value) => IrExpression::Literal(IrLiteral::Bool(*value)),
            RawExpr::Reference(name) => IrExpression::Reference(IrReference::new(name)),
            RawExpr::Call { callee, arguments } => IrExpression::Call {
                callee: IrReference::new(callee),
                arguments: arguments
                    .iter()
                    .map(|argument| self.convert_expression(file, package, argument))
                    .collect(),
            },
            RawExpr::Block(statements) => {
                IrExpression::Block(self.convert_statements(file, package, statements))
            }
        }
    }
}

fn convert_kind(kind: SourceDeclarationKind) -> DeclarationKind {
    match kind {
        SourceDeclarationKind::Class => DeclarationKind::Class,
        SourceDeclarationKind::Interface => DeclarationKind::Interface,
        SourceDeclarationKind::Object => DeclarationKind::Object,
        SourceDeclarationKind::TypeAlias => DeclarationKind::TypeAlias,
        SourceDeclarationKind::Function => DeclarationKind::Function,
        SourceDeclarationKind::Property => DeclarationKind::Property,
        SourceDeclarationKind::Constructor => DeclarationKind::Constructor,
    }
}

fn convert_annotations(annotations: &[SourceAnnotation]) -> Vec<IrAnnotation> {
    annotations
        .iter()
        .map(|annotation| IrAnnotation::new(&annotation.name, annotation.arguments.clone()))
        .collect()
}
