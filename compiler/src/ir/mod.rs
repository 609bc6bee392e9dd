//! Typed Intermediate Representation
//!
//! The resolution engine works on a lazily resolved IR of source declarations:
//! - [`builder`] turns raw syntax into IR at `ResolvePhase::Raw`
//! - [`phase`] defines the resolution phases and the monotone phase marker
//! - [`designation`] addresses one declaration inside a file
//! - [`render`] prints IR for messages, debugging and snapshots

pub mod builder;
pub mod declaration;
pub mod designation;
pub mod diagnostics;
pub mod phase;
pub mod render;

pub use builder::RawIrBuilder;
pub use declaration::{
    Declaration, DeclarationKind, DeclarationOrigin, ImportTarget, IrAnnotation, IrBody, IrElement,
    IrExpression, IrFile, IrImport, IrLiteral, IrReference, IrStatement, IrTypeRef, ReferenceTarget,
    ResolvedType,
};
pub use designation::Designation;
pub use diagnostics::{DiagnosticKind, IrDiagnostic};
pub use phase::{PhaseCell, ResolvePhase};
