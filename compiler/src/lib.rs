//! Lazy Declaration Resolution
//!
//! An incremental resolution core for IDE-style analysis: declarations are
//! resolved on demand, one phase at a time, only along the path that leads to
//! the declaration someone asked about. Symbol providers answer lookups per
//! module and are combined per dependency set; results are cached in bounded
//! SLRU caches and in sessions invalidated by a modification tracker.

pub mod caches;
pub mod config;
pub mod error;
pub mod extensions;
pub mod ids;
pub mod ir;
pub mod lazy;
pub mod logging;
pub mod names;
pub mod project;
pub mod providers;
pub mod scopes;
pub mod session;
pub mod syntax;

pub use config::{ResolveConfig, SlruCapacity};
pub use error::{ResolveError, ResolveResult};
pub use extensions::{DeclarationGenerationExtension, ExtensionRegistry};
pub use ids::{DeclarationId, FileId, ModuleId};
pub use ir::{Declaration, IrElement, IrFile, ResolvePhase};
pub use names::{CallableId, ClassId, FqName, Name};
pub use project::module::ModuleSpec;
pub use project::{Project, ProjectBuilder};
pub use providers::{CallableSymbol, ClassLikeSymbol, SymbolProvider};
pub use session::{ResolutionEngine, ResolveSession};
pub use syntax::{SourceDeclaration, SourceElement, SourceFile};
