//! Lazy resolution: the phase contract, pluggable phase resolvers, designated
//! transformers and the resolver driving them.

pub mod contract;
pub mod phase_resolver;
pub mod resolver;
pub mod transformers;

pub use contract::{current_phase, run_at_phase, ContractChecker};
pub use phase_resolver::{PhaseResolver, ReferenceResolver, ResolveContext};
pub use resolver::{collect_designations, LazyDeclarationResolver};
pub use transformers::{update_declaration_internals_phase, DesignatedTransformer};
