//! Sessions
//!
//! - [`ModuleSession`]: per-module IR, providers and member scopes
//! - [`SessionCache`]: sessions keyed by module, rebuilt after source changes
//! - [`ResolutionEngine`]: project + session cache + lazy resolver
//! - [`ResolveSession`]: use-site handle answering requests for one module
//! - [`code_fragment`]: IR of debugger code fragments

pub mod code_fragment;
pub mod engine;
pub mod module_session;
pub mod resolve_session;
pub mod session_cache;

pub use code_fragment::{GENERATED_CLASS_NAME, GENERATED_FUNCTION_NAME};
pub use engine::ResolutionEngine;
pub use module_session::ModuleSession;
pub use resolve_session::ResolveSession;
pub use session_cache::SessionCache;
