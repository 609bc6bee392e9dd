//! Session Cache
//!
//! One [`ModuleSession`] per module, each held in a [`FlexibleCachedValue`]
//! that depends on the project modification tracker. A source change makes
//! every session stale; the next request rebuilds it, dependencies first.

use super::code_fragment::{build_code_fragment_file, generated_class_id};
use super::module_session::ModuleSession;
use crate::caches::{FlexibleCachedValue, MemoMap};
use crate::error::{ResolveError, ResolveResult};
use crate::ids::ModuleId;
use crate::project::module::{Module, ModuleKind};
use crate::project::services::{ModificationTracker, ProjectStructureProvider};
use crate::project::Project;
use log::debug;
use std::sync::{Arc, Weak};

pub struct SessionCache {
    this: Weak<SessionCache>,
    project: Arc<Project>,
    sessions: MemoMap<ModuleId, Arc<FlexibleCachedValue<ModuleSession>>>,
}

impl SessionCache {
    pub fn new(project: Arc<Project>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            project,
            sessions: MemoMap::new(),
        })
    }

    /// Up-to-date session of `module`, built on first use and after every change
    pub fn session_for(&self, module: ModuleId) -> ResolveResult<Arc<ModuleSession>> {
        self.sessions
            .get_or_compute(&module, || Arc::new(self.cached_session(module)))
            .value()
    }

    /// Whether the session of `module` exists and matches the current project state
    pub fn is_up_to_date(&self, module: ModuleId) -> bool {
        self.sessions
            .get(&module)
            .map_or(false, |cached| cached.is_up_to_date())
    }

    /// Drop strong references to every session; sessions still in use survive
    pub fn soften_all(&self) {
        for cached in self.sessions.values() {
            cached.soften();
        }
    }

    fn cached_session(&self, module: ModuleId) -> FlexibleCachedValue<ModuleSession> {
        let cache = self.this.clone();
        FlexibleCachedValue::new(move || {
            let cache = cache
                .upgrade()
                .ok_or(ResolveError::SessionUnavailable { module })?;
            let session = cache.build_session(module)?;
            let tracker: Arc<dyn ModificationTracker> = cache.project.tracker.clone();
            Ok((session, tracker))
        })
    }

    fn build_session(&self, id: ModuleId) -> ResolveResult<ModuleSession> {
        let module = self
            .project
            .structure
            .module(id)
            .ok_or_else(|| ResolveError::UnknownModule { module: id.to_string() })?;
        let dependencies = module
            .dependencies_in_order()
            .into_iter()
            .map(|dependency| self.session_for(dependency))
            .collect::<ResolveResult<Vec<_>>>()?;
        debug!(
            "Building session for {} with {} dependencies",
            module.description(),
            dependencies.len()
        );
        if module.is_code_fragment() {
            self.build_code_fragment_session(module, &dependencies)
        } else {
            Ok(ModuleSession::source(self.project.clone(), module, &dependencies))
        }
    }

    fn build_code_fragment_session(
        &self,
        module: Arc<Module>,
        dependencies: &[Arc<ModuleSession>],
    ) -> ResolveResult<ModuleSession> {
        let ModuleKind::CodeFragment {
            source_file,
            fragment_file,
            ..
        } = module.kind
        else {
            return Err(ResolveError::UnknownModule {
                module: module.name.clone(),
            });
        };
        let sources = &self.project.sources;
        let host = sources
            .get(source_file)
            .ok_or(ResolveError::UnknownFile { file: source_file })?;
        let fragment = sources
            .get(fragment_file)
            .ok_or(ResolveError::UnknownFile { file: fragment_file })?;
        let ir = build_code_fragment_file(module.id, fragment_file, &host, &fragment)?;

        let session = ModuleSession::code_fragment(self.project.clone(), module, dependencies);
        let ir = session.files().insert(Arc::new(ir));
        let wrapper_id = generated_class_id();
        if let (Some(provider), Some(wrapper)) = (
            session.code_fragment_provider(),
            ir.declarations
                .iter()
                .find(|declaration| declaration.class_id.as_ref() == Some(&wrapper_id)),
        ) {
            provider.register(wrapper.clone());
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::module::ModuleSpec;
    use crate::project::ProjectBuilder;
    use crate::syntax::{SourceDeclaration, SourceFile};

    fn cache() -> (Arc<SessionCache>, Arc<Project>) {
        let project = ProjectBuilder::new()
            .module(ModuleSpec::source("lib"))
            .module(ModuleSpec::source("app").depends("lib"))
            .source_file(
                "lib",
                SourceFile::new("Lib.kt", "lib").with_declaration(SourceDeclaration::function("f")),
            )
            .source_file("app", SourceFile::new("App.kt", "app"))
            .build()
            .unwrap();
        let project = Arc::new(project);
        (SessionCache::new(project.clone()), project)
    }

    fn module(project: &Project, name: &str) -> ModuleId {
        project.structure.module_by_name(name).unwrap().id
    }

    #[test]
    fn test_sessions_are_reused_until_a_change() {
        let (cache, project) = cache();
        let app = module(&project, "app");
        let lib = module(&project, "lib");
        assert!(!cache.is_up_to_date(app));

        let first = cache.session_for(app).unwrap();
        assert!(Arc::ptr_eq(&first, &cache.session_for(app).unwrap()));
        assert!(cache.is_up_to_date(app));
        assert!(cache.is_up_to_date(lib), "dependencies are built first");

        let file = project.file_id("lib", "Lib.kt").unwrap();
        project.update_file(file, SourceFile::new("Lib.kt", "lib")).unwrap();
        assert!(!cache.is_up_to_date(app));
        assert!(!cache.is_up_to_date(lib));

        let rebuilt = cache.session_for(app).unwrap();
        assert!(!Arc::ptr_eq(&first, &rebuilt));
        assert!(cache.is_up_to_date(app));
    }

    #[test]
    fn test_softened_sessions_survive_while_held() {
        let (cache, project) = cache();
        let app = module(&project, "app");
        let held = cache.session_for(app).unwrap();
        cache.soften_all();
        assert!(Arc::ptr_eq(&held, &cache.session_for(app).unwrap()));

        let weak = Arc::downgrade(&held);
        drop(held);
        cache.soften_all();
        assert!(weak.upgrade().is_none());
        let rebuilt = cache.session_for(app).unwrap();
        assert!(cache.is_up_to_date(app));
        drop(rebuilt);
    }

    #[test]
    fn test_unknown_module() {
        let (cache, _) = cache();
        let err = cache.session_for(ModuleId::from_raw(77)).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownModule { .. }));
    }
}
