//! Per-package name sets used to reject lookups before any index query
//!
//! A `None` set means the names can't be enumerated, in which case nothing is
//! rejected.

use super::slru::SlruCache;
use crate::config::SlruCapacity;
use crate::names::{ClassId, FqName, Name};
use fxhash::FxHashSet;
use std::sync::Arc;

pub type NameSet = Arc<FxHashSet<Name>>;

type NamesFn = Box<dyn Fn(&FqName) -> Option<FxHashSet<Name>> + Send + Sync>;

pub struct SymbolNameCache {
    classifiers: SlruCache<FqName, Option<NameSet>>,
    callables: SlruCache<FqName, Option<NameSet>>,
    compute_classifiers: NamesFn,
    compute_callables: NamesFn,
}

impl SymbolNameCache {
    pub fn new(
        capacity: SlruCapacity,
        compute_classifiers: impl Fn(&FqName) -> Option<FxHashSet<Name>> + Send + Sync + 'static,
        compute_callables: impl Fn(&FqName) -> Option<FxHashSet<Name>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            classifiers: SlruCache::new(capacity),
            callables: SlruCache::new(capacity),
            compute_classifiers: Box::new(compute_classifiers),
            compute_callables: Box::new(compute_callables),
        }
    }

    /// Cache that never rejects anything
    pub fn unknown() -> Self {
        Self::new(SlruCapacity::new(0, 0), |_| None, |_| None)
    }

    pub fn classifier_names(&self, package: &FqName) -> Option<NameSet> {
        self.classifiers
            .get_or_compute(package, || (self.compute_classifiers)(package).map(Arc::new))
    }

    pub fn callable_names(&self, package: &FqName) -> Option<NameSet> {
        self.callables
            .get_or_compute(package, || (self.compute_callables)(package).map(Arc::new))
    }

    /// Checks the outermost class name, so nested classes pass with their container
    pub fn may_have_top_level_classifier(&self, class_id: &ClassId) -> bool {
        if class_id.outermost_class_name().is_special() {
            return false;
        }
        match self.classifier_names(class_id.package()) {
            Some(names) => names.contains(class_id.outermost_class_name()),
            None => true,
        }
    }

    pub fn may_have_top_level_callable(&self, package: &FqName, name: &Name) -> bool {
        if name.is_special() {
            return false;
        }
        match self.callable_names(package) {
            Some(names) => names.contains(name),
            None => true,
        }
    }
}

/// Union of name sets; unknown as soon as one part is unknown
pub fn union_names<I>(parts: I) -> Option<FxHashSet<Name>>
where
    I: IntoIterator<Item = Option<NameSet>>,
{
    let mut names = FxHashSet::default();
    for part in parts {
        names.extend(part?.iter().cloned());
    }
    Some(names)
}
