//! Flexible Cached Value
//!
//! Holds a value computed together with the modification tracker it depends
//! on. The value is kept through a strong reference and a weak one; `soften()`
//! drops the strong reference so the value is freed once no reader holds it,
//! after which the next access recomputes.
//!
//! Readers take a lock-free fast path while the recorded tracker count still
//! matches. The slow path computes at most once per invalidation.

use crate::error::ResolveResult;
use crate::project::services::ModificationTracker;
use log::warn;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

const NO_TIMESTAMP: u64 = u64::MAX;

pub type ComputeFn<T> =
    Box<dyn Fn() -> ResolveResult<(T, Arc<dyn ModificationTracker>)> + Send + Sync>;

pub struct FlexibleCachedValue<T> {
    compute: ComputeFn<T>,
    strong: Mutex<Option<Arc<T>>>,
    soft: RwLock<Weak<T>>,
    dependency: RwLock<Option<Arc<dyn ModificationTracker>>>,
    timestamp: AtomicU64,
    compute_lock: Mutex<()>,
}

impl<T> FlexibleCachedValue<T> {
    pub fn new(
        compute: impl Fn() -> ResolveResult<(T, Arc<dyn ModificationTracker>)>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            compute: Box::new(compute),
            strong: Mutex::new(None),
            soft: RwLock::new(Weak::new()),
            dependency: RwLock::new(None),
            timestamp: AtomicU64::new(NO_TIMESTAMP),
            compute_lock: Mutex::new(()),
        }
    }

    pub fn value(&self) -> ResolveResult<Arc<T>> {
        if let Some(value) = self.soft.read().upgrade() {
            // The weak slot may have been replaced between the read above and the
            // tracker check; only hand out the value if it is still the current one.
            if self.is_up_to_date() {
                let current = self.soft.read().upgrade();
                if current.as_ref().map_or(false, |c| Arc::ptr_eq(c, &value)) {
                    return Ok(value);
                }
            }
        }

        let _guard = self.compute_lock.lock();
        let existing = self.soft.read().upgrade();
        if let Some(value) = existing {
            if self.is_up_to_date() {
                return Ok(value);
            }
            warn!("Flexible cached value is out of date, recomputing");
        }

        let (value, dependency) = (self.compute)()?;
        let value = Arc::new(value);
        let timestamp = dependency.modification_count();

        self.timestamp.store(NO_TIMESTAMP, Ordering::SeqCst);
        *self.strong.lock() = Some(value.clone());
        *self.soft.write() = Arc::downgrade(&value);
        *self.dependency.write() = Some(dependency);
        self.timestamp.store(timestamp, Ordering::SeqCst);
        Ok(value)
    }

    /// Drop the strong reference; the value survives only while someone holds it
    pub fn soften(&self) {
        let _guard = self.compute_lock.lock();
        *self.strong.lock() = None;
    }

    pub fn is_up_to_date(&self) -> bool {
        let timestamp = self.timestamp.load(Ordering::SeqCst);
        if timestamp == NO_TIMESTAMP {
            return false;
        }
        match self.dependency.read().as_ref() {
            Some(dependency) => dependency.modification_count() == timestamp,
            None => false,
        }
    }

    /// Whether a strong reference is currently held
    pub fn is_hard(&self) -> bool {
        self.strong.lock().is_some()
    }
}
