//! Modification tracking

use super::services::ModificationTracker;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter bumped on every change to the project's sources
#[derive(Debug, Default)]
pub struct SimpleModificationTracker {
    count: AtomicU64,
}

impl SimpleModificationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

impl ModificationTracker for SimpleModificationTracker {
    fn modification_count(&self) -> u64 {
        self.count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment() {
        let tracker = SimpleModificationTracker::new();
        assert_eq!(tracker.modification_count(), 0);
        tracker.increment();
        tracker.increment();
        assert_eq!(tracker.modification_count(), 2);
    }
}
