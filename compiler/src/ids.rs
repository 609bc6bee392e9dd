//! Core ID Types
//!
//! Lightweight, type-safe identifiers used throughout the resolution engine.
//! Each ID type wraps a `u32` so that module, file, declaration and scope
//! identities can't be mixed up, and an [`IdAllocator`] hands out fresh IDs
//! from any thread.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU32, Ordering};

/// Trait for ID types that can be created and validated
pub trait IdType: Copy + Clone + PartialEq + Eq + std::hash::Hash + fmt::Debug {
    /// Create a new ID from a raw u32 value
    fn from_raw(raw: u32) -> Self;

    /// Get the raw u32 value of this ID
    fn as_raw(self) -> u32;

    /// Check if this ID is valid (not a sentinel value)
    fn is_valid(self) -> bool;

    /// Get an invalid/null sentinel value
    fn invalid() -> Self;
}

/// Macro to define ID types with consistent behavior
macro_rules! define_id_type {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Create a new ID from a raw u32 value
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw u32 value of this ID
            pub const fn as_raw(self) -> u32 {
                self.0
            }

            /// Check if this ID is valid (not the sentinel value)
            pub const fn is_valid(self) -> bool {
                self.0 != u32::MAX
            }

            /// Get an invalid/null sentinel value
            pub const fn invalid() -> Self {
                Self(u32::MAX)
            }
        }

        impl IdType for $name {
            fn from_raw(raw: u32) -> Self {
                Self::from_raw(raw)
            }

            fn as_raw(self) -> u32 {
                self.as_raw()
            }

            fn is_valid(self) -> bool {
                self.is_valid()
            }

            fn invalid() -> Self {
                Self::invalid()
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::invalid()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, "{}({})", stringify!($name), self.0)
                } else {
                    write!(f, "{}(<invalid>)", stringify!($name))
                }
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self::from_raw(raw)
            }
        }
    };
}

define_id_type! {
    /// Unique identifier for a module in the project structure
    ///
    /// Modules are compared by value; two `Module`s with the same ID are the
    /// same module.
    ModuleId
}

define_id_type! {
    /// Unique identifier for a source file registered in a `SourceStore`
    FileId
}

define_id_type! {
    /// Unique identifier for an IR declaration
    ///
    /// Every built or generated declaration gets a fresh ID, so two builds of
    /// the same source declaration are distinguishable.
    DeclarationId
}

define_id_type! {
    /// Unique identifier for a generated-member scope instance
    ///
    /// Generated member caches are keyed by this ID so distinct scope
    /// instances never share generated symbol identity.
    ScopeInstanceId
}

/// Thread-safe generator of fresh IDs
pub struct IdAllocator<T: IdType> {
    next: AtomicU32,
    _marker: PhantomData<fn() -> T>,
}

impl<T: IdType> IdAllocator<T> {
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(0),
            _marker: PhantomData,
        }
    }

    /// Allocate the next ID
    pub fn allocate(&self) -> T {
        T::from_raw(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of IDs handed out so far
    pub fn allocated(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

impl<T: IdType> Default for IdAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

static DECLARATION_IDS: IdAllocator<DeclarationId> = IdAllocator::new();
static SCOPE_INSTANCE_IDS: IdAllocator<ScopeInstanceId> = IdAllocator::new();

/// Fresh process-wide declaration ID
pub fn next_declaration_id() -> DeclarationId {
    DECLARATION_IDS.allocate()
}

/// Fresh process-wide scope instance ID
pub fn next_scope_instance_id() -> ScopeInstanceId {
    SCOPE_INSTANCE_IDS.allocate()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel() {
        assert!(!ModuleId::invalid().is_valid());
        assert!(ModuleId::from_raw(0).is_valid());
        assert_eq!(ModuleId::default(), ModuleId::invalid());
        assert_eq!(format!("{}", FileId::invalid()), "FileId(<invalid>)");
        assert_eq!(format!("{}", FileId::from_raw(3)), "FileId(3)");
    }

    #[test]
    fn test_allocator_is_monotonic() {
        let allocator: IdAllocator<FileId> = IdAllocator::new();
        let a = allocator.allocate();
        let b = allocator.allocate();
        assert_eq!(a.as_raw() + 1, b.as_raw());
        assert_eq!(allocator.allocated(), 2);
    }

    #[test]
    fn test_global_ids_are_unique_across_threads() {
        let ids: Vec<DeclarationId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..100).map(|_| next_declaration_id()).collect::<Vec<_>>()))
                .collect();
            handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
        });
        let unique: std::collections::HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
