//! Engine configuration

use serde::Deserialize;

/// Environment switch that downgrades lazy-resolve contract violations to warnings
pub const SUPPRESS_CONTRACT_VIOLATION_ENV: &str = "LAZY_RESOLVE_SUPPRESS_CONTRACT_VIOLATION";

/// Capacity of the two segments of an SLRU cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SlruCapacity {
    pub protected: usize,
    pub probationary: usize,
}

impl SlruCapacity {
    pub const fn new(protected: usize, probationary: usize) -> Self {
        Self {
            protected,
            probationary,
        }
    }

    pub fn total(&self) -> usize {
        self.protected + self.probationary
    }
}

#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Class-like symbol caches of combined providers
    pub class_cache: SlruCapacity,
    /// Top-level callable caches of combined providers
    pub callable_cache: SlruCapacity,
    /// Per-package name set caches
    pub name_cache: SlruCapacity,
    /// Log contract violations instead of failing the request
    pub suppress_contract_violations: bool,
    /// Advance local declarations together with their container
    pub resolve_local_declarations: bool,
    /// Resolve the declarations of a file on the rayon pool
    pub parallel_file_resolution: bool,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            class_cache: SlruCapacity::new(300, 300),
            callable_cache: SlruCapacity::new(300, 300),
            name_cache: SlruCapacity::new(100, 100),
            suppress_contract_violations: false,
            resolve_local_declarations: true,
            parallel_file_resolution: true,
        }
    }
}

impl ResolveConfig {
    /// Defaults, plus the contract-violation switch read from the environment
    pub fn from_env() -> Self {
        Self {
            suppress_contract_violations: std::env::var_os(SUPPRESS_CONTRACT_VIOLATION_ENV)
                .is_some(),
            ..Self::default()
        }
    }
}
