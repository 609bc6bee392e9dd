//! TOML project manifest.
//!
//! ```toml
//! [[module]]
//! name = "lib"
//! kind = "library"
//! files = ["lib/Box.kt"]
//!
//! [[module]]
//! name = "app"
//! files = ["app/Main.kt"]
//! dependencies = ["lib"]
//! depends-on = []
//! friends = []
//!
//! [cache]
//! class = { protected = 64, probationary = 64 }
//!
//! [resolve]
//! suppress-contract-violations = false
//! ```

use super::module::{ModuleKindSpec, ModuleSpec};
use crate::config::{ResolveConfig, SlruCapacity};
use crate::error::{ResolveError, ResolveResult};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectManifest {
    #[serde(rename = "module", default)]
    pub modules: Vec<ModuleManifest>,
    pub cache: Option<CacheSection>,
    pub resolve: Option<ResolveSection>,
}

/// One `[[module]]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModuleManifest {
    pub name: String,
    #[serde(default)]
    pub kind: ModuleKindSpec,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub friends: Vec<String>,
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    pub class: Option<SlruCapacity>,
    pub callable: Option<SlruCapacity>,
    pub names: Option<SlruCapacity>,
}

/// `[resolve]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResolveSection {
    pub suppress_contract_violations: Option<bool>,
    pub resolve_local_declarations: Option<bool>,
    pub parallel_file_resolution: Option<bool>,
}

impl ProjectManifest {
    pub fn module_specs(&self) -> Vec<ModuleSpec> {
        self.modules
            .iter()
            .map(|m| ModuleSpec {
                name: m.name.clone(),
                kind: m.kind,
                dependencies: m.dependencies.clone(),
                depends_on: m.depends_on.clone(),
                friends: m.friends.clone(),
            })
            .collect()
    }

    /// Overlay the manifest's `[cache]` and `[resolve]` settings
    pub fn apply_to(&self, config: &mut ResolveConfig) {
        if let Some(cache) = &self.cache {
            if let Some(class) = cache.class {
                config.class_cache = class;
            }
            if let Some(callable) = cache.callable {
                config.callable_cache = callable;
            }
            if let Some(names) = cache.names {
                config.name_cache = names;
            }
        }
        if let Some(resolve) = &self.resolve {
            if let Some(suppress) = resolve.suppress_contract_violations {
                config.suppress_contract_violations = suppress;
            }
            if let Some(locals) = resolve.resolve_local_declarations {
                config.resolve_local_declarations = locals;
            }
            if let Some(parallel) = resolve.parallel_file_resolution {
                config.parallel_file_resolution = parallel;
            }
        }
    }
}

/// Parse a project manifest.
pub fn parse_manifest(content: &str) -> ResolveResult<ProjectManifest> {
    let manifest: ProjectManifest = toml::from_str(content).map_err(|e| ResolveError::Manifest {
        message: e.to_string(),
    })?;

    if manifest.modules.is_empty() {
        return Err(ResolveError::Manifest {
            message: "manifest must declare at least one [[module]]".to_string(),
        });
    }
    for module in &manifest.modules {
        if module.name.trim().is_empty() {
            return Err(ResolveError::Manifest {
                message: "module name must not be empty".to_string(),
            });
        }
    }
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modules() {
        let toml = r#"
[[module]]
name = "sdk"
kind = "sdk"

[[module]]
name = "lib"
kind = "library"
files = ["lib/Box.kt"]
dependencies = ["sdk"]

[[module]]
name = "app"
files = ["app/Main.kt", "app/Util.kt"]
dependencies = ["lib"]
friends = ["lib"]
depends-on = ["sdk"]
"#;
        let manifest = parse_manifest(toml).unwrap();
        assert_eq!(manifest.modules.len(), 3);
        assert_eq!(manifest.modules[0].kind, ModuleKindSpec::Sdk);
        assert_eq!(manifest.modules[2].kind, ModuleKindSpec::Source);
        assert_eq!(manifest.modules[2].files.len(), 2);
        assert_eq!(manifest.modules[2].depends_on, vec!["sdk"]);

        let specs = manifest.module_specs();
        assert_eq!(specs[2].friends, vec!["lib"]);
    }

    #[test]
    fn test_sections_override_config() {
        let toml = r#"
[[module]]
name = "app"

[cache]
class = { protected = 8, probationary = 4 }

[resolve]
suppress-contract-violations = true
parallel-file-resolution = false
"#;
        let manifest = parse_manifest(toml).unwrap();
        let mut config = ResolveConfig::default();
        manifest.apply_to(&mut config);
        assert_eq!(config.class_cache, SlruCapacity::new(8, 4));
        assert!(config.suppress_contract_violations);
        assert!(!config.parallel_file_resolution);
        assert!(config.resolve_local_declarations);
    }

    #[test]
    fn test_rejects_empty_manifest() {
        assert!(matches!(parse_manifest(""), Err(ResolveError::Manifest { .. })));
        assert!(matches!(
            parse_manifest("[[module]]\nkind = \"source\""),
            Err(ResolveError::Manifest { .. })
        ));
    }
}
