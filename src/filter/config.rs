use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Inclusion policy configuration.
///
/// An immutable snapshot of this value is installed into an
/// [`super::InclusionFilter`] through `commit`; the filter never reads
/// a half-updated policy. The host typically persists this alongside
/// its other settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Master switch; when false no file is eligible for indexing
    pub enabled: bool,

    /// Treat `paths` as a blacklist (true) or whitelist (false)
    pub use_blacklist: bool,

    /// Match `paths` as regular expressions instead of exact strings
    pub use_regex: bool,

    /// Ordered class-path patterns, tested against the class's
    /// fully-qualified internal path
    pub paths: Vec<String>,

    /// Treat `libraries` as a blacklist (true) or whitelist (false)
    pub use_blacklist_library: bool,

    /// Match `libraries` as regular expressions instead of exact strings
    pub use_regex_library: bool,

    /// Ordered library-container patterns, tested against the
    /// container (archive) path
    pub libraries: Vec<String>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            use_blacklist: false,
            use_regex: true,
            paths: vec!["^net/minecraft/.*".to_string(), "^com/mojang/.*".to_string()],
            use_blacklist_library: false,
            use_regex_library: true,
            libraries: vec![],
        }
    }
}

impl PolicyConfig {
    /// Load a policy from a file (YAML or TOML)
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read policy file: {}", path.display()))?;

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        match extension {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse YAML policy"),
            "toml" => toml::from_str(&contents)
                .into_diagnostic()
                .wrap_err("Failed to parse TOML policy"),
            _ => {
                // Try YAML first, then TOML
                if let Ok(config) = serde_yaml::from_str(&contents) {
                    Ok(config)
                } else {
                    toml::from_str(&contents)
                        .into_diagnostic()
                        .wrap_err("Failed to parse policy file")
                }
            }
        }
    }

    /// Try to load a policy from default locations under `root`,
    /// falling back to the default policy when none exists.
    pub fn from_default_locations(root: &Path) -> Result<Self> {
        let default_names = [
            ".classref.yml",
            ".classref.yaml",
            ".classref.toml",
            "classref.yml",
            "classref.yaml",
            "classref.toml",
        ];

        for name in &default_names {
            let path = root.join(name);
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Ok(Self::default())
    }
}
