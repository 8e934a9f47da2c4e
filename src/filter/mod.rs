//! Inclusion filtering: decides which candidate class files are
//! eligible for indexing at all.
//!
//! Two sequential gates: the library gate (against the path of the
//! archive containing the class, when there is one) and the class gate
//! (against the class's own path). Each gate runs the same
//! blacklist/whitelist × regex/literal decision over an ordered pattern
//! list.
//!
//! Configuration is committed as a whole: `commit` compiles every
//! pattern up front and swaps a single immutable snapshot, so readers
//! never observe a half-built pattern set and no stale compiled cache
//! can survive a configuration change.

mod config;

pub use config::PolicyConfig;

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::debug;

/// A configured pattern failed to compile. The affected gate denies
/// every candidate (fail closed) until a successful commit.
#[derive(Error, Debug)]
#[error("invalid inclusion pattern {pattern:?}: {source}")]
pub struct PatternError {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Compiled form of one gate's pattern list.
enum GatePatterns {
    Literal(Vec<String>),
    Regex(Vec<Regex>),
    /// A pattern failed to compile; the gate denies everything.
    Poisoned,
}

struct Gate {
    use_blacklist: bool,
    patterns: GatePatterns,
}

impl Gate {
    fn compile(
        use_blacklist: bool,
        use_regex: bool,
        raw: &[String],
    ) -> (Self, Option<PatternError>) {
        if !use_regex {
            return (
                Self {
                    use_blacklist,
                    patterns: GatePatterns::Literal(raw.to_vec()),
                },
                None,
            );
        }

        let mut compiled = Vec::with_capacity(raw.len());
        for pattern in raw {
            match Regex::new(pattern) {
                Ok(regex) => compiled.push(regex),
                Err(source) => {
                    return (
                        Self {
                            use_blacklist,
                            patterns: GatePatterns::Poisoned,
                        },
                        Some(PatternError {
                            pattern: pattern.clone(),
                            source,
                        }),
                    );
                }
            }
        }

        (
            Self {
                use_blacklist,
                patterns: GatePatterns::Regex(compiled),
            },
            None,
        )
    }

    /// Decide inclusion for `candidate`. `None` means the gate is
    /// poisoned and the check must fail closed.
    fn decide(&self, candidate: &str) -> Option<bool> {
        match &self.patterns {
            GatePatterns::Poisoned => None,
            GatePatterns::Literal(patterns) => {
                // Empty list: blacklist mode includes everything,
                // whitelist mode includes nothing
                if patterns.is_empty() {
                    return Some(self.use_blacklist);
                }
                for pattern in patterns {
                    if candidate == pattern {
                        return Some(!self.use_blacklist);
                    }
                }
                Some(self.use_blacklist)
            }
            GatePatterns::Regex(patterns) => {
                if patterns.is_empty() {
                    return Some(self.use_blacklist);
                }
                for regex in patterns {
                    // unanchored substring search, in list order
                    if regex.is_match(candidate) {
                        return Some(!self.use_blacklist);
                    }
                }
                Some(self.use_blacklist)
            }
        }
    }
}

struct CompiledPolicy {
    enabled: bool,
    class_gate: Gate,
    library_gate: Gate,
    /// Per-container decisions under this policy. Living inside the
    /// snapshot, the cache can never outlive the policy it was computed
    /// under.
    container_cache: RwLock<HashMap<String, bool>>,
}

impl CompiledPolicy {
    fn container_decision(&self, container: &str) -> bool {
        if let Some(&cached) = self
            .container_cache
            .read()
            .expect("container cache lock poisoned")
            .get(container)
        {
            return cached;
        }

        let decision = self.library_gate.decide(container).unwrap_or(false);
        self.container_cache
            .write()
            .expect("container cache lock poisoned")
            .insert(container.to_string(), decision);
        decision
    }
}

fn compile_policy(config: &PolicyConfig) -> (CompiledPolicy, Vec<PatternError>) {
    let (class_gate, class_err) =
        Gate::compile(config.use_blacklist, config.use_regex, &config.paths);
    let (library_gate, library_err) = Gate::compile(
        config.use_blacklist_library,
        config.use_regex_library,
        &config.libraries,
    );
    (
        CompiledPolicy {
            enabled: config.enabled,
            class_gate,
            library_gate,
            container_cache: RwLock::new(HashMap::new()),
        },
        class_err.into_iter().chain(library_err).collect(),
    )
}

/// The inclusion filter engine. Safe for concurrent reads from many
/// extraction workers; `commit` swaps the compiled snapshot atomically.
pub struct InclusionFilter {
    snapshot: RwLock<Arc<CompiledPolicy>>,
}

impl InclusionFilter {
    /// Create a filter with the default policy (always compiles).
    pub fn new() -> Self {
        let (compiled, _) = compile_policy(&PolicyConfig::default());
        Self {
            snapshot: RwLock::new(Arc::new(compiled)),
        }
    }

    /// Replace the whole policy atomically.
    ///
    /// Every pattern is compiled eagerly; on failure all pattern errors
    /// (class gate first, then library gate) are returned AND each
    /// affected gate is left poisoned so eligibility checks through it
    /// deny until a policy with valid patterns is committed. The fresh
    /// snapshot starts with an empty per-container decision cache.
    pub fn commit(&self, config: &PolicyConfig) -> Result<(), Vec<PatternError>> {
        let (compiled, errors) = compile_policy(config);

        *self.snapshot.write().expect("policy lock poisoned") = Arc::new(compiled);

        debug!(
            enabled = config.enabled,
            class_patterns = config.paths.len(),
            library_patterns = config.libraries.len(),
            "committed inclusion policy"
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Decide whether a candidate file should be indexed.
    ///
    /// Pure with respect to the committed policy: repeated calls with
    /// an unchanged policy return identical results.
    pub fn accept(&self, container: Option<&str>, class_path: &str) -> bool {
        let snapshot = self
            .snapshot
            .read()
            .expect("policy lock poisoned")
            .clone();

        if !snapshot.enabled {
            return false;
        }

        if let Some(container) = container {
            if !snapshot.container_decision(container) {
                return false;
            }
        }

        snapshot.class_gate.decide(class_path).unwrap_or(false)
    }
}

impl Default for InclusionFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Split an archive-style candidate path into container and class
/// parts. `/libs/foo.jar!/com/example/Foo.class` becomes
/// `(Some("/libs/foo.jar"), "com/example/Foo")`; a plain path has no
/// container and only sheds a `.class` suffix.
pub fn split_candidate(path: &str) -> (Option<&str>, &str) {
    let (container, class_part) = match path.rfind('!') {
        Some(index) => (Some(&path[..index]), &path[index + 1..]),
        None => (None, path),
    };
    let class_part = class_part.strip_prefix('/').unwrap_or(class_part);
    let class_part = class_part.strip_suffix(".class").unwrap_or(class_part);
    (container, class_part)
}
