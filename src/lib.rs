//! classref - Symbol-reference indexing core for JVM class files
//!
//! This library extracts symbol-reference information from compiled
//! class bytecode and maintains a queryable, serializable index mapping
//! each referenced symbol to the locations that reference it, with
//! per-location occurrence counts. It is designed to be embedded in a
//! host indexing framework that owns file discovery, scheduling,
//! storage, and invalidation.
//!
//! # Architecture
//!
//! The indexing pipeline consists of:
//! 1. **Inclusion Filtering** - Decide per candidate file whether it is
//!    eligible for indexing (blacklist/whitelist, regex/literal)
//! 2. **Extraction** - Walk the class file and collect every symbol
//!    reference site
//! 3. **Aggregation** - Fold reference sites into a per-file
//!    symbol-to-location-count mapping
//! 4. **Serialization** - Encode/decode the mapping to a compact binary
//!    form for host-managed persistence

pub mod cancel;
pub mod codec;
pub mod extract;
pub mod filter;
pub mod index;
pub mod pipeline;

pub use cancel::{CancelToken, Cancelled};
pub use codec::{decode, encode, DecodeError, FORMAT_VERSION};
pub use extract::{extract, extract_at, ExtractError};
pub use filter::{split_candidate, InclusionFilter, PatternError, PolicyConfig};
pub use index::{IndexValue, LocationCounts, RefKind, SymbolKey};
pub use pipeline::{index_candidates, Candidate, FileOutcome, Outcome};
