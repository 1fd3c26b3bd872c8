//!                              triedex
//!                              =======
//!
//! An in-process full-text search core: a weighted character trie keyed by
//! token, scored by a tf-idf-like formula over frequency/recency/depth, with
//! bounded fuzzy and regex traversal, query lexing/stemming, result caching,
//! and a document store behind a pluggable external-store trait.
//!
//!     core        shared types, errors, events, configuration
//!     trie        the scored token trie and its fuzzy walk
//!     scoring     the tf-idf-like formula both the trie and regex walker use
//!     analysis    Unicode tokenization
//!     index       field mapping, the inverted map, the document manager, snapshots
//!     query       lexing, stemming, operator/modifier parsing
//!     regex_walker  bounded BFS/DFS regex traversal of the trie
//!     cache       the bounded LRU/MRU result cache
//!     search      the result container and normalisation/pagination helpers
//!     store       the external-store trait and its in-process fallback
//!     engine      `SearchEngine`, the public façade
//!
//! `SearchEngine` is the only type most callers need; the rest of the crate
//! is exported for callers who want to assemble the pieces themselves (a
//! custom `ExternalStore`, a bare `Trie` for an embedded use case, etc).

pub mod analysis;
pub mod cache;
pub mod core;
pub mod engine;
pub mod index;
pub mod query;
pub mod regex_walker;
pub mod scoring;
pub mod search;
pub mod store;
pub mod trie;

pub use core::config::{CacheConfig, EngineConfig, EvictionPolicy, RegexConfig, ValidationConfig, VersioningConfig};
pub use core::error::{Error, ErrorKind, Result};
pub use core::events::{Event, EventPayload, EventSink, NoopSink};
pub use core::types::{DocId, Document, DocumentMetadata, DocumentVersion, Relation, RelationKind, Value};
pub use engine::{AddDocumentsOutcome, BulkUpdateOutcome, EngineState, SearchEngine};
pub use query::{ParsedQuery, QueryProcessor, QueryToken, TokenKind};
pub use query::processor::{SearchOptions, SortOrder};
pub use search::{SearchHit, SearchResults};
pub use store::{ExternalStore, MemoryStore, StoredMetadata};
